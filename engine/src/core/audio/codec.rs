//! Opus codec capability interfaces.
//!
//! Encoding and decoding are external collaborators; the engine only moves
//! frames around. Pipelines are rebuilt on every listen/speak flip, so hosts
//! hand the engine a factory rather than codec instances.

use bytes::Bytes;
use thiserror::Error;

/// Errors produced by codec implementations.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encode failed: {0}")]
    Encode(String),

    #[error("decode failed: {0}")]
    Decode(String),
}

/// Encodes fixed-duration PCM frames to Opus packets.
pub trait OpusEncoder: Send {
    fn encode(&mut self, pcm: &[i16]) -> Result<Bytes, CodecError>;
}

/// Decodes Opus packets back to PCM.
pub trait OpusDecoder: Send {
    fn decode(&mut self, frame: &[u8]) -> Result<Vec<i16>, CodecError>;
}

/// Produces fresh codec instances for each pipeline generation.
pub trait OpusCodecFactory: Send + Sync {
    fn new_encoder(&self) -> Box<dyn OpusEncoder>;
    fn new_decoder(&self) -> Box<dyn OpusDecoder>;
}
