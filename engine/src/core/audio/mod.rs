//! Duplex audio pipelines and the capability interfaces they drive.
//!
//! The engine never touches audio hardware or the Opus codec directly. Hosts
//! provide devices and a codec factory; the pipelines here own the pacing:
//! the input pipeline pulls PCM and pushes encoded frames at the caller, the
//! output pipeline accepts encoded frames in arrival order and plays them.

mod codec;
mod device;
mod input;
mod output;

pub use codec::{CodecError, OpusCodecFactory, OpusDecoder, OpusEncoder};
pub use device::{AudioInputDevice, AudioOutputDevice};
pub use input::{AudioInputPipeline, FrameHandler};
pub use output::AudioOutputPipeline;
