//! Opus-to-speaker output pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::tasks::ActiveTaskQueue;

use super::{AudioOutputDevice, OpusDecoder};

/// Decodes Opus frames in arrival order and drives the speaker.
///
/// Frames are queued onto a dedicated playback thread. Because that queue is
/// strictly FIFO, a drain callback registered with
/// [`AudioOutputPipeline::notify_data_end`] runs exactly when every frame
/// accepted before it has been decoded and written out.
pub struct AudioOutputPipeline {
    shared: Arc<Shared>,
    queue: Arc<ActiveTaskQueue>,
}

struct Shared {
    device: Arc<dyn AudioOutputDevice>,
    decoder: Mutex<Box<dyn OpusDecoder>>,
    open: AtomicBool,
}

impl AudioOutputPipeline {
    pub fn new(device: Arc<dyn AudioOutputDevice>, decoder: Box<dyn OpusDecoder>) -> Self {
        debug!("audio output pipeline started");
        Self {
            shared: Arc::new(Shared {
                device,
                decoder: Mutex::new(decoder),
                open: AtomicBool::new(true),
            }),
            queue: Arc::new(ActiveTaskQueue::new("aivox-audio-out")),
        }
    }

    /// Accept one encoded frame for playback.
    pub fn write(&self, frame: Bytes) {
        if !self.shared.open.load(Ordering::SeqCst) {
            return;
        }
        let shared = Arc::clone(&self.shared);
        self.queue.enqueue(move || {
            if !shared.open.load(Ordering::SeqCst) {
                return;
            }
            match shared.decoder.lock().decode(&frame) {
                Ok(pcm) => shared.device.write_pcm(&pcm),
                Err(e) => warn!(error = %e, "dropping undecodable frame"),
            }
        });
    }

    /// Register a one-shot callback fired once every frame accepted so far
    /// has been played.
    pub fn notify_data_end<F>(&self, on_drained: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.enqueue(on_drained);
    }
}

impl Drop for AudioOutputPipeline {
    fn drop(&mut self) {
        // Frames still queued are discarded, not played out.
        self.shared.open.store(false, Ordering::SeqCst);
        debug!(pending = self.queue.len(), "audio output pipeline released");
    }
}
