//! Microphone-to-Opus input pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::tasks::ActiveTaskQueue;

use super::{AudioInputDevice, OpusEncoder};

/// Receives each encoded frame. Runs on the pipeline's own thread; must not
/// block.
pub type FrameHandler = Arc<dyn Fn(Bytes) + Send + Sync>;

/// Pulls PCM from the input device, encodes 16-bit mono frames of the
/// configured duration, and hands each packet to the frame handler.
///
/// The pipeline owns the microphone for its whole lifetime; dropping it
/// releases the device and stops the encoder thread.
pub struct AudioInputPipeline {
    shared: Arc<Shared>,
    // Owns the encoder thread; kept alive with the pipeline.
    _queue: Arc<ActiveTaskQueue>,
}

struct Shared {
    device: Arc<dyn AudioInputDevice>,
    encoder: Mutex<Box<dyn OpusEncoder>>,
    handler: FrameHandler,
    running: AtomicBool,
    samples_per_frame: usize,
}

impl AudioInputPipeline {
    pub fn new(
        device: Arc<dyn AudioInputDevice>,
        encoder: Box<dyn OpusEncoder>,
        handler: FrameHandler,
        frame_duration_ms: u32,
    ) -> Self {
        let samples_per_frame = (device.sample_rate() as usize * frame_duration_ms as usize) / 1000;
        let shared = Arc::new(Shared {
            device,
            encoder: Mutex::new(encoder),
            handler,
            running: AtomicBool::new(true),
            samples_per_frame,
        });

        let queue = Arc::new(ActiveTaskQueue::new("aivox-audio-in"));
        debug!(samples_per_frame, "audio input pipeline started");

        let weak_queue = Arc::downgrade(&queue);
        let pump_shared = Arc::clone(&shared);
        queue.enqueue(move || pump(&weak_queue, &pump_shared));

        Self {
            shared,
            _queue: queue,
        }
    }
}

impl Drop for AudioInputPipeline {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        // Unblock any in-flight read so the encoder thread can exit.
        self.shared.device.stop();
        debug!("audio input pipeline released");
    }
}

fn pump(queue: &Weak<ActiveTaskQueue>, shared: &Arc<Shared>) {
    if !shared.running.load(Ordering::SeqCst) {
        return;
    }

    let pcm = shared.device.read_pcm(shared.samples_per_frame);
    if !shared.running.load(Ordering::SeqCst) {
        return;
    }

    if pcm.len() == shared.samples_per_frame {
        match shared.encoder.lock().encode(&pcm) {
            Ok(frame) => (shared.handler)(frame),
            Err(e) => warn!(error = %e, "dropping unencodable frame"),
        }
    } else {
        // Short read without a stop: device hiccup, skip the frame.
        warn!(
            got = pcm.len(),
            want = shared.samples_per_frame,
            "short pcm read"
        );
    }

    if let Some(queue) = queue.upgrade() {
        let weak_queue = Arc::downgrade(&queue);
        let pump_shared = Arc::clone(shared);
        queue.enqueue(move || pump(&weak_queue, &pump_shared));
    }
}
