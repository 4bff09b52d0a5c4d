//! Wake detector lifecycle.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::core::audio::AudioInputDevice;
use crate::tasks::ActiveTaskQueue;

use super::WakeWordFrontEnd;

/// PCM chunk duration fed to the front end, in milliseconds.
const CHUNK_MS: usize = 32;

/// Watches the microphone and fires the wake handler.
///
/// The detector survives arbitrarily many arm/disarm cycles. Each
/// [`WakeDetector::start`] arms it for exactly one detection: after the
/// handler fires, the detector disarms itself until the next `start`.
pub struct WakeDetector {
    shared: Arc<Shared>,
    // Owns the feed thread; kept alive with the detector.
    _queue: Arc<ActiveTaskQueue>,
    queue: Weak<ActiveTaskQueue>,
}

struct Shared {
    device: Arc<dyn AudioInputDevice>,
    front_end: Mutex<Box<dyn WakeWordFrontEnd>>,
    handler: Arc<dyn Fn() + Send + Sync>,
    running: AtomicBool,
    // Bumped on every arm so a feed chain from a previous armed period dies
    // even when it races the running flag.
    epoch: AtomicU64,
    chunk_samples: usize,
}

impl WakeDetector {
    pub fn new(
        device: Arc<dyn AudioInputDevice>,
        front_end: Box<dyn WakeWordFrontEnd>,
        handler: Arc<dyn Fn() + Send + Sync>,
    ) -> Self {
        let chunk_samples = device.sample_rate() as usize * CHUNK_MS / 1000;
        let shared = Arc::new(Shared {
            device,
            front_end: Mutex::new(front_end),
            handler,
            running: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
            chunk_samples,
        });
        let queue = Arc::new(ActiveTaskQueue::new("aivox-wake"));
        let weak = Arc::downgrade(&queue);
        Self {
            shared,
            _queue: queue,
            queue: weak,
        }
    }

    /// Arm the detector. No-op while already armed.
    pub fn start(&self) {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let epoch = self.shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.front_end.lock().reset();
        debug!(epoch, "wake detector armed");

        if let Some(queue) = self.queue.upgrade() {
            let weak_queue = Arc::downgrade(&queue);
            let shared = Arc::clone(&self.shared);
            queue.enqueue(move || pump(&weak_queue, &shared, epoch));
        }
    }

    /// Disarm the detector and release the microphone.
    pub fn stop(&self) {
        if self.shared.running.swap(false, Ordering::SeqCst) {
            self.shared.device.stop();
            debug!("wake detector disarmed");
        }
    }
}

impl Drop for WakeDetector {
    fn drop(&mut self) {
        self.stop();
    }
}

fn pump(queue: &Weak<ActiveTaskQueue>, shared: &Arc<Shared>, epoch: u64) {
    let live = |shared: &Shared| {
        shared.running.load(Ordering::SeqCst) && shared.epoch.load(Ordering::SeqCst) == epoch
    };
    if !live(shared) {
        return;
    }

    let pcm = shared.device.read_pcm(shared.chunk_samples);
    if !live(shared) {
        return;
    }

    if pcm.len() == shared.chunk_samples && shared.front_end.lock().feed(&pcm) {
        // One detection per armed period; re-arming is the engine's call.
        shared.running.store(false, Ordering::SeqCst);
        info!("wake word detected");
        (shared.handler)();
        return;
    }

    if let Some(queue) = queue.upgrade() {
        let weak_queue = Arc::downgrade(&queue);
        let pump_shared = Arc::clone(shared);
        queue.enqueue(move || pump(&weak_queue, &pump_shared, epoch));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::wake::EnergyFrontEnd;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::time::Duration;

    /// Device scripted to stay quiet for a few chunks, then go loud.
    struct ScriptedDevice {
        chunks_until_loud: AtomicUsize,
    }

    impl AudioInputDevice for ScriptedDevice {
        fn sample_rate(&self) -> u32 {
            16_000
        }

        fn read_pcm(&self, samples: usize) -> Vec<i16> {
            std::thread::sleep(Duration::from_millis(2));
            if self.chunks_until_loud.load(Ordering::SeqCst) == 0 {
                vec![16_000; samples]
            } else {
                self.chunks_until_loud.fetch_sub(1, Ordering::SeqCst);
                vec![0; samples]
            }
        }

        fn stop(&self) {}
    }

    fn detector_with(chunks_until_loud: usize) -> (WakeDetector, mpsc::Receiver<()>) {
        let (tx, rx) = mpsc::channel();
        let detector = WakeDetector::new(
            Arc::new(ScriptedDevice {
                chunks_until_loud: AtomicUsize::new(chunks_until_loud),
            }),
            Box::new(EnergyFrontEnd::default()),
            Arc::new(move || {
                let _ = tx.send(());
            }),
        );
        (detector, rx)
    }

    #[test]
    fn fires_once_per_armed_period() {
        let (detector, rx) = detector_with(4);
        detector.start();

        rx.recv_timeout(Duration::from_secs(1)).unwrap();
        // Disarmed after firing: the loud signal keeps flowing but no second
        // event arrives.
        assert!(rx.recv_timeout(Duration::from_millis(120)).is_err());

        detector.start();
        rx.recv_timeout(Duration::from_secs(1)).unwrap();
    }

    #[test]
    fn stopped_detector_stays_silent() {
        let (detector, rx) = detector_with(0);
        detector.start();
        detector.stop();
        // A detection may already be in flight from the armed window; after
        // it settles nothing further arrives.
        let _ = rx.recv_timeout(Duration::from_millis(80));
        assert!(rx.recv_timeout(Duration::from_millis(120)).is_err());
    }

    #[test]
    fn survives_many_arm_disarm_cycles() {
        let (detector, rx) = detector_with(0);
        for _ in 0..5 {
            detector.start();
            rx.recv_timeout(Duration::from_secs(1)).unwrap();
            detector.stop();
        }
    }
}
