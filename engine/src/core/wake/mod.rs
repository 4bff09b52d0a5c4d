//! Wake-word activation.
//!
//! The detector owns the microphone whenever no conversation pipeline does,
//! feeds PCM chunks to an acoustic front end and fires the host callback once
//! per armed period. The neural front end is an external collaborator; a
//! small RMS-energy front end ships as the default so the engine works
//! without one.

mod detector;

pub use detector::WakeDetector;

/// Acoustic front end deciding whether a PCM chunk completes a wake word.
pub trait WakeWordFrontEnd: Send {
    /// Feed one chunk of mono 16-bit PCM. Returns `true` on positive
    /// detection.
    fn feed(&mut self, pcm: &[i16]) -> bool;

    /// Forget accumulated context. Called when the detector is re-armed.
    fn reset(&mut self);
}

/// RMS energy threshold above which a chunk counts as speech.
const ENERGY_THRESHOLD: f32 = 0.03;

/// Consecutive speech chunks required for a detection.
const REQUIRED_STREAK: u32 = 3;

/// Default front end: treats sustained audio energy as a wake event.
///
/// This is a stand-in for a real keyword spotter, adequate for push-to-talk
/// style setups and for tests.
pub struct EnergyFrontEnd {
    threshold: f32,
    required_streak: u32,
    streak: u32,
}

impl EnergyFrontEnd {
    pub fn new(threshold: f32, required_streak: u32) -> Self {
        Self {
            threshold,
            required_streak,
            streak: 0,
        }
    }
}

impl Default for EnergyFrontEnd {
    fn default() -> Self {
        Self::new(ENERGY_THRESHOLD, REQUIRED_STREAK)
    }
}

impl WakeWordFrontEnd for EnergyFrontEnd {
    fn feed(&mut self, pcm: &[i16]) -> bool {
        if rms_energy(pcm) > self.threshold {
            self.streak += 1;
            if self.streak >= self.required_streak {
                self.streak = 0;
                return true;
            }
        } else {
            self.streak = 0;
        }
        false
    }

    fn reset(&mut self) {
        self.streak = 0;
    }
}

/// Root-mean-square energy of normalised samples.
fn rms_energy(pcm: &[i16]) -> f32 {
    if pcm.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = pcm
        .iter()
        .map(|&s| {
            let normalised = f32::from(s) / 32_768.0;
            normalised * normalised
        })
        .sum();
    (sum_squares / pcm.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_has_negligible_energy() {
        assert!(rms_energy(&[0; 256]) < 0.001);
        assert!(rms_energy(&[]) < 0.001);
    }

    #[test]
    fn loud_signal_has_high_energy() {
        assert!(rms_energy(&[16_000; 256]) > 0.4);
    }

    #[test]
    fn detection_requires_a_sustained_streak() {
        let mut front_end = EnergyFrontEnd::default();
        let loud = [16_000i16; 256];
        let quiet = [0i16; 256];

        assert!(!front_end.feed(&loud));
        assert!(!front_end.feed(&loud));
        assert!(front_end.feed(&loud));

        // Streak restarts after the detection and after silence.
        assert!(!front_end.feed(&loud));
        assert!(!front_end.feed(&quiet));
        assert!(!front_end.feed(&loud));
        assert!(!front_end.feed(&loud));
        assert!(front_end.feed(&loud));
    }

    #[test]
    fn reset_clears_the_streak() {
        let mut front_end = EnergyFrontEnd::default();
        let loud = [16_000i16; 256];
        assert!(!front_end.feed(&loud));
        assert!(!front_end.feed(&loud));
        front_end.reset();
        assert!(!front_end.feed(&loud));
    }
}
