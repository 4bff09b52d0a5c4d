//! Audio device capability interfaces.

/// A microphone-like PCM source.
///
/// `read_pcm` blocks until the requested number of samples is available; the
/// device paces its consumers. A concurrent [`AudioInputDevice::stop`] call
/// unblocks any in-flight read, which then returns fewer samples than
/// requested.
pub trait AudioInputDevice: Send + Sync {
    /// Sample rate of the produced PCM, in Hz.
    fn sample_rate(&self) -> u32;

    /// Read exactly `samples` mono 16-bit samples, blocking as needed.
    fn read_pcm(&self, samples: usize) -> Vec<i16>;

    /// Unblock pending reads.
    fn stop(&self);
}

/// A speaker-like PCM sink.
pub trait AudioOutputDevice: Send + Sync {
    /// Sample rate the sink expects, in Hz.
    fn sample_rate(&self) -> u32;

    /// Queue mono 16-bit samples for playback.
    fn write_pcm(&self, pcm: &[i16]);
}
