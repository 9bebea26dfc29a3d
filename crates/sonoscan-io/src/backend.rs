//! Pluggable audio output abstraction.
//!
//! The engine only needs somewhere to pull interleaved samples into. The
//! [`AudioBackend`] trait keeps that seam object-safe: callbacks are boxed
//! closures and the returned [`StreamHandle`] is type-erased, so the CLI can
//! hold a `Box<dyn AudioBackend>` and tests can substitute a fake.
//!
//! ```text
//!   CLI ──► AudioBackend ──► CpalBackend ──► ALSA / CoreAudio / WASAPI
//!                 ▲
//!                 └── OutputCallback pulls from SonificationEngine
//! ```

use crate::{AudioDevice, Result};

/// Configuration for building an output stream.
#[derive(Debug, Clone)]
pub struct BackendStreamConfig {
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred buffer size in frames.
    pub buffer_size: u32,
    /// Number of interleaved channels.
    pub channels: u16,
    /// Output device name filter (system default if `None`).
    pub device_name: Option<String>,
}

impl Default for BackendStreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 512,
            channels: 2,
            device_name: None,
        }
    }
}

/// Type-erased stream handle.
///
/// The stream runs while the handle exists; dropping it stops playback.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Wrap a backend-specific stream object.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// Fills an interleaved output buffer. Runs on the audio thread: no
/// allocation, locking or I/O.
pub type OutputCallback = Box<dyn FnMut(&mut [f32]) + Send>;

/// Receives stream errors as text.
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Platform audio output.
pub trait AudioBackend: Send {
    /// Backend name, e.g. `"cpal"`.
    fn name(&self) -> &str;

    /// All devices the backend can see.
    fn list_devices(&self) -> Result<Vec<AudioDevice>>;

    /// The system default output device, if any.
    fn default_output_device(&self) -> Result<Option<AudioDevice>>;

    /// Build and start an output stream.
    ///
    /// `callback` is invoked per hardware buffer with interleaved samples
    /// (`[L0, R0, L1, R1, ...]` for stereo) that it must fill completely.
    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// The sample rate the backend will actually run `config` at.
    fn actual_sample_rate(&self, config: &BackendStreamConfig) -> u32 {
        config.sample_rate
    }
}
