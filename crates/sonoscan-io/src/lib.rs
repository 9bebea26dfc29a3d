//! Audio I/O for sonoscan.
//!
//! This crate provides:
//!
//! - **Output backends**: the object-safe [`AudioBackend`] trait and its
//!   cpal implementation [`CpalBackend`]
//! - **Device discovery**: [`list_devices`], [`default_output_device`],
//!   [`find_output_device`]
//! - **WAV files**: [`write_wav_stereo`], [`read_wav_stereo`] and the
//!   incremental [`StereoWavWriter`] used by the offline renderer
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sonoscan_io::{AudioBackend, BackendStreamConfig, CpalBackend};
//!
//! let backend = CpalBackend::new();
//! let _stream = backend.build_output_stream(
//!     &BackendStreamConfig::default(),
//!     Box::new(|buffer: &mut [f32]| buffer.fill(0.0)),
//!     Box::new(|err| eprintln!("audio error: {err}")),
//! )?;
//! // plays until `_stream` is dropped
//! ```

mod backend;
mod cpal_backend;
mod devices;
mod wav;

pub use backend::{AudioBackend, BackendStreamConfig, ErrorCallback, OutputCallback, StreamHandle};
pub use cpal_backend::CpalBackend;
pub use devices::{
    AudioDevice, default_output_device, find_device_by_index, find_output_device, list_devices,
};
pub use wav::{StereoSamples, StereoWavWriter, WavSpec, read_wav_stereo, write_wav_stereo};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
