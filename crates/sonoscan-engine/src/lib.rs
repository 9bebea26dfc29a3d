//! Spectral resynthesis engine for depth sonification.
//!
//! Turns per-column acoustic descriptions into stereo audio. The engine is
//! split along the thread boundary:
//!
//! - [`SonificationEngine`] lives on the audio thread. Each block it drains
//!   pending parameters, shapes a noise frame in the frequency domain,
//!   overlap-adds it, mixes in the resonator families, and runs the click,
//!   AGC, limiter and pan stages.
//! - [`ControlSurface`] lives anywhere else. It stages parameters through
//!   lock-free atomics ([`staging`]) that the render thread consumes once
//!   per block.
//!
//! ## Block layout
//!
//! | Quantity | Default |
//! |----------|---------|
//! | FFT size `N` | 1024 |
//! | Hop | `N / 4` = 256 |
//! | Window | periodic Hann |
//! | Envelope / mask smoothing | 0.85 per block |
//! | Resonator level ramp | 0.92 per block |
//!
//! ## Example
//!
//! ```rust
//! use sonoscan_core::{ColumnAcoustics, ShapeId};
//! use sonoscan_engine::{EngineSettings, SonificationEngine};
//!
//! let (mut engine, control) = SonificationEngine::new(EngineSettings::default());
//! control.start();
//!
//! let mut column = ColumnAcoustics::silent(30, 40);
//! column.envelope.fill(0.5);
//! column.target_mask[10..20].fill(1.0);
//! column.shape = ShapeId::Triangle;
//! column.proximity = 0.2;
//! control.apply_column(&column);
//!
//! let mut out = vec![0.0f32; 2 * 512];
//! engine.render_interleaved(&mut out, 2);
//! assert!(out.iter().all(|s| s.is_finite()));
//! ```

mod control;
pub mod dynamics;
mod engine;
pub mod ola;
mod settings;
pub mod spectral;
pub mod staging;
mod stats;

pub use control::{ControlSurface, MAX_BOOST_DB};
pub use engine::{
    FOREGROUND_DRIVE, GAIN_SMOOTHING, LEVEL_FLOOR, LEVEL_RAMP, SPECTRUM_SMOOTHING,
    SonificationEngine,
};
pub use settings::{EngineSettings, MIN_NOISE_FRAMES};
pub use spectral::{SpectralShaper, hann_window};
pub use stats::EngineStats;
