//! Sonoscan Core - DSP primitives for depth sonification
//!
//! The building blocks shared by the scene and engine crates, designed for
//! real-time use with zero allocation in the audio path.
//!
//! # Core Abstractions
//!
//! ## Band Map
//!
//! - [`BandMap`] - Log-spaced frequency bands with per-bin triangular weights
//!
//! ## Resonators
//!
//! Shape-keyed signature generators driven by shared noise:
//!
//! - [`Resonator`] - Closed enum over the resonator families
//! - [`FeedbackComb`] / [`FeedforwardComb`] - Comb filters
//! - [`AllpassComb`] - Schroeder all-pass comb
//! - [`DelayLine`] - Fixed-capacity circular buffer with adjustable length
//!
//! ## Column Acoustics
//!
//! - [`ColumnAcoustics`] - What one scan tick says about one grid column
//! - Mappings: [`acoustics::closeness`], [`acoustics::depth_to_gain`],
//!   [`acoustics::smooth_across_bands`]
//!
//! ## Utilities
//!
//! - [`SmoothedParam`] - One-pole parameter smoothing
//! - [`NoiseTable`] - Precomputed excitation noise with a prime-stride walk
//! - Math functions: [`db_to_linear`], [`linear_to_db`], [`constant_power_pan`]
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible. Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! sonoscan-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use sonoscan_core::{BandMap, Resonator, ShapeId};
//!
//! let map = BandMap::new(48000.0, 1024, 40, 50.0, 10050.0);
//! let mut res = Resonator::for_shape(ShapeId::Sphere, 2048);
//! res.tune(48000.0, map.center(10), 0.9);
//! assert!(res.delay() >= sonoscan_core::MIN_DELAY);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod acoustics;
pub mod allpass;
pub mod band_map;
pub mod comb;
pub mod delay;
pub mod math;
pub mod noise;
pub mod param;
pub mod resonator;

pub use acoustics::{ColumnAcoustics, DEFAULT_GRID_HEIGHT, DEFAULT_GRID_WIDTH};
pub use allpass::AllpassComb;
pub use band_map::{BandMap, BinWeight};
pub use comb::{FeedbackComb, FeedforwardComb, MAX_FEEDBACK};
pub use delay::{DelayLine, MIN_DELAY, delay_for_frequency};
pub use math::{
    clamp01, constant_power_pan, db_to_linear, flush_denormal, lerp, linear_to_db, peak, rms,
};
pub use noise::NoiseTable;
pub use param::SmoothedParam;
pub use resonator::{Resonator, ResonatorKind, ShapeId, coefficient_for};
