//! Mathematical utility functions for DSP.
//!
//! All functions are allocation-free and suitable for `no_std`.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//!
//! # Panning
//!
//! - [`constant_power_pan`] - Sine/cosine pan law with `gL² + gR² = 1`.
//!   Channel convention: `pan = -1` is fully right, `pan = +1` fully left.
//!
//! # Utilities
//!
//! - [`clamp01`] - Clamp to the unit interval, mapping NaN to 0
//! - [`lerp`] - Linear interpolation
//! - [`flush_denormal`] - Subnormal protection for feedback paths

use libm::{cosf, expf, logf, sinf};

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use sonoscan_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// Inputs at or below `1e-10` are floored to avoid `-inf`.
///
/// # Example
/// ```rust
/// use sonoscan_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Clamp a value to `[0, 1]`. NaN maps to 0.
#[inline]
pub fn clamp01(x: f32) -> f32 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

/// Linear interpolation between `a` (t=0) and `b` (t=1).
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Constant-power pan gains for a pan position in `[-1, +1]`.
///
/// ```text
/// θ  = (pan + 1) · π/4
/// gL = sin θ
/// gR = cos θ
/// ```
///
/// The pair always satisfies `gL² + gR² = 1`, so perceived loudness does not
/// dip at the center. Out-of-range and NaN inputs are clamped first.
///
/// Note the channel convention: `pan = -1` gives `(0, 1)`, all right, and
/// `pan = +1` gives `(1, 0)`, all left. Scan column 0 maps to `pan = -1`;
/// swap the output channels to hear the sweep run left to right.
///
/// # Example
/// ```rust
/// use sonoscan_core::constant_power_pan;
///
/// let (l, r) = constant_power_pan(0.0);
/// assert!((l - r).abs() < 1e-6);
/// assert!((l * l + r * r - 1.0).abs() < 1e-6);
///
/// let (l, r) = constant_power_pan(-1.0);
/// assert!(l.abs() < 1e-6 && (r - 1.0).abs() < 1e-6);
/// ```
#[inline]
pub fn constant_power_pan(pan: f32) -> (f32, f32) {
    let pan = if pan.is_nan() { 0.0 } else { pan.clamp(-1.0, 1.0) };
    let theta = (pan + 1.0) * core::f32::consts::FRAC_PI_4;
    (sinf(theta), cosf(theta))
}

/// Flush subnormal (denormalized) floats to zero.
///
/// Values below 1e-20 are replaced with zero, leaving margin before the
/// IEEE 754 subnormal range. Use in feedback loops where signal decays
/// indefinitely toward zero.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}

/// Root-mean-square level of a block. Returns 0 for an empty slice.
#[inline]
pub fn rms(block: &[f32]) -> f32 {
    if block.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = block.iter().map(|&s| s * s).sum();
    libm::sqrtf(sum_sq / block.len() as f32)
}

/// Absolute peak of a block. Returns 0 for an empty slice.
#[inline]
pub fn peak(block: &[f32]) -> f32 {
    block.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()))
}
