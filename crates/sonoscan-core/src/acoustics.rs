//! Per-column acoustic description and the depth-to-sound mappings.
//!
//! A scan tick turns one grid column into a [`ColumnAcoustics`]. The
//! functions here are the pure parts of that mapping, kept allocation-free so
//! they can be property tested in isolation.
//!
//! Band indexing is bottom-up: band `r` reads grid row `H-1-r`, so the floor
//! in front of the user lands in the lowest band.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use crate::{ShapeId, clamp01, db_to_linear};

/// Conventional grid width (columns).
pub const DEFAULT_GRID_WIDTH: usize = 60;

/// Conventional grid height (rows, and therefore bands).
pub const DEFAULT_GRID_HEIGHT: usize = 40;

/// Largest reduction of proximity contributed by target coverage.
pub const COVERAGE_PULL: f32 = 0.3;

/// Amplification applied to the mean neighbour depth difference.
pub const EDGE_GAIN: f32 = 4.0;

/// Acoustic parameters for one scanned column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnAcoustics {
    /// Column index in `[0, W)`.
    pub column: usize,
    /// Linear gain per band, derived from depth.
    pub envelope: Vec<f32>,
    /// 1.0 where the dominant shape occupies the band, else 0.0.
    pub target_mask: Vec<f32>,
    /// Dominant non-background shape.
    pub shape: ShapeId,
    /// Stereo position in `[-1, +1]`.
    pub pan: f32,
    /// Normalized proximity in `[0, 1]`, 0 = near.
    pub proximity: f32,
    /// Depth discontinuity strength in `[0, 1]`.
    pub edge: f32,
}

impl ColumnAcoustics {
    /// A silent description with `bands` entries.
    pub fn silent(column: usize, bands: usize) -> Self {
        Self {
            column,
            envelope: vec![0.0; bands],
            target_mask: vec![0.0; bands],
            shape: ShapeId::None,
            pan: 0.0,
            proximity: 1.0,
            edge: 0.0,
        }
    }

    /// Number of bands described.
    pub fn bands(&self) -> usize {
        self.envelope.len()
    }

    /// Fraction of bands covered by the target, in `[0, 1]`.
    pub fn coverage(&self) -> f32 {
        coverage(&self.target_mask)
    }
}

/// Normalized closeness `t = clamp01(1 - (d - near)/(far - near))`.
///
/// 1 at or nearer than `near`, 0 at or beyond `far`. Invalid depth (zero,
/// negative or non-finite) reads as far. A degenerate range (`far <= near`)
/// collapses to a step at `near`.
///
/// ```rust
/// use sonoscan_core::acoustics::closeness;
///
/// let t = closeness(1.0, 0.3, 4.0);
/// assert!((t - 0.8108).abs() < 1e-3);
/// assert_eq!(closeness(0.0, 0.3, 4.0), 0.0);
/// ```
#[inline]
pub fn closeness(depth: f32, near: f32, far: f32) -> f32 {
    if !depth.is_finite() || depth <= 0.0 {
        return 0.0;
    }
    let range = far - near;
    if range.is_nan() || range <= 0.0 {
        return if depth <= near { 1.0 } else { 0.0 };
    }
    clamp01(1.0 - (depth - near) / range)
}

/// Linear gain for depth: `10^(-gain_range_db·(1 - t)/20)`.
///
/// Monotonic: nearer never yields less gain. Unity at `near`,
/// `-gain_range_db` at `far`.
#[inline]
pub fn depth_to_gain(depth: f32, near: f32, far: f32, gain_range_db: f32) -> f32 {
    let t = closeness(depth, near, far);
    db_to_linear(-gain_range_db.abs() * (1.0 - t))
}

/// Symmetric exponential smoothing across bands.
///
/// A forward pass `e[i] = a·e[i-1] + (1-a)·e[i]` followed by the same pass
/// backwards. A constant vector is left unchanged. `decay` is clamped to
/// `[0, 1)`; 0 disables smoothing.
pub fn smooth_across_bands(values: &mut [f32], decay: f32) {
    let a = if decay.is_finite() { decay.clamp(0.0, 0.999) } else { 0.0 };
    if a == 0.0 || values.len() < 2 {
        return;
    }
    let b = 1.0 - a;
    for i in 1..values.len() {
        values[i] = a * values[i - 1] + b * values[i];
    }
    for i in (0..values.len() - 1).rev() {
        values[i] = a * values[i + 1] + b * values[i];
    }
}

/// Pan for column `column` of `width`: left edge -1, right edge +1.
///
/// A single-column grid pans to center.
#[inline]
pub fn column_pan(column: usize, width: usize) -> f32 {
    if width < 2 {
        return 0.0;
    }
    let c = column.min(width - 1) as f32;
    -1.0 + 2.0 * c / (width - 1) as f32
}

/// Fraction of mask entries that are set (> 0.5).
#[inline]
pub fn coverage(mask: &[f32]) -> f32 {
    if mask.is_empty() {
        return 0.0;
    }
    let set = mask.iter().filter(|&&m| m > 0.5).count();
    set as f32 / mask.len() as f32
}

/// Proximity: mean normalized distance pulled nearer by target coverage.
///
/// `z01 = clamp01(mean_distance - COVERAGE_PULL · coverage)`
#[inline]
pub fn proximity(mean_distance: f32, coverage: f32) -> f32 {
    clamp01(mean_distance - COVERAGE_PULL * clamp01(coverage))
}

/// Edge strength from the mean absolute neighbour depth difference.
///
/// `clamp01(EDGE_GAIN · mean_abs_diff / (far - near))`
#[inline]
pub fn edge_strength(mean_abs_diff: f32, near: f32, far: f32) -> f32 {
    let range = far - near;
    if range.is_nan() || range <= 0.0 {
        return 0.0;
    }
    clamp01(EDGE_GAIN * mean_abs_diff / range)
}
