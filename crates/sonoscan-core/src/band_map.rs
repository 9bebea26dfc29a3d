//! Log-spaced frequency band map.
//!
//! Splits `[min_hz, max_hz]` into `num_bands` geometrically spaced bands and
//! precomputes, for every analysis bin `0..=N/2`, both the containing band
//! and a triangular interpolation pair between adjacent band centers.
//!
//! ```text
//! r        = (max / min)^(1/num_bands)
//! edge[i]  = min · r^i            edge[0] = min, edge[num_bands] = max
//! center_b = sqrt(edge[b] · edge[b+1])
//! ```
//!
//! The interpolation weights form a partition of unity: with every band gain
//! at 1.0 the per-bin multiplier is exactly 1.0. Bins outside the band range
//! clamp to the first or last band, so DC and Nyquist are never orphaned.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

/// Lowest frequency a band map accepts as its lower bound.
pub const MIN_BAND_HZ: f32 = 1.0;

/// Interpolation pair for one analysis bin.
///
/// The bin's gain is `(1 - upper_weight)·g[lower] + upper_weight·g[upper]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinWeight {
    /// Band whose center lies at or below the bin frequency.
    pub lower: usize,
    /// Band whose center lies above the bin frequency.
    pub upper: usize,
    /// Weight of `upper`, in `[0, 1)`.
    pub upper_weight: f32,
}

impl BinWeight {
    /// Interpolate a per-band vector at this bin.
    #[inline]
    pub fn apply(&self, values: &[f32]) -> f32 {
        let lo = values[self.lower];
        let hi = values[self.upper];
        lo + (hi - lo) * self.upper_weight
    }
}

/// Order and clamp a frequency range so a band map can be built from it.
///
/// Swaps reversed bounds, replaces non-finite or sub-1 Hz bounds, keeps the
/// upper bound at or below Nyquist, and widens a degenerate range to an
/// octave. The result always satisfies `min < max`.
///
/// ```rust
/// use sonoscan_core::band_map::normalize_range;
///
/// assert_eq!(normalize_range(8000.0, 100.0, 24000.0), (100.0, 8000.0));
/// let (lo, hi) = normalize_range(500.0, 500.0, 24000.0);
/// assert!(lo < hi);
/// ```
pub fn normalize_range(min_hz: f32, max_hz: f32, nyquist: f32) -> (f32, f32) {
    let nyquist = if nyquist.is_finite() && nyquist > 2.0 * MIN_BAND_HZ {
        nyquist
    } else {
        24_000.0
    };
    let sanitize = |f: f32, fallback: f32| {
        if f.is_finite() {
            f.clamp(MIN_BAND_HZ, nyquist)
        } else {
            fallback
        }
    };
    let mut lo = sanitize(min_hz, MIN_BAND_HZ);
    let mut hi = sanitize(max_hz, nyquist);
    if lo > hi {
        core::mem::swap(&mut lo, &mut hi);
    }
    if hi / lo < 1.0001 {
        hi = (lo * 2.0).min(nyquist);
        if hi / lo < 1.0001 {
            lo = hi / 2.0;
        }
    }
    (lo, hi)
}

/// Precomputed band edges and bin lookup tables.
///
/// # Example
///
/// ```rust
/// use sonoscan_core::BandMap;
///
/// let map = BandMap::new(48000.0, 1024, 40, 50.0, 10050.0);
/// assert_eq!(map.num_bands(), 40);
/// assert_eq!(map.num_bins(), 513);
/// assert_eq!(map.band_of_frequency(10.0), 0);
/// assert_eq!(map.band_of_frequency(20000.0), 39);
/// ```
#[derive(Debug, Clone)]
pub struct BandMap {
    sample_rate: f32,
    fft_size: usize,
    min_hz: f32,
    max_hz: f32,
    edges: Vec<f32>,
    centers: Vec<f32>,
    bin_band: Vec<usize>,
    bin_weights: Vec<BinWeight>,
}

impl BandMap {
    /// Build a map for an `fft_size`-point transform at `sample_rate`.
    ///
    /// `num_bands` is raised to at least 1. The range is normalized with
    /// [`normalize_range`].
    pub fn new(sample_rate: f32, fft_size: usize, num_bands: usize, min_hz: f32, max_hz: f32) -> Self {
        let num_bands = num_bands.max(1);
        let fft_size = fft_size.max(2);
        let num_bins = fft_size / 2 + 1;
        let mut map = Self {
            sample_rate,
            fft_size,
            min_hz: 0.0,
            max_hz: 0.0,
            edges: vec![0.0; num_bands + 1],
            centers: vec![0.0; num_bands],
            bin_band: vec![0; num_bins],
            bin_weights: vec![
                BinWeight {
                    lower: 0,
                    upper: 0,
                    upper_weight: 0.0,
                };
                num_bins
            ],
        };
        map.reconfigure(min_hz, max_hz);
        map
    }

    /// Recompute the tables for a new frequency range.
    ///
    /// Works in place on the existing storage, so the render thread may call
    /// it between blocks.
    pub fn reconfigure(&mut self, min_hz: f32, max_hz: f32) {
        let (lo, hi) = normalize_range(min_hz, max_hz, self.sample_rate * 0.5);
        self.min_hz = lo;
        self.max_hz = hi;

        let n = self.centers.len();
        let lo64 = f64::from(lo);
        let ratio = libm::pow(f64::from(hi) / lo64, 1.0 / n as f64);
        for (i, edge) in self.edges.iter_mut().enumerate() {
            *edge = (lo64 * libm::pow(ratio, i as f64)) as f32;
        }
        self.edges[0] = lo;
        self.edges[n] = hi;

        for b in 0..n {
            self.centers[b] = libm::sqrtf(self.edges[b] * self.edges[b + 1]);
        }

        for k in 0..self.bin_band.len() {
            let freq = self.bin_frequency(k);
            self.bin_band[k] = self.band_of_frequency(freq);
            self.bin_weights[k] = self.weight_for_frequency(freq);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(min_hz = lo, max_hz = hi, bands = n, "band map reconfigured");
    }

    fn weight_for_frequency(&self, freq: f32) -> BinWeight {
        let n = self.centers.len();
        let last = n - 1;
        if n == 1 || freq.is_nan() || freq <= self.centers[0] {
            return BinWeight {
                lower: 0,
                upper: 0,
                upper_weight: 0.0,
            };
        }
        if freq >= self.centers[last] {
            return BinWeight {
                lower: last,
                upper: last,
                upper_weight: 0.0,
            };
        }
        // centers[lower] <= freq < centers[lower + 1]
        let lower = self.centers.partition_point(|&c| c <= freq) - 1;
        let upper = lower + 1;
        let span = libm::logf(self.centers[upper] / self.centers[lower]);
        let upper_weight = if span > 0.0 {
            (libm::logf(freq / self.centers[lower]) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        BinWeight {
            lower,
            upper,
            upper_weight,
        }
    }

    /// Band containing `freq_hz`. Below the range maps to band 0, above to
    /// the last band.
    #[inline]
    pub fn band_of_frequency(&self, freq_hz: f32) -> usize {
        let n = self.centers.len();
        self.edges[1..n].partition_point(|&e| e <= freq_hz)
    }

    /// Center frequency of bin `k`.
    #[inline]
    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate / self.fft_size as f32
    }

    /// Band containing bin `k` (`k <= N/2`).
    #[inline]
    pub fn band_of_bin(&self, bin: usize) -> usize {
        self.bin_band[bin]
    }

    /// Interpolation pair for bin `k` (`k <= N/2`).
    #[inline]
    pub fn bin_weight(&self, bin: usize) -> BinWeight {
        self.bin_weights[bin]
    }

    /// All bin interpolation pairs, indexed by bin.
    #[inline]
    pub fn bin_weights(&self) -> &[BinWeight] {
        &self.bin_weights
    }

    /// `[low, high)` frequency bounds of band `b`.
    pub fn band_range(&self, band: usize) -> (f32, f32) {
        (self.edges[band], self.edges[band + 1])
    }

    /// Band edges, `num_bands + 1` strictly increasing values.
    pub fn edges(&self) -> &[f32] {
        &self.edges
    }

    /// Geometric-mean center of each band.
    pub fn centers(&self) -> &[f32] {
        &self.centers
    }

    /// Center frequency of band `b`.
    #[inline]
    pub fn center(&self, band: usize) -> f32 {
        self.centers[band]
    }

    /// Constant ratio between successive edges.
    pub fn ratio(&self) -> f32 {
        libm::powf(self.max_hz / self.min_hz, 1.0 / self.num_bands() as f32)
    }

    /// Number of bands.
    #[inline]
    pub fn num_bands(&self) -> usize {
        self.centers.len()
    }

    /// Number of analysis bins (`N/2 + 1`).
    #[inline]
    pub fn num_bins(&self) -> usize {
        self.bin_band.len()
    }

    /// Transform size the map was built for.
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Sample rate the map was built for.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Normalized lower bound.
    pub fn min_hz(&self) -> f32 {
        self.min_hz
    }

    /// Normalized upper bound.
    pub fn max_hz(&self) -> f32 {
        self.max_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_span_range_exactly() {
        let map = BandMap::new(48000.0, 1024, 40, 50.0, 10050.0);
        assert_eq!(map.edges().len(), 41);
        assert_eq!(map.edges()[0], 50.0);
        assert_eq!(map.edges()[40], 10050.0);
        for pair in map.edges().windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn every_bin_has_a_band() {
        let map = BandMap::new(44100.0, 512, 24, 100.0, 8000.0);
        for k in 0..map.num_bins() {
            assert!(map.band_of_bin(k) < 24);
        }
        assert_eq!(map.band_of_bin(0), 0);
        assert_eq!(map.band_of_bin(map.num_bins() - 1), 23);
    }

    #[test]
    fn band_lookup_respects_edges() {
        let map = BandMap::new(48000.0, 1024, 10, 100.0, 10000.0);
        for b in 0..10 {
            let (lo, hi) = map.band_range(b);
            assert_eq!(map.band_of_frequency(lo), b);
            assert_eq!(map.band_of_frequency(libm::sqrtf(lo * hi)), b);
        }
    }

    #[test]
    fn weights_are_partition_of_unity() {
        let map = BandMap::new(48000.0, 1024, 40, 50.0, 10050.0);
        let ones = vec![1.0f32; 40];
        for w in map.bin_weights() {
            assert!((w.apply(&ones) - 1.0).abs() < 1e-6);
            assert!(w.upper_weight >= 0.0 && w.upper_weight <= 1.0);
            assert!(w.upper == w.lower || w.upper == w.lower + 1);
        }
    }

    #[test]
    fn weights_interpolate_between_centers() {
        // 10 Hz bins; centers at 141.4, 282.8, 565.7, 1131.4 Hz
        let map = BandMap::new(10240.0, 1024, 4, 100.0, 1600.0);

        let below = map.bin_weight(14);
        assert_eq!((below.lower, below.upper), (0, 0));

        let near_second = map.bin_weight(28);
        assert_eq!((near_second.lower, near_second.upper), (0, 1));
        assert!(near_second.upper_weight > 0.95);

        let above = map.bin_weight(200);
        assert_eq!((above.lower, above.upper), (3, 3));
    }

    #[test]
    fn reversed_range_is_reordered() {
        let map = BandMap::new(48000.0, 1024, 8, 4000.0, 200.0);
        assert_eq!(map.min_hz(), 200.0);
        assert_eq!(map.max_hz(), 4000.0);
    }

    #[test]
    fn range_is_capped_at_nyquist() {
        let map = BandMap::new(16000.0, 256, 8, 100.0, 30000.0);
        assert_eq!(map.max_hz(), 8000.0);
    }

    #[test]
    fn degenerate_inputs_still_build() {
        let map = BandMap::new(48000.0, 1024, 0, f32::NAN, f32::INFINITY);
        assert_eq!(map.num_bands(), 1);
        assert!(map.min_hz() < map.max_hz());

        let map = BandMap::new(48000.0, 1024, 16, 24000.0, 24000.0);
        assert!(map.min_hz() < map.max_hz());
    }

    #[test]
    fn reconfigure_keeps_sizes() {
        let mut map = BandMap::new(48000.0, 1024, 40, 50.0, 10050.0);
        map.reconfigure(200.0, 2000.0);
        assert_eq!(map.edges().len(), 41);
        assert_eq!(map.num_bins(), 513);
        assert_eq!(map.edges()[0], 200.0);
        assert_eq!(map.edges()[40], 2000.0);
    }
}
