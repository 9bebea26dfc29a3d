//! All-pass comb for the diffuse, percussive cube signature.
//!
//! Difference equation:
//!
//! ```text
//! y[n] = -a·x[n] + x[n-M] + a·y[n-M]
//! ```
//!
//! Implemented in the single-delay canonical form
//!
//! ```text
//! w[n] = x[n] + a·w[n-M]
//! y[n] = -a·w[n] + w[n-M]
//! ```
//!
//! which has the same transfer function `(z^-M - a) / (1 - a·z^-M)` and
//! needs only one delay line.

use crate::DelayLine;
use crate::flush_denormal;

/// Schroeder all-pass comb with unit magnitude response.
///
/// # Example
///
/// ```rust
/// use sonoscan_core::AllpassComb;
///
/// let mut ap = AllpassComb::new(512);
/// ap.set_delay(20);
/// ap.set_coefficient(0.5);
/// assert!((ap.process(1.0) + 0.5).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct AllpassComb {
    delay: DelayLine,
    coefficient: f32,
}

impl AllpassComb {
    /// Create an all-pass with room for delays up to `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            delay: DelayLine::new(capacity),
            coefficient: 0.6,
        }
    }

    /// Set the delay `M` in samples (clamped to the capacity).
    #[inline]
    pub fn set_delay(&mut self, samples: usize) {
        self.delay.set_len(samples);
    }

    /// Set the coefficient `a`. Stable for `|a| < 1`; clamped to ±0.98.
    #[inline]
    pub fn set_coefficient(&mut self, a: f32) {
        if a.is_finite() {
            self.coefficient = a.clamp(-0.98, 0.98);
        }
    }

    /// Current coefficient.
    #[inline]
    pub fn coefficient(&self) -> f32 {
        self.coefficient
    }

    /// Active delay length in samples.
    #[inline]
    pub fn delay(&self) -> usize {
        self.delay.len()
    }

    /// Longest delay this filter can be tuned to.
    pub fn capacity(&self) -> usize {
        self.delay.capacity()
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let delayed = self.delay.read();
        let w = flush_denormal(input + self.coefficient * delayed);
        self.delay.write(w);
        -self.coefficient * w + delayed
    }

    /// Zero the delay line and reset the cursor.
    pub fn clear(&mut self) {
        self.delay.clear();
    }
}
