//! Comb filters used as object "signature" generators.
//!
//! Both filters run on a [`DelayLine`] whose capacity is allocated up front,
//! so they can be retuned from the render thread.
//!
//! ```text
//! FeedbackComb:     y[n] = x[n] + g · y[n-M]      (pitched, sustained)
//! FeedforwardComb:  y[n] = x[n] + α · x[n-M]      (notched, metallic)
//! ```

use crate::DelayLine;
use crate::flush_denormal;

/// Largest feedback gain accepted by [`FeedbackComb`].
pub const MAX_FEEDBACK: f32 = 0.98;

/// Recursive comb: `y[n] = x[n] + g·y[n-M]`.
///
/// Produces a harmonic series at `sample_rate / M`. Feedback near 0.9 gives a
/// warm sustained tone from a noise excitation.
///
/// # Example
///
/// ```rust
/// use sonoscan_core::FeedbackComb;
///
/// let mut comb = FeedbackComb::new(2048);
/// comb.set_delay(100);
/// comb.set_feedback(0.9);
/// let out = comb.process(1.0);
/// assert_eq!(out, 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct FeedbackComb {
    delay: DelayLine,
    feedback: f32,
}

impl FeedbackComb {
    /// Create a comb with room for delays up to `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            delay: DelayLine::new(capacity),
            feedback: 0.9,
        }
    }

    /// Set the loop delay `M` in samples (clamped to the capacity).
    #[inline]
    pub fn set_delay(&mut self, samples: usize) {
        self.delay.set_len(samples);
    }

    /// Set the feedback gain, clamped to `[0, MAX_FEEDBACK]`.
    #[inline]
    pub fn set_feedback(&mut self, feedback: f32) {
        if feedback.is_finite() {
            self.feedback = feedback.clamp(0.0, MAX_FEEDBACK);
        }
    }

    /// Current feedback gain.
    #[inline]
    pub fn feedback(&self) -> f32 {
        self.feedback
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
        let output = input + self.feedback * self.delay.read();
        self.delay.write(flush_denormal(output));
        output
    }

    /// Zero the delay line and reset the cursor.
    pub fn clear(&mut self) {
        self.delay.clear();
    }
}

/// Non-recursive comb: `y[n] = x[n] + α·x[n-M]`.
///
/// Always stable. Two of these at incommensurate delays give the inharmonic
/// color used for the triangle signature.
#[derive(Debug, Clone)]
pub struct FeedforwardComb {
    delay: DelayLine,
    gain: f32,
}

impl FeedforwardComb {
    /// Create a comb with room for delays up to `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            delay: DelayLine::new(capacity),
            gain: 0.7,
        }
    }

    /// Set the delay `M` in samples (clamped to the capacity).
    #[inline]
    pub fn set_delay(&mut self, samples: usize) {
        self.delay.set_len(samples);
    }

    /// Set the feed-forward gain, clamped to `[-1, 1]`.
    #[inline]
    pub fn set_gain(&mut self, gain: f32) {
        if gain.is_finite() {
            self.gain = gain.clamp(-1.0, 1.0);
        }
    }

    /// Current feed-forward gain.
    #[inline]
    pub fn gain(&self) -> f32 {
        self.gain
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
        let delayed = self.delay.tick(input);
        input + self.gain * delayed
    }

    /// Zero the delay line and reset the cursor.
    pub fn clear(&mut self) {
        self.delay.clear();
    }
}
