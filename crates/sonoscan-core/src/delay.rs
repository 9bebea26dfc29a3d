//! Circular delay line with a runtime-adjustable length.
//!
//! The resonators retune every time the scanned object changes, and retuning
//! happens on the render thread. [`DelayLine`] therefore allocates its full
//! capacity once and only moves the active length `M` afterwards.
//!
//! Invariants:
//!
//! - `1 <= len() <= capacity()`
//! - the cursor always lies in `[0, len())`
//!
//! With an active length `M`, [`DelayLine::read`] returns the sample written
//! exactly `M` writes ago, i.e. `x[n-M]`.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

/// Shortest delay a resonator may be tuned to, in samples.
pub const MIN_DELAY: usize = 2;

/// Fixed-capacity circular delay line.
///
/// # Example
///
/// ```rust
/// use sonoscan_core::DelayLine;
///
/// let mut line = DelayLine::new(64);
/// line.set_len(3);
/// for x in [1.0, 2.0, 3.0] {
///     line.tick(x);
/// }
/// assert_eq!(line.read(), 1.0); // written three samples ago
/// ```
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    len: usize,
    pos: usize,
}

impl DelayLine {
    /// Allocate a delay line able to hold up to `capacity` samples.
    ///
    /// A capacity of zero is raised to one. The active length starts at the
    /// full capacity.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: vec![0.0; capacity],
            len: capacity,
            pos: 0,
        }
    }

    /// Set the active delay length, clamped to `[1, capacity]`.
    ///
    /// Never allocates. The cursor is folded back into the new range so
    /// indexing stays valid; existing contents are kept, which produces a
    /// short transient rather than silence.
    pub fn set_len(&mut self, len: usize) {
        let len = len.clamp(1, self.buffer.len());
        if len != self.len {
            self.len = len;
            self.pos %= len;
        }
    }

    /// Active delay length `M`.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; a delay line holds at least one sample.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Maximum delay length.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// The sample written `len()` writes ago.
    #[inline]
    pub fn read(&self) -> f32 {
        self.buffer[self.pos]
    }

    /// Write a sample and advance the cursor.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.pos] = sample;
        self.pos += 1;
        if self.pos >= self.len {
            self.pos = 0;
        }
    }

    /// Read `x[n-M]` then write `sample`; returns the read value.
    #[inline]
    pub fn tick(&mut self, sample: f32) -> f32 {
        let out = self.read();
        self.write(sample);
        out
    }

    /// Zero the whole buffer and reset the cursor.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.pos = 0;
    }
}

/// Delay length in samples that tunes a comb to fundamental `freq_hz`.
///
/// `M = round(sample_rate / f0)`, clamped to `[MIN_DELAY, max_len]`.
/// Non-finite or non-positive frequencies map to `max_len` (lowest pitch).
///
/// ```rust
/// use sonoscan_core::delay_for_frequency;
///
/// assert_eq!(delay_for_frequency(48000.0, 480.0, 2048), 100);
/// assert_eq!(delay_for_frequency(48000.0, 0.0, 2048), 2048);
/// assert_eq!(delay_for_frequency(48000.0, 1.0e9, 2048), 2);
/// ```
pub fn delay_for_frequency(sample_rate: f32, freq_hz: f32, max_len: usize) -> usize {
    let max_len = max_len.max(MIN_DELAY);
    if !freq_hz.is_finite() || freq_hz <= 0.0 || !sample_rate.is_finite() || sample_rate <= 0.0 {
        return max_len;
    }
    let samples = libm::roundf(sample_rate / freq_hz);
    if samples >= max_len as f32 {
        max_len
    } else {
        (samples as usize).max(MIN_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_by_active_length() {
        let mut line = DelayLine::new(16);
        line.set_len(4);
        let mut out = Vec::new();
        for i in 0..8 {
            out.push(line.tick(i as f32 + 1.0));
        }
        assert_eq!(out, vec![0.0, 0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn zero_capacity_is_raised() {
        let line = DelayLine::new(0);
        assert_eq!(line.capacity(), 1);
        assert_eq!(line.len(), 1);
    }

    #[test]
    fn set_len_clamps_and_keeps_cursor_in_range() {
        let mut line = DelayLine::new(10);
        for _ in 0..7 {
            line.write(1.0);
        }
        line.set_len(0);
        assert_eq!(line.len(), 1);
        line.set_len(500);
        assert_eq!(line.len(), 10);
        line.set_len(3);
        // 1000 writes must never index out of range
        for _ in 0..1000 {
            line.tick(0.5);
        }
        assert_eq!(line.read(), 0.5);
    }

    #[test]
    fn clear_silences() {
        let mut line = DelayLine::new(8);
        for _ in 0..8 {
            line.write(1.0);
        }
        line.clear();
        for _ in 0..8 {
            assert_eq!(line.tick(0.0), 0.0);
        }
    }
}
