//! Precomputed excitation noise.
//!
//! Drawing from a per-sample RNG in the render loop is wasted work when the
//! excitation only needs to be broadband. [`NoiseTable`] fills a table once
//! with xorshift32 noise and then walks it with a large prime stride, so
//! consecutive reads are decorrelated. Each time a full cycle of `len` draws
//! completes, the walk jumps to a fresh xorshift offset, so frames read at
//! a fixed spacing never line up with an earlier pass.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec::Vec;

/// Default table length.
pub const DEFAULT_TABLE_LEN: usize = 16384;

/// Default read stride. Prime, so it is coprime with any power-of-two length.
pub const DEFAULT_STRIDE: usize = 7919;

/// Fixed table of uniform noise in `[-1, 1]` read with a prime stride.
///
/// # Example
///
/// ```rust
/// use sonoscan_core::NoiseTable;
///
/// let mut noise = NoiseTable::new(4096, 0x1234_5678);
/// let mut block = [0.0f32; 256];
/// noise.fill(&mut block);
/// assert!(block.iter().all(|s| (-1.0..=1.0).contains(s)));
/// ```
#[derive(Debug, Clone)]
pub struct NoiseTable {
    table: Vec<f32>,
    stride: usize,
    cursor: usize,
    drawn: usize,
    state: u32,
    seed_state: u32,
}

#[inline]
fn xorshift32(state: &mut u32) -> u32 {
    *state ^= *state << 13;
    *state ^= *state >> 17;
    *state ^= *state << 5;
    *state
}

impl NoiseTable {
    /// Build a table of `len` samples from `seed`.
    ///
    /// A zero seed is replaced with a fixed non-zero one (xorshift has an
    /// all-zero fixed point).
    pub fn new(len: usize, seed: u32) -> Self {
        Self::with_stride(len, seed, DEFAULT_STRIDE)
    }

    /// Build a table with an explicit read stride.
    pub fn with_stride(len: usize, seed: u32, stride: usize) -> Self {
        let len = len.max(1);
        let mut state = if seed == 0 { 0x1234_5678 } else { seed };
        let table = (0..len)
            .map(|_| (xorshift32(&mut state) as i32 as f32) / (i32::MAX as f32))
            .map(|s| s.clamp(-1.0, 1.0))
            .collect();
        let stride = match stride % len {
            0 => 1,
            s => s,
        };
        Self {
            table,
            stride,
            cursor: 0,
            drawn: 0,
            state,
            seed_state: state,
        }
    }

    /// Next sample in the strided walk.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let out = self.table[self.cursor];
        self.cursor += self.stride;
        let len = self.table.len();
        if self.cursor >= len {
            self.cursor %= len;
        }
        self.drawn += 1;
        if self.drawn == len {
            self.drawn = 0;
            if len > 1 {
                let jump = 1 + xorshift32(&mut self.state) as usize % (len - 1);
                self.cursor = (self.cursor + jump) % len;
            }
        }
        out
    }

    /// Fill `out` with consecutive samples.
    #[inline]
    pub fn fill(&mut self, out: &mut [f32]) {
        for s in out.iter_mut() {
            *s = self.next_sample();
        }
    }

    /// Restart the walk from the first entry.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.drawn = 0;
        self.state = self.seed_state;
    }

    /// Table length.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Always false; the table holds at least one sample.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for NoiseTable {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE_LEN, 0x1234_5678)
    }
}
