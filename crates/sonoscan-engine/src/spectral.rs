//! Windowed FFT shaping of one analysis frame.
//!
//! [`SpectralShaper`] holds the FFT plans, the analysis window and every
//! scratch buffer, so [`shape`](SpectralShaper::shape) runs without
//! allocating. Output frames are scaled by `1/N` (rustfft leaves the inverse
//! unnormalized) and by `hop / Σw`, which makes a hop-spaced overlap-add of
//! unmodified frames reproduce the input.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Smallest supported frame size.
pub const MIN_FFT_SIZE: usize = 16;

/// Periodic Hann window of `size` points.
///
/// The periodic form (divisor `N`, not `N-1`) sums to a constant at any hop
/// that divides `N/2`.
pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / size as f32).cos()))
        .collect()
}

/// Hann-windowed forward FFT, per-bin gain, inverse FFT.
pub struct SpectralShaper {
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    hop: usize,
    scale: f32,
}

impl SpectralShaper {
    /// Plan an `fft_size`-point shaper with hop `fft_size / 4`.
    ///
    /// `fft_size` is raised to [`MIN_FFT_SIZE`] and rounded down to a
    /// multiple of 4.
    pub fn new(fft_size: usize) -> Self {
        let size = (fft_size.max(MIN_FFT_SIZE) / 4) * 4;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let ifft = planner.plan_fft_inverse(size);
        let scratch_len = fft
            .get_inplace_scratch_len()
            .max(ifft.get_inplace_scratch_len());

        let window = hann_window(size);
        let hop = size / 4;
        let overlap = window.iter().sum::<f32>() / hop as f32;
        let scale = 1.0 / (size as f32 * overlap);

        Self {
            fft,
            ifft,
            window,
            buffer: vec![Complex::new(0.0, 0.0); size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            hop,
            scale,
        }
    }

    /// Frame length `N`.
    pub fn fft_size(&self) -> usize {
        self.window.len()
    }

    /// Hop between frames, `N / 4`.
    pub fn hop(&self) -> usize {
        self.hop
    }

    /// Number of non-negative frequency bins, `N/2 + 1`.
    pub fn num_bins(&self) -> usize {
        self.window.len() / 2 + 1
    }

    /// Analysis window.
    pub fn window(&self) -> &[f32] {
        &self.window
    }

    /// Output scale, `1 / (N · Σw / hop)`.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Shape one frame.
    ///
    /// `input` and `output` hold `N` samples, `bin_gains` holds `N/2 + 1`
    /// real multipliers. Each gain is applied to its bin and to the mirrored
    /// negative-frequency bin, so the inverse stays real.
    pub fn shape(&mut self, input: &[f32], bin_gains: &[f32], output: &mut [f32]) {
        let n = self.window.len();
        debug_assert!(input.len() >= n && output.len() >= n);
        debug_assert!(bin_gains.len() >= n / 2 + 1);

        for ((c, &x), &w) in self.buffer.iter_mut().zip(input).zip(&self.window) {
            *c = Complex::new(x * w, 0.0);
        }
        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        let half = n / 2;
        self.buffer[0] *= bin_gains[0];
        self.buffer[half] *= bin_gains[half];
        for k in 1..half {
            let g = bin_gains[k];
            self.buffer[k] *= g;
            self.buffer[n - k] *= g;
        }

        self.ifft.process_with_scratch(&mut self.buffer, &mut self.scratch);
        for (y, c) in output.iter_mut().zip(&self.buffer) {
            *y = c.re * self.scale;
        }
    }
}
