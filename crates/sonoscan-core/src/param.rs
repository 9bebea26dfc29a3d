//! Parameter smoothing for zipper-free control changes.
//!
//! Control values arrive from the scan thread in steps (one per scan tick).
//! Applying them directly would produce audible clicks, so every control the
//! render loop consumes goes through a [`SmoothedParam`].
//!
//! Two ways to configure the one-pole response:
//!
//! - **Retain factor** ([`SmoothedParam::with_factor`]): the fraction of the
//!   previous value kept on every [`advance`](SmoothedParam::advance). Used
//!   for per-block smoothing where the step rate is the render block rate.
//! - **Time constant** ([`SmoothedParam::with_config`]): sample rate plus a
//!   smoothing time in milliseconds, for per-sample smoothing.
//!
//! ```rust
//! use sonoscan_core::SmoothedParam;
//!
//! // Envelope smoothing: keep 85% of the previous block's value.
//! let mut band = SmoothedParam::with_factor(0.0, 0.85);
//! band.set_target(1.0);
//! let first = band.advance();
//! assert!((first - 0.15).abs() < 1e-6);
//! ```

use libm::expf;

/// A parameter with built-in one-pole smoothing.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    /// Current smoothed value
    current: f32,
    /// Target value we're smoothing towards
    target: f32,
    /// Step coefficient (1 = instant, ~0 = very slow)
    coeff: f32,
}

impl SmoothedParam {
    /// Create a parameter that snaps instantly to new targets.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
        }
    }

    /// Create a parameter that keeps `retain` of its previous value per step.
    ///
    /// `retain` is clamped to `[0, 1)`; 0 means no smoothing.
    pub fn with_factor(initial: f32, retain: f32) -> Self {
        let mut param = Self::new(initial);
        param.set_factor(retain);
        param
    }

    /// Create a per-sample parameter from sample rate and time constant.
    ///
    /// `coeff = 1 - exp(-1 / (tau * sample_rate))` with `tau` in seconds.
    /// After 5·tau the value is within 0.7% of the target. A non-positive
    /// time or sample rate disables smoothing.
    pub fn with_config(initial: f32, sample_rate: f32, smoothing_time_ms: f32) -> Self {
        let mut param = Self::new(initial);
        if smoothing_time_ms > 0.0 && sample_rate > 0.0 {
            let samples = smoothing_time_ms / 1000.0 * sample_rate;
            param.coeff = 1.0 - expf(-1.0 / samples);
        }
        param
    }

    /// Change the retain factor without touching the current value.
    pub fn set_factor(&mut self, retain: f32) {
        let retain = if retain.is_finite() { retain.clamp(0.0, 0.9999) } else { 0.0 };
        self.coeff = 1.0 - retain;
    }

    /// Set the target value (parameter will smooth towards this).
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        if target.is_finite() {
            self.target = target;
        }
    }

    /// Set target and immediately snap to it (no smoothing).
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        if value.is_finite() {
            self.target = value;
            self.current = value;
        }
    }

    /// Advance one step and return the new smoothed value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        // y[n] = y[n-1] + coeff * (target - y[n-1])
        self.current += self.coeff * (self.target - self.current);
        if (self.current - self.target).abs() < 1e-9 {
            self.current = self.target;
        }
        self.current
    }

    /// Current smoothed value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Whether the value has reached its target (within 1e-6).
    #[inline]
    pub fn is_settled(&self) -> bool {
        (self.current - self.target).abs() < 1e-6
    }

    /// Jump to the target value.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}
