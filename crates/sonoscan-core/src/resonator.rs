//! Shape-keyed resonator families.
//!
//! Every recognized object shape has its own timbre, produced by driving one
//! resonator family with the shared noise excitation:
//!
//! | Shape        | Family        | Character                         |
//! |--------------|---------------|-----------------------------------|
//! | 1 (sphere)   | Feedback comb | warm, sustained, pitched          |
//! | 2 (triangle) | Two FF combs  | inharmonic, metallic              |
//! | 3 (cube)     | All-pass comb | diffuse, percussive (with dry mix) |
//!
//! [`Resonator`] is a closed enum over the families; the render loop matches
//! on it instead of going through a trait object.

use crate::{AllpassComb, FeedbackComb, FeedforwardComb, clamp01, delay_for_frequency};

/// Lowest feedback gain used for the sphere family (far objects).
pub const FEEDBACK_MIN: f32 = 0.8;
/// Highest feedback gain used for the sphere family (near objects).
pub const FEEDBACK_MAX: f32 = 0.95;
/// Feed-forward gain of both triangle combs.
pub const FEEDFORWARD_GAIN: f32 = 0.7;
/// All-pass coefficient of the cube family.
pub const ALLPASS_COEFFICIENT: f32 = 0.6;
/// Dry fraction mixed into the cube family output.
pub const ALLPASS_DRY: f32 = 0.3;

/// Ratio between the two triangle comb delays.
const FEEDFORWARD_SPREAD: f32 = core::f32::consts::SQRT_2;

/// Object shape id as produced by the segmenter.
///
/// ```rust
/// use sonoscan_core::ShapeId;
///
/// assert_eq!(ShapeId::from_id(2), ShapeId::Triangle);
/// assert_eq!(ShapeId::from_id(9), ShapeId::None);
/// assert_eq!(ShapeId::Cube.family_index(), Some(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ShapeId {
    /// Background or unknown class.
    #[default]
    None = 0,
    /// Class 1.
    Sphere = 1,
    /// Class 2.
    Triangle = 2,
    /// Class 3.
    Cube = 3,
}

impl ShapeId {
    /// Shapes that own a resonator family, in family-index order.
    pub const FAMILIES: [ShapeId; 3] = [ShapeId::Sphere, ShapeId::Triangle, ShapeId::Cube];

    /// Map a raw class id. Unknown ids map to [`ShapeId::None`].
    pub fn from_id(id: u8) -> Self {
        match id {
            1 => Self::Sphere,
            2 => Self::Triangle,
            3 => Self::Cube,
            _ => Self::None,
        }
    }

    /// Raw class id.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Index into per-family arrays, `None` for background.
    pub fn family_index(self) -> Option<usize> {
        match self {
            Self::None => None,
            shape => Some(shape as usize - 1),
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Sphere => "sphere",
            Self::Triangle => "triangle",
            Self::Cube => "cube",
        }
    }
}

/// Filter topology of a resonator family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResonatorKind {
    /// No filter; output is silence.
    None,
    /// Recursive comb.
    Feedback,
    /// Pair of feed-forward combs.
    FeedForward,
    /// All-pass comb with dry mix.
    AllPass,
}

/// Default coefficient for a family at proximity `z01` (0 = near).
///
/// Only the sphere family depends on distance: its feedback rises from
/// [`FEEDBACK_MIN`] to [`FEEDBACK_MAX`] as the object approaches, so near
/// objects ring longer.
pub fn coefficient_for(shape: ShapeId, z01: f32) -> f32 {
    match shape {
        ShapeId::None => 0.0,
        ShapeId::Sphere => FEEDBACK_MIN + (FEEDBACK_MAX - FEEDBACK_MIN) * (1.0 - clamp01(z01)),
        ShapeId::Triangle => FEEDFORWARD_GAIN,
        ShapeId::Cube => ALLPASS_COEFFICIENT,
    }
}

/// One resonator family with its delay-line state.
///
/// # Example
///
/// ```rust
/// use sonoscan_core::{Resonator, ShapeId};
///
/// let mut res = Resonator::for_shape(ShapeId::Sphere, 2048);
/// res.tune(48000.0, 440.0, 0.9);
/// assert_eq!(res.delay(), 109);
/// let y = res.process(1.0);
/// assert_eq!(y, Some(1.0));
/// ```
#[derive(Debug, Clone)]
pub enum Resonator {
    /// Silent placeholder.
    None,
    /// Sphere signature.
    Feedback {
        /// Recursive comb.
        comb: FeedbackComb,
    },
    /// Triangle signature.
    FeedForward {
        /// Comb at delay `M`.
        primary: FeedforwardComb,
        /// Comb at delay `round(M·√2)`.
        secondary: FeedforwardComb,
    },
    /// Cube signature.
    AllPass {
        /// All-pass comb.
        allpass: AllpassComb,
        /// Dry fraction in `[0, 1]`.
        dry: f32,
    },
}

impl Resonator {
    /// Allocate the family for `shape` with delay lines of `capacity` samples.
    pub fn for_shape(shape: ShapeId, capacity: usize) -> Self {
        match shape {
            ShapeId::None => Self::None,
            ShapeId::Sphere => {
                let mut comb = FeedbackComb::new(capacity);
                comb.set_feedback(coefficient_for(shape, 1.0));
                Self::Feedback { comb }
            }
            ShapeId::Triangle => {
                let mut primary = FeedforwardComb::new(capacity);
                let mut secondary = FeedforwardComb::new(capacity);
                primary.set_gain(FEEDFORWARD_GAIN);
                secondary.set_gain(FEEDFORWARD_GAIN);
                Self::FeedForward { primary, secondary }
            }
            ShapeId::Cube => {
                let mut allpass = AllpassComb::new(capacity);
                allpass.set_coefficient(ALLPASS_COEFFICIENT);
                Self::AllPass {
                    allpass,
                    dry: ALLPASS_DRY,
                }
            }
        }
    }

    /// Filter topology.
    pub fn kind(&self) -> ResonatorKind {
        match self {
            Self::None => ResonatorKind::None,
            Self::Feedback { .. } => ResonatorKind::Feedback,
            Self::FeedForward { .. } => ResonatorKind::FeedForward,
            Self::AllPass { .. } => ResonatorKind::AllPass,
        }
    }

    /// Tune to fundamental `f0` with the given coefficient.
    ///
    /// The delay is `round(sample_rate / f0)` clamped to
    /// `[MIN_DELAY, capacity - 1]`.
    pub fn tune(&mut self, sample_rate: f32, f0: f32, coefficient: f32) {
        let max_len = self.capacity().saturating_sub(1);
        let delay = delay_for_frequency(sample_rate, f0, max_len);
        self.configure(delay, coefficient);
    }

    /// Set delay length (samples) and coefficient directly.
    pub fn configure(&mut self, delay: usize, coefficient: f32) {
        match self {
            Self::None => {}
            Self::Feedback { comb } => {
                comb.set_delay(delay);
                comb.set_feedback(coefficient);
            }
            Self::FeedForward { primary, secondary } => {
                primary.set_delay(delay);
                secondary.set_delay(libm::roundf(delay as f32 * FEEDFORWARD_SPREAD) as usize);
                primary.set_gain(coefficient);
                secondary.set_gain(coefficient);
            }
            Self::AllPass { allpass, .. } => {
                allpass.set_delay(delay);
                allpass.set_coefficient(coefficient);
            }
        }
    }

    /// Primary delay length `M`, 0 for [`Resonator::None`].
    pub fn delay(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Feedback { comb } => comb.delay(),
            Self::FeedForward { primary, .. } => primary.delay(),
            Self::AllPass { allpass, .. } => allpass.delay(),
        }
    }

    /// Capacity of the delay lines backing this family, 0 for `None`.
    pub fn capacity(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Feedback { comb } => comb.capacity(),
            Self::FeedForward { primary, .. } => primary.capacity(),
            Self::AllPass { allpass, .. } => allpass.capacity(),
        }
    }

    /// Process one sample.
    ///
    /// Returns `None` when the output is non-finite; the delay lines have
    /// then already been cleared and the caller should substitute silence.
    #[inline]
    pub fn process(&mut self, input: f32) -> Option<f32> {
        let out = match self {
            Self::None => return Some(0.0),
            Self::Feedback { comb } => comb.process(input),
            Self::FeedForward { primary, secondary } => {
                0.5 * (primary.process(input) + secondary.process(input))
            }
            Self::AllPass { allpass, dry } => {
                let wet = allpass.process(input);
                *dry * input + (1.0 - *dry) * wet
            }
        };
        if out.is_finite() {
            Some(out)
        } else {
            self.clear();
            None
        }
    }

    /// Zero every delay line and reset cursors.
    pub fn clear(&mut self) {
        match self {
            Self::None => {}
            Self::Feedback { comb } => comb.clear(),
            Self::FeedForward { primary, secondary } => {
                primary.clear();
                secondary.clear();
            }
            Self::AllPass { allpass, .. } => allpass.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_mapping() {
        assert_eq!(ShapeId::from_id(0), ShapeId::None);
        assert_eq!(ShapeId::from_id(1), ShapeId::Sphere);
        assert_eq!(ShapeId::from_id(3), ShapeId::Cube);
        assert_eq!(ShapeId::None.family_index(), None);
        for (i, shape) in ShapeId::FAMILIES.iter().enumerate() {
            assert_eq!(shape.family_index(), Some(i));
            assert_eq!(ShapeId::from_id(shape.id()), *shape);
        }
    }

    #[test]
    fn family_per_shape() {
        assert_eq!(Resonator::for_shape(ShapeId::None, 64).kind(), ResonatorKind::None);
        assert_eq!(
            Resonator::for_shape(ShapeId::Sphere, 64).kind(),
            ResonatorKind::Feedback
        );
        assert_eq!(
            Resonator::for_shape(ShapeId::Triangle, 64).kind(),
            ResonatorKind::FeedForward
        );
        assert_eq!(
            Resonator::for_shape(ShapeId::Cube, 64).kind(),
            ResonatorKind::AllPass
        );
    }

    #[test]
    fn sphere_feedback_rises_when_near() {
        let far = coefficient_for(ShapeId::Sphere, 1.0);
        let near = coefficient_for(ShapeId::Sphere, 0.0);
        assert!((far - FEEDBACK_MIN).abs() < 1e-6);
        assert!((near - FEEDBACK_MAX).abs() < 1e-6);
        assert!(coefficient_for(ShapeId::Sphere, 0.5) > far);
    }

    #[test]
    fn tune_clamps_delay() {
        let mut res = Resonator::for_shape(ShapeId::Cube, 256);
        res.tune(48000.0, 10.0, 0.6);
        assert_eq!(res.delay(), 255);
        res.tune(48000.0, 1.0e6, 0.6);
        assert_eq!(res.delay(), crate::MIN_DELAY);
        res.tune(48000.0, f32::NAN, 0.6);
        assert_eq!(res.delay(), 255);
    }

    #[test]
    fn triangle_uses_spread_delays() {
        let mut res = Resonator::for_shape(ShapeId::Triangle, 1024);
        res.configure(100, 0.7);
        match &res {
            Resonator::FeedForward { primary, secondary } => {
                assert_eq!(primary.delay(), 100);
                assert_eq!(secondary.delay(), 141);
            }
            other => panic!("unexpected family {:?}", other.kind()),
        }
    }

    #[test]
    fn cube_mixes_dry_signal() {
        let mut res = Resonator::for_shape(ShapeId::Cube, 64);
        res.configure(10, 0.6);
        // dry 0.3·1 + wet 0.7·(-0.6)
        let y = res.process(1.0).unwrap();
        assert!((y - (0.3 - 0.42)).abs() < 1e-6);
    }

    #[test]
    fn non_finite_output_heals() {
        let mut res = Resonator::for_shape(ShapeId::Sphere, 64);
        res.configure(8, 0.9);
        for _ in 0..20 {
            res.process(0.5);
        }
        assert_eq!(res.process(f32::NAN), None);
        // state was cleared: silence in, silence out
        for _ in 0..64 {
            assert_eq!(res.process(0.0), Some(0.0));
        }
    }

    #[test]
    fn none_is_silent() {
        let mut res = Resonator::None;
        assert_eq!(res.process(1.0), Some(0.0));
        assert_eq!(res.delay(), 0);
    }
}
