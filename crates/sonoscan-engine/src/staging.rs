//! Lock-free handoff of control parameters to the render thread.
//!
//! Every group follows the same protocol: the control thread stores the
//! values (`Release`) and then raises the group's dirty flag; the render
//! thread swaps the flag to `false` (`Acquire`) once per block and, only if
//! it was set, copies the values out. Last write wins; the render thread
//! never blocks and never allocates.
//!
//! | Group | Contents |
//! |-------|----------|
//! | [`FamilySlot`] | coefficient, delay, active, target level |
//! | [`SpectrumSlot`] | band envelope, target mask, boost |
//! | [`ScalarSlot`] | pan, distance, master gain |
//! | [`RangeSlot`] | band map min/max Hz |
//! | [`EdgeTrigger`] | click strength, swapped to 0 on read |

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

/// An `f32` stored as its bit pattern in an [`AtomicU32`].
#[derive(Debug, Default)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    /// New cell holding `value`.
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    /// Read with `Acquire` ordering.
    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    /// Write with `Release` ordering.
    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Release);
    }

    /// Replace the value, returning the previous one.
    #[inline]
    pub fn swap(&self, value: f32) -> f32 {
        f32::from_bits(self.0.swap(value.to_bits(), Ordering::AcqRel))
    }
}

/// Requested configuration of one resonator family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FamilyParams {
    /// Feedback / feed-forward / all-pass coefficient.
    pub coefficient: f32,
    /// Primary delay length in samples.
    pub delay: usize,
    /// Whether the family should sound.
    pub active: bool,
    /// Level the render thread ramps toward.
    pub level: f32,
}

impl FamilyParams {
    /// Inactive, silent.
    pub const SILENT: Self = Self {
        coefficient: 0.0,
        delay: 0,
        active: false,
        level: 0.0,
    };
}

/// Pending parameters of one resonator family.
#[derive(Debug, Default)]
pub struct FamilySlot {
    coefficient: AtomicF32,
    delay: AtomicUsize,
    active: AtomicBool,
    level: AtomicF32,
    dirty: AtomicBool,
}

impl FamilySlot {
    /// Publish `params`.
    pub fn stage(&self, params: FamilyParams) {
        self.coefficient.store(params.coefficient);
        self.delay.store(params.delay, Ordering::Release);
        self.active.store(params.active, Ordering::Release);
        self.level.store(params.level);
        self.dirty.store(true, Ordering::Release);
    }

    /// Last staged values, without consuming them.
    pub fn peek(&self) -> FamilyParams {
        FamilyParams {
            coefficient: self.coefficient.load(),
            delay: self.delay.load(Ordering::Acquire),
            active: self.active.load(Ordering::Acquire),
            level: self.level.load(),
        }
    }

    /// Consume pending values, if any.
    pub fn take(&self) -> Option<FamilyParams> {
        self.dirty
            .swap(false, Ordering::AcqRel)
            .then(|| self.peek())
    }

    /// Whether values are waiting.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }
}

/// Pending spectral shaping: per-band envelope and target mask.
#[derive(Debug)]
pub struct SpectrumSlot {
    envelope: Box<[AtomicF32]>,
    mask: Box<[AtomicF32]>,
    boost_db: AtomicF32,
    envelope_dirty: AtomicBool,
    mask_dirty: AtomicBool,
}

impl SpectrumSlot {
    /// Slot for `bands` bands, envelope and mask at zero.
    pub fn new(bands: usize) -> Self {
        Self {
            envelope: (0..bands).map(|_| AtomicF32::new(0.0)).collect(),
            mask: (0..bands).map(|_| AtomicF32::new(0.0)).collect(),
            boost_db: AtomicF32::new(0.0),
            envelope_dirty: AtomicBool::new(false),
            mask_dirty: AtomicBool::new(false),
        }
    }

    /// Band count.
    pub fn bands(&self) -> usize {
        self.envelope.len()
    }

    /// Publish a band envelope.
    ///
    /// Extra values are ignored and missing bands read as 0. Gains are
    /// clamped to `[0, 1]`, non-finite ones to 0.
    pub fn stage_envelope(&self, gains: &[f32]) {
        for (i, cell) in self.envelope.iter().enumerate() {
            cell.store(sanitize_unit(gains.get(i).copied().unwrap_or(0.0)));
        }
        self.envelope_dirty.store(true, Ordering::Release);
    }

    /// Publish a target mask and its boost in dB.
    pub fn stage_mask(&self, mask: &[f32], boost_db: f32) {
        for (i, cell) in self.mask.iter().enumerate() {
            cell.store(sanitize_unit(mask.get(i).copied().unwrap_or(0.0)));
        }
        if boost_db.is_finite() {
            self.boost_db.store(boost_db);
        }
        self.mask_dirty.store(true, Ordering::Release);
    }

    /// Publish an all-zero mask, keeping the boost.
    pub fn clear_mask(&self) {
        for cell in self.mask.iter() {
            cell.store(0.0);
        }
        self.mask_dirty.store(true, Ordering::Release);
    }

    /// Copy a pending envelope into `out`. Returns whether one was pending.
    pub fn take_envelope(&self, out: &mut [f32]) -> bool {
        if !self.envelope_dirty.swap(false, Ordering::AcqRel) {
            return false;
        }
        for (o, cell) in out.iter_mut().zip(self.envelope.iter()) {
            *o = cell.load();
        }
        true
    }

    /// Copy a pending mask into `out` and return its boost in dB.
    pub fn take_mask(&self, out: &mut [f32]) -> Option<f32> {
        if !self.mask_dirty.swap(false, Ordering::AcqRel) {
            return None;
        }
        for (o, cell) in out.iter_mut().zip(self.mask.iter()) {
            *o = cell.load();
        }
        Some(self.boost_db.load())
    }
}

#[inline]
fn sanitize_unit(x: f32) -> f32 {
    if x.is_finite() { x.clamp(0.0, 1.0) } else { 0.0 }
}

/// Scalar controls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scalars {
    /// Stereo position in `[-1, 1]`.
    pub pan: f32,
    /// Proximity `z01`, 0 = near.
    pub distance: f32,
    /// Master makeup gain in dB.
    pub master_gain_db: f32,
}

/// Pending scalar controls.
#[derive(Debug)]
pub struct ScalarSlot {
    pan: AtomicF32,
    distance: AtomicF32,
    master_gain_db: AtomicF32,
    dirty: AtomicBool,
}

impl ScalarSlot {
    /// Slot holding `initial`, not dirty.
    pub fn new(initial: Scalars) -> Self {
        Self {
            pan: AtomicF32::new(initial.pan),
            distance: AtomicF32::new(initial.distance),
            master_gain_db: AtomicF32::new(initial.master_gain_db),
            dirty: AtomicBool::new(false),
        }
    }

    /// Publish a pan position.
    pub fn stage_pan(&self, pan: f32) {
        self.pan.store(pan);
        self.dirty.store(true, Ordering::Release);
    }

    /// Publish a proximity.
    pub fn stage_distance(&self, z01: f32) {
        self.distance.store(z01);
        self.dirty.store(true, Ordering::Release);
    }

    /// Publish a master gain.
    pub fn stage_master_gain_db(&self, db: f32) {
        self.master_gain_db.store(db);
        self.dirty.store(true, Ordering::Release);
    }

    /// Last staged values.
    pub fn peek(&self) -> Scalars {
        Scalars {
            pan: self.pan.load(),
            distance: self.distance.load(),
            master_gain_db: self.master_gain_db.load(),
        }
    }

    /// Consume pending values, if any.
    pub fn take(&self) -> Option<Scalars> {
        self.dirty
            .swap(false, Ordering::AcqRel)
            .then(|| self.peek())
    }
}

/// Pending band-map frequency range.
#[derive(Debug)]
pub struct RangeSlot {
    min_hz: AtomicF32,
    max_hz: AtomicF32,
    dirty: AtomicBool,
}

impl RangeSlot {
    /// Slot holding `(min_hz, max_hz)`, not dirty.
    pub fn new(min_hz: f32, max_hz: f32) -> Self {
        Self {
            min_hz: AtomicF32::new(min_hz),
            max_hz: AtomicF32::new(max_hz),
            dirty: AtomicBool::new(false),
        }
    }

    /// Publish a range.
    pub fn stage(&self, min_hz: f32, max_hz: f32) {
        self.min_hz.store(min_hz);
        self.max_hz.store(max_hz);
        self.dirty.store(true, Ordering::Release);
    }

    /// Consume a pending range, if any.
    pub fn take(&self) -> Option<(f32, f32)> {
        self.dirty
            .swap(false, Ordering::AcqRel)
            .then(|| (self.min_hz.load(), self.max_hz.load()))
    }
}

/// Pending edge click; reading swaps the strength back to 0.
#[derive(Debug, Default)]
pub struct EdgeTrigger {
    strength: AtomicF32,
}

impl EdgeTrigger {
    /// Arm with `strength` (last write wins).
    pub fn trigger(&self, strength: f32) {
        self.strength.store(strength);
    }

    /// Consume the pending strength; 0 when nothing was armed.
    pub fn take(&self) -> f32 {
        self.strength.swap(0.0)
    }
}

/// All staging groups shared by the control surface and the engine.
#[derive(Debug)]
pub struct PendingParams {
    /// One slot per resonator family, indexed by
    /// [`ShapeId::family_index`](sonoscan_core::ShapeId::family_index).
    pub families: [FamilySlot; 3],
    /// Envelope and mask.
    pub spectrum: SpectrumSlot,
    /// Pan, distance, master gain.
    pub scalars: ScalarSlot,
    /// Band map range.
    pub range: RangeSlot,
    /// Edge click.
    pub edge: EdgeTrigger,
    running: AtomicBool,
}

impl PendingParams {
    /// Staging for `bands` bands starting from `scalars` and `range`.
    pub fn new(bands: usize, scalars: Scalars, range: (f32, f32)) -> Self {
        Self {
            families: Default::default(),
            spectrum: SpectrumSlot::new(bands),
            scalars: ScalarSlot::new(scalars),
            range: RangeSlot::new(range.0, range.1),
            edge: EdgeTrigger::default(),
            running: AtomicBool::new(false),
        }
    }

    /// Set the run flag.
    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    /// Whether the engine should produce sound.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}
