//! Scan controller.
//!
//! A free-running clock sweeps a column index left to right across the grid,
//! independent of sensor frame rate. Every tick reads one column snapshot
//! from the [`GridStore`], turns it into [`ColumnAcoustics`] and hands it to
//! the registered [`ColumnSink`].
//!
//! ```text
//! phase  = (elapsed mod period) / period      ∈ [0, 1)
//! column = round(phase · (W - 1))
//! ```
//!
//! The grid lock is held only while the snapshot is copied; the acoustic
//! computation and the sink call run outside it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use sonoscan_core::ColumnAcoustics;
use sonoscan_core::ShapeId;
use sonoscan_core::acoustics::{
    closeness, column_pan, coverage, depth_to_gain, edge_strength, proximity, smooth_across_bands,
};

use crate::fusion::{CLASS_BINS, ColumnSnapshot, GridStore, majority};
use crate::{Result, SceneError};

/// Shortest accepted sweep period.
pub const MIN_SCAN_PERIOD: Duration = Duration::from_millis(100);

/// Scan timing and depth mapping parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanSettings {
    /// Time for one left-to-right sweep.
    pub period: Duration,
    /// Target tick rate of the scan thread.
    pub tick_rate_hz: f32,
    /// Depth mapped to full gain, meters.
    pub near_m: f32,
    /// Depth mapped to minimum gain, meters.
    pub far_m: f32,
    /// Attenuation at `far_m`, dB.
    pub gain_range_db: f32,
    /// Decay of the across-band smoother, `[0, 1)`.
    pub band_smoothing: f32,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(2),
            tick_rate_hz: 60.0,
            near_m: 0.3,
            far_m: 4.0,
            gain_range_db: 30.0,
            band_smoothing: 0.35,
        }
    }
}

/// Receives one [`ColumnAcoustics`] per scan tick.
pub trait ColumnSink: Send {
    /// Called on the scan thread (or the `tick_at` caller).
    fn on_column(&mut self, acoustics: &ColumnAcoustics);
}

impl<F> ColumnSink for F
where
    F: FnMut(&ColumnAcoustics) + Send,
{
    fn on_column(&mut self, acoustics: &ColumnAcoustics) {
        self(acoustics);
    }
}

/// Wall-clock phase oscillator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanClock {
    period: Duration,
}

impl ScanClock {
    /// A clock with the given period, raised to [`MIN_SCAN_PERIOD`].
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(MIN_SCAN_PERIOD),
        }
    }

    /// Effective period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Phase in `[0, 1)` for `elapsed_secs`.
    ///
    /// Negative elapsed times wrap backwards; non-finite ones read as 0.
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use sonoscan_scene::ScanClock;
    ///
    /// let clock = ScanClock::new(Duration::from_secs(2));
    /// assert_eq!(clock.phase(0.5), 0.25);
    /// assert_eq!(clock.phase(-0.5), 0.75);
    /// assert_eq!(clock.phase(f64::NAN), 0.0);
    /// ```
    pub fn phase(&self, elapsed_secs: f64) -> f64 {
        if !elapsed_secs.is_finite() {
            return 0.0;
        }
        let period = self.period.as_secs_f64();
        let phase = elapsed_secs.rem_euclid(period) / period;
        if (0.0..1.0).contains(&phase) { phase } else { 0.0 }
    }

    /// Column for `elapsed_secs` on a grid `width` columns wide.
    pub fn column(&self, elapsed_secs: f64, width: usize) -> usize {
        if width < 2 {
            return 0;
        }
        let col = (self.phase(elapsed_secs) * (width - 1) as f64).round() as usize;
        col.min(width - 1)
    }
}

/// Derive acoustics for one column snapshot.
///
/// `width` is the grid width, used for the pan position.
pub fn compute_column_acoustics(
    snapshot: &ColumnSnapshot,
    width: usize,
    settings: &ScanSettings,
) -> ColumnAcoustics {
    let mut out = ColumnAcoustics::silent(snapshot.column, snapshot.depth.len());
    compute_column_acoustics_into(snapshot, width, settings, &mut out);
    out
}

/// [`compute_column_acoustics`] into a reused buffer.
pub fn compute_column_acoustics_into(
    snapshot: &ColumnSnapshot,
    width: usize,
    settings: &ScanSettings,
    out: &mut ColumnAcoustics,
) {
    let h = snapshot.depth.len();
    let (near, far) = (settings.near_m, settings.far_m);
    out.column = snapshot.column;

    // Envelope: band r reads row H-1-r.
    out.envelope.clear();
    out.envelope.extend(
        snapshot
            .depth
            .iter()
            .rev()
            .map(|&d| depth_to_gain(d, near, far, settings.gain_range_db)),
    );
    smooth_across_bands(&mut out.envelope, settings.band_smoothing);

    // Dominant shape among ids that own a resonator family.
    let mut bins = [0u32; CLASS_BINS];
    for &id in &snapshot.class {
        if ShapeId::from_id(id) != ShapeId::None {
            bins[usize::from(id)] += 1;
        }
    }
    let dominant = majority(&bins);
    out.shape = if bins[usize::from(dominant)] > 0 {
        ShapeId::from_id(dominant)
    } else {
        ShapeId::None
    };

    out.target_mask.clear();
    out.target_mask.extend(snapshot.class.iter().rev().map(|&id| {
        if out.shape != ShapeId::None && id == out.shape.id() {
            1.0
        } else {
            0.0
        }
    }));
    out.target_mask.resize(h, 0.0);

    out.pan = column_pan(snapshot.column, width);

    let mean_distance = if h == 0 {
        1.0
    } else {
        snapshot.depth.iter().map(|&d| 1.0 - closeness(d, near, far)).sum::<f32>() / h as f32
    };
    out.proximity = proximity(mean_distance, coverage(&out.target_mask));

    out.edge = match snapshot.right_depth() {
        Some(right) => {
            let (sum, count) = snapshot
                .depth
                .iter()
                .zip(right)
                .filter(|&(&a, &b)| is_valid(a) && is_valid(b))
                .fold((0.0f32, 0u32), |(sum, count), (&a, &b)| (sum + (a - b).abs(), count + 1));
            if count == 0 {
                0.0
            } else {
                edge_strength(sum / count as f32, near, far)
            }
        }
        None => 0.0,
    };
}

#[inline]
fn is_valid(d: f32) -> bool {
    d.is_finite() && d > 0.0
}

struct TickState {
    sink: Box<dyn ColumnSink>,
    snapshot: ColumnSnapshot,
    acoustics: ColumnAcoustics,
}

/// Periodic scan driver.
///
/// [`start`](Self::start) spawns a thread ticking at
/// [`ScanSettings::tick_rate_hz`]; [`tick_at`](Self::tick_at) drives a single
/// tick at an explicit time for offline rendering.
pub struct ScanController {
    store: Arc<GridStore>,
    settings: ScanSettings,
    clock: ScanClock,
    state: Arc<Mutex<TickState>>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ScanController {
    /// Create a stopped controller reading `store` and feeding `sink`.
    pub fn new(store: Arc<GridStore>, settings: ScanSettings, sink: impl ColumnSink + 'static) -> Self {
        let height = store.height();
        if settings.period < MIN_SCAN_PERIOD {
            tracing::warn!(
                period_ms = settings.period.as_millis() as u64,
                floor_ms = MIN_SCAN_PERIOD.as_millis() as u64,
                "scan period below floor, clamping"
            );
        }
        Self {
            clock: ScanClock::new(settings.period),
            state: Arc::new(Mutex::new(TickState {
                sink: Box::new(sink),
                snapshot: ColumnSnapshot::default(),
                acoustics: ColumnAcoustics::silent(0, height),
            })),
            store,
            settings,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Sweep clock.
    pub fn clock(&self) -> ScanClock {
        self.clock
    }

    /// Active settings.
    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    /// Run one tick at `elapsed_secs` since the sweep started.
    ///
    /// Returns the scanned column.
    pub fn tick_at(&self, elapsed_secs: f64) -> usize {
        tick(&self.store, &self.settings, self.clock, &self.state, elapsed_secs)
    }

    /// Whether the scan thread is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Spawn the scan thread.
    pub fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Err(SceneError::AlreadyRunning);
        }
        self.running.store(true, Ordering::Release);

        let store = Arc::clone(&self.store);
        let state = Arc::clone(&self.state);
        let running = Arc::clone(&self.running);
        let settings = self.settings;
        let clock = self.clock;
        let interval = tick_interval(settings.tick_rate_hz);

        let spawned = thread::Builder::new().name("sonoscan-scan".into()).spawn(move || {
            let origin = Instant::now();
            let mut next = origin;
            while running.load(Ordering::Acquire) {
                tick(&store, &settings, clock, &state, origin.elapsed().as_secs_f64());
                next += interval;
                let now = Instant::now();
                if next > now {
                    thread::sleep(next - now);
                } else {
                    // Fell behind; resync instead of bursting.
                    next = now;
                }
            }
        });

        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!(
                    period_ms = clock.period().as_millis() as u64,
                    tick_hz = settings.tick_rate_hz,
                    "scan controller started"
                );
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::Release);
                Err(SceneError::Spawn(e))
            }
        }
    }

    /// Stop the scan thread and wait for it to exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("scan thread panicked");
            } else {
                tracing::info!("scan controller stopped");
            }
        }
    }
}

impl Drop for ScanController {
    fn drop(&mut self) {
        self.stop();
    }
}

fn tick_interval(rate_hz: f32) -> Duration {
    let rate = if rate_hz.is_finite() { rate_hz.clamp(1.0, 1000.0) } else { 60.0 };
    Duration::from_secs_f32(1.0 / rate)
}

fn tick(
    store: &GridStore,
    settings: &ScanSettings,
    clock: ScanClock,
    state: &Mutex<TickState>,
    elapsed_secs: f64,
) -> usize {
    let width = store.width();
    let column = clock.column(elapsed_secs, width);
    let mut guard = state.lock();
    let TickState {
        sink,
        snapshot,
        acoustics,
    } = &mut *guard;
    store.read_snapshot_into(column, snapshot);
    compute_column_acoustics_into(snapshot, width, settings, acoustics);
    sink.on_column(acoustics);
    column
}
