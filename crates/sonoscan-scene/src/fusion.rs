//! Grid fusion store.
//!
//! Keeps the latest depth grid and class grid behind one lock. Depth frames
//! are area-averaged, class frames majority-voted, both over the half-open
//! source rectangle each grid cell covers.
//!
//! Both ingest paths compute the new grid without the lock and only take it
//! for the swap, so the scan thread never waits on a downsample.
//!
//! # Failure handling
//!
//! A malformed frame (non-positive dimensions, pixel count disagreeing with
//! the dimensions) is dropped with a warning and the previous grid is kept.

use parking_lot::Mutex;
use sonoscan_core::{DEFAULT_GRID_HEIGHT, DEFAULT_GRID_WIDTH};

use crate::grid::{ClassImage, DepthImage, Grid, Orientation, cell_span};

/// Number of class-id bins counted by the majority vote. Ids at or above
/// this value are ignored.
pub const CLASS_BINS: usize = 8;

/// Grid geometry and classifier alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FusionSettings {
    /// Grid columns (scan positions).
    pub width: usize,
    /// Grid rows (frequency bands).
    pub height: usize,
    /// Classifier-to-grid alignment.
    pub orientation: Orientation,
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_WIDTH,
            height: DEFAULT_GRID_HEIGHT,
            orientation: Orientation::IDENTITY,
        }
    }
}

/// One column of both grids, read under a single lock acquisition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSnapshot {
    /// Column index.
    pub column: usize,
    /// Depth cells, top row first.
    pub depth: Vec<f32>,
    /// Class cells, top row first.
    pub class: Vec<u8>,
    /// Depth of the column to the right; empty on the last column.
    pub right_depth: Vec<f32>,
    /// Class-grid version at the time of the read.
    pub class_version: u64,
}

impl ColumnSnapshot {
    /// Depth of the right neighbour, `None` on the last column.
    pub fn right_depth(&self) -> Option<&[f32]> {
        if self.right_depth.is_empty() {
            None
        } else {
            Some(&self.right_depth)
        }
    }
}

/// Ingest counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FusionStats {
    /// Depth frames applied.
    pub depth_frames: u64,
    /// Class grid version (class frames applied).
    pub class_version: u64,
    /// Frames rejected as malformed.
    pub rejected_frames: u64,
}

#[derive(Debug)]
struct Grids {
    depth: Grid<f32>,
    class: Grid<u8>,
    stats: FusionStats,
}

/// Shared depth + class grid store.
///
/// # Example
///
/// ```rust
/// use sonoscan_scene::{DepthImage, FusionSettings, GridStore};
///
/// let store = GridStore::new(FusionSettings::default());
/// let pixels = vec![1.5f32; 640 * 480];
/// assert!(store.ingest_depth_frame(&DepthImage::new(640, 480, &pixels)));
/// let snap = store.read_snapshot(10);
/// assert!(snap.depth.iter().all(|&d| (d - 1.5).abs() < 1e-6));
/// ```
#[derive(Debug)]
pub struct GridStore {
    settings: FusionSettings,
    grids: Mutex<Grids>,
}

impl GridStore {
    /// Create a store with all-invalid depth and all-background classes.
    pub fn new(settings: FusionSettings) -> Self {
        let settings = FusionSettings {
            width: settings.width.max(1),
            height: settings.height.max(1),
            ..settings
        };
        Self {
            grids: Mutex::new(Grids {
                depth: Grid::new(settings.width, settings.height),
                class: Grid::new(settings.width, settings.height),
                stats: FusionStats::default(),
            }),
            settings,
        }
    }

    /// Grid columns.
    pub fn width(&self) -> usize {
        self.settings.width
    }

    /// Grid rows.
    pub fn height(&self) -> usize {
        self.settings.height
    }

    /// Active settings.
    pub fn settings(&self) -> FusionSettings {
        self.settings
    }

    /// Downsample a depth frame into the depth grid.
    ///
    /// Returns whether the frame was applied.
    pub fn ingest_depth_frame(&self, image: &DepthImage<'_>) -> bool {
        let Some(grid) = downsample_depth(image, self.settings.width, self.settings.height) else {
            tracing::warn!(
                width = image.width,
                height = image.height,
                len = image.data.len(),
                "dropping malformed depth frame"
            );
            self.grids.lock().stats.rejected_frames += 1;
            return false;
        };
        let mut grids = self.grids.lock();
        grids.depth = grid;
        grids.stats.depth_frames += 1;
        true
    }

    /// Majority-vote a class frame into the class grid and bump its version.
    ///
    /// Returns whether the frame was applied.
    pub fn ingest_classification_frame(&self, image: &ClassImage<'_>) -> bool {
        let Some(grid) = vote_classes(
            image,
            self.settings.width,
            self.settings.height,
            self.settings.orientation,
        ) else {
            tracing::warn!(
                width = image.width,
                height = image.height,
                len = image.data.len(),
                "dropping malformed class frame"
            );
            self.grids.lock().stats.rejected_frames += 1;
            return false;
        };
        let mut grids = self.grids.lock();
        grids.class = grid;
        grids.stats.class_version += 1;
        true
    }

    /// Copy one column of both grids plus the right neighbour's depth.
    ///
    /// Out-of-range columns are clamped to the last column.
    pub fn read_snapshot(&self, column: usize) -> ColumnSnapshot {
        let mut snapshot = ColumnSnapshot::default();
        self.read_snapshot_into(column, &mut snapshot);
        snapshot
    }

    /// [`read_snapshot`](Self::read_snapshot) into a reused buffer.
    pub fn read_snapshot_into(&self, column: usize, out: &mut ColumnSnapshot) {
        let column = column.min(self.settings.width - 1);
        let grids = self.grids.lock();
        out.column = column;
        grids.depth.copy_column(column, &mut out.depth);
        grids.class.copy_column(column, &mut out.class);
        if column + 1 < self.settings.width {
            grids.depth.copy_column(column + 1, &mut out.right_depth);
        } else {
            out.right_depth.clear();
        }
        out.class_version = grids.stats.class_version;
    }

    /// Ingest counters.
    pub fn stats(&self) -> FusionStats {
        self.grids.lock().stats
    }
}

#[inline]
fn is_valid_depth(d: f32) -> bool {
    d.is_finite() && d > 0.0
}

/// Area-average a depth frame onto a `width × height` grid.
///
/// Each cell averages the valid pixels of its source rectangle; cells with
/// no valid pixel hold 0. Returns `None` for a malformed frame.
pub fn downsample_depth(image: &DepthImage<'_>, width: usize, height: usize) -> Option<Grid<f32>> {
    if !image.is_well_formed() {
        return None;
    }
    let mut grid = Grid::new(width, height);
    let (width, height) = (grid.width(), grid.height());
    for gy in 0..height {
        let rows = cell_span(gy, height, image.height);
        for gx in 0..width {
            let cols = cell_span(gx, width, image.width);
            let mut sum = 0.0f64;
            let mut count = 0u32;
            for y in rows.clone() {
                let row = &image.data[y * image.width..(y + 1) * image.width];
                for &d in &row[cols.clone()] {
                    if is_valid_depth(d) {
                        sum += f64::from(d);
                        count += 1;
                    }
                }
            }
            if count > 0 {
                grid.set(gx, gy, (sum / f64::from(count)) as f32);
            }
        }
    }
    Some(grid)
}

/// Majority-vote a class frame onto a `width × height` grid.
///
/// Counts ids below [`CLASS_BINS`] (background included) over each cell's
/// source rectangle; the most frequent id wins, ties go to the lowest id.
/// Empty rectangles vote background. Returns `None` for a malformed frame.
pub fn vote_classes(
    image: &ClassImage<'_>,
    width: usize,
    height: usize,
    orientation: Orientation,
) -> Option<Grid<u8>> {
    if !image.is_well_formed() {
        return None;
    }
    let mut grid = Grid::new(width, height);
    let (width, height) = (grid.width(), grid.height());
    let mut bins = [0u32; CLASS_BINS];
    for gy in 0..height {
        for gx in 0..width {
            let (cols, rows) =
                orientation.source_rect(gx, gy, width, height, image.width, image.height);
            bins.fill(0);
            for y in rows {
                let row = &image.data[y * image.width..(y + 1) * image.width];
                for &id in &row[cols.clone()] {
                    if let Some(bin) = bins.get_mut(usize::from(id)) {
                        *bin += 1;
                    }
                }
            }
            grid.set(gx, gy, majority(&bins));
        }
    }
    Some(grid)
}

/// Index of the largest bin; ties resolve to the lowest index.
#[inline]
pub fn majority(bins: &[u32]) -> u8 {
    let mut best = 0usize;
    for (id, &count) in bins.iter().enumerate().skip(1) {
        if count > bins[best] {
            best = id;
        }
    }
    best as u8
}
