//! Scene fusion and scanning for depth sonification.
//!
//! This crate sits between the sensors and the audio engine:
//!
//! - **Fusion**: [`GridStore`] downsamples depth frames (area average) and
//!   class frames (majority vote) into two aligned W×H grids behind one lock
//! - **Classification**: [`ClassificationWorker`] runs a [`Segmenter`] off
//!   the sensor thread, throttled to one pass in flight
//! - **Scanning**: [`ScanController`] sweeps a column across the grids on a
//!   wall-clock period and emits [`ColumnAcoustics`] to a [`ColumnSink`]
//! - **Synthetic input**: [`SyntheticScene`] renders moving labelled shapes
//!   for offline use
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use sonoscan_scene::{
//!     ColumnAcoustics, FusionSettings, GridStore, ScanController, ScanSettings, SyntheticScene,
//! };
//!
//! let store = Arc::new(GridStore::new(FusionSettings::default()));
//! let scene = SyntheticScene::demo(160, 120);
//!
//! let mut depth = Vec::new();
//! scene.render_depth_into(0.0, &mut depth);
//! store.ingest_depth_frame(&scene.depth_image(&depth));
//! store.ingest_classification_frame(&scene.render_classes(0.0).as_image());
//!
//! let scan = ScanController::new(Arc::clone(&store), ScanSettings::default(), |a: &ColumnAcoustics| {
//!     assert_eq!(a.envelope.len(), 40);
//! });
//! scan.tick_at(0.25);
//! ```

mod classify;
mod error;
mod fusion;
mod grid;
mod scan;
mod synthetic;

pub use classify::{ClassificationWorker, ClassifyStats, ClassifyThrottle, Segmenter};
pub use error::{Result, SceneError};
pub use fusion::{
    CLASS_BINS, ColumnSnapshot, FusionSettings, FusionStats, GridStore, downsample_depth, majority,
    vote_classes,
};
pub use grid::{ClassFrame, ClassImage, DepthImage, Grid, Orientation, cell_span};
pub use scan::{
    ColumnSink, MIN_SCAN_PERIOD, ScanClock, ScanController, ScanSettings,
    compute_column_acoustics, compute_column_acoustics_into,
};
pub use sonoscan_core::{ColumnAcoustics, ShapeId};
pub use synthetic::{SceneObject, SyntheticScene, SyntheticSegmenter};
