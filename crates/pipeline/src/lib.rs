//! # burnscar-pipeline
//!
//! Per-fire-event burn analysis built on `burnscar-algorithms`.
//!
//! One analysis takes an area of interest and two date windows, reduces the
//! pre- and post-fire imagery to medians, computes the dNBR / RdNBR / RBR
//! stack and optionally derives the fire boundary from it. The stages are
//! typestate values in [`state`]; [`compute_metrics`] and
//! [`derive_boundary`] drive them end to end.
//!
//! ## Modules
//!
//! - **config**: `PipelineConfig` and derivation settings (JSON)
//! - **boundary**: area of interest and seed points with their CRS
//! - **imagery**: granules, date windows and the `ImagerySource` seam
//! - **catalog**: manifest-backed and in-memory imagery sources
//! - **reducer**: median reduction of granules onto the boundary
//! - **derive**: threshold, clean-up, flood fill and vectorisation
//! - **storage**: `ObjectStore` seam and metric stack persistence

pub mod boundary;
pub mod catalog;
pub mod config;
pub mod derive;
pub mod error;
pub mod imagery;
pub mod orchestrator;
pub mod reducer;
pub mod state;
pub mod storage;

pub use boundary::{Boundary, SeedPointSet};
pub use catalog::{InMemoryCatalog, LocalCatalog};
pub use config::{DerivationConfig, NanFill, PipelineConfig, ThresholdMethod};
pub use error::{FailureKind, PipelineError, Result};
pub use imagery::{DateWindow, FireEventWindows, Granule, ImagerySource};
pub use orchestrator::{compute_metrics, derive_boundary, AnalysisOutcome};
pub use state::PipelineState;
pub use storage::{LocalObjectStore, MetricStackStore, ObjectStore};
