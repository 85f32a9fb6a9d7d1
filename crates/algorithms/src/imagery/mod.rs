//! Spectral imagery algorithms
//!
//! - Normalized Burn Ratio and the generic normalized difference
//! - The dNBR / RdNBR / RBR metric stack
//! - Temporal median compositing
//! - Severity classification

mod burn;
mod classify;
mod composite;
mod indices;

pub use burn::{compute_burn_metrics, BurnMetric, MetricStack, ReducedImagery, RBR_OFFSET};
pub use classify::{classify_severity, SeverityBreak};
pub use composite::median_composite;
pub use indices::{nbr, normalized_difference};
