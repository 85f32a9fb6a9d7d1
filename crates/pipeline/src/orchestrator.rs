//! Entry points driving one fire event through the analysis states

use crate::boundary::{Boundary, SeedPointSet};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::imagery::{FireEventWindows, ImagerySource};
use crate::state::{MetricsComputed, Uninitialized};
use burnscar_algorithms::imagery::MetricStack;
use tracing::info;

/// Result of [`compute_metrics`]
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// The derived boundary when `derived` is set, else the input one
    /// reprojected into the working CRS
    pub boundary: Boundary,
    pub stack: MetricStack,
    pub derived: bool,
}

/// Acquire imagery for both windows, compute the metric stack and
/// optionally derive the fire boundary from it.
///
/// [`NoFireBoundaryDetected`](crate::PipelineError::NoFireBoundaryDetected) is returned unchanged
/// when `derive` is set and nothing burned around the boundary centre.
pub fn compute_metrics(
    config: &PipelineConfig,
    source: &dyn ImagerySource,
    boundary: Boundary,
    windows: &FireEventWindows,
    derive: bool,
) -> Result<AnalysisOutcome> {
    info!(
        "Analysing fire event: prefire {}, postfire {}",
        windows.prefire, windows.postfire
    );
    let acquired = Uninitialized::new(config.clone())?
        .set_boundary(boundary)?
        .acquire_imagery(source, windows)?;
    let input_boundary = acquired.boundary().clone();
    let computed = acquired.compute_metrics()?;

    if derive {
        let (boundary, stack) = computed.auto_derive_boundary()?.into_parts();
        return Ok(AnalysisOutcome {
            boundary,
            stack,
            derived: true,
        });
    }

    let (_, stack) = computed.into_parts();
    Ok(AnalysisOutcome {
        boundary: input_boundary,
        stack,
        derived: false,
    })
}

/// Refine a previously computed stack with fresh seed points
pub fn derive_boundary(
    config: &PipelineConfig,
    stack: MetricStack,
    seeds: &SeedPointSet,
) -> Result<(Boundary, MetricStack)> {
    info!("Refining boundary from {} seed points", seeds.len());
    let derived = MetricsComputed::from_stack(config.clone(), stack, None)?.derive_boundary(seeds)?;
    Ok(derived.into_parts())
}
