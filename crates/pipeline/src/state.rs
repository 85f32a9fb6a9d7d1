//! Analysis states of one fire event
//!
//! Each state is its own type and every transition consumes it, so a stage
//! can only run once its inputs exist:
//!
//! ```text
//! Uninitialized -> BoundarySet -> ImageryAcquired -> MetricsComputed -> BoundaryDerived
//! ```
//!
//! [`MetricsComputed::from_stack`] enters the machine from a persisted stack.

use crate::boundary::{Boundary, SeedPointSet};
use crate::config::PipelineConfig;
use crate::derive::BoundaryDerivation;
use crate::error::{PipelineError, Result};
use crate::imagery::{FireEventWindows, Granule, ImagerySource};
use crate::reducer::{search_extent, ImageryReducer};
use burnscar_algorithms::classification::Thresholding;
use burnscar_algorithms::imagery::{
    classify_severity, compute_burn_metrics, BurnMetric, MetricStack, ReducedImagery,
    SeverityBreak,
};
use burnscar_core::raster::Raster;
use geo_types::Point;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct Uninitialized {
    config: PipelineConfig,
}

impl Uninitialized {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Adopt the area of interest, reprojected into the working CRS
    pub fn set_boundary(self, boundary: Boundary) -> Result<BoundarySet> {
        let boundary = boundary.to_crs(&self.config.working_crs())?;
        debug!("Boundary set in {}", boundary.crs().identifier());
        Ok(BoundarySet {
            config: self.config,
            boundary,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BoundarySet {
    config: PipelineConfig,
    boundary: Boundary,
}

impl BoundarySet {
    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// Search and reduce the pre- and post-fire imagery
    pub fn acquire_imagery(
        self,
        source: &dyn ImagerySource,
        windows: &FireEventWindows,
    ) -> Result<ImageryAcquired> {
        let extent = search_extent(&self.boundary, &self.config)?;
        let bands = [self.config.nir_band.as_str(), self.config.swir_band.as_str()];
        let reducer = ImageryReducer::new(&self.config);

        let reduce = |label: &str, granules: Vec<Granule>| -> Result<ReducedImagery> {
            if granules.is_empty() {
                warn!("No {} granules found", label);
                return Err(PipelineError::InsufficientImagery(format!(
                    "no {label} granules found"
                )));
            }
            info!("Found {} {} granules", granules.len(), label);
            reducer.reduce(&granules, &self.boundary)
        };
        let prefire = reduce("prefire", source.search(&extent, &windows.prefire, &bands)?)?;
        let postfire = reduce("postfire", source.search(&extent, &windows.postfire, &bands)?)?;

        Ok(ImageryAcquired {
            config: self.config,
            boundary: self.boundary,
            prefire,
            postfire,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ImageryAcquired {
    config: PipelineConfig,
    boundary: Boundary,
    prefire: ReducedImagery,
    postfire: ReducedImagery,
}

impl ImageryAcquired {
    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn prefire(&self) -> &ReducedImagery {
        &self.prefire
    }

    pub fn postfire(&self) -> &ReducedImagery {
        &self.postfire
    }

    pub fn compute_metrics(self) -> Result<MetricsComputed> {
        let stack = compute_burn_metrics(&self.prefire, &self.postfire)?;
        MetricsComputed::from_stack(self.config, stack, Some(self.boundary))
    }
}

/// Five-layer stack ready for derivation or export
#[derive(Debug, Clone)]
pub struct MetricsComputed {
    config: PipelineConfig,
    boundary: Option<Boundary>,
    stack: MetricStack,
}

impl MetricsComputed {
    /// Fails with [`PipelineError::AllNaNMetrics`] when the derivation
    /// metric holds no data at all
    pub fn from_stack(
        config: PipelineConfig,
        stack: MetricStack,
        boundary: Option<Boundary>,
    ) -> Result<Self> {
        config.validate()?;
        let metric = config.derivation.metric;
        if stack.get(metric).data().iter().all(|v| v.is_nan()) {
            return Err(PipelineError::AllNaNMetrics(metric.name().to_string()));
        }
        let (rows, cols) = stack.grid().shape();
        info!("Metric stack ready: {}x{} cells", rows, cols);
        Ok(Self {
            config,
            boundary,
            stack,
        })
    }

    pub fn stack(&self) -> &MetricStack {
        &self.stack
    }

    pub fn boundary(&self) -> Option<&Boundary> {
        self.boundary.as_ref()
    }

    pub fn classify(&self, metric: BurnMetric, breaks: &[SeverityBreak]) -> Result<Raster<f64>> {
        Ok(classify_severity(self.stack.get(metric), breaks)?)
    }

    /// Derive with the automatic threshold, seeded at the centre of the
    /// current boundary (or of the grid when there is none)
    pub fn auto_derive_boundary(self) -> Result<BoundaryDerived> {
        let centre = match self.boundary.as_ref().and_then(Boundary::centroid) {
            Some(c) => c,
            None => {
                let grid = self.stack.grid();
                let (min_x, min_y, max_x, max_y) = grid.bounds();
                Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0)
            }
        };
        let crs = self
            .stack
            .grid()
            .crs()
            .cloned()
            .unwrap_or_else(|| self.config.working_crs());
        let seed_crs = self.boundary.as_ref().map_or(crs, |b| b.crs().clone());
        let seeds = SeedPointSet::new(vec![centre], seed_crs);
        let thresholding = self.config.derivation.threshold.strategy();
        self.derive_with(&seeds, &thresholding)
    }

    /// Derive from caller seeds with the refinement threshold
    pub fn derive_boundary(self, seeds: &SeedPointSet) -> Result<BoundaryDerived> {
        let thresholding = self.config.derivation.refine_threshold.strategy();
        self.derive_with(seeds, &thresholding)
    }

    fn derive_with(self, seeds: &SeedPointSet, thresholding: &Thresholding) -> Result<BoundaryDerived> {
        let derivation = BoundaryDerivation::from_config(&self.config.derivation);
        let (boundary, stack) = derivation.run(&self.stack, seeds, thresholding)?;
        let boundary = boundary.to_crs(&self.config.working_crs())?;
        Ok(BoundaryDerived {
            config: self.config,
            boundary,
            stack,
        })
    }

    pub fn into_parts(self) -> (Option<Boundary>, MetricStack) {
        (self.boundary, self.stack)
    }
}

/// Derived boundary and the stack clipped to it
#[derive(Debug, Clone)]
pub struct BoundaryDerived {
    config: PipelineConfig,
    boundary: Boundary,
    stack: MetricStack,
}

impl BoundaryDerived {
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn stack(&self) -> &MetricStack {
        &self.stack
    }

    pub fn into_parts(self) -> (Boundary, MetricStack) {
        (self.boundary, self.stack)
    }
}

/// Any analysis state, for callers that hold one without knowing which
#[derive(Debug, Clone)]
pub enum PipelineState {
    Uninitialized(Uninitialized),
    BoundarySet(BoundarySet),
    ImageryAcquired(ImageryAcquired),
    MetricsComputed(MetricsComputed),
    BoundaryDerived(BoundaryDerived),
}

impl PipelineState {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Uninitialized(_) => "uninitialized",
            PipelineState::BoundarySet(_) => "boundary_set",
            PipelineState::ImageryAcquired(_) => "imagery_acquired",
            PipelineState::MetricsComputed(_) => "metrics_computed",
            PipelineState::BoundaryDerived(_) => "boundary_derived",
        }
    }

    /// Current boundary, if the state has one
    pub fn boundary(&self) -> Option<&Boundary> {
        match self {
            PipelineState::Uninitialized(_) => None,
            PipelineState::BoundarySet(s) => Some(&s.boundary),
            PipelineState::ImageryAcquired(s) => Some(&s.boundary),
            PipelineState::MetricsComputed(s) => s.boundary.as_ref(),
            PipelineState::BoundaryDerived(s) => Some(&s.boundary),
        }
    }

    /// Current metric stack, if computed
    pub fn stack(&self) -> Option<&MetricStack> {
        match self {
            PipelineState::MetricsComputed(s) => Some(&s.stack),
            PipelineState::BoundaryDerived(s) => Some(&s.stack),
            _ => None,
        }
    }
}

macro_rules! impl_from_state {
    ($($state:ident),*) => {
        $(impl From<$state> for PipelineState {
            fn from(s: $state) -> Self {
                PipelineState::$state(s)
            }
        })*
    };
}

impl_from_state!(
    Uninitialized,
    BoundarySet,
    ImageryAcquired,
    MetricsComputed,
    BoundaryDerived
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::imagery::DateWindow;
    use burnscar_algorithms::vector::BoundingBox;
    use burnscar_core::crs::CRS;
    use burnscar_core::raster::GeoTransform;
    use geo_types::Geometry;
    use std::collections::HashMap;

    fn utm() -> CRS {
        CRS::from_epsg(32611)
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            working_epsg: 32611,
            bbox_buffer: 0.0,
            bbox_precision: 0,
            ..PipelineConfig::default()
        }
    }

    fn boundary() -> Boundary {
        let bb = BoundingBox::new(500_000.0, 4_199_800.0, 500_200.0, 4_200_000.0);
        Boundary::new(Geometry::Polygon(bb.to_polygon()), utm()).unwrap()
    }

    fn stack_of(rbr: Raster<f64>) -> MetricStack {
        let layers: HashMap<_, _> = BurnMetric::ALL.iter().map(|&m| (m, rbr.clone())).collect();
        MetricStack::from_layers(layers).unwrap()
    }

    fn grid(value: f64) -> Raster<f64> {
        let mut r = Raster::filled(10, 10, value);
        r.set_transform(GeoTransform::new(500_000.0, 4_200_000.0, 20.0, -20.0));
        r.set_crs(Some(utm()));
        r
    }

    #[test]
    fn test_transitions_move_the_boundary() {
        let state = Uninitialized::new(config()).unwrap();
        let wgs = boundary().to_crs(&CRS::wgs84()).unwrap();
        let set = state.set_boundary(wgs).unwrap();
        assert_eq!(set.boundary().crs().epsg(), Some(32611));
        let as_state = PipelineState::from(set);
        assert_eq!(as_state.name(), "boundary_set");
        assert!(as_state.stack().is_none());
    }

    #[test]
    fn test_empty_catalog_is_insufficient() {
        let set = Uninitialized::new(config())
            .unwrap()
            .set_boundary(boundary())
            .unwrap();
        let windows = FireEventWindows::new(
            "2023-07-01/2023-07-31".parse::<DateWindow>().unwrap(),
            "2023-09-01/2023-09-30".parse::<DateWindow>().unwrap(),
        );
        let err = set
            .acquire_imagery(&InMemoryCatalog::default(), &windows)
            .unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientImagery(_)));
    }

    #[test]
    fn test_all_nan_stack_rejected() {
        let err = MetricsComputed::from_stack(config(), stack_of(grid(f64::NAN)), None).unwrap_err();
        assert!(matches!(err, PipelineError::AllNaNMetrics(_)));
    }

    #[test]
    fn test_auto_derive_from_grid_centre() {
        let computed = MetricsComputed::from_stack(config(), stack_of(grid(0.3)), None).unwrap();
        let derived = computed.auto_derive_boundary().unwrap();
        assert_eq!(derived.boundary().area(), 200.0 * 200.0);
        assert_eq!(PipelineState::from(derived).name(), "boundary_derived");
    }

    #[test]
    fn test_refinement_uses_refine_threshold() {
        // 0.1 clears the automatic cut-off but not the refinement one
        let computed =
            MetricsComputed::from_stack(config(), stack_of(grid(0.1)), Some(boundary())).unwrap();
        let seeds = SeedPointSet::new(vec![Point::new(500_100.0, 4_199_900.0)], utm());
        let err = computed.clone().derive_boundary(&seeds).unwrap_err();
        assert!(err.is_no_boundary());
        assert!(computed.auto_derive_boundary().is_ok());
    }

    #[test]
    fn test_classify_stack_layer() {
        let computed = MetricsComputed::from_stack(config(), stack_of(grid(0.3)), None).unwrap();
        let classes = computed
            .classify(
                BurnMetric::Dnbr,
                &[SeverityBreak::new(0.1, 1.0), SeverityBreak::new(0.5, 2.0)],
            )
            .unwrap();
        assert!(classes.data().iter().all(|&v| v == 2.0));
    }
}
