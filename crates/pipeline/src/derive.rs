//! Fire-boundary derivation from a metric stack

use crate::boundary::{Boundary, SeedPointSet};
use crate::config::{DerivationConfig, NanFill};
use crate::error::{PipelineError, Result};
use burnscar_algorithms::classification::{Thresholding, ThresholdingStrategy};
use burnscar_algorithms::imagery::{BurnMetric, MetricStack};
use burnscar_algorithms::morphology::{fill_holes, postprocess_mask, PostProcessParams};
use burnscar_algorithms::segmentation::{SeededFloodFill, SegmentationStrategy};
use burnscar_algorithms::vector::{clip_to_geometry, extract_boundary, MergePolicy};
use burnscar_core::raster::Raster;
use ndarray::Zip;
use tracing::{debug, info};

/// A metric layer made safe for thresholding
#[derive(Debug, Clone)]
pub struct PreparedLayer {
    /// Layer with every NaN replaced by the fill value
    pub values: Raster<f64>,
    /// 1 where the original layer held data
    pub footprint: Raster<u8>,
}

/// Replace NaNs with a neutral value, refusing layers with holes.
///
/// NaN is only allowed outside the valid footprint, i.e. in cells connected
/// to the grid edge. A NaN enclosed by data is reported as
/// [`PipelineError::InteriorNoData`]. Infinite cells (RdNBR over a zero
/// prefire NBR) hold data: they stay in the footprint and take the fill
/// value like NaNs do.
pub fn prepare_layer(layer: &Raster<f64>, metric: BurnMetric, fill: NanFill) -> Result<PreparedLayer> {
    let mut footprint = layer.map(|v| u8::from(!v.is_nan()));
    footprint.set_nodata(None);

    let valid = footprint.data().iter().filter(|&&v| v == 1).count();
    let finite = layer.data().iter().filter(|v| v.is_finite()).count();
    if valid == 0 {
        return Err(PipelineError::AllNaNMetrics(metric.name().to_string()));
    }

    let filled = fill_holes(&footprint)?;
    let interior = Zip::from(filled.data())
        .and(footprint.data())
        .fold(0usize, |n, &a, &b| n + usize::from(a != b));
    if interior > 0 {
        return Err(PipelineError::InteriorNoData {
            metric: metric.name().to_string(),
            cells: interior,
        });
    }

    let neutral = match fill {
        NanFill::Zero => 0.0,
        NanFill::Mean if finite > 0 => {
            layer.data().iter().filter(|v| v.is_finite()).sum::<f64>() / finite as f64
        }
        NanFill::Mean => 0.0,
    };
    let mut values = layer.map(|v| if v.is_finite() { v } else { neutral });
    values.set_nodata(None);

    Ok(PreparedLayer { values, footprint })
}

/// Threshold, clean up, flood fill from seeds and vectorise
#[derive(Debug, Clone)]
pub struct BoundaryDerivation {
    pub metric: BurnMetric,
    pub postprocess: PostProcessParams,
    pub nan_fill: NanFill,
    pub merge_policy: MergePolicy,
    pub segmentation: SeededFloodFill,
}

impl BoundaryDerivation {
    pub fn from_config(config: &DerivationConfig) -> Self {
        Self {
            metric: config.metric,
            postprocess: config.postprocess.params(),
            nan_fill: config.nan_fill,
            merge_policy: config.merge_policy,
            segmentation: SeededFloodFill::default(),
        }
    }

    /// Derive a boundary and the stack re-clipped to it.
    ///
    /// Seeds are reprojected into the stack's CRS. An empty flood fill is
    /// [`PipelineError::NoFireBoundaryDetected`].
    pub fn run(
        &self,
        stack: &MetricStack,
        seeds: &SeedPointSet,
        thresholding: &Thresholding,
    ) -> Result<(Boundary, MetricStack)> {
        let crs = stack
            .grid()
            .crs()
            .cloned()
            .unwrap_or_else(|| seeds.crs().clone());
        let seeds = seeds.to_crs(&crs)?;

        let prepared = prepare_layer(stack.get(self.metric), self.metric, self.nan_fill)?;
        let mask = intersect(&thresholding.apply(&prepared.values)?, &prepared.footprint);
        debug!(
            "{} threshold on {} marks {} cells",
            thresholding.name(),
            self.metric,
            count(&mask)
        );

        let cleaned = postprocess_mask(&mask, &self.postprocess)?;
        let grown = self.segmentation.apply(&cleaned, seeds.points())?;
        let region = intersect(&grown, &prepared.footprint);
        let cells = count(&region);
        debug!("Flood fill from {} seeds reached {} cells", seeds.len(), cells);
        if cells == 0 {
            return Err(PipelineError::NoFireBoundaryDetected);
        }

        let geometry = extract_boundary(&region, self.merge_policy)?
            .ok_or(PipelineError::NoFireBoundaryDetected)?;
        let boundary = Boundary::new(geometry, crs)?;
        let clipped = stack.try_map(|layer| clip_to_geometry(layer, boundary.geometry()))?;
        info!("Derived fire boundary covering {} cells", cells);
        Ok((boundary, clipped))
    }
}

fn intersect(a: &Raster<u8>, b: &Raster<u8>) -> Raster<u8> {
    let mut out = a.clone();
    Zip::from(out.data_mut())
        .and(b.data())
        .for_each(|v, &keep| *v = u8::from(*v != 0 && keep != 0));
    out
}

fn count(mask: &Raster<u8>) -> usize {
    mask.data().iter().filter(|&&v| v != 0).count()
}
