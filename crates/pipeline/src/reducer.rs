//! Time reduction of granule stacks into one NIR/SWIR pair

use crate::boundary::Boundary;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::imagery::Granule;
use burnscar_algorithms::imagery::{median_composite, ReducedImagery};
use burnscar_algorithms::resample::{reproject_raster, resample_nearest, TargetGrid};
use burnscar_algorithms::vector::{bounding_box, clip_to_geometry, crop_to_bounds, BoundingBox};
use burnscar_core::crs::{reproject_bounds, CRS};
use burnscar_core::raster::Raster;
use burnscar_core::Error;
use tracing::{debug, info};

/// Rough metres per degree, used when granules come in geographic CRS
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Reduces the granules of one date window to a median composite on the
/// boundary's footprint.
///
/// The first granule's CRS is the intermediate grid. Each granule is
/// resampled onto a grid covering the buffered boundary envelope, raw
/// no-data becomes NaN, the median is taken per cell, and the result is
/// cropped and clipped to the boundary before it is reprojected into the
/// working CRS.
#[derive(Debug, Clone)]
pub struct ImageryReducer {
    working_crs: CRS,
    nir_band: String,
    swir_band: String,
    resolution: f64,
    bbox_buffer: f64,
    bbox_precision: u32,
    raw_nodata: Option<f64>,
}

impl ImageryReducer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            working_crs: config.working_crs(),
            nir_band: config.nir_band.clone(),
            swir_band: config.swir_band.clone(),
            resolution: config.resolution,
            bbox_buffer: config.bbox_buffer,
            bbox_precision: config.bbox_precision,
            raw_nodata: config.raw_nodata,
        }
    }

    pub fn reduce(&self, granules: &[Granule], boundary: &Boundary) -> Result<ReducedImagery> {
        let first = granules.first().ok_or_else(|| {
            PipelineError::InsufficientImagery("no granules to reduce".into())
        })?;
        let native = first.crs().clone();

        let extent = boundary.bbox(self.bbox_buffer, self.bbox_precision)?;
        let native_extent = reproject_bounds(boundary.crs(), &native, extent.as_tuple())?;
        let resolution = if native.is_geographic() {
            self.resolution / METERS_PER_DEGREE
        } else {
            self.resolution
        };
        let grid = TargetGrid::covering(native_extent, resolution, native.clone())?;
        debug!(
            "Reducing {} granules on a {}x{} grid in {}",
            granules.len(),
            grid.rows,
            grid.cols,
            native.identifier()
        );

        let native_boundary = boundary.to_crs(&native)?;
        let nir = self.reduce_band(granules, &self.nir_band, &grid, &native_boundary)?;
        let swir = self.reduce_band(granules, &self.swir_band, &grid, &native_boundary)?;

        for (name, band) in [(&self.nir_band, &nir), (&self.swir_band, &swir)] {
            if band.data().iter().all(|v| v.is_nan()) {
                return Err(PipelineError::InsufficientImagery(format!(
                    "no valid {name} observation inside the boundary"
                )));
            }
        }

        info!(
            "Reduced {} granules to {}x{} cells",
            granules.len(),
            nir.rows(),
            nir.cols()
        );
        Ok(ReducedImagery::new(nir, swir)?)
    }

    fn reduce_band(
        &self,
        granules: &[Granule],
        band: &str,
        grid: &TargetGrid,
        native_boundary: &Boundary,
    ) -> Result<Raster<f64>> {
        let series = granules
            .iter()
            .map(|g| {
                let raster = g.band(band).ok_or_else(|| {
                    PipelineError::InsufficientImagery(format!(
                        "granule {} lacks band {band}",
                        g.id
                    ))
                })?;
                Ok(resample_nearest(&self.ingest(raster), grid)?)
            })
            .collect::<Result<Vec<_>>>()?;

        let composite = median_composite(&series)?;
        let envelope = bounding_box(native_boundary.geometry())
            .ok_or_else(|| Error::InvalidGeometry("boundary has no extent".into()))?;
        let cropped = crop_to_bounds(&composite, &envelope)?;
        let clipped = clip_to_geometry(&cropped, native_boundary.geometry())?;
        Ok(reproject_raster(&clipped, &self.working_crs)?)
    }

    /// Raw and per-band no-data sentinels become NaN
    fn ingest(&self, raster: &Raster<f64>) -> Raster<f64> {
        let own = raster.nodata();
        let raw = self.raw_nodata;
        let is_missing = |v: f64| {
            !v.is_finite() || own.is_some_and(|n| v == n) || raw.is_some_and(|n| v == n)
        };
        let mut out = raster.map(|v| if is_missing(v) { f64::NAN } else { v });
        out.set_nodata(Some(f64::NAN));
        out
    }
}

/// Extent to search catalogs with, in WGS84 degrees
pub fn search_extent(boundary: &Boundary, config: &PipelineConfig) -> Result<BoundingBox> {
    let bbox = boundary.bbox(config.bbox_buffer, config.bbox_precision)?;
    let wgs84 = CRS::wgs84();
    if boundary.crs().is_equivalent(&wgs84) {
        return Ok(bbox);
    }
    Ok(BoundingBox::from_tuple(reproject_bounds(
        boundary.crs(),
        &wgs84,
        bbox.as_tuple(),
    )?))
}
