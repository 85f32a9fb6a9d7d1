//! Nearest-neighbour regridding and reprojection

use crate::maybe_rayon::*;
use burnscar_core::crs::{reproject_bounds, transform_point, CRS};
use burnscar_core::raster::{GeoTransform, Raster};
use burnscar_core::{Error, Result};
use ndarray::Array2;

/// Destination grid for resampling
#[derive(Debug, Clone, PartialEq)]
pub struct TargetGrid {
    pub transform: GeoTransform,
    pub rows: usize,
    pub cols: usize,
    pub crs: CRS,
}

impl TargetGrid {
    /// North-up grid covering `(min_x, min_y, max_x, max_y)` with square
    /// cells, its origin snapped to a multiple of `resolution`
    pub fn covering(bounds: (f64, f64, f64, f64), resolution: f64, crs: CRS) -> Result<Self> {
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(Error::InvalidParameter {
                name: "resolution",
                value: resolution.to_string(),
                reason: "must be a positive number".into(),
            });
        }
        let (min_x, min_y, max_x, max_y) = bounds;
        if !(max_x >= min_x && max_y >= min_y) {
            return Err(Error::InvalidGeometry(format!("degenerate bounds {:?}", bounds)));
        }

        let origin_x = (min_x / resolution).floor() * resolution;
        let origin_y = (max_y / resolution).ceil() * resolution;
        let cols = (((max_x - origin_x) / resolution).ceil() as usize).max(1);
        let rows = (((origin_y - min_y) / resolution).ceil() as usize).max(1);

        Ok(Self {
            transform: GeoTransform::new(origin_x, origin_y, resolution, -resolution),
            rows,
            cols,
            crs,
        })
    }
}

/// Sample `src` at every cell centre of `grid`.
///
/// Centres are transformed into the source CRS when the two differ; those
/// falling outside the source raster are NaN.
pub fn resample_nearest(src: &Raster<f64>, grid: &TargetGrid) -> Result<Raster<f64>> {
    let src_crs = src.crs().cloned().unwrap_or_else(|| grid.crs.clone());
    let same_crs = src_crs.is_equivalent(&grid.crs);

    if !same_crs {
        // Surface unsupported CRS pairs up front rather than as silent NaN
        let (x, y) = grid.transform.pixel_to_geo(0, 0);
        transform_point(&grid.crs, &src_crs, x, y)?;
    }

    let (rows, cols) = (grid.rows, grid.cols);
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let (x, y) = grid.transform.pixel_to_geo(col, row);
                let (sx, sy) = if same_crs {
                    (x, y)
                } else {
                    match transform_point(&grid.crs, &src_crs, x, y) {
                        Ok(p) => p,
                        Err(_) => continue,
                    }
                };
                if let Some((r, c)) = src.cell_at(sx, sy) {
                    let v = unsafe { src.get_unchecked(r, c) };
                    if !src.is_nodata(v) {
                        *out = v;
                    }
                }
            }
            row_data
        })
        .collect();

    let mut output = Raster::from_array(
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?,
    );
    output.set_transform(grid.transform);
    output.set_crs(Some(grid.crs.clone()));
    output.set_nodata(Some(f64::NAN));
    Ok(output)
}

/// Reproject a raster into `dst`, keeping its row and column count.
///
/// The destination grid spans the envelope of the reprojected source
/// bounds.
pub fn reproject_raster(src: &Raster<f64>, dst: &CRS) -> Result<Raster<f64>> {
    let src_crs = src
        .crs()
        .ok_or_else(|| Error::UnsupportedCrs("raster has no CRS".into()))?;
    if src_crs.is_equivalent(dst) {
        return Ok(src.clone());
    }

    let (min_x, min_y, max_x, max_y) = reproject_bounds(src_crs, dst, src.bounds())?;
    let (rows, cols) = src.shape();
    let grid = TargetGrid {
        transform: GeoTransform::new(
            min_x,
            max_y,
            (max_x - min_x) / cols.max(1) as f64,
            -(max_y - min_y) / rows.max(1) as f64,
        ),
        rows,
        cols,
        crs: dst.clone(),
    };
    resample_nearest(src, &grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn utm_raster() -> Raster<f64> {
        // 10 x 10 cells of 20 m in UTM zone 10N
        let mut r = Raster::from_vec((0..100).map(|v| v as f64).collect(), 10, 10).unwrap();
        r.set_transform(GeoTransform::new(720_000.0, 4_210_000.0, 20.0, -20.0));
        r.set_crs(Some(CRS::from_epsg(32610)));
        r
    }

    #[test]
    fn test_covering_snaps_origin() {
        let g = TargetGrid::covering((105.0, 95.0, 161.0, 139.0), 20.0, CRS::from_epsg(32610))
            .unwrap();
        assert_relative_eq!(g.transform.origin_x, 100.0);
        assert_relative_eq!(g.transform.origin_y, 140.0);
        assert_eq!(g.cols, 4);
        assert_eq!(g.rows, 3);
        assert!(TargetGrid::covering((0.0, 0.0, 1.0, 1.0), 0.0, CRS::wgs84()).is_err());
    }

    #[test]
    fn test_resample_same_crs_coarser() {
        let src = utm_raster();
        let grid = TargetGrid::covering(src.bounds(), 40.0, CRS::from_epsg(32610)).unwrap();
        let out = resample_nearest(&src, &grid).unwrap();
        assert_eq!(out.shape(), (5, 5));
        // centre of output (0,0) is 20 m into the source: source cell (1,1)
        assert_relative_eq!(out.get(0, 0).unwrap(), 11.0);
    }

    #[test]
    fn test_resample_outside_is_nan() {
        let src = utm_raster();
        let grid =
            TargetGrid::covering((719_900.0, 4_209_900.0, 720_100.0, 4_210_100.0), 20.0, CRS::from_epsg(32610))
                .unwrap();
        let out = resample_nearest(&src, &grid).unwrap();
        assert!(out.get(0, 0).unwrap().is_nan());
        assert!(out.valid_count() > 0);
    }

    #[test]
    fn test_reproject_to_wgs84_keeps_shape() {
        let src = utm_raster();
        let out = reproject_raster(&src, &CRS::wgs84()).unwrap();
        assert_eq!(out.shape(), src.shape());
        assert_eq!(out.crs(), Some(&CRS::wgs84()));
        let (min_x, min_y, max_x, max_y) = out.bounds();
        assert!(min_x > -123.0 && max_x < -120.0, "{min_x} {max_x}");
        assert!(min_y > 37.0 && max_y < 39.0, "{min_y} {max_y}");
        assert!(out.valid_count() >= 50);
    }

    #[test]
    fn test_unsupported_target() {
        assert!(reproject_raster(&utm_raster(), &CRS::from_epsg(3857)).is_err());
    }
}
