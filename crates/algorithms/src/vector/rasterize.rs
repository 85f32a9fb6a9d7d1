//! Geometry to grid: burn-in masks, clipping and cropping

use super::spatial::{bounding_box, BoundingBox};
use crate::maybe_rayon::*;
use burnscar_core::raster::{Raster, RasterElement};
use burnscar_core::{Error, Result};
use geo::Contains;
use geo_types::{Geometry, Point};
use ndarray::{s, Array2};

/// 1 where the cell centre lies inside `geometry`, 0 elsewhere.
///
/// Only polygonal geometries cover cells; anything else gives an empty mask.
pub fn geometry_mask<T>(template: &Raster<T>, geometry: &Geometry<f64>) -> Result<Raster<u8>>
where
    T: RasterElement,
{
    let (rows, cols) = template.shape();
    let envelope = bounding_box(geometry);

    let data: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0u8; cols];
            let Some(bb) = envelope else {
                return row_data;
            };
            for (col, out) in row_data.iter_mut().enumerate() {
                let (x, y) = template.pixel_to_geo(col, row);
                if bb.contains_point(x, y) && covers(geometry, &Point::new(x, y)) {
                    *out = 1;
                }
            }
            row_data
        })
        .collect();

    let mut mask = template.with_same_meta::<u8>(rows, cols);
    mask.set_nodata(None);
    *mask.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(mask)
}

/// Same grid as `raster`, with every cell whose centre falls outside
/// `geometry` set to NaN.
pub fn clip_to_geometry(raster: &Raster<f64>, geometry: &Geometry<f64>) -> Result<Raster<f64>> {
    let mask = geometry_mask(raster, geometry)?;
    let mut clipped = raster.clone();
    ndarray::Zip::from(clipped.data_mut())
        .and(mask.data())
        .for_each(|v, &inside| {
            if inside == 0 {
                *v = f64::NAN;
            }
        });
    clipped.set_nodata(Some(f64::NAN));
    Ok(clipped)
}

/// Sub-grid of every cell touching `bounds`.
///
/// Fails when the box misses the raster entirely.
pub fn crop_to_bounds<T>(raster: &Raster<T>, bounds: &BoundingBox) -> Result<Raster<T>>
where
    T: RasterElement,
{
    let (rows, cols) = raster.shape();
    let corners = [
        raster.geo_to_pixel(bounds.min_x, bounds.min_y),
        raster.geo_to_pixel(bounds.min_x, bounds.max_y),
        raster.geo_to_pixel(bounds.max_x, bounds.min_y),
        raster.geo_to_pixel(bounds.max_x, bounds.max_y),
    ];
    if corners.iter().any(|(c, r)| !c.is_finite() || !r.is_finite()) {
        return Err(Error::InvalidGeometry(format!(
            "cannot locate bounds {:?} on the grid",
            bounds.as_tuple()
        )));
    }

    let fold = |pick: fn(&(f64, f64)) -> f64, init: f64, f: fn(f64, f64) -> f64| {
        corners.iter().map(pick).fold(init, f)
    };
    let col_lo = fold(|p| p.0, f64::INFINITY, f64::min).floor().max(0.0);
    let col_hi = fold(|p| p.0, f64::NEG_INFINITY, f64::max).ceil().min(cols as f64);
    let row_lo = fold(|p| p.1, f64::INFINITY, f64::min).floor().max(0.0);
    let row_hi = fold(|p| p.1, f64::NEG_INFINITY, f64::max).ceil().min(rows as f64);

    if col_lo >= col_hi || row_lo >= row_hi {
        return Err(Error::InvalidGeometry(format!(
            "bounds {:?} do not overlap the raster",
            bounds.as_tuple()
        )));
    }

    let (r0, r1, c0, c1) = (
        row_lo as usize,
        row_hi as usize,
        col_lo as usize,
        col_hi as usize,
    );
    let mut cropped = raster.with_same_meta::<T>(r1 - r0, c1 - c0);
    let (x0, y0) = raster.transform().pixel_to_geo_corner(c0, r0);
    let mut transform = *raster.transform();
    transform.origin_x = x0;
    transform.origin_y = y0;
    cropped.set_transform(transform);
    cropped.set_nodata(raster.nodata());
    *cropped.data_mut() = raster.data().slice(s![r0..r1, c0..c1]).to_owned();
    Ok(cropped)
}

fn covers(geometry: &Geometry<f64>, point: &Point<f64>) -> bool {
    match geometry {
        Geometry::Polygon(p) => p.contains(point),
        Geometry::MultiPolygon(mp) => mp.contains(point),
        Geometry::Rect(r) => r.contains(point),
        Geometry::GeometryCollection(gc) => gc.0.iter().any(|g| covers(g, point)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burnscar_core::raster::GeoTransform;

    fn grid(rows: usize, cols: usize) -> Raster<f64> {
        let mut r = Raster::filled(rows, cols, 1.0);
        r.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        r
    }

    #[test]
    fn test_geometry_mask_counts_centres() {
        let r = grid(10, 10);
        let square = Geometry::Polygon(BoundingBox::new(2.0, 2.0, 6.0, 6.0).to_polygon());
        let mask = geometry_mask(&r, &square).unwrap();
        assert_eq!(mask.data().iter().filter(|&&v| v == 1).count(), 16);
        // row 4 is y in [5, 6], inside; row 0 is the top edge, outside
        assert_eq!(mask.get(4, 2).unwrap(), 1);
        assert_eq!(mask.get(0, 2).unwrap(), 0);
    }

    #[test]
    fn test_clip_keeps_grid_and_nans_outside() {
        let r = grid(4, 4);
        let half = Geometry::Polygon(BoundingBox::new(0.0, 0.0, 2.0, 4.0).to_polygon());
        let clipped = clip_to_geometry(&r, &half).unwrap();
        assert_eq!(clipped.shape(), (4, 4));
        assert_eq!(clipped.transform(), r.transform());
        assert_eq!(clipped.get(0, 0).unwrap(), 1.0);
        assert!(clipped.get(0, 3).unwrap().is_nan());
    }

    #[test]
    fn test_point_geometry_masks_nothing() {
        let r = grid(3, 3);
        let mask = geometry_mask(&r, &Geometry::Point(Point::new(1.5, 1.5))).unwrap();
        assert!(mask.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_crop_to_bounds() {
        let mut r = grid(10, 10);
        r.set(7, 3, 42.0).unwrap();
        let cropped = crop_to_bounds(&r, &BoundingBox::new(2.5, 1.5, 5.5, 4.0)).unwrap();
        // columns 2..6, rows 6..9 (y from 4.0 down to 1.5)
        assert_eq!(cropped.shape(), (3, 4));
        assert_eq!(cropped.transform().origin_x, 2.0);
        assert_eq!(cropped.transform().origin_y, 4.0);
        assert_eq!(cropped.get(1, 1).unwrap(), 42.0);
    }

    #[test]
    fn test_crop_outside_fails() {
        let r = grid(5, 5);
        assert!(crop_to_bounds(&r, &BoundingBox::new(50.0, 50.0, 60.0, 60.0)).is_err());
    }
}
