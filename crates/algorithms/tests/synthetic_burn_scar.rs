//! End-to-end checks of the algorithm chain on synthetic fire scenes.
//!
//! Each scene is a 20 m UTM grid with a square burn scar: pre-fire
//! reflectance is healthy vegetation everywhere, post-fire reflectance
//! drops NIR and raises SWIR inside the scar.

use approx::assert_relative_eq;
use burnscar_algorithms::imagery::ReducedImagery;
use burnscar_algorithms::prelude::*;
use burnscar_algorithms::vector::area;
use burnscar_core::crs::CRS;
use geo_types::{Geometry, Point};

const CELL: f64 = 20.0;
const ORIGIN_X: f64 = 500_000.0;
const ORIGIN_Y: f64 = 4_200_000.0;

fn band(size: usize, value: impl Fn(usize, usize) -> f64) -> Raster<f64> {
    let mut r = Raster::new(size, size);
    r.set_transform(GeoTransform::new(ORIGIN_X, ORIGIN_Y, CELL, -CELL));
    r.set_crs(Some(CRS::from_epsg(32611)));
    for row in 0..size {
        for col in 0..size {
            r.set(row, col, value(row, col)).unwrap();
        }
    }
    r
}

/// Scar covers rows and cols `lo..hi`
fn scene(size: usize, lo: usize, hi: usize) -> (ReducedImagery, ReducedImagery) {
    let burned = move |r: usize, c: usize| (lo..hi).contains(&r) && (lo..hi).contains(&c);
    let pre = ReducedImagery::new(band(size, |_, _| 0.40), band(size, |_, _| 0.10)).unwrap();
    let post = ReducedImagery::new(
        band(size, |r, c| if burned(r, c) { 0.15 } else { 0.40 }),
        band(size, |r, c| if burned(r, c) { 0.30 } else { 0.10 }),
    )
    .unwrap();
    (pre, post)
}

fn cell_centre(row: usize, col: usize) -> Point<f64> {
    Point::new(
        ORIGIN_X + (col as f64 + 0.5) * CELL,
        ORIGIN_Y - (row as f64 + 0.5) * CELL,
    )
}

#[test]
fn burn_scar_square_becomes_sixteen_cell_polygon() {
    let (pre, post) = scene(10, 3, 7);
    let stack = compute_burn_metrics(&pre, &post).unwrap();

    let mask = SimpleThreshold::new(0.025).apply(stack.get(BurnMetric::Rbr)).unwrap();
    let mask = postprocess_mask(&mask, &PostProcessParams::none()).unwrap();
    let seeds = [cell_centre(5, 5), cell_centre(0, 0)];
    let segmented = SeededFloodFill::default().apply(&mask, &seeds).unwrap();

    let boundary = extract_boundary(&segmented, MergePolicy::default())
        .unwrap()
        .expect("scar should produce a boundary");
    assert!(matches!(boundary, Geometry::Polygon(_)));
    assert_relative_eq!(area(&boundary), 16.0 * CELL * CELL, epsilon = 1e-6);
}

#[test]
fn otsu_separates_scar_from_background() {
    let (pre, post) = scene(12, 2, 8);
    let stack = compute_burn_metrics(&pre, &post).unwrap();
    let mask = OtsuThreshold::default().apply(stack.get(BurnMetric::Dnbr)).unwrap();
    let burned = mask.data().iter().filter(|&&v| v == 1).count();
    assert_eq!(burned, 36);
}

#[test]
fn seed_outside_scar_detects_nothing() {
    let (pre, post) = scene(10, 3, 7);
    let stack = compute_burn_metrics(&pre, &post).unwrap();
    let mask = SimpleThreshold::new(0.025).apply(stack.get(BurnMetric::Rbr)).unwrap();
    let segmented = SeededFloodFill::default()
        .apply(&mask, &[cell_centre(0, 9)])
        .unwrap();
    assert!(extract_boundary(&segmented, MergePolicy::default())
        .unwrap()
        .is_none());
}

#[test]
fn metric_stack_survives_geotiff_round_trip() {
    let (pre, post) = scene(8, 2, 5);
    let stack = compute_burn_metrics(&pre, &post).unwrap();
    let dir = tempfile::tempdir().unwrap();

    for (metric, layer) in stack.iter() {
        let path = dir.path().join(format!("{}.tif", metric));
        burnscar_core::io::write_geotiff(layer, &path).unwrap();
        let back: Raster<f64> = burnscar_core::io::read_geotiff(&path).unwrap();
        assert!(back.same_grid(layer));
        for (a, b) in back.data().iter().zip(layer.data().iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-6);
        }
    }
}
