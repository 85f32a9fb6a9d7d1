//! End-to-end analysis of a synthetic fire event

use approx::assert_relative_eq;
use burnscar_algorithms::imagery::BurnMetric;
use burnscar_algorithms::vector::BoundingBox;
use burnscar_core::crs::{transform_point, CRS};
use burnscar_core::raster::{GeoTransform, Raster};
use burnscar_pipeline::imagery::parse_date;
use burnscar_pipeline::state::{PipelineState, Uninitialized};
use burnscar_pipeline::{
    compute_metrics, derive_boundary, Boundary, FailureKind, FireEventWindows, Granule,
    InMemoryCatalog, LocalObjectStore, MetricStackStore, PipelineConfig, PipelineError,
    SeedPointSet,
};
use geo_types::{Geometry, Point};

const EPSG: u32 = 32611;
/// Upper-left corner of every granule, 80 x 80 cells of 20 m
const ORIGIN: (f64, f64) = (499_800.0, 4_200_200.0);
const SCAR: (f64, f64, f64, f64) = (500_300.0, 4_199_300.0, 500_700.0, 4_199_700.0);
const SCAR_CENTRE: (f64, f64) = (500_500.0, 4_199_500.0);

fn utm() -> CRS {
    CRS::from_epsg(EPSG)
}

fn band(f: impl Fn(f64, f64) -> f64) -> Raster<f64> {
    let transform = GeoTransform::new(ORIGIN.0, ORIGIN.1, 20.0, -20.0);
    let data = (0..80 * 80)
        .map(|i| {
            let (x, y) = transform.pixel_to_geo(i % 80, i / 80);
            f(x, y)
        })
        .collect();
    let mut r = Raster::from_vec(data, 80, 80).unwrap();
    r.set_transform(transform);
    r
}

fn in_scar(x: f64, y: f64) -> bool {
    x > SCAR.0 && x < SCAR.2 && y > SCAR.1 && y < SCAR.3
}

fn granule(id: &str, date: &str, burned: bool) -> Granule {
    let nir = band(|x, y| if burned && in_scar(x, y) { 0.15 } else { 0.40 });
    let swir = band(|x, y| if burned && in_scar(x, y) { 0.30 } else { 0.10 });
    Granule::new(
        id,
        parse_date(date).unwrap(),
        utm(),
        [("B8A".to_string(), nir), ("B12".to_string(), swir)],
    )
    .unwrap()
}

fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::new(vec![
        granule("pre-1", "2023-07-05", false),
        granule("pre-2", "2023-07-20", false),
        granule("post-1", "2023-09-10", true),
        // acquired mid-fire, outside both windows
        granule("during", "2023-08-15", true),
    ])
}

fn windows() -> FireEventWindows {
    FireEventWindows::new(
        "2023-07-01/2023-07-31".parse().unwrap(),
        "2023-09-01/2023-09-30".parse().unwrap(),
    )
}

fn aoi() -> Boundary {
    let bb = BoundingBox::new(500_000.0, 4_199_000.0, 501_000.0, 4_200_000.0);
    Boundary::new(Geometry::Polygon(bb.to_polygon()), utm()).unwrap()
}

fn utm_config() -> PipelineConfig {
    PipelineConfig {
        working_epsg: EPSG,
        bbox_buffer: 100.0,
        bbox_precision: 0,
        ..PipelineConfig::default()
    }
}

fn finite_cells(r: &Raster<f64>) -> usize {
    r.data().iter().filter(|v| v.is_finite()).count()
}

#[test]
fn metrics_without_derivation_keep_the_input_boundary() {
    let outcome = compute_metrics(&utm_config(), &catalog(), aoi(), &windows(), false).unwrap();
    assert!(!outcome.derived);
    assert_eq!(outcome.boundary, aoi());

    let rbr = outcome.stack.get(BurnMetric::Rbr);
    assert_eq!(rbr.shape(), (50, 50));
    assert_eq!(rbr.crs(), Some(&utm()));

    // centre of the scar and a corner of the AOI
    let (r, c) = rbr.cell_at(SCAR_CENTRE.0, SCAR_CENTRE.1).unwrap();
    let burned = outcome.stack.get(BurnMetric::Dnbr).get(r, c).unwrap();
    assert_relative_eq!(burned, 0.6 - (-0.15 / 0.45), epsilon = 1e-9);
    assert_eq!(rbr.get(0, 0).unwrap(), 0.0);
}

#[test]
fn derivation_traces_the_scar() {
    let outcome = compute_metrics(&utm_config(), &catalog(), aoi(), &windows(), true).unwrap();
    assert!(outcome.derived);
    assert_eq!(outcome.boundary.crs().epsg(), Some(EPSG));
    assert_relative_eq!(outcome.boundary.area(), 400.0 * 400.0, epsilon = 1e-6);

    for (_, layer) in outcome.stack.iter() {
        assert_eq!(finite_cells(layer), 400);
    }
    let text = outcome.boundary.to_geojson().to_string();
    assert!(text.contains("FeatureCollection"));
}

#[test]
fn missing_postfire_imagery_is_insufficient() {
    let only_pre = InMemoryCatalog::new(vec![granule("pre-1", "2023-07-05", false)]);
    let err = compute_metrics(&utm_config(), &only_pre, aoi(), &windows(), false).unwrap_err();
    assert!(matches!(err, PipelineError::InsufficientImagery(_)));
    assert_eq!(err.kind(), FailureKind::InsufficientData);
}

#[test]
fn no_burn_is_a_distinct_outcome() {
    let unburned = InMemoryCatalog::new(vec![
        granule("pre-1", "2023-07-05", false),
        granule("post-1", "2023-09-10", false),
    ]);
    let err = compute_metrics(&utm_config(), &unburned, aoi(), &windows(), true).unwrap_err();
    assert!(err.is_no_boundary());
}

#[test]
fn refinement_from_a_stored_stack() {
    let config = utm_config();
    let outcome = compute_metrics(&config, &catalog(), aoi(), &windows(), false).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let store = LocalObjectStore::new(dir.path());
    let stacks = MetricStackStore::for_event(&store, "public", "synthetic_fire");
    stacks.save_stack(&outcome.stack).unwrap();
    stacks.save_boundary(&outcome.boundary).unwrap();

    let stack = stacks.load_stack().unwrap();
    let inside_and_out = SeedPointSet::new(
        vec![
            Point::new(SCAR_CENTRE.0, SCAR_CENTRE.1),
            Point::new(500_050.0, 4_199_950.0),
        ],
        utm(),
    );
    let (boundary, clipped) = derive_boundary(&config, stack.clone(), &inside_and_out).unwrap();
    assert_relative_eq!(boundary.area(), 400.0 * 400.0, epsilon = 1e-6);
    assert_eq!(finite_cells(clipped.get(BurnMetric::Rbr)), 400);

    let outside = SeedPointSet::new(vec![Point::new(500_050.0, 4_199_950.0)], utm());
    let err = derive_boundary(&config, stack, &outside).unwrap_err();
    assert!(matches!(err, PipelineError::NoFireBoundaryDetected));

    assert_eq!(stacks.load_boundary(&CRS::wgs84()).unwrap(), outcome.boundary);
}

#[test]
fn geographic_working_crs() {
    let config = PipelineConfig::default();
    let wgs_aoi = aoi().to_crs(&CRS::wgs84()).unwrap();
    let outcome = compute_metrics(&config, &catalog(), wgs_aoi, &windows(), true).unwrap();

    assert_eq!(outcome.boundary.crs().epsg(), Some(4326));
    assert_eq!(outcome.stack.grid().crs(), Some(&CRS::wgs84()));

    let centre = outcome.boundary.centroid().unwrap();
    let (lon, lat) = transform_point(&utm(), &CRS::wgs84(), SCAR_CENTRE.0, SCAR_CENTRE.1).unwrap();
    assert_relative_eq!(centre.x(), lon, epsilon = 1e-3);
    assert_relative_eq!(centre.y(), lat, epsilon = 1e-3);
}

#[test]
fn states_are_inspectable() {
    let state: PipelineState = Uninitialized::new(utm_config()).unwrap().into();
    assert_eq!(state.name(), "uninitialized");
    assert!(state.boundary().is_none());

    let PipelineState::Uninitialized(init) = state else {
        unreachable!()
    };
    let acquired = init
        .set_boundary(aoi())
        .unwrap()
        .acquire_imagery(&catalog(), &windows())
        .unwrap();
    assert_eq!(acquired.boundary(), &aoi());
    assert_eq!(acquired.prefire().nir.shape(), (50, 50));

    let state = PipelineState::from(acquired.compute_metrics().unwrap());
    assert_eq!(state.name(), "metrics_computed");
    assert!(state.stack().is_some());
    assert_eq!(state.boundary(), Some(&aoi()));
}
