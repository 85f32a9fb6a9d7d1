//! WGS84 <-> UTM reprojection (Snyder 1987, USGS Prof. Paper 1395, pp. 61-64).
//!
//! Covers EPSG 4326, 326xx (UTM North) and 327xx (UTM South), which is
//! every CRS Sentinel-2 granules and burn products are delivered in.

use super::{CRS, WGS84_EPSG};
use crate::error::{Error, Result};
use geo::MapCoords;
use geo_types::{Coord, Geometry};

const A: f64 = 6_378_137.0; // semi-major axis (m)
const F: f64 = 1.0 / 298.257_223_563; // flattening
const E2: f64 = 2.0 * F - F * F; // eccentricity squared
const E_PRIME2: f64 = E2 / (1.0 - E2); // second eccentricity squared
const K0: f64 = 0.9996; // UTM scale factor
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Vertices added along each edge when reprojecting a rectangle
const EDGE_DENSIFY: usize = 8;

/// Parse an EPSG code into UTM zone info: `Some((zone, is_north))`
pub fn parse_utm_epsg(epsg: u32) -> Option<(u32, bool)> {
    if (32601..=32660).contains(&epsg) {
        Some((epsg - 32600, true))
    } else if (32701..=32760).contains(&epsg) {
        Some((epsg - 32700, false))
    } else {
        None
    }
}

/// UTM EPSG code of the zone containing a WGS84 point
pub fn utm_epsg_for(lon: f64, lat: f64) -> u32 {
    let zone = (((lon + 180.0) / 6.0).floor() as i64 + 1).clamp(1, 60) as u32;
    if lat >= 0.0 {
        32600 + zone
    } else {
        32700 + zone
    }
}

/// Transform one point between two supported CRSs
pub fn transform_point(src: &CRS, dst: &CRS, x: f64, y: f64) -> Result<(f64, f64)> {
    let from = src.require_epsg()?;
    let to = dst.require_epsg()?;
    if from == to {
        return Ok((x, y));
    }

    let (lon, lat) = if from == WGS84_EPSG {
        (x, y)
    } else {
        let (zone, north) =
            parse_utm_epsg(from).ok_or_else(|| Error::UnsupportedCrs(src.identifier()))?;
        utm_to_wgs84(x, y, zone, north)
    };

    if to == WGS84_EPSG {
        return Ok((lon, lat));
    }
    let (zone, north) =
        parse_utm_epsg(to).ok_or_else(|| Error::UnsupportedCrs(dst.identifier()))?;
    Ok(wgs84_to_utm(lon, lat, zone, north))
}

/// Envelope of a reprojected rectangle `(min_x, min_y, max_x, max_y)`.
///
/// Edges are densified so the curvature of projected lines is captured.
pub fn reproject_bounds(
    src: &CRS,
    dst: &CRS,
    bounds: (f64, f64, f64, f64),
) -> Result<(f64, f64, f64, f64)> {
    let (min_x, min_y, max_x, max_y) = bounds;
    let mut out = (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);

    for i in 0..=EDGE_DENSIFY {
        let t = i as f64 / EDGE_DENSIFY as f64;
        let x = min_x + t * (max_x - min_x);
        let y = min_y + t * (max_y - min_y);
        for (px, py) in [(x, min_y), (x, max_y), (min_x, y), (max_x, y)] {
            let (tx, ty) = transform_point(src, dst, px, py)?;
            out = (out.0.min(tx), out.1.min(ty), out.2.max(tx), out.3.max(ty));
        }
    }

    Ok(out)
}

/// Reproject every vertex of a geometry
pub fn reproject_geometry(src: &CRS, dst: &CRS, geometry: &Geometry<f64>) -> Result<Geometry<f64>> {
    if src.is_equivalent(dst) {
        return Ok(geometry.clone());
    }
    geometry.try_map_coords(|c: Coord<f64>| {
        transform_point(src, dst, c.x, c.y).map(|(x, y)| Coord { x, y })
    })
}

fn central_meridian(zone: u32) -> f64 {
    ((zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
}

/// WGS84 (lon, lat) degrees to UTM (easting, northing) metres
fn wgs84_to_utm(lon_deg: f64, lat_deg: f64, zone: u32, north: bool) -> (f64, f64) {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let lon0 = central_meridian(zone);

    let sin_lat = lat.sin();
    let cos_lat = lat.cos();
    let tan_lat = lat.tan();

    let n = A / (1.0 - E2 * sin_lat * sin_lat).sqrt();
    let t = tan_lat * tan_lat;
    let c = E_PRIME2 * cos_lat * cos_lat;
    let a_coeff = cos_lat * (lon - lon0);
    let m = meridional_arc(lat);

    let a2 = a_coeff * a_coeff;
    let a4 = a2 * a2;
    let a6 = a4 * a2;

    // Snyder eq. 8-9
    let easting = K0 * n
        * (a_coeff
            + (1.0 - t + c) * a2 * a_coeff / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * E_PRIME2) * a4 * a_coeff / 120.0)
        + FALSE_EASTING;

    // Snyder eq. 8-10
    let northing = K0
        * (m + n
            * tan_lat
            * (a2 / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * E_PRIME2) * a6 / 720.0));

    let northing = if north {
        northing
    } else {
        northing + FALSE_NORTHING_SOUTH
    };

    (easting, northing)
}

/// UTM (easting, northing) metres to WGS84 (lon, lat) degrees
fn utm_to_wgs84(easting: f64, northing: f64, zone: u32, north: bool) -> (f64, f64) {
    let x = easting - FALSE_EASTING;
    let y = if north {
        northing
    } else {
        northing - FALSE_NORTHING_SOUTH
    };

    let e4 = E2 * E2;
    let e6 = e4 * E2;
    let m = y / K0;
    let mu = m / (A * (1.0 - E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

    // Footpoint latitude, Snyder eq. 3-26
    let sq = (1.0 - E2).sqrt();
    let e1 = (1.0 - sq) / (1.0 + sq);
    let e1_2 = e1 * e1;
    let e1_3 = e1_2 * e1;
    let e1_4 = e1_3 * e1;
    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

    let sin_phi = phi1.sin();
    let cos_phi = phi1.cos();
    let tan_phi = phi1.tan();

    let c1 = E_PRIME2 * cos_phi * cos_phi;
    let t1 = tan_phi * tan_phi;
    let denom = 1.0 - E2 * sin_phi * sin_phi;
    let n1 = A / denom.sqrt();
    let r1 = A * (1.0 - E2) / denom.powf(1.5);
    let d = x / (n1 * K0);

    let d2 = d * d;
    let d4 = d2 * d2;
    let d6 = d4 * d2;

    // Snyder eq. 8-17, 8-18
    let lat = phi1
        - (n1 * tan_phi / r1)
            * (d2 / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * E_PRIME2) * d4 / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                    - 252.0 * E_PRIME2
                    - 3.0 * c1 * c1)
                    * d6
                    / 720.0);

    let lon = central_meridian(zone)
        + (d - (1.0 + 2.0 * t1 + c1) * d2 * d / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * E_PRIME2 + 24.0 * t1 * t1)
                * d4
                * d
                / 120.0)
            / cos_phi;

    (lon.to_degrees(), lat.to_degrees())
}

/// Meridional arc from equator to latitude `lat` (radians), Snyder eq. 3-21
fn meridional_arc(lat: f64) -> f64 {
    let e4 = E2 * E2;
    let e6 = e4 * E2;

    A * ((1.0 - E2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
        - (3.0 * E2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}
