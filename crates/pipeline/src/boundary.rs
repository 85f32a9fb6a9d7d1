//! Area of interest and seed points

use crate::error::Result;
use burnscar_algorithms::vector::{area, bounding_box, centroid, perimeter, BoundingBox};
use burnscar_core::crs::{reproject_geometry, transform_point, CRS};
use burnscar_core::vector::{
    crs_from_geojson, parse_geojson, points_from_geojson, polygonal_from_geojson,
    to_feature_collection,
};
use burnscar_core::Error;
use geo_types::{Geometry, Point};
use geojson::GeoJson;

/// Polygonal area of interest with its CRS.
///
/// Always a Polygon or MultiPolygon. Replaced wholesale, never edited.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    geometry: Geometry<f64>,
    crs: CRS,
}

impl Boundary {
    pub fn new(geometry: Geometry<f64>, crs: CRS) -> Result<Self> {
        match &geometry {
            Geometry::Polygon(p) if !p.exterior().0.is_empty() => {}
            Geometry::MultiPolygon(mp) if !mp.0.is_empty() => {}
            _ => {
                return Err(Error::InvalidGeometry(
                    "boundary must be a non-empty polygon or multipolygon".into(),
                )
                .into())
            }
        }
        Ok(Self { geometry, crs })
    }

    /// Parse GeoJSON, taking the CRS from its legacy `"crs"` member or
    /// falling back to `default_crs`
    pub fn from_geojson_str(text: &str, default_crs: &CRS) -> Result<Self> {
        let geojson = parse_geojson(text)?;
        let crs = crs_from_geojson(&geojson).unwrap_or_else(|| default_crs.clone());
        Self::new(polygonal_from_geojson(&geojson)?, crs)
    }

    pub fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    pub fn crs(&self) -> &CRS {
        &self.crs
    }

    pub fn to_crs(&self, dst: &CRS) -> Result<Self> {
        if self.crs.is_equivalent(dst) {
            return Ok(self.clone());
        }
        let geometry = reproject_geometry(&self.crs, dst, &self.geometry)?;
        Ok(Self {
            geometry,
            crs: dst.clone(),
        })
    }

    /// Envelope in the boundary's own CRS, edges rounded to `precision`
    /// decimals and then pushed outward by `buffer`
    pub fn bbox(&self, buffer: f64, precision: u32) -> Result<BoundingBox> {
        let envelope = bounding_box(&self.geometry)
            .ok_or_else(|| Error::InvalidGeometry("boundary has no extent".into()))?;
        Ok(envelope.rounded(precision).expanded(buffer).rounded(precision))
    }

    /// Area in squared CRS units
    pub fn area(&self) -> f64 {
        area(&self.geometry)
    }

    /// Ring length in CRS units, holes included
    pub fn perimeter(&self) -> f64 {
        perimeter(&self.geometry)
    }

    pub fn centroid(&self) -> Option<Point<f64>> {
        centroid(&self.geometry)
    }

    /// One-feature FeatureCollection tagged with the CRS
    pub fn to_geojson(&self) -> GeoJson {
        to_feature_collection([&self.geometry], Some(&self.crs))
    }
}

/// Seed points for region growing, in one CRS
#[derive(Debug, Clone, PartialEq)]
pub struct SeedPointSet {
    points: Vec<Point<f64>>,
    crs: CRS,
}

impl SeedPointSet {
    pub fn new(points: Vec<Point<f64>>, crs: CRS) -> Self {
        Self { points, crs }
    }

    pub fn from_geojson_str(text: &str, default_crs: &CRS) -> Result<Self> {
        let geojson = parse_geojson(text)?;
        let crs = crs_from_geojson(&geojson).unwrap_or_else(|| default_crs.clone());
        Ok(Self::new(points_from_geojson(&geojson)?, crs))
    }

    pub fn points(&self) -> &[Point<f64>] {
        &self.points
    }

    pub fn crs(&self) -> &CRS {
        &self.crs
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn to_crs(&self, dst: &CRS) -> Result<Self> {
        if self.crs.is_equivalent(dst) {
            return Ok(self.clone());
        }
        let points = self
            .points
            .iter()
            .map(|p| transform_point(&self.crs, dst, p.x(), p.y()).map(Point::from))
            .collect::<burnscar_core::Result<Vec<_>>>()?;
        Ok(Self::new(points, dst.clone()))
    }
}
