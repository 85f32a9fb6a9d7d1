//! Envelopes, centroids and hulls of boundary geometries

use geo::{BoundingRect, Centroid, ConvexHull};
use geo_types::{Geometry, LineString, Point, Polygon};

/// Axis-aligned bounding box in the units of its geometry's CRS
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// From a `(min_x, min_y, max_x, max_y)` tuple, as returned by
    /// `Raster::bounds` and `reproject_bounds`.
    pub fn from_tuple((min_x, min_y, max_x, max_y): (f64, f64, f64, f64)) -> Self {
        Self::new(min_x, min_y, max_x, max_y)
    }

    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (self.min_x, self.min_y, self.max_x, self.max_y)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    /// Grow every side outward by `distance`
    pub fn expanded(&self, distance: f64) -> Self {
        Self::new(
            self.min_x - distance,
            self.min_y - distance,
            self.max_x + distance,
            self.max_y + distance,
        )
    }

    /// Round every edge to `decimals` decimal places
    pub fn rounded(&self, decimals: u32) -> Self {
        let scale = 10f64.powi(decimals as i32);
        let round = |v: f64| (v * scale).round() / scale;
        Self::new(
            round(self.min_x),
            round(self.min_y),
            round(self.max_x),
            round(self.max_y),
        )
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (self.min_x, self.min_y),
                (self.max_x, self.min_y),
                (self.max_x, self.max_y),
                (self.min_x, self.max_y),
                (self.min_x, self.min_y),
            ]),
            vec![],
        )
    }
}

/// Envelope of a geometry, `None` for empty geometries
pub fn bounding_box(geom: &Geometry<f64>) -> Option<BoundingBox> {
    geom.bounding_rect()
        .map(|rect| BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y))
}

pub fn centroid(geom: &Geometry<f64>) -> Option<Point<f64>> {
    geom.centroid()
}

/// Convex hull of the polygonal members of a geometry.
///
/// Non-polygonal geometries fall back to the hull of their envelope.
pub fn convex_hull(geom: &Geometry<f64>) -> Option<Polygon<f64>> {
    match geom {
        Geometry::Polygon(p) => Some(p.convex_hull()),
        Geometry::MultiPolygon(mp) => Some(mp.convex_hull()),
        other => bounding_box(other).map(|bb| bb.to_polygon()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::Area;
    use geo_types::{Coord, MultiPolygon};

    fn square(x0: f64, y0: f64, side: f64) -> Polygon<f64> {
        BoundingBox::new(x0, y0, x0 + side, y0 + side).to_polygon()
    }

    #[test]
    fn test_bounding_box() {
        let bb = bounding_box(&Geometry::Polygon(square(0.0, 0.0, 10.0))).unwrap();
        assert_eq!(bb.as_tuple(), (0.0, 0.0, 10.0, 10.0));
        assert_eq!(bb.width() * bb.height(), 100.0);
    }

    #[test]
    fn test_expanded_and_rounded() {
        let bb = BoundingBox::new(-120.12345, 38.55555, -119.98765, 38.70001);
        let out = bb.rounded(2).expanded(0.1).rounded(2);
        assert_relative_eq!(out.min_x, -120.22, epsilon = 1e-12);
        assert_relative_eq!(out.min_y, 38.46, epsilon = 1e-12);
        assert_relative_eq!(out.max_x, -119.89, epsilon = 1e-12);
        assert_relative_eq!(out.max_y, 38.80, epsilon = 1e-12);
    }

    #[test]
    fn test_intersects_and_contains() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&BoundingBox::new(5.0, 5.0, 15.0, 15.0)));
        assert!(!a.intersects(&BoundingBox::new(20.0, 20.0, 30.0, 30.0)));
        assert!(a.contains_point(5.0, 5.0));
        assert!(!a.contains_point(15.0, 5.0));
    }

    #[test]
    fn test_centroid_of_multipolygon() {
        let mp = MultiPolygon(vec![square(0.0, 0.0, 2.0), square(8.0, 0.0, 2.0)]);
        let c = centroid(&Geometry::MultiPolygon(mp)).unwrap();
        assert_relative_eq!(c.x(), 5.0, epsilon = 1e-12);
        assert_relative_eq!(c.y(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_convex_hull_bridges_parts() {
        let mp = MultiPolygon(vec![square(0.0, 0.0, 2.0), square(8.0, 0.0, 2.0)]);
        let hull = convex_hull(&Geometry::MultiPolygon(mp)).unwrap();
        assert_relative_eq!(hull.unsigned_area(), 20.0, epsilon = 1e-9);

        let pt = Geometry::Point(Point::new(3.0, 4.0));
        let degenerate = convex_hull(&pt).unwrap();
        assert_eq!(degenerate.exterior().0[0], Coord { x: 3.0, y: 4.0 });
    }
}
