//! Area and perimeter of boundary geometries

use geo::Area;
use geo_types::{Geometry, LineString, Polygon};

/// Unsigned area of the polygonal part of a geometry, in CRS units squared.
///
/// Geographic boundaries give square degrees; reproject to UTM first for
/// square metres.
pub fn area(geom: &Geometry<f64>) -> f64 {
    match geom {
        Geometry::Polygon(p) => p.unsigned_area(),
        Geometry::MultiPolygon(mp) => mp.unsigned_area(),
        Geometry::Rect(r) => r.unsigned_area(),
        _ => 0.0,
    }
}

/// Total length of every ring, exterior and interior
pub fn perimeter(geom: &Geometry<f64>) -> f64 {
    match geom {
        Geometry::Polygon(p) => polygon_perimeter(p),
        Geometry::MultiPolygon(mp) => mp.0.iter().map(polygon_perimeter).sum(),
        _ => 0.0,
    }
}

fn polygon_perimeter(p: &Polygon<f64>) -> f64 {
    ring_length(p.exterior()) + p.interiors().iter().map(ring_length).sum::<f64>()
}

fn ring_length(ring: &LineString<f64>) -> f64 {
    ring.lines().map(|l| l.dx().hypot(l.dy())).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_with_hole() -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0),
            ]),
            vec![LineString::from(vec![
                (2.0, 2.0), (8.0, 2.0), (8.0, 8.0), (2.0, 8.0), (2.0, 2.0),
            ])],
        )
    }

    #[test]
    fn test_area_subtracts_holes() {
        assert_relative_eq!(area(&Geometry::Polygon(square_with_hole())), 64.0);
    }

    #[test]
    fn test_area_non_polygon() {
        let line = Geometry::LineString(LineString::from(vec![(0.0, 0.0), (10.0, 10.0)]));
        assert_eq!(area(&line), 0.0);
    }

    #[test]
    fn test_perimeter_counts_interior_rings() {
        // exterior 40, interior 24
        assert_relative_eq!(perimeter(&Geometry::Polygon(square_with_hole())), 64.0);
    }

    #[test]
    fn test_perimeter_diagonal_edge() {
        let tri = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (3.0, 0.0), (3.0, 4.0), (0.0, 0.0)]),
            vec![],
        );
        assert_relative_eq!(perimeter(&Geometry::Polygon(tri)), 12.0);
    }
}
