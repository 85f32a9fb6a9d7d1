//! Mask polygonisation
//!
//! Traces the cell edges separating each 4-connected region from
//! everything else, links them into closed rings and maps the ring
//! vertices through the raster's affine transform.

use super::spatial::convex_hull;
use crate::segmentation::{label_components, Connectivity};
use burnscar_core::raster::{GeoTransform, Raster};
use burnscar_core::Result;
use geo::orient::{Direction, Orient};
use geo_types::{Coord, Geometry, LineString, MultiPolygon, Polygon};
use std::collections::HashMap;

/// Vertex on the cell-corner lattice, `(col, row)`
type Vertex = (i64, i64);

/// How several disjoint regions are turned into one boundary geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Keep every region as a member of a MultiPolygon
    #[default]
    KeepMultiPolygon,
    /// Replace all regions with their common convex hull
    ConvexHull,
}

/// One polygon per 4-connected region of non-zero cells, holes preserved.
///
/// Coordinates are ground units of the mask's transform. Polygons come out
/// in the row-major order of each region's first cell.
pub fn polygonize(mask: &Raster<u8>) -> Result<Vec<Polygon<f64>>> {
    let (labels, count) = label_components(mask, Connectivity::Four)?;
    if count == 0 {
        return Ok(Vec::new());
    }

    let (rows, cols) = labels.shape();
    let data = labels.data();

    // Directed edges with the region on their right (row axis pointing down),
    // so outer rings have positive lattice area
    let mut edges: Vec<Vec<(Vertex, Vertex)>> = vec![Vec::new(); count];
    let label_at = |r: i64, c: i64| -> i32 {
        if r < 0 || c < 0 || r >= rows as i64 || c >= cols as i64 {
            0
        } else {
            data[(r as usize, c as usize)]
        }
    };

    for row in 0..rows {
        for col in 0..cols {
            let label = data[(row, col)];
            if label == 0 {
                continue;
            }
            let (r, c) = (row as i64, col as i64);
            let out = &mut edges[(label - 1) as usize];
            if label_at(r - 1, c) != label {
                out.push(((c, r), (c + 1, r)));
            }
            if label_at(r, c + 1) != label {
                out.push(((c + 1, r), (c + 1, r + 1)));
            }
            if label_at(r + 1, c) != label {
                out.push(((c + 1, r + 1), (c, r + 1)));
            }
            if label_at(r, c - 1) != label {
                out.push(((c, r + 1), (c, r)));
            }
        }
    }

    let transform = *mask.transform();
    Ok(edges
        .iter()
        .flat_map(|region| region_polygons(region, &transform))
        .collect())
}

/// Boundary geometry of a mask, or `None` when no cell is set.
///
/// A single region is returned as a Polygon; several are merged according
/// to `policy`.
pub fn extract_boundary(mask: &Raster<u8>, policy: MergePolicy) -> Result<Option<Geometry<f64>>> {
    let mut polygons = polygonize(mask)?;
    Ok(match polygons.len() {
        0 => None,
        1 => Some(Geometry::Polygon(polygons.remove(0))),
        _ => {
            let multi = Geometry::MultiPolygon(MultiPolygon(polygons));
            match policy {
                MergePolicy::KeepMultiPolygon => Some(multi),
                MergePolicy::ConvexHull => convex_hull(&multi).map(Geometry::Polygon),
            }
        }
    })
}

fn region_polygons(edges: &[(Vertex, Vertex)], transform: &GeoTransform) -> Vec<Polygon<f64>> {
    let mut outgoing: HashMap<Vertex, Vec<usize>> = HashMap::new();
    for (i, &(from, _)) in edges.iter().enumerate() {
        outgoing.entry(from).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut shells: Vec<Vec<Vertex>> = Vec::new();
    let mut holes: Vec<Vec<Vertex>> = Vec::new();

    for start in 0..edges.len() {
        if used[start] {
            continue;
        }
        let ring = trace_ring(start, edges, &outgoing, &mut used);
        if ring.len() < 4 {
            continue;
        }
        if signed_area(&ring) > 0.0 {
            shells.push(ring);
        } else {
            holes.push(ring);
        }
    }

    // A 4-connected region has a single outer ring
    shells.sort_by(|a, b| signed_area(b).total_cmp(&signed_area(a)));
    let mut shells = shells.into_iter();
    let Some(outer) = shells.next() else {
        return Vec::new();
    };

    let to_ground = |ring: &[Vertex]| -> LineString<f64> {
        ring.iter()
            .map(|&(c, r)| {
                let (x, y) = transform.apply(c as f64, r as f64);
                Coord { x, y }
            })
            .collect()
    };

    let mut polygons = vec![Polygon::new(
        to_ground(&outer),
        holes.iter().map(|h| to_ground(h)).collect(),
    )];
    polygons.extend(shells.map(|s| Polygon::new(to_ground(&s), Vec::new())));
    polygons
        .into_iter()
        .map(|p| p.orient(Direction::Default))
        .collect()
}

/// Follow edges from `start` until the ring closes.
///
/// Where two unused edges leave a vertex the sharpest left turn wins, so
/// the ring hugs the background and a region touching itself at a corner
/// yields a shell and a hole meeting at that point rather than one
/// self-touching ring. Collinear vertices are dropped; the returned ring
/// is closed.
fn trace_ring(
    start: usize,
    edges: &[(Vertex, Vertex)],
    outgoing: &HashMap<Vertex, Vec<usize>>,
    used: &mut [bool],
) -> Vec<Vertex> {
    let origin = edges[start].0;
    let mut ring = vec![origin];
    let mut current = start;

    loop {
        used[current] = true;
        let (from, to) = edges[current];
        if to == origin {
            break;
        }
        ring.push(to);

        let dir = (to.0 - from.0, to.1 - from.1);
        let next = outgoing
            .get(&to)
            .into_iter()
            .flatten()
            .copied()
            .filter(|&e| !used[e])
            .min_by_key(|&e| {
                let (a, b) = edges[e];
                let d = (b.0 - a.0, b.1 - a.1);
                dir.0 * d.1 - dir.1 * d.0
            });

        match next {
            Some(e) => current = e,
            None => break,
        }
    }

    let mut simplified = drop_collinear(&ring);
    if let Some(&first) = simplified.first() {
        simplified.push(first);
    }
    simplified
}

fn drop_collinear(ring: &[Vertex]) -> Vec<Vertex> {
    let n = ring.len();
    (0..n)
        .filter(|&i| {
            let p = ring[(i + n - 1) % n];
            let v = ring[i];
            let q = ring[(i + 1) % n];
            (v.0 - p.0) * (q.1 - v.1) - (v.1 - p.1) * (q.0 - v.0) != 0
        })
        .map(|i| ring[i])
        .collect()
}

/// Shoelace area in lattice units; positive for outer rings
fn signed_area(ring: &[Vertex]) -> f64 {
    let twice: i64 = ring
        .windows(2)
        .map(|w| w[0].0 * w[1].1 - w[1].0 * w[0].1)
        .sum();
    twice as f64 / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::Area;

    fn mask_from(rows: usize, cols: usize, cells: &[(usize, usize)]) -> Raster<u8> {
        let mut m: Raster<u8> = Raster::new(rows, cols);
        m.set_transform(GeoTransform::new(100.0, 200.0, 2.0, -2.0));
        for &(r, c) in cells {
            m.set(r, c, 1).unwrap();
        }
        m
    }

    #[test]
    fn test_single_cell_square() {
        let polys = polygonize(&mask_from(3, 3, &[(1, 1)])).unwrap();
        assert_eq!(polys.len(), 1);
        let p = &polys[0];
        assert_eq!(p.exterior().0.len(), 5);
        assert_relative_eq!(p.unsigned_area(), 4.0);
        assert!(p.signed_area() > 0.0, "outer ring counter-clockwise");
        let xs: Vec<f64> = p.exterior().coords().map(|c| c.x).collect();
        assert!(xs.contains(&102.0) && xs.contains(&104.0));
    }

    #[test]
    fn test_hole_preserved() {
        let mut cells = Vec::new();
        for r in 0..3 {
            for c in 0..3 {
                if (r, c) != (1, 1) {
                    cells.push((r, c));
                }
            }
        }
        let polys = polygonize(&mask_from(3, 3, &cells)).unwrap();
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].interiors().len(), 1);
        assert_relative_eq!(polys[0].unsigned_area(), 8.0 * 4.0);
    }

    #[test]
    fn test_diagonal_cells_are_separate_regions() {
        let mask = mask_from(2, 2, &[(0, 0), (1, 1)]);
        let polys = polygonize(&mask).unwrap();
        assert_eq!(polys.len(), 2);
        for p in &polys {
            assert_relative_eq!(p.unsigned_area(), 4.0);
        }
    }

    #[test]
    fn test_pinched_ring_splits_hole_from_shell() {
        // Region wraps around (1,1) and touches itself diagonally at the
        // corner shared by (0,1) and (1,0)
        let cells = [(0, 1), (0, 2), (1, 2), (2, 2), (2, 1), (2, 0), (1, 0)];
        let polys = polygonize(&mask_from(3, 3, &cells)).unwrap();
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].interiors().len(), 1);
        assert_relative_eq!(polys[0].unsigned_area(), 7.0 * 4.0);
    }

    #[test]
    fn test_l_shape_vertices() {
        let polys = polygonize(&mask_from(3, 3, &[(0, 0), (1, 0), (1, 1)])).unwrap();
        // six corners plus the closing vertex
        assert_eq!(polys[0].exterior().0.len(), 7);
        assert_relative_eq!(polys[0].unsigned_area(), 12.0);
    }

    #[test]
    fn test_extract_boundary_policies() {
        let mask = mask_from(5, 5, &[(0, 0), (4, 4)]);
        assert!(matches!(
            extract_boundary(&mask, MergePolicy::KeepMultiPolygon).unwrap(),
            Some(Geometry::MultiPolygon(mp)) if mp.0.len() == 2
        ));
        match extract_boundary(&mask, MergePolicy::ConvexHull).unwrap() {
            Some(Geometry::Polygon(hull)) => assert!(hull.unsigned_area() > 8.0),
            other => panic!("expected hull polygon, got {other:?}"),
        }
        assert!(extract_boundary(&mask_from(2, 2, &[]), MergePolicy::default())
            .unwrap()
            .is_none());
    }
}
