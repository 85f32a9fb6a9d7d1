//! Vector side of boundary derivation
//!
//! - Polygonize: binary mask to ground-unit polygons, holes preserved
//! - Rasterize: geometry to cell mask, clipping and cropping
//! - Spatial: bounding boxes, centroids, convex hulls
//! - Measurements: area and perimeter

mod measurements;
mod polygonize;
mod rasterize;
mod spatial;

pub use measurements::{area, perimeter};
pub use polygonize::{extract_boundary, polygonize, MergePolicy};
pub use rasterize::{clip_to_geometry, crop_to_bounds, geometry_mask};
pub use spatial::{bounding_box, centroid, convex_hull, BoundingBox};
