//! # burnscar-core
//!
//! Core types and I/O shared by the burn-severity crates.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced 2-D grid
//! - `GeoTransform`: affine pixel ↔ ground mapping
//! - `CRS` and pure-Rust WGS84 ↔ UTM reprojection
//! - GeoJSON helpers for boundary and seed geometries
//! - Native single-band GeoTIFF reading and writing

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod vector;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
}
