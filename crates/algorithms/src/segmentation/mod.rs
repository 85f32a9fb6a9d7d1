//! Region growing on binary masks
//!
//! - **SeededFloodFill**: keep only the regions that contain a seed point
//! - **label_components**: number every connected region

mod components;
mod flood_fill;

pub use components::label_components;
pub use flood_fill::SeededFloodFill;

use burnscar_core::raster::{Neighborhood, Raster};
use burnscar_core::Result;
use geo_types::Point;

/// Cell adjacency used when growing regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// Edge neighbours only
    #[default]
    Four,
    /// Edge and corner neighbours
    Eight,
}

impl Connectivity {
    pub fn neighborhood(&self) -> Neighborhood {
        match self {
            Connectivity::Four => Neighborhood::Rook,
            Connectivity::Eight => Neighborhood::Queen,
        }
    }
}

/// Restricts a disturbance mask using seed points in the mask's CRS
pub trait SegmentationStrategy {
    fn apply(&self, mask: &Raster<u8>, seeds: &[Point<f64>]) -> Result<Raster<u8>>;
}
