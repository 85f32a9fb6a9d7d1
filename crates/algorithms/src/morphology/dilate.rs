//! Binary dilation

use crate::maybe_rayon::*;
use burnscar_core::raster::Raster;
use burnscar_core::{Error, Result};
use ndarray::Array2;

use super::element::StructuringElement;

/// Dilate a {0, 1} mask `iterations` times.
///
/// A cell becomes 1 when any cell under the structuring element is 1.
/// Cells beyond the grid edge count as 0.
pub fn binary_dilate(
    mask: &Raster<u8>,
    element: &StructuringElement,
    iterations: usize,
) -> Result<Raster<u8>> {
    element.validate()?;

    let (rows, cols) = mask.shape();
    let offsets = element.offsets();
    let mut current = mask.data().mapv(|v| u8::from(v != 0));

    for _ in 0..iterations {
        let prev = &current;
        let data: Vec<u8> = (0..rows)
            .into_par_iter()
            .flat_map(|row| {
                let mut row_data = vec![0u8; cols];
                for (col, out) in row_data.iter_mut().enumerate() {
                    let hit = offsets.iter().any(|&(dr, dc)| {
                        let r = row as isize + dr;
                        let c = col as isize + dc;
                        r >= 0
                            && c >= 0
                            && r < rows as isize
                            && c < cols as isize
                            && prev[(r as usize, c as usize)] == 1
                    });
                    *out = u8::from(hit);
                }
                row_data
            })
            .collect();
        current =
            Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    }

    mask.with_data(current)
}
