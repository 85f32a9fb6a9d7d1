//! Connected-component labelling

use super::Connectivity;
use burnscar_core::raster::Raster;
use burnscar_core::Result;
use ndarray::Array2;
use std::collections::VecDeque;

/// Label the connected regions of non-zero mask cells.
///
/// Labels start at 1 in row-major order of each region's first cell;
/// background is 0. Returns the label raster and the number of regions.
pub fn label_components(
    mask: &Raster<u8>,
    connectivity: Connectivity,
) -> Result<(Raster<i32>, usize)> {
    let (rows, cols) = mask.shape();
    let neighborhood = connectivity.neighborhood();
    let data = mask.data();
    let mut labels = Array2::<i32>::zeros((rows, cols));
    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();
    let mut next: i32 = 0;

    for row in 0..rows {
        for col in 0..cols {
            if data[(row, col)] == 0 || labels[(row, col)] != 0 {
                continue;
            }
            next += 1;
            labels[(row, col)] = next;
            queue.push_back((row, col));

            while let Some((r, c)) = queue.pop_front() {
                for (nr, nc) in neighborhood.neighbors(r, c, rows, cols) {
                    if data[(nr, nc)] != 0 && labels[(nr, nc)] == 0 {
                        labels[(nr, nc)] = next;
                        queue.push_back((nr, nc));
                    }
                }
            }
        }
    }

    Ok((mask.with_data(labels)?, next as usize))
}
