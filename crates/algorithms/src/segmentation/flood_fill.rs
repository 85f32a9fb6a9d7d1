//! Seeded flood fill

use super::{Connectivity, SegmentationStrategy};
use burnscar_core::raster::Raster;
use burnscar_core::Result;
use geo_types::Point;
use ndarray::Array2;
use std::collections::VecDeque;

/// Grow a region from every seed that lands on a disturbed cell.
///
/// Each seed is snapped to the cell containing it. Seeds outside the grid
/// or on undisturbed cells contribute nothing. The output is the union of
/// the connected regions reached from the remaining seeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeededFloodFill {
    pub connectivity: Connectivity,
}

impl SeededFloodFill {
    pub fn new(connectivity: Connectivity) -> Self {
        Self { connectivity }
    }
}

impl SegmentationStrategy for SeededFloodFill {
    fn apply(&self, mask: &Raster<u8>, seeds: &[Point<f64>]) -> Result<Raster<u8>> {
        let (rows, cols) = mask.shape();
        let neighborhood = self.connectivity.neighborhood();
        let mut filled = Array2::<u8>::zeros((rows, cols));
        let mut queue: VecDeque<(usize, usize)> = VecDeque::new();

        for seed in seeds {
            let Some((row, col)) = mask.cell_at(seed.x(), seed.y()) else {
                continue;
            };
            if mask.data()[(row, col)] == 0 || filled[(row, col)] == 1 {
                continue;
            }

            filled[(row, col)] = 1;
            queue.push_back((row, col));

            while let Some((r, c)) = queue.pop_front() {
                for (nr, nc) in neighborhood.neighbors(r, c, rows, cols) {
                    if mask.data()[(nr, nc)] != 0 && filled[(nr, nc)] == 0 {
                        filled[(nr, nc)] = 1;
                        queue.push_back((nr, nc));
                    }
                }
            }
        }

        mask.with_data(filled)
    }
}
