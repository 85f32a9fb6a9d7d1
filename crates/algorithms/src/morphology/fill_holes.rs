//! Hole filling for binary masks

use burnscar_core::raster::{Neighborhood, Raster};
use burnscar_core::Result;
use ndarray::Array2;
use std::collections::VecDeque;

/// Set every background region that does not touch the grid edge to 1.
///
/// Background connectivity is 4-neighbour, so a diagonal gap in a ring
/// does not let the outside leak in.
pub fn fill_holes(mask: &Raster<u8>) -> Result<Raster<u8>> {
    let (rows, cols) = mask.shape();
    let data = mask.data();
    let mut outside = Array2::<bool>::from_elem((rows, cols), false);
    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();

    let seed = |r: usize, c: usize, outside: &mut Array2<bool>, queue: &mut VecDeque<(usize, usize)>| {
        if data[(r, c)] == 0 && !outside[(r, c)] {
            outside[(r, c)] = true;
            queue.push_back((r, c));
        }
    };
    for c in 0..cols {
        seed(0, c, &mut outside, &mut queue);
        seed(rows.saturating_sub(1), c, &mut outside, &mut queue);
    }
    for r in 0..rows {
        seed(r, 0, &mut outside, &mut queue);
        seed(r, cols.saturating_sub(1), &mut outside, &mut queue);
    }

    while let Some((r, c)) = queue.pop_front() {
        for (nr, nc) in Neighborhood::Rook.neighbors(r, c, rows, cols) {
            if data[(nr, nc)] == 0 && !outside[(nr, nc)] {
                outside[(nr, nc)] = true;
                queue.push_back((nr, nc));
            }
        }
    }

    mask.with_data(outside.mapv(|o| u8::from(!o)))
}
