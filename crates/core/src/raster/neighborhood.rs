//! Cell adjacency

/// Which cells count as adjacent to a given cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighborhood {
    /// Edge-sharing cells only (4 neighbours)
    Rook,
    /// Edge- and corner-sharing cells (8 neighbours)
    Queen,
}

const ROOK: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];

const QUEEN: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

impl Neighborhood {
    /// Relative `(dr, dc)` offsets, centre excluded
    pub fn offsets(&self) -> &'static [(isize, isize)] {
        match self {
            Neighborhood::Rook => &ROOK,
            Neighborhood::Queen => &QUEEN,
        }
    }

    /// In-bounds neighbours of `(row, col)` on a `rows x cols` grid
    pub fn neighbors(
        &self,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    ) -> impl Iterator<Item = (usize, usize)> {
        self.offsets().iter().filter_map(move |&(dr, dc)| {
            let r = row as isize + dr;
            let c = col as isize + dc;
            if r < 0 || c < 0 || r >= rows as isize || c >= cols as isize {
                None
            } else {
                Some((r as usize, c as usize))
            }
        })
    }
}
