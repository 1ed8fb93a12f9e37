use ndarray::Array2;

/// Single coordinate axis used for board width, height, and positions.
pub type Coord = u8;

/// Count type used for mine counts and total-cell counts.
pub type CellCount = u16;

/// Two-dimensional coordinates `(x, y)`.
pub type Coord2 = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

/// Size of a grid, in the `(x, y)` order the rest of the crate uses.
pub fn grid_size<T>(grid: &Array2<T>) -> Coord2 {
    let (x, y) = grid.dim();
    (
        x.try_into().unwrap_or(Coord::MAX),
        y.try_into().unwrap_or(Coord::MAX),
    )
}

/// Row-major ordering key: sort by `y`, then by `x`.
pub const fn row_major_key((x, y): Coord2) -> (Coord, Coord) {
    (y, x)
}

pub trait NeighborIterExt {
    fn iter_neighbors(&self, index: Coord2) -> NeighborIter;
    fn iter_orthogonal(&self, index: Coord2) -> NeighborIter;
}

impl<T> NeighborIterExt for Array2<T> {
    fn iter_neighbors(&self, index: Coord2) -> NeighborIter {
        NeighborIter::surrounding(index, grid_size(self))
    }

    fn iter_orthogonal(&self, index: Coord2) -> NeighborIter {
        NeighborIter::orthogonal(index, grid_size(self))
    }
}

const DISPLACEMENTS: [(i8, i8); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

// left, right, up, down
const ORTHOGONAL: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Applies `delta` to `coords`, returning a value only when it remains in bounds.
fn apply_delta(coords: Coord2, delta: (i8, i8), bounds: Coord2) -> Option<Coord2> {
    let (x, y) = coords;
    let (dx, dy) = delta;
    let (max_x, max_y) = bounds;

    let next_x = x.checked_add_signed(dx)?;
    if next_x >= max_x {
        return None;
    }

    let next_y = y.checked_add_signed(dy)?;
    if next_y >= max_y {
        return None;
    }

    Some((next_x, next_y))
}

#[derive(Debug)]
pub struct NeighborIter {
    center: Coord2,
    bounds: Coord2,
    displacements: &'static [(i8, i8)],
    index: usize,
}

impl NeighborIter {
    fn new(center: Coord2, bounds: Coord2, displacements: &'static [(i8, i8)]) -> Self {
        Self {
            center,
            bounds,
            displacements,
            index: 0,
        }
    }

    /// The up-to-8 cells of the 3x3 block around `center`, clipped to `bounds`.
    pub fn surrounding(center: Coord2, bounds: Coord2) -> Self {
        Self::new(center, bounds, &DISPLACEMENTS)
    }

    /// The up-to-4 cells sharing an edge with `center`, clipped to `bounds`.
    pub fn orthogonal(center: Coord2, bounds: Coord2) -> Self {
        Self::new(center, bounds, &ORTHOGONAL)
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let &delta = self.displacements.get(self.index)?;
            self.index += 1;

            if let Some(next_item) = apply_delta(self.center, delta, self.bounds) {
                return Some(next_item);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    #[test]
    fn corner_neighbors_are_clipped() {
        let neighbors: Vec<_> = NeighborIter::surrounding((0, 0), (3, 3)).collect();
        assert_eq!(neighbors, vec![(1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn far_corner_never_wraps() {
        let neighbors: Vec<_> = NeighborIter::surrounding((2, 2), (3, 3)).collect();
        assert_eq!(neighbors, vec![(1, 1), (2, 1), (1, 2)]);
    }

    #[test]
    fn center_has_eight_neighbors() {
        assert_eq!(NeighborIter::surrounding((1, 1), (3, 3)).count(), 8);
    }

    #[test]
    fn orthogonal_neighbors_skip_diagonals() {
        let neighbors: Vec<_> = NeighborIter::orthogonal((1, 1), (3, 3)).collect();
        assert_eq!(neighbors, vec![(0, 1), (2, 1), (1, 0), (1, 2)]);

        let edge: Vec<_> = NeighborIter::orthogonal((0, 2), (3, 3)).collect();
        assert_eq!(edge, vec![(1, 2), (0, 1)]);
    }

    #[test]
    fn single_cell_board_has_no_neighbors() {
        assert_eq!(NeighborIter::surrounding((0, 0), (1, 1)).count(), 0);
    }
}
