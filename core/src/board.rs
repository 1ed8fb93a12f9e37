use alloc::vec::Vec;
use core::ops::Index;
use hashbrown::HashSet;
use ndarray::Array2;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

/// A board and its mine layout. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    config: BoardConfig,
    mine_mask: Array2<bool>,
    /// Row-major ordered, the form persisted in the session record.
    mines: Vec<Coord2>,
}

impl Board {
    /// Places `config.expected_mine_count()` distinct mines by uniform rejection sampling.
    pub fn generate<R: Rng>(config: BoardConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;

        let (width, height) = config.size;
        let wanted = usize::from(config.expected_mine_count());
        let mut picked: HashSet<Coord2> = HashSet::with_capacity(wanted);

        while picked.len() < wanted {
            let coords = (rng.random_range(0..width), rng.random_range(0..height));
            // duplicates are simply drawn again
            picked.insert(coords);
        }

        let board = Self::from_mine_set(config, picked);
        log::debug!(
            "Generated {}x{} board with {} mines",
            width,
            height,
            board.mine_count()
        );
        Ok(board)
    }

    pub fn generate_seeded(config: BoardConfig, seed: u64) -> Result<Self> {
        let mut rng = SmallRng::seed_from_u64(seed);
        Self::generate(config, &mut rng)
    }

    /// Rebuilds a board from a persisted mine layout.
    pub fn from_mine_coords(config: BoardConfig, mine_coords: &[Coord2]) -> Result<Self> {
        config.validate()?;

        let (width, height) = config.size;
        for &(x, y) in mine_coords {
            if x >= width || y >= height {
                return Err(GameError::InvalidCoords);
            }
        }

        let board = Self::from_mine_set(config, mine_coords.iter().copied());

        // double check mine count
        if board.mine_count() != config.expected_mine_count() {
            log::warn!(
                "Persisted mine layout count mismatch, actual: {}, expected: {}",
                board.mine_count(),
                config.expected_mine_count()
            );
        }
        Ok(board)
    }

    fn from_mine_set(config: BoardConfig, mine_coords: impl IntoIterator<Item = Coord2>) -> Self {
        let mut mine_mask: Array2<bool> = Array2::default(config.size.to_nd_index());
        for coords in mine_coords {
            mine_mask[coords.to_nd_index()] = true;
        }

        let mut mines: Vec<Coord2> = mine_mask
            .indexed_iter()
            .filter(|&(_, &is_mine)| is_mine)
            .map(|((x, y), _)| (x as Coord, y as Coord))
            .collect();
        mines.sort_unstable_by_key(|&coords| row_major_key(coords));

        Self {
            config,
            mine_mask,
            mines,
        }
    }

    pub fn config(&self) -> BoardConfig {
        self.config
    }

    pub fn size(&self) -> Coord2 {
        self.config.size
    }

    pub fn mine_density(&self) -> u8 {
        self.config.mine_density
    }

    pub fn total_cells(&self) -> CellCount {
        self.config.total_cells()
    }

    pub fn mine_count(&self) -> CellCount {
        self.mines.len() as CellCount
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count()
    }

    /// Mines in canonical row-major order.
    pub fn mines(&self) -> &[Coord2] {
        &self.mines
    }

    pub fn contains_mine(&self, coords: Coord2) -> bool {
        self[coords]
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size.0 && coords.1 < size.1 {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn adjacent_mine_count(&self, coords: Coord2) -> u8 {
        self.mine_mask
            .iter_neighbors(coords)
            .filter(|&pos| self[pos])
            .count() as u8
    }

    /// Adjacent mine count of every cell, indexed `[x, y]`. Mine cells hold 0.
    pub fn hint_matrix(&self) -> Array2<u8> {
        let mut hints = Array2::default(self.size().to_nd_index());
        for &mine in &self.mines {
            for pos in self.mine_mask.iter_neighbors(mine) {
                if !self[pos] {
                    hints[pos.to_nd_index()] += 1;
                }
            }
        }
        hints
    }

    pub(crate) fn iter_orthogonal(&self, coords: Coord2) -> NeighborIter {
        self.mine_mask.iter_orthogonal(coords)
    }
}

impl Index<Coord2> for Board {
    type Output = bool;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.mine_mask[coords.to_nd_index()]
    }
}
