//! Minesweeper game-state engine: board generation, flood-fill reveal, the move
//! log and the session state machine. No I/O happens in this crate.

#![no_std]

extern crate alloc;

use serde::{Deserialize, Serialize};

pub use board::*;
pub use cell::*;
pub use engine::*;
pub use error::*;
pub use moves::*;
pub use session::*;
pub use types::*;
pub use view::*;

mod board;
mod cell;
mod engine;
mod error;
mod moves;
mod session;
mod types;
mod view;

/// Board dimensions plus mine density, the inputs of mine placement.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub size: Coord2,
    /// Percentage of cells holding a mine, `0..=100`.
    pub mine_density: u8,
}

impl BoardConfig {
    pub const fn new_unchecked(size: Coord2, mine_density: u8) -> Self {
        Self { size, mine_density }
    }

    pub fn new(size: Coord2, mine_density: u8) -> Result<Self> {
        let config = Self::new_unchecked(size, mine_density);
        config.validate()?;
        Ok(config)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    /// `ceil(width * height * density / 100)`.
    pub const fn expected_mine_count(&self) -> CellCount {
        let cells = self.total_cells() as u32;
        let density = self.mine_density as u32;
        ((cells * density).div_ceil(100)) as CellCount
    }

    /// Refuses boards that could never be cleared, before any mine gets placed.
    pub fn validate(&self) -> Result<()> {
        if self.size.0 == 0 || self.size.1 == 0 {
            return Err(GameError::InvalidConfiguration(ConfigIssue::EmptyBoard));
        }

        if self.mine_density > 100 {
            return Err(GameError::InvalidConfiguration(
                ConfigIssue::DensityOutOfRange(self.mine_density),
            ));
        }

        let mines = self.expected_mine_count();
        let cells = self.total_cells();
        if mines >= cells {
            return Err(GameError::InvalidConfiguration(ConfigIssue::TooManyMines {
                mines: mines.into(),
                cells: cells.into(),
            }));
        }

        Ok(())
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::new_unchecked((10, 10), 25)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MarkOutcome {
    NoChange,
    Changed(CellState),
}

impl MarkOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Changed(_) => true,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    HitMine,
    Won,
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        use RevealOutcome::*;
        match self {
            NoChange => false,
            Revealed => true,
            HitMine => true,
            Won => true,
        }
    }
}
