//! JSON wire types of the session store: the REST resources, the snapshot RPC
//! and the token endpoints, plus their validated conversion into core types.

use sapper_core::{Coord, Coord2, GameError};
use thiserror::Error;

pub use auth::*;
pub use rest::*;
pub use rpc::*;

mod auth;
mod rest;
mod rpc;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Board dimensions {width}x{height} are not supported")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Mine density {0} is not a percentage")]
    InvalidDensity(u32),
    #[error("Hint matrix has the wrong shape, expected {height} rows of {width}")]
    HintShape { width: Coord, height: Coord },
    #[error("Move at ({x}, {y}) lies outside the board")]
    MoveOutOfBounds { x: Coord, y: Coord },
    #[error("Session {0} carries no mine layout")]
    MissingMineLayout(String),
    #[error(transparent)]
    Game(#[from] GameError),
}

pub type Result<T> = core::result::Result<T, ProtocolError>;

pub(crate) fn board_size(width: u32, height: u32) -> Result<Coord2> {
    match (Coord::try_from(width), Coord::try_from(height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(ProtocolError::InvalidDimensions { width, height }),
    }
}

pub(crate) fn mine_density(density: u32) -> Result<u8> {
    u8::try_from(density)
        .ok()
        .filter(|&d| d <= 100)
        .ok_or(ProtocolError::InvalidDensity(density))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_size_bounds() {
        assert_eq!(board_size(16, 9), Ok((16, 9)));
        assert_eq!(
            board_size(0, 9),
            Err(ProtocolError::InvalidDimensions {
                width: 0,
                height: 9
            })
        );
        assert!(board_size(256, 2).is_err());
    }

    #[test]
    fn density_must_be_a_percentage() {
        assert_eq!(mine_density(25), Ok(25));
        assert_eq!(mine_density(101), Err(ProtocolError::InvalidDensity(101)));
        assert_eq!(mine_density(1000), Err(ProtocolError::InvalidDensity(1000)));
    }
}
