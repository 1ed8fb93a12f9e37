use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Invalid board configuration: {0}")]
    InvalidConfiguration(ConfigIssue),
    #[error("Board shape does not match declared size")]
    InvalidBoardShape,
    #[error("Game already ended, no new moves are accepted")]
    AlreadyEnded,
}

/// Why a board configuration was refused.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConfigIssue {
    #[error("board must be at least 1x1")]
    EmptyBoard,
    #[error("mine density {0}% is above 100%")]
    DensityOutOfRange(u8),
    #[error("{mines} mines leave no safe cell on a board of {cells} cells")]
    TooManyMines { mines: u32, cells: u32 },
}

pub type Result<T> = core::result::Result<T, GameError>;
