use alloc::string::String;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// Player-visible state of a single cell, as recorded in moves.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellState {
    #[default]
    Unknown,
    Cleared,
    Flagged,
    Exploded,
}

impl CellState {
    /// Cleared and exploded cells never change again.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cleared | Self::Exploded)
    }

    pub const fn is_unrevealed(self) -> bool {
        matches!(self, Self::Unknown | Self::Flagged)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Cleared => "cleared",
            Self::Flagged => "flagged",
            Self::Exploded => "exploded",
        }
    }
}

impl fmt::Display for CellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown cell state {0:?}")]
pub struct UnknownCellState(pub String);

impl FromStr for CellState {
    type Err = UnknownCellState;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s {
            "unknown" => Ok(Self::Unknown),
            "cleared" => Ok(Self::Cleared),
            "flagged" => Ok(Self::Flagged),
            "exploded" => Ok(Self::Exploded),
            other => Err(UnknownCellState(other.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&CellState::Exploded).unwrap(),
            "\"exploded\""
        );
        let parsed: CellState = serde_json::from_str("\"flagged\"").unwrap();
        assert_eq!(parsed, CellState::Flagged);
    }

    #[test]
    fn rejects_unknown_strings() {
        assert!(serde_json::from_str::<CellState>("\"rigged\"").is_err());
        assert_eq!(
            "Cleared".parse::<CellState>(),
            Err(UnknownCellState("Cleared".into()))
        );
    }

    #[test]
    fn terminal_states() {
        assert!(CellState::Cleared.is_terminal());
        assert!(CellState::Exploded.is_terminal());
        assert!(!CellState::Flagged.is_terminal());
        assert!(!CellState::Unknown.is_terminal());
    }
}
