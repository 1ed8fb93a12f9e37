use core::fmt;
use serde::{Deserialize, Serialize};

use crate::*;

/// Lifecycle of a game session. `Cleared` and `Exploded` are terminal.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Active,
    Cleared,
    Exploded,
}

impl SessionState {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Cleared | Self::Exploded)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cleared => "cleared",
            Self::Exploded => "exploded",
        }
    }

    /// Derives the session state from a tally of cell states.
    ///
    /// A flag does not have to sit on a mine: cleared plus flagged cells
    /// covering the whole board ends the game as well.
    pub fn evaluate(tally: CellTally, mine_count: CellCount) -> Self {
        if tally.exploded > 0 {
            return Self::Exploded;
        }

        let total = tally.total();
        let cleared = u32::from(tally.cleared);
        if cleared + u32::from(tally.flagged) == total
            || cleared + u32::from(mine_count) == total
        {
            Self::Cleared
        } else {
            Self::Active
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts of each cell state over a whole board.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellTally {
    pub unknown: CellCount,
    pub cleared: CellCount,
    pub flagged: CellCount,
    pub exploded: CellCount,
}

impl CellTally {
    pub fn from_cells<'a>(cells: impl IntoIterator<Item = &'a CellState>) -> Self {
        let mut tally = Self::default();
        for cell in cells {
            tally.add(*cell);
        }
        tally
    }

    pub fn add(&mut self, state: CellState) {
        *self.slot(state) += 1;
    }

    pub fn remove(&mut self, state: CellState) {
        let slot = self.slot(state);
        *slot = slot.saturating_sub(1);
    }

    pub fn total(&self) -> u32 {
        u32::from(self.unknown)
            + u32::from(self.cleared)
            + u32::from(self.flagged)
            + u32::from(self.exploded)
    }

    fn slot(&mut self, state: CellState) -> &mut CellCount {
        match state {
            CellState::Unknown => &mut self.unknown,
            CellState::Cleared => &mut self.cleared,
            CellState::Flagged => &mut self.flagged,
            CellState::Exploded => &mut self.exploded,
        }
    }
}

/// What the last evaluation did to the session.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    /// The session just reached a terminal state; reported exactly once.
    Concluded(SessionState),
}

/// One-way session state machine.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTracker {
    state: SessionState,
    /// Terminal state the store has not been told about yet.
    unpersisted: Option<SessionState>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracker for a resumed session.
    ///
    /// A terminal state already on record wins. A terminal state only implied
    /// by the moves is kept as unpersisted so it still gets written once.
    pub fn restored(evaluated: SessionState, recorded: Option<SessionState>) -> Self {
        match recorded {
            Some(recorded) if recorded.is_finished() => Self {
                state: recorded,
                unpersisted: None,
            },
            _ => Self {
                state: evaluated,
                unpersisted: evaluated.is_finished().then_some(evaluated),
            },
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn unpersisted(&self) -> Option<SessionState> {
        self.unpersisted
    }

    pub fn mark_persisted(&mut self) {
        self.unpersisted = None;
    }

    pub fn advance(&mut self, next: SessionState) -> Transition {
        if self.state.is_finished() || next == self.state {
            return Transition::Unchanged;
        }

        self.state = next;
        if next.is_finished() {
            log::debug!("Session concluded as {}", next);
            self.unpersisted = Some(next);
            Transition::Concluded(next)
        } else {
            Transition::Unchanged
        }
    }
}
