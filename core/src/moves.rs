use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashSet;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use web_time::{SystemTime, UNIX_EPOCH};

use crate::*;

/// Who a move is recorded for.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOrigin {
    pub game_id: String,
    pub user_id: i64,
}

/// One durable record of a player action and the state it left the cell in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    /// Assigned by the store, absent until persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub game_id: String,
    pub user_id: i64,
    pub x: Coord,
    pub y: Coord,
    pub state: CellState,
    /// Seconds since the unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<u64>,
}

impl Move {
    pub fn new(origin: &MoveOrigin, (x, y): Coord2, state: CellState) -> Self {
        Self {
            id: None,
            game_id: origin.game_id.clone(),
            user_id: origin.user_id,
            x,
            y,
            state,
            create_time: Some(unix_now()),
        }
    }

    pub const fn coords(&self) -> Coord2 {
        (self.x, self.y)
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

/// Folds `(coords, state)` pairs into a cell-state grid, last write per cell wins.
pub fn replay_cells(
    size: Coord2,
    changes: impl IntoIterator<Item = (Coord2, CellState)>,
) -> Result<Array2<CellState>> {
    let mut cells: Array2<CellState> = Array2::default(size.to_nd_index());
    for ((x, y), state) in changes {
        if x >= size.0 || y >= size.1 {
            return Err(GameError::InvalidCoords);
        }
        cells[(x, y).to_nd_index()] = state;
    }
    Ok(cells)
}

/// Append-only, ordered record of moves for one session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveLog {
    moves: Vec<Move>,
}

impl MoveLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mv: Move) {
        self.moves.push(mv);
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Moves appended after the log held `checkpoint` entries.
    pub fn since(&self, checkpoint: usize) -> &[Move] {
        self.moves.get(checkpoint..).unwrap_or_default()
    }

    pub fn replay(&self, size: Coord2) -> Result<Array2<CellState>> {
        replay_cells(size, self.moves.iter().map(|mv| (mv.coords(), mv.state)))
    }

    /// Newest move of each coordinate, newest first.
    pub fn latest_per_coordinate(&self) -> Vec<&Move> {
        let mut seen = HashSet::new();
        self.moves
            .iter()
            .rev()
            .filter(|mv| seen.insert(mv.coords()))
            .collect()
    }
}

impl FromIterator<Move> for MoveLog {
    /// Moves carrying a store id are put back into id order first.
    fn from_iter<I: IntoIterator<Item = Move>>(iter: I) -> Self {
        let mut moves: Vec<Move> = iter.into_iter().collect();
        if moves.iter().all(|mv| mv.id.is_some()) {
            moves.sort_by_key(|mv| mv.id);
        }
        Self { moves }
    }
}

impl<'a> IntoIterator for &'a MoveLog {
    type Item = &'a Move;
    type IntoIter = core::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.iter()
    }
}
