use ndarray::Array2;
use sapper_core::{
    BoardView, CellState, Coord, Coord2, PlayEngine, SessionState, ToNdIndex, grid_size,
    replay_cells,
};
use serde::{Deserialize, Serialize};

use crate::*;

/// Session header of a snapshot. Snake case, unlike the REST resources.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub mine_density: u32,
    #[serde(default)]
    pub create_time: u64,
    #[serde(default)]
    pub state: Option<SessionState>,
}

impl GameInfo {
    pub fn size(&self) -> Result<Coord2> {
        board_size(self.width, self.height)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedMove {
    pub x: Coord,
    pub y: Coord,
    pub state: CellState,
}

impl SimplifiedMove {
    pub const fn coords(&self) -> Coord2 {
        (self.x, self.y)
    }
}

/// Adjacent mine counts as rows of columns, `nearby_mine_count[y][x]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub nearby_mine_count: Vec<Vec<u8>>,
}

impl Hint {
    pub fn from_matrix(hints: &Array2<u8>) -> Self {
        let (width, height) = grid_size(hints);
        let nearby_mine_count = (0..height)
            .map(|y| (0..width).map(|x| hints[(x, y).to_nd_index()]).collect())
            .collect();
        Self { nearby_mine_count }
    }

    /// Transposes into the `[x, y]` layout, refusing any ragged or mis-sized matrix.
    pub fn to_matrix(&self, (width, height): Coord2) -> Result<Array2<u8>> {
        let rows = &self.nearby_mine_count;
        let well_formed = rows.len() == usize::from(height)
            && rows.iter().all(|row| row.len() == usize::from(width));
        if !well_formed {
            return Err(ProtocolError::HintShape { width, height });
        }

        Ok(Array2::from_shape_fn((width, height).to_nd_index(), |(x, y)| {
            rows[y][x]
        }))
    }
}

/// Authoritative rendering of a session: header, latest move per cell, hints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub info: GameInfo,
    /// Newest first, at most one per coordinate.
    pub moves: Vec<SimplifiedMove>,
    pub hint: Hint,
}

impl GameSnapshot {
    /// Snapshot of a locally played session, in the shape the store produces.
    pub fn from_engine(engine: &PlayEngine, create_time: u64) -> Self {
        let board = engine.board();
        let (width, height) = board.size();
        let recorded = engine.state();
        Self {
            info: GameInfo {
                id: engine.origin().game_id.clone(),
                width: width.into(),
                height: height.into(),
                mine_density: board.mine_density().into(),
                create_time,
                state: recorded.is_finished().then_some(recorded),
            },
            moves: engine
                .log()
                .latest_per_coordinate()
                .into_iter()
                .map(|mv| SimplifiedMove {
                    x: mv.x,
                    y: mv.y,
                    state: mv.state,
                })
                .collect(),
            hint: Hint::from_matrix(&board.hint_matrix()),
        }
    }

    /// Validates the snapshot and builds the complete view it describes.
    pub fn to_view(&self) -> Result<BoardView> {
        let size = self.info.size()?;
        let hints = self.hint.to_matrix(size)?;

        if let Some(mv) = self
            .moves
            .iter()
            .find(|mv| mv.x >= size.0 || mv.y >= size.1)
        {
            return Err(ProtocolError::MoveOutOfBounds { x: mv.x, y: mv.y });
        }

        // oldest first so the newest move of a coordinate wins
        let cells = replay_cells(
            size,
            self.moves.iter().rev().map(|mv| (mv.coords(), mv.state)),
        )?;
        let state = self.info.state.unwrap_or_default();

        Ok(BoardView::new(self.info.id.clone(), cells, hints, state)?)
    }
}

/// Body of `POST /api/rpc/visit/{id}`. No state means reveal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRequest {
    pub x: Coord,
    pub y: Coord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<CellState>,
}

impl VisitRequest {
    pub const fn reveal((x, y): Coord2) -> Self {
        Self { x, y, state: None }
    }

    pub const fn mark((x, y): Coord2, state: CellState) -> Self {
        Self {
            x,
            y,
            state: Some(state),
        }
    }
}
