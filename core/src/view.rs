use alloc::string::String;
use alloc::vec::Vec;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Everything a renderer needs to draw a session, whichever side computed it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardView {
    pub session_id: String,
    pub size: Coord2,
    pub cells: Array2<CellState>,
    /// Adjacent mine count per cell, indexed `[x, y]`.
    pub hints: Array2<u8>,
    pub state: SessionState,
    /// Only known when the layout was computed locally.
    pub mines: Option<Vec<Coord2>>,
}

impl BoardView {
    pub fn new(
        session_id: String,
        cells: Array2<CellState>,
        hints: Array2<u8>,
        state: SessionState,
    ) -> Result<Self> {
        if cells.dim() != hints.dim() {
            return Err(GameError::InvalidBoardShape);
        }

        Ok(Self {
            session_id,
            size: grid_size(&cells),
            cells,
            hints,
            state,
            mines: None,
        })
    }

    pub fn from_engine(engine: &PlayEngine) -> Self {
        let board = engine.board();
        Self {
            session_id: engine.origin().game_id.clone(),
            size: board.size(),
            cells: engine.cells().clone(),
            hints: board.hint_matrix(),
            state: engine.state(),
            mines: Some(board.mines().to_vec()),
        }
    }

    /// State of the cell at `coords`, `None` when it lies outside the board.
    pub fn cell_at(&self, coords: Coord2) -> Option<CellState> {
        self.cells.get(coords.to_nd_index()).copied()
    }

    /// The number to draw on a cleared cell, if any.
    pub fn label_at(&self, coords: Coord2) -> Option<u8> {
        match self.cell_at(coords)? {
            CellState::Cleared => self.hints.get(coords.to_nd_index()).copied(),
            _ => None,
        }
    }

    pub fn tally(&self) -> CellTally {
        CellTally::from_cells(self.cells.iter())
    }

    /// Cells whose state differs from `previous`, in row-major order.
    pub fn changed_since(&self, previous: &BoardView) -> Vec<Coord2> {
        let (width, height) = self.size;
        let mut changed = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let coords = (x, y);
                let before = previous.cell_at(coords).unwrap_or_default();
                if Some(before) != self.cell_at(coords) {
                    changed.push(coords);
                }
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn engine() -> PlayEngine {
        let config = BoardConfig::new_unchecked((3, 2), 10);
        let board = Board::from_mine_coords(config, &[(2, 1)]).unwrap();
        PlayEngine::new(
            board,
            MoveOrigin {
                game_id: "view".into(),
                user_id: 8,
            },
        )
    }

    #[test]
    fn from_engine_labels_cleared_cells_only() {
        let mut engine = engine();
        engine.reveal((1, 0)).unwrap();
        engine.toggle_flag((0, 1)).unwrap();

        let view = engine.view();

        assert_eq!(view.session_id, "view");
        assert_eq!(view.label_at((1, 0)), Some(1));
        assert_eq!(view.label_at((0, 1)), None);
        assert_eq!(view.cell_at((0, 1)), Some(CellState::Flagged));
        assert_eq!(view.mines.as_deref(), Some(&[(2, 1)][..]));
    }

    #[test]
    fn lookups_outside_the_board_are_none() {
        let mut engine = engine();
        engine.reveal((1, 0)).unwrap();
        let view = engine.view();

        assert_eq!(view.cell_at((3, 0)), None);
        assert_eq!(view.cell_at((0, 2)), None);
        assert_eq!(view.label_at((255, 255)), None);
    }

    #[test]
    fn changed_since_lists_differences() {
        let mut engine = engine();
        let before = engine.view();
        engine.reveal((1, 0)).unwrap();

        let after = engine.view();

        assert_eq!(after.changed_since(&before), vec![(1, 0)]);
        assert!(after.changed_since(&after).is_empty());
    }

    #[test]
    fn new_rejects_mismatched_hints() {
        let cells = Array2::default([3, 2]);
        let hints = Array2::default([2, 3]);
        assert_eq!(
            BoardView::new("x".into(), cells, hints, SessionState::Active),
            Err(GameError::InvalidBoardShape)
        );
    }
}
