use alloc::vec;
use alloc::vec::Vec;
use core::num::Saturating;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Cells changed by a reveal, in traversal order, plus what it did to the game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealResult {
    pub changed: Vec<Coord2>,
    pub outcome: RevealOutcome,
    pub transition: Transition,
}

impl RevealResult {
    fn unchanged() -> Self {
        Self {
            changed: Vec::new(),
            outcome: RevealOutcome::NoChange,
            transition: Transition::Unchanged,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MarkResult {
    pub outcome: MarkOutcome,
    pub transition: Transition,
}

/// Session-scoped game state: the board, every cell's state, the move log and
/// the session state machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayEngine {
    board: Board,
    origin: MoveOrigin,
    cells: Array2<CellState>,
    tally: CellTally,
    log: MoveLog,
    session: SessionTracker,
}

impl PlayEngine {
    pub fn new(board: Board, origin: MoveOrigin) -> Self {
        let cells = Array2::default(board.size().to_nd_index());
        let tally = CellTally {
            unknown: board.total_cells(),
            ..Default::default()
        };
        Self {
            board,
            origin,
            cells,
            tally,
            log: MoveLog::new(),
            session: SessionTracker::new(),
        }
    }

    /// Rebuilds a session from its persisted moves.
    pub fn restore(
        board: Board,
        origin: MoveOrigin,
        log: MoveLog,
        recorded: Option<SessionState>,
    ) -> Result<Self> {
        let cells = log.replay(board.size())?;
        let tally = CellTally::from_cells(cells.iter());
        let evaluated = SessionState::evaluate(tally, board.mine_count());
        log::debug!(
            "Restored session {} from {} moves, state {}",
            origin.game_id,
            log.len(),
            evaluated
        );

        Ok(Self {
            board,
            origin,
            cells,
            tally,
            log,
            session: SessionTracker::restored(evaluated, recorded),
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn origin(&self) -> &MoveOrigin {
        &self.origin
    }

    pub fn size(&self) -> Coord2 {
        self.board.size()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn is_finished(&self) -> bool {
        self.session.is_finished()
    }

    pub fn session(&self) -> &SessionTracker {
        &self.session
    }

    pub fn mark_persisted(&mut self) {
        self.session.mark_persisted();
    }

    pub fn log(&self) -> &MoveLog {
        &self.log
    }

    pub fn tally(&self) -> CellTally {
        self.tally
    }

    pub fn cells(&self) -> &Array2<CellState> {
        &self.cells
    }

    pub fn cell_at(&self, coords: Coord2) -> CellState {
        self.cells[coords.to_nd_index()]
    }

    pub fn mines_left(&self) -> isize {
        let flagged = Saturating(self.tally.flagged as isize);
        (Saturating(self.board.mine_count() as isize) - flagged).0
    }

    pub fn view(&self) -> BoardView {
        BoardView::from_engine(self)
    }

    /// Reveals `coords`, cascading through zero-adjacency cells.
    ///
    /// Cleared and flagged cells are left alone and produce an empty result.
    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealResult> {
        let coords = self.board.validate_coords(coords)?;
        if self.cell_at(coords) != CellState::Unknown {
            return Ok(RevealResult::unchanged());
        }
        self.check_not_finished()?;

        if self.board.contains_mine(coords) {
            self.set_cell(coords, CellState::Exploded);
            let transition = self.evaluate();
            return Ok(RevealResult {
                changed: vec![coords],
                outcome: RevealOutcome::HitMine,
                transition,
            });
        }

        let changed = self.flood_fill(coords);
        let transition = self.evaluate();
        let outcome = match self.state() {
            SessionState::Cleared => RevealOutcome::Won,
            _ => RevealOutcome::Revealed,
        };

        Ok(RevealResult {
            changed,
            outcome,
            transition,
        })
    }

    /// Toggles `Unknown` and `Flagged`. Cleared or exploded cells are not touched.
    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkResult> {
        let coords = self.board.validate_coords(coords)?;
        let next = match self.cell_at(coords) {
            CellState::Unknown => CellState::Flagged,
            CellState::Flagged => CellState::Unknown,
            CellState::Cleared | CellState::Exploded => {
                return Ok(MarkResult {
                    outcome: MarkOutcome::NoChange,
                    transition: Transition::Unchanged,
                });
            }
        };
        self.check_not_finished()?;

        self.set_cell(coords, next);
        Ok(MarkResult {
            outcome: MarkOutcome::Changed(next),
            transition: self.evaluate(),
        })
    }

    /// Iterative 4-directional cascade; only zero-adjacency cells expand further.
    fn flood_fill(&mut self, start: Coord2) -> Vec<Coord2> {
        let mut changed = Vec::new();
        let mut visited: Array2<bool> = Array2::default(self.size().to_nd_index());
        let mut frontier = vec![start];
        visited[start.to_nd_index()] = true;

        while let Some(pos) = frontier.pop() {
            if self.cell_at(pos) != CellState::Unknown || self.board.contains_mine(pos) {
                continue;
            }

            self.set_cell(pos, CellState::Cleared);
            changed.push(pos);

            if self.board.adjacent_mine_count(pos) == 0 {
                for next in self.board.iter_orthogonal(pos) {
                    if !visited[next.to_nd_index()] {
                        visited[next.to_nd_index()] = true;
                        frontier.push(next);
                    }
                }
            }
        }

        changed
    }

    fn set_cell(&mut self, coords: Coord2, state: CellState) {
        let cell = &mut self.cells[coords.to_nd_index()];
        self.tally.remove(*cell);
        self.tally.add(state);
        *cell = state;
        self.log.push(Move::new(&self.origin, coords, state));
    }

    fn evaluate(&mut self) -> Transition {
        let next = SessionState::evaluate(self.tally, self.board.mine_count());
        self.session.advance(next)
    }

    fn check_not_finished(&self) -> Result<()> {
        if self.session.is_finished() {
            Err(GameError::AlreadyEnded)
        } else {
            Ok(())
        }
    }
}
