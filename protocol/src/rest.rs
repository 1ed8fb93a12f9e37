use sapper_core::{Board, BoardConfig, Coord, Coord2, MoveOrigin, SessionState};
use serde::{Deserialize, Serialize};

use crate::*;

/// The move record of `/api/moves/` is the core move, camelCase on the wire.
pub use sapper_core::Move;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: Coord,
    pub y: Coord,
}

impl From<Coord2> for Coordinate {
    fn from((x, y): Coord2) -> Self {
        Self { x, y }
    }
}

impl From<Coordinate> for Coord2 {
    fn from(c: Coordinate) -> Self {
        (c.x, c.y)
    }
}

/// Session resource of `/api/games/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Assigned by the store.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: i64,
    pub width: u32,
    pub height: u32,
    pub mine_density: u32,
    /// Only sent when the layout is computed on this side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mine_coordinates: Option<Vec<Coordinate>>,
    /// `None` while the game is running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<SessionState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<u64>,
}

impl Session {
    /// Creation request without a mine layout; the store fills in id and owner.
    pub fn draft(config: BoardConfig) -> Self {
        let (width, height) = config.size;
        Self {
            id: String::new(),
            user_id: -1,
            width: width.into(),
            height: height.into(),
            mine_density: config.mine_density.into(),
            mine_coordinates: None,
            state: None,
            create_time: None,
        }
    }

    /// Creation request carrying a locally generated layout, in row-major order.
    pub fn with_layout(board: &Board) -> Self {
        Self {
            mine_coordinates: Some(board.mines().iter().copied().map(Coordinate::from).collect()),
            ..Self::draft(board.config())
        }
    }

    pub fn size(&self) -> Result<Coord2> {
        board_size(self.width, self.height)
    }

    pub fn config(&self) -> Result<BoardConfig> {
        let size = self.size()?;
        let density = mine_density(self.mine_density)?;
        Ok(BoardConfig::new(size, density)?)
    }

    /// Rebuilds the board from the persisted layout.
    pub fn board(&self) -> Result<Board> {
        let config = self.config()?;
        let Some(coords) = &self.mine_coordinates else {
            return Err(ProtocolError::MissingMineLayout(self.id.clone()));
        };
        let coords: Vec<Coord2> = coords.iter().copied().map(Coord2::from).collect();
        Ok(Board::from_mine_coords(config, &coords)?)
    }

    pub fn origin(&self) -> MoveOrigin {
        MoveOrigin {
            game_id: self.id.clone(),
            user_id: self.user_id,
        }
    }

    pub fn recorded_state(&self) -> SessionState {
        self.state.unwrap_or_default()
    }

    pub fn is_active(&self) -> bool {
        !self.recorded_state().is_finished()
    }
}

/// JSON body of a non-2xx answer. A 401 comes with an empty body instead.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// Terminal state named by a `game_concluded/<state>` conflict.
    pub fn concluded_state(&self) -> Option<SessionState> {
        let state = self.error.as_deref()?.strip_prefix("game_concluded/")?;
        serde_json::from_value(serde_json::Value::String(state.to_owned())).ok()
    }
}
