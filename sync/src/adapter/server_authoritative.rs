use async_trait::async_trait;
use sapper_core::{BoardConfig, BoardView, CellState, Coord2, GameError};
use sapper_protocol::{GameSnapshot, Session, VisitRequest};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Intent {
    Reveal,
    ToggleFlag,
}

impl Intent {
    /// The visit to send for a cell currently in `cell`, if any.
    fn request(self, coords: Coord2, cell: CellState) -> Option<VisitRequest> {
        use CellState::*;
        match (self, cell) {
            (Intent::Reveal, Unknown) => Some(VisitRequest::reveal(coords)),
            (Intent::ToggleFlag, Unknown) => Some(VisitRequest::mark(coords, Flagged)),
            (Intent::ToggleFlag, Flagged) => Some(VisitRequest::mark(coords, Unknown)),
            _ => None,
        }
    }
}

/// Renders whatever the store computes. Every snapshot replaces the view
/// wholesale; nothing is merged.
pub struct ServerAuthoritative<T: Transport> {
    client: Arc<ApiClient<T>>,
    view: Mutex<Option<BoardView>>,
    suspension: Suspension,
}

impl<T: Transport> ServerAuthoritative<T> {
    pub fn new(client: Arc<ApiClient<T>>) -> Self {
        Self {
            client,
            view: Mutex::new(None),
            suspension: Suspension::default(),
        }
    }

    /// Validates a snapshot and only then swaps it in.
    async fn adopt(&self, snapshot: GameSnapshot) -> Result<BoardView> {
        let view = snapshot.to_view()?;
        log::debug!(
            "Adopted snapshot of {} with {} moves, state {}",
            view.session_id,
            snapshot.moves.len(),
            view.state
        );
        *self.view.lock().await = Some(view.clone());
        Ok(view)
    }

    async fn visit(&self, coords: Coord2, intent: Intent) -> Result<Outcome> {
        let _guard = self.suspension.begin()?;
        let before = self
            .view
            .lock()
            .await
            .clone()
            .ok_or(SyncError::NoSession)?;
        let Some(cell) = before.cell_at(coords) else {
            return Err(GameError::InvalidCoords.into());
        };
        if before.state.is_finished() {
            return Ok(Outcome::Ignored);
        }
        let Some(request) = intent.request(coords, cell) else {
            return Ok(Outcome::Ignored);
        };

        let snapshot = match self.client.visit(&before.session_id, request).await {
            Ok(snapshot) => snapshot,
            Err(SyncError::Conflict(state)) => {
                log::debug!(
                    "Session {} already concluded ({:?}), fetching its snapshot",
                    before.session_id,
                    state
                );
                let snapshot = self.client.snapshot(&before.session_id).await?;
                self.adopt(snapshot).await?;
                return Ok(Outcome::Ignored);
            }
            Err(e) => return Err(e),
        };
        let after = self.adopt(snapshot).await?;

        Ok(Outcome::Applied {
            state: after.state,
            changed: after.changed_since(&before),
        })
    }
}

#[async_trait]
impl<T: Transport> SyncAdapter for ServerAuthoritative<T> {
    async fn start(&self, config: BoardConfig) -> Result<BoardView> {
        let _guard = self.suspension.begin()?;
        config.validate()?;
        let session = self.client.create_session(&Session::draft(config)).await?;
        log::debug!("Started session {}", session.id);
        let snapshot = self.client.snapshot(&session.id).await?;
        self.adopt(snapshot).await
    }

    async fn resume(&self, session_id: &str) -> Result<BoardView> {
        let _guard = self.suspension.begin()?;
        let snapshot = self.client.snapshot(session_id).await?;
        self.adopt(snapshot).await
    }

    async fn reveal(&self, coords: Coord2) -> Result<Outcome> {
        self.visit(coords, Intent::Reveal).await
    }

    async fn toggle_flag(&self, coords: Coord2) -> Result<Outcome> {
        self.visit(coords, Intent::ToggleFlag).await
    }

    async fn view(&self) -> Option<BoardView> {
        self.view.lock().await.clone()
    }

    fn is_suspended(&self) -> bool {
        self.suspension.is_suspended()
    }
}
