use async_trait::async_trait;
use sapper_core::{Board, BoardConfig, BoardView, Coord2, MarkOutcome, MoveLog, PlayEngine};
use sapper_protocol::Session;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::*;

struct Loaded {
    session: Session,
    engine: PlayEngine,
}

/// Plays the game locally and pushes the session, every move and the final
/// state to the store.
///
/// Moves are played on a copy of the engine that replaces the live one only
/// after every move was pushed. A terminal state the store did not take is
/// kept locally and written again on the next call.
pub struct ClientAuthoritative<T: Transport> {
    client: Arc<ApiClient<T>>,
    seed: Option<u64>,
    loaded: Mutex<Option<Loaded>>,
    suspension: Suspension,
}

impl<T: Transport> ClientAuthoritative<T> {
    pub fn new(client: Arc<ApiClient<T>>) -> Self {
        Self {
            client,
            seed: None,
            loaded: Mutex::new(None),
            suspension: Suspension::default(),
        }
    }

    /// Force a seed instead of random
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Creates a session for an already generated layout.
    pub async fn start_with(&self, board: Board) -> Result<BoardView> {
        let _guard = self.suspension.begin()?;
        self.create(board).await
    }

    async fn create(&self, board: Board) -> Result<BoardView> {
        let request = Session::with_layout(&board);
        let mut session = self.client.create_session(&request).await?;
        if session.mine_coordinates.is_none() {
            session.mine_coordinates = request.mine_coordinates;
        }

        let engine = PlayEngine::new(board, session.origin());
        log::debug!(
            "Started session {} with {} mines",
            session.id,
            engine.board().mine_count()
        );
        Ok(self.commit(session, engine).await)
    }

    async fn commit(&self, session: Session, engine: PlayEngine) -> BoardView {
        let view = engine.view();
        *self.loaded.lock().await = Some(Loaded { session, engine });
        view
    }

    async fn checkout(&self) -> Result<(Session, PlayEngine)> {
        let loaded = self.loaded.lock().await;
        let loaded = loaded.as_ref().ok_or(SyncError::NoSession)?;
        Ok((loaded.session.clone(), loaded.engine.clone()))
    }

    async fn push_moves(&self, engine: &PlayEngine, checkpoint: usize) -> Result<()> {
        for mv in engine.log().since(checkpoint) {
            self.client.add_move(mv).await?;
        }
        Ok(())
    }

    /// Writes the terminal state the store has not recorded yet, if any.
    async fn conclude(&self, session: &mut Session, engine: &mut PlayEngine) -> Result<()> {
        let Some(state) = engine.session().unpersisted() else {
            return Ok(());
        };

        let mut update = session.clone();
        update.state = Some(state);
        self.client.update_session(&update).await?;
        *session = update;
        engine.mark_persisted();
        log::debug!("Session {} concluded as {}", session.id, state);
        Ok(())
    }

    async fn play<F>(&self, coords: Coord2, apply: F) -> Result<Outcome>
    where
        F: FnOnce(&mut PlayEngine, Coord2) -> sapper_core::Result<Vec<Coord2>> + Send,
    {
        let _guard = self.suspension.begin()?;
        let (mut session, mut engine) = self.checkout().await?;
        if engine.is_finished() {
            if engine.session().unpersisted().is_some() {
                self.conclude(&mut session, &mut engine).await?;
                self.commit(session, engine).await;
            }
            return Ok(Outcome::Ignored);
        }

        let checkpoint = engine.log().len();
        let changed = apply(&mut engine, coords)?;
        if changed.is_empty() {
            return Ok(Outcome::Ignored);
        }

        self.push_moves(&engine, checkpoint).await?;

        // every move is on the store now, so the engine is kept even if the
        // state write fails
        let state = engine.state();
        let concluded = self.conclude(&mut session, &mut engine).await;
        self.commit(session, engine).await;
        concluded?;
        Ok(Outcome::Applied { state, changed })
    }
}

#[async_trait]
impl<T: Transport> SyncAdapter for ClientAuthoritative<T> {
    async fn start(&self, config: BoardConfig) -> Result<BoardView> {
        let _guard = self.suspension.begin()?;
        let seed = self.seed.unwrap_or_else(rand::random);
        log::debug!("seed: {}", seed);
        let board = Board::generate_seeded(config, seed)?;
        self.create(board).await
    }

    async fn resume(&self, session_id: &str) -> Result<BoardView> {
        let _guard = self.suspension.begin()?;
        let mut session = self.client.get_session(session_id).await?;
        let log: MoveLog = self
            .client
            .list_moves(session_id)
            .await?
            .into_iter()
            .collect();

        let board = session.board()?;
        let mut engine = PlayEngine::restore(board, session.origin(), log, session.state)?;
        if let Some(state) = engine.session().unpersisted() {
            log::debug!("Session {} ended as {} without a record", session.id, state);
        }

        let concluded = self.conclude(&mut session, &mut engine).await;
        let view = self.commit(session, engine).await;
        concluded.map(|()| view)
    }

    async fn reveal(&self, coords: Coord2) -> Result<Outcome> {
        self.play(coords, |engine, coords| Ok(engine.reveal(coords)?.changed))
        .await
    }

    async fn toggle_flag(&self, coords: Coord2) -> Result<Outcome> {
        self.play(coords, |engine, coords| {
            let changed = match engine.toggle_flag(coords)?.outcome {
                MarkOutcome::Changed(_) => vec![coords],
                MarkOutcome::NoChange => Vec::new(),
            };
            Ok(changed)
        })
        .await
    }

    async fn view(&self) -> Option<BoardView> {
        self.loaded
            .lock()
            .await
            .as_ref()
            .map(|loaded| loaded.engine.view())
    }

    fn is_suspended(&self) -> bool {
        self.suspension.is_suspended()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sapper_core::{BoardConfig, CellState, SessionState};
    use serde_json::json;

    fn adapter(mock: &MockTransport) -> ClientAuthoritative<MockTransport> {
        let client = ApiClient::new(mock.clone(), &SyncConfig::default());
        ClientAuthoritative::new(Arc::new(client))
    }

    fn board(size: Coord2, mines: &[Coord2]) -> Board {
        Board::from_mine_coords(BoardConfig::new_unchecked(size, 0), mines).unwrap()
    }

    fn created(width: u8, height: u8) -> serde_json::Value {
        json!({
            "id": "g-1",
            "userId": 5,
            "width": width,
            "height": height,
            "mineDensity": 0,
            "state": null,
            "createTime": 100
        })
    }

    fn queue_move_acks(mock: &MockTransport, count: usize) {
        for id in 0..count {
            mock.queue_json(
                200,
                &json!({"id": id, "gameId": "g-1", "userId": 5, "x": 0, "y": 0, "state": "cleared", "createTime": 100}),
            );
        }
    }

    fn paths(mock: &MockTransport) -> Vec<String> {
        mock.requests().into_iter().map(|r| r.path).collect()
    }

    #[tokio::test]
    async fn start_posts_the_generated_layout() {
        let mock = MockTransport::new();
        let adapter = adapter(&mock).with_seed(Some(9));
        mock.queue_json(200, &created(10, 10));

        let view = adapter
            .start(BoardConfig::new_unchecked((10, 10), 25))
            .await
            .unwrap();

        assert_eq!(view.session_id, "g-1");
        assert_eq!(view.mines.as_ref().map(Vec::len), Some(25));
        let body = mock.last_request().unwrap().body;
        let coords = body.as_json().unwrap()["mineCoordinates"].as_array().unwrap().len();
        assert_eq!(coords, 25);
    }

    #[tokio::test]
    async fn start_rejects_unclearable_density_before_any_request() {
        let mock = MockTransport::new();
        let adapter = adapter(&mock);

        let result = adapter.start(BoardConfig::new_unchecked((10, 10), 100)).await;

        assert!(matches!(result, Err(SyncError::Game(_))));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn reveal_pushes_one_move_per_changed_cell() {
        let mock = MockTransport::new();
        let adapter = adapter(&mock);
        mock.queue_json(200, &created(4, 3));
        adapter.start_with(board((4, 3), &[(2, 2)])).await.unwrap();
        queue_move_acks(&mock, 1);
        adapter.toggle_flag((3, 0)).await.unwrap();

        queue_move_acks(&mock, 8);
        let outcome = adapter.reveal((0, 0)).await.unwrap();

        match outcome {
            Outcome::Applied { state, changed } => {
                assert_eq!(state, SessionState::Active);
                assert_eq!(changed.len(), 8);
            }
            Outcome::Ignored => panic!("reveal was ignored"),
        }
        let view = adapter.view().await.unwrap();
        assert_eq!(view.cell_at((0, 0)), Some(CellState::Cleared));
        assert_eq!(view.cell_at((3, 0)), Some(CellState::Flagged));
        let moves = paths(&mock).iter().filter(|p| *p == "/api/moves/").count();
        assert_eq!(moves, 9);
        assert!(!paths(&mock).iter().any(|p| p.starts_with("/api/games/g-1")));
    }

    #[tokio::test]
    async fn failed_push_leaves_the_view_unchanged() {
        let mock = MockTransport::new();
        let adapter = adapter(&mock);
        mock.queue_json(200, &created(3, 1));
        adapter.start_with(board((3, 1), &[(2, 0)])).await.unwrap();
        let before = adapter.view().await.unwrap();

        queue_move_acks(&mock, 1);
        mock.queue_json(500, &json!({"error": "boom"}));
        let result = adapter.reveal((0, 0)).await;

        assert!(matches!(result, Err(SyncError::Status { status: 500, .. })));
        assert_eq!(adapter.view().await.unwrap(), before);
        assert!(!adapter.is_suspended());

        // the retry replays from the committed state and concludes the game
        queue_move_acks(&mock, 2);
        mock.queue_json(200, &created(3, 1));
        let outcome = adapter.reveal((0, 0)).await.unwrap();

        assert_eq!(
            outcome,
            Outcome::Applied {
                state: SessionState::Cleared,
                changed: vec![(0, 0), (1, 0)],
            }
        );
        assert_eq!(mock.pending_responses(), 0);
    }

    #[tokio::test]
    async fn conclusion_is_written_exactly_once() {
        let mock = MockTransport::new();
        let adapter = adapter(&mock);
        mock.queue_json(200, &created(3, 3));
        adapter.start_with(board((3, 3), &[(1, 1)])).await.unwrap();

        queue_move_acks(&mock, 1);
        mock.queue_json(200, &created(3, 3));
        let outcome = adapter.reveal((1, 1)).await.unwrap();

        assert_eq!(
            outcome,
            Outcome::Applied {
                state: SessionState::Exploded,
                changed: vec![(1, 1)],
            }
        );
        let puts: Vec<_> = mock
            .requests()
            .into_iter()
            .filter(|r| r.method == Method::Put)
            .collect();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].path, "/api/games/g-1");
        assert_eq!(puts[0].body.as_json().unwrap()["state"], "exploded");

        let sent = mock.requests().len();
        assert_eq!(adapter.reveal((0, 0)).await.unwrap(), Outcome::Ignored);
        assert_eq!(adapter.toggle_flag((0, 0)).await.unwrap(), Outcome::Ignored);
        assert_eq!(mock.requests().len(), sent);
    }

    #[tokio::test]
    async fn refused_conclusion_is_kept_and_written_on_the_next_call() {
        let mock = MockTransport::new();
        let adapter = adapter(&mock);
        mock.queue_json(200, &created(3, 3));
        adapter.start_with(board((3, 3), &[(1, 1)])).await.unwrap();

        queue_move_acks(&mock, 1);
        mock.queue_json(500, &json!({"error": "boom"}));
        let result = adapter.reveal((1, 1)).await;

        assert!(matches!(result, Err(SyncError::Status { status: 500, .. })));
        let view = adapter.view().await.unwrap();
        assert_eq!(view.state, SessionState::Exploded);
        assert_eq!(view.cell_at((1, 1)), Some(CellState::Exploded));

        let sent = mock.requests().len();
        mock.queue_json(200, &created(3, 3));
        assert_eq!(adapter.toggle_flag((0, 0)).await.unwrap(), Outcome::Ignored);

        let requests = mock.requests();
        let retried = &requests[sent..];
        assert_eq!(retried.len(), 1);
        assert_eq!(retried[0].method, Method::Put);
        assert_eq!(retried[0].path, "/api/games/g-1");
        assert_eq!(retried[0].body.as_json().unwrap()["state"], "exploded");

        let sent = mock.requests().len();
        assert_eq!(adapter.reveal((0, 0)).await.unwrap(), Outcome::Ignored);
        assert_eq!(mock.requests().len(), sent);
        let moves = paths(&mock).iter().filter(|p| *p == "/api/moves/").count();
        assert_eq!(moves, 1);
        assert_eq!(
            adapter.view().await.unwrap().cell_at((0, 0)),
            Some(CellState::Unknown)
        );
    }

    #[tokio::test]
    async fn no_op_moves_send_nothing() {
        let mock = MockTransport::new();
        let adapter = adapter(&mock);
        mock.queue_json(200, &created(3, 1));
        adapter.start_with(board((3, 1), &[(2, 0)])).await.unwrap();
        queue_move_acks(&mock, 1);
        adapter.reveal((1, 0)).await.unwrap();
        let sent = mock.requests().len();

        assert_eq!(adapter.reveal((1, 0)).await.unwrap(), Outcome::Ignored);
        assert_eq!(adapter.toggle_flag((1, 0)).await.unwrap(), Outcome::Ignored);
        assert_eq!(mock.requests().len(), sent);
    }

    #[tokio::test]
    async fn moves_need_a_session() {
        let mock = MockTransport::new();
        let adapter = adapter(&mock);

        assert!(matches!(adapter.reveal((0, 0)).await, Err(SyncError::NoSession)));
        assert_eq!(adapter.view().await, None);
    }

    #[tokio::test]
    async fn resume_replays_the_store_and_records_a_missed_conclusion() {
        let mock = MockTransport::new();
        let adapter = adapter(&mock);
        mock.queue_json(
            200,
            &json!({
                "id": "g-2", "userId": 5, "width": 3, "height": 1, "mineDensity": 10,
                "mineCoordinates": [{"x": 2, "y": 0}], "state": null, "createTime": 100
            }),
        );
        mock.queue_json(
            200,
            &json!([
                {"id": 3, "gameId": "g-2", "userId": 5, "x": 2, "y": 0, "state": "exploded", "createTime": 102},
                {"id": 1, "gameId": "g-2", "userId": 5, "x": 0, "y": 0, "state": "flagged", "createTime": 101}
            ]),
        );
        mock.queue_json(200, &json!({"id": "g-2", "userId": 5, "width": 3, "height": 1, "mineDensity": 10}));

        let view = adapter.resume("g-2").await.unwrap();

        assert_eq!(view.state, SessionState::Exploded);
        assert_eq!(view.cell_at((0, 0)), Some(CellState::Flagged));
        assert_eq!(view.cell_at((2, 0)), Some(CellState::Exploded));
        let last = mock.last_request().unwrap();
        assert_eq!(last.method, Method::Put);
        assert_eq!(last.body.as_json().unwrap()["state"], "exploded");
        assert_eq!(last.body.as_json().unwrap()["mineCoordinates"][0]["x"], 2);
    }

    #[tokio::test]
    async fn resume_of_a_recorded_game_writes_nothing() {
        let mock = MockTransport::new();
        let adapter = adapter(&mock);
        mock.queue_json(
            200,
            &json!({
                "id": "g-3", "userId": 5, "width": 3, "height": 1, "mineDensity": 10,
                "mineCoordinates": [{"x": 2, "y": 0}], "state": "exploded", "createTime": 100
            }),
        );
        mock.queue_json(
            200,
            &json!([{"id": 1, "gameId": "g-3", "userId": 5, "x": 2, "y": 0, "state": "exploded"}]),
        );

        let view = adapter.resume("g-3").await.unwrap();

        assert_eq!(view.state, SessionState::Exploded);
        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn second_call_while_in_flight_is_busy() {
        let mock = MockTransport::new();
        let adapter = adapter(&mock);
        mock.queue_json(200, &created(3, 3));
        adapter.start_with(board((3, 3), &[(2, 2)])).await.unwrap();

        let gate = mock.hold_next();
        queue_move_acks(&mock, 1);
        let first = adapter.toggle_flag((0, 0));
        let second = async {
            tokio::task::yield_now().await;
            assert!(adapter.is_suspended());
            let result = adapter.reveal((1, 1)).await;
            gate.send(()).ok();
            result
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.unwrap().is_applied());
        assert!(matches!(second, Err(SyncError::Busy)));
        assert!(!adapter.is_suspended());
        let view = adapter.view().await.unwrap();
        assert_eq!(view.cell_at((1, 1)), Some(CellState::Unknown));
    }
}
