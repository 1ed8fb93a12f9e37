//! The two synchronization strategies behind one contract.

mod client_authoritative;
mod server_authoritative;

pub use client_authoritative::ClientAuthoritative;
pub use server_authoritative::ServerAuthoritative;

use async_trait::async_trait;
use core::sync::atomic::{AtomicBool, Ordering};
use sapper_core::{BoardConfig, BoardView, Coord2, SessionState};
use sapper_protocol::Session;

use crate::*;

/// What a reveal or flag did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Committed locally and remotely.
    Applied {
        state: SessionState,
        changed: Vec<Coord2>,
    },
    /// Nothing to do: the cell is no longer unknown or the game is over.
    Ignored,
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Keeps one session in step with the store.
///
/// At most one mutating call runs at a time; a call made while another is in
/// flight fails with [`SyncError::Busy`]. A failed call leaves the view as it was.
#[async_trait]
pub trait SyncAdapter: Send + Sync {
    /// Creates a new session on the store and loads it.
    async fn start(&self, config: BoardConfig) -> Result<BoardView>;

    /// Loads an existing session from the store.
    async fn resume(&self, session_id: &str) -> Result<BoardView>;

    async fn reveal(&self, coords: Coord2) -> Result<Outcome>;

    async fn toggle_flag(&self, coords: Coord2) -> Result<Outcome>;

    /// Last committed view, if a session is loaded.
    async fn view(&self) -> Option<BoardView>;

    fn is_suspended(&self) -> bool;
}

/// Input lock held while a mutating request is outstanding.
#[derive(Debug, Default)]
pub struct Suspension(AtomicBool);

impl Suspension {
    pub fn is_suspended(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn begin(&self) -> Result<SuspendGuard<'_>> {
        if self.0.swap(true, Ordering::AcqRel) {
            Err(SyncError::Busy)
        } else {
            Ok(SuspendGuard(&self.0))
        }
    }
}

/// Lifts the suspension when dropped.
#[derive(Debug)]
pub struct SuspendGuard<'a>(&'a AtomicBool);

impl Drop for SuspendGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Most recent session that is still being played.
pub async fn latest_active_session<T: Transport>(client: &ApiClient<T>) -> Result<Option<Session>> {
    let latest = client
        .list_sessions()
        .await?
        .into_iter()
        .filter(Session::is_active)
        .max_by_key(|session| session.create_time);
    if let Some(session) = &latest {
        log::debug!("Most recent active session is {}", session.id);
    }
    Ok(latest)
}
