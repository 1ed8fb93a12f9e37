use sapper_core::{GameError, SessionState};
use sapper_protocol::ProtocolError;
use thiserror::Error;

use crate::TransportError;

/// Failures of a synchronized operation. None of them leave local state half applied.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The request never got an answer.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Non-2xx answer other than a conflict or an expired session.
    #[error("store answered {status}: {body}")]
    Status { status: u16, body: String },

    /// The store refused the visit because the session is over.
    #[error("session already concluded")]
    Conflict(Option<SessionState>),

    /// Refreshing did not help; the stored tokens were dropped.
    #[error("authentication expired")]
    AuthExpired,

    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("undecodable response body: {0}")]
    Decode(String),

    /// A mutating request is still in flight.
    #[error("busy")]
    Busy,

    #[error("no session is loaded")]
    NoSession,
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Decode(e.to_string())
    }
}

pub type Result<T> = core::result::Result<T, SyncError>;
