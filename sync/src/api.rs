use sapper_protocol::{ErrorBody, GameSnapshot, Move, Session, VisitRequest};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::*;

const UNAUTHORIZED: u16 = 401;
const CONFLICT: u16 = 409;

/// Typed calls against the session store.
///
/// Authenticated calls carry the current access token. A 401 refreshes the
/// tokens and repeats the call once; a second 401 signs out.
pub struct ApiClient<T: Transport> {
    transport: T,
    tokens: Mutex<Option<Tokens>>,
    max_read_retries: u32,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, config: &SyncConfig) -> Self {
        Self {
            transport,
            tokens: Mutex::new(None),
            max_read_retries: config.max_read_retries,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn create_session(&self, session: &Session) -> Result<Session> {
        let request = ApiRequest::post("/api/games/").json(serde_json::to_value(session)?);
        decode(self.call(request).await?)
    }

    /// Sessions of the signed-in user, newest first.
    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        decode(self.call(ApiRequest::get("/api/games/")).await?)
    }

    pub async fn get_session(&self, id: &str) -> Result<Session> {
        decode(self.call(ApiRequest::get(format!("/api/games/{id}"))).await?)
    }

    pub async fn update_session(&self, session: &Session) -> Result<Session> {
        let request = ApiRequest::put(format!("/api/games/{}", session.id))
            .json(serde_json::to_value(session)?);
        decode(self.call(request).await?)
    }

    pub async fn add_move(&self, mv: &Move) -> Result<Move> {
        let request = ApiRequest::post("/api/moves/").json(serde_json::to_value(mv)?);
        decode(self.call(request).await?)
    }

    /// Latest move of each coordinate of a session, newest first.
    pub async fn list_moves(&self, game_id: &str) -> Result<Vec<Move>> {
        let request = ApiRequest::get("/api/moves/").query("filter_gameId", game_id);
        decode(self.call(request).await?)
    }

    pub async fn snapshot(&self, id: &str) -> Result<GameSnapshot> {
        decode(
            self.call(ApiRequest::get(format!("/api/rpc/snapshot/{id}")))
                .await?,
        )
    }

    pub async fn visit(&self, id: &str, visit: VisitRequest) -> Result<GameSnapshot> {
        let request =
            ApiRequest::post(format!("/api/rpc/visit/{id}")).json(serde_json::to_value(visit)?);
        decode(self.call(request).await?)
    }

    /// Sends an authenticated request and maps every non-2xx answer to an error.
    async fn call(&self, request: ApiRequest) -> Result<ApiResponse> {
        let response = self
            .send(request.clone().bearer(self.access_token().await))
            .await?;

        let response = if response.status == UNAUTHORIZED {
            log::debug!("{} {} unauthorized, refreshing", request.method, request.path);
            let Some(tokens) = self.refresh().await? else {
                self.sign_out().await;
                return Err(SyncError::AuthExpired);
            };
            let retried = self
                .send(request.bearer(Some(tokens.access_token)))
                .await?;
            if retried.status == UNAUTHORIZED {
                self.sign_out().await;
                return Err(SyncError::AuthExpired);
            }
            retried
        } else {
            response
        };

        check_status(response)
    }

    /// One request, repeated on transit failures while it is safe to do so.
    pub(crate) async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let mut attempt = 0;
        loop {
            match self.transport.execute(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if request.method.is_idempotent() && attempt < self.max_read_retries => {
                    attempt += 1;
                    log::warn!(
                        "{} {} failed ({}), retry {}/{}",
                        request.method,
                        request.path,
                        e,
                        attempt,
                        self.max_read_retries
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub(crate) async fn stored_tokens(&self) -> tokio::sync::MutexGuard<'_, Option<Tokens>> {
        self.tokens.lock().await
    }
}

pub(crate) fn check_status(response: ApiResponse) -> Result<ApiResponse> {
    match response.status {
        _ if response.is_success() => Ok(response),
        CONFLICT => Err(SyncError::Conflict(
            ErrorBody::parse(&response.body).concluded_state(),
        )),
        status => Err(SyncError::Status {
            status,
            body: response.body,
        }),
    }
}

pub(crate) fn decode<D: DeserializeOwned>(response: ApiResponse) -> Result<D> {
    Ok(serde_json::from_str(&response.body)?)
}
