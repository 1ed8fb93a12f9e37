//! Keeps a Minesweeper session in step with the remote session store.
//!
//! Two adapters implement [`SyncAdapter`]: [`ClientAuthoritative`] plays the
//! game locally and pushes sessions and moves, [`ServerAuthoritative`] sends
//! single visits and renders whatever snapshot comes back. A deployment picks
//! one through [`SyncConfig::mode`].

use std::sync::Arc;

pub use adapter::*;
pub use api::*;
pub use auth::*;
pub use config::*;
pub use error::*;
pub use transport::*;

mod adapter;
mod api;
mod auth;
mod config;
mod error;
mod transport;

/// Builds the adapter selected by `config` on top of a shared API client.
pub fn build_adapter<T: Transport + 'static>(
    config: &SyncConfig,
    client: Arc<ApiClient<T>>,
) -> Box<dyn SyncAdapter> {
    log::debug!("Using {} synchronization", config.mode);
    match config.mode {
        SyncMode::ClientAuthoritative => {
            Box::new(ClientAuthoritative::new(client).with_seed(config.seed))
        }
        SyncMode::ServerAuthoritative => Box::new(ServerAuthoritative::new(client)),
    }
}

/// HTTP client for `config.base_url`, ready to be handed to [`build_adapter`].
pub fn connect(config: &SyncConfig) -> Result<Arc<ApiClient<HttpTransport>>> {
    let transport = HttpTransport::new(&config.base_url, config.request_timeout())?;
    Ok(Arc::new(ApiClient::new(transport, config)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sapper_core::{BoardConfig, SessionState};
    use serde_json::json;

    #[tokio::test]
    async fn mode_picks_the_adapter() {
        let mock = MockTransport::new();
        let config = SyncConfig {
            mode: SyncMode::ServerAuthoritative,
            ..Default::default()
        };
        let client = Arc::new(ApiClient::new(mock.clone(), &config));
        let adapter = build_adapter(&config, client);

        mock.queue_json(
            200,
            &json!({"id": "s-1", "userId": 1, "width": 2, "height": 2, "mineDensity": 25}),
        );
        mock.queue_json(
            200,
            &json!({
                "info": {"id": "s-1", "width": 2, "height": 2, "mine_density": 25, "create_time": 0, "state": null},
                "moves": [],
                "hint": {"nearby_mine_count": [[1, 1], [1, 1]]}
            }),
        );

        let view = adapter
            .start(BoardConfig::new_unchecked((2, 2), 25))
            .await
            .unwrap();

        assert_eq!(view.state, SessionState::Active);
        assert_eq!(view.mines, None);
        let requests = mock.requests();
        assert!(requests[0].body.as_json().unwrap().get("mineCoordinates").is_none());
        assert_eq!(requests[1].path, "/api/rpc/snapshot/s-1");
    }
}
