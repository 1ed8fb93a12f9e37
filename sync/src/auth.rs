use sapper_protocol::{AuthCheck, TokenGrant, TokenResponse};
use web_time::{SystemTime, UNIX_EPOCH};

use crate::api::{check_status, decode};
use crate::*;

const BAD_REQUEST: u16 = 400;
const UNAUTHORIZED: u16 = 401;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<TokenResponse> for Tokens {
    fn from(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
        }
    }
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default()
}

impl<T: Transport> ApiClient<T> {
    pub async fn set_tokens(&self, tokens: Tokens) {
        *self.stored_tokens().await = Some(tokens);
    }

    pub async fn tokens(&self) -> Option<Tokens> {
        self.stored_tokens().await.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.stored_tokens()
            .await
            .as_ref()
            .map(|tokens| tokens.access_token.clone())
    }

    pub async fn has_tokens(&self) -> bool {
        self.stored_tokens()
            .await
            .as_ref()
            .is_some_and(|t| !t.access_token.is_empty() && !t.refresh_token.is_empty())
    }

    pub async fn sign_out(&self) {
        log::debug!("Signing out");
        *self.stored_tokens().await = None;
    }

    /// Exchanges user credentials for a token pair and keeps it.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Tokens> {
        let grant = TokenGrant::ClientCredentials {
            client_id: username.to_owned(),
            client_secret: password.to_owned(),
        };
        let request = ApiRequest::post("/api/oauth/token").form(grant.form_fields());
        let response = check_status(self.send(request).await?)?;
        let tokens = Tokens::from(decode::<TokenResponse>(response)?);
        self.set_tokens(tokens.clone()).await;
        Ok(tokens)
    }

    /// New token pair from the refresh token, `None` when the store refuses it.
    pub async fn refresh(&self) -> Result<Option<Tokens>> {
        let Some(refresh_token) = self
            .tokens()
            .await
            .map(|tokens| tokens.refresh_token)
            .filter(|token| !token.is_empty())
        else {
            self.sign_out().await;
            return Ok(None);
        };

        let grant = TokenGrant::RefreshToken(refresh_token);
        let request = ApiRequest::post("/api/oauth/refresh").form(grant.form_fields());
        let response = self.send(request).await?;
        if !response.is_success() {
            log::warn!("Token refresh refused with {}", response.status);
            return Ok(None);
        }

        let tokens = Tokens::from(decode::<TokenResponse>(response)?);
        self.set_tokens(tokens.clone()).await;
        Ok(Some(tokens))
    }

    /// Remaining access token lifetime in seconds, negative for an invalid session.
    ///
    /// A rejected token is refreshed once before giving up.
    pub async fn check_authentication(&self) -> Result<f64> {
        let mut allow_refresh = true;
        loop {
            if !self.has_tokens().await {
                return Ok(-1.0);
            }

            let request = ApiRequest::get("/api/me").bearer(self.access_token().await);
            let response = self.send(request).await?;
            match response.status {
                BAD_REQUEST | UNAUTHORIZED if allow_refresh => {
                    allow_refresh = false;
                    if self.refresh().await?.is_none() {
                        return Ok(-1.0);
                    }
                }
                _ if response.is_success() => {
                    let check: AuthCheck = decode(response)?;
                    return Ok(check.ttl(now_secs()));
                }
                _ => return Ok(-1.0),
            }
        }
    }
}
