use serde::{Deserialize, Serialize};

/// Answer of `/api/oauth/token` and `/api/oauth/refresh`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Seconds until the access token expires.
    #[serde(default)]
    pub expires_in: f64,
    #[serde(default)]
    pub token_type: String,
}

/// Form-encoded token grants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenGrant {
    ClientCredentials {
        client_id: String,
        client_secret: String,
    },
    RefreshToken(String),
}

impl TokenGrant {
    pub fn form_fields(&self) -> Vec<(String, String)> {
        match self {
            Self::ClientCredentials {
                client_id,
                client_secret,
            } => vec![
                ("grant_type".into(), "client_credentials".into()),
                ("client_id".into(), client_id.clone()),
                ("client_secret".into(), client_secret.clone()),
            ],
            Self::RefreshToken(token) => vec![
                ("grant_type".into(), "refresh_token".into()),
                ("refresh_token".into(), token.clone()),
            ],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Expiry, seconds since the unix epoch.
    pub exp: f64,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Answer of `GET /api/me`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthCheck {
    pub authorized: bool,
    #[serde(default)]
    pub claims: Option<Claims>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl AuthCheck {
    /// Remaining token lifetime in seconds; negative when the session is not valid.
    pub fn ttl(&self, now: f64) -> f64 {
        match (&self.claims, self.authorized) {
            (Some(claims), true) => claims.exp - now,
            _ => -1.0,
        }
    }
}
