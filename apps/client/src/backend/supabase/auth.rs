use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{error_from_response, SupabaseClient};
use crate::errors::ClientError;
use crate::models::user::{Credentials, Session, User};

/// GoTrue token payload, shared by password and refresh grants and by signup
/// when the project auto-confirms emails.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| self.expires_in.map(|secs| now + Duration::seconds(secs)));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

impl SupabaseClient {
    async fn token_grant(&self, grant_type: &str, body: Value) -> Result<Session, ClientError> {
        let url = self.url("auth/v1/token");
        debug!("POST {url}?grant_type={grant_type}");
        let response = self
            .anon(self.client.post(&url))
            .query(&[("grant_type", grant_type)])
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            // A rejected password is a 400 here, never a 401.
            return Err(error_from_response(response).await);
        }
        let token: TokenResponse = response.json().await?;
        Ok(token.into_session(Utc::now()))
    }

    pub(super) async fn password_grant(
        &self,
        credentials: &Credentials,
    ) -> Result<Session, ClientError> {
        self.token_grant("password", serde_json::to_value(credentials)?)
            .await
    }

    pub(super) async fn refresh_grant(&self, refresh_token: &str) -> Result<Session, ClientError> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    pub(super) async fn signup(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<Session>, ClientError> {
        let url = self.url("auth/v1/signup");
        debug!("POST {url}");
        let response = self
            .anon(self.client.post(&url))
            .json(credentials)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let body: Value = response.json().await?;
        if body.get("access_token").is_none() {
            return Ok(None);
        }
        let token: TokenResponse = serde_json::from_value(body)?;
        Ok(Some(token.into_session(Utc::now())))
    }

    pub(super) async fn logout(&self, session: &Session) -> Result<(), ClientError> {
        let url = self.url("auth/v1/logout");
        debug!("POST {url}");
        let response = self
            .authed(self.client.post(&url), session)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }
}
