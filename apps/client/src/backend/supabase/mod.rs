//! Supabase client: the HTTP implementation of [`Backend`].
//!
//! Talks to three surfaces of one project URL:
//! - `auth/v1`: password grant, signup, refresh, logout
//! - `rest/v1/resumes`: PostgREST rows (row-level security is enforced server side)
//! - `functions/v1`: ai-suggest, export-pdf, resume-versions

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use uuid::Uuid;

use crate::backend::{Backend, PdfExport};
use crate::errors::ClientError;
use crate::models::resume::{NewResume, Resume, ResumePatch, ResumeSummary};
use crate::models::suggestion::SuggestionRequest;
use crate::models::user::{Credentials, Session};
use crate::models::version::{NewVersion, ResumeVersion, VersionSummary};

mod auth;
mod functions;
mod rest;

#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let base_url: String = base_url.into();
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Anonymous request carrying only the project key.
    fn anon(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("apikey", &self.anon_key)
    }

    /// Request on behalf of the signed-in user.
    fn authed(&self, builder: RequestBuilder, session: &Session) -> RequestBuilder {
        self.anon(builder).bearer_auth(&session.access_token)
    }
}

/// Turns a non-success response into a `ClientError`, keeping the server's message.
async fn error_from_response(response: Response) -> ClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or(body);
    match status {
        401 => ClientError::Unauthenticated,
        404 => ClientError::NotFound(message),
        _ => ClientError::Rejected { status, message },
    }
}

/// Extracts a human-readable message from the error bodies the platform emits.
///
/// GoTrue uses `msg` or `error_description`, PostgREST uses `message`, and the
/// edge functions return `{ "error": "..." }`.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    for key in ["error_description", "msg", "message"] {
        if let Some(text) = value.get(key).and_then(Value::as_str) {
            return Some(text.to_string());
        }
    }
    match value.get("error")? {
        Value::String(text) => Some(text.clone()),
        Value::Object(inner) => inner
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

#[async_trait]
impl Backend for SupabaseClient {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, ClientError> {
        self.password_grant(credentials).await
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Option<Session>, ClientError> {
        self.signup(credentials).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, ClientError> {
        self.refresh_grant(refresh_token).await
    }

    async fn sign_out(&self, session: &Session) -> Result<(), ClientError> {
        self.logout(session).await
    }

    async fn list_resumes(&self, session: &Session) -> Result<Vec<ResumeSummary>, ClientError> {
        self.select_resumes(session).await
    }

    async fn fetch_resume(&self, session: &Session, id: Uuid) -> Result<Resume, ClientError> {
        self.select_resume(session, id).await
    }

    async fn insert_resume(
        &self,
        session: &Session,
        new: &NewResume,
    ) -> Result<Uuid, ClientError> {
        self.insert_resume_row(session, new).await
    }

    async fn update_resume(
        &self,
        session: &Session,
        id: Uuid,
        patch: &ResumePatch,
    ) -> Result<(), ClientError> {
        self.patch_resume_row(session, id, patch).await
    }

    async fn delete_resume(&self, session: &Session, id: Uuid) -> Result<(), ClientError> {
        self.delete_resume_row(session, id).await
    }

    async fn suggest(
        &self,
        session: &Session,
        request: &SuggestionRequest,
    ) -> Result<Option<String>, ClientError> {
        self.call_ai_suggest(session, request).await
    }

    async fn export_pdf(
        &self,
        session: &Session,
        resume_id: Uuid,
    ) -> Result<PdfExport, ClientError> {
        self.call_export_pdf(session, resume_id).await
    }

    async fn create_version(
        &self,
        session: &Session,
        version: &NewVersion<'_>,
    ) -> Result<(), ClientError> {
        self.post_version(session, version).await
    }

    async fn list_versions(
        &self,
        session: &Session,
        resume_id: Uuid,
    ) -> Result<Vec<VersionSummary>, ClientError> {
        self.get_versions(session, resume_id).await
    }

    async fn fetch_version(
        &self,
        session: &Session,
        version_id: Uuid,
    ) -> Result<ResumeVersion, ClientError> {
        self.get_version(session, version_id).await
    }
}
