//! The seam between this client and the hosted platform.
//!
//! Everything the client persists, authenticates or computes remotely goes
//! through [`Backend`]. `SupabaseClient` is the production implementation;
//! tests use the in-memory one in `memory`.

use async_trait::async_trait;
use bytes::Bytes;
use uuid::Uuid;

use crate::errors::ClientError;
use crate::models::resume::{NewResume, Resume, ResumePatch, ResumeSummary};
use crate::models::suggestion::SuggestionRequest;
use crate::models::user::{Credentials, Session};
use crate::models::version::{NewVersion, ResumeVersion, VersionSummary};

#[cfg(test)]
pub mod memory;
pub mod supabase;

pub use supabase::SupabaseClient;

/// A rendered PDF as returned by the export function.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfExport {
    /// Filename from the `content-disposition` header, when it names one.
    pub filename: Option<String>,
    pub bytes: Bytes,
}

#[async_trait]
pub trait Backend: Send + Sync {
    // Auth

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, ClientError>;

    /// `None` when the account was created but still needs email confirmation.
    async fn sign_up(&self, credentials: &Credentials) -> Result<Option<Session>, ClientError>;

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, ClientError>;

    async fn sign_out(&self, session: &Session) -> Result<(), ClientError>;

    // Document store

    /// The signed-in user's resumes, most recently updated first.
    async fn list_resumes(&self, session: &Session) -> Result<Vec<ResumeSummary>, ClientError>;

    async fn fetch_resume(&self, session: &Session, id: Uuid) -> Result<Resume, ClientError>;

    async fn insert_resume(&self, session: &Session, new: &NewResume)
        -> Result<Uuid, ClientError>;

    async fn update_resume(
        &self,
        session: &Session,
        id: Uuid,
        patch: &ResumePatch,
    ) -> Result<(), ClientError>;

    async fn delete_resume(&self, session: &Session, id: Uuid) -> Result<(), ClientError>;

    // Functions

    async fn suggest(
        &self,
        session: &Session,
        request: &SuggestionRequest,
    ) -> Result<Option<String>, ClientError>;

    /// Fails with `QuotaExceeded` when the function answers 403.
    async fn export_pdf(&self, session: &Session, resume_id: Uuid)
        -> Result<PdfExport, ClientError>;

    async fn create_version(
        &self,
        session: &Session,
        version: &NewVersion<'_>,
    ) -> Result<(), ClientError>;

    async fn list_versions(
        &self,
        session: &Session,
        resume_id: Uuid,
    ) -> Result<Vec<VersionSummary>, ClientError>;

    async fn fetch_version(
        &self,
        session: &Session,
        version_id: Uuid,
    ) -> Result<ResumeVersion, ClientError>;
}
