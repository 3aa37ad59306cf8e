use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::{Backend, PdfExport};
use crate::errors::ClientError;
use crate::models::resume::{NewResume, Resume, ResumePatch, ResumeSummary};
use crate::models::suggestion::SuggestionRequest;
use crate::models::user::{Credentials, Session, User};
use crate::models::version::{NewVersion, ResumeVersion, VersionSummary};

/// The one handle every workflow uses to reach the backend.
///
/// Holds the current session explicitly: `sign_in`/`sign_up` install it,
/// `sign_out` removes it, and every authenticated call reads it. Cloning is
/// cheap and clones share the same session. At most one refresh runs at a
/// time; callers that find the session expired wait for it.
#[derive(Clone)]
pub struct SessionClient {
    backend: Arc<dyn Backend>,
    session: Arc<RwLock<Option<Session>>>,
    refresh: Arc<tokio::sync::Mutex<()>>,
}

impl SessionClient {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            session: Arc::new(RwLock::new(None)),
            refresh: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    fn current(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, session: Option<Session>) -> Option<Session> {
        let mut slot = self.session.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *slot, session)
    }

    /// Swaps the slot only if it still holds `expected`.
    fn replace_if_current(&self, expected: &Session, next: Option<Session>) -> bool {
        let mut slot = self.session.write().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(held) if held.access_token == expected.access_token => {
                *slot = next;
                true
            }
            _ => false,
        }
    }

    /// Installs a session directly, bypassing the sign-in call.
    #[cfg(test)]
    pub(crate) fn install(&self, session: Session) {
        self.replace(Some(session));
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session, ClientError> {
        let session = self.backend.sign_in(credentials).await?;
        info!("Signed in as {}", session.user.id);
        self.replace(Some(session.clone()));
        Ok(session)
    }

    /// Returns `None` when the account still needs email confirmation.
    pub async fn sign_up(&self, credentials: &Credentials) -> Result<Option<Session>, ClientError> {
        let session = self.backend.sign_up(credentials).await?;
        match &session {
            Some(session) => {
                info!("Signed up and signed in as {}", session.user.id);
                self.replace(Some(session.clone()));
            }
            None => info!("Signed up {}; email confirmation pending", credentials.email),
        }
        Ok(session)
    }

    /// Ends the session. The local session is dropped even when the backend
    /// call fails; the error is returned for logging only.
    pub async fn sign_out(&self) -> Result<(), ClientError> {
        let Some(session) = self.replace(None) else {
            return Ok(());
        };
        info!("Signing out {}", session.user.id);
        self.backend.sign_out(&session).await
    }

    /// The current session, refreshed first if it has expired.
    pub async fn session(&self) -> Result<Session, ClientError> {
        let session = self.current().ok_or(ClientError::Unauthenticated)?;
        if !session.is_expired(Utc::now()) {
            return Ok(session);
        }

        let _refreshing = self.refresh.lock().await;
        // Another caller may have refreshed or signed out while we waited.
        let session = self.current().ok_or(ClientError::Unauthenticated)?;
        if !session.is_expired(Utc::now()) {
            return Ok(session);
        }
        let Some(refresh_token) = session.refresh_token.as_deref() else {
            self.replace_if_current(&session, None);
            return Err(ClientError::Unauthenticated);
        };
        match self.backend.refresh_session(refresh_token).await {
            Ok(fresh) => {
                if !self.replace_if_current(&session, Some(fresh.clone())) {
                    debug!("Session changed during refresh, keeping the newer one");
                    return self.current().ok_or(ClientError::Unauthenticated);
                }
                info!("Refreshed session for {}", fresh.user.id);
                Ok(fresh)
            }
            Err(e) => {
                warn!("Session refresh failed: {e}");
                self.replace_if_current(&session, None);
                Err(ClientError::Unauthenticated)
            }
        }
    }

    pub async fn user(&self) -> Result<User, ClientError> {
        Ok(self.session().await?.user)
    }

    // Document store

    pub async fn list_resumes(&self) -> Result<Vec<ResumeSummary>, ClientError> {
        let session = self.session().await?;
        self.backend.list_resumes(&session).await
    }

    pub async fn fetch_resume(&self, id: Uuid) -> Result<Resume, ClientError> {
        let session = self.session().await?;
        self.backend.fetch_resume(&session, id).await
    }

    /// Inserts a resume owned by the signed-in user and returns its id.
    pub async fn create_resume(&self, title: &str) -> Result<Uuid, ClientError> {
        let session = self.session().await?;
        let new = NewResume {
            user_id: session.user.id,
            title: title.to_string(),
        };
        self.backend.insert_resume(&session, &new).await
    }

    pub async fn update_resume(&self, id: Uuid, patch: &ResumePatch) -> Result<(), ClientError> {
        let session = self.session().await?;
        self.backend.update_resume(&session, id, patch).await
    }

    pub async fn delete_resume(&self, id: Uuid) -> Result<(), ClientError> {
        let session = self.session().await?;
        self.backend.delete_resume(&session, id).await
    }

    // Functions

    pub async fn suggest(&self, request: &SuggestionRequest) -> Result<Option<String>, ClientError> {
        let session = self.session().await?;
        self.backend.suggest(&session, request).await
    }

    pub async fn export_pdf(&self, resume_id: Uuid) -> Result<PdfExport, ClientError> {
        let session = self.session().await?;
        self.backend.export_pdf(&session, resume_id).await
    }

    pub async fn create_version(&self, resume: &Resume) -> Result<(), ClientError> {
        let session = self.session().await?;
        let version = NewVersion {
            resume_id: resume.id,
            resume_data: resume,
        };
        self.backend.create_version(&session, &version).await
    }

    pub async fn list_versions(&self, resume_id: Uuid) -> Result<Vec<VersionSummary>, ClientError> {
        let session = self.session().await?;
        self.backend.list_versions(&session, resume_id).await
    }

    pub async fn fetch_version(&self, version_id: Uuid) -> Result<ResumeVersion, ClientError> {
        let session = self.session().await?;
        self.backend.fetch_version(&session, version_id).await
    }
}
