//! In-memory backend for tests: records every call and can be told to fail or stall.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::backend::{Backend, PdfExport};
use crate::errors::ClientError;
use crate::models::resume::{NewResume, Resume, ResumeContent, ResumePatch, ResumeSummary};
use crate::models::suggestion::SuggestionRequest;
use crate::models::user::{Credentials, Session, User};
use crate::models::version::{NewVersion, ResumeVersion, VersionSummary};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SignIn(String),
    SignUp(String),
    Refresh,
    SignOut,
    ListResumes,
    FetchResume(Uuid),
    InsertResume(String),
    UpdateResume(Uuid, ResumePatch),
    DeleteResume(Uuid),
    Suggest(SuggestionRequest),
    ExportPdf(Uuid),
    CreateVersion(Uuid, Resume),
    ListVersions(Uuid),
    FetchVersion(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    SignIn,
    SignUp,
    Refresh,
    SignOut,
    ListResumes,
    FetchResume,
    InsertResume,
    UpdateResume,
    DeleteResume,
    Suggest,
    ExportPdf,
    CreateVersion,
    ListVersions,
    FetchVersion,
}

#[derive(Debug, Clone)]
pub enum Failure {
    Unauthenticated,
    NotFound,
    QuotaExceeded,
    Rejected(u16, String),
}

impl Failure {
    fn to_error(&self) -> ClientError {
        match self {
            Failure::Unauthenticated => ClientError::Unauthenticated,
            Failure::NotFound => ClientError::NotFound("row not found".to_string()),
            Failure::QuotaExceeded => ClientError::QuotaExceeded,
            Failure::Rejected(status, message) => ClientError::Rejected {
                status: *status,
                message: message.clone(),
            },
        }
    }
}

struct StoredVersion {
    id: Uuid,
    resume_id: Uuid,
    created_at: DateTime<Utc>,
    data: ResumeContent,
}

#[derive(Default)]
struct Store {
    accounts: HashMap<String, (String, User)>,
    tokens: HashMap<String, User>,
    resumes: HashMap<Uuid, Resume>,
    versions: Vec<StoredVersion>,
    calls: Vec<Call>,
    failures: HashMap<Op, Failure>,
    delays: HashMap<Op, Duration>,
    suggestion: Option<String>,
    export_filename: Option<String>,
}

#[derive(Default)]
pub struct MemoryBackend {
    store: Mutex<Store>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap()
    }

    pub fn add_account(&self, email: &str, password: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
        };
        self.lock()
            .accounts
            .insert(email.to_string(), (password.to_string(), user.clone()));
        user
    }

    /// Issues a valid session without going through sign-in.
    pub fn issue_session(&self, user: &User) -> Session {
        let token = Uuid::new_v4().to_string();
        self.lock().tokens.insert(token.clone(), user.clone());
        Session {
            access_token: token,
            refresh_token: Some(format!("refresh-{}", user.id)),
            expires_at: None,
            user: user.clone(),
        }
    }

    pub fn revoke_all_sessions(&self) {
        self.lock().tokens.clear();
    }

    pub fn seed_resume(&self, user: &User, content: ResumeContent, updated_at: DateTime<Utc>) -> Resume {
        let resume = Resume {
            id: Uuid::new_v4(),
            user_id: user.id,
            content,
            created_at: updated_at,
            updated_at,
        };
        self.lock().resumes.insert(resume.id, resume.clone());
        resume
    }

    pub fn seed_version(
        &self,
        resume_id: Uuid,
        data: ResumeContent,
        created_at: DateTime<Utc>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().versions.push(StoredVersion {
            id,
            resume_id,
            created_at,
            data,
        });
        id
    }

    pub fn fail(&self, op: Op, failure: Failure) {
        self.lock().failures.insert(op, failure);
    }

    pub fn clear_failure(&self, op: Op) {
        self.lock().failures.remove(&op);
    }

    pub fn delay(&self, op: Op, by: Duration) {
        self.lock().delays.insert(op, by);
    }

    pub fn set_suggestion(&self, suggestion: Option<&str>) {
        self.lock().suggestion = suggestion.map(str::to_string);
    }

    pub fn set_export_filename(&self, filename: Option<&str>) {
        self.lock().export_filename = filename.map(str::to_string);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn updates(&self) -> Vec<ResumePatch> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::UpdateResume(_, patch) => Some(patch),
                _ => None,
            })
            .collect()
    }

    pub fn snapshots(&self) -> Vec<Resume> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreateVersion(_, resume) => Some(resume),
                _ => None,
            })
            .collect()
    }

    pub fn resume(&self, id: Uuid) -> Option<Resume> {
        self.lock().resumes.get(&id).cloned()
    }

    /// Records the call, waits out any configured delay, then applies
    /// injected failures and the token check.
    async fn enter(&self, op: Op, call: Call, session: Option<&Session>) -> Result<(), ClientError> {
        let delay = {
            let mut store = self.lock();
            store.calls.push(call);
            store.delays.get(&op).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let store = self.lock();
        if let Some(failure) = store.failures.get(&op) {
            return Err(failure.to_error());
        }
        if let Some(session) = session {
            if !store.tokens.contains_key(&session.access_token) {
                return Err(ClientError::Unauthenticated);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, ClientError> {
        self.enter(Op::SignIn, Call::SignIn(credentials.email.clone()), None)
            .await?;
        let user = {
            let store = self.lock();
            match store.accounts.get(&credentials.email) {
                Some((password, user)) if *password == credentials.password => user.clone(),
                _ => {
                    return Err(ClientError::Rejected {
                        status: 400,
                        message: "Invalid login credentials".to_string(),
                    })
                }
            }
        };
        Ok(self.issue_session(&user))
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Option<Session>, ClientError> {
        self.enter(Op::SignUp, Call::SignUp(credentials.email.clone()), None)
            .await?;
        if self.lock().accounts.contains_key(&credentials.email) {
            return Err(ClientError::Rejected {
                status: 422,
                message: "User already registered".to_string(),
            });
        }
        let user = self.add_account(&credentials.email, &credentials.password);
        Ok(Some(self.issue_session(&user)))
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, ClientError> {
        self.enter(Op::Refresh, Call::Refresh, None).await?;
        let user = {
            let store = self.lock();
            store
                .accounts
                .values()
                .map(|(_, user)| user)
                .find(|user| refresh_token == format!("refresh-{}", user.id))
                .cloned()
        };
        let user = user.ok_or(ClientError::Unauthenticated)?;
        Ok(self.issue_session(&user))
    }

    async fn sign_out(&self, session: &Session) -> Result<(), ClientError> {
        self.enter(Op::SignOut, Call::SignOut, None).await?;
        self.lock().tokens.remove(&session.access_token);
        Ok(())
    }

    async fn list_resumes(&self, session: &Session) -> Result<Vec<ResumeSummary>, ClientError> {
        self.enter(Op::ListResumes, Call::ListResumes, Some(session))
            .await?;
        let store = self.lock();
        let mut rows: Vec<ResumeSummary> = store
            .resumes
            .values()
            .filter(|r| r.user_id == session.user.id)
            .map(|r| ResumeSummary {
                id: r.id,
                title: r.content.title.clone(),
                updated_at: r.updated_at,
            })
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows)
    }

    async fn fetch_resume(&self, session: &Session, id: Uuid) -> Result<Resume, ClientError> {
        self.enter(Op::FetchResume, Call::FetchResume(id), Some(session))
            .await?;
        self.lock()
            .resumes
            .get(&id)
            .filter(|r| r.user_id == session.user.id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("Resume {id} not found")))
    }

    async fn insert_resume(
        &self,
        session: &Session,
        new: &NewResume,
    ) -> Result<Uuid, ClientError> {
        self.enter(
            Op::InsertResume,
            Call::InsertResume(new.title.clone()),
            Some(session),
        )
        .await?;
        let now = Utc::now();
        let resume = Resume {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            content: ResumeContent {
                title: new.title.clone(),
                ..Default::default()
            },
            created_at: now,
            updated_at: now,
        };
        let id = resume.id;
        self.lock().resumes.insert(id, resume);
        Ok(id)
    }

    async fn update_resume(
        &self,
        session: &Session,
        id: Uuid,
        patch: &ResumePatch,
    ) -> Result<(), ClientError> {
        self.enter(
            Op::UpdateResume,
            Call::UpdateResume(id, patch.clone()),
            Some(session),
        )
        .await?;
        // PostgREST answers 204 even when the filter matches nothing.
        if let Some(resume) = self.lock().resumes.get_mut(&id) {
            resume.apply(patch);
        }
        Ok(())
    }

    async fn delete_resume(&self, session: &Session, id: Uuid) -> Result<(), ClientError> {
        self.enter(Op::DeleteResume, Call::DeleteResume(id), Some(session))
            .await?;
        self.lock().resumes.remove(&id);
        Ok(())
    }

    async fn suggest(
        &self,
        session: &Session,
        request: &SuggestionRequest,
    ) -> Result<Option<String>, ClientError> {
        self.enter(Op::Suggest, Call::Suggest(request.clone()), Some(session))
            .await?;
        Ok(self.lock().suggestion.clone())
    }

    async fn export_pdf(
        &self,
        session: &Session,
        resume_id: Uuid,
    ) -> Result<PdfExport, ClientError> {
        self.enter(Op::ExportPdf, Call::ExportPdf(resume_id), Some(session))
            .await?;
        Ok(PdfExport {
            filename: self.lock().export_filename.clone(),
            bytes: Bytes::from_static(b"%PDF-1.7"),
        })
    }

    async fn create_version(
        &self,
        session: &Session,
        version: &NewVersion<'_>,
    ) -> Result<(), ClientError> {
        self.enter(
            Op::CreateVersion,
            Call::CreateVersion(version.resume_id, version.resume_data.clone()),
            Some(session),
        )
        .await?;
        self.lock().versions.push(StoredVersion {
            id: Uuid::new_v4(),
            resume_id: version.resume_id,
            created_at: Utc::now(),
            data: version.resume_data.content.clone(),
        });
        Ok(())
    }

    async fn list_versions(
        &self,
        session: &Session,
        resume_id: Uuid,
    ) -> Result<Vec<VersionSummary>, ClientError> {
        self.enter(Op::ListVersions, Call::ListVersions(resume_id), Some(session))
            .await?;
        Ok(self
            .lock()
            .versions
            .iter()
            .filter(|v| v.resume_id == resume_id)
            .map(|v| VersionSummary {
                id: v.id,
                created_at: v.created_at,
            })
            .collect())
    }

    async fn fetch_version(
        &self,
        session: &Session,
        version_id: Uuid,
    ) -> Result<ResumeVersion, ClientError> {
        self.enter(Op::FetchVersion, Call::FetchVersion(version_id), Some(session))
            .await?;
        self.lock()
            .versions
            .iter()
            .find(|v| v.id == version_id)
            .map(|v| ResumeVersion {
                id: v.id,
                resume_id: Some(v.resume_id),
                created_at: v.created_at,
                resume_data: v.data.clone(),
            })
            .ok_or_else(|| ClientError::NotFound(format!("Version {version_id} not found")))
    }
}
