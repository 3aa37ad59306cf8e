//! Document editor: load, debounced autosave, AI suggestions, PDF export and
//! version history for one resume.
//!
//! [`Editor`] is a cheap `Clone` handle. Its state sits behind a mutex that is
//! only taken in short synchronous sections, never across an `.await`.
//! Background timers hold a weak reference, so dropping the last handle drops
//! whatever they would have done.

mod assist;
mod autosave;
mod export;
mod fields;
mod history;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::AbortHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::messages;
use crate::models::resume::{Resume, ResumePatch};
use crate::models::version::VersionSummary;
use crate::routes::{ActionOutcome, Route};
use crate::session::SessionClient;

pub use export::PdfFile;
pub use fields::{FieldEdit, PersonalField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorSettings {
    /// How long edits must pause before a save is sent.
    pub quiet_window: Duration,
    /// How long a transient status ("Saved") stays visible.
    pub status_window: Duration,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            quiet_window: Duration::from_secs(2),
            status_window: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorPhase {
    Loading,
    Ready,
    Saving,
    Restoring,
    Error,
}

/// Error text per area of the screen. Each workflow writes only its own slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorErrors {
    pub general: Option<String>,
    pub ai: Option<String>,
    pub pdf: Option<String>,
    pub history: Option<String>,
}

impl EditorErrors {
    /// Adds a line to the general error without dropping what is there.
    fn append_general(&mut self, line: &str) {
        match &mut self.general {
            Some(text) if !text.is_empty() => {
                text.push('\n');
                text.push_str(line);
            }
            slot => *slot = Some(line.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct BusyFlags {
    export: bool,
    suggest: bool,
    history: bool,
    restore: bool,
}

/// What a renderer needs to draw the editor.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorView {
    pub phase: EditorPhase,
    pub resume: Option<Resume>,
    pub status: Option<&'static str>,
    pub errors: EditorErrors,
    /// `Some` while the history panel is open.
    pub history: Option<Vec<VersionSummary>>,
    pub job_description: String,
    /// Last job-description analysis, read-only.
    pub analysis: Option<String>,
    pub has_pending_changes: bool,
}

struct EditorState {
    /// Loading, Ready, Restoring or Error. Saving is derived from `saves_in_flight`.
    phase: EditorPhase,
    /// Last state the backend accepted.
    confirmed: Option<Resume>,
    /// Working copy shown to the user; ahead of `confirmed` while edits are unsaved.
    document: Option<Resume>,
    pending: Option<ResumePatch>,
    autosave_timer: Option<AbortHandle>,
    status: Option<&'static str>,
    status_timer: Option<AbortHandle>,
    errors: EditorErrors,
    busy: BusyFlags,
    saves_in_flight: usize,
    /// Revision handed to the most recently scheduled persist or restore.
    scheduled_revision: u64,
    /// Highest revision that has landed.
    applied_revision: u64,
    /// Per column, the revision of the write that last confirmed it.
    field_revisions: HashMap<&'static str, u64>,
    history: Option<Vec<VersionSummary>>,
    job_description: String,
    analysis: Option<String>,
}

impl EditorState {
    fn new() -> Self {
        Self {
            phase: EditorPhase::Loading,
            confirmed: None,
            document: None,
            pending: None,
            autosave_timer: None,
            status: None,
            status_timer: None,
            errors: EditorErrors::default(),
            busy: BusyFlags::default(),
            saves_in_flight: 0,
            scheduled_revision: 0,
            applied_revision: 0,
            field_revisions: HashMap::new(),
            history: None,
            job_description: String::new(),
            analysis: None,
        }
    }

    fn next_revision(&mut self) -> u64 {
        self.scheduled_revision += 1;
        self.scheduled_revision
    }

    /// Records a completion unless a later-scheduled one already landed.
    fn accept_revision(&mut self, revision: u64) -> bool {
        if revision < self.applied_revision {
            return false;
        }
        self.applied_revision = revision;
        true
    }

    /// Folds a successful write into `confirmed`.
    ///
    /// Columns already confirmed by a later-scheduled write are skipped, and
    /// `updated_at` only moves forward. Returns false when a later write has
    /// already landed.
    fn confirm(&mut self, mut patch: ResumePatch, revision: u64) -> bool {
        let overtaken: Vec<&'static str> = patch
            .changed_fields()
            .into_iter()
            .filter(|field| {
                self.field_revisions
                    .get(field)
                    .is_some_and(|confirmed_at| *confirmed_at > revision)
            })
            .collect();
        patch.clear_fields(&overtaken);
        for field in patch.changed_fields() {
            self.field_revisions.insert(field, revision);
        }
        let newest = self.accept_revision(revision);
        if !newest {
            patch.updated_at = None;
        }
        if let Some(confirmed) = self.confirmed.as_mut() {
            confirmed.apply(&patch);
        }
        newest
    }

    fn cancel_autosave(&mut self) {
        if let Some(timer) = self.autosave_timer.take() {
            timer.abort();
        }
    }
}

struct Inner {
    client: SessionClient,
    resume_id: Uuid,
    settings: EditorSettings,
    state: Mutex<EditorState>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone)]
pub struct Editor {
    inner: Arc<Inner>,
}

impl Editor {
    pub fn new(client: SessionClient, resume_id: Uuid, settings: EditorSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                resume_id,
                settings,
                state: Mutex::new(EditorState::new()),
            }),
        }
    }

    pub fn resume_id(&self) -> Uuid {
        self.inner.resume_id
    }

    fn update<R>(&self, f: impl FnOnce(&mut EditorState) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn view(&self) -> EditorView {
        self.update(|state| {
            let phase = match state.phase {
                EditorPhase::Ready if state.saves_in_flight > 0 => EditorPhase::Saving,
                phase => phase,
            };
            EditorView {
                phase,
                resume: state.document.clone(),
                status: state.status,
                errors: state.errors.clone(),
                history: state.history.clone(),
                job_description: state.job_description.clone(),
                analysis: state.analysis.clone(),
                has_pending_changes: state.pending.is_some(),
            }
        })
    }

    /// Shows `status`. Transient ones clear themselves after the status window.
    fn set_status(&self, state: &mut EditorState, status: Option<&'static str>, transient: bool) {
        if let Some(timer) = state.status_timer.take() {
            timer.abort();
        }
        state.status = status;
        if !transient || status.is_none() {
            return;
        }
        let weak = Arc::downgrade(&self.inner);
        let window = self.inner.settings.status_window;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            if let Some(inner) = weak.upgrade() {
                let mut state = inner.lock();
                if state.status == status {
                    state.status = None;
                }
                state.status_timer = None;
            }
        });
        state.status_timer = Some(handle.abort_handle());
    }

    /// Fetches the resume. Missing rows send the user back to the dashboard.
    pub async fn load(&self) -> ActionOutcome {
        self.update(|state| {
            state.phase = EditorPhase::Loading;
            state.errors = EditorErrors::default();
        });

        let result = self.inner.client.fetch_resume(self.inner.resume_id).await;
        self.update(|state| match result {
            Ok(resume) => {
                info!("Loaded resume {} ({})", resume.id, resume.content.title);
                state.confirmed = Some(resume.clone());
                state.document = Some(resume);
                state.phase = EditorPhase::Ready;
                ActionOutcome::Done(())
            }
            Err(e) => {
                state.phase = EditorPhase::Error;
                match e.redirect() {
                    Some(Route::Dashboard) => {
                        state.errors.general = Some(messages::EDITOR_NOT_FOUND.to_string());
                        ActionOutcome::Navigate(Route::Dashboard)
                    }
                    Some(route) => ActionOutcome::Navigate(route),
                    None => {
                        error!("Error loading resume {}: {e}", self.inner.resume_id);
                        state.errors.general = Some(messages::EDITOR_LOAD_FAILED.to_string());
                        ActionOutcome::Failed
                    }
                }
            }
        })
    }

    pub fn set_job_description(&self, text: impl Into<String>) {
        let text = text.into();
        self.update(|state| state.job_description = text);
    }
}
