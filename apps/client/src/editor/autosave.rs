use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::{Editor, EditorState, FieldEdit};
use crate::errors::ClientError;
use crate::messages;
use crate::models::resume::{Resume, ResumePatch};
use crate::routes::{ActionOutcome, Route};

/// A pending delta taken out of the slot, ready to be sent.
struct SaveJob {
    patch: ResumePatch,
    snapshot: Resume,
    revision: u64,
}

impl Editor {
    /// Applies an edit to the working copy and (re)arms the autosave timer.
    pub fn edit(&self, edit: FieldEdit) -> Result<(), ClientError> {
        self.update(|state| {
            let document = state.document.as_mut().ok_or(ClientError::NotLoaded)?;
            let delta = edit.apply(document);
            debug!(fields = ?delta.changed_fields(), "Edit queued");
            match state.pending.as_mut() {
                Some(pending) => pending.merge(delta),
                None => state.pending = Some(delta),
            }
            self.arm_autosave(state);
            Ok(())
        })
    }

    /// Persists any pending delta now instead of waiting for the quiet window.
    ///
    /// Returns `Busy` while a restore is running; its completion re-arms the
    /// timer for whatever is still pending.
    pub async fn flush_now(&self) -> ActionOutcome {
        let restoring = self.update(|state| {
            state.cancel_autosave();
            state.busy.restore
        });
        if restoring {
            return ActionOutcome::Busy;
        }
        self.flush().await
    }

    pub(super) fn arm_autosave(&self, state: &mut EditorState) {
        state.cancel_autosave();
        let weak = Arc::downgrade(&self.inner);
        let quiet_window = self.inner.settings.quiet_window;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(quiet_window).await;
            if let Some(inner) = weak.upgrade() {
                // The save runs in its own task so a later edit aborting
                // this timer cannot cut a request short.
                let editor = Editor { inner };
                tokio::spawn(async move {
                    let _ = editor.flush().await;
                });
            }
        });
        debug!("Autosave armed for {:?}", quiet_window);
        state.autosave_timer = Some(timer.abort_handle());
    }

    async fn flush(&self) -> ActionOutcome {
        match self.update(|state| self.take_pending(state)) {
            Some(job) => self.persist(job).await,
            None => ActionOutcome::Done(()),
        }
    }

    fn take_pending(&self, state: &mut EditorState) -> Option<SaveJob> {
        if state.busy.restore {
            debug!("Restore in progress, save deferred");
            return None;
        }
        let confirmed = state.confirmed.as_ref()?;
        let patch = state.pending.take()?.stamped(Utc::now());
        let snapshot = confirmed.with_patch(&patch);
        let revision = state.next_revision();
        state.saves_in_flight += 1;
        self.set_status(state, Some(messages::STATUS_SAVING), false);
        Some(SaveJob {
            patch,
            snapshot,
            revision,
        })
    }

    /// Snapshot first (best-effort), then the update itself.
    async fn persist(&self, job: SaveJob) -> ActionOutcome {
        let SaveJob {
            patch,
            snapshot,
            revision,
        } = job;
        let client = &self.inner.client;
        let resume_id = self.inner.resume_id;

        if let Err(e) = client.create_version(&snapshot).await {
            warn!("Failed to save version snapshot for {resume_id}: {e}");
            self.update(|state| {
                state
                    .errors
                    .append_general(messages::EDITOR_HISTORY_SAVE_FAILED)
            });
        }

        let result = client.update_resume(resume_id, &patch).await;
        self.update(|state| {
            state.saves_in_flight = state.saves_in_flight.saturating_sub(1);
            match result {
                Ok(()) => {
                    info!(fields = ?patch.changed_fields(), "Saved resume {resume_id}");
                    let saved_at = patch.updated_at;
                    if !state.confirm(patch, revision) {
                        warn!(
                            "Save of {resume_id} (revision {revision}) landed after revision {}",
                            state.applied_revision
                        );
                        return ActionOutcome::Done(());
                    }
                    if let (Some(document), Some(at)) = (state.document.as_mut(), saved_at) {
                        document.updated_at = at;
                    }
                    self.set_status(state, Some(messages::STATUS_SAVED), true);
                    ActionOutcome::Done(())
                }
                Err(e) => {
                    error!("Error saving resume {resume_id}: {e}");
                    self.set_status(state, Some(messages::STATUS_SAVE_FAILED), false);
                    state.errors.general = Some(messages::EDITOR_SAVE_FAILED.to_string());
                    match e {
                        ClientError::Unauthenticated => ActionOutcome::Navigate(Route::Login),
                        _ => ActionOutcome::Failed,
                    }
                }
            }
        })
    }
}
