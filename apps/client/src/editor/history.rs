use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{Editor, EditorPhase};
use crate::errors::ClientError;
use crate::messages;
use crate::models::resume::{Resume, ResumePatch};
use crate::models::version::{sort_newest_first, VersionSummary};
use crate::routes::{ActionOutcome, Route};

impl Editor {
    /// Loads the snapshot list and opens the history panel.
    pub async fn open_history(&self) -> ActionOutcome<Vec<VersionSummary>> {
        let ready = self.update(|state| {
            if state.busy.history || state.saves_in_flight > 0 {
                return false;
            }
            state.busy.history = true;
            state.errors.history = None;
            true
        });
        if !ready {
            return ActionOutcome::Busy;
        }

        let result = self.inner.client.list_versions(self.inner.resume_id).await;
        self.update(|state| {
            state.busy.history = false;
            match result {
                Ok(mut versions) => {
                    sort_newest_first(&mut versions);
                    state.history = Some(versions.clone());
                    ActionOutcome::Done(versions)
                }
                Err(ClientError::Unauthenticated) => ActionOutcome::Navigate(Route::Login),
                Err(e) => {
                    error!("Error fetching versions of {}: {e}", self.inner.resume_id);
                    state.errors.history = Some(e.user_message(messages::HISTORY_LOAD_FAILED));
                    ActionOutcome::Failed
                }
            }
        })
    }

    pub fn close_history(&self) {
        self.update(|state| state.history = None);
    }

    /// Replaces the resume content with a stored snapshot after confirmation.
    ///
    /// The current working state is snapshotted first (best-effort). Pending
    /// edits are held back while the restore runs: they are dropped once the
    /// restore lands and put back if it fails. Edits made during the restore
    /// are saved after it. Identity, owner and `created_at` stay those of the
    /// current resume.
    pub async fn restore(&self, version_id: Uuid, confirmed: bool) -> ActionOutcome {
        if !confirmed {
            return ActionOutcome::Cancelled;
        }
        let started = self.update(|state| {
            if state.busy.restore || state.saves_in_flight > 0 {
                return Err(ClientError::Busy("restore"));
            }
            let current = state.document.clone().ok_or(ClientError::NotLoaded)?;
            state.busy.restore = true;
            state.errors.history = None;
            state.phase = EditorPhase::Restoring;
            state.cancel_autosave();
            let held = state.pending.take();
            self.set_status(state, Some(messages::STATUS_RESTORING), false);
            Ok((current, held))
        });
        let (current, held) = match started {
            Ok(started) => started,
            Err(ClientError::Busy(_)) => return ActionOutcome::Busy,
            Err(e) => {
                self.update(|state| {
                    state.errors.history = Some(e.user_message(messages::HISTORY_RESTORE_FAILED))
                });
                return ActionOutcome::Failed;
            }
        };

        let outcome = match self.apply_version(version_id, current, held.is_some()).await {
            Ok(()) => ActionOutcome::Done(()),
            Err(e) => self.restore_failed(e, held),
        };
        self.update(|state| {
            state.busy.restore = false;
            if state.phase == EditorPhase::Restoring {
                state.phase = EditorPhase::Ready;
            }
        });
        outcome
    }

    async fn apply_version(
        &self,
        version_id: Uuid,
        current: Resume,
        drops_pending: bool,
    ) -> Result<(), ClientError> {
        let client = &self.inner.client;
        let resume_id = self.inner.resume_id;

        let version = client.fetch_version(version_id).await?;

        if let Err(e) = client.create_version(&current).await {
            warn!("Failed to snapshot {resume_id} before restore: {e}");
            self.update(|state| {
                state
                    .errors
                    .append_general(messages::EDITOR_HISTORY_SAVE_FAILED)
            });
        }

        let patch = ResumePatch::from_content(version.resume_data).stamped(Utc::now());
        let revision = self.update(|state| state.next_revision());
        client.update_resume(resume_id, &patch).await?;

        if drops_pending {
            info!("Pending edits of {resume_id} superseded by restore");
        }
        self.update(|state| {
            if !state.confirm(patch, revision) {
                warn!("Restore of {resume_id} (revision {revision}) landed after a newer write");
                return;
            }
            // Edits made while the restore was in flight stay on top.
            let restored = state.confirmed.clone();
            state.document = match (restored, &state.pending) {
                (Some(restored), Some(pending)) => Some(restored.with_patch(pending)),
                (restored, _) => restored,
            };
            if state.pending.is_some() {
                self.arm_autosave(state);
            }
            state.history = None;
            self.set_status(state, Some(messages::STATUS_RESTORED), true);
        });
        info!("Restored {resume_id} from version {version_id}");
        Ok(())
    }

    /// Reports the failure and puts held-back edits back in the pending slot.
    fn restore_failed(&self, e: ClientError, held: Option<ResumePatch>) -> ActionOutcome {
        error!("Error restoring {}: {e}", self.inner.resume_id);
        self.update(|state| {
            if let Some(mut pending) = held {
                if let Some(newer) = state.pending.take() {
                    pending.merge(newer);
                }
                state.pending = Some(pending);
            }
            if state.pending.is_some() {
                self.arm_autosave(state);
            }
            self.set_status(state, None, false);
            state.errors.history = Some(e.user_message(messages::HISTORY_RESTORE_FAILED));
        });
        match e {
            ClientError::Unauthenticated => ActionOutcome::Navigate(Route::Login),
            _ => ActionOutcome::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Duration as Age;

    use super::super::testing::loaded;
    use super::super::FieldEdit;
    use super::*;
    use crate::backend::memory::{Call, Failure, Op};
    use crate::models::resume::{PersonalData, ResumeContent};

    fn old_content() -> ResumeContent {
        ResumeContent {
            title: "Old title".to_string(),
            personal_data: PersonalData {
                name: Some("Jane".to_string()),
                ..Default::default()
            },
            template_id: "modern".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_open_history_sorts_newest_first() {
        let f = loaded().await;
        let now = Utc::now();
        let older = f.backend.seed_version(f.resume.id, old_content(), now - Age::days(2));
        let newer = f.backend.seed_version(f.resume.id, old_content(), now);
        let middle = f.backend.seed_version(f.resume.id, old_content(), now - Age::days(1));

        let versions = f.editor.open_history().await.done().unwrap();
        let ids: Vec<Uuid> = versions.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![newer, middle, older]);
        assert_eq!(f.editor.view().history.unwrap().len(), 3);

        f.editor.close_history();
        assert!(f.editor.view().history.is_none());
    }

    #[tokio::test]
    async fn test_open_history_failure_sets_history_error() {
        let f = loaded().await;
        f.backend.fail(Op::ListVersions, Failure::Rejected(500, String::new()));
        assert_eq!(f.editor.open_history().await, ActionOutcome::Failed);
        let view = f.editor.view();
        assert_eq!(view.errors.history.as_deref(), Some(messages::HISTORY_LOAD_FAILED));
        assert!(view.errors.general.is_none());
    }

    #[tokio::test]
    async fn test_restore_persists_snapshot_content_with_current_identity() {
        let f = loaded().await;
        let version = f.backend.seed_version(f.resume.id, old_content(), Utc::now());
        f.editor.open_history().await.done().unwrap();

        assert_eq!(f.editor.restore(version, true).await, ActionOutcome::Done(()));

        let updates = f.backend.updates();
        assert_eq!(updates.len(), 1);
        assert!(updates[0].updated_at.is_some());
        let stored = f.backend.resume(f.resume.id).unwrap();
        assert_eq!(stored.content, old_content());
        assert_eq!(stored.id, f.resume.id);
        assert_eq!(stored.user_id, f.resume.user_id);
        assert_eq!(stored.created_at, f.resume.created_at);

        let view = f.editor.view();
        assert_eq!(view.resume.unwrap(), stored);
        assert_eq!(view.status, Some(messages::STATUS_RESTORED));
        assert_eq!(view.phase, EditorPhase::Ready);
        assert!(view.history.is_none());

        // The state being replaced was snapshotted first.
        let snapshots = f.backend.snapshots();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].content, f.resume.content);
    }

    #[tokio::test]
    async fn test_declined_restore_does_nothing() {
        let f = loaded().await;
        let version = f.backend.seed_version(f.resume.id, old_content(), Utc::now());
        assert_eq!(f.editor.restore(version, false).await, ActionOutcome::Cancelled);
        assert!(!f.backend.calls().contains(&Call::FetchVersion(version)));
    }

    #[tokio::test]
    async fn test_failed_fetch_aborts_without_changes() {
        let f = loaded().await;
        f.backend.fail(Op::FetchVersion, Failure::NotFound);
        assert_eq!(
            f.editor.restore(Uuid::new_v4(), true).await,
            ActionOutcome::Failed
        );
        let view = f.editor.view();
        assert_eq!(view.errors.history.as_deref(), Some(messages::HISTORY_RESTORE_FAILED));
        assert_eq!(view.resume.unwrap().content, f.resume.content);
        assert_eq!(view.status, None);
        assert!(f.backend.updates().is_empty());
        assert!(f.backend.snapshots().is_empty());
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_local_state() {
        let f = loaded().await;
        let version = f.backend.seed_version(f.resume.id, old_content(), Utc::now());
        f.backend.fail(Op::UpdateResume, Failure::Rejected(500, String::new()));
        assert_eq!(f.editor.restore(version, true).await, ActionOutcome::Failed);
        assert_eq!(f.editor.view().resume.unwrap().content, f.resume.content);
        assert_eq!(f.editor.view().phase, EditorPhase::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_supersedes_pending_autosave() {
        let f = loaded().await;
        let version = f.backend.seed_version(f.resume.id, old_content(), Utc::now());
        f.editor.edit(FieldEdit::Title("Unsaved".into())).unwrap();

        assert_eq!(f.editor.restore(version, true).await, ActionOutcome::Done(()));
        tokio::time::sleep(Duration::from_secs(3)).await;

        let updates = f.backend.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].title.as_deref(), Some("Old title"));
        // The pre-restore snapshot captured the working copy, unsaved edit included.
        assert_eq!(f.backend.snapshots()[0].content.title, "Unsaved");
        assert_eq!(f.editor.view().resume.unwrap().content.title, "Old title");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_restore_keeps_pending_edits() {
        let f = loaded().await;
        let version = f.backend.seed_version(f.resume.id, old_content(), Utc::now());
        f.editor.edit(FieldEdit::Title("Unsaved".into())).unwrap();
        f.backend.fail(Op::UpdateResume, Failure::Rejected(500, String::new()));

        assert_eq!(f.editor.restore(version, true).await, ActionOutcome::Failed);
        let view = f.editor.view();
        assert!(view.has_pending_changes);
        assert_eq!(view.resume.unwrap().content.title, "Unsaved");
        assert_eq!(f.backend.updates().len(), 1);

        f.backend.clear_failure(Op::UpdateResume);
        tokio::time::sleep(Duration::from_secs(3)).await;
        let updates = f.backend.updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[1].title.as_deref(), Some("Unsaved"));
        assert_eq!(updates[1].changed_fields(), vec!["title"]);
        assert_eq!(f.backend.resume(f.resume.id).unwrap().content.title, "Unsaved");
        assert!(!f.editor.view().has_pending_changes);
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_during_restore_are_saved_after_it() {
        let f = loaded().await;
        let version = f.backend.seed_version(f.resume.id, old_content(), Utc::now());
        f.backend.delay(Op::FetchVersion, Duration::from_secs(3));
        let restore = tokio::spawn({
            let editor = f.editor.clone();
            async move { editor.restore(version, true).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(f.editor.flush_now().await, ActionOutcome::Busy);
        f.editor.edit(FieldEdit::Title("Typed meanwhile".into())).unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(f.backend.updates().is_empty());

        assert_eq!(restore.await.unwrap(), ActionOutcome::Done(()));
        let updates = f.backend.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].title.as_deref(), Some("Old title"));
        let view = f.editor.view();
        assert!(view.has_pending_changes);
        let resume = view.resume.unwrap();
        assert_eq!(resume.content.title, "Typed meanwhile");
        assert_eq!(resume.content.template_id, "modern");

        tokio::time::sleep(Duration::from_millis(2100)).await;
        let updates = f.backend.updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[1].title.as_deref(), Some("Typed meanwhile"));
        assert_eq!(updates[1].changed_fields(), vec!["title"]);
        let stored = f.backend.resume(f.resume.id).unwrap();
        assert_eq!(stored.content.title, "Typed meanwhile");
        assert_eq!(stored.content.template_id, "modern");
    }

    #[tokio::test]
    async fn test_snapshot_failure_does_not_block_restore() {
        let f = loaded().await;
        let version = f.backend.seed_version(f.resume.id, old_content(), Utc::now());
        f.backend.fail(Op::CreateVersion, Failure::Rejected(500, String::new()));
        assert_eq!(f.editor.restore(version, true).await, ActionOutcome::Done(()));
        assert_eq!(
            f.editor.view().errors.general.as_deref(),
            Some(messages::EDITOR_HISTORY_SAVE_FAILED)
        );
        assert_eq!(f.backend.resume(f.resume.id).unwrap().content, old_content());
    }

    #[tokio::test(start_paused = true)]
    async fn test_history_refused_while_saving() {
        let f = loaded().await;
        f.backend.delay(Op::UpdateResume, Duration::from_secs(1));
        f.editor.edit(FieldEdit::Title("Saving".into())).unwrap();
        let save = tokio::spawn({
            let editor = f.editor.clone();
            async move { editor.flush_now().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(f.editor.open_history().await, ActionOutcome::Busy);
        assert_eq!(f.editor.restore(Uuid::new_v4(), true).await, ActionOutcome::Busy);
        assert_eq!(save.await.unwrap(), ActionOutcome::Done(()));
        assert!(f.editor.open_history().await.done().is_some());
    }
}
