use tracing::{error, info};

use super::{Editor, FieldEdit};
use crate::errors::ClientError;
use crate::messages;
use crate::models::suggestion::{SuggestionContext, SuggestionKind, SuggestionRequest};
use crate::routes::{ActionOutcome, Route};

impl Editor {
    /// Asks the `ai-suggest` function for text.
    ///
    /// A summary suggestion goes through [`Editor::edit`] and therefore
    /// autosaves. An analysis is stored for display and returned as is.
    pub async fn suggest(&self, kind: SuggestionKind) -> ActionOutcome<String> {
        let request = self.update(|state| {
            if state.busy.suggest {
                return Err(ClientError::Busy("AI suggestion"));
            }
            let document = state.document.as_ref().ok_or(ClientError::NotLoaded)?;
            let content = &document.content;
            let context = match kind {
                SuggestionKind::Summary => SuggestionContext::Summary {
                    skills: content.skills.iter().map(|s| s.name.clone()).collect(),
                    experiences: content.experience.clone(),
                },
                SuggestionKind::AnalyzeJobDescription => {
                    if state.job_description.trim().is_empty() {
                        return Err(ClientError::Validation(
                            messages::AI_JOB_DESCRIPTION_REQUIRED.to_string(),
                        ));
                    }
                    SuggestionContext::JobAnalysis {
                        job_description: state.job_description.clone(),
                        current_summary: content.summary.clone().unwrap_or_default(),
                    }
                }
            };
            state.busy.suggest = true;
            state.errors.ai = None;
            Ok(SuggestionRequest { kind, context })
        });
        let request = match request {
            Ok(request) => request,
            Err(ClientError::Busy(_)) => return ActionOutcome::Busy,
            Err(e) => {
                self.update(|state| state.errors.ai = Some(e.user_message(messages::AI_FAILED)));
                return ActionOutcome::Failed;
            }
        };

        let result = self.inner.client.suggest(&request).await;
        self.update(|state| state.busy.suggest = false);

        let text = match result {
            Ok(Some(text)) if !text.trim().is_empty() => text,
            Ok(_) => {
                self.update(|state| state.errors.ai = Some(messages::AI_EMPTY_SUGGESTION.to_string()));
                return ActionOutcome::Failed;
            }
            Err(ClientError::Unauthenticated) => return ActionOutcome::Navigate(Route::Login),
            Err(e) => {
                error!("Error generating {kind:?} suggestion: {e}");
                self.update(|state| state.errors.ai = Some(e.user_message(messages::AI_FAILED)));
                return ActionOutcome::Failed;
            }
        };
        info!("Received {kind:?} suggestion ({} chars)", text.len());

        match kind {
            SuggestionKind::Summary => {
                if let Err(e) = self.edit(FieldEdit::Summary(text.clone())) {
                    self.update(|state| state.errors.ai = Some(e.user_message(messages::AI_FAILED)));
                    return ActionOutcome::Failed;
                }
            }
            SuggestionKind::AnalyzeJobDescription => {
                let analysis = text.clone();
                self.update(|state| state.analysis = Some(analysis));
            }
        }
        ActionOutcome::Done(text)
    }
}
