use bytes::Bytes;
use tracing::{error, info};

use super::Editor;
use crate::errors::ClientError;
use crate::messages;
use crate::routes::{ActionOutcome, Route};

/// A rendered PDF ready to be written wherever the caller saves downloads.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfFile {
    pub filename: String,
    pub bytes: Bytes,
}

/// `<title>.pdf`, or `resume.pdf` for an untitled resume.
fn fallback_filename(title: &str) -> String {
    let title = title.trim();
    let stem = if title.is_empty() {
        messages::PDF_FALLBACK_TITLE
    } else {
        title
    };
    format!("{stem}.pdf")
}

impl Editor {
    /// Renders the resume as stored on the backend.
    pub async fn export_pdf(&self) -> ActionOutcome<PdfFile> {
        let title = self.update(|state| {
            if state.busy.export {
                return None;
            }
            state.busy.export = true;
            state.errors.pdf = None;
            Some(
                state
                    .document
                    .as_ref()
                    .map(|resume| resume.content.title.clone())
                    .unwrap_or_default(),
            )
        });
        let Some(title) = title else {
            return ActionOutcome::Busy;
        };

        let result = self.inner.client.export_pdf(self.inner.resume_id).await;
        self.update(|state| state.busy.export = false);

        match result {
            Ok(export) => {
                let filename = export
                    .filename
                    .unwrap_or_else(|| fallback_filename(&title));
                info!("Exported {filename} ({} bytes)", export.bytes.len());
                ActionOutcome::Done(PdfFile {
                    filename,
                    bytes: export.bytes,
                })
            }
            Err(ClientError::QuotaExceeded) => {
                info!("Export quota reached for {}", self.inner.resume_id);
                self.update(|state| {
                    state.errors.pdf = Some(messages::PDF_QUOTA_EXCEEDED.to_string())
                });
                ActionOutcome::Navigate(Route::Payment)
            }
            Err(ClientError::Unauthenticated) => ActionOutcome::Navigate(Route::Login),
            Err(e) => {
                error!("Error exporting PDF for {}: {e}", self.inner.resume_id);
                self.update(|state| state.errors.pdf = Some(e.user_message(messages::PDF_FAILED)));
                ActionOutcome::Failed
            }
        }
    }
}
