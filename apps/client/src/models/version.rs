use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::resume::{Resume, ResumeContent};

/// One entry of the version history list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSummary {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A stored snapshot as returned by `GET resume-versions/<id>`.
///
/// `resume_data` decodes into [`ResumeContent`], so the identity, owner and
/// timestamps recorded inside the snapshot never reach a restore.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResumeVersion {
    pub id: Uuid,
    #[serde(default)]
    pub resume_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub resume_data: ResumeContent,
}

/// Body of `POST resume-versions`.
#[derive(Debug, Serialize)]
pub struct NewVersion<'a> {
    pub resume_id: Uuid,
    pub resume_data: &'a Resume,
}

/// Newest first. The sort is stable, so equal timestamps keep backend order.
pub fn sort_newest_first(versions: &mut [VersionSummary]) {
    versions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
