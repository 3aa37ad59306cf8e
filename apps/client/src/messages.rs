// User-visible strings, kept in one place so a renderer can swap locales.

pub const AUTH_LOGIN_FAILED: &str = "Failed to log in. Please try again.";
pub const AUTH_SIGNUP_FAILED: &str = "Failed to sign up. Please try again.";
pub const AUTH_EMAIL_REQUIRED: &str = "Please enter your email.";
pub const AUTH_PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters.";

pub const DASHBOARD_LOAD_FAILED: &str = "Failed to load your resumes. Please try again.";
pub const DASHBOARD_CREATE_FAILED: &str = "Failed to create a new resume. Please try again.";
pub const DASHBOARD_DELETE_FAILED: &str = "Failed to delete the resume. Please try again.";
pub const DEFAULT_RESUME_TITLE: &str = "New Resume";

pub const EDITOR_NOT_FOUND: &str = "Resume not found.";
pub const EDITOR_LOAD_FAILED: &str = "Failed to load the resume.";
pub const EDITOR_SAVE_FAILED: &str = "Failed to save changes.";
pub const EDITOR_HISTORY_SAVE_FAILED: &str = "Failed to save history.";

pub const STATUS_SAVING: &str = "Saving...";
pub const STATUS_SAVED: &str = "Saved";
pub const STATUS_SAVE_FAILED: &str = "Save failed";
pub const STATUS_RESTORING: &str = "Restoring...";
pub const STATUS_RESTORED: &str = "Version restored";

pub const AI_JOB_DESCRIPTION_REQUIRED: &str = "Please paste the job description first.";
pub const AI_EMPTY_SUGGESTION: &str = "No suggestion was received.";
pub const AI_FAILED: &str = "An error occurred while generating the suggestion.";

pub const PDF_QUOTA_EXCEEDED: &str =
    "You have reached the free export limit. Upgrade to export without limits.";
pub const PDF_FAILED: &str = "An error occurred while exporting the PDF.";
pub const PDF_FALLBACK_TITLE: &str = "resume";

pub const HISTORY_LOAD_FAILED: &str = "Failed to load history.";
pub const HISTORY_RESTORE_FAILED: &str = "Failed to restore version.";

pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";
