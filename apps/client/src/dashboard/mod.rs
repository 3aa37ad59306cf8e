//! The signed-in user's resume list.

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::ClientError;
use crate::messages;
use crate::models::resume::ResumeSummary;
use crate::routes::{ActionOutcome, Route};
use crate::session::SessionClient;

pub struct Dashboard {
    client: SessionClient,
    email: Option<String>,
    resumes: Vec<ResumeSummary>,
    error: Option<String>,
}

impl Dashboard {
    pub fn new(client: SessionClient) -> Self {
        Self {
            client,
            email: None,
            resumes: Vec::new(),
            error: None,
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Most recently updated first.
    pub fn resumes(&self) -> &[ResumeSummary] {
        &self.resumes
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn fail<T>(&mut self, e: ClientError, fallback: &str) -> ActionOutcome<T> {
        if let Some(Route::Login) = e.redirect() {
            return ActionOutcome::Navigate(Route::Login);
        }
        self.error = Some(e.user_message(fallback));
        ActionOutcome::Failed
    }

    /// Checks the session, then loads the list. Without a session nothing is fetched.
    pub async fn mount(&mut self) -> ActionOutcome {
        let user = match self.client.user().await {
            Ok(user) => user,
            Err(_) => return ActionOutcome::Navigate(Route::Login),
        };
        self.email = user.email;
        self.error = None;

        let result = self.client.list_resumes().await;

        match result {
            Ok(resumes) => {
                info!("Loaded {} resumes", resumes.len());
                self.resumes = resumes;
                ActionOutcome::Done(())
            }
            Err(e) => {
                error!("Error fetching resumes: {e}");
                self.fail(e, messages::DASHBOARD_LOAD_FAILED)
            }
        }
    }

    /// Inserts an empty resume and opens it.
    pub async fn create_new(&mut self) -> ActionOutcome {
        self.error = None;
        match self.client.create_resume(messages::DEFAULT_RESUME_TITLE).await {
            Ok(id) => {
                info!("Created resume {id}");
                ActionOutcome::Navigate(Route::Editor(id))
            }
            Err(e) => {
                error!("Error creating resume: {e}");
                self.fail(e, messages::DASHBOARD_CREATE_FAILED)
            }
        }
    }

    /// Deletes after the user confirmed. Only the matching entry leaves the list.
    pub async fn delete(&mut self, id: Uuid, confirmed: bool) -> ActionOutcome {
        if !confirmed {
            return ActionOutcome::Cancelled;
        }
        self.error = None;
        match self.client.delete_resume(id).await {
            Ok(()) => {
                info!("Deleted resume {id}");
                self.resumes.retain(|resume| resume.id != id);
                ActionOutcome::Done(())
            }
            Err(e) => {
                error!("Error deleting resume {id}: {e}");
                self.fail(e, messages::DASHBOARD_DELETE_FAILED)
            }
        }
    }

    pub async fn sign_out(&mut self) -> ActionOutcome {
        if let Err(e) = self.client.sign_out().await {
            warn!("Sign-out call failed: {e}");
        }
        self.email = None;
        self.resumes.clear();
        ActionOutcome::Navigate(Route::Login)
    }
}
