//! Login / signup form.

use tracing::error;

use crate::messages;
use crate::models::user::Credentials;
use crate::routes::{ActionOutcome, Route};
use crate::session::SessionClient;

/// Minimum password length the backend accepts by default.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Signup,
}

impl AuthMode {
    /// The screen linked from under the form ("no account yet?" and back).
    pub fn other_route(self) -> Route {
        match self {
            AuthMode::Login => Route::Signup,
            AuthMode::Signup => Route::Login,
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            AuthMode::Login => messages::AUTH_LOGIN_FAILED,
            AuthMode::Signup => messages::AUTH_SIGNUP_FAILED,
        }
    }
}

/// One form shared by both modes.
///
/// `submit` borrows the form mutably for its whole duration, so a second
/// submit cannot start while one is outstanding.
pub struct AuthForm {
    client: SessionClient,
    mode: AuthMode,
    pub email: String,
    pub password: String,
    error: Option<String>,
}

impl AuthForm {
    pub fn new(client: SessionClient, mode: AuthMode) -> Self {
        Self {
            client,
            mode,
            email: String::new(),
            password: String::new(),
            error: None,
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The checks an `<input type="email" required>` and
    /// `<input type="password" minlength="6" required>` pair would apply.
    fn check_inputs(&self) -> Result<(), &'static str> {
        let email = self.email.trim();
        let well_formed = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
        if !well_formed {
            return Err(messages::AUTH_EMAIL_REQUIRED);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(messages::AUTH_PASSWORD_TOO_SHORT);
        }
        Ok(())
    }

    pub async fn submit(&mut self) -> ActionOutcome {
        self.error = None;
        if let Err(message) = self.check_inputs() {
            self.error = Some(message.to_string());
            return ActionOutcome::Failed;
        }

        let credentials = Credentials::new(self.email.trim(), self.password.as_str());
        let result = match self.mode {
            AuthMode::Login => self.client.sign_in(&credentials).await.map(|_| ()),
            AuthMode::Signup => self.client.sign_up(&credentials).await.map(|_| ()),
        };

        match result {
            Ok(()) => ActionOutcome::Navigate(Route::Dashboard),
            Err(e) => {
                error!("Error during {:?}: {e}", self.mode);
                self.error = Some(e.user_message(self.mode.failure_message()));
                ActionOutcome::Failed
            }
        }
    }
}
