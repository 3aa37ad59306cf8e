use std::fmt;

use uuid::Uuid;

/// Screens the client can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Signup,
    Dashboard,
    Editor(Uuid),
    Payment,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/auth/login".to_string(),
            Route::Signup => "/auth/signup".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::Editor(id) => format!("/editor/{id}"),
            Route::Payment => "/payment".to_string(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Result of a user-triggered workflow.
///
/// Failures are never returned as `Err`: the workflow has already written a
/// scoped error string into its view state, and `Failed` only tells the caller
/// to stay where it is.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum ActionOutcome<T = ()> {
    Done(T),
    Navigate(Route),
    Failed,
    /// The same action is still outstanding; nothing was sent.
    Busy,
    /// The user declined the confirmation prompt.
    Cancelled,
}

impl<T> ActionOutcome<T> {
    pub fn navigation(&self) -> Option<Route> {
        match self {
            ActionOutcome::Navigate(route) => Some(*route),
            _ => None,
        }
    }

    pub fn done(self) -> Option<T> {
        match self {
            ActionOutcome::Done(value) => Some(value),
            _ => None,
        }
    }
}
