/// Auth view: login and registration forms.
///
/// The two modes are mutually exclusive. Switching modes by user action
/// clears the in-progress credentials so nothing leaks across forms.
use std::fmt;

use super::Notice;
use crate::api::{Credentials, Gateway};
use crate::session::SessionContext;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Login,
    Registration,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => write!(f, "Login"),
            Self::Registration => write!(f, "Registration"),
        }
    }
}

#[derive(Debug, Default)]
pub struct AuthView {
    mode: AuthMode,
    credentials: Credentials,
}

impl AuthView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Explicit mode selection; always clears the form.
    pub fn switch_mode(&mut self, mode: AuthMode) {
        self.credentials = Credentials::default();
        self.mode = mode;
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.credentials.email = email.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.credentials.password = password.into();
    }

    /// Submit is enabled only when both fields are filled.
    pub fn can_submit(&self) -> bool {
        self.credentials.is_complete()
    }

    /// Submit the form in the current mode.
    ///
    /// Returns `None` when submit is disabled. A successful login has
    /// already persisted the token into `session` when this returns. A
    /// successful registration switches back to Login mode with the entered
    /// credentials kept, but does not authenticate.
    pub fn submit(&mut self, gateway: &impl Gateway, session: &mut SessionContext) -> Option<Notice> {
        if !self.can_submit() {
            return None;
        }

        Some(match self.mode {
            AuthMode::Login => match gateway.login(session, &self.credentials) {
                Ok(_) => {
                    self.credentials = Credentials::default();
                    Notice::success("Logged in")
                }
                Err(e) => Notice::error(e.message()),
            },
            AuthMode::Registration => match gateway.register(session, &self.credentials) {
                Ok(_) => {
                    self.mode = AuthMode::Login;
                    Notice::success("Registered, you can log in now")
                }
                Err(e) => Notice::error(e.message()),
            },
        })
    }
}
