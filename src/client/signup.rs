//! Signup form flow. Validates the two password fields locally, posts the
//! registration and turns the outcome into `SignupState` plus a navigation
//! request. Each `submit` is one full Idle/Submitting/terminal cycle.

use super::{
    api::{RegistrationApi, RegistrationRequest},
    auth::AuthSignal,
    errors::AppError,
};
use tracing::{debug, info, warn};

pub const PASSWORD_MISMATCH: &str = "Passwords do not match.";
pub const BACKEND_NOT_FOUND: &str = "Connection Error: Backend URL not found.";
pub const SIGNUP_FAILED: &str = "An error occurred during signup.";

pub const LOGIN_ROUTE: &str = "/login";
pub const PROFILE_ROUTE: &str = "/profile";

const CREATED: u16 = 201;

/// Receives navigation requests from client flows.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl std::fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignupState {
    pub phase: Phase,
    pub loading: bool,
    pub error: Option<String>,
}

impl SignupState {
    fn submitting() -> Self {
        Self {
            phase: Phase::Submitting,
            loading: true,
            error: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            phase: Phase::Failed,
            loading: false,
            error: Some(message.into()),
        }
    }

    fn succeeded() -> Self {
        Self {
            phase: Phase::Succeeded,
            loading: false,
            error: None,
        }
    }
}

pub struct SignupPage<A, N> {
    api: A,
    navigator: N,
    auth: AuthSignal,
    state: SignupState,
}

impl<A: RegistrationApi, N: Navigator> SignupPage<A, N> {
    pub fn new(api: A, navigator: N, auth: AuthSignal) -> Self {
        Self {
            api,
            navigator,
            auth,
            state: SignupState::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &SignupState {
        &self.state
    }

    /// Redirects to the profile page when already logged in. Returns whether
    /// a redirect happened.
    pub fn render(&self) -> bool {
        if self.auth.is_logged_in() {
            debug!("already logged in, redirecting to {PROFILE_ROUTE}");
            self.navigator.navigate(PROFILE_ROUTE);
            return true;
        }
        false
    }

    /// Runs one submission and returns the final state.
    pub async fn submit(&mut self, form: &SignupForm) -> &SignupState {
        self.state = SignupState::submitting();

        if form.password != form.confirm_password {
            self.state = SignupState::failed(PASSWORD_MISMATCH);
            return &self.state;
        }

        let request = RegistrationRequest {
            name: form.username.clone(),
            email: form.email.clone(),
            password: form.password.clone(),
        };

        self.state = match self.api.register(&request).await {
            Ok(response) if response.status == CREATED => {
                info!("registration accepted");
                self.navigator.navigate(LOGIN_ROUTE);
                SignupState::succeeded()
            }
            Ok(response) => {
                warn!(status = response.status, "unexpected registration status");
                SignupState::failed(
                    response
                        .message
                        .filter(|message| !message.is_empty())
                        .unwrap_or_else(|| SIGNUP_FAILED.to_string()),
                )
            }
            Err(err) => {
                warn!("registration failed: {err}");
                SignupState::failed(error_message(&err))
            }
        };

        &self.state
    }
}

/// Server message first, then the missing-backend hint for 404s, then the
/// generic failure.
#[must_use]
pub fn error_message(err: &AppError) -> String {
    if let Some(message) = err.server_message().filter(|message| !message.is_empty()) {
        return message.to_string();
    }

    if err.to_string().contains("404") {
        BACKEND_NOT_FOUND.to_string()
    } else {
        SIGNUP_FAILED.to_string()
    }
}
