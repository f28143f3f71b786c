//! Registration client: configuration, the HTTP call against the users router
//! and the signup form flow that drives it.
//!
//! The flow never talks to a terminal or a browser directly. Navigation and
//! the logged-in flag are injected, so the same flow runs under the `signup`
//! CLI action and in tests.

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod signup;

pub use api::{ApiClient, RegistrationApi, RegistrationRequest, RegistrationResponse};
pub use auth::AuthSignal;
pub use config::ClientConfig;
pub use errors::AppError;
pub use signup::{Navigator, Phase, SignupForm, SignupPage, SignupState};
