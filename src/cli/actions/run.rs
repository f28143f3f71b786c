use crate::cli::actions::{server, signup, Action};
use anyhow::Result;

/// Execute the provided action.
// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Server(args) => server::execute(args).await,
        Action::Signup(args) => signup::execute(args).await,
    }
}
