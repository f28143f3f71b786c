use crate::client::{ApiClient, AuthSignal, ClientConfig, Navigator, SignupForm, SignupPage};
use anyhow::{anyhow, Result};
use std::sync::Mutex;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub form: SignupForm,
    pub config: ClientConfig,
}

/// Remembers the last navigation target instead of switching views.
#[derive(Default)]
struct TerminalNavigator {
    target: Mutex<Option<String>>,
}

impl TerminalNavigator {
    fn target(&self) -> Option<String> {
        self.target.lock().ok().and_then(|target| target.clone())
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, path: &str) {
        info!("navigate to {path}");
        if let Ok(mut target) = self.target.lock() {
            *target = Some(path.to_string());
        }
    }
}

impl Navigator for &TerminalNavigator {
    fn navigate(&self, path: &str) {
        (**self).navigate(path);
    }
}

/// Execute the signup action.
/// # Errors
/// Returns an error if the registration is rejected or cannot be sent.
pub async fn execute(args: Args) -> Result<()> {
    info!("Registering against {}", args.config.api_base_url);

    let api = ApiClient::new(args.config)?;
    let navigator = TerminalNavigator::default();
    let mut page = SignupPage::new(api, &navigator, AuthSignal::logged_out());

    page.render();

    let state = page.submit(&args.form).await.clone();

    if let Some(error) = state.error {
        return Err(anyhow!(error));
    }

    match navigator.target() {
        Some(target) => {
            println!("Registration successful, continue at {target}");
            Ok(())
        }
        None => Err(anyhow!("Registration finished without a result")),
    }
}
