//! Build-time API base URL with an optional runtime override. The build value
//! comes from `GAVEL_API_BASE_URL`; at runtime `API_BASE_URL` wins when it is
//! set to something non-blank. Configuration values are public; do not store
//! secrets here.

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

/// Client configuration resolved once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
}

impl ClientConfig {
    /// Loads the build-time base URL and applies runtime overrides.
    #[must_use]
    pub fn load() -> Self {
        let api_base_url = option_env!("GAVEL_API_BASE_URL")
            .and_then(normalize_runtime_value)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let mut config = Self { api_base_url };
        apply_runtime_overrides(&mut config, runtime_config());
        config
    }

    #[must_use]
    pub fn with_base_url(api_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.trim().to_string(),
        }
    }

    /// Joins `path` onto the base URL.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        build_url_with_base(&self.api_base_url, path)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_API_BASE_URL)
    }
}

#[derive(Default)]
struct RuntimeConfig {
    api_base_url: Option<String>,
}

fn runtime_config() -> RuntimeConfig {
    RuntimeConfig {
        api_base_url: std::env::var("API_BASE_URL")
            .ok()
            .as_deref()
            .and_then(normalize_runtime_value),
    }
}

fn apply_runtime_overrides(config: &mut ClientConfig, runtime: RuntimeConfig) {
    if let Some(value) = runtime.api_base_url {
        config.api_base_url = value;
    }
}

fn normalize_runtime_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub(crate) fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}
