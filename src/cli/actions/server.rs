use crate::{api, store::PgStore, GIT_COMMIT_HASH};
use anyhow::{anyhow, Context, Result};
use axum::http::HeaderValue;
use std::{fmt, str::FromStr, sync::Arc};
use tracing::info;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(anyhow!("unknown environment: {other}")),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    /// Exact CORS origin; `None` mirrors the request origin (development only).
    pub origin: Option<HeaderValue>,
    pub dsn: String,
    pub environment: Environment,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable, the schema cannot be
/// applied, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let store = PgStore::connect(&args.dsn).await?;
    store
        .migrate()
        .await
        .context("Failed to apply database schema")?;

    info!("Connected to database");

    api::new(args.port, Arc::new(store), args.origin).await
}

fn log_startup_args(args: &Args) {
    let origin = args
        .origin
        .as_ref()
        .and_then(|origin| origin.to_str().ok())
        .unwrap_or("any (mirrored)");

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = short_commit(GIT_COMMIT_HASH),
        port = args.port,
        dsn = %redact_dsn(&args.dsn),
        origin,
        environment = %args.environment,
        "Startup configuration"
    );
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-dsn".to_string(),
    }
}

fn short_commit(hash: &str) -> &str {
    let trimmed = hash.trim();
    trimmed.get(..7).unwrap_or(trimmed)
}
