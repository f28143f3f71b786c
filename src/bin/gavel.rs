use anyhow::Result;
use gavel::cli;

// Main function
#[tokio::main]
async fn main() -> Result<()> {
    let action = cli::start()?;

    let result = action.execute().await;

    cli::telemetry::shutdown_tracer();

    result
}
