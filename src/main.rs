use anyhow::Context;
use slack_archive::config::load_settings;
use slack_archive::site::Site;
use slack_archive::storage::HttpFetcher;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let settings = load_settings()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("slack_archive=info"));
    if settings.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_line_number(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_line_number(true)
            .init();
    }

    tracing::info!(
        input = ?settings.export.input_dir,
        output = ?settings.export.output_dir,
        concurrency = settings.export.concurrency,
        authenticated = settings.fetch.token.is_some(),
        "Starting Slack export rendering"
    );

    let fetcher = HttpFetcher::new(&settings.fetch).context("Failed to create HTTP client")?;

    let input_dir = settings.export.input_dir.clone();
    let site = Site::load(settings.export, fetcher)
        .await
        .with_context(|| format!("Failed to load workspace directory from {input_dir:?}"))?;

    let summary = site.build().await.context("Failed to write output")?;

    if summary.channels_failed > 0 {
        tracing::warn!(
            failed = summary.channels_failed,
            "Some channel pages could not be written, see errors above"
        );
    }

    Ok(())
}
