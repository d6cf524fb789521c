use std::sync::Arc;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use emojify_traffic::config::{parse_duration, AppConfig, Overrides};
use emojify_traffic::load::LoadTest;
use emojify_traffic::shutdown::wait_for_shutdown;
use emojify_traffic::workflow::WorkflowRunner;

#[derive(Parser)]
#[command(name = "emojify-traffic", version, about = "Load generator for the emojify application")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Base URI of the application under test
    #[arg(long, env = "BASE_URI")]
    base_uri: Option<String>,

    /// Number of concurrent virtual users
    #[arg(short, long, env = "USERS")]
    users: Option<u64>,

    /// Test duration, e.g. `30m` or `90` (seconds)
    #[arg(short, long, env = "DURATION", value_parser = parse_duration)]
    duration: Option<Duration>,

    /// Timeout for a single iteration, e.g. `60s`
    #[arg(short, long, env = "TIMEOUT", value_parser = parse_duration)]
    timeout: Option<Duration>,

    /// Show a progress bar while the test runs
    #[arg(long, env = "SHOW_PROGRESS", value_parser = BoolishValueParser::new())]
    show_progress: Option<bool>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Run a single iteration and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let overrides = Overrides {
        base_uri: cli.base_uri,
        users: cli.users,
        duration_secs: cli.duration.map(|d| d.as_secs()),
        timeout_secs: cli.timeout.map(|d| d.as_secs()),
        show_progress: cli.show_progress,
    };
    let config = AppConfig::load(cli.config.as_deref(), &overrides)?;

    tracing::info!(base_uri = %config.target.base_uri, "Benchmarking application");

    let runner = Arc::new(WorkflowRunner::from_config(&config)?);

    if cli.once {
        let timeout = config.load.iteration_timeout();
        return match tokio::time::timeout(timeout, runner.run()).await {
            Ok(outcome) => {
                outcome.into_result()?;
                tracing::info!("Iteration succeeded");
                Ok(())
            }
            Err(_) => anyhow::bail!("Iteration timed out after {timeout:?}"),
        };
    }

    let summary = LoadTest::new(Arc::clone(&runner), config.load.clone())
        .run(wait_for_shutdown())
        .await;

    print!("{}", summary.render_table());
    summary.save(&config.output).await?;

    tracing::info!(
        table = %config.output.table_path.display(),
        errors = %config.output.error_log_path.display(),
        "Reports written"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_accepts_unit_suffixed_durations() {
        let cli = Cli::try_parse_from([
            "emojify-traffic",
            "--base-uri",
            "http://localhost:8080",
            "--duration",
            "30m",
            "--timeout",
            "60s",
            "--show-progress",
            "false",
        ])
        .unwrap();

        assert_eq!(cli.base_uri.as_deref(), Some("http://localhost:8080"));
        assert_eq!(cli.duration, Some(Duration::from_secs(1800)));
        assert_eq!(cli.timeout, Some(Duration::from_secs(60)));
        assert_eq!(cli.show_progress, Some(false));
    }

    #[test]
    fn test_cli_rejects_bad_duration() {
        assert!(Cli::try_parse_from(["emojify-traffic", "--duration", "soon"]).is_err());
    }
}
