use crate::cli::WorkspaceArgs;
use chrono::{DateTime, SecondsFormat};
use flowtrigger_core::{PollConfig, RunStatus};
use flowtrigger_http::{ConfigOverrides, HttpJobsBackend, WorkspaceConfig};
use serde::Serialize;
use std::fmt::Display;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Diagnostics go to stderr so stdout stays parseable. Filtering comes from
/// `RUST_LOG` and defaults to `warn`.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
}

pub fn exit_with_error(err: impl Display) -> ! {
    eprintln!("error: {err}");
    std::process::exit(1);
}

pub fn workspace_config_or_exit(args: &WorkspaceArgs) -> WorkspaceConfig {
    let overrides = ConfigOverrides {
        host: args.host.clone(),
        token: args.token.clone(),
        timeout_secs: args.timeout_secs,
    };
    let config = WorkspaceConfig::load(args.config.as_deref(), overrides)
        .unwrap_or_else(|e| exit_with_error(e));
    tracing::debug!(
        host = %config.host,
        has_token = config.token.is_some(),
        timeout_secs = config.timeout.as_secs(),
        "resolved workspace config"
    );
    config
}

pub fn backend_or_exit(args: &WorkspaceArgs) -> HttpJobsBackend {
    HttpJobsBackend::new(workspace_config_or_exit(args)).unwrap_or_else(|e| exit_with_error(e))
}

pub fn poll_config_or_exit(poll_interval: i64, max_wait: i64) -> PollConfig {
    PollConfig::from_secs(poll_interval, max_wait).unwrap_or_else(|e| exit_with_error(e))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(rendered) => println!("{rendered}"),
        Err(e) => exit_with_error(format!("failed to render JSON output: {e}")),
    }
}

/// Render epoch milliseconds as RFC 3339, falling back to the raw number.
pub fn format_epoch_millis(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| millis.to_string())
}

pub fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

pub fn print_status_block(status: &RunStatus) {
    println!(
        "  life cycle state: {}",
        or_dash(status.life_cycle_state.as_ref().map(|s| s.as_str()))
    );
    println!(
        "  result state: {}",
        or_dash(status.result_state.as_ref().map(|s| s.as_str()))
    );
    if let Some(message) = &status.state_message {
        println!("  state message: {message}");
    }
    if let Some(url) = &status.run_page_url {
        println!("  run page: {url}");
    }
}
