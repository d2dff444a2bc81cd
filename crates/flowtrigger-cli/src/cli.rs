use clap::{Args, Parser, Subcommand};
use flowtrigger_core::{DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL};
use flowtrigger_http::{HOST_ENV, TOKEN_ENV};
use std::path::PathBuf;

const DEFAULT_POLL_INTERVAL_SECS: i64 = DEFAULT_POLL_INTERVAL.as_secs() as i64;
const DEFAULT_MAX_WAIT_SECS: i64 = DEFAULT_MAX_WAIT.as_secs() as i64;

#[derive(Parser)]
#[command(
    name = "flowtrigger",
    about = "Flowtrigger: start remote workflow jobs and follow their runs to completion",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub workspace: WorkspaceArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection settings shared by every subcommand.
#[derive(Args, Clone, Default)]
pub struct WorkspaceArgs {
    /// Workspace host URL (scheme optional)
    #[arg(long, env = HOST_ENV, global = true)]
    pub host: Option<String>,

    /// Personal access token
    #[arg(long, env = TOKEN_ENV, hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// TOML config file with a [workspace] section
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Per-request HTTP timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a run of an existing job
    Trigger {
        /// Numeric job identifier
        #[arg(long)]
        job_id: String,

        /// Notebook task parameters as a JSON object
        #[arg(long, visible_alias = "params")]
        notebook_params: Option<String>,

        /// Python task parameters as a JSON array
        #[arg(long)]
        python_params: Option<String>,

        /// JAR task parameters as a JSON array
        #[arg(long)]
        jar_params: Option<String>,

        /// Pipeline task parameters as a JSON object
        #[arg(long)]
        pipeline_params: Option<String>,

        /// SQL task parameters as a JSON object
        #[arg(long)]
        sql_params: Option<String>,

        /// dbt commands as a JSON array
        #[arg(long)]
        dbt_commands: Option<String>,

        /// Caller-chosen token that deduplicates repeated start requests
        #[arg(long)]
        idempotency_token: Option<String>,

        /// Print the request body without contacting the workspace
        #[arg(long)]
        dry_run: bool,

        /// Follow the started run until it finishes or the budget runs out
        #[arg(long)]
        wait: bool,

        /// Seconds between status queries when waiting
        #[arg(
            long,
            default_value_t = DEFAULT_POLL_INTERVAL_SECS,
            allow_negative_numbers = true
        )]
        poll_interval: i64,

        /// Total seconds to wait before giving up
        #[arg(
            long,
            default_value_t = DEFAULT_MAX_WAIT_SECS,
            allow_negative_numbers = true
        )]
        max_wait: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Query the current state of a run once
    Status {
        /// Run identifier
        run_id: u64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Poll a run until it finishes or the budget runs out
    Monitor {
        /// Run identifier
        run_id: u64,

        /// Seconds between status queries
        #[arg(
            long,
            default_value_t = DEFAULT_POLL_INTERVAL_SECS,
            allow_negative_numbers = true
        )]
        poll_interval: i64,

        /// Total seconds to wait before giving up
        #[arg(
            long,
            default_value_t = DEFAULT_MAX_WAIT_SECS,
            allow_negative_numbers = true
        )]
        max_wait: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
