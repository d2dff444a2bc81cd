//! Flowtrigger CLI: the `flowtrigger` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    support::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Trigger {
            job_id,
            notebook_params,
            python_params,
            jar_params,
            pipeline_params,
            sql_params,
            dbt_commands,
            idempotency_token,
            dry_run,
            wait,
            poll_interval,
            max_wait,
            json,
        } => commands::trigger::run(
            commands::trigger::Args {
                job_id,
                notebook_params,
                python_params,
                jar_params,
                pipeline_params,
                sql_params,
                dbt_commands,
                idempotency_token,
                dry_run,
                wait,
                poll_interval,
                max_wait,
                json,
            },
            &cli.workspace,
        ),

        Commands::Status { run_id, json } => commands::status::run(run_id, json, &cli.workspace),

        Commands::Monitor {
            run_id,
            poll_interval,
            max_wait,
            json,
        } => commands::monitor::run(run_id, poll_interval, max_wait, json, &cli.workspace),
    }
}
