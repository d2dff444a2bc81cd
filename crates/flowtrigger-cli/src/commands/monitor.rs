use crate::cli::WorkspaceArgs;
use crate::support::{
    backend_or_exit, exit_with_error, poll_config_or_exit, print_json, print_status_block,
};
use flowtrigger_core::{MonitorReport, Poller, RunId};

pub fn run(run_id: u64, poll_interval: i64, max_wait: i64, json: bool, workspace: &WorkspaceArgs) {
    let config = poll_config_or_exit(poll_interval, max_wait);
    let backend = backend_or_exit(workspace);

    let outcome = Poller::new(&backend)
        .monitor_with(RunId::new(run_id), config)
        .unwrap_or_else(|e| exit_with_error(e));
    let report = MonitorReport::from(outcome);

    if json {
        print_json(&report);
    } else {
        render_text(&report);
    }
}

pub fn render_text(report: &MonitorReport) {
    println!("{}", report.message());
    println!();
    println!("  outcome: {}", report.outcome_name());
    println!("  polls: {}", report.outcome.polls());
    print_status_block(report.outcome.status());
}
