use crate::cli::WorkspaceArgs;
use crate::support::{backend_or_exit, print_json, print_status_block};
use flowtrigger_core::{Poller, RunId, StatusReport};

pub fn run(run_id: u64, json: bool, workspace: &WorkspaceArgs) {
    let run_id = RunId::new(run_id);
    let backend = backend_or_exit(workspace);
    let report = StatusReport::from_result(run_id, Poller::new(&backend).status(run_id));

    if json {
        print_json(&report);
        return;
    }

    match &report {
        StatusReport::Ok(status) => {
            println!("flowtrigger status {run_id}");
            println!();
            print_status_block(status);
        }
        StatusReport::Failed {
            error_type, error, ..
        } => {
            println!("Failed to get status of run {run_id}");
            println!();
            println!("  error type: {error_type}");
            println!("  error: {error}");
        }
    }
}
