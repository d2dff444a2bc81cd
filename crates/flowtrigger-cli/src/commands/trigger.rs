use crate::cli::WorkspaceArgs;
use crate::commands::monitor;
use crate::support::{
    backend_or_exit, exit_with_error, format_epoch_millis, poll_config_or_exit, print_json,
};
use flowtrigger_core::{
    MonitorReport, Poller, RunNowRequest, TaskKind, TriggerClient, TriggerRequest, TriggerResult,
};
use serde::Serialize;

pub struct Args {
    pub job_id: String,
    pub notebook_params: Option<String>,
    pub python_params: Option<String>,
    pub jar_params: Option<String>,
    pub pipeline_params: Option<String>,
    pub sql_params: Option<String>,
    pub dbt_commands: Option<String>,
    pub idempotency_token: Option<String>,
    pub dry_run: bool,
    pub wait: bool,
    pub poll_interval: i64,
    pub max_wait: i64,
    pub json: bool,
}

impl Args {
    fn payloads(&self) -> [(TaskKind, Option<&String>); 6] {
        [
            (TaskKind::Notebook, self.notebook_params.as_ref()),
            (TaskKind::Python, self.python_params.as_ref()),
            (TaskKind::Jar, self.jar_params.as_ref()),
            (TaskKind::Pipeline, self.pipeline_params.as_ref()),
            (TaskKind::Sql, self.sql_params.as_ref()),
            (TaskKind::Dbt, self.dbt_commands.as_ref()),
        ]
    }
}

#[derive(Serialize)]
struct DryRunView<'a> {
    dry_run: bool,
    request: &'a RunNowRequest,
}

#[derive(Serialize)]
struct WaitView<'a> {
    trigger: &'a TriggerResult,
    monitor: &'a MonitorReport,
}

pub fn build_request(args: &Args) -> TriggerRequest {
    let mut request = TriggerRequest::new(args.job_id.clone());
    for (kind, payload) in args.payloads() {
        if let Some(text) = payload {
            request = request.with_parameter(kind, text.clone());
        }
    }
    if let Some(token) = &args.idempotency_token {
        request = request.with_idempotency_token(token.clone());
    }
    request
}

pub fn run(args: Args, workspace: &WorkspaceArgs) {
    let poll_config = args
        .wait
        .then(|| poll_config_or_exit(args.poll_interval, args.max_wait));
    let request = build_request(&args);

    let prepared = match request.prepare() {
        Ok(prepared) => prepared,
        Err(err) => {
            render_result(&TriggerResult::from_error(&request.job_id, &err), args.json);
            return;
        }
    };

    if args.dry_run {
        render_dry_run(&prepared, args.json);
        return;
    }

    let backend = backend_or_exit(workspace);
    let result = TriggerClient::new(&backend).submit(&prepared);

    let (Some(config), TriggerResult::Success(success)) = (poll_config, &result) else {
        render_result(&result, args.json);
        return;
    };

    let outcome = Poller::new(&backend)
        .monitor_with(success.run_id, config)
        .unwrap_or_else(|e| exit_with_error(e));
    let report = MonitorReport::from(outcome);

    if args.json {
        print_json(&WaitView {
            trigger: &result,
            monitor: &report,
        });
    } else {
        render_text(&result);
        println!();
        monitor::render_text(&report);
    }
}

fn render_result(result: &TriggerResult, json: bool) {
    if json {
        print_json(result);
    } else {
        render_text(result);
    }
}

fn render_dry_run(request: &RunNowRequest, json: bool) {
    if json {
        print_json(&DryRunView {
            dry_run: true,
            request,
        });
        return;
    }
    println!("[DRY RUN] Would trigger job {} with:", request.job_id);
    print_json(request);
}

fn render_text(result: &TriggerResult) {
    println!("{}", result.summary());
    match result {
        TriggerResult::Success(success) => {
            println!();
            if let Some(number) = success.number_in_job {
                println!("  run number: {number}");
            }
            if let Some(state) = &success.life_cycle_state {
                println!("  life cycle state: {state}");
            }
            if let Some(message) = &success.state_message {
                println!("  state message: {message}");
            }
            if let Some(started) = success.start_time {
                println!("  started: {}", format_epoch_millis(started));
            }
            if let Some(url) = &success.run_page_url {
                println!("  run page: {url}");
            }
        }
        TriggerResult::Failure(failure) => {
            println!();
            println!("  error type: {}", failure.error_kind);
            if let Some(run_id) = failure.run_id {
                println!("  run id: {run_id}");
            }
        }
    }
}
