use serde_json::{Value, json};
use std::ffi::OsStr;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Command, Output};
use std::thread::{self, JoinHandle};

fn flowtrigger_command<I, S>(args: I) -> Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(env!("CARGO_BIN_EXE_flowtrigger"));
    command
        .args(args)
        .env_remove("DATABRICKS_HOST")
        .env_remove("DATABRICKS_TOKEN")
        .env_remove("RUST_LOG");
    command
}

fn run_flowtrigger<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    flowtrigger_command(args)
        .output()
        .expect("flowtrigger command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout should be JSON ({e})\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        )
    })
}

/// Minimal HTTP/1.1 server answering one scripted response per connection
/// and recording each request line.
struct ScriptedServer {
    host: String,
    handle: JoinHandle<Vec<String>>,
}

impl ScriptedServer {
    fn start(responses: Vec<(u16, Value)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind scripted server");
        let addr = listener.local_addr().expect("local addr");
        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().expect("accept connection");
                seen.push(read_request_line(&mut stream));
                let body = body.to_string();
                let response = format!(
                    "HTTP/1.1 {status} Scripted\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream
                    .write_all(response.as_bytes())
                    .expect("write response");
            }
            seen
        });
        Self {
            host: format!("http://{addr}"),
            handle,
        }
    }

    fn finish(self) -> Vec<String> {
        self.handle.join().expect("server thread should not panic")
    }
}

fn read_request_line(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).expect("read request");
        assert!(n > 0, "connection closed before headers were complete");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break end;
        }
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + 4 + content_length {
        let n = stream.read(&mut chunk).expect("read body");
        assert!(n > 0, "connection closed before body was complete");
        buf.extend_from_slice(&chunk[..n]);
    }
    head.lines().next().unwrap_or_default().to_string()
}

fn run_body(run_id: u64, life_cycle_state: &str, result_state: Option<&str>) -> Value {
    let mut state = json!({ "life_cycle_state": life_cycle_state, "state_message": "" });
    if let Some(result_state) = result_state {
        state["result_state"] = json!(result_state);
    }
    json!({
        "run_id": run_id,
        "job_id": 123,
        "number_in_job": 4,
        "state": state,
        "run_page_url": format!("https://workspace.example.test/#job/123/run/{run_id}"),
        "start_time": 1700000000000i64
    })
}

#[test]
fn help_lists_subcommands() {
    let output = run_flowtrigger(["--help"]);
    assert_success(&output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["trigger", "status", "monitor"] {
        assert!(stdout.contains(command), "help should mention {command}");
    }
}

#[test]
fn dry_run_prints_request_body_without_configuration() {
    let output = run_flowtrigger([
        "trigger",
        "--job-id",
        " 123 ",
        "--params",
        r#"{"env":"dev"}"#,
        "--jar-params",
        r#"["a", "b"]"#,
        "--python-params",
        "",
        "--idempotency-token",
        "nightly-2024-01-01",
        "--dry-run",
        "--json",
    ]);
    assert_success(&output);
    assert_eq!(
        stdout_json(&output),
        json!({
            "dry_run": true,
            "request": {
                "job_id": 123,
                "notebook_params": {"env": "dev"},
                "jar_params": ["a", "b"],
                "idempotency_token": "nightly-2024-01-01"
            }
        })
    );
}

#[test]
fn invalid_job_id_is_reported_as_structured_failure() {
    let output = run_flowtrigger(["trigger", "--job-id", "abc", "--json"]);
    assert_success(&output);
    let value = stdout_json(&output);
    assert_eq!(value["success"], false);
    assert_eq!(value["job_id"], "abc");
    assert_eq!(value["error_type"], "InvalidJobIdError");
    assert!(value.get("run_id").is_none());
}

#[test]
fn wrong_parameter_shape_is_reported_before_any_request() {
    let output = run_flowtrigger([
        "trigger",
        "--job-id",
        "123",
        "--notebook-params",
        r#"["not", "an", "object"]"#,
        "--json",
    ]);
    assert_success(&output);
    let value = stdout_json(&output);
    assert_eq!(value["success"], false);
    assert_eq!(value["error_type"], "InvalidParametersError");
    assert!(
        value["error"]
            .as_str()
            .expect("error text")
            .contains("notebook_params")
    );
}

#[test]
fn missing_host_is_a_configuration_error() {
    let output = run_flowtrigger(["trigger", "--job-id", "123"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: workspace host is not configured"));
}

#[test]
fn non_positive_poll_interval_is_rejected_before_contacting_backend() {
    let output = run_flowtrigger([
        "monitor",
        "555",
        "--poll-interval",
        "0",
        "--host",
        "http://127.0.0.1:9",
    ]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("poll_interval must be positive"));
}

#[test]
fn trigger_reports_backend_rejection_with_error_code() {
    let server = ScriptedServer::start(vec![(
        400,
        json!({"error_code": "INVALID_PARAMETER_VALUE", "message": "Job 42 does not exist."}),
    )]);
    let output = run_flowtrigger([
        "trigger",
        "--job-id",
        "42",
        "--host",
        server.host.as_str(),
        "--json",
    ]);
    assert_success(&output);
    let value = stdout_json(&output);
    assert_eq!(value["success"], false);
    assert_eq!(value["error_type"], "INVALID_PARAMETER_VALUE");
    assert_eq!(value["raw_error"]["message"], "Job 42 does not exist.");
    assert_eq!(server.finish(), vec!["POST /api/2.1/jobs/run-now HTTP/1.1"]);
}

#[test]
fn trigger_and_wait_follows_run_to_terminal_state() {
    let server = ScriptedServer::start(vec![
        (200, json!({"run_id": 555, "number_in_job": 4})),
        (200, run_body(555, "PENDING", None)),
        (200, run_body(555, "RUNNING", None)),
        (200, run_body(555, "TERMINATED", Some("SUCCESS"))),
    ]);
    let output = run_flowtrigger([
        "trigger",
        "--job-id",
        "123",
        "--host",
        server.host.as_str(),
        "--token",
        "dapi-test",
        "--wait",
        "--poll-interval",
        "1",
        "--max-wait",
        "30",
        "--json",
    ]);
    assert_success(&output);
    let value = stdout_json(&output);
    assert_eq!(value["trigger"]["success"], true);
    assert_eq!(value["trigger"]["run_id"], 555);
    assert_eq!(value["trigger"]["state"]["life_cycle_state"], "PENDING");
    assert_eq!(value["monitor"]["outcome"], "terminal");
    assert_eq!(value["monitor"]["polls"], 2);
    assert_eq!(value["monitor"]["state"]["result_state"], "SUCCESS");

    let requests = server.finish();
    assert_eq!(requests.len(), 4);
    assert_eq!(
        requests[3],
        "GET /api/2.1/jobs/runs/get?run_id=555 HTTP/1.1"
    );
}

#[test]
fn status_prints_single_query_result() {
    let server = ScriptedServer::start(vec![(200, run_body(777, "RUNNING", None))]);
    let output = run_flowtrigger(["status", "777", "--host", server.host.as_str(), "--json"]);
    assert_success(&output);
    assert_eq!(
        stdout_json(&output),
        json!({
            "success": true,
            "run_id": 777,
            "state": {"life_cycle_state": "RUNNING", "state_message": null},
            "run_page_url": "https://workspace.example.test/#job/123/run/777"
        })
    );
    server.finish();
}

#[test]
fn status_text_output_names_the_state() {
    let server = ScriptedServer::start(vec![(
        200,
        run_body(777, "TERMINATED", Some("FAILED")),
    )]);
    let output = run_flowtrigger(["status", "777", "--host", server.host.as_str()]);
    assert_success(&output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("flowtrigger status 777"));
    assert!(stdout.contains("life cycle state: TERMINATED"));
    assert!(stdout.contains("result state: FAILED"));
    server.finish();
}

#[test]
fn monitor_query_failure_exits_non_zero() {
    let server = ScriptedServer::start(vec![(
        404,
        json!({"error_code": "RESOURCE_DOES_NOT_EXIST", "message": "Run 9 does not exist."}),
    )]);
    let output = run_flowtrigger(["monitor", "9", "--host", server.host.as_str(), "--json"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("status query for run 9 failed"));
    assert!(stderr.contains("RESOURCE_DOES_NOT_EXIST"));
    server.finish();
}

#[test]
fn host_and_token_are_read_from_the_environment() {
    let server = ScriptedServer::start(vec![(200, run_body(778, "PENDING", None))]);
    let output = flowtrigger_command(["status", "778", "--json"])
        .env("DATABRICKS_HOST", &server.host)
        .env("DATABRICKS_TOKEN", "dapi-from-env")
        .output()
        .expect("flowtrigger command should execute");
    assert_success(&output);
    assert_eq!(stdout_json(&output)["state"]["life_cycle_state"], "PENDING");
    assert_eq!(
        server.finish(),
        vec!["GET /api/2.1/jobs/runs/get?run_id=778 HTTP/1.1"]
    );
}
