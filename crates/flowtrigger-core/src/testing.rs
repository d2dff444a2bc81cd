//! Test doubles shared by the unit tests in this crate.

use crate::backend::{JobsBackend, RunDetails, RunNowRequest, RunNowResponse, RunState};
use crate::cancel::CancelToken;
use crate::error::BackendError;
use crate::ids::{JobId, RunId};
use crate::poll::Clock;
use crate::state::{LifecycleState, ResultState};
use std::cell::Cell;
use std::collections::{BTreeMap, VecDeque};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

pub(crate) fn details(
    run_id: u64,
    life_cycle_state: &str,
    result_state: Option<&str>,
) -> RunDetails {
    RunDetails {
        run_id: RunId::new(run_id),
        job_id: None,
        number_in_job: None,
        state: Some(RunState {
            life_cycle_state: Some(LifecycleState::from(life_cycle_state)),
            result_state: result_state.map(ResultState::from),
            state_message: None,
        }),
        run_page_url: Some(format!("https://jobs.example.test/run/{run_id}")),
        start_time: Some(1_700_000_000_000),
        end_time: None,
    }
}

/// Replays queued responses; the last queued get-run response repeats.
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    run_now: Mutex<VecDeque<Result<RunNowResponse, BackendError>>>,
    get_run: Mutex<VecDeque<Result<RunDetails, BackendError>>>,
    requests: Mutex<Vec<RunNowRequest>>,
    run_now_calls: AtomicUsize,
    get_run_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on_run_now(self, response: Result<RunNowResponse, BackendError>) -> Self {
        self.run_now.lock().unwrap().push_back(response);
        self
    }

    pub(crate) fn on_get_run(self, response: Result<RunDetails, BackendError>) -> Self {
        self.get_run.lock().unwrap().push_back(response);
        self
    }

    pub(crate) fn run_now_calls(&self) -> usize {
        self.run_now_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn get_run_calls(&self) -> usize {
        self.get_run_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.run_now_calls() + self.get_run_calls()
    }

    pub(crate) fn requests(&self) -> Vec<RunNowRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl JobsBackend for ScriptedBackend {
    fn run_now(&self, request: &RunNowRequest) -> Result<RunNowResponse, BackendError> {
        self.run_now_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.run_now
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected run_now call")
    }

    fn get_run(&self, _run_id: RunId) -> Result<RunDetails, BackendError> {
        self.get_run_calls.fetch_add(1, Ordering::SeqCst);
        let mut queue = self.get_run.lock().unwrap();
        if queue.len() > 1 {
            queue.pop_front().expect("queue is non-empty")
        } else {
            queue.front().cloned().expect("unexpected get_run call")
        }
    }
}

/// Backend that deduplicates submissions by idempotency token.
#[derive(Default)]
pub(crate) struct InMemoryJobs {
    state: Mutex<InMemoryState>,
}

#[derive(Default)]
struct InMemoryState {
    next_run_id: u64,
    runs: BTreeMap<RunId, (JobId, u64)>,
    per_job: BTreeMap<JobId, u64>,
    by_token: BTreeMap<String, RunId>,
}

impl InMemoryJobs {
    pub(crate) fn run_count(&self) -> usize {
        self.state.lock().unwrap().runs.len()
    }
}

impl JobsBackend for InMemoryJobs {
    fn run_now(&self, request: &RunNowRequest) -> Result<RunNowResponse, BackendError> {
        let mut state = self.state.lock().unwrap();
        if let Some(token) = &request.idempotency_token
            && let Some(run_id) = state.by_token.get(token).copied()
        {
            let (_, number) = state.runs[&run_id];
            return Ok(RunNowResponse {
                run_id,
                number_in_job: Some(number),
            });
        }

        state.next_run_id += 1;
        let run_id = RunId::new(1000 + state.next_run_id);
        let number = {
            let counter = state.per_job.entry(request.job_id).or_default();
            *counter += 1;
            *counter
        };
        state.runs.insert(run_id, (request.job_id, number));
        if let Some(token) = &request.idempotency_token {
            state.by_token.insert(token.clone(), run_id);
        }
        Ok(RunNowResponse {
            run_id,
            number_in_job: Some(number),
        })
    }

    fn get_run(&self, run_id: RunId) -> Result<RunDetails, BackendError> {
        let state = self.state.lock().unwrap();
        let Some((job_id, number)) = state.runs.get(&run_id).copied() else {
            return Err(BackendError::Api {
                status: 404,
                error_code: Some("RESOURCE_DOES_NOT_EXIST".to_string()),
                message: format!("Run {run_id} does not exist."),
                body: None,
            });
        };
        let mut details = details(run_id.get(), "PENDING", None);
        details.job_id = Some(job_id);
        details.number_in_job = Some(number);
        Ok(details)
    }
}

/// Clock that only moves when slept on.
#[derive(Default)]
pub(crate) struct ManualClock {
    now: Cell<Duration>,
    sleeps: Cell<u32>,
    cancel_after_sleeps: Cell<Option<u32>>,
}

impl ManualClock {
    pub(crate) fn sleeps(&self) -> u32 {
        self.sleeps.get()
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.now.get()
    }

    /// Cancel the token passed to `sleep` once `count` sleeps have happened.
    pub(crate) fn cancel_after(self, count: u32) -> Self {
        self.cancel_after_sleeps.set(Some(count));
        self
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration, cancel: &CancelToken) {
        self.now.set(self.now.get() + duration);
        self.sleeps.set(self.sleeps.get() + 1);
        if self
            .cancel_after_sleeps
            .get()
            .is_some_and(|limit| self.sleeps.get() >= limit)
        {
            cancel.cancel();
        }
    }
}

/// Shared in-memory sink for formatted log lines.
#[derive(Clone, Default)]
pub(crate) struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with a thread-local subscriber and return what it logged.
pub(crate) fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let value = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
    (value, logs)
}
