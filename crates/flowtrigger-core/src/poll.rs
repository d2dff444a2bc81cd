//! Run status poller.
//!
//! ```text
//! WAITING ──query──▶ terminal? ──yes──▶ Terminal
//!    ▲                  │ no
//!    │                  ▼
//!    └──sleep◀── budget left? ──no──▶ Timeout
//! ```
//!
//! The first query always happens, so a run that is already terminal is
//! reported as such even with a tiny budget. Query failures are returned as
//! [`PollError`] and are not retried here.

use crate::backend::JobsBackend;
use crate::cancel::CancelToken;
use crate::error::{MonitorError, PollConfigError, PollError};
use crate::ids::RunId;
use crate::state::RunStatus;
use std::time::{Duration, Instant};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(3600);

/// Validated poll interval and wall-clock budget; both strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    poll_interval: Duration,
    max_wait: Duration,
}

impl PollConfig {
    pub fn new(poll_interval: Duration, max_wait: Duration) -> Result<Self, PollConfigError> {
        if poll_interval.is_zero() {
            return Err(PollConfigError::NonPositive {
                field: "poll_interval",
                value: format!("{poll_interval:?}"),
            });
        }
        if max_wait.is_zero() {
            return Err(PollConfigError::NonPositive {
                field: "max_wait",
                value: format!("{max_wait:?}"),
            });
        }
        Ok(Self {
            poll_interval,
            max_wait,
        })
    }

    /// Build from signed second counts, as accepted from the command line.
    pub fn from_secs(poll_interval: i64, max_wait: i64) -> Result<Self, PollConfigError> {
        let poll_interval = positive_secs("poll_interval", poll_interval)?;
        let max_wait = positive_secs("max_wait", max_wait)?;
        Self::new(poll_interval, max_wait)
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }
}

fn positive_secs(field: &'static str, secs: i64) -> Result<Duration, PollConfigError> {
    u64::try_from(secs)
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .ok_or_else(|| PollConfigError::NonPositive {
            field,
            value: format!("{secs}s"),
        })
}

/// Monotonic time source used by the poll loop.
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&self) -> Duration;

    /// Block for `duration`, waking early if `cancel` fires.
    fn sleep(&self, duration: Duration, cancel: &CancelToken);
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration, cancel: &CancelToken) {
        (**self).sleep(duration, cancel)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration, cancel: &CancelToken) {
        cancel.wait_timeout(duration);
    }
}

/// How a monitor call ended. `polls` counts status queries issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorOutcome {
    Terminal {
        status: RunStatus,
        polls: u32,
    },
    Timeout {
        last: RunStatus,
        elapsed: Duration,
        polls: u32,
    },
    Cancelled {
        last: RunStatus,
        polls: u32,
    },
}

impl MonitorOutcome {
    /// The most recent status observed.
    pub fn status(&self) -> &RunStatus {
        match self {
            Self::Terminal { status, .. } => status,
            Self::Timeout { last, .. } | Self::Cancelled { last, .. } => last,
        }
    }

    pub fn polls(&self) -> u32 {
        match self {
            Self::Terminal { polls, .. }
            | Self::Timeout { polls, .. }
            | Self::Cancelled { polls, .. } => *polls,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal { .. })
    }
}

/// Queries run state through an injected backend until a terminal state.
pub struct Poller<B, C = SystemClock> {
    backend: B,
    clock: C,
    cancel: CancelToken,
}

impl<B: JobsBackend> Poller<B, SystemClock> {
    pub fn new(backend: B) -> Self {
        Self::with_clock(backend, SystemClock::default())
    }
}

impl<B: JobsBackend, C: Clock> Poller<B, C> {
    pub fn with_clock(backend: B, clock: C) -> Self {
        Self {
            backend,
            clock,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops an in-progress monitor call when cancelled.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// One status query.
    pub fn status(&self, run_id: RunId) -> Result<RunStatus, PollError> {
        let details = self
            .backend
            .get_run(run_id)
            .map_err(|source| PollError { run_id, source })?;
        Ok(RunStatus::from_details(&details))
    }

    /// Validate the poll settings, then poll until terminal, timeout or
    /// cancellation.
    pub fn monitor(
        &self,
        run_id: RunId,
        poll_interval: Duration,
        max_wait: Duration,
    ) -> Result<MonitorOutcome, MonitorError> {
        let config = PollConfig::new(poll_interval, max_wait)?;
        Ok(self.monitor_with(run_id, config)?)
    }

    pub fn monitor_with(
        &self,
        run_id: RunId,
        config: PollConfig,
    ) -> Result<MonitorOutcome, PollError> {
        let started = self.clock.now();
        let mut polls = 0u32;

        loop {
            let status = self.status(run_id).inspect_err(|err| {
                tracing::warn!(run_id = %run_id, polls, error = %err, "status query failed");
            })?;
            polls += 1;
            tracing::debug!(
                run_id = %run_id,
                polls,
                life_cycle_state = status.life_cycle_state.as_ref().map(|s| s.as_str()),
                "polled run status"
            );

            if status.is_terminal() {
                tracing::info!(
                    run_id = %run_id,
                    polls,
                    result_state = status.result_state.as_ref().map(|s| s.as_str()),
                    "run reached terminal state"
                );
                return Ok(MonitorOutcome::Terminal { status, polls });
            }

            if self.cancel.is_cancelled() {
                tracing::warn!(run_id = %run_id, polls, "monitoring cancelled");
                return Ok(MonitorOutcome::Cancelled {
                    last: status,
                    polls,
                });
            }

            let elapsed = self.clock.now().saturating_sub(started);
            if elapsed >= config.max_wait() {
                tracing::warn!(
                    run_id = %run_id,
                    polls,
                    elapsed_secs = elapsed.as_secs_f64(),
                    "run did not reach a terminal state before the wait budget ran out"
                );
                return Ok(MonitorOutcome::Timeout {
                    last: status,
                    elapsed,
                    polls,
                });
            }

            let remaining = config.max_wait() - elapsed;
            self.clock
                .sleep(config.poll_interval().min(remaining), &self.cancel);

            if self.cancel.is_cancelled() {
                tracing::warn!(run_id = %run_id, polls, "monitoring cancelled");
                return Ok(MonitorOutcome::Cancelled {
                    last: status,
                    polls,
                });
            }
        }
    }
}
