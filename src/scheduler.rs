//! The polling state machine.
//!
//! `Idle → Waiting → Fetching → Waiting → …`, plus `Disabled`.
//!
//! This type does no I/O and never sleeps.  It records which timer is
//! pending and which fetch is in flight; the async driver in [`crate::poll`]
//! turns those into real sleeps and spawned requests and feeds the results
//! back in.  Keeping the machine synchronous lets every transition be
//! tested without a clock.
//!
//! ## Tokens
//!
//! Every fetch carries a [`Ticket`] of `(session, generation)`:
//!
//! * `session` changes on enable/disable.  A completion from an older
//!   session is dropped entirely.
//! * `generation` changes on every replan.  A completion from an older
//!   generation is still applied (retry counter, revalidation token,
//!   display), but the delay it would schedule is discarded in favour of
//!   the timer the replan already armed.

use std::sync::Arc;
use std::time::Duration;

use crate::backoff::next_delay;
use crate::config::{DisplayFlags, PollConfig};
use crate::reconcile::{self, AlertEvent, DisplayState};
use crate::source::FetchOutcome;

/// Delay before fetching after a replan, so that a burst of settings writes
/// settles before the new snapshot is used.
pub const REPLAN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Never enabled.
    Idle,
    /// A timer is pending.
    Waiting,
    /// The timer fired; a fetch is (or is about to be) in flight.
    Fetching,
    Disabled,
}

/// A single-shot delay.  Only the timer with the current `id` may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    pub id: u64,
    pub delay: Duration,
}

/// Identity of one fetch, checked when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    session: u64,
    generation: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerState {
    /// Consecutive failed polls.
    pub retry_attempt: u32,
    pub pending_timer: Option<Timer>,
    /// `Last-Modified` of the last fresh response.
    pub last_revalidation: Option<String>,
    /// Latest `X-Poll-Interval`, in seconds.
    pub advertised_min_interval: Option<u64>,
}

/// Everything needed to run one fetch off the scheduler's context.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub ticket: Ticket,
    pub config: Arc<PollConfig>,
    pub revalidation: Option<String>,
}

/// What the driver must do after a fetch completed.
#[derive(Debug, Default)]
pub struct Completion {
    /// New display state, pushed to the display sink.
    pub display: Option<DisplayState>,
    pub alert: Option<AlertEvent>,
    /// Delay of the timer armed by this completion.  `None` when the
    /// completion was stale and the existing timer was kept.
    pub next_delay: Option<Duration>,
    /// Start this fetch right away (a replan timer fired while this stale
    /// fetch was still running).
    pub next_fetch: Option<FetchRequest>,
}

pub struct Scheduler {
    state: SchedulerState,
    config: Arc<PollConfig>,
    flags: DisplayFlags,
    display: DisplayState,
    phase: Phase,
    session: u64,
    generation: u64,
    timer_seq: u64,
    in_flight: Option<Ticket>,
    fetch_on_completion: bool,
}

impl Scheduler {
    pub fn new(config: PollConfig, flags: DisplayFlags) -> Self {
        Self {
            state: SchedulerState::default(),
            config: Arc::new(config),
            flags,
            display: DisplayState::initial(&flags),
            phase: Phase::Idle,
            session: 0,
            generation: 0,
            timer_seq: 0,
            in_flight: None,
            fetch_on_completion: false,
        }
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    pub fn display(&self) -> DisplayState {
        self.display
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn pending_timer(&self) -> Option<Timer> {
        self.state.pending_timer
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start polling with an immediate fetch.  No-op while already running.
    pub fn enable(&mut self) {
        if !matches!(self.phase, Phase::Idle | Phase::Disabled) {
            return;
        }
        self.session += 1;
        self.generation += 1;
        self.phase = Phase::Waiting;
        self.arm(Duration::ZERO);
        tracing::info!(event = "scheduler.enabled", session = self.session);
    }

    /// Stop polling.  Idempotent; leaves no timer and orphans any fetch in
    /// flight.
    pub fn disable(&mut self) {
        if self.phase == Phase::Disabled {
            return;
        }
        self.session += 1;
        self.state.pending_timer = None;
        self.in_flight = None;
        self.fetch_on_completion = false;
        self.phase = Phase::Disabled;
        tracing::info!(event = "scheduler.disabled", session = self.session);
    }

    /// Cancel the pending timer and fetch again after [`REPLAN_GRACE`].
    /// Retry bookkeeping is left alone.  Ignored unless running.
    pub fn replan(&mut self) -> bool {
        if !matches!(self.phase, Phase::Waiting | Phase::Fetching) {
            return false;
        }
        self.generation += 1;
        self.fetch_on_completion = false;
        self.phase = Phase::Waiting;
        self.arm(REPLAN_GRACE);
        tracing::debug!(
            event = "scheduler.replanned",
            generation = self.generation,
            retry_attempt = self.state.retry_attempt,
        );
        true
    }

    /// Swap in new snapshots, re-evaluate visibility and replan.
    pub fn settings_changed(&mut self, config: PollConfig, flags: DisplayFlags) -> DisplayState {
        self.config = Arc::new(config);
        self.flags = flags;
        self.display = reconcile::refresh_visibility(&self.display, &flags);
        self.replan();
        self.display
    }

    /// The timer `id` elapsed.  Returns the fetch to start, if any.
    pub fn timer_fired(&mut self, id: u64) -> Option<FetchRequest> {
        match self.state.pending_timer {
            Some(timer) if timer.id == id => {}
            _ => return None,
        }
        self.state.pending_timer = None;
        self.phase = Phase::Fetching;

        if self.in_flight.is_some() {
            // One fetch at a time: go as soon as the stale one lands.
            self.fetch_on_completion = true;
            return None;
        }
        Some(self.start_fetch())
    }

    pub fn fetch_completed(&mut self, ticket: Ticket, outcome: FetchOutcome) -> Completion {
        if ticket.session != self.session || self.phase == Phase::Disabled {
            tracing::debug!(event = "scheduler.completion_dropped", reason = "session");
            return Completion::default();
        }
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
        }

        if outcome.is_success() {
            self.state.retry_attempt = 0;
        } else {
            self.state.retry_attempt = self.state.retry_attempt.saturating_add(1);
        }
        if let FetchOutcome::Fresh {
            last_modified: Some(token),
            ..
        } = &outcome
        {
            self.state.last_revalidation = Some(token.clone());
        }
        if let Some(min) = outcome.min_interval() {
            self.state.advertised_min_interval = Some(min);
        }

        let (display, alert) = reconcile::apply(&outcome, &self.display, &self.flags);
        self.display = display;

        let mut completion = Completion {
            display: Some(display),
            alert,
            ..Completion::default()
        };

        if ticket.generation == self.generation {
            let delay = Duration::from_secs(next_delay(
                self.state.retry_attempt,
                self.config.base_interval,
                self.state.advertised_min_interval,
            ));
            self.phase = Phase::Waiting;
            self.arm(delay);
            completion.next_delay = Some(delay);
        } else if self.fetch_on_completion {
            self.fetch_on_completion = false;
            completion.next_fetch = Some(self.start_fetch());
        } else {
            tracing::debug!(event = "scheduler.stale_delay_discarded");
        }

        completion
    }

    fn start_fetch(&mut self) -> FetchRequest {
        let ticket = Ticket {
            session: self.session,
            generation: self.generation,
        };
        self.in_flight = Some(ticket);
        self.phase = Phase::Fetching;
        FetchRequest {
            ticket,
            config: Arc::clone(&self.config),
            revalidation: self.state.last_revalidation.clone(),
        }
    }

    /// Replace the pending timer.  There is never more than one.
    fn arm(&mut self, delay: Duration) {
        self.timer_seq += 1;
        let timer = Timer {
            id: self.timer_seq,
            delay,
        };
        if let Some(old) = self.state.pending_timer.replace(timer) {
            tracing::trace!(event = "scheduler.timer_cancelled", id = old.id);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
