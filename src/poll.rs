//! Background polling.
//!
//! Runs the [`Scheduler`] on a dedicated thread with its own single-threaded
//! tokio runtime.  Timer expiry, fetch completion and inbound commands are
//! all handled by one `select!` loop, so scheduler and display state are
//! never touched concurrently and need no locks.
//!
//! ## For contributors
//!
//! The loop owns exactly one `Sleep`.  After every event it is re-armed from
//! [`Scheduler::pending_timer`]; the scheduler decides *when*, this module
//! only makes it happen.  Fetches run as spawned tasks and report back over
//! a channel together with their [`Ticket`], which the scheduler uses to
//! recognise completions that arrive after a replan or a disable.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Sleep};

use crate::config::{DisplayFlags, PollConfig};
use crate::reconcile::{AlertEvent, DisplayState};
use crate::scheduler::{FetchRequest, Scheduler, Ticket};
use crate::sink::{AlertSink, DisplaySink};
use crate::source::{FetchOutcome, NotificationSource};

/// Messages sent from the poller thread to the UI thread.
#[derive(Debug)]
pub enum PollMsg {
    Display(DisplayState),
    Alert(AlertEvent),
    /// Human-readable status for the status bar.
    Status(String),
}

/// Inbound events for the scheduler loop.
#[derive(Debug)]
pub enum Command {
    Enable,
    Disable,
    /// Manual refresh: same as a replan, without new settings.
    Refresh,
    SettingsChanged {
        config: PollConfig,
        flags: DisplayFlags,
    },
}

/// Cheap, cloneable sender of [`Command`]s.
///
/// Dropping every handle stops the scheduler loop.
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl SchedulerHandle {
    pub fn enable(&self) {
        self.send(Command::Enable);
    }

    pub fn disable(&self) {
        self.send(Command::Disable);
    }

    pub fn refresh(&self) {
        self.send(Command::Refresh);
    }

    pub fn settings_changed(&self, config: PollConfig, flags: DisplayFlags) {
        self.send(Command::SettingsChanged { config, flags });
    }

    /// Release this handle.  The loop stops once the last one is gone and
    /// aborts any fetch still in flight.
    pub fn shutdown(self) {
        tracing::debug!(event = "poll.shutdown_requested");
    }

    fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            tracing::warn!(event = "poll.scheduler_gone");
        }
    }
}

/// Spawn the polling thread.
///
/// The scheduler starts idle; call [`SchedulerHandle::enable`] to begin.
/// The thread exits once every [`SchedulerHandle`] has been dropped.
pub fn spawn<D, A>(
    source: Arc<dyn NotificationSource>,
    scheduler: Scheduler,
    display: D,
    alerts: A,
) -> Result<(SchedulerHandle, thread::JoinHandle<()>)>
where
    D: DisplaySink + 'static,
    A: AlertSink + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build the polling runtime")?;
    let (tx, rx) = mpsc::unbounded_channel();

    let thread = thread::Builder::new()
        .name("poll".into())
        .spawn(move || {
            runtime.block_on(run(source, scheduler, rx, display, alerts));
            // A resolver thread may still be blocked on DNS; don't wait for it.
            runtime.shutdown_timeout(Duration::from_secs(1));
        })
        .context("failed to spawn the polling thread")?;

    Ok((SchedulerHandle { tx }, thread))
}

/// The scheduler loop.  Returns when the command channel closes.
pub async fn run<D, A>(
    source: Arc<dyn NotificationSource>,
    mut scheduler: Scheduler,
    mut commands: mpsc::UnboundedReceiver<Command>,
    display: D,
    alerts: A,
) where
    D: DisplaySink,
    A: AlertSink,
{
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<(Ticket, FetchOutcome)>();
    let timer = tokio::time::sleep(Duration::ZERO);
    tokio::pin!(timer);
    let mut armed: Option<u64> = None;
    let mut in_flight: Option<JoinHandle<()>> = None;

    tracing::info!(event = "poll.started", source = source.name());

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                match command {
                    Command::Enable => {
                        scheduler.enable();
                        display.status("Checking…".into());
                    }
                    Command::Disable => {
                        scheduler.disable();
                        if let Some(task) = in_flight.take() {
                            task.abort();
                        }
                        display.status("Paused".into());
                    }
                    Command::Refresh => {
                        if scheduler.replan() {
                            display.status(format!(
                                "Refreshing in {}s",
                                crate::scheduler::REPLAN_GRACE.as_secs()
                            ));
                        }
                    }
                    Command::SettingsChanged { config, flags } => {
                        display.update(scheduler.settings_changed(config, flags));
                        let config = scheduler.config();
                        tracing::info!(
                            event = "poll.settings_changed",
                            domain = %config.domain,
                            path_variant = ?config.path_variant,
                            base_interval = config.base_interval,
                        );
                    }
                }
            }

            Some((ticket, outcome)) = done_rx.recv() => {
                let summary = outcome.summary();
                let completion = scheduler.fetch_completed(ticket, outcome);
                if let Some(state) = completion.display {
                    in_flight = None;
                    tracing::info!(
                        event = "poll.fetch.completed",
                        outcome = %summary,
                        count = state.count,
                        retry_attempt = scheduler.state().retry_attempt,
                        next_delay_secs = ?completion.next_delay.map(|d| d.as_secs()),
                    );

                    display.update(state);
                    if let Some(alert) = completion.alert {
                        alerts.raise(alert);
                    }

                    let now = Local::now().format("%H:%M:%S");
                    display.status(match completion.next_delay {
                        Some(delay) => {
                            format!("{summary} at {now}, next check in {}s", delay.as_secs())
                        }
                        None => format!("{summary} at {now}"),
                    });

                    if let Some(request) = completion.next_fetch {
                        in_flight = Some(start_fetch(&source, request, &done_tx));
                    }
                }
            }

            () = &mut timer, if armed.is_some() => {
                let fired = armed.take();
                match fired.and_then(|id| scheduler.timer_fired(id)) {
                    Some(request) => in_flight = Some(start_fetch(&source, request, &done_tx)),
                    None => tracing::debug!(
                        event = "poll.timer_deferred",
                        phase = ?scheduler.phase(),
                        fetching = scheduler.is_fetching(),
                    ),
                }
            }
        }

        sync_timer(&scheduler, timer.as_mut(), &mut armed);
    }

    if let Some(task) = in_flight {
        task.abort();
    }
    tracing::info!(event = "poll.stopped");
}

/// Stand-in deadline for delays too large to add to an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Point the loop's single `Sleep` at the scheduler's pending timer.
fn sync_timer(scheduler: &Scheduler, timer: std::pin::Pin<&mut Sleep>, armed: &mut Option<u64>) {
    match scheduler.pending_timer() {
        Some(pending) if *armed != Some(pending.id) => {
            timer.reset(deadline(Instant::now(), pending.delay));
            *armed = Some(pending.id);
        }
        Some(_) => {}
        None => *armed = None,
    }
}

/// `now + delay`, saturating at [`FAR_FUTURE`].  Server hints are
/// unbounded, so the sum may not fit.
fn deadline(now: Instant, delay: Duration) -> Instant {
    now.checked_add(delay)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

fn start_fetch(
    source: &Arc<dyn NotificationSource>,
    request: FetchRequest,
    done: &mpsc::UnboundedSender<(Ticket, FetchOutcome)>,
) -> JoinHandle<()> {
    let source = Arc::clone(source);
    let done = done.clone();
    tokio::spawn(async move {
        let outcome = source
            .fetch(&request.config, request.revalidation.as_deref())
            .await;
        // The loop holds the receiver for as long as it runs.
        let _ = done.send((request.ticket, outcome));
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
