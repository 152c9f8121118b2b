//! Periodic runner for a `SimulationDriver`.
//!
//! `Ticker::spawn` moves the driver onto a worker thread that steps it once
//! per period, persists the sample and the admitted alerts in production
//! order, then hands the tick to the display callback. The period wait
//! doubles as the cancellation point: `stop()` (or dropping the `Ticker`)
//! wakes the worker immediately and no further tick is produced.
//!
//! A store fault halts the worker; `join`/`stop` return it as
//! `SimulationError::Store`.
//!
//! Ticks are scheduled against a running deadline, so the time spent
//! persisting a tick does not stretch the period.

use std::io::BufRead;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::Rng;
use serde::Serialize;

use crate::alert::AlertDeduplicator;
use crate::config::ServiceConfig;
use crate::logging::{self, Component};
use crate::model::{AlertSeverity, SimulationError, StoreError};
use crate::simulation::driver::{SimulationDriver, TickOutput};
use crate::store::TimeSeriesStore;

#[derive(Debug, Clone)]
pub struct TickerOptions {
    pub period: Duration,
    pub max_ticks: Option<u64>,
    pub dedup: AlertDeduplicator,
}

impl TickerOptions {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            period: config.simulation.period(),
            max_ticks: config.simulation.max_ticks,
            dedup: AlertDeduplicator::new(config.store.alert_dedup_window),
        }
    }
}

/// Counters for one ticker run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickerReport {
    pub ticks: u64,
    pub samples_persisted: u64,
    pub alerts_persisted: u64,
    pub alerts_suppressed: u64,
}

pub struct Ticker {
    stop_tx: Sender<()>,
    handle: JoinHandle<Result<TickerReport, StoreError>>,
}

impl Ticker {
    pub fn spawn<R, F>(
        driver: SimulationDriver<R>,
        store: Arc<dyn TimeSeriesStore>,
        options: TickerOptions,
        on_tick: F,
    ) -> Self
    where
        R: Rng + Send + 'static,
        F: FnMut(&TickOutput) + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::spawn(move || run(driver, &*store, options, stop_rx, on_tick));
        Self { stop_tx, handle }
    }

    /// True once the worker has exited (stopped, finished, or halted).
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancels the worker and waits for it. A tick not yet persisted is dropped.
    pub fn stop(self) -> Result<TickerReport, SimulationError> {
        // The worker may already be gone; that is fine.
        let _ = self.stop_tx.send(());
        self.join_handle()
    }

    /// Waits for the worker to finish on its own (max_ticks or a store fault).
    pub fn join(self) -> Result<TickerReport, SimulationError> {
        self.join_handle()
    }

    /// Runs until the operator presses Enter on `console`, the worker
    /// finishes, or the worker halts on a store fault.
    ///
    /// A console already at EOF (service manager, `nohup`, `</dev/null`)
    /// means there is no operator: the ticker is left running and this
    /// waits for it like `join`. `poll` bounds how long a halted worker
    /// goes unnoticed.
    pub fn wait_for_operator<I>(self, console: I, poll: Duration) -> Result<TickerReport, SimulationError>
    where
        I: BufRead + Send + 'static,
    {
        let input = spawn_console_reader(console);
        loop {
            if self.is_finished() {
                return self.join();
            }
            match input.recv_timeout(poll) {
                Ok(ConsoleInput::Line) => return self.stop(),
                Ok(ConsoleInput::Closed) | Err(RecvTimeoutError::Disconnected) => {
                    logging::info(
                        Component::System,
                        None,
                        "No operator console; running until the ticker finishes",
                    );
                    return self.join();
                }
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
    }

    fn join_handle(self) -> Result<TickerReport, SimulationError> {
        let Ticker { stop_tx, handle } = self;
        let result = handle.join().map_err(|_| SimulationError::WorkerPanicked)?;
        drop(stop_tx);
        Ok(result?)
    }
}

enum ConsoleInput {
    Line,
    Closed,
}

/// Reads one line on a helper thread so the caller can keep polling the worker.
fn spawn_console_reader<I: BufRead + Send + 'static>(mut console: I) -> mpsc::Receiver<ConsoleInput> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut line = String::new();
        let input = match console.read_line(&mut line) {
            Ok(0) => ConsoleInput::Closed,
            Ok(_) => ConsoleInput::Line,
            Err(e) => {
                logging::warn(Component::System, None, &format!("Console read failed: {}", e));
                ConsoleInput::Closed
            }
        };
        let _ = tx.send(input);
    });
    rx
}

/// Deadline for the tick after the one due at `deadline`. A worker that
/// has fallen more than a period behind skips the missed slots instead of
/// bursting to catch up.
fn next_deadline(deadline: Instant, period: Duration, now: Instant) -> Instant {
    let next = deadline + period;
    if next < now { now } else { next }
}

fn run<R, F>(
    mut driver: SimulationDriver<R>,
    store: &dyn TimeSeriesStore,
    mut options: TickerOptions,
    stop_rx: mpsc::Receiver<()>,
    mut on_tick: F,
) -> Result<TickerReport, StoreError>
where
    R: Rng,
    F: FnMut(&TickOutput),
{
    let mut report = TickerReport::default();
    logging::info(
        Component::Simulation,
        None,
        &format!("Ticker started, period {} ms", options.period.as_millis()),
    );

    let mut deadline = Instant::now() + options.period;
    loop {
        if options.max_ticks.is_some_and(|max| report.ticks >= max) {
            break;
        }
        let wait = deadline.saturating_duration_since(Instant::now());
        match stop_rx.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
        deadline = next_deadline(deadline, options.period, Instant::now());

        let output = driver.step();
        report.ticks += 1;

        if let Err(e) = persist(store, &output, &mut options.dedup, &mut report) {
            logging::log_store_failure(&format!("persist tick {}", output.tick), &e);
            logging::log_run_summary(&report, true);
            return Err(e);
        }

        on_tick(&output);
    }

    logging::log_run_summary(&report, false);
    Ok(report)
}

fn persist(
    store: &dyn TimeSeriesStore,
    output: &TickOutput,
    dedup: &mut AlertDeduplicator,
    report: &mut TickerReport,
) -> Result<(), StoreError> {
    store.append_sample(&output.sample)?;
    report.samples_persisted += 1;

    let (admitted, suppressed) = dedup.filter(output.alerts.clone());
    report.alerts_suppressed += suppressed as u64;

    for alert in &admitted {
        store.append_alert(alert)?;
        report.alerts_persisted += 1;

        let context = format!("{} tick {}", alert.severity, output.tick);
        match alert.severity {
            AlertSeverity::Red => logging::error(Component::Alert, Some(context.as_str()), &alert.message),
            AlertSeverity::Yellow => logging::warn(Component::Alert, Some(context.as_str()), &alert.message),
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
