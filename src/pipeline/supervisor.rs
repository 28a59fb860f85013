//! Supervisor that owns the stage runners and the shared stop signal.

use crate::defaults;
use crate::pipeline::error::{ErrorReporter, LogReporter};
use crate::pipeline::stage::{Stage, StageRunner};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Starts stages as isolated workers, polls their liveness, and drives a
/// cooperative shutdown with a bounded grace period.
pub struct Supervisor {
    stop: Arc<AtomicBool>,
    runners: Vec<StageRunner>,
    reporter: Arc<dyn ErrorReporter>,
    grace_period: Duration,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::with_reporter(Arc::new(LogReporter))
    }

    pub fn with_reporter(reporter: Arc<dyn ErrorReporter>) -> Self {
        Self {
            stop: Arc::new(AtomicBool::new(false)),
            runners: Vec::new(),
            reporter,
            grace_period: Duration::from_secs(defaults::SHUTDOWN_GRACE_SECS),
        }
    }

    /// Overrides the shutdown grace period.
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// The shared cancellation signal every stage observes between iterations.
    pub fn stop_signal(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Spawns a stage in its own failure domain.
    pub fn spawn(&mut self, stage: impl Stage) {
        self.runners
            .push(StageRunner::spawn(stage, self.stop.clone(), self.reporter.clone()));
    }

    /// Number of supervised stages.
    pub fn stage_count(&self) -> usize {
        self.runners.len()
    }

    /// True until `stop` is called.
    pub fn is_running(&self) -> bool {
        !self.stop.load(Ordering::SeqCst)
    }

    /// Polls stage liveness, logging each dead stage as an anomaly.
    ///
    /// Returns the names of dead stages. Restart is deliberately not
    /// implemented; callers wanting an all-or-nothing run can react to a
    /// non-empty result (see `any_dead`).
    pub fn poll_health(&self) -> Vec<&'static str> {
        let mut dead = Vec::new();
        for runner in &self.runners {
            if !runner.is_alive() && !self.stop.load(Ordering::SeqCst) {
                self.reporter
                    .anomaly(runner.name(), "stage died unexpectedly");
                dead.push(runner.name());
            }
        }
        dead
    }

    /// True when at least one stage has exited while the run is still live.
    pub fn any_dead(&self) -> bool {
        !self.stop.load(Ordering::SeqCst) && self.runners.iter().any(|r| !r.is_alive())
    }

    /// Stops the pipeline cooperatively.
    ///
    /// Sets the stop signal, then waits up to the grace period for stages to
    /// exit, joining finished ones to surface panics. Stragglers are
    /// detached; they die with the process.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::SeqCst);

        let deadline = Instant::now() + self.grace_period;
        let poll_interval = Duration::from_millis(50);

        loop {
            let mut remaining = Vec::new();
            for mut runner in self.runners.drain(..) {
                if runner.is_finished() {
                    let name = runner.name();
                    if let Some(handle) = runner.take_handle()
                        && handle.join().is_err()
                    {
                        eprintln!("voxlate: stage '{}' thread panicked", name);
                    }
                } else {
                    remaining.push(runner);
                }
            }
            self.runners = remaining;

            if self.runners.is_empty() {
                break;
            }

            if Instant::now() >= deadline {
                eprintln!(
                    "voxlate: shutdown timeout, {} stage(s) still running, detaching",
                    self.runners.len()
                );
                break;
            }

            thread::sleep(poll_interval);
        }
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}
