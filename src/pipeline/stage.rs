//! Stage abstraction and runner.
//!
//! A stage is a plain `{setup, step, cleanup}` interface driven by an
//! explicit runner on a dedicated thread; stages share no mutable state and
//! communicate only through bounded channels.

use crate::pipeline::error::{ErrorReporter, StageError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

/// One isolated pipeline worker.
///
/// The runner calls `setup` once, then `step` repeatedly until the shared
/// stop signal is set or a fatal error occurs, then `cleanup` exactly once.
/// `step` performs a single poll iteration: a short-timeout receive, process,
/// send. Returning without input is normal; the runner simply calls again,
/// which is also how the stop signal is observed within one iteration.
pub trait Stage: Send + 'static {
    /// Returns the name of this stage for logging and error reporting.
    fn name(&self) -> &'static str;

    /// Called once before the first `step`. A failure here is fatal to this
    /// stage only.
    fn setup(&mut self) -> Result<(), StageError> {
        Ok(())
    }

    /// One poll iteration.
    ///
    /// - `Err(Recoverable)` is logged and the stage continues (single-iteration
    ///   failure isolation).
    /// - `Err(Fatal)` stops the stage; the supervisor notices via its
    ///   liveness poll.
    fn step(&mut self) -> Result<(), StageError>;

    /// Called once when the stage is shutting down.
    fn cleanup(&mut self) {}
}

/// Runs a stage on a dedicated thread.
pub struct StageRunner {
    handle: Option<JoinHandle<()>>,
    name: &'static str,
    alive: Arc<AtomicBool>,
}

impl StageRunner {
    /// Spawns the stage.
    ///
    /// # Arguments
    /// * `stage` - The stage implementation to run
    /// * `stop` - Shared cancellation signal observed between iterations
    /// * `reporter` - Reporter for stage errors
    pub fn spawn(
        mut stage: impl Stage,
        stop: Arc<AtomicBool>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let name = stage.name();
        let alive = Arc::new(AtomicBool::new(true));
        let thread_alive = alive.clone();

        let handle = thread::spawn(move || {
            Self::run(&mut stage, &stop, reporter.as_ref());
            thread_alive.store(false, Ordering::SeqCst);
        });

        Self {
            handle: Some(handle),
            name,
            alive,
        }
    }

    fn run(stage: &mut impl Stage, stop: &AtomicBool, reporter: &dyn ErrorReporter) {
        let name = stage.name();

        if let Err(error) = stage.setup() {
            // Setup failures are always fatal to this stage.
            let fatal = match error {
                StageError::Fatal(msg) | StageError::Recoverable(msg) => StageError::Fatal(msg),
            };
            reporter.report(name, &fatal);
            return;
        }

        while !stop.load(Ordering::SeqCst) {
            match stage.step() {
                Ok(()) => {}
                Err(error @ StageError::Recoverable(_)) => {
                    reporter.report(name, &error);
                }
                Err(error @ StageError::Fatal(_)) => {
                    reporter.report(name, &error);
                    break;
                }
            }
        }

        stage.cleanup();
    }

    /// True while the stage thread is still running.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// True once the stage thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| h.is_finished())
            .unwrap_or(true)
    }

    /// Returns the name of the stage.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Waits for the stage thread to complete.
    pub fn join(mut self) -> Result<(), String> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| format!("Stage '{}' thread panicked", self.name))
        } else {
            Ok(())
        }
    }

    pub(crate) fn take_handle(&mut self) -> Option<JoinHandle<()>> {
        self.handle.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::error::LogReporter;
    use crossbeam_channel::{Receiver, Sender, bounded};
    use std::sync::Mutex;
    use std::time::Duration;

    // Stage that doubles integers from input to output.
    struct DoublerStage {
        input: Receiver<i32>,
        output: Sender<i32>,
        cleaned_up: Arc<AtomicBool>,
    }

    impl Stage for DoublerStage {
        fn name(&self) -> &'static str {
            "doubler"
        }

        fn step(&mut self) -> Result<(), StageError> {
            match self.input.recv_timeout(Duration::from_millis(10)) {
                Ok(n) => {
                    self.output
                        .send(n * 2)
                        .map_err(|_| StageError::Fatal("output channel closed".to_string()))?;
                    Ok(())
                }
                Err(_) => Ok(()),
            }
        }

        fn cleanup(&mut self) {
            self.cleaned_up.store(true, Ordering::SeqCst);
        }
    }

    struct FailingSetupStage;

    impl Stage for FailingSetupStage {
        fn name(&self) -> &'static str {
            "failing-setup"
        }

        fn setup(&mut self) -> Result<(), StageError> {
            Err(StageError::Fatal("model failed to load".to_string()))
        }

        fn step(&mut self) -> Result<(), StageError> {
            panic!("step must not run after failed setup");
        }
    }

    struct FlakyStage {
        input: Receiver<i32>,
        output: Sender<i32>,
    }

    impl Stage for FlakyStage {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn step(&mut self) -> Result<(), StageError> {
            match self.input.recv_timeout(Duration::from_millis(10)) {
                Ok(n) if n % 2 == 0 => Err(StageError::Recoverable(format!("bad item {}", n))),
                Ok(n) => {
                    let _ = self.output.send(n);
                    Ok(())
                }
                Err(_) => Ok(()),
            }
        }
    }

    #[derive(Default)]
    struct CollectingReporter {
        errors: Mutex<Vec<(String, String)>>,
    }

    impl ErrorReporter for CollectingReporter {
        fn report(&self, stage: &str, error: &StageError) {
            if let Ok(mut errors) = self.errors.lock() {
                errors.push((stage.to_string(), error.to_string()));
            }
        }
    }

    #[test]
    fn test_runner_processes_until_stopped() {
        let (in_tx, in_rx) = bounded(10);
        let (out_tx, out_rx) = bounded(10);
        let stop = Arc::new(AtomicBool::new(false));
        let cleaned_up = Arc::new(AtomicBool::new(false));

        let runner = StageRunner::spawn(
            DoublerStage {
                input: in_rx,
                output: out_tx,
                cleaned_up: cleaned_up.clone(),
            },
            stop.clone(),
            Arc::new(LogReporter),
        );

        for i in 1..=3 {
            in_tx.send(i).unwrap();
        }
        let outputs: Vec<i32> = (0..3)
            .map(|_| out_rx.recv_timeout(Duration::from_secs(1)).unwrap())
            .collect();
        assert_eq!(outputs, vec![2, 4, 6]);

        stop.store(true, Ordering::SeqCst);
        runner.join().unwrap();
        assert!(cleaned_up.load(Ordering::SeqCst));
    }

    #[test]
    fn test_setup_failure_is_fatal_and_skips_step() {
        let stop = Arc::new(AtomicBool::new(false));
        let reporter = Arc::new(CollectingReporter::default());

        let runner = StageRunner::spawn(FailingSetupStage, stop, reporter.clone());
        runner.join().unwrap();

        let errors = reporter.errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, "failing-setup");
        assert!(errors[0].1.contains("Fatal"));
    }

    #[test]
    fn test_recoverable_errors_do_not_stop_stage() {
        let (in_tx, in_rx) = bounded(10);
        let (out_tx, out_rx) = bounded(10);
        let stop = Arc::new(AtomicBool::new(false));
        let reporter = Arc::new(CollectingReporter::default());

        let runner = StageRunner::spawn(
            FlakyStage {
                input: in_rx,
                output: out_tx,
            },
            stop.clone(),
            reporter.clone(),
        );

        for i in 1..=5 {
            in_tx.send(i).unwrap();
        }
        let outputs: Vec<i32> = (0..3)
            .map(|_| out_rx.recv_timeout(Duration::from_secs(1)).unwrap())
            .collect();
        assert_eq!(outputs, vec![1, 3, 5]);

        stop.store(true, Ordering::SeqCst);
        runner.join().unwrap();

        let errors = reporter.errors.lock().unwrap();
        assert_eq!(errors.len(), 2, "two even items should have been reported");
    }

    #[test]
    fn test_alive_flag_clears_after_exit() {
        let stop = Arc::new(AtomicBool::new(true));
        let (_, in_rx) = bounded::<i32>(1);
        let (out_tx, _out_rx) = bounded(1);

        let runner = StageRunner::spawn(
            DoublerStage {
                input: in_rx,
                output: out_tx,
                cleaned_up: Arc::new(AtomicBool::new(false)),
            },
            stop,
            Arc::new(LogReporter),
        );

        // Stop was pre-set, the stage exits immediately.
        let deadline = std::time::Instant::now() + Duration::from_secs(1);
        while runner.is_alive() && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!runner.is_alive());
        runner.join().unwrap();
    }
}
