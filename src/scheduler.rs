//! Repeating passes on a fixed interval.
//!
//! Passes run strictly one after another on the calling thread with a fixed
//! sleep in between. A [`StopHandle`] ends the loop, but only between passes;
//! a pass that has started always runs to completion.

use crate::scan::{PassReport, RunPass, ScanError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Longest single sleep before the stop flag is checked again.
const STOP_POLL: Duration = Duration::from_millis(100);

/// Shared flag asking a persistent run to end.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Runs a pass, sleeps, and repeats.
#[derive(Debug)]
pub struct Scheduler {
    interval: Duration,
    stop: StopHandle,
}

impl Scheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            stop: StopHandle::new(),
        }
    }

    /// A handle that stops this scheduler from another place.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Runs passes until stopped or until a fatal error.
    ///
    /// `on_pass` receives the 1-based pass number and that pass's result.
    /// Non-fatal errors are handed to `on_pass` and the loop carries on after
    /// the usual delay.
    ///
    /// # Returns
    ///
    /// The number of passes run when stopped, or the fatal error.
    pub fn run<P, F>(&self, pass: &mut P, mut on_pass: F) -> Result<usize, ScanError>
    where
        P: RunPass,
        F: FnMut(usize, &Result<PassReport, ScanError>),
    {
        let mut count = 0;

        while !self.stop.is_stopped() {
            count += 1;
            debug!(pass = count, "starting pass");

            let result = pass.run_pass();
            on_pass(count, &result);

            if let Err(e) = result {
                if e.is_fatal() {
                    error!(pass = count, error = %e, "stopping persistent scan");
                    return Err(e);
                }
                error!(pass = count, error = %e, "pass failed, retrying after interval");
            }

            self.sleep();
        }

        Ok(count)
    }

    /// Sleeps for the interval, waking early if stopped.
    fn sleep(&self) {
        let deadline = Instant::now() + self.interval;
        while !self.stop.is_stopped() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(STOP_POLL.min(deadline - now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::hidden::DotPrefix;
    use crate::scan::Scanner;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct FailingPass {
        calls: usize,
        fatal_on: usize,
    }

    impl RunPass for FailingPass {
        fn run_pass(&mut self) -> Result<PassReport, ScanError> {
            self.calls += 1;
            if self.calls >= self.fatal_on {
                Err(ScanError::SourceMissing(PathBuf::from("/gone")))
            } else {
                Err(ScanError::Destination(
                    crate::file_organizer::OrganizeError::NotADirectory(PathBuf::from("/x")),
                ))
            }
        }
    }

    #[test]
    fn test_stop_handle_is_shared() {
        let handle = StopHandle::new();
        let clone = handle.clone();
        assert!(!handle.is_stopped());
        clone.stop();
        assert!(handle.is_stopped());
    }

    #[test]
    fn test_stopped_scheduler_runs_no_pass() {
        let scheduler = Scheduler::new(Duration::from_secs(1));
        scheduler.stop_handle().stop();
        let mut pass = FailingPass {
            calls: 0,
            fatal_on: 1,
        };

        let count = scheduler.run(&mut pass, |_, _| {}).expect("Should not fail");
        assert_eq!(count, 0);
        assert_eq!(pass.calls, 0);
    }

    #[test]
    fn test_empty_source_pass_then_stop() {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let src = temp.path().join("src");
        let dst = temp.path().join("dst");
        fs::create_dir(&src).expect("Failed to create src");
        fs::create_dir(&dst).expect("Failed to create dst");

        let config = ScanConfig::new(&src, &dst).expect("Invalid config");
        let mut scanner = Scanner::new(config)
            .expect("Failed to build scanner")
            .with_hidden_predicate(DotPrefix);
        let scheduler = Scheduler::new(Duration::from_secs(1));
        let stop = scheduler.stop_handle();

        let mut seen = Vec::new();
        let count = scheduler
            .run(&mut scanner, |n, result| {
                let report = result.as_ref().expect("Pass failed");
                seen.push((n, report.moved_count(), report.unmoved_count()));
                if n == 2 {
                    stop.stop();
                }
            })
            .expect("Scheduler failed");

        assert_eq!(count, 2);
        assert_eq!(seen, vec![(1, 0, 0), (2, 0, 0)]);
    }

    #[test]
    fn test_non_fatal_errors_retry_until_fatal() {
        let scheduler = Scheduler::new(Duration::from_millis(10));
        let mut pass = FailingPass {
            calls: 0,
            fatal_on: 3,
        };
        let mut passes = Vec::new();

        let result = scheduler.run(&mut pass, |n, _| passes.push(n));

        assert!(matches!(result, Err(ScanError::SourceMissing(_))));
        assert_eq!(passes, vec![1, 2, 3]);
    }

    #[test]
    fn test_sleep_wakes_when_stopped() {
        let scheduler = Scheduler::new(Duration::from_secs(60));
        let stop = scheduler.stop_handle();
        let started = Instant::now();

        let mut pass = FailingPass {
            calls: 0,
            fatal_on: usize::MAX,
        };
        let count = scheduler
            .run(&mut pass, |_, _| stop.stop())
            .expect("Should stop cleanly");

        assert_eq!(count, 1);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
