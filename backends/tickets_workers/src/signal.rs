// Implements a stop notification usable by paced worker threads.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// `StopSignal` tells a worker to finish its current iteration and return.
///
/// Workers pace themselves through [`StopSignal::sleep`], which sleeps on the
/// underlying [`Condvar`] so a call to [`StopSignal::stop`] cuts the pause
/// short instead of waiting for the interval to pass.
#[derive(Debug, Default)]
pub struct StopSignal {
    /// Wakes sleeping workers once the flag flips.
    event: Condvar,

    /// `true` once the worker was asked to stop.
    stopped: Mutex<bool>,
}

impl StopSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        match self.stopped.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Flags the signal and wakes every thread sleeping on it.
    pub fn stop(&self) {
        let mut stopped = self.lock();
        *stopped = true;
        drop(stopped);

        self.event.notify_all();
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.lock()
    }

    /// Sleeps for `duration` unless stopped first.
    ///
    /// Returns `true` when the worker should keep going and `false` once the
    /// signal was stopped, before or during the sleep.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut stopped = self.lock();

        while !*stopped {
            let now = Instant::now();
            if now >= deadline {
                return true;
            }

            stopped = match self.event.wait_timeout(stopped, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }

        false
    }
}

#[cfg(test)]
mod test_stop_signal {
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use super::StopSignal;

    #[test]
    fn sleep_runs_full_interval_when_not_stopped() {
        let signal = StopSignal::new();
        let started = Instant::now();

        assert!(signal.sleep(Duration::from_millis(30)));
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn stop_cuts_a_long_sleep_short() {
        let signal = Arc::new(StopSignal::new());

        let sleeper = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || {
                let started = Instant::now();
                (signal.sleep(Duration::from_secs(30)), started.elapsed())
            })
        };

        thread::sleep(Duration::from_millis(50));
        signal.stop();

        let (keep_going, slept) = sleeper.join().expect("should join");
        assert!(!keep_going);
        assert!(slept < Duration::from_secs(5));
        assert!(signal.is_stopped());
    }

    #[test]
    fn sleep_after_stop_returns_immediately() {
        let signal = StopSignal::new();
        signal.stop();

        assert!(!signal.sleep(Duration::from_secs(30)));
    }
}
