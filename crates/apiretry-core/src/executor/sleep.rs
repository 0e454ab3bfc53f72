//! Blocking waits.

use std::time::{Duration, Instant};

/// Something that can block the calling thread.
///
/// Implementations may return before the requested duration has passed; the
/// executor keeps sleeping for the remainder.
#[cfg_attr(test, mockall::automock)]
pub trait Sleeper {
    /// Block for up to `duration` and return how long was actually slept.
    fn sleep(&self, duration: Duration) -> Duration;
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) -> Duration {
        let start = Instant::now();
        std::thread::sleep(duration);
        start.elapsed()
    }
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, duration: Duration) -> Duration {
        (**self).sleep(duration)
    }
}

/// Sleep for the whole of `wait`, resuming after early wake-ups.
///
/// Returns the total time slept. Stops early only if the sleeper makes no
/// progress at all.
pub fn sleep_fully<S: Sleeper + ?Sized>(sleeper: &S, wait: Duration) -> Duration {
    let mut slept = Duration::ZERO;

    while slept < wait {
        let step = sleeper.sleep(wait - slept);
        if step.is_zero() {
            tracing::warn!(
                remaining_ms = (wait - slept).as_millis() as u64,
                "sleeper returned without waiting"
            );
            break;
        }
        slept += step;
    }

    slept
}
