use std::thread;
use std::time::Duration;
use tracing::warn;

/// Runs `operation` up to `attempts` times, sleeping `backoff` between
/// failed attempts. Returns the first success or the last error. `attempts`
/// below one still runs the operation once.
pub fn with_attempts<T, E, F>(attempts: u32, backoff: Duration, mut operation: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Result<T, E>,
{
    let mut attempt = 1;
    loop {
        match operation() {
            Ok(value) => return Ok(value),
            Err(error) if attempt < attempts => {
                warn!("attempt {attempt}/{attempts} failed, retrying: {error}");
                thread::sleep(backoff);
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_first_success_without_retrying() {
        let mut calls = 0;
        let result: Result<i32, String> = with_attempts(3, Duration::ZERO, || {
            calls += 1;
            Ok(7)
        });

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls, 1);
    }

    #[test]
    fn recovers_after_transient_failures() {
        let mut calls = 0;
        let result: Result<&str, String> = with_attempts(3, Duration::ZERO, || {
            calls += 1;
            if calls < 3 {
                Err(format!("boom {calls}"))
            } else {
                Ok("done")
            }
        });

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls, 3);
    }

    #[test]
    fn exhausts_the_budget_and_returns_last_error() {
        let mut calls = 0;
        let result: Result<(), String> = with_attempts(3, Duration::ZERO, || {
            calls += 1;
            Err(format!("boom {calls}"))
        });

        assert_eq!(result.unwrap_err(), "boom 3");
        assert_eq!(calls, 3);
    }

    #[test]
    fn zero_attempts_still_runs_once() {
        let mut calls = 0;
        let result: Result<(), &str> = with_attempts(0, Duration::ZERO, || {
            calls += 1;
            Err("nope")
        });

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
