use std::time::Duration;

pub mod aggregation;
pub mod analysis;
pub mod chart;
pub mod config;
pub mod errors;
pub mod initialization;
pub mod logging;
pub mod manager_openai;
pub mod manager_openweather;
pub mod manager_pushover;
pub mod manager_scraper;
pub mod manager_weatherapi;
pub mod models;
pub mod persistence;
pub mod pipeline;
pub mod target_hours;

pub const RETRY_ATTEMPTS: usize = 3;
pub const RETRY_PAUSE: Duration = Duration::from_secs(2);

/// Calls a fallible closure up to [`RETRY_ATTEMPTS`] times, pausing between attempts, and
/// evaluates to the first Ok or the last Err.
#[macro_export]
macro_rules! retry {
    ($f:expr) => {
        $crate::retry!($f, $crate::RETRY_PAUSE)
    };
    ($f:expr, $pause:expr) => {{
        let mut attempt = 1;
        loop {
            match $f() {
                Ok(v) => break Ok(v),
                Err(e) if attempt < $crate::RETRY_ATTEMPTS => {
                    ::log::warn!("attempt {} of {} failed: {}", attempt, $crate::RETRY_ATTEMPTS, e);
                    attempt += 1;
                    ::std::thread::sleep($pause);
                },
                Err(e) => break Err(e),
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::time::Duration;

    #[test]
    fn retry_stops_at_first_success() {
        let calls = Cell::new(0);
        let result: Result<u32, String> = retry!(|| {
            calls.set(calls.get() + 1);
            if calls.get() < 2 { Err("busy".to_string()) } else { Ok(7) }
        }, Duration::ZERO);

        assert_eq!(result, Ok(7));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn retry_gives_up_after_last_attempt() {
        let calls = Cell::new(0);
        let result: Result<u32, String> = retry!(|| {
            calls.set(calls.get() + 1);
            Err(format!("failure {}", calls.get()))
        }, Duration::ZERO);

        assert_eq!(result, Err("failure 3".to_string()));
        assert_eq!(calls.get(), crate::RETRY_ATTEMPTS);
    }
}
