//! Delay between polls.
//!
//! Successful polls wait the configured base interval.  Consecutive
//! failures walk a fixed ladder capped at one hour.  The server may
//! advertise a minimum interval (`X-Poll-Interval`); it acts as a floor on
//! both paths.

/// Retry delays in seconds, indexed by retry attempt starting at 1.
pub const RETRY_LADDER: [u64; 7] = [60, 120, 240, 480, 960, 1920, 3600];

/// Seconds to wait before the next poll.
pub fn next_delay(retry_attempt: u32, base_interval: u64, advertised_min: Option<u64>) -> u64 {
    let candidate = if retry_attempt == 0 {
        base_interval
    } else {
        let index = (retry_attempt as usize - 1).min(RETRY_LADDER.len() - 1);
        RETRY_LADDER[index]
    };
    candidate.max(advertised_min.unwrap_or(0))
}
