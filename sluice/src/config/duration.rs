//! Human-readable duration parsing (e.g., "250ms", "5s", "2m").

use std::time::Duration;
use thiserror::Error;

/// Error parsing a duration string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid duration '{input}' - expected format like '250ms', '5s', or '2m'")]
pub struct DurationParseError {
    input: String,
}

impl DurationParseError {
    fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Parse a human-readable duration.
///
/// Supports `ms`, `s`, `m` and `h` suffixes, case-insensitive and
/// whitespace tolerant. A bare number is read as seconds.
///
/// # Examples
///
/// ```
/// use sluice::config::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
/// assert_eq!(parse_duration("5").unwrap(), Duration::from_secs(5));
/// assert_eq!(parse_duration("2 M").unwrap(), Duration::from_secs(120));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, DurationParseError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(DurationParseError::new(s));
    }

    let lower = trimmed.to_ascii_lowercase();
    // "ms" must be checked before "m" and "s".
    let (num_str, millis_per_unit) = if let Some(n) = lower.strip_suffix("ms") {
        (n, 1_u64)
    } else if let Some(n) = lower.strip_suffix('s') {
        (n, 1_000)
    } else if let Some(n) = lower.strip_suffix('m') {
        (n, 60_000)
    } else if let Some(n) = lower.strip_suffix('h') {
        (n, 3_600_000)
    } else {
        (lower.as_str(), 1_000)
    };

    let num: u64 = num_str.trim().parse().map_err(|_| DurationParseError::new(s))?;
    num.checked_mul(millis_per_unit)
        .map(Duration::from_millis)
        .ok_or_else(|| DurationParseError::new(s))
}

/// Format a duration using the largest unit that represents it exactly.
///
/// Config values have millisecond granularity. A sub-millisecond remainder
/// rounds up, so a non-zero duration never formats as `0s`.
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis() + u128::from(duration.subsec_nanos() % 1_000_000 != 0);
    if millis == 0 {
        "0s".to_string()
    } else if millis % 3_600_000 == 0 {
        format!("{}h", millis / 3_600_000)
    } else if millis % 60_000 == 0 {
        format!("{}m", millis / 60_000)
    } else if millis % 1_000 == 0 {
        format!("{}s", millis / 1_000)
    } else {
        format!("{}ms", millis)
    }
}
