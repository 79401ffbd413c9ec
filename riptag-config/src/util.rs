//! Parsing helpers shared by the file and environment sources.

use std::time::Duration;

/// Parse a human readable duration such as `"30s"`, `"2m"` or `"1m 30s"`.
pub fn parse_duration(raw: &str) -> Result<Duration, humantime::DurationError> {
    humantime::parse_duration(raw.trim())
}

/// Treat blank strings as unset.
pub fn non_blank(raw: Option<String>) -> Option<String> {
    raw.filter(|value| !value.trim().is_empty())
}
