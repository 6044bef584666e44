//! Duration parsing utilities.

use super::ConfigError;
use std::time::Duration;

/// Parse a duration string like "7h", "30m", "300s", "100ms" or "300".
/// Supports:
/// - Plain numbers (interpreted as seconds): "300"
/// - Milliseconds suffix: "100ms"
/// - Seconds suffix: "300s"
/// - Minutes suffix: "30m"
/// - Hours suffix: "7h"
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(invalid(s, "empty duration string"));
    }

    // "ms" before "m" and "s"
    if let Some(num_str) = s.strip_suffix("ms") {
        return Ok(Duration::from_millis(number(s, num_str, "milliseconds")?));
    }
    if let Some(num_str) = s.strip_suffix('h') {
        let hours = number(s, num_str, "hours")?;
        return hours
            .checked_mul(3600)
            .map(Duration::from_secs)
            .ok_or_else(|| invalid(s, "too large"));
    }
    if let Some(num_str) = s.strip_suffix('m') {
        let minutes = number(s, num_str, "minutes")?;
        return minutes
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| invalid(s, "too large"));
    }
    if let Some(num_str) = s.strip_suffix('s') {
        return Ok(Duration::from_secs(number(s, num_str, "seconds")?));
    }

    // No suffix - treat as seconds
    Ok(Duration::from_secs(number(s, s, "duration")?))
}

fn number(input: &str, num_str: &str, unit: &str) -> Result<u64, ConfigError> {
    num_str
        .parse()
        .map_err(|_| invalid(input, &format!("invalid {unit} value: {num_str}")))
}

fn invalid(value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidDuration {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("7h").unwrap(), Duration::from_secs(25_200));
        assert_eq!(parse_duration("30m").unwrap(), Duration::from_secs(1_800));
        assert_eq!(parse_duration("300s").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("100ms").unwrap(), Duration::from_millis(100));
        assert_eq!(parse_duration(" 300 ").unwrap(), Duration::from_secs(300));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        for bad in ["", "h", "-5s", "1.5h", "ten", "5d"] {
            assert!(parse_duration(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
