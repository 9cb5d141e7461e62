use crate::config::MAX_DURATION_MS;
use once_cell::sync::Lazy;
use regex::Regex;

// Compiled regexes for duration parsing
static HOURS_MIN_SEC_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+):(\d{1,2}):(\d{1,2})$").unwrap());
static MIN_SEC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+):(\d{1,2})$").unwrap());
static UNITS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+)\s*h)?\s*(?:(\d+)\s*m)?\s*(?:(\d+)\s*s)?$").unwrap()
});

/// Duration parsing error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DurationParseError {
    EmptyInput,
    InvalidFormat(String),
    InvalidMinutes(u64),
    InvalidSeconds(u64),
    Zero,
    TooLong,
}

impl std::fmt::Display for DurationParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DurationParseError::EmptyInput => write!(f, "Duration cannot be empty"),
            DurationParseError::InvalidFormat(hint) => write!(f, "Invalid duration. {}", hint),
            DurationParseError::InvalidMinutes(m) => {
                write!(f, "Invalid minutes: {} (must be 0-59)", m)
            }
            DurationParseError::InvalidSeconds(s) => {
                write!(f, "Invalid seconds: {} (must be 0-59)", s)
            }
            DurationParseError::Zero => write!(f, "Duration must be longer than zero"),
            DurationParseError::TooLong => write!(
                f,
                "Duration cannot exceed {} hours",
                MAX_DURATION_MS / 3_600_000
            ),
        }
    }
}

impl std::error::Error for DurationParseError {}

/// Digits of an optional group; a missing group counts as zero. The regexes
/// only capture digits, so a parse failure means the number overflowed.
fn capture_number(captures: &regex::Captures<'_>, index: usize) -> Result<u64, DurationParseError> {
    match captures.get(index) {
        Some(m) => m.as_str().parse::<u64>().map_err(|_| DurationParseError::TooLong),
        None => Ok(0),
    }
}

/// Sum `(value, unit_ms)` pairs, failing with `TooLong` on overflow.
fn total_ms(parts: &[(u64, u64)]) -> Result<u64, DurationParseError> {
    parts.iter().try_fold(0u64, |total, &(value, unit_ms)| {
        value
            .checked_mul(unit_ms)
            .and_then(|ms| total.checked_add(ms))
            .ok_or(DurationParseError::TooLong)
    })
}

/// Parse a timer duration typed by the user into milliseconds.
///
/// Supported formats:
/// - Pure number: "25" (minutes)
/// - Hours, minutes and seconds: "1:02:03"
/// - Minutes and seconds: "2:30"
/// - Unit suffixes in any combination: "1h 5m", "2m30s", "45s"
///
/// # Examples
/// ```
/// use dash_timers::utils::parse_duration_ms;
/// assert_eq!(parse_duration_ms("2:30"), Ok(150_000));
/// assert_eq!(parse_duration_ms("2m30s"), Ok(150_000));
/// assert_eq!(parse_duration_ms("25"), Ok(1_500_000));
/// ```
pub fn parse_duration_ms(input: &str) -> Result<u64, DurationParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DurationParseError::EmptyInput);
    }

    let total = if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let minutes = trimmed
            .parse::<u64>()
            .map_err(|_| DurationParseError::TooLong)?;
        total_ms(&[(minutes, 60_000)])?
    } else if let Some(captures) = HOURS_MIN_SEC_REGEX.captures(trimmed) {
        let hours = capture_number(&captures, 1)?;
        let minutes = capture_number(&captures, 2)?;
        let seconds = capture_number(&captures, 3)?;
        if minutes > 59 {
            return Err(DurationParseError::InvalidMinutes(minutes));
        }
        if seconds > 59 {
            return Err(DurationParseError::InvalidSeconds(seconds));
        }
        total_ms(&[(hours, 3_600_000), (minutes, 60_000), (seconds, 1_000)])?
    } else if let Some(captures) = MIN_SEC_REGEX.captures(trimmed) {
        let minutes = capture_number(&captures, 1)?;
        let seconds = capture_number(&captures, 2)?;
        if seconds > 59 {
            return Err(DurationParseError::InvalidSeconds(seconds));
        }
        total_ms(&[(minutes, 60_000), (seconds, 1_000)])?
    } else {
        match UNITS_REGEX.captures(trimmed) {
            Some(captures) if captures.iter().skip(1).any(|group| group.is_some()) => total_ms(&[
                (capture_number(&captures, 1)?, 3_600_000),
                (capture_number(&captures, 2)?, 60_000),
                (capture_number(&captures, 3)?, 1_000),
            ])?,
            _ => {
                return Err(DurationParseError::InvalidFormat(
                    "Use: 25, 2:30, 1:02:03, 1h 5m or 45s".to_string(),
                ))
            }
        }
    };

    if total == 0 {
        return Err(DurationParseError::Zero);
    }
    if total > MAX_DURATION_MS {
        return Err(DurationParseError::TooLong);
    }
    Ok(total)
}
