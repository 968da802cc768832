//! Timestamp parsing and formatting utilities.
//!
//! Event markers arrive as `MM:SS` or `HH:MM:SS` text. Internally a timestamp
//! is a whole number of seconds from the start of the footage.

/// Seconds in one hour. Values below this are formatted without an hour field.
pub const SECS_PER_HOUR: u64 = 3600;

/// Parse a timestamp string to total seconds.
///
/// Supports formats:
/// - `MM:SS`
/// - `HH:MM:SS`
///
/// Components are not range-checked, so `"00:75"` is 75 seconds.
///
/// # Examples
/// ```
/// use vigil_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("01:30:00").unwrap(), 5400);
/// assert_eq!(parse_timestamp("05:30").unwrap(), 330);
/// assert!(parse_timestamp("90").is_err());
/// ```
pub fn parse_timestamp(ts: &str) -> Result<u64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    let parts: Vec<&str> = ts.split(':').collect();
    match parts.as_slice() {
        [minutes, seconds] => {
            let minutes = parse_component(ts, "minutes", minutes)?;
            let seconds = parse_component(ts, "seconds", seconds)?;
            combine(ts, &[(minutes, 60), (seconds, 1)])
        }
        [hours, minutes, seconds] => {
            let hours = parse_component(ts, "hours", hours)?;
            let minutes = parse_component(ts, "minutes", minutes)?;
            let seconds = parse_component(ts, "seconds", seconds)?;
            combine(ts, &[(hours, SECS_PER_HOUR), (minutes, 60), (seconds, 1)])
        }
        _ => Err(TimestampError::InvalidFormat(ts.to_string())),
    }
}

fn parse_component(ts: &str, component: &'static str, raw: &str) -> Result<u64, TimestampError> {
    let raw = raw.trim();

    if let Some(digits) = raw.strip_prefix('-') {
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(TimestampError::Negative(ts.to_string()));
        }
    }

    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(TimestampError::InvalidValue {
            component,
            value: raw.to_string(),
        });
    }

    // Only digits remain, so parsing can fail on overflow alone
    raw.parse()
        .map_err(|_| TimestampError::Overflow(ts.to_string()))
}

fn combine(ts: &str, parts: &[(u64, u64)]) -> Result<u64, TimestampError> {
    parts.iter().try_fold(0u64, |total, &(value, scale)| {
        value
            .checked_mul(scale)
            .and_then(|v| total.checked_add(v))
            .ok_or_else(|| TimestampError::Overflow(ts.to_string()))
    })
}

/// Format seconds as `MM:SS`, or `HH:MM:SS` from one hour upwards.
///
/// # Examples
/// ```
/// use vigil_models::timestamp::format_seconds;
/// assert_eq!(format_seconds(3599), "59:59");
/// assert_eq!(format_seconds(3600), "01:00:00");
/// ```
pub fn format_seconds(total_secs: u64) -> String {
    let hours = total_secs / SECS_PER_HOUR;
    let mins = (total_secs % SECS_PER_HOUR) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

/// Format a fractional seconds value, flooring it to whole seconds first.
///
/// Negative and non-finite values are treated as zero.
pub fn format_fractional_seconds(total_secs: f64) -> String {
    if !total_secs.is_finite() || total_secs <= 0.0 {
        return format_seconds(0);
    }
    // `as` saturates for values beyond u64::MAX
    format_seconds(total_secs.floor() as u64)
}

/// Human-readable duration label, e.g. `"1 hr 2 min 3 sec"`.
pub fn format_duration_label(total_secs: u64) -> String {
    let hours = total_secs / SECS_PER_HOUR;
    let mins = (total_secs % SECS_PER_HOUR) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{} hr {} min {} sec", hours, mins, secs)
    } else if mins > 0 {
        format!("{} min {} sec", mins, secs)
    } else {
        format!("{} sec", secs)
    }
}

/// Timestamp parsing error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// Timestamp string is empty
    Empty,
    /// Timestamp contains a negative component
    Negative(String),
    /// Non-numeric value for a component
    InvalidValue {
        component: &'static str,
        value: String,
    },
    /// Wrong number of `:`-separated components
    InvalidFormat(String),
    /// Value does not fit in 64-bit seconds
    Overflow(String),
}

impl std::fmt::Display for TimestampError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Timestamp cannot be empty"),
            Self::Negative(ts) => write!(f, "Timestamp '{}' cannot be negative", ts),
            Self::InvalidValue { component, value } => {
                write!(f, "Invalid {} value: '{}'", component, value)
            }
            Self::InvalidFormat(ts) => write!(
                f,
                "Invalid timestamp format '{}'. Use MM:SS or HH:MM:SS",
                ts
            ),
            Self::Overflow(ts) => write!(f, "Timestamp '{}' is too large", ts),
        }
    }
}

impl std::error::Error for TimestampError {}
