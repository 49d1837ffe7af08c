//! Relative window expressions.
//!
//! Limit windows are written the way people say them: `"1 hour"`,
//! `"30 minutes"`, `"1 hour 30 minutes"`, `"2d"`. They are parsed once when
//! policies are compiled; the pipeline only ever sees a [`Duration`].

use std::time::Duration;

use thiserror::Error;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;
const MONTH: u64 = 30 * DAY;
const YEAR: u64 = 365 * DAY;

/// Error parsing a relative window expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("window expression is empty")]
    Empty,

    #[error("expected a number before '{0}'")]
    MissingNumber(String),

    #[error("number {0} has no unit")]
    MissingUnit(u64),

    #[error("unknown time unit '{0}'")]
    UnknownUnit(String),

    #[error("window expression overflows")]
    Overflow,
}

/// Parse a relative window expression into a [`Duration`].
///
/// Accepts one or more `<number> <unit>` pairs, separated by whitespace or
/// commas, with an optional leading sign. The sign is ignored: a window is
/// always a look-back amount, so `"-1 hour"` and `"1 hour"` are equal.
pub fn parse_relative(input: &str) -> Result<Duration, DurationError> {
    let trimmed = input.trim();
    let body = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('+'))
        .unwrap_or(trimmed)
        .trim_start();

    if body.is_empty() {
        return Err(DurationError::Empty);
    }

    let mut chars = body.chars().peekable();
    let mut total: u64 = 0;

    loop {
        while chars.next_if(|c| c.is_whitespace() || *c == ',').is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut digits = String::new();
        while let Some(c) = chars.next_if(char::is_ascii_digit) {
            digits.push(c);
        }

        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut unit = String::new();
        while let Some(c) = chars.next_if(|c| c.is_alphabetic()) {
            unit.push(c);
        }

        if digits.is_empty() {
            if unit.is_empty() {
                // Neither a number nor a unit: some stray symbol.
                let rest: String = chars.collect();
                return Err(DurationError::UnknownUnit(rest));
            }
            return Err(DurationError::MissingNumber(unit));
        }

        let amount: u64 = digits.parse().map_err(|_| DurationError::Overflow)?;
        if unit.is_empty() {
            return Err(DurationError::MissingUnit(amount));
        }

        let seconds = amount
            .checked_mul(unit_seconds(&unit)?)
            .ok_or(DurationError::Overflow)?;
        total = total.checked_add(seconds).ok_or(DurationError::Overflow)?;
    }

    Ok(Duration::from_secs(total))
}

fn unit_seconds(unit: &str) -> Result<u64, DurationError> {
    let seconds = match unit.to_ascii_lowercase().as_str() {
        "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => MINUTE,
        "h" | "hr" | "hrs" | "hour" | "hours" => HOUR,
        "d" | "day" | "days" => DAY,
        "w" | "wk" | "wks" | "week" | "weeks" => WEEK,
        "fortnight" | "fortnights" => 2 * WEEK,
        "month" | "months" => MONTH,
        "y" | "yr" | "yrs" | "year" | "years" => YEAR,
        _ => return Err(DurationError::UnknownUnit(unit.to_string())),
    };
    Ok(seconds)
}
