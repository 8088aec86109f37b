//! Date, time-of-day, duration, and Unix-timestamp literals.
//!
//! All four share the `@` prefix and are told apart by the shape of the
//! first few bytes after it: `P` opens a duration, a digit with `:` two
//! bytes ahead opens a time of day, a digit with `-` four bytes ahead opens
//! a calendar date, and a bare digit run is a Unix timestamp (seconds up to
//! ten digits, milliseconds beyond).

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::error::{Error, Result};
use crate::scanner::Scanner;
use crate::value::TimeOnly;

/// Decoded payload of an `@` literal.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Temporal {
    DateTime(DateTime<Utc>),
    TimeOnly(TimeOnly),
    Duration(String),
}

/// Scan one `@` literal. Range validation happens here, so the CST
/// parser rejects the same inputs the value parser does.
pub(crate) fn scan(sc: &mut Scanner) -> Result<Temporal> {
    sc.expect(b'@')?;

    match sc.peek() {
        Some(b'P') => scan_duration(sc),
        Some(b) if b.is_ascii_digit() => {
            if sc.peek_at(2) == Some(b':') {
                scan_time(sc)
            } else if sc.peek_at(4) == Some(b'-') {
                scan_date(sc)
            } else {
                scan_timestamp(sc)
            }
        }
        _ => Err(Error::syntax(
            sc.pos(),
            "expected date, time, duration, or timestamp after '@'",
        )),
    }
}

/// `P` followed by digits, dots, and the designators `Y M D T H M S`.
/// The body is stored verbatim.
fn scan_duration(sc: &mut Scanner) -> Result<Temporal> {
    let body_start = sc.pos();
    sc.bump(); // P

    while matches!(
        sc.peek(),
        Some(b'0'..=b'9' | b'.' | b'Y' | b'M' | b'D' | b'T' | b'H' | b'S')
    ) {
        sc.bump();
    }

    let body = sc.slice(body_start, sc.pos());
    if body.len() < 2 {
        return Err(Error::syntax(body_start, "malformed duration"));
    }
    if !body.iter().any(u8::is_ascii_digit) {
        return Err(Error::syntax(body_start, "malformed duration"));
    }

    let body = std::str::from_utf8(body)
        .map_err(|_| Error::syntax(body_start, "malformed duration"))?
        .to_string();
    Ok(Temporal::Duration(body))
}

/// `HH:mm:ss` with an optional `.SSS`.
fn scan_time(sc: &mut Scanner) -> Result<Temporal> {
    let hour = fixed_digits(sc, 2)?;
    sc.expect(b':')?;
    let minute = fixed_digits(sc, 2)?;
    sc.expect(b':')?;
    let second = fixed_digits(sc, 2)?;
    let millisecond = scan_millis(sc)?;

    check_range(sc, hour, 23, "hour")?;
    check_range(sc, minute, 59, "minute")?;
    check_range(sc, second, 59, "second")?;

    Ok(Temporal::TimeOnly(TimeOnly {
        hour: hour as u8,
        minute: minute as u8,
        second: second as u8,
        millisecond: millisecond as u16,
    }))
}

/// `YYYY-MM-DD`, optionally followed by `THH:mm:ss[.SSS]Z`. A bare date
/// lowers to midnight UTC.
fn scan_date(sc: &mut Scanner) -> Result<Temporal> {
    let date_start = sc.pos();
    let year = fixed_digits(sc, 4)?;
    sc.expect(b'-')?;
    let month = fixed_digits(sc, 2)?;
    sc.expect(b'-')?;
    let day = fixed_digits(sc, 2)?;

    let date = NaiveDate::from_ymd_opt(year as i32, month, day)
        .ok_or_else(|| Error::range(date_start, "invalid calendar date"))?;

    let (hour, minute, second, millisecond) = if sc.peek() == Some(b'T') {
        sc.bump();
        let hour = fixed_digits(sc, 2)?;
        sc.expect(b':')?;
        let minute = fixed_digits(sc, 2)?;
        sc.expect(b':')?;
        let second = fixed_digits(sc, 2)?;
        let millisecond = scan_millis(sc)?;
        sc.expect(b'Z')?;

        check_range(sc, hour, 23, "hour")?;
        check_range(sc, minute, 59, "minute")?;
        check_range(sc, second, 59, "second")?;
        (hour, minute, second, millisecond)
    } else {
        (0, 0, 0, 0)
    };

    let dt = date
        .and_hms_milli_opt(hour, minute, second, millisecond)
        .ok_or_else(|| Error::range(date_start, "invalid time of day"))?
        .and_utc();
    Ok(Temporal::DateTime(dt))
}

/// Digits since the Unix epoch: up to ten digits are seconds, more are
/// milliseconds.
fn scan_timestamp(sc: &mut Scanner) -> Result<Temporal> {
    let digits_start = sc.pos();
    while matches!(sc.peek(), Some(b) if b.is_ascii_digit()) {
        sc.bump();
    }
    let digits = sc.slice(digits_start, sc.pos());

    let raw: i64 = std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::range(digits_start, "timestamp out of range"))?;

    let dt = if digits.len() <= 10 {
        Utc.timestamp_opt(raw, 0).single()
    } else {
        Utc.timestamp_millis_opt(raw).single()
    };
    let dt = dt.ok_or_else(|| Error::range(digits_start, "timestamp out of range"))?;
    Ok(Temporal::DateTime(dt))
}

/// Optional `.SSS` fraction: exactly three digits when present.
fn scan_millis(sc: &mut Scanner) -> Result<u32> {
    if sc.peek() != Some(b'.') {
        return Ok(0);
    }
    sc.bump();
    fixed_digits(sc, 3)
}

/// Consume exactly `n` digits and return their value.
fn fixed_digits(sc: &mut Scanner, n: usize) -> Result<u32> {
    let start = sc.pos();
    sc.skip_digits(n)?;
    let mut value: u32 = 0;
    for &b in sc.slice(start, sc.pos()) {
        value = value * 10 + u32::from(b - b'0');
    }
    Ok(value)
}

fn check_range(sc: &Scanner, value: u32, max: u32, field: &str) -> Result<()> {
    if value > max {
        return Err(Error::range(sc.pos(), format!("{field} out of range")));
    }
    Ok(())
}
