//! Free-form date input for the `new` command.
//!
//! Accepted shapes, separators `/`, `-` or `.`:
//!
//! | Input | Result |
//! |---|---|
//! | `2024/05/10`, `2024-5-10`, `2024.05.10` | that date |
//! | `20240510` | that date |
//! | `2024-05-10T09:30:00` | the date part |
//! | `05/10`, `5-10` | that month/day in `today`'s year |
//!
//! Anything else yields `None`.
//!
//! Commands pick a policy for bad input: `new` creates today's post
//! ([`date_or_today`]), while commands acting on an existing post refuse to
//! guess ([`require_date`]).

use chrono::{Datelike, NaiveDate};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DateError {
    #[error("cannot parse date '{0}'")]
    Unparseable(String),
}

const FULL_FORMATS: &[&str] = &["%Y/%m/%d", "%Y-%m-%d", "%Y.%m.%d"];

/// Parse a date typed on the command line. Year-less input takes `today`'s year.
pub fn parse_post_date(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let trimmed = input.trim();
    // Drop a time component: `2024-05-10T09:30` / `2024-05-10 09:30`.
    let date_part = trimmed.split(['T', ' ']).next().unwrap_or_default();
    if date_part.is_empty() {
        return None;
    }

    if let Some(date) = FULL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
    {
        return Some(date);
    }

    if date_part.len() == 8 && date_part.chars().all(|c| c.is_ascii_digit()) {
        let year = date_part[..4].parse().ok()?;
        let month = date_part[4..6].parse().ok()?;
        let day = date_part[6..].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let parts: Vec<&str> = date_part.split(['/', '-', '.']).collect();
    if let [month, day] = parts.as_slice() {
        let month = month.parse().ok()?;
        let day = day.parse().ok()?;
        return NaiveDate::from_ymd_opt(today.year(), month, day);
    }

    None
}

/// Optional `--date` input, falling back to `today` when absent or unparseable.
pub fn date_or_today(input: Option<&str>, today: NaiveDate) -> NaiveDate {
    match input {
        None => today,
        Some(input) => parse_post_date(input, today).unwrap_or_else(|| {
            warn!(input, "Could not parse date, using today");
            today
        }),
    }
}

/// Optional `--date` input: `today` when absent, an error when unparseable.
pub fn require_date(input: Option<&str>, today: NaiveDate) -> Result<NaiveDate, DateError> {
    match input {
        None => Ok(today),
        Some(input) => {
            parse_post_date(input, today).ok_or_else(|| DateError::Unparseable(input.to_string()))
        }
    }
}
