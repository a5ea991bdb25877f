//! Deprecation markers on schema entries.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// Calendar date an argument was deprecated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeprecationDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl fmt::Display for DeprecationDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match NaiveDate::from_ymd_opt(self.year, self.month, self.day) {
            Some(date) => write!(f, "{}", date.format("%B %-d, %Y")),
            None => write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day),
        }
    }
}

/// Marks an argument as deprecated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Deprecation {
    /// When the argument was deprecated.
    pub date: DeprecationDate,

    /// What script authors should do instead.
    pub mitigation: &'static str,
}

impl Deprecation {
    pub const fn new(year: i32, month: u32, day: u32, mitigation: &'static str) -> Self {
        Self {
            date: DeprecationDate { year, month, day },
            mitigation,
        }
    }
}

/// A deprecated argument the caller supplied explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeprecationNotice {
    /// The argument name.
    pub argument: String,

    /// The deprecation that applies.
    pub deprecation: Deprecation,
}

impl fmt::Display for DeprecationNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is deprecated since {}. {}",
            self.argument, self.deprecation.date, self.deprecation.mitigation
        )
    }
}
