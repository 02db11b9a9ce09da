use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use regex::Regex;

/// Default token shape: weekday label, a space, then month/day, e.g. `SAT 6/20`.
pub const DEFAULT_TOKEN_PATTERN: &str = r"([A-Z]+) ([0-9]+)/([0-9]+)";

/// A weekday label plus month/day pulled out of a post. No year is ever present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateToken {
    pub weekday: String,
    pub month: u32,
    pub day: u32,
}

impl DateToken {
    /// Calendar date of this token in the given year, or `None` when the
    /// month/day pair does not exist in that year (e.g. 2/29 outside leap years).
    pub fn in_year(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }
}

pub trait DateTokenParser {
    fn parse(&self, message: &str) -> Option<DateToken>;
}

/// Regex-backed parser. Only the leftmost match of a message is considered.
#[derive(Debug, Clone)]
pub struct RegexTokenParser {
    pattern: Regex,
}

impl RegexTokenParser {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)?;
        // group 0 is the whole match
        if pattern.captures_len() < 4 {
            return Err(anyhow!(
                "Token pattern needs three capture groups (weekday, month, day): {}",
                pattern.as_str()
            ));
        }
        Ok(Self { pattern })
    }

    #[cfg(test)]
    pub fn standard() -> Result<Self> {
        Self::new(DEFAULT_TOKEN_PATTERN)
    }
}

impl DateTokenParser for RegexTokenParser {
    fn parse(&self, message: &str) -> Option<DateToken> {
        let caps = self.pattern.captures(message)?;
        let weekday = caps.get(1)?.as_str().to_string();
        let month: u32 = caps.get(2)?.as_str().parse().ok()?;
        let day: u32 = caps.get(3)?.as_str().parse().ok()?;

        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return None;
        }

        Some(DateToken { weekday, month, day })
    }
}
