use chrono::{Datelike, Local, NaiveDate};
use log::{debug, info};

use crate::models::FeedDocument;
use crate::token::DateTokenParser;

/// Source of "today". Selection never reads the system clock directly.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Every post dated exactly on the requested day.
    Exact,
    /// The first post dated today or later.
    Upcoming,
}

impl SelectionMode {
    pub fn for_target(target: Option<NaiveDate>) -> Self {
        match target {
            Some(_) => SelectionMode::Exact,
            None => SelectionMode::Upcoming,
        }
    }
}

/// Pick the post messages relevant to `target`, or to `today` when no target is given.
///
/// Posts are scanned in feed order. Tokens carry no year, so each one is placed
/// in the year of the comparison date; a December post read against a January
/// date therefore lands eleven months in the future. The feed is assumed to be
/// newest first, which is what makes "first at or after today" meaningful.
pub fn select_posts(
    doc: &FeedDocument,
    target: Option<NaiveDate>,
    today: NaiveDate,
    parser: &dyn DateTokenParser,
) -> Vec<String> {
    let mode = SelectionMode::for_target(target);
    let anchor = target.unwrap_or(today);
    let mut selected = Vec::new();

    for post in &doc.data {
        let Some(message) = post.message.as_deref() else {
            continue;
        };
        let Some(token) = parser.parse(message) else {
            continue;
        };
        let Some(posted_for) = token.in_year(anchor.year()) else {
            debug!("Skipping {} {}/{}: no such day in {}", token.weekday, token.month, token.day, anchor.year());
            continue;
        };
        debug!("Parsed {} {}/{} -> {}", token.weekday, token.month, token.day, posted_for);

        match mode {
            SelectionMode::Exact if posted_for == anchor => {
                selected.push(message.to_string());
            }
            SelectionMode::Upcoming if posted_for >= anchor => {
                selected.push(message.to_string());
                break;
            }
            _ => {}
        }
    }

    info!(
        "Selected {} of {} posts for {} ({:?})",
        selected.len(),
        doc.data.len(),
        anchor,
        mode
    );
    selected
}
