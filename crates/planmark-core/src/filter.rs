//! Visibility predicate for shapes.
//!
//! The predicate is pure: evaluated once per shape per redraw or hit-test
//! pass, with no memory between calls.

use crate::shapes::Shape;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    /// Monday of the first ISO week through Sunday of the last. `None` when
    /// either week does not exist.
    pub fn from_iso_weeks(from: (i32, u32), to: (i32, u32)) -> Option<Self> {
        let start = NaiveDate::from_isoywd_opt(from.0, from.1, Weekday::Mon)?;
        let end = NaiveDate::from_isoywd_opt(to.0, to.1, Weekday::Sun)?;
        Some(Self::new(start, end))
    }

    /// ISO (year, week) of a date.
    pub fn iso_week_of(date: NaiveDate) -> (i32, u32) {
        let week = date.iso_week();
        (week.year(), week.week())
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start <= self.end && end >= self.start
    }
}

/// Filter criteria. Every empty criterion passes everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    /// Case-insensitive substring over the text metadata.
    pub text: String,
    pub disciplines: BTreeSet<String>,
    pub statuses: BTreeSet<String>,
    pub date_window: Option<DateWindow>,
    pub show_hidden: bool,
}

impl FilterCriteria {
    /// Whether no criterion restricts anything.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
            && self.disciplines.is_empty()
            && self.statuses.is_empty()
            && self.date_window.is_none()
    }
}

/// AND of all criteria.
pub fn is_visible(shape: &Shape, criteria: &FilterCriteria) -> bool {
    if shape.hidden && !criteria.show_hidden {
        return false;
    }
    let meta = &shape.meta;

    let text = criteria.text.trim();
    if !text.is_empty() && !meta.matches_text(text) {
        return false;
    }
    if !criteria.disciplines.is_empty()
        && !meta
            .discipline_id
            .as_ref()
            .is_some_and(|d| criteria.disciplines.contains(d))
    {
        return false;
    }
    if !criteria.statuses.is_empty()
        && !meta
            .status_id
            .as_ref()
            .is_some_and(|s| criteria.statuses.contains(s))
    {
        return false;
    }
    if let Some(window) = criteria.date_window {
        // Undated shapes never overlap an active window.
        match meta.date_range() {
            Some((start, end)) if window.overlaps(start, end) => {}
            _ => return false,
        }
    }
    true
}
