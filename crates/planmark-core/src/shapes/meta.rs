//! Zone metadata: schedule fields and linked activities.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A schedule activity linked to a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedActivity {
    pub code: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

/// Metadata attached to every shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneMeta {
    pub name: String,
    pub discipline_id: Option<String>,
    pub status_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Single-day date from older files. Only consulted when neither
    /// `start_date` nor `end_date` is set.
    pub date: Option<NaiveDate>,
    pub comments: String,
    pub contact: String,
    pub notes: String,
    pub custom: BTreeMap<String, String>,
    pub activities: Vec<LinkedActivity>,
}

impl ZoneMeta {
    /// Effective inclusive date range, if any date is known.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Some((start.min(end), start.max(end))),
            (Some(day), None) | (None, Some(day)) => Some((day, day)),
            (None, None) => self.date.map(|day| (day, day)),
        }
    }

    /// Link an activity (replacing one with the same code) and widen the
    /// zone dates to cover all linked activities.
    pub fn link_activity(&mut self, activity: LinkedActivity) {
        match self.activities.iter_mut().find(|a| a.code == activity.code) {
            Some(existing) => *existing = activity,
            None => self.activities.push(activity),
        }
        self.recompute_dates();
    }

    /// Unlink an activity by code. Returns the removed activity.
    ///
    /// When other activities remain, the zone dates are recomputed from them;
    /// when none remain the dates are left as they were.
    pub fn unlink_activity(&mut self, code: &str) -> Option<LinkedActivity> {
        let index = self.activities.iter().position(|a| a.code == code)?;
        let removed = self.activities.remove(index);
        self.recompute_dates();
        Some(removed)
    }

    /// Set start/end to the min start and max end over linked activities.
    fn recompute_dates(&mut self) {
        let start = self.activities.iter().filter_map(|a| a.start).min();
        let end = self.activities.iter().filter_map(|a| a.end).max();
        if start.is_some() {
            self.start_date = start;
        }
        if end.is_some() {
            self.end_date = end;
        }
    }

    /// Case-insensitive match of `needle` against the text fields.
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [&self.name, &self.comments, &self.contact, &self.notes]
            .into_iter()
            .chain(self.custom.values())
            .any(|field| field.to_lowercase().contains(&needle))
            || self
                .activities
                .iter()
                .any(|a| a.code.to_lowercase().contains(&needle) || a.title.to_lowercase().contains(&needle))
    }
}
