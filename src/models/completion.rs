// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Completion model: one dated record that a habit was performed.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Earliest year accepted at the write boundary.
pub const MIN_COMPLETION_YEAR: i32 = 1;
/// Latest year accepted at the write boundary.
pub const MAX_COMPLETION_YEAR: i32 = 9999;

/// Stored completion record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// ULID (also used as document ID)
    pub id: String,
    /// Owning streak
    pub streak_id: String,
    /// Day the habit was completed
    pub date_completed: NaiveDate,
    /// Weekday of `date_completed`, 0 = Monday .. 6 = Sunday
    pub day_of_week: u8,
}

impl Completion {
    /// Build a completion, deriving `day_of_week` from the date.
    pub fn new(id: String, streak_id: String, date_completed: NaiveDate) -> Self {
        Self {
            id,
            streak_id,
            date_completed,
            day_of_week: day_of_week(date_completed),
        }
    }

    /// Change the date, re-deriving `day_of_week`.
    pub fn set_date(&mut self, date_completed: NaiveDate) {
        self.date_completed = date_completed;
        self.day_of_week = day_of_week(date_completed);
    }
}

/// Weekday index with Monday = 0 and Sunday = 6.
pub fn day_of_week(date: NaiveDate) -> u8 {
    // num_days_from_monday is always in 0..=6
    date.weekday().num_days_from_monday() as u8
}

/// Reject completion dates outside the representable year range.
pub fn is_valid_completion_date(date: NaiveDate) -> bool {
    (MIN_COMPLETION_YEAR..=MAX_COMPLETION_YEAR).contains(&date.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monday_is_zero() {
        let monday = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert_eq!(day_of_week(monday), 0);
    }

    #[test]
    fn test_sunday_is_six() {
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 9).unwrap();
        assert_eq!(day_of_week(sunday), 6);
    }

    #[test]
    fn test_set_date_recomputes_weekday() {
        let mut c = Completion::new(
            "c1".to_string(),
            "s1".to_string(),
            NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
        );
        assert_eq!(c.day_of_week, 0);

        c.set_date(NaiveDate::from_ymd_opt(2024, 6, 14).unwrap());
        assert_eq!(c.day_of_week, 4);
    }

    #[test]
    fn test_completion_date_range() {
        assert!(is_valid_completion_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        assert!(is_valid_completion_date(NaiveDate::from_ymd_opt(9999, 12, 31).unwrap()));
        assert!(!is_valid_completion_date(NaiveDate::from_ymd_opt(0, 12, 31).unwrap()));
        assert!(!is_valid_completion_date(NaiveDate::from_ymd_opt(10000, 1, 1).unwrap()));
    }
}
