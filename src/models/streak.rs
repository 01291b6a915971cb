// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Streak model for storage and API.

use crate::models::StreakStats;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Stored streak record.
///
/// The derived statistics are only ever written by the recalculation step
/// in [`crate::services::StreakService`]; client edits go through
/// [`StreakDetails`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    /// ULID (also used as document ID)
    pub id: String,
    /// Display name
    pub name: String,
    /// Whether the habit is still being tracked
    pub is_active: bool,
    /// Day the habit was started
    pub start_date: NaiveDate,
    /// Color tag, unique across streaks
    pub color: String,
    /// Derived: consecutive days ending today or yesterday
    #[serde(default)]
    pub current_streak: u32,
    /// Derived: longest consecutive run in the history
    #[serde(default)]
    pub longest_streak: u32,
    /// Derived: number of distinct days completed
    #[serde(default)]
    pub days_completed: u32,
}

/// Client-editable streak fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakDetails {
    pub name: String,
    pub is_active: bool,
    pub start_date: NaiveDate,
    pub color: String,
}

impl Streak {
    /// Build a new streak with zeroed statistics.
    pub fn new(id: String, details: StreakDetails) -> Self {
        Self {
            id,
            name: details.name,
            is_active: details.is_active,
            start_date: details.start_date,
            color: details.color,
            current_streak: 0,
            longest_streak: 0,
            days_completed: 0,
        }
    }

    /// Current derived statistics.
    pub fn stats(&self) -> StreakStats {
        StreakStats {
            current_streak: self.current_streak,
            longest_streak: self.longest_streak,
            days_completed: self.days_completed,
        }
    }

    /// Overwrite exactly the three derived fields.
    pub fn apply_stats(&mut self, stats: StreakStats) {
        self.current_streak = stats.current_streak;
        self.longest_streak = stats.longest_streak;
        self.days_completed = stats.days_completed;
    }

    /// Overwrite the client-editable fields, leaving statistics alone.
    pub fn apply_details(&mut self, details: StreakDetails) {
        self.name = details.name;
        self.is_active = details.is_active;
        self.start_date = details.start_date;
        self.color = details.color;
    }

    /// Client-editable fields of this streak.
    pub fn details(&self) -> StreakDetails {
        StreakDetails {
            name: self.name.clone(),
            is_active: self.is_active,
            start_date: self.start_date,
            color: self.color.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(name: &str, color: &str) -> StreakDetails {
        StreakDetails {
            name: name.to_string(),
            is_active: true,
            start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            color: color.to_string(),
        }
    }

    #[test]
    fn test_new_streak_has_zero_stats() {
        let streak = Streak::new("s1".to_string(), details("Run", "#ff0000"));
        assert_eq!(streak.stats(), StreakStats::default());
    }

    #[test]
    fn test_apply_details_keeps_stats() {
        let mut streak = Streak::new("s1".to_string(), details("Run", "#ff0000"));
        streak.apply_stats(StreakStats {
            current_streak: 3,
            longest_streak: 5,
            days_completed: 9,
        });

        streak.apply_details(details("Morning run", "#00ff00"));

        assert_eq!(streak.name, "Morning run");
        assert_eq!(streak.color, "#00ff00");
        assert_eq!(streak.longest_streak, 5);
        assert_eq!(streak.days_completed, 9);
    }

    #[test]
    fn test_missing_stats_default_on_deserialize() {
        let json = r##"{"id":"s1","name":"Read","is_active":true,"start_date":"2024-06-01","color":"#123456"}"##;
        let streak: Streak = serde_json::from_str(json).unwrap();
        assert_eq!(streak.stats(), StreakStats::default());
    }
}
