// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cross-streak overview for the statistics dashboard.
//!
//! Built on demand from the cached per-streak statistics plus the raw
//! completion log. Unlike the per-streak fields this is never stored.

use crate::models::stats::saturating_u32;
use crate::models::{Completion, Streak};
use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Number of trailing days in the daily activity series.
const DAILY_WINDOW_DAYS: u64 = 30;
/// Number of trailing days used for the completion rate.
const RATE_WINDOW_DAYS: u64 = 7;
/// Number of Monday-start weeks in the weekly trend.
const WEEKLY_WINDOW_WEEKS: u64 = 8;

const DAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DayCount {
    pub day: String,
    pub completions: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DateCount {
    pub date: NaiveDate,
    pub completions: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StreakComparison {
    pub id: String,
    pub name: String,
    pub color: String,
    pub current: u32,
    pub longest: u32,
    pub total: u32,
}

/// Aggregate insights across all streaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StreakOverview {
    pub total_streaks: u32,
    pub total_completions: u32,
    /// Sum of every streak's current streak
    pub total_current_streak: u32,
    /// Best longest streak across all streaks
    pub longest_streak: u32,
    /// First streak holding `longest_streak`
    pub best_streak_id: Option<String>,
    /// Completion counts Monday..Sunday
    pub day_of_week: Vec<DayCount>,
    /// Per-day counts for the last 30 days, oldest first
    pub last_30_days: Vec<DateCount>,
    pub completions_last_7: u32,
    /// Percentage of possible completions logged in the last 7 days
    pub completion_rate: u32,
    /// Counts per Monday-start week, oldest first; `date` is the Monday
    pub weekly: Vec<DateCount>,
    /// Sorted by current streak, highest first
    pub streak_comparison: Vec<StreakComparison>,
}

impl StreakOverview {
    pub fn build(streaks: &[Streak], completions: &[Completion], today: NaiveDate) -> Self {
        let mut by_date: HashMap<NaiveDate, u32> = HashMap::new();
        let mut weekday_counts = [0u32; 7];
        for c in completions {
            let count = by_date.entry(c.date_completed).or_insert(0);
            *count = count.saturating_add(1);
            if let Some(slot) = weekday_counts.get_mut(usize::from(c.day_of_week)) {
                *slot = slot.saturating_add(1);
            }
        }

        let longest_streak = streaks.iter().map(|s| s.longest_streak).max().unwrap_or(0);
        let best_streak_id = streaks
            .iter()
            .find(|s| s.longest_streak == longest_streak)
            .map(|s| s.id.clone());

        let last_30_days = (0..DAILY_WINDOW_DAYS)
            .rev()
            .filter_map(|back| today.checked_sub_days(Days::new(back)))
            .map(|date| DateCount {
                date,
                completions: by_date.get(&date).copied().unwrap_or(0),
            })
            .collect();

        let completions_last_7 = count_between(
            &by_date,
            today
                .checked_sub_days(Days::new(RATE_WINDOW_DAYS - 1))
                .unwrap_or(NaiveDate::MIN),
            today,
        );
        let possible = u64::from(saturating_u32(streaks.len())) * RATE_WINDOW_DAYS;
        let completion_rate = if possible > 0 {
            (f64::from(completions_last_7) * 100.0 / possible as f64).round() as u32
        } else {
            0
        };

        let this_monday = today
            .checked_sub_days(Days::new(u64::from(today.weekday().num_days_from_monday())))
            .unwrap_or(NaiveDate::MIN);
        let weekly = (0..WEEKLY_WINDOW_WEEKS)
            .rev()
            .filter_map(|back| this_monday.checked_sub_days(Days::new(back * 7)))
            .map(|monday| {
                let sunday = monday.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX);
                DateCount {
                    date: monday,
                    completions: count_between(&by_date, monday, sunday),
                }
            })
            .collect();

        let mut streak_comparison: Vec<StreakComparison> = streaks
            .iter()
            .map(|s| StreakComparison {
                id: s.id.clone(),
                name: s.name.clone(),
                color: s.color.clone(),
                current: s.current_streak,
                longest: s.longest_streak,
                total: s.days_completed,
            })
            .collect();
        streak_comparison.sort_by(|a, b| b.current.cmp(&a.current));

        Self {
            total_streaks: saturating_u32(streaks.len()),
            total_completions: saturating_u32(completions.len()),
            total_current_streak: streaks
                .iter()
                .fold(0u32, |sum, s| sum.saturating_add(s.current_streak)),
            longest_streak,
            best_streak_id,
            day_of_week: DAY_NAMES
                .iter()
                .zip(weekday_counts)
                .map(|(day, completions)| DayCount {
                    day: (*day).to_string(),
                    completions,
                })
                .collect(),
            last_30_days,
            completions_last_7,
            completion_rate,
            weekly,
            streak_comparison,
        }
    }
}

/// Count completions with a date in `[from, to]`.
fn count_between(by_date: &HashMap<NaiveDate, u32>, from: NaiveDate, to: NaiveDate) -> u32 {
    by_date
        .iter()
        .filter(|(date, _)| (from..=to).contains(*date))
        .fold(0u32, |sum, (_, count)| sum.saturating_add(*count))
}
