// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Derived streak statistics.
//!
//! These values are cached on each streak and recomputed from the full
//! completion log whenever a completion is written, so reads never need to
//! walk the log.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// The three derived statistics of a streak.
///
/// Field names match the corresponding fields on [`crate::models::Streak`]
/// so the struct can be written as a partial update of the streak document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StreakStats {
    /// Consecutive days ending today, or yesterday if today is not logged yet
    pub current_streak: u32,
    /// Longest run of consecutive days anywhere in the history
    pub longest_streak: u32,
    /// Number of distinct days with a completion
    pub days_completed: u32,
}

impl StreakStats {
    /// Compute statistics from a streak's completion dates.
    ///
    /// Duplicate dates collapse and order does not matter. `today` is the
    /// reference day: the current streak is anchored at `today` when it is
    /// present, otherwise at the day before, so an unlogged current day does
    /// not break the streak yet.
    pub fn calculate<I>(dates: I, today: NaiveDate) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let days: BTreeSet<NaiveDate> = dates.into_iter().collect();

        Self {
            current_streak: current_run(&days, today),
            longest_streak: longest_run(&days),
            days_completed: saturating_u32(days.len()),
        }
    }
}

/// Walk backward from the anchor day while each day is present.
fn current_run(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let anchor = if days.contains(&today) {
        Some(today)
    } else {
        today.pred_opt().filter(|yesterday| days.contains(yesterday))
    };

    let mut count = 0;
    let mut day = anchor;
    while let Some(d) = day.filter(|d| days.contains(d)) {
        count += 1;
        day = d.pred_opt();
    }
    count
}

/// Longest run of consecutive calendar days in an ordered set.
fn longest_run(days: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;

    for &day in days {
        let consecutive = prev
            .and_then(|p| p.checked_add_days(Days::new(1)))
            .is_some_and(|next| next == day);
        run = if consecutive { run + 1 } else { 1 };
        longest = longest.max(run);
        prev = Some(day);
    }
    longest
}

/// Convert a count to `u32`, clamping at `u32::MAX`.
pub(crate) fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
