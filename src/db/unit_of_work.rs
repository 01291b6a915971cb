// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Staged writes for a single streak.

use crate::error::AppError;
use crate::models::{Completion, Streak, StreakStats};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// A completion write staged in a [`UnitOfWork`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagedWrite {
    PutCompletion(Completion),
    DeleteCompletion(String),
}

/// Snapshot of one streak's completion log plus the writes staged on it.
///
/// Reads through the unit of work see staged writes, so statistics computed
/// from [`UnitOfWork::completion_dates`] already reflect the pending change.
#[derive(Debug)]
pub struct UnitOfWork {
    streak: Streak,
    completions: BTreeMap<String, Completion>,
    writes: Vec<StagedWrite>,
    stats: Option<StreakStats>,
}

impl UnitOfWork {
    pub fn new(streak: Streak, completions: Vec<Completion>) -> Self {
        Self {
            streak,
            completions: completions.into_iter().map(|c| (c.id.clone(), c)).collect(),
            writes: Vec::new(),
            stats: None,
        }
    }

    pub fn completion(&self, completion_id: &str) -> Option<&Completion> {
        self.completions.get(completion_id)
    }

    /// Dates of every completion in the staged view (duplicates included).
    pub fn completion_dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.completions.values().map(|c| c.date_completed)
    }

    /// Stage a create or update of a completion owned by this streak.
    pub fn put_completion(&mut self, completion: Completion) -> Result<(), AppError> {
        if completion.streak_id != self.streak.id {
            return Err(AppError::BadRequest(format!(
                "Completion {} belongs to streak {}, not {}",
                completion.id, completion.streak_id, self.streak.id
            )));
        }
        self.completions
            .insert(completion.id.clone(), completion.clone());
        self.writes.push(StagedWrite::PutCompletion(completion));
        Ok(())
    }

    /// Stage deletion of a completion, returning it.
    pub fn delete_completion(&mut self, completion_id: &str) -> Option<Completion> {
        let removed = self.completions.remove(completion_id)?;
        self.writes
            .push(StagedWrite::DeleteCompletion(completion_id.to_string()));
        Some(removed)
    }

    /// Stage the recomputed statistics. A later call replaces an earlier one.
    pub fn set_stats(&mut self, stats: StreakStats) {
        self.stats = Some(stats);
    }

    /// Statistics staged so far, if any.
    pub fn staged_stats(&self) -> Option<StreakStats> {
        self.stats
    }

    pub fn writes(&self) -> &[StagedWrite] {
        &self.writes
    }

    /// Split into the streak ID, completion writes and statistics write.
    pub fn into_parts(self) -> (String, Vec<StagedWrite>, Option<StreakStats>) {
        (self.streak.id, self.writes, self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StreakDetails;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn work() -> UnitOfWork {
        let streak = Streak::new(
            "s1".to_string(),
            StreakDetails {
                name: "Read".to_string(),
                is_active: true,
                start_date: d("2024-06-01"),
                color: "#111111".to_string(),
            },
        );
        let existing = vec![
            Completion::new("c1".to_string(), "s1".to_string(), d("2024-06-08")),
            Completion::new("c2".to_string(), "s1".to_string(), d("2024-06-09")),
        ];
        UnitOfWork::new(streak, existing)
    }

    fn sorted_dates(work: &UnitOfWork) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = work.completion_dates().collect();
        dates.sort();
        dates
    }

    #[test]
    fn test_staged_put_is_visible() {
        let mut work = work();
        work.put_completion(Completion::new("c3".to_string(), "s1".to_string(), d("2024-06-10")))
            .unwrap();

        assert_eq!(
            sorted_dates(&work),
            vec![d("2024-06-08"), d("2024-06-09"), d("2024-06-10")]
        );
        assert_eq!(work.writes().len(), 1);
    }

    #[test]
    fn test_staged_update_replaces_date() {
        let mut work = work();
        let mut c1 = work.completion("c1").cloned().unwrap();
        c1.set_date(d("2024-06-10"));
        work.put_completion(c1).unwrap();

        assert_eq!(sorted_dates(&work), vec![d("2024-06-09"), d("2024-06-10")]);
    }

    #[test]
    fn test_staged_delete_is_visible() {
        let mut work = work();
        let removed = work.delete_completion("c2").unwrap();

        assert_eq!(removed.date_completed, d("2024-06-09"));
        assert_eq!(sorted_dates(&work), vec![d("2024-06-08")]);
        assert_eq!(
            work.writes(),
            &[StagedWrite::DeleteCompletion("c2".to_string())]
        );
    }

    #[test]
    fn test_delete_unknown_stages_nothing() {
        let mut work = work();
        assert!(work.delete_completion("missing").is_none());
        assert!(work.writes().is_empty());
    }

    #[test]
    fn test_put_for_other_streak_rejected() {
        let mut work = work();
        let err = work
            .put_completion(Completion::new("c9".to_string(), "s2".to_string(), d("2024-06-10")))
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(work.writes().is_empty());
    }

    #[test]
    fn test_last_stats_wins() {
        let mut work = work();
        assert_eq!(work.staged_stats(), None);
        work.set_stats(StreakStats::default());
        assert_eq!(work.staged_stats(), Some(StreakStats::default()));
        work.set_stats(StreakStats {
            current_streak: 2,
            longest_streak: 2,
            days_completed: 2,
        });

        let (streak_id, writes, stats) = work.into_parts();
        assert_eq!(streak_id, "s1");
        assert!(writes.is_empty());
        assert_eq!(stats.unwrap().current_streak, 2);
    }
}
