// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Streak service: the only path through which completions are written.
//!
//! Every completion create, update and delete runs in a unit of work that
//! also recomputes the owning streak's statistics:
//! 1. Acquire the per-streak lock
//! 2. Load the streak and its completion log
//! 3. Stage the completion change
//! 4. Recompute statistics from the staged log and stage the result
//! 5. Commit both together
//!
//! A failure at any step is returned to the caller and nothing is written.

use crate::db::{StreakStore, UnitOfWork};
use crate::error::{AppError, Result};
use crate::models::completion::is_valid_completion_date;
use crate::models::{Completion, Streak, StreakDetails, StreakOverview, StreakStats};
use chrono::NaiveDate;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-streak locks serializing units of work within this process.
pub type StreakLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Source of "today" for statistics.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// A committed completion together with its streak's new statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionWrite {
    pub completion: Completion,
    pub stats: StreakStats,
}

/// Recompute statistics from the staged completion log and stage them.
///
/// This is the recalculation step run by every completion mutation and by
/// [`StreakService::recalculate`].
pub fn recalculate_staged(work: &mut UnitOfWork, today: NaiveDate) -> StreakStats {
    let stats = StreakStats::calculate(work.completion_dates(), today);
    work.set_stats(stats);
    stats
}

/// Holds one streak's lock for the duration of a unit of work.
///
/// On drop the map entry is removed unless another task holds or awaits the
/// same lock, so the map only tracks streaks with work in flight.
struct StreakGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: StreakLocks,
    streak_id: String,
}

impl Drop for StreakGuard {
    fn drop(&mut self) {
        self.guard.take();
        // Entry lookups clone under the shard lock, so a count of 1 here
        // means nobody else can reach this mutex.
        self.locks
            .remove_if(&self.streak_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[derive(Clone)]
pub struct StreakService {
    store: Arc<dyn StreakStore>,
    locks: StreakLocks,
    clock: Clock,
}

impl StreakService {
    /// Create a service using the local wall-clock date as "today".
    pub fn new(store: Arc<dyn StreakStore>) -> Self {
        Self::with_clock(store, || chrono::Local::now().date_naive())
    }

    /// Create a service with a custom source of "today".
    pub fn with_clock<F>(store: Arc<dyn StreakStore>, clock: F) -> Self
    where
        F: Fn() -> NaiveDate + Send + Sync + 'static,
    {
        Self {
            store,
            locks: Arc::new(DashMap::new()),
            clock: Arc::new(clock),
        }
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    async fn lock_streak(&self, streak_id: &str) -> StreakGuard {
        let lock = self
            .locks
            .entry(streak_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        StreakGuard {
            guard: Some(lock.lock_owned().await),
            locks: self.locks.clone(),
            streak_id: streak_id.to_string(),
        }
    }

    // ─── Streaks ─────────────────────────────────────────────────

    pub async fn create_streak(&self, details: StreakDetails) -> Result<Streak> {
        let streak = Streak::new(ulid::Ulid::new().to_string(), details);
        self.store.insert_streak(&streak).await?;
        tracing::info!(streak_id = %streak.id, name = %streak.name, "Streak created");
        Ok(streak)
    }

    pub async fn get_streak(&self, streak_id: &str) -> Result<Streak> {
        self.store
            .get_streak(streak_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Streak {}", streak_id)))
    }

    pub async fn list_streaks(&self) -> Result<Vec<Streak>> {
        self.store.list_streaks().await
    }

    /// Update the client-editable fields; statistics are never touched.
    pub async fn update_streak(&self, streak_id: &str, details: StreakDetails) -> Result<Streak> {
        let _guard = self.lock_streak(streak_id).await;
        self.store.update_streak_details(streak_id, &details).await?;
        tracing::info!(streak_id, "Streak details updated");
        self.get_streak(streak_id).await
    }

    /// Delete a streak and its completions. Returns the completions removed.
    pub async fn delete_streak(&self, streak_id: &str) -> Result<usize> {
        let _guard = self.lock_streak(streak_id).await;
        let removed = self.store.delete_streak(streak_id).await?;

        tracing::info!(streak_id, completions = removed, "Streak deleted");
        Ok(removed)
    }

    // ─── Completions ─────────────────────────────────────────────

    pub async fn get_completion(&self, completion_id: &str) -> Result<Completion> {
        self.store
            .get_completion(completion_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Completion {}", completion_id)))
    }

    pub async fn list_completions(&self, streak_id: Option<&str>) -> Result<Vec<Completion>> {
        if let Some(id) = streak_id {
            self.get_streak(id).await?;
        }
        self.store.list_completions(streak_id).await
    }

    /// Log a completion and recompute the owning streak's statistics.
    pub async fn create_completion(
        &self,
        streak_id: &str,
        date_completed: NaiveDate,
    ) -> Result<CompletionWrite> {
        validate_date(date_completed)?;

        let _guard = self.lock_streak(streak_id).await;
        let mut work = self.store.begin(streak_id).await.map_err(|e| match e {
            AppError::NotFound(_) => {
                AppError::BadRequest(format!("Streak {} does not exist", streak_id))
            }
            other => other,
        })?;

        let completion = Completion::new(
            ulid::Ulid::new().to_string(),
            streak_id.to_string(),
            date_completed,
        );
        work.put_completion(completion.clone())?;
        let stats = recalculate_staged(&mut work, self.today());
        self.store.commit(work).await?;

        tracing::info!(
            streak_id,
            completion_id = %completion.id,
            date = %date_completed,
            current_streak = stats.current_streak,
            "Completion logged"
        );

        Ok(CompletionWrite { completion, stats })
    }

    /// Change a completion's date and recompute the owning streak.
    ///
    /// A completion cannot move to another streak; `streak_id`, when given,
    /// must match its current owner.
    pub async fn update_completion(
        &self,
        completion_id: &str,
        streak_id: Option<&str>,
        date_completed: NaiveDate,
    ) -> Result<CompletionWrite> {
        validate_date(date_completed)?;

        let existing = self.get_completion(completion_id).await?;
        if let Some(requested) = streak_id {
            if requested != existing.streak_id {
                return Err(AppError::BadRequest(
                    "A completion cannot be moved to another streak".to_string(),
                ));
            }
        }

        let _guard = self.lock_streak(&existing.streak_id).await;
        let mut work = self.store.begin(&existing.streak_id).await?;

        // Re-read under the lock; it may have been deleted meanwhile
        let mut completion = work
            .completion(completion_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Completion {}", completion_id)))?;
        completion.set_date(date_completed);
        work.put_completion(completion.clone())?;
        let stats = recalculate_staged(&mut work, self.today());
        self.store.commit(work).await?;

        tracing::info!(
            streak_id = %completion.streak_id,
            completion_id,
            date = %date_completed,
            current_streak = stats.current_streak,
            "Completion updated"
        );

        Ok(CompletionWrite { completion, stats })
    }

    /// Delete a completion and recompute the owning streak.
    pub async fn delete_completion(&self, completion_id: &str) -> Result<CompletionWrite> {
        let existing = self.get_completion(completion_id).await?;

        let _guard = self.lock_streak(&existing.streak_id).await;
        let mut work = self.store.begin(&existing.streak_id).await?;

        let completion = work
            .delete_completion(completion_id)
            .ok_or_else(|| AppError::NotFound(format!("Completion {}", completion_id)))?;
        let stats = recalculate_staged(&mut work, self.today());
        self.store.commit(work).await?;

        tracing::info!(
            streak_id = %completion.streak_id,
            completion_id,
            current_streak = stats.current_streak,
            "Completion deleted"
        );

        Ok(CompletionWrite { completion, stats })
    }

    // ─── Recalculation ───────────────────────────────────────────

    /// Recompute and store a streak's statistics from its completion log.
    ///
    /// Safe to call at any time; with no intervening completion writes two
    /// calls return the same statistics.
    pub async fn recalculate(&self, streak_id: &str) -> Result<StreakStats> {
        let _guard = self.lock_streak(streak_id).await;
        let mut work = self.store.begin(streak_id).await?;
        let stats = recalculate_staged(&mut work, self.today());
        self.store.commit(work).await?;

        tracing::debug!(
            streak_id,
            current_streak = stats.current_streak,
            longest_streak = stats.longest_streak,
            days_completed = stats.days_completed,
            "Streak recalculated"
        );

        Ok(stats)
    }

    /// Recalculate every streak.
    ///
    /// Cached current streaks go stale as days pass without new writes; this
    /// brings them up to date. Streaks deleted while the refresh runs are
    /// skipped.
    pub async fn refresh_all(&self) -> Result<Vec<(String, StreakStats)>> {
        let streaks = self.store.list_streaks().await?;
        let mut refreshed = Vec::with_capacity(streaks.len());

        for streak in streaks {
            match self.recalculate(&streak.id).await {
                Ok(stats) => refreshed.push((streak.id, stats)),
                Err(AppError::NotFound(_)) => {
                    tracing::debug!(streak_id = %streak.id, "Streak deleted during refresh");
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(count = refreshed.len(), "Refreshed all streaks");
        Ok(refreshed)
    }

    // ─── Overview ────────────────────────────────────────────────

    pub async fn overview(&self) -> Result<StreakOverview> {
        let streaks = self.store.list_streaks().await?;
        let completions = self.store.list_completions(None).await?;
        Ok(StreakOverview::build(&streaks, &completions, self.today()))
    }
}

fn validate_date(date: NaiveDate) -> Result<()> {
    if is_valid_completion_date(date) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Completion date {} is out of range",
            date
        )))
    }
}
