// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! [`StreakStore`] is implemented by an in-memory store and by Firestore.
//! Completion writes never go through the store directly: callers open a
//! [`UnitOfWork`] for the owning streak, stage the completion change and
//! the recomputed statistics, and commit them together.

pub mod firestore;
pub mod memory;
pub mod unit_of_work;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;
pub use unit_of_work::{StagedWrite, UnitOfWork};

use crate::error::AppError;
use crate::models::{Completion, Streak, StreakDetails};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const STREAKS: &str = "streaks";
    pub const COMPLETIONS: &str = "completions";
}

/// Persistence for streaks and their completion logs.
#[async_trait]
pub trait StreakStore: Send + Sync {
    // ─── Streaks ─────────────────────────────────────────────────

    /// Store a new streak. Fails with `Conflict` if its color is taken.
    async fn insert_streak(&self, streak: &Streak) -> Result<(), AppError>;

    async fn get_streak(&self, streak_id: &str) -> Result<Option<Streak>, AppError>;

    async fn list_streaks(&self) -> Result<Vec<Streak>, AppError>;

    /// Overwrite only the client-editable fields of a streak.
    ///
    /// Fails with `NotFound` for an unknown streak and `Conflict` if the new
    /// color belongs to another streak.
    async fn update_streak_details(
        &self,
        streak_id: &str,
        details: &StreakDetails,
    ) -> Result<(), AppError>;

    /// Delete a streak and all of its completions.
    ///
    /// Returns the number of completions removed.
    async fn delete_streak(&self, streak_id: &str) -> Result<usize, AppError>;

    // ─── Completions ─────────────────────────────────────────────

    async fn get_completion(&self, completion_id: &str) -> Result<Option<Completion>, AppError>;

    /// List completions, optionally for one streak, ordered by date.
    async fn list_completions(&self, streak_id: Option<&str>)
        -> Result<Vec<Completion>, AppError>;

    // ─── Units of work ───────────────────────────────────────────

    /// Load a streak and its full completion log for a unit of work.
    ///
    /// Fails with `NotFound` if the streak does not exist.
    async fn begin(&self, streak_id: &str) -> Result<UnitOfWork, AppError>;

    /// Apply every staged write of `work` atomically.
    async fn commit(&self, work: UnitOfWork) -> Result<(), AppError>;
}
