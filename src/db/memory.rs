// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Process-local store for development and tests.
//!
//! All tables live behind one lock, so a commit applies its completion
//! writes and its statistics write in a single critical section.

use crate::db::{StagedWrite, StreakStore, UnitOfWork};
use crate::error::AppError;
use crate::models::{Completion, Streak, StreakDetails};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    streaks: HashMap<String, Streak>,
    completions: HashMap<String, Completion>,
}

impl Tables {
    fn color_taken(&self, color: &str, except_id: Option<&str>) -> bool {
        self.streaks
            .values()
            .any(|s| s.color == color && Some(s.id.as_str()) != except_id)
    }

    fn completions_for(&self, streak_id: &str) -> Vec<Completion> {
        let mut list: Vec<Completion> = self
            .completions
            .values()
            .filter(|c| c.streak_id == streak_id)
            .cloned()
            .collect();
        sort_completions(&mut list);
        list
    }
}

fn sort_completions(list: &mut [Completion]) {
    list.sort_by(|a, b| {
        a.date_completed
            .cmp(&b.date_completed)
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// In-memory [`StreakStore`].
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StreakStore for MemoryStore {
    async fn insert_streak(&self, streak: &Streak) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if tables.color_taken(&streak.color, None) {
            return Err(AppError::Conflict(format!(
                "Color {} is already used by another streak",
                streak.color
            )));
        }
        tables.streaks.insert(streak.id.clone(), streak.clone());
        Ok(())
    }

    async fn get_streak(&self, streak_id: &str) -> Result<Option<Streak>, AppError> {
        Ok(self.tables.read().await.streaks.get(streak_id).cloned())
    }

    async fn list_streaks(&self) -> Result<Vec<Streak>, AppError> {
        let tables = self.tables.read().await;
        let mut streaks: Vec<Streak> = tables.streaks.values().cloned().collect();
        streaks.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(streaks)
    }

    async fn update_streak_details(
        &self,
        streak_id: &str,
        details: &StreakDetails,
    ) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if !tables.streaks.contains_key(streak_id) {
            return Err(AppError::NotFound(format!("Streak {}", streak_id)));
        }
        if tables.color_taken(&details.color, Some(streak_id)) {
            return Err(AppError::Conflict(format!(
                "Color {} is already used by another streak",
                details.color
            )));
        }
        if let Some(streak) = tables.streaks.get_mut(streak_id) {
            streak.apply_details(details.clone());
        }
        Ok(())
    }

    async fn delete_streak(&self, streak_id: &str) -> Result<usize, AppError> {
        let mut tables = self.tables.write().await;
        if tables.streaks.remove(streak_id).is_none() {
            return Err(AppError::NotFound(format!("Streak {}", streak_id)));
        }
        let before = tables.completions.len();
        tables.completions.retain(|_, c| c.streak_id != streak_id);
        Ok(before - tables.completions.len())
    }

    async fn get_completion(&self, completion_id: &str) -> Result<Option<Completion>, AppError> {
        Ok(self.tables.read().await.completions.get(completion_id).cloned())
    }

    async fn list_completions(
        &self,
        streak_id: Option<&str>,
    ) -> Result<Vec<Completion>, AppError> {
        let tables = self.tables.read().await;
        match streak_id {
            Some(id) => Ok(tables.completions_for(id)),
            None => {
                let mut list: Vec<Completion> = tables.completions.values().cloned().collect();
                sort_completions(&mut list);
                Ok(list)
            }
        }
    }

    async fn begin(&self, streak_id: &str) -> Result<UnitOfWork, AppError> {
        let tables = self.tables.read().await;
        let streak = tables
            .streaks
            .get(streak_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Streak {}", streak_id)))?;
        Ok(UnitOfWork::new(streak, tables.completions_for(streak_id)))
    }

    async fn commit(&self, work: UnitOfWork) -> Result<(), AppError> {
        let (streak_id, writes, stats) = work.into_parts();
        let mut tables = self.tables.write().await;

        // The streak may have been deleted since `begin`
        if !tables.streaks.contains_key(&streak_id) {
            return Err(AppError::NotFound(format!("Streak {}", streak_id)));
        }

        for write in writes {
            match write {
                StagedWrite::PutCompletion(completion) => {
                    tables.completions.insert(completion.id.clone(), completion);
                }
                StagedWrite::DeleteCompletion(id) => {
                    tables.completions.remove(&id);
                }
            }
        }

        if let Some(stats) = stats {
            if let Some(streak) = tables.streaks.get_mut(&streak_id) {
                streak.apply_stats(stats);
            }
        }

        Ok(())
    }
}
