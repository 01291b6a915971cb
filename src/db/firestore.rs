// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides the [`StreakStore`] operations for:
//! - Streaks (`streaks/{id}`)
//! - Completions (`completions/{id}`, queried by `streak_id`)

use crate::db::{collections, StagedWrite, StreakStore, UnitOfWork};
use crate::error::AppError;
use crate::models::{Completion, Streak, StreakDetails, StreakStats};
use async_trait::async_trait;
use firestore::paths;

// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator does not accept real credentials
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client. Every operation returns a `Database` error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Find streaks using `color`, for uniqueness checks.
    ///
    /// This query is not part of the write that follows it, so two clients
    /// racing on the same color can both pass the check.
    async fn streaks_with_color(&self, color: &str) -> Result<Vec<Streak>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::STREAKS)
            .filter(|q| q.for_all([q.field("color").eq(color)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Helper to batch delete documents using transactions.
    async fn batch_delete(&self, ids: &[String], collection: &str) -> Result<(), AppError> {
        let client = self.get_client()?;

        for chunk in ids.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for doc_id in chunk {
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}

#[async_trait]
impl StreakStore for FirestoreDb {
    // ─── Streak Operations ───────────────────────────────────────

    async fn insert_streak(&self, streak: &Streak) -> Result<(), AppError> {
        if !self.streaks_with_color(&streak.color).await?.is_empty() {
            return Err(AppError::Conflict(format!(
                "Color {} is already used by another streak",
                streak.color
            )));
        }

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::STREAKS)
            .document_id(&streak.id)
            .object(streak)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn get_streak(&self, streak_id: &str) -> Result<Option<Streak>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::STREAKS)
            .obj()
            .one(streak_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_streaks(&self) -> Result<Vec<Streak>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::STREAKS)
            .order_by([("id", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn update_streak_details(
        &self,
        streak_id: &str,
        details: &StreakDetails,
    ) -> Result<(), AppError> {
        if self.get_streak(streak_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Streak {}", streak_id)));
        }
        let taken = self
            .streaks_with_color(&details.color)
            .await?
            .iter()
            .any(|s| s.id != streak_id);
        if taken {
            return Err(AppError::Conflict(format!(
                "Color {} is already used by another streak",
                details.color
            )));
        }

        // Field mask keeps the derived statistics untouched
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(paths!(StreakDetails::{name, is_active, start_date, color}))
            .in_col(collections::STREAKS)
            .document_id(streak_id)
            .object(details)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_streak(&self, streak_id: &str) -> Result<usize, AppError> {
        if self.get_streak(streak_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Streak {}", streak_id)));
        }

        let ids: Vec<String> = self
            .list_completions(Some(streak_id))
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();
        self.batch_delete(&ids, collections::COMPLETIONS).await?;
        tracing::debug!(streak_id, count = ids.len(), "Deleted completions");

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::STREAKS)
            .document_id(streak_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(ids.len())
    }

    // ─── Completion Operations ───────────────────────────────────

    async fn get_completion(&self, completion_id: &str) -> Result<Option<Completion>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::COMPLETIONS)
            .obj()
            .one(completion_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_completions(
        &self,
        streak_id: Option<&str>,
    ) -> Result<Vec<Completion>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::COMPLETIONS);

        let query = match streak_id {
            Some(id) => {
                let id = id.to_string();
                query.filter(move |q| q.for_all([q.field("streak_id").eq(id.clone())]))
            }
            None => query,
        };

        let mut completions: Vec<Completion> = query
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Sorted client-side to avoid a composite index on (streak_id, date)
        completions.sort_by(|a, b| {
            a.date_completed
                .cmp(&b.date_completed)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(completions)
    }

    // ─── Units of Work ───────────────────────────────────────────

    async fn begin(&self, streak_id: &str) -> Result<UnitOfWork, AppError> {
        let streak = self
            .get_streak(streak_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Streak {}", streak_id)))?;
        let completions = self.list_completions(Some(streak_id)).await?;
        Ok(UnitOfWork::new(streak, completions))
    }

    /// Commit staged completion writes and the statistics update in one
    /// Firestore transaction.
    async fn commit(&self, work: UnitOfWork) -> Result<(), AppError> {
        let (streak_id, writes, stats) = work.into_parts();
        let client = self.get_client()?;

        // A masked update would recreate a streak deleted since begin()
        if self.get_streak(&streak_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Streak {}", streak_id)));
        }

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        for write in &writes {
            match write {
                StagedWrite::PutCompletion(completion) => {
                    client
                        .fluent()
                        .update()
                        .in_col(collections::COMPLETIONS)
                        .document_id(&completion.id)
                        .object(completion)
                        .add_to_transaction(&mut transaction)
                        .map_err(|e| {
                            AppError::Database(format!(
                                "Failed to add completion to transaction: {}",
                                e
                            ))
                        })?;
                }
                StagedWrite::DeleteCompletion(completion_id) => {
                    client
                        .fluent()
                        .delete()
                        .from(collections::COMPLETIONS)
                        .document_id(completion_id)
                        .add_to_transaction(&mut transaction)
                        .map_err(|e| {
                            AppError::Database(format!(
                                "Failed to add completion deletion to transaction: {}",
                                e
                            ))
                        })?;
                }
            }
        }

        if let Some(stats) = stats {
            // Partial update: only the three derived fields
            client
                .fluent()
                .update()
                .fields(paths!(StreakStats::{current_streak, longest_streak, days_completed}))
                .in_col(collections::STREAKS)
                .document_id(&streak_id)
                .object(&stats)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add stats to transaction: {}", e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::debug!(
            streak_id = %streak_id,
            writes = writes.len(),
            "Unit of work committed"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_client_reports_database_error() {
        let db = FirestoreDb::new_mock();

        let err = db.get_streak("s1").await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));

        let err = db.begin("s1").await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
