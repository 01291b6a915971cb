// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for streaks, completions and statistics.

use crate::error::{AppError, Result};
use crate::models::stats::saturating_u32;
use crate::models::{Completion, Streak, StreakDetails, StreakOverview, StreakStats};
use crate::services::CompletionWrite;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/streaks", get(list_streaks).post(create_streak))
        .route("/api/streaks/recalculate", post(recalculate_all))
        .route(
            "/api/streaks/{id}",
            get(get_streak).put(update_streak).delete(delete_streak),
        )
        .route("/api/streaks/{id}/recalculate", post(recalculate_streak))
        .route(
            "/api/completions",
            get(list_completions).post(create_completion),
        )
        .route(
            "/api/completions/{id}",
            get(get_completion)
                .put(update_completion)
                .delete(delete_completion),
        )
        .route("/api/stats/overview", get(get_overview))
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
        AppError::BadRequest(format!("Invalid '{}': must be a YYYY-MM-DD date", field))
    })
}

// ─── Responses ───────────────────────────────────────────────

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompletionResponse {
    pub id: String,
    pub streak: String,
    pub date_completed: NaiveDate,
    /// 0 = Monday .. 6 = Sunday
    pub day_of_week: u8,
}

impl From<Completion> for CompletionResponse {
    fn from(c: Completion) -> Self {
        Self {
            id: c.id,
            streak: c.streak_id,
            date_completed: c.date_completed,
            day_of_week: c.day_of_week,
        }
    }
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StreakResponse {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    pub start_date: NaiveDate,
    pub color: String,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub days_completed: u32,
    pub completions: Vec<CompletionResponse>,
}

impl StreakResponse {
    fn new(streak: Streak, completions: Vec<Completion>) -> Self {
        Self {
            id: streak.id,
            name: streak.name,
            is_active: streak.is_active,
            start_date: streak.start_date,
            color: streak.color,
            current_streak: streak.current_streak,
            longest_streak: streak.longest_streak,
            days_completed: streak.days_completed,
            completions: completions.into_iter().map(Into::into).collect(),
        }
    }
}

/// A completion write and the owning streak's statistics after it.
#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompletionWriteResponse {
    pub completion: CompletionResponse,
    pub streak_stats: StreakStats,
}

impl From<CompletionWrite> for CompletionWriteResponse {
    fn from(write: CompletionWrite) -> Self {
        Self {
            completion: write.completion.into(),
            streak_stats: write.stats,
        }
    }
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RecalculateResponse {
    pub streak_id: String,
    #[serde(flatten)]
    #[cfg_attr(feature = "binding-generation", ts(flatten))]
    pub stats: StreakStats,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteStreakResponse {
    pub success: bool,
    pub completions_deleted: u32,
}

// ─── Streaks ─────────────────────────────────────────────────

/// Client-supplied streak fields. Derived statistics in the body are ignored.
#[derive(Deserialize, Validate)]
struct StreakRequest {
    #[validate(length(min = 1, max = 255))]
    name: String,
    #[serde(default = "default_true")]
    is_active: bool,
    start_date: String,
    #[validate(length(min = 1, max = 255))]
    color: String,
}

fn default_true() -> bool {
    true
}

impl StreakRequest {
    fn into_details(self) -> Result<StreakDetails> {
        self.validate()?;
        Ok(StreakDetails {
            start_date: parse_date("start_date", &self.start_date)?,
            name: self.name,
            is_active: self.is_active,
            color: self.color,
        })
    }
}

/// List all streaks with their completions embedded.
async fn list_streaks(State(state): State<Arc<AppState>>) -> Result<Json<Vec<StreakResponse>>> {
    let streaks = state.service.list_streaks().await?;
    let mut by_streak: HashMap<String, Vec<Completion>> = HashMap::new();
    for completion in state.service.list_completions(None).await? {
        by_streak
            .entry(completion.streak_id.clone())
            .or_default()
            .push(completion);
    }

    tracing::debug!(count = streaks.len(), "Listing streaks");

    Ok(Json(
        streaks
            .into_iter()
            .map(|s| {
                let completions = by_streak.remove(&s.id).unwrap_or_default();
                StreakResponse::new(s, completions)
            })
            .collect(),
    ))
}

async fn create_streak(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StreakRequest>,
) -> Result<(StatusCode, Json<StreakResponse>)> {
    let streak = state.service.create_streak(body.into_details()?).await?;
    Ok((StatusCode::CREATED, Json(StreakResponse::new(streak, vec![]))))
}

async fn get_streak(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StreakResponse>> {
    let streak = state.service.get_streak(&id).await?;
    let completions = state.service.list_completions(Some(&id)).await?;
    Ok(Json(StreakResponse::new(streak, completions)))
}

async fn update_streak(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<StreakRequest>,
) -> Result<Json<StreakResponse>> {
    let streak = state.service.update_streak(&id, body.into_details()?).await?;
    let completions = state.service.list_completions(Some(&id)).await?;
    Ok(Json(StreakResponse::new(streak, completions)))
}

async fn delete_streak(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteStreakResponse>> {
    let removed = state.service.delete_streak(&id).await?;
    Ok(Json(DeleteStreakResponse {
        success: true,
        completions_deleted: saturating_u32(removed),
    }))
}

async fn recalculate_streak(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RecalculateResponse>> {
    let stats = state.service.recalculate(&id).await?;
    Ok(Json(RecalculateResponse {
        streak_id: id,
        stats,
    }))
}

async fn recalculate_all(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RecalculateResponse>>> {
    let refreshed = state.service.refresh_all().await?;
    Ok(Json(
        refreshed
            .into_iter()
            .map(|(streak_id, stats)| RecalculateResponse { streak_id, stats })
            .collect(),
    ))
}

// ─── Completions ─────────────────────────────────────────────

#[derive(Deserialize)]
struct CompletionsQuery {
    /// Filter by owning streak
    streak: Option<String>,
}

#[derive(Deserialize)]
struct CreateCompletionRequest {
    streak: String,
    date_completed: String,
}

#[derive(Deserialize)]
struct UpdateCompletionRequest {
    /// Must match the current owner if present
    streak: Option<String>,
    date_completed: String,
}

async fn list_completions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CompletionsQuery>,
) -> Result<Json<Vec<CompletionResponse>>> {
    let completions = state
        .service
        .list_completions(params.streak.as_deref())
        .await?;
    Ok(Json(completions.into_iter().map(Into::into).collect()))
}

async fn create_completion(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateCompletionRequest>,
) -> Result<(StatusCode, Json<CompletionWriteResponse>)> {
    let date = parse_date("date_completed", &body.date_completed)?;
    let write = state.service.create_completion(&body.streak, date).await?;
    Ok((StatusCode::CREATED, Json(write.into())))
}

async fn get_completion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CompletionResponse>> {
    Ok(Json(state.service.get_completion(&id).await?.into()))
}

async fn update_completion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateCompletionRequest>,
) -> Result<Json<CompletionWriteResponse>> {
    let date = parse_date("date_completed", &body.date_completed)?;
    let write = state
        .service
        .update_completion(&id, body.streak.as_deref(), date)
        .await?;
    Ok(Json(write.into()))
}

async fn delete_completion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CompletionWriteResponse>> {
    Ok(Json(state.service.delete_completion(&id).await?.into()))
}

// ─── Statistics ──────────────────────────────────────────────

async fn get_overview(State(state): State<Arc<AppState>>) -> Result<Json<StreakOverview>> {
    Ok(Json(state.service.overview().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_accepts_iso_dates() {
        let date = parse_date("date_completed", "2024-06-10").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        for raw in ["", "2024-13-01", "2024-02-30", "10/06/2024", "2024-06-10T00:00:00Z"] {
            let err = parse_date("date_completed", raw).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "accepted {:?}", raw);
        }
    }

    #[test]
    fn test_streak_request_validation() {
        let body = StreakRequest {
            name: String::new(),
            is_active: true,
            start_date: "2024-06-01".to_string(),
            color: "#fff".to_string(),
        };
        assert!(matches!(body.into_details(), Err(AppError::BadRequest(_))));
    }
}
