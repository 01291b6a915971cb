// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::{Days, NaiveDate};
use std::sync::Arc;
use streak_tracker::db::{MemoryStore, StreakStore};
use streak_tracker::models::{StreakDetails, StreakStats};
use streak_tracker::services::StreakService;

mod common;
use common::test_db;

const NUM_CONCURRENT_COMPLETIONS: u64 = 10;

fn details(color: &str) -> StreakDetails {
    StreakDetails {
        name: "Race".to_string(),
        is_active: true,
        start_date: common::today(),
        color: color.to_string(),
    }
}

/// Log one completion per day for the last N days, all at once, and check
/// that no concurrent write lost another's contribution to the stats.
async fn run_concurrent_completions(store: Arc<dyn StreakStore>, color: &str) {
    let service = Arc::new(StreakService::with_clock(store, common::today));
    let streak = service.create_streak(details(color)).await.unwrap();

    let mut handles = vec![];
    for back in 0..NUM_CONCURRENT_COMPLETIONS {
        let service = service.clone();
        let streak_id = streak.id.clone();
        handles.push(tokio::spawn(async move {
            let date: NaiveDate = common::today().checked_sub_days(Days::new(back)).unwrap();
            service.create_completion(&streak_id, date).await
        }));
    }

    for handle in handles {
        handle.await.unwrap().expect("Completion write failed");
    }

    let n = NUM_CONCURRENT_COMPLETIONS as u32;
    let stored = service.get_streak(&streak.id).await.unwrap();
    assert_eq!(
        stored.stats(),
        StreakStats {
            current_streak: n,
            longest_streak: n,
            days_completed: n,
        },
        "Stats lost a concurrent update"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_completions_memory() {
    run_concurrent_completions(Arc::new(MemoryStore::new()), "#abcdef").await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_completions_firestore() {
    if std::env::var("FIRESTORE_EMULATOR_HOST").is_err() {
        println!("Skipping test because FIRESTORE_EMULATOR_HOST is not set");
        return;
    }

    let color = format!("#race-{}", ulid::Ulid::new());
    run_concurrent_completions(Arc::new(test_db().await), &color).await;
}
