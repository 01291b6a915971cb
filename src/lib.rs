// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Streak Tracker: daily habit streaks with always-current statistics
//!
//! This crate provides the backend API for logging habit completions and
//! keeping each streak's current, longest and total day counts consistent
//! with its completion log.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use services::StreakService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub service: StreakService,
}
