// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod completion;
pub mod overview;
pub mod stats;
pub mod streak;

pub use completion::Completion;
pub use overview::StreakOverview;
pub use stats::StreakStats;
pub use streak::{Streak, StreakDetails};
