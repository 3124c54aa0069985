//! # ViewTrends Analytics Engine
//!
//! This crate judges how well view-count forecasts turned out once the real
//! numbers are in, and rolls individual results up into performance summaries.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of HTTP,
//!   storage or the forecasting model. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** The `AccuracyEngine` takes a snapshot of
//!   predictions as input and returns new values. Inputs are never mutated, and
//!   the only injected dependency is a `Clock` for timestamps.
//!
//! ## Public API
//!
//! - `AccuracyEngine`: per-prediction metrics, summaries, outcome recording and listing.
//! - `compute_metrics`: the metric rules as a free function.
//! - `PerformanceSummary`: the aggregate produced by `summarize`.
//! - `PredictionFilter` / `PredictionPage`: listing criteria and results.
//! - `AnalyticsError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod clock;
pub mod engine;
pub mod error;
pub mod query;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{AccuracyEngine, compute_metrics};
pub use error::AnalyticsError;
pub use query::{DEFAULT_PAGE_LIMIT, PredictionFilter, PredictionPage};
pub use report::PerformanceSummary;
