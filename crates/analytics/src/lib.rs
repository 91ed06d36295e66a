//! # Cross-Numeraire Analytics
//!
//! This crate turns two price snapshots into a relative performance table,
//! expressing every asset in the native currency and in two pivot assets.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of external systems.
//!   It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** The `Normalizer` takes snapshots as input and produces a
//!   `PerformanceTable` as output. All arithmetic runs on full-precision decimals;
//!   rounding happens only when a row is prepared for display.
//!
//! ## Public API
//!
//! - `Normalizer`: The struct that contains the normalization logic.
//! - `PerformanceTable` / `PerformanceRow` / `Quote`: The computed results.
//! - `RoundingPolicy`: Presentation rounding (4 dp native, 8 dp pivot, 2 dp percentages).
//! - `AnalyticsError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod error;
pub mod normalizer;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use error::AnalyticsError;
pub use normalizer::Normalizer;
pub use report::{Numeraire, PerformanceRow, PerformanceTable, Quote, RoundingPolicy};
