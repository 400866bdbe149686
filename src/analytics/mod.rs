// src/analytics/mod.rs — Research analytics

pub mod aggregate;
pub mod session;
pub mod stats;

pub use stats::Stats;
