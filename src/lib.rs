//! # laundering-detector
//!
//! Batch money-laundering pattern detection over directed transaction
//! graphs: fraud ring (cycle) detection, structuring/smurfing, and
//! shell-account pass-through, combined into a single suspicion score
//! per account with a false-positive guard layered on top.
//!
//! ## Architecture
//!
//! - **core** — Foundational types: accounts, edges, detection config
//! - **graph** — The transaction graph, strongly connected components,
//!   bounded cycle enumeration, smurfing and shell-account detectors
//! - **scoring** — Composite suspicion scoring and false-positive guard
//! - **io** — CSV ingestion and row-level validation/cleaning
//! - **http** — Thin axum wrapper exposing the pipeline over HTTP
//! - **pipeline** — Orchestrates graph build → detectors → scoring → guard
//! - **calibration** — Append-only feedback and performance-metrics sinks

pub mod calibration;
pub mod core;
pub mod error;
pub mod graph;
pub mod http;
pub mod io;
pub mod pipeline;
pub mod result;
pub mod scoring;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::account::AccountId;
    pub use crate::core::config::{DetectionConfig, Preset};
    pub use crate::core::edge::Edge;
    pub use crate::error::{DetectionError, Result};
    pub use crate::graph::builder::Graph;
    pub use crate::graph::cycle_detection::FraudRing;
    pub use crate::result::DetectionResult;
}
