//! Exam performance analysis engine.
//!
//! Turns per-topic exam answer counts into study priorities, historical rank estimates
//! and what-if score projections. Every view is rebuilt from its inputs on each call.

pub mod aggregate;
pub mod config;
pub mod db;
pub mod error;
pub mod groups;
pub mod models;
pub mod priority;
pub mod rank;
pub mod report;
pub mod service;
pub mod store;
pub mod trend;
pub mod whatif;

pub use config::{CoefficientTable, EngineConfig, LessonCoefficients, RankYears};
pub use error::{AnalysisError, AnalysisResult};
pub use priority::PriorityStrategy;
pub use rank::RankEstimate;
pub use service::Analyzer;
pub use store::{ExamStore, MemoryStore};
