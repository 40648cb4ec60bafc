//! House Evaluator
//!
//! Scores real-estate listings against a personal taste model:
//! - Bounded-concurrency photo fetching and grid compositing
//! - Vision analysis, present-fit and renovation-potential scoring
//! - Narrative briefs
//! - Per-stage persistence with safe re-runs and batch evaluation
//! - Taste model curation and distillation

pub mod agent;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod storage;
pub mod utils;

// Re-exports for convenience
pub use agent::{AgentRole, LLMProvider, OpenAICompatibleProvider};
pub use config::EvaluatorConfig;
pub use error::StageError;
pub use models::{Listing, TasteModel};
pub use orchestrator::{BatchReport, Pipeline, RunReport};
pub use storage::{ListingStore, TasteStore};
