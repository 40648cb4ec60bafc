//! Orchestrator Module
//!
//! Drives listings through the evaluation stages, alone or in batches, and
//! brings new listings in from scraper output.

pub mod batch;
pub mod ingest;
pub mod pipeline;
pub mod stage;

pub use batch::{BatchItem, BatchReport};
pub use ingest::{import_listings, parse_listing_inputs, ImportSummary, ListingInput};
pub use pipeline::{Pipeline, Ranking};
pub use stage::{RunReport, Stage, StageOutcome, StageRecord, StageSpec, STAGES};
