//! Agent Module
//!
//! Model-backed agents of the evaluator. Each builds a prompt, calls the
//! provider and turns the reply into a typed artifact. Agents never persist;
//! storing results is the orchestrator's job.

mod provider;
mod types;
pub mod context;
pub mod extraction;
pub mod vision;
pub mod present_fit;
pub mod potential;
pub mod brief;
pub mod curator;
pub mod distiller;

pub use provider::{LLMProvider, OpenAICompatibleProvider, REQUEST_TIMEOUT};
pub use types::{AgentRole, ModelSelection, DEFAULT_MODEL};
pub use vision::VisionAgent;
pub use present_fit::PresentFitAgent;
pub use potential::PotentialAgent;
pub use brief::BriefAgent;
pub use curator::{ProposalTarget, TasteCurator};
pub use distiller::DistillerAgent;
