use anyhow::Result;
use std::sync::Arc;

use super::context::brief_context;
use super::{AgentRole, LLMProvider};
use crate::models::{Listing, TasteModel};

const SECTIONS: &str = "Write a clear, honest brief in markdown format with these sections:
- Executive Summary
- Aesthetic Alignment
- Strengths
- Weaknesses
- Deal-Breakers (if any)
- Renovation Paths
- Who This House Is For
- Verdict

Be direct and helpful. The reader needs to decide whether to pursue this house.";

/// Stage 4: the narrative brief. The reply is stored verbatim.
pub struct BriefAgent {
    provider: Arc<dyn LLMProvider>,
    model: String,
}

impl BriefAgent {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            model: AgentRole::Brief.default_model().to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub async fn generate(&self, listing: &Listing, taste: &TasteModel) -> Result<String> {
        let prompt = format!(
            "Generate a house brief based on this analysis.\n\n{}\n\n{}",
            brief_context(listing, taste),
            SECTIONS
        );
        self.provider
            .generate(&self.model, prompt, Some(AgentRole::Brief.system_prompt()))
            .await
    }
}
