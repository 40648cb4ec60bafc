use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

use super::context::potential_context;
use super::extraction::parse_potential;
use super::{AgentRole, LLMProvider};
use crate::models::{Listing, PotentialScore, TasteModel, VisionAnalysis};
use crate::utils::text::elide_middle;

const RESPONSE_FORMAT: &str = r#"Respond with JSON in this format:
{
    "score": 75.0,
    "renovation_ideas": [
        {
            "area": "kitchen",
            "current_state": "dated but functional 1990s kitchen",
            "proposed_change": "full renovation with new cabinets, counters, appliances",
            "impact": "Would transform the heart of the home",
            "difficulty": "medium"
        }
    ],
    "feasibility": "medium",
    "cost_class": "$100-200k",
    "risk_notes": ["Load-bearing wall limits layout changes"],
    "upside_narrative": "A thoughtful renovation could honor the original character while adding modern comfort."
}

Cost classes: <$50k, $50-100k, $100-200k, $200k+
Feasibility: light (paint/cosmetic), medium (kitchen/bath), heavy (structural/addition)"#;

/// Stage 3: what the house could become.
pub struct PotentialAgent {
    provider: Arc<dyn LLMProvider>,
    model: String,
}

impl PotentialAgent {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            model: AgentRole::Potential.default_model().to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub async fn score(
        &self,
        listing: &Listing,
        vision: &VisionAnalysis,
        taste: &TasteModel,
    ) -> Result<PotentialScore> {
        let prompt = format!(
            "Evaluate this house's renovation potential.\n\n{}\n\n{}",
            potential_context(listing, vision, taste),
            RESPONSE_FORMAT
        );
        let reply = self
            .provider
            .generate(&self.model, prompt, Some(AgentRole::Potential.system_prompt()))
            .await?;
        debug!("Potential reply for {}: {}", listing.id, elide_middle(&reply, 300));
        Ok(parse_potential(&reply))
    }
}
