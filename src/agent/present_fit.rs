use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

use super::context::present_fit_context;
use super::extraction::parse_present_fit;
use super::{AgentRole, LLMProvider};
use crate::models::{Listing, PresentFitScore, TasteModel, VisionAnalysis};
use crate::utils::text::elide_middle;

const RESPONSE_FORMAT: &str = r#"Analyze the house against the taste model and provide a score.
Respond with JSON in this format:
{
    "score": 72.5,
    "passed": true,
    "violations": ["grey paint everywhere - flip signal"],
    "dimension_scores": [
        {"dimension": "natural_light", "score": 8.0, "weight": 0.15, "notes": "Large windows throughout"},
        {"dimension": "materials_quality", "score": 6.0, "weight": 0.15, "notes": "Mix of original and updated"}
    ],
    "justification": "Solid house with good bones; the flip cosmetics are a concern.",
    "deal_breakers": []
}"#;

/// Stage 2: strict present-fit judge.
pub struct PresentFitAgent {
    provider: Arc<dyn LLMProvider>,
    model: String,
}

impl PresentFitAgent {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            model: AgentRole::PresentFit.default_model().to_string(),
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
    ) -> Result<PresentFitScore> {
        let prompt = format!(
            "Score this house for present-fit.\n\n{}\n\n{}",
            present_fit_context(listing, vision, taste),
            RESPONSE_FORMAT
        );
        let reply = self
            .provider
            .generate(&self.model, prompt, Some(AgentRole::PresentFit.system_prompt()))
            .await?;
        debug!("Present-fit reply for {}: {}", listing.id, elide_middle(&reply, 300));
        Ok(parse_present_fit(&reply))
    }
}
