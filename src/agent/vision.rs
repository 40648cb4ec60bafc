use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use super::extraction::parse_vision;
use super::{AgentRole, LLMProvider};
use crate::models::{Listing, VisionAnalysis};
use crate::services::ImageCompositor;
use crate::utils::text::elide_middle;

const VISION_PROMPT: &str = r#"Analyze this composite image of a real estate listing.

Respond with a JSON object in this exact format:
{
    "rooms": [
        {
            "room_type": "kitchen",
            "aesthetic_quality": 7,
            "materials": ["granite counters", "hardwood floors", "stainless appliances"],
            "light_quality": "abundant",
            "condition": "updated",
            "notes": "Modern renovation with quality materials"
        }
    ],
    "overall_aesthetic": 7,
    "architectural_style": "craftsman",
    "red_flags": ["grey paint throughout suggests recent flip"],
    "positive_signals": ["original hardwood floors", "large windows"],
    "renovation_state": "partial"
}

Analyze every distinct room visible in the grid. Be thorough and specific."#;

/// Stage 1: looks at the listing photos.
pub struct VisionAgent {
    provider: Arc<dyn LLMProvider>,
    compositor: Arc<ImageCompositor>,
    model: String,
}

impl VisionAgent {
    pub fn new(provider: Arc<dyn LLMProvider>, compositor: Arc<ImageCompositor>) -> Self {
        Self {
            provider,
            compositor,
            model: AgentRole::Vision.default_model().to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Analyze the listing photos. A listing without photos gets the neutral
    /// placeholder and no model call is made.
    pub async fn analyze(&self, listing: &Listing) -> Result<VisionAnalysis> {
        if listing.image_urls.is_empty() {
            info!("{} has no images, storing placeholder analysis", listing.id);
            return Ok(VisionAnalysis::no_images());
        }

        let composite = self
            .compositor
            .create_composite(&listing.image_urls)
            .await
            .context("Failed to build image composite")?;
        debug!("Composite for {} is {} bytes", listing.id, composite.len());

        let reply = self
            .provider
            .generate_with_image(
                &self.model,
                format!("{}\n\nRespond with valid JSON only, no markdown.", VISION_PROMPT),
                &composite,
                Some(AgentRole::Vision.system_prompt()),
            )
            .await?;
        debug!("Vision reply for {}: {}", listing.id, elide_middle(&reply, 300));

        Ok(parse_vision(&reply))
    }
}
