use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use super::context::distiller_context;
use super::{AgentRole, LLMProvider};
use crate::storage::TasteStore;

const INSTRUCTIONS: &str = "Create a document that:
1. Opens with a brief summary of aesthetic philosophy
2. Details what makes a house attractive (principles)
3. Lists clear deal-breakers and red flags
4. Explains the scoring dimensions and their importance
5. Notes the renovation stance
6. Ends with any open questions or tensions in preferences

Make it feel personal and useful, not just a data dump.";

/// Regenerates `aesthetics.md` from the taste model.
pub struct DistillerAgent {
    provider: Arc<dyn LLMProvider>,
    taste: TasteStore,
    model: String,
}

impl DistillerAgent {
    pub fn new(provider: Arc<dyn LLMProvider>, taste: TasteStore) -> Self {
        Self {
            provider,
            taste,
            model: AgentRole::Distiller.default_model().to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub async fn distill(&self) -> Result<String> {
        let taste = self.taste.load_or_create().await?;
        let prompt = format!(
            "Transform this taste model data into a well-written aesthetics.md document.\n\n{}\n\n{}",
            distiller_context(&taste),
            INSTRUCTIONS
        );
        let document = self
            .provider
            .generate(&self.model, prompt, Some(AgentRole::Distiller.system_prompt()))
            .await?;
        let path = self.taste.save_aesthetics(&document).await?;
        info!("Wrote {} (taste model v{})", path.display(), taste.version);
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct EchoProvider;

    #[async_trait]
    impl LLMProvider for EchoProvider {
        async fn generate(&self, _model: &str, prompt: String, _system: Option<String>) -> Result<String> {
            Ok(format!("# Aesthetics\n\n{}", prompt.lines().count()))
        }

        async fn generate_with_image(
            &self,
            _model: &str,
            _prompt: String,
            _image_png: &[u8],
            _system: Option<String>,
        ) -> Result<String> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn test_distill_persists_document() {
        let dir = tempdir().unwrap();
        let store = TasteStore::new(dir.path());
        let distiller = DistillerAgent::new(Arc::new(EchoProvider), store.clone());

        let doc = distiller.distill().await.unwrap();
        assert!(doc.starts_with("# Aesthetics"));
        assert_eq!(store.load_aesthetics().await.unwrap(), Some(doc));
        assert!(store.exists());
    }
}
