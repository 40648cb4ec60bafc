//! Taste Curator
//!
//! Compares the scores the pipeline produced with the verdicts the user gave
//! and turns the disagreements into taste model updates.

use anyhow::Result;
use serde_json::Value;
use std::fmt::Write;
use std::sync::Arc;
use tracing::info;

use super::extraction::extract_payload;
use super::{AgentRole, LLMProvider};
use crate::models::TasteModel;
use crate::storage::{ListingStore, TasteStore};
use crate::utils::text::joined_or;

/// Fewer decisions than this is not enough evidence to propose anything.
pub const MIN_DECISIONS: usize = 2;
const MAX_DECISIONS: usize = 10;
const PROPOSAL_PREFIX: &str = "PROPOSAL:";

/// Where an accepted proposal lands in the taste model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalTarget {
    Principle,
    AntiPrinciple,
    ViolationPattern,
    Notes,
}

impl ProposalTarget {
    /// Route by the model's suggested action first, then by keywords in the
    /// proposal itself.
    pub fn route(action: Option<&str>, proposal: &str) -> Self {
        match action.map(|a| a.trim().to_lowercase()).as_deref() {
            Some("add_principle") => return ProposalTarget::Principle,
            Some("add_anti_principle") => return ProposalTarget::AntiPrinciple,
            Some("add_violation_pattern") => return ProposalTarget::ViolationPattern,
            _ => {}
        }
        let lowered = proposal.to_lowercase();
        if lowered.contains("anti") {
            ProposalTarget::AntiPrinciple
        } else if lowered.contains("violation") {
            ProposalTarget::ViolationPattern
        } else if lowered.contains("principle") {
            ProposalTarget::Principle
        } else {
            ProposalTarget::Notes
        }
    }
}

pub struct TasteCurator {
    provider: Arc<dyn LLMProvider>,
    listings: ListingStore,
    taste: TasteStore,
    model: String,
}

impl TasteCurator {
    pub fn new(provider: Arc<dyn LLMProvider>, listings: ListingStore, taste: TasteStore) -> Self {
        Self {
            provider,
            listings,
            taste,
            model: AgentRole::Curator.default_model().to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Proposals drawn from listings that carry both a verdict and a score.
    /// Empty when there is too little evidence.
    pub async fn review_recent_decisions(&self) -> Result<Vec<String>> {
        let decided: Vec<_> = self
            .listings
            .list()
            .await?
            .into_iter()
            .filter(|l| l.user_verdict.is_some() && l.present_fit_score.is_some())
            .collect();

        if decided.len() < MIN_DECISIONS {
            info!("Only {} scored decisions, nothing to review", decided.len());
            return Ok(Vec::new());
        }

        let mut context = String::from("## Recent Decisions\n");
        for listing in decided.iter().take(MAX_DECISIONS) {
            let (Some(score), Some(verdict)) = (&listing.present_fit_score, listing.user_verdict) else {
                continue;
            };
            let violations: Vec<String> = score.violations.iter().take(3).cloned().collect();
            let _ = write!(
                context,
                "\nHouse: {}\nScore: {:.0}\nUser Verdict: {}\nKey violations: {}\n",
                listing.address,
                score.score,
                verdict,
                joined_or(&violations, "None")
            );
        }

        let taste = self.taste.load_or_create().await?;
        let _ = write!(
            context,
            "\n## Current Taste Model\nPrinciples: {:?}\nAnti-Principles: {:?}\n",
            taste.principles, taste.anti_principles
        );

        let prompt = format!(
            "Based on these recent decisions, identify any patterns where the scoring doesn't match \
             user preferences. Propose specific updates.\n\n{}\n\nFor each proposal, format as:\n\
             PROPOSAL: [what to change]\nREASON: [why, based on evidence]",
            context
        );
        let reply = self
            .provider
            .generate(&self.model, prompt, Some(AgentRole::Curator.system_prompt()))
            .await?;

        Ok(extract_proposals(&reply))
    }

    /// Fold one proposal into the taste model and persist it.
    pub async fn apply_proposal(&self, proposal: &str) -> Result<TasteModel> {
        let mut taste = self.taste.load_or_create().await?;

        let prompt = format!(
            "Given this taste model update proposal, generate the specific change.\n\n\
             Proposal: {}\n\nCurrent model:\n- Principles: {:?}\n- Anti-principles: {:?}\n\
             - Hard constraints: {:?}\n- Violation patterns: {:?}\n\n\
             Respond with JSON indicating the change:\n\
             {{\"action\": \"add_principle\" | \"add_anti_principle\" | \"add_violation_pattern\", \
             \"target\": \"the specific text\", \"value\": \"new value if applicable\"}}",
            proposal,
            taste.principles,
            taste.anti_principles,
            taste.hard_constraints,
            taste.violation_patterns
        );
        let reply = self
            .provider
            .generate(&self.model, prompt, Some(AgentRole::Curator.system_prompt()))
            .await?;

        let action = serde_json::from_str::<Value>(extract_payload(&reply))
            .ok()
            .and_then(|v| v.get("action").and_then(|a| a.as_str()).map(str::to_string));

        let entry = proposal.trim().to_string();
        match ProposalTarget::route(action.as_deref(), proposal) {
            ProposalTarget::Principle => taste.principles.push(entry),
            ProposalTarget::AntiPrinciple => taste.anti_principles.push(entry),
            ProposalTarget::ViolationPattern => taste.violation_patterns.push(entry),
            ProposalTarget::Notes => {
                if !taste.notes.is_empty() {
                    taste.notes.push('\n');
                }
                taste.notes.push_str(&entry);
            }
        }
        taste.bump_version();
        self.taste.save(&taste).await?;
        info!("Applied taste proposal, now at version {}", taste.version);
        Ok(taste)
    }
}

/// Lines starting with `PROPOSAL:`, or the whole reply when there are none.
pub fn extract_proposals(reply: &str) -> Vec<String> {
    let proposals: Vec<String> = reply
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix(PROPOSAL_PREFIX))
        .map(|rest| rest.trim().to_string())
        .filter(|rest| !rest.is_empty())
        .collect();
    if proposals.is_empty() {
        vec![reply.to_string()]
    } else {
        proposals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Listing, PresentFitScore, Verdict};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct FixedProvider {
        reply: String,
        calls: Mutex<usize>,
    }

    impl FixedProvider {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self { reply: reply.to_string(), calls: Mutex::new(0) })
        }
    }

    #[async_trait]
    impl LLMProvider for FixedProvider {
        async fn generate(&self, _model: &str, _prompt: String, _system: Option<String>) -> Result<String> {
            *self.calls.lock().unwrap() += 1;
            Ok(self.reply.clone())
        }

        async fn generate_with_image(
            &self,
            _model: &str,
            _prompt: String,
            _image_png: &[u8],
            _system: Option<String>,
        ) -> Result<String> {
            anyhow::bail!("no vision here")
        }
    }

    fn decided(id: &str, score: f64, verdict: Verdict) -> Listing {
        let mut listing = Listing::new(id, format!("{} Main St", id));
        listing.user_verdict = Some(verdict);
        listing.present_fit_score = Some(PresentFitScore {
            score,
            passed: true,
            violations: vec!["grey paint".to_string()],
            dimension_scores: vec![],
            justification: String::new(),
            deal_breakers: vec![],
        });
        listing
    }

    #[test]
    fn test_extract_proposals() {
        let reply = "Thoughts first.\nPROPOSAL: add principle: love of brick\nREASON: liked brick\n  PROPOSAL: avoid vinyl\n";
        assert_eq!(
            extract_proposals(reply),
            vec!["add principle: love of brick".to_string(), "avoid vinyl".to_string()]
        );
        assert_eq!(extract_proposals("nothing structured"), vec!["nothing structured".to_string()]);
    }

    #[test]
    fn test_route_checks_anti_before_principle() {
        assert_eq!(ProposalTarget::route(None, "Add anti-principle: vinyl"), ProposalTarget::AntiPrinciple);
        assert_eq!(ProposalTarget::route(None, "New principle: brick"), ProposalTarget::Principle);
        assert_eq!(ProposalTarget::route(None, "violation: flips"), ProposalTarget::ViolationPattern);
        assert_eq!(ProposalTarget::route(None, "raise light weight"), ProposalTarget::Notes);
        assert_eq!(
            ProposalTarget::route(Some("add_violation_pattern"), "principle"),
            ProposalTarget::ViolationPattern
        );
    }

    #[tokio::test]
    async fn test_review_needs_two_decisions() {
        let dir = tempdir().unwrap();
        let listings = ListingStore::new(dir.path());
        let provider = FixedProvider::new("PROPOSAL: more light");
        let curator = TasteCurator::new(provider.clone(), listings.clone(), TasteStore::new(dir.path()));

        listings.save(&decided("1", 80.0, Verdict::Disliked)).await.unwrap();
        assert!(curator.review_recent_decisions().await.unwrap().is_empty());
        assert_eq!(*provider.calls.lock().unwrap(), 0);

        listings.save(&decided("2", 40.0, Verdict::Liked)).await.unwrap();
        let proposals = curator.review_recent_decisions().await.unwrap();
        assert_eq!(proposals, vec!["more light".to_string()]);
    }

    #[tokio::test]
    async fn test_apply_proposal_bumps_version() {
        let dir = tempdir().unwrap();
        let taste_store = TasteStore::new(dir.path());
        let provider = FixedProvider::new("```json\n{\"action\": \"add_anti_principle\"}\n```");
        let curator = TasteCurator::new(provider, ListingStore::new(dir.path()), taste_store.clone());

        let updated = curator.apply_proposal("Avoid open-plan kitchens").await.unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.anti_principles, vec!["Avoid open-plan kitchens".to_string()]);

        let stored = taste_store.load().await.unwrap().unwrap();
        assert_eq!(stored, updated);
    }
}
