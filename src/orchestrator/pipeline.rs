//! Pipeline Orchestrator
//!
//! Runs the stage table against one listing. Every stage reloads the
//! listing, so it sees exactly what the previous stage committed, and
//! persists its artifact before the next stage starts.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::stage::{RunReport, Stage, StageOutcome, StageRecord, STAGES};
use crate::agent::{
    AgentRole, BriefAgent, LLMProvider, ModelSelection, PotentialAgent, PresentFitAgent, VisionAgent,
};
use crate::config::EvaluatorConfig;
use crate::error::StageError;
use crate::models::{Listing, TasteModel};
use crate::services::{ImageCompositor, ImageFetcher};
use crate::storage::{ListingStore, TasteStore};

/// `(id, primary score, secondary score or 0)`
pub type Ranking = (String, f64, f64);

pub struct Pipeline {
    pub(super) store: ListingStore,
    taste: TasteStore,
    vision: VisionAgent,
    present_fit: PresentFitAgent,
    potential: PotentialAgent,
    brief: BriefAgent,
    pub(super) batch_concurrency: usize,
}

impl Pipeline {
    pub fn new(
        store: ListingStore,
        taste: TasteStore,
        provider: Arc<dyn LLMProvider>,
        compositor: Arc<ImageCompositor>,
    ) -> Self {
        Self {
            store,
            taste,
            vision: VisionAgent::new(provider.clone(), compositor),
            present_fit: PresentFitAgent::new(provider.clone()),
            potential: PotentialAgent::new(provider.clone()),
            brief: BriefAgent::new(provider),
            batch_concurrency: 1,
        }
    }

    /// Wire stores, compositor and agents from configuration.
    pub fn from_config(
        config: &EvaluatorConfig,
        provider: Arc<dyn LLMProvider>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Self {
        let compositor =
            Arc::new(ImageCompositor::new(fetcher).with_options(config.composite_options()));
        Self::new(
            ListingStore::new(&config.data_dir),
            TasteStore::new(&config.data_dir),
            provider,
            compositor,
        )
        .with_models(&config.models)
        .with_batch_concurrency(config.batch_concurrency)
    }

    pub fn with_models(mut self, models: &ModelSelection) -> Self {
        self.vision = self.vision.with_model(models.for_role(AgentRole::Vision));
        self.present_fit = self.present_fit.with_model(models.for_role(AgentRole::PresentFit));
        self.potential = self.potential.with_model(models.for_role(AgentRole::Potential));
        self.brief = self.brief.with_model(models.for_role(AgentRole::Brief));
        self
    }

    /// Listings evaluated concurrently by [`run_batch`](Self::run_batch).
    /// `1` keeps batches sequential.
    pub fn with_batch_concurrency(mut self, n: usize) -> Self {
        self.batch_concurrency = n.max(1);
        self
    }

    pub fn store(&self) -> &ListingStore {
        &self.store
    }

    /// Evaluate one listing. True iff both required stages completed.
    pub async fn run(&self, id: &str) -> bool {
        match self.run_detailed(id).await {
            Ok(report) => report.succeeded(),
            Err(e) => {
                error!("Pipeline for {} could not start: {:#}", id, e);
                false
            }
        }
    }

    /// Evaluate one listing and report every stage outcome.
    pub async fn run_detailed(&self, id: &str) -> Result<RunReport> {
        let mut report = RunReport::new(id);

        if self.store.load(id).await?.is_none() {
            warn!("Listing {} not found", id);
            report.stages = STAGES
                .iter()
                .enumerate()
                .map(|(i, spec)| StageRecord {
                    stage: spec.stage,
                    required: spec.required,
                    outcome: if i == 0 { StageOutcome::NotApplicable } else { StageOutcome::Skipped },
                })
                .collect();
            return Ok(report);
        }

        let taste = self.taste.load_or_create().await?;
        let mut aborted = false;

        for spec in STAGES.iter() {
            let outcome = if aborted {
                StageOutcome::Skipped
            } else {
                match self.execute(spec.stage, id, &taste).await {
                    Ok(true) => {
                        info!("{}: {} completed", id, spec.stage);
                        StageOutcome::Completed
                    }
                    Ok(false) => {
                        info!("{}: {} not applicable", id, spec.stage);
                        StageOutcome::NotApplicable
                    }
                    Err(e) => {
                        if e.is_upstream() {
                            warn!("{}: {} model or image call failed: {}", id, spec.stage, e);
                        } else {
                            error!("{}: {} could not use the listing store: {}", id, spec.stage, e);
                        }
                        StageOutcome::Failed(e.to_string())
                    }
                }
            };

            if spec.required && !aborted && outcome != StageOutcome::Completed {
                error!("{}: required stage {} did not complete ({:?}), aborting", id, spec.stage, outcome);
                aborted = true;
            } else if let StageOutcome::Failed(ref reason) = outcome {
                warn!("{}: optional stage {} failed, continuing: {}", id, spec.stage, reason);
            }

            report.stages.push(StageRecord {
                stage: spec.stage,
                required: spec.required,
                outcome,
            });
        }

        Ok(report)
    }

    /// Run one stage against the freshly loaded listing. `Ok(false)` when the
    /// precondition is unmet. Nothing is written unless the stage produced a
    /// complete artifact.
    async fn execute(&self, stage: Stage, id: &str, taste: &TasteModel) -> Result<bool, StageError> {
        let mut listing = self
            .store
            .load(id)
            .await
            .map_err(StageError::Storage)?
            .ok_or_else(|| StageError::EntityVanished(id.to_string()))?;

        if !stage.precondition_met(&listing) {
            return Ok(false);
        }

        self.produce(stage, &mut listing, taste)
            .await
            .map_err(StageError::Upstream)?;
        stage.clear_downstream(&mut listing);
        self.store.save(&listing).await.map_err(StageError::Storage)?;
        Ok(true)
    }

    async fn produce(&self, stage: Stage, listing: &mut Listing, taste: &TasteModel) -> Result<()> {
        match stage {
            Stage::VisualAnalysis => {
                let analysis = self.vision.analyze(listing).await?;
                listing.vision_analysis = Some(analysis);
            }
            Stage::PrimaryScoring => {
                let Some(vision) = listing.vision_analysis.clone() else {
                    return Ok(());
                };
                let score = self.present_fit.score(listing, &vision, taste).await?;
                info!("{}: present-fit {:.1} (passed: {})", listing.id, score.score, score.passed);
                listing.present_fit_score = Some(score);
                listing.scored_at = Some(Utc::now());
            }
            Stage::SecondaryScoring => {
                let Some(vision) = listing.vision_analysis.clone() else {
                    return Ok(());
                };
                let score = self.potential.score(listing, &vision, taste).await?;
                info!("{}: potential {:.1} ({})", listing.id, score.score, score.cost_class);
                listing.potential_score = Some(score);
            }
            Stage::NarrativeSynthesis => {
                let brief = self.brief.generate(listing, taste).await?;
                listing.brief = Some(brief);
            }
        }
        Ok(())
    }

    /// Scored listings, best present-fit first. Ties keep store order.
    pub async fn rankings(&self) -> Result<Vec<Ranking>> {
        let mut ranked: Vec<Ranking> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter_map(|l| {
                let primary = l.primary_score()?;
                let secondary = l.secondary_score().unwrap_or(0.0);
                Some((l.id, primary, secondary))
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(ranked)
    }
}
