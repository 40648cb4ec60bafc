//! Stage table
//!
//! The fixed evaluation sequence and the policy attached to each step.

use serde::{Deserialize, Serialize};

use crate::models::Listing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    VisualAnalysis,
    PrimaryScoring,
    SecondaryScoring,
    NarrativeSynthesis,
}

/// One row of the stage table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSpec {
    pub stage: Stage,
    /// A required stage that does not complete aborts the run.
    pub required: bool,
}

pub const STAGES: [StageSpec; 4] = [
    StageSpec { stage: Stage::VisualAnalysis, required: true },
    StageSpec { stage: Stage::PrimaryScoring, required: true },
    StageSpec { stage: Stage::SecondaryScoring, required: false },
    StageSpec { stage: Stage::NarrativeSynthesis, required: false },
];

impl Stage {
    /// Whether the stage can run against `listing`.
    pub fn precondition_met(&self, listing: &Listing) -> bool {
        match self {
            Stage::PrimaryScoring | Stage::SecondaryScoring => listing.vision_analysis.is_some(),
            Stage::VisualAnalysis | Stage::NarrativeSynthesis => true,
        }
    }

    /// Drop the artifacts of every stage after this one; they were derived
    /// from the value this stage is about to replace.
    pub fn clear_downstream(&self, listing: &mut Listing) {
        match self {
            Stage::VisualAnalysis => {
                listing.present_fit_score = None;
                listing.scored_at = None;
                listing.potential_score = None;
                listing.brief = None;
            }
            Stage::PrimaryScoring => {
                listing.potential_score = None;
                listing.brief = None;
            }
            Stage::SecondaryScoring => listing.brief = None,
            Stage::NarrativeSynthesis => {}
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::VisualAnalysis => write!(f, "visual analysis"),
            Stage::PrimaryScoring => write!(f, "primary scoring"),
            Stage::SecondaryScoring => write!(f, "secondary scoring"),
            Stage::NarrativeSynthesis => write!(f, "narrative synthesis"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum StageOutcome {
    Completed,
    /// Precondition unmet; nothing was attempted.
    NotApplicable,
    Failed(String),
    /// Not attempted because an earlier required stage did not complete.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub required: bool,
    pub outcome: StageOutcome,
}

/// Per-stage outcomes of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub id: String,
    pub stages: Vec<StageRecord>,
}

impl RunReport {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            stages: Vec::with_capacity(STAGES.len()),
        }
    }

    /// True iff every required stage completed.
    pub fn succeeded(&self) -> bool {
        STAGES.iter().filter(|spec| spec.required).all(|spec| {
            self.outcome(spec.stage) == Some(&StageOutcome::Completed)
        })
    }

    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|record| record.stage == stage)
            .map(|record| &record.outcome)
    }

    /// The reason of the first required stage that did not complete.
    pub fn failure_reason(&self) -> Option<String> {
        self.stages
            .iter()
            .filter(|record| record.required)
            .find_map(|record| match &record.outcome {
                StageOutcome::Completed => None,
                StageOutcome::Failed(reason) => Some(format!("{} failed: {}", record.stage, reason)),
                StageOutcome::NotApplicable => Some(format!("{} not applicable", record.stage)),
                StageOutcome::Skipped => Some(format!("{} skipped", record.stage)),
            })
    }
}
