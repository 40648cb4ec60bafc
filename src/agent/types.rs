use serde::{Deserialize, Serialize};

/// Model used for every role unless configured otherwise.
pub const DEFAULT_MODEL: &str = "google/gemini-3-flash-preview";

const AESTHETIC_CONTEXT: &str = "You evaluate residential real estate listings for aesthetic and functional fit. \
Be detailed, specific and actionable. Focus on visual and spatial qualities rather than feature checklists. \
Be honest about both positives and negatives.";

const SCORING_CONTEXT: &str = "Use the full 0-100 range when scoring: \
90-100 exceptional, 80-89 strong with minor compromises, 70-79 good with notable trade-offs, \
60-69 acceptable with significant compromises, 50-59 marginal, 40-49 poor, below 40 a likely reject. \
Err on the low side; a house that barely passes belongs in the 60s.";

/// The specialised agents of the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Vision,
    PresentFit,
    Potential,
    Brief,
    Curator,
    Distiller,
}

impl AgentRole {
    pub fn default_model(&self) -> &'static str {
        DEFAULT_MODEL
    }

    /// Whether this role sends the listing composite along with its prompt.
    pub fn uses_vision(&self) -> bool {
        matches!(self, AgentRole::Vision)
    }

    pub fn system_prompt(&self) -> String {
        match self {
            AgentRole::Vision => format!(
                "{}\n\nYou are looking at a composite grid built from the photos of one listing; \
                 each cell is a different photo. Identify every distinct room or space, assess its \
                 materials, light, proportions and condition, call out red flags such as flip \
                 patterns or cheap finishes, note positive signals and judge the overall renovation \
                 state. Name the actual materials you can see.",
                AESTHETIC_CONTEXT
            ),
            AgentRole::PresentFit => format!(
                "{}\n\n{}\n\nYou are the present-fit judge. Decide how well the house matches the \
                 user's taste as it stands today, with no renovation. Be strict and penalty-oriented. \
                 Any hard constraint violation fails the house; soft constraints only lower the score; \
                 violation patterns carry automatic penalties. Weight dimensions by the taste model \
                 weights.",
                AESTHETIC_CONTEXT, SCORING_CONTEXT
            ),
            AgentRole::Potential => format!(
                "{}\n\nYou judge what the house could become with thoughtful renovation. Weigh \
                 high-impact transformations, realistic feasibility (light, medium or heavy work), \
                 cost class and risks, within the user's renovation tolerance and budget.",
                AESTHETIC_CONTEXT
            ),
            AgentRole::Brief => format!(
                "{}\n\nYou write the house brief: a scannable markdown summary of every analysis so \
                 far, honest about problems, ending in a clear verdict. Aim for 300 to 500 words.",
                AESTHETIC_CONTEXT
            ),
            AgentRole::Curator => "You curate the user's real estate taste model. Compare predicted \
                 scores with the user's actual verdicts, find where they disagree and propose \
                 specific, testable updates."
                .to_string(),
            AgentRole::Distiller => "You turn the machine-readable taste model into a clear, \
                 human-readable aesthetics.md document: well organized, true to the preferences, \
                 with examples where they help and any tensions called out."
                .to_string(),
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentRole::Vision => write!(f, "vision"),
            AgentRole::PresentFit => write!(f, "present_fit"),
            AgentRole::Potential => write!(f, "potential"),
            AgentRole::Brief => write!(f, "brief"),
            AgentRole::Curator => write!(f, "curator"),
            AgentRole::Distiller => write!(f, "distiller"),
        }
    }
}

/// Model names per kind of request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSelection {
    pub vision_model: String,
    pub text_model: String,
}

impl Default for ModelSelection {
    fn default() -> Self {
        Self {
            vision_model: DEFAULT_MODEL.to_string(),
            text_model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl ModelSelection {
    pub fn for_role(&self, role: AgentRole) -> &str {
        if role.uses_vision() {
            &self.vision_model
        } else {
            &self.text_model
        }
    }
}
