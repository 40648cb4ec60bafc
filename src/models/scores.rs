//! Scoring Artifacts
//!
//! Structured results written into a listing by the pipeline stages.

use serde::{Deserialize, Serialize};

/// Lowest legal aesthetic quality on the 1-10 scale.
pub const QUALITY_MIN: f64 = 1.0;
/// Highest legal aesthetic quality on the 1-10 scale.
pub const QUALITY_MAX: f64 = 10.0;
/// Neutral quality used when nothing could be analyzed.
pub const NEUTRAL_QUALITY: f64 = 5.0;
/// Neutral aggregate score used for fallbacks and missing fields.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Analysis of a single room seen in the composite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomAnalysis {
    pub room_type: String,
    /// Aesthetic quality, always within 1-10
    pub aesthetic_quality: f64,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub light_quality: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub notes: String,
}

/// Output of the visual analysis stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisionAnalysis {
    #[serde(default)]
    pub rooms: Vec<RoomAnalysis>,
    /// Overall aesthetic, always within 1-10
    pub overall_aesthetic: f64,
    #[serde(default)]
    pub architectural_style: String,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub positive_signals: Vec<String>,
    #[serde(default)]
    pub renovation_state: String,
    /// Raw model output, or a diagnostic when the output was unusable
    #[serde(default)]
    pub raw_description: String,
}

impl VisionAnalysis {
    /// Analysis stored for a listing that has no images at all.
    pub fn no_images() -> Self {
        Self::neutral("No images available for analysis")
    }

    pub(crate) fn neutral(raw_description: impl Into<String>) -> Self {
        Self {
            rooms: Vec::new(),
            overall_aesthetic: NEUTRAL_QUALITY,
            architectural_style: String::new(),
            red_flags: Vec::new(),
            positive_signals: Vec::new(),
            renovation_state: String::new(),
            raw_description: raw_description.into(),
        }
    }
}

/// Score for one weighted taste dimension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DimensionScore {
    pub dimension: String,
    /// 0-10
    pub score: f64,
    /// 0-1
    pub weight: f64,
    #[serde(default)]
    pub notes: String,
}

/// Present-fit (primary) score: strict match against the taste model as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PresentFitScore {
    /// 0-100
    pub score: f64,
    pub passed: bool,
    #[serde(default)]
    pub violations: Vec<String>,
    #[serde(default)]
    pub dimension_scores: Vec<DimensionScore>,
    #[serde(default)]
    pub justification: String,
    #[serde(default)]
    pub deal_breakers: Vec<String>,
}

/// Three-step effort scale shared by renovation difficulty and overall feasibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Light,
    #[default]
    Medium,
    Heavy,
}

impl Level {
    /// Lenient parse of free model text. Anything unrecognized is `Medium`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "light" | "low" | "easy" | "cosmetic" => Level::Light,
            "heavy" | "high" | "hard" | "structural" => Level::Heavy,
            _ => Level::Medium,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Light => write!(f, "light"),
            Level::Medium => write!(f, "medium"),
            Level::Heavy => write!(f, "heavy"),
        }
    }
}

/// Coarse renovation cost bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CostClass {
    #[serde(rename = "<$50k")]
    Under50k,
    #[serde(rename = "$50-100k")]
    From50To100k,
    #[serde(rename = "$100-200k")]
    From100To200k,
    #[serde(rename = "$200k+")]
    Over200k,
    #[serde(rename = "unknown")]
    Unknown,
}

impl CostClass {
    /// Bracket assumed when the model does not name one.
    pub const DEFAULT: CostClass = CostClass::From50To100k;

    pub fn parse_lenient(raw: &str) -> Self {
        let compact: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        match compact.as_str() {
            "<$50k" | "<50k" | "under$50k" => CostClass::Under50k,
            "$50-100k" | "50-100k" | "$50k-$100k" => CostClass::From50To100k,
            "$100-200k" | "100-200k" | "$100k-$200k" => CostClass::From100To200k,
            "$200k+" | "200k+" | ">$200k" => CostClass::Over200k,
            _ => CostClass::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CostClass::Under50k => "<$50k",
            CostClass::From50To100k => "$50-100k",
            CostClass::From100To200k => "$100-200k",
            CostClass::Over200k => "$200k+",
            CostClass::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for CostClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single transformation opportunity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenovationIdea {
    pub area: String,
    pub current_state: String,
    pub proposed_change: String,
    pub impact: String,
    pub difficulty: Level,
}

/// Potential (secondary) score: what the house could become.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PotentialScore {
    /// 0-100
    pub score: f64,
    #[serde(default)]
    pub renovation_ideas: Vec<RenovationIdea>,
    pub feasibility: Level,
    pub cost_class: CostClass,
    #[serde(default)]
    pub risk_notes: Vec<String>,
    #[serde(default)]
    pub upside_narrative: String,
}
