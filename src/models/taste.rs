use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A weighted aesthetic dimension used by present-fit scoring.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightedDimension {
    pub name: String,
    /// Importance weight 0-1
    pub weight: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub positive_signals: Vec<String>,
    #[serde(default)]
    pub negative_signals: Vec<String>,
}

impl WeightedDimension {
    pub fn new(name: &str, weight: f64, description: &str) -> Self {
        Self {
            name: name.to_string(),
            weight,
            description: description.to_string(),
            positive_signals: Vec::new(),
            negative_signals: Vec::new(),
        }
    }
}

/// A listing the user pointed at as a reference, good or bad.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exemplar {
    pub house_id: String,
    #[serde(default)]
    pub address: String,
    /// liked or disliked
    pub sentiment: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenovationTolerance {
    None,
    Light,
    #[default]
    Medium,
    Heavy,
}

impl std::fmt::Display for RenovationTolerance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RenovationTolerance::None => "none",
            RenovationTolerance::Light => "light",
            RenovationTolerance::Medium => "medium",
            RenovationTolerance::Heavy => "heavy",
        };
        f.write_str(label)
    }
}

/// The user's aesthetic preferences, consulted by every scoring stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TasteModel {
    /// What to look for
    pub principles: Vec<String>,
    /// What to avoid
    pub anti_principles: Vec<String>,
    pub hard_constraints: Vec<String>,
    pub soft_constraints: Vec<String>,
    pub dimensions: Vec<WeightedDimension>,
    pub exemplars: Vec<Exemplar>,
    /// Patterns that trigger automatic rejection
    pub violation_patterns: Vec<String>,
    pub location_preferences: BTreeMap<String, String>,
    pub renovation_budget_max: Option<u64>,
    pub renovation_tolerance: RenovationTolerance,
    pub version: u32,
    pub notes: String,
}

impl Default for TasteModel {
    fn default() -> Self {
        Self {
            principles: Vec::new(),
            anti_principles: Vec::new(),
            hard_constraints: Vec::new(),
            soft_constraints: Vec::new(),
            dimensions: default_dimensions(),
            exemplars: Vec::new(),
            violation_patterns: Vec::new(),
            location_preferences: BTreeMap::new(),
            renovation_budget_max: None,
            renovation_tolerance: RenovationTolerance::Medium,
            version: 1,
            notes: String::new(),
        }
    }
}

impl TasteModel {
    /// Record that the model changed.
    pub fn bump_version(&mut self) {
        self.version += 1;
    }

    pub fn total_weight(&self) -> f64 {
        self.dimensions.iter().map(|d| d.weight).sum()
    }

    pub fn renovation_budget_label(&self) -> String {
        match self.renovation_budget_max {
            Some(max) => format!("${}", max),
            None => "Not specified".to_string(),
        }
    }
}

fn default_dimensions() -> Vec<WeightedDimension> {
    vec![
        WeightedDimension::new("natural_light", 0.15, "Quality and abundance of natural light"),
        WeightedDimension::new("materials_quality", 0.15, "Quality of visible materials and finishes"),
        WeightedDimension::new("layout_flow", 0.12, "How well spaces flow and connect"),
        WeightedDimension::new("architectural_character", 0.12, "Architectural interest and character"),
        WeightedDimension::new("kitchen_quality", 0.12, "Kitchen design and functionality"),
        WeightedDimension::new("outdoor_space", 0.10, "Quality of outdoor spaces and views"),
        WeightedDimension::new("proportions", 0.08, "Room proportions and ceiling heights"),
        WeightedDimension::new("condition", 0.08, "Overall maintenance and condition"),
        WeightedDimension::new("storage", 0.04, "Storage space availability"),
        WeightedDimension::new("privacy", 0.04, "Privacy from neighbors and street"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_ten_dimensions_summing_to_one() {
        let taste = TasteModel::default();
        assert_eq!(taste.dimensions.len(), 10);
        assert!((taste.total_weight() - 1.0).abs() < 1e-9);
        assert_eq!(taste.version, 1);
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let taste: TasteModel = serde_json::from_str(r#"{"principles": ["light"], "version": 4}"#).unwrap();
        assert_eq!(taste.principles, vec!["light".to_string()]);
        assert_eq!(taste.version, 4);
        assert_eq!(taste.renovation_tolerance, RenovationTolerance::Medium);
    }
}
