//! Response Extraction
//!
//! Model replies are free text that usually carries a JSON object, often
//! inside a markdown fence. These parsers pull that object out, fill in
//! defaults, clamp every number into its legal range and fall back to a
//! neutral artifact when the reply is unusable. They never fail.

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::models::scores::{QUALITY_MAX, QUALITY_MIN};
use crate::models::{
    CostClass, DimensionScore, Level, PotentialScore, PresentFitScore, RenovationIdea,
    RoomAnalysis, VisionAnalysis, NEUTRAL_QUALITY, NEUTRAL_SCORE,
};
use crate::utils::text::{elide_middle, head_chars};

const VISION_DIAGNOSTIC_CHARS: usize = 500;
const SCORE_DIAGNOSTIC_CHARS: usize = 300;
const NEUTRAL_DIMENSION_SCORE: f64 = 5.0;
const DEFAULT_DIMENSION_WEIGHT: f64 = 0.1;

lazy_static! {
    static ref JSON_FENCE: Regex = Regex::new(r"(?i)```json").unwrap();
}

const FENCE: &str = "```";

/// The structured payload embedded in a model reply.
pub fn extract_payload(text: &str) -> &str {
    if let Some(open) = JSON_FENCE.find(text) {
        return fenced_body(text, open.end());
    }
    if let Some(open) = text.find(FENCE) {
        return fenced_body(text, open + FENCE.len());
    }
    text.trim()
}

fn fenced_body(text: &str, start: usize) -> &str {
    let rest = &text[start..];
    match rest.find(FENCE) {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}

/// Deserialize the payload of `text` as a JSON object of shape `T`.
fn parse_object<T: DeserializeOwned>(text: &str) -> Option<T> {
    let payload = extract_payload(text);
    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(e) => {
            debug!("Reply is not JSON ({}): {}", e, elide_middle(text, 200));
            return None;
        }
    };
    if !value.is_object() {
        debug!("Reply payload is not an object: {}", elide_middle(payload, 200));
        return None;
    }
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            debug!("Reply has unexpected field types: {}", e);
            None
        }
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn clamp_quality(value: Option<f64>) -> f64 {
    finite(value)
        .unwrap_or(NEUTRAL_QUALITY)
        .clamp(QUALITY_MIN, QUALITY_MAX)
}

fn clamp_score(value: Option<f64>) -> f64 {
    finite(value).unwrap_or(NEUTRAL_SCORE).clamp(0.0, 100.0)
}

/// Dimension scores are 0-10; values above 10 are read as a 0-100 scale.
fn clamp_dimension_score(value: Option<f64>) -> f64 {
    let raw = finite(value).unwrap_or(NEUTRAL_DIMENSION_SCORE);
    let scaled = if raw > 10.0 { raw / 10.0 } else { raw };
    scaled.clamp(0.0, 10.0)
}

fn clamp_weight(value: Option<f64>) -> f64 {
    finite(value).unwrap_or(DEFAULT_DIMENSION_WEIGHT).clamp(0.0, 1.0)
}

#[derive(Deserialize)]
struct RawRoom {
    room_type: Option<String>,
    aesthetic_quality: Option<f64>,
    materials: Option<Vec<String>>,
    light_quality: Option<String>,
    condition: Option<String>,
    notes: Option<String>,
}

#[derive(Deserialize)]
struct RawVision {
    rooms: Option<Vec<RawRoom>>,
    overall_aesthetic: Option<f64>,
    architectural_style: Option<String>,
    red_flags: Option<Vec<String>>,
    positive_signals: Option<Vec<String>>,
    renovation_state: Option<String>,
}

pub fn parse_vision(text: &str) -> VisionAnalysis {
    let Some(raw) = parse_object::<RawVision>(text) else {
        return VisionAnalysis::neutral(format!(
            "Parse error. Raw response: {}",
            head_chars(text, VISION_DIAGNOSTIC_CHARS)
        ));
    };

    let rooms = raw
        .rooms
        .unwrap_or_default()
        .into_iter()
        .map(|room| RoomAnalysis {
            room_type: room.room_type.unwrap_or_else(|| "unknown".to_string()),
            aesthetic_quality: clamp_quality(room.aesthetic_quality),
            materials: room.materials.unwrap_or_default(),
            light_quality: room.light_quality.unwrap_or_default(),
            condition: room.condition.unwrap_or_default(),
            notes: room.notes.unwrap_or_default(),
        })
        .collect();

    VisionAnalysis {
        rooms,
        overall_aesthetic: clamp_quality(raw.overall_aesthetic),
        architectural_style: raw.architectural_style.unwrap_or_default(),
        red_flags: raw.red_flags.unwrap_or_default(),
        positive_signals: raw.positive_signals.unwrap_or_default(),
        renovation_state: raw.renovation_state.unwrap_or_default(),
        raw_description: text.to_string(),
    }
}

#[derive(Deserialize)]
struct RawDimension {
    dimension: Option<String>,
    score: Option<f64>,
    weight: Option<f64>,
    notes: Option<String>,
}

#[derive(Deserialize)]
struct RawPresentFit {
    score: Option<f64>,
    passed: Option<bool>,
    violations: Option<Vec<String>>,
    dimension_scores: Option<Vec<RawDimension>>,
    justification: Option<String>,
    deal_breakers: Option<Vec<String>>,
}

pub fn parse_present_fit(text: &str) -> PresentFitScore {
    let Some(raw) = parse_object::<RawPresentFit>(text) else {
        return PresentFitScore {
            score: NEUTRAL_SCORE,
            passed: true,
            violations: Vec::new(),
            dimension_scores: Vec::new(),
            justification: format!(
                "Scoring parse error. Raw: {}",
                head_chars(text, SCORE_DIAGNOSTIC_CHARS)
            ),
            deal_breakers: Vec::new(),
        };
    };

    let dimension_scores = raw
        .dimension_scores
        .unwrap_or_default()
        .into_iter()
        .map(|d| DimensionScore {
            dimension: d.dimension.unwrap_or_default(),
            score: clamp_dimension_score(d.score),
            weight: clamp_weight(d.weight),
            notes: d.notes.unwrap_or_default(),
        })
        .collect();

    PresentFitScore {
        score: clamp_score(raw.score),
        passed: raw.passed.unwrap_or(true),
        violations: raw.violations.unwrap_or_default(),
        dimension_scores,
        justification: raw.justification.unwrap_or_default(),
        deal_breakers: raw.deal_breakers.unwrap_or_default(),
    }
}

#[derive(Deserialize)]
struct RawIdea {
    area: Option<String>,
    current_state: Option<String>,
    proposed_change: Option<String>,
    impact: Option<String>,
    difficulty: Option<String>,
}

#[derive(Deserialize)]
struct RawPotential {
    score: Option<f64>,
    renovation_ideas: Option<Vec<RawIdea>>,
    feasibility: Option<String>,
    cost_class: Option<String>,
    risk_notes: Option<Vec<String>>,
    upside_narrative: Option<String>,
}

fn level_or_default(raw: Option<String>) -> Level {
    raw.map(|s| Level::parse_lenient(&s)).unwrap_or_default()
}

pub fn parse_potential(text: &str) -> PotentialScore {
    let Some(raw) = parse_object::<RawPotential>(text) else {
        return PotentialScore {
            score: NEUTRAL_SCORE,
            renovation_ideas: Vec::new(),
            feasibility: Level::Medium,
            cost_class: CostClass::Unknown,
            risk_notes: Vec::new(),
            upside_narrative: format!(
                "Parse error. Raw: {}",
                head_chars(text, SCORE_DIAGNOSTIC_CHARS)
            ),
        };
    };

    let renovation_ideas = raw
        .renovation_ideas
        .unwrap_or_default()
        .into_iter()
        .map(|idea| RenovationIdea {
            area: idea.area.unwrap_or_default(),
            current_state: idea.current_state.unwrap_or_default(),
            proposed_change: idea.proposed_change.unwrap_or_default(),
            impact: idea.impact.unwrap_or_default(),
            difficulty: level_or_default(idea.difficulty),
        })
        .collect();

    PotentialScore {
        score: clamp_score(raw.score),
        renovation_ideas,
        feasibility: level_or_default(raw.feasibility),
        cost_class: raw
            .cost_class
            .map(|s| CostClass::parse_lenient(&s))
            .unwrap_or(CostClass::DEFAULT),
        risk_notes: raw.risk_notes.unwrap_or_default(),
        upside_narrative: raw.upside_narrative.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_payload_prefers_json_fence() {
        let text = "intro ```python\nx``` then ```JSON\n{\"a\": 1}\n``` trailing";
        assert_eq!(extract_payload(text), "{\"a\": 1}");
        assert_eq!(extract_payload("```\n{\"b\": 2}\n```"), "{\"b\": 2}");
        assert_eq!(extract_payload("  {\"c\": 3} \n"), "{\"c\": 3}");
        assert_eq!(extract_payload("```json\n{\"d\": 4}"), "{\"d\": 4}");
    }

    #[test]
    fn test_parse_vision_clamps_and_keeps_reply() {
        let reply = r#"```json
{"rooms": [{"room_type": "kitchen", "aesthetic_quality": 14, "materials": ["oak"]},
           {"aesthetic_quality": -2}],
 "overall_aesthetic": 0, "red_flags": ["grey paint"]}
```"#;
        let analysis = parse_vision(reply);
        assert_eq!(analysis.rooms.len(), 2);
        assert_eq!(analysis.rooms[0].aesthetic_quality, 10.0);
        assert_eq!(analysis.rooms[1].aesthetic_quality, 1.0);
        assert_eq!(analysis.rooms[1].room_type, "unknown");
        assert_eq!(analysis.overall_aesthetic, 1.0);
        assert_eq!(analysis.raw_description, reply);
    }

    #[test]
    fn test_parse_vision_fallback() {
        let reply = "x".repeat(800);
        let analysis = parse_vision(&reply);
        assert_eq!(analysis.overall_aesthetic, 5.0);
        assert!(analysis.rooms.is_empty());
        assert_eq!(
            analysis.raw_description,
            format!("Parse error. Raw response: {}", "x".repeat(500))
        );
    }

    #[test]
    fn test_dimension_scores_are_clamped() {
        let reply = r#"{"score": 140, "dimension_scores": [
            {"dimension": "light", "score": 85, "weight": 1.5},
            {"dimension": "storage", "score": 150, "weight": -0.2},
            {"dimension": "privacy", "score": -3},
            {"dimension": "flow", "score": 7.5, "weight": 0.12}
        ]}"#;
        let score = parse_present_fit(reply);
        assert_eq!(score.score, 100.0);
        assert!(score.passed);
        let dims = &score.dimension_scores;
        assert!((dims[0].score - 8.5).abs() < 1e-9);
        assert_eq!(dims[0].weight, 1.0);
        assert_eq!(dims[1].score, 10.0);
        assert_eq!(dims[1].weight, 0.0);
        assert_eq!(dims[2].score, 0.0);
        assert_eq!(dims[2].weight, 0.1);
        assert_eq!(dims[3].score, 7.5);
    }

    #[test]
    fn test_present_fit_fallback_on_prose() {
        let reply = "I think this house is lovely but I cannot give a number.";
        let score = parse_present_fit(reply);
        assert_eq!(score.score, 50.0);
        assert!(score.passed);
        assert_eq!(score.justification, format!("Scoring parse error. Raw: {}", reply));
    }

    #[test]
    fn test_wrong_types_and_non_objects_fall_back() {
        assert!(parse_present_fit(r#"{"score": "high"}"#)
            .justification
            .starts_with("Scoring parse error"));
        assert!(parse_present_fit("[]").justification.starts_with("Scoring parse error"));
        assert_eq!(parse_vision("42").overall_aesthetic, 5.0);
    }

    #[test]
    fn test_parse_potential_defaults_and_fallback() {
        let score = parse_potential(r#"{"renovation_ideas": [{"area": "kitchen", "difficulty": "HEAVY"}]}"#);
        assert_eq!(score.score, 50.0);
        assert_eq!(score.feasibility, Level::Medium);
        assert_eq!(score.cost_class, CostClass::From50To100k);
        assert_eq!(score.renovation_ideas[0].difficulty, Level::Heavy);

        let labelled = parse_potential(r#"{"score": 72, "cost_class": "$200k+", "feasibility": "light"}"#);
        assert_eq!(labelled.cost_class, CostClass::Over200k);
        assert_eq!(labelled.feasibility, Level::Light);

        let fallback = parse_potential("no json here");
        assert_eq!(fallback.score, 50.0);
        assert_eq!(fallback.cost_class, CostClass::Unknown);
        assert_eq!(fallback.feasibility, Level::Medium);
        assert_eq!(fallback.upside_narrative, "Parse error. Raw: no json here");
    }
}
