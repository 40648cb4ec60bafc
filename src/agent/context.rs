//! Prompt context builders for the stage agents.

use std::fmt::Write;

use crate::models::{Listing, TasteModel, VisionAnalysis};
use crate::utils::text::{bullets, head_chars, joined_or};

const DESCRIPTION_CHARS_SCORING: usize = 1000;
const DESCRIPTION_CHARS_BRIEF: usize = 800;
const BRIEF_PRINCIPLES: usize = 5;

fn optional<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "Unknown".to_string())
}

fn description(listing: &Listing, max_chars: usize) -> &str {
    if listing.description.is_empty() {
        "No description"
    } else {
        head_chars(&listing.description, max_chars)
    }
}

fn vision_summary(out: &mut String, vision: &VisionAnalysis) {
    let _ = writeln!(out, "Overall Aesthetic: {}/10", vision.overall_aesthetic);
    let _ = writeln!(out, "Architectural Style: {}", vision.architectural_style);
    let _ = writeln!(out, "Renovation State: {}", vision.renovation_state);
}

fn rooms(out: &mut String, vision: &VisionAnalysis) {
    for room in &vision.rooms {
        let _ = writeln!(
            out,
            "\n- {}: {}/10\n  Materials: {}\n  Light: {}\n  Condition: {}\n  Notes: {}",
            room.room_type,
            room.aesthetic_quality,
            room.materials.join(", "),
            room.light_quality,
            room.condition,
            room.notes
        );
    }
}

pub fn present_fit_context(listing: &Listing, vision: &VisionAnalysis, taste: &TasteModel) -> String {
    let features = &listing.features;
    let mut out = String::new();
    let _ = writeln!(out, "## House Information");
    let _ = writeln!(out, "Address: {}", listing.address);
    let _ = writeln!(out, "Price: {}", listing.price_label());
    let _ = writeln!(
        out,
        "Beds: {} | Baths: {} | Sqft: {}",
        optional(features.bedrooms),
        optional(features.bathrooms),
        optional(features.sqft)
    );
    let _ = writeln!(
        out,
        "\n## Listing Description\n{}",
        description(listing, DESCRIPTION_CHARS_SCORING)
    );

    let _ = writeln!(out, "\n## Vision Analysis");
    vision_summary(&mut out, vision);
    let _ = writeln!(out, "\n### Rooms Analyzed:");
    rooms(&mut out, vision);
    let _ = writeln!(out, "\n### Red Flags:\n{}", bullets(&vision.red_flags, "(none)"));
    let _ = writeln!(
        out,
        "\n### Positive Signals:\n{}",
        bullets(&vision.positive_signals, "(none)")
    );

    let none = "(none specified)";
    let _ = writeln!(out, "\n## Taste Model");
    let _ = writeln!(out, "\n### Principles (what to look for):\n{}", bullets(&taste.principles, none));
    let _ = writeln!(out, "\n### Anti-Principles (what to avoid):\n{}", bullets(&taste.anti_principles, none));
    let _ = writeln!(out, "\n### Hard Constraints (must have):\n{}", bullets(&taste.hard_constraints, none));
    let _ = writeln!(out, "\n### Soft Constraints (prefer):\n{}", bullets(&taste.soft_constraints, none));
    let _ = writeln!(
        out,
        "\n### Violation Patterns (auto-reject signals):\n{}",
        bullets(&taste.violation_patterns, none)
    );
    let _ = writeln!(out, "\n### Scoring Dimensions:");
    for dim in &taste.dimensions {
        let _ = writeln!(out, "- {} (weight: {}): {}", dim.name, dim.weight, dim.description);
    }
    out
}

pub fn potential_context(listing: &Listing, vision: &VisionAnalysis, taste: &TasteModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "## House Information");
    let _ = writeln!(out, "Address: {}", listing.address);
    let _ = writeln!(out, "Price: {}", listing.price_label());
    let _ = writeln!(out, "Year Built: {}", optional(listing.features.year_built));
    let _ = writeln!(out, "Sqft: {}", optional(listing.features.sqft));

    let _ = writeln!(out, "\n## Current State (from Vision Analysis)");
    vision_summary(&mut out, vision);
    let _ = writeln!(out, "\n### Room-by-Room:");
    rooms(&mut out, vision);
    let _ = writeln!(
        out,
        "\n### Red Flags (issues to address):\n{}",
        bullets(&vision.red_flags, "(none)")
    );
    let _ = writeln!(
        out,
        "\n### Positive Signals (good bones):\n{}",
        bullets(&vision.positive_signals, "(none)")
    );

    let _ = writeln!(out, "\n## User's Renovation Tolerance");
    let _ = writeln!(out, "Tolerance: {}", taste.renovation_tolerance);
    let _ = writeln!(out, "Max Budget: {}", taste.renovation_budget_label());
    let _ = writeln!(
        out,
        "\n## User's Aesthetic Principles (what renovation should achieve):\n{}",
        bullets(&taste.principles, "(none specified)")
    );
    out
}

pub fn brief_context(listing: &Listing, taste: &TasteModel) -> String {
    let features = &listing.features;
    let mut out = String::new();
    let _ = writeln!(out, "## House");
    let _ = writeln!(out, "Address: {}", listing.address);
    let _ = writeln!(out, "Price: {}", listing.price_label());
    let _ = writeln!(
        out,
        "Beds: {} | Baths: {} | Sqft: {}",
        optional(features.bedrooms),
        optional(features.bathrooms),
        optional(features.sqft)
    );
    let _ = writeln!(out, "URL: {}", listing.url);
    let _ = writeln!(out, "\n## Description\n{}", description(listing, DESCRIPTION_CHARS_BRIEF));

    if let Some(ref va) = listing.vision_analysis {
        let _ = writeln!(out, "\n## Vision Analysis");
        let _ = writeln!(out, "Overall Aesthetic: {}/10", va.overall_aesthetic);
        let _ = writeln!(out, "Style: {}", va.architectural_style);
        let _ = writeln!(out, "Renovation State: {}", va.renovation_state);
        let _ = writeln!(out, "\nRed Flags: {}", joined_or(&va.red_flags, "None"));
        let _ = writeln!(out, "Positive Signals: {}", joined_or(&va.positive_signals, "None"));
    }

    if let Some(ref pf) = listing.present_fit_score {
        let _ = writeln!(out, "\n## Present-Fit Score: {:.1}/100", pf.score);
        let _ = writeln!(out, "Passed: {}", if pf.passed { "Yes" } else { "No" });
        let _ = writeln!(out, "Violations: {}", joined_or(&pf.violations, "None"));
        let _ = writeln!(out, "Deal-Breakers: {}", joined_or(&pf.deal_breakers, "None"));
        let _ = writeln!(out, "\nJustification: {}", pf.justification);
    }

    if let Some(ref ps) = listing.potential_score {
        let _ = writeln!(out, "\n## Potential Score: {:.1}/100", ps.score);
        let _ = writeln!(out, "Feasibility: {}", ps.feasibility);
        let _ = writeln!(out, "Cost Class: {}", ps.cost_class);
        let _ = writeln!(out, "\nUpside: {}", ps.upside_narrative);
        let _ = writeln!(out, "\nRisks: {}", joined_or(&ps.risk_notes, "None"));
    }

    let top = |items: &[String]| -> Vec<String> { items.iter().take(BRIEF_PRINCIPLES).cloned().collect() };
    let _ = writeln!(
        out,
        "\n## User's Key Principles\n{}",
        bullets(&top(&taste.principles), "(not specified)")
    );
    let _ = writeln!(
        out,
        "\n## User's Anti-Principles\n{}",
        bullets(&top(&taste.anti_principles), "(not specified)")
    );
    out
}

pub fn distiller_context(taste: &TasteModel) -> String {
    let none = "(none)";
    let mut out = String::from("## Taste Model Data\n");
    let _ = writeln!(out, "\n### Core Principles\n{}", bullets(&taste.principles, none));
    let _ = writeln!(out, "\n### Anti-Principles (Things to Avoid)\n{}", bullets(&taste.anti_principles, none));
    let _ = writeln!(out, "\n### Hard Constraints (Must Have)\n{}", bullets(&taste.hard_constraints, none));
    let _ = writeln!(out, "\n### Soft Constraints (Prefer)\n{}", bullets(&taste.soft_constraints, none));
    let _ = writeln!(
        out,
        "\n### Violation Patterns (Auto-Reject Signals)\n{}",
        bullets(&taste.violation_patterns, none)
    );

    let _ = writeln!(out, "\n### Weighted Dimensions");
    for dim in &taste.dimensions {
        let _ = writeln!(out, "- {} ({:.0}%): {}", dim.name, dim.weight * 100.0, dim.description);
    }

    let _ = writeln!(out, "\n### Location Preferences");
    if taste.location_preferences.is_empty() {
        let _ = writeln!(out, "(none specified)");
    }
    for (key, value) in &taste.location_preferences {
        let _ = writeln!(out, "- {}: {}", key, value);
    }

    let _ = writeln!(out, "\n### Renovation Stance");
    let _ = writeln!(out, "- Tolerance: {}", taste.renovation_tolerance);
    let _ = writeln!(out, "- Max Budget: {}", taste.renovation_budget_label());

    let _ = writeln!(out, "\n### Exemplars");
    if taste.exemplars.is_empty() {
        let _ = writeln!(out, "(no exemplars yet)");
    }
    for ex in &taste.exemplars {
        let _ = writeln!(out, "- {}: {} - {}", ex.address, ex.sentiment, ex.reason);
    }

    let _ = writeln!(out, "\n### Version: {}", taste.version);
    let notes = if taste.notes.is_empty() { none } else { taste.notes.as_str() };
    let _ = writeln!(out, "### Notes: {}", notes);
    out
}
