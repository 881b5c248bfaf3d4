//! Explanation text for analysis results.
//!
//! Deterministic template assembly from the score breakdown: no model
//! calls, no randomness, suitable for display as-is.

use serde::{Deserialize, Serialize};
use skinfit_model::{EffectKeyword, KeywordScore};
use std::collections::BTreeMap;

/// Contribution above which a keyword counts as a good point.
const GOOD_CONTRIBUTION_MIN: f64 = 0.5;

/// Importance at or above which a missed target counts as a weak point.
const WEAK_IMPORTANCE_MIN: f64 = 1.0;

/// Final-score bands for the overall verdict.
const EXCELLENT_SCORE_MIN: u32 = 80;
const ACCEPTABLE_SCORE_MIN: u32 = 70;

/// Caution counts at or above this get the stronger wording.
const CAUTION_MANY: usize = 4;

/// Warning prefixed to the opinion when reliability is low.
const LOW_RELIABILITY_WARNING: &str = "Low-reliability analysis: few ingredients matched the \
     reference data, so results may be inaccurate. Retake the ingredient-list photo \
     (straight-on, bright, close-up) and analyze again.";

/// The three text blocks of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisTexts {
    pub good_points: Vec<String>,
    pub weak_points: Vec<String>,
    pub opinion: String,
}

/// Assemble good points, weak points, and the overall opinion.
pub fn generate(
    skin_type: &str,
    final_score: u32,
    breakdown: &BTreeMap<EffectKeyword, KeywordScore>,
    caution_count: usize,
) -> AnalysisTexts {
    let mut good_points = Vec::new();
    for (keyword, data) in breakdown {
        let range = data.target_range;
        if data.contribution > GOOD_CONTRIBUTION_MIN && range.contains(data.percent) {
            good_points.push(format!(
                "**{keyword}**: {}% (within the {}-{}% target range)",
                data.percent, range.lo, range.hi
            ));
        }
    }

    let mut weak_points = Vec::new();
    for (keyword, data) in breakdown {
        if data.importance < WEAK_IMPORTANCE_MIN {
            continue;
        }
        let range = data.target_range;
        if data.percent < range.lo {
            let deficit = range.lo - data.percent;
            weak_points.push(format!(
                "**{keyword}**: {}% (needs at least {}%, {deficit:.1}% short)",
                data.percent, range.lo
            ));
        } else if data.percent > range.hi && range.hi != 100.0 && range.hi != 0.0 {
            let excess = data.percent - range.hi;
            weak_points.push(format!(
                "**{keyword}**: {}% (at most {}% recommended, {excess:.1}% over)",
                data.percent, range.hi
            ));
        }
    }

    let fit_level = if final_score >= EXCELLENT_SCORE_MIN {
        "an excellent fit"
    } else if final_score >= ACCEPTABLE_SCORE_MIN {
        "an acceptable fit"
    } else {
        "a poor fit"
    };

    let caution_msg = if caution_count == 0 {
        "No caution ingredients were found.".to_string()
    } else if caution_count < CAUTION_MANY {
        format!("{caution_count} caution ingredient(s) present; keep them in mind.")
    } else {
        format!("{caution_count} caution ingredients present; use with care.")
    };

    let opinion =
        format!("This product is **{fit_level}** for the **{skin_type}** skin type. {caution_msg}");

    AnalysisTexts {
        good_points: non_empty_or(good_points, "No standout attributes for this skin type."),
        weak_points: non_empty_or(weak_points, "Every attribute sits within an acceptable range."),
        opinion,
    }
}

/// Prefix the low-reliability warning to an opinion.
pub fn prepend_low_reliability_warning(opinion: &str) -> String {
    format!("{LOW_RELIABILITY_WARNING}\n\n{opinion}")
}

fn non_empty_or(points: Vec<String>, fallback: &str) -> Vec<String> {
    if points.is_empty() {
        vec![fallback.to_string()]
    } else {
        points
    }
}
