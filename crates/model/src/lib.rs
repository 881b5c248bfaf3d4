//! Core domain model for skinfit ingredient analysis.
//!
//! This crate defines the fundamental types used throughout the system:
//! - `EffectKeyword`: The six fixed effect keywords with Korean display names
//! - `Reliability`: Confidence grade derived from keyword-hit volume
//! - `WeightProfile`: Per-skin-type importance/target-range settings
//! - `AnalysisResult`: The full output of one product analysis
//! - `AnalysisError`: Control-flow signals raised by the engine

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

/// Purpose marker for ingredients absent from the regulatory dictionary.
pub const UNKNOWN_PURPOSE: &str = "unknown";

/// Keyword marker carried by ingredients without a catalog keyword.
pub const UNCLASSIFIED_KEYWORD: &str = "unclassified";

/// The six fixed effect keywords.
///
/// Every keyword has a stable English identifier (used in wire formats and
/// weight profiles) and a Korean display name (used in catalog data).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKeyword {
    Moisturizing,
    Soothing,
    SebumControl,
    AntiAging,
    Brightening,
    Protection,
}

impl EffectKeyword {
    /// All keywords in canonical order.
    pub const ALL: [EffectKeyword; 6] = [
        EffectKeyword::Moisturizing,
        EffectKeyword::Soothing,
        EffectKeyword::SebumControl,
        EffectKeyword::AntiAging,
        EffectKeyword::Brightening,
        EffectKeyword::Protection,
    ];

    /// English identifier, as stored in weight profiles and catalog rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Moisturizing => "moisturizing",
            Self::Soothing => "soothing",
            Self::SebumControl => "sebum_control",
            Self::AntiAging => "anti_aging",
            Self::Brightening => "brightening",
            Self::Protection => "protection",
        }
    }

    /// Korean display name.
    pub fn korean(&self) -> &'static str {
        match self {
            Self::Moisturizing => "보습",
            Self::Soothing => "진정",
            Self::SebumControl => "피지",
            Self::AntiAging => "주름",
            Self::Brightening => "미백",
            Self::Protection => "보호",
        }
    }

    /// Resolve a keyword from either its English identifier or its Korean
    /// display name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == name || k.korean() == name)
    }
}

impl std::fmt::Display for EffectKeyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence grade of an analysis, from total keyword hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    /// Fewer than 3 keyword hits. Hard stop: no score may be produced.
    VeryLow,
    /// 3 to 6 hits. Scored, but warned and capped at 75.
    Low,
    /// 7 or more hits. Scored; capped at 95 while hits stay under 10.
    Normal,
}

impl Reliability {
    pub fn from_hits(total_keyword_hits: usize) -> Self {
        if total_keyword_hits < 3 {
            Self::VeryLow
        } else if total_keyword_hits < 7 {
            Self::Low
        } else {
            Self::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryLow => "very_low",
            Self::Low => "low",
            Self::Normal => "normal",
        }
    }
}

/// Inclusive target band for a keyword's share of the ingredient list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRange {
    pub lo: f64,
    pub hi: f64,
}

impl TargetRange {
    /// Non-binding full-range band used for absent or malformed entries.
    pub const NEUTRAL: TargetRange = TargetRange { lo: 0.0, hi: 100.0 };

    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, percent: f64) -> bool {
        self.lo <= percent && percent <= self.hi
    }

    pub fn mid(&self) -> f64 {
        (self.lo + self.hi) / 2.0
    }
}

impl Default for TargetRange {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Importance and target band for one keyword within a skin-type profile.
///
/// Deserialization is lenient: a non-numeric importance or a target range
/// that is not exactly two numeric bounds collapses to the neutral entry
/// (importance 0, range 0–100) instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeywordWeight {
    pub importance: f64,
    pub target_range: TargetRange,
}

impl Default for KeywordWeight {
    fn default() -> Self {
        Self {
            importance: 0.0,
            target_range: TargetRange::NEUTRAL,
        }
    }
}

impl<'de> Deserialize<'de> for KeywordWeight {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default)]
            importance: serde_json::Value,
            #[serde(default)]
            target_range: serde_json::Value,
        }

        let raw = Raw::deserialize(deserializer)?;
        let importance = raw.importance.as_f64().unwrap_or(0.0);
        let target_range = match raw.target_range.as_array() {
            Some(bounds) if bounds.len() == 2 => {
                match (bounds[0].as_f64(), bounds[1].as_f64()) {
                    (Some(lo), Some(hi)) => TargetRange { lo, hi },
                    _ => TargetRange::NEUTRAL,
                }
            }
            _ => TargetRange::NEUTRAL,
        };

        Ok(KeywordWeight {
            importance,
            target_range,
        })
    }
}

/// Skin-type weight profile: one entry per keyword the profile cares about.
///
/// Missing keywords read as the neutral entry, so the scoring pipeline can
/// always iterate all six keywords.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightProfile {
    weights: BTreeMap<EffectKeyword, KeywordWeight>,
}

impl WeightProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, keyword: EffectKeyword, weight: KeywordWeight) {
        self.weights.insert(keyword, weight);
    }

    /// Entry for a keyword, neutral when the profile does not mention it.
    pub fn get(&self, keyword: EffectKeyword) -> KeywordWeight {
        self.weights.get(&keyword).copied().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl FromIterator<(EffectKeyword, KeywordWeight)> for WeightProfile {
    fn from_iter<T: IntoIterator<Item = (EffectKeyword, KeywordWeight)>>(iter: T) -> Self {
        Self {
            weights: iter.into_iter().collect(),
        }
    }
}

/// An ingredient token that resolved to a catalog keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedIngredient {
    pub name: String,
    pub purpose: String,
    pub keyword: EffectKeyword,
}

/// An ingredient token without a catalog keyword. Carries whatever purpose
/// the regulatory dictionary knew, or [`UNKNOWN_PURPOSE`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedIngredient {
    pub name: String,
    pub purpose: String,
}

/// Per-keyword list of matched token spellings, with multiplicity.
pub type KeywordStats = BTreeMap<EffectKeyword, Vec<String>>;

/// A caution-list entry matched against the verified set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CautionEntry {
    pub korean_name: String,
    pub caution_grade: String,
}

/// Per-keyword scoring detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordScore {
    /// Share of keyword hits, rounded to 1 decimal.
    pub percent: f64,
    pub target_range: TargetRange,
    /// Piecewise fit value, rounded to 2 decimals.
    pub fit_score: f64,
    pub importance: f64,
    /// Fit scaled by importance, rounded to 2 decimals.
    pub contribution: f64,
}

/// Reference data prefetched by the caller in single-shot batch reads.
///
/// The engine never queries collaborators itself; everything it needs is
/// snapshot data keyed for O(1) membership tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceSnapshot {
    /// Dictionary A: normalized regulatory names present for these tokens.
    pub regulatory_normalized: HashSet<String>,
    /// Dictionary A: normalized name → purpose text.
    pub purposes: HashMap<String, String>,
    /// Dictionary B: exact Korean names present for these tokens.
    pub catalog_exact: HashSet<String>,
    /// Dictionary B: exact Korean name → effect keyword.
    pub keywords: HashMap<String, EffectKeyword>,
    /// Caution list: exact Korean name → caution grade.
    pub cautions: HashMap<String, String>,
}

/// Full result of analyzing one ingredient list against one skin type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub skin_type: String,
    /// Size of the verified set (distinct dictionary-confirmed spellings).
    pub verified_count: usize,
    /// Distinct token spellings across all keyword buckets.
    pub matched_count: usize,
    /// Keyword hits with multiplicity; drives reliability and ratios.
    pub keyword_hit_count: usize,
    pub reliability: Reliability,
    /// Score after soft caps, before the user-caution penalty.
    pub score_before: u32,
    pub final_score: u32,
    pub has_user_caution: bool,
    /// User-declared caution names found in the verified set.
    pub user_caution_hits: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning_message: Option<String>,
    pub ratios: BTreeMap<EffectKeyword, f64>,
    pub breakdown: BTreeMap<EffectKeyword, KeywordScore>,
    pub good_points: Vec<String>,
    pub weak_points: Vec<String>,
    pub opinion: String,
    pub matched: Vec<MatchedIngredient>,
    pub unmatched: Vec<UnmatchedIngredient>,
    pub caution_ingredients: Vec<CautionEntry>,
}

/// A product submitted for ranking: name, category, and its stored
/// comma-delimited ingredient list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductListing {
    pub product_name: String,
    pub category: String,
    pub ingredient_list: String,
}

/// One scored product within a category ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedProduct {
    pub product_name: String,
    pub category: String,
    pub final_score: u32,
    pub score_before: u32,
    pub has_user_caution: bool,
    pub user_caution_hits: Vec<String>,
    pub matched_count: usize,
    pub total_keyword_hits: usize,
    pub reliability: Reliability,
}

/// Errors raised by the analysis engine.
///
/// `InsufficientMatches` is a deliberate control-flow signal (the very_low
/// hard stop), not a defect; numeric edge cases never raise.
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("analysis aborted: only {hits} ingredients matched a keyword (minimum 3)")]
    InsufficientMatches { hits: usize },

    #[error("input text is empty or too short to analyze")]
    EmptyInput,

    #[error("no known ingredients found in input")]
    NoIngredientsFound,
}
