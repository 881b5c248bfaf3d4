//! Ingredient matching against the reference dictionaries.
//!
//! Two independent passes run over the token sequence:
//! - [`verified_ingredients`] builds the verified set (dual-criteria,
//!   deduplicated) used for ingredient counting and caution checks.
//! - [`resolve_keywords`] maps tokens to effect keywords and purposes,
//!   with multiplicity, driving reliability and all percentage math.
//!
//! A token can register in one pass and not the other; the two counts are
//! reported independently on purpose. Do not merge these functions.

use skinfit_model::{
    CautionEntry, KeywordStats, MatchedIngredient, ReferenceSnapshot, UnmatchedIngredient,
    UNKNOWN_PURPOSE,
};
use skinfit_text::{normalize, tokenize_free_text};
use std::collections::HashSet;

/// The two key sets a reference backend needs for its single-shot batch
/// reads: normalized names for Dictionary A, raw spellings for Dictionary B.
#[derive(Debug, Clone, Default)]
pub struct LookupPlan {
    pub normalized: HashSet<String>,
    pub exact: HashSet<String>,
}

impl LookupPlan {
    pub fn for_tokens<S: AsRef<str>>(tokens: &[S]) -> Self {
        Self {
            normalized: tokens
                .iter()
                .filter_map(|t| normalize(t.as_ref()))
                .collect(),
            exact: tokens.iter().map(|t| t.as_ref().to_string()).collect(),
        }
    }
}

/// Build the verified set: distinct original-spelling tokens confirmed by
/// either reference dictionary.
///
/// A token qualifies when its normalized form appears in Dictionary A or
/// its raw spelling appears in Dictionary B. Tokens matched via Dictionary A
/// dedup on the normalized name, so spelling variants of one ingredient
/// contribute a single entry (the first spelling seen); exact-only matches
/// dedup on the raw spelling. Order follows the token sequence.
pub fn verified_ingredients(tokens: &[String], snapshot: &ReferenceSnapshot) -> Vec<String> {
    let mut matched = Vec::new();
    let mut seen = HashSet::new();

    for token in tokens {
        let normalized = normalize(token);
        let in_regulatory = normalized
            .as_deref()
            .is_some_and(|n| snapshot.regulatory_normalized.contains(n));
        let in_catalog = snapshot.catalog_exact.contains(token.as_str());

        if in_regulatory || in_catalog {
            let key = match (in_regulatory, normalized) {
                (true, Some(n)) => n,
                _ => format!("EXACT::{token}"),
            };
            if seen.insert(key) {
                matched.push(token.clone());
            }
        }
    }

    matched
}

/// Outcome of the keyword-resolution pass.
#[derive(Debug, Clone, Default)]
pub struct KeywordResolution {
    pub matched: Vec<MatchedIngredient>,
    pub stats: KeywordStats,
    pub unmatched: Vec<UnmatchedIngredient>,
}

impl KeywordResolution {
    /// Keyword hits counted with multiplicity.
    pub fn total_hits(&self) -> usize {
        self.matched.len()
    }

    /// Distinct token spellings across all keyword buckets.
    pub fn unique_matched_count(&self) -> usize {
        self.stats
            .values()
            .flatten()
            .map(String::as_str)
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Resolve each token to a catalog keyword (exact raw-string match) and a
/// regulatory purpose (normalized match).
///
/// Tokens without a keyword land in `unmatched` carrying whatever purpose
/// was found or the literal `"unknown"` marker. Duplicates count twice.
pub fn resolve_keywords(tokens: &[String], snapshot: &ReferenceSnapshot) -> KeywordResolution {
    let mut resolution = KeywordResolution::default();

    for token in tokens {
        let Some(normalized) = normalize(token) else {
            continue;
        };
        let purpose = snapshot
            .purposes
            .get(&normalized)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_PURPOSE.to_string());

        match snapshot.keywords.get(token.as_str()) {
            Some(&keyword) => {
                resolution.stats.entry(keyword).or_default().push(token.clone());
                resolution.matched.push(MatchedIngredient {
                    name: token.clone(),
                    purpose,
                    keyword,
                });
            }
            None => resolution.unmatched.push(UnmatchedIngredient {
                name: token.clone(),
                purpose,
            }),
        }
    }

    resolution
}

/// Exact-match the verified set against the caution list.
pub fn caution_hits(verified: &[String], snapshot: &ReferenceSnapshot) -> Vec<CautionEntry> {
    verified
        .iter()
        .filter_map(|name| {
            snapshot.cautions.get(name.as_str()).map(|grade| CautionEntry {
                korean_name: name.clone(),
                caution_grade: grade.clone(),
            })
        })
        .collect()
}

/// Intersect a user's declared caution names with the verified set.
///
/// Both sides are normalized before comparison, absorbing spacing, case,
/// and hyphen differences between stored user entries and catalog/OCR
/// spellings. Returns the user's stored spellings.
pub fn user_caution_hits(verified: &[String], user_caution_names: &[String]) -> Vec<String> {
    let product_normalized: HashSet<String> =
        verified.iter().filter_map(|t| normalize(t)).collect();

    user_caution_names
        .iter()
        .filter(|name| {
            normalize(name).is_some_and(|n| product_normalized.contains(&n))
        })
        .cloned()
        .collect()
}

/// Extract verified ingredient candidates from free-form OCR text.
///
/// Tokenizes in free-text mode, then applies the dual-criteria filter so
/// downstream analysis never sees unverifiable OCR noise.
pub fn extract_candidates(free_text: &str, snapshot: &ReferenceSnapshot) -> Vec<String> {
    let tokens = tokenize_free_text(free_text);
    verified_ingredients(&tokens, snapshot)
}
