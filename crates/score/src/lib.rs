//! Fit scoring for ingredient analyses.
//!
//! Takes resolved keyword statistics and a skin-type weight profile and
//! produces the bounded 0–100 fit score: per-keyword ratios, the piecewise
//! target-range fit model, signed-importance contributions, rescaling,
//! reliability soft caps, and the user-caution penalty. [`analyze`] is the
//! single pure entry point composing the whole pipeline; [`rank_products`]
//! reuses it across a product list.

use skinfit_explain::{generate, prepend_low_reliability_warning};
use skinfit_match::{
    caution_hits, extract_candidates, resolve_keywords, user_caution_hits, verified_ingredients,
};
use skinfit_model::{
    AnalysisError, AnalysisResult, EffectKeyword, KeywordScore, KeywordStats, ProductListing,
    RankedProduct, ReferenceSnapshot, Reliability, TargetRange, WeightProfile,
};
use skinfit_text::tokenize_delimited;
use std::collections::BTreeMap;

// Product-tuned scoring constants. The band edges, damping factors, and
// rescale anchors below were fixed by calibration against rated products;
// change them together or not at all.

/// Fit at the exact midpoint of a target band.
const IN_RANGE_PEAK: f64 = 0.97;
/// Fit at the edges of a target band; in-range fit never drops below this.
const IN_RANGE_FLOOR: f64 = 0.90;
/// A positive keyword may overshoot its ceiling up to `hi * 1.5` before the
/// steep falloff starts.
const SOFT_MAX_FACTOR: f64 = 1.5;
/// Fit floor inside the soft overshoot window.
const OVERSHOOT_FLOOR: f64 = 0.2;
/// Slope of the overshoot penalty for negative-importance keywords.
const NEGATIVE_OVERSHOOT_SLOPE: f64 = 5.0;
/// Fit floor for negative-importance overshoot; fit may go below zero here.
const NEGATIVE_OVERSHOOT_FLOOR: f64 = -0.5;
/// Damping applied to penalties from negative-importance keywords.
const NEGATIVE_CONTRIBUTION_WEIGHT: f64 = 0.75;
/// Weighting of negative importances in the worst-case score bound.
const MIN_SCORE_WEIGHT: f64 = 0.7;
/// Raw contributions rescale into `BASE_SCORE..BASE_SCORE + VARIABLE_SPAN`.
const BASE_SCORE: f64 = 25.0;
const VARIABLE_SPAN: f64 = 75.0;
/// Score ceiling for low-reliability analyses.
const LOW_RELIABILITY_CAP: u32 = 75;
/// Score ceiling for normal reliability with a small keyword sample.
const SMALL_SAMPLE_CAP: u32 = 95;
const SMALL_SAMPLE_HITS: usize = 10;
/// Flat deduction when a user-declared caution ingredient is present.
const USER_CAUTION_PENALTY: u32 = 40;
/// Free-form text shorter than this cannot carry an ingredient list.
const MIN_FREE_TEXT_CHARS: usize = 10;
/// Ranking output is truncated to at most this many items.
const RANK_LIMIT_MAX: usize = 20;

/// Warning attached to results penalized for a user caution ingredient.
pub const USER_CAUTION_WARNING: &str = "Declared caution ingredient present.";

/// How the input text turns into ingredient tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMode {
    /// Comma-delimited stored ingredient list.
    Delimited,
    /// Free-form OCR text; candidates are dual-criteria filtered first.
    FreeText,
}

/// Per-keyword share of keyword hits, in percent rounded to 2 decimals.
///
/// All six keywords are always present; zero hits yields an all-zero map.
pub fn keyword_ratios(
    stats: &KeywordStats,
    total_keyword_hits: usize,
) -> BTreeMap<EffectKeyword, f64> {
    EffectKeyword::ALL
        .iter()
        .map(|&keyword| {
            let count = stats.get(&keyword).map_or(0, Vec::len);
            let percent = if total_keyword_hits == 0 {
                0.0
            } else {
                round_to(count as f64 / total_keyword_hits as f64 * 100.0, 2)
            };
            (keyword, percent)
        })
        .collect()
}

/// Piecewise fit of a keyword share against its target band.
///
/// Inside the band the fit peaks at the midpoint (0.97) and falls to 0.90
/// at the edges. Below the band it scales linearly with the shortfall.
/// Above the band, positive-importance keywords get a soft window up to
/// `hi * 1.5` before the steep falloff; negative-importance keywords are
/// penalized immediately and may go as low as -0.5. `None` for the band
/// answers the neutral 0.5.
pub fn fit_score(percent: f64, target: Option<TargetRange>, importance: f64) -> f64 {
    let Some(range) = target else {
        return 0.5;
    };

    if range.contains(percent) {
        let half = ((range.hi - range.lo) / 2.0).max(1.0);
        let deviation = ((percent - range.mid()).abs() / half).min(1.0);
        let fit = round_to(IN_RANGE_PEAK - deviation * (IN_RANGE_PEAK - IN_RANGE_FLOOR), 4);
        return fit.max(IN_RANGE_FLOOR);
    }

    if percent < range.lo {
        if range.lo <= 0.0 {
            return if percent == 0.0 { 1.0 } else { 0.5 };
        }
        return (percent / range.lo).max(0.0);
    }

    // percent > range.hi
    if importance < 0.0 {
        let excess = (percent - range.hi) / 100.0;
        return (1.0 - excess * NEGATIVE_OVERSHOOT_SLOPE).max(NEGATIVE_OVERSHOOT_FLOOR);
    }

    let soft_max = range.hi * SOFT_MAX_FACTOR;
    if percent <= soft_max {
        let span = soft_max - range.hi;
        let ratio = if span == 0.0 {
            0.0
        } else {
            (percent - range.hi) / span
        };
        (1.0 - ratio * (1.0 - OVERSHOOT_FLOOR)).max(OVERSHOOT_FLOOR)
    } else {
        let divisor = if range.hi == 0.0 { 1.0 } else { range.hi };
        (OVERSHOOT_FLOOR - (percent - soft_max) / divisor * OVERSHOOT_FLOOR).max(0.0)
    }
}

/// Fit and signed contribution for one keyword.
///
/// Negative importance marks an attribute the skin type wants little of:
/// staying at or under the ceiling is fully rewarded (fit forced to 1.0,
/// contribution 0) rather than scored, and overshoot penalties are damped
/// by 0.75.
pub fn contribution(percent: f64, target: Option<TargetRange>, importance: f64) -> (f64, f64) {
    if importance < 0.0 {
        let Some(range) = target else {
            return (0.0, 0.0);
        };
        if percent <= range.hi {
            return (1.0, 0.0);
        }
        let fit = fit_score(percent, Some(range), importance);
        return (fit, (1.0 - fit) * importance * NEGATIVE_CONTRIBUTION_WEIGHT);
    }

    let fit = fit_score(percent, target, importance);
    (fit, fit * importance)
}

/// Combine per-keyword contributions into the bounded final score.
///
/// Contributions are normalized against the best and worst achievable
/// bounds for the profile, rescaled into 25..100, ceiling-rounded, and
/// clamped. Returns the score and the per-keyword breakdown.
pub fn aggregate_score(
    ratios: &BTreeMap<EffectKeyword, f64>,
    profile: &WeightProfile,
) -> (u32, BTreeMap<EffectKeyword, KeywordScore>) {
    let mut total_contribution = 0.0;
    let mut max_possible = 0.0;
    let mut min_possible = 0.0;
    let mut breakdown = BTreeMap::new();

    for keyword in EffectKeyword::ALL {
        let weight = profile.get(keyword);
        let percent = ratios.get(&keyword).copied().unwrap_or(0.0);
        let (fit, contrib) = contribution(percent, Some(weight.target_range), weight.importance);

        total_contribution += contrib;
        if weight.importance > 0.0 {
            max_possible += weight.importance;
        } else if weight.importance < 0.0 {
            min_possible += weight.importance * MIN_SCORE_WEIGHT;
        }

        breakdown.insert(
            keyword,
            KeywordScore {
                percent: round_to(percent, 1),
                target_range: weight.target_range,
                fit_score: round_to(fit, 2),
                importance: weight.importance,
                contribution: round_to(contrib, 2),
            },
        );
    }

    if max_possible == 0.0 {
        max_possible = 1.0;
    }
    let score_range = max_possible - min_possible;
    let final_score = if score_range == 0.0 {
        50.0
    } else {
        let normalized = (total_contribution - min_possible) / score_range;
        BASE_SCORE + normalized * VARIABLE_SPAN
    };

    (final_score.ceil().clamp(0.0, 100.0) as u32, breakdown)
}

/// Reliability-based score ceilings. Idempotent.
///
/// very_low never reaches this point on the single-product path (hard stop)
/// and is deliberately uncapped on the ranking path.
pub fn apply_soft_caps(
    final_score: u32,
    total_keyword_hits: usize,
    reliability: Reliability,
) -> u32 {
    match reliability {
        Reliability::Low => final_score.min(LOW_RELIABILITY_CAP),
        Reliability::Normal if total_keyword_hits < SMALL_SAMPLE_HITS => {
            final_score.min(SMALL_SAMPLE_CAP)
        }
        _ => final_score,
    }
}

/// Analyze one ingredient list against one skin-type profile.
///
/// Pure and synchronous: all reference data arrives prefetched in the
/// snapshot. Fails with `InsufficientMatches` when fewer than 3 tokens
/// resolve to a keyword; every numeric edge case inside the pipeline has a
/// defined fallback instead.
pub fn analyze(
    ingredient_text: &str,
    mode: TokenMode,
    skin_type: &str,
    snapshot: &ReferenceSnapshot,
    profile: &WeightProfile,
    user_caution_names: &[String],
) -> Result<AnalysisResult, AnalysisError> {
    let tokens = match mode {
        TokenMode::Delimited => tokenize_delimited(ingredient_text),
        TokenMode::FreeText => {
            if ingredient_text.trim().chars().count() < MIN_FREE_TEXT_CHARS {
                return Err(AnalysisError::EmptyInput);
            }
            extract_candidates(ingredient_text, snapshot)
        }
    };
    if tokens.is_empty() {
        return Err(AnalysisError::NoIngredientsFound);
    }

    let resolution = resolve_keywords(&tokens, snapshot);
    let total_keyword_hits = resolution.total_hits();
    let reliability = Reliability::from_hits(total_keyword_hits);
    if reliability == Reliability::VeryLow {
        return Err(AnalysisError::InsufficientMatches {
            hits: total_keyword_hits,
        });
    }

    let verified = verified_ingredients(&tokens, snapshot);
    let ratios = keyword_ratios(&resolution.stats, total_keyword_hits);
    let (base_score, breakdown) = aggregate_score(&ratios, profile);
    let capped_score = apply_soft_caps(base_score, total_keyword_hits, reliability);

    let caution_ingredients = caution_hits(&verified, snapshot);
    let user_hits = user_caution_hits(&verified, user_caution_names);

    let score_before = capped_score;
    let has_user_caution = !user_hits.is_empty();
    let (final_score, warning_message) = if has_user_caution {
        (
            capped_score.saturating_sub(USER_CAUTION_PENALTY),
            Some(USER_CAUTION_WARNING.to_string()),
        )
    } else {
        (capped_score, None)
    };

    let mut texts = generate(skin_type, final_score, &breakdown, caution_ingredients.len());
    if reliability == Reliability::Low {
        texts.opinion = prepend_low_reliability_warning(&texts.opinion);
    }

    Ok(AnalysisResult {
        skin_type: skin_type.to_string(),
        verified_count: verified.len(),
        matched_count: resolution.unique_matched_count(),
        keyword_hit_count: total_keyword_hits,
        reliability,
        score_before,
        final_score,
        has_user_caution,
        user_caution_hits: user_hits,
        warning_message,
        ratios,
        breakdown,
        good_points: texts.good_points,
        weak_points: texts.weak_points,
        opinion: texts.opinion,
        matched: resolution.matched,
        unmatched: resolution.unmatched,
        caution_ingredients,
    })
}

/// Score every product in a listing and return the best fits first.
///
/// Ranking is lenient where single-product analysis hard-stops: products
/// with zero keyword hits are skipped, but 1–2-hit products stay in the
/// result labeled `very_low`. The snapshot must cover the union of all
/// product tokens (one bulk read, not one per product). `limit` is clamped
/// to 1..=20.
pub fn rank_products(
    products: &[ProductListing],
    snapshot: &ReferenceSnapshot,
    profile: &WeightProfile,
    user_caution_names: &[String],
    limit: usize,
) -> Vec<RankedProduct> {
    let mut items = Vec::new();

    for product in products {
        let tokens = tokenize_delimited(&product.ingredient_list);
        let resolution = resolve_keywords(&tokens, snapshot);
        let total_keyword_hits = resolution.total_hits();
        if total_keyword_hits == 0 {
            continue;
        }
        let reliability = Reliability::from_hits(total_keyword_hits);

        let ratios = keyword_ratios(&resolution.stats, total_keyword_hits);
        let (base_score, _) = aggregate_score(&ratios, profile);
        let capped_score = apply_soft_caps(base_score, total_keyword_hits, reliability);

        let verified = verified_ingredients(&tokens, snapshot);
        let user_hits = user_caution_hits(&verified, user_caution_names);
        let final_score = if user_hits.is_empty() {
            capped_score
        } else {
            capped_score.saturating_sub(USER_CAUTION_PENALTY)
        };

        items.push(RankedProduct {
            product_name: product.product_name.clone(),
            category: product.category.clone(),
            final_score,
            score_before: capped_score,
            has_user_caution: !user_hits.is_empty(),
            user_caution_hits: user_hits,
            matched_count: resolution.unique_matched_count(),
            total_keyword_hits,
            reliability,
        });
    }

    items.sort_by(|a, b| b.final_score.cmp(&a.final_score));
    items.truncate(limit.clamp(1, RANK_LIMIT_MAX));
    items
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use skinfit_model::KeywordWeight;

    fn range(lo: f64, hi: f64) -> Option<TargetRange> {
        Some(TargetRange::new(lo, hi))
    }

    fn profile_one(keyword: EffectKeyword, importance: f64, lo: f64, hi: f64) -> WeightProfile {
        [(
            keyword,
            KeywordWeight {
                importance,
                target_range: TargetRange::new(lo, hi),
            },
        )]
        .into_iter()
        .collect()
    }

    /// Snapshot where every listed name is an exact catalog entry with the
    /// moisturizing keyword.
    fn moisturizing_snapshot(names: &[&str]) -> ReferenceSnapshot {
        let mut snap = ReferenceSnapshot::default();
        for name in names {
            snap.catalog_exact.insert(name.to_string());
            snap.keywords
                .insert(name.to_string(), EffectKeyword::Moisturizing);
        }
        snap
    }

    #[test]
    fn test_fit_in_range_band() {
        // Midpoint peaks at 0.97, edges floor at 0.90.
        assert_eq!(fit_score(50.0, range(40.0, 60.0), 1.0), 0.97);
        assert_eq!(fit_score(40.0, range(40.0, 60.0), 1.0), 0.90);
        assert_eq!(fit_score(60.0, range(40.0, 60.0), 1.0), 0.90);

        for percent in [41.0, 45.0, 48.0, 55.0, 59.0] {
            let fit = fit_score(percent, range(40.0, 60.0), 1.0);
            assert!((0.90..=0.97).contains(&fit), "fit {fit} out of band");
        }
    }

    #[test]
    fn test_fit_below_range() {
        assert_eq!(fit_score(20.0, range(40.0, 60.0), 1.0), 0.5);
        assert_eq!(fit_score(30.0, range(60.0, 80.0), 1.0), 0.5);
        // A degenerate [0,0] band still contains an exact zero.
        assert_eq!(fit_score(0.0, range(0.0, 0.0), 1.0), 0.97);

        let fit = fit_score(10.0, range(40.0, 60.0), 1.0);
        assert_eq!(fit, 0.25);
        assert!(fit < 1.0);
    }

    #[test]
    fn test_fit_overshoot_soft_window() {
        // percent 100, range [50,90]: soft max 135, still inside the window.
        let fit = fit_score(100.0, range(50.0, 90.0), 1.0);
        assert!((fit - 0.8222).abs() < 1e-3);

        // percent 100, range [40,60]: past the soft max of 90, steep branch.
        let fit = fit_score(100.0, range(40.0, 60.0), 1.0);
        assert!((fit - 0.1667).abs() < 1e-3);
        assert!(fit < IN_RANGE_FLOOR);
    }

    #[test]
    fn test_fit_overshoot_negative_importance() {
        // Far over the ceiling of a bad attribute: floored at -0.5.
        assert_eq!(fit_score(100.0, range(0.0, 20.0), -1.0), -0.5);
        // Slightly over: linear with slope 5.
        let fit = fit_score(30.0, range(0.0, 20.0), -1.0);
        assert!((fit - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_fit_missing_range_is_neutral() {
        assert_eq!(fit_score(42.0, None, 1.0), 0.5);
    }

    #[test]
    fn test_contribution_negative_importance() {
        // Under the ceiling: fully rewarded, never scored.
        assert_eq!(contribution(10.0, range(0.0, 20.0), -1.0), (1.0, 0.0));
        assert_eq!(contribution(0.0, range(0.0, 20.0), -2.0), (1.0, 0.0));
        // No range at all: nothing to judge.
        assert_eq!(contribution(50.0, None, -1.0), (0.0, 0.0));

        // Over the ceiling: damped negative contribution.
        let (fit, contrib) = contribution(100.0, range(0.0, 20.0), -1.0);
        assert_eq!(fit, -0.5);
        assert_eq!(contrib, (1.0 - fit) * -1.0 * 0.75);
        assert!(contrib < 0.0);
    }

    #[test]
    fn test_contribution_positive_importance() {
        let (fit, contrib) = contribution(50.0, range(40.0, 60.0), 2.0);
        assert_eq!(fit, 0.97);
        assert_eq!(contrib, 1.94);
    }

    #[test]
    fn test_aggregate_bounds() {
        let percents = [0.0, 25.0, 100.0];
        let importances = [-3.0, -1.0, 0.0, 1.0, 3.0];

        for &p in &percents {
            for &imp in &importances {
                let profile = profile_one(EffectKeyword::Moisturizing, imp, 30.0, 60.0);
                let ratios = [(EffectKeyword::Moisturizing, p)].into_iter().collect();
                let (score, _) = aggregate_score(&ratios, &profile);
                assert!(score <= 100, "score {score} for p={p} imp={imp}");
            }
        }
    }

    #[test]
    fn test_aggregate_degenerate_profile() {
        // All-neutral profile: best bound floored at 1, every contribution 0.
        let (score, breakdown) = aggregate_score(&BTreeMap::new(), &WeightProfile::new());
        assert_eq!(score, 25);
        assert_eq!(breakdown.len(), 6);
        for entry in breakdown.values() {
            assert_eq!(entry.contribution, 0.0);
        }
    }

    #[test]
    fn test_soft_caps() {
        assert_eq!(apply_soft_caps(87, 3, Reliability::Low), 75);
        assert_eq!(apply_soft_caps(60, 3, Reliability::Low), 60);
        assert_eq!(apply_soft_caps(100, 8, Reliability::Normal), 95);
        assert_eq!(apply_soft_caps(100, 12, Reliability::Normal), 100);
    }

    #[test]
    fn test_soft_caps_idempotent() {
        for (score, hits, reliability) in [
            (87, 3, Reliability::Low),
            (100, 8, Reliability::Normal),
            (100, 15, Reliability::Normal),
        ] {
            let once = apply_soft_caps(score, hits, reliability);
            assert_eq!(apply_soft_caps(once, hits, reliability), once);
        }
    }

    #[test]
    fn test_analyze_three_hit_low_reliability_scenario() {
        let snap = moisturizing_snapshot(&["글리세린", "정제수", "히알루론산"]);
        let profile = profile_one(EffectKeyword::Moisturizing, 1.0, 50.0, 90.0);

        let result = analyze(
            "글리세린, 정제수, 히알루론산",
            TokenMode::Delimited,
            "OSNT",
            &snap,
            &profile,
            &[],
        )
        .unwrap();

        assert_eq!(result.keyword_hit_count, 3);
        assert_eq!(result.reliability, Reliability::Low);
        assert_eq!(result.ratios[&EffectKeyword::Moisturizing], 100.0);
        // 100% is over the [50,90] band: soft-max branch, then the low cap.
        assert_eq!(result.final_score, 75);
        assert_eq!(result.score_before, 75);
        assert!(result.opinion.starts_with("Low-reliability"));
    }

    #[test]
    fn test_analyze_hard_stop_under_three_hits() {
        let snap = moisturizing_snapshot(&["글리세린", "정제수"]);
        let profile = profile_one(EffectKeyword::Moisturizing, 1.0, 50.0, 90.0);

        let err = analyze(
            "글리세린, 정제수",
            TokenMode::Delimited,
            "OSNT",
            &snap,
            &profile,
            &[],
        )
        .unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientMatches { hits: 2 });
    }

    #[test]
    fn test_analyze_user_caution_penalty() {
        let snap = moisturizing_snapshot(&["글리세린", "정제수", "티트리 오일"]);
        let profile = profile_one(EffectKeyword::Moisturizing, 1.0, 50.0, 90.0);

        // Stored user entry differs in spacing from the product token.
        let cautions = vec!["티트리오일 ".to_string()];
        let result = analyze(
            "글리세린, 정제수, 티트리 오일",
            TokenMode::Delimited,
            "OSNT",
            &snap,
            &profile,
            &cautions,
        )
        .unwrap();

        assert!(result.has_user_caution);
        assert_eq!(result.user_caution_hits, vec!["티트리오일 "]);
        assert_eq!(result.score_before, 75);
        assert_eq!(result.final_score, 35);
        assert_eq!(
            result.warning_message.as_deref(),
            Some(USER_CAUTION_WARNING)
        );
    }

    #[test]
    fn test_analyze_penalty_floors_at_zero() {
        let snap = moisturizing_snapshot(&["글리세린", "정제수", "히알루론산"]);
        // Tight band far below the actual 100% share: fit collapses to 0.
        let profile = profile_one(EffectKeyword::Moisturizing, 1.0, 0.0, 10.0);
        let cautions = vec!["글리세린".to_string()];

        let result = analyze(
            "글리세린, 정제수, 히알루론산",
            TokenMode::Delimited,
            "OSNT",
            &snap,
            &profile,
            &cautions,
        )
        .unwrap();

        assert_eq!(result.score_before, 25);
        assert_eq!(result.final_score, 0);
    }

    #[test]
    fn test_analyze_free_text_mode() {
        let snap = moisturizing_snapshot(&["글리세린", "정제수", "히알루론산"]);
        let profile = profile_one(EffectKeyword::Moisturizing, 1.0, 50.0, 90.0);

        let result = analyze(
            "전성분: 정제수! 글리세린... 히알루론산 외 기타성분",
            TokenMode::FreeText,
            "OSNT",
            &snap,
            &profile,
            &[],
        )
        .unwrap();
        assert_eq!(result.keyword_hit_count, 3);

        let err = analyze("정제수", TokenMode::FreeText, "OSNT", &snap, &profile, &[]);
        assert_eq!(err.unwrap_err(), AnalysisError::EmptyInput);
    }

    #[test]
    fn test_analyze_empty_list() {
        let snap = ReferenceSnapshot::default();
        let profile = WeightProfile::new();
        let err = analyze("", TokenMode::Delimited, "OSNT", &snap, &profile, &[]);
        assert_eq!(err.unwrap_err(), AnalysisError::NoIngredientsFound);
    }

    #[test]
    fn test_rank_products() {
        let snap = moisturizing_snapshot(&["글리세린", "정제수", "히알루론산", "스쿠알란"]);
        let profile = profile_one(EffectKeyword::Moisturizing, 1.0, 50.0, 90.0);

        let products = vec![
            ProductListing {
                product_name: "수분크림".to_string(),
                category: "크림".to_string(),
                ingredient_list: "글리세린, 정제수, 히알루론산, 스쿠알란".to_string(),
            },
            ProductListing {
                product_name: "무성분크림".to_string(),
                category: "크림".to_string(),
                ingredient_list: "알수없는성분".to_string(),
            },
            ProductListing {
                product_name: "저신뢰크림".to_string(),
                category: "크림".to_string(),
                ingredient_list: "글리세린".to_string(),
            },
        ];

        let ranked = rank_products(&products, &snap, &profile, &[], 10);

        // Zero-hit product skipped; 1-hit product stays, labeled very_low.
        assert_eq!(ranked.len(), 2);
        assert!(ranked[0].final_score >= ranked[1].final_score);
        // very_low items are never soft-capped, so the single-hit product
        // outranks the 4-hit one whose score the low cap holds at 75.
        assert_eq!(ranked[0].product_name, "저신뢰크림");
        assert_eq!(ranked[0].reliability, Reliability::VeryLow);
        assert_eq!(ranked[1].product_name, "수분크림");
        assert_eq!(ranked[1].final_score, 75);
    }

    #[test]
    fn test_rank_limit_clamped() {
        let snap = moisturizing_snapshot(&["글리세린", "정제수", "히알루론산"]);
        let profile = profile_one(EffectKeyword::Moisturizing, 1.0, 50.0, 90.0);
        let product = ProductListing {
            product_name: "수분크림".to_string(),
            category: "크림".to_string(),
            ingredient_list: "글리세린, 정제수, 히알루론산".to_string(),
        };
        let products: Vec<_> = (0..30)
            .map(|i| ProductListing {
                product_name: format!("{} {i}", product.product_name),
                ..product.clone()
            })
            .collect();

        assert_eq!(rank_products(&products, &snap, &profile, &[], 50).len(), 20);
        assert_eq!(rank_products(&products, &snap, &profile, &[], 0).len(), 1);
    }
}
