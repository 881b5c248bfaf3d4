//! Text canonicalization for ingredient matching.
//!
//! Provides the single normalizer every comparison in the system goes
//! through, plus the two tokenizers:
//! - Delimited mode for stored ingredient lists (comma-separated)
//! - Free-text mode for OCR output (maximal token-character runs)
//!
//! Matching correctness depends on applying [`normalize`] identically to
//! catalog names, regulatory names, user entries, and product tokens.

/// Canonicalize an ingredient name for fuzzy comparison.
///
/// Lowercases and removes all whitespace and hyphens. Returns `None` when
/// the input (or what survives of it) is empty. Idempotent.
pub fn normalize(name: &str) -> Option<String> {
    let normalized: String = name
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_lowercase)
        .collect();

    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Split a stored ingredient list on commas.
///
/// Each piece is trimmed and stripped of surrounding quote characters;
/// empty pieces are dropped. Order and duplicates are preserved.
pub fn tokenize_delimited(list: &str) -> Vec<String> {
    list.split(',')
        .map(|piece| piece.trim().trim_matches('"'))
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extract ingredient token candidates from free-form text.
///
/// Tokens are maximal runs of Hangul syllables, ASCII letters, digits, and
/// hyphens; runs shorter than 2 characters are discarded. Order and
/// duplicates are preserved.
pub fn tokenize_free_text(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if is_token_char(c) {
            current.push(c);
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens.retain(|token| token.chars().count() >= 2);
    tokens
}

fn is_token_char(c: char) -> bool {
    // Hangul syllable block U+AC00..=U+D7A3
    ('가'..='힣').contains(&c) || c.is_ascii_alphanumeric() || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_spacing_and_case() {
        assert_eq!(normalize("티트리 오일"), Some("티트리오일".to_string()));
        assert_eq!(normalize("Tea-Tree Oil"), Some("teatreeoil".to_string()));
        assert_eq!(normalize("  정제수 "), Some("정제수".to_string()));
    }

    #[test]
    fn test_normalize_empty_is_none() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("   "), None);
        assert_eq!(normalize("- -"), None);
    }

    #[test]
    fn test_normalize_idempotent() {
        for input in ["티트리 오일", "Sodium-Hyaluronate", "  B5 판테놀  "] {
            let once = normalize(input).unwrap();
            assert_eq!(normalize(&once), Some(once.clone()));
        }
    }

    #[test]
    fn test_tokenize_delimited() {
        let tokens = tokenize_delimited(r#"정제수, "글리세린" , 부틸렌글라이콜,, 정제수"#);
        assert_eq!(tokens, vec!["정제수", "글리세린", "부틸렌글라이콜", "정제수"]);
    }

    #[test]
    fn test_tokenize_delimited_empty() {
        assert!(tokenize_delimited("").is_empty());
        assert!(tokenize_delimited(" , , ").is_empty());
    }

    #[test]
    fn test_tokenize_free_text_runs() {
        let tokens = tokenize_free_text("전성분: 정제수/글리세린(보습), tea-tree 오일!");
        assert_eq!(
            tokens,
            vec!["전성분", "정제수", "글리세린", "보습", "tea-tree", "오일"]
        );
    }

    #[test]
    fn test_tokenize_free_text_drops_short_runs() {
        // Single-character runs are noise (OCR artifacts, list markers).
        let tokens = tokenize_free_text("수 A 정제수 B5");
        assert_eq!(tokens, vec!["정제수", "B5"]);
    }
}
