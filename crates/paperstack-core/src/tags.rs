//! Tag normalization and parsing.
//!
//! Tags are stored lowercase with a URL-safe slug. User input arrives as a
//! comma-separated string ("Algebra, Linear Algebra") or as a JSON array;
//! both funnel through [`parse_tag_csv`] / [`normalize_tag`].

/// Convert a tag name to a URL-friendly slug.
///
/// Lowercases, trims, and collapses spaces/underscores into hyphens.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut prev_hyphen = false;
    for ch in name.trim().to_lowercase().chars() {
        let mapped = if ch.is_alphanumeric() {
            Some(ch)
        } else if ch == ' ' || ch == '_' || ch == '-' {
            Some('-')
        } else {
            None
        };
        match mapped {
            Some('-') => {
                if !prev_hyphen && !slug.is_empty() {
                    slug.push('-');
                    prev_hyphen = true;
                }
            }
            Some(c) => {
                slug.push(c);
                prev_hyphen = false;
            }
            None => {}
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Normalize a single tag name: trimmed and lowercased.
///
/// Returns `None` for blank input or input that slugifies to nothing.
pub fn normalize_tag(name: &str) -> Option<String> {
    let trimmed = name.trim().to_lowercase();
    if trimmed.is_empty() || slugify(&trimmed).is_empty() {
        return None;
    }
    Some(trimmed)
}

/// Parse a comma-separated tag string into normalized, deduplicated names.
///
/// Order of first appearance is preserved.
pub fn parse_tag_csv(input: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    input
        .split(',')
        .filter_map(normalize_tag)
        .filter(|t| seen.insert(slugify(t)))
        .collect()
}

/// Normalize an already-split tag list (JSON array input path).
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.iter()
        .filter_map(|t| normalize_tag(t))
        .filter(|t| seen.insert(slugify(t)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Linear Algebra"), "linear-algebra");
        assert_eq!(slugify("machine_learning"), "machine-learning");
        assert_eq!(slugify("  rust  "), "rust");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("a  b"), "a-b");
        assert_eq!(slugify("a _- b"), "a-b");
    }

    #[test]
    fn test_slugify_strips_punctuation() {
        assert_eq!(slugify("C++ (advanced)"), "c-advanced");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slugify_no_leading_or_trailing_hyphen() {
        assert_eq!(slugify("-edge-"), "edge");
        assert_eq!(slugify(" - spaced - "), "spaced");
    }

    #[test]
    fn test_normalize_tag_blank() {
        assert_eq!(normalize_tag("   "), None);
        assert_eq!(normalize_tag("???"), None);
        assert_eq!(normalize_tag(" Calculus "), Some("calculus".to_string()));
    }

    #[test]
    fn test_parse_tag_csv() {
        let tags = parse_tag_csv("Algebra, calculus,  , algebra, Geometry");
        assert_eq!(tags, vec!["algebra", "calculus", "geometry"]);
    }

    #[test]
    fn test_parse_tag_csv_empty() {
        assert!(parse_tag_csv("").is_empty());
        assert!(parse_tag_csv(", ,").is_empty());
    }

    #[test]
    fn test_normalize_tags_dedupes_by_slug() {
        let input = vec![
            "Machine Learning".to_string(),
            "machine_learning".to_string(),
            "ml".to_string(),
        ];
        assert_eq!(normalize_tags(&input), vec!["machine learning", "ml"]);
    }
}
