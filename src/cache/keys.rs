//! Cache key layout.
//!
//! Entities live under `{kind}-{id}` (`article-7`), so `article-*` drops
//! every cached article in one pattern.

use regex::Regex;

use crate::domain::types::ResourceKind;

use super::backend::CacheError;

pub fn entity_key(kind: ResourceKind, id: i64) -> String {
    format!("{}-{}", kind.as_str(), id)
}

/// Compile a Redis-style glob (`*`, `?`, `\` escapes) into an anchored regex.
pub fn glob_to_regex(pattern: &str) -> Result<Regex, CacheError> {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push('^');

    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            '\\' => match chars.next() {
                Some(escaped) => source.push_str(&regex::escape(&escaped.to_string())),
                None => {
                    return Err(CacheError::InvalidPattern {
                        pattern: pattern.to_string(),
                        reason: "dangling escape".to_string(),
                    });
                }
            },
            other => source.push_str(&regex::escape(&other.to_string())),
        }
    }

    source.push('$');
    Regex::new(&source).map_err(|err| CacheError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_keys_use_singular_prefix() {
        assert_eq!(entity_key(ResourceKind::Article, 1), "article-1");
        assert_eq!(entity_key(ResourceKind::Review, 42), "review-42");
    }

    #[test]
    fn kind_wildcard_matches_only_that_kind() {
        let regex = glob_to_regex("article-*").unwrap();
        assert!(regex.is_match("article-1"));
        assert!(regex.is_match("article-999"));
        assert!(!regex.is_match("review-1"));
        assert!(!regex.is_match("xarticle-1"));
    }

    #[test]
    fn question_mark_matches_one_character() {
        let regex = glob_to_regex("review-?").unwrap();
        assert!(regex.is_match("review-7"));
        assert!(!regex.is_match("review-77"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let regex = glob_to_regex("article-(a+b)").unwrap();
        assert!(regex.is_match("article-(a+b)"));
        assert!(!regex.is_match("article-aab"));
    }

    #[test]
    fn escaped_star_is_literal() {
        let regex = glob_to_regex(r"a\*").unwrap();
        assert!(regex.is_match("a*"));
        assert!(!regex.is_match("abc"));
        assert!(glob_to_regex("a\\").is_err());
    }
}
