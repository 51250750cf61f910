//! Query cleaning for the full-text index.

use std::collections::HashSet;

const MIN_TERM_LEN: usize = 3;
const SUFFIXES: &[&str] = &["ing", "ed", "s"];

/// Lowercased, lightly stemmed, de-duplicated search terms of `query`
pub fn clean_search_terms(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    query
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
        .map(|token| stem(&token.to_lowercase()).to_string())
        .filter(|term| term.chars().count() >= MIN_TERM_LEN)
        .filter(|term| seen.insert(term.clone()))
        .collect()
}

/// OR-joined, quoted term list, or `None` when no term survives cleaning
pub fn build_fts_query(query: &str) -> Option<String> {
    let terms = clean_search_terms(query);
    if terms.is_empty() {
        return None;
    }
    Some(
        terms
            .iter()
            .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
            .collect::<Vec<_>>()
            .join(" OR "),
    )
}

fn stem(token: &str) -> &str {
    for suffix in SUFFIXES {
        if *suffix == "s" && token.ends_with("ss") {
            continue;
        }
        if let Some(root) = token.strip_suffix(suffix) {
            if root.chars().count() >= MIN_TERM_LEN {
                return root;
            }
        }
    }
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn terms_are_stemmed_and_filtered() {
        assert_eq!(
            clean_search_terms("Parsing the configs in src/lib.rs, to be added"),
            vec!["pars", "the", "config", "src", "lib", "add"]
        );
    }

    #[test]
    fn double_s_is_kept() {
        assert_eq!(clean_search_terms("class address"), vec!["class", "address"]);
    }

    #[test]
    fn duplicates_collapse_after_stemming() {
        assert_eq!(clean_search_terms("token tokens TOKEN"), vec!["token"]);
    }

    #[test]
    fn fts_query_is_quoted_and_or_joined() {
        assert_eq!(
            build_fts_query("find user_id lookup").as_deref(),
            Some("\"find\" OR \"user_id\" OR \"lookup\"")
        );
    }

    #[test]
    fn short_only_query_has_no_terms() {
        assert_eq!(build_fts_query("a to be"), None);
        assert_eq!(build_fts_query("   "), None);
    }
}
