//! URL path normalization.
//!
//! Registration and lookup both walk the trie with the segments produced
//! here, so any two spellings of the same path land on the same node.

/// ASCII whitespace as C's `isspace` sees it, vertical tab included.
fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}

/// Split a URL into its canonical route segments.
///
/// The query string is dropped, the path is split on `/`, and segments that
/// are empty or made only of ASCII whitespace are discarded. Non-ASCII
/// spaces such as U+00A0 form real segments.
pub fn segments(url: &str) -> impl Iterator<Item = &str> {
    let path = match url.find('?') {
        Some(idx) => &url[..idx],
        None => url,
    };

    path.split('/')
        .filter(|segment| !segment.chars().all(is_blank))
}

/// Collect the canonical segments of `url` into owned strings.
pub fn normalize(url: &str) -> Vec<String> {
    segments(url).map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slash_and_query_variants_agree() {
        let expected = vec!["a".to_string(), "b".to_string()];
        assert_eq!(normalize("/a//b/?x=1"), expected);
        assert_eq!(normalize("a/b"), expected);
        assert_eq!(normalize("/a/ /b"), expected);
        assert_eq!(normalize("///a/\t/b///"), expected);
    }

    #[test]
    fn test_root_forms_are_empty() {
        assert!(normalize("").is_empty());
        assert!(normalize("/").is_empty());
        assert!(normalize("/?q=1").is_empty());
        assert!(normalize("  / \n /").is_empty());
    }

    #[test]
    fn test_only_first_question_mark_splits() {
        assert_eq!(normalize("/search?q=a/b?c"), vec!["search".to_string()]);
    }

    #[test]
    fn test_inner_whitespace_is_kept() {
        // Only whitespace-only segments are dropped.
        assert_eq!(normalize("/a b/ c"), vec!["a b".to_string(), " c".to_string()]);
    }

    #[test]
    fn test_vertical_tab_and_form_feed_are_blank() {
        assert_eq!(normalize("/a/\x0B\x0C\r/b"), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_unicode_spaces_are_segments() {
        assert_eq!(
            normalize("/a/\u{3000}/b/\u{a0}"),
            vec!["a".to_string(), "\u{3000}".to_string(), "b".to_string(), "\u{a0}".to_string()]
        );
    }
}
