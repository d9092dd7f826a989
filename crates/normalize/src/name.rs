/// Canonicalizes a node name for lookup and duplicate-detection purposes.
///
/// Order matters: trim, then unescape backslashes, then unescape quotes,
/// then collapse whitespace runs. Unescaping quotes before backslashes
/// corrupts doubly-escaped inputs (a literal `\\"` would become `\"` then
/// get its backslash eaten a second time instead of resolving to `"`).
pub fn normalize_name(name: &str) -> String {
    let trimmed = name.trim();
    let unescaped_backslashes = unescape_backslashes(trimmed);
    let unescaped_quotes = unescape_quotes(&unescaped_backslashes);
    collapse_whitespace(&unescaped_quotes)
}

fn unescape_backslashes(s: &str) -> String {
    s.replace("\\\\", "\\")
}

fn unescape_quotes(s: &str) -> String {
    s.replace("\\\"", "\"").replace("\\'", "'")
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_leading_and_trailing_whitespace() {
        assert_eq!(normalize_name("  Set Fields  "), "Set Fields");
    }

    #[test]
    fn collapses_internal_whitespace_runs() {
        assert_eq!(normalize_name("Set\t\tFields"), "Set Fields");
        assert_eq!(normalize_name("Set\n  Fields"), "Set Fields");
    }

    #[test]
    fn unescapes_backslashes_before_quotes() {
        // A doubly-escaped quote `\\"` must resolve to a literal `"`,
        // not get its backslash consumed twice.
        assert_eq!(normalize_name(r#"Say \\"Hi\\""#), r#"Say "Hi""#);
    }

    #[test]
    fn unescapes_simple_escaped_quotes() {
        assert_eq!(normalize_name(r#"It\'s Fine"#), "It's Fine");
    }

    #[test]
    fn is_idempotent() {
        let inputs = [
            "  Set Fields  ",
            "Set\t\tFields",
            r#"Say \\"Hi\\""#,
            "Already Normal",
        ];
        for s in inputs {
            let once = normalize_name(s);
            let twice = normalize_name(&once);
            assert_eq!(once, twice, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn case_and_post_normalization_whitespace_are_significant() {
        assert_ne!(normalize_name("Set Fields"), normalize_name("set fields"));
        assert_eq!(
            normalize_name("Set  Fields"),
            normalize_name("Set Fields")
        );
    }
}
