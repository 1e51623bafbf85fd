//! Reply sanitizer. Strips lightweight markdown markers from model output.

/// Characters removed from every reply.
const MARKUP_CHARS: [char; 2] = ['#', '*'];

/// Remove every `#` and `*`, then trim surrounding whitespace.
///
/// Total and idempotent. Trimming after removal means a reply like `"## "`
/// collapses to the empty string.
#[must_use]
pub fn sanitize(text: &str) -> String {
    let stripped: String = text.chars().filter(|c| !MARKUP_CHARS.contains(c)).collect();
    stripped.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_headings_and_emphasis() {
        assert_eq!(sanitize("## 用药建议\n**每日三次**"), "用药建议\n每日三次");
    }

    #[test]
    fn empty_and_markup_only() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("  ### *** \n"), "");
    }

    #[test]
    fn inner_whitespace_survives() {
        assert_eq!(sanitize("  a  *b*  c  "), "a  b  c");
    }

    proptest! {
        #[test]
        fn idempotent(s in ".*") {
            let once = sanitize(&s);
            prop_assert_eq!(sanitize(&once), once);
        }

        #[test]
        fn no_markup_left(s in "[#*a-z \\n]*") {
            let out = sanitize(&s);
            prop_assert!(!out.contains('#'));
            prop_assert!(!out.contains('*'));
        }
    }
}
