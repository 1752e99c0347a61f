//! Unsubscribe link extraction. A regex heuristic, not an HTML parser.
//!
//! Matches the first `<a ... href="...">...unsubscribe...</a>` in document order,
//! case-insensitively. Only double-quoted `href` values are recognized. The anchor text
//! must sit on one line: `\n`, `\r`, U+2028 and U+2029 all end it. The keyword is
//! compared with ASCII case folding only, so look-alikes such as `ſ` do not count.

use crate::domain::UnsubscribeLink;
use regex::Regex;
use std::sync::LazyLock;

static UNSUBSCRIBE_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?i)<a\s+(?:[^>]*?\s+)?href="([^"]*)"[^>]*>"#,
        r#"(?:[^\n\r\x{2028}\x{2029}]*?(?-u:(?i:unsubscribe))[^\n\r\x{2028}\x{2029}]*?)</a>"#,
    ))
    .expect("unsubscribe anchor pattern")
});

/// Returns the trimmed `href` of the first anchor whose span mentions "unsubscribe".
///
/// Absence is a normal outcome. An `href` that is blank after trimming counts as absent.
pub fn extract(body: &str) -> Option<UnsubscribeLink> {
    let caps = UNSUBSCRIBE_ANCHOR.captures(body)?;
    UnsubscribeLink::new(caps.get(1)?.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn href(body: &str) -> Option<String> {
        extract(body).map(|l| l.as_str().to_string())
    }

    #[test]
    fn test_plain_anchor() {
        assert_eq!(
            href(r#"<a href="https://x.test/u?id=1">Click to unsubscribe</a>"#).as_deref(),
            Some("https://x.test/u?id=1")
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(
            href(r#"<A HREF="https://x.test/u">UNSUBSCRIBE</A>"#).as_deref(),
            Some("https://x.test/u")
        );
        assert_eq!(
            href(r#"<a href="https://x.test/u">UnSubscribe here</a>"#).as_deref(),
            Some("https://x.test/u")
        );
    }

    #[test]
    fn test_other_attributes_before_href() {
        let body = r#"<p>Bye</p><a class="footer" target="_blank" href="https://x.test/bye" style="color:red">Unsubscribe</a>"#;
        assert_eq!(href(body).as_deref(), Some("https://x.test/bye"));
    }

    #[test]
    fn test_nested_markup_in_text() {
        let body = r#"<a href="https://x.test/n"><span class="small">unsubscribe</span></a>"#;
        assert_eq!(href(body).as_deref(), Some("https://x.test/n"));
    }

    #[test]
    fn test_href_is_trimmed() {
        assert_eq!(
            href(r#"<a href="  https://x.test/t  ">unsubscribe</a>"#).as_deref(),
            Some("https://x.test/t")
        );
    }

    #[test]
    fn test_first_match_wins() {
        let body = concat!(
            r#"<a href="https://one.test/u">Unsubscribe</a>"#,
            "\n",
            r#"<a href="https://two.test/u">unsubscribe from all</a>"#
        );
        assert_eq!(href(body).as_deref(), Some("https://one.test/u"));
    }

    #[test]
    fn test_skips_anchor_without_keyword_on_its_own_line() {
        let body = concat!(
            r#"<a href="https://x.test/home">Home</a>"#,
            "\n",
            r#"<a href="https://x.test/unsub">Unsubscribe</a>"#
        );
        assert_eq!(href(body).as_deref(), Some("https://x.test/unsub"));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(href(""), None);
        assert_eq!(href("<p>No links here</p>"), None);
        assert_eq!(href("unsubscribe by replying STOP"), None);
        assert_eq!(href(r#"<a href="https://x.test/home">Home</a>"#), None);
    }

    #[test]
    fn test_anchor_without_href() {
        assert_eq!(href(r#"<a name="bottom">unsubscribe</a>"#), None);
    }

    #[test]
    fn test_single_quoted_href_not_recognized() {
        assert_eq!(href("<a href='https://x.test/u'>unsubscribe</a>"), None);
    }

    #[test]
    fn test_text_split_across_lines_not_matched() {
        assert_eq!(href("<a href=\"https://x.test/u\">\nunsubscribe\n</a>"), None);
    }

    #[test]
    fn test_carriage_return_ends_anchor_text() {
        let body = concat!(
            r#"<a href="https://a.test/home">Home</a>"#,
            "\r",
            r#"<a href="https://b.test/u">unsubscribe</a>"#
        );
        assert_eq!(href(body).as_deref(), Some("https://b.test/u"));
        assert_eq!(href("<a href=\"https://x.test/u\">\runsubscribe</a>"), None);
    }

    #[test]
    fn test_unicode_line_separators_end_anchor_text() {
        for sep in ["\u{2028}", "\u{2029}"] {
            let body = format!(
                r#"<a href="https://a.test/home">Home</a>{}<a href="https://b.test/u">unsubscribe</a>"#,
                sep
            );
            assert_eq!(href(&body).as_deref(), Some("https://b.test/u"));
        }
    }

    #[test]
    fn test_keyword_uses_ascii_case_folding() {
        assert_eq!(href("<a href=\"https://a.test/u\">un\u{17f}ubscribe</a>"), None);
        assert_eq!(
            href(r#"<a href="https://a.test/u">UNSUBSCRIBE</a>"#).as_deref(),
            Some("https://a.test/u")
        );
    }

    #[test]
    fn test_blank_href_is_absent() {
        assert_eq!(href(r#"<a href="   ">unsubscribe</a>"#), None);
        assert_eq!(href(r#"<a href="">unsubscribe</a>"#), None);
    }
}
