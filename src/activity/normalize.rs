use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref RE_PARAGRAPHS: Regex = Regex::new(r"</p>").unwrap();
    static ref RE_BREAKS: Regex = Regex::new(r"<br */?>").unwrap();
    static ref RE_TAGS: Regex = Regex::new(r"<[^>]+>").unwrap();
}

/// Flatten a rich-text activity body into plain text.
///
/// Paragraph ends and line breaks become newlines, every remaining tag is
/// stripped, and HTML entities are decoded last. Pure and total: any input
/// produces some output.
pub fn strip_markup(content: &str) -> String {
    let content = RE_PARAGRAPHS.replace_all(content, "\n");
    let content = RE_BREAKS.replace_all(&content, "\n");
    let content = RE_TAGS.replace_all(&content, "");
    html_escape::decode_html_entities(content.as_ref()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_and_breaks_become_newlines() {
        assert_eq!(
            strip_markup("<p>one</p><p>two</p>"),
            "one\ntwo\n"
        );
        assert_eq!(strip_markup("a<br/>b<br>c<br />d"), "a\nb\nc\nd");
    }

    #[test]
    fn test_remaining_tags_are_stripped() {
        let output = strip_markup("<p>Hello <b>world</b>, <a href=\"https://x\">link</a></p>");
        assert!(!output.contains('<'));
        assert!(!output.contains('>'));
        assert_eq!(output, "Hello world, link\n");
    }

    #[test]
    fn test_entities_are_decoded() {
        assert_eq!(strip_markup("fish &amp; chips"), "fish & chips");
        assert_eq!(strip_markup("it&#39;s &lt;ok&gt;"), "it's <ok>");
    }

    #[test]
    fn test_idempotent_on_plain_text() {
        let plain = "already plain\nwith a newline";
        assert_eq!(strip_markup(plain), plain);
        assert_eq!(strip_markup(&strip_markup(plain)), plain);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(strip_markup(""), "");
    }
}
