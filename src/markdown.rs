use pulldown_cmark::{Event, Options, Parser, Tag};
use regex::Regex;

/// Matches a single HTML tag or comment.
const HTML_TAG: &str = r"<[^>]*>";

/// Reduces markdown to its plain text. Formatting, link and image targets
/// and HTML tags are dropped, while image alt text and the text inside HTML
/// is kept. Block boundaries become newlines. The result is trimmed.
pub fn to_plain_text(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let html_tag = Regex::new(HTML_TAG).unwrap(); // constant pattern always compiles

    let mut out = String::with_capacity(markdown.len());
    for ev in Parser::new_ext(markdown, options) {
        match ev {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::Html(html) => out.push_str(&html_tag.replace_all(&html, "")),
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::End(tag) if is_block(&tag) => out.push('\n'),
            _ => {}
        }
    }

    // Collapse the runs of newlines left by adjacent block ends.
    let mut collapsed = String::with_capacity(out.len());
    for line in out.split('\n').filter(|l| !l.trim().is_empty()) {
        if !collapsed.is_empty() {
            collapsed.push('\n');
        }
        collapsed.push_str(line);
    }
    collapsed.trim().to_owned()
}

fn is_block(tag: &Tag) -> bool {
    matches!(
        tag,
        Tag::Paragraph
            | Tag::Heading(_)
            | Tag::BlockQuote
            | Tag::CodeBlock(_)
            | Tag::Item
            | Tag::TableRow
            | Tag::TableHead
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_strips_inline_formatting() {
        assert_eq!(
            "Some bold and italic text with code.",
            to_plain_text("Some **bold** and _italic_ text with `code`."),
        );
    }

    #[test]
    fn test_keeps_link_text_only() {
        assert_eq!(
            "see the docs",
            to_plain_text("see [the docs](https://example.org/docs)"),
        );
    }

    #[test]
    fn test_drops_html_tags_keeps_alt_text() {
        assert_eq!("before after", to_plain_text("before <b>after</b>"));
        assert_eq!("alt", to_plain_text("![alt](pic.png)"));
    }

    #[test]
    fn test_keeps_text_of_html_blocks() {
        assert_eq!("Hello world", to_plain_text("<p>Hello world</p>"));
        assert_eq!(
            "Hello world\nand more",
            to_plain_text("<div>\nHello world\n</div>\n\nand <!-- note -->more\n"),
        );
    }

    #[test]
    fn test_blocks_become_lines() {
        assert_eq!(
            "Heading\nfirst\nsecond",
            to_plain_text("## Heading\n\nfirst\n\n- second\n"),
        );
    }
}
