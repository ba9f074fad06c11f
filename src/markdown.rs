//! Markdown to HTML conversion.
//!
//! Parsing and HTML generation are done by `pulldown-cmark`. This module only
//! fixes the syntax extensions and post-processes the event stream:
//!
//! - tables, strikethrough, footnotes and task lists are enabled
//! - headings get an `id` derived from their text unless one was given with
//!   `{#id}`; duplicates are suffixed with `-1`, `-2`, ...
//! - soft line breaks are emitted as `<br />`
//! - `$..$` and `$$..$$` math is wrapped for MathJax as `\(..\)` and `\[..\]`
//!
//! Void elements come out self-closing, so the result can be embedded in an
//! XHTML document.

use crate::error::{MdocError, Result};
use crate::theme::TrustedHtml;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use std::collections::HashMap;

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_MATH
}

/// Convert markdown source to HTML.
pub fn to_html(markdown: &str) -> Result<TrustedHtml> {
    let mut events: Vec<Event> = Parser::new_ext(markdown, options()).collect();
    assign_heading_ids(&mut events);

    let events = events.into_iter().map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        Event::InlineMath(math) => Event::InlineHtml(
            format!(
                r#"<span class="math inline">\({}\)</span>"#,
                html_escape::encode_text(&math)
            )
            .into(),
        ),
        Event::DisplayMath(math) => Event::InlineHtml(
            format!(
                r#"<span class="math display">\[{}\]</span>"#,
                html_escape::encode_text(&math)
            )
            .into(),
        ),
        event => event,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::write_html_fmt(&mut out, events).map_err(|e| MdocError::Render(e.to_string()))?;
    Ok(TrustedHtml::new(out))
}

/// Hands out heading ids, never the same one twice.
#[derive(Default)]
struct HeadingIds {
    seen: HashMap<String, usize>,
}

impl HeadingIds {
    fn reserve(&mut self, id: &str) {
        self.seen.entry(id.to_string()).or_insert(0);
    }

    fn unique(&mut self, base: String) -> String {
        let mut count = match self.seen.get(&base) {
            None => {
                self.seen.insert(base.clone(), 0);
                return base;
            }
            Some(count) => *count,
        };

        loop {
            count += 1;
            let candidate = format!("{base}-{count}");
            if !self.seen.contains_key(&candidate) {
                self.seen.insert(base, count);
                self.seen.insert(candidate.clone(), 0);
                return candidate;
            }
        }
    }
}

fn assign_heading_ids(events: &mut [Event]) {
    let mut ids = HeadingIds::default();
    for event in events.iter() {
        if let Event::Start(Tag::Heading { id: Some(id), .. }) = event {
            ids.reserve(id);
        }
    }

    for i in 0..events.len() {
        let text = match &events[i] {
            Event::Start(Tag::Heading { id: None, .. }) => heading_text(&events[i + 1..]),
            _ => continue,
        };
        let slug = ids.unique(slugify(&text));
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            *id = Some(CowStr::from(slug));
        }
    }
}

fn heading_text(events: &[Event]) -> String {
    let mut text = String::new();
    for event in events {
        match event {
            Event::End(TagEnd::Heading(_)) => break,
            Event::Text(s) | Event::Code(s) | Event::InlineMath(s) => text.push_str(s),
            _ => {}
        }
    }
    text
}

/// Turn heading text into an anchor id.
///
/// Letters and digits are kept (lowercased), whitespace, `-` and `_` become
/// `-`, everything else is dropped.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if (c.is_whitespace() || c == '-' || c == '_') && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "heading".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(markdown: &str) -> String {
        to_html(markdown).expect("can convert").as_str().to_string()
    }

    #[test]
    fn can_render_tables_and_strikethrough() {
        let html = convert("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n");
        assert!(html.contains("<table>"), "{html}");
        assert!(html.contains("<td>1</td>"), "{html}");
        assert!(html.contains("<del>gone</del>"), "{html}");
    }

    #[test]
    fn headings_get_ids() {
        let html = convert("# Hi World\n");
        assert!(html.contains(r#"<h1 id="hi-world">Hi World</h1>"#), "{html}");
    }

    #[test]
    fn duplicate_heading_ids_are_suffixed() {
        let html = convert("## Notes\n\n## Notes\n\n## Notes\n");
        assert!(html.contains(r#"id="notes""#), "{html}");
        assert!(html.contains(r#"id="notes-1""#), "{html}");
        assert!(html.contains(r#"id="notes-2""#), "{html}");
    }

    #[test]
    fn explicit_heading_ids_win() {
        let html = convert("# Intro {#start}\n\n# Start\n");
        assert!(html.contains(r#"<h1 id="start">Intro</h1>"#), "{html}");
        assert!(html.contains(r#"<h1 id="start-1">Start</h1>"#), "{html}");
    }

    #[test]
    fn can_slugify() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  snake_case  and-dash "), "snake-case-and-dash");
        assert_eq!(slugify("Ünïcode Títle"), "ünïcode-títle");
        assert_eq!(slugify("???"), "heading");
    }

    #[test]
    fn soft_breaks_are_hard() {
        let html = convert("first\nsecond\n");
        assert!(html.contains("first<br />\nsecond"), "{html}");
    }

    #[test]
    fn void_elements_self_close() {
        let html = convert("above\n\n---\n\n![alt](img.png)\n");
        assert!(html.contains("<hr />"), "{html}");
        assert!(html.contains(r#"<img src="img.png" alt="alt" />"#), "{html}");
    }

    #[test]
    fn math_is_wrapped_for_mathjax() {
        let html = convert("Euler: $e^{i\\pi} < 0$\n\n$$x^2$$\n");
        assert!(
            html.contains(r#"<span class="math inline">\(e^{i\pi} &lt; 0\)</span>"#),
            "{html}"
        );
        assert!(
            html.contains(r#"<span class="math display">\[x^2\]</span>"#),
            "{html}"
        );
    }

    #[test]
    fn footnotes_are_rendered() {
        let html = convert("Claim[^1].\n\n[^1]: Source.\n");
        assert!(html.contains("footnote"), "{html}");
        assert!(html.contains("Source."), "{html}");
    }

    #[test]
    fn raw_html_passes_through() {
        let html = convert("<div class=\"note\">kept</div>\n");
        assert!(html.contains(r#"<div class="note">kept</div>"#), "{html}");
    }
}
