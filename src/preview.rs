//! Markdown preview with wiki-style internal links.
//!
//! `[[Target]]` and `[[Target|Label]]` references are rewritten into regular
//! Markdown links whose destination keeps the bracket marker. While rendering,
//! links carrying that marker are intercepted and emitted as internal-link
//! anchors instead of ordinary navigation.
use std::sync::OnceLock;

use log::trace;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use pulldown_cmark_escape::escape_html;
use regex::{Captures, Regex};

/// One `[[...]]` reference found in note content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiLink {
    /// Title of the referenced note
    pub target: String,
    /// Text shown for the link
    pub label: String,
}

fn wiki_link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[\[([^\]\n]+)\]\]").expect("wiki link pattern is valid"))
}

fn parse_inner(inner: &str) -> WikiLink {
    match inner.split_once('|') {
        Some((target, label)) => WikiLink {
            target: target.trim().to_string(),
            label: label.trim().to_string(),
        },
        None => WikiLink {
            target: inner.trim().to_string(),
            label: inner.trim().to_string(),
        },
    }
}

/// Every wiki link in `content`, in order of appearance
pub fn extract_wiki_links(content: &str) -> Vec<WikiLink> {
    wiki_link_pattern()
        .captures_iter(content)
        .filter_map(|cap| cap.get(1))
        .map(|m| parse_inner(m.as_str()))
        .filter(|link| !link.target.is_empty())
        .collect()
}

/// Rewrites `[[Target|Label]]` into `[Label](<[[Target]]>)`.
///
/// Angle brackets and backslashes are backslash-escaped so they survive
/// inside the bracketed destination and the link text.
pub fn preprocess_wiki_links(content: &str) -> String {
    wiki_link_pattern()
        .replace_all(content, |cap: &Captures| {
            let link = parse_inner(&cap[1]);
            format!(
                "[{}](<[[{}]]>)",
                escape_markdown(&link.label),
                escape_markdown(&link.target)
            )
        })
        .into_owned()
}

fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '<' | '>' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn internal_target(dest: &str) -> Option<&str> {
    dest.strip_prefix("[[")
        .and_then(|rest| rest.strip_suffix("]]"))
        .map(str::trim)
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    // writing into a String cannot fail
    let _ = escape_html(&mut out, value);
    out
}

fn internal_anchor(title: &str, resolved: Option<String>) -> String {
    match resolved {
        Some(id) => format!(
            r##"<a class="internal-link" href="#note-{id}" data-note-id="{id}">"##,
            id = escape_attr(&id)
        ),
        None => format!(
            r##"<a class="internal-link unresolved" href="#" data-note-title="{}">"##,
            escape_attr(title)
        ),
    }
}

/// Renders note content to HTML.
///
/// `resolve` maps a wiki-link target title to a note id; targets it cannot
/// resolve are rendered as unresolved internal links.
pub fn render_note_html<F>(content: &str, resolve: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let processed = preprocess_wiki_links(content);
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    // one entry per open link: whether it was intercepted
    let mut open_links: Vec<bool> = Vec::new();
    let events = Parser::new_ext(&processed, options).map(|event| {
        if let Event::Start(Tag::Link { dest_url, .. }) = &event {
            let target = internal_target(dest_url).map(str::to_string);
            open_links.push(target.is_some());
            if let Some(title) = target {
                trace!("Intercepting internal link to {}", title);
                let resolved = resolve(&title);
                return Event::InlineHtml(CowStr::from(internal_anchor(&title, resolved)));
            }
        } else if let Event::End(TagEnd::Link) = &event {
            if open_links.pop().unwrap_or(false) {
                return Event::InlineHtml(CowStr::Borrowed("</a>"));
            }
        }
        event
    });

    let mut out = String::with_capacity(processed.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_targets_and_labels() {
        let links = extract_wiki_links("See [[Project Notes]] and [[Roadmap | the plan]]. [[ ]]");
        assert_eq!(
            links,
            vec![
                WikiLink {
                    target: "Project Notes".to_string(),
                    label: "Project Notes".to_string(),
                },
                WikiLink {
                    target: "Roadmap".to_string(),
                    label: "the plan".to_string(),
                },
            ]
        );
    }

    #[test]
    fn preprocess_keeps_bracket_marker_in_destination() {
        assert_eq!(
            preprocess_wiki_links("See [[Project Notes]]"),
            "See [Project Notes](<[[Project Notes]]>)"
        );
        assert_eq!(
            preprocess_wiki_links("[[Roadmap|plan]]"),
            "[plan](<[[Roadmap]]>)"
        );
    }

    #[test]
    fn resolved_links_carry_note_id() {
        let html = render_note_html("See [[Project Notes]]", |title| {
            (title == "Project Notes").then(|| "abc".to_string())
        });
        assert!(html.contains(r##"<a class="internal-link" href="#note-abc" data-note-id="abc">Project Notes</a>"##));
    }

    #[test]
    fn unresolved_links_carry_title() {
        let html = render_note_html("[[Missing \"One\"]]", |_| None);
        assert!(html.contains(r#"data-note-title="Missing &quot;One&quot;""#));
        assert!(html.contains("internal-link unresolved"));
    }

    #[test]
    fn angle_brackets_in_targets_survive() {
        assert_eq!(
            preprocess_wiki_links("[[a<b>]]"),
            r"[a\<b\>](<[[a\<b\>]]>)"
        );

        let html = render_note_html("See [[a<b>]]", |title| {
            (title == "a<b>").then(|| "n1".to_string())
        });
        assert!(html.contains(r#"data-note-id="n1">a&lt;b&gt;</a>"#));

        let html = render_note_html("[[x > y]]", |_| None);
        assert!(html.contains(r#"data-note-title="x &gt; y""#));
    }

    #[test]
    fn links_do_not_span_lines() {
        assert!(extract_wiki_links("[[first\nsecond]]").is_empty());
    }

    #[test]
    fn ordinary_markdown_is_untouched() {
        let html = render_note_html(
            "# Title\n\n[site](https://example.com)\n\n| a | b |\n|---|---|\n| 1 | 2 |\n",
            |_| None,
        );
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains(r#"<a href="https://example.com">site</a>"#));
        assert!(html.contains("<table>"));
        assert!(!html.contains("internal-link"));
    }
}
