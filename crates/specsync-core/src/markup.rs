//! Markdown to Confluence storage format.
//!
//! Rendering goes through `pulldown-cmark`; fenced code is intercepted at the
//! event level and emitted as a `code` macro, and blockquotes are rewritten to
//! `info` panels afterwards. Tables pass through as plain HTML, which the wiki
//! accepts as-is.

use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use std::sync::OnceLock;

/// Status shown in the page-properties macro of every synced page.
pub const REVIEW_STATUS: &str = "Review pending";

/// Convert Markdown to wiki storage markup. Single newlines become line
/// breaks.
pub fn to_storage(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(markdown, options);

    let mut events: Vec<Event> = Vec::new();
    let mut code: Option<(Option<String>, String)> = None;

    for event in parser {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split(|c: char| c.is_whitespace() || c == ',')
                        .next()
                        .filter(|s| !s.is_empty())
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                code = Some((lang, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((lang, body)) = code.take() {
                    events.push(Event::Html(code_macro(lang.as_deref(), &body).into()));
                }
            }
            Event::Text(text) if code.is_some() => {
                if let Some((_, body)) = code.as_mut() {
                    body.push_str(&text);
                }
            }
            Event::SoftBreak => events.push(Event::HardBreak),
            other => events.push(other),
        }
    }

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    convert_blockquotes(&out)
}

fn code_macro(lang: Option<&str>, body: &str) -> String {
    let mut s = String::from("<ac:structured-macro ac:name=\"code\">\n");
    if let Some(lang) = lang {
        s.push_str(&format!(
            "  <ac:parameter ac:name=\"language\">{}</ac:parameter>\n",
            escape(lang)
        ));
    }
    // CDATA cannot contain its own terminator; split it across two sections.
    let body = body.trim_end_matches('\n').replace("]]>", "]]]]><![CDATA[>");
    s.push_str(&format!(
        "  <ac:plain-text-body><![CDATA[{body}]]></ac:plain-text-body>\n</ac:structured-macro>\n"
    ));
    s
}

fn titled_quote_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<blockquote>\s*<p><strong>(.*?)</strong>:\s*(.*?)</p>\s*</blockquote>")
            .unwrap()
    })
}

fn quote_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<blockquote>(.*?)</blockquote>").unwrap())
}

/// `> **Title**: text` becomes a titled info panel; any other blockquote
/// becomes an untitled one.
fn convert_blockquotes(html: &str) -> String {
    let titled = titled_quote_re().replace_all(html, |caps: &regex::Captures| {
        format!(
            "<ac:structured-macro ac:name=\"info\">\n  <ac:parameter ac:name=\"title\">{}</ac:parameter>\n  <ac:rich-text-body>\n    <p>{}</p>\n  </ac:rich-text-body>\n</ac:structured-macro>",
            &caps[1], &caps[2]
        )
    });
    quote_re()
        .replace_all(&titled, |caps: &regex::Captures| {
            format!(
                "<ac:structured-macro ac:name=\"info\">\n  <ac:rich-text-body>\n    {}\n  </ac:rich-text-body>\n</ac:structured-macro>",
                caps[1].trim()
            )
        })
        .into_owned()
}

// ---------------------------------------------------------------------------
// Page template
// ---------------------------------------------------------------------------

/// Wrapper placed around every synced document.
#[derive(Debug, Clone)]
pub struct PageTemplate<'a> {
    /// Link to the source file in the repository.
    pub source_url: &'a str,
    pub project_name: Option<&'a str>,
    /// Names listed as approvers; an `@` is prepended when missing.
    pub approvers: &'a [String],
}

impl PageTemplate<'_> {
    pub fn render(&self, content: &str) -> String {
        let approvers = self
            .approvers
            .iter()
            .map(|a| {
                if a.starts_with('@') {
                    escape(a)
                } else {
                    format!("@{}", escape(a))
                }
            })
            .collect::<Vec<_>>()
            .join(",");
        let project = self
            .project_name
            .map(|p| format!("\n    <p><strong>Project</strong>: {}</p>", escape(p)))
            .unwrap_or_default();

        format!(
            r#"<ac:structured-macro ac:name="info">
  <ac:parameter ac:name="title">GitHub sync</ac:parameter>
  <ac:rich-text-body>
    <p>The latest version lives on <a href="{url}">GitHub</a>.</p>
    <p>Edit it there; this page is updated automatically.</p>{project}
  </ac:rich-text-body>
</ac:structured-macro>

<hr/>

{content}

<hr/>

<ac:structured-macro ac:name="page-properties">
  <ac:parameter ac:name="approval">{approvers}</ac:parameter>
  <ac:parameter ac:name="status">{status}</ac:parameter>
</ac:structured-macro>"#,
            url = escape(self.source_url),
            content = content.trim(),
            status = REVIEW_STATUS,
        )
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
