//! Markdown rendering with syntax highlighting

use lazy_static::lazy_static;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;
use thiserror::Error;

use super::Heading;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("highlight theme `{0}` is not available")]
    MissingTheme(String),
    #[error("failed to highlight `{lang}` code block: {reason}")]
    Highlight { lang: String, reason: String },
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
    line_numbers: bool,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options("base16-ocean.dark", false)
    }

    /// Create with custom settings
    pub fn with_options(theme: &str, line_numbers: bool) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: theme.to_string(),
            line_numbers,
        }
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> Result<String, RenderError> {
        // Front matter is stripped before we get here, so no metadata blocks
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION;
        let parser = Parser::new_ext(markdown, options).into_offset_iter();

        let mut events: Vec<Event> = Vec::new();
        let mut in_code_block = false;
        let mut code_block_lang: Option<String> = None;
        let mut code_block_content = String::new();

        for (event, range) in parser {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    code_block_lang = match kind {
                        CodeBlockKind::Fenced(lang) => lang
                            .split_whitespace()
                            .next()
                            .map(|l| l.to_string()),
                        CodeBlockKind::Indented => None,
                    };
                    code_block_content.clear();
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_code_block = false;
                    let highlighted =
                        self.highlight_code(&code_block_content, code_block_lang.as_deref())?;
                    events.push(Event::Html(CowStr::from(highlighted)));
                    code_block_lang = None;
                }
                Event::Text(text) if in_code_block => {
                    code_block_content.push_str(&text);
                }
                Event::Start(Tag::Heading {
                    level,
                    id: _,
                    classes,
                    attrs,
                }) => {
                    // Anchors come from the source line, same as the TOC
                    let source_line = markdown[range].lines().next().unwrap_or_default();
                    let anchor = heading_anchor(source_line);
                    events.push(Event::Start(Tag::Heading {
                        level,
                        id: (!anchor.is_empty()).then(|| CowStr::from(anchor)),
                        classes,
                        attrs,
                    }));
                }
                other => events.push(other),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        Ok(html_output)
    }

    /// Highlight a code block; untagged blocks stay plain text
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> Result<String, RenderError> {
        let Some(lang) = lang else {
            return Ok(format!("<pre><code>{}</code></pre>", html_escape(code)));
        };

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let highlighted = highlighted_html_for_string(code, &self.syntax_set, syntax, self.theme()?)
            .map_err(|e| RenderError::Highlight {
                lang: lang.to_string(),
                reason: e.to_string(),
            })?;

        if self.line_numbers {
            Ok(with_line_numbers(&highlighted, code.lines().count(), lang))
        } else {
            Ok(format!(
                r#"<figure class="highlight language-{}">{}</figure>"#,
                html_escape(lang),
                highlighted
            ))
        }
    }

    fn theme(&self) -> Result<&Theme, RenderError> {
        self.theme_set
            .themes
            .get(&self.theme_name)
            .ok_or_else(|| RenderError::MissingTheme(self.theme_name.clone()))
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap highlighted code in a table with a gutter of `line_count` numbers
fn with_line_numbers(highlighted: &str, line_count: usize, lang: &str) -> String {
    let gutter = (1..=line_count)
        .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<figure class="highlight language-{}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code">{}</td></tr></table></figure>"#,
        html_escape(lang),
        gutter,
        highlighted
    )
}

/// Anchor id for a heading source line such as `## Getting Started`
fn heading_anchor(line: &str) -> String {
    slug::slugify(line.trim_start_matches('#'))
}

/// Collect `##`/`###` headings by scanning raw lines.
///
/// Inline markdown in the heading text is kept as written. Anything deeper
/// than `###` counts as level 3.
pub fn extract_headings(markdown: &str) -> Vec<Heading> {
    lazy_static! {
        static ref HEADING_REGEX: Regex = Regex::new(r"^###*\s").unwrap();
    }

    markdown
        .lines()
        .filter(|line| HEADING_REGEX.is_match(line))
        .map(|line| Heading {
            text: HEADING_REGEX.replace(line, "").trim_end_matches('\r').to_string(),
            anchor: heading_anchor(line),
            level: if line.starts_with("###") { 3 } else { 2 },
        })
        .collect()
}

/// Simple HTML escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("Hello **world**.\n\nThis is a test.").unwrap();
        assert!(html.contains("<p>Hello <strong>world</strong>.</p>"));
        assert!(html.contains("<p>This is a test.</p>"));
    }

    #[test]
    fn test_headings_get_anchors() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("## Getting Started\n\ntext").unwrap();
        assert!(html.contains(r#"<h2 id="getting-started">Getting Started</h2>"#));
    }

    #[test]
    fn test_heading_anchors_match_toc() {
        let renderer = MarkdownRenderer::new();
        let body = "## Setup {#custom}\n\n## [Foo](http://x)\n\n### Using `useEffect`\n";
        let html = renderer.render(body).unwrap();

        let headings = extract_headings(body);
        assert_eq!(headings.len(), 3);
        for heading in &headings {
            assert!(
                html.contains(&format!(r#"id="{}""#, heading.anchor)),
                "no anchor {:?} in {}",
                heading.anchor,
                html
            );
        }
        assert_eq!(headings[1].anchor, "foo-http-x");
    }

    #[test]
    fn test_render_code_block() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```rust\nfn main() {}\n```").unwrap();
        assert!(html.contains("highlight language-rust"));
        assert!(html.contains("main"));
        assert!(!html.contains("```"));
    }

    #[test]
    fn test_untagged_code_block_is_plain() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```\n<div>&</div>\n```").unwrap();
        assert!(html.contains("<pre><code>&lt;div&gt;&amp;&lt;/div&gt;\n</code></pre>"));
        assert!(!html.contains("highlight"));
    }

    #[test]
    fn test_unknown_language_falls_back_to_plain_text() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```nosuchlang\nhello\n```").unwrap();
        assert!(html.contains("language-nosuchlang"));
        assert!(html.contains("hello"));
    }

    #[test]
    fn test_line_numbers() {
        let renderer = MarkdownRenderer::with_options("base16-ocean.dark", true);
        let html = renderer.render("```js\nlet a = 1;\nlet b = 2;\n```").unwrap();
        assert_eq!(html.matches(r#"class="line-number""#).count(), 2);
        assert!(html.contains(r#"<span class="line-number">2</span>"#));
        assert!(html.contains("gutter"));
    }

    #[test]
    fn test_missing_theme_is_an_error() {
        let renderer = MarkdownRenderer::with_options("no-such-theme", false);
        assert!(matches!(
            renderer.render("```rust\nfn main() {}\n```"),
            Err(RenderError::MissingTheme(_))
        ));
        // Prose needs no theme
        assert!(renderer.render("plain prose").is_ok());
    }

    #[test]
    fn test_extract_headings() {
        let body = "# Title\n\n## Intro\n\ntext\n\n### Details\n#### Deeper\n##NoSpace\n";
        let headings = extract_headings(body);
        assert_eq!(
            headings,
            vec![
                Heading { text: "Intro".into(), anchor: "intro".into(), level: 2 },
                Heading { text: "Details".into(), anchor: "details".into(), level: 3 },
                Heading { text: "Deeper".into(), anchor: "deeper".into(), level: 3 },
            ]
        );
    }

    #[test]
    fn test_extract_headings_keeps_inline_markdown() {
        let headings = extract_headings("## Using `useEffect` **wisely**\r\n");
        assert_eq!(headings[0].text, "Using `useEffect` **wisely**");
    }
}
