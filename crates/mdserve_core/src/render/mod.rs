//! Markdown to HTML rendering.
//!
//! The pipeline runs in a fixed order: emoji shortcodes are substituted over
//! the raw text, math regions are typeset and spliced in as opaque HTML
//! fragments, and only then does the markdown parser run - so it never
//! tokenizes LaTeX or shortcode syntax. GitHub Flavored Markdown features
//! (tables, strikethrough, task lists) are enabled, and every heading gets
//! an anchor ID derived from its text.

pub mod emoji;
pub mod heading;
mod math;

use heading::AnchorIds;
use math::MathTypesetter;
use pulldown_cmark::{Event, LinkType, Options, Parser, Tag, TagEnd};

/// Errors constructing a [`Renderer`].
#[derive(Debug, thiserror::Error)]
pub enum RendererInitError {
    /// The KaTeX option set could not be built.
    #[error("failed to build KaTeX options: {0}")]
    MathOptions(String),
}

/// Options for rendering markdown to HTML.
///
/// Fixed for the lifetime of a [`Renderer`]; the server constructs one set
/// at startup and every request shares it.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Typeset dollar-delimited math with KaTeX.
    pub allow_math: bool,
    /// Treat single newlines as hard line breaks.
    pub breaks_on_newline: bool,
    /// Obfuscate email autolinks with HTML entities.
    pub mangle_emails: bool,
    /// Produce a single inline fragment without block-level wrappers.
    pub inline: bool,
}

impl RenderOptions {
    /// The option set the preview server runs with.
    pub fn preview() -> Self {
        Self {
            allow_math: true,
            breaks_on_newline: true,
            mangle_emails: false,
            inline: false,
        }
    }

    fn to_pulldown_options(self) -> Options {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options
    }
}

/// Markdown renderer configured once at process start.
///
/// A pure function of its input: no I/O, no state, and the same text with
/// the same options renders to byte-identical HTML. Rendering never fails -
/// a math fragment KaTeX rejects degrades to its literal source text.
pub struct Renderer {
    options: RenderOptions,
    math: Option<MathTypesetter>,
}

impl Renderer {
    /// Build a renderer, constructing the KaTeX option set up front when
    /// math is enabled.
    pub fn new(options: RenderOptions) -> Result<Self, RendererInitError> {
        let math = if options.allow_math {
            Some(MathTypesetter::new()?)
        } else {
            None
        };
        Ok(Self { options, math })
    }

    /// Render markdown text to HTML.
    pub fn render(&self, text: &str) -> String {
        let text = emoji::replace_shortcodes(text);
        let text = match &self.math {
            Some(math) => math.substitute(&text),
            None => text,
        };
        self.parse_markdown(&text)
    }

    fn parse_markdown(&self, text: &str) -> String {
        let parser = Parser::new_ext(text, self.options.to_pulldown_options());
        let events: Vec<Event> = parser.collect();
        let mut processed = Vec::with_capacity(events.len());
        let mut anchor_ids = AnchorIds::default();

        let mut i = 0;
        while i < events.len() {
            match &events[i] {
                Event::Start(Tag::Heading {
                    level,
                    id: _,
                    classes,
                    attrs,
                }) => {
                    // Collect heading text
                    let mut heading_text = String::new();
                    let mut j = i + 1;
                    while j < events.len() {
                        match &events[j] {
                            Event::Text(text) | Event::Code(text) => {
                                heading_text.push_str(text);
                                j += 1;
                            }
                            Event::End(TagEnd::Heading(_)) => {
                                break;
                            }
                            _ => {
                                j += 1;
                            }
                        }
                    }

                    // Strip backticks before slugging, same as GitHub does.
                    let id = anchor_ids.assign(&heading_text.replace('`', ""));
                    processed.push(Event::Start(Tag::Heading {
                        level: *level,
                        id: Some(id.into()),
                        classes: classes.clone(),
                        attrs: attrs.clone(),
                    }));
                    i += 1;
                }
                Event::Start(Tag::Link {
                    link_type: LinkType::Email,
                    dest_url,
                    ..
                }) if self.options.mangle_emails => {
                    let address = dest_url.trim_start_matches("mailto:").to_string();
                    // Swallow the link events; the mangled anchor replaces them.
                    let mut j = i + 1;
                    while j < events.len() && !matches!(events[j], Event::End(TagEnd::Link)) {
                        j += 1;
                    }
                    processed.push(Event::Html(mangle_email(&address).into()));
                    i = j + 1;
                }
                Event::SoftBreak if self.options.breaks_on_newline => {
                    processed.push(Event::HardBreak);
                    i += 1;
                }
                Event::Start(Tag::Paragraph) | Event::End(TagEnd::Paragraph)
                    if self.options.inline =>
                {
                    i += 1;
                }
                _ => {
                    processed.push(events[i].clone());
                    i += 1;
                }
            }
        }

        let mut html = String::new();
        pulldown_cmark::html::push_html(&mut html, processed.into_iter());

        if self.options.inline {
            let trimmed = html.trim_end().len();
            html.truncate(trimmed);
        }

        html
    }
}

/// Rewrite an email autolink with every character as a hex entity.
///
/// Deterministic, so repeated renders stay byte-identical.
fn mangle_email(address: &str) -> String {
    let mangled: String = address
        .chars()
        .map(|c| format!("&#x{:x};", c as u32))
        .collect();
    format!(r#"<a href="mailto:{mangled}">{mangled}</a>"#)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer(options: RenderOptions) -> Renderer {
        Renderer::new(options).unwrap()
    }

    #[test]
    fn test_basic_rendering() {
        let html = renderer(RenderOptions::preview()).render("# Hello\n\nWorld");
        assert!(html.contains("<h1"));
        assert!(html.contains("Hello"));
        assert!(html.contains("<p>World</p>"));
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let r = renderer(RenderOptions::preview());
        let input = "# Title :smile:\n\nHello $x^2$ world\n\n- [ ] task\n";
        assert_eq!(r.render(input), r.render(input));
    }

    #[test]
    fn test_heading_ids() {
        let html = renderer(RenderOptions::preview()).render("# Test Heading");
        assert!(html.contains(r##"id="test-heading""##));
    }

    #[test]
    fn test_heading_ids_deduplicated() {
        let html = renderer(RenderOptions::preview()).render("# Setup\n\n# Setup\n\n# Setup");
        assert!(html.contains(r##"id="setup""##));
        assert!(html.contains(r##"id="setup-1""##));
        assert!(html.contains(r##"id="setup-2""##));
    }

    #[test]
    fn test_gfm_table() {
        let html = renderer(RenderOptions::preview()).render("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_gfm_strikethrough_and_tasklist() {
        let r = renderer(RenderOptions::preview());
        assert!(r.render("~~gone~~").contains("<del>"));
        assert!(r.render("- [x] done").contains("checked"));
    }

    #[test]
    fn test_math_enabled_typesets_inline_fragment() {
        let html = renderer(RenderOptions::preview()).render("Hello $x^2$ world");
        assert!(html.contains("Hello"));
        assert!(html.contains("world"));
        assert!(html.contains("katex"));
        assert!(!html.contains('$'));
    }

    #[test]
    fn test_math_disabled_leaves_dollars_alone() {
        let options = RenderOptions {
            allow_math: false,
            ..RenderOptions::preview()
        };
        let html = renderer(options).render("Hello $x^2$ world");
        assert!(html.contains("$x^2$"));
        assert!(!html.contains("katex"));
    }

    #[test]
    fn test_malformed_math_degrades_without_breaking_markdown() {
        let html = renderer(RenderOptions::preview()).render("# Title\n\nbad $x^{$ math");
        assert!(html.contains("<h1"));
        assert!(html.contains("$x^{$"));
        assert!(!html.contains("ParseError"));
    }

    #[test]
    fn test_emoji_shortcodes() {
        let html = renderer(RenderOptions::preview()).render("ship it :rocket:");
        assert!(html.contains('🚀'));
        assert!(!html.contains(":rocket:"));
    }

    #[test]
    fn test_breaks_on_newline() {
        let with_breaks = renderer(RenderOptions::preview()).render("one\ntwo");
        assert!(with_breaks.contains("<br"));

        let options = RenderOptions {
            breaks_on_newline: false,
            ..RenderOptions::preview()
        };
        let without = renderer(options).render("one\ntwo");
        assert!(!without.contains("<br"));
    }

    #[test]
    fn test_mangled_email_autolink() {
        let options = RenderOptions {
            mangle_emails: true,
            ..RenderOptions::preview()
        };
        let html = renderer(options).render("Contact <user@example.com> please");
        assert!(!html.contains("user@example.com"));
        assert!(html.contains("&#x75;"));
        assert!(html.contains("mailto:"));
    }

    #[test]
    fn test_unmangled_email_autolink() {
        let html = renderer(RenderOptions::preview()).render("Contact <user@example.com> please");
        assert!(html.contains("mailto:user@example.com"));
    }

    #[test]
    fn test_inline_mode_has_no_paragraph_wrapper() {
        let options = RenderOptions {
            inline: true,
            ..RenderOptions::preview()
        };
        let html = renderer(options).render("some *emphasis* here");
        assert!(!html.contains("<p>"));
        assert!(html.contains("<em>emphasis</em>"));
    }
}
