//! Math substitution with KaTeX.
//!
//! Scans the raw text for dollar-delimited math and replaces each region
//! with typeset HTML before the markdown parser runs, so the parser never
//! tokenizes LaTeX. The scan is an explicit state machine (normal,
//! in-block-math, in-inline-math) rather than a regex, which makes the
//! delimiter edge cases (escaped dollars, multi-line blocks, unclosed
//! markers) concrete transitions.
//!
//! Delimiter rules:
//! - Block math opens with `$$` at the start of a line and closes with an
//!   unescaped `$$` at the end of a line; content may span lines.
//! - Inline math opens with `$` at the start of a line or after whitespace,
//!   its content starts with a non-space, non-`$` character, and it closes
//!   at the next unescaped `$` preceded by a non-space character. Inline
//!   regions never cross a line boundary.
//! - `\$` is an escaped dollar and neither opens nor closes a region.
//! - An unclosed region is left verbatim.
//!
//! A region that KaTeX fails to typeset is also left verbatim and the error
//! is logged; one bad fragment never fails the render.

use super::RendererInitError;

pub(crate) struct MathTypesetter {
    inline_opts: katex::Opts,
    display_opts: katex::Opts,
}

/// Block math being accumulated across lines.
struct PendingBlock {
    /// Original text of the region so far, markers and line endings included.
    raw: String,
    /// Math source stripped of the markers.
    source: String,
}

impl MathTypesetter {
    pub(crate) fn new() -> Result<Self, RendererInitError> {
        Ok(Self {
            inline_opts: build_opts(false)?,
            display_opts: build_opts(true)?,
        })
    }

    /// Replace every math region in `text` with typeset HTML.
    pub(crate) fn substitute(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut pending: Option<PendingBlock> = None;

        for line in text.split_inclusive('\n') {
            let (body, eol) = split_eol(line);

            match pending.take() {
                Some(mut block) => {
                    block.raw.push_str(line);
                    match strip_block_close(body) {
                        Some(before) => {
                            block.source.push_str(before);
                            match self.typeset(&block.source, true) {
                                Ok(html) => {
                                    out.push_str(&html);
                                    out.push_str(eol);
                                }
                                Err(error) => {
                                    tracing::warn!(%error, "KaTeX rendering failed, keeping block math verbatim");
                                    out.push_str(&block.raw);
                                }
                            }
                        }
                        None => {
                            block.source.push_str(body);
                            block.source.push('\n');
                            pending = Some(block);
                        }
                    }
                }
                None => {
                    if let Some(after) = body.strip_prefix("$$") {
                        match strip_block_close(after) {
                            Some(inner) => {
                                // Single-line $$...$$
                                match self.typeset(inner, true) {
                                    Ok(html) => {
                                        out.push_str(&html);
                                        out.push_str(eol);
                                    }
                                    Err(error) => {
                                        tracing::warn!(%error, "KaTeX rendering failed, keeping block math verbatim");
                                        out.push_str(line);
                                    }
                                }
                            }
                            None => {
                                let mut source = String::new();
                                if !after.is_empty() {
                                    source.push_str(after);
                                    source.push('\n');
                                }
                                pending = Some(PendingBlock {
                                    raw: line.to_string(),
                                    source,
                                });
                            }
                        }
                    } else {
                        self.substitute_inline(body, &mut out);
                        out.push_str(eol);
                    }
                }
            }
        }

        // Unclosed block at end of input stays verbatim.
        if let Some(block) = pending {
            out.push_str(&block.raw);
        }

        out
    }

    /// Scan one line for inline `$...$` regions.
    fn substitute_inline(&self, line: &str, out: &mut String) {
        let chars: Vec<(usize, char)> = line.char_indices().collect();
        let mut emitted = 0;
        let mut i = 0;

        while i < chars.len() {
            let (start, ch) = chars[i];

            if ch == '\\' {
                // Escaped character, the dollar (if any) stays literal.
                i += 2;
                continue;
            }

            if ch != '$' {
                i += 1;
                continue;
            }

            let after_whitespace = i == 0 || chars[i - 1].1.is_whitespace();
            let content_opens = i + 1 < chars.len()
                && !chars[i + 1].1.is_whitespace()
                && chars[i + 1].1 != '$';
            if !(after_whitespace && content_opens) {
                i += 1;
                continue;
            }

            let Some(close) = find_inline_close(&chars, i + 1) else {
                i += 1;
                continue;
            };

            let source = &line[chars[i].0 + 1..chars[close].0];
            let end = chars[close].0 + 1;
            out.push_str(&line[emitted..start]);
            match self.typeset(source, false) {
                Ok(html) => out.push_str(&html),
                Err(error) => {
                    tracing::warn!(%error, "KaTeX rendering failed, keeping inline math verbatim");
                    out.push_str(&line[start..end]);
                }
            }
            emitted = end;
            i = close + 1;
        }

        out.push_str(&line[emitted..]);
    }

    fn typeset(&self, source: &str, display_mode: bool) -> Result<String, katex::Error> {
        let opts = if display_mode {
            &self.display_opts
        } else {
            &self.inline_opts
        };
        katex::render_with_opts(source.trim(), opts)
    }
}

fn build_opts(display_mode: bool) -> Result<katex::Opts, RendererInitError> {
    katex::Opts::builder()
        .display_mode(display_mode)
        .output_type(katex::OutputType::Html)
        .build()
        .map_err(|err| RendererInitError::MathOptions(err.to_string()))
}

/// Split a line produced by `split_inclusive` into body and line ending.
fn split_eol(line: &str) -> (&str, &str) {
    match line.strip_suffix('\n') {
        Some(body) => match body.strip_suffix('\r') {
            Some(body) => (body, &line[body.len()..]),
            None => (body, "\n"),
        },
        None => (line, ""),
    }
}

/// Strip an unescaped closing `$$` from the end of a line body.
fn strip_block_close(body: &str) -> Option<&str> {
    let before = body.strip_suffix("$$")?;
    if before.ends_with('\\') {
        return None;
    }
    Some(before)
}

/// Find the closing `$` for an inline region starting at `from`.
fn find_inline_close(chars: &[(usize, char)], from: usize) -> Option<usize> {
    let mut j = from;
    while j < chars.len() {
        match chars[j].1 {
            '\\' => j += 2,
            '$' if !chars[j - 1].1.is_whitespace() => return Some(j),
            _ => j += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typesetter() -> MathTypesetter {
        MathTypesetter::new().unwrap()
    }

    #[test]
    fn test_inline_math_is_typeset() {
        let out = typesetter().substitute("Hello $x^2$ world");
        assert!(out.contains("katex"));
        assert!(!out.contains('$'));
        assert!(out.starts_with("Hello "));
        assert!(out.ends_with(" world"));
    }

    #[test]
    fn test_inline_math_requires_leading_whitespace() {
        let out = typesetter().substitute("price$5$ stays");
        assert_eq!(out, "price$5$ stays");
    }

    #[test]
    fn test_inline_math_content_must_hug_delimiters() {
        let out = typesetter().substitute("a $ x$ b");
        assert_eq!(out, "a $ x$ b");
    }

    #[test]
    fn test_escaped_dollars_do_not_delimit() {
        let out = typesetter().substitute("costs \\$5 or \\$10 today");
        assert_eq!(out, "costs \\$5 or \\$10 today");
    }

    #[test]
    fn test_unclosed_inline_math_stays_verbatim() {
        let out = typesetter().substitute("a $x never closes");
        assert_eq!(out, "a $x never closes");
    }

    #[test]
    fn test_block_math_single_line() {
        let out = typesetter().substitute("$$x + y$$\n");
        assert!(out.contains("katex-display"));
        assert!(!out.contains('$'));
    }

    #[test]
    fn test_block_math_spans_lines() {
        let out = typesetter().substitute("$$\n\\frac{a}{b}\n$$\nafter");
        assert!(out.contains("katex-display"));
        assert!(out.ends_with("after"));
        assert!(!out.contains('$'));
    }

    #[test]
    fn test_block_marker_must_start_the_line() {
        let out = typesetter().substitute("text $$x$$ more");
        // Mid-line double dollars are neither block nor inline math.
        assert_eq!(out, "text $$x$$ more");
    }

    #[test]
    fn test_unclosed_block_math_stays_verbatim() {
        let input = "$$\nx + y\nnever closed";
        assert_eq!(typesetter().substitute(input), input);
    }

    #[test]
    fn test_malformed_math_degrades_to_source() {
        let out = typesetter().substitute("fine $x^{$ text");
        assert_eq!(out, "fine $x^{$ text");
    }

    #[test]
    fn test_malformed_block_keeps_markers_and_newlines() {
        let input = "$$\n\\frac{a}{\n$$\n";
        assert_eq!(typesetter().substitute(input), input);
    }

    #[test]
    fn test_two_regions_on_one_line() {
        let out = typesetter().substitute("sum $a+b$ and $c+d$ done");
        assert!(!out.contains('$'));
        assert!(out.contains("done"));
    }
}
