//! Emoji shortcode substitution.
//!
//! Runs over the raw markdown before parsing, so the parser never tokenizes
//! shortcode syntax.

/// Replace `:name:` shortcodes with their Unicode emoji.
///
/// Unknown shortcodes and stray colons are left untouched.
pub fn replace_shortcodes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(':') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let replaced = after.find(':').and_then(|len| {
            let candidate = &after[..len];
            if !is_shortcode(candidate) {
                return None;
            }
            emojis::get_by_shortcode(candidate).map(|emoji| (emoji, len))
        });

        match replaced {
            Some((emoji, len)) => {
                out.push_str(emoji.as_str());
                rest = &after[len + 1..];
            }
            None => {
                out.push(':');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn is_shortcode(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '-'))
}
