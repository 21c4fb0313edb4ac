//! Heading anchor IDs.

use std::collections::HashMap;

/// Converts heading text to a URL-safe slug following GitHub's convention.
///
/// GitHub's algorithm:
/// 1. Convert to lowercase
/// 2. Replace spaces with hyphens
/// 3. Remove all characters except alphanumeric, hyphens, and underscores
/// 4. Collapse multiple consecutive hyphens into one
///
/// # Example
///
/// ```
/// use mdserve_core::render::heading::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("API Reference (v2)"), "api-reference-v2");
/// ```
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else if c == ' ' || c == '-' {
                '-'
            } else {
                // Remove other characters (punctuation, etc.)
                '\0'
            }
        })
        .filter(|&c| c != '\0')
        .collect::<String>()
        // Collapse multiple hyphens into one
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Assigns anchor IDs to headings, deduplicating collisions.
///
/// The first heading with a given slug keeps it; later ones get `-1`, `-2`,
/// and so on, matching what GitHub does for repeated headings.
#[derive(Debug, Default)]
pub struct AnchorIds {
    seen: HashMap<String, usize>,
}

impl AnchorIds {
    /// Assign the anchor ID for the next heading with this text.
    pub fn assign(&mut self, heading_text: &str) -> String {
        let slug = slugify(heading_text);
        let count = self.seen.entry(slug.clone()).or_insert(0);
        let id = if *count == 0 {
            slug.clone()
        } else {
            format!("{slug}-{count}")
        };
        *count += 1;
        id
    }
}
