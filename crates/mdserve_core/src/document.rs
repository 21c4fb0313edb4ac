//! Markdown path classification.
//!
//! The single source of truth for which file extensions are treated as
//! markdown documents, used by the router to decide whether a path gets the
//! preview shell or a raw byte stream.

use std::path::Path;

/// Lowercase file extensions treated as markdown documents.
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown", "mdown", "mkdn", "mkd"];

/// Whether the path names a markdown document (case-insensitive extension).
///
/// # Examples
///
/// ```
/// use mdserve_core::document::is_markdown_path;
/// use std::path::Path;
///
/// assert!(is_markdown_path(Path::new("README.md")));
/// assert!(is_markdown_path(Path::new("notes.MARKDOWN")));
/// assert!(!is_markdown_path(Path::new("style.css")));
/// assert!(!is_markdown_path(Path::new("file")));
/// ```
pub fn is_markdown_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            MARKDOWN_EXTENSIONS.iter().any(|known| *known == ext)
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_extensions() {
        assert!(is_markdown_path(Path::new("doc.md")));
        assert!(is_markdown_path(Path::new("doc.markdown")));
        assert!(is_markdown_path(Path::new("doc.mdown")));
        assert!(is_markdown_path(Path::new("doc.mkdn")));
        assert!(is_markdown_path(Path::new("doc.mkd")));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(is_markdown_path(Path::new("README.MD")));
        assert!(is_markdown_path(Path::new("README.Md")));
    }

    #[test]
    fn test_non_markdown() {
        assert!(!is_markdown_path(Path::new("image.png")));
        assert!(!is_markdown_path(Path::new("script.js")));
        assert!(!is_markdown_path(Path::new("no_extension")));
        assert!(!is_markdown_path(Path::new(".md")));
    }
}
