//! Embedded shell page for the browser client.
//!
//! The shell is served once per page load and drives the whole protocol
//! from its inline script: fetch `/api`, swap the rendered HTML in, fetch
//! `/watch` (which blocks until a change or the server's timeout), repeat.
//! On any fetch failure it waits a second and retries, forever.

/// HTML shell embedding the render/watch poll loop.
pub const SHELL_HTML: &str = include_str!("../js/index.html");

/// Get the shell page.
pub fn shell_html() -> &'static str {
    SHELL_HTML
}
