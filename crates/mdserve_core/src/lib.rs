//! Core library for the markdown preview server.
//!
//! This crate provides the pieces the server composes: rendering markdown to
//! HTML, waiting for a file to change on disk, and bounding that wait so a
//! long-poll request always completes.
//!
//! # Modules
//!
//! - [`render`] - Markdown to HTML conversion (emoji, math, GitHub-style features)
//! - [`watcher`] - Single-shot file change notification
//! - [`poll`] - Bounding an unbounded wait with a timeout
//! - [`document`] - Markdown path classification
//! - [`assets`] - Embedded shell page driving the browser poll loop

pub mod assets;
pub mod document;
pub mod poll;
pub mod render;
pub mod watcher;

// Re-export commonly used types at crate root
pub use document::is_markdown_path;
pub use poll::{wait_bounded, PollOutcome};
pub use render::{RenderOptions, Renderer, RendererInitError};
pub use watcher::{await_change, WatchError};
