//! Markdown helpers shared by the checkers and rewriters.
mod discovery;
mod headings;

pub use discovery::{discover_files, discover_markdown, relative_display};
pub use headings::{FenceTracker, Heading, headings, is_fence, parse_heading};
