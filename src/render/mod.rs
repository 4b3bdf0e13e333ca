//! Page rendering: static templates plus the generated browser page.

pub mod html;

pub use html::render_page;

use std::fs;
use std::path::Path;

/// File name of the header fragment inside a template directory.
pub const TOP_TEMPLATE: &str = "Top.html";
/// File name of the footer fragment inside a template directory.
pub const BOTTOM_TEMPLATE: &str = "Bottom.html";

/// Header and footer fragments wrapped around every page, verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Templates {
    pub top: String,
    pub bottom: String,
}

impl Templates {
    /// Load `Top.html` and `Bottom.html` from `dir`. A missing or unreadable
    /// file yields an empty fragment.
    pub fn load(dir: &Path) -> Self {
        Self {
            top: read_fragment(&dir.join(TOP_TEMPLATE)),
            bottom: read_fragment(&dir.join(BOTTOM_TEMPLATE)),
        }
    }
}

fn read_fragment(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "template fragment unavailable");
            String::new()
        }
    }
}

/// Escape text for use in HTML content and double-quoted attributes.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
