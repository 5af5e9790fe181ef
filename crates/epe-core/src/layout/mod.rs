//! Layout reconstruction from positioned text fragments.
//!
//! Vector text extraction yields spans without line structure. Spans whose
//! vertical positions stay within a small tolerance are treated as one
//! visual line.

mod reconstruct;

pub use reconstruct::LayoutReconstructor;

use serde::{Deserialize, Serialize};

use crate::Result;

/// One span of recovered text with its vertical placement on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedFragment {
    /// Text content, already spaced as in the source.
    pub text: String,
    /// Vertical coordinate on the page.
    pub vertical_position: f32,
}

impl PositionedFragment {
    pub fn new(text: impl Into<String>, vertical_position: f32) -> Self {
        Self {
            text: text.into(),
            vertical_position,
        }
    }

    /// Vertical position rounded to whole units, halves toward +∞.
    pub fn rounded_y(&self) -> i64 {
        (self.vertical_position + 0.5).floor() as i64
    }
}

/// A document that yields positioned fragments page by page.
pub trait FragmentSource {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Fragments of one page (1-indexed), in content order.
    fn page_fragments(&self, page: u32) -> Result<Vec<PositionedFragment>>;
}
