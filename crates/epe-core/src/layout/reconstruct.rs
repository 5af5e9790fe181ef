//! Vertical-position line clustering.

use tracing::{debug, trace};

use super::{FragmentSource, PositionedFragment};
use crate::models::config::LayoutConfig;
use crate::Result;

/// Rebuilds logical lines from positioned fragments.
#[derive(Debug, Clone)]
pub struct LayoutReconstructor {
    tolerance: i64,
}

impl LayoutReconstructor {
    /// Create a reconstructor with the default 3-unit tolerance.
    pub fn new() -> Self {
        Self::from_config(&LayoutConfig::default())
    }

    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            tolerance: config.line_tolerance,
        }
    }

    /// Set the same-line tolerance.
    pub fn with_tolerance(mut self, tolerance: i64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn tolerance(&self) -> i64 {
        self.tolerance
    }

    /// Reconstruct one page, appending to `out`.
    ///
    /// Fragments on the same line are concatenated without a separator.
    /// The page always ends with a line break.
    pub fn push_page(&self, fragments: &[PositionedFragment], out: &mut String) {
        let mut last_y: Option<i64> = None;

        for fragment in fragments {
            if fragment.text.is_empty() {
                continue;
            }

            let y = fragment.rounded_y();
            if let Some(prev) = last_y {
                if y.abs_diff(prev) > self.tolerance.max(0) as u64 {
                    out.push('\n');
                }
            }
            out.push_str(&fragment.text);
            last_y = Some(y);
        }

        out.push('\n');
    }

    /// Reconstruct a whole document from its pages, in order.
    pub fn reconstruct(&self, pages: &[Vec<PositionedFragment>]) -> String {
        let mut out = String::new();
        for page in pages {
            self.push_page(page, &mut out);
        }
        out
    }

    /// Pull every page from a fragment source and reconstruct it.
    pub fn reconstruct_source<S: FragmentSource + ?Sized>(
        &self,
        source: &S,
        max_pages: usize,
    ) -> Result<String> {
        let mut page_count = source.page_count();
        if max_pages > 0 {
            page_count = page_count.min(max_pages as u32);
        }

        let mut out = String::new();
        for page in 1..=page_count {
            let fragments = source.page_fragments(page)?;
            trace!("Page {}: {} fragments", page, fragments.len());
            self.push_page(&fragments, &mut out);
        }

        debug!(
            "Reconstructed {} pages into {} lines",
            page_count,
            out.lines().count()
        );
        Ok(out)
    }
}

impl Default for LayoutReconstructor {
    fn default() -> Self {
        Self::new()
    }
}
