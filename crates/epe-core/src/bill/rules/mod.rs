//! Rule-based field extractors for EPE bills.
//!
//! Every extractor is a pure function of the logical document text. Fields
//! that vary between bill templates are described by a [`Cascade`]: an
//! ordered table of patterns, each tagged with the template it was tuned
//! on. The first pattern that matches wins.

pub mod patterns;
pub mod amounts;
pub mod client;
pub mod basic;
pub mod tiers;
pub mod charges;
pub mod taxes;
pub mod total;

pub use amounts::{format_currency, parse_count, parse_currency};
pub use client::{title_case, ClientNameExtractor};
pub use basic::{extract_basic_info, BasicInfo};
pub use tiers::{extract_tiers, TierExtractor};
pub use charges::{extract_charges, Charges};
pub use taxes::{extract_taxes, TaxExtractor};
pub use total::{extract_total, TotalExtractor};

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Known bill template families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateVariant {
    /// Colon-terminated labels, amounts padded as `$***123,45`.
    Padded,
    /// Free-form labels, amounts printed as `$123,45`.
    Plain,
}

/// One pattern in a cascade.
#[derive(Debug, Clone)]
pub struct Strategy {
    /// Template the pattern was written for.
    pub variant: TemplateVariant,
    /// Compiled pattern. Capture group 1 onward carry the values.
    pub pattern: Regex,
}

/// Ordered list of strategies tried until one matches.
#[derive(Debug, Clone)]
pub struct Cascade {
    strategies: Vec<Strategy>,
}

impl Cascade {
    /// Compile a cascade from `(variant, pattern)` pairs, in priority order.
    pub fn new(entries: &[(TemplateVariant, &str)]) -> Result<Self, regex::Error> {
        let strategies = entries
            .iter()
            .map(|(variant, pattern)| {
                Ok(Strategy {
                    variant: *variant,
                    pattern: Regex::new(pattern)?,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { strategies })
    }

    /// First matching strategy and its captures.
    pub fn captures<'t>(&self, text: &'t str) -> Option<(TemplateVariant, Captures<'t>)> {
        self.strategies
            .iter()
            .find_map(|s| s.pattern.captures(text).map(|caps| (s.variant, caps)))
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }
}

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;
}

/// An extracted value with the template that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Template variant of the matching pattern.
    pub variant: TemplateVariant,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, variant: TemplateVariant, source: impl Into<String>) -> Self {
        Self {
            value,
            variant,
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cascade_prefers_earlier_strategy() {
        let cascade = Cascade::new(&[
            (TemplateVariant::Padded, r"A=(\d+)"),
            (TemplateVariant::Plain, r"(\d+)"),
        ])
        .unwrap();

        let (variant, caps) = cascade.captures("x 7 A=42").unwrap();
        assert_eq!(variant, TemplateVariant::Padded);
        assert_eq!(&caps[1], "42");

        let (variant, caps) = cascade.captures("x 7").unwrap();
        assert_eq!(variant, TemplateVariant::Plain);
        assert_eq!(&caps[1], "7");

        assert!(cascade.captures("nothing").is_none());
    }

    #[test]
    fn test_cascade_rejects_bad_pattern() {
        assert!(Cascade::new(&[(TemplateVariant::Plain, r"(unclosed")]).is_err());
    }
}
