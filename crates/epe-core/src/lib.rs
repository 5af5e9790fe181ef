//! Core library for EPE electricity bill processing.
//!
//! This crate provides:
//! - Layout reconstruction from positioned text fragments
//! - Bill field extraction (client, dates, tiers, charges, taxes, total)
//! - Multi-bill aggregation with optional price index normalization
//! - PDF fragment extraction (behind the `pdf` feature)

pub mod error;
pub mod models;
pub mod layout;
pub mod bill;
pub mod aggregate;
#[cfg(feature = "pdf")]
pub mod pdf;

pub use error::{EpeError, Result};
pub use models::bill::{BillRecord, TaxKey, TaxMap, TierEntry, TierName};
pub use models::config::EpeConfig;
pub use layout::{FragmentSource, LayoutReconstructor, PositionedFragment};
pub use bill::{extract_bill_data, BillParser, ExtractionResult, RuleBillParser};
pub use bill::rules::{parse_currency, TemplateVariant};
pub use aggregate::{sort_by_emission_date, CpiIndex, Dashboard, Valuation};
#[cfg(feature = "pdf")]
pub use pdf::{PdfExtractor, PdfProcessor};
