//! WASM bindings for EPE electricity bills.
//!
//! The browser does PDF text extraction itself (e.g. with pdf.js) and hands
//! positioned fragments to [`reconstruct_layout`]; everything after that
//! runs here.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;
use web_sys::console;

use epe_core::bill::rules::{format_currency as format_amount, title_case as title};
use epe_core::models::config::EpeConfig;
use epe_core::{
    BillParser, BillRecord, CpiIndex, Dashboard, LayoutReconstructor, PositionedFragment,
    RuleBillParser, Valuation,
};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    // Plain objects rather than JS Maps for the keyed tax and tier tables
    value
        .serialize(&Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn from_js<T: serde::de::DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Join per-page fragments (`[[{text, verticalPosition}]]`) into logical
/// document text.
#[wasm_bindgen]
pub fn reconstruct_layout(pages: JsValue, tolerance: Option<i32>) -> Result<String, JsValue> {
    let pages: Vec<Vec<PositionedFragment>> = from_js(pages)?;

    let mut reconstructor = LayoutReconstructor::new();
    if let Some(tolerance) = tolerance {
        reconstructor = reconstructor.with_tolerance(i64::from(tolerance));
    }

    Ok(reconstructor.reconstruct(&pages))
}

/// Extract a bill from logical document text.
///
/// Returns `null` when the client name or emission date cannot be found.
#[wasm_bindgen]
pub fn extract_bill_data(text: &str, filename: &str) -> Result<JsValue, JsValue> {
    match RuleBillParser::new().parse(text, filename) {
        Ok(result) => to_js(&result.bill),
        Err(e) => {
            console::warn_1(&format!("Skipping {}: {}", filename, e).into());
            Ok(JsValue::NULL)
        }
    }
}

/// Sort bills by emission date, oldest first.
#[wasm_bindgen]
pub fn sort_by_emission_date(bills: JsValue) -> Result<JsValue, JsValue> {
    let mut bills: Vec<BillRecord> = from_js(bills)?;
    epe_core::sort_by_emission_date(&mut bills);
    to_js(&bills)
}

/// Build KPIs and series over the given bills.
///
/// With `cpi_json` (a `{"MM/YYYY": level}` object) money values are
/// expressed in prices of its latest month.
#[wasm_bindgen]
pub fn build_dashboard(bills: JsValue, cpi_json: Option<String>) -> Result<JsValue, JsValue> {
    let bills: Vec<BillRecord> = from_js(bills)?;

    let index = cpi_json
        .as_deref()
        .map(CpiIndex::from_json)
        .transpose()
        .map_err(js_error)?;

    let valuation = match &index {
        Some(index) => Valuation::Real(index),
        None => Valuation::Nominal,
    };

    to_js(&Dashboard::build(&bills, valuation))
}

/// Parse a bill amount such as `$***1.234,56`, returned as a decimal string.
#[wasm_bindgen]
pub fn parse_currency(amount: &str) -> Option<String> {
    epe_core::parse_currency(amount).map(|d| d.to_string())
}

/// Format a number the way bills print it (`1.234,56`).
#[wasm_bindgen]
pub fn format_currency(amount: f64) -> String {
    Decimal::from_f64(amount)
        .map(format_amount)
        .unwrap_or_else(|| amount.to_string())
}

/// Format a decimal string such as a serialized bill amount.
#[wasm_bindgen]
pub fn format_decimal(amount: &str) -> Option<String> {
    Decimal::from_str(amount).ok().map(format_amount)
}

/// Capitalize an uppercase client name for display.
#[wasm_bindgen]
pub fn title_case(name: &str) -> String {
    title(name)
}

/// Bill extractor with custom configuration.
#[wasm_bindgen]
pub struct BillExtractor {
    parser: RuleBillParser,
    reconstructor: LayoutReconstructor,
}

#[wasm_bindgen]
impl BillExtractor {
    /// Create an extractor, optionally from a configuration JSON object.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<BillExtractor, JsValue> {
        let config: EpeConfig = match config_json {
            Some(json) => serde_json::from_str(&json).map_err(js_error)?,
            None => EpeConfig::default(),
        };

        Ok(Self {
            parser: RuleBillParser::from_config(&config),
            reconstructor: LayoutReconstructor::from_config(&config.layout),
        })
    }

    /// Extract a bill with its defaulted-field warnings and matched template
    /// variants. Throws when a required field is missing.
    #[wasm_bindgen]
    pub fn extract(&self, text: &str, filename: &str) -> Result<JsValue, JsValue> {
        let result = self.parser.parse(text, filename).map_err(js_error)?;
        to_js(&result)
    }

    /// Reconstruct per-page fragments and extract in one step.
    #[wasm_bindgen]
    pub fn extract_fragments(&self, pages: JsValue, filename: &str) -> Result<JsValue, JsValue> {
        let pages: Vec<Vec<PositionedFragment>> = from_js(pages)?;
        let text = self.reconstructor.reconstruct(&pages);
        self.extract(&text, filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_parse_currency() {
        assert_eq!(parse_currency("$***1.234,56"), Some("1234.56".to_string()));
        assert_eq!(parse_currency("abc"), None);
    }

    #[wasm_bindgen_test]
    fn test_format_currency() {
        assert_eq!(format_currency(1234.5), "1.234,50");
        assert_eq!(format_decimal("21933.01"), Some("21.933,01".to_string()));
        assert_eq!(format_decimal("n/a"), None);
    }

    #[wasm_bindgen_test]
    fn test_title_case() {
        assert_eq!(title_case("GOMEZ MARIA LAURA"), "Gomez Maria Laura");
    }

    #[wasm_bindgen_test]
    fn test_extract_bill_data_rejects_undated_text() {
        let value = extract_bill_data("GOMEZ MARIA LAURA\nTOTAL $100,00", "x.pdf").unwrap();
        assert!(value.is_null());
    }

    #[wasm_bindgen_test]
    fn test_extractor_from_config() {
        let extractor = BillExtractor::new(Some(r#"{"layout": {"line_tolerance": 5}}"#.into()));
        assert!(extractor.is_ok());
        assert!(BillExtractor::new(Some("not json".into())).is_err());
    }
}
