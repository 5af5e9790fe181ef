//! Client name heuristic.
//!
//! Bills carry no "client name" label. The account holder is printed near
//! the top as a short all-caps line, so the extractor accepts the first
//! line with that shape that is not company, address or header boilerplate.

use tracing::trace;

use super::patterns::{CLIENT_NAME_SHAPE, COMPANY_BOILERPLATE, WHITESPACE_RUN};
use super::FieldExtractor;
use crate::models::config::ClientNameConfig;

/// Terms that disqualify a candidate line.
pub const DENYLIST: &[&str] = &[
    "EMPRESA", "ENERGÍA", "ENERGIA", "I.V.A", "RESPONSABLE",
    "MALABIA", "ROSARIO", "CONSUMIDOR", "FRANCISCO", "SANTA FE",
    "BOULEVAR", "CODIGO", "LINK PAGOS", "NUMERO", "NÚMERO",
    "FECHA", "CUIT", "PROPIETARIO", "DIRECCIÓN", "DIRECCION",
    "INFORMACION", "INFORMACIÓN", "MEDICION", "MEDICIÓN",
];

/// Client name extractor.
#[derive(Debug, Clone)]
pub struct ClientNameExtractor {
    config: ClientNameConfig,
}

impl ClientNameExtractor {
    pub fn new() -> Self {
        Self::from_config(ClientNameConfig::default())
    }

    pub fn from_config(config: ClientNameConfig) -> Self {
        Self { config }
    }

    /// Normalize a raw line into a candidate name.
    fn clean(line: &str) -> String {
        let collapsed = WHITESPACE_RUN.replace_all(line, " ");
        COMPANY_BOILERPLATE
            .replace(&collapsed, "")
            .trim()
            .to_string()
    }

    /// Whether a cleaned line has the shape of a client name.
    pub fn accepts(&self, cleaned: &str) -> bool {
        let words = cleaned.split(' ').filter(|w| !w.is_empty()).count();
        let length = cleaned.chars().count();

        (self.config.min_words..=self.config.max_words).contains(&words)
            && (self.config.min_length..=self.config.max_length).contains(&length)
            && CLIENT_NAME_SHAPE.is_match(cleaned)
            && !DENYLIST.iter().any(|term| cleaned.contains(term))
            && !self
                .config
                .extra_denylist
                .iter()
                .any(|term| cleaned.contains(term.as_str()))
    }
}

impl Default for ClientNameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for ClientNameExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<String> {
        text.split('\n')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(self.config.scan_lines)
            .map(Self::clean)
            .find(|cleaned| {
                let ok = self.accepts(cleaned);
                trace!("Client name candidate {:?}: {}", cleaned, ok);
                ok
            })
    }
}

/// Title-case a name for display (`JUAN PEREZ` becomes `Juan Perez`).
pub fn title_case(name: &str) -> String {
    name.to_lowercase()
        .split(' ')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picks_first_name_shaped_line() {
        let text = "EMPRESA PROVINCIAL DE LA ENERGIA\n\
                    Factura B\n\
                    GOMEZ MARIA LAURA\n\
                    PEREZ JUAN\n";
        assert_eq!(
            ClientNameExtractor::new().extract(text),
            Some("GOMEZ MARIA LAURA".to_string())
        );
    }

    #[test]
    fn test_strips_company_suffix_and_whitespace() {
        let text = "  NUÑEZ   JOSÉ ÁNGEL   Empresa Provincial de la Energía de Santa Fe\n";
        assert_eq!(
            ClientNameExtractor::new().extract(text),
            Some("NUÑEZ JOSÉ ÁNGEL".to_string())
        );
    }

    #[test]
    fn test_rejects_denylisted_terms() {
        let extractor = ClientNameExtractor::new();
        assert!(!extractor.accepts("CONSUMIDOR FINAL"));
        assert!(!extractor.accepts("BOULEVARD OROÑO"));
        assert!(!extractor.accepts("FECHA DE EMISION"));
        assert!(extractor.accepts("LOPEZ CARLOS"));
    }

    #[test]
    fn test_word_and_length_bounds() {
        let extractor = ClientNameExtractor::new();
        assert!(!extractor.accepts("GARCIAPEREZ"));
        assert!(!extractor.accepts("AB CD"));
        assert!(!extractor.accepts("UNO DOS TRES CUATRO CINCO SEIS"));
        assert!(extractor.accepts("UNO DOS TRES CUATRO CINCO"));
    }

    #[test]
    fn test_exact_length_limits() {
        let extractor = ClientNameExtractor::new();
        assert!(!extractor.accepts("ANA LUZ"));
        assert!(extractor.accepts("ANA LUZA"));

        let fifty = format!("{} {}", "A".repeat(24), "B".repeat(25));
        let fifty_one = format!("{} {}", "A".repeat(24), "B".repeat(26));
        assert_eq!(fifty.chars().count(), 50);
        assert!(extractor.accepts(&fifty));
        assert!(!extractor.accepts(&fifty_one));
    }

    #[test]
    fn test_length_counts_characters() {
        // 8 characters, 11 bytes
        let extractor = ClientNameExtractor::new();
        assert!(extractor.accepts("ÑANDÚ ÁÉ"));
        assert!(!extractor.accepts("ÑAN ÚÉÍ"));
    }

    #[test]
    fn test_only_scans_configured_window() {
        let mut text = String::new();
        for i in 0..30 {
            text.push_str(&format!("linea {}\n", i));
        }
        text.push_str("PEREZ JUAN\n");

        assert_eq!(ClientNameExtractor::new().extract(&text), None);

        let wider = ClientNameExtractor::from_config(ClientNameConfig {
            scan_lines: 31,
            ..ClientNameConfig::default()
        });
        assert_eq!(wider.extract(&text), Some("PEREZ JUAN".to_string()));
    }

    #[test]
    fn test_extra_denylist() {
        let extractor = ClientNameExtractor::from_config(ClientNameConfig {
            extra_denylist: vec!["FACTURA".to_string()],
            ..ClientNameConfig::default()
        });
        assert!(!extractor.accepts("FACTURA ORIGINAL"));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("GOMEZ MARIA LAURA"), "Gomez Maria Laura");
        assert_eq!(title_case("ÁLVAREZ ÑANDÚ"), "Álvarez Ñandú");
    }
}
