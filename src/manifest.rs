//! # Manifest Ingestion
//!
//! Parses the CSV manifest into [`Item`]s. The manifest carries one row per
//! artifact: an identity number, an optional link to encode as a QR, and an
//! optional output file name. Column headers are user-remappable through
//! [`HeaderMap`].
//!
//! Rows without a usable numero are dropped with a warning; malformed rows
//! never abort the batch.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::error::{EtiquetadorError, Result};

/// The identity value of a manifest row.
///
/// Plain integer text without leading zeros is treated numerically; every
/// other form (leading zeros, mixed alphanumerics) is kept as the literal
/// trimmed string so that identifiers like `"0123"` or `"A-7"` survive
/// round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numero {
    Int(i64),
    Text(String),
}

impl Numero {
    /// Parse raw CSV text into a `Numero`.
    pub fn parse(raw: &str) -> Numero {
        let trimmed = raw.trim();
        if is_plain_integer(trimmed) {
            if let Ok(n) = trimmed.parse::<i64>() {
                return Numero::Int(n);
            }
        }
        Numero::Text(trimmed.to_string())
    }

    /// Normalized string form used as the identity key everywhere.
    pub fn key(&self) -> String {
        match self {
            Numero::Int(n) => n.to_string(),
            Numero::Text(s) => s.trim().to_string(),
        }
    }
}

impl fmt::Display for Numero {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Integer-looking text without leading zeros (`"45"`, `"-3"`, `"0"`,
/// but not `"045"` or `"1a"`).
fn is_plain_integer(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    // leading zero followed by more digits means the zeros are significant
    !(digits.len() > 1 && digits.starts_with('0'))
}

/// One manifest row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub numero: Numero,
    /// URL to encode when no uploaded QR matches; may be empty.
    pub enlace: String,
    /// Desired output base name; may be empty (resolved later).
    pub nombre_archivo_salida: String,
}

impl Item {
    pub fn numero_key(&self) -> String {
        self.numero.key()
    }
}

/// Maps the semantic manifest fields to the actual CSV header labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderMap {
    pub numero: String,
    pub enlace: String,
    pub nombre_archivo_salida: String,
}

impl Default for HeaderMap {
    fn default() -> Self {
        Self {
            numero: "numero".to_string(),
            enlace: "enlace".to_string(),
            nombre_archivo_salida: "nombreArchivoSalida".to_string(),
        }
    }
}

/// Parse CSV text into manifest items.
///
/// The first row is the header. Values are trimmed. Rows with an empty or
/// missing numero are skipped with a warning (the batch favors completeness
/// over strictness). A missing numero *column* yields an empty item list.
pub fn parse_items(csv_text: &str, header_map: &HeaderMap) -> Result<Vec<Item>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| EtiquetadorError::Manifest(format!("failed to read CSV header: {e}")))?
        .clone();

    let column = |label: &str| headers.iter().position(|h| h == label);

    let numero_col = match column(&header_map.numero) {
        Some(idx) => idx,
        None => {
            warn!(column = %header_map.numero, "numero column not found in CSV header");
            return Ok(Vec::new());
        }
    };
    let enlace_col = column(&header_map.enlace);
    let nombre_col = column(&header_map.nombre_archivo_salida);

    let mut items = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                warn!(row = line + 2, error = %e, "row skipped: unreadable CSV record");
                continue;
            }
        };
        let field = |idx: Option<usize>| -> String {
            idx.and_then(|i| record.get(i))
                .unwrap_or_default()
                .trim()
                .to_string()
        };
        let numero_raw = field(Some(numero_col));
        if numero_raw.is_empty() {
            warn!(row = line + 2, "row skipped: missing numero");
            continue;
        }
        items.push(Item {
            numero: Numero::parse(&numero_raw),
            enlace: field(enlace_col),
            nombre_archivo_salida: field(nombre_col),
        });
    }
    Ok(items)
}

/// Ordered header labels of a CSV manifest, for column remapping UIs.
pub fn csv_headers(csv_text: &str) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(csv_text.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| EtiquetadorError::Manifest(format!("failed to read CSV header: {e}")))?;
    Ok(headers.iter().map(|h| h.trim().to_string()).collect())
}

/// Produce a sample manifest with one example row, using the given headers
/// or the canonical ones.
pub fn template_csv(headers: Option<&[String]>) -> String {
    let defaults = HeaderMap::default();
    let canonical = [
        defaults.numero.as_str(),
        defaults.enlace.as_str(),
        defaults.nombre_archivo_salida.as_str(),
    ];
    let labels: Vec<&str> = match headers {
        Some(h) if !h.is_empty() => h.iter().map(|s| s.as_str()).collect(),
        _ => canonical.to_vec(),
    };
    let example: Vec<&str> = labels
        .iter()
        .map(|&label| {
            if label == defaults.numero {
                "123"
            } else if label == defaults.enlace {
                "https://example.com"
            } else {
                "nombre-salida"
            }
        })
        .collect();
    format!("{}\n{}\n", labels.join(","), example.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn numero_plain_integer_is_numeric() {
        assert_eq!(Numero::parse("123"), Numero::Int(123));
        assert_eq!(Numero::parse(" -7 "), Numero::Int(-7));
        assert_eq!(Numero::parse("0"), Numero::Int(0));
    }

    #[test]
    fn numero_leading_zeros_kept_as_text() {
        assert_eq!(Numero::parse("045"), Numero::Text("045".to_string()));
        assert_eq!(Numero::parse("-012"), Numero::Text("-012".to_string()));
    }

    #[test]
    fn numero_mixed_text_kept_verbatim() {
        assert_eq!(Numero::parse(" A-7 "), Numero::Text("A-7".to_string()));
    }

    #[test]
    fn numero_key_is_trimmed_string_form() {
        assert_eq!(Numero::Int(45).key(), "45");
        assert_eq!(Numero::Text(" 045 ".to_string()).key(), "045");
    }

    #[test]
    fn parse_items_basic() {
        let csv = "numero,enlace,nombreArchivoSalida\n123,https://x.test,salida\n";
        let items = parse_items(csv, &HeaderMap::default()).unwrap();
        assert_eq!(
            items,
            vec![Item {
                numero: Numero::Int(123),
                enlace: "https://x.test".to_string(),
                nombre_archivo_salida: "salida".to_string(),
            }]
        );
    }

    #[test]
    fn parse_items_trims_values() {
        let csv = "numero,enlace,nombreArchivoSalida\n 42 , https://y.test , nombre \n";
        let items = parse_items(csv, &HeaderMap::default()).unwrap();
        assert_eq!(items[0].numero, Numero::Int(42));
        assert_eq!(items[0].enlace, "https://y.test");
        assert_eq!(items[0].nombre_archivo_salida, "nombre");
    }

    #[test]
    fn parse_items_skips_rows_without_numero() {
        let csv = "numero,enlace,nombreArchivoSalida\n,https://a.test,x\n7,https://b.test,y\n";
        let items = parse_items(csv, &HeaderMap::default()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].numero, Numero::Int(7));
    }

    #[test]
    fn parse_items_missing_optional_columns() {
        let csv = "numero\n5\n";
        let items = parse_items(csv, &HeaderMap::default()).unwrap();
        assert_eq!(items[0].enlace, "");
        assert_eq!(items[0].nombre_archivo_salida, "");
    }

    #[test]
    fn parse_items_missing_numero_column_yields_empty() {
        let csv = "id,enlace\n1,https://x.test\n";
        let items = parse_items(csv, &HeaderMap::default()).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn parse_items_remapped_headers() {
        let csv = "ID,URL,Nombre\n9,https://z.test,etiqueta\n";
        let map = HeaderMap {
            numero: "ID".to_string(),
            enlace: "URL".to_string(),
            nombre_archivo_salida: "Nombre".to_string(),
        };
        let items = parse_items(csv, &map).unwrap();
        assert_eq!(items[0].numero, Numero::Int(9));
        assert_eq!(items[0].enlace, "https://z.test");
        assert_eq!(items[0].nombre_archivo_salida, "etiqueta");
    }

    #[test]
    fn csv_headers_preserve_order() {
        let csv = "c,a,b\n1,2,3\n";
        assert_eq!(csv_headers(csv).unwrap(), vec!["c", "a", "b"]);
    }

    #[test]
    fn template_csv_round_trips_through_parser() {
        let text = template_csv(None);
        let items = parse_items(&text, &HeaderMap::default()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].numero, Numero::Int(123));
        assert_eq!(items[0].enlace, "https://example.com");
        assert_eq!(items[0].nombre_archivo_salida, "nombre-salida");
    }

    #[test]
    fn template_csv_with_custom_headers() {
        let headers = vec!["numero".to_string(), "otra".to_string()];
        let text = template_csv(Some(&headers));
        assert!(text.starts_with("numero,otra\n"));
        assert!(text.contains("123"));
    }
}
