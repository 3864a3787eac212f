//! # Work Item Resolution
//!
//! Merges parsed manifest items with the asset index into the canonical,
//! deduplicated, ordered batch. Work lists are always rebuilt from their
//! source collections, never patched in place.

use serde::Serialize;
use tracing::warn;

use crate::assets::AssetIndex;
use crate::manifest::{Item, Numero};

/// Where the QR raster for a work item comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QrOrigin {
    /// A matching uploaded asset exists.
    Uploaded,
    /// The QR will be generated from the item's enlace.
    Generated,
}

/// An [`Item`] extended with its resolved output name and QR source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkItem {
    #[serde(flatten)]
    pub item: Item,
    /// Resolved output base name: CSV value → asset base name → numero key.
    pub nombre_archivo_salida: String,
    pub origin: QrOrigin,
    /// Matched asset's original filename, when one exists.
    pub qr_file_name: Option<String>,
}

impl WorkItem {
    pub fn numero_key(&self) -> String {
        self.item.numero_key()
    }
}

/// Build the ordered work list.
///
/// With manifest items present, rows are taken in CSV order; rows with an
/// empty numero key or a key already seen in this run are dropped with a
/// warning (first occurrence wins). Without items, every indexed asset
/// becomes a work item in index order, with an empty enlace — in that mode
/// the QR must be asset-backed since there is no link to regenerate from.
pub fn resolve_work_items(csv_items: Option<&[Item]>, index: &AssetIndex) -> Vec<WorkItem> {
    let mut work_items = Vec::new();

    match csv_items {
        Some(items) if !items.is_empty() => {
            let mut seen = std::collections::HashSet::new();
            for item in items {
                let numero_key = item.numero_key();
                if numero_key.is_empty() {
                    warn!("item skipped: empty numero key");
                    continue;
                }
                if !seen.insert(numero_key.clone()) {
                    warn!(numero = %numero_key, "duplicate numero in CSV, keeping the first row");
                    continue;
                }
                let existing = index.get(&numero_key);
                let nombre = {
                    let explicit = item.nombre_archivo_salida.trim();
                    if !explicit.is_empty() {
                        explicit.to_string()
                    } else if let Some(asset) = existing {
                        asset.base_name.clone()
                    } else {
                        numero_key.clone()
                    }
                };
                work_items.push(WorkItem {
                    item: item.clone(),
                    nombre_archivo_salida: nombre,
                    origin: if existing.is_some() {
                        QrOrigin::Uploaded
                    } else {
                        QrOrigin::Generated
                    },
                    qr_file_name: existing.map(|a| a.file_name.clone()),
                });
            }
        }
        _ => {
            for asset in index.iter() {
                work_items.push(WorkItem {
                    item: Item {
                        numero: Numero::parse(&asset.key),
                        enlace: String::new(),
                        nombre_archivo_salida: asset.base_name.clone(),
                    },
                    nombre_archivo_salida: asset.base_name.clone(),
                    origin: QrOrigin::Uploaded,
                    qr_file_name: Some(asset.file_name.clone()),
                });
            }
        }
    }

    work_items
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(numero: &str, enlace: &str, nombre: &str) -> Item {
        Item {
            numero: Numero::parse(numero),
            enlace: enlace.to_string(),
            nombre_archivo_salida: nombre.to_string(),
        }
    }

    fn index_of(names: &[&str]) -> AssetIndex {
        AssetIndex::from_files(names.iter().map(|n| (n.to_string(), vec![0u8; 4])))
    }

    #[test]
    fn generated_item_falls_back_to_numero_key() {
        let items = vec![item("123", "https://x.test", "")];
        let work = resolve_work_items(Some(&items), &AssetIndex::default());
        assert_eq!(work.len(), 1);
        assert_eq!(work[0].origin, QrOrigin::Generated);
        assert_eq!(work[0].nombre_archivo_salida, "123");
        assert_eq!(work[0].qr_file_name, None);
    }

    #[test]
    fn uploaded_asset_wins_even_with_enlace() {
        let items = vec![item("45", "https://x.test", "")];
        let index = index_of(&["LOTE-045.png"]);
        let work = resolve_work_items(Some(&items), &index);
        assert_eq!(work[0].origin, QrOrigin::Uploaded);
        assert_eq!(work[0].qr_file_name.as_deref(), Some("LOTE-045.png"));
        // no explicit CSV name: the asset base name becomes the output name
        assert_eq!(work[0].nombre_archivo_salida, "LOTE");
    }

    #[test]
    fn explicit_csv_name_takes_precedence() {
        let items = vec![item("45", "", " etiqueta ")];
        let index = index_of(&["LOTE-045.png"]);
        let work = resolve_work_items(Some(&items), &index);
        assert_eq!(work[0].nombre_archivo_salida, "etiqueta");
    }

    #[test]
    fn duplicate_numeros_keep_first_row() {
        let items = vec![
            item("7", "https://a.test", "primero"),
            item("7", "https://b.test", "segundo"),
            item("8", "https://c.test", ""),
        ];
        let work = resolve_work_items(Some(&items), &AssetIndex::default());
        assert_eq!(work.len(), 2);
        assert_eq!(work[0].nombre_archivo_salida, "primero");
        assert_eq!(work[1].numero_key(), "8");
    }

    #[test]
    fn every_key_appears_exactly_once() {
        let items = vec![
            item("1", "", ""),
            item("2", "", ""),
            item("1", "", ""),
            item("2", "", ""),
            item("3", "", ""),
        ];
        let work = resolve_work_items(Some(&items), &AssetIndex::default());
        let keys: Vec<String> = work.iter().map(|w| w.numero_key()).collect();
        assert_eq!(keys, vec!["1", "2", "3"]);
    }

    #[test]
    fn fallback_mode_enumerates_assets_in_order() {
        let index = index_of(&["5-a.png", "2-b.png"]);
        let work = resolve_work_items(None, &index);
        assert_eq!(work.len(), 2);
        assert_eq!(work[0].numero_key(), "5");
        assert_eq!(work[1].numero_key(), "2");
        assert!(work.iter().all(|w| w.origin == QrOrigin::Uploaded));
        assert!(work.iter().all(|w| w.item.enlace.is_empty()));
    }

    #[test]
    fn empty_item_slice_behaves_like_fallback() {
        let index = index_of(&["11.png"]);
        let work = resolve_work_items(Some(&[]), &index);
        assert_eq!(work.len(), 1);
        assert_eq!(work[0].numero_key(), "11");
    }

    #[test]
    fn csv_order_is_preserved() {
        let items = vec![item("30", "", ""), item("10", "", ""), item("20", "", "")];
        let work = resolve_work_items(Some(&items), &AssetIndex::default());
        let keys: Vec<String> = work.iter().map(|w| w.numero_key()).collect();
        assert_eq!(keys, vec!["30", "10", "20"]);
    }
}
