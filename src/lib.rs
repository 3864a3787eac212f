//! # Etiquetador - Batch QR Label Compositor
//!
//! Etiquetador produces print-ready artifacts by compositing a per-row QR
//! code and a text label onto a base template image, driven by a CSV
//! manifest and an optional folder of pre-generated QR images. It provides:
//!
//! - **Manifest ingestion**: CSV parsing with remappable columns
//! - **Asset indexing**: filename-keyed lookup of uploaded PNG/SVG QR files
//! - **Compositing**: template base + QR + centered label onto a raster canvas
//! - **Export**: individual PNG/PDF files, a flat ZIP archive, or a
//!   multi-page print PDF with bleed-aware crop marks
//!
//! ## Quick Start
//!
//! ```no_run
//! use etiquetador::{
//!     assets::AssetIndex,
//!     batch,
//!     manifest::{self, HeaderMap},
//!     template::{RenderOptions, TemplateDef},
//! };
//!
//! let csv_text = std::fs::read_to_string("manifiesto.csv")?;
//! let items = manifest::parse_items(&csv_text, &HeaderMap::default())?;
//! let index = AssetIndex::from_dir("qrs/")?;
//! let work_items = etiquetador::workitem::resolve_work_items(Some(&items), &index);
//!
//! let template = TemplateDef::from_config_file("plantilla.json")?;
//! let options = RenderOptions::default();
//!
//! let results = batch::process_items(&work_items, &index, &template, &options, "salida/")?;
//! for result in &results {
//!     println!("{}", result);
//! }
//! # Ok::<(), etiquetador::EtiquetadorError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`manifest`] | CSV manifest parsing and header remapping |
//! | [`assets`] | QR asset indexing keyed by numero |
//! | [`workitem`] | Manifest/asset reconciliation into work items |
//! | [`template`] | Template definitions and per-item instantiation |
//! | [`render`] | Compositing work items onto raster canvases |
//! | [`export`] | PNG/PDF encoding, print PDF, ZIP packaging |
//! | [`batch`] | Sequential batch orchestration with per-item outcomes |
//! | [`error`] | Error types |

pub mod assets;
pub mod batch;
pub mod error;
pub mod export;
pub mod manifest;
pub mod render;
pub mod template;
pub mod workitem;

// Re-exports for convenience
pub use assets::AssetIndex;
pub use error::EtiquetadorError;
pub use template::{RenderOptions, TemplateDef};
pub use workitem::WorkItem;
