//! # Batch Processing
//!
//! Runs the render/export pipeline over a resolved work list. Items are
//! processed strictly in list order; one failing item never aborts the
//! batch, it is reported in that item's [`ProcessResult`] and the run
//! continues. Every batch flavor reports one result per work item.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::assets::AssetIndex;
use crate::error::Result;
use crate::export::print_pdf::PrintPdfBuilder;
use crate::export::{self, ExportFormat};
use crate::render;
use crate::template::{RenderOptions, TemplateDef};
use crate::workitem::WorkItem;

/// A finished output with the file name it should be delivered under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedBlob {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Terminal state of one work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "status", content = "detail")]
pub enum Outcome {
    Ok,
    Error(String),
}

/// Per-item batch report: the work item plus how it ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessResult {
    #[serde(flatten)]
    pub work_item: WorkItem,
    pub outcome: Outcome,
}

impl ProcessResult {
    pub fn is_ok(&self) -> bool {
        self.outcome == Outcome::Ok
    }
}

impl fmt::Display for ProcessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Ok => write!(f, "{}: ok", self.work_item.nombre_archivo_salida),
            Outcome::Error(detail) => {
                write!(f, "{}: error: {detail}", self.work_item.nombre_archivo_salida)
            }
        }
    }
}

/// Output file name for a work item in the given format.
pub fn output_file_name(work_item: &WorkItem, format: ExportFormat) -> String {
    format!("{}.{}", work_item.nombre_archivo_salida, format.extension())
}

/// Render and encode one work item.
fn produce(
    work_item: &WorkItem,
    index: &AssetIndex,
    template: &TemplateDef,
    options: &RenderOptions,
) -> Result<Vec<u8>> {
    let prepared = template.prepare_for_item(&work_item.item);
    let canvas = render::render_item(&work_item.item, index, &prepared, options)?;
    export::export_item(&canvas, template.export_format)
}

/// Process the work list and write one file per item into `out_dir`.
///
/// Creating the directory is a construction failure and aborts; everything
/// per-item (render, encode, write) lands in that item's result.
pub fn process_items(
    work_items: &[WorkItem],
    index: &AssetIndex,
    template: &TemplateDef,
    options: &RenderOptions,
    out_dir: impl AsRef<Path>,
) -> Result<Vec<ProcessResult>> {
    let out_dir = out_dir.as_ref();
    std::fs::create_dir_all(out_dir)?;

    let mut results = Vec::with_capacity(work_items.len());
    for work_item in work_items {
        let outcome = match produce(work_item, index, template, options) {
            Ok(bytes) => {
                let path = out_dir.join(output_file_name(work_item, template.export_format));
                match std::fs::write(&path, &bytes) {
                    Ok(()) => Outcome::Ok,
                    Err(e) => Outcome::Error(format!("write {}: {e}", path.display())),
                }
            }
            Err(e) => Outcome::Error(e.to_string()),
        };
        report(work_item, &outcome);
        results.push(ProcessResult {
            work_item: work_item.clone(),
            outcome,
        });
    }
    Ok(results)
}

/// Process the work list into in-memory outputs, one blob per successful
/// item. Failed items are reported in the results but produce no blob, so
/// downstream packaging never carries placeholders for broken outputs.
pub fn process_items_to_blobs(
    work_items: &[WorkItem],
    index: &AssetIndex,
    template: &TemplateDef,
    options: &RenderOptions,
) -> Result<(Vec<NamedBlob>, Vec<ProcessResult>)> {
    let mut blobs = Vec::with_capacity(work_items.len());
    let mut results = Vec::with_capacity(work_items.len());
    for work_item in work_items {
        let outcome = match produce(work_item, index, template, options) {
            Ok(bytes) => {
                blobs.push(NamedBlob {
                    name: output_file_name(work_item, template.export_format),
                    bytes,
                });
                Outcome::Ok
            }
            Err(e) => Outcome::Error(e.to_string()),
        };
        report(work_item, &outcome);
        results.push(ProcessResult {
            work_item: work_item.clone(),
            outcome,
        });
    }
    Ok((blobs, results))
}

/// Process the work list and package successful items as a flat ZIP.
pub fn export_zip(
    work_items: &[WorkItem],
    index: &AssetIndex,
    template: &TemplateDef,
    options: &RenderOptions,
) -> Result<(Vec<u8>, Vec<ProcessResult>)> {
    let (blobs, results) = process_items_to_blobs(work_items, index, template, options)?;
    let archive = export::archive::create_zip(&blobs)?;
    Ok((archive, results))
}

/// Render the work list into one multi-page print PDF with crop marks.
///
/// A failing item contributes no page but still gets an error result, so
/// page order matches the successful subsequence of the work list.
pub fn export_print_pdf(
    work_items: &[WorkItem],
    index: &AssetIndex,
    template: &TemplateDef,
    options: &RenderOptions,
) -> Result<(Vec<u8>, Vec<ProcessResult>)> {
    let mut builder = PrintPdfBuilder::new();
    let mut results = Vec::with_capacity(work_items.len());
    for work_item in work_items {
        let prepared = template.prepare_for_item(&work_item.item);
        let outcome = match render::render_item(&work_item.item, index, &prepared, options)
            .and_then(|canvas| builder.add_page(&canvas))
        {
            Ok(()) => Outcome::Ok,
            Err(e) => Outcome::Error(e.to_string()),
        };
        report(work_item, &outcome);
        results.push(ProcessResult {
            work_item: work_item.clone(),
            outcome,
        });
    }
    info!(pages = builder.page_count(), "print PDF assembled");
    Ok((builder.finish(), results))
}

fn report(work_item: &WorkItem, outcome: &Outcome) {
    match outcome {
        Outcome::Ok => info!(numero = %work_item.numero_key(), "item processed"),
        Outcome::Error(detail) => {
            warn!(numero = %work_item.numero_key(), detail, "item failed");
        }
    }
}
