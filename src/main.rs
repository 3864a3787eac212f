//! # Etiquetador CLI
//!
//! Command-line interface for batch QR label compositing.
//!
//! ## Usage
//!
//! ```bash
//! # Render one file per manifest row into a directory
//! etiquetador render --csv manifiesto.csv --assets qrs/ --template plantilla.json --out salida/
//!
//! # Same batch, packaged as a single ZIP
//! etiquetador zip --csv manifiesto.csv --template plantilla.json --out etiquetas.zip
//!
//! # Multi-page print PDF with crop marks
//! etiquetador print-pdf --assets qrs/ --template plantilla.json --out imprenta.pdf
//!
//! # Emit a sample manifest to fill in
//! etiquetador template-csv
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use etiquetador::{
    EtiquetadorError, batch,
    batch::ProcessResult,
    manifest::{self, HeaderMap},
    template::{RenderOptions, TemplateDef},
    workitem, AssetIndex,
};

/// Etiquetador - batch QR label compositor
#[derive(Parser, Debug)]
#[command(name = "etiquetador")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render one output file per item into a directory
    Render {
        #[command(flatten)]
        job: JobArgs,

        /// Output directory
        #[arg(long, default_value = "salida")]
        out: PathBuf,
    },

    /// Render the batch and package it as a flat ZIP archive
    Zip {
        #[command(flatten)]
        job: JobArgs,

        /// Output ZIP path
        #[arg(long, default_value = "etiquetas.zip")]
        out: PathBuf,
    },

    /// Render the batch as one multi-page print PDF with crop marks
    PrintPdf {
        #[command(flatten)]
        job: JobArgs,

        /// Output PDF path
        #[arg(long, default_value = "imprenta.pdf")]
        out: PathBuf,
    },

    /// Print a sample CSV manifest to stdout
    TemplateCsv,
}

/// Inputs shared by every batch subcommand.
#[derive(Args, Debug)]
struct JobArgs {
    /// CSV manifest path (omit to process every asset in --assets)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Directory of pre-generated QR images (PNG/SVG)
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Template JSON config path
    #[arg(long)]
    template: PathBuf,

    /// CSV header carrying the numero
    #[arg(long, default_value = "numero")]
    col_numero: String,

    /// CSV header carrying the link to encode
    #[arg(long, default_value = "enlace")]
    col_enlace: String,

    /// CSV header carrying the output file name
    #[arg(long, default_value = "nombreArchivoSalida")]
    col_nombre: String,

    /// Label text color as #rrggbb
    #[arg(long, default_value = "#000000")]
    text_color: String,

    /// Label font pixel height (defaults to 60% of the label box)
    #[arg(long)]
    font_size: Option<u32>,

    /// Synthesized-bold label text
    #[arg(long)]
    bold: bool,

    /// Skip the opaque label background fill
    #[arg(long)]
    transparent_background: bool,
}

/// Everything a batch run needs, loaded from disk.
struct Job {
    work_items: Vec<etiquetador::WorkItem>,
    index: AssetIndex,
    template: TemplateDef,
    options: RenderOptions,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), EtiquetadorError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render { job, out } => {
            let job = load_job(&job)?;
            let results =
                batch::process_items(&job.work_items, &job.index, &job.template, &job.options, &out)?;
            summarize(&results);
        }
        Commands::Zip { job, out } => {
            let job = load_job(&job)?;
            let (archive, results) =
                batch::export_zip(&job.work_items, &job.index, &job.template, &job.options)?;
            std::fs::write(&out, archive)?;
            println!("Wrote {}", out.display());
            summarize(&results);
        }
        Commands::PrintPdf { job, out } => {
            let job = load_job(&job)?;
            let (pdf, results) =
                batch::export_print_pdf(&job.work_items, &job.index, &job.template, &job.options)?;
            std::fs::write(&out, pdf)?;
            println!("Wrote {}", out.display());
            summarize(&results);
        }
        Commands::TemplateCsv => {
            print!("{}", manifest::template_csv(None));
        }
    }

    Ok(())
}

fn load_job(args: &JobArgs) -> Result<Job, EtiquetadorError> {
    let index = match &args.assets {
        Some(dir) => AssetIndex::from_dir(dir)?,
        None => AssetIndex::default(),
    };

    let items = match &args.csv {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let header_map = HeaderMap {
                numero: args.col_numero.clone(),
                enlace: args.col_enlace.clone(),
                nombre_archivo_salida: args.col_nombre.clone(),
            };
            Some(manifest::parse_items(&text, &header_map)?)
        }
        None => None,
    };

    if items.is_none() && args.assets.is_none() {
        return Err(EtiquetadorError::Manifest(
            "nothing to process: pass --csv, --assets, or both".to_string(),
        ));
    }

    let work_items = workitem::resolve_work_items(items.as_deref(), &index);
    let template = TemplateDef::from_config_file(&args.template)?;
    let options = RenderOptions {
        text_color: args.text_color.clone(),
        transparent_background: args.transparent_background,
        font_size: args.font_size,
        bold: args.bold,
    };

    Ok(Job {
        work_items,
        index,
        template,
        options,
    })
}

fn summarize(results: &[ProcessResult]) {
    let ok = results.iter().filter(|r| r.is_ok()).count();
    let failed = results.len() - ok;
    for result in results.iter().filter(|r| !r.is_ok()) {
        eprintln!("{}", result);
    }
    println!("{} processed, {} failed", ok, failed);
}
