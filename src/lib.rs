pub mod builders;
pub mod bundle;
pub mod cli;
pub mod diagnostics;
pub mod error;
pub mod ingest;
pub mod resolve;
pub mod schema;
pub mod table;
pub mod transform;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::cli::{Cli, Commands, InspectArgs};
use crate::diagnostics::CategoryDiagnostics;

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("school_bundle", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Build(args) => bundle::execute(&args),
        Commands::Inspect(args) => handle_inspect(&args),
    }
}

fn handle_inspect(args: &InspectArgs) -> Result<()> {
    let category = args.category.category();
    info!(
        "Inspecting '{}' against the {} schema",
        args.input.display(),
        category.label()
    );
    let raw = ingest::load_table(&args.input, args.delimiter)
        .with_context(|| format!("Reading {:?}", args.input))?;
    let spec = category.spec();
    let bindings = resolve::resolve(&raw.headers, &spec);
    let diags = CategoryDiagnostics::from_bindings(
        category.label(),
        source_name(&args.input),
        raw.rows.len(),
        &bindings,
    );
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&diags).context("Serializing diagnostics to JSON")?
        );
    } else {
        println!("{} row(s) read", diags.rows_read);
        table::print_table(&diagnostics::table_headers(), &diags.table_rows());
    }
    Ok(())
}

pub(crate) fn source_name(path: &std::path::Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
