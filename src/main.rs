//! pxdb CLI - Command-line tool for inspecting Paradox tables.
//!
//! This is the main entry point for the pxdb command-line application.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::debug;

use pxdb::prelude::*;

/// pxdb - Paradox table inspection tool
#[derive(Parser)]
#[command(name = "pxdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show header and schema of a table
    Info {
        /// Path to the .DB file
        table: PathBuf,

        /// Fail when field widths disagree with the header's record size
        #[arg(long, env = "PXDB_STRICT")]
        strict: bool,

        /// Print header and fields as a JSON object
        #[arg(long)]
        json: bool,
    },

    /// Print the records of a table
    Dump {
        /// Path to the .DB file
        table: PathBuf,

        /// Fail when field widths disagree with the header's record size
        #[arg(long, env = "PXDB_STRICT")]
        strict: bool,

        /// Maximum number of records to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// Index of the first record to print
        #[arg(short, long, default_value_t = 0)]
        offset: usize,

        /// Print one JSON object per record
        #[arg(long)]
        json: bool,

        /// Companion blob file (defaults to NAME.MB next to the table)
        #[arg(long, conflicts_with = "no_blob")]
        blob: Option<PathBuf>,

        /// Do not read a companion blob file
        #[arg(long)]
        no_blob: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { table, strict, json } => {
            cmd_info(&table, strict, json)?;
        }
        Commands::Dump {
            table,
            strict,
            limit,
            offset,
            json,
            blob,
            no_blob,
        } => {
            let mut options = OpenOptions::new().strict(strict);
            if let Some(blob) = blob {
                options = options.blob_file(blob);
            } else if no_blob {
                options = options.no_blob_file();
            }
            cmd_dump(&table, &options, offset, limit, json)?;
        }
    }

    Ok(())
}

fn open_table(path: &Path, options: &OpenOptions) -> Result<Document> {
    let start = Instant::now();
    let doc = Document::open_with(path, options)
        .with_context(|| format!("Failed to open table {}", path.display()))?;
    debug!("Loaded {} in {:?}", path.display(), start.elapsed());
    Ok(doc)
}

fn cmd_info(path: &Path, strict: bool, json: bool) -> Result<()> {
    let doc = open_table(path, &OpenOptions::new().strict(strict))?;
    let header = doc.header();

    if json {
        let layout = match doc.block_layout() {
            BlockLayout::Empty => serde_json::json!("empty"),
            BlockLayout::Contiguous { blocks, .. } => serde_json::json!({ "contiguous": blocks }),
            BlockLayout::Fragmented { reason } => serde_json::json!({ "fragmented": reason }),
        };
        let info = serde_json::json!({
            "table": doc.table_name(),
            "header": header,
            "layout": layout,
            "fields": doc.fields(),
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Table:        {}", doc.table_name());
    println!("File:         {}", path.display());
    println!(
        "Version:      {}.{}",
        doc.file_version() / 10,
        doc.file_version() % 10
    );
    println!("Type:         {}", header.file_type.name());
    println!(
        "Code page:    {} ({})",
        doc.code_page().id(),
        doc.code_page().label()
    );
    println!("Records:      {}", doc.num_records());
    println!("Record size:  {} bytes", doc.record_size());
    println!("Header size:  {} bytes", doc.header_size());
    println!("Block size:   {} bytes", header.block_size);
    println!("Primary key:  {} fields", header.primary_key_fields);
    match doc.block_layout() {
        BlockLayout::Empty => println!("Layout:       empty"),
        BlockLayout::Contiguous { blocks, .. } => println!("Layout:       {blocks} contiguous blocks"),
        BlockLayout::Fragmented { reason } => println!("Layout:       fragmented ({reason})"),
    }
    if let Some(blobs) = doc.blob_file() {
        let name = blobs.path().map(|p| p.display().to_string()).unwrap_or_default();
        println!("Blob file:    {name} ({} bytes)", blobs.len());
    }

    println!("\nFields:");
    for (index, field) in doc.fields().iter().enumerate() {
        let mut line = format!(
            "  {:>3}  {:<25} {:<14} {:>4}",
            index + 1,
            field.name,
            field.field_type.to_string(),
            field.length
        );
        if field.field_type == FieldType::Bcd {
            line.push_str(&format!("  ({} decimals)", field.decimals));
        }
        println!("{line}");
    }

    Ok(())
}

fn cmd_dump(
    path: &Path,
    options: &OpenOptions,
    offset: usize,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let doc = open_table(path, options)?;
    let end = match limit {
        Some(limit) => offset.saturating_add(limit).min(doc.num_records()),
        None => doc.num_records(),
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if !json {
        let names: Vec<&str> = doc.fields().iter().map(|f| f.name.as_str()).collect();
        writeln!(out, "{}", names.join("\t"))?;
    }

    let mut errors = 0usize;
    for n in offset..end {
        let record = doc
            .retrieve_record(n)
            .with_context(|| format!("Failed to read record {n}"))?;
        errors += record.errors().count();

        if json {
            let mut row = serde_json::Map::with_capacity(record.len());
            for (field, entry) in doc.fields().iter().zip(&record) {
                let value = match entry {
                    Ok(value) => serde_json::to_value(value)?,
                    Err(err) => serde_json::json!({ "error": err.reason.to_string() }),
                };
                row.insert(field.name.clone(), value);
            }
            writeln!(out, "{}", serde_json::Value::Object(row))?;
        } else {
            let cells: Vec<String> = record
                .iter()
                .map(|entry| match entry {
                    Ok(value) => value.to_string(),
                    Err(err) => format!("<{}>", err.reason),
                })
                .collect();
            writeln!(out, "{}", cells.join("\t"))?;
        }

        doc.release_record(record);
    }
    out.flush()?;

    if errors > 0 {
        eprintln!("{errors} fields could not be decoded");
    }
    Ok(())
}
