//! Command-line interface

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::exporter::{ExportOptions, ReportExporter};
use crate::reader::WorkbookReader;
use crate::sample::{sample_report, sample_rules, SAMPLE_OUTPUT, SAMPLE_SHEET_NAME};
use crate::scratch::{write_then_read, DEFAULT_SCRATCH_CONTENT, DEFAULT_SCRATCH_PATH};
use crate::search::{Credentials, SearchClient, SearchConfig, DEFAULT_ENDPOINT};

#[derive(Parser, Debug)]
#[command(name = "sheetreport")]
#[command(about = "Export styled, width-adjusted spreadsheets", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log filter used when neither `RUST_LOG` nor `SHEETREPORT_LOG` is set
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export the built-in student score sample
    Export(ExportArgs),

    /// Print the rows and column widths of a workbook
    Inspect(InspectArgs),

    /// Send one signed search request and print the hits
    Search(SearchArgs),

    /// Write text to a file and read it back through the same handle
    Scratch(ScratchArgs),
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Destination file, replaced if it exists
    #[arg(short, long, default_value = SAMPLE_OUTPUT)]
    pub output: PathBuf,

    #[arg(long, default_value = SAMPLE_SHEET_NAME)]
    pub sheet_name: String,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    pub path: PathBuf,

    /// Sheet to print (first sheet when omitted)
    #[arg(long)]
    pub sheet: Option<String>,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    #[arg(short, long)]
    pub query: String,

    #[arg(long, env = "SHEETREPORT_API_KEY", hide_env_values = true)]
    pub api_key: String,

    #[arg(long, env = "SHEETREPORT_SECRET_KEY", hide_env_values = true)]
    pub secret_key: String,

    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

#[derive(Args, Debug)]
pub struct ScratchArgs {
    #[arg(long, default_value = DEFAULT_SCRATCH_PATH)]
    pub path: PathBuf,

    #[arg(long, default_value = DEFAULT_SCRATCH_CONTENT)]
    pub content: String,
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Export(args) => run_export(args),
        Commands::Inspect(args) => run_inspect(args),
        Commands::Search(args) => run_search(args),
        Commands::Scratch(args) => run_scratch(args),
    }
}

fn run_export(args: ExportArgs) -> anyhow::Result<()> {
    let report = sample_report()?;
    let rules = sample_rules()?;
    let exporter =
        ReportExporter::with_options(ExportOptions::default().with_sheet_name(&args.sheet_name));

    let summary = exporter
        .export(&report, &rules, &args.output)
        .context("export failed")?;
    println!(
        "Wrote {} rows x {} columns to {}",
        summary.rows,
        summary.columns,
        summary.path.display()
    );
    Ok(())
}

fn run_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let mut reader = WorkbookReader::open(&args.path)?;
    let contents = match &args.sheet {
        Some(name) => reader.read_sheet(name)?,
        None => reader.read_first_sheet()?,
    };

    let (rows, cols) = contents.dimensions();
    println!("Sheet '{}': {} rows x {} columns", contents.name, rows, cols);
    for row in &contents.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|v| v.as_ref().map(|v| v.as_string()).unwrap_or_default())
            .collect();
        println!("  {}", cells.join(" | "));
    }
    for (col, width) in &contents.column_widths {
        println!("  column {}: width {}", crate::types::col_to_letter(*col), width);
    }
    Ok(())
}

fn run_search(args: SearchArgs) -> anyhow::Result<()> {
    let config = SearchConfig {
        endpoint: args.endpoint,
        timeout: Duration::from_secs(args.timeout),
        ..SearchConfig::default()
    };
    let client = SearchClient::new(
        config,
        Credentials {
            api_key: args.api_key,
            secret_key: args.secret_key,
        },
    )?;

    let response = client
        .search(&args.query)
        .with_context(|| format!("search for '{}' failed", args.query))?;
    if !response.is_success() {
        anyhow::bail!(
            "search API error {}: {}",
            response.error_code,
            response.error_msg
        );
    }

    for hit in &response.result {
        println!("{}\n  {}\n  {}\n", hit.title, hit.url, hit.summary);
    }
    Ok(())
}

fn run_scratch(args: ScratchArgs) -> anyhow::Result<()> {
    let content = write_then_read(&args.path, &args.content)?;
    println!("{content}");
    Ok(())
}
