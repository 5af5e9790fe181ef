//! Batch command - extract many bills and aggregate them.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use futures_util::stream::{self, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use epe_core::bill::rules::format_currency;
use epe_core::models::config::EpeConfig;
use epe_core::{BillParser, BillRecord, Dashboard, ExtractionResult, RuleBillParser, Valuation};

use super::cpi::{default_cpi_path, load_index};
use super::process::{format_bill, OutputFormat};
use super::{is_supported, load_config, read_document_text, source_name};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching PDF or text files
    #[arg(required = true)]
    input: String,

    /// Write one output file per bill into this directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Write the aggregated dashboard as JSON
    #[arg(long)]
    dashboard: Option<PathBuf>,

    /// Express money values in prices of the latest CPI month
    #[arg(long)]
    inflation: bool,

    /// CPI table to use with --inflation (default: from configuration)
    #[arg(long)]
    cpi: Option<PathBuf>,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Stop at the first file that fails
    #[arg(long)]
    fail_fast: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    outcome: Result<ExtractionResult, String>,
    processing_time_ms: u64,
}

impl ProcessResult {
    fn bill(&self) -> Option<&BillRecord> {
        self.outcome.as_ref().ok().map(|r| &r.bill)
    }

    fn error(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(String::as_str)
    }
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    // Load the index up front so a missing table fails before any work
    let index = if args.inflation {
        let path = args.cpi.clone().unwrap_or_else(|| default_cpi_path(&config));
        Some(load_index(&path)?)
    } else {
        None
    };

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_supported(p))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let config = Arc::new(config);
    let parser = Arc::new(RuleBillParser::from_config(&config));

    let mut pending = stream::iter(files.into_iter().map(|path| {
        let config = Arc::clone(&config);
        let parser = Arc::clone(&parser);
        async move {
            let file_start = Instant::now();
            let worker_path = path.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                process_single_file(&worker_path, &parser, &config)
            })
            .await
            .unwrap_or_else(|e| Err(anyhow::anyhow!("worker failed: {}", e)))
            .map_err(|e| e.to_string());

            ProcessResult {
                path,
                outcome,
                processing_time_ms: file_start.elapsed().as_millis() as u64,
            }
        }
    }))
    .buffered(args.jobs.max(1));

    let mut results = Vec::new();
    while let Some(result) = pending.next().await {
        overall_pb.inc(1);

        if let Some(message) = result.error() {
            if args.fail_fast {
                overall_pb.abandon();
                error!("Failed to process {}: {}", result.path.display(), message);
                anyhow::bail!("Processing failed: {}", message);
            }
            warn!("Failed to process {}: {}", result.path.display(), message);
        }

        results.push(result);
    }

    overall_pb.finish_and_clear();

    let successful: Vec<_> = results.iter().filter(|r| r.outcome.is_ok()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.outcome.is_err()).collect();

    if let Some(ref output_dir) = args.output_dir {
        for result in &successful {
            if let Some(bill) = result.bill() {
                write_bill(output_dir, &result.path, bill, args.format)?;
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let bills: Vec<BillRecord> = successful.iter().filter_map(|r| r.bill().cloned()).collect();
    let valuation = match &index {
        Some(index) => Valuation::Real(index),
        None => Valuation::Nominal,
    };
    let dashboard = Dashboard::build(&bills, valuation);

    if let Some(ref dashboard_path) = args.dashboard {
        fs::write(dashboard_path, serde_json::to_string_pretty(&dashboard)?)?;
        println!(
            "{} Dashboard written to {}",
            style("✓").green(),
            dashboard_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !bills.is_empty() {
        print_kpis(&dashboard);
    }

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(
    path: &Path,
    parser: &RuleBillParser,
    config: &EpeConfig,
) -> anyhow::Result<ExtractionResult> {
    let text = read_document_text(path, config)?;
    if text.trim().is_empty() {
        anyhow::bail!("No text extracted from document");
    }

    let result = parser.parse(&text, &source_name(path))?;
    debug!(
        "{}: {} defaulted fields",
        path.display(),
        result.warnings.len()
    );

    Ok(result)
}

fn write_bill(
    output_dir: &Path,
    source: &Path,
    bill: &BillRecord,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let output_name = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("bill");

    let output_path = output_dir.join(format!("{}.{}", output_name, format.extension()));
    fs::write(&output_path, format_bill(bill, format)?)?;
    debug!("Wrote output to {}", output_path.display());

    Ok(())
}

fn print_kpis(dashboard: &Dashboard) {
    let kpis = &dashboard.kpis;
    let suffix = match &dashboard.reference_month {
        Some(month) if dashboard.adjusted => format!(" (prices of {})", month),
        _ => String::new(),
    };

    println!();
    println!("{}", style(format!("Summary{}", suffix)).bold());
    println!("  Bills:               {}", kpis.bill_count);
    println!("  Total consumption:   {} kWh", kpis.total_consumption);
    println!(
        "  Average consumption: {} kWh",
        format_currency(kpis.average_consumption)
    );
    println!("  Total billed:        ${}", format_currency(kpis.total_billed));
    if let Some(last_total) = kpis.last_total {
        println!(
            "  Last bill:           ${} ({})",
            format_currency(last_total),
            kpis.last_period.as_deref().unwrap_or("-")
        );
    }
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "client_name",
        "emission_date",
        "period",
        "consumption_kwh",
        "total_taxes",
        "total",
        "warnings",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        match &result.outcome {
            Ok(extraction) => {
                let bill = &extraction.bill;
                wtr.write_record([
                    filename,
                    "success",
                    &bill.client_name,
                    &bill.emission_date,
                    &bill.period,
                    &bill.consumption_kwh.to_string(),
                    &bill.total_taxes().to_string(),
                    &bill.total.to_string(),
                    &extraction.warnings.len().to_string(),
                    &result.processing_time_ms.to_string(),
                    "",
                ])?;
            }
            Err(message) => {
                wtr.write_record([
                    filename,
                    "error",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    "",
                    &result.processing_time_ms.to_string(),
                    message,
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
