//! Process command - extract data from a single bill file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use epe_core::bill::rules::{format_currency, title_case};
use epe_core::models::bill::{BillRecord, TaxKey};
use epe_core::{BillParser, ExtractionResult, RuleBillParser};

use super::{load_config, read_document_text, source_name};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF, or already reconstructed text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Show fields that fell back to defaults and the matched template
    #[arg(long)]
    show_warnings: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );

    pb.set_message("Reading document...");
    pb.set_position(10);
    let text = read_document_text(&args.input, &config)?;

    if text.trim().is_empty() {
        pb.finish_and_clear();
        anyhow::bail!("No text could be extracted from {}", args.input.display());
    }

    pb.set_message("Extracting bill data...");
    pb.set_position(60);
    let parser = RuleBillParser::from_config(&config);
    let result = parser.parse(&text, &source_name(&args.input));

    pb.finish_and_clear();
    let result = result?;

    let output = format_bill(&result.bill, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_warnings {
        print_diagnostics(&result);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn print_diagnostics(result: &ExtractionResult) {
    eprintln!();
    if let Some(variant) = result.dominant_variant() {
        eprintln!("{} Template: {:?}", style("ℹ").blue(), variant);
    }
    if result.warnings.is_empty() {
        eprintln!("{} All fields extracted", style("✓").green());
    } else {
        eprintln!("{}", style("Defaulted fields:").yellow());
        for warning in &result.warnings {
            eprintln!("  - {}", warning);
        }
    }
    eprintln!(
        "{} Processing time: {}ms",
        style("ℹ").blue(),
        result.processing_time_ms
    );
}

/// Render a bill in the requested format.
pub fn format_bill(bill: &BillRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(bill)?),
        OutputFormat::Csv => format_bill_csv(bill),
        OutputFormat::Text => Ok(format_bill_text(bill)),
    }
}

/// Columns of the per-bill CSV output.
fn csv_header() -> Vec<&'static str> {
    let mut header = vec![
        "filename",
        "client_name",
        "emission_date",
        "period",
        "days",
        "consumption_kwh",
        "cuota_servicio_rate",
        "importe_basico",
    ];
    header.extend(TaxKey::ALL.iter().map(|k| k.label()));
    header.push("total");
    header
}

fn format_bill_csv(bill: &BillRecord) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(csv_header())?;

    let mut record = vec![
        bill.filename.clone(),
        bill.client_name.clone(),
        bill.emission_date.clone(),
        bill.period.clone(),
        bill.days.to_string(),
        bill.consumption_kwh.to_string(),
        bill.cuota_servicio_rate.to_string(),
        bill.importe_basico.to_string(),
    ];
    record.extend(
        TaxKey::ALL
            .iter()
            .map(|k| bill.taxes.get(k).map(|v| v.to_string()).unwrap_or_default()),
    );
    record.push(bill.total.to_string());
    wtr.write_record(&record)?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_bill_text(bill: &BillRecord) -> String {
    let mut output = String::new();

    output.push_str(&format!("Client: {}\n", title_case(&bill.client_name)));
    output.push_str(&format!("Emission date: {}\n", bill.emission_date));
    if !bill.period.is_empty() {
        output.push_str(&format!("Period: {}\n", bill.period));
    }
    if bill.days > 0 {
        output.push_str(&format!("Days: {}\n", bill.days));
    }
    output.push_str(&format!("Consumption: {} kWh\n", bill.consumption_kwh));
    output.push('\n');

    if !bill.tiers.is_empty() {
        output.push_str("Tiers:\n");
        for tier in &bill.tiers {
            output.push_str(&format!(
                "  {:<9} {:>6} kWh x ${:>10} = ${}\n",
                tier.tier.as_str(),
                tier.kwh,
                format_currency(tier.price_per_kwh),
                format_currency(tier.amount)
            ));
        }
        output.push('\n');
    }

    output.push_str("Charges:\n");
    output.push_str(&format!(
        "  Service fee:   ${}\n",
        format_currency(bill.cuota_servicio_rate)
    ));
    output.push_str(&format!(
        "  Basic amount:  ${}\n",
        format_currency(bill.importe_basico)
    ));

    if !bill.taxes.is_empty() {
        output.push('\n');
        output.push_str("Taxes:\n");
        for (key, amount) in &bill.taxes {
            output.push_str(&format!("  {:<20} ${}\n", key.label(), format_currency(*amount)));
        }
    }

    output.push_str(&format!("\nTotal: ${}\n", format_currency(bill.total)));

    output
}
