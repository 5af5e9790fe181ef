//! CPI command - download and inspect the consumer price index table.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local};
use clap::{Args, Subcommand};
use console::style;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use epe_core::bill::rules::format_currency;
use epe_core::models::config::EpeConfig;
use epe_core::CpiIndex;

use super::load_config;

/// Arguments for the cpi command.
#[derive(Args)]
pub struct CpiArgs {
    #[command(subcommand)]
    command: CpiCommand,
}

#[derive(Subcommand)]
enum CpiCommand {
    /// Download the monthly series and store it as a local table
    Update(UpdateArgs),

    /// Show the stored table
    Show(ShowArgs),

    /// Show the table location
    Path,
}

#[derive(Args)]
struct UpdateArgs {
    /// Series URL (default: from configuration)
    #[arg(long)]
    url: Option<String>,

    /// Output path for the table
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ShowArgs {
    /// Table to read (default: from configuration)
    #[arg(long)]
    cpi: Option<PathBuf>,

    /// Number of most recent months to show
    #[arg(short = 'n', long, default_value = "12")]
    last: usize,

    /// Show every month
    #[arg(long)]
    all: bool,
}

pub async fn run(args: CpiArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    match args.command {
        CpiCommand::Update(update_args) => update(update_args, &config).await,
        CpiCommand::Show(show_args) => show(show_args, &config),
        CpiCommand::Path => show_path(&config),
    }
}

/// Where the table lives unless overridden.
pub fn default_cpi_path(config: &EpeConfig) -> PathBuf {
    config.inflation.cpi_path.clone().unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("epe")
            .join("cpi.json")
    })
}

/// Read a stored table.
pub fn load_index(path: &Path) -> anyhow::Result<CpiIndex> {
    if !path.exists() {
        anyhow::bail!(
            "CPI table not found at {}.\n\n\
             Run 'epe cpi update' to download it.",
            path.display()
        );
    }

    let json = fs::read_to_string(path)?;
    let index = CpiIndex::from_json(&json)?;
    debug!("Loaded {} CPI months from {}", index.len(), path.display());

    Ok(index)
}

async fn update(args: UpdateArgs, config: &EpeConfig) -> anyhow::Result<()> {
    let url = args.url.unwrap_or_else(|| config.inflation.series_url.clone());
    let output = args.output.unwrap_or_else(|| default_cpi_path(config));

    println!("{} Downloading CPI series from {}", style("ℹ").blue(), url);

    let client = reqwest::Client::builder()
        .user_agent(concat!("epe-cli/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(60))
        .build()?;

    let response = client.get(&url).send().await?;

    if !response.status().is_success() {
        anyhow::bail!("HTTP {}", response.status());
    }

    let pb = ProgressBar::new(response.content_length().unwrap_or(0));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {spinner:.green} [{bar:25.cyan/blue}] {bytes}/{total_bytes}")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut body = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        body.extend_from_slice(&chunk);
        pb.set_position(body.len() as u64);
    }

    pb.finish_and_clear();

    let index = CpiIndex::from_series_json(&String::from_utf8(body)?)?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = output.with_extension("tmp");
    fs::write(&temp_path, index.to_json()?)?;
    fs::rename(&temp_path, &output)?;

    println!(
        "{} Saved {} months (latest {}) to {}",
        style("✓").green(),
        index.len(),
        index.latest_key().unwrap_or("-"),
        output.display()
    );

    Ok(())
}

fn show(args: ShowArgs, config: &EpeConfig) -> anyhow::Result<()> {
    let path = args.cpi.unwrap_or_else(|| default_cpi_path(config));
    let index = load_index(&path)?;

    let entries: Vec<_> = index.iter().collect();
    let skip = if args.all {
        0
    } else {
        entries.len().saturating_sub(args.last)
    };

    for (key, value) in &entries[skip..] {
        println!("{}  {:>12}", key, format_currency(*value));
    }

    println!();
    println!(
        "{} {} months, latest {}",
        style("ℹ").blue(),
        index.len(),
        index.latest_key().unwrap_or("-")
    );

    if let Some(age) = index.latest_key().and_then(months_since) {
        if age > STALE_AFTER_MONTHS {
            println!(
                "{} Table is {} months behind, run 'epe cpi update' to refresh it.",
                style("⚠").yellow(),
                age
            );
        }
    }

    Ok(())
}

/// INDEC publishes a month's index mid-way through the next one.
const STALE_AFTER_MONTHS: i32 = 2;

/// Whole months between an `MM/YYYY` key and today.
fn months_since(key: &str) -> Option<i32> {
    let (month, year) = key.split_once('/')?;
    let month: i32 = month.parse().ok()?;
    let year: i32 = year.parse().ok()?;

    let today = Local::now();
    Some((today.year() - year) * 12 + today.month() as i32 - month)
}

fn show_path(config: &EpeConfig) -> anyhow::Result<()> {
    let path = default_cpi_path(config);

    println!("CPI table: {}", path.display());

    if path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not downloaded").yellow());
        println!();
        println!("Run 'epe cpi update' to download it.");
    }

    Ok(())
}
