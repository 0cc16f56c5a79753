//! Stockview CLI - inspect and serve fish-stock assessment datasets
//!
//! # Commands
//!
//! ```bash
//! stockview serve --data stocks.csv          # Start HTTP server (port 3000)
//! stockview summary stocks.csv --region North
//! stockview table stocks.csv --search cod --filter Region=north
//! stockview parse https://example.org/stocks.csv
//! ```
//!
//! `<source>` is a file path or an `http(s)://` URL.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use stockview::config::{parse_delimiter, Config};
use stockview::{filter_rows, load_source, Dashboard, Dataset, Highlight, LoadOptions, TableQuery};

#[derive(Parser)]
#[command(name = "stockview")]
#[command(about = "Aggregate views over fish-stock assessment records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a dataset and output its raw rows as JSON
    Parse {
        /// Input CSV file or URL
        source: String,

        /// CSV delimiter (auto-detect if not specified; "tab" for tabs)
        #[arg(short, long, value_parser = delimiter_arg)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute the dashboard aggregates for a selection
    Summary {
        /// Input CSV file or URL
        source: String,

        #[arg(short, long, value_parser = delimiter_arg)]
        delimiter: Option<char>,

        /// Keep only this year
        #[arg(long)]
        year: Option<i32>,

        /// Keep only this region
        #[arg(long)]
        region: Option<String>,

        /// Keep only this category
        #[arg(long)]
        category: Option<String>,

        /// Compare against the records of this year
        #[arg(long, conflicts_with = "highlight_region")]
        highlight_year: Option<i32>,

        /// Compare against the records of this region
        #[arg(long)]
        highlight_region: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Search the raw rows
    Table {
        /// Input CSV file or URL
        source: String,

        #[arg(short, long, value_parser = delimiter_arg)]
        delimiter: Option<char>,

        /// Case-insensitive text matched against every column
        #[arg(short, long)]
        search: Option<String>,

        /// Column filter, COLUMN=TEXT (repeatable)
        #[arg(short, long = "filter", value_parser = column_filter_arg)]
        filters: Vec<(String, String)>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: STOCKVIEW_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Dataset loaded at startup (default: STOCKVIEW_DATA)
        #[arg(long)]
        data: Option<String>,

        #[arg(short, long, value_parser = delimiter_arg)]
        delimiter: Option<char>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse {
            source,
            delimiter,
            output,
        } => cmd_parse(&source, delimiter, output.as_deref()).await,

        Commands::Summary {
            source,
            delimiter,
            year,
            region,
            category,
            highlight_year,
            highlight_region,
            output,
        } => {
            let highlight = highlight_year
                .map(Highlight::Year)
                .or(highlight_region.map(Highlight::Region));
            cmd_summary(
                &source,
                delimiter,
                year,
                region,
                category,
                highlight,
                output.as_deref(),
            )
            .await
        }

        Commands::Table {
            source,
            delimiter,
            search,
            filters,
            output,
        } => cmd_table(&source, delimiter, search, filters, output.as_deref()).await,

        Commands::Serve {
            port,
            data,
            delimiter,
        } => cmd_serve(port, data, delimiter).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn load(
    source: &str,
    delimiter: Option<char>,
) -> Result<Dataset, Box<dyn std::error::Error>> {
    let options = LoadOptions { delimiter };
    Ok(load_source(source, &options).await?)
}

async fn cmd_parse(
    source: &str,
    delimiter: Option<char>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = load(source, delimiter).await?;

    let json = serde_json::to_string_pretty(&dataset.rows)?;
    write_output(&json, output)?;

    Ok(())
}

async fn cmd_summary(
    source: &str,
    delimiter: Option<char>,
    year: Option<i32>,
    region: Option<String>,
    category: Option<String>,
    highlight: Option<Highlight>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = load(source, delimiter).await?;
    let mut dashboard = Dashboard::new(dataset.records);

    if let Some(year) = year {
        dashboard.select_year(year);
    }
    if let Some(region) = region {
        dashboard.select_region(region);
    }
    if let Some(category) = category {
        dashboard.select_category(category);
    }
    if let Some(highlight) = highlight {
        dashboard.set_highlight(highlight);
    }

    let view = dashboard.view();
    eprintln!(
        "\n📊 {} of {} records selected, total {}",
        view.filtered_records, view.total_records, view.filtered_total
    );

    let json = serde_json::to_string_pretty(&view)?;
    write_output(&json, output)?;

    Ok(())
}

async fn cmd_table(
    source: &str,
    delimiter: Option<char>,
    search: Option<String>,
    filters: Vec<(String, String)>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let dataset = load(source, delimiter).await?;

    let mut query = TableQuery::new();
    query.search = search;
    query.columns.extend(filters);

    let rows = filter_rows(&dataset.rows, &query);
    eprintln!("\n🔎 {} of {} rows match", rows.len(), dataset.rows.len());

    let json = serde_json::to_string_pretty(&rows)?;
    write_output(&json, output)?;

    Ok(())
}

async fn cmd_serve(
    port: Option<u16>,
    data: Option<String>,
    delimiter: Option<char>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::from_env();
    if let Some(port) = port {
        config = config.with_port(port);
    }
    if let Some(data) = data {
        config = config.with_data_source(data);
    }
    if let Some(delimiter) = delimiter {
        config = config.with_delimiter(delimiter);
    }

    stockview::server::start_server(config).await?;
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

fn delimiter_arg(raw: &str) -> Result<char, String> {
    parse_delimiter(raw).ok_or_else(|| format!("invalid delimiter '{}'", raw))
}

fn column_filter_arg(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(column, text)| (column.to_string(), text.to_string()))
        .ok_or_else(|| format!("expected COLUMN=TEXT, got '{}'", raw))
}
