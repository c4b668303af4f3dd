//! slagmap - record slag compositions and classify them on the
//! CaO–SiO₂–Al₂O₃ ternary
//!
//! Keeps a catalog of named slags in `slagmap.db` under the resolved root
//! folder and writes Plotly ternary figures for the visible ones.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use slagmap_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use slagmap_common::db::init_database;
use slagmap_common::{
    plot_points, reduce, DerivedMetrics, RawComposition, SlagCatalog, SlagId, SlagRecord,
    SqliteStore, TernaryFigure,
};
use std::path::PathBuf;
use tracing::info;

mod input;

use input::OxideFields;

/// Command-line arguments for slagmap
#[derive(Parser, Debug)]
#[command(name = "slagmap")]
#[command(about = "Slag composition catalog and CaO–SiO2–Al2O3 phase classifier")]
#[command(version)]
struct Cli {
    /// Folder holding slagmap.db
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, global = true, env = "SLAGMAP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reduce a composition and add it to the catalog
    Add {
        /// Slag name
        #[arg(short, long)]
        name: String,

        #[command(flatten)]
        oxides: OxideFields,
    },
    /// List catalog records
    List {
        /// Include hidden records
        #[arg(short, long)]
        all: bool,
    },
    /// Remove a record
    Remove { id: String },
    /// Make a record visible on the plot
    Show { id: String },
    /// Hide a record from the plot
    Hide { id: String },
    /// Reduce and classify a composition without storing it
    ///
    /// Uses the reference sample when no oxide amounts are given.
    Classify {
        #[command(flatten)]
        oxides: OxideFields,
    },
    /// Write a ternary figure (Plotly JSON) of the visible records
    Plot {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = TomlConfig::load_or_default(cli.config.as_deref());

    init_tracing(&config)?;

    info!(
        "Starting slagmap v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    if let Command::Classify { oxides } = &cli.command {
        return classify(oxides);
    }

    let root_folder = RootFolderResolver::new("slagmap")
        .with_cli_arg(cli.root_folder.clone())
        .with_config(config)
        .resolve();

    let catalog = open_catalog(root_folder).await?;
    run(cli.command, catalog).await
}

/// Create the root folder and database if needed, then hydrate the catalog
async fn open_catalog(root_folder: PathBuf) -> Result<SlagCatalog<SqliteStore>> {
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;

    let db_path = initializer.database_path();
    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    SlagCatalog::open(SqliteStore::new(pool))
        .await
        .context("Failed to load slag catalog")
}

async fn run(command: Command, mut catalog: SlagCatalog<SqliteStore>) -> Result<()> {
    match command {
        Command::Add { name, oxides } => {
            let record = catalog
                .add(&name, oxides.to_composition())
                .await
                .context("Failed to add slag")?;
            print_record(&record);
        }
        Command::List { all } => {
            let records: Vec<&SlagRecord> = if all {
                catalog.records().iter().collect()
            } else {
                catalog.visible_records().collect()
            };
            if records.is_empty() {
                println!("(no records)");
            }
            for record in records {
                print_record(record);
            }
        }
        Command::Remove { id } => {
            let id = parse_id(&id)?;
            if catalog.remove(id).await.context("Failed to remove slag")? {
                println!("Removed {}", id);
            } else {
                println!("No record {}", id);
            }
        }
        Command::Show { id } => set_visible(&mut catalog, &id, true).await?,
        Command::Hide { id } => set_visible(&mut catalog, &id, false).await?,
        Command::Plot { output } => {
            let figure = TernaryFigure::from_points(plot_points(catalog.visible_records()));
            let json = figure.to_json_pretty()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!(
                        "Wrote {} point(s) to {}",
                        figure.points().len(),
                        path.display()
                    );
                }
                None => println!("{}", json),
            }
        }
        Command::Classify { oxides } => classify(&oxides)?,
    }

    Ok(())
}

/// Initialize tracing: RUST_LOG wins, then the configured level
fn init_tracing(config: &TomlConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

fn classify(oxides: &OxideFields) -> Result<()> {
    let raw = if oxides.is_empty() {
        RawComposition::reference_sample()
    } else {
        oxides.to_composition()
    };

    let reduction = reduce(&raw).context("Cannot classify composition")?;
    println!("{}", reduction.normalized);
    print_metrics(&reduction.metrics);
    Ok(())
}

async fn set_visible(
    catalog: &mut SlagCatalog<SqliteStore>,
    id: &str,
    visible: bool,
) -> Result<()> {
    let id = parse_id(id)?;
    if catalog
        .set_visible(id, visible)
        .await
        .context("Failed to update visibility")?
    {
        println!("{} {}", if visible { "Showing" } else { "Hiding" }, id);
    } else {
        println!("No record {}", id);
    }
    Ok(())
}

fn parse_id(id: &str) -> Result<SlagId> {
    Ok(id.parse::<SlagId>()?)
}

fn print_record(record: &SlagRecord) {
    println!(
        "{}  {}{}",
        record.id(),
        record.name(),
        if record.is_visible() { "" } else { "  (hidden)" }
    );
    println!("    {}", record.normalized());
    print_metrics(record.metrics());
}

fn print_metrics(metrics: &DerivedMetrics) {
    match (metrics.cs_ratio, metrics.cs_category()) {
        (Some(ratio), Some(category)) => println!("    C/S {:.2} ({})", ratio, category),
        _ => println!("    C/S undefined (no SiO₂)"),
    }
    match metrics.phase.condition() {
        Some(condition) => println!(
            "    Phase {}: {} [{}]",
            metrics.phase,
            metrics.phase.description(),
            condition
        ),
        None => println!(
            "    Phase {}: {}",
            metrics.phase,
            metrics.phase.description()
        ),
    }
}
