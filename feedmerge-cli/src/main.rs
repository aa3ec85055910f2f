//! FeedMerge CLI — run the fetch-and-merge pipeline and poke at single feeds.
//!
//! Commands:
//! - `run` — enrich a roster CSV with both feeds and write one artifact
//! - `fetch` — fetch and select one feed for one entity, printed as JSON
//! - `init-config` — print the default pipeline config as TOML

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use feedmerge_core::domain::{EntityId, FeedKind, FeedValues};
use feedmerge_core::feed::{FeedClient, HttpFeedClient};
use feedmerge_core::{select, Roster};
use feedmerge_runner::{run_pipeline, OutputFormat, PipelineConfig, ScratchFile, StdoutProgress};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "feedmerge",
    about = "FeedMerge CLI — merge projection and classifier feeds per roster entity"
)]
struct Cli {
    /// Log at debug level.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich every roster entity with both feeds and write the merged artifact.
    Run {
        /// Roster CSV with id, name, position and team columns.
        #[arg(long)]
        roster: PathBuf,

        /// Pipeline config TOML. Defaults are used for missing keys.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory for the scratch file and the final artifact.
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Artifact format.
        #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
        format: FormatArg,

        /// Feed season (overrides config).
        #[arg(long)]
        season: Option<u32>,

        /// Entities per batch (overrides config).
        #[arg(long)]
        batch_size: Option<usize>,

        /// Concurrent fetches (overrides config).
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Fetch one feed for one entity and print the selected values.
    Fetch {
        /// Entity id.
        #[arg(long)]
        id: u64,

        /// Which feed to fetch.
        #[arg(long, value_enum)]
        kind: KindArg,

        /// Pipeline config TOML (endpoints, season, freshness windows).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the default pipeline config as TOML.
    InitConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Parquet,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Parquet => OutputFormat::Parquet,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Projection,
    Classifier,
}

impl From<KindArg> for FeedKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Projection => FeedKind::Projection,
            KindArg::Classifier => FeedKind::Classifier,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            roster,
            config,
            output_dir,
            format,
            season,
            batch_size,
            workers,
        } => run_cmd(
            &roster,
            config.as_deref(),
            &output_dir,
            format.into(),
            season,
            batch_size,
            workers,
        ),
        Commands::Fetch { id, kind, config } => fetch_cmd(id, kind.into(), config.as_deref()),
        Commands::InitConfig => {
            print!("{}", PipelineConfig::default().to_toml()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn build_client(config: &PipelineConfig) -> Result<HttpFeedClient> {
    HttpFeedClient::new(config.endpoints(), config.request_timeout())
        .context("failed to build HTTP client")
}

fn run_cmd(
    roster_path: &Path,
    config_path: Option<&Path>,
    output_dir: &Path,
    format: OutputFormat,
    season: Option<u32>,
    batch_size: Option<usize>,
    workers: Option<usize>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(season) = season {
        config.season = season;
    }
    if let Some(batch_size) = batch_size {
        config.set_batch_size(batch_size);
    }
    if let Some(workers) = workers {
        config.workers = workers;
    }

    let roster = Roster::from_csv_path(roster_path)
        .with_context(|| format!("failed to read roster {}", roster_path.display()))?;
    tracing::info!(
        entities = roster.len(),
        unique = roster.unique_ids(),
        "loaded roster"
    );

    let date = chrono::Local::now().format("%Y-%m-%d");
    let scratch = ScratchFile::new(output_dir.join(format!("intermediate_results_{date}.csv")));
    let artifact = output_dir.join(format!(
        "combined_projections_{date}.{}",
        format.extension()
    ));
    let output = format.writer(artifact);
    let client = build_client(&config)?;

    run_pipeline(
        &roster,
        &client,
        &config,
        &scratch,
        output.as_ref(),
        &StdoutProgress,
    )
    .context("pipeline failed")?;

    Ok(())
}

fn fetch_cmd(id: u64, kind: FeedKind, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let client = build_client(&config)?;
    let entity_id = EntityId(id);

    let records = client
        .fetch(entity_id, kind)
        .with_context(|| format!("fetch {kind} feed for entity {entity_id}"))?;
    let selected = match select::select(&records, &config.windows()) {
        FeedValues::Projection(p) => serde_json::to_value(p)?,
        FeedValues::Classifier(c) => serde_json::to_value(c)?,
    };

    let out = serde_json::json!({
        "id": entity_id,
        "feed": kind,
        "url": client.endpoints().url(entity_id, kind),
        "records": records.len(),
        "selected": selected,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
