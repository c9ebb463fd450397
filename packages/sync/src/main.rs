#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the card database sync tool.

use std::io::IsTerminal as _;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use ygo_db_cli_utils::{IndicatifProgress, MultiProgress, init_logger};
use ygo_db_fetch::{DbClient, Session};
use ygo_db_reconcile::progress::{LogProgress, ProgressCallback};
use ygo_db_sync::config::SyncConfig;
use ygo_db_sync::registry::{DatasetKind, all_datasets};
use ygo_db_sync::strategy::{CrawlStrategy, parse_id_list, read_ids_file};
use ygo_db_sync::{SyncError, SyncOptions, migrate_columns, sync_dataset};

#[derive(Parser)]
#[command(name = "ygo_db_sync", about = "Yu-Gi-Oh! card database sync tool")]
struct Cli {
    #[command(flatten)]
    settings: SettingsArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SettingsArgs {
    /// TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding the dataset files (overrides `YGO_DB_DATA_DIR`)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Delay between requests in milliseconds (overrides `YGO_DB_DELAY_MS`)
    #[arg(long, global = true)]
    delay_ms: Option<u64>,
    /// Netscape `cookies.txt` to use instead of bootstrapping a session
    #[arg(long, global = true)]
    cookies: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync the card list (`cards-all.tsv`)
    Cards(CrawlArgs),
    /// Sync card supplement text for the cards in `cards-all.tsv`
    Detail(CrawlArgs),
    /// Sync FAQ entries
    Faq(CrawlArgs),
    /// Sync the bare list of FAQ ids
    FaqIds(CrawlArgs),
    /// Incrementally sync every dataset in turn
    All,
    /// Pad short rows in `cards-all.tsv` to the current column count
    MigrateColumns,
    /// List the configured datasets
    Datasets,
}

#[derive(Args)]
struct CrawlArgs {
    #[command(flatten)]
    strategy: StrategyArgs,
    /// Resume a long crawl at this work-list position
    #[arg(long, value_name = "N")]
    start_from: Option<usize>,
}

#[derive(Args)]
#[group(id = "crawl_strategy", multiple = false)]
struct StrategyArgs {
    /// Re-crawl everything, ignoring the stop condition
    #[arg(long)]
    force_all: bool,
    /// Fetch only the newest N entries
    #[arg(long, value_name = "N")]
    top: Option<usize>,
    /// Fetch LEN entries starting at position START of the newest-first list
    #[arg(long, num_args = 2, value_names = ["START", "LEN"])]
    range: Option<Vec<usize>>,
    /// Comma-separated ids to refetch and update in place
    #[arg(long)]
    ids: Option<String>,
    /// File with one id per line to refetch and update in place
    #[arg(long)]
    ids_file: Option<PathBuf>,
}

impl StrategyArgs {
    fn strategy(&self) -> Result<CrawlStrategy, SyncError> {
        if self.force_all {
            return Ok(CrawlStrategy::ForceAll);
        }
        if let Some(n) = self.top {
            return Ok(CrawlStrategy::Top(n));
        }
        if let Some(&[start, len]) = self.range.as_deref() {
            return Ok(CrawlStrategy::Range { start, len });
        }
        if let Some(list) = &self.ids {
            return Ok(CrawlStrategy::Ids(parse_id_list(list)));
        }
        if let Some(path) = &self.ids_file {
            return Ok(CrawlStrategy::Ids(read_ids_file(path)?));
        }
        Ok(CrawlStrategy::Incremental)
    }
}

impl CrawlArgs {
    fn options(&self) -> Result<SyncOptions, SyncError> {
        Ok(SyncOptions {
            strategy: self.strategy.strategy()?,
            start_from: self.start_from,
        })
    }
}

fn load_config(settings: &SettingsArgs) -> Result<SyncConfig, SyncError> {
    let mut config = SyncConfig::load(settings.config.as_deref())?;
    if let Some(dir) = &settings.data_dir {
        config.data_dir.clone_from(dir);
    }
    if let Some(ms) = settings.delay_ms {
        config.delay_ms = ms;
    }
    if let Some(path) = &settings.cookies {
        config.cookies = Some(path.clone());
    }
    Ok(config)
}

fn build_client(config: &SyncConfig) -> Result<DbClient, Box<dyn std::error::Error>> {
    let mut client =
        DbClient::new(config.urls(), config.timeout())?.with_max_retries(config.max_retries);
    if let Some(path) = &config.cookies {
        let session = Session::load(path)?;
        log::info!("Loaded {} cookies from {}", session.len(), path.display());
        client = client.with_session(session);
    }
    Ok(client)
}

async fn run_one(
    client: &mut DbClient,
    config: &SyncConfig,
    kind: DatasetKind,
    options: &SyncOptions,
    multi: &MultiProgress,
) -> Result<(), SyncError> {
    let progress: Arc<dyn ProgressCallback> = if std::io::stderr().is_terminal() {
        IndicatifProgress::crawl_bar(multi, kind.as_ref())
    } else {
        Arc::new(LogProgress::new(kind.as_ref(), 500))
    };
    let stats = sync_dataset(client, config, kind, options, progress).await?;
    println!("{stats}");
    Ok(())
}

async fn run(cli: Cli, multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&cli.settings)?;

    let (kind, args) = match cli.command {
        Commands::Datasets => {
            println!("{:<10} {:<18} NAME", "ID", "FILE");
            println!("{}", "-".repeat(50));
            for spec in all_datasets() {
                println!("{:<10} {:<18} {}", spec.id, spec.file_name, spec.name);
            }
            return Ok(());
        }
        Commands::MigrateColumns => {
            let report = migrate_columns(&config)?;
            println!(
                "Padded {} of {} rows to {} columns (backup: {})",
                report.total_padded(),
                report.rows,
                report.columns,
                report.backup.display()
            );
            for (card_type, count) in &report.padded {
                println!("  {card_type:<12} {count}");
            }
            return Ok(());
        }
        Commands::All => {
            let mut client = build_client(&config)?;
            let options = SyncOptions::default();
            let overall = IndicatifProgress::datasets_bar(multi, DatasetKind::all().len() as u64);
            for &kind in DatasetKind::all() {
                overall.set_message(kind.to_string());
                run_one(&mut client, &config, kind, &options, multi).await?;
                overall.inc(1);
            }
            overall.finish("all datasets synced".to_owned());
            return Ok(());
        }
        Commands::Cards(args) => (DatasetKind::Cards, args),
        Commands::Detail(args) => (DatasetKind::Detail, args),
        Commands::Faq(args) => (DatasetKind::Faq, args),
        Commands::FaqIds(args) => (DatasetKind::FaqIds, args),
    };

    let options = args.options()?;
    let mut client = build_client(&config)?;
    run_one(&mut client, &config, kind, &options, multi).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let multi = init_logger();
    let cli = Cli::parse();

    if let Err(e) = run(cli, &multi).await {
        log::error!("{e}");
        std::process::exit(1);
    }
}
