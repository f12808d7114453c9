use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gallerist_core::{collect_first, ArticClient, MemSource, PageSource, TableState, PAGE_CAPACITY};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod theme;
mod ui;
mod worker;

/// Size of the built-in offline catalog.
const DEMO_RECORDS: u64 = 120;

#[derive(Parser)]
#[command(name = "gallerist", version, about = "Browse the art catalog page by page and pick artworks")]
struct Cli {
    /// Settings file (defaults to <config dir>/gallerist/settings.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Where records come from
    #[arg(long, value_enum, default_value_t = SourceKind::Artic, global = true)]
    source: SourceKind,
    /// Override the catalog API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Page to open the table on (1-based)
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SourceKind {
    /// Art Institute of Chicago public API
    Artic,
    /// Built-in offline catalog with ids 1..=120
    Demo,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one page of artworks
    Page {
        page: u32,
        #[arg(long)]
        json: bool,
    },
    /// Select the first N artworks across pages and print their ids
    SelectFirst {
        /// Raw limit text; anything but a positive integer selects nothing
        #[arg(allow_hyphen_values = true)]
        limit: String,
        #[arg(long)]
        json: bool,
    },
    /// Print the effective settings as TOML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.command.is_none());

    let mut settings = config::load_settings(cli.config.as_deref());
    if let Some(url) = &cli.api_url {
        settings.api.base_url = url.clone();
    }

    match cli.command {
        None => {
            let source = make_source(cli.source, &settings);
            let rt = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_all()
                .build()
                .context("starting fetch runtime")?;
            let theme_dir = cli
                .config
                .as_deref()
                .and_then(|p| p.parent().map(PathBuf::from))
                .unwrap_or_else(config::config_dir);
            let opts = app::RunOptions {
                draw: true,
                alt_screen: settings.tui.alt_screen,
                tick: Duration::from_millis(settings.tui.tick_ms.max(10)),
                theme: theme::load_tui_theme(&theme_dir),
                start_page: cli.page.max(1),
            };
            let picked = app::run_app_default(source, rt.handle().clone(), opts)?;
            for id in picked {
                println!("{id}");
            }
        }
        Some(Commands::Page { page, json }) => {
            let source = make_source(cli.source, &settings);
            let fetched = source.fetch(page.max(1))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&fetched)?);
            } else {
                for a in &fetched.records {
                    println!("{}\t{}", a.id, a.title.as_deref().unwrap_or(""));
                }
            }
        }
        Some(Commands::SelectFirst { limit, json }) => {
            let ids = select_first(cli.source, &settings, &limit)?;
            if json {
                println!("{}", serde_json::to_string(&ids)?);
            } else {
                for id in ids {
                    println!("{id}");
                }
            }
        }
        Some(Commands::Config) => {
            print!("{}", toml::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}

/// Same path the table takes: learn the total from page 1, then run the bulk
/// selector. Input that is not a positive integer returns before any fetch.
fn select_first(kind: SourceKind, settings: &config::Settings, limit: &str) -> Result<Vec<u64>> {
    if gallerist_core::parse_limit(limit).is_none() {
        tracing::debug!(input = limit, "ignoring invalid limit");
        return Ok(Vec::new());
    }
    let source = make_source(kind, settings);
    let mut table = TableState::new(PAGE_CAPACITY);
    let req = table.open();
    table.apply_page(req, source.fetch(req.page));
    if let Some(e) = table.page_error() {
        anyhow::bail!("{e}");
    }
    let Some(bulk) = table.on_bulk_select_submit(limit) else {
        return Ok(Vec::new());
    };
    let result = collect_first(&bulk, source.as_ref());
    let failure = result.as_ref().err().map(|e| e.to_string());
    if !table.finish_bulk(bulk, result) {
        anyhow::bail!(failure.unwrap_or_else(|| "bulk select failed".into()));
    }
    Ok(table.selection().ids().to_vec())
}

fn make_source(kind: SourceKind, settings: &config::Settings) -> Arc<dyn PageSource> {
    match kind {
        SourceKind::Artic => Arc::new(ArticClient::new(settings.api.client_config())),
        SourceKind::Demo => Arc::new(MemSource::demo(DEMO_RECORDS)),
    }
}

/// The table owns the terminal, so interactive runs log to a file under the
/// state dir; subcommands log to stderr.
fn init_logging(interactive: bool) {
    let default_level = if interactive { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if interactive {
        let dir = config::state_dir();
        let file = std::fs::create_dir_all(&dir)
            .and_then(|_| {
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(dir.join("gallerist.log"))
            });
        match file {
            Ok(f) => {
                let _ = builder.with_ansi(false).with_writer(Mutex::new(f)).try_init();
            }
            Err(_) => {
                let _ = builder.with_writer(std::io::sink).try_init();
            }
        }
    } else {
        let _ = builder.with_writer(std::io::stderr).try_init();
    }
}
