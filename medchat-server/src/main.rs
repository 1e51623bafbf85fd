//! `medchat`: run one service family, scrape headlines, or back up the
//! account database.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use medchat_core::config::GeneralConfig;
use medchat_core::{AccountStore, MedchatConfig};
use medchat_server::news::{format_items, HtmlNewsScraper, NewsScraper};
use medchat_server::{serve, AppState, ServiceKind};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "medchat")]
#[command(about = "Persona-prompted medical chat services")]
#[command(version)]
struct Cli {
    /// Config file (TOML). Environment overrides use MEDCHAT__SECTION__KEY.
    #[arg(short = 'C', long, global = true, env = "MEDCHAT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve one service family.
    Serve {
        /// Which family to run.
        #[arg(short, long, value_enum)]
        service: ServiceKind,

        /// Listening port (overrides config and the family default).
        #[arg(short, long)]
        port: Option<u16>,

        /// Interface to bind (overrides config).
        #[arg(long)]
        host: Option<String>,
    },

    /// Print headlines from the news portal.
    Scrape {
        /// Page to fetch (defaults to scraper.url).
        url: Option<String>,

        /// CSS selector for headline anchors (defaults to scraper.selector).
        #[arg(long)]
        selector: Option<String>,
    },

    /// Copy the account database to a file.
    BackupDb {
        /// Destination path.
        dest: PathBuf,
    },
}

fn init_tracing(general: &GeneralConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&general.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if general.log_format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = MedchatConfig::load(cli.config.as_deref()).context("loading configuration")?;
    config.validate().context("validating configuration")?;
    init_tracing(&config.general);

    match cli.command {
        Command::Serve { service, port, host } => {
            let mut state = AppState::from_config(service, &config)
                .with_context(|| format!("initialising {service} service"))?;
            if let Some(port) = port {
                state.settings.port = port;
            }
            let host = host.unwrap_or_else(|| config.server.host.clone());
            serve(state, &host, config.server.max_body_bytes).await?;
        }
        Command::Scrape { url, selector } => {
            let mut scraper = HtmlNewsScraper::from_config(&config.scraper);
            if let Some(selector) = selector {
                scraper = scraper.with_selector(selector);
            }
            let url = url.unwrap_or_else(|| config.scraper.url.clone());
            let items = scraper.scrape(&url).await.with_context(|| format!("scraping {url}"))?;
            println!("{}", format_items(&items));
        }
        Command::BackupDb { dest } => {
            let store = AccountStore::open(&config.storage.database_path, config.storage.wal_mode)
                .context("opening account database")?;
            store.backup(&dest).context("backing up account database")?;
            tracing::info!(
                src = %store.db_path().display(),
                dest = %dest.display(),
                users = store.user_count().unwrap_or(0),
                "Backup complete"
            );
        }
    }

    Ok(())
}
