mod deliveries;
mod scheduler;
mod scrape;
mod store;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use storedesk_carriers::{all_carriers, predict_carriers, CarrierTracker, PacedTracker};
use storedesk_core::{AppConfig, DeliveryStatus};
use tracing_subscriber::EnvFilter;

use crate::scheduler::{CheckFn, CheckFuture, DeliveryScheduler};
use crate::scrape::ScrapeMode;
use crate::store::Store;

/// Scheduler key meaning "every store".
const ALL_STORES: &str = "*";

#[derive(Debug, Parser)]
#[command(name = "storedesk")]
#[command(about = "Storefront scraping and delivery tracking")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape a product page and print normalized content as JSON.
    Scrape {
        url: String,
        #[arg(long, value_enum, default_value_t = ScrapeMode::Auto)]
        mode: ScrapeMode,
        /// Attach a full-page screenshot (browser only).
        #[arg(long)]
        screenshot: bool,
        /// Print only the fields sent for analysis.
        #[arg(long)]
        analysis: bool,
    },
    /// Check that a URL is scrapeable and print its platform.
    ValidateUrl { url: String },
    Carriers {
        #[command(subcommand)]
        command: CarrierCommands,
    },
    /// Track one parcel.
    Track {
        carrier: String,
        tracking_number: String,
        /// Record the result for this store.
        #[arg(long)]
        store: Option<String>,
        #[arg(long)]
        memo: Option<String>,
    },
    Trackings {
        #[command(subcommand)]
        command: TrackingCommands,
    },
    Deliveries {
        #[command(subcommand)]
        command: DeliveryCommands,
    },
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum CarrierCommands {
    List,
    /// Candidate carriers for a tracking number, best match first.
    Predict { tracking_number: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StatusFilter {
    InProgress,
    Delivered,
}

impl From<StatusFilter> for DeliveryStatus {
    fn from(filter: StatusFilter) -> Self {
        match filter {
            StatusFilter::InProgress => DeliveryStatus::InProgress,
            StatusFilter::Delivered => DeliveryStatus::Delivered,
        }
    }
}

#[derive(Debug, Subcommand)]
enum TrackingCommands {
    List {
        #[arg(long)]
        store: String,
        #[arg(long, value_enum)]
        status: Option<StatusFilter>,
    },
    Delete {
        id: i64,
        #[arg(long)]
        store: String,
    },
}

#[derive(Debug, Subcommand)]
enum DeliveryCommands {
    /// Re-track in-progress parcels once.
    Check {
        #[arg(long)]
        store: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Run checks at the configured KST hours until interrupted.
    Watch {
        /// Stores to schedule; all stores when omitted.
        #[arg(long = "store")]
        stores: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Ping,
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("storedesk: no command given; see --help");
        return Ok(());
    };

    dotenvy::dotenv().ok();
    let config = storedesk_core::load_app_config_from_env()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(
        env = %config.env,
        persistent = config.database_url.is_some(),
        "configuration loaded"
    );

    match command {
        Commands::Scrape {
            url,
            mode,
            screenshot,
            analysis,
        } => scrape::run_scrape(&config, &url, mode, screenshot, analysis).await,
        Commands::ValidateUrl { url } => scrape::run_validate_url(&url),
        Commands::Carriers { command } => {
            run_carriers(&command);
            Ok(())
        }
        Commands::Track {
            carrier,
            tracking_number,
            store: store_id,
            memo,
        } => {
            let store = Store::open(&config).await?;
            let tracker = CarrierTracker::new(config.carrier_request_timeout_secs)?;
            let (info, saved) = deliveries::run_track(
                &store,
                &tracker,
                &carrier,
                &tracking_number,
                store_id.as_deref(),
                memo.as_deref(),
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
            if let Some(row) = saved {
                println!("saved tracking {} ({})", row.id, row.status);
            }
            Ok(())
        }
        Commands::Trackings { command } => {
            let store = Store::open(&config).await?;
            match command {
                TrackingCommands::List { store: id, status } => {
                    deliveries::run_trackings_list(&store, &id, status.map(Into::into)).await
                }
                TrackingCommands::Delete { id, store: store_id } => {
                    deliveries::run_trackings_delete(&store, id, &store_id).await
                }
            }
        }
        Commands::Deliveries { command } => run_deliveries(&config, command).await,
        Commands::Db { command } => run_db(&config, &command).await,
    }
}

fn run_carriers(command: &CarrierCommands) {
    match command {
        CarrierCommands::List => {
            for carrier in all_carriers() {
                println!("{:<12}  {:<20}  {}", carrier.id, carrier.name, carrier.display_name);
            }
        }
        CarrierCommands::Predict { tracking_number } => {
            let candidates = predict_carriers(tracking_number);
            if candidates.is_empty() {
                println!("no carrier matches '{tracking_number}'");
            }
            for carrier in candidates {
                println!("{:<12}  {}", carrier.id, carrier.display_name);
            }
        }
    }
}

fn paced_tracker(config: &AppConfig) -> anyhow::Result<PacedTracker<CarrierTracker>> {
    Ok(PacedTracker::new(
        CarrierTracker::new(config.carrier_request_timeout_secs)?,
        Duration::from_millis(config.tracking_inter_call_delay_ms),
    ))
}

async fn run_deliveries(config: &AppConfig, command: DeliveryCommands) -> anyhow::Result<()> {
    let store = Arc::new(Store::open(config).await?);
    let tracker = Arc::new(paced_tracker(config)?);

    match command {
        DeliveryCommands::Check { store: store_id, limit } => {
            let limit = limit.unwrap_or(config.delivery_check_batch_limit);
            let summary =
                deliveries::run_delivery_check(&*store, &*tracker, store_id.as_deref(), limit)
                    .await?;
            println!(
                "checked {} · updated {} · delivered {} · not found {} · failed {}",
                summary.checked,
                summary.updated,
                summary.delivered,
                summary.not_found,
                summary.failed
            );
            Ok(())
        }
        DeliveryCommands::Watch { stores } => {
            let limit = config.delivery_check_batch_limit;
            let check: CheckFn = Arc::new(move |store_id: String| -> CheckFuture {
                let store = Arc::clone(&store);
                let tracker = Arc::clone(&tracker);
                Box::pin(async move {
                    let scope = (store_id != ALL_STORES).then_some(store_id.as_str());
                    if let Err(e) =
                        deliveries::run_delivery_check(&*store, &*tracker, scope, limit).await
                    {
                        tracing::error!(store_id = %store_id, error = %e, "delivery check failed");
                    }
                })
            });

            let mut scheduler =
                DeliveryScheduler::start(config.delivery_check_hours.clone(), check).await?;
            if stores.is_empty() {
                scheduler.register(ALL_STORES).await?;
            }
            for store_id in &stores {
                scheduler.register(store_id).await?;
            }
            tracing::info!(
                stores = ?scheduler.registered_stores(),
                hours_kst = ?config.delivery_check_hours,
                "delivery checks scheduled; press Ctrl-C to stop"
            );

            tokio::signal::ctrl_c().await?;
            tracing::info!("shutting down scheduler");
            scheduler.shutdown().await?;
            Ok(())
        }
    }
}

async fn run_db(config: &AppConfig, command: &DbCommands) -> anyhow::Result<()> {
    let database_url = config
        .database_url
        .as_deref()
        .ok_or(storedesk_db::DbError::MissingDatabaseUrl)?;
    let pool = storedesk_db::connect_pool(
        database_url,
        storedesk_db::PoolConfig::from_app_config(config),
    )
    .await?;

    match command {
        DbCommands::Ping => {
            storedesk_db::health_check(&pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = storedesk_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
