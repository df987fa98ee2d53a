//! pulse-engine - Venue activity scoring daemon
//!
//! **[VPE-OV-010]** Computes a normalized 0-10 activity score per venue by
//! fusing first-party telemetry, community reports/pings, and an external
//! busyness estimate. Scores are refreshed on a fixed interval for every
//! venue and on demand when community submissions arrive.

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use pulse_common::config as common_config;
use pulse_common::events::{EventBus, PulseEvent};

use pulse_engine::services::busyness::HttpBusynessProvider;
use pulse_engine::{config, db, PulseApp};

#[tokio::main]
async fn main() -> Result<()> {
    // Step 1: Load TOML config (missing file means defaults)
    let toml_path = common_config::default_config_path()?;
    let toml_config = common_config::load_toml_config(&toml_path)?;

    // Initialize tracing; RUST_LOG overrides the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&toml_config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting pulse-engine (venue activity scoring)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    #[cfg(unix)]
    if toml_path.exists() && common_config::check_toml_permissions_loose(&toml_path)? {
        warn!(
            "Config file {} is readable by other users; consider chmod 600",
            toml_path.display()
        );
    }

    // Step 2: Resolve root folder (CLI arg > env > TOML > default)
    let cli_root = std::env::args().nth(1);
    let root_folder = common_config::resolve_root_folder(cli_root.as_deref(), &toml_config);
    common_config::ensure_root_folder(&root_folder)?;
    info!("Root folder: {}", root_folder.display());

    // Step 3: Open or create database
    let db_path = common_config::database_path(&root_folder);
    info!("Database: {}", db_path.display());
    let pool = db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    // Event bus carries score updates and re-score requests
    let bus = EventBus::new(100);

    // Step 4: Resolve busyness API key (Database > ENV > TOML); absence
    // just disables the external provider
    let api_key = match config::resolve_busyness_api_key(&pool, &toml_config).await? {
        Some((key, source)) => {
            if source != "database" {
                if let Err(e) =
                    config::migrate_key_to_database(key.clone(), source, &pool, &toml_path).await
                {
                    warn!("API key migration failed: {}", e);
                }
            }
            key
        }
        None => String::new(),
    };
    let provider = Arc::new(HttpBusynessProvider::new(api_key)?);

    // Step 5: Assemble the engine
    let store = Arc::new(db::SqliteStore::new(pool.clone()));
    let app = PulseApp::new(
        store,
        provider,
        bus.clone(),
        toml_config.refresh.chunk_size,
    );

    // Step 6: On-demand rescoring driven by community submissions
    let rescore_coordinator = app.coordinator.clone();
    let mut rescore_rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rescore_rx.recv().await {
                Ok(PulseEvent::RescoreRequested { venue_id, trigger, .. }) => {
                    info!("Re-scoring venue {} (trigger: {:?})", venue_id, trigger);
                    if let Err(e) = rescore_coordinator.update_venue(venue_id).await {
                        warn!("On-demand re-score failed for venue {}: {}", venue_id, e);
                    }
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Re-score consumer lagged, skipped {} events", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Step 7: Periodic full refresh until shutdown
    let interval_minutes = toml_config.refresh.interval_minutes.max(1);
    info!(
        "Refreshing all venues every {} min (chunk size {})",
        interval_minutes, toml_config.refresh.chunk_size
    );

    let coordinator = app.coordinator.clone();
    let refresh_loop = async {
        let mut ticker =
            tokio::time::interval(std::time::Duration::from_secs(interval_minutes * 60));
        loop {
            ticker.tick().await;
            match coordinator.update_all().await {
                Ok(summary) => {
                    if let Some(top) = summary.notable.first() {
                        info!(
                            "Top venue this pass: {} at {:.1}",
                            top.name, top.score
                        );
                    }
                }
                Err(e) => error!("Batch refresh failed: {}", e),
            }
        }
    };

    tokio::select! {
        _ = refresh_loop => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    info!("pulse-engine stopped");
    Ok(())
}
