//! Configuration resolution for pulse-engine
//!
//! **[VPE-CFG-010]** Multi-tier API key resolution with Database → ENV →
//! TOML priority. Unlike the root folder, the busyness API key is optional;
//! resolution returning `None` just disables the external provider.

use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use pulse_common::config::TomlConfig;
use pulse_common::{Error, Result};

pub const BUSYNESS_API_KEY_ENV: &str = "PULSE_BUSYNESS_API_KEY";

/// Resolve the busyness provider API key from 3-tier configuration.
///
/// Returns the key and the source it came from ("database",
/// "environment", or "TOML"), or `None` when no tier carries a valid key.
pub async fn resolve_busyness_api_key(
    db: &Pool<Sqlite>,
    toml_config: &TomlConfig,
) -> Result<Option<(String, &'static str)>> {
    let mut sources = Vec::new();

    // Tier 1: Database (authoritative)
    let db_key = crate::db::settings::get_busyness_api_key(db).await?;
    if let Some(key) = &db_key {
        if is_valid_key(key) {
            sources.push("database");
        }
    }

    // Tier 2: Environment variable
    let env_key = std::env::var(BUSYNESS_API_KEY_ENV).ok();
    if let Some(key) = &env_key {
        if is_valid_key(key) {
            sources.push("environment");
        }
    }

    // Tier 3: TOML config
    let toml_key = toml_config.busyness_api_key.as_ref();
    if let Some(key) = toml_key {
        if is_valid_key(key) {
            sources.push("TOML");
        }
    }

    if sources.len() > 1 {
        warn!(
            "Busyness API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    if let Some(key) = db_key {
        if is_valid_key(&key) {
            info!("Busyness API key loaded from database");
            return Ok(Some((key, "database")));
        }
    }

    if let Some(key) = env_key {
        if is_valid_key(&key) {
            info!("Busyness API key loaded from environment variable");
            return Ok(Some((key, "environment")));
        }
    }

    if let Some(key) = toml_key {
        if is_valid_key(key) {
            info!("Busyness API key loaded from TOML config");
            return Ok(Some((key.clone(), "TOML")));
        }
    }

    info!("No busyness API key configured; external busyness lookups disabled");
    Ok(None)
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Sync settings from database to TOML file
///
/// HashMap keys: "busyness_api_key"
pub async fn sync_settings_to_toml(
    settings: HashMap<String, String>,
    toml_path: &Path,
) -> Result<()> {
    // Read existing TOML (or use defaults)
    let mut config = if toml_path.exists() {
        let content = std::fs::read_to_string(toml_path)
            .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?
    } else {
        TomlConfig::default()
    };

    if let Some(key) = settings.get("busyness_api_key") {
        config.busyness_api_key = Some(key.clone());
    }

    // Write atomically (best-effort)
    match pulse_common::config::write_toml_config(&config, toml_path) {
        Ok(()) => {
            info!("Settings synced to TOML: {}", toml_path.display());
            Ok(())
        }
        Err(e) => {
            warn!("TOML write failed (database write succeeded): {}", e);
            Ok(()) // Graceful degradation
        }
    }
}

/// Perform auto-migration from ENV/TOML to database + TOML
pub async fn migrate_key_to_database(
    key: String,
    source: &str,
    db: &Pool<Sqlite>,
    toml_path: &Path,
) -> Result<()> {
    // Write to database (authoritative)
    crate::db::settings::set_busyness_api_key(db, &key).await?;

    // Write to TOML if source was ENV (backup)
    if source == "environment" {
        let mut settings = HashMap::new();
        settings.insert("busyness_api_key".to_string(), key);
        sync_settings_to_toml(settings, toml_path).await?;
    }

    info!("Busyness API key migrated from {} to database", source);
    Ok(())
}
