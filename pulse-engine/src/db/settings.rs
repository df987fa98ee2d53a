//! Settings table access
//!
//! **[VPE-CFG-020]** Key-value persistence for runtime settings, including
//! the external busyness provider API key.

use sqlx::SqlitePool;
use std::fmt::Display;
use std::str::FromStr;

use pulse_common::Result;

pub const BUSYNESS_API_KEY_SETTING: &str = "busyness_api_key";

/// Read a typed setting. Missing keys and unparseable values both read as
/// `None`.
pub async fn get_setting<T: FromStr>(pool: &SqlitePool, key: &str) -> Result<Option<T>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    Ok(value.and_then(|v| v.parse::<T>().ok()))
}

/// Write a setting, replacing any existing value.
pub async fn set_setting<T: Display>(pool: &SqlitePool, key: &str, value: T) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Busyness provider API key stored in the database, if any.
pub async fn get_busyness_api_key(pool: &SqlitePool) -> Result<Option<String>> {
    let key: Option<String> = get_setting(pool, BUSYNESS_API_KEY_SETTING).await?;
    Ok(key.filter(|k| !k.trim().is_empty()))
}

/// Store the busyness provider API key in the database.
pub async fn set_busyness_api_key(pool: &SqlitePool, api_key: &str) -> Result<()> {
    set_setting(pool, BUSYNESS_API_KEY_SETTING, api_key).await
}
