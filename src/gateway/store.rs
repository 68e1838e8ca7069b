//! Device identity store.
//!
//! A single-row SQLite database (device.db) holding the identity the gateway
//! assigned this client. Session and protocol material stay on the gateway
//! side; locally there is nothing else to persist.
//!
//! Orchestration code only reads the row. It is written by the protocol
//! client when the gateway confirms a link, and deleted by `tether unlink`.

use super::traits::{GatewayError, GatewayResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Identity of this client instance, assigned by the gateway on first link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub device_id: String,
    pub created_at_ms: u64,
}

/// Handle to the local device database. Cheap to clone; clones share the
/// connection pool.
#[derive(Clone)]
pub struct DeviceStore {
    pool: SqlitePool,
}

impl DeviceStore {
    /// Open (or create) the device database at `path`.
    pub async fn open(path: &Path) -> GatewayResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                GatewayError::Protocol(format!(
                    "failed to create store directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS device (
                id INTEGER PRIMARY KEY CHECK (id = 0),
                device_id TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    /// The stored identity, or None on a first run
    pub async fn device_identity(&self) -> GatewayResult<Option<DeviceIdentity>> {
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT device_id, created_at FROM device WHERE id = 0")
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(device_id, created_at)| DeviceIdentity {
            device_id,
            created_at_ms: created_at as u64,
        }))
    }

    /// Persist the identity the gateway assigned after a successful link.
    ///
    /// Replaces any previous row; the store holds exactly one device.
    pub async fn create_identity(&self, device_id: &str) -> GatewayResult<DeviceIdentity> {
        let created_at_ms = now_ms();

        sqlx::query("INSERT OR REPLACE INTO device (id, device_id, created_at) VALUES (0, ?1, ?2)")
            .bind(device_id)
            .bind(created_at_ms as i64)
            .execute(&self.pool)
            .await?;

        Ok(DeviceIdentity {
            device_id: device_id.to_string(),
            created_at_ms,
        })
    }

    /// Remove the stored identity. Returns true when a row was deleted.
    pub async fn delete_identity(&self) -> GatewayResult<bool> {
        let result = sqlx::query("DELETE FROM device WHERE id = 0")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}
