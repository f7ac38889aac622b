/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Database connection management.
//!
//! This module provides an async connection pool using `deadpool-diesel` over
//! SQLite. Connections are handed to blocking closures through
//! [`Database::interact`], which runs them on the pool's worker threads.
//!
//! Every connection waits up to [`BUSY_TIMEOUT_MS`] for a competing writer
//! instead of failing with `database is locked`, and file databases run in
//! WAL mode so readers do not block the writer.
//!
//! # Example
//!
//! ```rust,ignore
//! use dsar::database::Database;
//!
//! let db = Database::connect("file:dsar?mode=memory&cache=shared", 1)?;
//! db.run_migrations().await?;
//! ```

use deadpool_diesel::sqlite::{Manager as SqliteManager, Pool as SqlitePool, Runtime};
use diesel::prelude::*;
use diesel::SqliteConnection;
use diesel_migrations::MigrationHarness;
use tracing::info;

use super::MIGRATIONS;
use crate::error::StoreError;

/// How long a connection waits on a locked database before giving up.
pub const BUSY_TIMEOUT_MS: u32 = 30_000;

/// Represents a pool of database connections.
///
/// `Database` is `Clone`; every clone shares the same underlying pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    url: String,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("url", &self.url)
            .field("max_size", &self.pool.status().max_size)
            .finish()
    }
}

impl Database {
    /// Creates a connection pool for the given SQLite location.
    ///
    /// Accepts a file path, a `sqlite://` URL, `:memory:` or a `file:` URI
    /// (e.g. `file:name?mode=memory&cache=shared`).
    ///
    /// SQLite serialises writers. Larger pools are safe for file databases:
    /// write transactions take the write lock up front and wait for it, so
    /// racing transitions resolve to one winner and an `InvalidState` for
    /// the rest. Shared-cache in-memory databases report table locks
    /// without waiting, so keep those at a pool size of 1.
    pub fn connect(connection_string: &str, max_size: usize) -> Result<Self, StoreError> {
        let url = Self::build_sqlite_url(connection_string);
        let manager = SqliteManager::new(url.clone(), Runtime::Tokio1);
        let pool = SqlitePool::builder(manager)
            .max_size(max_size.max(1))
            .build()
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        info!(url = %url, max_size, "SQLite connection pool initialized");

        Ok(Self { pool, url })
    }

    fn build_sqlite_url(connection_string: &str) -> String {
        connection_string
            .strip_prefix("sqlite://")
            .unwrap_or(connection_string)
            .to_string()
    }

    /// The connection string the pool was built with.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the connection pool.
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    /// Runs `f` with a pooled connection on a blocking worker thread.
    ///
    /// The connection's busy timeout is set before `f` runs.
    pub async fn interact<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut SqliteConnection) -> R + Send + 'static,
        R: Send + 'static,
    {
        let conn = self
            .pool
            .get()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        conn.interact(move |conn| {
            diesel::sql_query(format!("PRAGMA busy_timeout={BUSY_TIMEOUT_MS};"))
                .execute(conn)
                .map(|_| f(conn))
        })
        .await
        .map_err(|e| StoreError::ConnectionPool(e.to_string()))?
        .map_err(StoreError::Database)
    }

    /// Applies any pending embedded migrations.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        let applied = self
            .interact(|conn| {
                // In-memory databases answer "memory" and stay as they are.
                diesel::sql_query("PRAGMA journal_mode=WAL;")
                    .execute(conn)
                    .map_err(|e| e.to_string())?;
                conn.run_pending_migrations(MIGRATIONS)
                    .map(|versions| versions.len())
                    .map_err(|e| e.to_string())
            })
            .await?
            .map_err(StoreError::Migration)?;

        info!(applied, "Database migrations complete");
        Ok(())
    }
}
