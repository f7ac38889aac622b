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

use std::sync::{Arc, Once};
use std::time::Duration;

use dsar::{
    AccessControl, Database, Notifier, PolicyOracle, RequestRegistry, WorkflowConfig,
    WorkflowConfigBuilder, DAL,
};
use tempfile::TempDir;
use tracing::info;

static INIT: Once = Once::new();

/// A migrated, private SQLite store.
///
/// By default each instance gets a uniquely named shared-cache in-memory
/// database that lives as long as the instance's pool.
/// [`file_backed`](Self::file_backed) uses a database file in a temporary
/// directory instead, for tests that need several pooled connections.
///
/// The relay retries failed tasks without delay unless a test configures
/// one through [`with_config`](Self::with_config).
pub struct TestDatabase {
    dal: DAL,
    config: WorkflowConfig,
    _dir: Option<TempDir>,
}

impl TestDatabase {
    pub async fn new() -> Self {
        Self::with_config(|builder| builder).await
    }

    /// Uses a small chunk size to exercise multi-chunk bulk updates.
    pub async fn with_chunk_size(chunk_size: usize) -> Self {
        Self::with_config(|builder| builder.context_chunk_size(chunk_size)).await
    }

    /// An in-memory store whose test defaults are adjusted by `customize`.
    pub async fn with_config(
        customize: impl FnOnce(WorkflowConfigBuilder) -> WorkflowConfigBuilder,
    ) -> Self {
        let url = format!(
            "file:dsar_test_{}?mode=memory&cache=shared",
            uuid::Uuid::new_v4().simple()
        );
        let builder = customize(Self::defaults().database_url(url));
        Self::open(builder, None).await
    }

    /// A store in a temporary database file served by `pool_size`
    /// connections. The file is removed when the instance is dropped.
    pub async fn file_backed(pool_size: usize) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temporary directory");
        let path = dir.path().join("dsar.db");
        let builder = Self::defaults()
            .database_url(path.to_string_lossy().into_owned())
            .db_pool_size(pool_size);
        Self::open(builder, Some(dir)).await
    }

    fn defaults() -> WorkflowConfigBuilder {
        WorkflowConfig::builder()
            .relay_batch_size(10)
            .relay_poll_interval(Duration::from_millis(20))
            .relay_retry_delay(Duration::ZERO)
    }

    async fn open(builder: WorkflowConfigBuilder, dir: Option<TempDir>) -> Self {
        INIT.call_once(|| dsar::init_logging(None));

        let config = builder.build().expect("test configuration is valid");

        let database = Database::connect(config.database_url(), config.db_pool_size())
            .expect("Failed to create test database pool");
        database
            .run_migrations()
            .await
            .expect("Failed to run migrations");

        info!(
            url = %config.database_url(),
            pool_size = config.db_pool_size(),
            "Test database ready"
        );

        Self {
            dal: DAL::new(database),
            config,
            _dir: dir,
        }
    }

    pub fn dal(&self) -> &DAL {
        &self.dal
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn registry(
        &self,
        access: Arc<dyn AccessControl>,
        policy: Arc<dyn PolicyOracle>,
        notifier: Arc<dyn Notifier>,
    ) -> RequestRegistry {
        RequestRegistry::new(
            self.dal.clone(),
            access,
            policy,
            notifier,
            self.config.clone(),
        )
    }
}
