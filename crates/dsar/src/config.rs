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

//! Configuration for the data request workflow.
//!
//! Use [`WorkflowConfig::builder()`] in code or [`WorkflowConfig::from_env()`]
//! to read `DSAR_*` variables (a `.env` file is loaded first when present).
//!
//! ```rust,ignore
//! let config = WorkflowConfig::builder()
//!     .database_url("dsar.db")
//!     .context_chunk_size(500)
//!     .build()?;
//! ```

use std::time::Duration;

use crate::dal::DEFAULT_CHUNK_SIZE;
use crate::error::ConfigError;

const ENV_DATABASE_URL: &str = "DSAR_DATABASE_URL";
const ENV_DB_POOL_SIZE: &str = "DSAR_DB_POOL_SIZE";
const ENV_CONTEXT_CHUNK_SIZE: &str = "DSAR_CONTEXT_CHUNK_SIZE";
const ENV_RELAY_BATCH_SIZE: &str = "DSAR_RELAY_BATCH_SIZE";
const ENV_RELAY_POLL_INTERVAL_MS: &str = "DSAR_RELAY_POLL_INTERVAL_MS";
const ENV_RELAY_RETRY_DELAY_MS: &str = "DSAR_RELAY_RETRY_DELAY_MS";

/// Upper bound on the backoff between dispatch attempts of one task.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(3600);

/// Workflow settings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct WorkflowConfig {
    database_url: String,
    db_pool_size: usize,
    context_chunk_size: usize,
    relay_batch_size: usize,
    relay_poll_interval: Duration,
    relay_retry_delay: Duration,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            database_url: "dsar.db".to_string(),
            db_pool_size: 1,
            context_chunk_size: DEFAULT_CHUNK_SIZE,
            relay_batch_size: 50,
            relay_poll_interval: Duration::from_secs(5),
            relay_retry_delay: Duration::from_secs(1),
        }
    }
}

impl WorkflowConfig {
    /// Creates a new configuration builder with default values.
    pub fn builder() -> WorkflowConfigBuilder {
        WorkflowConfigBuilder::default()
    }

    /// Reads overrides from the environment on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut builder = Self::builder();
        if let Some(url) = lookup(ENV_DATABASE_URL) {
            builder = builder.database_url(url);
        }
        if let Some(raw) = lookup(ENV_DB_POOL_SIZE) {
            builder = builder.db_pool_size(parse_number(ENV_DB_POOL_SIZE, &raw)?);
        }
        if let Some(raw) = lookup(ENV_CONTEXT_CHUNK_SIZE) {
            builder = builder.context_chunk_size(parse_number(ENV_CONTEXT_CHUNK_SIZE, &raw)?);
        }
        if let Some(raw) = lookup(ENV_RELAY_BATCH_SIZE) {
            builder = builder.relay_batch_size(parse_number(ENV_RELAY_BATCH_SIZE, &raw)?);
        }
        if let Some(raw) = lookup(ENV_RELAY_POLL_INTERVAL_MS) {
            let millis: u64 = parse_number(ENV_RELAY_POLL_INTERVAL_MS, &raw)?;
            builder = builder.relay_poll_interval(Duration::from_millis(millis));
        }
        if let Some(raw) = lookup(ENV_RELAY_RETRY_DELAY_MS) {
            let millis: u64 = parse_number(ENV_RELAY_RETRY_DELAY_MS, &raw)?;
            builder = builder.relay_retry_delay(Duration::from_millis(millis));
        }
        builder.build()
    }

    /// Rejects settings the workflow cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_pool_size == 0 {
            return Err(ConfigError::ZeroSize { key: ENV_DB_POOL_SIZE });
        }
        if self.context_chunk_size == 0 {
            return Err(ConfigError::ZeroSize {
                key: ENV_CONTEXT_CHUNK_SIZE,
            });
        }
        if self.relay_batch_size == 0 {
            return Err(ConfigError::ZeroSize {
                key: ENV_RELAY_BATCH_SIZE,
            });
        }
        Ok(())
    }

    /// SQLite location for the store.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Number of pooled connections.
    pub fn db_pool_size(&self) -> usize {
        self.db_pool_size
    }

    /// Maximum ids per statement in bulk context status updates.
    pub fn context_chunk_size(&self) -> usize {
        self.context_chunk_size
    }

    /// Maximum outbox entries the relay dispatches per pass.
    pub fn relay_batch_size(&self) -> usize {
        self.relay_batch_size
    }

    /// Pause between relay passes when the outbox is empty.
    pub fn relay_poll_interval(&self) -> Duration {
        self.relay_poll_interval
    }

    /// Base delay before a task that failed to dispatch is offered again.
    /// Doubles with each further failure, up to [`MAX_RETRY_DELAY`].
    pub fn relay_retry_delay(&self) -> Duration {
        self.relay_retry_delay
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}

/// Builder for [`WorkflowConfig`].
#[derive(Debug, Clone, Default)]
pub struct WorkflowConfigBuilder {
    config: WorkflowConfig,
}

impl WorkflowConfigBuilder {
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = url.into();
        self
    }

    pub fn db_pool_size(mut self, size: usize) -> Self {
        self.config.db_pool_size = size;
        self
    }

    pub fn context_chunk_size(mut self, size: usize) -> Self {
        self.config.context_chunk_size = size;
        self
    }

    pub fn relay_batch_size(mut self, size: usize) -> Self {
        self.config.relay_batch_size = size;
        self
    }

    pub fn relay_poll_interval(mut self, interval: Duration) -> Self {
        self.config.relay_poll_interval = interval;
        self
    }

    pub fn relay_retry_delay(mut self, delay: Duration) -> Self {
        self.config.relay_retry_delay = delay;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<WorkflowConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
