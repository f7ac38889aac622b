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

//! # dsar
//!
//! Data subject request workflow: export and erasure requests move through
//! discovery, officer approval and processing, with pluggable collectors
//! doing the per-component work in the background.
//!
//! ## Components
//!
//! - [`RequestRegistry`]: creates, lists and transitions requests, and
//!   enforces who may act on them
//! - [`ContextLedger`]: records the contexts in scope for each request and
//!   their approval status
//! - [`OutboxRelay`] and [`RequestTaskRunner`]: deliver queued `initiate`
//!   and `process` tasks to the collectors
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use dsar::*;
//! use std::sync::Arc;
//!
//! init_logging(None);
//! let config = WorkflowConfig::from_env()?;
//! let database = Database::connect(config.database_url(), config.db_pool_size())?;
//! database.run_migrations().await?;
//! let dal = DAL::new(database);
//!
//! let registry = RequestRegistry::new(dal.clone(), access, policy, notifier, config.clone());
//! let runner = RequestTaskRunner::new(registry.clone()).with_collector(forum_collector);
//! let relay = Arc::new(OutboxRelay::new(dal, Arc::new(runner), &config));
//!
//! let request = registry.create_request(subject, subject, RequestType::Export, "").await?;
//! relay.run_once().await?; // discovery
//! registry.approve(officer, request.id).await?;
//! relay.run_once().await?; // export
//! ```
//!
//! External systems plug in through [`AccessControl`], [`Notifier`],
//! [`PolicyOracle`], [`DataCollector`] and [`TaskDispatcher`].

pub mod access;
pub mod audit;
pub mod config;
pub mod dal;
pub mod database;
pub mod dispatcher;
pub mod error;
pub mod ledger;
pub mod models;
pub mod notifier;
pub mod policy;
pub mod registry;
pub mod tasks;

pub use access::{capabilities, AccessControl, Scope};
pub use config::{WorkflowConfig, WorkflowConfigBuilder};
pub use dal::DAL;
pub use database::Database;
pub use dispatcher::{OutboxRelay, TaskDispatcher};
pub use error::{
    CollectorError, ConfigError, DispatchError, NotifyError, StoreError, ValidationError,
    WorkflowError,
};
pub use ledger::ContextLedger;
pub use models::{
    is_active, ApprovedContextlist, ContextId, ContextStatus, ContextlistCollection, DataRequest,
    QueuedTask, RequestContext, RequestId, RequestStatus, RequestType, TaskKind, TaskPayload,
    UserId,
};
pub use notifier::Notifier;
pub use policy::{NoProtectedContexts, PolicyOracle};
pub use registry::RequestRegistry;
pub use tasks::{DataCollector, RequestTaskRunner};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs a formatting subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `level` (default `info`) applies.
/// Does nothing if a global subscriber is already installed.
pub fn init_logging(level: Option<tracing::Level>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(level.unwrap_or(tracing::Level::INFO).as_str().to_lowercase())
    });

    let _ = tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init();
}
