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

//! Task dispatch.
//!
//! Work is queued by writing to the `request_task_outbox` table in the same
//! transaction as the status change that causes it. The [`OutboxRelay`]
//! drains that table and hands each entry to a [`TaskDispatcher`], deleting
//! the entry only once dispatch succeeded. Delivery is therefore
//! at-least-once and dispatchers must tolerate repeats.
//!
//! ```rust,ignore
//! let runner = RequestTaskRunner::new(registry.clone()).with_collector(forum);
//! let relay = Arc::new(OutboxRelay::new(dal, Arc::new(runner), &config));
//! tokio::spawn({ let relay = relay.clone(); async move { relay.run().await } });
//! // ...
//! relay.shutdown();
//! ```

mod relay;

pub use crate::error::DispatchError;
pub use relay::OutboxRelay;

use async_trait::async_trait;

use crate::models::QueuedTask;

/// Executes, or forwards to an executor, one queued task.
#[async_trait]
pub trait TaskDispatcher: Send + Sync {
    /// Returning an error keeps the task queued for a later pass.
    async fn dispatch(&self, task: &QueuedTask) -> Result<(), DispatchError>;
}
