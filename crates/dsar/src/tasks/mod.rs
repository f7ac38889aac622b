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

//! Background work for data requests.
//!
//! A [`DataCollector`] knows where one component keeps personal data. The
//! [`RequestTaskRunner`] drives the collectors for the `initiate` and
//! `process` tasks queued by the registry.

mod runner;

pub use runner::RequestTaskRunner;

use async_trait::async_trait;

use crate::error::CollectorError;
use crate::models::{ContextId, UserId};

/// Locates, exports and erases one component's personal data.
#[async_trait]
pub trait DataCollector: Send + Sync {
    /// Component name; contexts discovered by this collector are stored
    /// under it.
    fn component(&self) -> &str;

    /// Contexts holding data about the subject.
    async fn discover(&self, subject_id: UserId) -> Result<Vec<ContextId>, CollectorError>;

    /// Exports the subject's data in the given contexts.
    async fn export(&self, subject_id: UserId, context_ids: &[ContextId])
        -> Result<(), CollectorError>;

    /// Erases the subject's data in the given contexts.
    async fn erase(&self, subject_id: UserId, context_ids: &[ContextId])
        -> Result<(), CollectorError>;
}
