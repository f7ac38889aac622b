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

//! In-process executor for queued data request tasks.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::DataCollector;
use crate::audit;
use crate::dispatcher::{DispatchError, TaskDispatcher};
use crate::error::{CollectorError, WorkflowError};
use crate::models::{
    ContextStatus, ContextlistCollection, DataRequest, QueuedTask, RequestStatus, RequestType,
    TaskKind, TaskPayload,
};
use crate::registry::RequestRegistry;

const DISCOVERABLE: &[RequestStatus] = &[RequestStatus::Pending, RequestStatus::Preprocessing];
const PROCESSABLE: &[RequestStatus] = &[RequestStatus::Approved, RequestStatus::Processing];
const PREPROCESSING: &[RequestStatus] = &[RequestStatus::Preprocessing];
const PROCESSING: &[RequestStatus] = &[RequestStatus::Processing];

/// Runs `initiate` and `process` tasks against registered collectors.
///
/// Tasks for requests that have moved on (cancelled, rejected, already
/// complete) are acknowledged without doing anything, so repeated delivery
/// is harmless.
#[derive(Clone)]
pub struct RequestTaskRunner {
    registry: RequestRegistry,
    collectors: BTreeMap<String, Arc<dyn DataCollector>>,
}

impl RequestTaskRunner {
    pub fn new(registry: RequestRegistry) -> Self {
        Self {
            registry,
            collectors: BTreeMap::new(),
        }
    }

    /// Registers a collector under its component name, replacing any
    /// collector registered for the same component.
    pub fn with_collector(mut self, collector: Arc<dyn DataCollector>) -> Self {
        self.collectors
            .insert(collector.component().to_string(), collector);
        self
    }

    /// Discovers the subject's contexts and hands the request to officers.
    pub async fn initiate(&self, payload: &TaskPayload) -> Result<(), WorkflowError> {
        let request = self.registry.get_request(payload.request_id).await?;
        if !DISCOVERABLE.contains(&request.status) {
            debug!(
                request_id = request.id,
                status = request.status.as_str(),
                "Skipping discovery for request no longer pending"
            );
            return Ok(());
        }

        let Some(request) = self
            .step(&request, DISCOVERABLE, RequestStatus::Preprocessing, "start discovery")
            .await?
        else {
            return Ok(());
        };

        // Contexts from an earlier interrupted attempt are already stored.
        let existing = self
            .registry
            .dal()
            .contextlist()
            .count_for_request(request.id)
            .await?;
        if request.request_type != RequestType::Other && existing == 0 {
            let collection = self.discover(&request).await?;
            self.registry
                .ledger()
                .add_contexts(&collection, request.id, ContextStatus::Pending)
                .await?;
        }

        let Some(request) = self
            .step(
                &request,
                PREPROCESSING,
                RequestStatus::AwaitingApproval,
                "finish discovery",
            )
            .await?
        else {
            return Ok(());
        };

        let failed = self.registry.notify_officers(&request).await;
        if failed > 0 {
            warn!(
                request_id = request.id,
                failed, "Some officers could not be notified"
            );
        }
        Ok(())
    }

    /// Exports or erases the approved contexts and completes the request.
    ///
    /// A collector failure leaves the request at `Processing` and is
    /// returned so the task is retried.
    pub async fn process(&self, payload: &TaskPayload) -> Result<(), WorkflowError> {
        let request = self.registry.get_request(payload.request_id).await?;
        if !PROCESSABLE.contains(&request.status) {
            debug!(
                request_id = request.id,
                status = request.status.as_str(),
                "Skipping processing for request not approved"
            );
            return Ok(());
        }

        let Some(request) = self
            .step(&request, PROCESSABLE, RequestStatus::Processing, "start processing")
            .await?
        else {
            return Ok(());
        };

        let approved = self.registry.ledger().get_approved_collection(&request).await?;
        for list in &approved {
            let collector = self.collector(&list.component)?;
            match request.request_type {
                RequestType::Export => {
                    let export_as = payload.export_as.unwrap_or(list.subject_id);
                    collector.export(export_as, &list.context_ids).await?;
                }
                RequestType::Delete => {
                    collector.erase(list.subject_id, &list.context_ids).await?;
                }
                RequestType::Other => {}
            }
            debug!(
                request_id = request.id,
                component = %list.component,
                contexts = list.context_ids.len(),
                "Component processed"
            );
        }

        let Some(request) = self
            .step(&request, PROCESSING, RequestStatus::Complete, "complete")
            .await?
        else {
            return Ok(());
        };
        audit::log_request_completed(&request);

        if let Err(e) = self.registry.notify_completion(&request).await {
            warn!(request_id = request.id, error = %e, "Subject could not be notified");
        }
        Ok(())
    }

    async fn discover(&self, request: &DataRequest) -> Result<ContextlistCollection, WorkflowError> {
        let mut collection = ContextlistCollection::new();
        for (component, collector) in &self.collectors {
            let context_ids = collector.discover(request.subject_id).await?;
            debug!(
                request_id = request.id,
                component = %component,
                contexts = context_ids.len(),
                "Contexts discovered"
            );
            collection.add(component.clone(), context_ids)?;
        }
        Ok(collection)
    }

    fn collector(&self, component: &str) -> Result<&Arc<dyn DataCollector>, CollectorError> {
        self.collectors
            .get(component)
            .ok_or_else(|| CollectorError::new(component, "no collector registered"))
    }

    /// Advances the request unless someone else moved it first, in which
    /// case the task has nothing left to do and `None` is returned.
    async fn step(
        &self,
        request: &DataRequest,
        from: &'static [RequestStatus],
        to: RequestStatus,
        operation: &'static str,
    ) -> Result<Option<DataRequest>, WorkflowError> {
        if request.status == to {
            return Ok(Some(request.clone()));
        }
        match self.registry.advance(request.id, from, to, operation).await {
            Ok(request) => Ok(Some(request)),
            Err(WorkflowError::InvalidState { actual, .. }) => {
                info!(
                    request_id = request.id,
                    status = actual.as_str(),
                    "Request changed while task was running, stopping"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl TaskDispatcher for RequestTaskRunner {
    async fn dispatch(&self, task: &QueuedTask) -> Result<(), DispatchError> {
        match task.kind {
            TaskKind::Initiate => self.initiate(&task.payload).await?,
            TaskKind::Process => self.process(&task.payload).await?,
        }
        Ok(())
    }
}
