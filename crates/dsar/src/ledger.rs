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

//! Context Approval Ledger.
//!
//! Records which contexts are in scope for a data request, grouped by the
//! component that reported them, and tracks a per-context approval status.
//! The ledger never changes request status; that belongs to the
//! [`RequestRegistry`](crate::registry::RequestRegistry).

use std::sync::Arc;

use crate::audit;
use crate::dal::DAL;
use crate::error::WorkflowError;
use crate::models::{
    ApprovedContextlist, ContextId, ContextStatus, ContextlistCollection, DataRequest,
    RequestContext, RequestId, RequestType,
};
use crate::policy::PolicyOracle;

/// Ledger of contexts attached to data requests.
#[derive(Clone)]
pub struct ContextLedger {
    dal: DAL,
    policy: Arc<dyn PolicyOracle>,
    chunk_size: usize,
}

impl std::fmt::Debug for ContextLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextLedger")
            .field("chunk_size", &self.chunk_size)
            .finish_non_exhaustive()
    }
}

impl ContextLedger {
    pub fn new(dal: DAL, policy: Arc<dyn PolicyOracle>, chunk_size: usize) -> Self {
        Self {
            dal,
            policy,
            chunk_size,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Stores a collection of contexts against a request with `status`.
    ///
    /// Every component gets its own contextlist, even when none of its
    /// contexts survive filtering. For erasure requests, contexts the
    /// policy oracle reports as protected are left out. Returns the number
    /// of contexts stored.
    pub async fn add_contexts(
        &self,
        collection: &ContextlistCollection,
        request_id: RequestId,
        status: ContextStatus,
    ) -> Result<usize, WorkflowError> {
        let request = self.dal.data_request().get_by_id(request_id).await?;
        let filter_protected = request.request_type == RequestType::Delete;

        let mut entries: Vec<(String, Vec<ContextId>)> = Vec::with_capacity(collection.len());
        let mut skipped = 0;
        for (component, context_ids) in collection.iter() {
            let mut kept = Vec::with_capacity(context_ids.len());
            for &context_id in context_ids {
                if filter_protected && self.policy.is_protected(context_id).await {
                    audit::log_protected_context_skipped(request_id, component, context_id);
                    skipped += 1;
                    continue;
                }
                kept.push(context_id);
            }
            entries.push((component.to_string(), kept));
        }

        let components = entries.len();
        let stored = self
            .dal
            .contextlist()
            .insert_collection(request_id, entries, status)
            .await?;

        audit::log_contexts_added(request_id, components, stored, skipped);
        Ok(stored)
    }

    /// Sets `status` on every context of the request. Calling it again with
    /// the same status changes nothing further.
    pub async fn update_contexts_status(
        &self,
        request_id: RequestId,
        status: ContextStatus,
    ) -> Result<usize, WorkflowError> {
        let updated = self
            .dal
            .contextlist()
            .update_status_for_request(request_id, status, self.chunk_size)
            .await?;
        audit::log_contexts_status_changed(request_id, status.as_str(), updated);
        Ok(updated)
    }

    /// Approved contexts of the request grouped by component, in component
    /// name order. Components without approved contexts are omitted.
    pub async fn get_approved_collection(
        &self,
        request: &DataRequest,
    ) -> Result<Vec<ApprovedContextlist>, WorkflowError> {
        let pairs = self.dal.contextlist().approved_for_request(request.id).await?;
        Ok(group_by_component(request, pairs))
    }

    /// Every context stored for the request, with component and status.
    pub async fn contexts_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<Vec<RequestContext>, WorkflowError> {
        self.dal.contextlist().list_for_request(request_id).await
    }
}

/// Groups `(component, context_id)` pairs already sorted by component.
fn group_by_component(
    request: &DataRequest,
    pairs: Vec<(String, ContextId)>,
) -> Vec<ApprovedContextlist> {
    let mut groups: Vec<ApprovedContextlist> = Vec::new();
    for (component, context_id) in pairs {
        match groups.last_mut() {
            Some(last) if last.component == component => last.context_ids.push(context_id),
            _ => groups.push(ApprovedContextlist {
                subject_id: request.subject_id,
                component,
                context_ids: vec![context_id],
            }),
        }
    }
    groups
}
