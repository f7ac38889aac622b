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

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dsar::{CollectorError, ContextId, DataCollector, UserId};
use parking_lot::Mutex;

/// One export or erase call received by a [`MemoryCollector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectorCall {
    Export {
        subject_id: UserId,
        context_ids: Vec<ContextId>,
    },
    Erase {
        subject_id: UserId,
        context_ids: Vec<ContextId>,
    },
}

/// Collector over an in-memory map of subject to contexts.
///
/// Erasing removes the erased contexts from what later discovery returns.
#[derive(Debug)]
pub struct MemoryCollector {
    component: String,
    contexts: Mutex<HashMap<UserId, Vec<ContextId>>>,
    calls: Mutex<Vec<CollectorCall>>,
    failing: AtomicBool,
}

impl MemoryCollector {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            contexts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn with_contexts(
        self,
        subject_id: UserId,
        context_ids: impl IntoIterator<Item = ContextId>,
    ) -> Self {
        self.contexts
            .lock()
            .entry(subject_id)
            .or_default()
            .extend(context_ids);
        self
    }

    /// While set, every operation fails.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<CollectorCall> {
        self.calls.lock().clone()
    }

    pub fn contexts_for(&self, subject_id: UserId) -> Vec<ContextId> {
        self.contexts
            .lock()
            .get(&subject_id)
            .cloned()
            .unwrap_or_default()
    }

    fn check(&self) -> Result<(), CollectorError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(CollectorError::new(&self.component, "storage unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DataCollector for MemoryCollector {
    fn component(&self) -> &str {
        &self.component
    }

    async fn discover(&self, subject_id: UserId) -> Result<Vec<ContextId>, CollectorError> {
        self.check()?;
        Ok(self.contexts_for(subject_id))
    }

    async fn export(
        &self,
        subject_id: UserId,
        context_ids: &[ContextId],
    ) -> Result<(), CollectorError> {
        self.check()?;
        self.calls.lock().push(CollectorCall::Export {
            subject_id,
            context_ids: context_ids.to_vec(),
        });
        Ok(())
    }

    async fn erase(
        &self,
        subject_id: UserId,
        context_ids: &[ContextId],
    ) -> Result<(), CollectorError> {
        self.check()?;
        self.calls.lock().push(CollectorCall::Erase {
            subject_id,
            context_ids: context_ids.to_vec(),
        });
        if let Some(held) = self.contexts.lock().get_mut(&subject_id) {
            held.retain(|id| !context_ids.contains(id));
        }
        Ok(())
    }
}
