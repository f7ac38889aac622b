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

//! Contextlist models.
//!
//! A contextlist is the bundle of contexts one collector reported for one
//! request. Each context in it carries its own approval status.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{ContextId, UserId};
use crate::error::ValidationError;

/// Approval status of a single context within a contextlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextStatus {
    Pending,
    Approved,
    Rejected,
}

impl ContextStatus {
    pub fn as_i32(self) -> i32 {
        match self {
            ContextStatus::Pending => 0,
            ContextStatus::Approved => 1,
            ContextStatus::Rejected => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContextStatus::Pending => "pending",
            ContextStatus::Approved => "approved",
            ContextStatus::Rejected => "rejected",
        }
    }
}

impl TryFrom<i32> for ContextStatus {
    type Error = ValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ContextStatus::Pending),
            1 => Ok(ContextStatus::Approved),
            2 => Ok(ContextStatus::Rejected),
            other => Err(ValidationError::InvalidContextStatus(other)),
        }
    }
}

impl fmt::Display for ContextStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contexts discovered for one request, keyed by the component that
/// reported them.
///
/// Components iterate in name order. Context ids are kept in the order they
/// were reported; duplicates are removed when the collection is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextlistCollection {
    lists: BTreeMap<String, Vec<ContextId>>,
}

impl ContextlistCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds contexts for `component`, appending to anything it already
    /// reported.
    pub fn add(
        &mut self,
        component: impl Into<String>,
        context_ids: impl IntoIterator<Item = ContextId>,
    ) -> Result<(), ValidationError> {
        let component = component.into();
        if component.trim().is_empty() {
            return Err(ValidationError::EmptyComponent);
        }
        self.lists.entry(component).or_default().extend(context_ids);
        Ok(())
    }

    /// Builder-style variant of [`add`](Self::add).
    pub fn with(
        mut self,
        component: impl Into<String>,
        context_ids: impl IntoIterator<Item = ContextId>,
    ) -> Result<Self, ValidationError> {
        self.add(component, context_ids)?;
        Ok(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ContextId])> {
        self.lists.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.lists.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

/// Approved contexts of one component for one request: the unit of work a
/// collector receives when the request is processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedContextlist {
    pub subject_id: UserId,
    pub component: String,
    pub context_ids: Vec<ContextId>,
}

/// One stored context row of a request, joined with its component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub contextlist_id: i64,
    pub component: String,
    pub context_id: ContextId,
    pub status: ContextStatus,
}
