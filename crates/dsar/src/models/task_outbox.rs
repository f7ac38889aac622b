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

//! Request Task Outbox Model
//!
//! Enqueuing background work is an insert into the outbox table, written in
//! the same transaction as the state change that caused it. The outbox relay
//! later hands each entry to a [`TaskDispatcher`](crate::dispatcher::TaskDispatcher)
//! and deletes it once dispatch succeeds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{RequestId, UserId};
use crate::database::universal_types::UniversalTimestamp;
use crate::error::ValidationError;

/// Kind of background work queued for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Ask every collector where the subject's data lives.
    Initiate,
    /// Export or erase the approved contexts.
    Process,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Initiate => "initiate",
            TaskKind::Process => "process",
        }
    }
}

impl FromStr for TaskKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initiate" => Ok(TaskKind::Initiate),
            "process" => Ok(TaskKind::Process),
            other => Err(ValidationError::InvalidTaskKind(other.to_string())),
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON payload stored with each outbox entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPayload {
    pub request_id: RequestId,
    /// Identity the export should be produced as. Only set for process
    /// tasks of export requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_as: Option<UserId>,
}

impl TaskPayload {
    pub fn initiate(request_id: RequestId) -> Self {
        Self {
            request_id,
            export_as: None,
        }
    }

    pub fn process(request_id: RequestId, export_as: Option<UserId>) -> Self {
        Self {
            request_id,
            export_as,
        }
    }
}

/// A queued task awaiting dispatch (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedTask {
    /// Outbox row id; dispatch order follows it.
    pub id: i64,
    pub kind: TaskKind,
    pub payload: TaskPayload,
    /// Failed dispatches so far.
    pub attempts: i32,
    /// The entry is not offered to the relay before this time.
    pub next_attempt_at: UniversalTimestamp,
    pub created_at: UniversalTimestamp,
}

impl QueuedTask {
    pub fn request_id(&self) -> RequestId {
        self.payload.request_id
    }
}
