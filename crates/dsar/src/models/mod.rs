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

//! Domain types for data requests, their contexts and queued tasks.
//!
//! These are API-level types; the SQLite row structs in [`crate::dal`]
//! convert to and from them at the storage boundary.

pub mod contextlist;
pub mod data_request;
pub mod task_outbox;

pub use contextlist::{ApprovedContextlist, ContextStatus, ContextlistCollection, RequestContext};
pub use data_request::{is_active, DataRequest, NewDataRequest, RequestStatus, RequestType};
pub use task_outbox::{QueuedTask, TaskKind, TaskPayload};

/// Identifier of a user (subject, requester or officer).
pub type UserId = i64;

/// Identifier of a data request.
pub type RequestId = i64;

/// Opaque identifier of a scope of stored data, resolvable by collectors.
pub type ContextId = i64;
