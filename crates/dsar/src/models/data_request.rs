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

//! Data request model and its status lifecycle.
//!
//! ```text
//! Pending -> Preprocessing -> AwaitingApproval -> Approved -> Processing -> Complete
//!                              AwaitingApproval -> Rejected
//! Pending | Preprocessing | AwaitingApproval -> Cancelled
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{RequestId, UserId};
use crate::database::universal_types::UniversalTimestamp;
use crate::error::ValidationError;

/// What the subject is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    /// Export all personal data held about the subject.
    Export,
    /// Erase the subject's personal data.
    Delete,
    /// A general enquiry handled by an officer without collector work.
    Other,
}

impl RequestType {
    pub fn as_i32(self) -> i32 {
        match self {
            RequestType::Export => 1,
            RequestType::Delete => 2,
            RequestType::Other => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestType::Export => "export",
            RequestType::Delete => "delete",
            RequestType::Other => "other",
        }
    }
}

impl TryFrom<i32> for RequestType {
    type Error = ValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(RequestType::Export),
            2 => Ok(RequestType::Delete),
            3 => Ok(RequestType::Other),
            other => Err(ValidationError::InvalidRequestType(other)),
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a request in its lifecycle.
///
/// The integer discriminants are what the store sorts on, so "status
/// ascending" lists the least-resolved requests first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Preprocessing,
    AwaitingApproval,
    Approved,
    Processing,
    Complete,
    Cancelled,
    Rejected,
}

impl RequestStatus {
    /// Statuses a request never leaves.
    pub const FINAL: [RequestStatus; 3] = [
        RequestStatus::Complete,
        RequestStatus::Cancelled,
        RequestStatus::Rejected,
    ];

    /// Statuses from which the subject may still cancel.
    pub const CANCELLABLE: [RequestStatus; 3] = [
        RequestStatus::Pending,
        RequestStatus::Preprocessing,
        RequestStatus::AwaitingApproval,
    ];

    pub const ALL: [RequestStatus; 8] = [
        RequestStatus::Pending,
        RequestStatus::Preprocessing,
        RequestStatus::AwaitingApproval,
        RequestStatus::Approved,
        RequestStatus::Processing,
        RequestStatus::Complete,
        RequestStatus::Cancelled,
        RequestStatus::Rejected,
    ];

    pub fn as_i32(self) -> i32 {
        match self {
            RequestStatus::Pending => 0,
            RequestStatus::Preprocessing => 1,
            RequestStatus::AwaitingApproval => 2,
            RequestStatus::Approved => 3,
            RequestStatus::Processing => 4,
            RequestStatus::Complete => 5,
            RequestStatus::Cancelled => 6,
            RequestStatus::Rejected => 7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Preprocessing => "preprocessing",
            RequestStatus::AwaitingApproval => "awaiting approval",
            RequestStatus::Approved => "approved",
            RequestStatus::Processing => "processing",
            RequestStatus::Complete => "complete",
            RequestStatus::Cancelled => "cancelled",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn is_final(self) -> bool {
        Self::FINAL.contains(&self)
    }

    /// Raw values of the final statuses, for store filters.
    pub(crate) fn final_values() -> Vec<i32> {
        Self::FINAL.iter().map(|s| s.as_i32()).collect()
    }
}

impl TryFrom<i32> for RequestStatus {
    type Error = ValidationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        RequestStatus::ALL
            .into_iter()
            .find(|s| s.as_i32() == value)
            .ok_or(ValidationError::InvalidRequestStatus(value))
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a request in `status` still has work ahead of it.
///
/// False exactly for `Complete`, `Cancelled` and `Rejected`.
pub fn is_active(status: RequestStatus) -> bool {
    !status.is_final()
}

/// A subject access or erasure request (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRequest {
    pub id: RequestId,
    pub request_type: RequestType,
    pub status: RequestStatus,
    /// The user the request is about. Never changes after creation.
    pub subject_id: UserId,
    /// The user who submitted the request (the subject or someone acting
    /// for them).
    pub requested_by: UserId,
    /// The officer handling the request, once one has acted on it.
    pub dpo_id: Option<UserId>,
    pub comments: String,
    pub dpo_comment: String,
    pub created_at: UniversalTimestamp,
    pub updated_at: UniversalTimestamp,
}

impl DataRequest {
    pub fn is_active(&self) -> bool {
        is_active(self.status)
    }
}

/// Structure for creating new data requests (domain type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDataRequest {
    pub request_type: RequestType,
    pub subject_id: UserId,
    pub requested_by: UserId,
    pub comments: String,
}
