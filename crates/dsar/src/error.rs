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

//! Error types for the data request workflow.
//!
//! Each concern owns a small error enum; [`WorkflowError`] is what the
//! registry, the ledger and the DAL return to callers and is the only type
//! most consumers need to match on.

use thiserror::Error;

use crate::models::{RequestId, RequestStatus, UserId};

/// Malformed input: unknown enum values or references to things that must
/// exist before a request can be made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown request status value: {0}")]
    InvalidRequestStatus(i32),

    #[error("Unknown request type value: {0}")]
    InvalidRequestType(i32),

    #[error("Unknown context status value: {0}")]
    InvalidContextStatus(i32),

    #[error("Unknown task kind: '{0}'")]
    InvalidTaskKind(String),

    #[error("Subject user {0} does not exist")]
    UnknownSubject(UserId),

    #[error("Component name must not be empty")]
    EmptyComponent,
}

/// Failures raised by the backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection pool error: {0}")]
    ConnectionPool(String),

    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Corrupt row in {table} (id {id}): {reason}")]
    CorruptRow {
        table: &'static str,
        id: i64,
        reason: String,
    },

    #[error("Payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures reported by a [`Notifier`](crate::notifier::Notifier).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("Message to user {to} was not accepted")]
    Rejected { to: UserId },

    #[error("Notification transport error: {0}")]
    Transport(String),
}

/// Failure reported by a data collector while discovering, exporting or
/// erasing personal data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Collector '{component}' failed: {message}")]
pub struct CollectorError {
    pub component: String,
    pub message: String,
}

impl CollectorError {
    pub fn new(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("{key} must be greater than zero")]
    ZeroSize { key: &'static str },
}

/// Errors surfaced by workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("User {user_id} is not permitted to {action}")]
    PermissionDenied { user_id: UserId, action: String },

    #[error("Cannot {operation} data request {request_id} while it is {actual}")]
    InvalidState {
        request_id: RequestId,
        operation: &'static str,
        actual: RequestStatus,
    },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Notification failed: {0}")]
    Notification(#[from] NotifyError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Collector(#[from] CollectorError),
}

/// Failure handing a queued task to its executor. The outbox entry is kept
/// and retried on the next relay pass.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Task failed: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Dispatcher unavailable: {0}")]
    Unavailable(String),
}

impl WorkflowError {
    pub(crate) fn request_not_found(id: RequestId) -> Self {
        WorkflowError::NotFound {
            entity: "Data request",
            id,
        }
    }
}

impl From<diesel::result::Error> for WorkflowError {
    fn from(e: diesel::result::Error) -> Self {
        WorkflowError::Store(StoreError::Database(e))
    }
}

impl From<serde_json::Error> for WorkflowError {
    fn from(e: serde_json::Error) -> Self {
        WorkflowError::Store(StoreError::Serialization(e))
    }
}
