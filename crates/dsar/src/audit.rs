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

//! Audit logging for data request transitions.
//!
//! Every state change a user or the background runner makes is emitted as a
//! structured `tracing` event carrying an `event_type` field, so privacy
//! audits can be reconstructed from logs alone. Each event also bumps a
//! `dsar_events_total` counter labelled with the event type.

use crate::models::{DataRequest, RequestId, RequestStatus, UserId};

/// Event types for data request operations.
pub mod events {
    pub const REQUEST_CREATED: &str = "data_request.created";
    pub const REQUEST_APPROVED: &str = "data_request.approved";
    pub const REQUEST_REJECTED: &str = "data_request.rejected";
    pub const REQUEST_CANCELLED: &str = "data_request.cancelled";
    pub const REQUEST_STATUS_CHANGED: &str = "data_request.status_changed";
    pub const REQUEST_COMPLETED: &str = "data_request.completed";
    pub const PERMISSION_DENIED: &str = "data_request.permission_denied";

    pub const CONTEXTS_ADDED: &str = "contexts.added";
    pub const CONTEXTS_STATUS_CHANGED: &str = "contexts.status_changed";
    pub const PROTECTED_CONTEXT_SKIPPED: &str = "contexts.protected_skipped";

    pub const NOTIFICATION_SENT: &str = "notification.sent";
    pub const NOTIFICATION_FAILED: &str = "notification.failed";

    pub const TASK_DISPATCHED: &str = "task.dispatched";
    pub const TASK_FAILED: &str = "task.failed";
}

fn count(event_type: &'static str) {
    metrics::counter!("dsar_events_total", "event_type" => event_type).increment(1);
}

/// Log creation of a data request.
pub fn log_request_created(request: &DataRequest) {
    count(events::REQUEST_CREATED);
    tracing::info!(
        event_type = events::REQUEST_CREATED,
        request_id = request.id,
        request_type = request.request_type.as_str(),
        subject_id = request.subject_id,
        requested_by = request.requested_by,
        "Data request created"
    );
}

/// Log approval of a data request by an officer.
pub fn log_request_approved(request: &DataRequest, officer_id: UserId) {
    count(events::REQUEST_APPROVED);
    tracing::info!(
        event_type = events::REQUEST_APPROVED,
        request_id = request.id,
        request_type = request.request_type.as_str(),
        subject_id = request.subject_id,
        officer_id,
        "Data request approved"
    );
}

/// Log rejection of a data request by an officer.
pub fn log_request_rejected(request: &DataRequest, officer_id: UserId) {
    count(events::REQUEST_REJECTED);
    tracing::info!(
        event_type = events::REQUEST_REJECTED,
        request_id = request.id,
        subject_id = request.subject_id,
        officer_id,
        "Data request rejected"
    );
}

pub fn log_request_cancelled(request: &DataRequest, cancelled_by: UserId) {
    count(events::REQUEST_CANCELLED);
    tracing::info!(
        event_type = events::REQUEST_CANCELLED,
        request_id = request.id,
        subject_id = request.subject_id,
        cancelled_by,
        "Data request cancelled"
    );
}

/// Log a direct status change (system transitions and officer overrides).
pub fn log_status_changed(request_id: RequestId, status: RequestStatus, officer_id: Option<UserId>) {
    count(events::REQUEST_STATUS_CHANGED);
    tracing::info!(
        event_type = events::REQUEST_STATUS_CHANGED,
        request_id,
        status = status.as_str(),
        officer_id = ?officer_id,
        "Data request status changed"
    );
}

pub fn log_request_completed(request: &DataRequest) {
    count(events::REQUEST_COMPLETED);
    tracing::info!(
        event_type = events::REQUEST_COMPLETED,
        request_id = request.id,
        request_type = request.request_type.as_str(),
        subject_id = request.subject_id,
        "Data request processed"
    );
}

/// Log a refused operation.
pub fn log_permission_denied(user_id: UserId, action: &str) {
    count(events::PERMISSION_DENIED);
    tracing::warn!(
        event_type = events::PERMISSION_DENIED,
        user_id,
        action = %action,
        "Data request operation refused"
    );
}

pub fn log_contexts_added(request_id: RequestId, components: usize, stored: usize, skipped: usize) {
    count(events::CONTEXTS_ADDED);
    tracing::info!(
        event_type = events::CONTEXTS_ADDED,
        request_id,
        components,
        stored,
        skipped,
        "Contexts recorded for data request"
    );
}

pub fn log_contexts_status_changed(request_id: RequestId, status: &str, updated: usize) {
    count(events::CONTEXTS_STATUS_CHANGED);
    tracing::info!(
        event_type = events::CONTEXTS_STATUS_CHANGED,
        request_id,
        status = %status,
        updated,
        "Context statuses updated"
    );
}

/// Log a context withheld from an erasure request by policy.
pub fn log_protected_context_skipped(request_id: RequestId, component: &str, context_id: i64) {
    count(events::PROTECTED_CONTEXT_SKIPPED);
    tracing::debug!(
        event_type = events::PROTECTED_CONTEXT_SKIPPED,
        request_id,
        component = %component,
        context_id,
        "Protected context excluded from erasure"
    );
}

pub fn log_notification_sent(request_id: RequestId, to: UserId) {
    count(events::NOTIFICATION_SENT);
    tracing::debug!(
        event_type = events::NOTIFICATION_SENT,
        request_id,
        to,
        "Notification sent"
    );
}

pub fn log_notification_failed(request_id: RequestId, to: UserId, error: &str) {
    count(events::NOTIFICATION_FAILED);
    tracing::warn!(
        event_type = events::NOTIFICATION_FAILED,
        request_id,
        to,
        error = %error,
        "Notification could not be delivered"
    );
}

pub fn log_task_dispatched(outbox_id: i64, task_kind: &str, request_id: RequestId) {
    count(events::TASK_DISPATCHED);
    tracing::debug!(
        event_type = events::TASK_DISPATCHED,
        outbox_id,
        task_kind = %task_kind,
        request_id,
        "Task dispatched"
    );
}

pub fn log_task_failed(outbox_id: i64, task_kind: &str, request_id: RequestId, error: &str) {
    count(events::TASK_FAILED);
    tracing::error!(
        event_type = events::TASK_FAILED,
        outbox_id,
        task_kind = %task_kind,
        request_id,
        error = %error,
        "Task dispatch failed, will retry"
    );
}
