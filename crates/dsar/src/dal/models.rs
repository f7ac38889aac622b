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

//! SQLite row models
//!
//! Diesel models with storage types: timestamps as TEXT, enums as INTEGER
//! discriminants, task payloads as JSON TEXT. Rows are converted to the
//! domain types in [`crate::models`] at the DAL boundary; a row holding a
//! value the domain cannot represent is reported as
//! [`StoreError::CorruptRow`].

use diesel::prelude::*;

use crate::database::schema::*;
use crate::database::universal_types::UniversalTimestamp;
use crate::error::StoreError;
use crate::models::{
    ContextStatus, DataRequest, QueuedTask, RequestContext, RequestStatus, RequestType, TaskKind,
};

fn corrupt(table: &'static str, id: i64, reason: impl ToString) -> StoreError {
    StoreError::CorruptRow {
        table,
        id,
        reason: reason.to_string(),
    }
}

// ============================================================================
// Data Request Models
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = data_requests)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteDataRequest {
    pub id: i64,
    pub request_type: i32,
    pub status: i32,
    pub subject_id: i64,
    pub requested_by: i64,
    pub dpo_id: Option<i64>,
    pub comments: String,
    pub dpo_comment: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = data_requests)]
pub struct NewSqliteDataRequest {
    pub request_type: i32,
    pub status: i32,
    pub subject_id: i64,
    pub requested_by: i64,
    pub comments: String,
    pub dpo_comment: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Status change; `None` fields leave the column untouched.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = data_requests)]
pub struct SqliteDataRequestChange {
    pub status: i32,
    pub dpo_id: Option<i64>,
    pub dpo_comment: Option<String>,
    pub updated_at: String,
}

impl TryFrom<SqliteDataRequest> for DataRequest {
    type Error = StoreError;

    fn try_from(row: SqliteDataRequest) -> Result<Self, Self::Error> {
        let table = "data_requests";
        Ok(DataRequest {
            id: row.id,
            request_type: RequestType::try_from(row.request_type)
                .map_err(|e| corrupt(table, row.id, e))?,
            status: RequestStatus::try_from(row.status).map_err(|e| corrupt(table, row.id, e))?,
            subject_id: row.subject_id,
            requested_by: row.requested_by,
            dpo_id: row.dpo_id,
            comments: row.comments,
            dpo_comment: row.dpo_comment,
            created_at: UniversalTimestamp::from_db_string(&row.created_at)
                .map_err(|e| corrupt(table, row.id, e))?,
            updated_at: UniversalTimestamp::from_db_string(&row.updated_at)
                .map_err(|e| corrupt(table, row.id, e))?,
        })
    }
}

// ============================================================================
// Contextlist Models
// ============================================================================

#[derive(Debug, Insertable)]
#[diesel(table_name = contextlists)]
pub struct NewSqliteContextlist {
    pub component: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = request_contextlists)]
pub struct NewSqliteRequestContextlist {
    pub request_id: i64,
    pub contextlist_id: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = contextlist_contexts)]
pub struct NewSqliteContextlistContext {
    pub contextlist_id: i64,
    pub context_id: i64,
    pub status: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// `(contextlist_id, component, context_id, status)` as selected by the
/// request context listing.
pub type SqliteRequestContextRow = (i64, String, i64, i32);

pub fn request_context_from_row(row: SqliteRequestContextRow) -> Result<RequestContext, StoreError> {
    let (contextlist_id, component, context_id, status) = row;
    Ok(RequestContext {
        contextlist_id,
        component,
        context_id,
        status: ContextStatus::try_from(status)
            .map_err(|e| corrupt("contextlist_contexts", context_id, e))?,
    })
}

// ============================================================================
// Task Outbox Models
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = request_task_outbox)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteTaskOutbox {
    pub id: i64,
    pub task_kind: String,
    pub request_id: i64,
    pub payload: String,
    pub attempts: i32,
    pub next_attempt_at: String,
    pub created_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = request_task_outbox)]
pub struct NewSqliteTaskOutbox {
    pub task_kind: String,
    pub request_id: i64,
    pub payload: String,
    pub attempts: i32,
    pub next_attempt_at: String,
    pub created_at: String,
}

impl TryFrom<SqliteTaskOutbox> for QueuedTask {
    type Error = StoreError;

    fn try_from(row: SqliteTaskOutbox) -> Result<Self, Self::Error> {
        let table = "request_task_outbox";
        Ok(QueuedTask {
            id: row.id,
            kind: row
                .task_kind
                .parse::<TaskKind>()
                .map_err(|e| corrupt(table, row.id, e))?,
            payload: serde_json::from_str(&row.payload).map_err(|e| corrupt(table, row.id, e))?,
            attempts: row.attempts,
            next_attempt_at: UniversalTimestamp::from_db_string(&row.next_attempt_at)
                .map_err(|e| corrupt(table, row.id, e))?,
            created_at: UniversalTimestamp::from_db_string(&row.created_at)
                .map_err(|e| corrupt(table, row.id, e))?,
        })
    }
}
