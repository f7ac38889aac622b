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

//! Data request DAL.
//!
//! Every write is transactional. Creation writes the request and its
//! `initiate` outbox entry together; officer transitions re-read the status
//! and apply a conditional update (`WHERE status = <observed>`) so a request
//! that changed underneath the caller is reported as
//! [`WorkflowError::InvalidState`] rather than silently overwritten.

use diesel::prelude::*;
use diesel::SqliteConnection;

use super::contextlist::{context_row_ids_for_request, set_context_status_chunked};
use super::models::{NewSqliteDataRequest, SqliteDataRequest, SqliteDataRequestChange};
use super::task_outbox::enqueue_in;
use super::DAL;
use crate::database::schema::data_requests;
use crate::database::universal_types::UniversalTimestamp;
use crate::error::{StoreError, WorkflowError};
use crate::models::{
    ContextStatus, DataRequest, NewDataRequest, RequestId, RequestStatus, RequestType, TaskKind,
    TaskPayload, UserId,
};

/// Data access layer for data request operations.
#[derive(Clone)]
pub struct DataRequestDAL<'a> {
    dal: &'a DAL,
}

/// Loads a request on an open connection, mapping absence to `NotFound`.
pub(crate) fn load_request(
    conn: &mut SqliteConnection,
    id: RequestId,
) -> Result<DataRequest, WorkflowError> {
    let row = data_requests::table
        .find(id)
        .select(SqliteDataRequest::as_select())
        .first::<SqliteDataRequest>(conn)
        .optional()?
        .ok_or_else(|| WorkflowError::request_not_found(id))?;
    Ok(DataRequest::try_from(row)?)
}

fn rows_to_requests(rows: Vec<SqliteDataRequest>) -> Result<Vec<DataRequest>, WorkflowError> {
    rows.into_iter()
        .map(DataRequest::try_from)
        .collect::<Result<Vec<_>, StoreError>>()
        .map_err(WorkflowError::from)
}

/// Applies `change` only while the request is still in `observed`.
fn apply_conditional(
    conn: &mut SqliteConnection,
    request: &DataRequest,
    change: &SqliteDataRequestChange,
    operation: &'static str,
) -> Result<(), WorkflowError> {
    let updated = diesel::update(
        data_requests::table
            .filter(data_requests::id.eq(request.id))
            .filter(data_requests::status.eq(request.status.as_i32())),
    )
    .set(change)
    .execute(conn)?;

    if updated != 1 {
        let current = load_request(conn, request.id)?;
        return Err(WorkflowError::InvalidState {
            request_id: request.id,
            operation,
            actual: current.status,
        });
    }
    Ok(())
}

impl<'a> DataRequestDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Inserts a request at `Pending` and queues its `initiate` task in the
    /// same transaction.
    pub async fn create(&self, new_request: NewDataRequest) -> Result<DataRequest, WorkflowError> {
        self.dal
            .database
            .interact(move |conn| {
                conn.immediate_transaction::<_, WorkflowError, _>(|conn| {
                    let now = UniversalTimestamp::now().to_db_string();
                    let row = NewSqliteDataRequest {
                        request_type: new_request.request_type.as_i32(),
                        status: RequestStatus::Pending.as_i32(),
                        subject_id: new_request.subject_id,
                        requested_by: new_request.requested_by,
                        comments: new_request.comments,
                        dpo_comment: String::new(),
                        created_at: now.clone(),
                        updated_at: now,
                    };

                    let inserted: SqliteDataRequest = diesel::insert_into(data_requests::table)
                        .values(&row)
                        .returning(SqliteDataRequest::as_returning())
                        .get_result(conn)?;

                    enqueue_in(conn, TaskKind::Initiate, &TaskPayload::initiate(inserted.id))?;

                    Ok(DataRequest::try_from(inserted)?)
                })
            })
            .await?
    }

    /// Retrieves a request by id.
    pub async fn get_by_id(&self, id: RequestId) -> Result<DataRequest, WorkflowError> {
        self.dal
            .database
            .interact(move |conn| load_request(conn, id))
            .await?
    }

    /// Requests where `user_id` is subject or requester, limited to the
    /// given subjects. Sorted by status, then last modification, then id.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        allowed_subjects: Vec<UserId>,
    ) -> Result<Vec<DataRequest>, WorkflowError> {
        self.dal
            .database
            .interact(move |conn| {
                let rows = data_requests::table
                    .filter(
                        data_requests::subject_id
                            .eq(user_id)
                            .or(data_requests::requested_by.eq(user_id)),
                    )
                    .filter(data_requests::subject_id.eq_any(allowed_subjects))
                    .order((
                        data_requests::status.asc(),
                        data_requests::updated_at.asc(),
                        data_requests::id.asc(),
                    ))
                    .select(SqliteDataRequest::as_select())
                    .load::<SqliteDataRequest>(conn)?;
                rows_to_requests(rows)
            })
            .await?
    }

    /// Every request that has not reached a final status, in the same
    /// order as [`list_for_user`](Self::list_for_user).
    pub async fn list_active(&self) -> Result<Vec<DataRequest>, WorkflowError> {
        self.dal
            .database
            .interact(move |conn| {
                let rows = data_requests::table
                    .filter(data_requests::status.ne_all(RequestStatus::final_values()))
                    .order((
                        data_requests::status.asc(),
                        data_requests::updated_at.asc(),
                        data_requests::id.asc(),
                    ))
                    .select(SqliteDataRequest::as_select())
                    .load::<SqliteDataRequest>(conn)?;
                rows_to_requests(rows)
            })
            .await?
    }

    /// Whether the subject has a request of this type that is still active.
    pub async fn has_ongoing(
        &self,
        subject_id: UserId,
        request_type: RequestType,
    ) -> Result<bool, WorkflowError> {
        self.dal
            .database
            .interact(move |conn| {
                let count: i64 = data_requests::table
                    .filter(data_requests::subject_id.eq(subject_id))
                    .filter(data_requests::request_type.eq(request_type.as_i32()))
                    .filter(data_requests::status.ne_all(RequestStatus::final_values()))
                    .count()
                    .get_result(conn)?;
                Ok::<_, WorkflowError>(count > 0)
            })
            .await?
    }

    /// Sets status unconditionally. Officer and comment are written only
    /// when given.
    pub async fn update_status(
        &self,
        id: RequestId,
        status: RequestStatus,
        officer_id: Option<UserId>,
        comment: Option<String>,
    ) -> Result<DataRequest, WorkflowError> {
        self.dal
            .database
            .interact(move |conn| {
                conn.immediate_transaction::<_, WorkflowError, _>(|conn| {
                    let change = SqliteDataRequestChange {
                        status: status.as_i32(),
                        dpo_id: officer_id,
                        dpo_comment: comment,
                        updated_at: UniversalTimestamp::now().to_db_string(),
                    };
                    let updated = diesel::update(data_requests::table.find(id))
                        .set(&change)
                        .execute(conn)?;
                    if updated == 0 {
                        return Err(WorkflowError::request_not_found(id));
                    }
                    load_request(conn, id)
                })
            })
            .await?
    }

    /// Moves a request to `to` if it is currently in one of `from`.
    ///
    /// `operation` names the attempted action in the resulting
    /// [`WorkflowError::InvalidState`].
    pub async fn transition(
        &self,
        id: RequestId,
        from: &'static [RequestStatus],
        to: RequestStatus,
        officer_id: Option<UserId>,
        operation: &'static str,
    ) -> Result<DataRequest, WorkflowError> {
        self.dal
            .database
            .interact(move |conn| {
                conn.immediate_transaction::<_, WorkflowError, _>(|conn| {
                    let request = load_request(conn, id)?;
                    if !from.contains(&request.status) {
                        return Err(WorkflowError::InvalidState {
                            request_id: id,
                            operation,
                            actual: request.status,
                        });
                    }
                    let change = SqliteDataRequestChange {
                        status: to.as_i32(),
                        dpo_id: officer_id,
                        dpo_comment: None,
                        updated_at: UniversalTimestamp::now().to_db_string(),
                    };
                    apply_conditional(conn, &request, &change, operation)?;
                    load_request(conn, id)
                })
            })
            .await?
    }

    /// Approves a request awaiting approval.
    ///
    /// In one transaction: the request moves to `Approved` with `officer_id`
    /// recorded, every context of the request is marked approved (in chunks
    /// of `chunk_size`), and a `process` task is queued. For export requests
    /// the task carries the subject as the export identity.
    pub async fn approve(
        &self,
        id: RequestId,
        officer_id: UserId,
        chunk_size: usize,
    ) -> Result<DataRequest, WorkflowError> {
        self.dal
            .database
            .interact(move |conn| {
                conn.immediate_transaction::<_, WorkflowError, _>(|conn| {
                    let request = load_request(conn, id)?;
                    if request.status != RequestStatus::AwaitingApproval {
                        return Err(WorkflowError::InvalidState {
                            request_id: id,
                            operation: "approve",
                            actual: request.status,
                        });
                    }

                    let change = SqliteDataRequestChange {
                        status: RequestStatus::Approved.as_i32(),
                        dpo_id: Some(officer_id),
                        dpo_comment: None,
                        updated_at: UniversalTimestamp::now().to_db_string(),
                    };
                    apply_conditional(conn, &request, &change, "approve")?;

                    let context_rows = context_row_ids_for_request(conn, id)?;
                    set_context_status_chunked(
                        conn,
                        &context_rows,
                        ContextStatus::Approved,
                        chunk_size,
                    )?;

                    let export_as = (request.request_type == RequestType::Export)
                        .then_some(request.subject_id);
                    enqueue_in(conn, TaskKind::Process, &TaskPayload::process(id, export_as))?;

                    load_request(conn, id)
                })
            })
            .await?
    }
}
