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

//! Request Task Outbox DAL
//!
//! The only insertion path is [`enqueue_in`], called inside the same
//! transaction as the request state change that queues the work. This DAL
//! adds the operations the relay needs: listing entries that are due,
//! pushing a failed entry back with [`TaskOutboxDAL::defer`], and deleting
//! entries once they have been dispatched.
//!
//! Due entries are offered in `(next_attempt_at, id)` order, so an entry
//! that keeps failing moves behind work queued after it.

use std::time::Duration;

use diesel::prelude::*;
use diesel::SqliteConnection;

use super::models::{NewSqliteTaskOutbox, SqliteTaskOutbox};
use super::DAL;
use crate::database::schema::request_task_outbox;
use crate::database::universal_types::UniversalTimestamp;
use crate::error::{StoreError, WorkflowError};
use crate::models::{QueuedTask, RequestId, TaskKind, TaskPayload};

/// Queues a task on an open connection. Returns the outbox row id.
pub(crate) fn enqueue_in(
    conn: &mut SqliteConnection,
    kind: TaskKind,
    payload: &TaskPayload,
) -> Result<i64, WorkflowError> {
    let now = UniversalTimestamp::now().to_db_string();
    let entry = NewSqliteTaskOutbox {
        task_kind: kind.as_str().to_string(),
        request_id: payload.request_id,
        payload: serde_json::to_string(payload)?,
        attempts: 0,
        next_attempt_at: now.clone(),
        created_at: now,
    };

    let id = diesel::insert_into(request_task_outbox::table)
        .values(&entry)
        .returning(request_task_outbox::id)
        .get_result::<i64>(conn)?;

    tracing::debug!(
        outbox_id = id,
        task_kind = kind.as_str(),
        request_id = payload.request_id,
        "Task queued"
    );
    Ok(id)
}

fn rows_to_tasks(rows: Vec<SqliteTaskOutbox>) -> Result<Vec<QueuedTask>, WorkflowError> {
    rows.into_iter()
        .map(QueuedTask::try_from)
        .collect::<Result<Vec<_>, StoreError>>()
        .map_err(WorkflowError::from)
}

/// Data access layer for the request task outbox.
#[derive(Clone)]
pub struct TaskOutboxDAL<'a> {
    dal: &'a DAL,
}

impl<'a> TaskOutboxDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Entries due for dispatch, earliest due first.
    pub async fn list_pending(&self, limit: i64) -> Result<Vec<QueuedTask>, WorkflowError> {
        self.dal
            .database
            .interact(move |conn| {
                let now = UniversalTimestamp::now().to_db_string();
                let rows = request_task_outbox::table
                    .filter(request_task_outbox::next_attempt_at.le(now))
                    .order((
                        request_task_outbox::next_attempt_at.asc(),
                        request_task_outbox::id.asc(),
                    ))
                    .limit(limit)
                    .select(SqliteTaskOutbox::as_select())
                    .load::<SqliteTaskOutbox>(conn)?;
                rows_to_tasks(rows)
            })
            .await?
    }

    /// Pending entries for one request, oldest first.
    pub async fn list_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<Vec<QueuedTask>, WorkflowError> {
        self.dal
            .database
            .interact(move |conn| {
                let rows = request_task_outbox::table
                    .filter(request_task_outbox::request_id.eq(request_id))
                    .order(request_task_outbox::id.asc())
                    .select(SqliteTaskOutbox::as_select())
                    .load::<SqliteTaskOutbox>(conn)?;
                rows_to_tasks(rows)
            })
            .await?
    }

    /// Records a failed dispatch and makes the entry due again after
    /// `delay`. Returns whether the entry still exists.
    pub async fn defer(&self, id: i64, delay: Duration) -> Result<bool, WorkflowError> {
        self.dal
            .database
            .interact(move |conn| {
                let delay = chrono::Duration::from_std(delay)
                    .unwrap_or_else(|_| chrono::Duration::zero());
                let due = UniversalTimestamp(chrono::Utc::now() + delay).to_db_string();
                let updated = diesel::update(request_task_outbox::table.find(id))
                    .set((
                        request_task_outbox::attempts.eq(request_task_outbox::attempts + 1),
                        request_task_outbox::next_attempt_at.eq(due),
                    ))
                    .execute(conn)?;
                Ok::<_, WorkflowError>(updated > 0)
            })
            .await?
    }

    /// Removes a dispatched entry. Returns whether a row was deleted.
    pub async fn delete(&self, id: i64) -> Result<bool, WorkflowError> {
        self.dal
            .database
            .interact(move |conn| {
                let deleted =
                    diesel::delete(request_task_outbox::table.find(id)).execute(conn)?;
                Ok::<_, WorkflowError>(deleted > 0)
            })
            .await?
    }

    /// Number of entries awaiting dispatch, due or not.
    pub async fn count_pending(&self) -> Result<i64, WorkflowError> {
        self.dal
            .database
            .interact(move |conn| {
                let count: i64 = request_task_outbox::table.count().get_result(conn)?;
                Ok::<_, WorkflowError>(count)
            })
            .await?
    }
}
