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

//! Contextlist DAL.
//!
//! Owns the `contextlists`, `request_contextlists` and `contextlist_contexts`
//! tables. Contexts are only ever reached through the request they belong
//! to, so every query here starts from a request id.

use diesel::prelude::*;
use diesel::SqliteConnection;
use std::collections::HashSet;

use super::data_request::load_request;
use super::models::{
    request_context_from_row, NewSqliteContextlist, NewSqliteContextlistContext,
    NewSqliteRequestContextlist, SqliteRequestContextRow,
};
use super::DAL;
use crate::database::schema::{contextlist_contexts, contextlists, request_contextlists};
use crate::database::universal_types::UniversalTimestamp;
use crate::error::{StoreError, WorkflowError};
use crate::models::{ContextId, ContextStatus, RequestContext, RequestId};

/// Ids of the contextlists linked to a request.
fn contextlist_ids_for_request(
    conn: &mut SqliteConnection,
    request_id: RequestId,
) -> QueryResult<Vec<i64>> {
    request_contextlists::table
        .filter(request_contextlists::request_id.eq(request_id))
        .select(request_contextlists::contextlist_id)
        .load(conn)
}

/// Row ids of every context reachable from a request's contextlists.
pub(crate) fn context_row_ids_for_request(
    conn: &mut SqliteConnection,
    request_id: RequestId,
) -> QueryResult<Vec<i64>> {
    let list_ids = contextlist_ids_for_request(conn, request_id)?;
    contextlist_contexts::table
        .filter(contextlist_contexts::contextlist_id.eq_any(list_ids))
        .select(contextlist_contexts::id)
        .order(contextlist_contexts::id.asc())
        .load(conn)
}

/// Sets `status` on the given context rows, at most `chunk_size` ids per
/// statement. Callers wrap this in a transaction.
pub(crate) fn set_context_status_chunked(
    conn: &mut SqliteConnection,
    row_ids: &[i64],
    status: ContextStatus,
    chunk_size: usize,
) -> QueryResult<usize> {
    let now = UniversalTimestamp::now().to_db_string();
    let mut updated = 0;
    for chunk in row_ids.chunks(chunk_size.max(1)) {
        updated += diesel::update(
            contextlist_contexts::table.filter(contextlist_contexts::id.eq_any(chunk.to_vec())),
        )
        .set((
            contextlist_contexts::status.eq(status.as_i32()),
            contextlist_contexts::updated_at.eq(&now),
        ))
        .execute(conn)?;
    }
    Ok(updated)
}

/// Data access layer for contextlist operations.
#[derive(Clone)]
pub struct ContextlistDAL<'a> {
    dal: &'a DAL,
}

impl<'a> ContextlistDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Stores one contextlist per component and links it to the request.
    ///
    /// Context ids repeated within a component are stored once. The whole
    /// collection is written in one transaction. Returns the number of
    /// context rows stored.
    pub async fn insert_collection(
        &self,
        request_id: RequestId,
        entries: Vec<(String, Vec<ContextId>)>,
        status: ContextStatus,
    ) -> Result<usize, WorkflowError> {
        self.dal
            .database
            .interact(move |conn| {
                conn.immediate_transaction::<_, WorkflowError, _>(|conn| {
                    load_request(conn, request_id)?;
                    let now = UniversalTimestamp::now().to_db_string();
                    let mut stored = 0;

                    for (component, context_ids) in entries {
                        let contextlist_id: i64 = diesel::insert_into(contextlists::table)
                            .values(&NewSqliteContextlist {
                                component,
                                created_at: now.clone(),
                                updated_at: now.clone(),
                            })
                            .returning(contextlists::id)
                            .get_result(conn)?;

                        diesel::insert_into(request_contextlists::table)
                            .values(&NewSqliteRequestContextlist {
                                request_id,
                                contextlist_id,
                            })
                            .execute(conn)?;

                        let mut seen = HashSet::new();
                        for context_id in context_ids {
                            if !seen.insert(context_id) {
                                continue;
                            }
                            diesel::insert_into(contextlist_contexts::table)
                                .values(&NewSqliteContextlistContext {
                                    contextlist_id,
                                    context_id,
                                    status: status.as_i32(),
                                    created_at: now.clone(),
                                    updated_at: now.clone(),
                                })
                                .execute(conn)?;
                            stored += 1;
                        }
                    }

                    Ok(stored)
                })
            })
            .await?
    }

    /// Sets `status` on every context of the request, chunked, in one
    /// transaction. Returns the number of rows updated.
    pub async fn update_status_for_request(
        &self,
        request_id: RequestId,
        status: ContextStatus,
        chunk_size: usize,
    ) -> Result<usize, WorkflowError> {
        self.dal
            .database
            .interact(move |conn| {
                conn.immediate_transaction::<_, WorkflowError, _>(|conn| {
                    load_request(conn, request_id)?;
                    let row_ids = context_row_ids_for_request(conn, request_id)?;
                    Ok(set_context_status_chunked(conn, &row_ids, status, chunk_size)?)
                })
            })
            .await?
    }

    /// `(component, context_id)` pairs of the request's approved contexts,
    /// ordered by component then context id.
    pub async fn approved_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<Vec<(String, ContextId)>, WorkflowError> {
        self.dal
            .database
            .interact(move |conn| {
                let list_ids = contextlist_ids_for_request(conn, request_id)?;
                let pairs = contextlist_contexts::table
                    .inner_join(contextlists::table)
                    .filter(contextlist_contexts::contextlist_id.eq_any(list_ids))
                    .filter(contextlist_contexts::status.eq(ContextStatus::Approved.as_i32()))
                    .order((
                        contextlists::component.asc(),
                        contextlist_contexts::context_id.asc(),
                    ))
                    .select((contextlists::component, contextlist_contexts::context_id))
                    .load::<(String, i64)>(conn)?;
                Ok::<_, WorkflowError>(pairs)
            })
            .await?
    }

    /// Every stored context of the request with its component and status,
    /// ordered by component then context id.
    pub async fn list_for_request(
        &self,
        request_id: RequestId,
    ) -> Result<Vec<RequestContext>, WorkflowError> {
        self.dal
            .database
            .interact(move |conn| {
                let list_ids = contextlist_ids_for_request(conn, request_id)?;
                let rows = contextlist_contexts::table
                    .inner_join(contextlists::table)
                    .filter(contextlist_contexts::contextlist_id.eq_any(list_ids))
                    .order((
                        contextlists::component.asc(),
                        contextlist_contexts::context_id.asc(),
                    ))
                    .select((
                        contextlist_contexts::contextlist_id,
                        contextlists::component,
                        contextlist_contexts::context_id,
                        contextlist_contexts::status,
                    ))
                    .load::<SqliteRequestContextRow>(conn)?;
                rows.into_iter()
                    .map(request_context_from_row)
                    .collect::<Result<Vec<_>, StoreError>>()
                    .map_err(WorkflowError::from)
            })
            .await?
    }

    /// Number of contextlists linked to the request, including ones whose
    /// contexts were all filtered out.
    pub async fn count_for_request(&self, request_id: RequestId) -> Result<i64, WorkflowError> {
        self.dal
            .database
            .interact(move |conn| {
                let count: i64 = request_contextlists::table
                    .filter(request_contextlists::request_id.eq(request_id))
                    .count()
                    .get_result(conn)?;
                Ok::<_, WorkflowError>(count)
            })
            .await?
    }
}
