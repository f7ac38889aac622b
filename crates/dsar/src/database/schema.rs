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

//! Diesel table definitions for the SQLite store.
//!
//! Identifiers are `INTEGER PRIMARY KEY` columns read as `BigInt`. Timestamps
//! are RFC 3339 text; enum columns hold the raw integer discriminants.

diesel::table! {
    data_requests (id) {
        id -> BigInt,
        request_type -> Integer,
        status -> Integer,
        subject_id -> BigInt,
        requested_by -> BigInt,
        dpo_id -> Nullable<BigInt>,
        comments -> Text,
        dpo_comment -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    contextlists (id) {
        id -> BigInt,
        component -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    request_contextlists (id) {
        id -> BigInt,
        request_id -> BigInt,
        contextlist_id -> BigInt,
    }
}

diesel::table! {
    contextlist_contexts (id) {
        id -> BigInt,
        contextlist_id -> BigInt,
        context_id -> BigInt,
        status -> Integer,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    request_task_outbox (id) {
        id -> BigInt,
        task_kind -> Text,
        request_id -> BigInt,
        payload -> Text,
        attempts -> Integer,
        next_attempt_at -> Text,
        created_at -> Text,
    }
}

diesel::joinable!(contextlist_contexts -> contextlists (contextlist_id));
diesel::joinable!(request_contextlists -> contextlists (contextlist_id));
diesel::joinable!(request_contextlists -> data_requests (request_id));
diesel::joinable!(request_task_outbox -> data_requests (request_id));

diesel::allow_tables_to_appear_in_same_query!(
    data_requests,
    contextlists,
    request_contextlists,
    contextlist_contexts,
    request_task_outbox,
);
