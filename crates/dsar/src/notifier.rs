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

//! Outbound notifications.
//!
//! The workflow composes plain-text messages; delivery (email, in-app
//! messaging) belongs to the injected [`Notifier`].

use async_trait::async_trait;

use crate::error::NotifyError;
use crate::models::{DataRequest, UserId};

/// Delivers a message to a user.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: UserId, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// A composed message ready for a [`Notifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    pub body: String,
}

/// Summary sent to an officer about a request needing attention.
pub fn officer_summary(request: &DataRequest) -> Message {
    let mut body = format!(
        "Data request {id}\n\
         Type: {kind}\n\
         Status: {status}\n\
         Subject: user {subject}\n\
         Requested by: user {requester}\n\
         Submitted: {created}\n",
        id = request.id,
        kind = request.request_type,
        status = request.status,
        subject = request.subject_id,
        requester = request.requested_by,
        created = request.created_at,
    );
    if !request.comments.is_empty() {
        body.push_str("\nComments:\n");
        body.push_str(&request.comments);
        body.push('\n');
    }

    Message {
        subject: format!(
            "Data request {} ({}) from user {}",
            request.id, request.request_type, request.requested_by
        ),
        body,
    }
}

/// Message sent to the subject once their request is complete.
pub fn completion_notice(request: &DataRequest) -> Message {
    Message {
        subject: format!("Your data request {} is complete", request.id),
        body: format!(
            "Your {} request submitted on {} has been processed.\n",
            request.request_type, request.created_at
        ),
    }
}
