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

//! Access-control oracle.
//!
//! The workflow never evaluates capabilities itself. Every decision about who
//! may act is delegated to an [`AccessControl`] implementation injected into
//! the [`RequestRegistry`](crate::registry::RequestRegistry).

use async_trait::async_trait;

use crate::models::UserId;

/// Capability names checked by the workflow.
pub mod capabilities {
    /// Submit a data request on behalf of another user (e.g. a guardian for
    /// a dependent).
    pub const MAKE_REQUEST_FOR_USER: &str = "dataprivacy:makedatarequestsforchildren";
}

/// Scope a capability is checked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    System,
    /// The personal scope of one user.
    User(UserId),
}

/// Identity and capability lookups.
#[async_trait]
pub trait AccessControl: Send + Sync {
    /// Whether the user exists and may be the subject of a request.
    async fn user_exists(&self, user_id: UserId) -> bool;

    /// Whether the user is a data protection officer.
    async fn can_act_as_officer(&self, user_id: UserId) -> bool;

    /// Whether the user holds `capability` in `scope`.
    async fn has_capability(&self, capability: &str, scope: Scope, user_id: UserId) -> bool;

    /// Subjects the user may see requests for besides themselves.
    async fn delegated_subjects(&self, _user_id: UserId) -> Vec<UserId> {
        Vec::new()
    }

    /// Every officer who should hear about requests awaiting approval.
    async fn officers(&self) -> Vec<UserId> {
        Vec::new()
    }
}
