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

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use dsar::{AccessControl, Scope, UserId};

/// Access control backed by fixed sets of users, officers and grants.
#[derive(Debug, Clone, Default)]
pub struct StaticAccessControl {
    users: HashSet<UserId>,
    officers: Vec<UserId>,
    grants: HashSet<(String, Scope, UserId)>,
    delegates: HashMap<UserId, Vec<UserId>>,
}

impl StaticAccessControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.users.insert(user_id);
        self
    }

    /// Adds an officer. Officers are also users.
    pub fn with_officer(mut self, user_id: UserId) -> Self {
        self.users.insert(user_id);
        if !self.officers.contains(&user_id) {
            self.officers.push(user_id);
        }
        self
    }

    pub fn with_capability(mut self, capability: &str, scope: Scope, user_id: UserId) -> Self {
        self.grants.insert((capability.to_string(), scope, user_id));
        self
    }

    /// Lets `user_id` see requests about `subject_id`.
    pub fn with_delegate(mut self, user_id: UserId, subject_id: UserId) -> Self {
        self.delegates.entry(user_id).or_default().push(subject_id);
        self
    }
}

#[async_trait]
impl AccessControl for StaticAccessControl {
    async fn user_exists(&self, user_id: UserId) -> bool {
        self.users.contains(&user_id)
    }

    async fn can_act_as_officer(&self, user_id: UserId) -> bool {
        self.officers.contains(&user_id)
    }

    async fn has_capability(&self, capability: &str, scope: Scope, user_id: UserId) -> bool {
        self.grants
            .contains(&(capability.to_string(), scope, user_id))
    }

    async fn delegated_subjects(&self, user_id: UserId) -> Vec<UserId> {
        self.delegates.get(&user_id).cloned().unwrap_or_default()
    }

    async fn officers(&self) -> Vec<UserId> {
        self.officers.clone()
    }
}
