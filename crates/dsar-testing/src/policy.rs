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

use std::collections::HashSet;

use async_trait::async_trait;
use dsar::{ContextId, PolicyOracle};

/// Policy protecting a fixed set of contexts.
#[derive(Debug, Clone, Default)]
pub struct StaticPolicy {
    protected: HashSet<ContextId>,
}

impl StaticPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn protecting(context_ids: impl IntoIterator<Item = ContextId>) -> Self {
        Self {
            protected: context_ids.into_iter().collect(),
        }
    }
}

#[async_trait]
impl PolicyOracle for StaticPolicy {
    async fn is_protected(&self, context_id: ContextId) -> bool {
        self.protected.contains(&context_id)
    }
}
