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

//! Policy oracle consulted before storing contexts of erasure requests.

use async_trait::async_trait;

use crate::models::ContextId;

/// Decides whether a context's data must never be deleted.
#[async_trait]
pub trait PolicyOracle: Send + Sync {
    async fn is_protected(&self, context_id: ContextId) -> bool;
}

/// Policy that protects nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProtectedContexts;

#[async_trait]
impl PolicyOracle for NoProtectedContexts {
    async fn is_protected(&self, _context_id: ContextId) -> bool {
        false
    }
}
