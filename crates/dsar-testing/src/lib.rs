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

//! # dsar-testing
//!
//! In-memory stand-ins for every collaborator the `dsar` workflow talks to,
//! plus [`TestDatabase`] for an isolated, migrated SQLite store per test.
//!
//! ```rust,ignore
//! use dsar_testing::*;
//!
//! let db = TestDatabase::new().await;
//! let access = Arc::new(StaticAccessControl::new().with_user(1).with_officer(9));
//! let notifier = Arc::new(RecordingNotifier::new());
//! let registry = db.registry(access, Arc::new(StaticPolicy::new()), notifier.clone());
//! ```

mod access;
mod collector;
mod database;
mod dispatcher;
mod notifier;
mod policy;

pub use access::StaticAccessControl;
pub use collector::{CollectorCall, MemoryCollector};
pub use database::TestDatabase;
pub use dispatcher::RecordingDispatcher;
pub use notifier::{RecordingNotifier, SentMessage};
pub use policy::StaticPolicy;
