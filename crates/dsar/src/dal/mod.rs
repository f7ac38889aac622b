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

//! Data Access Layer
//!
//! One DAL struct per owned entity, all borrowing the shared [`DAL`] handle:
//!
//! - [`DataRequestDAL`]: data request rows and their transitions
//! - [`ContextlistDAL`]: contextlists, their contexts and the request link
//! - [`TaskOutboxDAL`]: the queue of background tasks awaiting dispatch
//!
//! Operations that must be all-or-nothing run inside a single
//! `conn.immediate_transaction(..)` on one pooled connection. Taking the
//! write lock at `BEGIN` means a transition's read and its conditional
//! update see the same state, and a competing writer waits rather than
//! failing mid-transaction.
//!
//! # Example
//!
//! ```rust,ignore
//! let dal = DAL::new(database);
//! let request = dal.data_request().get_by_id(id).await?;
//! let pending = dal.task_outbox().list_pending(50).await?;
//! ```

pub mod contextlist;
pub mod data_request;
pub mod models;
pub mod task_outbox;

pub use contextlist::ContextlistDAL;
pub use data_request::DataRequestDAL;
pub use task_outbox::TaskOutboxDAL;

use crate::database::Database;

/// Default number of ids per `IN (..)` clause in bulk context updates.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// The Data Access Layer struct.
///
/// `DAL` is `Clone`; every clone references the same connection pool.
#[derive(Clone, Debug)]
pub struct DAL {
    /// The database instance with connection pool
    pub database: Database,
}

impl DAL {
    pub fn new(database: Database) -> Self {
        DAL { database }
    }

    /// Returns a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Returns a data request DAL.
    pub fn data_request(&self) -> DataRequestDAL<'_> {
        DataRequestDAL::new(self)
    }

    /// Returns a contextlist DAL.
    pub fn contextlist(&self) -> ContextlistDAL<'_> {
        ContextlistDAL::new(self)
    }

    /// Returns a task outbox DAL.
    pub fn task_outbox(&self) -> TaskOutboxDAL<'_> {
        TaskOutboxDAL::new(self)
    }
}
