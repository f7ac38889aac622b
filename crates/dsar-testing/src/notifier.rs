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
use dsar::{Notifier, NotifyError, UserId};
use parking_lot::Mutex;

/// A message accepted by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: UserId,
    pub subject: String,
    pub body: String,
}

/// Notifier that keeps every delivered message in memory.
///
/// Recipients marked with [`failing_for`](Self::failing_for) are rejected.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMessage>>,
    failing: Mutex<HashSet<UserId>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(self, user_id: UserId) -> Self {
        self.failing.lock().insert(user_id);
        self
    }

    pub fn set_failing(&self, user_id: UserId, failing: bool) {
        let mut set = self.failing.lock();
        if failing {
            set.insert(user_id);
        } else {
            set.remove(&user_id);
        }
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    pub fn sent_to(&self, user_id: UserId) -> Vec<SentMessage> {
        self.sent
            .lock()
            .iter()
            .filter(|m| m.to == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: UserId, subject: &str, body: &str) -> Result<(), NotifyError> {
        if self.failing.lock().contains(&to) {
            return Err(NotifyError::Rejected { to });
        }
        self.sent.lock().push(SentMessage {
            to,
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
