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

//! Outbox relay delivery semantics.

use std::sync::Arc;
use std::time::Duration;

use dsar::{RequestType, TaskKind};
use dsar_testing::{RecordingDispatcher, RecordingNotifier, StaticPolicy, TestDatabase};

use crate::fixtures::{Harness, SUBJECT};

#[tokio::test]
async fn test_relay_dispatches_and_removes_tasks() {
    let h = Harness::new().await;
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let relay = h.relay(dispatcher.clone());

    let request = h
        .registry
        .create_request(SUBJECT, SUBJECT, RequestType::Export, "")
        .await
        .unwrap();

    assert_eq!(relay.run_once().await.unwrap(), 1);
    assert_eq!(h.dal().task_outbox().count_pending().await.unwrap(), 0);

    let dispatched = dispatcher.dispatched();
    assert_eq!(dispatched.len(), 1);
    assert_eq!(dispatched[0].kind, TaskKind::Initiate);
    assert_eq!(dispatched[0].request_id(), request.id);

    assert_eq!(relay.run_once().await.unwrap(), 0);
}

#[tokio::test]
async fn test_relay_keeps_tasks_that_fail_to_dispatch() {
    let h = Harness::new().await;
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let relay = h.relay(dispatcher.clone());
    h.registry
        .create_request(SUBJECT, SUBJECT, RequestType::Delete, "")
        .await
        .unwrap();

    dispatcher.set_failing(true);
    assert_eq!(relay.run_once().await.unwrap(), 0);
    assert_eq!(h.dal().task_outbox().count_pending().await.unwrap(), 1);

    dispatcher.set_failing(false);
    assert_eq!(relay.run_once().await.unwrap(), 1);
    assert_eq!(h.dal().task_outbox().count_pending().await.unwrap(), 0);
    let dispatched = dispatcher.dispatched();
    assert_eq!(dispatched.len(), 1);
    assert_eq!(dispatched[0].attempts, 1);
}

#[tokio::test]
async fn test_relay_dispatches_oldest_first_in_batches() {
    let h = Harness::new().await;
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let relay = h.relay(dispatcher.clone());
    let batch = h.db.config().relay_batch_size();

    let mut ids = Vec::new();
    for _ in 0..batch + 2 {
        let request = h
            .registry
            .create_request(SUBJECT, SUBJECT, RequestType::Export, "")
            .await
            .unwrap();
        ids.push(request.id);
    }

    assert_eq!(relay.run_once().await.unwrap(), batch);
    assert_eq!(h.dal().task_outbox().count_pending().await.unwrap(), 2);
    assert_eq!(relay.run_once().await.unwrap(), 2);

    let order: Vec<_> = dispatcher.dispatched().iter().map(|t| t.request_id()).collect();
    assert_eq!(order, ids);
}

#[tokio::test]
async fn test_relay_failing_tasks_do_not_starve_newer_work() {
    let h = Harness::new().await;
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let relay = h.relay(dispatcher.clone());
    let batch = h.db.config().relay_batch_size();

    for _ in 0..batch {
        let request = h
            .registry
            .create_request(SUBJECT, SUBJECT, RequestType::Export, "")
            .await
            .unwrap();
        dispatcher.fail_for_request(request.id);
    }
    let healthy = h
        .registry
        .create_request(SUBJECT, SUBJECT, RequestType::Export, "")
        .await
        .unwrap();

    // The first pass only sees the failing batch.
    assert_eq!(relay.run_once().await.unwrap(), 0);
    assert_eq!(dispatcher.rejected().len(), batch);

    assert_eq!(relay.run_once().await.unwrap(), 1);
    let dispatched = dispatcher.dispatched();
    assert_eq!(dispatched.len(), 1);
    assert_eq!(dispatched[0].request_id(), healthy.id);
    assert_eq!(
        h.dal().task_outbox().count_pending().await.unwrap(),
        batch as i64
    );
}

#[tokio::test]
async fn test_relay_backs_off_failed_tasks() {
    let db = TestDatabase::with_config(|builder| {
        builder.relay_retry_delay(Duration::from_secs(3600))
    })
    .await;
    let h = Harness::build(db, StaticPolicy::new(), RecordingNotifier::new());
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let relay = h.relay(dispatcher.clone());

    let request = h
        .registry
        .create_request(SUBJECT, SUBJECT, RequestType::Delete, "")
        .await
        .unwrap();

    dispatcher.set_failing(true);
    assert_eq!(relay.run_once().await.unwrap(), 0);

    let queued = h
        .dal()
        .task_outbox()
        .list_for_request(request.id)
        .await
        .unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].attempts, 1);
    let not_before = queued[0].created_at.0 + chrono::Duration::minutes(59);
    assert!(queued[0].next_attempt_at.0 > not_before);

    // Not due again yet, even once the dispatcher recovers.
    dispatcher.set_failing(false);
    assert_eq!(relay.run_once().await.unwrap(), 0);
    assert_eq!(dispatcher.rejected().len(), 1);
    assert!(dispatcher.dispatched().is_empty());
    assert_eq!(h.dal().task_outbox().count_pending().await.unwrap(), 1);

    assert_eq!(relay.backoff(1), dsar::config::MAX_RETRY_DELAY);
}

#[tokio::test]
async fn test_relay_loop_stops_on_shutdown() {
    let h = Harness::new().await;
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let relay = Arc::new(h.relay(dispatcher.clone()));

    let handle = tokio::spawn({
        let relay = relay.clone();
        async move { relay.run().await }
    });

    h.registry
        .create_request(SUBJECT, SUBJECT, RequestType::Export, "")
        .await
        .unwrap();

    let delivered = tokio::time::timeout(Duration::from_secs(5), async {
        while dispatcher.dispatched().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(delivered.is_ok(), "relay never dispatched the queued task");

    relay.shutdown();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("relay did not stop")
        .unwrap();
}
