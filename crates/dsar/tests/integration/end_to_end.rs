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

//! Whole-lifecycle scenarios, by hand and through the task runner.

use std::sync::Arc;

use dsar::{is_active, ApprovedContextlist, ContextStatus, RequestStatus, RequestType, TaskKind};
use dsar_testing::{CollectorCall, MemoryCollector, RecordingNotifier, StaticPolicy, TestDatabase};

use crate::fixtures::{collection, Harness, OFFICER, OTHER_OFFICER, SUBJECT};

#[tokio::test]
async fn test_export_request_approved_by_officer() {
    let h = Harness::new().await;

    let request = h
        .registry
        .create_request(SUBJECT, SUBJECT, RequestType::Export, "")
        .await
        .unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(h.dal().task_outbox().count_pending().await.unwrap(), 1);

    // Discovery, done by hand.
    h.registry
        .ledger()
        .add_contexts(
            &collection(&[("forum", &[10, 11])]),
            request.id,
            ContextStatus::Pending,
        )
        .await
        .unwrap();
    h.registry
        .update_status(request.id, RequestStatus::AwaitingApproval, None, None)
        .await
        .unwrap();

    let approved = h.registry.approve(OFFICER, request.id).await.unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(approved.dpo_id, Some(OFFICER));

    let contexts = h.registry.ledger().contexts_for_request(request.id).await.unwrap();
    assert_eq!(contexts.len(), 2);
    assert!(contexts.iter().all(|c| c.status == ContextStatus::Approved));

    let process: Vec<_> = h
        .dal()
        .task_outbox()
        .list_for_request(request.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|t| t.kind == TaskKind::Process)
        .collect();
    assert_eq!(process.len(), 1);
    assert_eq!(process[0].payload.request_id, request.id);
    assert_eq!(process[0].payload.export_as, Some(SUBJECT));

    let groups = h.registry.ledger().get_approved_collection(&approved).await.unwrap();
    assert_eq!(
        groups,
        vec![ApprovedContextlist {
            subject_id: SUBJECT,
            component: "forum".to_string(),
            context_ids: vec![10, 11],
        }]
    );
}

#[tokio::test]
async fn test_denied_request_is_final_with_no_side_effects() {
    let h = Harness::new().await;
    let request = h
        .awaiting_approval(RequestType::Delete, &collection(&[("forum", &[10, 11])]))
        .await;
    let outbox_before = h.dal().task_outbox().list_for_request(request.id).await.unwrap();
    let contexts_before = h.registry.ledger().contexts_for_request(request.id).await.unwrap();

    let denied = h.registry.deny(OFFICER, request.id).await.unwrap();

    assert_eq!(denied.status, RequestStatus::Rejected);
    assert_eq!(denied.dpo_id, Some(OFFICER));
    assert!(!is_active(denied.status));
    assert_eq!(
        h.dal().task_outbox().list_for_request(request.id).await.unwrap(),
        outbox_before
    );
    assert_eq!(
        h.registry.ledger().contexts_for_request(request.id).await.unwrap(),
        contexts_before
    );
}

#[tokio::test]
async fn test_erasure_runs_through_the_task_runner() {
    let h = Harness::with_policy(StaticPolicy::protecting([11])).await;
    let forum = Arc::new(MemoryCollector::new("forum").with_contexts(SUBJECT, [10, 11]));
    let assign = Arc::new(MemoryCollector::new("assign").with_contexts(SUBJECT, [3]));
    let runner = h.runner(&[forum.clone(), assign.clone()]);
    let relay = h.relay(Arc::new(runner));

    let request = h
        .registry
        .create_request(SUBJECT, SUBJECT, RequestType::Delete, "forget me")
        .await
        .unwrap();

    assert_eq!(relay.run_once().await.unwrap(), 1);
    let discovered = h.registry.get_request(request.id).await.unwrap();
    assert_eq!(discovered.status, RequestStatus::AwaitingApproval);
    let ids: Vec<_> = h
        .registry
        .ledger()
        .contexts_for_request(request.id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| (c.component, c.context_id))
        .collect();
    assert_eq!(ids, vec![("assign".to_string(), 3), ("forum".to_string(), 10)]);
    assert_eq!(h.notifier.sent_to(OFFICER).len(), 1);
    assert_eq!(h.notifier.sent_to(OTHER_OFFICER).len(), 1);

    h.registry.approve(OFFICER, request.id).await.unwrap();
    assert_eq!(relay.run_once().await.unwrap(), 1);

    let done = h.registry.get_request(request.id).await.unwrap();
    assert_eq!(done.status, RequestStatus::Complete);
    assert_eq!(
        forum.calls(),
        vec![CollectorCall::Erase {
            subject_id: SUBJECT,
            context_ids: vec![10],
        }]
    );
    assert_eq!(forum.contexts_for(SUBJECT), vec![11]);
    assert_eq!(
        assign.calls(),
        vec![CollectorCall::Erase {
            subject_id: SUBJECT,
            context_ids: vec![3],
        }]
    );
    assert_eq!(h.notifier.sent_to(SUBJECT).len(), 1);
    assert_eq!(h.dal().task_outbox().count_pending().await.unwrap(), 0);
}

#[tokio::test]
async fn test_cancelled_request_is_ignored_by_runner() {
    let h = Harness::new().await;
    let forum = Arc::new(MemoryCollector::new("forum").with_contexts(SUBJECT, [10]));
    let relay = h.relay(Arc::new(h.runner(&[forum.clone()])));

    let request = h
        .registry
        .create_request(SUBJECT, SUBJECT, RequestType::Export, "")
        .await
        .unwrap();
    h.registry.cancel_request(SUBJECT, request.id).await.unwrap();

    assert_eq!(relay.run_once().await.unwrap(), 1);

    let after = h.registry.get_request(request.id).await.unwrap();
    assert_eq!(after.status, RequestStatus::Cancelled);
    assert_eq!(
        h.dal().contextlist().count_for_request(request.id).await.unwrap(),
        0
    );
    assert!(h.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_failed_collector_leaves_request_processing_until_retry() {
    let h = Harness::new().await;
    let forum = Arc::new(MemoryCollector::new("forum").with_contexts(SUBJECT, [10, 11]));
    let relay = h.relay(Arc::new(h.runner(&[forum.clone()])));

    let request = h
        .registry
        .create_request(SUBJECT, SUBJECT, RequestType::Export, "")
        .await
        .unwrap();
    assert_eq!(relay.run_once().await.unwrap(), 1);
    h.registry.approve(OFFICER, request.id).await.unwrap();

    forum.set_failing(true);
    assert_eq!(relay.run_once().await.unwrap(), 0);
    assert_eq!(
        h.registry.get_request(request.id).await.unwrap().status,
        RequestStatus::Processing
    );
    let queued = h.dal().task_outbox().list_for_request(request.id).await.unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].kind, TaskKind::Process);

    forum.set_failing(false);
    assert_eq!(relay.run_once().await.unwrap(), 1);
    assert_eq!(
        h.registry.get_request(request.id).await.unwrap().status,
        RequestStatus::Complete
    );
    assert_eq!(
        forum.calls(),
        vec![CollectorCall::Export {
            subject_id: SUBJECT,
            context_ids: vec![10, 11],
        }]
    );
}

#[tokio::test]
async fn test_missing_collector_blocks_completion() {
    let h = Harness::new().await;
    let relay = h.relay(Arc::new(h.runner(&[])));
    let request = h
        .awaiting_approval(RequestType::Delete, &collection(&[("quiz", &[8])]))
        .await;
    h.registry.approve(OFFICER, request.id).await.unwrap();

    // The initiate task finds the request already past discovery.
    assert_eq!(relay.run_once().await.unwrap(), 1);

    assert_eq!(
        h.registry.get_request(request.id).await.unwrap().status,
        RequestStatus::Processing
    );
    assert_eq!(h.dal().task_outbox().count_pending().await.unwrap(), 1);
}

#[tokio::test]
async fn test_unreachable_officers_do_not_block_discovery() {
    let db = TestDatabase::new().await;
    let h = Harness::build(
        db,
        StaticPolicy::new(),
        RecordingNotifier::new().failing_for(OFFICER),
    );
    let forum = Arc::new(MemoryCollector::new("forum").with_contexts(SUBJECT, [10]));
    let relay = h.relay(Arc::new(h.runner(&[forum])));

    let request = h
        .registry
        .create_request(SUBJECT, SUBJECT, RequestType::Export, "")
        .await
        .unwrap();

    assert_eq!(relay.run_once().await.unwrap(), 1);
    assert_eq!(
        h.registry.get_request(request.id).await.unwrap().status,
        RequestStatus::AwaitingApproval
    );
    assert_eq!(h.notifier.sent_to(OTHER_OFFICER).len(), 1);
}
