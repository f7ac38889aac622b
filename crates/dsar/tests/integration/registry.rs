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

//! Request Registry: creation, listing, status changes and officer review.

use std::time::Duration;

use dsar::{
    ContextStatus, RequestStatus, RequestType, TaskKind, ValidationError, WorkflowError,
};
use dsar_testing::RecordingNotifier;

use crate::fixtures::{
    collection, Harness, GUARDIAN, OFFICER, OTHER_OFFICER, STRANGER, SUBJECT,
};

#[tokio::test]
async fn test_create_request_starts_pending_with_initiate_task() {
    let h = Harness::new().await;

    let request = h
        .registry
        .create_request(SUBJECT, SUBJECT, RequestType::Export, "all of it")
        .await
        .unwrap();

    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.subject_id, SUBJECT);
    assert_eq!(request.requested_by, SUBJECT);
    assert_eq!(request.dpo_id, None);
    assert_eq!(request.comments, "all of it");

    let tasks = h.dal().task_outbox().list_for_request(request.id).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].kind, TaskKind::Initiate);
    assert_eq!(tasks[0].payload.request_id, request.id);
    assert_eq!(tasks[0].payload.export_as, None);
}

#[tokio::test]
async fn test_create_request_for_unknown_subject_is_rejected() {
    let h = Harness::new().await;

    let err = h
        .registry
        .create_request(OFFICER, 4242, RequestType::Delete, "")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        WorkflowError::Validation(ValidationError::UnknownSubject(4242))
    ));
    assert_eq!(h.dal().task_outbox().count_pending().await.unwrap(), 0);
}

#[tokio::test]
async fn test_create_request_for_someone_else_needs_capability() {
    let h = Harness::new().await;

    let err = h
        .registry
        .create_request(STRANGER, SUBJECT, RequestType::Export, "")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::PermissionDenied { user_id: STRANGER, .. }
    ));
    assert!(h.registry.list_requests(OFFICER, None).await.unwrap().is_empty());

    let request = h
        .registry
        .create_request(GUARDIAN, SUBJECT, RequestType::Export, "for my child")
        .await
        .unwrap();
    assert_eq!(request.subject_id, SUBJECT);
    assert_eq!(request.requested_by, GUARDIAN);

    let request = h
        .registry
        .create_request(OFFICER, STRANGER, RequestType::Other, "")
        .await
        .unwrap();
    assert_eq!(request.requested_by, OFFICER);
}

#[tokio::test]
async fn test_duplicate_requests_are_not_refused() {
    let h = Harness::new().await;

    assert!(!h
        .registry
        .has_ongoing_request(SUBJECT, RequestType::Export)
        .await
        .unwrap());

    h.registry
        .create_request(SUBJECT, SUBJECT, RequestType::Export, "")
        .await
        .unwrap();
    assert!(h
        .registry
        .has_ongoing_request(SUBJECT, RequestType::Export)
        .await
        .unwrap());
    assert!(!h
        .registry
        .has_ongoing_request(SUBJECT, RequestType::Delete)
        .await
        .unwrap());

    let second = h
        .registry
        .create_request(SUBJECT, SUBJECT, RequestType::Export, "")
        .await;
    assert!(second.is_ok());
}

#[tokio::test]
async fn test_terminal_requests_are_not_ongoing() {
    let h = Harness::new().await;

    let request = h
        .registry
        .create_request(SUBJECT, SUBJECT, RequestType::Delete, "")
        .await
        .unwrap();
    h.registry.cancel_request(SUBJECT, request.id).await.unwrap();

    assert!(!h
        .registry
        .has_ongoing_request(SUBJECT, RequestType::Delete)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_list_requests_for_user_includes_delegated_subjects() {
    let h = Harness::new().await;

    let own = h
        .registry
        .create_request(GUARDIAN, GUARDIAN, RequestType::Export, "")
        .await
        .unwrap();
    let for_child = h
        .registry
        .create_request(GUARDIAN, SUBJECT, RequestType::Delete, "")
        .await
        .unwrap();
    h.registry
        .create_request(STRANGER, STRANGER, RequestType::Export, "")
        .await
        .unwrap();

    let ids: Vec<_> = h
        .registry
        .list_requests(GUARDIAN, Some(GUARDIAN))
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![own.id, for_child.id]);

    let subject_view = h.registry.list_requests(SUBJECT, Some(SUBJECT)).await.unwrap();
    assert_eq!(subject_view.len(), 1);
    assert_eq!(subject_view[0].id, for_child.id);
}

#[tokio::test]
async fn test_list_requests_without_user_is_for_officers() {
    let h = Harness::new().await;

    let active = h
        .registry
        .create_request(SUBJECT, SUBJECT, RequestType::Export, "")
        .await
        .unwrap();
    let cancelled = h
        .registry
        .create_request(STRANGER, STRANGER, RequestType::Export, "")
        .await
        .unwrap();
    h.registry.cancel_request(STRANGER, cancelled.id).await.unwrap();

    let officer_view = h.registry.list_requests(OFFICER, None).await.unwrap();
    assert_eq!(officer_view.len(), 1);
    assert_eq!(officer_view[0].id, active.id);

    assert!(h.registry.list_requests(SUBJECT, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_requests_orders_by_status_then_modification() {
    let h = Harness::new().await;

    let first = h
        .registry
        .create_request(SUBJECT, SUBJECT, RequestType::Export, "")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(2)).await;
    let second = h
        .registry
        .create_request(SUBJECT, SUBJECT, RequestType::Delete, "")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(2)).await;
    let third = h
        .registry
        .create_request(SUBJECT, SUBJECT, RequestType::Other, "")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(2)).await;

    // Touching `first` makes it the most recently modified pending request.
    h.registry
        .update_status(first.id, RequestStatus::Pending, None, None)
        .await
        .unwrap();
    h.registry
        .update_status(second.id, RequestStatus::AwaitingApproval, None, None)
        .await
        .unwrap();

    let ids: Vec<_> = h
        .registry
        .list_requests(SUBJECT, Some(SUBJECT))
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![third.id, first.id, second.id]);
}

#[tokio::test]
async fn test_update_status_records_officer_and_comment() {
    let h = Harness::new().await;
    let request = h
        .registry
        .create_request(SUBJECT, SUBJECT, RequestType::Other, "")
        .await
        .unwrap();

    let updated = h
        .registry
        .update_status(
            request.id,
            RequestStatus::Complete,
            Some(OFFICER),
            Some("answered by phone".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(updated.status, RequestStatus::Complete);
    assert_eq!(updated.dpo_id, Some(OFFICER));
    assert_eq!(updated.dpo_comment, "answered by phone");
    assert!(!updated.is_active());

    let again = h
        .registry
        .update_status(request.id, RequestStatus::Processing, None, None)
        .await
        .unwrap();
    assert_eq!(again.dpo_id, Some(OFFICER));
    assert_eq!(again.dpo_comment, "answered by phone");
}

#[tokio::test]
async fn test_unknown_request_is_not_found() {
    let h = Harness::new().await;

    assert!(matches!(
        h.registry.get_request(77).await.unwrap_err(),
        WorkflowError::NotFound { id: 77, .. }
    ));
    assert!(matches!(
        h.registry
            .update_status(77, RequestStatus::Approved, None, None)
            .await
            .unwrap_err(),
        WorkflowError::NotFound { id: 77, .. }
    ));
    assert!(matches!(
        h.registry.approve(OFFICER, 77).await.unwrap_err(),
        WorkflowError::NotFound { id: 77, .. }
    ));
}

#[tokio::test]
async fn test_approve_requires_officer() {
    let h = Harness::new().await;
    let request = h
        .awaiting_approval(RequestType::Export, &collection(&[("forum", &[10])]))
        .await;

    let err = h.registry.approve(SUBJECT, request.id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::PermissionDenied { user_id: SUBJECT, .. }));
    let err = h.registry.deny(STRANGER, request.id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::PermissionDenied { user_id: STRANGER, .. }));

    let after = h.registry.get_request(request.id).await.unwrap();
    assert_eq!(after, request);
}

#[tokio::test]
async fn test_approve_outside_awaiting_approval_has_no_effect() {
    let h = Harness::new().await;
    let request = h
        .registry
        .create_request(SUBJECT, SUBJECT, RequestType::Delete, "")
        .await
        .unwrap();
    h.registry
        .ledger()
        .add_contexts(
            &collection(&[("forum", &[10, 11]), ("assign", &[3])]),
            request.id,
            ContextStatus::Pending,
        )
        .await
        .unwrap();

    let before = h.registry.get_request(request.id).await.unwrap();
    let contexts_before = h.registry.ledger().contexts_for_request(request.id).await.unwrap();

    let err = h.registry.approve(OFFICER, request.id).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::InvalidState {
            operation: "approve",
            actual: RequestStatus::Pending,
            ..
        }
    ));

    assert_eq!(h.registry.get_request(request.id).await.unwrap(), before);
    assert_eq!(
        h.registry.ledger().contexts_for_request(request.id).await.unwrap(),
        contexts_before
    );
    let tasks = h.dal().task_outbox().list_for_request(request.id).await.unwrap();
    assert!(tasks.iter().all(|t| t.kind == TaskKind::Initiate));
}

#[tokio::test]
async fn test_deny_only_from_awaiting_approval() {
    let h = Harness::new().await;
    let request = h
        .registry
        .create_request(SUBJECT, SUBJECT, RequestType::Export, "")
        .await
        .unwrap();

    let err = h.registry.deny(OFFICER, request.id).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::InvalidState {
            operation: "deny",
            ..
        }
    ));
}

#[tokio::test]
async fn test_concurrent_approvals_have_one_winner() {
    let h = Harness::file_backed(4).await;

    for _ in 0..10 {
        let request = h
            .awaiting_approval(RequestType::Export, &collection(&[("forum", &[10, 11])]))
            .await;

        let (a, b) = tokio::join!(
            h.registry.approve(OFFICER, request.id),
            h.registry.approve(OTHER_OFFICER, request.id)
        );

        let results = [a, b];
        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1, "results: {results:?}");
        assert!(
            results.iter().any(|r| matches!(
                r,
                Err(WorkflowError::InvalidState {
                    actual: RequestStatus::Approved,
                    ..
                })
            )),
            "results: {results:?}"
        );

        let stored = h.registry.get_request(request.id).await.unwrap();
        assert_eq!(stored.dpo_id, winners[0].dpo_id);

        let process_tasks = h
            .dal()
            .task_outbox()
            .list_for_request(request.id)
            .await
            .unwrap()
            .into_iter()
            .filter(|t| t.kind == TaskKind::Process)
            .count();
        assert_eq!(process_tasks, 1);
    }
}

#[tokio::test]
async fn test_concurrent_approve_and_cancel_have_one_winner() {
    let h = Harness::file_backed(4).await;

    for _ in 0..10 {
        let request = h
            .awaiting_approval(RequestType::Delete, &collection(&[("forum", &[1])]))
            .await;

        let (approved, cancelled) = tokio::join!(
            h.registry.approve(OFFICER, request.id),
            h.registry.cancel_request(SUBJECT, request.id)
        );

        let stored = h.registry.get_request(request.id).await.unwrap();
        match (&approved, &cancelled) {
            (Ok(_), Err(WorkflowError::InvalidState { actual, .. })) => {
                assert_eq!(*actual, RequestStatus::Approved);
                assert_eq!(stored.status, RequestStatus::Approved);
            }
            (Err(WorkflowError::InvalidState { actual, .. }), Ok(_)) => {
                assert_eq!(*actual, RequestStatus::Cancelled);
                assert_eq!(stored.status, RequestStatus::Cancelled);
            }
            other => panic!("expected exactly one winner, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_cancel_request() {
    let h = Harness::new().await;
    let request = h
        .registry
        .create_request(GUARDIAN, SUBJECT, RequestType::Delete, "")
        .await
        .unwrap();

    let err = h.registry.cancel_request(STRANGER, request.id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::PermissionDenied { .. }));

    let cancelled = h.registry.cancel_request(GUARDIAN, request.id).await.unwrap();
    assert_eq!(cancelled.status, RequestStatus::Cancelled);
    assert!(!cancelled.is_active());

    let err = h.registry.cancel_request(SUBJECT, request.id).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::InvalidState {
            operation: "cancel",
            actual: RequestStatus::Cancelled,
            ..
        }
    ));
}

#[tokio::test]
async fn test_approved_request_cannot_be_cancelled() {
    let h = Harness::new().await;
    let request = h
        .awaiting_approval(RequestType::Export, &collection(&[("forum", &[10])]))
        .await;
    h.registry.approve(OFFICER, request.id).await.unwrap();

    let err = h.registry.cancel_request(SUBJECT, request.id).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::InvalidState {
            actual: RequestStatus::Approved,
            ..
        }
    ));
}

#[tokio::test]
async fn test_notify_officer_sends_summary() {
    let h = Harness::new().await;
    let request = h
        .registry
        .create_request(SUBJECT, SUBJECT, RequestType::Delete, "remove my posts")
        .await
        .unwrap();

    h.registry.notify_officer(OFFICER, &request).await.unwrap();

    let sent = h.notifier.sent_to(OFFICER);
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].subject,
        format!("Data request {} (delete) from user {}", request.id, SUBJECT)
    );
    assert!(sent[0].body.contains("remove my posts"));
}

#[tokio::test]
async fn test_notification_failure_keeps_committed_state() {
    let h = Harness::with_notifier(RecordingNotifier::new().failing_for(OFFICER)).await;
    let request = h
        .awaiting_approval(RequestType::Export, &collection(&[("forum", &[10])]))
        .await;
    let approved = h.registry.approve(OTHER_OFFICER, request.id).await.unwrap();

    let err = h.registry.notify_officer(OFFICER, &approved).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Notification(_)));
    assert_eq!(
        h.registry.get_request(request.id).await.unwrap().status,
        RequestStatus::Approved
    );

    assert_eq!(h.registry.notify_officers(&approved).await, 1);
    assert_eq!(h.notifier.sent_to(OTHER_OFFICER).len(), 1);
}
