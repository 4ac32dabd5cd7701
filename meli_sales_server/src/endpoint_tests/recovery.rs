use actix_web::{http::StatusCode, web, web::ServiceConfig};
use meli_sales_engine::{
    queue::{QueueConfig, RetryQueue},
    test_utils::sources::{ScriptedOrderSource, StubTokenProvider},
    RecoveryApi,
};
use serde_json::json;

use super::helpers::{post_request, stored_notification};
use crate::{
    endpoint_tests::mocks::MockNotificationJournal,
    routes::{RecoverMissedFeedsRoute, ReprocessUnprocessedRoute},
};

#[actix_web::test]
async fn missed_feed_recovery_requires_credentials() {
    let _ = env_logger::try_init().ok();
    let journal = MockNotificationJournal::new();
    let queue = RetryQueue::new(QueueConfig::default());
    let configure = configure_with(journal, ScriptedOrderSource::new(), queue, None);
    let (status, body) = post_request("/recovery/missed-feeds", "", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, r#"{"error":"Recovery is not available. the marketplace application id is not set"}"#);
}

#[actix_web::test]
async fn missed_feeds_are_journaled_and_queued() {
    let _ = env_logger::try_init().ok();
    let source = ScriptedOrderSource::new();
    source.respond_with(
        "missed_feeds",
        json!([
            {"_id": "feed-1", "resource": "/orders/2000005678", "topic": "orders", "user_id": 446575687, "attempts": 2, "sent": "2024-05-09T08:00:00.000Z"},
            {"_id": "feed-2", "resource": "/questions/9", "topic": "questions"}
        ]),
    );
    let mut journal = MockNotificationJournal::new();
    journal.expect_fetch_notification().times(2).returning(|_| Ok(None));
    journal
        .expect_store_notification()
        .times(2)
        .returning(|notification| Ok(stored_notification(&notification.notification_id)));
    let queue = RetryQueue::new(QueueConfig::default());
    let configure = configure_with(journal, source, queue.clone(), Some("8123456789"));
    let (status, body) = post_request("/recovery/missed-feeds", "", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, RECOVERED_JSON);
    assert_eq!(queue.pending(), 1);
}

#[actix_web::test]
async fn already_reconciled_feed_entries_are_skipped() {
    let _ = env_logger::try_init().ok();
    let source = ScriptedOrderSource::new();
    source.respond_with(
        "missed_feeds",
        json!([{"_id": "feed-1", "resource": "/orders/2000005678", "topic": "orders"}]),
    );
    let mut journal = MockNotificationJournal::new();
    let mut reconciled = stored_notification("feed-1");
    reconciled.processed = true;
    journal.expect_fetch_notification().times(1).returning(move |_| Ok(Some(reconciled.clone())));
    journal.expect_store_notification().times(0);
    let queue = RetryQueue::new(QueueConfig::default());
    let configure = configure_with(journal, source, queue.clone(), Some("8123456789"));
    let (status, body) = post_request("/recovery/missed-feeds", "", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, SKIPPED_JSON);
    assert_eq!(queue.pending(), 0);
}

#[actix_web::test]
async fn a_failed_poll_reports_an_empty_sweep() {
    let _ = env_logger::try_init().ok();
    let source = ScriptedOrderSource::new();
    source.respond_with_status("missed_feeds", 500, "feed history is down");
    let journal = MockNotificationJournal::new();
    let queue = RetryQueue::new(QueueConfig::default());
    let configure = configure_with(journal, source, queue.clone(), Some("8123456789"));
    let (status, body) = post_request("/recovery/missed-feeds", "", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, EMPTY_SWEEP_JSON);
    assert_eq!(queue.pending(), 0);
}

#[actix_web::test]
async fn unprocessed_notifications_are_requeued() {
    let _ = env_logger::try_init().ok();
    let mut journal = MockNotificationJournal::new();
    journal.expect_fetch_unprocessed_notifications().withf(|limit| *limit == 100).times(1).returning(|_| {
        let with_resource = stored_notification("n-1");
        let mut without_resource = stored_notification("n-2");
        without_resource.resource = None;
        Ok(vec![with_resource, without_resource])
    });
    let queue = RetryQueue::new(QueueConfig::default());
    let configure = configure_with(journal, ScriptedOrderSource::new(), queue.clone(), Some("8123456789"));
    let (status, body) = post_request("/recovery/reprocess", "", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, REPROCESSED_JSON);
    assert_eq!(queue.pending(), 1);
}

fn configure_with(
    journal: MockNotificationJournal,
    source: ScriptedOrderSource,
    queue: RetryQueue,
    app_id: Option<&str>,
) -> impl FnOnce(&mut ServiceConfig) {
    let tokens = StubTokenProvider::new("test-access-token", "446575687");
    let api = RecoveryApi::new(journal, source, tokens, queue.clone(), app_id.map(String::from));
    move |cfg| {
        cfg.service(RecoverMissedFeedsRoute::<MockNotificationJournal, ScriptedOrderSource, StubTokenProvider>::new())
            .service(ReprocessUnprocessedRoute::<MockNotificationJournal, ScriptedOrderSource, StubTokenProvider>::new())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(queue));
    }
}

const RECOVERED_JSON: &str = r#"{"success":true,"message":"Missed-feed recovery finished","total":2,"processed":1,"errors":0,"queue":{"total_received":1,"total_completed":0,"total_failed":0,"total_retried":0,"queued":1,"active":0,"dispatcher_running":false}}"#;

const SKIPPED_JSON: &str = r#"{"success":true,"message":"Missed-feed recovery finished","total":1,"processed":0,"errors":0,"queue":{"total_received":0,"total_completed":0,"total_failed":0,"total_retried":0,"queued":0,"active":0,"dispatcher_running":false}}"#;

const EMPTY_SWEEP_JSON: &str = r#"{"success":true,"message":"Missed-feed recovery finished","total":0,"processed":0,"errors":0,"queue":{"total_received":0,"total_completed":0,"total_failed":0,"total_retried":0,"queued":0,"active":0,"dispatcher_running":false}}"#;

const REPROCESSED_JSON: &str = r#"{"success":true,"message":"Reprocessing queued","total":2,"reprocessed":1,"queue":{"total_received":1,"total_completed":0,"total_failed":0,"total_retried":0,"queued":1,"active":0,"dispatcher_running":false}}"#;
