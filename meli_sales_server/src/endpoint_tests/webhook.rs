use actix_web::{http::StatusCode, web, web::ServiceConfig};
use meli_sales_engine::{
    queue::{QueueConfig, RetryQueue},
    NotificationStoreError,
};

use super::helpers::{post_request, stored_notification};
use crate::{
    endpoint_tests::mocks::MockNotificationJournal,
    routes::{WebhookRootRoute, WebhookRoute},
};

#[actix_web::test]
async fn order_notifications_are_journaled_and_queued() {
    let _ = env_logger::try_init().ok();
    let mut journal = MockNotificationJournal::new();
    journal
        .expect_store_notification()
        .withf(|n| {
            n.notification_id == "df0d4ab0-5de2-4a2b-8c40-6a33921f1401"
                && n.topic.as_deref() == Some("orders")
                && n.resource.as_deref() == Some("/orders/2000012345678901")
                && n.user_id.as_deref() == Some("446575687")
                && n.request_data.is_some()
        })
        .times(1)
        .returning(|_| Ok(stored_notification("df0d4ab0-5de2-4a2b-8c40-6a33921f1401")));
    let queue = RetryQueue::new(QueueConfig::default());
    let (status, body) =
        post_request("/webhook", ORDER_PAYLOAD, configure_with(journal, queue.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    assert_eq!(queue.pending(), 1);
}

#[actix_web::test]
async fn the_bare_callback_path_accepts_deliveries_too() {
    let _ = env_logger::try_init().ok();
    let mut journal = MockNotificationJournal::new();
    journal
        .expect_store_notification()
        .times(1)
        .returning(|_| Ok(stored_notification("df0d4ab0-5de2-4a2b-8c40-6a33921f1401")));
    let queue = RetryQueue::new(QueueConfig::default());
    let (status, body) =
        post_request("/", ORDER_PAYLOAD, configure_with(journal, queue.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    assert_eq!(queue.pending(), 1);
}

#[actix_web::test]
async fn non_order_topics_are_journaled_but_not_queued() {
    let _ = env_logger::try_init().ok();
    let mut journal = MockNotificationJournal::new();
    journal
        .expect_store_notification()
        .withf(|n| n.notification_id == "q-778" && n.topic.as_deref() == Some("questions"))
        .times(1)
        .returning(|_| Ok(stored_notification("q-778")));
    let queue = RetryQueue::new(QueueConfig::default());
    let (status, body) =
        post_request("/webhook", QUESTION_PAYLOAD, configure_with(journal, queue.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    assert_eq!(queue.pending(), 0);
}

#[actix_web::test]
async fn order_topics_without_a_usable_resource_are_journaled_only() {
    let _ = env_logger::try_init().ok();
    let mut journal = MockNotificationJournal::new();
    journal.expect_store_notification().times(1).returning(|_| Ok(stored_notification("o-449")));
    let queue = RetryQueue::new(QueueConfig::default());
    let (status, _) =
        post_request("/webhook", ORPHAN_ORDER_PAYLOAD, configure_with(journal, queue.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queue.pending(), 0);
}

#[actix_web::test]
async fn a_failing_journal_never_blocks_the_acknowledgement() {
    let _ = env_logger::try_init().ok();
    let mut journal = MockNotificationJournal::new();
    journal
        .expect_store_notification()
        .times(1)
        .returning(|_| Err(NotificationStoreError::DatabaseError("the database is on fire".to_string())));
    let queue = RetryQueue::new(QueueConfig::default());
    let (status, body) =
        post_request("/webhook", ORDER_PAYLOAD, configure_with(journal, queue.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
    assert_eq!(queue.pending(), 0);
}

#[actix_web::test]
async fn junk_payloads_are_acknowledged_and_dropped() {
    let _ = env_logger::try_init().ok();
    for payload in ["", "this is not json", "[1,2,3]", "{}"] {
        let mut journal = MockNotificationJournal::new();
        journal.expect_store_notification().times(0);
        let queue = RetryQueue::new(QueueConfig::default());
        let (status, body) =
            post_request("/webhook", payload, configure_with(journal, queue.clone())).await.expect("Request failed");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
        assert_eq!(queue.pending(), 0);
    }
}

fn configure_with(journal: MockNotificationJournal, queue: RetryQueue) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(WebhookRoute::<MockNotificationJournal>::new())
            .service(WebhookRootRoute::<MockNotificationJournal>::new())
            .app_data(web::Data::new(journal))
            .app_data(web::Data::new(queue));
    }
}

const ORDER_PAYLOAD: &str = r#"{"_id":"df0d4ab0-5de2-4a2b-8c40-6a33921f1401","topic":"orders","resource":"/orders/2000012345678901","user_id":446575687,"application_id":8123456789,"attempts":1,"sent":"2024-05-10T14:00:00.000Z","received":"2024-05-10T14:00:01.000Z"}"#;

const QUESTION_PAYLOAD: &str =
    r#"{"_id":"q-778","topic":"questions","resource":"/questions/555","user_id":446575687}"#;

const ORPHAN_ORDER_PAYLOAD: &str = r#"{"_id":"o-449","topic":"orders","user_id":446575687}"#;
