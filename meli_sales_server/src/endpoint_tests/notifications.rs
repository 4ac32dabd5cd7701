use std::collections::BTreeMap;

use actix_web::{http::StatusCode, web, web::ServiceConfig};
use meli_sales_engine::{
    db_types::{NotificationPage, NotificationStatistics},
    queue::{QueueConfig, RetryQueue},
    NotificationStoreError,
};

use super::helpers::{get_request, stored_notification};
use crate::{
    endpoint_tests::mocks::MockNotificationJournal,
    routes::{NotificationStatisticsRoute, NotificationsRoute},
};

#[actix_web::test]
async fn history_echoes_the_effective_paging() {
    let _ = env_logger::try_init().ok();
    let mut journal = MockNotificationJournal::new();
    journal
        .expect_search_notifications()
        .withf(|q| q.limit == Some(10) && q.offset == Some(5) && q.processed == Some(false) && q.topic.is_none())
        .times(1)
        .returning(|_| {
            Ok(NotificationPage {
                data: vec![stored_notification("df0d4ab0-5de2-4a2b-8c40-6a33921f1401")],
                total: 42,
            })
        });
    let (status, body) =
        get_request("/notifications?limit=10&offset=5&processed=false", configure_with(journal)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, HISTORY_JSON);
}

#[actix_web::test]
async fn history_defaults_to_the_standard_page() {
    let _ = env_logger::try_init().ok();
    let mut journal = MockNotificationJournal::new();
    journal
        .expect_search_notifications()
        .withf(|q| q.limit.is_none() && q.offset.is_none() && q.processed.is_none() && q.topic.is_none())
        .times(1)
        .returning(|_| Ok(NotificationPage { data: vec![], total: 0 }));
    let (status, body) = get_request("/notifications", configure_with(journal)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"total":0,"limit":50,"offset":0,"data":[]}"#);
}

#[actix_web::test]
async fn journal_failures_surface_as_server_errors() {
    let _ = env_logger::try_init().ok();
    let mut journal = MockNotificationJournal::new();
    journal
        .expect_search_notifications()
        .times(1)
        .returning(|_| Err(NotificationStoreError::DatabaseError("the database is on fire".to_string())));
    let (status, body) = get_request("/notifications", configure_with(journal)).await.expect("Request failed");
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        r#"{"error":"An error occurred on the backend of the server. Database error: the database is on fire"}"#
    );
}

#[actix_web::test]
async fn statistics_combine_journal_and_queue_counters() {
    let _ = env_logger::try_init().ok();
    let mut journal = MockNotificationJournal::new();
    journal.expect_notification_statistics().times(1).returning(|| {
        Ok(NotificationStatistics {
            total: 6,
            processed: 4,
            unprocessed: 2,
            with_error: 1,
            by_topic: BTreeMap::from([("orders".to_string(), 5), ("unknown".to_string(), 1)]),
            last_24_hours: 3,
        })
    });
    let (status, body) = get_request("/notifications/statistics", configure_with(journal)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, STATISTICS_JSON);
}

fn configure_with(journal: MockNotificationJournal) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(NotificationsRoute::<MockNotificationJournal>::new())
            .service(NotificationStatisticsRoute::<MockNotificationJournal>::new())
            .app_data(web::Data::new(journal))
            .app_data(web::Data::new(RetryQueue::new(QueueConfig::default())));
    }
}

const HISTORY_JSON: &str = r#"{"success":true,"total":42,"limit":10,"offset":5,"data":[{"id":1,"notification_id":"df0d4ab0-5de2-4a2b-8c40-6a33921f1401","resource":"/orders/2000012345678901","topic":"orders","user_id":"446575687","application_id":"8123456789","attempts":"1","sent_at":"2024-05-10T14:00:00Z","received_at":"2024-05-10T14:00:05Z","request_data":"{\"topic\":\"orders\"}","response_data":null,"processed":false,"processed_at":null,"error_message":null,"created_at":"2024-05-10T14:00:05Z","updated_at":"2024-05-10T14:00:05Z"}]}"#;

const STATISTICS_JSON: &str = r#"{"success":true,"statistics":{"total":6,"processed":4,"unprocessed":2,"with_error":1,"by_topic":{"orders":5,"unknown":1},"last_24_hours":3},"queue":{"total_received":0,"total_completed":0,"total_failed":0,"total_retried":0,"queued":0,"active":0,"dispatcher_running":false}}"#;
