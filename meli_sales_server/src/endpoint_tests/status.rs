use actix_web::{http::StatusCode, web, web::ServiceConfig};
use meli_sales_engine::{
    queue::{QueueConfig, RetryQueue},
    test_utils::sources::StubTokenProvider,
};
use serde_json::Value;

use super::helpers::get_request;
use crate::{
    data_objects::ServerStartTime,
    routes::{health, StatusRoute},
};

#[actix_web::test]
async fn health_reports_uptime_and_queue_state() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        cfg.service(health)
            .app_data(web::Data::new(RetryQueue::new(QueueConfig::default())))
            .app_data(web::Data::new(ServerStartTime::now()));
    };
    let (status, body) = get_request("/health", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_str(&body).expect("Health response is not JSON");
    assert_eq!(v["status"], "ok");
    assert!(v["uptime_secs"].is_u64());
    assert_eq!(v["queue"]["queued"], 0);
    assert_eq!(v["queue"]["dispatcher_running"], false);
}

#[actix_web::test]
async fn status_masks_the_access_token() {
    let _ = env_logger::try_init().ok();
    let tokens = StubTokenProvider::new("a-very-secret-token", "446575687");
    let configure = move |cfg: &mut ServiceConfig| {
        cfg.service(StatusRoute::<StubTokenProvider>::new())
            .app_data(web::Data::new(tokens))
            .app_data(web::Data::new(RetryQueue::new(QueueConfig::default())));
    };
    let (status, body) = get_request("/status", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("a-very-secret-token"), "The raw access token must never appear in a response");
    let v: Value = serde_json::from_str(&body).expect("Status response is not JSON");
    assert_eq!(v["status"], "running");
    assert_eq!(v["token"]["access_token"], "***");
    assert_eq!(v["token"]["user_id"], "446575687");
}
