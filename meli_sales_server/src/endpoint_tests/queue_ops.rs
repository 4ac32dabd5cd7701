use actix_web::{http::StatusCode, web, web::ServiceConfig};
use meli_sales_engine::queue::{QueueConfig, RetryQueue, TaskSpec};

use super::helpers::post_request;
use crate::routes::{clear_queue, process_order, process_pack};

#[actix_web::test]
async fn manual_order_processing_goes_straight_to_the_queue() {
    let _ = env_logger::try_init().ok();
    let queue = RetryQueue::new(QueueConfig::default());
    let (status, body) =
        post_request("/process/order/2000012345678901", "", configure_with(queue.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ORDER_QUEUED_JSON);
    assert_eq!(queue.pending(), 1);
}

#[actix_web::test]
async fn manual_pack_processing_goes_straight_to_the_queue() {
    let _ = env_logger::try_init().ok();
    let queue = RetryQueue::new(QueueConfig::default());
    let (status, body) = post_request("/process/pack/555", "", configure_with(queue.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""message":"Pack 555 added to the queue""#));
    assert_eq!(queue.pending(), 1);
}

#[actix_web::test]
async fn clearing_the_queue_reports_what_was_discarded() {
    let _ = env_logger::try_init().ok();
    let queue = RetryQueue::new(QueueConfig::default());
    queue.enqueue(TaskSpec::order("2000000000000001"));
    queue.enqueue(TaskSpec::order("2000000000000002"));
    queue.enqueue(TaskSpec::pack("777"));
    let (status, body) = post_request("/queue/clear", "", configure_with(queue.clone())).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, CLEARED_JSON);
    assert_eq!(queue.pending(), 0);
}

fn configure_with(queue: RetryQueue) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(process_order).service(process_pack).service(clear_queue).app_data(web::Data::new(queue));
    }
}

const ORDER_QUEUED_JSON: &str = r#"{"message":"Order 2000012345678901 added to the queue","queue":{"total_received":1,"total_completed":0,"total_failed":0,"total_retried":0,"queued":1,"active":0,"dispatcher_running":false}}"#;

const CLEARED_JSON: &str = r#"{"message":"Queue cleared. 3 pending task(s) discarded.","discarded":3,"queue":{"total_received":3,"total_completed":0,"total_failed":0,"total_retried":0,"queued":0,"active":0,"dispatcher_running":false}}"#;
