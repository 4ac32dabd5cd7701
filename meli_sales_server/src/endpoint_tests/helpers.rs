use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::{TimeZone, Utc};
use log::debug;
use meli_sales_engine::db_types::Notification;

// A journal row with fixed timestamps, so response bodies can be asserted verbatim.
pub fn stored_notification(notification_id: &str) -> Notification {
    let received = Utc.with_ymd_and_hms(2024, 5, 10, 14, 0, 5).unwrap();
    Notification {
        id: 1,
        notification_id: notification_id.to_string(),
        resource: Some("/orders/2000012345678901".to_string()),
        topic: Some("orders".to_string()),
        user_id: Some("446575687".to_string()),
        application_id: Some("8123456789".to_string()),
        attempts: Some("1".to_string()),
        sent_at: Some(Utc.with_ymd_and_hms(2024, 5, 10, 14, 0, 0).unwrap()),
        received_at: received,
        request_data: Some(r#"{"topic":"orders"}"#.to_string()),
        response_data: None,
        processed: false,
        processed_at: None,
        error_message: None,
        created_at: received,
        updated_at: received,
    }
}

pub async fn get_request(
    path: &str,
    configure: impl FnOnce(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = TestRequest::get().uri(path).to_request();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making GET request to {path}");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}

pub async fn post_request(
    path: &str,
    payload: &str,
    configure: impl FnOnce(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = TestRequest::post().uri(path).set_payload(payload.to_string()).to_request();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making POST request to {path}");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}
