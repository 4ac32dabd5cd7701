//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate function. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause
//! the current worker to stop processing new requests. Any long, non-cpu-bound operation (I/O, database queries,
//! remote API calls) must be expressed as a future so that the worker can interleave other requests. This matters
//! doubly for the ingestion endpoint: the marketplace expects its acknowledgement within a few seconds, which is why
//! ingestion only journals the delivery and all enrichment happens on the queue.

use actix_web::{get, post, web, HttpResponse, Responder};
use log::*;
use meli_sales_engine::{
    db_types::{NewNotification, NotificationQuery, DEFAULT_PAGE_SIZE},
    queue::{RetryQueue, TaskSpec},
    NotificationManagement,
    OrderSource,
    RecoveryApi,
};
use mercado_tools::{order_id_from_resource, MissedFeedItem, TokenProvider};

use crate::{
    data_objects::{
        DrainResponse,
        HealthStatus,
        NotificationHistory,
        QueueResponse,
        RecoveryResponse,
        ReprocessResponse,
        ServerStartTime,
        ServerStatus,
        StatisticsResponse,
        TokenStatus,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health(queue: web::Data<RetryQueue>, started: web::Data<ServerStartTime>) -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().json(HealthStatus::new(started.uptime_secs(), queue.statistics()))
}

//----------------------------------------------   Ingestion  ----------------------------------------------------
route!(webhook => Post "/webhook" impl NotificationManagement);
/// The ingestion endpoint for marketplace push notifications.
///
/// The marketplace retries any delivery that is not acknowledged quickly with a 2xx, so this handler always
/// answers `200 OK` no matter what the payload looks like or whether storing it worked. Every non-empty JSON
/// object is journaled; only order-related ones are queued for reconciliation. Nothing about the processing
/// outcome is ever reflected in the response.
pub async fn webhook<B: NotificationManagement>(
    body: web::Bytes,
    journal: web::Data<B>,
    queue: web::Data<RetryQueue>,
) -> HttpResponse {
    ingest(&body, journal.get_ref(), &queue).await;
    HttpResponse::Ok().body("OK")
}

route!(webhook_root => Post "/" impl NotificationManagement);
/// The marketplace lets applications register a bare callback URL, so deliveries can also arrive at the root.
pub async fn webhook_root<B: NotificationManagement>(
    body: web::Bytes,
    journal: web::Data<B>,
    queue: web::Data<RetryQueue>,
) -> HttpResponse {
    webhook(body, journal, queue).await
}

async fn ingest<B: NotificationManagement>(payload: &[u8], journal: &B, queue: &RetryQueue) {
    if payload.is_empty() {
        return;
    }
    let raw = match serde_json::from_slice::<serde_json::Value>(payload) {
        Ok(v) => v,
        Err(e) => {
            warn!("📨️ Discarding webhook payload that is not valid JSON. {e}");
            return;
        },
    };
    if !raw.as_object().is_some_and(|o| !o.is_empty()) {
        debug!("📨️ Ignoring empty webhook payload.");
        return;
    }
    let entry = MissedFeedItem::from_raw(raw);
    let order_task = entry.is_order_related().then(|| entry.resource.as_deref().and_then(order_id_from_resource));
    let notification = NewNotification::from_feed(&entry);
    let notification_id = notification.notification_id.clone();
    debug!(
        "📨️ Notification received. topic: {:?} resource: {:?}",
        notification.topic.as_deref(),
        notification.resource.as_deref()
    );
    if let Err(e) = journal.store_notification(notification).await {
        error!("📨️ Could not store notification {notification_id}. {e}");
        return;
    }
    match order_task {
        Some(Some(order_id)) => {
            info!("📨️ Queueing order {order_id} from notification {notification_id}");
            queue.enqueue(TaskSpec::order(order_id).with_notification(&notification_id));
        },
        Some(None) => {
            warn!("📨️ Notification {notification_id} looks order-related but its resource path is unusable.");
        },
        None => {
            debug!("📨️ Notification {notification_id} stored without queueing (topic of no interest).");
        },
    }
}

//----------------------------------------------   Status  ----------------------------------------------------
route!(status => Get "/status" impl TokenProvider);
/// A snapshot of the running server: credential state and queue statistics. The access token itself is masked.
pub async fn status<T: TokenProvider>(tokens: web::Data<T>, queue: web::Data<RetryQueue>) -> HttpResponse {
    debug!("💻️ GET server status");
    let token = tokens.token_info().await.map(TokenStatus::from);
    HttpResponse::Ok().json(ServerStatus::new(token, queue.statistics()))
}

//----------------------------------------------   Manual processing  ------------------------------------------
/// Operators can push an order onto the queue directly, without a backing notification. Useful when a sale is
/// known to be stale and nobody wants to wait for the next recovery sweep.
#[post("/process/order/{order_id}")]
pub async fn process_order(path: web::Path<String>, queue: web::Data<RetryQueue>) -> HttpResponse {
    let order_id = path.into_inner();
    info!("💻️ Manual processing requested for order {order_id}");
    queue.enqueue(TaskSpec::order(&order_id));
    HttpResponse::Ok().json(QueueResponse::new(format!("Order {order_id} added to the queue"), queue.statistics()))
}

#[post("/process/pack/{pack_id}")]
pub async fn process_pack(path: web::Path<String>, queue: web::Data<RetryQueue>) -> HttpResponse {
    let pack_id = path.into_inner();
    info!("💻️ Manual processing requested for pack {pack_id}");
    queue.enqueue(TaskSpec::pack(&pack_id));
    HttpResponse::Ok().json(QueueResponse::new(format!("Pack {pack_id} added to the queue"), queue.statistics()))
}

/// Discards every queued-but-not-yet-running task. In-flight tasks are not cancelled.
#[post("/queue/clear")]
pub async fn clear_queue(queue: web::Data<RetryQueue>) -> HttpResponse {
    let discarded = queue.clear_pending();
    info!("💻️ Queue cleared by operator. {discarded} pending task(s) discarded");
    let message = format!("Queue cleared. {discarded} pending task(s) discarded.");
    HttpResponse::Ok().json(DrainResponse { message, discarded, queue: queue.statistics() })
}

//----------------------------------------------   Recovery  ----------------------------------------------------
route!(recover_missed_feeds => Post "/recovery/missed-feeds" impl NotificationManagement, OrderSource, TokenProvider);
/// Runs the missed-feeds recovery pass on demand. The same pass runs periodically in the background; this
/// endpoint exists so operators do not have to wait for the timer.
pub async fn recover_missed_feeds<B, S, T>(
    api: web::Data<RecoveryApi<B, S, T>>,
    queue: web::Data<RetryQueue>,
) -> Result<HttpResponse, ServerError>
where
    B: NotificationManagement,
    S: OrderSource,
    T: TokenProvider,
{
    info!("💻️ Manual missed-feed recovery requested");
    let outcome = api.recover_missed_feeds().await?;
    Ok(HttpResponse::Ok().json(RecoveryResponse::new("Missed-feed recovery finished", outcome, queue.statistics())))
}

route!(reprocess_unprocessed => Post "/recovery/reprocess" impl NotificationManagement, OrderSource, TokenProvider);
/// Queues every stored-but-unprocessed order notification for another attempt.
pub async fn reprocess_unprocessed<B, S, T>(
    api: web::Data<RecoveryApi<B, S, T>>,
    queue: web::Data<RetryQueue>,
) -> Result<HttpResponse, ServerError>
where
    B: NotificationManagement,
    S: OrderSource,
    T: TokenProvider,
{
    info!("💻️ Manual reprocessing of unprocessed notifications requested");
    let outcome = api.reprocess_unprocessed().await?;
    Ok(HttpResponse::Ok().json(ReprocessResponse::new("Reprocessing queued", outcome, queue.statistics())))
}

//----------------------------------------------   Journal queries  --------------------------------------------
route!(notifications => Get "/notifications" impl NotificationManagement);
/// The notification history, most recent first. Accepts `limit`, `offset`, `processed` and `topic` query
/// parameters; the effective paging values are echoed back.
pub async fn notifications<B: NotificationManagement>(
    query: web::Query<NotificationQuery>,
    journal: web::Data<B>,
) -> Result<HttpResponse, ServerError> {
    let query = query.into_inner();
    debug!("💻️ GET notification history [{query:?}]");
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);
    let page = journal.search_notifications(query).await.map_err(|e| {
        debug!("💻️ Could not fetch the notification history. {e}");
        ServerError::BackendError(e.to_string())
    })?;
    let history = NotificationHistory { success: true, total: page.total, limit, offset, data: page.data };
    Ok(HttpResponse::Ok().json(history))
}

route!(notification_statistics => Get "/notifications/statistics" impl NotificationManagement);
pub async fn notification_statistics<B: NotificationManagement>(
    journal: web::Data<B>,
    queue: web::Data<RetryQueue>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET notification statistics");
    let statistics = journal.notification_statistics().await.map_err(|e| {
        debug!("💻️ Could not compute notification statistics. {e}");
        ServerError::BackendError(e.to_string())
    })?;
    Ok(HttpResponse::Ok().json(StatisticsResponse { success: true, statistics, queue: queue.statistics() }))
}
