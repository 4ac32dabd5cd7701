use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use meli_sales_engine::{queue::RetryQueue, LiveTaskHandler, ReconcilerApi, RecoveryApi, SqliteDatabase, TokenApi};
use mercado_tools::MercadoApi;

use crate::{
    config::ServerConfig,
    data_objects::ServerStartTime,
    errors::ServerError,
    recovery_worker::start_recovery_worker,
    routes::{
        clear_queue,
        health,
        process_order,
        process_pack,
        NotificationStatisticsRoute,
        NotificationsRoute,
        RecoverMissedFeedsRoute,
        ReprocessUnprocessedRoute,
        StatusRoute,
        WebhookRootRoute,
        WebhookRoute,
    },
};

/// The credential provider the live server runs with.
pub type LiveTokenApi = TokenApi<SqliteDatabase>;
/// The marketplace REST client the live server reconciles against.
pub type LiveOrderSource = MercadoApi<LiveTokenApi>;
pub type LiveRecoveryApi = RecoveryApi<SqliteDatabase, LiveOrderSource, LiveTokenApi>;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Assembles the HTTP server together with its background machinery.
///
/// The queue dispatcher and the recovery worker are process-wide singletons. Everything they touch is built once
/// out here and the worker factory closure only clones handles; building them inside the closure would give every
/// actix worker its own queue and multiply the remote call rate by the worker count.
pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let tokens = TokenApi::new(db.clone());
    let source =
        MercadoApi::new(config.mercado.clone(), tokens.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let queue = RetryQueue::new(config.queue.clone());
    let reconciler = ReconcilerApi::new(db.clone(), source.clone(), config.api_delay);
    let _dispatcher = queue.start(LiveTaskHandler::new(db.clone(), reconciler));
    let recovery = RecoveryApi::new(db.clone(), source, tokens.clone(), queue.clone(), config.mercado.app_id.clone())
        .with_scan_limit(config.unprocessed_scan_limit);
    let _recovery_worker = start_recovery_worker(recovery.clone(), config.recovery_interval);
    let started = ServerStartTime::now();
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("msp::access_log"))
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(tokens.clone()))
            .app_data(web::Data::new(queue.clone()))
            .app_data(web::Data::new(recovery.clone()))
            .app_data(web::Data::new(started))
            .service(health)
            .service(process_order)
            .service(process_pack)
            .service(clear_queue)
            .service(WebhookRoute::<SqliteDatabase>::new())
            .service(WebhookRootRoute::<SqliteDatabase>::new())
            .service(StatusRoute::<LiveTokenApi>::new())
            .service(RecoverMissedFeedsRoute::<SqliteDatabase, LiveOrderSource, LiveTokenApi>::new())
            .service(ReprocessUnprocessedRoute::<SqliteDatabase, LiveOrderSource, LiveTokenApi>::new())
            .service(NotificationsRoute::<SqliteDatabase>::new())
            .service(NotificationStatisticsRoute::<SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
