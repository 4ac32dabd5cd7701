use std::{env, time::Duration};

use log::*;
use meli_sales_engine::{queue::QueueConfig, DEFAULT_SCAN_LIMIT};
use mercado_tools::MercadoConfig;

const DEFAULT_MSP_HOST: &str = "127.0.0.1";
const DEFAULT_MSP_PORT: u16 = 3000;
const DEFAULT_API_DELAY_MS: u64 = 200;
const DEFAULT_RECOVERY_INTERVAL_SECS: u64 = 600;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Pause between successive remote calls while a single task is being reconciled. This is deliberate
    /// backpressure against the marketplace's rate limits, not a tunable to race to zero.
    pub api_delay: Duration,
    /// Concurrency bound, retry delay and attempt budget for the in-memory task queue.
    pub queue: QueueConfig,
    /// Wall-clock period of the background recovery worker.
    pub recovery_interval: Duration,
    /// How many stored-but-unprocessed notifications one reprocessing sweep picks up.
    pub unprocessed_scan_limit: i64,
    /// Connection and retry settings for the marketplace REST client, including the application id
    /// that missed-feed recovery needs.
    pub mercado: MercadoConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MSP_HOST.to_string(),
            port: DEFAULT_MSP_PORT,
            database_url: String::default(),
            api_delay: Duration::from_millis(DEFAULT_API_DELAY_MS),
            queue: QueueConfig::default(),
            recovery_interval: Duration::from_secs(DEFAULT_RECOVERY_INTERVAL_SECS),
            unprocessed_scan_limit: DEFAULT_SCAN_LIMIT,
            mercado: MercadoConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MSP_HOST").ok().unwrap_or_else(|| DEFAULT_MSP_HOST.into());
        let port = env::var("MSP_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for MSP_PORT. {e} Using the default, {DEFAULT_MSP_PORT}, instead."
                    );
                    DEFAULT_MSP_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_MSP_PORT);
        let database_url = env::var("MSP_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ MSP_DATABASE_URL is not set. Please set it to the URL for the sales database.");
            String::default()
        });
        let api_delay = env::var("MSP_API_DELAY_MS")
            .map_err(|_| info!("🪛️ MSP_API_DELAY_MS is not set. Using the default value of {DEFAULT_API_DELAY_MS}ms."))
            .and_then(|s| {
                s.parse::<u64>().map_err(|e| warn!("🪛️ Invalid configuration value for MSP_API_DELAY_MS. {e}"))
            })
            .map(Duration::from_millis)
            .ok()
            .unwrap_or(Duration::from_millis(DEFAULT_API_DELAY_MS));
        let queue = configure_queue();
        let recovery_interval = env::var("MSP_RECOVERY_INTERVAL_SECS")
            .map_err(|_| {
                info!(
                    "🪛️ MSP_RECOVERY_INTERVAL_SECS is not set. Using the default value of \
                     {DEFAULT_RECOVERY_INTERVAL_SECS}s."
                )
            })
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for MSP_RECOVERY_INTERVAL_SECS. {e}"))
            })
            .map(Duration::from_secs)
            .ok()
            .unwrap_or(Duration::from_secs(DEFAULT_RECOVERY_INTERVAL_SECS));
        let unprocessed_scan_limit = env::var("MSP_UNPROCESSED_SCAN_LIMIT")
            .map_err(|_| {
                info!("🪛️ MSP_UNPROCESSED_SCAN_LIMIT is not set. Using the default value of {DEFAULT_SCAN_LIMIT}.")
            })
            .and_then(|s| {
                s.parse::<i64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for MSP_UNPROCESSED_SCAN_LIMIT. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_SCAN_LIMIT);
        let mercado = MercadoConfig::new_from_env_or_default();
        Self { host, port, database_url, api_delay, queue, recovery_interval, unprocessed_scan_limit, mercado }
    }
}

fn configure_queue() -> QueueConfig {
    let defaults = QueueConfig::default();
    let max_concurrent = env::var("MSP_QUEUE_CONCURRENT")
        .map_err(|_| {
            info!("🪛️ MSP_QUEUE_CONCURRENT is not set. Using the default value of {}.", defaults.max_concurrent)
        })
        .and_then(|s| {
            s.parse::<usize>().map_err(|e| warn!("🪛️ Invalid configuration value for MSP_QUEUE_CONCURRENT. {e}"))
        })
        .ok()
        .unwrap_or(defaults.max_concurrent);
    let retry_delay = env::var("MSP_QUEUE_RETRY_DELAY_MS")
        .map_err(|_| {
            info!(
                "🪛️ MSP_QUEUE_RETRY_DELAY_MS is not set. Using the default value of {}ms.",
                defaults.retry_delay.as_millis()
            )
        })
        .and_then(|s| {
            s.parse::<u64>().map_err(|e| warn!("🪛️ Invalid configuration value for MSP_QUEUE_RETRY_DELAY_MS. {e}"))
        })
        .map(Duration::from_millis)
        .ok()
        .unwrap_or(defaults.retry_delay);
    let max_attempts = env::var("MSP_QUEUE_MAX_ATTEMPTS")
        .map_err(|_| {
            info!("🪛️ MSP_QUEUE_MAX_ATTEMPTS is not set. Using the default value of {}.", defaults.max_attempts)
        })
        .and_then(|s| {
            s.parse::<u32>().map_err(|e| warn!("🪛️ Invalid configuration value for MSP_QUEUE_MAX_ATTEMPTS. {e}"))
        })
        .ok()
        .unwrap_or(defaults.max_attempts);
    QueueConfig { max_concurrent, retry_delay, max_attempts }
}
