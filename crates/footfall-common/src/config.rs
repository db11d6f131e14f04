//! Application configuration loaded from environment variables.
//!
//! Matches spec.md §6's enumerated configuration set exactly: network
//! identifier, chain package handle, chain registry handle, chain
//! signing key, HTTP port, WebSocket port, database path. Absence of any
//! `chain.*` variable disables chain mirroring globally — the server
//! then runs in local-only mode with every functional path intact except
//! chain side effects (spec.md §6).

use serde::Deserialize;
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Get the global application configuration.
///
/// # Panics
/// Panics if config has not been initialized via [`init`].
pub fn get() -> &'static AppConfig {
    CONFIG.get().expect("config not initialized — call footfall_common::config::init() first")
}

/// Initialize the global configuration from environment.
///
/// Should be called once at process startup, before any other code reads
/// config.
pub fn init() -> Result<&'static AppConfig, config::ConfigError> {
    let _ = dotenvy::dotenv();

    let cfg = config::Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.http_port", 8090)?
        .set_default("server.ws_port", 8091)?
        .set_default("database.path", "sqlite://footfall.db")?
        .set_default("database.max_connections", 10)?
        .set_default("database.min_connections", 1)?
        .set_default("batch.schedule_hour_local", 2)?
        .set_default("batch.schedule_minute_local", 0)?
        .set_default("batch.chain_call_timeout_secs", 30)?
        .set_default("session.idle_timeout_secs", 90)?
        .set_default("session.heartbeat_interval_secs", 30)?
        .set_default("session.outbound_channel_capacity", 32)?
        .add_source(config::File::with_name("config").required(false))
        .add_source(
            config::Environment::with_prefix("FOOTFALL")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = cfg.try_deserialize()?;
    Ok(CONFIG.get_or_init(|| app_config))
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub batch: BatchConfig,
    pub session: SessionConfig,
    /// `None` when any `FOOTFALL__CHAIN__*` variable is unset — disables
    /// chain mirroring globally (local-only mode).
    pub chain: Option<ChainConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
    pub ws_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Connection URL, e.g. `sqlite://footfall.db` or `postgres://…`.
    pub path: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BatchConfig {
    pub schedule_hour_local: u32,
    pub schedule_minute_local: u32,
    pub chain_call_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub idle_timeout_secs: u64,
    pub heartbeat_interval_secs: u64,
    pub outbound_channel_capacity: usize,
}

/// Chain adapter configuration. Every field here corresponds to one of
/// spec.md §6's chain-related env vars; if any is missing, `AppConfig::chain`
/// is `None` for the whole process.
#[derive(Debug, Deserialize, Clone)]
pub struct ChainConfig {
    /// Network identifier (e.g. devnet/testnet/mainnet name).
    pub network_id: String,
    /// Chain package handle (the on-chain program/module address).
    pub package_handle: String,
    /// Chain registry handle (the shared registry object the package reads/writes).
    pub registry_handle: String,
    /// This server's chain signing key, encoded (hex seed).
    pub signing_key_hex: String,
    /// Base URL of the chain RPC/adapter endpoint.
    pub rpc_url: String,
}

/// Build an [`AppConfig`] directly from values, bypassing environment
/// loading. Used by tests that need a config without `init()`'s global
/// `OnceLock` side effect.
#[cfg(any(test, feature = "test-util"))]
pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig { host: "127.0.0.1".into(), http_port: 0, ws_port: 0 },
        database: DatabaseConfig {
            path: "sqlite::memory:".into(),
            max_connections: 1,
            min_connections: 1,
        },
        batch: BatchConfig {
            schedule_hour_local: 2,
            schedule_minute_local: 0,
            chain_call_timeout_secs: 30,
        },
        session: SessionConfig {
            idle_timeout_secs: 90,
            heartbeat_interval_secs: 30,
            outbound_channel_capacity: 32,
        },
        chain: None,
    }
}
