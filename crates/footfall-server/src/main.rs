//! Process bootstrap: load config, connect and migrate the store,
//! optionally wire up the chain adapter, and run the WebSocket gateway,
//! the REST projection, and the daily batch scheduler concurrently in
//! one process. Grounded on `nexus-server::main`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use footfall_chain::ChainGateway;
use footfall_db::Database;
use footfall_gateway::GatewayState;

mod rest;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = footfall_common::config::init()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "footfall=debug,tower_http=debug".into()),
        )
        .with_target(true)
        .init();

    tracing::info!("starting footfall-server v{}", env!("CARGO_PKG_VERSION"));

    let db = Database::connect(config).await?;
    db.migrate().await?;

    let chain = match &config.chain {
        Some(chain_config) => {
            let gateway = ChainGateway::new(chain_config)
                .map_err(|e| anyhow::anyhow!("failed to initialize chain adapter: {e}"))?;
            tracing::info!(key = %gateway.public_key_hex(), "chain mirroring enabled");
            Some(Arc::new(gateway))
        }
        None => {
            tracing::warn!("no chain configuration found, running in local-only mode");
            None
        }
    };
    let chain_deadline = Duration::from_secs(config.batch.chain_call_timeout_secs);

    let scheduler_pool = db.pool.clone();
    let scheduler_chain = chain.clone();
    let scheduler_hour = config.batch.schedule_hour_local;
    let scheduler_minute = config.batch.schedule_minute_local;
    tokio::spawn(async move {
        let chain_ref = scheduler_chain.as_deref();
        footfall_batch::run_daily_scheduler(scheduler_pool, chain_ref, scheduler_hour, scheduler_minute, chain_deadline)
            .await;
    });

    let gateway_state = GatewayState::new(
        db.pool.clone(),
        chain.clone(),
        chain_deadline,
        config.session.outbound_channel_capacity,
    );
    let gateway_router = footfall_gateway::build_router(gateway_state);
    let gateway_addr = SocketAddr::new(config.server.host.parse()?, config.server.ws_port);

    let rest_state = rest::RestState { db: db.clone(), chain: chain.clone(), chain_deadline };
    let rest_router = rest::build_router(rest_state);
    let rest_addr = SocketAddr::new(config.server.host.parse()?, config.server.http_port);

    tracing::info!("REST projection listening on http://{rest_addr}");
    tracing::info!("gateway listening on ws://{gateway_addr}");

    tokio::try_join!(
        async {
            let listener = tokio::net::TcpListener::bind(rest_addr).await?;
            axum::serve(listener, rest_router).await?;
            Ok::<_, anyhow::Error>(())
        },
        async {
            let listener = tokio::net::TcpListener::bind(gateway_addr).await?;
            axum::serve(listener, gateway_router).await?;
            Ok::<_, anyhow::Error>(())
        },
    )?;

    Ok(())
}
