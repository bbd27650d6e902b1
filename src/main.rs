//! Process entry point (component J): load configuration, stand up the
//! store and upstream client, spawn the gas monitor, and serve the
//! JSON-RPC front end until signaled to shut down.

use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use clap::Parser;
use log::info;

use tx_guard_rpc::config::Config;
use tx_guard_rpc::context::CancellationToken;
use tx_guard_rpc::decoder::WireTransactionDecoder;
use tx_guard_rpc::logger;
use tx_guard_rpc::monitor::GasMonitor;
use tx_guard_rpc::rpc::server::json_rpc;
use tx_guard_rpc::rpc::AppState;
use tx_guard_rpc::store::Store;
use tx_guard_rpc::upstream::UpstreamClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    logger::init(&config.log_level);

    let store = Arc::new(Store::new());
    let upstream = Arc::new(
        UpstreamClient::new(
            config.upstream_url(),
            Duration::from_millis(config.upstream_timeout_ms),
        )
        .context("failed to build upstream HTTP client")?,
    );
    let state = web::Data::new(AppState {
        store: store.clone(),
        upstream: upstream.clone(),
        decoder: Arc::new(WireTransactionDecoder),
    });

    let ctx = CancellationToken::new();
    let monitor = GasMonitor::new(
        store,
        upstream,
        Duration::from_millis(config.gas_monitor_period_ms),
    );
    let monitor_ctx = ctx.clone();
    let monitor_handle = tokio::spawn(async move { monitor.run(monitor_ctx).await });

    let bind_address = config.bind_address();
    info!("listening on {bind_address}");

    let server_ctx = ctx.clone();
    let ctx_data = web::Data::new(ctx.clone());
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(ctx_data.clone())
            .route("/", web::post().to(json_rpc))
    })
    .bind(&bind_address)
    .with_context(|| format!("failed to bind {bind_address}"))?
    .run();

    let server_handle = server.handle();
    tokio::spawn(async move {
        server_ctx.canceled().await;
        server_handle.stop(true).await;
    });

    tokio::select! {
        result = server => result.context("http server error")?,
        _ = tokio::signal::ctrl_c() => {
            info!("received shutdown signal");
        }
    }

    ctx.cancel();
    let _ = monitor_handle.await;
    Ok(())
}
