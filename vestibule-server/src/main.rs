//! # Vestibule Server
//!
//! Waiting-room gateway for resources with limited concurrent capacity.
//!
//! ## Overview
//!
//! The server fronts a protected resource (a checkout flow, a ticket sale)
//! and throttles entry:
//!
//! - **Waiting room**: arrivals are queued per named line, ordered by
//!   arrival time, and shown their live rank
//! - **Batch promotion**: a background scheduler admits a bounded batch
//!   from every active queue on a fixed cadence
//! - **Admission tokens**: admitted clients carry a deterministic token in
//!   a cookie so repeat requests redirect without touching the queue
//!
//! ## Architecture
//!
//! Built on Axum, with Redis as the shared ordered store (an in-process
//! store is available for single-node development).

use anyhow::Context;
use clap::Parser;
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vestibule_core::{
    AdmissionEngine, MemoryStore, OrderedStore, PromotionScheduler, RedisStore,
};
use vestibule_server::{AppState, Config, routes};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "vestibule-server")]
#[command(about = "Waiting-room admission gateway with scheduled batch promotion")]
struct Cli {
    /// Bind host (overrides SERVER_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides SERVER_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Use the in-process store instead of Redis (single node, dev only)
    #[arg(long)]
    memory_store: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env().context("failed to load configuration")?;
    if let Some(host) = cli.host {
        config.server_host = host;
    }
    if let Some(port) = cli.port {
        config.server_port = port;
    }
    let config = Arc::new(config);

    let store: Arc<dyn OrderedStore> = if cli.memory_store {
        warn!("using the in-process store; queue state is neither shared nor durable");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(
            RedisStore::connect(&config.redis_url)
                .await
                .context("failed to connect to the ordered store")?,
        )
    };

    let engine = Arc::new(
        AdmissionEngine::new(store).with_promotion_mode(config.promotion_mode()),
    );

    PromotionScheduler::new(Arc::clone(&engine), config.scheduler()).spawn();

    let state = AppState::new(engine, Arc::clone(&config));
    let router = routes::create_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .context("invalid server host/port")?;
    info!("Starting Vestibule waiting room on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
