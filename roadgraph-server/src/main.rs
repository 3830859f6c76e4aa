//! Road graph builder and route query server

mod api;
mod config;
mod state;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use roadgraph_core::{RoadGraph, build_road_graph, loading::CsvStore};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Overrides, ServerConfig};
use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "roadgraph", version, about)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory with the spatial store CSV exports
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Graph snapshot path
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,
    /// Geometry worker count
    #[arg(long, global = true)]
    workers: Option<usize>,
    #[arg(long, global = true)]
    listen: Option<SocketAddr>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the road graph and write its snapshot
    Build,
    /// Serve place search and route queries from a built snapshot
    Serve,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            data_dir: self.data_dir.clone(),
            snapshot: self.snapshot.clone(),
            workers: self.workers,
            listen: self.listen,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new("roadgraph=info,tower_http=info"))?,
        )
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load(cli.config.as_deref())?.with_overrides(cli.overrides());

    match cli.command {
        Command::Build => build(config).await,
        Command::Serve => serve(config).await,
    }
}

async fn build(config: ServerConfig) -> Result<()> {
    let report = tokio::task::spawn_blocking(move || {
        let store = CsvStore::open(&config.store.data_dir)?;
        build_road_graph(&store, &config.build)
    })
    .await??;

    info!(
        nodes = report.stats.nodes,
        edges = report.stats.edges,
        missing_geometry = report.missing_geometry,
        "build finished"
    );
    Ok(())
}

async fn serve(config: ServerConfig) -> Result<()> {
    let snapshot = config.build.snapshot_path.clone();
    let data_dir = config.store.data_dir.clone();
    let state = tokio::task::spawn_blocking(move || -> Result<AppState> {
        let graph = RoadGraph::load(&snapshot)
            .with_context(|| format!("loading snapshot {}", snapshot.display()))?;
        let store = CsvStore::open(&data_dir)?;
        Ok(AppState {
            graph,
            store,
            on_line_tolerance: config.build.on_line_tolerance,
        })
    })
    .await??;

    info!(
        nodes = state.graph.node_count(),
        data_dir = %state.store.dir().display(),
        "graph and store loaded"
    );
    let app = api::router(Arc::new(state), &config.http);

    info!("Listening on {}", config.http.listen);
    let listener = tokio::net::TcpListener::bind(config.http.listen).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {err}");
    }
    info!("Shutting down");
}
