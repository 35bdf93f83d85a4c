mod fleet_generator;
mod midwares;
mod route_handlers;

use std::{net::SocketAddr, time::Duration};
use axum::{routing::{any, get, post}, Router};
use fleet_generator::gen::FleetSimulator;
use midwares::app_state::{AppState, FeedConfig};
use route_handlers::{query::{graphql_handler, health_handler}, sockets::ws_handler};
use tokio::{net::TcpListener, time};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
  // .env is optional, real environment wins
  dotenvy::dotenv().ok();

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let config = match FeedConfig::from_env() {
    Ok(config) => config,
    Err(e) => {
      error!("invalid feed configuration: {}", e);
      std::process::exit(1);
    }
  };
  let simulator = match FleetSimulator::new() {
    Ok(simulator) => simulator,
    Err(e) => {
      error!("fleet simulator failed to start: {}", e);
      std::process::exit(1);
    }
  };

  let state = AppState::new(simulator);
  tokio::spawn(run_feed(state.clone(), config.interval));

  let app = Router::new()
    .route("/health", get(health_handler))
    .route("/graphql", post(graphql_handler))
    .route("/ws", any(ws_handler))
    .layer(
      CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any),
    )
    .with_state(state);

  let listener = TcpListener::bind(("0.0.0.0", config.port)).await.expect("failed to start tcp listener");
  info!("logistics feed listening on port {} (update every {:?})", config.port, config.interval);

  axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await.expect("failed to start server");
}

async fn run_feed(state: AppState, period: Duration) {
  let mut interval = time::interval(period);
  info!("starting fleet simulation");

  loop {
    interval.tick().await;
    let updates = state.simulator.write().await.next_updates();
    for update in updates {
      // Err only means nobody is subscribed right now
      if state.updates.send(update).is_err() {
        debug!("no subscribers for this update");
      }
    }
  }
}
