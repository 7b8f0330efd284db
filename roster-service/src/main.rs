use std::sync::Arc;

use roster_core::store::InMemoryStore;
use roster_service::{api, config, console, jobs};
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() {
    console::init_tracing();

    let config = config::RosterConfig::new();
    // The real entity store is a host concern (§1); this in-memory store
    // stands in so the service is runnable on its own.
    let store: Arc<dyn roster_core::EntityStore> = Arc::new(InMemoryStore::new());
    let jobs = Arc::new(jobs::JobOrchestrator::new(Arc::clone(&store), config));

    let state = api::AppState { store, jobs };
    let app = api::router(state).layer(CorsLayer::permissive());

    let addr: std::net::SocketAddr = "0.0.0.0:8080".parse().unwrap();
    console::print_banner(&addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
