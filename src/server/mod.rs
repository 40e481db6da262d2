use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use crate::schema::Introspector;
use crate::storage::{Gateway, StoreConfig, StoreInitializer};
use crate::ui::Icons;

pub mod routes;

/// Server state
pub struct AppState {
    pub initializer: StoreInitializer,
    pub gateway: Gateway,
    pub introspector: Introspector,
    /// Sessions hold it shared; creating, recreating and deleting the store
    /// hold it exclusively.
    store_lock: RwLock<()>,
}

impl AppState {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            initializer: StoreInitializer::new(config.clone()),
            gateway: Gateway::new(config.clone()),
            introspector: Introspector::new(config),
            store_lock: RwLock::new(()),
        }
    }

    /// Guard for ordinary session access
    pub fn shared(&self) -> RwLockReadGuard<'_, ()> {
        self.store_lock.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Guard for operations that replace or remove the store files
    pub fn exclusive(&self) -> RwLockWriteGuard<'_, ()> {
        self.store_lock.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Build the API router; static files are not served from here
pub fn build_router(state: Arc<AppState>) -> Router {
    let data = Router::new()
        .route("/initialize", post(routes::initialize))
        .route("/reset", post(routes::reset))
        .route("/delete", axum::routing::delete(routes::delete_store))
        .route("/workspace", get(routes::get_workspace).post(routes::save_workspace))
        .route("/users", get(routes::get_users))
        .route("/status", get(routes::get_status));

    let schema = Router::new()
        .route("/database", get(routes::database_schema))
        .route("/type/{name}", get(routes::type_schema))
        .route("/structure", get(routes::data_structure))
        .route("/types", get(routes::available_types));

    Router::new()
        .nest("/api/data", data)
        .nest("/api/schema", schema)
        .with_state(state)
}

pub async fn start_server(port: u16, config: StoreConfig, static_dir: PathBuf) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config));

    let app = build_router(state)
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);
    println!("{} Server running at http://{}", Icons::ROCKET, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
