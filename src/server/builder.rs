//! ServerBuilder for fluent API to build HTTP servers

use super::router::{build_listing_routes, health_routes};
use crate::config::ListingConfig;
use crate::core::session::SessionStore;
use crate::core::store::RequestStore;
use crate::listing::handlers::AppState;
use crate::listing::template::ListingTemplates;
use crate::listing::view::RequestsView;
use crate::storage::InMemorySessionStore;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Builder for creating the listing server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_request_store(InMemoryRequestStore::new())
///     .with_config(ListingConfig::from_yaml_file("listing.yaml")?)
///     .build()?;
/// ```
pub struct ServerBuilder {
    request_store: Option<Arc<dyn RequestStore>>,
    session_store: Option<Arc<dyn SessionStore>>,
    config: ListingConfig,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            request_store: None,
            session_store: None,
            config: ListingConfig::default(),
            custom_routes: Vec::new(),
        }
    }

    /// Set the record store (required)
    pub fn with_request_store(mut self, store: impl RequestStore + 'static) -> Self {
        self.request_store = Some(Arc::new(store));
        self
    }

    /// Set an already shared record store
    pub fn with_shared_request_store(mut self, store: Arc<dyn RequestStore>) -> Self {
        self.request_store = Some(store);
        self
    }

    /// Set the session store
    ///
    /// Defaults to an [`InMemorySessionStore`].
    pub fn with_session_store(mut self, store: impl SessionStore + 'static) -> Self {
        self.session_store = Some(Arc::new(store));
        self
    }

    /// Set the configuration
    pub fn with_config(mut self, config: ListingConfig) -> Self {
        self.config = config;
        self
    }

    /// Add custom routes to the server
    ///
    /// # Example
    ///
    /// ```ignore
    /// use axum::{Router, routing::get};
    ///
    /// let admin_routes = Router::new().route("/version", get(version_handler));
    ///
    /// ServerBuilder::new()
    ///     .with_request_store(store)
    ///     .with_custom_routes(admin_routes)
    ///     .build()?;
    /// ```
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the application state shared by the listing handlers
    pub fn build_state(&mut self) -> Result<AppState> {
        self.config.check()?;

        let request_store = self
            .request_store
            .take()
            .ok_or_else(|| anyhow::anyhow!("RequestStore is required. Call .with_request_store()"))?;
        let sessions = self
            .session_store
            .take()
            .unwrap_or_else(|| Arc::new(InMemorySessionStore::new()));

        Ok(AppState {
            view: Arc::new(RequestsView::new(request_store, &self.config)),
            sessions,
            templates: Arc::new(ListingTemplates::new()?),
            session_cookie: Arc::from(self.config.session_cookie.as_str()),
        })
    }

    /// Build the final router
    ///
    /// This generates:
    /// - Health check routes
    /// - Listing routes
    /// - Custom routes
    pub fn build(mut self) -> Result<Router> {
        let state = self.build_state()?;

        let mut app = health_routes().merge(build_listing_routes(state));
        for custom_router in std::mem::take(&mut self.custom_routes) {
            app = app.merge(custom_router);
        }

        Ok(app.layer(TraceLayer::new_for_http()))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the configured address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    ///
    /// # Example
    ///
    /// ```ignore
    /// ServerBuilder::new()
    ///     .with_request_store(store)
    ///     .serve().await?;
    /// ```
    pub async fn serve(self) -> Result<()> {
        let addr = self.config.bind_address.clone();
        let app = self.build()?;
        let listener = TcpListener::bind(&addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for Ctrl+C or SIGTERM
///
/// If a handler cannot be installed, that branch never fires.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
