use std::sync::Arc;

use boothbook_service::BoothServices;
use boothbook_store::GitHubStore;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// boothbook HTTP server.
pub struct BoothServer {
    config: ServerConfig,
    services: BoothServices,
}

impl BoothServer {
    pub fn new(config: ServerConfig, services: BoothServices) -> Self {
        Self { config, services }
    }

    /// Validate `config` and connect the services to the configured repository.
    pub fn connect(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;
        let store = GitHubStore::new(config.repo.clone())?;
        let services = services_for(&config, Arc::new(store));
        Ok(Self::new(config, services))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn router(&self) -> axum::Router {
        build_router(AppState {
            services: self.services.clone(),
        })
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            repository = %self.config.repo.repository,
            branch = %self.config.repo.branch,
            "boothbook server listening"
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

/// Services over `store` with the branch, paths, retry and retention from `config`.
pub fn services_for(config: &ServerConfig, store: Arc<dyn boothbook_store::ObjectStore>) -> BoothServices {
    BoothServices::new(store, config.repo.branch.clone(), config.documents.clone())
        .with_retry(config.retry.clone())
        .with_retention(config.retention())
}
