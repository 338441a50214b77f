//! Server setup and lifecycle management

use crate::api::{create_router, AppState};
use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use std::sync::Arc;
use tat_engine::TimelineService;
use tat_storage::InMemoryEntityStore;
use tokio::net::TcpListener;

/// TAT Daemon Server
pub struct Server {
    config: DaemonConfig,
    service: Arc<TimelineService>,
}

impl Server {
    /// Build the engine described by `config` over an in-memory store.
    pub fn new(config: DaemonConfig) -> DaemonResult<Self> {
        let engine = config.engine.engine_config()?;
        let families = engine.families.len();
        let rules = engine.collaborator_rules.len();

        let service = TimelineService::new(engine, Arc::new(InMemoryEntityStore::new()))?;

        tracing::info!(
            families,
            collaborator_rules = rules,
            catalogs = config.engine.catalogs.as_deref().unwrap_or("built-in"),
            "Timeline engine ready"
        );

        Ok(Self {
            config,
            service: Arc::new(service),
        })
    }

    pub fn service(&self) -> Arc<TimelineService> {
        self.service.clone()
    }

    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;
        let app = create_router(AppState::new(self.service.clone()), &self.config.server);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("TAT daemon listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("TAT daemon shut down");
        Ok(())
    }
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineSettings;

    #[test]
    fn test_server_builds_from_default_config() {
        let server = Server::new(DaemonConfig::default()).unwrap();
        assert_eq!(server.service().config().families.len(), 3);
    }

    #[test]
    fn test_bad_catalog_path_fails_startup() {
        let config = DaemonConfig {
            engine: EngineSettings {
                catalogs: Some("/nonexistent/catalogs.json".into()),
                auto_collaborators: true,
            },
            ..Default::default()
        };
        assert!(matches!(Server::new(config), Err(DaemonError::Engine(_))));
    }
}
