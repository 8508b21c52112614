//! Mock backend server

use crate::api::{create_router, start_api_server};
use crate::db::{MockDb, SharedMockDb};
use axum::Router;
use recipebook_core::{RecipebookResult, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Mock REST backend
pub struct MockServer {
    config: ServerConfig,
    db: SharedMockDb,
}

impl MockServer {
    /// Create a server, loading the seed file if one is configured
    pub fn new(config: ServerConfig) -> RecipebookResult<Self> {
        let db = match &config.seed_file {
            Some(path) => {
                info!("Loading seed from {}", path.display());
                MockDb::load(path)?
            }
            None => MockDb::seeded(),
        };

        Ok(Self::with_db(config, Arc::new(db)))
    }

    pub fn with_db(config: ServerConfig, db: SharedMockDb) -> Self {
        Self { config, db }
    }

    pub fn router(&self) -> Router {
        create_router(self.db.clone(), &self.config)
    }

    /// Serve until ctrl-c
    pub async fn start(&self) -> anyhow::Result<()> {
        info!("Starting mock backend...");
        info!("Collections: {}", self.db.collections().join(", "));

        start_api_server(self.db.clone(), &self.config).await?;

        info!("Mock backend stopped");
        Ok(())
    }

    /// Bind the configured address and serve in the background.
    ///
    /// Returns the bound address, useful with port 0.
    pub async fn spawn(&self) -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
        let listener = TcpListener::bind(&self.config.listen_addr).await?;
        let addr = listener.local_addr()?;
        let router = self.router();

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                error!("API server error: {}", e);
            }
        });

        info!("Mock backend listening on {}", addr);
        Ok((addr, handle))
    }

    pub fn db(&self) -> &SharedMockDb {
        &self.db
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Server builder for easier configuration
pub struct ServerBuilder {
    config: ServerConfig,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn listen_addr(mut self, addr: &str) -> Self {
        self.config.listen_addr = addr.to_string();
        self
    }

    pub fn api_root(mut self, root: &str) -> Self {
        self.config.api_root = root.to_string();
        self
    }

    pub fn seed_file(mut self, path: PathBuf) -> Self {
        self.config.seed_file = Some(path);
        self
    }

    pub fn cors(mut self, enabled: bool) -> Self {
        self.config.enable_cors = enabled;
        self
    }

    pub fn build(self) -> RecipebookResult<MockServer> {
        MockServer::new(self.config)
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipebook_core::RecipebookError;

    #[test]
    fn test_builder_defaults_to_seeded_db() {
        let server = ServerBuilder::new().cors(false).build().unwrap();
        assert!(!server.config().enable_cors);
        assert_eq!(server.db().list("recipes").unwrap().len(), 4);
    }

    #[test]
    fn test_missing_seed_file_fails() {
        let result = ServerBuilder::new()
            .seed_file(PathBuf::from("/no/such/seed.json"))
            .build();
        assert!(matches!(result, Err(RecipebookError::Io(_))));
    }

    #[tokio::test]
    async fn test_spawn_on_ephemeral_port() {
        let server = ServerBuilder::new().listen_addr("127.0.0.1:0").build().unwrap();
        let (addr, handle) = server.spawn().await.unwrap();

        assert_ne!(addr.port(), 0);
        handle.abort();
    }
}
