//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::ports::{PostRepository, UserRepository};
use quill_infra::database::DatabaseConnections;
use quill_infra::database::{InMemoryPostRepository, InMemoryStore, InMemoryUserRepository};

#[cfg(feature = "postgres")]
use quill_infra::database::{DatabaseConfig, PostgresPostRepository, PostgresUserRepository};

#[cfg(not(feature = "postgres"))]
use quill_infra::database::DatabaseConfig;

/// Shared application state: the repository handles and the store
/// connection they run on.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state.
    ///
    /// A configured but unreachable store is a fatal startup error; with no
    /// store configured the server falls back to the in-memory
    /// repositories.
    pub async fn new(db_config: Option<&DatabaseConfig>) -> std::io::Result<Self> {
        #[cfg(feature = "postgres")]
        if let Some(config) = db_config {
            let connections = DatabaseConnections::init(config).await.map_err(|e| {
                tracing::error!("Failed to connect to database: {}", e);
                std::io::Error::other(e.to_string())
            })?;
            let conn = Arc::new(connections);
            let users = Arc::new(PostgresUserRepository::new(conn.pool.clone()));
            let posts = Arc::new(PostgresPostRepository::new(conn.pool.clone()));

            tracing::info!("Application state initialized (postgres)");
            return Ok(Self {
                users,
                posts,
                db: Some(conn),
            });
        }

        #[cfg(not(feature = "postgres"))]
        if db_config.is_some() {
            tracing::warn!(
                "DATABASE_URL is set but the postgres feature is disabled; using the in-memory store"
            );
        }

        tracing::warn!("No database configured - running on the in-memory store (data is lost on restart)");
        let store = Arc::new(InMemoryStore::new());
        Ok(Self {
            users: Arc::new(InMemoryUserRepository::new(store.clone())),
            posts: Arc::new(InMemoryPostRepository::new(store)),
            db: None,
        })
    }
}
