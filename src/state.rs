//! Process-wide collaborators shared by every request.

use std::sync::Arc;

use crate::auth::{CredentialStore, TokenService};
use crate::config::Config;
use crate::services::{AuthService, TaskService};
use crate::store::{
    postgres, MemoryTaskStore, MemoryUserStore, PgTaskStore, PgUserStore, StoreError, TaskStore,
    UserStore,
};

/// Everything a handler needs, constructed once at startup and read-only after.
///
/// Registered with `web::Data`, so cloning it per worker only clones `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub tasks: TaskService,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
        tokens: TokenService,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            auth: AuthService::new(CredentialStore::new(users, bcrypt_cost), tokens),
            tasks: TaskService::new(tasks),
        }
    }

    /// State backed by the in-memory stores.
    pub fn in_memory(tokens: TokenService, bcrypt_cost: u32) -> Self {
        Self::new(
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryTaskStore::new()),
            tokens,
            bcrypt_cost,
        )
    }

    /// Builds the state described by `config`, connecting to Postgres when a
    /// database URL is configured.
    pub async fn from_config(config: &Config) -> Result<Self, StoreError> {
        let tokens = TokenService::new(&config.jwt_secret, config.jwt_expires_in);

        match &config.database_url {
            Some(url) => {
                let pool = postgres::connect(url, config.database_max_connections).await?;
                Ok(Self::new(
                    Arc::new(PgUserStore::new(pool.clone())),
                    Arc::new(PgTaskStore::new(pool)),
                    tokens,
                    config.bcrypt_cost,
                ))
            }
            None => {
                log::warn!("DATABASE_URL not set, using in-memory storage; data will not persist");
                Ok(Self::in_memory(tokens, config.bcrypt_cost))
            }
        }
    }
}
