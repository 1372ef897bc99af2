//! Shared state handed to every handler.

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use greengrocer_auth::{FreeEmailDomains, PasswordHasher, TokenIssuer, UserAccount};
use greengrocer_infra::{DocumentStore, InMemoryDocumentStore, PostgresDocumentStore};
use greengrocer_inventory::Vegetable;

use crate::app::errors::ApiError;
use crate::config::Config;

pub type UserStore = Arc<dyn DocumentStore<UserAccount>>;
pub type VegetableStore = Arc<dyn DocumentStore<Vegetable>>;

pub struct AppServices {
    pub users: UserStore,
    pub vegetables: VegetableStore,
    pub hasher: Arc<PasswordHasher>,
    pub tokens: Arc<TokenIssuer>,
    pub free_domains: Arc<FreeEmailDomains>,
}

impl AppServices {
    /// Services backed by in-memory stores (tests, local dev).
    pub fn in_memory(secret: &[u8], hasher: PasswordHasher, free_domains: FreeEmailDomains) -> Self {
        Self {
            users: Arc::new(InMemoryDocumentStore::<UserAccount>::new()),
            vegetables: Arc::new(InMemoryDocumentStore::<Vegetable>::new()),
            hasher: Arc::new(hasher),
            tokens: Arc::new(TokenIssuer::new(secret)),
            free_domains: Arc::new(free_domains),
        }
    }

    /// Wire services from configuration: Postgres when `DATABASE_URL` is
    /// set, in-memory otherwise.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let hasher = PasswordHasher::new(config.hash_cost).context("invalid Argon2 work factor")?;
        let free_domains = match &config.free_email_domains_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read free email domains from {}", path.display()))?;
                FreeEmailDomains::from_json(&raw).context("free email domains file must be a JSON array of strings")?
            }
            None => FreeEmailDomains::bundled(),
        };
        tracing::info!(count = free_domains.len(), "free email domains loaded");

        let mut services = Self::in_memory(config.secret_key.as_bytes(), hasher, free_domains);

        match &config.database_url {
            Some(url) => {
                let pool = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("failed to connect to Postgres")?;

                let users = PostgresDocumentStore::<UserAccount>::new(pool.clone());
                users.ensure_schema().await.context("failed to prepare users collection")?;
                let vegetables = PostgresDocumentStore::<Vegetable>::new(pool);
                vegetables.ensure_schema().await.context("failed to prepare vegetables collection")?;

                services.users = Arc::new(users);
                services.vegetables = Arc::new(vegetables);
                tracing::info!("using Postgres document store");
            }
            None => tracing::warn!("DATABASE_URL not set; using in-memory store"),
        }

        Ok(services)
    }

    /// Hash on a blocking thread; Argon2 is deliberately slow.
    pub async fn hash_password(&self, secret: String) -> Result<String, ApiError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(|e| ApiError::Internal(format!("hashing task failed: {e}")))?
            .map_err(|e| ApiError::Internal(e.to_string()))
    }

    pub async fn verify_password(&self, secret: String, digest: String) -> Result<bool, ApiError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&secret, &digest))
            .await
            .map_err(|e| ApiError::Internal(format!("verification task failed: {e}")))?
            .map_err(|e| ApiError::Internal(e.to_string()))
    }
}
