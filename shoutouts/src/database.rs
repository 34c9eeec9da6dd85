//! MongoDB connection provider
//!
//! [`MongoProvider`] hands out a [`Database`] handle. The first handle built
//! is cached and every later call reuses it; the driver pools connections
//! behind that handle and selects a server per operation.

use std::time::Duration;

use mongodb::{
    bson::doc,
    options::ClientOptions,
    Client, Database,
};
use tokio::sync::RwLock;

use crate::{
    config::MongoConfig,
    error::{DatabaseError, DatabaseErrorKind, DatabaseOperation, Result},
};

/// Database used when neither the config nor the URL names one
pub const DEFAULT_DATABASE: &str = "shoutouts";

/// Upper bound on the delay between startup connection attempts
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Supplies a reusable handle to the configured database
pub struct MongoProvider {
    config: MongoConfig,
    database: RwLock<Option<Database>>,
}

impl MongoProvider {
    /// Create a provider that builds its handle on first use
    pub fn new(config: MongoConfig) -> Self {
        Self {
            config,
            database: RwLock::new(None),
        }
    }

    /// Create a provider and connect immediately, retrying with
    /// exponential backoff up to `max_retries` times
    pub async fn connect(config: MongoConfig) -> Result<Self> {
        let database = create_database_with_retries(&config, config.max_retries).await?;
        Ok(Self {
            config,
            database: RwLock::new(Some(database)),
        })
    }

    /// Get the database handle, building it if none is cached yet
    ///
    /// Building a handle does not contact the server and no lock is held
    /// while it is built. An unreachable server surfaces on the operation
    /// that uses the handle, after its own server selection timeout.
    /// A failed build (invalid connection string) is not cached.
    pub async fn database(&self) -> Result<Database> {
        if let Some(database) = self.database.read().await.as_ref() {
            return Ok(database.clone());
        }

        let database = build_database(&self.config).await?;

        let mut slot = self.database.write().await;
        // Another request may have stored a handle meanwhile; first one wins
        Ok(slot.get_or_insert(database).clone())
    }

    /// Get the configuration
    pub fn config(&self) -> &MongoConfig {
        &self.config
    }
}

/// Connect with configurable retries
///
/// Uses exponential backoff strategy for retries
async fn create_database_with_retries(config: &MongoConfig, max_retries: u32) -> Result<Database> {
    let mut attempt = 0;
    let base_delay = Duration::from_secs(config.retry_delay_secs);

    loop {
        match try_create_database(config).await {
            Ok(database) => {
                if attempt > 0 {
                    tracing::info!(
                        "MongoDB connection established after {} attempt(s)",
                        attempt + 1
                    );
                }
                return Ok(database);
            }
            Err(e) => {
                attempt += 1;

                if attempt > max_retries {
                    tracing::error!(
                        "Failed to connect to MongoDB after {} attempts: {}",
                        max_retries.saturating_add(1),
                        e
                    );
                    return Err(e);
                }

                let delay = backoff_delay(base_delay, attempt);

                tracing::warn!(
                    "MongoDB connection attempt {} failed: {}. Retrying in {:?}...",
                    attempt,
                    e,
                    delay
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`,
/// capped at [`MAX_RETRY_DELAY`]
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let multiplier = 2_u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(multiplier).min(MAX_RETRY_DELAY)
}

/// Attempt to connect (single try) and verify the server answers a ping
async fn try_create_database(config: &MongoConfig) -> Result<Database> {
    let database = build_database(config).await?;
    let url_safe = sanitize_url(&config.url);

    database
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|e| {
            DatabaseError::new(
                DatabaseOperation::Connect,
                DatabaseErrorKind::ConnectionFailed,
                format!(
                    "Failed to reach MongoDB at '{}' ({}): {}",
                    url_safe,
                    categorize_mongodb_error(&e),
                    e
                ),
            )
        })?;

    tracing::info!("MongoDB connected: url={}, db={}", url_safe, database.name());

    Ok(database)
}

/// Parse the options and create the client handle without contacting the server
async fn build_database(config: &MongoConfig) -> Result<Database> {
    let url_safe = sanitize_url(&config.url);
    tracing::debug!("Creating MongoDB client: {}", url_safe);

    let mut options = ClientOptions::parse(&config.url).await.map_err(|e| {
        DatabaseError::new(
            DatabaseOperation::Connect,
            DatabaseErrorKind::Configuration,
            format!("Invalid MongoDB connection string '{}': {}", url_safe, e),
        )
    })?;

    if let Some(app_name) = &config.app_name {
        options.app_name = Some(app_name.clone());
    }
    options.connect_timeout = Some(config.connect_timeout());
    options.server_selection_timeout = Some(config.connect_timeout());

    let name = database_name(config, options.default_database.as_deref());

    let client = Client::with_options(options)
        .map_err(|e| DatabaseError::from_driver(DatabaseOperation::Connect, &e))?;

    Ok(client.database(&name))
}

/// Pick the database name: explicit config, then the URL's default, then [`DEFAULT_DATABASE`]
fn database_name(config: &MongoConfig, url_default: Option<&str>) -> String {
    config
        .database
        .as_deref()
        .or(url_default)
        .unwrap_or(DEFAULT_DATABASE)
        .to_string()
}

/// Sanitize connection URL for safe logging (remove credentials if present)
pub fn sanitize_url(url: &str) -> String {
    if let Some(scheme_end) = url.find("://") {
        let rest = &url[scheme_end + 3..];
        let authority_end = rest.find('/').unwrap_or(rest.len());
        if let Some(at_pos) = rest[..authority_end].rfind('@') {
            return format!("{}***{}", &url[..scheme_end + 3], &rest[at_pos..]);
        }
    }
    url.to_string()
}

/// Categorize a driver error for better operator guidance
fn categorize_mongodb_error(err: &mongodb::error::Error) -> &'static str {
    match DatabaseError::from_driver(DatabaseOperation::Connect, err).kind {
        DatabaseErrorKind::ConnectionFailed => "network error - check connectivity",
        DatabaseErrorKind::Authentication => "authentication error - check your credentials",
        DatabaseErrorKind::Configuration => "configuration error - check the connection string",
        _ => "connection error",
    }
}
