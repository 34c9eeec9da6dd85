//! # shoutouts
//!
//! REST service for shoutouts: short messages of recognition from one person
//! (`from`) to another (`to`), stored in a MongoDB collection.
//!
//! ## Endpoints
//!
//! - `GET /shoutouts[?to-name=X][&me=Y]` lists records, optionally filtered
//! - `GET /shoutouts/{id}` fetches one record
//! - `GET /top-five` ranks recipients by shoutouts received
//! - `POST /shoutouts` creates a record
//! - `PUT /shoutouts/{id}` replaces a record
//! - `DELETE /shoutouts/{id}` removes a record
//! - `GET /health` and `GET /ready` are liveness and readiness probes
//!
//! ## Example
//!
//! ```rust,no_run
//! use shoutouts::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let store = MemoryShoutoutStore::new();
//!     let app = router(AppState::new(config.clone(), store));
//!
//!     Server::new(config).serve(app).await
//! }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod health;
pub mod ids;
pub mod middleware;
pub mod model;
pub mod observability;
pub mod query;
pub mod responses;
pub mod router;
pub mod server;
pub mod state;
pub mod store;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};

/// Common imports for running the service
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::database::MongoProvider;
    pub use crate::error::{Error, Result};
    pub use crate::model::{RecipientCount, Shoutout, ShoutoutId};
    pub use crate::observability::init_tracing;
    pub use crate::router::router;
    pub use crate::server::Server;
    pub use crate::state::AppState;
    pub use crate::store::{MemoryShoutoutStore, MongoShoutoutStore, ShoutoutStore};
}
