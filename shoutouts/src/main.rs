use std::sync::Arc;

use shoutouts::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    init_tracing(&config)?;

    let server = Server::new(config.clone());

    if config.mongodb.is_in_memory() {
        tracing::warn!("Using the in-memory store; records are lost on shutdown");
        let app = router(AppState::new(config, MemoryShoutoutStore::new()));
        return server.serve(app).await;
    }

    let provider = if config.mongodb.lazy_init {
        tracing::info!("MongoDB connection deferred until first request");
        MongoProvider::new(config.mongodb.clone())
    } else {
        MongoProvider::connect(config.mongodb.clone()).await?
    };

    let store = MongoShoutoutStore::new(Arc::new(provider));
    let app = router(AppState::new(config, store));

    server.serve(app).await
}
