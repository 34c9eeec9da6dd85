//! Route table

use axum::{routing::get, Router};

use crate::{
    handlers::{
        create_shoutout, delete_shoutout, get_shoutout, list_shoutouts, replace_shoutout,
        top_five,
    },
    health::{health, readiness},
    state::AppState,
    store::ShoutoutStore,
};

/// Build the application router
///
/// Middleware is added by [`crate::server::Server`], so this router can be
/// driven directly in tests.
pub fn router<S>(state: AppState<S>) -> Router
where
    S: ShoutoutStore + 'static,
{
    Router::new()
        .route(
            "/shoutouts",
            get(list_shoutouts::<S>).post(create_shoutout::<S>),
        )
        .route(
            "/shoutouts/{id}",
            get(get_shoutout::<S>)
                .put(replace_shoutout::<S>)
                .delete(delete_shoutout::<S>),
        )
        .route("/top-five", get(top_five::<S>))
        .route("/health", get(health::<S>))
        .route("/ready", get(readiness::<S>))
        .with_state(state)
}
