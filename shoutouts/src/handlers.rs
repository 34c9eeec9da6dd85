//! Handlers of the `/shoutouts` resource and the top-five ranking
//!
//! Each handler parses its inputs, makes one store call and maps the outcome
//! onto a status code. Errors become responses through [`Error`]'s
//! `IntoResponse`.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::{
    error::{Error, Result},
    model::{RecipientCount, Shoutout, ShoutoutId},
    query::{ListParams, ShoutoutFilter},
    responses::{Created, NoContent},
    state::AppState,
    store::{ShoutoutStore, TOP_RECIPIENTS_LIMIT},
};

/// Parse a path segment into an identifier
///
/// A malformed identifier is an internal error, not a 400.
fn parse_id(raw: &str) -> Result<ShoutoutId> {
    raw.parse().map_err(|e: mongodb::bson::oid::Error| Error::InvalidId {
        id: raw.to_string(),
        reason: e.to_string(),
    })
}

fn not_found(id: &ShoutoutId) -> Error {
    Error::NotFound(format!("shoutout {}", id))
}

/// `GET /shoutouts[?to-name=X][&me=Y]`
pub async fn list_shoutouts<S>(
    State(state): State<AppState<S>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Shoutout>>>
where
    S: ShoutoutStore + 'static,
{
    let filter = ShoutoutFilter::from(&params);
    let shoutouts = state.store().find(&filter).await?;
    tracing::debug!(?filter, count = shoutouts.len(), "Listed shoutouts");
    Ok(Json(shoutouts))
}

/// `GET /shoutouts/{id}`
pub async fn get_shoutout<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<Shoutout>>
where
    S: ShoutoutStore + 'static,
{
    let id = parse_id(&id)?;
    state
        .store()
        .find_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

/// `GET /top-five`
///
/// Served with shared-cache directives from `[top_five]`.
pub async fn top_five<S>(State(state): State<AppState<S>>) -> Result<impl IntoResponse>
where
    S: ShoutoutStore + 'static,
{
    let ranking: Vec<RecipientCount> = state
        .store()
        .top_recipients(TOP_RECIPIENTS_LIMIT)
        .await?;
    let cache_control = state.config().top_five.cache_control();
    Ok(([(header::CACHE_CONTROL, cache_control)], Json(ranking)))
}

/// `POST /shoutouts`
pub async fn create_shoutout<S>(
    State(state): State<AppState<S>>,
    Json(body): Json<Shoutout>,
) -> Result<Created<Shoutout>>
where
    S: ShoutoutStore + 'static,
{
    let shoutout = body.without_id();
    let id = state.store().insert(&shoutout).await?;
    tracing::info!(%id, "Created shoutout");

    Ok(Created::new(shoutout.with_id(id)).with_location(format!("/shoutouts/{}", id)))
}

/// `DELETE /shoutouts/{id}`
pub async fn delete_shoutout<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<NoContent>
where
    S: ShoutoutStore + 'static,
{
    let id = parse_id(&id)?;
    if state.store().delete(&id).await? {
        tracing::info!(%id, "Deleted shoutout");
        Ok(NoContent)
    } else {
        Err(not_found(&id))
    }
}

/// `PUT /shoutouts/{id}`
///
/// The path identifier wins over any `_id` in the body.
pub async fn replace_shoutout<S>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Json(body): Json<Shoutout>,
) -> Result<Json<Shoutout>>
where
    S: ShoutoutStore + 'static,
{
    let id = parse_id(&id)?;
    let shoutout = body.without_id();
    if state.store().replace(&id, &shoutout).await? {
        tracing::info!(%id, "Replaced shoutout");
        Ok(Json(shoutout.with_id(id)))
    } else {
        Err(not_found(&id))
    }
}
