use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::{SortKey, Venue},
    services::{
        acquire_venue_from_search, recommendations, venues, Selection, SyncPolicy, SyncReport,
    },
};

use super::extract::{ApiJson, ApiQuery};
use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub sortby: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddVisitsRequest {
    pub visits: Vec<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RenameRequest {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SyncQuery {
    #[serde(default)]
    pub failfast: bool,
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    #[serde(default = "default_true")]
    pub new: bool,
    #[serde(default = "default_true")]
    pub old: bool,
    #[serde(default)]
    pub weighted: bool,
}

fn default_true() -> bool {
    true
}

impl From<NextQuery> for Selection {
    fn from(query: NextQuery) -> Self {
        Selection {
            include_new: query.new,
            include_old: query.old,
            weighted: query.weighted,
        }
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// List all venues, sorted by `sortby` (name, name-desc, rating, rating-desc)
pub async fn list_venues(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> AppResult<Json<Vec<Venue>>> {
    let mut venues = state.store.list_all().await?;
    SortKey::from_param(query.sortby.as_deref()).sort(&mut venues);
    Ok(Json(venues))
}

pub async fn get_venue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Venue>> {
    Ok(Json(state.store.load(&id).await?))
}

pub async fn create_venue(
    State(state): State<AppState>,
    ApiJson(venue): ApiJson<Venue>,
) -> AppResult<(StatusCode, Json<Venue>)> {
    let venue = venues::create_venue(&state.store, venue).await?;
    Ok((StatusCode::CREATED, Json(venue)))
}

/// Overwrite a venue; its id never changes, use rename for that
pub async fn update_venue(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(venue): ApiJson<Venue>,
) -> AppResult<Json<Venue>> {
    Ok(Json(venues::update_venue(&state.store, &id, venue).await?))
}

pub async fn delete_venue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    venues::delete_venue(&state.store, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_visits(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<AddVisitsRequest>,
) -> AppResult<Json<Venue>> {
    Ok(Json(
        venues::add_visits(&state.store, &id, request.visits).await?,
    ))
}

pub async fn rename_venue(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<RenameRequest>,
) -> AppResult<Json<Venue>> {
    let venue = venues::rename_venue(&state.store, &id, request.name, request.address).await?;
    Ok(Json(venue))
}

/// Look a venue up by free text; `save=true` also persists it
pub async fn get_from_places(
    State(state): State<AppState>,
    Path(query): Path<String>,
    ApiQuery(params): ApiQuery<SearchQuery>,
) -> AppResult<Json<Venue>> {
    let venue = acquire_venue_from_search(state.lookup.as_ref(), &query)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No place matches {:?}", query)))?;

    if params.save {
        let _guard = state.store.lock(&venue.id).await;
        state.store.save(&venue).await?;
        tracing::info!(venue_id = %venue.id, "Looked up venue saved");
    }

    Ok(Json(venue))
}

/// Refresh every looked-up venue from the place lookup service
pub async fn sync_venues(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SyncQuery>,
) -> AppResult<Json<SyncReport>> {
    let policy = if params.failfast {
        SyncPolicy::FailFast
    } else {
        SyncPolicy::ContinueOnError
    };
    Ok(Json(state.enrichment().run(policy).await?))
}

pub async fn not_visited_venue(State(state): State<AppState>) -> AppResult<Json<Venue>> {
    let venue = recommendations::next_venue(
        &state.store,
        &state.selector,
        &*state.rng,
        Selection::unvisited(),
    )
    .await?;
    Ok(Json(venue))
}

/// Pick a venue; `new`/`old` choose the pool, `weighted` applies the scoring
pub async fn next_venue(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<NextQuery>,
) -> AppResult<Json<Venue>> {
    let venue =
        recommendations::next_venue(&state.store, &state.selector, &*state.rng, query.into())
            .await?;
    Ok(Json(venue))
}
