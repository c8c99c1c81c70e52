//! Discovery and search routes.

use crate::error::ApiError;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use uim_catalog::{CatalogStore, FilterQuery, SearchEngine, SearchPage};
use uim_core::{Intent, Service};

/// Shortest free-text term accepted by the search endpoints.
const MIN_TEXT_LEN: usize = 3;

/// Shared state for the discovery handlers.
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub search: SearchEngine,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/intents/search", get(search_intents))
        .route("/api/intents/{intent_uid}", get(get_intent))
        .route("/api/search", get(natural_search))
        .route("/api/services", get(list_services))
        .route("/api/services/{name}", get(get_service).delete(delete_service))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct FilterParams {
    pub intent_name: Option<String>,
    pub uid: Option<String>,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct NaturalParams {
    pub query: Option<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

fn check_min_len(field: &str, value: Option<&str>) -> Result<(), ApiError> {
    match value {
        Some(v) if v.trim().chars().count() < MIN_TEXT_LEN => Err(ApiError::BadRequest(format!(
            "{field} must be at least {MIN_TEXT_LEN} characters"
        ))),
        _ => Ok(()),
    }
}

fn found(page: SearchPage) -> Result<Json<Vec<Intent>>, ApiError> {
    if page.is_not_found() {
        return Err(ApiError::NotFound("No intents found.".into()));
    }
    Ok(Json(page.items))
}

async fn search_intents(
    State(state): State<Arc<AppState>>,
    Query(params): Query<FilterParams>,
) -> Result<Json<Vec<Intent>>, ApiError> {
    check_min_len("intent_name", params.intent_name.as_deref())?;
    check_min_len("description", params.description.as_deref())?;

    let page = state.search.page(params.skip, params.limit)?;
    let query = FilterQuery::from_params(
        params.intent_name,
        params.uid,
        params.description,
        params.tags.as_deref(),
    );
    found(state.search.filter(&query, page).await?)
}

async fn natural_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NaturalParams>,
) -> Result<Json<Vec<Intent>>, ApiError> {
    let query = params
        .query
        .ok_or_else(|| ApiError::BadRequest("query is required".into()))?;
    check_min_len("query", Some(&query))?;

    let page = state.search.page(params.skip, params.limit)?;
    found(state.search.natural(&query, page).await?)
}

async fn get_intent(
    State(state): State<Arc<AppState>>,
    Path(intent_uid): Path<String>,
) -> Result<Json<Intent>, ApiError> {
    state
        .store
        .find_intent_by_uid(&intent_uid)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("intent {intent_uid} not found")))
}

async fn list_services(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Service>>, ApiError> {
    Ok(Json(state.store.list_services().await?))
}

async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let service = state
        .store
        .find_service_by_name(&name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("service {name} not found")))?;
    let intents = state.store.intents_for_service(service.id).await?;
    Ok(Json(json!({ "service": service, "intents": intents })))
}

async fn delete_service(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.store.delete_service(&name).await? {
        tracing::info!(service = %name, "service deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("service {name} not found")))
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
