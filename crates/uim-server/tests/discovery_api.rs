//! Discovery API over an in-memory catalog.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use uim_catalog::{CatalogStore, Ingestor, SearchEngine, SqliteCatalog};
use uim_core::{CatalogConfig, Manifest};
use uim_server::{AppState, create_router};

fn manifest(service: &str, intents: &[(&str, &str, &[&str])]) -> Manifest {
    let intents: Vec<Value> = intents
        .iter()
        .map(|(name, description, tags)| {
            json!({
                "intent_uid": format!("{service}:{name}:v1"),
                "intent_name": name,
                "description": description,
                "tags": tags,
            })
        })
        .collect();
    serde_json::from_value(json!({
        "service-info": {"name": service, "service_url": format!("https://{service}")},
        "intents": intents,
    }))
    .unwrap()
}

async fn app() -> Router {
    let store: Arc<dyn CatalogStore> = Arc::new(SqliteCatalog::in_memory().await.unwrap());
    let ingestor = Ingestor::new(store.clone());
    ingestor
        .ingest(&manifest(
            "fakerealestate.com",
            &[
                ("SearchProperty", "Searches properties based on location and price.", &["x"]),
                ("GetPropertyDetails", "Fetches detailed information for a property.", &["y"]),
            ],
        ))
        .await
        .unwrap();
    ingestor
        .ingest(&manifest(
            "weather.example",
            &[("Forecast", "Returns the weather forecast for a city.", &["z"])],
        ))
        .await
        .unwrap();

    let config = CatalogConfig::default();
    let search = SearchEngine::new(store.clone(), &config);
    create_router(Arc::new(AppState { store, search }))
}

async fn call(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn names(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_tag_filter_is_any_match() {
    let app = app().await;
    let (status, body) = call(&app, "GET", "/api/intents/search?tags=x,y").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["SearchProperty", "GetPropertyDetails"]);
}

#[tokio::test]
async fn test_filter_by_name_and_paging() {
    let app = app().await;
    let (status, body) = call(&app, "GET", "/api/intents/search?intent_name=property").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) =
        call(&app, "GET", "/api/intents/search?intent_name=property&skip=1&limit=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["GetPropertyDetails"]);

    let (status, body) = call(&app, "GET", "/api/intents/search?intent_name=property&skip=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_no_match_is_not_found() {
    let app = app().await;
    let (status, body) = call(&app, "GET", "/api/intents/search?tags=nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "No intents found.");

    let (status, _) = call(&app, "GET", "/api/search?query=submarine%20rentals").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_paging_is_bad_request() {
    let app = app().await;
    let (status, _) = call(&app, "GET", "/api/intents/search?skip=-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, "GET", "/api/search?query=weather&limit=-5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, "GET", "/api/intents/search?tags=x&limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, "GET", "/api/search?query=ab").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_natural_language_phrase() {
    let app = app().await;
    let (status, body) = call(&app, "GET", "/api/search?query=weather%20forecast").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Forecast"]);
}

#[tokio::test]
async fn test_service_lookup_and_delete() {
    let app = app().await;
    let (status, body) = call(&app, "GET", "/api/services").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = call(&app, "GET", "/api/services/weather.example").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["intents"].as_array().unwrap().len(), 1);

    let (status, body) = call(&app, "GET", "/api/intents/weather.example:Forecast:v1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tags"], json!(["z"]));

    let (status, _) = call(&app, "DELETE", "/api/services/weather.example").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, "GET", "/api/intents/weather.example:Forecast:v1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, "DELETE", "/api/services/weather.example").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
