mod common;

use axum::body::Body;
use axum::http::StatusCode;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use vulnforecast::api::{build_router, create_app_state, AppState};
use vulnforecast::errors::ForecastError;
use vulnforecast::model::Predictor;

fn ready_state() -> AppState {
    AppState::ready(Predictor::from_artifact(common::trained_artifact()).unwrap())
}

fn app(state: &AppState) -> axum::Router {
    build_router(state.clone())
}

fn make_request(method: &str, uri: &str, body: Option<Value>) -> axum::http::Request<Body> {
    let builder = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");

    match body {
        Some(b) => builder.body(Body::from(serde_json::to_string(&b).unwrap())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn response_json(response: axum::http::Response<Body>) -> Value {
    let (parts, body) = response.into_parts();
    let bytes = body.collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        panic!("Empty response body. Status: {}, Headers: {:?}", parts.status, parts.headers);
    }
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("JSON parse error: {}. Body: {:?}", e, String::from_utf8_lossy(&bytes)))
}

#[tokio::test]
async fn test_health_ready() {
    let state = ready_state();
    let response = app(&state).oneshot(make_request("GET", "/api/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["service"], "vulnforecast");
    assert_eq!(body["model"]["transform_version"], "v1");
}

#[tokio::test]
async fn test_health_not_ready() {
    let state = AppState::default();
    let response = app(&state).oneshot(make_request("GET", "/api/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = response_json(response).await;
    assert_eq!(body["status"], "not_ready");
    assert!(body.get("model").is_none());
}

#[tokio::test]
async fn test_startup_without_artifact_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(create_app_state(dir.path()).await, Err(ForecastError::Artifact(_))));
}

#[tokio::test]
async fn test_predict_without_model_is_unavailable() {
    let state = AppState::default();
    let req = make_request("POST", "/api/predict", Some(json!({"base_score": 5.0})));
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_predict_record() {
    let state = ready_state();
    let req = make_request(
        "POST",
        "/api/predict",
        Some(json!({
            "vector_string": "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H",
            "base_score": 9.8,
            "base_severity": "CRITICAL",
            "likelihood_score": 0.9,
            "weakness": "CWE-79"
        })),
    );
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["predicted_class"], 1);
    let p = body["probability"].as_f64().unwrap();
    assert!((0.5..=1.0).contains(&p));
    assert_eq!(body["probability"], body["exploit_probability"]);
}

#[tokio::test]
async fn test_predict_unknown_field_is_422() {
    let state = ready_state();
    let req = make_request("POST", "/api/predict", Some(json!({"base_score": 5.0, "epss_v9": 1})));
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = response_json(response).await;
    assert_eq!(body["error"], "schema_mismatch");
    assert_eq!(body["field"], "epss_v9");
}

#[tokio::test]
async fn test_predict_out_of_range_score_is_422() {
    let state = ready_state();
    let req = make_request("POST", "/api/predict", Some(json!({"base_score": 11, "weakness": "CWE-79"})));
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = response_json(response).await;
    assert_eq!(body["error"], "schema_mismatch");
    assert_eq!(body["field"], "base_score");
}

#[tokio::test]
async fn test_predict_accepts_registry_timestamps() {
    let state = ready_state();
    let req = make_request(
        "POST",
        "/api/predict",
        Some(json!({
            "base_score": 9.8,
            "weakness": "NVD-CWE-noinfo",
            "published": "2021-12-10T10:15:09.143",
            "last_modified": "2024-04-03T00:15:09.297"
        })),
    );
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert!(body["exploit_probability"].is_number());
}

#[tokio::test]
async fn test_predict_wrong_length_vector_is_422() {
    let state = ready_state();
    let req = make_request("POST", "/api/predict", Some(json!({"features": [0.1, 0.2, 0.3]})));
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = response_json(response).await;
    assert_eq!(body["field"], "features");
    assert!(body["detail"].as_str().unwrap().contains("got 3"));
}

#[tokio::test]
async fn test_predict_encoded_vector() {
    let state = ready_state();
    let width = state.predictor.as_ref().unwrap().artifact().transform.width();
    let req = make_request("POST", "/api/predict", Some(json!({"features": vec![0.0; width]})));
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_predict_malformed_json_is_422() {
    let state = ready_state();
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/api/predict")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response_json(response).await["field"], "body");
}

#[tokio::test]
async fn test_batch_predict() {
    let state = ready_state();
    let req = make_request(
        "POST",
        "/api/predict/batch",
        Some(json!({"inputs": [
            {"base_score": 9.8, "likelihood_score": 0.9},
            {"base_score": 2.0, "likelihood_score": 0.01}
        ]})),
    );
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["predictions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_batch_error_names_the_item() {
    let state = ready_state();
    let req = make_request(
        "POST",
        "/api/predict/batch",
        Some(json!({"inputs": [{"base_score": 1.0}, {"base_score": "high"}]})),
    );
    let response = app(&state).oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response_json(response).await["field"], "inputs[1].base_score");
}

#[tokio::test]
async fn test_features_endpoint() {
    let state = ready_state();
    let response = app(&state).oneshot(make_request("GET", "/api/features", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["version"], "v1");
    assert_eq!(body["columns"][0], "base_score");
    assert_eq!(body["width"].as_u64().unwrap() as usize, body["columns"].as_array().unwrap().len());
}
