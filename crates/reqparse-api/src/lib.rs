//! HTTP front end for reqparse

use axum::{
    body::Bytes,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, warn};

use reqparse::{Format, Payload, PayloadParser};

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ApiResponse {
    Ok { data: serde_json::Value },
    Err { error: String },
}

/// All routes, with a permissive CORS layer
pub fn router() -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/formats", get(formats))
        .route("/api/normalize", post(normalize))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

async fn formats() -> Json<Vec<&'static str>> {
    Json(Format::ALL.iter().map(|format| format.as_str()).collect())
}

async fn normalize(headers: HeaderMap, body: Bytes) -> (StatusCode, Json<ApiResponse>) {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    let mut payload = Payload::from_bytes(&body);
    if let Some(content_type) = content_type {
        payload = payload.with_content_type(content_type);
    }

    let parsed = PayloadParser::default()
        .parse(&payload)
        .map_err(|err| {
            debug!(detail = err.detail().unwrap_or_default(), "payload rejected");
            err.to_string()
        })
        .and_then(|value| serde_json::to_value(&value).map_err(|err| err.to_string()));

    match parsed {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::Ok { data })),
        Err(error) => {
            warn!(%error, "normalize failed");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponse::Err { error }),
            )
        }
    }
}
