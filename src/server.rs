//! HTTP endpoint: `POST /` with a receipt image, JSON out.
//!
//! A thin axum shim over [`crate::extract_receipt`]. The image arrives
//! either as the raw request body or as a `multipart/form-data` upload
//! with an `image` field; clients authenticate with `X-API-Key` or
//! `Authorization: Bearer`.
//!
//! Status mapping:
//! - 401 — missing or wrong API key
//! - 400 — no image bytes in the request
//! - 502 — the upstream Gemini call failed (status and detail are logged,
//!   the client sees a generic processing error)
//! - 200 — everything else, including the `{raw_text, error}` diagnostic
//!   body for unparseable model output

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::extract::extract_receipt;
use crate::pipeline::gemini::GeminiClient;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Largest accepted upload. Phone photos of receipts run 2–5 MB.
const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Shared state: one Gemini client and one config for every request.
/// Requests are otherwise independent; nothing here is mutated.
pub struct ServerState {
    pub client: GeminiClient,
    pub config: ExtractionConfig,
    /// Inbound API key clients must present. `None` disables auth.
    pub api_key: Option<String>,
}

/// Build the application router.
pub fn router(state: Arc<ServerState>) -> Router {
    if state.api_key.is_none() {
        warn!("No inbound API key configured — endpoint is unauthenticated");
    }
    Router::new()
        .route("/", post(handle_extract))
        .route("/health", get(|| async { "OK" }))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES))
        .with_state(state)
}

/// Bind and serve until the task is cancelled.
pub async fn serve(addr: SocketAddr, state: Arc<ServerState>) -> std::io::Result<()> {
    let app = router(state);
    let listener = TcpListener::bind(addr).await?;
    info!("receipt2json listening on {}", addr);
    axum::serve(listener, app).await
}

async fn handle_extract(
    State(state): State<Arc<ServerState>>,
    request: Request,
) -> Response {
    if let Some(expected) = state.api_key.as_deref() {
        if !authorized(request.headers(), expected) {
            return error_response(StatusCode::UNAUTHORIZED, "Unauthorized");
        }
    }

    let image = match read_image(request).await {
        Ok(bytes) => bytes,
        Err(response) => return response,
    };

    if image.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No image provided");
    }

    match extract_receipt(&state.client, &image, &state.config).await {
        Ok(result) => Json(result).into_response(),
        Err(ExtractError::EmptyImage) => {
            error_response(StatusCode::BAD_REQUEST, "No image provided")
        }
        Err(e) => {
            error!("Extraction failed: {}", e);
            error_response(StatusCode::BAD_GATEWAY, "Failed to process receipt image")
        }
    }
}

/// Accept `X-API-Key: <key>` or `Authorization: Bearer <key>`.
fn authorized(headers: &HeaderMap, expected: &str) -> bool {
    if let Some(key) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        return key == expected;
    }
    if let Some(auth) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            return token == expected;
        }
    }
    false
}

/// Pull the image bytes out of the request: the `image` field of a
/// multipart form, or the raw body for everything else.
async fn read_image(request: Request) -> Result<Bytes, Response> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if is_multipart {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| error_response(StatusCode::BAD_REQUEST, &e.to_string()))?;

        loop {
            let field = multipart
                .next_field()
                .await
                .map_err(|e| error_response(StatusCode::BAD_REQUEST, &e.to_string()))?;
            let Some(field) = field else {
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    "No image field in multipart form",
                ));
            };

            // The documented field is "image"; accept any file upload so
            // clients that name the field differently still work.
            let matches = field.name() == Some("image") || field.file_name().is_some();
            if matches {
                return field
                    .bytes()
                    .await
                    .map_err(|e| error_response(StatusCode::BAD_REQUEST, &e.to_string()));
            }
        }
    } else {
        Bytes::from_request(request, &())
            .await
            .map_err(|e| error_response(StatusCode::BAD_REQUEST, &e.to_string()))
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use tower::ServiceExt;

    fn test_router(api_key: Option<&str>) -> Router {
        let state = Arc::new(ServerState {
            // Unroutable port: these tests must never reach the network.
            client: GeminiClient::new("unused").with_base_url("http://127.0.0.1:1"),
            config: ExtractionConfig::default(),
            api_key: api_key.map(String::from),
        });
        router(state)
    }

    fn post_root() -> axum::http::request::Builder {
        axum::http::Request::builder().method("POST").uri("/")
    }

    #[tokio::test]
    async fn health_is_open() {
        let response = test_router(Some("secret"))
            .oneshot(
                axum::http::Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_key_is_unauthorized() {
        let response = test_router(Some("secret"))
            .oneshot(post_root().body(Body::from("bytes")).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_key_is_unauthorized() {
        let response = test_router(Some("secret"))
            .oneshot(
                post_root()
                    .header("x-api-key", "nope")
                    .body(Body::from("bytes"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bearer_token_accepted() {
        // Auth passes, then the empty body is rejected with 400.
        let response = test_router(Some("secret"))
            .oneshot(
                post_root()
                    .header("authorization", "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_multipart_surfaces_parse_error() {
        use http_body_util::BodyExt;

        // Valid boundary in the header, garbage in the body: the stream
        // error must reach the client, not the missing-field message.
        let response = test_router(None)
            .oneshot(
                post_root()
                    .header("content-type", "multipart/form-data; boundary=XYZ")
                    .body(Body::from("this is not a multipart body"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let message = json["error"].as_str().unwrap();
        assert_ne!(message, "No image field in multipart form");
        assert!(!message.is_empty());
    }

    #[tokio::test]
    async fn empty_body_is_bad_request() {
        let response = test_router(None)
            .oneshot(post_root().body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upstream_failure_maps_to_bad_gateway() {
        // Unroutable Gemini endpoint: the network error surfaces as 502.
        let response = test_router(None)
            .oneshot(post_root().body(Body::from("fake image bytes")).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
