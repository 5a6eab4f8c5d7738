//! Integration tests for the extraction pipeline and the HTTP endpoint,
//! driven against a mocked Gemini API (httpmock).

use httpmock::prelude::*;
use receipt2json::{
    extract_receipt, ExtractionConfig, ExtractionResult, GeminiClient, ReceiptRecord,
};
use serde_json::json;

const FAKE_IMAGE: &[u8] = b"\xFF\xD8\xFF\xE0 fake jpeg bytes";

fn gemini_path(model: &str) -> String {
    format!("/v1beta/models/{model}:generateContent")
}

/// A Gemini reply whose single part is `text`.
fn text_reply(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }] }
        }]
    })
}

fn client_for(server: &MockServer) -> GeminiClient {
    GeminiClient::new("test-key").with_base_url(server.base_url())
}

// ── Pipeline ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn text_reply_is_normalized_in_strict_mode() {
    let server = MockServer::start();
    let config = ExtractionConfig::default();

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(gemini_path(&config.model))
            .query_param("key", "test-key");
        then.status(200).json_body(text_reply(
            r#"{"merchant": "ACME", "date": "2025-01-01", "subtotal": "$10.00",
                "tax": 0.8, "items": [{"description": "Soda", "unit_price": "2.50",
                "quantity": "3"}]}"#,
        ));
    });

    let result = extract_receipt(&client_for(&server), FAKE_IMAGE, &config)
        .await
        .unwrap();
    mock.assert();

    let ExtractionResult::Receipt(record) = result else {
        panic!("expected a normalized record, got {result:?}");
    };
    assert_eq!(record.merchant_name, "ACME");
    assert_eq!(record.datetime, "2025-01-01");
    assert_eq!(record.sub_total, 10.0);
    assert_eq!(record.vat, 0.8);
    assert_eq!(record.service_charge, 0.0);
    assert_eq!(record.total, 0.0);
    assert_eq!(record.items.len(), 1);
    assert_eq!(record.items[0].name, "Soda");
    assert_eq!(record.items[0].price, 2.5);
    assert_eq!(record.items[0].count, 3);
}

#[tokio::test]
async fn fenced_reply_parses() {
    let server = MockServer::start();
    let config = ExtractionConfig::default();

    server.mock(|when, then| {
        when.method(POST).path(gemini_path(&config.model));
        then.status(200)
            .json_body(text_reply("```json\n{\"total\": 5}\n```"));
    });

    let result = extract_receipt(&client_for(&server), FAKE_IMAGE, &config)
        .await
        .unwrap();

    let ExtractionResult::Receipt(record) = result else {
        panic!("expected a record");
    };
    assert_eq!(record.total, 5.0);
    assert_eq!(record.merchant_name, "");
}

#[tokio::test]
async fn function_call_reply_bypasses_text_parsing() {
    let server = MockServer::start();
    let config = ExtractionConfig::default();

    server.mock(|when, then| {
        when.method(POST).path(gemini_path(&config.model));
        then.status(200).json_body(json!({
            "candidates": [{
                "content": { "parts": [{
                    "functionCall": {
                        "name": "extract_receipt_data",
                        "args": {
                            "merchant_name": "Diner",
                            "datetime": "2025-02-02 12:00",
                            "items": [],
                            "sub_total": 12.0,
                            "vat": 1.2,
                            "service_charge": 0,
                            "total": 13.2
                        }
                    }
                }] }
            }]
        }));
    });

    let result = extract_receipt(&client_for(&server), FAKE_IMAGE, &config)
        .await
        .unwrap();

    let ExtractionResult::Receipt(record) = result else {
        panic!("expected a record");
    };
    assert_eq!(record.merchant_name, "Diner");
    assert_eq!(record.total, 13.2);
}

#[tokio::test]
async fn unparseable_reply_degrades_to_diagnostic_object() {
    let server = MockServer::start();
    let config = ExtractionConfig::default();

    server.mock(|when, then| {
        when.method(POST).path(gemini_path(&config.model));
        then.status(200).json_body(text_reply("not json at all"));
    });

    let result = extract_receipt(&client_for(&server), FAKE_IMAGE, &config)
        .await
        .unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["raw_text"], "not json at all");
    assert_eq!(json["error"], "Failed to parse JSON from Gemini response");
}

#[tokio::test]
async fn strict_mode_off_passes_payload_through() {
    let server = MockServer::start();
    let config = ExtractionConfig::builder()
        .strict_schema(false)
        .build()
        .unwrap();

    server.mock(|when, then| {
        when.method(POST).path(gemini_path(&config.model));
        then.status(200)
            .json_body(text_reply(r#"{"anything": ["goes", 1], "tax": "weird"}"#));
    });

    let result = extract_receipt(&client_for(&server), FAKE_IMAGE, &config)
        .await
        .unwrap();

    let ExtractionResult::Raw(payload) = result else {
        panic!("expected raw pass-through, got {result:?}");
    };
    assert_eq!(payload["anything"][0], "goes");
    assert_eq!(payload["tax"], "weird");
}

#[tokio::test]
async fn upstream_failure_propagates_status_and_body() {
    let server = MockServer::start();
    let config = ExtractionConfig::default();

    let mock = server.mock(|when, then| {
        when.method(POST).path(gemini_path(&config.model));
        then.status(429).body("quota exceeded");
    });

    let err = extract_receipt(&client_for(&server), FAKE_IMAGE, &config)
        .await
        .unwrap_err();

    // Exactly one call: upstream failures are never retried.
    mock.assert_hits(1);
    match err {
        receipt2json::ExtractError::Upstream { status, body } => {
            assert_eq!(status, 429);
            assert_eq!(body, "quota exceeded");
        }
        other => panic!("expected Upstream, got {other}"),
    }
}

#[tokio::test]
async fn strict_request_carries_forced_tool_declaration() {
    let server = MockServer::start();
    let config = ExtractionConfig::default();

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(gemini_path(&config.model))
            .json_body_partial(
                r#"{
                    "generationConfig": {"topP": 0.1, "topK": 16},
                    "toolConfig": {"functionCallingConfig": {
                        "mode": "ANY",
                        "allowedFunctionNames": ["extract_receipt_data"]
                    }}
                }"#,
            );
        then.status(200).json_body(text_reply("{}"));
    });

    let result = extract_receipt(&client_for(&server), FAKE_IMAGE, &config)
        .await
        .unwrap();
    mock.assert();

    // An empty payload still normalizes to the all-defaults record.
    assert_eq!(result, ExtractionResult::Receipt(ReceiptRecord::default()));
}

// ── HTTP endpoint ────────────────────────────────────────────────────────

#[cfg(feature = "server")]
mod endpoint {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use receipt2json::server::{router, ServerState};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn raw_body_upload_returns_normalized_record() {
        let server = MockServer::start();
        let config = ExtractionConfig::default();

        server.mock(|when, then| {
            when.method(POST).path(gemini_path(&config.model));
            then.status(200)
                .json_body(text_reply(r#"{"merchantName": "Corner Cafe", "total": "€7.50"}"#));
        });

        let app = router(Arc::new(ServerState {
            client: client_for(&server),
            config,
            api_key: Some("secret".into()),
        }));

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/")
                    .header("x-api-key", "secret")
                    .header("content-type", "image/jpeg")
                    .body(Body::from(FAKE_IMAGE))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["merchant_name"], "Corner Cafe");
        assert_eq!(json["total"], 7.5);
        assert_eq!(json["items"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn endpoint_returns_diagnostic_body_with_200() {
        let server = MockServer::start();
        let config = ExtractionConfig::default();

        server.mock(|when, then| {
            when.method(POST).path(gemini_path(&config.model));
            then.status(200).json_body(text_reply("sorry, I can't read this"));
        });

        let app = router(Arc::new(ServerState {
            client: client_for(&server),
            config,
            api_key: None,
        }));

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/")
                    .body(Body::from(FAKE_IMAGE))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Failed to parse JSON from Gemini response");
        assert_eq!(json["raw_text"], "sorry, I can't read this");
    }
}
