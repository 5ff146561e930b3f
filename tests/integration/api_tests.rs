//! API integration tests for upload, email, status and heartbeat.
//!
//! Tests verify:
//! - Stored bytes match the uploaded bytes, and re-uploads overwrite
//! - Non-image payloads are rejected before any write
//! - Emailing a missing picture returns 404 without calling the mail API
//! - Status counts pictures and reports the bucket URL
//! - Downstream failures surface as opaque 500s

use axum::http::StatusCode;
use base64::Engine;
use tower::ServiceExt;

use picture_mailer::error::{MailError, StoreError};
use picture_mailer::mail::PICTURE_EMAIL_SUBJECT;
use picture_mailer::{RouterConfig, StatusResponse};

use super::test_utils::{
    body_bytes, body_text, create_test_jpeg, create_test_png, email_body, get, json_post,
    raw_post, router_with_config, test_router, upload_body, MemoryStore, RecordingMailer,
    TEST_API_KEY, TEST_SENDER,
};

const KEY: Option<&str> = Some(TEST_API_KEY);

// =============================================================================
// Heartbeat
// =============================================================================

#[tokio::test]
async fn test_heartbeat_ok() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let router = test_router(&store, &mailer);

    let response = router.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_heartbeat_ignores_store_failure() {
    let store = MemoryStore::new();
    store
        .fail_with(StoreError::Connection("unreachable".to_string()))
        .await;
    let mailer = RecordingMailer::new();
    mailer
        .fail_with(MailError::Request("unreachable".to_string()))
        .await;
    let router = test_router(&store, &mailer);

    let response = router.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
}

// =============================================================================
// Upload
// =============================================================================

#[tokio::test]
async fn test_upload_stores_identical_bytes() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let router = test_router(&store, &mailer);
    let jpeg = create_test_jpeg(16, 16);

    let response = router
        .oneshot(json_post("/upload", &upload_body("a.jpg", &jpeg), KEY))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_text(response).await, "Picture uploaded successfully");

    let stored = store.object("a.jpg").await.expect("picture should be stored");
    assert_eq!(stored.data.as_ref(), jpeg.as_slice());
    assert_eq!(stored.content_type, "image/jpeg");
}

#[tokio::test]
async fn test_upload_png_records_sniffed_type() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let router = test_router(&store, &mailer);
    let png = create_test_png(8, 8);

    let response = router
        .oneshot(json_post("/upload", &upload_body("logo.png", &png), KEY))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let stored = store.object("logo.png").await.unwrap();
    assert_eq!(stored.content_type, "image/png");
}

#[tokio::test]
async fn test_upload_same_name_overwrites() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let first = create_test_jpeg(8, 8);
    let second = create_test_jpeg(32, 32);
    assert_ne!(first, second);

    let response = test_router(&store, &mailer)
        .oneshot(json_post("/upload", &upload_body("a.jpg", &first), KEY))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = test_router(&store, &mailer)
        .oneshot(json_post("/upload", &upload_body("a.jpg", &second), KEY))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    assert_eq!(store.len().await, 1);
    let stored = store.object("a.jpg").await.unwrap();
    assert_eq!(stored.data.as_ref(), second.as_slice());
}

#[tokio::test]
async fn test_upload_name_used_verbatim() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let router = test_router(&store, &mailer);
    let jpeg = create_test_jpeg(8, 8);

    let response = router
        .oneshot(json_post(
            "/upload",
            &upload_body("booth/2025/Visitor 01.JPG", &jpeg),
            KEY,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(store.object("booth/2025/Visitor 01.JPG").await.is_some());
}

#[tokio::test]
async fn test_upload_non_image_rejected_without_write() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let router = test_router(&store, &mailer);

    let response = router
        .oneshot(json_post(
            "/upload",
            &upload_body("notes.jpg", b"just some plain text"),
            KEY,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_text(response).await;
    assert!(body.contains("Invalid file type"), "body was: {}", body);
    assert!(body.contains("application/octet-stream"));

    assert_eq!(store.put_count(), 0);
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_upload_invalid_base64_is_bad_request() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let router = test_router(&store, &mailer);

    let body = serde_json::json!({ "name": "a.jpg", "image": "not base64 !!!" });
    let response = router
        .oneshot(json_post("/upload", &body, KEY))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_upload_empty_name_is_bad_request() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let router = test_router(&store, &mailer);
    let jpeg = create_test_jpeg(8, 8);

    let response = router
        .oneshot(json_post("/upload", &upload_body("", &jpeg), KEY))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_upload_malformed_json_is_bad_request() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();

    let response = test_router(&store, &mailer)
        .oneshot(raw_post("/upload", "{not json", KEY))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Missing field
    let response = test_router(&store, &mailer)
        .oneshot(json_post(
            "/upload",
            &serde_json::json!({ "name": "a.jpg" }),
            KEY,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Wrong type
    let response = test_router(&store, &mailer)
        .oneshot(json_post(
            "/upload",
            &serde_json::json!({ "name": 7, "image": "AAAA" }),
            KEY,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(store.call_count(), 0);
}

/// A valid JPEG header followed by `extra` bytes of filler.
fn padded_jpeg(extra: usize) -> Vec<u8> {
    let mut data = create_test_jpeg(8, 8);
    data.extend((0..extra).map(|i| (i % 251) as u8));
    data
}

#[tokio::test]
async fn test_upload_multi_megabyte_picture() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let router = test_router(&store, &mailer);

    // ~6 MiB raw, ~8 MiB once base64-encoded
    let picture = padded_jpeg(6 * 1024 * 1024);

    let response = router
        .oneshot(json_post("/upload", &upload_body("big.jpg", &picture), KEY))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let stored = store.object("big.jpg").await.unwrap();
    assert_eq!(stored.data.len(), picture.len());
    assert_eq!(stored.data.as_ref(), picture.as_slice());
}

#[tokio::test]
async fn test_upload_over_limit_is_payload_too_large() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let config = RouterConfig::new(TEST_API_KEY).with_max_upload_bytes(64 * 1024);
    let router = router_with_config(&store, &mailer, config);

    let picture = padded_jpeg(128 * 1024);

    let response = router
        .oneshot(json_post("/upload", &upload_body("big.jpg", &picture), KEY))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(store.put_count(), 0);
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_upload_line_wrapped_base64() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let router = test_router(&store, &mailer);
    let jpeg = create_test_jpeg(16, 16);

    let encoded = base64::engine::general_purpose::STANDARD.encode(&jpeg);
    let wrapped = encoded
        .as_bytes()
        .chunks(76)
        .map(|line| std::str::from_utf8(line).unwrap())
        .collect::<Vec<_>>()
        .join("\n");
    assert!(wrapped.lines().count() > 1);

    let body = serde_json::json!({ "name": "wrapped.jpg", "image": format!("{}\n", wrapped) });
    let response = router
        .oneshot(json_post("/upload", &body, KEY))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let stored = store.object("wrapped.jpg").await.unwrap();
    assert_eq!(stored.data.as_ref(), jpeg.as_slice());
}

#[tokio::test]
async fn test_upload_store_failure_is_opaque_500() {
    let store = MemoryStore::new();
    store
        .fail_with(StoreError::S3("AccessDenied for bucket secret-internal".to_string()))
        .await;
    let mailer = RecordingMailer::new();
    let router = test_router(&store, &mailer);
    let jpeg = create_test_jpeg(8, 8);

    let response = router
        .oneshot(json_post("/upload", &upload_body("a.jpg", &jpeg), KEY))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_text(response).await;
    assert_eq!(body, "Error uploading picture");
    assert!(!body.contains("secret-internal"));
}

// =============================================================================
// Email
// =============================================================================

#[tokio::test]
async fn test_upload_then_email_sends_attachment() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let jpeg = create_test_jpeg(16, 16);

    let response = test_router(&store, &mailer)
        .oneshot(json_post("/upload", &upload_body("a.jpg", &jpeg), KEY))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = test_router(&store, &mailer)
        .oneshot(json_post(
            "/email",
            &email_body("test@example.com", "a.jpg"),
            KEY,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Email sent successfully");

    assert_eq!(mailer.call_count(), 1);
    let sent = mailer.sent().await;
    let email = &sent[0];
    assert_eq!(email.from, TEST_SENDER);
    assert_eq!(email.to, "test@example.com");
    assert_eq!(email.subject, PICTURE_EMAIL_SUBJECT);
    assert!(email.html.contains("trygcp.dev/dvxx-be-25"));

    assert_eq!(email.attachments.len(), 1);
    let attachment = &email.attachments[0];
    assert_eq!(attachment.filename, "a.jpg");
    assert_eq!(attachment.mime_type, "image/jpeg");

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(&attachment.content)
        .unwrap();
    assert_eq!(decoded, jpeg);
}

#[tokio::test]
async fn test_email_missing_picture_is_not_found() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let router = test_router(&store, &mailer);

    let response = router
        .oneshot(json_post(
            "/email",
            &email_body("test@example.com", "missing.jpg"),
            KEY,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "Picture not found");
    assert_eq!(mailer.call_count(), 0);
}

#[tokio::test]
async fn test_email_picture_vanishing_after_check_is_not_found() {
    let store = MemoryStore::new();
    store.add_phantom("ghost.jpg").await;
    let mailer = RecordingMailer::new();
    let router = test_router(&store, &mailer);

    let response = router
        .oneshot(json_post(
            "/email",
            &email_body("test@example.com", "ghost.jpg"),
            KEY,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(mailer.call_count(), 0);
}

#[tokio::test]
async fn test_email_picture_not_uploaded_through_service() {
    // Objects placed in the bucket by other means can still be emailed
    let jpeg = create_test_jpeg(8, 8);
    let store = MemoryStore::new().with_picture("external.jpg", jpeg).await;
    let mailer = RecordingMailer::new();
    let router = test_router(&store, &mailer);

    let response = router
        .oneshot(json_post(
            "/email",
            &email_body("test@example.com", "external.jpg"),
            KEY,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(mailer.call_count(), 1);
}

#[tokio::test]
async fn test_email_mail_failure_is_opaque_500() {
    let jpeg = create_test_jpeg(8, 8);
    let store = MemoryStore::new().with_picture("a.jpg", jpeg).await;
    let mailer = RecordingMailer::new();
    mailer
        .fail_with(MailError::Rejected {
            status: 401,
            body: "The provided authorization grant is invalid".to_string(),
        })
        .await;
    let router = test_router(&store, &mailer);

    let response = router
        .oneshot(json_post(
            "/email",
            &email_body("test@example.com", "a.jpg"),
            KEY,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "Error sending email");
    // Single attempt, no retry
    assert_eq!(mailer.call_count(), 1);
}

#[tokio::test]
async fn test_email_store_failure_is_500_without_send() {
    let store = MemoryStore::new();
    store.fail_with(StoreError::S3("timeout".to_string())).await;
    let mailer = RecordingMailer::new();
    let router = test_router(&store, &mailer);

    let response = router
        .oneshot(json_post(
            "/email",
            &email_body("test@example.com", "a.jpg"),
            KEY,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(mailer.call_count(), 0);
}

#[tokio::test]
async fn test_email_malformed_body_is_bad_request() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let router = test_router(&store, &mailer);

    let response = router
        .oneshot(json_post(
            "/email",
            &serde_json::json!({ "email": "test@example.com" }),
            KEY,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.call_count(), 0);
    assert_eq!(mailer.call_count(), 0);
}

// =============================================================================
// Status
// =============================================================================

#[tokio::test]
async fn test_status_empty_store() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let router = test_router(&store, &mailer);

    let response = router.oneshot(get("/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let status: StatusResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(
        status,
        StatusResponse {
            bucket_url: "https://console.cloud.google.com/storage/browser/booth-pictures"
                .to_string(),
            num_pictures: 0,
        }
    );
}

#[tokio::test]
async fn test_status_counts_distinct_uploads() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let jpeg = create_test_jpeg(8, 8);

    for name in ["a.jpg", "b.jpg", "c.jpg"] {
        let response = test_router(&store, &mailer)
            .oneshot(json_post("/upload", &upload_body(name, &jpeg), KEY))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    // Overwriting an existing name does not add a picture
    let response = test_router(&store, &mailer)
        .oneshot(json_post("/upload", &upload_body("a.jpg", &jpeg), KEY))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = test_router(&store, &mailer)
        .oneshot(get("/status"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["num_pictures"], 3);
}

#[tokio::test]
async fn test_status_needs_no_api_key() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let router = test_router(&store, &mailer);

    let response = router.oneshot(get("/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_status_store_failure_is_500() {
    let store = MemoryStore::new();
    store.fail_with(StoreError::S3("boom".to_string())).await;
    let mailer = RecordingMailer::new();
    let router = test_router(&store, &mailer);

    let response = router.oneshot(get("/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "Error getting status");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let store = MemoryStore::new();
    let mailer = RecordingMailer::new();
    let router = test_router(&store, &mailer);

    let response = router.oneshot(get("/pictures")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
