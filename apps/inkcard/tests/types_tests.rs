//! Unit tests for API types and error mapping.

#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::{HeaderMap, HeaderValue, StatusCode};
use std::net::SocketAddr;
use inkcard::api::{
    ErrorResponse, HealthResponse, LAYOUT_UNAVAILABLE, PublicCardResponse, StatsResponse,
    TemplateSummary, ViewRequest, ViewResponse, error_code, status_for, viewer_from_headers,
    viewer_identity,
};
use inkcard_core::{
    CardError, CardId, Element, Geometry, RecordedView, Template, TemplateId, ViewId, ViewStats,
};

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

// =============================================================================
// ERROR MAPPING TESTS
// =============================================================================

#[test]
fn test_status_codes() {
    let card = CardId::new("c");
    let template = TemplateId::new("t");
    let cases = [
        (CardError::CardNotFound(card.clone()), StatusCode::NOT_FOUND),
        (
            CardError::TemplateNotFound(template.clone()),
            StatusCode::NOT_FOUND,
        ),
        (
            CardError::TemplateMismatch {
                card: card.clone(),
                expected: template.clone(),
                actual: TemplateId::new("u"),
            },
            StatusCode::CONFLICT,
        ),
        (CardError::TemplateMissing(card), StatusCode::CONFLICT),
        (
            CardError::StoreUnavailable("timeout".into()),
            StatusCode::SERVICE_UNAVAILABLE,
        ),
        (
            CardError::InvalidInput("bad".into()),
            StatusCode::BAD_REQUEST,
        ),
        (
            CardError::SerializationError("corrupt".into()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];
    for (error, status) in cases {
        assert_eq!(status_for(&error), status, "{error}");
    }
}

#[test]
fn test_error_response_carries_code_and_message() {
    let error = CardError::CardNotFound(CardId::new("ghost"));
    let body = ErrorResponse::from(&error);

    assert!(!body.success);
    assert_eq!(body.code, error_code(&error));
    assert_eq!(body.code, "card_not_found");
    assert!(body.error.contains("ghost"));

    assert!(!body.retryable);

    let json = serde_json::to_string(&body).unwrap();
    assert!(json.contains("\"success\":false"));
}

#[test]
fn test_store_failures_are_retryable() {
    let body = ErrorResponse::from(&CardError::StoreUnavailable("timeout".into()));
    assert_eq!(body.code, "store_unavailable");
    assert!(body.retryable);

    let body = ErrorResponse::from(&CardError::InvalidInput("bad".into()));
    assert!(!body.retryable);
}

// =============================================================================
// VIEW TYPES
// =============================================================================

#[test]
fn test_view_request_fields_are_optional() {
    let request: ViewRequest = serde_json::from_str("{}").unwrap();
    assert!(request.viewer.is_none());
    assert!(request.device_info.is_none());

    let request: ViewRequest =
        serde_json::from_str(r#"{"viewer":"v1","device_info":"curl/8"}"#).unwrap();
    assert_eq!(request.viewer.as_deref(), Some("v1"));
    assert_eq!(request.device_info.as_deref(), Some("curl/8"));
}

#[test]
fn test_view_response_from_recorded_view() {
    let response = ViewResponse::success(RecordedView {
        view_id: ViewId(7),
        collapsed: true,
    });
    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"view_id\":7"));
    assert!(json.contains("\"collapsed\":true"));
}

#[test]
fn test_stats_response_fields() {
    let response = StatsResponse::success(ViewStats {
        total_views: 10,
        unique_views: 4,
        today_views: 2,
    });
    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"total_views\":10"));
    assert!(json.contains("\"unique_views\":4"));
    assert!(json.contains("\"today_views\":2"));
}

// =============================================================================
// PUBLIC PAGE TYPES
// =============================================================================

#[test]
fn test_public_placeholder() {
    let response = PublicCardResponse::unavailable(
        "c1".to_string(),
        "https://cards.example.com/card/c1".to_string(),
    );
    assert!(response.layout.is_none());
    assert_eq!(response.placeholder.as_deref(), Some(LAYOUT_UNAVAILABLE));

    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"placeholder\":\"layout_unavailable\""));
    assert!(json.contains("\"layout\":null"));
}

#[test]
fn test_template_summary() {
    let mut template = Template::new("classic");
    template.name = "Classic".to_string();
    template.elements = vec![
        Element::text("a", Geometry::new(0.0, 0.0, 10.0, 5.0)),
        Element::text("b", Geometry::new(0.0, 5.0, 10.0, 5.0)),
    ];

    let summary = TemplateSummary::from(&template);
    assert_eq!(summary.id, "classic");
    assert_eq!(summary.name, "Classic");
    assert_eq!(summary.element_count, 2);
}

// =============================================================================
// VIEWER IDENTITY
// =============================================================================

#[test]
fn test_viewer_prefers_first_forwarded_hop() {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
    );
    headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
    assert_eq!(viewer_from_headers(&headers), "203.0.113.7");
}

#[test]
fn test_viewer_falls_back_to_real_ip_then_empty() {
    let mut headers = HeaderMap::new();
    assert_eq!(viewer_from_headers(&headers), "");

    headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
    assert_eq!(viewer_from_headers(&headers), "198.51.100.2");
}

#[test]
fn test_viewer_identity_falls_back_to_peer() {
    let peer = SocketAddr::from(([192, 0, 2, 10], 51_234));
    let mut headers = HeaderMap::new();
    assert_eq!(viewer_identity(&headers, Some(peer)), "192.0.2.10");
    assert_eq!(viewer_identity(&headers, None), "");

    headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7"));
    assert_eq!(viewer_identity(&headers, Some(peer)), "203.0.113.7");
}
