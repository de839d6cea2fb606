//! # API Endpoint Handlers
//!
//! Thin adapters from HTTP to the [`Distribution`](crate::distribution::Distribution)
//! facade. Every engine error maps to one status code and an
//! [`ErrorResponse`] body.

use super::{
    AppState,
    types::{
        CardListResponse, CardResponse, DeleteResponse, ErrorResponse, HealthResponse,
        PrintResponse, PublicCardResponse, RenderResponse, ShareResponse, StatsResponse,
        TemplateListResponse, TemplateResponse, TemplateSummary, ViewRequest, ViewResponse,
    },
};
use axum::{
    Json,
    extract::{ConnectInfo, FromRequestParts, Path, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use inkcard_core::{
    BusinessCard, CardError, CardId, CardPatch, OwnerId, Template, TemplateId, share_url,
};
use std::convert::Infallible;
use std::net::SocketAddr;

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// `Retry-After` sent with store failures.
const STORE_RETRY_AFTER_SECS: &str = "1";

/// HTTP status for an engine error.
pub fn status_for(e: &CardError) -> StatusCode {
    match e {
        CardError::CardNotFound(_) | CardError::TemplateNotFound(_) => StatusCode::NOT_FOUND,
        CardError::TemplateMismatch { .. } | CardError::TemplateMissing(_) => {
            StatusCode::CONFLICT
        }
        CardError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        CardError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        CardError::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(e: &CardError) -> Response {
    let status = status_for(e);
    if status.is_server_error() {
        tracing::error!(error = %e, "Request failed");
    } else {
        tracing::debug!(error = %e, "Request rejected");
    }
    let body = Json(ErrorResponse::from(e));
    if e.is_retryable() {
        (status, [(header::RETRY_AFTER, STORE_RETRY_AFTER_SECS)], body).into_response()
    } else {
        (status, body).into_response()
    }
}

fn respond<T: serde::Serialize>(result: Result<T, CardError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => failure(&e),
    }
}

// =============================================================================
// VIEWER IDENTITY
// =============================================================================

/// Viewer identity from proxy headers: first `X-Forwarded-For` hop, then
/// `X-Real-IP`. Empty when neither is present.
pub fn viewer_from_headers(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    forwarded.or_else(real_ip).unwrap_or_default().to_string()
}

/// Viewer identity: proxy headers first, then the peer address.
pub fn viewer_identity(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let viewer = viewer_from_headers(headers);
    match peer {
        Some(addr) if viewer.is_empty() => addr.ip().to_string(),
        _ => viewer,
    }
}

/// Peer socket address, when the server was started with connect info.
#[derive(Debug, Clone, Copy)]
pub struct PeerAddr(pub Option<SocketAddr>);

impl<S: Send + Sync> FromRequestParts<S> for PeerAddr {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let peer = ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|ConnectInfo(addr)| addr);
        Ok(Self(peer))
    }
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

// =============================================================================
// HEALTH
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// CARD OUTPUTS
// =============================================================================

/// Render tree of a card.
pub async fn render_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let result = state.distribution.resolve_card(&CardId::new(id)).await;
    respond(result.map(RenderResponse::success))
}

/// Print-ready layout of a card.
pub async fn print_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let result = state.distribution.export_paper_card(&CardId::new(id)).await;
    respond(result.map(PrintResponse::success))
}

/// vCard download.
pub async fn vcard_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.distribution.export_contact(&CardId::new(id)).await {
        Ok(payload) => {
            let disposition = format!("attachment; filename=\"{}\"", payload.file_name);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, payload.mime_type),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                payload.text,
            )
                .into_response()
        }
        Err(e) => failure(&e),
    }
}

/// Public share URL of a card.
pub async fn share_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let result = state.distribution.share_url(&CardId::new(id)).await;
    respond(result.map(ShareResponse::success))
}

/// Public card page data. Records a view, then renders.
///
/// A card whose layout cannot be produced still gets a page with the
/// `layout_unavailable` placeholder. Only a missing card is a 404.
pub async fn public_card_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    PeerAddr(peer): PeerAddr,
    headers: HeaderMap,
) -> Response {
    let card_id = CardId::new(id);
    let viewer = viewer_identity(&headers, peer);
    let device = user_agent(&headers);

    match state
        .distribution
        .record_view(&card_id, &viewer, device.as_deref())
        .await
    {
        Ok(_) => {}
        Err(e) if e.is_not_found() => return failure(&e),
        // Counting is best effort; the page still renders.
        Err(e) => tracing::warn!(card = %card_id, error = %e, "View not recorded"),
    }

    let url = share_url(state.distribution.site_base(), &card_id);
    match state.distribution.resolve_card(&card_id).await {
        Ok(tree) => respond(Ok(PublicCardResponse::with_layout(
            card_id.to_string(),
            url,
            tree,
        ))),
        Err(e) if e.is_layout_failure() => {
            tracing::info!(card = %card_id, reason = %e, "Serving placeholder layout");
            respond(Ok(PublicCardResponse::unavailable(card_id.to_string(), url)))
        }
        Err(e) => failure(&e),
    }
}

// =============================================================================
// VIEWS
// =============================================================================

/// Record a view. Body fields override the connection and user-agent.
pub async fn record_view_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    PeerAddr(peer): PeerAddr,
    headers: HeaderMap,
    body: Option<Json<ViewRequest>>,
) -> Response {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let viewer = request
        .viewer
        .unwrap_or_else(|| viewer_identity(&headers, peer));
    let device = request.device_info.or_else(|| user_agent(&headers));

    let result = state
        .distribution
        .record_view(&CardId::new(id), &viewer, device.as_deref())
        .await;
    respond(result.map(ViewResponse::success))
}

/// View counters of a card.
pub async fn stats_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let result = state.distribution.get_stats(&CardId::new(id)).await;
    respond(result.map(StatsResponse::success))
}

// =============================================================================
// CARD RECORDS
// =============================================================================

/// Fetch a card.
pub async fn get_card_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let result = state.distribution.get_card(&CardId::new(id)).await;
    respond(result.map(CardResponse::success))
}

/// Create or replace a card. The body id may be omitted; if present it must
/// match the path.
pub async fn put_card_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut card): Json<BusinessCard>,
) -> Response {
    if card.id.as_str().is_empty() {
        card.id = CardId::new(id);
    } else if card.id.as_str() != id {
        return failure(&CardError::InvalidInput(format!(
            "body id {} does not match path id {}",
            card.id, id
        )));
    }
    let result = state.distribution.put_card(card).await;
    respond(result.map(CardResponse::success))
}

/// Cards of one owner.
pub async fn owner_cards_handler(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Response {
    let result = state.distribution.list_cards(&OwnerId::new(owner)).await;
    respond(result.map(CardListResponse::success))
}

/// Partially update a card.
pub async fn patch_card_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<CardPatch>,
) -> Response {
    let result = state
        .distribution
        .update_card(&CardId::new(id), patch)
        .await;
    respond(result.map(CardResponse::success))
}

/// Delete a card and its views.
pub async fn delete_card_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let card_id = CardId::new(id);
    match state.distribution.delete_card(&card_id).await {
        Ok(true) => respond(Ok(DeleteResponse {
            success: true,
            deleted: true,
        })),
        Ok(false) => failure(&CardError::CardNotFound(card_id)),
        Err(e) => failure(&e),
    }
}

// =============================================================================
// TEMPLATES
// =============================================================================

/// Create or replace a template.
pub async fn put_template_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut template): Json<Template>,
) -> Response {
    if template.id.as_str().is_empty() {
        template.id = TemplateId::new(id);
    } else if template.id.as_str() != id {
        return failure(&CardError::InvalidInput(format!(
            "body id {} does not match path id {}",
            template.id, id
        )));
    }
    let result = state.distribution.put_template(template).await;
    respond(result.map(|template| TemplateResponse {
        success: true,
        template,
    }))
}

/// Delete a template. Cards bound to it fall back to the placeholder page.
pub async fn delete_template_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let template_id = TemplateId::new(id);
    match state.distribution.delete_template(&template_id).await {
        Ok(true) => respond(Ok(DeleteResponse {
            success: true,
            deleted: true,
        })),
        Ok(false) => failure(&CardError::TemplateNotFound(template_id)),
        Err(e) => failure(&e),
    }
}

/// List templates.
pub async fn list_templates_handler(State(state): State<AppState>) -> Response {
    let result = state.distribution.list_templates().await;
    respond(result.map(|templates| TemplateListResponse {
        success: true,
        templates: templates.iter().map(TemplateSummary::from).collect(),
    }))
}
