//! # API Request/Response Types
//!
//! JSON bodies of the card API. Successful responses carry `success: true`;
//! every failure is an [`ErrorResponse`] with a stable machine-readable code.

use inkcard_core::{
    BusinessCard, CardError, PrintLayout, RecordedView, RenderTree, Template, ViewStats,
};
use serde::{Deserialize, Serialize};

/// Placeholder shown on a public card page when no layout can be rendered.
pub const LAYOUT_UNAVAILABLE: &str = "layout_unavailable";

// =============================================================================
// HEALTH
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Failure body shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub code: String,
    pub error: String,
    /// The same request may succeed later.
    pub retryable: bool,
}

impl ErrorResponse {
    /// A failure without a specific error kind.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            code: "error".to_string(),
            error: error.into(),
            retryable: false,
        }
    }

    /// Quota exhausted; retry after the window refills.
    pub fn rate_limited() -> Self {
        Self {
            code: "rate_limited".to_string(),
            retryable: true,
            ..Self::new("too many requests")
        }
    }
}

impl From<&CardError> for ErrorResponse {
    fn from(e: &CardError) -> Self {
        Self {
            success: false,
            code: error_code(e).to_string(),
            error: e.to_string(),
            retryable: e.is_retryable(),
        }
    }
}

/// Stable code for each error kind.
pub fn error_code(e: &CardError) -> &'static str {
    match e {
        CardError::CardNotFound(_) => "card_not_found",
        CardError::TemplateNotFound(_) => "template_not_found",
        CardError::TemplateMismatch { .. } => "template_mismatch",
        CardError::TemplateMissing(_) => "template_missing",
        CardError::StoreUnavailable(_) => "store_unavailable",
        CardError::SerializationError(_) => "serialization_error",
        CardError::InvalidInput(_) => "invalid_input",
    }
}

// =============================================================================
// CARD RENDERING
// =============================================================================

/// `GET /cards/{id}/render`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResponse {
    pub success: bool,
    pub tree: RenderTree,
}

impl RenderResponse {
    pub fn success(tree: RenderTree) -> Self {
        Self { success: true, tree }
    }
}

/// `GET /cards/{id}/print`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintResponse {
    pub success: bool,
    pub print_safe: bool,
    pub layout: PrintLayout,
}

impl PrintResponse {
    pub fn success(layout: PrintLayout) -> Self {
        Self {
            success: true,
            print_safe: layout.is_print_safe(),
            layout,
        }
    }
}

/// `GET /cards/{id}/share`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareResponse {
    pub success: bool,
    /// Public card URL; clients encode it into the QR code.
    pub url: String,
}

impl ShareResponse {
    pub fn success(url: String) -> Self {
        Self { success: true, url }
    }
}

/// `GET /public/cards/{id}`
///
/// Exactly one of `layout` and `placeholder` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicCardResponse {
    pub success: bool,
    pub card_id: String,
    pub share_url: String,
    pub layout: Option<RenderTree>,
    pub placeholder: Option<String>,
}

impl PublicCardResponse {
    pub fn with_layout(card_id: String, share_url: String, tree: RenderTree) -> Self {
        Self {
            success: true,
            card_id,
            share_url,
            layout: Some(tree),
            placeholder: None,
        }
    }

    pub fn unavailable(card_id: String, share_url: String) -> Self {
        Self {
            success: true,
            card_id,
            share_url,
            layout: None,
            placeholder: Some(LAYOUT_UNAVAILABLE.to_string()),
        }
    }
}

// =============================================================================
// VIEWS
// =============================================================================

/// `POST /cards/{id}/views` body. Missing fields fall back to request headers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewRequest {
    pub viewer: Option<String>,
    pub device_info: Option<String>,
}

/// Outcome of recording a view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewResponse {
    pub success: bool,
    pub view_id: u64,
    /// True when the view repeated one inside the dedup window.
    pub collapsed: bool,
}

impl ViewResponse {
    pub fn success(recorded: RecordedView) -> Self {
        Self {
            success: true,
            view_id: recorded.view_id.0,
            collapsed: recorded.collapsed,
        }
    }
}

/// `GET /cards/{id}/stats`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub success: bool,
    pub total_views: u64,
    pub unique_views: u64,
    pub today_views: u64,
}

impl StatsResponse {
    pub fn success(stats: ViewStats) -> Self {
        Self {
            success: true,
            total_views: stats.total_views,
            unique_views: stats.unique_views,
            today_views: stats.today_views,
        }
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// A stored card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardResponse {
    pub success: bool,
    pub card: BusinessCard,
}

impl CardResponse {
    pub fn success(card: BusinessCard) -> Self {
        Self {
            success: true,
            card,
        }
    }
}

/// `GET /owners/{id}/cards`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardListResponse {
    pub success: bool,
    pub cards: Vec<BusinessCard>,
}

impl CardListResponse {
    pub fn success(cards: Vec<BusinessCard>) -> Self {
        Self {
            success: true,
            cards,
        }
    }
}

/// Outcome of a delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted: bool,
}

/// A stored template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateResponse {
    pub success: bool,
    pub template: Template,
}

/// One row of `GET /templates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
    pub element_count: usize,
}

impl From<&Template> for TemplateSummary {
    fn from(t: &Template) -> Self {
        Self {
            id: t.id.to_string(),
            name: t.name.clone(),
            element_count: t.elements.len(),
        }
    }
}

/// `GET /templates`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateListResponse {
    pub success: bool,
    pub templates: Vec<TemplateSummary>,
}
