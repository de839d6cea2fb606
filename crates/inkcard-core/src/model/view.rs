//! Card view events and their aggregates.

use serde::{Deserialize, Serialize};

use crate::{CardId, Timestamp, ViewId};

/// One recorded public view of a card. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub id: ViewId,
    pub card_id: CardId,
    /// Viewer identity (network address or opaque visitor id).
    pub viewer_ip: String,
    pub device_info: Option<String>,
    pub created_at: Timestamp,
}

/// A view about to be recorded; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewView {
    pub card_id: CardId,
    pub viewer: String,
    pub device_info: Option<String>,
    pub at: Timestamp,
}

impl NewView {
    /// Materialize into a stored view with the assigned id.
    #[must_use]
    pub fn into_view(self, id: ViewId) -> CardView {
        CardView {
            id,
            card_id: self.card_id,
            viewer_ip: self.viewer,
            device_info: self.device_info,
            created_at: self.at,
        }
    }
}

/// Outcome of recording a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedView {
    pub view_id: ViewId,
    /// True when the view fell inside the dedup window and nothing was stored.
    pub collapsed: bool,
}

/// View counters of a card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewStats {
    pub total_views: u64,
    pub unique_views: u64,
    pub today_views: u64,
}
