//! # View Ledger
//!
//! Records public card views and aggregates them into [`ViewStats`].
//!
//! Repeat views from the same `(card, viewer)` pair inside a rolling window
//! collapse into the previously stored view. The window is measured from the
//! last *stored* view, so a client that keeps re-firing cannot suppress
//! counting forever, while distinct visits from one network address still
//! count once they are further apart than the window.

use std::collections::BTreeSet;

use crate::model::{CardView, NewView, RecordedView, ViewStats};
use crate::primitives::{ANONYMOUS_VIEWER, DEFAULT_VIEW_WINDOW_MS, MAX_DEVICE_INFO_LENGTH};
use crate::store::{CardStore, ViewStore};
use crate::{CardError, CardId, Timestamp};

/// True when a view at `now` falls inside the window opened at `last`.
///
/// Views that arrive out of order (`now < last`) are inside the window.
#[must_use]
pub fn within_window(last: Timestamp, now: Timestamp, window_ms: u64) -> bool {
    now.millis_since(last) < window_ms
}

/// Count total, distinct-viewer and same-UTC-day views.
#[must_use]
pub fn aggregate(views: &[CardView], now: Timestamp) -> ViewStats {
    let today = now.utc_day();
    let unique: BTreeSet<&str> = views.iter().map(|v| v.viewer_ip.as_str()).collect();
    ViewStats {
        total_views: views.len() as u64,
        unique_views: unique.len() as u64,
        today_views: views
            .iter()
            .filter(|v| v.created_at.utc_day() == today)
            .count() as u64,
    }
}

fn normalize_viewer(viewer: &str) -> String {
    let viewer = viewer.trim();
    if viewer.is_empty() {
        ANONYMOUS_VIEWER.to_string()
    } else {
        viewer.to_string()
    }
}

fn clamp_device_info(info: Option<&str>) -> Option<String> {
    let info = info.map(str::trim).filter(|i| !i.is_empty())?;
    if info.len() <= MAX_DEVICE_INFO_LENGTH {
        return Some(info.to_string());
    }
    let mut end = MAX_DEVICE_INFO_LENGTH;
    while !info.is_char_boundary(end) {
        end -= 1;
    }
    Some(info[..end].to_string())
}

/// Dedup policy plus the operations that apply it to a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewLedger {
    window_ms: u64,
}

impl Default for ViewLedger {
    fn default() -> Self {
        Self::new(DEFAULT_VIEW_WINDOW_MS)
    }
}

impl ViewLedger {
    /// A ledger with a custom dedup window. Zero disables deduplication.
    #[must_use]
    pub const fn new(window_ms: u64) -> Self {
        Self { window_ms }
    }

    #[must_use]
    pub const fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Record a view of `card_id` at `now`.
    ///
    /// Fails with `CardNotFound` when the card does not exist. An empty viewer
    /// identity is recorded as [`ANONYMOUS_VIEWER`].
    pub fn record<S>(
        &self,
        store: &S,
        card_id: &CardId,
        viewer: &str,
        device_info: Option<&str>,
        now: Timestamp,
    ) -> Result<RecordedView, CardError>
    where
        S: CardStore + ViewStore + ?Sized,
    {
        if !store.card_exists(card_id)? {
            return Err(CardError::CardNotFound(card_id.clone()));
        }
        let view = NewView {
            card_id: card_id.clone(),
            viewer: normalize_viewer(viewer),
            device_info: clamp_device_info(device_info),
            at: now,
        };
        store.append_view(view, self.window_ms)
    }

    /// View counters of `card_id`, with "today" taken as the UTC day of `now`.
    pub fn stats<S>(&self, store: &S, card_id: &CardId, now: Timestamp) -> Result<ViewStats, CardError>
    where
        S: CardStore + ViewStore + ?Sized,
    {
        if !store.card_exists(card_id)? {
            return Err(CardError::CardNotFound(card_id.clone()));
        }
        let views = store.views_for(card_id)?;
        Ok(aggregate(&views, now))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BusinessCard;
    use crate::primitives::MILLIS_PER_DAY;
    use crate::store::MemoryStore;
    use crate::ViewId;

    const T0: u64 = 1_700_000_000_000;

    fn store_with_card() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .put_card(&BusinessCard::new("card1", "u1", "Anan"))
            .expect("put");
        store
    }

    #[test]
    fn repeat_within_window_collapses() {
        let store = store_with_card();
        let ledger = ViewLedger::default();
        let card = CardId::new("card1");

        let first = ledger
            .record(&store, &card, "ip-A", None, Timestamp(T0))
            .expect("first");
        let second = ledger
            .record(&store, &card, "ip-A", None, Timestamp(T0 + 2_000))
            .expect("second");
        assert!(!first.collapsed);
        assert!(second.collapsed);
        assert_eq!(first.view_id, second.view_id);

        let stats = ledger.stats(&store, &card, Timestamp(T0 + 2_000)).expect("stats");
        assert_eq!(stats.total_views, 1);

        let third = ledger
            .record(&store, &card, "ip-A", None, Timestamp(T0 + 12_000))
            .expect("third");
        assert!(!third.collapsed);
        let stats = ledger.stats(&store, &card, Timestamp(T0 + 12_000)).expect("stats");
        assert_eq!(stats.total_views, 2);
        assert_eq!(stats.unique_views, 1);
    }

    #[test]
    fn window_is_anchored_at_stored_view() {
        let store = store_with_card();
        let ledger = ViewLedger::default();
        let card = CardId::new("card1");
        for offset in [0, 4_000, 8_000] {
            ledger
                .record(&store, &card, "ip-A", None, Timestamp(T0 + offset))
                .expect("record");
        }
        // 0 stored, 4s collapsed, 8s is 8s after the stored view.
        assert_eq!(store.views_for(&card).expect("views").len(), 2);
    }

    #[test]
    fn different_viewers_are_not_collapsed() {
        let store = store_with_card();
        let ledger = ViewLedger::default();
        let card = CardId::new("card1");
        ledger.record(&store, &card, "ip-A", None, Timestamp(T0)).expect("a");
        ledger.record(&store, &card, "ip-B", None, Timestamp(T0)).expect("b");
        let stats = ledger.stats(&store, &card, Timestamp(T0)).expect("stats");
        assert_eq!(stats.total_views, 2);
        assert_eq!(stats.unique_views, 2);
    }

    #[test]
    fn zero_window_disables_dedup() {
        let store = store_with_card();
        let ledger = ViewLedger::new(0);
        let card = CardId::new("card1");
        ledger.record(&store, &card, "ip-A", None, Timestamp(T0)).expect("a");
        ledger.record(&store, &card, "ip-A", None, Timestamp(T0)).expect("b");
        assert_eq!(store.views_for(&card).expect("views").len(), 2);
    }

    #[test]
    fn unknown_card_is_not_found() {
        let store = MemoryStore::new();
        let err = ViewLedger::default()
            .record(&store, &CardId::new("nope"), "ip", None, Timestamp(T0))
            .expect_err("missing card");
        assert!(matches!(err, CardError::CardNotFound(_)));
    }

    #[test]
    fn today_uses_utc_day_of_now() {
        let day_start = (T0 / MILLIS_PER_DAY) * MILLIS_PER_DAY;
        let views = vec![
            view(1, "a", day_start - 1),
            view(2, "b", day_start),
            view(3, "a", day_start + MILLIS_PER_DAY - 1),
        ];
        let stats = aggregate(&views, Timestamp(day_start + 10));
        assert_eq!(stats.total_views, 3);
        assert_eq!(stats.unique_views, 2);
        assert_eq!(stats.today_views, 2);
    }

    #[test]
    fn anonymous_and_device_info_normalization() {
        let store = store_with_card();
        let card = CardId::new("card1");
        let long = "x".repeat(MAX_DEVICE_INFO_LENGTH + 10);
        ViewLedger::default()
            .record(&store, &card, "  ", Some(&long), Timestamp(T0))
            .expect("record");
        let views = store.views_for(&card).expect("views");
        assert_eq!(views[0].viewer_ip, ANONYMOUS_VIEWER);
        assert_eq!(
            views[0].device_info.as_ref().map(String::len),
            Some(MAX_DEVICE_INFO_LENGTH)
        );
    }

    fn view(id: u64, viewer: &str, at: u64) -> CardView {
        CardView {
            id: ViewId(id),
            card_id: CardId::new("card1"),
            viewer_ip: viewer.to_string(),
            device_info: None,
            created_at: Timestamp(at),
        }
    }
}
