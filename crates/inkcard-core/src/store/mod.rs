//! # Store Adapters
//!
//! The engine never owns persistence. Cards, templates and views live in an
//! external record store reached through these traits.
//!
//! All methods are synchronous and take `&self`, so one store can serve many
//! concurrent requests. Async callers run them on a blocking pool.
//!
//! Two reference adapters ship with the crate:
//! - [`MemoryStore`]: in-process maps behind a lock (tests, demos)
//! - [`RedbStore`]: redb tables with postcard-encoded rows

use crate::model::{BusinessCard, CardPatch, CardView, NewView, RecordedView, Template};
use crate::{CardError, CardId, OwnerId, TemplateId, Timestamp};

pub mod memory;
pub mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

/// Template lookup and authoring.
pub trait TemplateStore: Send + Sync {
    /// Fetch a template. `TemplateNotFound` if absent.
    fn get_template(&self, id: &TemplateId) -> Result<Template, CardError>;

    /// Insert or replace a template.
    fn put_template(&self, template: &Template) -> Result<(), CardError>;

    /// All templates, ordered by id.
    fn list_templates(&self) -> Result<Vec<Template>, CardError>;

    /// Remove a template. Returns false if it did not exist.
    ///
    /// Cards bound to it keep their weak reference and resolve to
    /// `TemplateNotFound` afterwards.
    fn delete_template(&self, id: &TemplateId) -> Result<bool, CardError>;
}

/// Card records.
pub trait CardStore: Send + Sync {
    /// Fetch a card. `CardNotFound` if absent.
    fn get_card(&self, id: &CardId) -> Result<BusinessCard, CardError>;

    /// Insert or replace a card.
    fn put_card(&self, card: &BusinessCard) -> Result<(), CardError>;

    /// Apply a partial update atomically and return the updated card.
    fn update_card(
        &self,
        id: &CardId,
        patch: &CardPatch,
        now: Timestamp,
    ) -> Result<BusinessCard, CardError>;

    /// Hard-delete a card and cascade its views. Returns false if absent.
    fn delete_card(&self, id: &CardId) -> Result<bool, CardError>;

    /// Cards of one owner, ordered by id.
    fn list_cards_by_owner(&self, owner: &OwnerId) -> Result<Vec<BusinessCard>, CardError>;

    /// True if the card exists.
    fn card_exists(&self, id: &CardId) -> Result<bool, CardError> {
        match self.get_card(id) {
            Ok(_) => Ok(true),
            Err(CardError::CardNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Append-only view log.
pub trait ViewStore: Send + Sync {
    /// Append a view unless the same `(card, viewer)` pair was stored less
    /// than `window_ms` ago, in which case the earlier view id is returned
    /// with `collapsed = true`.
    ///
    /// The check and the append happen in one critical section, so
    /// concurrent duplicates cannot both be stored.
    fn append_view(&self, view: NewView, window_ms: u64) -> Result<RecordedView, CardError>;

    /// Every stored view of a card, oldest first.
    fn views_for(&self, card: &CardId) -> Result<Vec<CardView>, CardError>;

    /// Drop every view of a card. Returns the number removed.
    fn delete_views_for(&self, card: &CardId) -> Result<u64, CardError>;
}

/// A store implementing all three adapters.
pub trait CardBackend: TemplateStore + CardStore + ViewStore {}

impl<T: TemplateStore + CardStore + ViewStore> CardBackend for T {}

/// Shared check for `update_card` implementations.
pub(crate) fn patched(
    mut card: BusinessCard,
    patch: &CardPatch,
    now: Timestamp,
) -> Result<BusinessCard, CardError> {
    patch.apply(&mut card, now);
    card.validate()?;
    Ok(card)
}
