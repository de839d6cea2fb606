//! In-memory store adapter.
//!
//! Every operation takes the lock once, so a dedup check and its append are
//! atomic. A poisoned lock surfaces as `StoreUnavailable`.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{CardStore, TemplateStore, ViewStore, patched};
use crate::ledger::within_window;
use crate::model::{BusinessCard, CardPatch, CardView, NewView, RecordedView, Template};
use crate::{CardError, CardId, OwnerId, TemplateId, Timestamp, ViewId};

#[derive(Debug, Default)]
struct Tables {
    templates: BTreeMap<TemplateId, Template>,
    cards: BTreeMap<CardId, BusinessCard>,
    views: BTreeMap<CardId, Vec<CardView>>,
    /// (card, viewer) -> last stored view and its time.
    last_seen: BTreeMap<(CardId, String), (ViewId, Timestamp)>,
    next_view_id: u64,
}

/// Store adapter backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, CardError> {
        self.tables
            .read()
            .map_err(|_| CardError::StoreUnavailable("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, CardError> {
        self.tables
            .write()
            .map_err(|_| CardError::StoreUnavailable("memory store lock poisoned".to_string()))
    }
}

impl TemplateStore for MemoryStore {
    fn get_template(&self, id: &TemplateId) -> Result<Template, CardError> {
        self.read()?
            .templates
            .get(id)
            .cloned()
            .ok_or_else(|| CardError::TemplateNotFound(id.clone()))
    }

    fn put_template(&self, template: &Template) -> Result<(), CardError> {
        template.validate()?;
        self.write()?
            .templates
            .insert(template.id.clone(), template.clone());
        Ok(())
    }

    fn list_templates(&self) -> Result<Vec<Template>, CardError> {
        Ok(self.read()?.templates.values().cloned().collect())
    }

    fn delete_template(&self, id: &TemplateId) -> Result<bool, CardError> {
        Ok(self.write()?.templates.remove(id).is_some())
    }
}

impl CardStore for MemoryStore {
    fn get_card(&self, id: &CardId) -> Result<BusinessCard, CardError> {
        self.read()?
            .cards
            .get(id)
            .cloned()
            .ok_or_else(|| CardError::CardNotFound(id.clone()))
    }

    fn put_card(&self, card: &BusinessCard) -> Result<(), CardError> {
        card.validate()?;
        self.write()?.cards.insert(card.id.clone(), card.clone());
        Ok(())
    }

    fn update_card(
        &self,
        id: &CardId,
        patch: &CardPatch,
        now: Timestamp,
    ) -> Result<BusinessCard, CardError> {
        let mut tables = self.write()?;
        let current = tables
            .cards
            .get(id)
            .cloned()
            .ok_or_else(|| CardError::CardNotFound(id.clone()))?;
        let updated = patched(current, patch, now)?;
        tables.cards.insert(id.clone(), updated.clone());
        Ok(updated)
    }

    fn delete_card(&self, id: &CardId) -> Result<bool, CardError> {
        let mut tables = self.write()?;
        let existed = tables.cards.remove(id).is_some();
        tables.views.remove(id);
        tables.last_seen.retain(|(card, _), _| card != id);
        Ok(existed)
    }

    fn list_cards_by_owner(&self, owner: &OwnerId) -> Result<Vec<BusinessCard>, CardError> {
        Ok(self
            .read()?
            .cards
            .values()
            .filter(|c| &c.owner_id == owner)
            .cloned()
            .collect())
    }
}

impl ViewStore for MemoryStore {
    fn append_view(&self, view: NewView, window_ms: u64) -> Result<RecordedView, CardError> {
        let mut tables = self.write()?;
        let key = (view.card_id.clone(), view.viewer.clone());

        if let Some(&(last_id, last_at)) = tables.last_seen.get(&key) {
            if within_window(last_at, view.at, window_ms) {
                return Ok(RecordedView {
                    view_id: last_id,
                    collapsed: true,
                });
            }
        }

        let id = ViewId(tables.next_view_id);
        tables.next_view_id = tables.next_view_id.saturating_add(1);
        let at = view.at;
        tables
            .views
            .entry(view.card_id.clone())
            .or_default()
            .push(view.into_view(id));
        tables.last_seen.insert(key, (id, at));

        Ok(RecordedView {
            view_id: id,
            collapsed: false,
        })
    }

    fn views_for(&self, card: &CardId) -> Result<Vec<CardView>, CardError> {
        Ok(self.read()?.views.get(card).cloned().unwrap_or_default())
    }

    fn delete_views_for(&self, card: &CardId) -> Result<u64, CardError> {
        let mut tables = self.write()?;
        tables.last_seen.retain(|(c, _), _| c != card);
        Ok(tables.views.remove(card).map_or(0, |v| v.len() as u64))
    }
}
