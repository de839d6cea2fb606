//! # redb-backed Store
//!
//! A disk-backed implementation of all three store adapters using the redb
//! embedded database. Rows are postcard-encoded.
//!
//! redb gives us:
//! - ACID write transactions (a dedup check and its append commit together)
//! - MVCC readers, so `views_for` never blocks a writer
//! - crash safety without a custom WAL
//!
//! Views are keyed by `(card_key, view_id)` where `card_key` is a dense
//! integer assigned to each card on first insert, so the views of one card
//! are a single contiguous range.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::Path;

use super::{CardStore, TemplateStore, ViewStore, patched};
use crate::ledger::within_window;
use crate::model::{BusinessCard, CardPatch, CardView, NewView, RecordedView, Template};
use crate::{CardError, CardId, OwnerId, TemplateId, Timestamp, ViewId};

/// Table for templates: template id -> postcard Template
const TEMPLATES: TableDefinition<&str, &[u8]> = TableDefinition::new("templates");

/// Table for cards: card id -> postcard BusinessCard
const CARDS: TableDefinition<&str, &[u8]> = TableDefinition::new("cards");

/// Table for card keys: card id -> dense u64 key used by the view tables
const CARD_KEYS: TableDefinition<&str, u64> = TableDefinition::new("card_keys");

/// Table for views: (card_key, view_id) -> postcard CardView
const VIEWS: TableDefinition<(u64, u64), &[u8]> = TableDefinition::new("views");

/// Table for dedup state: (card_key, viewer) -> (view_id, created_at millis)
const LAST_SEEN: TableDefinition<(u64, &str), (u64, u64)> = TableDefinition::new("last_seen");

/// Table for counters: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NEXT_VIEW_ID: &str = "next_view_id";
const NEXT_CARD_KEY: &str = "next_card_key";

fn io_err(e: impl fmt::Display) -> CardError {
    CardError::StoreUnavailable(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CardError> {
    postcard::to_allocvec(value).map_err(|e| CardError::SerializationError(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CardError> {
    postcard::from_bytes(bytes).map_err(|e| CardError::SerializationError(e.to_string()))
}

/// A disk-backed store using redb.
pub struct RedbStore {
    db: Database,
}

impl fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CardError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(TEMPLATES).map_err(io_err)?;
            let _ = write_txn.open_table(CARDS).map_err(io_err)?;
            let _ = write_txn.open_table(CARD_KEYS).map_err(io_err)?;
            let _ = write_txn.open_table(VIEWS).map_err(io_err)?;
            let _ = write_txn.open_table(LAST_SEEN).map_err(io_err)?;
            let _ = write_txn.open_table(METADATA).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        Ok(Self { db })
    }

    /// Take the next value of a counter and advance it.
    fn bump(txn: &WriteTransaction, key: &str) -> Result<u64, CardError> {
        let mut meta = txn.open_table(METADATA).map_err(io_err)?;
        let current = meta
            .get(key)
            .map_err(io_err)?
            .map(|v| v.value())
            .unwrap_or(0);
        meta.insert(key, current.saturating_add(1)).map_err(io_err)?;
        Ok(current)
    }

    fn card_key(txn: &WriteTransaction, id: &CardId) -> Result<Option<u64>, CardError> {
        let keys = txn.open_table(CARD_KEYS).map_err(io_err)?;
        let key = keys.get(id.as_str()).map_err(io_err)?.map(|v| v.value());
        Ok(key)
    }

    /// Remove every view and dedup row of one card inside `txn`.
    fn purge_views(txn: &WriteTransaction, card_key: u64) -> Result<u64, CardError> {
        let mut views = txn.open_table(VIEWS).map_err(io_err)?;
        let mut view_ids = Vec::new();
        for entry in views
            .range((card_key, 0)..=(card_key, u64::MAX))
            .map_err(io_err)?
        {
            let (key, _) = entry.map_err(io_err)?;
            view_ids.push(key.value().1);
        }
        for view_id in &view_ids {
            views.remove((card_key, *view_id)).map_err(io_err)?;
        }

        let mut last_seen = txn.open_table(LAST_SEEN).map_err(io_err)?;
        let mut viewers = Vec::new();
        for entry in last_seen
            .range((card_key, "")..(card_key.saturating_add(1), ""))
            .map_err(io_err)?
        {
            let (key, _) = entry.map_err(io_err)?;
            viewers.push(key.value().1.to_string());
        }
        for viewer in &viewers {
            last_seen
                .remove((card_key, viewer.as_str()))
                .map_err(io_err)?;
        }

        Ok(view_ids.len() as u64)
    }
}

// =============================================================================
// TEMPLATES
// =============================================================================

impl TemplateStore for RedbStore {
    fn get_template(&self, id: &TemplateId) -> Result<Template, CardError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(TEMPLATES).map_err(io_err)?;
        match table.get(id.as_str()).map_err(io_err)? {
            Some(data) => decode(data.value()),
            None => Err(CardError::TemplateNotFound(id.clone())),
        }
    }

    fn put_template(&self, template: &Template) -> Result<(), CardError> {
        template.validate()?;
        let bytes = encode(template)?;
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(TEMPLATES).map_err(io_err)?;
            table
                .insert(template.id.as_str(), bytes.as_slice())
                .map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn list_templates(&self) -> Result<Vec<Template>, CardError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(TEMPLATES).map_err(io_err)?;
        let mut templates = Vec::new();
        for entry in table.iter().map_err(io_err)? {
            let (_, data) = entry.map_err(io_err)?;
            templates.push(decode(data.value())?);
        }
        Ok(templates)
    }

    fn delete_template(&self, id: &TemplateId) -> Result<bool, CardError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let existed = {
            let mut table = write_txn.open_table(TEMPLATES).map_err(io_err)?;
            let removed = table.remove(id.as_str()).map_err(io_err)?;
            removed.is_some()
        };
        write_txn.commit().map_err(io_err)?;
        Ok(existed)
    }
}

// =============================================================================
// CARDS
// =============================================================================

impl CardStore for RedbStore {
    fn get_card(&self, id: &CardId) -> Result<BusinessCard, CardError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(CARDS).map_err(io_err)?;
        match table.get(id.as_str()).map_err(io_err)? {
            Some(data) => decode(data.value()),
            None => Err(CardError::CardNotFound(id.clone())),
        }
    }

    fn put_card(&self, card: &BusinessCard) -> Result<(), CardError> {
        card.validate()?;
        let bytes = encode(card)?;
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(CARDS).map_err(io_err)?;
            table
                .insert(card.id.as_str(), bytes.as_slice())
                .map_err(io_err)?;
        }
        if Self::card_key(&write_txn, &card.id)?.is_none() {
            let key = Self::bump(&write_txn, NEXT_CARD_KEY)?;
            let mut keys = write_txn.open_table(CARD_KEYS).map_err(io_err)?;
            keys.insert(card.id.as_str(), key).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn update_card(
        &self,
        id: &CardId,
        patch: &CardPatch,
        now: Timestamp,
    ) -> Result<BusinessCard, CardError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let updated = {
            let mut table = write_txn.open_table(CARDS).map_err(io_err)?;
            let current: BusinessCard = match table.get(id.as_str()).map_err(io_err)? {
                Some(data) => decode(data.value())?,
                None => return Err(CardError::CardNotFound(id.clone())),
            };
            let updated = patched(current, patch, now)?;
            let bytes = encode(&updated)?;
            table.insert(id.as_str(), bytes.as_slice()).map_err(io_err)?;
            updated
        };
        write_txn.commit().map_err(io_err)?;
        Ok(updated)
    }

    fn delete_card(&self, id: &CardId) -> Result<bool, CardError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let existed = {
            let mut table = write_txn.open_table(CARDS).map_err(io_err)?;
            let removed = table.remove(id.as_str()).map_err(io_err)?;
            removed.is_some()
        };
        if let Some(card_key) = Self::card_key(&write_txn, id)? {
            Self::purge_views(&write_txn, card_key)?;
            let mut keys = write_txn.open_table(CARD_KEYS).map_err(io_err)?;
            keys.remove(id.as_str()).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(existed)
    }

    fn list_cards_by_owner(&self, owner: &OwnerId) -> Result<Vec<BusinessCard>, CardError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(CARDS).map_err(io_err)?;
        let mut cards = Vec::new();
        for entry in table.iter().map_err(io_err)? {
            let (_, data) = entry.map_err(io_err)?;
            let card: BusinessCard = decode(data.value())?;
            if &card.owner_id == owner {
                cards.push(card);
            }
        }
        Ok(cards)
    }
}

// =============================================================================
// VIEWS
// =============================================================================

impl ViewStore for RedbStore {
    fn append_view(&self, view: NewView, window_ms: u64) -> Result<RecordedView, CardError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let Some(card_key) = Self::card_key(&write_txn, &view.card_id)? else {
            return Err(CardError::CardNotFound(view.card_id));
        };

        let last = {
            let last_seen = write_txn.open_table(LAST_SEEN).map_err(io_err)?;
            let entry = last_seen
                .get((card_key, view.viewer.as_str()))
                .map_err(io_err)?;
            entry.map(|v| v.value())
        };
        if let Some((last_id, last_at)) = last {
            if within_window(Timestamp(last_at), view.at, window_ms) {
                write_txn.abort().map_err(io_err)?;
                return Ok(RecordedView {
                    view_id: ViewId(last_id),
                    collapsed: true,
                });
            }
        }

        let id = ViewId(Self::bump(&write_txn, NEXT_VIEW_ID)?);
        let viewer = view.viewer.clone();
        let at = view.at;
        let bytes = encode(&view.into_view(id))?;
        {
            let mut views = write_txn.open_table(VIEWS).map_err(io_err)?;
            views
                .insert((card_key, id.0), bytes.as_slice())
                .map_err(io_err)?;
            let mut last_seen = write_txn.open_table(LAST_SEEN).map_err(io_err)?;
            last_seen
                .insert((card_key, viewer.as_str()), (id.0, at.as_millis()))
                .map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;

        Ok(RecordedView {
            view_id: id,
            collapsed: false,
        })
    }

    fn views_for(&self, card: &CardId) -> Result<Vec<CardView>, CardError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let keys = read_txn.open_table(CARD_KEYS).map_err(io_err)?;
        let Some(card_key) = keys.get(card.as_str()).map_err(io_err)?.map(|v| v.value()) else {
            return Ok(Vec::new());
        };

        let table = read_txn.open_table(VIEWS).map_err(io_err)?;
        let mut views = Vec::new();
        for entry in table
            .range((card_key, 0)..=(card_key, u64::MAX))
            .map_err(io_err)?
        {
            let (_, data) = entry.map_err(io_err)?;
            views.push(decode(data.value())?);
        }
        Ok(views)
    }

    fn delete_views_for(&self, card: &CardId) -> Result<u64, CardError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let removed = match Self::card_key(&write_txn, card)? {
            Some(card_key) => Self::purge_views(&write_txn, card_key)?,
            None => 0,
        };
        write_txn.commit().map_err(io_err)?;
        Ok(removed)
    }
}

// =============================================================================
// TESTS
// =============================================================================
