//! # Distribution Facade
//!
//! The single entry point used by the HTTP API and the CLI. Each operation
//! fetches fresh snapshots from the store, runs the pure engine, and returns
//! the result. Nothing is cached between calls.
//!
//! Store calls are synchronous. They run on tokio's blocking pool under a
//! timeout; a timeout or a failed blocking task surfaces as
//! [`CardError::StoreUnavailable`].

use inkcard_core::{
    BusinessCard, CardBackend, CardError, CardId, CardPatch, ContactPayload, OwnerId,
    PrintLayout, RecordedView, RenderTree, Template, TemplateId, Timestamp, ViewLedger, ViewStats,
    compute_print_layout, format_contact, resolve, share_url,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

// =============================================================================
// CLOCK
// =============================================================================

/// Source of "now" for view timestamps and card stamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_system_time(SystemTime::now())
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock(AtomicU64);

impl ManualClock {
    pub fn new(millis: u64) -> Self {
        Self(AtomicU64::new(millis))
    }

    pub fn advance(&self, millis: u64) {
        self.0.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.0.load(Ordering::SeqCst))
    }
}

// =============================================================================
// FACADE
// =============================================================================

/// Card distribution service over a shared store.
pub struct Distribution {
    store: Arc<dyn CardBackend>,
    clock: Arc<dyn Clock>,
    ledger: ViewLedger,
    site_base: String,
    timeout: Duration,
}

impl std::fmt::Debug for Distribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Distribution")
            .field("ledger", &self.ledger)
            .field("site_base", &self.site_base)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Distribution {
    /// Create a facade with the wall clock, the default ledger and a 2 s
    /// store timeout.
    pub fn new(store: Arc<dyn CardBackend>, site_base: impl Into<String>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            ledger: ViewLedger::default(),
            site_base: site_base.into(),
            timeout: Duration::from_secs(2),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_ledger(mut self, ledger: ViewLedger) -> Self {
        self.ledger = ledger;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn site_base(&self) -> &str {
        &self.site_base
    }

    /// Run a store closure on the blocking pool under the configured timeout.
    async fn blocking<T, F>(&self, op: &'static str, f: F) -> Result<T, CardError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn CardBackend) -> Result<T, CardError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let task = tokio::task::spawn_blocking(move || f(store.as_ref()));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                tracing::error!(op, error = %e, "Store task failed");
                Err(CardError::StoreUnavailable(format!("{op}: {e}")))
            }
            Err(_) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(op, timeout_ms, "Store call timed out");
                Err(CardError::StoreUnavailable(format!(
                    "{op} timed out after {timeout_ms} ms"
                )))
            }
        }
    }

    /// Card plus the template it is bound to.
    async fn card_with_template(
        &self,
        card_id: &CardId,
    ) -> Result<(BusinessCard, Template), CardError> {
        let id = card_id.clone();
        self.blocking("load_card_with_template", move |store| {
            let card = store.get_card(&id)?;
            let template_id = card
                .template_id
                .clone()
                .ok_or_else(|| CardError::TemplateMissing(id.clone()))?;
            let template = store.get_template(&template_id)?;
            Ok((card, template))
        })
        .await
    }

    fn bind(template: &Template, card: &BusinessCard) -> Result<RenderTree, CardError> {
        let tree = resolve(template, card)?
            .into_tree()
            .ok_or_else(|| CardError::TemplateMissing(card.id.clone()))?;
        for warning in &tree.warnings {
            tracing::warn!(
                card = %tree.card_id,
                element = %warning.element_id,
                kind = ?warning.kind,
                "Field binding degraded"
            );
        }
        Ok(tree)
    }

    // =========================================================================
    // ENGINE OPERATIONS
    // =========================================================================

    /// Bind a card to its template and return the render tree.
    pub async fn resolve_card(&self, card_id: &CardId) -> Result<RenderTree, CardError> {
        let (card, template) = self.card_with_template(card_id).await?;
        Self::bind(&template, &card)
    }

    /// Print-ready layout of a card, using its paper settings if any.
    pub async fn export_paper_card(&self, card_id: &CardId) -> Result<PrintLayout, CardError> {
        let (card, template) = self.card_with_template(card_id).await?;
        let tree = Self::bind(&template, &card)?;
        let layout = compute_print_layout(&tree, card.paper_card_settings.as_ref());
        if !layout.is_print_safe() {
            tracing::info!(
                card = %card_id,
                violations = layout.violations.len(),
                "Print layout has safety violations"
            );
        }
        Ok(layout)
    }

    /// vCard for a card. Works whether or not a template is bound.
    pub async fn export_contact(&self, card_id: &CardId) -> Result<ContactPayload, CardError> {
        let id = card_id.clone();
        let card = self
            .blocking("get_card", move |store| store.get_card(&id))
            .await?;
        Ok(format_contact(&card))
    }

    /// Record a public view; repeats inside the dedup window collapse.
    pub async fn record_view(
        &self,
        card_id: &CardId,
        viewer: &str,
        device_info: Option<&str>,
    ) -> Result<RecordedView, CardError> {
        let id = card_id.clone();
        let viewer = viewer.to_string();
        let device_info = device_info.map(str::to_string);
        let now = self.clock.now();
        let ledger = self.ledger;

        let recorded = self
            .blocking("record_view", move |store| {
                ledger.record(store, &id, &viewer, device_info.as_deref(), now)
            })
            .await?;
        tracing::debug!(
            card = %card_id,
            view = %recorded.view_id,
            collapsed = recorded.collapsed,
            "View recorded"
        );
        Ok(recorded)
    }

    /// View counters of a card.
    pub async fn get_stats(&self, card_id: &CardId) -> Result<ViewStats, CardError> {
        let id = card_id.clone();
        let now = self.clock.now();
        let ledger = self.ledger;
        self.blocking("get_stats", move |store| ledger.stats(store, &id, now))
            .await
    }

    /// Public URL of a card, encoded by clients into its QR code.
    pub async fn share_url(&self, card_id: &CardId) -> Result<String, CardError> {
        let id = card_id.clone();
        let exists = self
            .blocking("card_exists", move |store| store.card_exists(&id))
            .await?;
        if !exists {
            return Err(CardError::CardNotFound(card_id.clone()));
        }
        Ok(share_url(&self.site_base, card_id))
    }

    // =========================================================================
    // RECORD MANAGEMENT
    // =========================================================================

    /// Fetch a card record.
    pub async fn get_card(&self, card_id: &CardId) -> Result<BusinessCard, CardError> {
        let id = card_id.clone();
        self.blocking("get_card", move |store| store.get_card(&id))
            .await
    }

    /// Insert or replace a card. `created_at` is kept from the stored record
    /// when one exists.
    pub async fn put_card(&self, mut card: BusinessCard) -> Result<BusinessCard, CardError> {
        card.validate()?;
        let now = self.clock.now();
        self.blocking("put_card", move |store| {
            card.created_at = match store.get_card(&card.id) {
                Ok(existing) => existing.created_at,
                Err(CardError::CardNotFound(_)) => now,
                Err(e) => return Err(e),
            };
            card.updated_at = now;
            store.put_card(&card)?;
            Ok(card)
        })
        .await
    }

    /// Cards of one owner, ordered by id. Empty for an unknown owner.
    pub async fn list_cards(&self, owner: &OwnerId) -> Result<Vec<BusinessCard>, CardError> {
        let owner = owner.clone();
        self.blocking("list_cards", move |store| store.list_cards_by_owner(&owner))
            .await
    }

    /// Apply a partial update to a card.
    pub async fn update_card(
        &self,
        card_id: &CardId,
        patch: CardPatch,
    ) -> Result<BusinessCard, CardError> {
        let id = card_id.clone();
        let now = self.clock.now();
        self.blocking("update_card", move |store| store.update_card(&id, &patch, now))
            .await
    }

    /// Delete a card and its views.
    pub async fn delete_card(&self, card_id: &CardId) -> Result<bool, CardError> {
        let id = card_id.clone();
        let deleted = self
            .blocking("delete_card", move |store| store.delete_card(&id))
            .await?;
        if deleted {
            tracing::info!(card = %card_id, "Card deleted");
        }
        Ok(deleted)
    }

    /// Insert or replace a template.
    pub async fn put_template(&self, template: Template) -> Result<Template, CardError> {
        template.validate()?;
        self.blocking("put_template", move |store| {
            store.put_template(&template)?;
            Ok(template)
        })
        .await
    }

    /// All templates, ordered by id.
    pub async fn list_templates(&self) -> Result<Vec<Template>, CardError> {
        self.blocking("list_templates", |store| store.list_templates())
            .await
    }

    /// Delete a template. Bound cards keep the dangling reference.
    pub async fn delete_template(&self, template_id: &TemplateId) -> Result<bool, CardError> {
        let id = template_id.clone();
        self.blocking("delete_template", move |store| store.delete_template(&id))
            .await
    }
}

// =============================================================================
// TESTS
// =============================================================================
