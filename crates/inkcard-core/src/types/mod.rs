//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the engine:
//! - Record identifiers (`CardId`, `TemplateId`, `ElementId`, `OwnerId`, `ViewId`)
//! - Wall-clock representation (`Timestamp`)
//! - Error types (`CardError`)
//!
//! ## Determinism Guarantees
//!
//! - Identifiers implement `Ord` so they can key `BTreeMap`s
//! - Timestamps are integer milliseconds; day arithmetic never touches floats
//! - Counters use saturating arithmetic

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::primitives::MILLIS_PER_DAY;

// =============================================================================
// STRING IDENTIFIERS
// =============================================================================

/// Declares an opaque string identifier issued by the external record store.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create an identifier from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of a BusinessCard record.
    CardId
);

string_id!(
    /// Identifier of a Template record.
    TemplateId
);

string_id!(
    /// Identifier of an Element, unique within its Template.
    ElementId
);

string_id!(
    /// Identifier of the user owning a card.
    OwnerId
);

/// Identifier of a stored CardView, assigned by the view store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ViewId(pub u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// TIMESTAMP
// =============================================================================

/// Milliseconds since the Unix epoch, UTC.
///
/// The engine never reads the clock itself; callers pass `now` explicitly so
/// every aggregation stays a pure function of its inputs.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Create a timestamp from raw epoch milliseconds.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Convert a `SystemTime`. Times before the epoch clamp to zero.
    #[must_use]
    pub fn from_system_time(time: SystemTime) -> Self {
        let millis = time
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        Self::from_millis(millis)
    }

    /// Raw epoch milliseconds.
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Index of the UTC calendar day this instant falls on.
    #[must_use]
    pub const fn utc_day(self) -> u64 {
        self.0 / MILLIS_PER_DAY
    }

    /// Milliseconds elapsed since `earlier`; zero if `earlier` is in the future.
    #[must_use]
    pub const fn millis_since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Inkcard engine and its store adapters.
///
/// - NotFound family: propagated as-is, never retried
/// - `StoreUnavailable`: I/O or timeout, the caller may retry with backoff
/// - Print-safety and malformed field values are NOT errors; they travel as
///   data on successful results
#[derive(Debug, Error)]
pub enum CardError {
    /// The requested card does not exist.
    #[error("Card not found: {0}")]
    CardNotFound(CardId),

    /// The requested template does not exist.
    #[error("Template not found: {0}")]
    TemplateNotFound(TemplateId),

    /// The card is bound to a different template than the one supplied.
    #[error("Card {card} is bound to template {expected}, got {actual}")]
    TemplateMismatch {
        card: CardId,
        expected: TemplateId,
        actual: TemplateId,
    },

    /// The card has no template bound, so there is no layout to produce.
    #[error("Card {0} has no template bound")]
    TemplateMissing(CardId),

    /// The backing store failed or timed out.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A stored record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A caller-supplied record failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CardError {
    /// True for the NotFound family (card or template absent).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::CardNotFound(_) | Self::TemplateNotFound(_))
    }

    /// True when a retry with backoff may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    /// True when the failure only means "no layout can be shown".
    #[must_use]
    pub fn is_layout_failure(&self) -> bool {
        matches!(
            self,
            Self::TemplateMismatch { .. } | Self::TemplateMissing(_) | Self::TemplateNotFound(_)
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn string_ids_order_and_display() {
        let a = CardId::new("a");
        let b = CardId::from("b");
        assert!(a < b);
        assert_eq!(b.to_string(), "b");
        assert_eq!(a.as_str(), "a");
    }

    #[test]
    fn string_ids_serialize_transparently() {
        let json = serde_json::to_string(&TemplateId::new("tpl-1")).expect("serialize");
        assert_eq!(json, "\"tpl-1\"");
    }

    #[test]
    fn timestamp_day_boundaries() {
        let last_ms_of_day0 = Timestamp::from_millis(MILLIS_PER_DAY - 1);
        let first_ms_of_day1 = Timestamp::from_millis(MILLIS_PER_DAY);
        assert_eq!(last_ms_of_day0.utc_day(), 0);
        assert_eq!(first_ms_of_day1.utc_day(), 1);
    }

    #[test]
    fn timestamp_millis_since_saturates() {
        let early = Timestamp::from_millis(1_000);
        let late = Timestamp::from_millis(3_500);
        assert_eq!(late.millis_since(early), 2_500);
        assert_eq!(early.millis_since(late), 0);
    }

    #[test]
    fn timestamp_from_system_time() {
        let t = UNIX_EPOCH + Duration::from_millis(42);
        assert_eq!(Timestamp::from_system_time(t), Timestamp(42));
    }

    #[test]
    fn error_classification() {
        assert!(CardError::CardNotFound(CardId::new("x")).is_not_found());
        assert!(CardError::StoreUnavailable("timeout".into()).is_retryable());
        assert!(CardError::TemplateMissing(CardId::new("x")).is_layout_failure());
        assert!(!CardError::InvalidInput("bad".into()).is_retryable());
    }
}
