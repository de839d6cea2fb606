//! # inkcard-core
//!
//! The Template Binding & Card Export Engine for Inkcard.
//!
//! Given a layout [`Template`] and a [`BusinessCard`], the engine produces:
//! - a [`RenderTree`] for on-screen and print preview (`binding`, `theme`)
//! - print-ready geometry with safety checks (`paper`)
//! - a vCard contact file (`contact`)
//! - de-duplicated view counters (`ledger`)
//!
//! ## Architectural Constraints
//!
//! - Resolution, print layout and contact export are pure functions of their
//!   inputs. They never read the clock or touch storage.
//! - Persistence sits behind the `store` traits. Templates are referenced
//!   from cards by id and fetched per call, never embedded.
//! - NO async, NO network dependencies. The app crate drives the store on a
//!   blocking pool.

// =============================================================================
// MODULES
// =============================================================================

pub mod binding;
pub mod contact;
pub mod fields;
pub mod ledger;
pub mod model;
pub mod paper;
pub mod primitives;
pub mod share;
pub mod store;
pub mod theme;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{CardError, CardId, ElementId, OwnerId, TemplateId, Timestamp, ViewId};

pub use fields::{FieldKey, FieldKind, FieldRef, SocialNetwork};
pub use model::{
    Background, Border, BusinessCard, CardPatch, CardView, CustomTheme, Element, ElementStyle,
    ElementType, Geometry, LengthUnit, Margins, NamedPaperSize, Orientation, PaperCardSettings,
    PaperSize, PaperSpec, RecordedView, Template, TextAlign, ThemeColors, ThemeLayout, ViewStats,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use binding::{
    ContentSource, RenderTree, Resolution, ResolutionWarning, ResolvedElement, WarningKind,
    resolve,
};
pub use contact::{ContactPayload, format_contact, normalize_vcard};
pub use ledger::{ViewLedger, aggregate};
pub use paper::{
    PrintElement, PrintLayout, PrintSafetyViolation, RasterSize, Rect, ViolationKind,
    compute_print_layout,
};
pub use share::share_url;
pub use theme::{merge_background, merge_style};

// =============================================================================
// RE-EXPORTS: Storage
// =============================================================================

pub use store::{CardBackend, CardStore, MemoryStore, RedbStore, TemplateStore, ViewStore};
