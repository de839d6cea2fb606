//! # Data Model
//!
//! Records exchanged with the external store:
//! - `template`: Template, Element, paper and style types
//! - `card`: BusinessCard, CustomTheme, PaperCardSettings, CardPatch
//! - `view`: CardView and ViewStats
//!
//! Templates are referenced from cards by id only. A card never embeds
//! template data; callers fetch both and hand snapshots to the engine.

pub mod card;
pub mod template;
pub mod view;

pub use card::{
    BusinessCard, CardPatch, CustomTheme, Margins, PaperCardSettings, ThemeColors, ThemeLayout,
};
pub use template::{
    Background, Border, Element, ElementStyle, ElementType, Geometry, LengthUnit, NamedPaperSize,
    Orientation, PaperSize, PaperSpec, Template, TextAlign,
};
pub use view::{CardView, NewView, RecordedView, ViewStats};
