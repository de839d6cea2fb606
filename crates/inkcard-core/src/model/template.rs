//! Template, Element and paper types.
//!
//! Stored rows go through postcard, so optional fields are always serialized
//! (no `skip_serializing_if`) and enums are externally tagged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::fields::{FieldKind, FieldRef};
use crate::primitives::{
    MAX_FIELD_VALUE_LENGTH, MAX_TEMPLATE_ELEMENTS, POINTS_PER_INCH, POINTS_PER_MM, POINTS_PER_PX,
};
use crate::{CardError, ElementId, TemplateId};

// =============================================================================
// UNITS & PAPER
// =============================================================================

/// Length unit of template geometry or paper settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    #[default]
    Mm,
    In,
    Px,
    Pt,
}

impl LengthUnit {
    /// Conversion factor into points.
    #[must_use]
    pub const fn points_per_unit(self) -> f64 {
        match self {
            Self::Mm => POINTS_PER_MM,
            Self::In => POINTS_PER_INCH,
            Self::Px => POINTS_PER_PX,
            Self::Pt => 1.0,
        }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Standard paper sizes, dimensions given in portrait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamedPaperSize {
    A4,
    A5,
    Letter,
    BusinessCard,
    BusinessCardUs,
}

impl NamedPaperSize {
    /// Portrait width, height and the unit they are defined in.
    #[must_use]
    pub const fn dimensions(self) -> (f64, f64, LengthUnit) {
        match self {
            Self::A4 => (210.0, 297.0, LengthUnit::Mm),
            Self::A5 => (148.0, 210.0, LengthUnit::Mm),
            Self::Letter => (8.5, 11.0, LengthUnit::In),
            // Business cards are landscape objects; portrait form keeps width <= height.
            Self::BusinessCard => (55.0, 90.0, LengthUnit::Mm),
            Self::BusinessCardUs => (2.0, 3.5, LengthUnit::In),
        }
    }
}

/// A paper size: a named size, or explicit width/height in `unit`.
///
/// Explicit dimensions win when both are present. With neither, A4 is used.
/// An unset `unit` means the named size's native unit (millimetres for
/// explicit dimensions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaperSize {
    pub name: Option<NamedPaperSize>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub unit: Option<LengthUnit>,
}

impl Default for PaperSize {
    fn default() -> Self {
        Self::named(NamedPaperSize::A4)
    }
}

impl PaperSize {
    /// A named size, expressed in its native unit.
    #[must_use]
    pub fn named(name: NamedPaperSize) -> Self {
        Self {
            name: Some(name),
            width: None,
            height: None,
            unit: None,
        }
    }

    /// Explicit dimensions.
    #[must_use]
    pub fn custom(width: f64, height: f64, unit: LengthUnit) -> Self {
        Self {
            name: None,
            width: Some(width),
            height: Some(height),
            unit: Some(unit),
        }
    }

    fn explicit(&self) -> Option<(f64, f64)> {
        self.width.zip(self.height)
    }

    /// Effective unit of lengths measured against this size.
    #[must_use]
    pub fn unit(&self) -> LengthUnit {
        match (self.unit, self.explicit()) {
            (Some(unit), _) => unit,
            (None, Some(_)) => LengthUnit::Mm,
            (None, None) => self.name.unwrap_or(NamedPaperSize::A4).dimensions().2,
        }
    }

    /// Width, height and unit of this size (orientation not applied).
    #[must_use]
    pub fn dimensions(&self) -> (f64, f64, LengthUnit) {
        match self.explicit() {
            Some((w, h)) => (w, h, self.unit()),
            None => self.name.unwrap_or(NamedPaperSize::A4).dimensions(),
        }
    }
}

/// Page background of a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Background {
    pub color: Option<String>,
    pub image: Option<String>,
}

impl Background {
    /// True when neither a fill colour nor an image is set.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.color.as_deref().is_none_or(|c| c.trim().is_empty())
            && self.image.as_deref().is_none_or(|i| i.trim().is_empty())
    }
}

/// Paper specification of a template canvas.
///
/// The effective unit of `size` is also the unit of every element geometry in the template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaperSpec {
    pub size: PaperSize,
    pub orientation: Orientation,
    pub background: Background,
}

// =============================================================================
// ELEMENT STYLE
// =============================================================================

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
    Justify,
}

/// Element border.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Border {
    pub width: Option<f64>,
    pub color: Option<String>,
    pub radius: Option<f64>,
}

/// Visual style of an element. Every field is optional so styles can be
/// layered field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementStyle {
    pub font_size: Option<f64>,
    pub font_weight: Option<String>,
    pub font_family: Option<String>,
    pub color: Option<String>,
    pub text_align: Option<TextAlign>,
    pub background_color: Option<String>,
    pub border: Option<Border>,
    pub padding: Option<f64>,
}

// =============================================================================
// ELEMENT
// =============================================================================

/// Element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    #[default]
    Text,
    Textarea,
    Picture,
}

/// Position and size in the template's length unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Geometry {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// One positioned, styled unit of a template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Element {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub kind: ElementType,
    /// Semantic binding; `None` means static or decorative content.
    pub field: Option<FieldRef>,
    /// Template-authored default content.
    pub content: Option<String>,
    pub geometry: Geometry,
    pub style: ElementStyle,
}

impl Element {
    /// A text element at `geometry`.
    #[must_use]
    pub fn text(id: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            id: ElementId::new(id),
            kind: ElementType::Text,
            geometry,
            ..Self::default()
        }
    }

    /// A picture element at `geometry`.
    #[must_use]
    pub fn picture(id: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            id: ElementId::new(id),
            kind: ElementType::Picture,
            geometry,
            ..Self::default()
        }
    }

    /// Bind to a semantic field.
    #[must_use]
    pub fn bound_to(mut self, field: impl Into<FieldRef>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set the template default content.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the element style.
    #[must_use]
    pub fn with_style(mut self, style: ElementStyle) -> Self {
        self.style = style;
        self
    }
}

// =============================================================================
// TEMPLATE
// =============================================================================

/// A reusable layout: paper spec plus ordered elements (first = bottom).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    pub paper: PaperSpec,
    pub elements: Vec<Element>,
}

impl Template {
    /// Create an empty template on the default paper.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: TemplateId::new(id),
            ..Self::default()
        }
    }

    /// Look up an element by id.
    #[must_use]
    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| &e.id == id)
    }

    /// Validate the template before it is stored.
    ///
    /// Rejects duplicate or empty element ids, negative sizes, oversized
    /// content, and picture elements bound to non-URL fields.
    pub fn validate(&self) -> Result<(), CardError> {
        if self.id.as_str().trim().is_empty() {
            return Err(CardError::InvalidInput("template id is empty".to_string()));
        }
        if self.elements.len() > MAX_TEMPLATE_ELEMENTS {
            return Err(CardError::InvalidInput(format!(
                "template has {} elements, maximum is {}",
                self.elements.len(),
                MAX_TEMPLATE_ELEMENTS
            )));
        }

        let mut seen = BTreeSet::new();
        for element in &self.elements {
            if element.id.as_str().trim().is_empty() {
                return Err(CardError::InvalidInput("element id is empty".to_string()));
            }
            if !seen.insert(&element.id) {
                return Err(CardError::InvalidInput(format!(
                    "duplicate element id: {}",
                    element.id
                )));
            }
            let g = element.geometry;
            if g.width < 0.0 || g.height < 0.0 || !g.width.is_finite() || !g.height.is_finite() {
                return Err(CardError::InvalidInput(format!(
                    "element {} has an invalid size",
                    element.id
                )));
            }
            if !g.x.is_finite() || !g.y.is_finite() {
                return Err(CardError::InvalidInput(format!(
                    "element {} has an invalid position",
                    element.id
                )));
            }
            if element
                .content
                .as_ref()
                .is_some_and(|c| c.len() > MAX_FIELD_VALUE_LENGTH)
            {
                return Err(CardError::InvalidInput(format!(
                    "element {} content exceeds {} bytes",
                    element.id, MAX_FIELD_VALUE_LENGTH
                )));
            }
            if element.kind == ElementType::Picture {
                if let Some(FieldRef::Known(key)) = &element.field {
                    if key.kind() != FieldKind::Url {
                        return Err(CardError::InvalidInput(format!(
                            "picture element {} is bound to non-URL field {}",
                            element.id, key
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
