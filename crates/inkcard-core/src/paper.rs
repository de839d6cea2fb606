//! # Paper Export Calculator
//!
//! Turns a [`RenderTree`] plus [`PaperCardSettings`] into absolute print
//! geometry in points and checks every element against the bleed band and
//! the safe area.
//!
//! Page layout, outside in:
//!
//! ```text
//! +------------------------------+  page edge
//! |  bleed band                  |
//! |  +------------------------+  |
//! |  |  safe-area band        |  |
//! |  |  +------------------+  |  |
//! |  |  | printable area   |  |  |
//! |  |  +------------------+  |  |
//! |  +------------------------+  |
//! +------------------------------+
//! ```
//!
//! Violations are reported, never fatal.

#![allow(clippy::float_arithmetic)]

use serde::{Deserialize, Serialize};

use crate::binding::RenderTree;
use crate::model::{
    Background, ElementStyle, ElementType, Geometry, LengthUnit, Orientation, PaperCardSettings,
};
use crate::primitives::{GEOMETRY_EPSILON, POINTS_PER_INCH};
use crate::ElementId;

// =============================================================================
// GEOMETRY
// =============================================================================

/// Axis-aligned rectangle in points, origin at the top-left of the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Shrink by `amount` on every side. Never produces negative sizes.
    #[must_use]
    pub fn inset(&self, amount: f64) -> Self {
        let width = (self.width - 2.0 * amount).max(0.0);
        let height = (self.height - 2.0 * amount).max(0.0);
        Self::new(self.x + amount, self.y + amount, width, height)
    }

    /// True when `other` lies entirely inside `self`, within epsilon.
    #[must_use]
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x - GEOMETRY_EPSILON
            && other.y >= self.y - GEOMETRY_EPSILON
            && other.right() <= self.right() + GEOMETRY_EPSILON
            && other.bottom() <= self.bottom() + GEOMETRY_EPSILON
    }
}

/// Convert a length from `unit` to points.
#[must_use]
pub fn to_points(value: f64, unit: LengthUnit) -> f64 {
    value * unit.points_per_unit()
}

fn geometry_to_points(geometry: &Geometry, unit: LengthUnit) -> Rect {
    Rect::new(
        to_points(geometry.x, unit),
        to_points(geometry.y, unit),
        to_points(geometry.width, unit),
        to_points(geometry.height, unit),
    )
}

/// Page width and height in points, oriented.
fn oriented_page(settings: &PaperCardSettings) -> (f64, f64) {
    let (w, h, unit) = settings.size.dimensions();
    let (w, h) = (to_points(w, unit), to_points(h, unit));
    let (short, long) = if w <= h { (w, h) } else { (h, w) };
    match settings.orientation {
        Orientation::Portrait => (short, long),
        Orientation::Landscape => (long, short),
    }
}

// =============================================================================
// OUTPUT TYPES
// =============================================================================

/// Which print boundary an element crosses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// The box reaches into the bleed band or off the page.
    IntersectsBleed,
    /// The box stays clear of the bleed but leaves the safe area.
    OutsideSafeArea,
}

/// A non-fatal print-safety problem on one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintSafetyViolation {
    pub element_id: ElementId,
    pub kind: ViolationKind,
}

/// Pixel size of a picture element at the export resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterSize {
    pub width: u32,
    pub height: u32,
}

/// One element placed on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintElement {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub kind: ElementType,
    /// Absolute page coordinates in points.
    pub bounds: Rect,
    pub effective_style: ElementStyle,
    pub content: String,
    /// Only set for picture elements.
    pub raster: Option<RasterSize>,
}

/// Print-ready page geometry, all lengths in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintLayout {
    pub page_width: f64,
    pub page_height: f64,
    pub orientation: Orientation,
    pub bleed: f64,
    pub safe_area: f64,
    /// Page rectangle minus the bleed band.
    pub trim_box: Rect,
    /// Trim box minus the safe-area band.
    pub printable_area: Rect,
    pub resolution_dpi: u32,
    pub background: Background,
    pub elements: Vec<PrintElement>,
    pub violations: Vec<PrintSafetyViolation>,
}

impl PrintLayout {
    /// True when no element crosses a print boundary.
    #[must_use]
    pub fn is_print_safe(&self) -> bool {
        self.violations.is_empty()
    }
}

// =============================================================================
// LAYOUT
// =============================================================================

/// Compute the print layout of a resolved card.
///
/// Absent settings fall back to [`PaperCardSettings::default`] (A4 portrait,
/// no bleed, no safe area, no margins, 300 dpi).
#[must_use]
pub fn compute_print_layout(
    tree: &RenderTree,
    settings: Option<&PaperCardSettings>,
) -> PrintLayout {
    let defaults = PaperCardSettings::default();
    let settings = settings.unwrap_or(&defaults);
    let settings_unit = settings.size.unit();

    let (page_width, page_height) = oriented_page(settings);
    let page = Rect::new(0.0, 0.0, page_width, page_height);
    let bleed = to_points(settings.bleed.max(0.0), settings_unit);
    let safe_area = to_points(settings.safe_area.max(0.0), settings_unit);
    let trim_box = page.inset(bleed);
    let printable_area = trim_box.inset(safe_area);

    let offset_x = to_points(settings.margins.left, settings_unit);
    let offset_y = to_points(settings.margins.top, settings_unit);

    let mut violations = Vec::new();
    let elements = tree
        .elements
        .iter()
        .map(|element| {
            let local = geometry_to_points(&element.geometry, tree.unit);
            let bounds = Rect::new(local.x + offset_x, local.y + offset_y, local.width, local.height);

            if let Some(kind) = classify(&bounds, &trim_box, &printable_area) {
                violations.push(PrintSafetyViolation {
                    element_id: element.id.clone(),
                    kind,
                });
            }

            let raster = (element.kind == ElementType::Picture)
                .then(|| raster_size(&bounds, settings.resolution));

            PrintElement {
                id: element.id.clone(),
                kind: element.kind,
                bounds,
                effective_style: element.effective_style.clone(),
                content: element.resolved_content.clone(),
                raster,
            }
        })
        .collect();

    PrintLayout {
        page_width,
        page_height,
        orientation: settings.orientation,
        bleed,
        safe_area,
        trim_box,
        printable_area,
        resolution_dpi: settings.resolution,
        background: tree.paper.background.clone(),
        elements,
        violations,
    }
}

fn classify(bounds: &Rect, trim_box: &Rect, printable_area: &Rect) -> Option<ViolationKind> {
    if !trim_box.contains(bounds) {
        Some(ViolationKind::IntersectsBleed)
    } else if !printable_area.contains(bounds) {
        Some(ViolationKind::OutsideSafeArea)
    } else {
        None
    }
}

fn raster_size(bounds: &Rect, dpi: u32) -> RasterSize {
    let scale = f64::from(dpi) / POINTS_PER_INCH;
    let px = |pt: f64| (pt.max(0.0) * scale).round().min(f64::from(u32::MAX)) as u32;
    RasterSize {
        width: px(bounds.width),
        height: px(bounds.height),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{ContentSource, ResolvedElement};
    use crate::model::{Margins, NamedPaperSize, PaperSize, PaperSpec};
    use crate::primitives::POINTS_PER_MM;
    use crate::{CardId, TemplateId};

    fn element(id: &str, kind: ElementType, geometry: Geometry) -> ResolvedElement {
        ResolvedElement {
            id: ElementId::new(id),
            kind,
            geometry,
            effective_style: ElementStyle::default(),
            resolved_content: String::new(),
            source: ContentSource::Empty,
        }
    }

    fn tree(unit: LengthUnit, elements: Vec<ResolvedElement>) -> RenderTree {
        RenderTree {
            card_id: CardId::new("c1"),
            template_id: TemplateId::new("t1"),
            unit,
            paper: PaperSpec::default(),
            elements,
            warnings: Vec::new(),
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 0.01
    }

    #[test]
    fn absent_settings_use_a4_portrait() {
        let t = tree(
            LengthUnit::Mm,
            vec![element("e1", ElementType::Text, Geometry::new(10.0, 10.0, 50.0, 10.0))],
        );
        let layout = compute_print_layout(&t, None);
        assert!(close(layout.page_width, 210.0 * POINTS_PER_MM));
        assert!(close(layout.page_height, 297.0 * POINTS_PER_MM));
        assert_eq!(layout.orientation, Orientation::Portrait);
        assert!(layout.is_print_safe());
        assert_eq!(layout.resolution_dpi, 300);
    }

    #[test]
    fn millimetres_match_points_template() {
        let mm = tree(
            LengthUnit::Mm,
            vec![element("e1", ElementType::Text, Geometry::new(0.0, 0.0, 90.0, 10.0))],
        );
        let pt = tree(
            LengthUnit::Pt,
            vec![element(
                "e1",
                ElementType::Text,
                Geometry::new(0.0, 0.0, 90.0 * POINTS_PER_MM, 10.0 * POINTS_PER_MM),
            )],
        );
        let a = compute_print_layout(&mm, None);
        let b = compute_print_layout(&pt, None);
        assert!(close(a.elements[0].bounds.width, b.elements[0].bounds.width));
        assert!(close(a.elements[0].bounds.width, 255.114));
    }

    #[test]
    fn landscape_swaps_page_dimensions() {
        let settings = PaperCardSettings {
            size: PaperSize::named(NamedPaperSize::BusinessCard),
            orientation: Orientation::Landscape,
            ..PaperCardSettings::default()
        };
        let layout = compute_print_layout(&tree(LengthUnit::Mm, vec![]), Some(&settings));
        assert!(close(layout.page_width, 90.0 * POINTS_PER_MM));
        assert!(close(layout.page_height, 55.0 * POINTS_PER_MM));
    }

    #[test]
    fn printable_area_subtracts_bleed_and_safe_area() {
        let settings = PaperCardSettings {
            bleed: 3.0,
            safe_area: 5.0,
            ..PaperCardSettings::custom(90.0, 55.0, LengthUnit::Mm)
        };
        let layout = compute_print_layout(&tree(LengthUnit::Mm, vec![]), Some(&settings));
        // Custom 90x55 in portrait is 55 wide.
        assert!(close(layout.printable_area.width, (55.0 - 16.0) * POINTS_PER_MM));
        assert!(close(layout.printable_area.height, (90.0 - 16.0) * POINTS_PER_MM));
        assert!(close(layout.printable_area.x, 8.0 * POINTS_PER_MM));
    }

    #[test]
    fn violations_are_classified() {
        let settings = PaperCardSettings {
            bleed: 3.0,
            safe_area: 5.0,
            orientation: Orientation::Landscape,
            ..PaperCardSettings::custom(90.0, 55.0, LengthUnit::Mm)
        };
        let t = tree(
            LengthUnit::Mm,
            vec![
                element("inside", ElementType::Text, Geometry::new(10.0, 10.0, 20.0, 5.0)),
                element("in-safe-band", ElementType::Text, Geometry::new(4.0, 10.0, 20.0, 5.0)),
                element("in-bleed", ElementType::Text, Geometry::new(1.0, 10.0, 20.0, 5.0)),
                element("off-page", ElementType::Text, Geometry::new(80.0, 10.0, 20.0, 5.0)),
            ],
        );
        let layout = compute_print_layout(&t, Some(&settings));
        let kinds: Vec<_> = layout
            .violations
            .iter()
            .map(|v| (v.element_id.as_str(), v.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("in-safe-band", ViolationKind::OutsideSafeArea),
                ("in-bleed", ViolationKind::IntersectsBleed),
                ("off-page", ViolationKind::IntersectsBleed),
            ]
        );
        // Export still carries every element.
        assert_eq!(layout.elements.len(), 4);
    }

    #[test]
    fn margins_translate_elements() {
        let settings = PaperCardSettings {
            margins: Margins {
                top: 10.0,
                left: 5.0,
                ..Margins::default()
            },
            ..PaperCardSettings::default()
        };
        let t = tree(
            LengthUnit::Mm,
            vec![element("e1", ElementType::Text, Geometry::new(1.0, 2.0, 3.0, 4.0))],
        );
        let layout = compute_print_layout(&t, Some(&settings));
        let bounds = layout.elements[0].bounds;
        assert!(close(bounds.x, 6.0 * POINTS_PER_MM));
        assert!(close(bounds.y, 12.0 * POINTS_PER_MM));
    }

    #[test]
    fn resolution_only_affects_raster_size() {
        let t = tree(
            LengthUnit::In,
            vec![
                element("logo", ElementType::Picture, Geometry::new(1.0, 1.0, 1.0, 0.5)),
                element("name", ElementType::Text, Geometry::new(1.0, 2.0, 2.0, 0.5)),
            ],
        );
        let low = PaperCardSettings {
            resolution: 72,
            ..PaperCardSettings::default()
        };
        let a = compute_print_layout(&t, Some(&low));
        let b = compute_print_layout(&t, None);

        assert_eq!(a.elements[0].bounds, b.elements[0].bounds);
        assert_eq!(a.elements[0].raster, Some(RasterSize { width: 72, height: 36 }));
        assert_eq!(b.elements[0].raster, Some(RasterSize { width: 300, height: 150 }));
        assert_eq!(b.elements[1].raster, None);
    }

    #[test]
    fn oversized_safe_area_clamps_to_empty() {
        let settings = PaperCardSettings {
            safe_area: 500.0,
            ..PaperCardSettings::default()
        };
        let layout = compute_print_layout(&tree(LengthUnit::Mm, vec![]), Some(&settings));
        assert_eq!(layout.printable_area.width, 0.0);
        assert_eq!(layout.printable_area.height, 0.0);
    }

    #[test]
    fn stored_letter_settings_measure_in_inches() {
        let settings: PaperCardSettings =
            serde_json::from_str(r#"{"size":{"name":"letter"},"bleed":0.125,"margins":{"left":1}}"#)
                .expect("parse");
        let t = tree(
            LengthUnit::In,
            vec![element("e1", ElementType::Text, Geometry::new(0.5, 1.0, 2.0, 0.5))],
        );
        let layout = compute_print_layout(&t, Some(&settings));

        assert!(close(layout.page_width, 612.0));
        assert!(close(layout.page_height, 792.0));
        assert!(close(layout.bleed, 9.0));
        assert!(close(layout.elements[0].bounds.x, 108.0));
    }
}
