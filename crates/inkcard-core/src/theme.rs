//! # Theme Merger
//!
//! Computes the effective style of an element by layering, field by field:
//!
//! 1. the template element's own style,
//! 2. the card's custom theme (mapped onto element style fields).
//!
//! Unset values at a layer fall through from the layer below. There is no
//! UI-level layer in the engine.

use crate::model::{Background, CustomTheme, ElementStyle};

/// Overwrite `slot` when `value` carries visible text.
fn overlay(slot: &mut Option<String>, value: Option<&String>) {
    if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
        *slot = Some(v.clone());
    }
}

/// Merge an element style with the card theme.
///
/// Mapping of theme fields:
/// - `colors.text` → `color`
/// - `colors.background` → `background_color`, only for elements that already
///   paint a background (the page background is handled by
///   [`merge_background`])
/// - `colors.primary` → `border.color`, only for elements with a border
/// - `font_family` → `font_family`
/// - `layout.text_alignment` → `text_align`
#[must_use]
pub fn merge_style(style: &ElementStyle, theme: Option<&CustomTheme>) -> ElementStyle {
    let mut merged = style.clone();
    let Some(theme) = theme else {
        return merged;
    };

    overlay(&mut merged.color, theme.colors.text.as_ref());
    if merged.background_color.is_some() {
        overlay(
            &mut merged.background_color,
            theme.colors.background.as_ref(),
        );
    }
    if let Some(border) = merged.border.as_mut() {
        overlay(&mut border.color, theme.colors.primary.as_ref());
    }
    overlay(&mut merged.font_family, theme.font_family.as_ref());
    if let Some(align) = theme.layout.text_alignment {
        merged.text_align = Some(align);
    }
    merged
}

/// Effective page background: the theme background colour replaces the
/// template fill colour; a template background image is kept.
#[must_use]
pub fn merge_background(background: &Background, theme: Option<&CustomTheme>) -> Background {
    let mut merged = background.clone();
    if let Some(theme) = theme {
        overlay(&mut merged.color, theme.colors.background.as_ref());
    }
    merged
}

// =============================================================================
// TESTS
// =============================================================================
