//! # Binding Resolver
//!
//! Merges a template's elements with a card's values and theme into a
//! [`RenderTree`].
//!
//! Content precedence per element, highest first:
//!
//! 1. `card.field_values[element.id]`, when non-empty
//! 2. `element.content`, when non-empty
//! 3. the card's value for `element.field`
//! 4. the empty string
//!
//! Resolution never fails on a missing or malformed value. Problems are
//! reported as [`ResolutionWarning`]s next to an empty content slot.

use serde::{Deserialize, Serialize};

use crate::fields::{FieldKey, FieldRef, is_url_like};
use crate::model::{
    BusinessCard, Element, ElementStyle, ElementType, Geometry, LengthUnit, PaperSpec, Template,
};
use crate::theme::{merge_background, merge_style};
use crate::{CardError, CardId, ElementId, TemplateId};

// =============================================================================
// OUTPUT TYPES
// =============================================================================

/// Where an element's resolved content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    /// Per-card literal override.
    CardOverride,
    /// Template-authored default.
    TemplateContent,
    /// The card's value for the bound field.
    Field,
    /// Nothing available; the element renders empty.
    Empty,
}

/// An element with its content and style resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedElement {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub kind: ElementType,
    pub geometry: Geometry,
    pub effective_style: ElementStyle,
    pub resolved_content: String,
    pub source: ContentSource,
}

/// Why an element's content was blanked or could not be bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WarningKind {
    /// The value does not fit its target (e.g. a non-URL for a picture).
    MalformedFieldValue { value: String },
    /// The element is bound to a field outside the registry.
    UnknownField { path: String },
}

/// A non-fatal problem found while resolving one element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionWarning {
    pub element_id: ElementId,
    #[serde(flatten)]
    pub kind: WarningKind,
}

/// The render-ready result of binding a card to a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderTree {
    pub card_id: CardId,
    pub template_id: TemplateId,
    /// Unit of every element geometry.
    pub unit: LengthUnit,
    /// Template paper with the card theme applied to the background.
    pub paper: PaperSpec,
    /// Elements in template order (first = bottom).
    pub elements: Vec<ResolvedElement>,
    pub warnings: Vec<ResolutionWarning>,
}

impl RenderTree {
    /// Look up a resolved element by id.
    #[must_use]
    pub fn element(&self, id: &ElementId) -> Option<&ResolvedElement> {
        self.elements.iter().find(|e| &e.id == id)
    }
}

/// Result of a resolution request.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The card is bound and its template resolved.
    Layout(RenderTree),
    /// The card has no template; callers render their fallback.
    NoLayout,
}

impl Resolution {
    /// The render tree, if there is a layout.
    #[must_use]
    pub fn into_tree(self) -> Option<RenderTree> {
        match self {
            Self::Layout(tree) => Some(tree),
            Self::NoLayout => None,
        }
    }
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Resolve `card` against `template`.
///
/// Returns [`Resolution::NoLayout`] when the card has no template bound, and
/// [`CardError::TemplateMismatch`] when it is bound to another template.
pub fn resolve(template: &Template, card: &BusinessCard) -> Result<Resolution, CardError> {
    let Some(bound) = card.template_id.as_ref() else {
        return Ok(Resolution::NoLayout);
    };
    if bound != &template.id {
        return Err(CardError::TemplateMismatch {
            card: card.id.clone(),
            expected: bound.clone(),
            actual: template.id.clone(),
        });
    }
    Ok(Resolution::Layout(build_tree(template, card)))
}

fn build_tree(template: &Template, card: &BusinessCard) -> RenderTree {
    let theme = card.custom_theme.as_ref();
    let mut warnings = Vec::new();

    let elements = template
        .elements
        .iter()
        .map(|element| {
            let (resolved_content, source) = resolve_content(element, card, &mut warnings);
            ResolvedElement {
                id: element.id.clone(),
                kind: element.kind,
                geometry: element.geometry,
                effective_style: merge_style(&element.style, theme),
                resolved_content,
                source,
            }
        })
        .collect();

    let paper = PaperSpec {
        background: merge_background(&template.paper.background, theme),
        ..template.paper.clone()
    };

    RenderTree {
        card_id: card.id.clone(),
        template_id: template.id.clone(),
        unit: template.paper.size.unit(),
        paper,
        elements,
        warnings,
    }
}

/// Pick the highest-precedence candidate, then check it fits the element.
fn resolve_content(
    element: &Element,
    card: &BusinessCard,
    warnings: &mut Vec<ResolutionWarning>,
) -> (String, ContentSource) {
    let (value, source) = match pick_candidate(element, card, warnings) {
        Some((value, source)) => (value, source),
        None => return (String::new(), ContentSource::Empty),
    };

    if element.kind == ElementType::Picture && !is_url_like(value) {
        warnings.push(ResolutionWarning {
            element_id: element.id.clone(),
            kind: WarningKind::MalformedFieldValue {
                value: value.to_string(),
            },
        });
        return (String::new(), ContentSource::Empty);
    }

    (value.to_string(), source)
}

fn pick_candidate<'a>(
    element: &'a Element,
    card: &'a BusinessCard,
    warnings: &mut Vec<ResolutionWarning>,
) -> Option<(&'a str, ContentSource)> {
    if let Some(value) = card
        .field_values
        .get(&element.id)
        .filter(|v| !v.trim().is_empty())
    {
        return Some((value.as_str(), ContentSource::CardOverride));
    }

    if let Some(content) = element.content.as_ref().filter(|c| !c.trim().is_empty()) {
        return Some((content.as_str(), ContentSource::TemplateContent));
    }

    match element.field.as_ref()? {
        FieldRef::Known(key) => field_candidate(*key, card),
        FieldRef::Unknown(path) => {
            warnings.push(ResolutionWarning {
                element_id: element.id.clone(),
                kind: WarningKind::UnknownField { path: path.clone() },
            });
            None
        }
    }
}

fn field_candidate(key: FieldKey, card: &BusinessCard) -> Option<(&str, ContentSource)> {
    card.field_value(key).map(|v| (v, ContentSource::Field))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::SocialNetwork;
    use crate::model::{CustomTheme, ThemeColors};

    fn geometry() -> Geometry {
        Geometry::new(10.0, 10.0, 50.0, 8.0)
    }

    fn template_with(elements: Vec<Element>) -> Template {
        Template {
            elements,
            ..Template::new("tpl")
        }
    }

    #[test]
    fn unbound_card_has_no_layout() {
        let template = template_with(vec![]);
        let card = BusinessCard::new("c1", "u1", "Anan");
        assert_eq!(resolve(&template, &card).expect("resolve"), Resolution::NoLayout);
    }

    #[test]
    fn mismatched_template_is_an_error() {
        let template = template_with(vec![]);
        let card = BusinessCard::new("c1", "u1", "Anan").with_template("other");
        let err = resolve(&template, &card).expect_err("mismatch");
        assert!(matches!(err, CardError::TemplateMismatch { .. }));
    }

    #[test]
    fn name_field_binding() {
        let template =
            template_with(vec![Element::text("e1", geometry()).bound_to(FieldKey::Name)]);
        let mut card = BusinessCard::new("c1", "u1", "Anan Srisuk").with_template("tpl");
        card.company = Some("Acme".into());

        let tree = resolve(&template, &card)
            .expect("resolve")
            .into_tree()
            .expect("layout");
        assert_eq!(tree.elements.len(), 1);
        assert_eq!(tree.elements[0].resolved_content, "Anan Srisuk");
        assert_eq!(tree.elements[0].source, ContentSource::Field);
        assert!(tree.warnings.is_empty());
    }

    #[test]
    fn card_override_beats_template_content_and_field() {
        let template = template_with(vec![
            Element::text("e1", geometry())
                .bound_to(FieldKey::Name)
                .with_content("Y"),
        ]);
        let mut card = BusinessCard::new("c1", "u1", "Anan").with_template("tpl");
        card.field_values.insert(ElementId::new("e1"), "X".into());

        let tree = resolve(&template, &card).expect("resolve").into_tree().expect("layout");
        assert_eq!(tree.elements[0].resolved_content, "X");
        assert_eq!(tree.elements[0].source, ContentSource::CardOverride);
    }

    #[test]
    fn empty_override_falls_through_to_content() {
        let template =
            template_with(vec![Element::text("e1", geometry()).with_content("Static")]);
        let mut card = BusinessCard::new("c1", "u1", "Anan").with_template("tpl");
        card.field_values.insert(ElementId::new("e1"), "  ".into());

        let tree = resolve(&template, &card).expect("resolve").into_tree().expect("layout");
        assert_eq!(tree.elements[0].resolved_content, "Static");
        assert_eq!(tree.elements[0].source, ContentSource::TemplateContent);
    }

    #[test]
    fn missing_values_render_empty() {
        let template = template_with(vec![
            Element::text("e1", geometry()).bound_to(FieldKey::JobTitle),
            Element::text("e2", geometry()),
        ]);
        let card = BusinessCard::new("c1", "u1", "Anan").with_template("tpl");

        let tree = resolve(&template, &card).expect("resolve").into_tree().expect("layout");
        assert!(tree.elements.iter().all(|e| e.resolved_content.is_empty()));
        assert!(tree.elements.iter().all(|e| e.source == ContentSource::Empty));
    }

    #[test]
    fn social_link_binding() {
        let template = template_with(vec![
            Element::text("li", geometry())
                .bound_to(FieldKey::Social(SocialNetwork::Linkedin)),
        ]);
        let mut card = BusinessCard::new("c1", "u1", "Anan").with_template("tpl");
        card.social_links
            .insert("linkedin".into(), "https://linkedin.com/in/anan".into());

        let tree = resolve(&template, &card).expect("resolve").into_tree().expect("layout");
        assert_eq!(tree.elements[0].resolved_content, "https://linkedin.com/in/anan");
    }

    #[test]
    fn picture_with_non_url_override_is_blanked_with_warning() {
        let template = template_with(vec![
            Element::picture("logo", geometry()).bound_to(FieldKey::CompanyLogo),
        ]);
        let mut card = BusinessCard::new("c1", "u1", "Anan").with_template("tpl");
        card.company_logo = Some("https://cdn.example.com/logo.png".into());
        card.field_values
            .insert(ElementId::new("logo"), "not a url".into());

        let tree = resolve(&template, &card).expect("resolve").into_tree().expect("layout");
        assert_eq!(tree.elements[0].resolved_content, "");
        assert_eq!(tree.warnings.len(), 1);
        assert!(matches!(
            tree.warnings[0].kind,
            WarningKind::MalformedFieldValue { .. }
        ));
    }

    #[test]
    fn picture_with_url_field_resolves() {
        let template = template_with(vec![
            Element::picture("logo", geometry()).bound_to(FieldKey::CompanyLogo),
        ]);
        let mut card = BusinessCard::new("c1", "u1", "Anan").with_template("tpl");
        card.company_logo = Some("/uploads/acme.png".into());

        let tree = resolve(&template, &card).expect("resolve").into_tree().expect("layout");
        assert_eq!(tree.elements[0].resolved_content, "/uploads/acme.png");
    }

    #[test]
    fn unknown_field_warns_and_renders_empty() {
        let template = template_with(vec![
            Element::text("m", geometry()).bound_to(FieldRef::parse("socialLinks.mastodon")),
        ]);
        let card = BusinessCard::new("c1", "u1", "Anan").with_template("tpl");

        let tree = resolve(&template, &card).expect("resolve").into_tree().expect("layout");
        assert_eq!(tree.elements[0].resolved_content, "");
        assert!(matches!(
            &tree.warnings[0].kind,
            WarningKind::UnknownField { path } if path == "socialLinks.mastodon"
        ));
    }

    #[test]
    fn unknown_override_keys_are_ignored() {
        let template =
            template_with(vec![Element::text("e1", geometry()).bound_to(FieldKey::Name)]);
        let mut card = BusinessCard::new("c1", "u1", "Anan").with_template("tpl");
        card.field_values
            .insert(ElementId::new("removed-element"), "stale".into());

        let tree = resolve(&template, &card).expect("resolve").into_tree().expect("layout");
        assert_eq!(tree.elements.len(), 1);
        assert_eq!(tree.elements[0].resolved_content, "Anan");
        assert!(tree.warnings.is_empty());
    }

    #[test]
    fn theme_applies_to_styles_and_background() {
        let template =
            template_with(vec![Element::text("e1", geometry()).bound_to(FieldKey::Name)]);
        let mut card = BusinessCard::new("c1", "u1", "Anan").with_template("tpl");
        card.custom_theme = Some(CustomTheme {
            colors: ThemeColors {
                text: Some("#222".into()),
                background: Some("#eee".into()),
                ..ThemeColors::default()
            },
            ..CustomTheme::default()
        });

        let tree = resolve(&template, &card).expect("resolve").into_tree().expect("layout");
        assert_eq!(tree.elements[0].effective_style.color.as_deref(), Some("#222"));
        assert_eq!(tree.paper.background.color.as_deref(), Some("#eee"));
    }

    #[test]
    fn tree_unit_follows_named_paper() {
        let json = r#"{"id":"tpl","paper":{"size":{"name":"business-card-us"}},"elements":[]}"#;
        let template: Template = serde_json::from_str(json).expect("parse");
        let card = BusinessCard::new("c1", "u1", "Anan").with_template("tpl");
        let tree = resolve(&template, &card).expect("resolve").into_tree().expect("layout");
        assert_eq!(tree.unit, LengthUnit::In);
    }
}
