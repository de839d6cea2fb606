//! BusinessCard, custom theme, paper card settings and card patches.

use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::template::{LengthUnit, NamedPaperSize, Orientation, PaperSize, TextAlign};
use crate::fields::FieldKey;
use crate::primitives::{DEFAULT_RESOLUTION_DPI, MAX_FIELD_VALUE_LENGTH};
use crate::{CardError, CardId, ElementId, OwnerId, TemplateId, Timestamp};

// =============================================================================
// CUSTOM THEME
// =============================================================================

/// Colour palette of a card theme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThemeColors {
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub text: Option<String>,
    pub background: Option<String>,
}

/// Layout preferences of a card theme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThemeLayout {
    pub text_alignment: Option<TextAlign>,
}

/// Partial style override applied platform-wide to a card.
///
/// `extra` holds theme keys this engine does not understand. They are kept
/// so a newer client's settings survive a round trip, and are never read.
/// Scalar values are kept as text; nested objects and arrays are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTheme {
    pub colors: ThemeColors,
    pub font_family: Option<String>,
    pub layout: ThemeLayout,
    pub extra: BTreeMap<String, String>,
}

const THEME_FIELDS: &[&str] = &["colors", "fontFamily", "layout", "extra"];

/// Value of a theme key outside the known set.
#[derive(Deserialize)]
#[serde(untagged)]
enum ExtraValue {
    Text(String),
    Flag(bool),
    Integer(i64),
    Number(f64),
    Nested(IgnoredAny),
}

impl ExtraValue {
    fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Flag(flag) => Some(flag.to_string()),
            Self::Integer(n) => Some(n.to_string()),
            Self::Number(n) => Some(n.to_string()),
            Self::Nested(IgnoredAny) => None,
        }
    }
}

struct ThemeVisitor;

impl<'de> Visitor<'de> for ThemeVisitor {
    type Value = CustomTheme;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a card theme")
    }

    // Stored rows: fields in declaration order.
    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<CustomTheme, A::Error> {
        let colors: ThemeColors = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let font_family: Option<String> = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        let layout: ThemeLayout = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(2, &self))?;
        let extra: BTreeMap<String, String> = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(3, &self))?;
        Ok(CustomTheme {
            colors,
            font_family,
            layout,
            extra,
        })
    }

    // Client payloads: unknown keys land in `extra`.
    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<CustomTheme, A::Error> {
        let mut theme = CustomTheme::default();
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "colors" => theme.colors = map.next_value()?,
                "fontFamily" => theme.font_family = map.next_value()?,
                "layout" => theme.layout = map.next_value()?,
                "extra" => {
                    let nested: BTreeMap<String, ExtraValue> = map.next_value()?;
                    theme.extra.extend(
                        nested
                            .into_iter()
                            .filter_map(|(k, v)| v.into_text().map(|text| (k, text))),
                    );
                }
                _ => {
                    if let Some(text) = map.next_value::<ExtraValue>()?.into_text() {
                        theme.extra.insert(key, text);
                    }
                }
            }
        }
        Ok(theme)
    }
}

impl<'de> Deserialize<'de> for CustomTheme {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_struct("CustomTheme", THEME_FIELDS, ThemeVisitor)
    }
}

// =============================================================================
// PAPER CARD SETTINGS
// =============================================================================

/// Page margins, in the settings' unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// Physical print settings of a card.
///
/// `bleed`, `safe_area` and `margins` are expressed in the effective unit of `size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaperCardSettings {
    pub size: PaperSize,
    pub orientation: Orientation,
    pub bleed: f64,
    pub safe_area: f64,
    /// Rasterization resolution for picture elements, in dots per inch.
    pub resolution: u32,
    pub margins: Margins,
}

impl Default for PaperCardSettings {
    /// A4 portrait, no bleed, no safe area, no margins, 300 dpi.
    fn default() -> Self {
        Self {
            size: PaperSize::named(NamedPaperSize::A4),
            orientation: Orientation::Portrait,
            bleed: 0.0,
            safe_area: 0.0,
            resolution: DEFAULT_RESOLUTION_DPI,
            margins: Margins::default(),
        }
    }
}

impl PaperCardSettings {
    /// Default settings on a custom paper size.
    #[must_use]
    pub fn custom(width: f64, height: f64, unit: LengthUnit) -> Self {
        Self {
            size: PaperSize::custom(width, height, unit),
            ..Self::default()
        }
    }
}

// =============================================================================
// BUSINESS CARD
// =============================================================================

/// A user's business card record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessCard {
    pub id: CardId,
    pub owner_id: OwnerId,
    pub name: String,
    pub job_title: Option<String>,
    pub company: Option<String>,
    /// Work phone.
    pub phone: Option<String>,
    pub personal_phone: Option<String>,
    /// Work email.
    pub email: Option<String>,
    pub personal_email: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub company_logo: Option<String>,
    pub profile_image: Option<String>,
    /// Network key (`linkedin`, `github`, ...) to profile URL.
    pub social_links: BTreeMap<String, String>,
    /// Weak reference to the bound layout.
    pub template_id: Option<TemplateId>,
    /// Per-card literal overrides keyed by element id.
    pub field_values: BTreeMap<ElementId, String>,
    pub custom_theme: Option<CustomTheme>,
    pub paper_card_settings: Option<PaperCardSettings>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Return `value` only when it carries visible text.
fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

impl BusinessCard {
    /// Create a card with an id, owner and display name.
    #[must_use]
    pub fn new(id: impl Into<String>, owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: CardId::new(id),
            owner_id: OwnerId::new(owner),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Bind the card to a template.
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template_id = Some(TemplateId::new(template));
        self
    }

    /// Current value of a registry field, if populated.
    #[must_use]
    pub fn field_value(&self, key: FieldKey) -> Option<&str> {
        match key {
            FieldKey::Name => Some(self.name.as_str()).filter(|v| !v.trim().is_empty()),
            FieldKey::JobTitle => non_empty(self.job_title.as_ref()),
            FieldKey::Company => non_empty(self.company.as_ref()),
            FieldKey::Phone => non_empty(self.phone.as_ref()),
            FieldKey::PersonalPhone => non_empty(self.personal_phone.as_ref()),
            FieldKey::WorkEmail => non_empty(self.email.as_ref()),
            FieldKey::PersonalEmail => non_empty(self.personal_email.as_ref()),
            FieldKey::Address => non_empty(self.address.as_ref()),
            FieldKey::Website => non_empty(self.website.as_ref()),
            FieldKey::CompanyLogo => non_empty(self.company_logo.as_ref()),
            FieldKey::ProfileImage => non_empty(self.profile_image.as_ref()),
            FieldKey::Social(network) => non_empty(self.social_links.get(network.as_str())),
        }
    }

    /// Populated social links, sorted by network key.
    pub fn populated_social_links(&self) -> impl Iterator<Item = (&str, &str)> {
        self.social_links
            .iter()
            .filter(|(_, url)| !url.trim().is_empty())
            .map(|(network, url)| (network.as_str(), url.as_str()))
    }

    /// Validate a card before it is stored.
    pub fn validate(&self) -> Result<(), CardError> {
        if self.id.as_str().trim().is_empty() {
            return Err(CardError::InvalidInput("card id is empty".to_string()));
        }
        let too_long = self
            .field_values
            .iter()
            .find(|(_, v)| v.len() > MAX_FIELD_VALUE_LENGTH);
        if let Some((element, _)) = too_long {
            return Err(CardError::InvalidInput(format!(
                "field value for element {} exceeds {} bytes",
                element, MAX_FIELD_VALUE_LENGTH
            )));
        }
        if let Some(settings) = &self.paper_card_settings {
            if settings.bleed < 0.0 || settings.safe_area < 0.0 {
                return Err(CardError::InvalidInput(
                    "bleed and safe area must not be negative".to_string(),
                ));
            }
            if settings.resolution == 0 {
                return Err(CardError::InvalidInput(
                    "resolution must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// CARD PATCH
// =============================================================================

/// A partial update of a card, as sent by the owner.
///
/// `None` leaves the field untouched. Template binding is removed with
/// `clear_template`, since `None` already means "unchanged".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardPatch {
    pub name: Option<String>,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub personal_phone: Option<String>,
    pub email: Option<String>,
    pub personal_email: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub company_logo: Option<String>,
    pub profile_image: Option<String>,
    pub social_links: Option<BTreeMap<String, String>>,
    pub template_id: Option<TemplateId>,
    pub clear_template: bool,
    /// Merged into the existing overrides; an empty value removes the entry.
    pub field_values: Option<BTreeMap<ElementId, String>>,
    pub custom_theme: Option<CustomTheme>,
    pub paper_card_settings: Option<PaperCardSettings>,
}

fn set_if(slot: &mut Option<String>, value: &Option<String>) {
    if let Some(v) = value {
        *slot = Some(v.clone());
    }
}

impl CardPatch {
    /// Apply the patch and stamp `updated_at`.
    pub fn apply(&self, card: &mut BusinessCard, now: Timestamp) {
        if let Some(name) = &self.name {
            card.name.clone_from(name);
        }
        set_if(&mut card.job_title, &self.job_title);
        set_if(&mut card.company, &self.company);
        set_if(&mut card.phone, &self.phone);
        set_if(&mut card.personal_phone, &self.personal_phone);
        set_if(&mut card.email, &self.email);
        set_if(&mut card.personal_email, &self.personal_email);
        set_if(&mut card.address, &self.address);
        set_if(&mut card.website, &self.website);
        set_if(&mut card.company_logo, &self.company_logo);
        set_if(&mut card.profile_image, &self.profile_image);
        if let Some(links) = &self.social_links {
            card.social_links.clone_from(links);
        }
        if self.clear_template {
            card.template_id = None;
        } else if let Some(template) = &self.template_id {
            card.template_id = Some(template.clone());
        }
        if let Some(values) = &self.field_values {
            for (element, value) in values {
                if value.is_empty() {
                    card.field_values.remove(element);
                } else {
                    card.field_values.insert(element.clone(), value.clone());
                }
            }
        }
        if let Some(theme) = &self.custom_theme {
            card.custom_theme = Some(theme.clone());
        }
        if let Some(settings) = &self.paper_card_settings {
            card.paper_card_settings = Some(settings.clone());
        }
        card.updated_at = now;
    }
}

// =============================================================================
// TESTS
// =============================================================================
