//! # Field Registry
//!
//! The closed set of semantic fields a template element may bind to.
//!
//! Templates store bindings as loose strings (`"name"`, `"socialLinks.linkedin"`).
//! They are parsed once into a [`FieldRef`]: either a [`FieldKey`] from the
//! registry, or an `Unknown` bucket that is preserved verbatim for forward
//! compatibility but never interpreted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of social-link field paths.
const SOCIAL_PREFIX: &str = "socialLinks.";

// =============================================================================
// SOCIAL NETWORKS
// =============================================================================

/// Social networks the registry knows how to bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialNetwork {
    Linkedin,
    Twitter,
    Facebook,
    Instagram,
    Github,
    Youtube,
    Tiktok,
    Line,
    Whatsapp,
}

impl SocialNetwork {
    /// Every known network, in registry order.
    pub const ALL: [SocialNetwork; 9] = [
        Self::Linkedin,
        Self::Twitter,
        Self::Facebook,
        Self::Instagram,
        Self::Github,
        Self::Youtube,
        Self::Tiktok,
        Self::Line,
        Self::Whatsapp,
    ];

    /// Key used in the card's `socialLinks` map.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linkedin => "linkedin",
            Self::Twitter => "twitter",
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
            Self::Github => "github",
            Self::Youtube => "youtube",
            Self::Tiktok => "tiktok",
            Self::Line => "line",
            Self::Whatsapp => "whatsapp",
        }
    }

    /// Parse a `socialLinks` key. Case-insensitive; `x` is an alias for twitter.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "x" {
            return Some(Self::Twitter);
        }
        Self::ALL.into_iter().find(|n| n.as_str() == lower)
    }
}

// =============================================================================
// FIELD KEYS
// =============================================================================

/// How a field's value should be interpreted by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Phone,
    Email,
    Url,
}

/// A semantic contact attribute from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKey {
    Name,
    JobTitle,
    Company,
    /// Work phone.
    Phone,
    PersonalPhone,
    WorkEmail,
    PersonalEmail,
    Address,
    Website,
    CompanyLogo,
    ProfileImage,
    Social(SocialNetwork),
}

impl FieldKey {
    /// Every non-social key, in registry order.
    pub const SCALARS: [FieldKey; 11] = [
        Self::Name,
        Self::JobTitle,
        Self::Company,
        Self::Phone,
        Self::PersonalPhone,
        Self::WorkEmail,
        Self::PersonalEmail,
        Self::Address,
        Self::Website,
        Self::CompanyLogo,
        Self::ProfileImage,
    ];

    /// Value kind carried by this field.
    #[must_use]
    pub const fn kind(self) -> FieldKind {
        match self {
            Self::Name | Self::JobTitle | Self::Company | Self::Address => FieldKind::Text,
            Self::Phone | Self::PersonalPhone => FieldKind::Phone,
            Self::WorkEmail | Self::PersonalEmail => FieldKind::Email,
            Self::Website | Self::CompanyLogo | Self::ProfileImage | Self::Social(_) => {
                FieldKind::Url
            }
        }
    }

    /// Canonical field path as written in templates.
    #[must_use]
    pub fn path(self) -> String {
        match self {
            Self::Name => "name".to_string(),
            Self::JobTitle => "jobTitle".to_string(),
            Self::Company => "company".to_string(),
            Self::Phone => "phone".to_string(),
            Self::PersonalPhone => "personalPhone".to_string(),
            Self::WorkEmail => "workEmail".to_string(),
            Self::PersonalEmail => "personalEmail".to_string(),
            Self::Address => "address".to_string(),
            Self::Website => "website".to_string(),
            Self::CompanyLogo => "companyLogo".to_string(),
            Self::ProfileImage => "profileImage".to_string(),
            Self::Social(network) => format!("{SOCIAL_PREFIX}{}", network.as_str()),
        }
    }

    /// Parse a field path, accepting the aliases older templates use.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.trim();
        if let Some(network) = path.strip_prefix(SOCIAL_PREFIX) {
            return SocialNetwork::parse(network).map(Self::Social);
        }
        let key = match path {
            "name" | "fullName" => Self::Name,
            "jobTitle" | "title" | "position" => Self::JobTitle,
            "company" | "organization" => Self::Company,
            "phone" | "workPhone" => Self::Phone,
            "personalPhone" | "mobile" => Self::PersonalPhone,
            "email" | "workEmail" => Self::WorkEmail,
            "personalEmail" => Self::PersonalEmail,
            "address" => Self::Address,
            "website" | "url" => Self::Website,
            "companyLogo" | "logo" => Self::CompanyLogo,
            "profileImage" | "avatar" | "photo" => Self::ProfileImage,
            _ => return None,
        };
        Some(key)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

// =============================================================================
// FIELD REFERENCE
// =============================================================================

/// A template element's field binding after parsing.
///
/// Serializes back to the original path string, so unknown bindings survive
/// a load/store round trip untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldRef {
    Known(FieldKey),
    Unknown(String),
}

impl FieldRef {
    /// Parse a binding path.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        match FieldKey::parse(path) {
            Some(key) => Self::Known(key),
            None => Self::Unknown(path.to_string()),
        }
    }
}

impl From<FieldKey> for FieldRef {
    fn from(key: FieldKey) -> Self {
        Self::Known(key)
    }
}

impl From<String> for FieldRef {
    fn from(path: String) -> Self {
        match FieldKey::parse(&path) {
            Some(key) => Self::Known(key),
            None => Self::Unknown(path),
        }
    }
}

impl From<FieldRef> for String {
    fn from(field: FieldRef) -> Self {
        match field {
            FieldRef::Known(key) => key.path(),
            FieldRef::Unknown(path) => path,
        }
    }
}

/// True when `value` can be used as an image or link location.
///
/// Accepts absolute http(s) URLs, inline image data URLs and site-relative
/// paths (uploaded assets are served from the same origin).
#[must_use]
pub fn is_url_like(value: &str) -> bool {
    let v = value.trim();
    if v.chars().any(char::is_whitespace) {
        return false;
    }
    let lower = v.to_ascii_lowercase();
    (lower.starts_with("https://") && lower.len() > "https://".len())
        || (lower.starts_with("http://") && lower.len() > "http://".len())
        || lower.starts_with("data:image/")
        || (v.starts_with('/') && !v.starts_with("//") && v.len() > 1)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_scalar_path_parses_back() {
        for key in FieldKey::SCALARS {
            assert_eq!(FieldKey::parse(&key.path()), Some(key));
        }
        for network in SocialNetwork::ALL {
            let key = FieldKey::Social(network);
            assert_eq!(FieldKey::parse(&key.path()), Some(key));
        }
    }

    #[test]
    fn aliases_resolve_to_registry_keys() {
        assert_eq!(FieldKey::parse("email"), Some(FieldKey::WorkEmail));
        assert_eq!(FieldKey::parse("workPhone"), Some(FieldKey::Phone));
        assert_eq!(
            FieldKey::parse("socialLinks.X"),
            Some(FieldKey::Social(SocialNetwork::Twitter))
        );
    }

    #[test]
    fn unknown_paths_are_preserved() {
        let field = FieldRef::parse("socialLinks.mastodon");
        assert_eq!(field, FieldRef::Unknown("socialLinks.mastodon".to_string()));
        assert_eq!(String::from(field), "socialLinks.mastodon");
    }

    #[test]
    fn field_ref_serde_uses_plain_strings() {
        let field: FieldRef = serde_json::from_str("\"jobTitle\"").expect("parse");
        assert_eq!(field, FieldRef::Known(FieldKey::JobTitle));
        let json = serde_json::to_string(&FieldRef::Known(FieldKey::Social(
            SocialNetwork::Github,
        )))
        .expect("serialize");
        assert_eq!(json, "\"socialLinks.github\"");
    }

    #[test]
    fn field_kinds() {
        assert_eq!(FieldKey::Name.kind(), FieldKind::Text);
        assert_eq!(FieldKey::CompanyLogo.kind(), FieldKind::Url);
        assert_eq!(FieldKey::WorkEmail.kind(), FieldKind::Email);
    }

    #[test]
    fn url_like_detection() {
        assert!(is_url_like("https://cdn.example.com/logo.png"));
        assert!(is_url_like("/uploads/logo.png"));
        assert!(is_url_like("data:image/png;base64,AAAA"));
        assert!(!is_url_like("Acme Corp"));
        assert!(!is_url_like("https://"));
        assert!(!is_url_like("//evil.example.com/x.png"));
        assert!(!is_url_like("https://example.com/a b.png"));
    }
}
