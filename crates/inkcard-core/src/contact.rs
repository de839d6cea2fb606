//! # Contact Export Formatter
//!
//! Serializes a [`BusinessCard`] into a vCard 3.0 payload.
//!
//! Address-book importers are strict parsers, so the output always:
//! - uses CRLF line terminators,
//! - starts with exactly one `BEGIN:VCARD` and ends with exactly one
//!   `END:VCARD`, whatever the card contains.
//!
//! Empty fields are omitted. `FN` is mandatory and falls back to
//! [`PLACEHOLDER_NAME`].

use serde::{Deserialize, Serialize};

use crate::fields::FieldKey;
use crate::model::BusinessCard;
use crate::primitives::{CRLF, PLACEHOLDER_NAME, VCARD_MIME_TYPE, VCARD_VERSION};

const BEGIN: &str = "BEGIN:VCARD";
const END: &str = "END:VCARD";

/// A downloadable contact file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPayload {
    pub text: String,
    /// Suggested download name, e.g. `anan-srisuk.vcf`.
    pub file_name: String,
    pub mime_type: String,
}

/// Escape a property value: backslash, comma, semicolon and line breaks.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.trim().chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            ',' => out.push_str("\\,"),
            ';' => out.push_str("\\;"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\\n");
            }
            '\n' => out.push_str("\\n"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

/// Split a display name into (family, given) for the `N` property.
fn split_name(name: &str) -> (&str, &str) {
    match name.trim().rsplit_once(char::is_whitespace) {
        Some((given, family)) => (family.trim(), given.trim()),
        None => (name.trim(), ""),
    }
}

fn file_stem(name: &str) -> String {
    let mut slug = String::new();
    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "contact".to_string()
    } else {
        slug.to_string()
    }
}

struct Lines(String);

impl Lines {
    fn push(&mut self, line: &str) {
        self.0.push_str(line);
        self.0.push_str(CRLF);
    }

    fn property(&mut self, name: &str, value: Option<&str>) {
        if let Some(value) = value.map(escape).filter(|v| !v.is_empty()) {
            self.push(&format!("{name}:{value}"));
        }
    }
}

/// Format a card as a vCard 3.0 contact payload.
#[must_use]
pub fn format_contact(card: &BusinessCard) -> ContactPayload {
    let name = escape(&card.name);
    let display_name = if name.is_empty() {
        PLACEHOLDER_NAME.to_string()
    } else {
        name
    };

    let mut lines = Lines(String::new());
    lines.push(BEGIN);
    lines.push(&format!("VERSION:{VCARD_VERSION}"));
    lines.push(&format!("FN:{display_name}"));

    let (family, given) = if card.name.trim().is_empty() {
        (PLACEHOLDER_NAME, "")
    } else {
        split_name(&card.name)
    };
    lines.push(&format!("N:{};{};;;", escape(family), escape(given)));

    lines.property("ORG", card.field_value(FieldKey::Company));
    lines.property("TITLE", card.field_value(FieldKey::JobTitle));
    lines.property("TEL;TYPE=WORK", card.field_value(FieldKey::Phone));
    lines.property("TEL;TYPE=CELL", card.field_value(FieldKey::PersonalPhone));
    let email = card
        .field_value(FieldKey::WorkEmail)
        .or_else(|| card.field_value(FieldKey::PersonalEmail));
    lines.property("EMAIL", email);
    if let Some(address) = card.field_value(FieldKey::Address) {
        lines.push(&format!("ADR;TYPE=WORK:;;{};;;;", escape(address)));
    }
    lines.property("URL", card.field_value(FieldKey::Website));
    for (_, url) in card.populated_social_links() {
        lines.property("URL", Some(url));
    }
    lines.push(END);

    ContactPayload {
        text: lines.0,
        file_name: format!("{}.vcf", file_stem(&card.name)),
        mime_type: VCARD_MIME_TYPE.to_string(),
    }
}

/// Repair a vCard produced elsewhere.
///
/// Line endings become CRLF, blank lines and stray `BEGIN`/`END` markers are
/// dropped, and the result is wrapped in exactly one `BEGIN:VCARD` and one
/// `END:VCARD`. A missing `VERSION` line is added.
#[must_use]
pub fn normalize_vcard(raw: &str) -> String {
    let body: Vec<&str> = raw
        .split(['\r', '\n'])
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .filter(|line| {
            let upper = line.trim().to_ascii_uppercase();
            upper != BEGIN && upper != END
        })
        .collect();

    let mut lines = Lines(String::new());
    lines.push(BEGIN);
    if !body
        .iter()
        .any(|line| line.to_ascii_uppercase().starts_with("VERSION:"))
    {
        lines.push(&format!("VERSION:{VCARD_VERSION}"));
    }
    for line in body {
        lines.push(line);
    }
    lines.push(END);
    lines.0
}

// =============================================================================
// TESTS
// =============================================================================
