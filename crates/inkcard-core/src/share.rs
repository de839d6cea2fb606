//! Public share link of a card.
//!
//! The returned string is the whole QR payload. Encoding it into a symbol is
//! left to an external QR encoder.

use crate::CardId;

/// Path prefix of public card pages.
pub const PUBLIC_CARD_PATH: &str = "card";

/// `<site_base>/card/<card_id>`, with trailing slashes on the base trimmed.
#[must_use]
pub fn share_url(site_base: &str, card_id: &CardId) -> String {
    format!(
        "{}/{PUBLIC_CARD_PATH}/{}",
        site_base.trim().trim_end_matches('/'),
        card_id
    )
}
