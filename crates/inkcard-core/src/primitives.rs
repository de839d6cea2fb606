//! # Engine Primitives
//!
//! Hardcoded constants for the Inkcard engine.
//!
//! These values are compiled into the binary and are immutable at runtime.
//! Configurable knobs (dedup window, store timeout) take their defaults from
//! here and may be overridden by the app layer.

// =============================================================================
// UNIT CONVERSION (canonical unit: PostScript points)
// =============================================================================

/// Points per millimetre.
pub const POINTS_PER_MM: f64 = 2.8346;

/// Points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Points per CSS pixel (96 px = 72 pt).
pub const POINTS_PER_PX: f64 = 0.75;

/// Default rasterization resolution for picture elements.
pub const DEFAULT_RESOLUTION_DPI: u32 = 300;

/// Tolerance used when comparing point-space coordinates.
pub const GEOMETRY_EPSILON: f64 = 1e-6;

// =============================================================================
// CONTACT EXPORT
// =============================================================================

/// Name emitted in `FN` when the card has no name.
pub const PLACEHOLDER_NAME: &str = "Unnamed Contact";

/// vCard version emitted by the formatter.
pub const VCARD_VERSION: &str = "3.0";

/// MIME type of the contact payload.
pub const VCARD_MIME_TYPE: &str = "text/vcard; charset=utf-8";

/// Line terminator required by strict address-book parsers.
pub const CRLF: &str = "\r\n";

// =============================================================================
// VIEW LEDGER
// =============================================================================

/// Rolling window in which repeat views by the same viewer collapse.
///
/// Absorbs duplicate client-side effect firing without merging distinct
/// visits from the same network address.
pub const DEFAULT_VIEW_WINDOW_MS: u64 = 5_000;

/// Viewer identity recorded when the caller cannot supply one.
pub const ANONYMOUS_VIEWER: &str = "anonymous";

/// Milliseconds in a UTC day.
pub const MILLIS_PER_DAY: u64 = 86_400_000;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum number of elements accepted in a single template.
pub const MAX_TEMPLATE_ELEMENTS: usize = 512;

/// Maximum length of a single field value or element content string.
pub const MAX_FIELD_VALUE_LENGTH: usize = 4096;

/// Maximum length of the device-info string stored with a view.
pub const MAX_DEVICE_INFO_LENGTH: usize = 512;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_window_is_five_seconds() {
        assert_eq!(DEFAULT_VIEW_WINDOW_MS, 5_000);
    }

    #[test]
    fn crlf_is_two_bytes() {
        assert_eq!(CRLF.as_bytes(), b"\r\n");
    }
}
