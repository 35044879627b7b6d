//! Utility functions
//!
//! Time conversion plus string helpers used when provider responses or
//! secrets end up in error messages and log lines.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch; times before the epoch clamp to zero.
#[inline]
#[must_use]
pub fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

/// Safely truncate a string at a UTF-8 character boundary.
///
/// Returns a slice of at most `max_bytes` bytes, ensuring the result
/// is valid UTF-8 by finding the last valid character boundary.
///
/// # Example
/// ```
/// use uploader_oauth::utils::safe_truncate;
///
/// // Emoji is 4 bytes - truncating at byte 10 would cut it in half
/// let text = "Status: 🔍 Active";
/// let result = safe_truncate(text, 10);
/// assert_eq!(result, "Status: "); // Stops before the emoji
/// ```
#[inline]
#[must_use]
pub fn safe_truncate(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }

    let mut boundary = max_bytes;
    while boundary > 0 && !s.is_char_boundary(boundary) {
        boundary -= 1;
    }

    &s[..boundary]
}

/// Truncate a string for display with ellipsis.
///
/// Used to keep provider response bodies short inside error messages.
///
/// # Example
/// ```
/// use uploader_oauth::utils::truncate_for_display;
///
/// let text = "<html>Service Unavailable</html>";
/// assert_eq!(truncate_for_display(text, 6), "<html>...");
/// ```
#[must_use]
pub fn truncate_for_display(s: &str, max_bytes: usize) -> String {
    let truncated = safe_truncate(s, max_bytes);
    if truncated.len() < s.len() {
        format!("{truncated}...")
    } else {
        truncated.to_string()
    }
}

/// Mask a secret for log output, keeping only a short prefix.
///
/// # Example
/// ```
/// use uploader_oauth::utils::redact;
///
/// assert_eq!(redact("abcdef123456"), "abcd****");
/// assert_eq!(redact("abc"), "****");
/// ```
#[must_use]
pub fn redact(secret: &str) -> String {
    const VISIBLE: usize = 4;
    if secret.len() <= VISIBLE {
        return "****".to_string();
    }
    format!("{}****", safe_truncate(secret, VISIBLE))
}
