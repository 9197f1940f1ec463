//! Session-expiry detection
//!
//! The site does not document how it signals a dead session. The detector
//! treats three signals as expiry, each configurable:
//!
//! 1. any redirect (the client never follows redirects on the capacity view,
//!    and the site bounces stale sessions to its landing page)
//! 2. an auth-flavoured HTTP status (401, 403, 419, 440)
//! 3. a known marker in the body, such as CodeIgniter's
//!    "The action you have requested is not allowed" page

use serde::{Deserialize, Serialize};

/// Statuses that mean the session is no longer accepted
pub const DEFAULT_EXPIRED_STATUSES: &[u16] = &[401, 403, 419, 440];

/// Body fragments that mean the session is no longer accepted
pub const DEFAULT_BODY_MARKERS: &[&str] = &[
    "The action you have requested is not allowed",
    "session expired",
    "sesi telah berakhir",
    "sesi anda telah habis",
];

/// Configurable detector for session-expiry responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiryDetector {
    /// Treat any 3xx as expiry
    pub redirect_means_expired: bool,
    /// HTTP statuses treated as expiry
    pub statuses: Vec<u16>,
    /// Case-insensitive body fragments treated as expiry
    pub body_markers: Vec<String>,
}

impl Default for ExpiryDetector {
    fn default() -> Self {
        Self {
            redirect_means_expired: true,
            statuses: DEFAULT_EXPIRED_STATUSES.to_vec(),
            body_markers: DEFAULT_BODY_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl ExpiryDetector {
    /// Add a body marker
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.body_markers.push(marker.into());
        self
    }

    /// Check the response status; returns the reason when it signals expiry
    pub fn check_status(&self, status: u16, location: Option<&str>) -> Option<String> {
        if self.redirect_means_expired && (300..400).contains(&status) {
            return Some(format!(
                "redirected (HTTP {}) to {}",
                status,
                location.unwrap_or("<no location>")
            ));
        }
        if self.statuses.contains(&status) {
            return Some(format!("server answered HTTP {}", status));
        }
        None
    }

    /// Check the response body; returns the reason when it signals expiry
    pub fn check_body(&self, body: &str) -> Option<String> {
        let lower = body.to_lowercase();
        self.body_markers
            .iter()
            .find(|marker| lower.contains(&marker.to_lowercase()))
            .map(|marker| format!("response contains '{}'", marker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_is_expiry() {
        let detector = ExpiryDetector::default();
        let reason = detector.check_status(302, Some("https://bromotenggersemeru.id/"));
        assert!(reason.unwrap().contains("302"));
        assert!(detector.check_status(301, None).is_some());
    }

    #[test]
    fn test_redirect_can_be_disabled() {
        let detector = ExpiryDetector {
            redirect_means_expired: false,
            ..Default::default()
        };
        assert!(detector.check_status(302, None).is_none());
    }

    #[test]
    fn test_auth_statuses_are_expiry() {
        let detector = ExpiryDetector::default();
        for status in [401, 403, 419, 440] {
            assert!(detector.check_status(status, None).is_some(), "{}", status);
        }
        assert!(detector.check_status(200, None).is_none());
        assert!(detector.check_status(500, None).is_none());
    }

    #[test]
    fn test_body_markers_case_insensitive() {
        let detector = ExpiryDetector::default();
        let body = "<h1>An Error Was Encountered</h1><p>The action you have requested is NOT allowed.</p>";
        assert!(detector.check_body(body).is_some());
        assert!(detector.check_body("<table><tbody></tbody></table>").is_none());
    }

    #[test]
    fn test_custom_marker() {
        let detector = ExpiryDetector::default().with_marker("silakan login");
        assert!(detector.check_body("<p>Silakan LOGIN kembali</p>").is_some());
    }
}
