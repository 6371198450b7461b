//! Navigation policy for the embedded surface.
//!
//! The shell hosts a small family of cooperating web applications. A URL whose
//! text contains one of the allow-listed hosts loads in-surface; anything else
//! is handed to the system browser so the shell never becomes a general
//! browsing surface.
//!
//! The policy also classifies page-load failures: timeouts and host-lookup
//! failures are treated as transient mobile-network hiccups and trigger a
//! reload after [`RELOAD_DELAY`]; every other failure is logged and left to
//! the surface's default error page.

use std::time::Duration;

/// Hosts of the cooperating web applications.
pub const ALLOWED_HOSTS: [&str; 3] = [
    "no-due-generator-app.vercel.app",
    "dynamit-learn.vercel.app",
    "it-panel-beta.vercel.app",
];

/// Delay before reloading after a transient load failure.
pub const RELOAD_DELAY: Duration = Duration::from_millis(3000);

/// Where a candidate URL should load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    /// Load inside the embedded surface.
    InSurface,
    /// Hand the URL to the host (system browser).
    DeferToHost,
}

/// Allow-list of navigable applications.
#[derive(Debug, Clone, Copy)]
pub struct NavigationPolicy {
    allowed_hosts: &'static [&'static str],
}

impl NavigationPolicy {
    pub const fn new(allowed_hosts: &'static [&'static str]) -> Self {
        Self { allowed_hosts }
    }

    /// Decides where `url` loads. Matching is a plain substring check against
    /// the full URL text, so an allow-listed host appearing anywhere in the
    /// URL keeps the navigation in-surface.
    pub fn decide(&self, url: &str) -> NavigationDecision {
        if self.allowed_hosts.iter().any(|host| url.contains(host)) {
            NavigationDecision::InSurface
        } else {
            NavigationDecision::DeferToHost
        }
    }
}

impl Default for NavigationPolicy {
    fn default() -> Self {
        Self::new(&ALLOWED_HOSTS)
    }
}

/// Why a page load failed, as reported by the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    /// The connection timed out.
    Timeout,
    /// The server hostname could not be resolved.
    HostLookup,
    /// The server refused or dropped the connection.
    Connect,
    /// The URL was malformed.
    BadUrl,
    /// Anything the surface reports that the shell has no special handling for.
    Other,
}

impl LoadErrorKind {
    /// Transient failures are worth an automatic reload; the rest are not.
    pub fn is_transient(self) -> bool {
        matches!(self, LoadErrorKind::Timeout | LoadErrorKind::HostLookup)
    }
}
