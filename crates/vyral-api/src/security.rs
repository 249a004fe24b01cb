//! Webhook URL validation.
//!
//! Webhooks are delivered from inside the service network, so a caller
//! supplied URL is checked before the job runs (SSRF protection). Loopback,
//! private, link-local and cloud metadata targets are rejected unless
//! `allow_private` is set.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;
use url::{Host, Url};

/// Maximum URL length to prevent DoS attacks.
const MAX_URL_LENGTH: usize = 2048;

/// Hostnames that resolve to internal services.
static BLOCKED_HOSTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^localhost$",
        r"\.localhost$",
        r"^metadata\.",
        r"^metadata\.google\.internal$",
        r"\.internal$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid host pattern"))
    .collect()
});

/// Result of URL validation.
#[derive(Debug, PartialEq, Eq)]
pub enum UrlValidationResult {
    /// URL is valid and allowed.
    Valid(String),
    /// URL is malformed or uses an unsupported protocol.
    Invalid(String),
    /// URL targets an internal or restricted endpoint.
    Blocked(String),
    /// URL exceeds maximum length.
    TooLong,
}

impl UrlValidationResult {
    /// Convert to Result for easy error handling.
    pub fn into_result(self) -> Result<String, String> {
        match self {
            Self::Valid(url) => Ok(url),
            Self::Invalid(msg) => Err(format!("Invalid webhook_url: {msg}")),
            Self::Blocked(reason) => Err(format!("Invalid webhook_url: {reason}")),
            Self::TooLong => Err(format!(
                "Invalid webhook_url: URL exceeds maximum length of {} characters",
                MAX_URL_LENGTH
            )),
        }
    }
}

/// Validate a webhook URL.
pub fn validate_webhook_url(url: &str, allow_private: bool) -> UrlValidationResult {
    if url.len() > MAX_URL_LENGTH {
        return UrlValidationResult::TooLong;
    }

    let url = url.trim();
    if url.is_empty() {
        return UrlValidationResult::Invalid("URL cannot be empty".to_string());
    }

    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(e) => return UrlValidationResult::Invalid(format!("Invalid URL format: {}", e)),
    };

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return UrlValidationResult::Invalid(format!(
                "Invalid protocol '{}'. Only HTTP and HTTPS are allowed.",
                scheme
            ))
        }
    }

    let host = match parsed.host() {
        Some(host) => host,
        None => return UrlValidationResult::Invalid("URL must have a valid host".to_string()),
    };

    if !allow_private && is_restricted_host(&host) {
        warn!(url = %url, "Blocked webhook URL targeting a restricted host");
        return UrlValidationResult::Blocked(
            "URL appears to target an internal or restricted endpoint".to_string(),
        );
    }

    UrlValidationResult::Valid(url.to_string())
}

fn is_restricted_host(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(domain) => {
            let domain = domain.to_lowercase();
            BLOCKED_HOSTS.iter().any(|pattern| pattern.is_match(&domain))
        }
        Host::Ipv4(ip) => is_restricted_ipv4(ip),
        Host::Ipv6(ip) => is_restricted_ipv6(ip),
    }
}

fn is_restricted_ipv4(ip: &Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        // 100.64.0.0/10 carrier-grade NAT
        || (ip.octets()[0] == 100 && (ip.octets()[1] & 0xc0) == 64)
}

fn is_restricted_ipv6(ip: &Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_restricted_ipv4(&v4);
    }
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
}
