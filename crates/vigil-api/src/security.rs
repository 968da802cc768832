//! Source URL validation (SSRF protection).
//!
//! Footage is fetched server-side, so the source URL must not point the
//! server at itself, its private network, or cloud metadata endpoints unless
//! private sources are explicitly enabled.

use std::net::IpAddr;
use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::warn;
use url::{Host, Url};

/// Maximum URL length to prevent DoS attacks.
pub const MAX_URL_LENGTH: usize = 2048;

/// Redirect hops followed when fetching footage.
pub const MAX_REDIRECTS: usize = 5;

/// Blocked URL patterns (internal hosts and metadata endpoints).
static BLOCKED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^https?://127\.",
        r"^https?://localhost",
        r"^https?://0\.0\.0\.0",
        r"^https?://10\.",
        r"^https?://172\.(1[6-9]|2[0-9]|3[0-1])\.",
        r"^https?://192\.168\.",
        r"^https?://169\.254\.",
        r"^https?://\[::1\]",
        r"^https?://\[fd",
        r"^https?://\[fe80",
        r"^https?://metadata\.",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Outcome of source URL validation.
#[derive(Debug, PartialEq, Eq)]
pub enum UrlValidationResult {
    /// URL is valid and allowed.
    Valid(Url),
    /// URL is malformed or uses an unsupported protocol.
    Invalid(String),
    /// URL host is not in the configured allowlist.
    HostNotAllowed(String),
    /// URL targets an internal or restricted endpoint.
    Blocked,
    /// URL exceeds maximum length.
    TooLong,
}

impl UrlValidationResult {
    /// Convert to Result for easy error handling.
    pub fn into_result(self) -> Result<Url, String> {
        match self {
            Self::Valid(url) => Ok(url),
            Self::Invalid(msg) => Err(msg),
            Self::HostNotAllowed(host) => Err(format!("Source host '{}' is not allowed", host)),
            Self::Blocked => {
                Err("URL appears to target an internal or restricted endpoint".to_string())
            }
            Self::TooLong => Err(format!(
                "URL exceeds maximum length of {} characters",
                MAX_URL_LENGTH
            )),
        }
    }
}

/// Policy for which footage sources may be fetched.
#[derive(Debug, Clone, Default)]
pub struct SourcePolicy {
    /// Allowed hosts (lowercase); empty allows any host
    pub allowed_hosts: Vec<String>,
    /// Skip the internal-address checks
    pub allow_private: bool,
}

impl SourcePolicy {
    /// Validate a footage source URL.
    pub fn validate(&self, url: &str) -> UrlValidationResult {
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
            Some(h) => h,
            None => return UrlValidationResult::Invalid("URL must have a valid host".to_string()),
        };

        if !self.allow_private && (is_internal_host(&host) || matches_blocked_pattern(url)) {
            warn!(url = %url, "Blocked source URL");
            return UrlValidationResult::Blocked;
        }

        let host_name = host.to_string().to_lowercase();
        if !self.is_host_allowed(&host_name) {
            return UrlValidationResult::HostNotAllowed(host_name);
        }

        UrlValidationResult::Valid(parsed)
    }

    /// Redirect policy that re-validates every hop against this policy.
    ///
    /// A hop that fails validation aborts the request, so a permitted source
    /// cannot bounce the download onto an internal address.
    pub fn redirect_policy(&self) -> reqwest::redirect::Policy {
        let policy = self.clone();
        reqwest::redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                return attempt.error(format!("Stopped after {} redirects", MAX_REDIRECTS));
            }

            match policy.validate(attempt.url().as_str()).into_result() {
                Ok(_) => attempt.follow(),
                Err(reason) => attempt.error(format!("Redirect rejected: {}", reason)),
            }
        })
    }

    /// Exact match or any subdomain of an allowed host.
    fn is_host_allowed(&self, host: &str) -> bool {
        if self.allowed_hosts.is_empty() {
            return true;
        }
        self.allowed_hosts.iter().any(|allowed| {
            host == allowed
                || host
                    .strip_suffix(allowed.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

fn matches_blocked_pattern(url: &str) -> bool {
    let lower = url.to_lowercase();
    BLOCKED_PATTERNS.iter().any(|p| p.is_match(&lower))
}

fn is_internal_host(host: &Host<&str>) -> bool {
    let ip = match host {
        Host::Ipv4(ip) => IpAddr::V4(*ip),
        Host::Ipv6(ip) => IpAddr::V6(*ip),
        Host::Domain(domain) => {
            let domain = domain.to_lowercase();
            return domain == "localhost"
                || domain.ends_with(".localhost")
                || domain.ends_with(".internal");
        }
    };

    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00 // unique local
                || (first & 0xffc0) == 0xfe80 // link local
                || v6.to_ipv4_mapped().is_some_and(|v4| {
                    v4.is_loopback() || v4.is_private() || v4.is_link_local()
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_urls_allowed_by_default() {
        let policy = SourcePolicy::default();
        assert!(matches!(
            policy.validate("https://cdn.example.com/cam1/2024-05-01.mp4"),
            UrlValidationResult::Valid(_)
        ));
    }

    #[test]
    fn test_internal_urls_blocked() {
        let policy = SourcePolicy::default();
        for url in [
            "http://127.0.0.1:8080/footage.mp4",
            "http://localhost/footage.mp4",
            "http://10.0.0.12/footage.mp4",
            "http://192.168.1.20/footage.mp4",
            "http://169.254.169.254/latest/meta-data",
            "http://[::1]/footage.mp4",
            "http://metadata.google.internal/computeMetadata",
        ] {
            assert_eq!(policy.validate(url), UrlValidationResult::Blocked, "{url}");
        }
    }

    #[test]
    fn test_private_sources_can_be_enabled() {
        let policy = SourcePolicy {
            allow_private: true,
            ..Default::default()
        };
        assert!(matches!(
            policy.validate("http://192.168.1.20/footage.mp4"),
            UrlValidationResult::Valid(_)
        ));
    }

    #[test]
    fn test_invalid_protocol() {
        let policy = SourcePolicy::default();
        assert!(matches!(
            policy.validate("file:///etc/passwd"),
            UrlValidationResult::Invalid(_)
        ));
        assert!(matches!(policy.validate("   "), UrlValidationResult::Invalid(_)));
    }

    #[test]
    fn test_allowlist() {
        let policy = SourcePolicy {
            allowed_hosts: vec!["footage.example.com".to_string()],
            allow_private: false,
        };
        assert!(matches!(
            policy.validate("https://footage.example.com/a.mp4"),
            UrlValidationResult::Valid(_)
        ));
        assert!(matches!(
            policy.validate("https://eu.footage.example.com/a.mp4"),
            UrlValidationResult::Valid(_)
        ));
        assert_eq!(
            policy.validate("https://evilfootage.example.com/a.mp4"),
            UrlValidationResult::HostNotAllowed("evilfootage.example.com".to_string())
        );
    }

    fn loopback_only() -> SourcePolicy {
        SourcePolicy {
            allowed_hosts: vec!["127.0.0.1".to_string()],
            allow_private: true,
        }
    }

    #[tokio::test]
    async fn test_redirect_to_disallowed_host_is_refused() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        let target = format!("http://localhost:{}/latest/meta-data", server.address().port());
        Mock::given(method("GET"))
            .and(path("/cam.mp4"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", target.as_str()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/latest/meta-data"))
            .respond_with(ResponseTemplate::new(200).set_body_string("SECRET"))
            .expect(0)
            .mount(&server)
            .await;

        let client = reqwest::Client::builder()
            .redirect(loopback_only().redirect_policy())
            .build()
            .unwrap();

        let err = client
            .get(format!("{}/cam.mp4", server.uri()))
            .send()
            .await
            .unwrap_err();
        assert!(err.is_redirect());
    }

    #[tokio::test]
    async fn test_redirect_within_policy_is_followed() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old.mp4"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", format!("{}/new.mp4", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_string("footage"))
            .mount(&server)
            .await;

        let client = reqwest::Client::builder()
            .redirect(loopback_only().redirect_policy())
            .build()
            .unwrap();

        let response = client
            .get(format!("{}/old.mp4", server.uri()))
            .send()
            .await
            .unwrap();
        assert_eq!(response.text().await.unwrap(), "footage");
    }

    #[test]
    fn test_too_long() {
        let url = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert_eq!(SourcePolicy::default().validate(&url), UrlValidationResult::TooLong);
    }
}
