//! Organization hint extraction from request metadata.

use super::config::ResolverConfig;
use super::request::RequestHandle;
use axum::http::HeaderName;

/// Derives an organization hint (slug) from request metadata.
///
/// Extraction is synchronous and must not touch storage.
pub trait OrgHintExtractor: Send + Sync {
    /// Return the hint for `request`, or `None` if the request carries none.
    fn extract_org_hint(&self, request: &RequestHandle) -> Option<String>;
}

/// Default hint extractor.
///
/// Checks the hint header first, then the subdomain of the `Host` header
/// directly under the configured base domain. Hints are trimmed and
/// lowercased. `www` and the bare base domain yield no hint.
///
/// # Example
///
/// ```rust
/// use pinpoint_auth::context::{OrgHintExtractor, RequestHandle, SubdomainHintExtractor};
///
/// let extractor = SubdomainHintExtractor::new().base_domain("pinpoint.app");
///
/// let request = RequestHandle::builder().host("Acme.pinpoint.app:443").build();
/// assert_eq!(extractor.extract_org_hint(&request).as_deref(), Some("acme"));
///
/// let request = RequestHandle::builder().host("pinpoint.app").build();
/// assert_eq!(extractor.extract_org_hint(&request), None);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SubdomainHintExtractor {
    base_domain: Option<String>,
    hint_header: Option<HeaderName>,
}

impl SubdomainHintExtractor {
    /// Extractor that yields no hints until configured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from resolver configuration.
    #[must_use]
    pub fn from_config(config: &ResolverConfig) -> Self {
        let mut extractor = Self::new();
        if let Some(base) = &config.base_domain {
            extractor = extractor.base_domain(base);
        }
        if let Ok(name) = HeaderName::from_bytes(config.org_hint_header.as_bytes()) {
            extractor.hint_header = Some(name);
        }
        extractor
    }

    /// Domain under which tenant subdomains live, e.g. `pinpoint.app`.
    #[must_use]
    pub fn base_domain(mut self, domain: impl AsRef<str>) -> Self {
        let domain = domain.as_ref().trim().trim_matches('.').to_ascii_lowercase();
        self.base_domain = (!domain.is_empty()).then_some(domain);
        self
    }

    /// Header that carries an explicit hint.
    #[must_use]
    pub fn hint_header(mut self, name: HeaderName) -> Self {
        self.hint_header = Some(name);
        self
    }

    fn header_hint(&self, request: &RequestHandle) -> Option<String> {
        let name = self.hint_header.as_ref()?;
        request
            .header(name.as_str())
            .and_then(normalize_hint)
    }

    fn subdomain_hint(&self, request: &RequestHandle) -> Option<String> {
        let base = self.base_domain.as_deref()?;
        let host = request.host()?.trim();

        // IPv6 literals never carry a tenant
        if host.starts_with('[') {
            return None;
        }

        let host = host.split(':').next()?.trim_end_matches('.').to_ascii_lowercase();
        let prefix = host.strip_suffix(base)?.strip_suffix('.')?;
        let label = prefix.rsplit('.').next()?;

        if label == "www" {
            return None;
        }
        normalize_hint(label)
    }
}

impl OrgHintExtractor for SubdomainHintExtractor {
    fn extract_org_hint(&self, request: &RequestHandle) -> Option<String> {
        self.header_hint(request)
            .or_else(|| self.subdomain_hint(request))
    }
}

fn normalize_hint(raw: &str) -> Option<String> {
    let hint = raw.trim().to_ascii_lowercase();
    (!hint.is_empty()).then_some(hint)
}
