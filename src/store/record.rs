//! The stored proxy address.

use std::fmt;

use thiserror::Error;
use url::{Host, Url};

/// Reasons a proxy address is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProxyUrlError {
    #[error("invalid URL: {0}")]
    Parse(#[from] url::ParseError),

    #[error("URL has no host")]
    MissingHost,
}

/// An absolute proxy URL together with the hostname it is registered under.
///
/// The hostname is the host component of the URL. IPv6 addresses are kept
/// without their brackets, so `http://[::1]:3128` registers as `::1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyUrl {
    url: Url,
    hostname: String,
}

impl ProxyUrl {
    /// Parse an absolute URL that carries a host.
    pub fn parse(input: &str) -> Result<Self, ProxyUrlError> {
        let url = Url::parse(input)?;
        let hostname = match url.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_ascii_lowercase(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            _ => return Err(ProxyUrlError::MissingHost),
        };

        Ok(Self { url, hostname })
    }

    /// The key this proxy is stored under.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }
}

/// Normalize a hostname taken from a request path into the form
/// [`ProxyUrl::hostname`] produces, so path and body keys compare equal.
///
/// Domains are lowercased (and IDNA-encoded), IP addresses are rendered in
/// canonical form. Anything the host parser rejects is only lowercased.
pub fn normalize_hostname(raw: &str) -> String {
    let candidate = if raw.contains(':') && !raw.starts_with('[') {
        format!("[{raw}]")
    } else {
        raw.to_owned()
    };

    match Host::parse(&candidate) {
        Ok(Host::Domain(domain)) => domain.to_ascii_lowercase(),
        Ok(Host::Ipv4(addr)) => addr.to_string(),
        Ok(Host::Ipv6(addr)) => addr.to_string(),
        Err(_) => raw.to_ascii_lowercase(),
    }
}

/// Canonical form: the WHATWG serialization, minus the lone `/` path that
/// special schemes always carry. Unlike Go's `url.URL.String()`, an explicit
/// trailing `/` on a bare host is dropped too.
impl fmt::Display for ProxyUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let serialized = self.url.as_str();
        let bare_root =
            self.url.path() == "/" && self.url.query().is_none() && self.url.fragment().is_none();

        if bare_root {
            f.write_str(serialized.strip_suffix('/').unwrap_or(serialized))
        } else {
            f.write_str(serialized)
        }
    }
}
