//! Core DNS resolution types and traits.
//!
//! This module defines the `Resolve` trait and supporting types that form
//! the foundation of the DNS abstraction layer.

use super::address::AddressSet;
use crate::base::neterror::NetError;
use std::{
    borrow::Cow, collections::HashMap, fmt, future::Future, net::IpAddr, pin::Pin, sync::Arc,
};

/// Longest textual hostname accepted, trailing dot excluded.
pub const MAX_HOSTNAME_LEN: usize = 253;

const MAX_LABEL_LEN: usize = 63;

/// Check that `host` is a syntactically plausible DNS name or an IP literal.
pub fn validate_hostname(host: &str) -> Result<(), NetError> {
    if host.is_empty() {
        return Err(NetError::invalid_input("empty hostname"));
    }
    if host.parse::<IpAddr>().is_ok() {
        return Ok(());
    }
    if host.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(NetError::invalid_input(format!(
            "hostname contains whitespace or control characters: {host:?}"
        )));
    }

    let trimmed = host.strip_suffix('.').unwrap_or(host);
    if trimmed.is_empty() {
        return Err(NetError::invalid_input("hostname is only a dot"));
    }
    if trimmed.len() > MAX_HOSTNAME_LEN {
        return Err(NetError::invalid_input(format!(
            "hostname longer than {MAX_HOSTNAME_LEN} characters"
        )));
    }
    for label in trimmed.split('.') {
        if label.is_empty() {
            return Err(NetError::invalid_input(format!("empty label in hostname {host:?}")));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(NetError::invalid_input(format!(
                "label longer than {MAX_LABEL_LEN} characters in hostname"
            )));
        }
    }
    Ok(())
}

/// A validated domain name to resolve into IP addresses.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct Name {
    host: Box<str>,
}

impl Name {
    /// Creates a new [`Name`], rejecting implausible hostnames.
    pub fn new(host: impl Into<Box<str>>) -> Result<Self, NetError> {
        let host = host.into();
        validate_hostname(&host)?;
        Ok(Self { host })
    }

    /// View the hostname as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.host
    }

    /// The name as an IP address, when it is a literal.
    pub fn as_ip(&self) -> Option<IpAddr> {
        self.host.parse().ok()
    }
}

impl TryFrom<&str> for Name {
    type Error = NetError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Name::new(value)
    }
}

impl TryFrom<String> for Name {
    type Error = NetError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Name::new(value)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.host, f)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.host, f)
    }
}

/// Alias for the `Future` type returned by a DNS resolver.
pub type Resolving = Pin<Box<dyn Future<Output = Result<AddressSet, NetError>> + Send>>;

/// Trait for DNS resolution.
///
/// Implementations must be thread-safe and must not keep state between
/// calls: every resolution starts from scratch.
pub trait Resolve: Send + Sync {
    /// Resolves a domain name to an ordered, non-empty address set.
    fn resolve(&self, name: Name) -> Resolving;
}

/// Blanket implementation for Arc-wrapped resolvers.
impl<R: Resolve + ?Sized> Resolve for Arc<R> {
    fn resolve(&self, name: Name) -> Resolving {
        (**self).resolve(name)
    }
}

/// DNS resolver wrapper that supports hostname overrides.
///
/// This resolver first checks a map of hostname-to-address overrides before
/// falling back to the underlying resolver. The executor uses it for
/// addresses the caller resolved out of band.
///
/// # Example
///
/// ```rust,ignore
/// use http_native::dns::{DnsResolver, DnsResolverWithOverrides};
/// use std::collections::HashMap;
///
/// let mut overrides = HashMap::new();
/// overrides.insert("api.local".into(), vec!["127.0.0.1".parse().unwrap()]);
///
/// let resolver = DnsResolverWithOverrides::new(Arc::new(DnsResolver::system()), overrides);
/// ```
pub struct DnsResolverWithOverrides {
    inner: Arc<dyn Resolve>,
    overrides: Arc<HashMap<Cow<'static, str>, Vec<IpAddr>>>,
}

impl DnsResolverWithOverrides {
    /// Creates a new resolver with the given overrides.
    ///
    /// Hostname keys are matched case-insensitively.
    pub fn new(inner: Arc<dyn Resolve>, overrides: HashMap<Cow<'static, str>, Vec<IpAddr>>) -> Self {
        let overrides = overrides
            .into_iter()
            .filter(|(_, addrs)| !addrs.is_empty())
            .map(|(host, addrs)| (Cow::Owned(host.to_ascii_lowercase()), addrs))
            .collect();
        Self {
            inner,
            overrides: Arc::new(overrides),
        }
    }

    /// Returns the number of configured overrides.
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

impl Resolve for DnsResolverWithOverrides {
    fn resolve(&self, name: Name) -> Resolving {
        let key = name.as_str().to_ascii_lowercase();
        let key = key.strip_suffix('.').unwrap_or(&key);
        if let Some(addrs) = self.overrides.get(key) {
            tracing::debug!(domain = %name, count = addrs.len(), "using address override");
            // Caller-supplied order is kept as-is.
            let set = AddressSet::from_ips(addrs.iter().copied(), false);
            return Box::pin(std::future::ready(Ok(set)));
        }
        self.inner.resolve(name)
    }
}

impl fmt::Debug for DnsResolverWithOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DnsResolverWithOverrides")
            .field("override_count", &self.overrides.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_name_from_str() {
        let name = Name::try_from("example.com").unwrap();
        assert_eq!(name.as_str(), "example.com");
        assert_eq!(name.to_string(), "example.com");
    }

    #[test]
    fn test_name_equality() {
        let name1 = Name::new("example.com").unwrap();
        let name2 = Name::new("example.com").unwrap();
        let name3 = Name::new("other.com").unwrap();

        assert_eq!(name1, name2);
        assert_ne!(name1, name3);
    }

    #[test]
    fn test_name_ip_literal() {
        let name = Name::new("::1").unwrap();
        assert!(name.as_ip().is_some());
        assert!(Name::new("example.com").unwrap().as_ip().is_none());
    }

    #[test]
    fn test_hostname_validation() {
        assert!(validate_hostname("example.com").is_ok());
        assert!(validate_hostname("example.com.").is_ok());
        assert!(validate_hostname("_srv.example.com").is_ok());
        assert!(validate_hostname("localhost").is_ok());

        for bad in ["", ".", "exa mple.com", "example..com", ".example.com", "tab\tname"] {
            assert!(validate_hostname(bad).is_err(), "{bad:?}");
        }

        let long_label = format!("{}.com", "a".repeat(64));
        assert!(validate_hostname(&long_label).is_err());

        let too_long = vec!["abcdefghi"; 26].join(".");
        assert!(too_long.len() > MAX_HOSTNAME_LEN);
        assert!(validate_hostname(&too_long).is_err());
    }

    struct MockResolver {
        response: Vec<IpAddr>,
    }

    impl Resolve for MockResolver {
        fn resolve(&self, _name: Name) -> Resolving {
            let set = AddressSet::from_ips(self.response.clone(), true);
            Box::pin(async move { Ok(set) })
        }
    }

    #[tokio::test]
    async fn test_override_resolver_hit() {
        let mock = Arc::new(MockResolver {
            response: vec![IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8))],
        });

        let mut overrides = HashMap::new();
        overrides.insert(
            Cow::Borrowed("Override.Local"),
            vec![IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))],
        );

        let resolver = DnsResolverWithOverrides::new(mock, overrides);
        let set = resolver
            .resolve(Name::new("override.local.").unwrap())
            .await
            .unwrap();

        assert_eq!(set.to_strings(), vec!["127.0.0.1"]);
    }

    #[tokio::test]
    async fn test_override_resolver_miss() {
        let mock = Arc::new(MockResolver {
            response: vec![IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8))],
        });

        let resolver = DnsResolverWithOverrides::new(mock, HashMap::new());
        let set = resolver
            .resolve(Name::new("not-overridden.com").unwrap())
            .await
            .unwrap();

        assert_eq!(set.to_strings(), vec!["8.8.8.8"]);
        assert_eq!(resolver.override_count(), 0);
    }
}
