//! System DNS resolver using getaddrinfo.
//!
//! Used for system-default resolution when hickory cannot read the host's
//! DNS configuration. The lookup runs on tokio's blocking pool.

use super::address::AddressSet;
use super::resolve::{Name, Resolve, Resolving};
use crate::base::neterror::NetError;
use std::net::ToSocketAddrs;

/// System DNS resolver using `getaddrinfo` in a thread pool.
#[derive(Clone, Debug, Default)]
pub struct GaiResolver {
    ipv4_first: bool,
}

impl GaiResolver {
    /// Creates a new `GaiResolver`.
    pub fn new(ipv4_first: bool) -> Self {
        Self { ipv4_first }
    }
}

impl Resolve for GaiResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let ipv4_first = self.ipv4_first;
        Box::pin(async move {
            let host = name.as_str().to_string();

            let result = tokio::task::spawn_blocking(move || {
                tracing::debug!(host = %host, "resolving via getaddrinfo");
                (host.as_str(), 0u16)
                    .to_socket_addrs()
                    .map(|iter| iter.map(|addr| addr.ip()).collect::<Vec<_>>())
            })
            .await;

            // Handle task join error (cancellation, panic)
            let ips = result
                .map_err(|e| {
                    tracing::error!(error = %e, "DNS resolution task failed");
                    NetError::ResolutionFailed(format!("{name}: resolution task failed: {e}"))
                })?
                .map_err(|e| {
                    tracing::debug!(domain = %name, error = %e, "DNS resolution failed");
                    NetError::ResolutionFailed(format!("{name}: {e}"))
                })?;

            // getaddrinfo reports one entry per socket type; keep the first of each.
            let mut unique = Vec::with_capacity(ips.len());
            for ip in ips {
                if !unique.contains(&ip) {
                    unique.push(ip);
                }
            }

            let set = AddressSet::from_ips(unique, ipv4_first);
            if set.is_empty() {
                return Err(NetError::NoSuchHost(format!(
                    "{name}: no addresses returned by getaddrinfo"
                )));
            }

            tracing::debug!(domain = %name, count = set.len(), "DNS resolution complete");
            Ok(set)
        })
    }
}
