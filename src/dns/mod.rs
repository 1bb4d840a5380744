//! DNS Resolution Module
//!
//! Provides pluggable DNS resolution with support for:
//! - Explicit, ordered name-server lists with fallback
//! - System DNS configuration (hickory), with getaddrinfo as a last resort
//! - Hostname-to-IP override mechanism
//!
//! # Architecture
//!
//! The `Resolve` trait is the core abstraction that allows different
//! resolver implementations to be used interchangeably. Nothing is cached:
//! each lookup is independent of every other.
//!
//! # Example
//!
//! ```rust,ignore
//! use http_native::dns;
//!
//! let set = dns::resolve("example.com", &["1.1.1.1", "8.8.8.8:53"])?;
//! for addr in set.iter() {
//!     println!("Resolved: {}", addr);
//! }
//! ```

mod address;
mod gai;
mod hickory;
mod nameserver;
mod resolve;
mod resolver;

pub use address::{AddressRecord, AddressSet};
pub use gai::GaiResolver;
pub use hickory::HickoryResolver;
pub use nameserver::{parse_servers, NameServer};
pub use resolve::{validate_hostname, DnsResolverWithOverrides, Name, Resolve, Resolving};
pub use resolver::DnsResolver;

use crate::base::neterror::NetError;

/// Resolve `hostname` against `servers` (in order), or the system
/// configuration when `servers` is empty. Blocks until a definitive answer
/// or until every server has failed.
pub fn resolve<S: AsRef<str>>(hostname: &str, servers: &[S]) -> Result<AddressSet, NetError> {
    DnsResolver::from_endpoints(servers)?.lookup_blocking(hostname)
}

/// [`resolve`] with system-default resolution only.
pub fn resolve_simple(hostname: &str) -> Result<AddressSet, NetError> {
    DnsResolver::system().lookup_blocking(hostname)
}
