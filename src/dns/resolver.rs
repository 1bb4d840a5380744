//! Ordered name-server fallback.
//!
//! With an explicit server list, servers are tried strictly in order. A
//! server that times out, refuses, or cannot be reached hands over to the
//! next one; the first definitive answer (addresses or "no such name") ends
//! the walk. The walk is a small state machine:
//!
//! ```text
//! Pending ──answer / NXDOMAIN──▶ Definitive
//!    │
//!    └──list exhausted──▶ Exhausted (last failure wins)
//! ```

use super::address::AddressSet;
use super::gai::GaiResolver;
use super::hickory::HickoryResolver;
use super::nameserver::{parse_servers, NameServer};
use super::resolve::{Name, Resolve, Resolving};
use crate::base::config::ResolverOptions;
use crate::base::neterror::NetError;

/// Progress of one resolution across the server list.
#[derive(Debug)]
enum Attempt {
    /// Still walking; carries the most recent non-definitive failure.
    Pending(Option<NetError>),
    /// A server gave an answer that ends the walk.
    Definitive(Result<AddressSet, NetError>),
    /// Every server failed without a definitive answer.
    Exhausted(NetError),
}

impl Attempt {
    fn advance(self, outcome: Result<AddressSet, NetError>) -> Attempt {
        match (self, outcome) {
            (Attempt::Pending(_), Ok(set)) => Attempt::Definitive(Ok(set)),
            (Attempt::Pending(_), Err(e @ NetError::NoSuchHost(_))) => Attempt::Definitive(Err(e)),
            (Attempt::Pending(_), Err(e)) => Attempt::Pending(Some(e)),
            (done, _) => done,
        }
    }

    fn is_done(&self) -> bool {
        !matches!(self, Attempt::Pending(_))
    }

    fn finish(self) -> Attempt {
        match self {
            Attempt::Pending(Some(last)) => Attempt::Exhausted(last),
            Attempt::Pending(None) => {
                Attempt::Exhausted(NetError::ResolutionFailed("no name servers to query".into()))
            }
            done => done,
        }
    }

    fn into_result(self) -> Result<AddressSet, NetError> {
        match self.finish() {
            Attempt::Definitive(result) => result,
            Attempt::Exhausted(last) | Attempt::Pending(Some(last)) => Err(last),
            Attempt::Pending(None) => {
                Err(NetError::ResolutionFailed("no name servers to query".into()))
            }
        }
    }
}

/// DNS resolver over an explicit server list, or the system configuration
/// when the list is empty.
///
/// Holds no state between lookups: every call builds fresh upstream
/// clients and drops them before returning.
#[derive(Clone, Debug, Default)]
pub struct DnsResolver {
    servers: Vec<NameServer>,
    options: ResolverOptions,
}

impl DnsResolver {
    /// Resolver over the given servers, queried in order.
    pub fn new(servers: Vec<NameServer>) -> Self {
        Self {
            servers,
            options: ResolverOptions::default(),
        }
    }

    /// Resolver following the system DNS configuration.
    pub fn system() -> Self {
        Self::default()
    }

    /// Parse `host[:port]` endpoints and build a resolver over them.
    pub fn from_endpoints<I, S>(servers: I) -> Result<Self, NetError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self::new(parse_servers(servers)?))
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn servers(&self) -> &[NameServer] {
        &self.servers
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Resolve `name` to an ordered, non-empty address set.
    pub async fn lookup(&self, name: &Name) -> Result<AddressSet, NetError> {
        if let Some(ip) = name.as_ip() {
            return Ok(AddressSet::from_ips([ip], self.options.ipv4_first));
        }
        if self.servers.is_empty() {
            return self.lookup_system(name).await;
        }

        let mut attempt = Attempt::Pending(None);
        for server in self.servers.iter() {
            let outcome = self.query_server(server, name).await;
            if let Err(e) = &outcome {
                if !matches!(e, NetError::NoSuchHost(_)) {
                    tracing::debug!(domain = %name, server = %server, error = %e, "name server failed, trying next");
                }
            }
            attempt = attempt.advance(outcome);
            if attempt.is_done() {
                break;
            }
        }
        attempt.into_result()
    }

    /// Blocking form of [`lookup`](Self::lookup) for the synchronous boundary.
    pub fn lookup_blocking(&self, hostname: &str) -> Result<AddressSet, NetError> {
        let name = Name::new(hostname)?;
        crate::base::runtime::block_on(self.lookup(&name))?
    }

    async fn query_server(&self, server: &NameServer, name: &Name) -> Result<AddressSet, NetError> {
        let budget = self.options.server_timeout;
        let query = async {
            let addrs = server.socket_addrs().await?;
            HickoryResolver::for_server(&addrs, &self.options)
                .lookup(name)
                .await
        };

        match tokio::time::timeout(budget, query).await {
            Ok(outcome) => outcome,
            Err(_) => Err(NetError::ResolutionTimeout(format!(
                "{name}: {server} did not answer within {} ms",
                budget.as_millis()
            ))),
        }
    }

    async fn lookup_system(&self, name: &Name) -> Result<AddressSet, NetError> {
        let budget = self.options.server_timeout;
        let query = async {
            match HickoryResolver::system(&self.options) {
                Ok(resolver) => resolver.lookup(name).await,
                Err(_) => {
                    tracing::warn!(domain = %name, "falling back to getaddrinfo");
                    GaiResolver::new(self.options.ipv4_first)
                        .resolve(name.clone())
                        .await
                }
            }
        };

        match tokio::time::timeout(budget, query).await {
            Ok(outcome) => outcome,
            Err(_) => Err(NetError::ResolutionTimeout(format!(
                "{name}: system resolver did not answer within {} ms",
                budget.as_millis()
            ))),
        }
    }
}

impl Resolve for DnsResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = self.clone();
        Box::pin(async move { resolver.lookup(&name).await })
    }
}
