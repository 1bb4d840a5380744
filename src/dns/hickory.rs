//! Async DNS lookups using hickory-dns.
//!
//! A `HickoryResolver` is built for exactly one upstream (the system
//! configuration or one caller-supplied name server) and thrown away after
//! the lookup, so nothing is cached between calls.
//!
//! Queries go out over UDP; a truncated answer is retried over TCP against
//! the same server.
//!
//! Caller-supplied servers are queried through a bare name server pool rather
//! than `TokioResolver`. The resolver answers `localhost` and `.invalid`
//! locally and consults the hosts file; with an explicit server list only
//! that server may answer.

use super::address::AddressSet;
use super::resolve::Name;
use crate::base::config::ResolverOptions;
use crate::base::neterror::NetError;
use hickory_resolver::{
    config::{LookupIpStrategy, NameServerConfigGroup, ResolverOpts},
    name_server::{NameServerPool, TokioConnectionProvider},
    proto::{
        op::{Query, ResponseCode},
        rr::{Name as DnsName, RecordType},
        xfer::{DnsHandle, DnsRequestOptions, FirstAnswer, RetryDnsHandle},
        ProtoErrorKind,
    },
    ResolveError, ResolveErrorKind, TokioResolver,
};
use std::net::{IpAddr, SocketAddr};

type ServerPool = RetryDnsHandle<NameServerPool<TokioConnectionProvider>>;

enum Upstream {
    /// Caller-supplied server, asked directly for every name.
    Server(ServerPool),
    /// Host configuration, including the hosts file.
    System(TokioResolver),
}

/// Single-upstream resolver backed by hickory-dns.
pub struct HickoryResolver {
    upstream: Upstream,
    description: String,
    ipv4_first: bool,
}

impl HickoryResolver {
    /// Resolver that only talks to the given server addresses. Every name,
    /// `localhost` included, is sent to the server.
    ///
    /// All addresses belong to one logical server (a named server may have
    /// several), so they share one port.
    pub fn for_server(addrs: &[SocketAddr], options: &ResolverOptions) -> Self {
        let port = addrs.first().map(SocketAddr::port).unwrap_or(crate::base::config::DNS_PORT);
        let ips: Vec<IpAddr> = addrs.iter().map(SocketAddr::ip).collect();
        let group = NameServerConfigGroup::from_ips_clear(&ips, port, true);

        let mut opts = ResolverOpts::default();
        Self::apply_options(&mut opts, options);
        let attempts = opts.attempts;
        let pool = NameServerPool::from_config(group, opts, TokioConnectionProvider::default());

        let description = addrs
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");

        Self {
            upstream: Upstream::Server(RetryDnsHandle::new(pool, attempts)),
            description,
            ipv4_first: options.ipv4_first,
        }
    }

    /// Resolver following the host's DNS configuration (/etc/resolv.conf etc.).
    ///
    /// Fails when the system configuration cannot be read; callers fall back
    /// to `getaddrinfo` in that case.
    pub fn system(options: &ResolverOptions) -> Result<Self, NetError> {
        let mut builder = TokioResolver::builder_tokio().map_err(|e| {
            tracing::warn!(error = %e, "failed to read system DNS configuration");
            NetError::ResolutionFailed(format!("system DNS configuration unavailable: {e}"))
        })?;
        Self::apply_options(builder.options_mut(), options);

        Ok(Self {
            upstream: Upstream::System(builder.build()),
            description: "system".to_string(),
            ipv4_first: options.ipv4_first,
        })
    }

    fn apply_options(opts: &mut ResolverOpts, options: &ResolverOptions) {
        opts.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
        opts.timeout = options.server_timeout;
        opts.attempts = options.attempts;
    }

    /// Description of the upstream used in traces and error messages.
    pub fn upstream(&self) -> &str {
        &self.description
    }

    /// Look up A and AAAA records for `name`.
    pub async fn lookup(&self, name: &Name) -> Result<AddressSet, NetError> {
        let domain = name.as_str();
        tracing::debug!(domain = %domain, upstream = %self.description, "resolving via hickory-dns");

        let ips = match &self.upstream {
            Upstream::Server(pool) => self.query_server(pool, name).await,
            Upstream::System(resolver) => resolver
                .lookup_ip(domain)
                .await
                .map(|lookup| lookup.iter().collect::<Vec<_>>())
                .map_err(|e| classify(e, name, &self.description)),
        }
        .inspect_err(|e| {
            tracing::debug!(domain = %domain, upstream = %self.description, error = %e, "hickory-dns lookup failed");
        })?;

        let set = AddressSet::from_ips(ips, self.ipv4_first);
        if set.is_empty() {
            return Err(NetError::NoSuchHost(format!(
                "{domain}: no address records (from {})",
                self.description
            )));
        }

        tracing::debug!(domain = %domain, count = set.len(), "hickory-dns resolution complete");
        Ok(set)
    }

    /// Ask the server for A and AAAA in parallel.
    ///
    /// Any address wins. Otherwise NXDOMAIN on either family is definitive, and
    /// a failed or timed-out query beats an empty answer so the caller moves on.
    async fn query_server(&self, pool: &ServerPool, name: &Name) -> Result<Vec<IpAddr>, NetError> {
        let mut fqdn = DnsName::from_str_relaxed(name.as_str()).map_err(|e| {
            NetError::InvalidInput(format!("{name}: not a valid DNS name: {e}"))
        })?;
        fqdn.set_fqdn(true);

        let (v4, v6) = tokio::join!(
            query_type(pool, &fqdn, RecordType::A),
            query_type(pool, &fqdn, RecordType::AAAA),
        );

        let mut ips = Vec::new();
        let mut errors = Vec::new();
        for result in [v4, v6] {
            match result {
                Ok(found) => ips.extend(found),
                Err(e) => errors.push(e),
            }
        }
        if !ips.is_empty() || errors.is_empty() {
            return Ok(ips);
        }

        let pick = errors
            .iter()
            .position(|e| response_code(e) == Some(ResponseCode::NXDomain))
            .or_else(|| errors.iter().position(|e| response_code(e) != Some(ResponseCode::NoError)))
            .unwrap_or(0);
        Err(classify(errors.swap_remove(pick), name, &self.description))
    }
}

async fn query_type(
    pool: &ServerPool,
    fqdn: &DnsName,
    record_type: RecordType,
) -> Result<Vec<IpAddr>, ResolveError> {
    let response = pool
        .lookup(Query::query(fqdn.clone(), record_type), DnsRequestOptions::default())
        .first_answer()
        .await?;

    Ok(response
        .answers()
        .iter()
        .filter(|record| record.record_type() == record_type)
        .filter_map(|record| record.data().ip_addr())
        .collect())
}

/// Response code of a negative answer; `None` when no answer came back.
fn response_code(err: &ResolveError) -> Option<ResponseCode> {
    match err.kind() {
        ResolveErrorKind::Proto(proto) => match proto.kind() {
            ProtoErrorKind::NoRecordsFound { response_code, .. } => Some(*response_code),
            _ => None,
        },
        _ => None,
    }
}

/// Map a hickory error onto the resolver taxonomy.
///
/// NXDOMAIN and an empty NOERROR answer are definitive (`NoSuchHost`).
/// Timeouts become `ResolutionTimeout`; everything else, including SERVFAIL
/// and REFUSED, is `ResolutionFailed` so the caller moves on.
pub fn classify(err: ResolveError, name: &Name, upstream: &str) -> NetError {
    let ResolveErrorKind::Proto(proto) = err.kind() else {
        return NetError::ResolutionFailed(format!("{name}: {err} (from {upstream})"));
    };

    match proto.kind() {
        ProtoErrorKind::NoRecordsFound { response_code, .. } => match *response_code {
            ResponseCode::NXDomain => {
                NetError::NoSuchHost(format!("{name}: no such name (from {upstream})"))
            }
            ResponseCode::NoError => {
                NetError::NoSuchHost(format!("{name}: no address records (from {upstream})"))
            }
            code => NetError::ResolutionFailed(format!(
                "{name}: server answered {code} (from {upstream})"
            )),
        },
        ProtoErrorKind::Timeout => {
            NetError::ResolutionTimeout(format!("{name}: request timed out (from {upstream})"))
        }
        _ => NetError::ResolutionFailed(format!("{name}: {err} (from {upstream})")),
    }
}
