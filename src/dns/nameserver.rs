//! Name-server endpoints given as `host[:port]`.

use crate::base::config::DNS_PORT;
use crate::base::neterror::NetError;
use std::{
    fmt,
    net::{IpAddr, SocketAddr},
    str::FromStr,
};

/// A name server the resolver may query.
///
/// Accepted forms: `8.8.8.8`, `8.8.8.8:5353`, `2001:db8::1`,
/// `[2001:db8::1]:5353`, `dns.example:53`. The port defaults to 53.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct NameServer {
    host: NameServerHost,
    port: u16,
}

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
enum NameServerHost {
    Ip(IpAddr),
    Domain(Box<str>),
}

impl NameServer {
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self {
            host: NameServerHost::Ip(ip),
            port,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The literal address, if the endpoint was given as one.
    pub fn ip(&self) -> Option<IpAddr> {
        match self.host {
            NameServerHost::Ip(ip) => Some(ip),
            NameServerHost::Domain(_) => None,
        }
    }

    /// Turn the endpoint into socket addresses.
    ///
    /// A named server is looked up through the system resolver first.
    pub async fn socket_addrs(&self) -> Result<Vec<SocketAddr>, NetError> {
        match &self.host {
            NameServerHost::Ip(ip) => Ok(vec![SocketAddr::new(*ip, self.port)]),
            NameServerHost::Domain(name) => {
                let addrs: Vec<SocketAddr> = tokio::net::lookup_host((name.as_ref(), self.port))
                    .await
                    .map_err(|e| {
                        NetError::ResolutionFailed(format!("name server {name} not resolvable: {e}"))
                    })?
                    .collect();
                if addrs.is_empty() {
                    return Err(NetError::ResolutionFailed(format!(
                        "name server {name} has no addresses"
                    )));
                }
                Ok(addrs)
            }
        }
    }
}

impl FromStr for NameServer {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(NetError::invalid_input("empty name server endpoint"));
        }

        // Bare IPv6 literal (contains several colons, no brackets)
        if let Ok(ip) = s.parse::<IpAddr>() {
            return Ok(Self::new(ip, DNS_PORT));
        }
        if let Ok(addr) = s.parse::<SocketAddr>() {
            return Ok(Self::new(addr.ip(), addr.port()));
        }

        let (host, port) = match s.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    NetError::invalid_input(format!("invalid port in name server {s:?}"))
                })?;
                (host, port)
            }
            None => (s, DNS_PORT),
        };

        if host.starts_with('[') {
            return Err(NetError::invalid_input(format!(
                "invalid IPv6 literal in name server {s:?}"
            )));
        }
        if port == 0 {
            return Err(NetError::invalid_input(format!("port 0 in name server {s:?}")));
        }
        super::resolve::validate_hostname(host)?;

        Ok(Self {
            host: NameServerHost::Domain(host.into()),
            port,
        })
    }
}

impl fmt::Display for NameServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            NameServerHost::Ip(IpAddr::V6(ip)) => write!(f, "[{}]:{}", ip, self.port),
            NameServerHost::Ip(ip) => write!(f, "{}:{}", ip, self.port),
            NameServerHost::Domain(name) => write!(f, "{}:{}", name, self.port),
        }
    }
}

/// Parse a caller-supplied server list, failing on the first bad entry.
pub fn parse_servers<I, S>(servers: I) -> Result<Vec<NameServer>, NetError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    servers.into_iter().map(|s| s.as_ref().parse()).collect()
}
