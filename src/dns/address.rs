//! Resolved addresses and their canonical text form.

use crate::base::neterror::NetError;
use std::{
    fmt,
    net::{IpAddr, SocketAddr},
    str::FromStr,
};

/// A single resolved network address.
///
/// The textual form is the canonical literal produced by the standard
/// library: dotted quad for IPv4, RFC 5952 compressed form for IPv6, no
/// brackets and no port.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct AddressRecord(IpAddr);

impl AddressRecord {
    #[inline]
    pub fn new(ip: IpAddr) -> Self {
        Self(ip)
    }

    #[inline]
    pub fn ip(&self) -> IpAddr {
        self.0
    }

    #[inline]
    pub fn is_ipv4(&self) -> bool {
        self.0.is_ipv4()
    }

    #[inline]
    pub fn is_ipv6(&self) -> bool {
        self.0.is_ipv6()
    }

    /// Pair the address with a port for connecting.
    pub fn to_socket_addr(&self, port: u16) -> SocketAddr {
        SocketAddr::new(self.0, port)
    }
}

impl From<IpAddr> for AddressRecord {
    fn from(ip: IpAddr) -> Self {
        Self(ip)
    }
}

impl fmt::Display for AddressRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for AddressRecord {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept a bracketed IPv6 literal as well, the way it appears in URLs.
        let trimmed = s
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(s);
        trimmed
            .parse::<IpAddr>()
            .map(Self)
            .map_err(|_| NetError::invalid_input(format!("not an IP address literal: {s:?}")))
    }
}

/// An ordered, non-empty list of resolved addresses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressSet {
    records: Vec<AddressRecord>,
}

impl AddressSet {
    /// Build a set in server-reported order.
    pub fn new(records: Vec<AddressRecord>) -> Self {
        Self { records }
    }

    /// Build a set from raw addresses, applying the family ordering policy.
    ///
    /// With `ipv4_first`, all IPv4 addresses come first in the order
    /// received, followed by all IPv6 addresses in the order received.
    pub fn from_ips<I>(ips: I, ipv4_first: bool) -> Self
    where
        I: IntoIterator<Item = IpAddr>,
    {
        let records: Vec<AddressRecord> = ips.into_iter().map(AddressRecord::from).collect();
        if !ipv4_first {
            return Self { records };
        }
        let (mut v4, v6): (Vec<_>, Vec<_>) = records.into_iter().partition(|r| r.is_ipv4());
        v4.extend(v6);
        Self { records: v4 }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AddressRecord> {
        self.records.iter()
    }

    pub fn first(&self) -> Option<&AddressRecord> {
        self.records.first()
    }

    /// Canonical text of every address, in order.
    pub fn to_strings(&self) -> Vec<String> {
        self.records.iter().map(ToString::to_string).collect()
    }

    /// Socket addresses for connecting, in order.
    pub fn socket_addrs(&self, port: u16) -> Vec<SocketAddr> {
        self.records.iter().map(|r| r.to_socket_addr(port)).collect()
    }

    pub fn into_vec(self) -> Vec<AddressRecord> {
        self.records
    }
}

impl IntoIterator for AddressSet {
    type Item = AddressRecord;
    type IntoIter = std::vec::IntoIter<AddressRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
