use crate::base::neterror::NetError;
use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use std::str::FromStr;

/// A header list that strictly preserves insertion order.
///
/// Repeated names are kept as separate entries so they reach the wire as
/// repeated header lines.
#[derive(Debug, Clone, Default)]
pub struct OrderedHeaderMap {
    headers: Vec<(HeaderName, HeaderValue)>,
}

fn parse_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), NetError> {
    let name_header = HeaderName::from_str(name)
        .map_err(|_| NetError::invalid_input(format!("invalid header name {name:?}")))?;
    let value_header = HeaderValue::from_str(value)
        .map_err(|_| NetError::invalid_input(format!("invalid value for header {name:?}")))?;
    Ok((name_header, value_header))
}

fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        out.push(if upper { c.to_ascii_uppercase() } else { c });
        upper = c == '-';
    }
    out
}

impl OrderedHeaderMap {
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
        }
    }

    /// Add a header entry, keeping any existing entries with the same name.
    pub fn append(&mut self, name: &str, value: &str) -> Result<(), NetError> {
        let pair = parse_pair(name, value)?;
        self.headers.push(pair);
        Ok(())
    }

    /// Add an already-validated entry.
    pub fn push(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.push((name, value));
    }

    /// Parse a `"Name: value"` line and append it.
    ///
    /// Whitespace around the value is trimmed; whitespace before the colon is
    /// not allowed.
    pub fn append_line(&mut self, line: &str) -> Result<(), NetError> {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| NetError::invalid_input(format!("header line without colon: {line:?}")))?;
        self.append(name, value.trim())
    }

    /// First value stored under `name` (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        let target = HeaderName::from_str(name).ok()?;
        self.headers
            .iter()
            .find(|(n, _)| *n == target)
            .map(|(_, v)| v)
    }

    /// Every value stored under `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a HeaderValue> + 'a {
        let target = HeaderName::from_str(name).ok();
        self.headers
            .iter()
            .filter(move |(n, _)| Some(n) == target.as_ref())
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.headers.iter().map(|(n, v)| (n, v))
    }

    /// Entries with names in title case (`content-type` -> `Content-Type`),
    /// in insertion order.
    pub fn as_title_case(&self) -> impl Iterator<Item = (String, &HeaderValue)> + '_ {
        self.headers.iter().map(|(n, v)| (title_case(n.as_str()), v))
    }

    /// Consumes the map and returns a standard `http::HeaderMap`.
    ///
    /// `HeaderMap` groups values by name, so interleaved names lose their
    /// relative order here. Use [`as_title_case`](Self::as_title_case) for
    /// anything that goes on the wire.
    pub fn to_header_map(self) -> HeaderMap {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in self.headers {
            map.append(name, value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_get() {
        let mut headers = OrderedHeaderMap::new();
        headers.append("Content-Type", "application/json").unwrap();
        assert_eq!(
            headers.get("Content-Type").unwrap().to_str().unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_case_insensitive_get() {
        let mut headers = OrderedHeaderMap::new();
        headers.append("ACCEPT", "text/html").unwrap();
        assert!(headers.get("accept").is_some());
        assert!(headers.contains("Accept"));
    }

    #[test]
    fn test_append_keeps_duplicates() {
        let mut headers = OrderedHeaderMap::new();
        headers.append("X-Trace", "a").unwrap();
        headers.append("Accept", "*/*").unwrap();
        headers.append("x-trace", "b").unwrap();

        let values: Vec<_> = headers.get_all("X-Trace").collect();
        assert_eq!(values, vec!["a", "b"]);

        let map = headers.to_header_map();
        assert_eq!(map.get_all("x-trace").iter().count(), 2);
    }

    #[test]
    fn test_interleaved_names_keep_order() {
        let mut headers = OrderedHeaderMap::new();
        headers.append("X-A", "1").unwrap();
        headers.append("X-B", "2").unwrap();
        headers.append("X-A", "3").unwrap();

        let entries: Vec<_> = headers
            .iter()
            .map(|(n, v)| format!("{}={}", n, v.to_str().unwrap()))
            .collect();
        assert_eq!(entries, vec!["x-a=1", "x-b=2", "x-a=3"]);
    }

    #[test]
    fn test_append_line() {
        let mut headers = OrderedHeaderMap::new();
        headers.append_line("X-Custom:  spaced value ").unwrap();
        headers.append_line("X-Empty:").unwrap();
        assert_eq!(headers.get("x-custom").unwrap(), "spaced value");
        assert_eq!(headers.get("x-empty").unwrap(), "");
    }

    #[test]
    fn test_append_line_rejects_malformed() {
        let mut headers = OrderedHeaderMap::new();
        for bad in ["NoColon", "Bad Name: v", ": value"] {
            let err = headers.append_line(bad).unwrap_err();
            assert_eq!(err.kind(), "InvalidInput", "{bad:?}");
        }
        assert!(headers.is_empty());
    }

    #[test]
    fn test_title_case() {
        let mut headers = OrderedHeaderMap::new();
        headers.append("user-agent", "test").unwrap();
        headers.append("x-request-id", "7").unwrap();
        headers.append("DNT", "1").unwrap();

        let names: Vec<_> = headers.as_title_case().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["User-Agent", "X-Request-Id", "Dnt"]);
    }

    #[test]
    fn test_invalid_header_value() {
        let mut headers = OrderedHeaderMap::new();
        let err = headers.append("Valid", "invalid\nvalue").unwrap_err();
        assert_eq!(err.kind(), "InvalidInput");
    }
}
