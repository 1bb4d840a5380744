//! Caller-facing request description and its validation.
//!
//! A [`RequestDescriptor`] is plain data. [`RequestDescriptor::prepare`]
//! checks it and produces the `http::Request` hyper frames the body from,
//! plus the request head exactly as it goes on the wire, with `Host` and
//! `Content-Length` filled in where the caller left them out.

use super::orderedheaders::OrderedHeaderMap;
use super::requestbody::RequestBody;
use crate::base::neterror::NetError;
use crate::dns::NameServer;
use bytes::{BufMut, Bytes, BytesMut};
use http::header::{self, HeaderValue};
use http::{Method, Request, Version};
use http_body_util::Full;
use std::net::IpAddr;
use url::{Position, Url};

/// Everything needed to execute one HTTP/1.1 request.
#[derive(Debug, Clone, Default)]
pub struct RequestDescriptor {
    /// Method token, case-insensitive. Empty means `GET`.
    pub method: String,
    /// Absolute `http` or `https` URL.
    pub url: String,
    /// Caller headers in wire order; repeated names are sent repeatedly.
    pub headers: OrderedHeaderMap,
    pub body: RequestBody,
    /// Overall budget in milliseconds; 0 selects the executor default.
    pub timeout_ms: u64,
    /// Addresses to use for the URL host instead of resolving it.
    pub resolved_addrs: Vec<IpAddr>,
    /// Name servers for resolving the URL host, tried in order.
    pub dns_servers: Vec<NameServer>,
}

impl RequestDescriptor {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Append a header. Duplicates are kept.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, NetError> {
        self.headers.append(name, value)?;
        Ok(self)
    }

    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn resolved_addrs(mut self, addrs: impl IntoIterator<Item = IpAddr>) -> Self {
        self.resolved_addrs = addrs.into_iter().collect();
        self
    }

    pub fn dns_servers(mut self, servers: Vec<NameServer>) -> Self {
        self.dns_servers = servers;
        self
    }

    /// Validate the descriptor and build the wire request.
    pub fn prepare(&self) -> Result<PreparedRequest, NetError> {
        let url = Url::parse(&self.url)
            .map_err(|e| NetError::invalid_input(format!("invalid URL {:?}: {e}", self.url)))?;

        let is_https = match url.scheme() {
            "http" => false,
            "https" => true,
            other => {
                return Err(NetError::invalid_input(format!(
                    "unsupported URL scheme {other:?}"
                )))
            }
        };

        let (host, host_ip) = match url.host() {
            Some(url::Host::Domain(domain)) if !domain.is_empty() => (domain.to_string(), None),
            Some(url::Host::Ipv4(ip)) => (ip.to_string(), Some(IpAddr::V4(ip))),
            Some(url::Host::Ipv6(ip)) => (ip.to_string(), Some(IpAddr::V6(ip))),
            _ => return Err(NetError::invalid_input(format!("URL has no host: {}", self.url))),
        };
        let port = url
            .port_or_known_default()
            .ok_or_else(|| NetError::invalid_input(format!("URL has no port: {}", self.url)))?;

        let method = parse_method(&self.method)?;
        let headers = self.wire_headers(&url, &method)?;

        let target = &url[Position::BeforePath..Position::AfterQuery];
        let head = render_head(&method, target, &headers);
        let mut request = Request::builder()
            .method(method)
            .uri(target)
            .version(Version::HTTP_11)
            .body(self.body.clone().into_full())
            .map_err(|e| NetError::invalid_input(format!("invalid request target {target:?}: {e}")))?;
        *request.headers_mut() = headers.to_header_map();

        Ok(PreparedRequest {
            url,
            head,
            host,
            host_ip,
            port,
            is_https,
            request,
        })
    }

    /// `Host` first (unless the caller set it), then caller headers in
    /// order, then a computed `Content-Length` when one is needed.
    fn wire_headers(&self, url: &Url, method: &Method) -> Result<OrderedHeaderMap, NetError> {
        let body_len = self.body.len();
        let mut map = OrderedHeaderMap::new();

        if !self.headers.contains("host") {
            let host_str = url.host_str().unwrap_or_default();
            let authority = match url.port() {
                Some(port) => format!("{host_str}:{port}"),
                None => host_str.to_string(),
            };
            let value = HeaderValue::from_str(&authority)
                .map_err(|_| NetError::invalid_input(format!("invalid host {authority:?}")))?;
            map.push(header::HOST, value);
        }

        for (name, value) in self.headers.iter() {
            map.push(name.clone(), value.clone());
        }

        let has_transfer_encoding = self.headers.contains("transfer-encoding");
        if has_transfer_encoding && !ends_chunked(&self.headers) {
            return Err(NetError::invalid_input(
                "Transfer-Encoding on a request must end with chunked",
            ));
        }
        let mut declared = self.headers.get_all("content-length").peekable();
        if declared.peek().is_some() {
            if has_transfer_encoding {
                return Err(NetError::invalid_input(
                    "Content-Length and Transfer-Encoding are mutually exclusive",
                ));
            }
            for value in declared {
                let parsed = value
                    .to_str()
                    .ok()
                    .and_then(|v| v.trim().parse::<usize>().ok());
                if parsed != Some(body_len) {
                    return Err(NetError::invalid_input(format!(
                        "Content-Length {value:?} does not match body length {body_len}"
                    )));
                }
            }
        } else if !has_transfer_encoding && (body_len > 0 || expects_body(method)) {
            map.push(header::CONTENT_LENGTH, HeaderValue::from(body_len));
        }

        Ok(map)
    }
}

fn parse_method(raw: &str) -> Result<Method, NetError> {
    if raw.is_empty() {
        return Ok(Method::GET);
    }
    Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
        .map_err(|_| NetError::invalid_input(format!("invalid method {raw:?}")))
}

/// Whether the last coding across all `Transfer-Encoding` lines is `chunked`.
fn ends_chunked(headers: &OrderedHeaderMap) -> bool {
    headers
        .get_all("transfer-encoding")
        .last()
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit(',').next())
        .is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
}

/// Request line and header block, one line per entry in order.
fn render_head(method: &Method, target: &str, headers: &OrderedHeaderMap) -> Bytes {
    let mut head = BytesMut::with_capacity(64 + headers.len() * 32);
    head.put_slice(method.as_str().as_bytes());
    head.put_u8(b' ');
    head.put_slice(target.as_bytes());
    head.put_slice(b" HTTP/1.1\r\n");
    for (name, value) in headers.as_title_case() {
        head.put_slice(name.as_bytes());
        head.put_slice(b": ");
        head.put_slice(value.as_bytes());
        head.put_slice(b"\r\n");
    }
    head.put_slice(b"\r\n");
    head.freeze()
}

fn expects_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// A validated request, ready for the transaction.
#[derive(Debug)]
pub struct PreparedRequest {
    pub url: Url,
    /// Request line and headers in caller order, ending with the blank line.
    pub head: Bytes,
    /// URL host without IPv6 brackets; the TLS server name.
    pub host: String,
    /// Set when the URL host is an IP literal.
    pub host_ip: Option<IpAddr>,
    pub port: u16,
    pub is_https: bool,
    pub request: Request<Full<Bytes>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header<'a>(prepared: &'a PreparedRequest, name: &str) -> Option<&'a str> {
        prepared
            .request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
    }

    #[test]
    fn test_prepare_basic_get() {
        let prepared = RequestDescriptor::get("http://example.com/a/b?x=1#frag")
            .prepare()
            .unwrap();
        assert_eq!(prepared.request.method(), Method::GET);
        assert_eq!(prepared.request.uri(), "/a/b?x=1");
        assert_eq!(prepared.port, 80);
        assert!(!prepared.is_https);
        assert_eq!(header(&prepared, "host"), Some("example.com"));
        assert!(header(&prepared, "content-length").is_none());
    }

    #[test]
    fn test_host_header_keeps_explicit_port() {
        let prepared = RequestDescriptor::get("https://[::1]:8443/").prepare().unwrap();
        assert_eq!(header(&prepared, "host"), Some("[::1]:8443"));
        assert_eq!(prepared.host, "::1");
        assert_eq!(prepared.host_ip, Some("::1".parse().unwrap()));
        assert_eq!(prepared.port, 8443);
    }

    #[test]
    fn test_caller_host_wins() {
        let prepared = RequestDescriptor::get("http://127.0.0.1/")
            .header("Host", "virtual.test")
            .unwrap()
            .prepare()
            .unwrap();
        assert_eq!(header(&prepared, "host"), Some("virtual.test"));
        assert_eq!(prepared.request.headers().get_all("host").iter().count(), 1);
    }

    #[test]
    fn test_method_is_uppercased() {
        let prepared = RequestDescriptor::new("patch", "http://example.com/")
            .prepare()
            .unwrap();
        assert_eq!(prepared.request.method(), Method::PATCH);
        // PATCH without a body still announces its length
        assert_eq!(header(&prepared, "content-length"), Some("0"));
    }

    #[test]
    fn test_custom_method_token() {
        let prepared = RequestDescriptor::new("purge", "http://example.com/")
            .prepare()
            .unwrap();
        assert_eq!(prepared.request.method().as_str(), "PURGE");
    }

    #[test]
    fn test_empty_method_defaults_to_get() {
        let prepared = RequestDescriptor::new("", "http://example.com/").prepare().unwrap();
        assert_eq!(prepared.request.method(), Method::GET);
    }

    #[test]
    fn test_content_length_added_for_body() {
        let prepared = RequestDescriptor::new("POST", "http://example.com/")
            .body("hello")
            .prepare()
            .unwrap();
        assert_eq!(header(&prepared, "content-length"), Some("5"));
    }

    #[test]
    fn test_transfer_encoding_suppresses_content_length() {
        let prepared = RequestDescriptor::new("POST", "http://example.com/")
            .header("Transfer-Encoding", "chunked")
            .unwrap()
            .body("hello")
            .prepare()
            .unwrap();
        assert!(header(&prepared, "content-length").is_none());
    }

    #[test]
    fn test_matching_content_length_accepted() {
        let prepared = RequestDescriptor::new("PUT", "http://example.com/")
            .header("Content-Length", "3")
            .unwrap()
            .body("abc")
            .prepare()
            .unwrap();
        assert_eq!(prepared.request.headers().get_all("content-length").iter().count(), 1);
    }

    #[test]
    fn test_rejections() {
        let cases = [
            RequestDescriptor::get("ftp://example.com/"),
            RequestDescriptor::get("not a url"),
            RequestDescriptor::get("file:///etc/passwd"),
            RequestDescriptor::new("BAD METHOD", "http://example.com/"),
            RequestDescriptor::new("POST", "http://example.com/")
                .header("Content-Length", "10")
                .unwrap()
                .body("short"),
            RequestDescriptor::new("POST", "http://example.com/")
                .header("Content-Length", "5")
                .unwrap()
                .header("Transfer-Encoding", "chunked")
                .unwrap()
                .body("short"),
        ];
        for descriptor in cases {
            let err = descriptor.prepare().unwrap_err();
            assert_eq!(err.kind(), "InvalidInput", "{descriptor:?}");
        }
    }

    #[test]
    fn test_head_keeps_interleaved_order() {
        let prepared = RequestDescriptor::new("POST", "http://example.com:8080/up?x=1")
            .header("X-A", "1")
            .unwrap()
            .header("X-B", "2")
            .unwrap()
            .header("X-A", "3")
            .unwrap()
            .body("hey")
            .prepare()
            .unwrap();
        let head = std::str::from_utf8(&prepared.head).unwrap();
        assert_eq!(
            head,
            "POST /up?x=1 HTTP/1.1\r\n\
             Host: example.com:8080\r\n\
             X-A: 1\r\n\
             X-B: 2\r\n\
             X-A: 3\r\n\
             Content-Length: 3\r\n\
             \r\n"
        );
    }

    #[test]
    fn test_transfer_encoding_must_end_chunked() {
        let err = RequestDescriptor::new("POST", "http://example.com/")
            .header("Transfer-Encoding", "gzip")
            .unwrap()
            .body("x")
            .prepare()
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidInput");

        assert!(RequestDescriptor::new("POST", "http://example.com/")
            .header("Transfer-Encoding", "gzip, chunked")
            .unwrap()
            .prepare()
            .is_ok());
    }

    #[test]
    fn test_duplicate_headers_survive() {
        let prepared = RequestDescriptor::get("http://example.com/")
            .header("X-Tag", "one")
            .unwrap()
            .header("X-Tag", "two")
            .unwrap()
            .prepare()
            .unwrap();
        let values: Vec<_> = prepared.request.headers().get_all("x-tag").iter().collect();
        assert_eq!(values, vec!["one", "two"]);
    }
}
