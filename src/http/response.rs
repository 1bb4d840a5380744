//! Fully-read HTTP response.

use bytes::Bytes;
use http::{HeaderMap, StatusCode, Version};
use std::borrow::Cow;

/// HTTP response with the body already collected.
///
/// Returned only when the whole exchange succeeded; there is no partial
/// response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
}

impl HttpResponse {
    pub fn new(status: StatusCode, version: Version, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            version,
            headers,
            body,
        }
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the HTTP version.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Get a reference to the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Headers rendered as `"name: value"` lines.
    ///
    /// Names come out lowercase. Values that are not valid UTF-8 are
    /// converted lossily.
    pub fn header_lines(&self) -> Vec<String> {
        self.headers
            .iter()
            .map(|(name, value)| {
                format!("{}: {}", name.as_str(), String::from_utf8_lossy(value.as_bytes()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_header_lines_keep_duplicates() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("content-type", HeaderValue::from_static("text/plain"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));

        let response = HttpResponse::new(StatusCode::OK, Version::HTTP_11, headers, Bytes::new());
        let lines = response.header_lines();
        assert_eq!(lines.len(), 3);
        assert!(lines.contains(&"set-cookie: a=1".to_string()));
        assert!(lines.contains(&"set-cookie: b=2".to_string()));
        assert!(lines.contains(&"content-type: text/plain".to_string()));
    }

    #[test]
    fn test_text_is_lossy() {
        let response = HttpResponse::new(
            StatusCode::OK,
            Version::HTTP_11,
            HeaderMap::new(),
            Bytes::from_static(b"ok\xff"),
        );
        assert_eq!(response.text(), "ok\u{fffd}");
        assert_eq!(response.body().len(), 3);
    }
}
