//! Request body for POST/PUT operations.

use bytes::Bytes;
use http_body_util::Full;

/// Request body for HTTP methods that send data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestBody {
    /// No body (GET, HEAD, DELETE).
    #[default]
    Empty,
    /// Body with raw bytes.
    Bytes(Bytes),
}

impl From<String> for RequestBody {
    fn from(s: String) -> Self {
        RequestBody::from(Bytes::from(s))
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(v: Vec<u8>) -> Self {
        RequestBody::from(Bytes::from(v))
    }
}

impl From<&str> for RequestBody {
    fn from(s: &str) -> Self {
        RequestBody::from(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<&[u8]> for RequestBody {
    fn from(b: &[u8]) -> Self {
        RequestBody::from(Bytes::copy_from_slice(b))
    }
}

impl From<Bytes> for RequestBody {
    /// Zero-length input collapses to [`RequestBody::Empty`].
    fn from(b: Bytes) -> Self {
        if b.is_empty() {
            RequestBody::Empty
        } else {
            RequestBody::Bytes(b)
        }
    }
}

impl RequestBody {
    /// Check if the body is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the length of the body in bytes.
    pub fn len(&self) -> usize {
        match self {
            RequestBody::Empty => 0,
            RequestBody::Bytes(b) => b.len(),
        }
    }

    /// Body in the form hyper's HTTP/1.1 client sends.
    pub fn into_full(self) -> Full<Bytes> {
        match self {
            RequestBody::Empty => Full::new(Bytes::new()),
            RequestBody::Bytes(b) => Full::new(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::body::Body;

    #[test]
    fn test_empty_body() {
        let body = RequestBody::Empty;
        assert!(body.is_empty());
        assert_eq!(body.len(), 0);
    }

    #[test]
    fn test_zero_length_bytes_collapse() {
        let body: RequestBody = Vec::<u8>::new().into();
        assert_eq!(body, RequestBody::Empty);
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(RequestBody::from("test").len(), 4);
        assert_eq!(RequestBody::from("hello world".to_string()).len(), 11);
        assert_eq!(RequestBody::from(vec![1u8, 2, 3, 4]).len(), 4);
        assert_eq!(RequestBody::from(&b"raw"[..]).len(), 3);
    }

    #[test]
    fn test_into_full_size_hint() {
        let full = RequestBody::from("payload").into_full();
        assert_eq!(full.size_hint().exact(), Some(7));

        let empty = RequestBody::Empty.into_full();
        assert!(empty.is_end_stream());
    }
}
