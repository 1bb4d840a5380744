use thiserror::Error;

/// Every failure the core reports across the boundary.
///
/// The `Display` form is `"<Kind>: <message>"` so hosts can match on the
/// prefix without parsing the rest of the text.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum NetError {
    // Resolver errors
    #[error("ResolutionTimeout: {0}")]
    ResolutionTimeout(String),
    #[error("ResolutionFailed: {0}")]
    ResolutionFailed(String),
    #[error("NoSuchHost: {0}")]
    NoSuchHost(String),

    // Executor errors
    #[error("DnsFailure: {0}")]
    DnsFailure(String),
    #[error("ConnectFailure: {0}")]
    ConnectFailure(String),
    #[error("TlsFailure: {0}")]
    TlsFailure(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("MalformedResponse: {0}")]
    MalformedResponse(String),
    #[error("ResponseTooLarge: {0}")]
    ResponseTooLarge(String),
    #[error("IoError: {0}")]
    IoError(String),

    // Caught before any network I/O
    #[error("InvalidInput: {0}")]
    InvalidInput(String),
}

impl NetError {
    /// Stable classification name, identical to the `Display` prefix.
    pub fn kind(&self) -> &'static str {
        match self {
            NetError::ResolutionTimeout(_) => "ResolutionTimeout",
            NetError::ResolutionFailed(_) => "ResolutionFailed",
            NetError::NoSuchHost(_) => "NoSuchHost",
            NetError::DnsFailure(_) => "DnsFailure",
            NetError::ConnectFailure(_) => "ConnectFailure",
            NetError::TlsFailure(_) => "TlsFailure",
            NetError::Timeout(_) => "Timeout",
            NetError::MalformedResponse(_) => "MalformedResponse",
            NetError::ResponseTooLarge(_) => "ResponseTooLarge",
            NetError::IoError(_) => "IoError",
            NetError::InvalidInput(_) => "InvalidInput",
        }
    }

    /// The human-readable part without the classification prefix.
    pub fn message(&self) -> &str {
        match self {
            NetError::ResolutionTimeout(m)
            | NetError::ResolutionFailed(m)
            | NetError::NoSuchHost(m)
            | NetError::DnsFailure(m)
            | NetError::ConnectFailure(m)
            | NetError::TlsFailure(m)
            | NetError::Timeout(m)
            | NetError::MalformedResponse(m)
            | NetError::ResponseTooLarge(m)
            | NetError::IoError(m)
            | NetError::InvalidInput(m) => m,
        }
    }

    /// Whether this error came out of name resolution.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            NetError::ResolutionTimeout(_) | NetError::ResolutionFailed(_) | NetError::NoSuchHost(_)
        )
    }

    /// Re-classify a resolver error as seen by the HTTP executor.
    ///
    /// Resolution errors become `DnsFailure`, keeping their text; anything
    /// else (input errors in particular) passes through unchanged.
    pub fn into_dns_failure(self) -> NetError {
        if self.is_resolution_error() {
            NetError::DnsFailure(self.to_string())
        } else {
            self
        }
    }

    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        NetError::InvalidInput(msg.into())
    }
}
