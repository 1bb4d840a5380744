//! Tunables for the resolver and the executor.
//!
//! Both option sets are plain values: each call takes its own copy, so there
//! is nothing process-wide to lock or invalidate.

use std::time::Duration;

/// Per-server DNS timeout when the caller does not override it.
pub const DEFAULT_DNS_SERVER_TIMEOUT: Duration = Duration::from_secs(5);

/// Request budget used when a descriptor carries `timeout_ms == 0`.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest response body collected before failing with `ResponseTooLarge`.
pub const DEFAULT_MAX_RESPONSE_BODY: usize = 64 * 1024 * 1024;

/// Well-known DNS port.
pub const DNS_PORT: u16 = 53;

/// Options for [`DnsResolver`](crate::dns::DnsResolver).
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Budget for one name server before falling back to the next.
    pub server_timeout: Duration,
    /// Query attempts the underlying client makes per server inside the budget.
    pub attempts: usize,
    /// Return IPv4 records before IPv6 records.
    pub ipv4_first: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            server_timeout: DEFAULT_DNS_SERVER_TIMEOUT,
            attempts: 1,
            ipv4_first: true,
        }
    }
}

impl ResolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn server_timeout(mut self, timeout: Duration) -> Self {
        self.server_timeout = timeout;
        self
    }

    pub fn attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn ipv4_first(mut self, enabled: bool) -> Self {
        self.ipv4_first = enabled;
        self
    }
}

/// Options for [`HttpExecutor`](crate::http::HttpExecutor).
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorOptions {
    /// Budget applied when a request does not carry its own timeout.
    pub default_timeout: Duration,
    /// Response body cap in bytes.
    pub max_response_body: usize,
    /// Options used when the URL host needs DNS resolution.
    pub resolver: ResolverOptions,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_response_body: DEFAULT_MAX_RESPONSE_BODY,
            resolver: ResolverOptions::default(),
        }
    }
}

impl ExecutorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn max_response_body(mut self, limit: usize) -> Self {
        self.max_response_body = limit;
        self
    }

    pub fn resolver(mut self, options: ResolverOptions) -> Self {
        self.resolver = options;
        self
    }

    /// Resolve a descriptor timeout in milliseconds into a budget.
    pub fn budget(&self, timeout_ms: u64) -> Duration {
        if timeout_ms == 0 {
            self.default_timeout
        } else {
            Duration::from_millis(timeout_ms)
        }
    }
}
