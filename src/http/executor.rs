//! Synchronous and async request execution.

use super::request::RequestDescriptor;
use super::response::HttpResponse;
use super::transaction::HttpNetworkTransaction;
use crate::base::config::ExecutorOptions;
use crate::base::neterror::NetError;
use crate::base::runtime;
use crate::dns::{DnsResolver, DnsResolverWithOverrides, Resolve};
use rustls::ClientConfig;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

/// Executes fully-specified HTTP/1.1 requests, one connection per request.
///
/// The executor keeps no state between requests besides its options and
/// TLS configuration; it is cheap to clone and safe to share.
#[derive(Debug, Clone, Default)]
pub struct HttpExecutor {
    options: ExecutorOptions,
    tls_config: Option<Arc<ClientConfig>>,
}

impl HttpExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ExecutorOptions) -> Self {
        Self {
            options,
            tls_config: None,
        }
    }

    /// Use `config` instead of the process-wide trust store.
    #[must_use]
    pub fn tls_config(mut self, config: Arc<ClientConfig>) -> Self {
        self.tls_config = Some(config);
        self
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    /// Execute `descriptor` within its timeout.
    ///
    /// Either a complete response or exactly one error comes back; a partial
    /// response is never returned.
    pub async fn execute_async(&self, descriptor: &RequestDescriptor) -> Result<HttpResponse, NetError> {
        let prepared = descriptor.prepare()?;
        let budget = self.options.budget(descriptor.timeout_ms);

        let resolver = self.resolver_for(descriptor, &prepared.host);
        let url = prepared.url.to_string();

        let mut transaction = HttpNetworkTransaction::new(
            prepared,
            resolver,
            self.tls_config.clone(),
            self.options.max_response_body,
        );

        let outcome = tokio::time::timeout(budget, transaction.start()).await;
        match outcome {
            Ok(result) => result,
            Err(_) => {
                let stage = transaction.get_load_state();
                tracing::debug!(url = %url, state = stage.as_str(), "request timed out");
                Err(NetError::Timeout(format!(
                    "{url} did not complete within {} ms (while {})",
                    budget.as_millis(),
                    stage.as_str()
                )))
            }
        }
    }

    /// Blocking form of [`execute_async`](Self::execute_async).
    pub fn execute(&self, descriptor: &RequestDescriptor) -> Result<HttpResponse, NetError> {
        runtime::block_on(self.execute_async(descriptor))?
    }

    /// Pre-resolved addresses win over explicit servers, which win over the
    /// system configuration.
    fn resolver_for(&self, descriptor: &RequestDescriptor, host: &str) -> Arc<dyn Resolve> {
        let base = DnsResolver::new(descriptor.dns_servers.clone())
            .with_options(self.options.resolver.clone());

        if descriptor.resolved_addrs.is_empty() {
            return Arc::new(base);
        }

        let mut overrides = HashMap::with_capacity(1);
        overrides.insert(Cow::Owned(host.to_string()), descriptor.resolved_addrs.clone());
        Arc::new(DnsResolverWithOverrides::new(Arc::new(base), overrides))
    }
}

/// Execute `descriptor` with default options.
pub fn execute(descriptor: &RequestDescriptor) -> Result<HttpResponse, NetError> {
    HttpExecutor::new().execute(descriptor)
}
