//! rustls client configuration.
//!
//! Server certificates are verified against the host's native trust store,
//! with the Mozilla root set from `webpki-roots` as a fallback when the
//! native store is unavailable or empty. Only HTTP/1.1 is offered via ALPN.

use crate::base::neterror::NetError;
use rustls::pki_types::CertificateDer;
use rustls::{ClientConfig, RootCertStore};
use std::sync::{Arc, LazyLock};

const ALPN_HTTP11: &[u8] = b"http/1.1";

static SHARED: LazyLock<Result<Arc<ClientConfig>, NetError>> =
    LazyLock::new(|| TlsConfig::default().build());

/// Builder for rustls client configurations.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub use_native_roots: bool,
    /// Add the Mozilla roots when no native root could be loaded.
    pub webpki_fallback: bool,
    pub extra_roots: Vec<CertificateDer<'static>>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            use_native_roots: true,
            webpki_fallback: true,
            extra_roots: Vec::new(),
        }
    }
}

impl TlsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// A configuration that trusts only the roots added with
    /// [`add_root`](Self::add_root).
    pub fn custom_roots_only() -> Self {
        Self {
            use_native_roots: false,
            webpki_fallback: false,
            extra_roots: Vec::new(),
        }
    }

    #[must_use]
    pub fn add_root(mut self, der: CertificateDer<'static>) -> Self {
        self.extra_roots.push(der);
        self
    }

    /// The process-wide default configuration, built on first use.
    pub fn shared() -> Result<Arc<ClientConfig>, NetError> {
        (*SHARED).clone()
    }

    fn root_store(&self) -> RootCertStore {
        let mut roots = RootCertStore::empty();

        if self.use_native_roots {
            let loaded = rustls_native_certs::load_native_certs();
            for err in &loaded.errors {
                tracing::warn!(error = %err, "failed to load native certificates");
            }
            let (added, ignored) = roots.add_parsable_certificates(loaded.certs);
            tracing::debug!(added, ignored, "loaded native root certificates");
        }

        if roots.is_empty() && self.webpki_fallback {
            tracing::debug!("using bundled webpki roots");
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        }

        for der in &self.extra_roots {
            if let Err(e) = roots.add(der.clone()) {
                tracing::warn!(error = %e, "failed to add custom root certificate");
            }
        }
        roots
    }

    pub fn build(&self) -> Result<Arc<ClientConfig>, NetError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let mut config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| NetError::TlsFailure(format!("invalid TLS configuration: {e}")))?
            .with_root_certificates(self.root_store())
            .with_no_client_auth();

        config.alpn_protocols = vec![ALPN_HTTP11.to_vec()];
        Ok(Arc::new(config))
    }
}
