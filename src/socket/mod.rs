//! Socket and connection handling.
//!
//! - [`connectjob`]: ordered TCP connect over a resolved address set, then TLS
//! - [`client`]: plain/TLS stream enum handed to the HTTP layer
//! - [`tls`]: rustls client configuration and the process-wide trust store
//! - [`unix`]: Unix-domain connector returning raw descriptors
//!
//! Nothing here is pooled: every connection belongs to exactly one request.

pub mod client;
pub mod connectjob;
pub mod tls;
pub mod unix;

pub use client::SocketType;
pub use connectjob::ConnectJob;
pub use tls::TlsConfig;
