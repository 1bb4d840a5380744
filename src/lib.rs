//! # http_native
//!
//! A native DNS resolver and HTTP/1.1 client for hosts that can call C
//! functions but have no networking stack of their own.
//!
//! Every operation is synchronous from the caller's point of view: it builds
//! its own runtime, does the network work, and returns a complete result or
//! exactly one error. Nothing is cached or pooled between calls.
//!
//! ## Features
//!
//! - **DNS**: explicit, ordered name-server lists with per-server timeout and
//!   fallback, or the system configuration; IPv4-first address ordering
//! - **HTTP/1.1**: caller-controlled method, ordered (and repeated) headers,
//!   body and timeout; Content-Length and chunked responses; no redirects
//! - **TLS**: rustls against the native trust store, Mozilla roots as fallback
//! - **C ABI**: `#[repr(C)]` results with paired release functions
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use http_native::{dns, http};
//!
//! let addrs = dns::resolve("example.com", &["1.1.1.1", "9.9.9.9:53"])?;
//! println!("{:?}", addrs.to_strings());
//!
//! let request = http::RequestDescriptor::get("https://example.com/")
//!     .header("Accept", "text/html")?
//!     .timeout_ms(5_000);
//! let response = http::execute(&request)?;
//! println!("Status: {}", response.status());
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error taxonomy, options and the per-call runtime
//! - [`dns`] - Name-server parsing, resolvers and the fallback walk
//! - [`http`] - Request descriptors, the transaction state machine, execution
//! - [`socket`] - TCP/TLS connect and the Unix-domain connector
//! - [`ffi`] - C ABI entry points and result allocation (see `include/http_native.h`)

pub mod base;
pub mod dns;
pub mod ffi;
pub mod http;
pub mod socket;

pub use base::neterror::NetError;
