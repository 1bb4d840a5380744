//! Base types and error handling.
//!
//! Provides the foundations shared by every component:
//! - [`NetError`](neterror::NetError): the failure taxonomy reported across the boundary
//! - [`LoadState`](loadstate::LoadState): request stages used in traces
//! - [`config`]: resolver and executor options
//! - [`runtime`]: the per-call runtime behind the blocking entry points

pub mod config;
pub mod context;
pub mod loadstate;
pub mod neterror;
pub mod runtime;
