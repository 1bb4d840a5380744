//! HTTP/1.1 request execution.
//!
//! - [`request`]: caller-facing descriptor and validation
//! - [`transaction`]: resolve → connect → TLS → send → read state machine
//! - [`wirehead`]: sends the request head in caller order under hyper
//! - [`executor`]: timeout, resolver selection and the blocking entry point

pub mod executor;
pub mod orderedheaders;
pub mod request;
pub mod requestbody;
pub mod response;
pub mod transaction;
pub mod wirehead;

// Re-exports for convenience
pub use executor::{execute, HttpExecutor};
pub use orderedheaders::OrderedHeaderMap;
pub use request::RequestDescriptor;
pub use requestbody::RequestBody;
pub use response::HttpResponse;
