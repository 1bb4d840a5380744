//! C ABI entry points.
//!
//! Every function here is synchronous. Failures come back as data (an error
//! string or a negative sentinel); panics are caught and never unwind into
//! the caller. Each allocation returned has exactly one matching release
//! function:
//!
//! | returned by                          | release with          |
//! |--------------------------------------|-----------------------|
//! | `dns_resolve`, `dns_resolve_simple`  | `dns_result_free`     |
//! | `http_request_execute`               | `http_response_free`  |
//! | `http_native_version`                | `free_cstring`        |
//! | `unix_socket_connect` (descriptor)   | `unix_socket_close`   |
//!
//! Releasing null is a no-op. Releasing twice is undefined behavior.

pub mod alloc;

pub use alloc::{DnsResult, HttpRequest, HttpResponse};

use crate::base::neterror::NetError;
use crate::http::{OrderedHeaderMap, RequestBody, RequestDescriptor};
use crate::socket::unix;
use std::any::Any;
use std::ffi::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run `f`, turning a panic into an `IoError`.
fn contained<T>(entry: &str, f: impl FnOnce() -> Result<T, NetError>) -> Result<T, NetError> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let msg = panic_message(payload);
            tracing::error!(entry, panic = %msg, "panic caught at C boundary");
            Err(NetError::IoError(format!("internal panic in {entry}: {msg}")))
        }
    }
}

/// Resolve `hostname` using `count` name servers (`host[:port]`), queried in
/// order. With `count == 0` the system configuration is used.
///
/// # Safety
/// `hostname` must be null or a NUL-terminated string. Unless `count` is 0,
/// `servers` must point to `count` NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn dns_resolve(
    hostname: *const c_char,
    servers: *const *const c_char,
    count: usize,
) -> *mut DnsResult {
    let result = contained("dns_resolve", || {
        let hostname = alloc::read_str(hostname, "hostname")?;
        let servers = alloc::read_str_array(servers, count, "dns_servers")?;
        crate::dns::resolve(hostname, &servers)
    });
    DnsResult::into_raw(result)
}

/// Resolve `hostname` with the system configuration.
///
/// # Safety
/// `hostname` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn dns_resolve_simple(hostname: *const c_char) -> *mut DnsResult {
    let result = contained("dns_resolve_simple", || {
        let hostname = alloc::read_str(hostname, "hostname")?;
        crate::dns::resolve_simple(hostname)
    });
    DnsResult::into_raw(result)
}

/// # Safety
/// `result` must be null or come from `dns_resolve`/`dns_resolve_simple`
/// and not have been released yet.
#[no_mangle]
pub unsafe extern "C" fn dns_result_free(result: *mut DnsResult) {
    let _ = catch_unwind(AssertUnwindSafe(|| DnsResult::free(result)));
}

unsafe fn read_request(request: *const HttpRequest) -> Result<RequestDescriptor, NetError> {
    let Some(request) = request.as_ref() else {
        return Err(NetError::invalid_input("request is null"));
    };

    let url = alloc::read_str(request.url, "url")?;
    let method = if request.method.is_null() {
        ""
    } else {
        alloc::read_str(request.method, "method")?
    };

    let mut headers = OrderedHeaderMap::new();
    for line in alloc::read_str_array(request.headers, request.headers_count, "headers")? {
        headers.append_line(line)?;
    }

    let body = alloc::read_bytes(request.body, request.body_len)?;

    let mut descriptor = RequestDescriptor::new(method, url)
        .body(RequestBody::from(body))
        .timeout_ms(request.timeout_ms);
    descriptor.headers = headers;
    Ok(descriptor)
}

/// Execute one HTTP/1.1 request and block until it completes, fails or
/// times out.
///
/// # Safety
/// `request` must be null or point to a valid `HttpRequest` whose pointers
/// satisfy the field documentation.
#[no_mangle]
pub unsafe extern "C" fn http_request_execute(request: *const HttpRequest) -> *mut HttpResponse {
    let result = contained("http_request_execute", || {
        let descriptor = read_request(request)?;
        crate::http::execute(&descriptor)
    });
    HttpResponse::into_raw(result)
}

/// # Safety
/// `response` must be null or come from `http_request_execute` and not have
/// been released yet.
#[no_mangle]
pub unsafe extern "C" fn http_response_free(response: *mut HttpResponse) {
    let _ = catch_unwind(AssertUnwindSafe(|| HttpResponse::free(response)));
}

/// Connect to a Unix-domain stream socket. Returns the descriptor, owned by
/// the caller, or a negative sentinel (see `http_native.h`).
///
/// # Safety
/// `path` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn unix_socket_connect(path: *const c_char) -> i32 {
    catch_unwind(AssertUnwindSafe(|| match alloc::read_str(path, "path") {
        Ok(path) => unix::connect_raw(path),
        Err(_) => unix::ERR_INVALID_ARGUMENT,
    }))
    .unwrap_or(unix::ERR_GENERIC)
}

/// Close a descriptor returned by `unix_socket_connect`.
#[no_mangle]
pub extern "C" fn unix_socket_close(handle: i32) -> i32 {
    catch_unwind(|| unix::close_raw(handle)).unwrap_or(unix::ERR_GENERIC)
}

/// Library version. Release with `free_cstring`.
#[no_mangle]
pub extern "C" fn http_native_version() -> *mut c_char {
    alloc::string_into_raw(env!("CARGO_PKG_VERSION"))
}

/// # Safety
/// `ptr` must be null or a string returned by this library and not have
/// been released yet.
#[no_mangle]
pub unsafe extern "C" fn free_cstring(ptr: *mut c_char) {
    let _ = catch_unwind(AssertUnwindSafe(|| alloc::free_string(ptr)));
}
