//! Result structures that cross the C boundary, and their allocation.
//!
//! Everything handed out is allocated with the Rust global allocator:
//! strings via `CString::into_raw`, arrays and byte buffers as boxed slices,
//! structures via `Box::into_raw`. Each has exactly one matching release
//! path in this module. Empty arrays and buffers are null with length 0.

use crate::base::neterror::NetError;
use crate::dns::AddressSet;
use crate::http::HttpResponse as NativeResponse;
use bytes::Bytes;
use std::ffi::{c_char, CStr, CString};
use std::ptr;

/// Outcome of `dns_resolve`/`dns_resolve_simple`.
///
/// On success `addresses` holds `count` NUL-terminated strings and `error`
/// is null. On failure `addresses` is null, `count` is 0 and `error` holds
/// `"<Kind>: <message>"`.
#[repr(C)]
#[derive(Debug)]
pub struct DnsResult {
    pub addresses: *mut *mut c_char,
    pub count: usize,
    pub error: *mut c_char,
}

/// Request description read by `http_request_execute`. Owned by the caller.
#[repr(C)]
#[derive(Debug)]
pub struct HttpRequest {
    pub url: *const c_char,
    /// Null or empty means `GET`.
    pub method: *const c_char,
    /// `headers_count` strings of the form `"Name: value"`.
    pub headers: *const *const c_char,
    pub headers_count: usize,
    /// May be null only when `body_len` is 0.
    pub body: *const u8,
    pub body_len: usize,
    /// 0 selects the default timeout.
    pub timeout_ms: u64,
}

/// Outcome of `http_request_execute`.
///
/// On success `status_code` is non-zero and `error` is null. On failure
/// `status_code` is 0, `body` and `headers` are null and `error` is set.
#[repr(C)]
#[derive(Debug)]
pub struct HttpResponse {
    pub body: *mut u8,
    pub body_len: usize,
    pub status_code: u16,
    /// `headers_count` strings of the form `"name: value"`, in received order.
    pub headers: *mut *mut c_char,
    pub headers_count: usize,
    pub error: *mut c_char,
}

/// Allocate a C string. Interior NUL bytes are dropped.
pub fn string_into_raw(s: impl Into<Vec<u8>>) -> *mut c_char {
    let cstring = match CString::new(s) {
        Ok(c) => c,
        Err(e) => {
            let mut bytes = e.into_vec();
            bytes.retain(|b| *b != 0);
            CString::new(bytes).unwrap_or_default()
        }
    };
    cstring.into_raw()
}

/// # Safety
/// `ptr` must be null or come from [`string_into_raw`] and not be freed yet.
pub unsafe fn free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

fn strings_into_raw(strings: Vec<String>) -> (*mut *mut c_char, usize) {
    if strings.is_empty() {
        return (ptr::null_mut(), 0);
    }
    let raw: Box<[*mut c_char]> = strings.into_iter().map(string_into_raw).collect();
    let count = raw.len();
    (Box::into_raw(raw).cast::<*mut c_char>(), count)
}

/// # Safety
/// `ptr`/`count` must come from one [`strings_into_raw`] call.
unsafe fn free_strings(ptr: *mut *mut c_char, count: usize) {
    if ptr.is_null() {
        return;
    }
    let raw = Box::from_raw(ptr::slice_from_raw_parts_mut(ptr, count));
    for s in raw.iter() {
        free_string(*s);
    }
}

fn bytes_into_raw(bytes: Bytes) -> (*mut u8, usize) {
    if bytes.is_empty() {
        return (ptr::null_mut(), 0);
    }
    let raw: Box<[u8]> = Vec::from(bytes).into_boxed_slice();
    let len = raw.len();
    (Box::into_raw(raw).cast::<u8>(), len)
}

/// # Safety
/// `ptr`/`len` must come from one [`bytes_into_raw`] call.
unsafe fn free_bytes(ptr: *mut u8, len: usize) {
    if !ptr.is_null() {
        drop(Box::from_raw(ptr::slice_from_raw_parts_mut(ptr, len)));
    }
}

impl DnsResult {
    pub fn into_raw(result: Result<AddressSet, NetError>) -> *mut DnsResult {
        let value = match result {
            Ok(set) => {
                let (addresses, count) = strings_into_raw(set.to_strings());
                DnsResult {
                    addresses,
                    count,
                    error: ptr::null_mut(),
                }
            }
            Err(e) => DnsResult {
                addresses: ptr::null_mut(),
                count: 0,
                error: string_into_raw(e.to_string()),
            },
        };
        Box::into_raw(Box::new(value))
    }

    /// # Safety
    /// `ptr` must be null or come from [`DnsResult::into_raw`] and not be
    /// freed yet.
    pub unsafe fn free(ptr: *mut DnsResult) {
        if ptr.is_null() {
            return;
        }
        let result = Box::from_raw(ptr);
        free_strings(result.addresses, result.count);
        free_string(result.error);
    }
}

impl HttpResponse {
    pub fn into_raw(result: Result<NativeResponse, NetError>) -> *mut HttpResponse {
        let value = match result {
            Ok(response) => {
                let (headers, headers_count) = strings_into_raw(response.header_lines());
                let status_code = response.status().as_u16();
                let (body, body_len) = bytes_into_raw(response.into_body());
                HttpResponse {
                    body,
                    body_len,
                    status_code,
                    headers,
                    headers_count,
                    error: ptr::null_mut(),
                }
            }
            Err(e) => HttpResponse {
                body: ptr::null_mut(),
                body_len: 0,
                status_code: 0,
                headers: ptr::null_mut(),
                headers_count: 0,
                error: string_into_raw(e.to_string()),
            },
        };
        Box::into_raw(Box::new(value))
    }

    /// # Safety
    /// `ptr` must be null or come from [`HttpResponse::into_raw`] and not be
    /// freed yet.
    pub unsafe fn free(ptr: *mut HttpResponse) {
        if ptr.is_null() {
            return;
        }
        let response = Box::from_raw(ptr);
        free_bytes(response.body, response.body_len);
        free_strings(response.headers, response.headers_count);
        free_string(response.error);
    }
}

/// Borrow a caller string as UTF-8.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub unsafe fn read_str<'a>(ptr: *const c_char, what: &str) -> Result<&'a str, NetError> {
    if ptr.is_null() {
        return Err(NetError::invalid_input(format!("{what} is null")));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| NetError::invalid_input(format!("{what} is not valid UTF-8")))
}

/// Borrow `count` caller strings.
///
/// # Safety
/// Unless `count` is 0, `ptr` must point to `count` string pointers, each
/// valid per [`read_str`].
pub unsafe fn read_str_array<'a>(
    ptr: *const *const c_char,
    count: usize,
    what: &str,
) -> Result<Vec<&'a str>, NetError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    if ptr.is_null() {
        return Err(NetError::invalid_input(format!("{what} is null but count is {count}")));
    }
    std::slice::from_raw_parts(ptr, count)
        .iter()
        .enumerate()
        .map(|(i, s)| read_str(*s, &format!("{what}[{i}]")))
        .collect()
}

/// Borrow the request body.
///
/// # Safety
/// Unless `len` is 0, `ptr` must point to `len` readable bytes.
pub unsafe fn read_bytes<'a>(ptr: *const u8, len: usize) -> Result<&'a [u8], NetError> {
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(NetError::invalid_input(format!("body is null but body_len is {len}")));
    }
    Ok(std::slice::from_raw_parts(ptr, len))
}
