/*
 * lib.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Pinwire, an HTTP/1.1 client for caller-trusted TLS.
 *
 * Pinwire is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Pinwire is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Pinwire.  If not, see <http://www.gnu.org/licenses/>.
 */

//! C FFI for pinwire core, consumed by the platform URL-loading shim.
//! Requests are built with pinwire_request_*, then handed to pinwire_exchange_start, which
//! reports through C callbacks. All string parameters are UTF-8 NUL-terminated.

use libc::{c_char, c_int, c_void, size_t};
use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::fmt;
use std::ptr;
use std::sync::{Arc, RwLock};

use pinwire_core::http::{cancellation, CancelHandle, Method, RequestDescriptor, ResponseHandler, TransportAdapter};
use pinwire_core::net::{Certificate, PlatformTrust, TrustDecision, TrustEvaluator};
use pinwire_core::{AdapterConfig, HttpError};
use tracing::debug;

/// Wrapper so *mut c_void can be moved into Send closures. C callbacks are invoked from runtime worker threads.
struct SendableUserData(*mut c_void);
unsafe impl Send for SendableUserData {}
unsafe impl Sync for SendableUserData {}

/// Response head: status, then `count` headers (valid for the call).
type OnResponse = extern "C" fn(u16, *const PinwireHeader, size_t, *mut c_void);
/// Body chunk, valid for the call.
type OnData = extern "C" fn(*const u8, size_t, *mut c_void);
/// Terminal event: PINWIRE_OK or an error code, and a message (NULL on success).
type OnFinished = extern "C" fn(c_int, *const c_char, *mut c_void);
/// Trust decision for a TLS peer: host, DER chain (leaf first), count. Non-zero accepts.
type TrustCallback = extern "C" fn(*const c_char, *const PinwireCertificate, size_t, *mut c_void) -> c_int;

/// Exchange callbacks. Any may be NULL.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct PinwireCallbacks {
    pub on_response: Option<OnResponse>,
    pub on_data: Option<OnData>,
    pub on_finished: Option<OnFinished>,
}

/// One response header. Name is lower-cased. Both are UTF-8 and not NUL-terminated;
/// either may contain NUL bytes.
#[repr(C)]
pub struct PinwireHeader {
    pub name: *const u8,
    pub name_len: size_t,
    pub value: *const u8,
    pub value_len: size_t,
}

/// One DER certificate, borrowed for the duration of a trust callback.
#[repr(C)]
pub struct PinwireCertificate {
    pub data: *const u8,
    pub len: size_t,
}

pub const PINWIRE_OK: c_int = 0;
pub const PINWIRE_ERR_MALFORMED_STATUS_LINE: c_int = 1;
pub const PINWIRE_ERR_MALFORMED_HEADER_LINE: c_int = 2;
pub const PINWIRE_ERR_INVALID_ENCODING: c_int = 3;
pub const PINWIRE_ERR_TRANSPORT: c_int = 4;
pub const PINWIRE_ERR_CANCELLED: c_int = 5;
pub const PINWIRE_ERR_UNSUPPORTED_BODY: c_int = 6;
pub const PINWIRE_ERR_INVALID_TARGET: c_int = 7;
/// Returned by setters on bad arguments (NULL pointer, invalid UTF-8, bad JSON).
pub const PINWIRE_ERR_INVALID_ARGUMENT: c_int = -1;

fn error_code(err: &HttpError) -> c_int {
    match err {
        HttpError::MalformedStatusLine(_) => PINWIRE_ERR_MALFORMED_STATUS_LINE,
        HttpError::MalformedHeaderLine(_) => PINWIRE_ERR_MALFORMED_HEADER_LINE,
        HttpError::InvalidEncoding(_) => PINWIRE_ERR_INVALID_ENCODING,
        HttpError::Transport(_) => PINWIRE_ERR_TRANSPORT,
        HttpError::Cancelled => PINWIRE_ERR_CANCELLED,
        HttpError::UnsupportedBody => PINWIRE_ERR_UNSUPPORTED_BODY,
        HttpError::InvalidTarget(_) => PINWIRE_ERR_INVALID_TARGET,
    }
}

/// Hosts the shared tokio runtime for all exchanges and the adapter configuration.
struct Registry {
    runtime: tokio::runtime::Runtime,
    config: RwLock<AdapterConfig>,
}

fn registry() -> &'static Registry {
    static REGISTRY: once_cell::sync::OnceCell<Registry> = once_cell::sync::OnceCell::new();
    REGISTRY.get_or_init(|| {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("failed to create tokio runtime");
        Registry {
            runtime,
            config: RwLock::new(AdapterConfig::default()),
        }
    })
}

/// Store `config`, recovering the lock if a writer panicked.
fn replace_config(slot: &RwLock<AdapterConfig>, config: AdapterConfig) {
    *slot.write().unwrap_or_else(|e| e.into_inner()) = config;
}

fn ptr_to_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string()) }
}

thread_local! {
    static LAST_ERROR: std::cell::RefCell<Option<CString>> = std::cell::RefCell::new(None);
}

fn set_last_error(err: &dyn fmt::Display) {
    let msg = CString::new(err.to_string()).unwrap_or_else(|_| CString::new("(error)").unwrap());
    LAST_ERROR.with(|e| *e.borrow_mut() = Some(msg));
}

fn clear_last_error() {
    LAST_ERROR.with(|e| *e.borrow_mut() = None);
}

/// Forwards exchange events to the C callbacks.
struct CallbackHandler {
    callbacks: PinwireCallbacks,
    user_data: SendableUserData,
}

impl ResponseHandler for CallbackHandler {
    fn response_received(&mut self, status: u16, headers: &HashMap<String, String>) {
        let Some(cb) = self.callbacks.on_response else {
            return;
        };
        let entries: Vec<PinwireHeader> = headers
            .iter()
            .map(|(k, v)| PinwireHeader {
                name: k.as_ptr(),
                name_len: k.len(),
                value: v.as_ptr(),
                value_len: v.len(),
            })
            .collect();
        cb(status, entries.as_ptr(), entries.len(), self.user_data.0);
    }

    fn data_received(&mut self, data: &[u8]) {
        if let Some(cb) = self.callbacks.on_data {
            cb(data.as_ptr(), data.len(), self.user_data.0);
        }
    }

    fn finished(&mut self, error: Option<HttpError>) {
        let Some(cb) = self.callbacks.on_finished else {
            return;
        };
        match error {
            None => cb(PINWIRE_OK, ptr::null(), self.user_data.0),
            Some(e) => {
                let msg = CString::new(e.to_string()).unwrap_or_else(|_| CString::new("(error)").unwrap());
                cb(error_code(&e), msg.as_ptr(), self.user_data.0);
            }
        }
    }
}

/// Trust evaluator backed by a C callback.
struct CallbackTrust {
    callback: TrustCallback,
    user_data: SendableUserData,
}

impl TrustEvaluator for CallbackTrust {
    fn evaluate(&self, host: &str, chain: &[Certificate<'_>]) -> TrustDecision {
        let host_c = match CString::new(host) {
            Ok(h) => h,
            Err(_) => return TrustDecision::Reject,
        };
        let certs: Vec<PinwireCertificate> = chain
            .iter()
            .map(|c| PinwireCertificate {
                data: c.as_ptr(),
                len: c.len(),
            })
            .collect();
        let verdict = (self.callback)(host_c.as_ptr(), certs.as_ptr(), certs.len(), self.user_data.0);
        TrustDecision::from(verdict != 0)
    }
}

/// Opaque request under construction.
pub struct PinwireRequest {
    inner: RequestDescriptor,
}

/// Opaque handle to a running or finished exchange.
pub struct PinwireExchange {
    cancel: CancelHandle,
}

/// Version string (static, do not free).
#[no_mangle]
pub extern "C" fn pinwire_version() -> *const c_char {
    b"0.1.0\0".as_ptr() as *const c_char
}

/// Last error message from a failed call on this thread. Valid until next FFI call. Do not free.
#[no_mangle]
pub extern "C" fn pinwire_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        e.borrow()
            .as_ref()
            .map(|s| s.as_ptr())
            .unwrap_or(ptr::null())
    })
}

/// Replace the adapter configuration used by exchanges started afterwards. `json` is an
/// AdapterConfig document; omitted fields take their defaults.
#[no_mangle]
pub unsafe extern "C" fn pinwire_set_config_json(json: *const c_char) -> c_int {
    let json = match ptr_to_str(json) {
        Some(s) => s,
        None => {
            set_last_error(&"json is null or not valid UTF-8");
            return PINWIRE_ERR_INVALID_ARGUMENT;
        }
    };
    match AdapterConfig::from_json(&json) {
        Ok(config) => {
            replace_config(&registry().config, config);
            clear_last_error();
            PINWIRE_OK
        }
        Err(e) => {
            set_last_error(&e);
            PINWIRE_ERR_INVALID_ARGUMENT
        }
    }
}

// ---------- Request ----------

/// Create a request for an absolute http/https URL. method NULL or "" means GET.
/// Returns NULL on error (see pinwire_last_error). Free with pinwire_request_free unless
/// passed to pinwire_exchange_start.
#[no_mangle]
pub unsafe extern "C" fn pinwire_request_new(method: *const c_char, url: *const c_char) -> *mut PinwireRequest {
    let url = match ptr_to_str(url) {
        Some(s) => s,
        None => {
            set_last_error(&"url is null or not valid UTF-8");
            return ptr::null_mut();
        }
    };
    let method = Method::parse(&ptr_to_str(method).unwrap_or_default());
    match RequestDescriptor::from_url(method, &url) {
        Ok(inner) => {
            clear_last_error();
            Box::into_raw(Box::new(PinwireRequest { inner }))
        }
        Err(e) => {
            set_last_error(&e);
            ptr::null_mut()
        }
    }
}

/// Append a header. Headers are sent in the order added; duplicates are kept.
#[no_mangle]
pub unsafe extern "C" fn pinwire_request_add_header(
    request: *mut PinwireRequest,
    name: *const c_char,
    value: *const c_char,
) -> c_int {
    let request = match request.as_mut() {
        Some(r) => r,
        None => {
            set_last_error(&"request is null");
            return PINWIRE_ERR_INVALID_ARGUMENT;
        }
    };
    match (ptr_to_str(name), ptr_to_str(value)) {
        (Some(name), Some(value)) => {
            request.inner.header(name, value);
            clear_last_error();
            PINWIRE_OK
        }
        _ => {
            set_last_error(&"header name or value is null or not valid UTF-8");
            PINWIRE_ERR_INVALID_ARGUMENT
        }
    }
}

/// Set the request body (copied). data may be NULL only when len is 0.
#[no_mangle]
pub unsafe extern "C" fn pinwire_request_set_body(request: *mut PinwireRequest, data: *const u8, len: size_t) -> c_int {
    let request = match request.as_mut() {
        Some(r) => r,
        None => {
            set_last_error(&"request is null");
            return PINWIRE_ERR_INVALID_ARGUMENT;
        }
    };
    let body = if len == 0 {
        Vec::new()
    } else if data.is_null() {
        set_last_error(&"body data is null");
        return PINWIRE_ERR_INVALID_ARGUMENT;
    } else {
        std::slice::from_raw_parts(data, len).to_vec()
    };
    request.inner.body(body);
    clear_last_error();
    PINWIRE_OK
}

/// Free a request that was not started. No-op if NULL.
#[no_mangle]
pub unsafe extern "C" fn pinwire_request_free(request: *mut PinwireRequest) {
    if !request.is_null() {
        drop(Box::from_raw(request));
    }
}

// ---------- Exchange ----------

/// Start an exchange. Takes ownership of `request`. Callbacks run on a runtime worker
/// thread (marshal to the main thread if needed): on_response at most once, on_data zero
/// or more times, on_finished exactly once. With a NULL trust callback the platform roots
/// decide TLS trust. Returns NULL on error (request is freed); free the handle with
/// pinwire_exchange_free.
#[no_mangle]
pub unsafe extern "C" fn pinwire_exchange_start(
    request: *mut PinwireRequest,
    callbacks: *const PinwireCallbacks,
    trust_callback: Option<TrustCallback>,
    user_data: *mut c_void,
) -> *mut PinwireExchange {
    if request.is_null() {
        set_last_error(&"request is null");
        return ptr::null_mut();
    }
    let request = Box::from_raw(request).inner;
    let callbacks = match callbacks.as_ref() {
        Some(c) => *c,
        None => {
            set_last_error(&"callbacks is null");
            return ptr::null_mut();
        }
    };
    let trust: Arc<dyn TrustEvaluator> = match trust_callback {
        Some(callback) => Arc::new(CallbackTrust {
            callback,
            user_data: SendableUserData(user_data),
        }),
        None => match PlatformTrust::new() {
            Ok(t) => Arc::new(t),
            Err(e) => {
                set_last_error(&e);
                return ptr::null_mut();
            }
        },
    };
    let config = registry()
        .config
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone();
    let (cancel, signal) = cancellation();
    let mut handler = CallbackHandler {
        callbacks,
        user_data: SendableUserData(user_data),
    };
    debug!(host = ?request.host, "spawning exchange task");
    registry().runtime.spawn(async move {
        let mut adapter = TransportAdapter::network(trust, config);
        adapter.execute(&request, &mut handler, signal).await;
    });
    clear_last_error();
    Box::into_raw(Box::new(PinwireExchange { cancel }))
}

/// Cancel an exchange. on_finished is delivered with PINWIRE_ERR_CANCELLED unless the
/// exchange already finished. Safe to call more than once.
#[no_mangle]
pub unsafe extern "C" fn pinwire_exchange_cancel(exchange: *const PinwireExchange) {
    if let Some(exchange) = exchange.as_ref() {
        debug!("cancel requested");
        exchange.cancel.cancel();
    }
}

/// Free an exchange handle. Does not cancel: a running exchange still delivers its callbacks.
#[no_mangle]
pub unsafe extern "C" fn pinwire_exchange_free(exchange: *mut PinwireExchange) {
    if !exchange.is_null() {
        drop(Box::from_raw(exchange));
    }
}
