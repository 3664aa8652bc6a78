//! C ABI for WebAssembly hosts.
//!
//! # Protocol
//!
//! 1. The host calls [`allocate`] for each input string, writes the UTF-8
//!    bytes into module memory at the returned address, and passes
//!    `(address, length)` pairs to [`parse`] or [`format`].
//! 2. The call returns the address of a NUL-terminated JSON envelope:
//!    `{"file", "text", "parseError", "message"}`.
//! 3. The host reads the envelope and releases every buffer, inputs and
//!    output alike, with [`deallocate`].
//!
//! Addresses are only ever resolved through the buffer registry, so a bad
//! address produces an error envelope rather than a fault. Symbols are
//! unmangled on `wasm32` only; native builds keep them as ordinary
//! functions so they do not collide with the C runtime.
//!
//! Integer flags are tri-state: negative means "use the default", zero is
//! false and positive is true. A negative `variant` or `indent` also
//! selects the default.

use std::ptr;

use log::{debug, warn};

use crate::bridge;
use crate::config::{RawParserOptions, RawPrinterOptions, RawVariant};
use crate::envelope::Envelope;
use crate::error::Error;
use crate::processor;

// ============================================================================
// Memory
// ============================================================================

/// Allocate `size` bytes of module memory for the host.
#[cfg_attr(target_arch = "wasm32", unsafe(no_mangle))]
pub extern "C" fn allocate(size: u32) -> *mut u8 {
    bridge::with(|b| {
        let handle = b.allocate(size as usize);
        b.as_mut_ptr(handle)
    })
    .unwrap_or(ptr::null_mut())
}

/// Release a buffer from [`allocate`] or a returned envelope. Unknown or
/// already released addresses are ignored.
#[cfg_attr(target_arch = "wasm32", unsafe(no_mangle))]
pub extern "C" fn deallocate(ptr: *mut u8) {
    if !bridge::with(|b| b.free_address(ptr as usize)) {
        debug!("ignoring release of unknown buffer {ptr:p}");
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Parse a script and return the address of the envelope.
#[cfg_attr(target_arch = "wasm32", unsafe(no_mangle))]
#[allow(clippy::too_many_arguments)]
pub extern "C" fn parse(
    path_ptr: *const u8,
    path_len: u32,
    text_ptr: *const u8,
    text_len: u32,
    keep_comments: i32,
    variant: i32,
    stop_at_ptr: *const u8,
    stop_at_len: u32,
    recover_errors: i32,
) -> *mut u8 {
    let envelope = match inputs((path_ptr, path_len), (text_ptr, text_len), (stop_at_ptr, stop_at_len)) {
        Ok(input) => {
            let parser = parser_options(keep_comments, variant, input.stop_at, recover_errors);
            processor::parse(&input.text, &input.path, &parser)
        }
        Err(e) => Envelope::failed(&e),
    };
    respond(&envelope)
}

/// Parse and print a script and return the address of the envelope.
#[cfg_attr(target_arch = "wasm32", unsafe(no_mangle))]
#[allow(clippy::too_many_arguments)]
pub extern "C" fn format(
    path_ptr: *const u8,
    path_len: u32,
    text_ptr: *const u8,
    text_len: u32,
    keep_comments: i32,
    variant: i32,
    stop_at_ptr: *const u8,
    stop_at_len: u32,
    recover_errors: i32,
    indent: i32,
    binary_next_line: i32,
    switch_case_indent: i32,
    space_redirects: i32,
    keep_padding: i32,
    minify: i32,
    single_line: i32,
    function_next_line: i32,
) -> *mut u8 {
    let input = match inputs((path_ptr, path_len), (text_ptr, text_len), (stop_at_ptr, stop_at_len)) {
        Ok(input) => input,
        Err(e) => return respond(&Envelope::failed(&e)),
    };
    let parser = parser_options(keep_comments, variant, input.stop_at, recover_errors);
    let printer = RawPrinterOptions {
        indent: (indent >= 0).then_some(i64::from(indent)),
        binary_next_line: flag(binary_next_line),
        switch_case_indent: flag(switch_case_indent),
        space_redirects: flag(space_redirects),
        keep_padding: flag(keep_padding),
        minify: flag(minify),
        single_line: flag(single_line),
        function_next_line: flag(function_next_line),
    };
    respond(&processor::format(&input.text, &input.path, &parser, &printer))
}

// ============================================================================
// Helpers
// ============================================================================

fn flag(value: i32) -> Option<bool> {
    (value >= 0).then_some(value > 0)
}

fn parser_options(keep_comments: i32, variant: i32, stop_at: String, recover_errors: i32) -> RawParserOptions {
    RawParserOptions {
        keep_comments: flag(keep_comments),
        variant: Some(RawVariant::Code(i64::from(variant))),
        stop_at: Some(stop_at),
        recover_errors: Some(i64::from(recover_errors)),
    }
}

/// Decoded string arguments of an entry point.
struct Inputs {
    path: String,
    text: String,
    stop_at: String,
}

fn inputs(path: (*const u8, u32), text: (*const u8, u32), stop_at: (*const u8, u32)) -> Result<Inputs, Error> {
    Ok(Inputs {
        path: host_str(path.0, path.1, "file path")?,
        text: host_str(text.0, text.1, "text")?,
        stop_at: host_str(stop_at.0, stop_at.1, "stop word")?,
    })
}

/// Copy a host string out of the registry.
fn host_str(ptr: *const u8, len: u32, what: &str) -> Result<String, Error> {
    if len == 0 {
        return Ok(String::new());
    }
    let bytes = bridge::with(|b| b.read(ptr as usize, len as usize).map(<[u8]>::to_vec))
        .ok_or_else(|| {
            warn!("rejected {what} buffer {ptr:p} ({len} bytes)");
            Error::Internal(format!("{what}: {len} bytes at {ptr:p} is not a live buffer"))
        })?;
    String::from_utf8(bytes).map_err(|e| Error::Internal(format!("{what} is not valid UTF-8: {e}")))
}

/// Store the encoded envelope in a new buffer and hand out its address.
fn respond(envelope: &Envelope) -> *mut u8 {
    let bytes = envelope.encode();
    bridge::with(|b| {
        let handle = b.store(&bytes);
        b.as_mut_ptr(handle)
    })
    .unwrap_or(ptr::null_mut())
}
