//! sh-syntax: a shell parser and formatter for WebAssembly hosts.
//!
//! Scripts are parsed with tree-sitter-bash, checked against the requested
//! shell variant, and either flattened into a plain syntax tree or printed
//! back as canonical source. Results cross the module boundary as
//! NUL-terminated JSON envelopes in buffers the host releases explicitly.
//!
//! # Architecture
//!
//! - **[`parse`]**: tree-sitter adapter, syntax views, variant rules and error diagnosis.
//! - **[`flatten`]**: conversion of the parsed file into serializable records.
//! - **[`print`]**: canonical printer driven by [`config::PrinterOptions`].
//! - **[`envelope`]**: the result record and its encoding.
//! - **[`bridge`]**: registry of host-visible buffers.
//! - **[`exports`]**: the C ABI (`allocate`, `deallocate`, `parse`, `format`).
//! - **[`processor`]**: option resolution and the parse/format pipelines.
//! - **[`config`]**: option types, host overlays and the user config file.

/// Host-visible buffer registry.
pub mod bridge;
/// Option types, raw host overlays and config file loading.
pub mod config;
/// Result envelope and its JSON encoding.
pub mod envelope;
/// Crate-wide error type.
pub mod error;
/// C ABI entry points.
pub mod exports;
/// Serializable syntax tree records.
pub mod flatten;
/// Logger setup for the command-line tool.
#[cfg(not(target_arch = "wasm32"))]
pub mod logging;
/// Shell parsing: tree-sitter adapter, variants, diagnostics.
pub mod parse;
/// Canonical printer.
pub mod print;
/// Parse and format pipelines.
pub mod processor;

pub use config::{ParserOptions, PrinterOptions, SyntaxOptions};
pub use envelope::Envelope;
pub use error::Error;
pub use parse::variant::Variant;
