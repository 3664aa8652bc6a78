//! Entry points: parse or format one script and wrap the outcome in an
//! [`Envelope`].
//!
//! Options are resolved per call; nothing is shared between calls.

use log::debug;

use crate::config::{self, ParserOptions, RawParserOptions, RawPrinterOptions, SyntaxOptions};
use crate::envelope::Envelope;
use crate::error::Error;
use crate::{flatten, parse, print};

/// Parse `text` with host-supplied options.
pub fn parse(text: &str, filepath: &str, parser: &RawParserOptions) -> Envelope {
    match config::to_parser_options(parser) {
        Ok(options) => parse_with(text, filepath, &options),
        Err(e) => Envelope::failed(&e.into()),
    }
}

/// Parse `text` with resolved options.
pub fn parse_with(text: &str, filepath: &str, options: &ParserOptions) -> Envelope {
    debug!("parse {filepath:?}: {} bytes, {options:?}", text.len());
    match parse::parse(text, filepath, options) {
        Ok(file) => Envelope::parsed(flatten::flatten_file(&file)),
        Err(e) => Envelope::failed(&e),
    }
}

/// Format `text` with host-supplied options.
pub fn format(
    text: &str,
    filepath: &str,
    parser: &RawParserOptions,
    printer: &RawPrinterOptions,
) -> Envelope {
    match SyntaxOptions::from_raw(parser, printer) {
        Ok(options) => format_with(text, filepath, &options),
        Err(e) => Envelope::failed(&e.into()),
    }
}

/// Format `text` with resolved options.
pub fn format_with(text: &str, filepath: &str, options: &SyntaxOptions) -> Envelope {
    debug!("format {filepath:?}: {} bytes, {options:?}", text.len());
    match print_text(text, filepath, options) {
        Ok(text) => Envelope::printed(text),
        Err(e) => Envelope::failed(&e),
    }
}

/// Parse then print.
pub fn print_text(text: &str, filepath: &str, options: &SyntaxOptions) -> Result<String, Error> {
    let file = parse::parse(text, filepath, &options.parser)?;
    print::print(&file, &options.printer)
}
