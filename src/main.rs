//! sh-syntax: parse or format a shell script from the command line.
//!
//! Reads one JSON request from stdin and writes the result envelope to
//! stdout, exactly as a WebAssembly host would receive it (minus the NUL).
//!
//! Request fields:
//!   - `text`: the script (required)
//!   - `filepath`: file name used for variant detection and error messages
//!   - `print`: format instead of parse
//!   - any parser or printer option (`keepComments`, `variant`, `indent`, ...)
//!
//! Options left out of the request fall back to
//! ~/.config/sh-syntax/config.toml, then to the built-in defaults.

use serde::Deserialize;
use std::io::Read;

use sh_syntax::config::{Config, RawParserOptions, RawPrinterOptions};
use sh_syntax::{Envelope, processor};

// ─── Types ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Request {
    text: String,
    #[serde(default)]
    filepath: String,
    #[serde(default)]
    print: bool,
    #[serde(flatten)]
    parser: RawParserOptions,
    #[serde(flatten)]
    printer: RawPrinterOptions,
}

// ─── Pipeline ────────────────────────────────────────

fn run(config: &Config, request: &Request) -> Envelope {
    let options = match config.with(&request.parser, &request.printer) {
        Ok(options) => options,
        Err(e) => return Envelope::failed(&e.into()),
    };
    if request.print {
        processor::format_with(&request.text, &request.filepath, &options)
    } else {
        processor::parse_with(&request.text, &request.filepath, &options.parser)
    }
}

// ─── Entry point ─────────────────────────────────────

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let verbose = std::env::args().skip(1).any(|a| a == "--verbose" || a == "-v");
        sh_syntax::logging::init(verbose);
    }

    let mut input = String::new();
    if std::io::stdin().read_to_string(&mut input).is_err() {
        eprintln!("failed to read stdin");
        std::process::exit(1);
    }

    let request: Request = match serde_json::from_str(&input) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("JSON parse error: {e}");
            std::process::exit(1);
        }
    };

    let envelope = run(&Config::load(), &request);
    match serde_json::to_string(&envelope) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("failed to encode result: {e}");
            std::process::exit(1);
        }
    }
    if !envelope.message.is_empty() {
        std::process::exit(1);
    }
}

// ─── Tests ───────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> Request {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn minimal_request() {
        let req = request(r#"{"text": "echo hi"}"#);
        assert_eq!(req.text, "echo hi");
        assert!(req.filepath.is_empty());
        assert!(!req.print);
        assert_eq!(req.parser, RawParserOptions::default());
    }

    #[test]
    fn options_are_flattened() {
        let req = request(r#"{"text": "a", "keepComments": true, "variant": 1, "indent": 4, "minify": true}"#);
        assert_eq!(req.parser.keep_comments, Some(true));
        assert!(req.parser.variant.is_some());
        assert_eq!(req.printer.indent, Some(4));
        assert_eq!(req.printer.minify, Some(true));
    }

    #[test]
    fn parse_request() {
        let req = request(r#"{"text": "echo hello", "filepath": "a.sh"}"#);
        let envelope = run(&Config::default(), &req);
        assert_eq!(envelope.message, "");
        assert_eq!(envelope.file.unwrap().name, "a.sh");
    }

    #[test]
    fn print_request() {
        let req = request(r#"{"text": "echo   hello", "print": true}"#);
        let envelope = run(&Config::default(), &req);
        assert_eq!(envelope.text.as_deref(), Some("echo hello\n"));
    }

    #[test]
    fn invalid_option_fails() {
        let req = request(r#"{"text": "echo", "stopAt": "a b"}"#);
        let envelope = run(&Config::default(), &req);
        assert!(envelope.file.is_none());
        assert!(!envelope.message.is_empty());
    }
}
