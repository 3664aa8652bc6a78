//! The result record handed back to the host, and its encoding.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::flatten::{File, Position};
use crate::parse::ParseError;

/// A structured syntax error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorRecord {
    pub filename: String,
    pub text: String,
    pub incomplete: bool,
    pub pos: Position,
}

impl From<&ParseError> for ErrorRecord {
    fn from(err: &ParseError) -> Self {
        Self {
            filename: err.filename.clone(),
            text: err.text.clone(),
            incomplete: err.incomplete,
            pos: err.pos.into(),
        }
    }
}

/// Outcome of one parse or format call.
///
/// `file` is set by successful parses and `text` by successful formats;
/// `message` is empty on success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub file: Option<File>,
    pub text: Option<String>,
    pub parse_error: Option<ErrorRecord>,
    pub message: String,
}

/// Classify a failure: syntax errors get a structured record, everything
/// else is a message only.
pub fn map_error(err: Option<&Error>) -> (Option<ErrorRecord>, String) {
    match err {
        None => (None, String::new()),
        Some(Error::Syntax(parse)) => (Some(parse.into()), parse.to_string()),
        Some(other) => (None, other.to_string()),
    }
}

impl Envelope {
    pub fn parsed(file: File) -> Self {
        Self {
            file: Some(file),
            ..Self::default()
        }
    }

    pub fn printed(text: String) -> Self {
        Self {
            text: Some(text),
            ..Self::default()
        }
    }

    pub fn failed(err: &Error) -> Self {
        let (parse_error, message) = map_error(Some(err));
        Self {
            parse_error,
            message,
            ..Self::default()
        }
    }

    /// JSON followed by a NUL byte.
    pub fn encode(&self) -> Vec<u8> {
        encode_or_fallback(self)
    }
}

/// Last-resort payload when even the fallback envelope cannot be encoded.
const STATIC_FALLBACK: &[u8] =
    br#"{"file":null,"text":null,"parseError":null,"message":"internal error: result could not be encoded"}"#;

/// Encode `value` as NUL-terminated JSON. If that fails, encode an
/// envelope that carries the failure instead.
pub(crate) fn encode_or_fallback<T: Serialize>(value: &T) -> Vec<u8> {
    let mut bytes = match serde_json::to_vec(value) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("falling back to a minimal envelope: {e}");
            let fallback = Envelope::failed(&Error::Encoding(e));
            serde_json::to_vec(&fallback).unwrap_or_else(|_| STATIC_FALLBACK.to_vec())
        }
    };
    bytes.push(0);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::parse::Pos;

    fn syntax_error() -> Error {
        Error::Syntax(ParseError {
            filename: String::new(),
            pos: Pos {
                offset: 5,
                line: 1,
                col: 6,
            },
            text: "reached EOF without closing quote \"".into(),
            incomplete: true,
        })
    }

    #[test]
    fn no_error() {
        assert_eq!(map_error(None), (None, String::new()));
    }

    #[test]
    fn syntax_error_is_structured() {
        let (record, message) = map_error(Some(&syntax_error()));
        let record = record.unwrap();
        assert!(record.incomplete);
        assert_eq!(record.pos.offset, 5);
        assert_eq!(message, "1:6: reached EOF without closing quote \"");
    }

    #[test]
    fn other_errors_are_message_only() {
        let err = Error::Config(ConfigError::StopAtTooLong("abcde".into()));
        let (record, message) = map_error(Some(&err));
        assert!(record.is_none());
        assert!(!message.is_empty());
    }

    #[test]
    fn encoded_envelope_keeps_all_keys() {
        let bytes = Envelope::printed("echo a\n".into()).encode();
        assert_eq!(bytes.last(), Some(&0));
        let json: serde_json::Value = serde_json::from_slice(&bytes[..bytes.len() - 1]).unwrap();
        assert_eq!(json["text"], "echo a\n");
        assert!(json["file"].is_null());
        assert!(json["parseError"].is_null());
        assert_eq!(json["message"], "");
    }

    #[test]
    fn failed_envelope_wire_names() {
        let bytes = Envelope::failed(&syntax_error()).encode();
        let json: serde_json::Value = serde_json::from_slice(&bytes[..bytes.len() - 1]).unwrap();
        assert_eq!(json["parseError"]["Incomplete"], true);
        assert_eq!(json["parseError"]["Pos"]["Col"], 6);
        assert_eq!(json["parseError"]["Filename"], "");
    }

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("refused"))
        }
    }

    #[test]
    fn encoder_failure_falls_back() {
        let bytes = encode_or_fallback(&Unencodable);
        assert_eq!(bytes.last(), Some(&0));
        let envelope: Envelope = serde_json::from_slice(&bytes[..bytes.len() - 1]).unwrap();
        assert!(envelope.message.contains("refused"));
        assert!(envelope.file.is_none());
        assert!(envelope.text.is_none());
    }
}
