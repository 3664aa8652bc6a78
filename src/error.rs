//! Crate-wide error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::parse::{LangError, ParseError};

/// Everything that can make a parse or format call fail.
#[derive(Debug, Error)]
pub enum Error {
    /// The script is not valid shell.
    #[error(transparent)]
    Syntax(#[from] ParseError),
    /// The script uses a construct its language variant lacks.
    #[error(transparent)]
    Lang(#[from] LangError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("encoding result: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Pos;

    #[test]
    fn syntax_errors_render_like_the_parser() {
        let err = Error::from(ParseError {
            filename: "a.sh".into(),
            pos: Pos {
                offset: 0,
                line: 2,
                col: 3,
            },
            text: "bad".into(),
            incomplete: false,
        });
        assert_eq!(err.to_string(), "a.sh:2:3: bad");
    }

    #[test]
    fn config_errors_convert() {
        let err: Error = ConfigError::StopAtTooLong("abcde".into()).into();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("four bytes"));
    }
}
