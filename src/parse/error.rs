use std::fmt;

use super::types::Pos;
use super::variant::Variant;

/// A syntax error, positioned at the offending token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub filename: String,
    pub pos: Pos,
    /// What the parser objected to, without the location prefix.
    pub text: String,
    /// True when the input ended before the construct was complete, so
    /// more input could make it valid.
    pub incomplete: bool,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.filename.is_empty() {
            write!(f, "{}:", self.filename)?;
        }
        write!(f, "{}: {}", self.pos, self.text)
    }
}

impl std::error::Error for ParseError {}

/// A construct the selected language variant does not support.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangError {
    pub filename: String,
    pub pos: Pos,
    /// Plural or singular name of the construct, e.g. `arrays`.
    pub feature: &'static str,
    /// The variants that do accept it.
    pub langs: &'static [Variant],
    pub used: Variant,
}

impl fmt::Display for LangError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.filename.is_empty() {
            write!(f, "{}:", self.filename)?;
        }
        let verb = if self.feature.ends_with('s') { "are" } else { "is" };
        let langs: Vec<&str> = self.langs.iter().map(|l| l.name()).collect();
        let plural = if langs.len() > 1 { "" } else { "-only" };
        write!(
            f,
            "{}: {} {verb} a {}{plural} feature; tried parsing as {}",
            self.pos,
            self.feature,
            langs.join("/"),
            self.used
        )
    }
}

impl std::error::Error for LangError {}
