use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parse::Variant;

/// A rejected option value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("stop word can't be over four bytes in size: {0:?}")]
    StopAtTooLong(String),
    #[error("stop word can't contain whitespace characters: {0:?}")]
    StopAtWhitespace(String),
    #[error("unknown language variant code: {0}")]
    UnknownVariant(i64),
    #[error("unknown language variant: {0:?}")]
    UnknownVariantName(String),
}

// ── Final (resolved) option types ──

/// How scripts are parsed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParserOptions {
    /// Keep comments in the tree (and in formatted output).
    pub keep_comments: bool,
    pub variant: Variant,
    /// Stop parsing at the first word starting with this text. At most
    /// four bytes, no whitespace; empty disables it.
    pub stop_at: String,
    /// Accept up to this many missing tokens instead of failing; 0
    /// disables recovery.
    pub recover_errors: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            keep_comments: false,
            variant: Variant::Posix,
            stop_at: String::new(),
            recover_errors: 0,
        }
    }
}

impl ParserOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stop_at.len() > 4 {
            return Err(ConfigError::StopAtTooLong(self.stop_at.clone()));
        }
        if self.stop_at.contains(char::is_whitespace) {
            return Err(ConfigError::StopAtWhitespace(self.stop_at.clone()));
        }
        Ok(())
    }

    /// Override fields that `raw` sets. Absent and sentinel values leave
    /// the current value in place.
    pub fn apply(&mut self, raw: &RawParserOptions) -> Result<(), ConfigError> {
        if let Some(v) = raw.keep_comments {
            self.keep_comments = v;
        }
        if let Some(v) = raw.variant.as_ref().map(RawVariant::resolve).transpose()?.flatten() {
            self.variant = v;
        }
        if let Some(v) = raw.stop_at.as_ref().filter(|s| !s.is_empty()) {
            self.stop_at = v.clone();
        }
        if let Some(v) = raw.recover_errors {
            self.recover_errors = usize::try_from(v).unwrap_or(0);
        }
        self.validate()
    }
}

/// How parsed scripts are printed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrinterOptions {
    /// Spaces per indentation level; 0 indents with tabs.
    pub indent: u32,
    /// Break long `&&`, `||` and `|` chains before the operator.
    pub binary_next_line: bool,
    /// Indent case items one level deeper than `case`.
    pub switch_case_indent: bool,
    /// Put a space after redirect operators.
    pub space_redirects: bool,
    /// Keep the spacing between words of a simple command.
    pub keep_padding: bool,
    /// Drop indentation, comments and blank lines.
    pub minify: bool,
    /// Print each statement list on one line where possible.
    pub single_line: bool,
    /// Put a function's opening brace on its own line.
    pub function_next_line: bool,
}

impl Default for PrinterOptions {
    fn default() -> Self {
        Self {
            indent: 0,
            binary_next_line: true,
            switch_case_indent: true,
            space_redirects: true,
            keep_padding: false,
            minify: false,
            single_line: false,
            function_next_line: false,
        }
    }
}

impl PrinterOptions {
    /// Override fields that `raw` sets.
    pub fn apply(&mut self, raw: &RawPrinterOptions) {
        if let Some(v) = raw.indent.and_then(|i| u32::try_from(i).ok()) {
            self.indent = v;
        }
        let flags = [
            (&mut self.binary_next_line, raw.binary_next_line),
            (&mut self.switch_case_indent, raw.switch_case_indent),
            (&mut self.space_redirects, raw.space_redirects),
            (&mut self.keep_padding, raw.keep_padding),
            (&mut self.minify, raw.minify),
            (&mut self.single_line, raw.single_line),
            (&mut self.function_next_line, raw.function_next_line),
        ];
        for (field, value) in flags {
            if let Some(v) = value {
                *field = v;
            }
        }
    }
}

/// Parser and printer options for a format call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SyntaxOptions {
    #[serde(default)]
    pub parser: ParserOptions,
    #[serde(default)]
    pub printer: PrinterOptions,
}

// ── Raw host records ──
//
// Every field may be absent. These double as the overlay types for the
// config file.

/// A variant given either as its wire code or by name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawVariant {
    Code(i64),
    Name(String),
}

impl RawVariant {
    /// The selected variant; `None` for the "absent" sentinels (a negative
    /// code or an empty name).
    pub fn resolve(&self) -> Result<Option<Variant>, ConfigError> {
        match self {
            Self::Code(code) if *code < 0 => Ok(None),
            Self::Code(code) => Variant::from_code(*code)
                .map(Some)
                .ok_or(ConfigError::UnknownVariant(*code)),
            Self::Name(name) if name.is_empty() => Ok(None),
            Self::Name(name) => Variant::from_name(name)
                .map(Some)
                .ok_or_else(|| ConfigError::UnknownVariantName(name.clone())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawParserOptions {
    pub keep_comments: Option<bool>,
    pub variant: Option<RawVariant>,
    pub stop_at: Option<String>,
    pub recover_errors: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawPrinterOptions {
    pub indent: Option<i64>,
    pub binary_next_line: Option<bool>,
    pub switch_case_indent: Option<bool>,
    pub space_redirects: Option<bool>,
    pub keep_padding: Option<bool>,
    pub minify: Option<bool>,
    pub single_line: Option<bool>,
    pub function_next_line: Option<bool>,
}

/// Resolve host parser options against the defaults.
pub fn to_parser_options(raw: &RawParserOptions) -> Result<ParserOptions, ConfigError> {
    let mut options = ParserOptions::default();
    options.apply(raw)?;
    Ok(options)
}

/// Resolve host printer options against the defaults.
pub fn to_printer_options(raw: &RawPrinterOptions) -> PrinterOptions {
    let mut options = PrinterOptions::default();
    options.apply(raw);
    options
}

impl SyntaxOptions {
    pub fn from_raw(parser: &RawParserOptions, printer: &RawPrinterOptions) -> Result<Self, ConfigError> {
        Ok(Self {
            parser: to_parser_options(parser)?,
            printer: to_printer_options(printer),
        })
    }
}

// ── Config file (command-line driver) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    parser: RawParserOptions,
    #[serde(default)]
    printer: RawPrinterOptions,
}

/// Defaults for the command-line driver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub options: SyntaxOptions,
}

impl Config {
    /// Load configuration with resolution order:
    /// 1. Start with built-in defaults
    /// 2. Overlay ~/.config/sh-syntax/config.toml (if it exists)
    ///
    /// Keys the file sets override the defaults; a file that fails to
    /// parse or holds invalid values is reported and ignored.
    pub fn load() -> Self {
        let mut config = Self::default();
        if let Some(overlay) = Self::load_overlay()
            && let Err(e) = config.apply_overlay(&overlay)
        {
            log::warn!("sh-syntax: ignoring config: {e}");
            config = Self::default();
        }
        config
    }

    fn load_overlay() -> Option<ConfigOverlay> {
        let home = std::env::var_os("HOME")?;
        let path = std::path::Path::new(&home).join(".config/sh-syntax/config.toml");
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(overlay) => Some(overlay),
            Err(e) => {
                log::warn!("sh-syntax: config parse error: {e}");
                None
            }
        }
    }

    fn apply_overlay(&mut self, overlay: &ConfigOverlay) -> Result<(), ConfigError> {
        self.options.parser.apply(&overlay.parser)?;
        self.options.printer.apply(&overlay.printer);
        Ok(())
    }

    /// Options for one request: these defaults with the request's own
    /// fields on top.
    pub fn with(&self, parser: &RawParserOptions, printer: &RawPrinterOptions) -> Result<SyntaxOptions, ConfigError> {
        let mut options = self.options.clone();
        options.parser.apply(parser)?;
        options.printer.apply(printer);
        Ok(options)
    }

    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) -> Result<(), ConfigError> {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(&overlay)
    }
}
