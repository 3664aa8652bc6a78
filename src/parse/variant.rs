//! Shell language variants and the constructs each one accepts.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use super::error::LangError;
use super::types::{Pos, children};

/// The shell dialect a script is parsed as.
///
/// The grammar always parses Bash; narrower dialects are enforced by
/// rejecting the constructs they lack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Posix,
    Bash,
    #[serde(rename = "mksh")]
    MirBsdKorn,
    Bats,
    /// Pick a variant from the shebang or file extension.
    Auto,
}

impl Variant {
    /// Decode a wire code: 0 POSIX, 1 Bash, 2 mksh, 3 Bats, 4 auto.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Posix),
            1 => Some(Self::Bash),
            2 => Some(Self::MirBsdKorn),
            3 => Some(Self::Bats),
            4 => Some(Self::Auto),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "posix" | "sh" => Some(Self::Posix),
            "bash" => Some(Self::Bash),
            "mksh" => Some(Self::MirBsdKorn),
            "bats" => Some(Self::Bats),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Posix => "posix",
            Self::Bash => "bash",
            Self::MirBsdKorn => "mksh",
            Self::Bats => "bats",
            Self::Auto => "auto",
        }
    }

    /// Resolve `Auto` from the script's shebang, then its file extension,
    /// falling back to Bash. Other variants resolve to themselves.
    pub fn resolve(self, path: &str, src: &str) -> Self {
        if self != Self::Auto {
            return self;
        }
        if let Some(variant) = shebang(src) {
            return variant;
        }
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some("sh") => Self::Posix,
            Some("mksh") => Self::MirBsdKorn,
            Some("bats") => Self::Bats,
            _ => Self::Bash,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn shebang(src: &str) -> Option<Variant> {
    let line = src.lines().next()?.strip_prefix("#!")?;
    let mut fields = line.split_whitespace();
    let mut program = fields.next()?.rsplit('/').next()?;
    if program == "env" {
        program = fields.find(|f| !f.starts_with('-'))?;
    }
    match program {
        "sh" | "dash" | "ash" | "posix" => Some(Variant::Posix),
        "bash" => Some(Variant::Bash),
        "mksh" | "ksh" => Some(Variant::MirBsdKorn),
        "bats" => Some(Variant::Bats),
        _ => None,
    }
}

// ── Feature gates ──

const BASH_MKSH: &[Variant] = &[Variant::Bash, Variant::MirBsdKorn];
const BASH: &[Variant] = &[Variant::Bash];

/// A Bash construct at `node` and the variants that accept it.
fn feature(node: Node<'_>) -> Option<(&'static str, &'static [Variant])> {
    let gate = match node.kind() {
        "array" => ("arrays", BASH_MKSH),
        "subscript" => ("arrays", BASH_MKSH),
        "[[" => ("tests", BASH_MKSH),
        "((" if node.parent().is_some_and(|p| matches!(p.kind(), "compound_statement" | "test_command")) => {
            ("arithmetic commands", BASH_MKSH)
        }
        "c_style_for_statement" => ("c-style fors", BASH),
        "process_substitution" => ("process substitutions", BASH),
        "herestring_redirect" => ("herestrings", BASH_MKSH),
        "&>" | "&>>" => ("&> redirects", BASH_MKSH),
        "function" if !node.is_named() => (r#"the "function" builtin"#, BASH_MKSH),
        "ansi_c_string" => ("$'' strings", BASH_MKSH),
        "translated_string" => (r#"$"" strings"#, BASH),
        "select" if !node.is_named() => ("select loops", BASH_MKSH),
        "|&" => ("|& pipes", BASH),
        ";&" | ";;&" => ("case fallthroughs", BASH_MKSH),
        _ => return None,
    };
    Some(gate)
}

/// Reject the first construct `variant` does not support, in source order.
pub(crate) fn check(root: Node<'_>, variant: Variant, filename: &str) -> Result<(), LangError> {
    // Bats files are Bash with a test harness on top.
    if matches!(variant, Variant::Bash | Variant::Bats | Variant::Auto) {
        return Ok(());
    }
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if let Some((name, langs)) = feature(node)
            && !langs.contains(&variant)
        {
            return Err(LangError {
                filename: filename.to_owned(),
                pos: Pos::start_of(node),
                feature: name,
                langs,
                used: variant,
            });
        }
        let mut kids = children(node);
        kids.reverse();
        stack.extend(kids);
    }
    Ok(())
}
