//! Owned, acyclic records mirroring the syntax tree.
//!
//! Field names are PascalCase on the wire; hosts decode them by name.

use serde::{Deserialize, Serialize};

use crate::parse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Position {
    pub offset: u32,
    pub line: u32,
    pub col: u32,
}

fn narrow(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl From<parse::Pos> for Position {
    fn from(pos: parse::Pos) -> Self {
        Self {
            offset: narrow(pos.offset),
            line: narrow(pos.line),
            col: narrow(pos.col),
        }
    }
}

/// Absent positions are the zero triple.
impl From<Option<parse::Pos>> for Position {
    fn from(pos: Option<parse::Pos>) -> Self {
        pos.map(Self::from).unwrap_or_default()
    }
}

/// A bare span, standing in for a command or word part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Node {
    pub pos: Position,
    pub end: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Comment {
    pub hash: Position,
    pub text: String,
    pub pos: Position,
    pub end: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Word {
    pub parts: Vec<Node>,
    /// Verbatim text, present only when the word is an unquoted literal.
    #[serde(rename = "Lit")]
    pub literal: Option<String>,
    pub pos: Position,
    pub end: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Lit {
    pub value_pos: Position,
    pub value_end: Position,
    pub value: String,
    pub pos: Position,
    pub end: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Redirect {
    pub op_pos: Position,
    pub op: String,
    /// File-descriptor operand.
    #[serde(rename = "N")]
    pub fd: Option<Lit>,
    pub word: Option<Word>,
    #[serde(rename = "Hdoc")]
    pub heredoc: Option<Word>,
    pub pos: Position,
    pub end: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stmt {
    pub comments: Vec<Comment>,
    #[serde(rename = "Cmd")]
    pub command: Option<Node>,
    pub position: Position,
    pub semicolon: Position,
    pub negated: bool,
    pub background: bool,
    pub coprocess: bool,
    #[serde(rename = "Redirs")]
    pub redirects: Vec<Redirect>,
    pub pos: Position,
    pub end: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct File {
    pub name: String,
    #[serde(rename = "Stmt")]
    pub statements: Vec<Stmt>,
    /// Comments after the last statement.
    #[serde(rename = "Last")]
    pub trailing_comments: Vec<Comment>,
    pub pos: Position,
    pub end: Position,
}
