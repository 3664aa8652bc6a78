//! Flattening: converts the borrowed views of a parsed file into owned
//! serializable records, one function per node kind.

pub mod types;

use crate::parse::{self, Spanned};

pub use types::{Comment, File, Lit, Node, Position, Redirect, Stmt, Word};

fn node<S: Spanned>(item: &S) -> Node {
    let span = item.span();
    Node {
        pos: span.pos.into(),
        end: span.end.into(),
    }
}

pub fn flatten_file(file: &parse::File) -> File {
    let program = file.program();
    let span = node(&program.span());
    File {
        name: file.name().to_owned(),
        statements: program.stmts.iter().map(flatten_stmt).collect(),
        trailing_comments: flatten_comments(&program.last),
        pos: span.pos,
        end: span.end,
    }
}

pub fn flatten_stmt(stmt: &parse::Stmt<'_>) -> Stmt {
    let span = node(stmt);
    Stmt {
        comments: flatten_comments(&stmt.comments),
        command: stmt.cmd.as_ref().map(node),
        position: stmt.position.into(),
        semicolon: stmt.semicolon.into(),
        negated: stmt.negated,
        background: stmt.background,
        coprocess: stmt.coprocess,
        redirects: stmt.redirs.iter().map(flatten_redirect).collect(),
        pos: span.pos,
        end: span.end,
    }
}

pub fn flatten_comments(comments: &[parse::Comment<'_>]) -> Vec<Comment> {
    comments
        .iter()
        .map(|c| {
            let span = node(c);
            Comment {
                hash: c.hash.into(),
                text: c.text.to_owned(),
                pos: span.pos,
                end: span.end,
            }
        })
        .collect()
}

pub fn flatten_word(word: &parse::Word<'_>) -> Word {
    let span = node(word);
    Word {
        parts: word.parts().iter().map(node).collect(),
        literal: word.lit().map(str::to_owned),
        pos: span.pos,
        end: span.end,
    }
}

pub fn flatten_lit(lit: &parse::Lit<'_>) -> Lit {
    let span = node(lit);
    Lit {
        value_pos: span.pos,
        value_end: span.end,
        value: lit.value.to_owned(),
        pos: span.pos,
        end: span.end,
    }
}

pub fn flatten_redirect(redirect: &parse::Redirect<'_>) -> Redirect {
    let span = node(redirect);
    Redirect {
        op_pos: redirect.op_pos.into(),
        op: redirect.op.to_owned(),
        fd: redirect.n.as_ref().map(flatten_lit),
        word: redirect.word.as_ref().map(flatten_word),
        heredoc: redirect.hdoc.as_ref().map(flatten_word),
        pos: span.pos,
        end: span.end,
    }
}
