//! Shell parsing: drives tree-sitter-bash and exposes the result as a
//! [`File`] with typed statement views.

mod diagnose;
pub mod error;
pub mod shell;
pub mod types;
pub mod variant;

use log::debug;
use tree_sitter::{Node, Tree};

use crate::config::ParserOptions;
use crate::error::Error;

pub use error::{LangError, ParseError};
pub use types::{Comment, Lit, Pos, Program, Redirect, Span, Spanned, Stmt, Word};
pub use variant::Variant;

use types::{children, is_statement};

/// A parsed script. Owns the source text and the syntax tree; views
/// returned by [`File::program`] borrow from it.
pub struct File {
    name: String,
    src: String,
    tree: Tree,
    variant: Variant,
    keep_comments: bool,
    coprocs: Vec<usize>,
}

impl std::fmt::Debug for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("File")
            .field("name", &self.name)
            .field("variant", &self.variant)
            .field("len", &self.src.len())
            .finish_non_exhaustive()
    }
}

impl File {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The text that was parsed: the input up to any `stopAt` word.
    pub fn source(&self) -> &str {
        &self.src
    }

    pub fn keep_comments(&self) -> bool {
        self.keep_comments
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// The coprocess terminator directly after `node`, if any.
    pub(crate) fn coproc_after(&self, node: Node<'_>) -> Option<usize> {
        let end = node.end_byte();
        self.coprocs
            .iter()
            .copied()
            .find(|&c| c >= end && self.src[end..c].bytes().all(|b| b == b' ' || b == b'\t'))
    }

    /// Top-level statements with their comments attached.
    ///
    /// Comments directly above a statement belong to it, as does a comment
    /// on the same line after it. Comments after the last statement are
    /// returned separately.
    pub fn program(&self) -> Program<'_> {
        let src = self.src.as_str();
        let mut stmts: Vec<Stmt<'_>> = Vec::new();
        let mut pending = Vec::new();

        for child in children(self.root()) {
            match child.kind() {
                "comment" => {
                    if !self.keep_comments {
                        continue;
                    }
                    let comment = Comment::new(child, src);
                    match stmts.last_mut() {
                        Some(prev) if pending.is_empty() && prev.end().line == comment.hash.line => {
                            prev.comments.push(comment);
                        }
                        _ => pending.push(comment),
                    }
                }
                token @ (";" | "&") => {
                    if let Some(prev) = stmts.last_mut()
                        && prev.semicolon.is_none()
                    {
                        prev.terminate(Pos::start_of(child), token);
                    }
                }
                kind if is_statement(kind) => {
                    let mut stmt = Stmt::new(child, src);
                    stmt.comments = std::mem::take(&mut pending);
                    if let Some(offset) = self.coproc_after(child) {
                        stmt.terminate(Pos::at(src, offset), "|&");
                    }
                    stmts.push(stmt);
                }
                _ => {}
            }
        }

        Program { stmts, last: pending }
    }
}

/// Parse `text` as a shell script.
///
/// `filepath` is used in error messages and to resolve
/// [`Variant::Auto`]. Options are validated first, so invalid ones are
/// reported even for empty input.
pub fn parse(text: &str, filepath: &str, options: &ParserOptions) -> Result<File, Error> {
    options.validate()?;
    let variant = options.variant.resolve(filepath, text);

    let end = shell::stop_offset(text, &options.stop_at).unwrap_or(text.len());
    let text = &text[..end];

    let coprocs = if variant == Variant::MirBsdKorn {
        shell::trailing_coprocs(text)
    } else {
        Vec::new()
    };
    // The grammar has no coprocess terminator; blank it out so the
    // statement before it parses on its own.
    let mut input = text.as_bytes().to_vec();
    for &offset in &coprocs {
        input[offset..offset + 2].copy_from_slice(b"  ");
    }

    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&tree_sitter_bash::LANGUAGE.into())
        .map_err(|e| Error::Internal(format!("loading the bash grammar: {e}")))?;
    let tree = parser
        .parse(&input, None)
        .ok_or_else(|| Error::Internal("the parser returned no tree".to_owned()))?;

    let root = tree.root_node();
    if let Some(err) = diagnose::syntax_error(root, text, filepath, options.recover_errors)
        .or_else(|| diagnose::stray_keyword(root, text, filepath))
    {
        debug!("syntax error in {filepath:?}: {err}");
        return Err(Error::Syntax(err));
    }
    variant::check(root, variant, filepath)?;

    debug!(
        "parsed {filepath:?} as {variant}: {} bytes, {} top-level nodes",
        text.len(),
        root.child_count()
    );
    Ok(File {
        name: filepath.to_owned(),
        src: text.to_owned(),
        tree,
        variant,
        keep_comments: options.keep_comments,
        coprocs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> ParserOptions {
        ParserOptions {
            keep_comments: true,
            variant: Variant::Bash,
            ..ParserOptions::default()
        }
    }

    fn parse_ok(text: &str) -> File {
        parse(text, "", &opts()).unwrap()
    }

    #[test]
    fn statements_in_order() {
        let file = parse_ok("echo a\necho b; echo c\n");
        let program = file.program();
        assert_eq!(program.stmts.len(), 3);
        let offsets: Vec<usize> = program.stmts.iter().map(|s| s.pos().offset).collect();
        assert_eq!(offsets, vec![0, 7, 15]);
        assert!(program.stmts[1].semicolon.is_some());
        assert!(program.stmts[2].semicolon.is_none());
    }

    #[test]
    fn simple_command_words() {
        let file = parse_ok("X=1 echo a \"$b\" > out\n");
        let stmt = &file.program().stmts[0];
        let lits: Vec<Option<&str>> = stmt.args.iter().map(|w| w.lit()).collect();
        assert_eq!(lits, vec![Some("echo"), Some("a"), None]);
    }

    #[test]
    fn background_flag() {
        let file = parse_ok("sleep 1 &\n");
        let stmt = &file.program().stmts[0];
        assert!(stmt.background);
        assert_eq!(stmt.semicolon.map(|p| p.offset), Some(8));
        assert_eq!(stmt.end().offset, 9);
    }

    #[test]
    fn negation() {
        let file = parse_ok("! true\n");
        let stmt = &file.program().stmts[0];
        assert!(stmt.negated);
        assert_eq!(stmt.position.offset, 0);
        assert_eq!(stmt.cmd.map(|c| c.pos.offset), Some(2));
    }

    #[test]
    fn redirects_are_split_from_the_command() {
        let file = parse_ok("echo hi > out 2>&1\n");
        let stmt = &file.program().stmts[0];
        assert_eq!(stmt.redirs.len(), 2);
        assert_eq!(stmt.redirs[0].op, ">");
        assert_eq!(stmt.redirs[0].word.as_ref().and_then(|w| w.lit()), Some("out"));
        assert_eq!(stmt.redirs[1].op, ">&");
        assert_eq!(stmt.redirs[1].n.map(|n| n.value), Some("2"));
        let cmd = stmt.cmd.unwrap();
        assert_eq!((cmd.pos.offset, cmd.end.offset), (0, 7));
    }

    #[test]
    fn closing_redirect_gets_a_dash_word() {
        let file = parse_ok("exec 3>&-\n");
        let stmt = &file.program().stmts[0];
        let redirect = &stmt.redirs[0];
        assert_eq!(redirect.op, ">&");
        assert_eq!(redirect.word.as_ref().and_then(|w| w.lit()), Some("-"));
    }

    #[test]
    fn heredoc_body_is_attached() {
        let file = parse_ok("cat <<EOF\nhello\nEOF\n");
        let stmt = &file.program().stmts[0];
        let redirect = &stmt.redirs[0];
        assert_eq!(redirect.op, "<<");
        assert_eq!(redirect.word.as_ref().and_then(|w| w.lit()), Some("EOF"));
        assert!(redirect.hdoc.is_some());
    }

    #[test]
    fn comments_attach_above_and_trailing() {
        let file = parse_ok("# top\necho a # side\n\n# tail\n");
        let program = file.program();
        let texts: Vec<&str> = program.stmts[0].comments.iter().map(|c| c.text).collect();
        assert_eq!(texts, vec![" top", " side"]);
        assert_eq!(program.last.len(), 1);
        assert_eq!(program.last[0].text, " tail");
    }

    #[test]
    fn comments_dropped_without_keep_comments() {
        let file = parse("# top\necho a\n", "", &ParserOptions::default()).unwrap();
        let program = file.program();
        assert!(program.stmts[0].comments.is_empty());
        assert!(program.last.is_empty());
    }

    #[test]
    fn stop_at_truncates_input() {
        let options = ParserOptions {
            stop_at: "$$".into(),
            ..opts()
        };
        let file = parse("echo a\n$$ not ( shell\n", "", &options).unwrap();
        assert_eq!(file.program().stmts.len(), 1);
        assert_eq!(file.source(), "echo a\n");
    }

    #[test]
    fn unclosed_quote_is_incomplete() {
        let err = parse("echo \"unterminated", "", &opts()).unwrap_err();
        let Error::Syntax(err) = err else {
            panic!("expected a syntax error, got {err:?}");
        };
        assert!(err.incomplete);
        assert_eq!(err.pos.offset, 5);
        assert_eq!(err.text, "reached EOF without closing quote \"");
    }

    #[test]
    fn posix_rejects_arrays() {
        let options = ParserOptions {
            variant: Variant::Posix,
            ..opts()
        };
        let err = parse("a=(1 2)\n", "x.sh", &options).unwrap_err();
        assert!(matches!(err, Error::Lang(_)), "{err:?}");
        assert!(err.to_string().contains("arrays are a bash/mksh feature"));
    }

    #[test]
    fn mksh_coprocess() {
        let options = ParserOptions {
            variant: Variant::MirBsdKorn,
            ..opts()
        };
        let file = parse("cmd |&\n", "", &options).unwrap();
        let stmt = &file.program().stmts[0];
        assert!(stmt.coprocess);
        assert!(!stmt.background);
        assert_eq!(stmt.semicolon.map(|p| p.offset), Some(4));
        assert_eq!(stmt.end().offset, 6);
    }

    #[test]
    fn invalid_stop_word_is_rejected() {
        let options = ParserOptions {
            stop_at: "toolong".into(),
            ..opts()
        };
        let err = parse("echo", "", &options).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
