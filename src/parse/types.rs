//! Positions and typed views over the tree-sitter concrete syntax tree.
//!
//! The views borrow from a parsed [`File`](super::File) and expose the
//! statement-level shape the bridge needs: statements with their flags,
//! comments and redirects, words with their parts, and redirect operands.

use std::fmt;

use tree_sitter::Node;

/// A point in the source text.
///
/// Lines and columns are 1-based; columns count bytes. The zero value
/// (`offset == 0 && line == 0`) never names a real location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pos {
    /// Byte offset from the start of the input, 0-based.
    pub offset: usize,
    /// Line number, 1-based.
    pub line: usize,
    /// Byte column, 1-based.
    pub col: usize,
}

impl Pos {
    /// Start position of a node.
    pub fn start_of(node: Node<'_>) -> Self {
        let point = node.start_position();
        Self {
            offset: node.start_byte(),
            line: point.row + 1,
            col: point.column + 1,
        }
    }

    /// End position of a node (one past its last byte).
    pub fn end_of(node: Node<'_>) -> Self {
        let point = node.end_position();
        Self {
            offset: node.end_byte(),
            line: point.row + 1,
            col: point.column + 1,
        }
    }

    /// Position of `offset` in `src`, computed by counting newlines.
    pub fn at(src: &str, offset: usize) -> Self {
        let offset = offset.min(src.len());
        let before = &src.as_bytes()[..offset];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |i| i + 1);
        Self {
            offset,
            line,
            col: offset - line_start + 1,
        }
    }

    /// The position `n` bytes further along the same line.
    pub fn shifted(self, n: usize) -> Self {
        Self {
            offset: self.offset + n,
            line: self.line,
            col: self.col + n,
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A `Pos`/`End` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub pos: Pos,
    pub end: Pos,
}

impl Span {
    /// The span of a node.
    pub fn of(node: Node<'_>) -> Self {
        Self {
            pos: Pos::start_of(node),
            end: Pos::end_of(node),
        }
    }

    /// The smallest span covering both `self` and `other`.
    pub fn cover(self, other: Span) -> Span {
        Span {
            pos: self.pos.min(other.pos),
            end: self.end.max(other.end),
        }
    }
}

/// Anything with a source span.
pub trait Spanned {
    fn span(&self) -> Span;

    fn pos(&self) -> Pos {
        self.span().pos
    }

    fn end(&self) -> Pos {
        self.span().end
    }
}

impl Spanned for Span {
    fn span(&self) -> Span {
        *self
    }
}

impl Spanned for Node<'_> {
    fn span(&self) -> Span {
        Span::of(*self)
    }
}

// ── Node classification ──

/// Node kinds that form a statement on their own.
const STATEMENT_KINDS: &[&str] = &[
    "redirected_statement",
    "variable_assignment",
    "variable_assignments",
    "command",
    "declaration_command",
    "unset_command",
    "test_command",
    "negated_command",
    "for_statement",
    "c_style_for_statement",
    "while_statement",
    "if_statement",
    "case_statement",
    "pipeline",
    "list",
    "subshell",
    "compound_statement",
    "function_definition",
];

pub(crate) fn is_statement(kind: &str) -> bool {
    STATEMENT_KINDS.contains(&kind)
}

pub(crate) fn is_redirect(kind: &str) -> bool {
    matches!(
        kind,
        "file_redirect" | "heredoc_redirect" | "herestring_redirect"
    )
}

/// Direct children of `node`, in source order.
pub(crate) fn children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Direct children paired with the grammar field they fill, if any.
pub(crate) fn fields(node: Node<'_>) -> Vec<(Option<&'static str>, Node<'_>)> {
    let mut cursor = node.walk();
    let mut out = Vec::new();
    if cursor.goto_first_child() {
        loop {
            out.push((cursor.field_name(), cursor.node()));
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    out
}

/// Source text of a node; empty for nodes the parser inserted.
pub(crate) fn text<'a>(node: Node<'_>, src: &'a str) -> &'a str {
    if node.is_missing() {
        return "";
    }
    src.get(node.byte_range()).unwrap_or("")
}

/// Start of the line holding `offset`.
fn line_start(src: &str, offset: usize) -> usize {
    src[..offset].rfind('\n').map_or(0, |i| i + 1)
}

/// Byte range of a heredoc's body lines: from the line after the one
/// holding the delimiter word to the start of the closing line. Leading
/// tabs stripped by `<<-` belong to the body lines; the closing line is
/// excluded.
pub(crate) fn heredoc_lines(redirect: Node<'_>, src: &str) -> Option<(usize, usize)> {
    let kids = children(redirect);
    let close = kids.iter().find(|k| k.kind() == "heredoc_end")?;
    let opener_row = kids
        .iter()
        .find(|k| k.kind() == "heredoc_start")
        .map_or(redirect.start_position().row, |k| k.end_position().row);
    let first = kids
        .iter()
        .find(|k| k.kind() == "heredoc_body")
        .unwrap_or(close);
    let at = first.start_byte().min(src.len());
    let start = if first.start_position().row == opener_row {
        src[at..].find('\n').map_or(src.len(), |i| at + i + 1)
    } else {
        line_start(src, at)
    };
    let end = line_start(src, close.start_byte().min(src.len()));
    Some((start.min(end), end))
}

// ── Views ──

/// A `#` comment.
#[derive(Debug, Clone, Copy)]
pub struct Comment<'a> {
    /// Position of the `#`.
    pub hash: Pos,
    /// Comment text without the leading `#`.
    pub text: &'a str,
    span: Span,
}

impl<'a> Comment<'a> {
    pub(crate) fn new(node: Node<'_>, src: &'a str) -> Self {
        let raw = text(node, src);
        Self {
            hash: Pos::start_of(node),
            text: raw.strip_prefix('#').unwrap_or(raw).trim_end_matches('\r'),
            span: Span::of(node),
        }
    }
}

impl Spanned for Comment<'_> {
    fn span(&self) -> Span {
        self.span
    }
}

/// A bare literal, used for redirect file-descriptor operands.
#[derive(Debug, Clone, Copy)]
pub struct Lit<'a> {
    pub value: &'a str,
    span: Span,
}

impl<'a> Lit<'a> {
    pub(crate) fn new(node: Node<'_>, src: &'a str) -> Self {
        Self {
            value: text(node, src),
            span: Span::of(node),
        }
    }
}

impl Spanned for Lit<'_> {
    fn span(&self) -> Span {
        self.span
    }
}

/// Word-part kinds that read verbatim, with no quoting or expansion.
const LITERAL_PARTS: &[&str] = &["word", "number"];

/// A shell word: a sequence of parts that expand to one field.
#[derive(Debug, Clone)]
pub struct Word<'a> {
    parts: Vec<Span>,
    lit: Option<&'a str>,
    span: Span,
}

impl<'a> Word<'a> {
    pub(crate) fn new(node: Node<'_>, src: &'a str) -> Self {
        let node = if node.kind() == "command_name" {
            node.named_child(0).unwrap_or(node)
        } else {
            node
        };
        let parts: Vec<Node<'_>> = if node.kind() == "concatenation" {
            let mut cursor = node.walk();
            node.named_children(&mut cursor).collect()
        } else {
            vec![node]
        };
        let literal = parts.iter().all(|p| LITERAL_PARTS.contains(&p.kind()));
        Self {
            parts: parts.iter().map(|p| Span::of(*p)).collect(),
            lit: literal.then(|| text(node, src)),
            span: Span::of(node),
        }
    }

    /// A heredoc delimiter such as `EOF` or `'EOF'`. Quoted delimiters are
    /// not literals.
    pub(crate) fn delimiter(node: Node<'_>, src: &'a str) -> Self {
        let raw = text(node, src);
        Self {
            parts: vec![Span::of(node)],
            lit: (!raw.contains(['\'', '"', '\\'])).then_some(raw),
            span: Span::of(node),
        }
    }

    /// A heredoc body covering the whole lines in `lines`. It is literal
    /// unless it contains expansions.
    pub(crate) fn heredoc_body(node: Node<'_>, lines: (usize, usize), src: &'a str) -> Self {
        let (start, end) = lines;
        let span = Span {
            pos: Pos::at(src, start),
            end: Pos::at(src, end),
        };
        let mut cursor = node.walk();
        let parts: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        let literal = parts.iter().all(|p| p.kind() == "heredoc_content");
        let parts = if literal {
            vec![span]
        } else {
            parts.iter().map(|p| Span::of(*p)).collect()
        };
        Self {
            parts,
            lit: literal.then(|| &src[start..end]),
            span,
        }
    }

    /// A one-part literal word covering `span`, for operands the grammar
    /// folds into an operator token (the `-` of `>&-`).
    pub(crate) fn synthetic(span: Span, value: &'a str) -> Self {
        Self {
            parts: vec![span],
            lit: Some(value),
            span,
        }
    }

    /// Spans of the word's parts, in order.
    pub fn parts(&self) -> &[Span] {
        &self.parts
    }

    /// The word's verbatim text when every part is an unquoted literal.
    pub fn lit(&self) -> Option<&'a str> {
        self.lit
    }
}

impl Spanned for Word<'_> {
    fn span(&self) -> Span {
        self.span
    }
}

/// Maps a redirect operator token to its canonical text and whether the
/// token also closes the descriptor (`>&-`).
fn redirect_op(kind: &str) -> Option<(&'static str, bool)> {
    let op = match kind {
        "<" => "<",
        ">" => ">",
        ">>" => ">>",
        "<>" => "<>",
        "<&" => "<&",
        ">&" => ">&",
        ">|" => ">|",
        "<<" => "<<",
        "<<-" => "<<-",
        "<<<" => "<<<",
        "&>" => "&>",
        "&>>" => "&>>",
        "<&-" => return Some(("<&", true)),
        ">&-" => return Some((">&", true)),
        _ => return None,
    };
    Some((op, false))
}

/// An input/output redirection.
#[derive(Debug, Clone)]
pub struct Redirect<'a> {
    /// Position of the operator.
    pub op_pos: Pos,
    /// Canonical operator text, e.g. `>>` or `<<-`.
    pub op: &'static str,
    /// File-descriptor operand, as in `2>`.
    pub n: Option<Lit<'a>>,
    /// Target word, or the heredoc delimiter.
    pub word: Option<Word<'a>>,
    /// Heredoc body.
    pub hdoc: Option<Word<'a>>,
}

impl<'a> Redirect<'a> {
    /// Collect the redirect(s) in `node`. Heredoc redirects may carry
    /// further redirects on the delimiter line (`cat <<EOF >out`).
    pub(crate) fn collect(node: Node<'_>, src: &'a str, out: &mut Vec<Redirect<'a>>) {
        let mut op = None;
        let mut n = None;
        let mut word = None;
        let mut hdoc = None;
        for (field, child) in fields(node) {
            let kind = child.kind();
            if is_redirect(kind) {
                Redirect::collect(child, src, out);
                continue;
            }
            if let Some((canonical, closes)) = redirect_op(kind).filter(|_| !child.is_named()) {
                let op_pos = Pos::start_of(child);
                op = Some((canonical, op_pos));
                if closes {
                    let dash = Pos::end_of(child).offset.saturating_sub(1);
                    let pos = op_pos.shifted(dash - op_pos.offset);
                    let span = Span {
                        pos,
                        end: pos.shifted(1),
                    };
                    word = Some(Word::synthetic(span, "-"));
                }
                continue;
            }
            match kind {
                "file_descriptor" => n = Some(Lit::new(child, src)),
                "heredoc_start" => word = Some(Word::delimiter(child, src)),
                "heredoc_body" => {
                    let lines = heredoc_lines(node, src).unwrap_or((child.start_byte(), child.end_byte()));
                    hdoc = Some(Word::heredoc_body(child, lines, src));
                }
                "heredoc_end" => {}
                _ if child.is_named()
                    && word.is_none()
                    && (field == Some("destination") || op.is_some()) =>
                {
                    word = Some(Word::new(child, src));
                }
                _ => {}
            }
        }
        if let Some((op, op_pos)) = op {
            out.push(Redirect {
                op_pos,
                op,
                n,
                word,
                hdoc,
            });
        }
    }
}

impl Spanned for Redirect<'_> {
    fn span(&self) -> Span {
        let pos = self.n.as_ref().map_or(self.op_pos, |n| n.pos());
        let end = self
            .hdoc
            .as_ref()
            .map(|h| h.end())
            .or_else(|| self.word.as_ref().map(|w| w.end()))
            .unwrap_or_else(|| self.op_pos.shifted(self.op.len()));
        Span { pos, end }
    }
}

/// One statement: a command plus its flags, redirects and comments.
#[derive(Debug, Clone)]
pub struct Stmt<'a> {
    /// Comments attached to this statement: the ones directly above it and
    /// a trailing one on its last line.
    pub comments: Vec<Comment<'a>>,
    /// Span of the command itself, without redirects.
    pub cmd: Option<Span>,
    /// Start of the statement, including any `!`.
    pub position: Pos,
    /// Position of the terminating `;`, `&` or `|&`.
    pub semicolon: Option<Pos>,
    pub negated: bool,
    pub background: bool,
    pub coprocess: bool,
    pub redirs: Vec<Redirect<'a>>,
    /// Name and arguments of a simple command; empty for compound ones.
    pub args: Vec<Word<'a>>,
    end: Pos,
}

impl<'a> Stmt<'a> {
    pub(crate) fn new(node: Node<'_>, src: &'a str) -> Self {
        let mut stmt = Stmt {
            comments: Vec::new(),
            cmd: None,
            position: Pos::start_of(node),
            semicolon: None,
            negated: false,
            background: false,
            coprocess: false,
            redirs: Vec::new(),
            args: Vec::new(),
            end: Pos::end_of(node),
        };

        let mut body = Some(node);
        if node.kind() == "redirected_statement" {
            body = node.child_by_field_name("body");
            for child in children(node) {
                if is_redirect(child.kind()) {
                    Redirect::collect(child, src, &mut stmt.redirs);
                }
            }
        }
        if let Some(negated) = body.filter(|b| b.kind() == "negated_command") {
            stmt.negated = true;
            body = negated.named_child(0);
        }
        stmt.cmd = match body {
            Some(command) if command.kind() == "command" => {
                let mut words: Option<Span> = None;
                for child in children(command) {
                    if is_redirect(child.kind()) {
                        Redirect::collect(child, src, &mut stmt.redirs);
                    } else {
                        let span = Span::of(child);
                        words = Some(words.map_or(span, |w| w.cover(span)));
                        if child.is_named() && child.kind() != "variable_assignment" {
                            stmt.args.push(Word::new(child, src));
                        }
                    }
                }
                words
            }
            Some(other) => Some(Span::of(other)),
            None => None,
        };
        stmt.redirs.sort_by_key(|r| r.op_pos.offset);
        stmt
    }

    /// Record the token that terminated this statement.
    pub(crate) fn terminate(&mut self, pos: Pos, token: &str) {
        self.semicolon = Some(pos);
        self.background = token == "&";
        self.coprocess = token == "|&";
        self.end = self.end.max(pos.shifted(token.len()));
    }
}

impl Spanned for Stmt<'_> {
    fn span(&self) -> Span {
        Span {
            pos: self.position,
            end: self.end,
        }
    }
}

/// The top level of a file: its statements and the comments after the
/// last one.
#[derive(Debug, Clone, Default)]
pub struct Program<'a> {
    pub stmts: Vec<Stmt<'a>>,
    pub last: Vec<Comment<'a>>,
}

impl Program<'_> {
    /// From the first statement or comment to the end of the last one;
    /// zero for an empty program.
    pub fn span(&self) -> Span {
        let items = self
            .stmts
            .iter()
            .map(Spanned::span)
            .chain(self.last.iter().map(Spanned::span));
        items.reduce(Span::cover).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pos_at_counts_lines_and_byte_columns() {
        let src = "echo a\n  échо b\n";
        assert_eq!(
            Pos::at(src, 0),
            Pos {
                offset: 0,
                line: 1,
                col: 1
            }
        );
        assert_eq!(
            Pos::at(src, 9),
            Pos {
                offset: 9,
                line: 2,
                col: 3
            }
        );
    }

    #[test]
    fn pos_at_clamps_past_end() {
        assert_eq!(Pos::at("ab", 10).offset, 2);
    }

    #[test]
    fn pos_displays_line_and_column() {
        let pos = Pos {
            offset: 5,
            line: 1,
            col: 6,
        };
        assert_eq!(pos.to_string(), "1:6");
        assert_eq!(pos.shifted(2).col, 8);
    }

    #[test]
    fn span_cover_takes_outer_bounds() {
        let a = Span {
            pos: Pos::at("abcdef", 1),
            end: Pos::at("abcdef", 3),
        };
        let b = Span {
            pos: Pos::at("abcdef", 2),
            end: Pos::at("abcdef", 5),
        };
        let both = a.cover(b);
        assert_eq!(both.pos.offset, 1);
        assert_eq!(both.end.offset, 5);
    }

    #[test]
    fn statement_kinds() {
        assert!(is_statement("pipeline"));
        assert!(is_statement("function_definition"));
        assert!(!is_statement("word"));
        assert!(is_redirect("heredoc_redirect"));
        assert!(!is_redirect("command"));
    }

    #[test]
    fn closing_redirect_ops_split_the_dash() {
        assert_eq!(redirect_op(">&-"), Some((">&", true)));
        assert_eq!(redirect_op(">>"), Some((">>", false)));
        assert_eq!(redirect_op("word"), None);
    }
}
