//! Formatting: writes a parsed [`File`] back out as shell text.
//!
//! Layout is decided per construct: compound commands that were written on
//! one line stay inline, everything else becomes indented blocks. Words,
//! test expressions and arithmetic are copied verbatim from the source, so
//! printing never changes what a script means.

use tree_sitter::Node;

use crate::config::PrinterOptions;
use crate::error::Error;
use crate::parse::File;
use crate::parse::types::{Pos, children, fields, heredoc_lines, is_redirect, is_statement, text};

/// Print `file` using `options`.
pub fn print(file: &File, options: &PrinterOptions) -> Result<String, Error> {
    let root = file.root();
    if let Some(node) = first_error(root) {
        return Err(Error::Internal(format!(
            "cannot print unparsed input at {}",
            Pos::start_of(node)
        )));
    }
    let mut printer = Printer::new(file, options);
    printer.program(root);
    Ok(printer.finish())
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    children(node).into_iter().find_map(first_error)
}

/// Whether any node under `node` (inclusive) satisfies `pred`.
fn contains(node: Node<'_>, pred: &impl Fn(Node<'_>) -> bool) -> bool {
    pred(node) || children(node).into_iter().any(|c| contains(c, pred))
}

/// Missing leaves under `node`, in source order.
fn missing_leaves(node: Node<'_>) -> Vec<Node<'_>> {
    if node.is_missing() {
        return vec![node];
    }
    if !node.has_error() {
        return Vec::new();
    }
    children(node).into_iter().flat_map(missing_leaves).collect()
}

/// The row a node's last byte sits on.
fn last_row(node: Node<'_>) -> usize {
    let (start, end) = (node.start_position(), node.end_position());
    if end.column == 0 && end.row > start.row {
        end.row - 1
    } else {
        end.row
    }
}

fn is_terminator(kind: &str) -> bool {
    matches!(kind, ";" | "\n" | ";;" | ";&" | ";;&")
}

/// A statement or a standalone comment inside a statement list.
#[derive(Debug, Clone, Copy)]
enum Item<'a> {
    Stmt {
        node: Node<'a>,
        /// `&` or `|&`; `;` is implied by layout.
        term: Option<&'static str>,
    },
    Comment(Node<'a>),
}

impl<'a> Item<'a> {
    fn node(&self) -> Node<'a> {
        match *self {
            Item::Stmt { node, .. } | Item::Comment(node) => node,
        }
    }
}

struct Printer<'a> {
    file: &'a File,
    src: &'a str,
    opts: &'a PrinterOptions,
    comments: bool,
    out: String,
    level: usize,
    /// Heredoc redirects whose bodies go after the current line.
    heredocs: Vec<Node<'a>>,
}

impl<'a> Printer<'a> {
    fn new(file: &'a File, opts: &'a PrinterOptions) -> Self {
        Self {
            file,
            src: file.source(),
            opts,
            comments: file.keep_comments() && !opts.minify,
            out: String::with_capacity(file.source().len()),
            level: 0,
            heredocs: Vec::new(),
        }
    }

    fn finish(mut self) -> String {
        if !self.heredocs.is_empty() {
            self.newline();
        }
        self.out
    }

    // ── Output primitives ──

    fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn indent_to(&mut self, level: usize) {
        if self.opts.minify {
            return;
        }
        for _ in 0..level {
            if self.opts.indent == 0 {
                self.out.push('\t');
            } else {
                for _ in 0..self.opts.indent {
                    self.out.push(' ');
                }
            }
        }
    }

    fn indent(&mut self) {
        self.indent_to(self.level);
    }

    /// End the current line, then emit any heredoc bodies it opened.
    fn newline(&mut self) {
        self.out.push('\n');
        for node in std::mem::take(&mut self.heredocs) {
            self.heredoc_body(node);
        }
    }

    /// Separator before a closing keyword.
    fn close_line(&mut self, inline: bool) {
        if inline {
            self.push(" ");
        } else {
            self.newline();
            self.indent();
        }
    }

    /// Source text of `node`, with tokens the parser had to insert put
    /// back in.
    /// Only keyword and punctuation tokens are re-inserted; a missing word
    /// or command is left out rather than invented.
    fn verbatim(&mut self, node: Node<'a>) {
        if node.is_missing() {
            if !node.is_named() {
                self.push(node.kind());
            }
            return;
        }
        let src = self.src;
        let mut at = node.start_byte();
        for leaf in missing_leaves(node).into_iter().filter(|l| !l.is_named()) {
            let pos = leaf.start_byte().max(at);
            self.push(&src[at..pos]);
            self.push(leaf.kind());
            at = pos;
        }
        self.push(&src[at..node.end_byte()]);
    }

    fn comment(&mut self, node: Node<'a>) {
        let src = self.src;
        self.push(text(node, src).trim_end());
    }

    fn heredoc_body(&mut self, node: Node<'a>) {
        let Some(close) = children(node).into_iter().find(|k| k.kind() == "heredoc_end") else {
            return;
        };
        let Some((start, _)) = heredoc_lines(node, self.src) else {
            return;
        };
        let src = self.src;
        self.push(&src[start..close.end_byte()]);
        self.out.push('\n');
    }

    // ── Layout decisions ──

    /// Nothing under `node` forces a line break.
    fn inline_ok(&self, node: Node<'_>) -> bool {
        let comments = self.comments;
        !contains(node, &|n: Node<'_>| {
            n.kind() == "heredoc_redirect" || (comments && n.kind() == "comment")
        })
    }

    fn inline(&self, node: Node<'_>) -> bool {
        self.inline_ok(node)
            && (self.opts.single_line || node.start_position().row == last_row(node))
    }

    fn items(&self, nodes: &[Node<'a>]) -> Vec<Item<'a>> {
        let mut items = Vec::new();
        for &node in nodes {
            match node.kind() {
                "comment" if self.comments => items.push(Item::Comment(node)),
                "&" => {
                    if let Some(Item::Stmt { term, .. }) = items.last_mut()
                        && term.is_none()
                    {
                        *term = Some("&");
                    }
                }
                kind if is_statement(kind) => {
                    let term = self.file.coproc_after(node).map(|_| "|&");
                    items.push(Item::Stmt { node, term });
                }
                _ => {}
            }
        }
        items
    }

    // ── Statement lists ──

    fn program(&mut self, root: Node<'a>) {
        let items = self.items(&children(root));
        if self.opts.single_line && self.inline_ok(root) {
            self.inline_items(&items, false);
        } else {
            self.block(&items, None);
        }
        if !self.out.is_empty() {
            self.newline();
        }
    }

    /// Statements on one line, separated by `;`.
    fn inline_items(&mut self, items: &[Item<'a>], trailing: bool) {
        let stmts: Vec<(Node<'a>, Option<&'static str>)> = items
            .iter()
            .filter_map(|item| match *item {
                Item::Stmt { node, term } => Some((node, term)),
                Item::Comment(_) => None,
            })
            .collect();
        for (i, &(node, term)) in stmts.iter().enumerate() {
            if i > 0 {
                self.push(" ");
            }
            self.command(node);
            match term {
                Some(term) => {
                    self.push(" ");
                    self.push(term);
                }
                None if trailing || i + 1 < stmts.len() => self.push(";"),
                None => {}
            }
        }
    }

    /// Statements one per line at the current level. `opener_row` is the
    /// row of the keyword that opened the block; comments on it stay there.
    fn block(&mut self, items: &[Item<'a>], opener_row: Option<usize>) {
        let mut prev_row = opener_row;
        let mut first = true;
        for item in items {
            let node = item.node();
            let row = node.start_position().row;
            if let Item::Comment(comment) = *item
                && prev_row == Some(row)
                && self.heredocs.is_empty()
            {
                self.push(" ");
                self.comment(comment);
                continue;
            }
            if prev_row.is_some() {
                self.newline();
                if !first && !self.opts.minify && prev_row.is_some_and(|r| row > r + 1) {
                    self.newline();
                }
            }
            self.indent();
            match *item {
                Item::Stmt { node, term } => self.stmt(node, term),
                Item::Comment(comment) => self.comment(comment),
            }
            prev_row = Some(last_row(node));
            first = false;
        }
    }

    /// Either inline after the opener or as an indented block.
    fn body(&mut self, items: &[Item<'a>], inline: bool, opener_row: usize) {
        if inline {
            if !items.is_empty() {
                self.push(" ");
                self.inline_items(items, true);
            }
        } else {
            self.level += 1;
            self.block(items, Some(opener_row));
            self.level -= 1;
        }
    }

    fn stmt(&mut self, node: Node<'a>, term: Option<&'static str>) {
        self.command(node);
        if let Some(term) = term {
            self.push(" ");
            self.push(term);
        }
    }

    // ── Commands ──

    fn command(&mut self, node: Node<'a>) {
        match node.kind() {
            "command" | "declaration_command" | "unset_command" | "variable_assignments" => {
                self.simple(node)
            }
            "pipeline" | "list" => self.chain(node),
            "negated_command" => {
                self.push("! ");
                if let Some(inner) = node.named_child(0) {
                    self.command(inner);
                }
            }
            "redirected_statement" => self.redirected(node),
            "subshell" => self.group(node, "(", ")"),
            "compound_statement" if node.child(0).is_some_and(|c| c.kind() == "((") => {
                self.verbatim(node)
            }
            "compound_statement" => self.group(node, "{", "}"),
            "if_statement" => self.if_stmt(node),
            "for_statement" | "c_style_for_statement" => self.for_stmt(node),
            "while_statement" => self.while_stmt(node),
            "case_statement" => self.case_stmt(node),
            "function_definition" => self.function(node),
            _ => self.verbatim(node),
        }
    }

    /// Words and redirects separated by single spaces.
    fn simple(&mut self, node: Node<'a>) {
        let mut prev: Option<Node<'a>> = None;
        for child in children(node) {
            if child.kind() == "comment" {
                continue;
            }
            if let Some(prev) = prev {
                self.gap(prev, child);
            }
            if is_redirect(child.kind()) {
                self.redirect(child);
            } else {
                self.verbatim(child);
            }
            prev = Some(child);
        }
    }

    fn gap(&mut self, prev: Node<'a>, next: Node<'a>) {
        if self.opts.keep_padding && prev.end_position().row == next.start_position().row {
            let src = self.src;
            let between = &src[prev.end_byte()..next.start_byte()];
            if !between.is_empty() && between.bytes().all(|b| b == b' ' || b == b'\t') {
                self.push(between);
                return;
            }
        }
        self.push(" ");
    }

    fn redirected(&mut self, node: Node<'a>) {
        let mut first = true;
        for (field, child) in fields(node) {
            if field == Some("body") {
                self.command(child);
            } else if is_redirect(child.kind()) {
                if !first {
                    self.push(" ");
                }
                self.redirect(child);
            } else {
                continue;
            }
            first = false;
        }
    }

    fn space_after(&mut self, op: Option<&str>) {
        let tight = matches!(op, Some(">&" | "<&" | ">&-" | "<&-"));
        if self.opts.space_redirects && !tight {
            self.push(" ");
        }
    }

    fn redirect(&mut self, node: Node<'a>) {
        let mut op: Option<&'static str> = None;
        let mut targets = 0;
        let mut after_start = false;
        let mut continuation: Vec<Node<'a>> = Vec::new();
        for child in children(node) {
            match child.kind() {
                "file_descriptor" => self.verbatim(child),
                "heredoc_start" => {
                    self.space_after(op);
                    self.verbatim(child);
                    after_start = true;
                }
                "heredoc_body" | "heredoc_end" => after_start = false,
                kind if !child.is_named() && op.is_none() => {
                    op = Some(kind);
                    self.push(kind);
                }
                _ if after_start => continuation.push(child),
                _ => {
                    if targets == 0 {
                        self.space_after(op);
                    } else {
                        self.push(" ");
                    }
                    self.verbatim(child);
                    targets += 1;
                }
            }
        }
        // Whatever followed the delimiter on its line: pipes, more redirects.
        if let (Some(first), Some(last)) = (continuation.first(), continuation.last()) {
            let src = self.src;
            self.push(" ");
            self.push(&src[first.start_byte()..last.end_byte()]);
        }
        if node.kind() == "heredoc_redirect" {
            self.heredocs.push(node);
        }
    }

    /// `&&`, `||` and `|` chains, broken where the source broke them.
    fn chain(&mut self, node: Node<'a>) {
        let mut operands = Vec::new();
        let mut ops = Vec::new();
        flatten_chain(node, &mut operands, &mut ops);
        let Some((&first, rest)) = operands.split_first() else {
            self.verbatim(node);
            return;
        };
        self.command(first);
        let mut prev = first;
        for (&op, &next) in ops.iter().zip(rest) {
            let broken = !self.opts.single_line && next.start_position().row > last_row(prev);
            if !broken {
                self.push(" ");
                self.push(op);
                self.push(" ");
            } else if self.opts.binary_next_line && self.heredocs.is_empty() {
                self.push(" \\");
                self.newline();
                self.indent_to(self.level + 1);
                self.push(op);
                self.push(" ");
            } else {
                self.push(" ");
                self.push(op);
                self.newline();
                self.indent_to(self.level + 1);
            }
            self.command(next);
            prev = next;
        }
        for &op in ops.iter().skip(rest.len()) {
            self.push(" ");
            self.push(op);
        }
    }

    fn group(&mut self, node: Node<'a>, open: &str, close: &str) {
        let inner: Vec<Node<'a>> = children(node)
            .into_iter()
            .filter(|c| c.is_named() || (c.kind() != open && c.kind() != close))
            .collect();
        let items = self.items(&inner);
        let brace = open == "{";
        self.push(open);
        if self.inline(node) {
            if brace {
                self.push(" ");
            }
            self.inline_items(&items, brace);
            if brace {
                self.push(" ");
            }
        } else {
            self.level += 1;
            self.block(&items, Some(node.start_position().row));
            self.level -= 1;
            self.newline();
            self.indent();
        }
        self.push(close);
    }

    // ── Compound commands ──

    fn if_stmt(&mut self, node: Node<'a>) {
        let inline = self.inline(node);
        self.push("if ");
        self.clause(node, inline);
        for child in children(node) {
            match child.kind() {
                "elif_clause" => {
                    self.close_line(inline);
                    self.push("elif ");
                    self.clause(child, inline);
                }
                "else_clause" => {
                    self.close_line(inline);
                    self.push("else");
                    let body: Vec<Node<'a>> = children(child).into_iter().skip(1).collect();
                    let items = self.items(&body);
                    self.body(&items, inline, child.start_position().row);
                }
                _ => {}
            }
        }
        self.close_line(inline);
        self.push("fi");
    }

    /// Condition and body of an `if` or `elif`.
    fn clause(&mut self, node: Node<'a>, inline: bool) {
        let kids = children(node);
        let then_at = kids.iter().position(|k| k.kind() == "then");
        let (cond, rest) = match then_at {
            Some(i) => (kids.get(1..i).unwrap_or(&[]), kids.get(i + 1..).unwrap_or(&[])),
            None => (kids.get(1..).unwrap_or(&[]), &[][..]),
        };
        let cond_items = self.items(cond);
        self.inline_items(&cond_items, true);
        self.push(" then");
        let body: Vec<Node<'a>> = rest
            .iter()
            .copied()
            .filter(|k| !matches!(k.kind(), "elif_clause" | "else_clause" | "fi"))
            .collect();
        let items = self.items(&body);
        let row = then_at.map_or(node.start_position().row, |i| kids[i].start_position().row);
        self.body(&items, inline, row);
    }

    fn for_stmt(&mut self, node: Node<'a>) {
        let inline = self.inline(node);
        let body = node.child_by_field_name("body");
        let header: Vec<Node<'a>> = children(node)
            .into_iter()
            .take_while(|k| Some(*k) != body)
            .filter(|k| !is_terminator(k.kind()) && k.kind() != "comment")
            .collect();
        if node.kind() == "c_style_for_statement" {
            let src = self.src;
            let end = header
                .iter()
                .rev()
                .find(|k| k.kind() == "))")
                .or(header.last())
                .map_or(node.start_byte(), |k| k.end_byte());
            self.push(&src[node.start_byte()..end]);
        } else {
            for (i, &word) in header.iter().enumerate() {
                if i > 0 {
                    self.push(" ");
                }
                self.verbatim(word);
            }
        }
        match body {
            Some(body) if body.kind() == "do_group" => self.do_group(body, inline, "; do"),
            Some(body) => {
                self.push(" ");
                self.command(body);
            }
            None => {}
        }
    }

    fn while_stmt(&mut self, node: Node<'a>) {
        let inline = self.inline(node);
        let kids = children(node);
        let body = node.child_by_field_name("body");
        let keyword = kids.first().map_or("while", |k| k.kind());
        self.push(keyword);
        self.push(" ");
        let cond: Vec<Node<'a>> = kids
            .iter()
            .copied()
            .skip(1)
            .take_while(|k| Some(*k) != body)
            .collect();
        let items = self.items(&cond);
        self.inline_items(&items, true);
        if let Some(body) = body {
            self.do_group(body, inline, " do");
        }
    }

    fn do_group(&mut self, node: Node<'a>, inline: bool, lead: &str) {
        self.push(lead);
        let inner: Vec<Node<'a>> = children(node)
            .into_iter()
            .filter(|k| k.is_named() || !matches!(k.kind(), "do" | "done"))
            .collect();
        let items = self.items(&inner);
        self.body(&items, inline, node.start_position().row);
        self.close_line(inline);
        self.push("done");
    }

    fn case_stmt(&mut self, node: Node<'a>) {
        let inline = self.inline(node);
        self.push("case ");
        if let Some(value) = node.child_by_field_name("value") {
            self.verbatim(value);
        }
        self.push(" in");
        let item_level = if self.opts.switch_case_indent {
            self.level + 1
        } else {
            self.level
        };
        for child in children(node) {
            match child.kind() {
                "case_item" => {
                    if inline {
                        self.push(" ");
                    } else {
                        self.newline();
                        self.indent_to(item_level);
                    }
                    self.case_item(child, inline, item_level);
                }
                "comment" if self.comments => {
                    self.newline();
                    self.indent_to(item_level);
                    self.comment(child);
                }
                _ => {}
            }
        }
        self.close_line(inline);
        self.push("esac");
    }

    fn case_item(&mut self, node: Node<'a>, inline: bool, level: usize) {
        let kids = children(node);
        let Some(close) = kids.iter().position(|k| !k.is_named() && k.kind() == ")") else {
            self.verbatim(node);
            return;
        };
        let patterns = kids[..close]
            .iter()
            .filter(|k| k.is_named() && k.kind() != "comment");
        for (i, &pattern) in patterns.enumerate() {
            if i > 0 {
                self.push(" | ");
            }
            self.verbatim(pattern);
        }
        self.push(")");

        let rest = &kids[close + 1..];
        let term = rest
            .iter()
            .find(|k| matches!(k.kind(), ";;" | ";&" | ";;&"))
            .map_or(";;", |k| k.kind());
        let body: Vec<Node<'a>> = rest
            .iter()
            .copied()
            .filter(|k| !matches!(k.kind(), ";;" | ";&" | ";;&"))
            .collect();
        let items = self.items(&body);

        if inline || self.inline(node) {
            if !items.is_empty() {
                self.push(" ");
                self.inline_items(&items, false);
            }
            self.push(" ");
            self.push(term);
        } else {
            let saved = self.level;
            self.level = level + 1;
            self.block(&items, Some(kids[close].start_position().row));
            self.newline();
            self.indent();
            self.push(term);
            self.level = saved;
        }
    }

    fn function(&mut self, node: Node<'a>) {
        let kids = children(node);
        let keyword = kids.first().is_some_and(|k| k.kind() == "function");
        let parens = kids.iter().any(|k| k.kind() == "(");
        if keyword {
            self.push("function ");
        }
        if let Some(name) = node.child_by_field_name("name") {
            self.verbatim(name);
        }
        if parens || !keyword {
            self.push("()");
        }
        if let Some(body) = node.child_by_field_name("body") {
            let own_line = body.kind() == "compound_statement"
                && self.opts.function_next_line
                && !self.inline(body);
            if own_line {
                self.newline();
                self.indent();
            } else {
                self.push(" ");
            }
            self.command(body);
        }
        for (field, child) in fields(node) {
            if field == Some("redirect") {
                self.push(" ");
                self.redirect(child);
            }
        }
    }
}

/// Operands and operators of a chain, flattening left-nested lists.
fn flatten_chain<'a>(node: Node<'a>, operands: &mut Vec<Node<'a>>, ops: &mut Vec<&'static str>) {
    for child in children(node) {
        match child.kind() {
            "comment" => {}
            "&&" => ops.push("&&"),
            "||" => ops.push("||"),
            "|" => ops.push("|"),
            "|&" => ops.push("|&"),
            "list" if node.kind() == "list" => flatten_chain(child, operands, ops),
            // Zero-width operands are commands the parser had to invent.
            _ if child.is_named() && child.end_byte() > child.start_byte() => operands.push(child),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserOptions;
    use crate::parse::{self, Variant};

    fn format_with(text: &str, printer: &PrinterOptions) -> String {
        let parser = ParserOptions {
            keep_comments: true,
            variant: Variant::Bash,
            ..ParserOptions::default()
        };
        let file = parse::parse(text, "", &parser).unwrap();
        print(&file, printer).unwrap()
    }

    fn format(text: &str) -> String {
        format_with(text, &PrinterOptions::default())
    }

    #[test]
    fn simple_command() {
        assert_eq!(format("echo   hello    world"), "echo hello world\n");
    }

    #[test]
    fn empty_input() {
        assert_eq!(format(""), "");
    }

    #[test]
    fn keep_padding() {
        let options = PrinterOptions {
            keep_padding: true,
            ..PrinterOptions::default()
        };
        assert_eq!(format_with("echo   a  b\n", &options), "echo   a  b\n");
    }

    #[test]
    fn semicolons_become_lines() {
        assert_eq!(format("a; b\n"), "a\nb\n");
    }

    #[test]
    fn one_blank_line_is_kept() {
        assert_eq!(format("a\n\n\n\nb\n"), "a\n\nb\n");
    }

    #[test]
    fn background_is_kept() {
        assert_eq!(format("sleep 1 &\n"), "sleep 1 &\n");
    }

    #[test]
    fn inline_if_stays_inline() {
        assert_eq!(format("if a;then b;fi\n"), "if a; then b; fi\n");
    }

    #[test]
    fn multiline_if_is_indented() {
        let src = "if a\nthen\nb\nelif c; then\nd\nelse\ne\nfi\n";
        assert_eq!(format(src), "if a; then\n\tb\nelif c; then\n\td\nelse\n\te\nfi\n");
    }

    #[test]
    fn spaces_for_indent() {
        let options = PrinterOptions {
            indent: 2,
            ..PrinterOptions::default()
        };
        assert_eq!(
            format_with("while x\ndo\ny\ndone\n", &options),
            "while x; do\n  y\ndone\n"
        );
    }

    #[test]
    fn for_loop() {
        assert_eq!(format("for i in 1 2 3\ndo\necho $i\ndone\n"), "for i in 1 2 3; do\n\techo $i\ndone\n");
    }

    #[test]
    fn redirect_spacing() {
        assert_eq!(format("echo a >out 2>&1\n"), "echo a > out 2>&1\n");
        let tight = PrinterOptions {
            space_redirects: false,
            ..PrinterOptions::default()
        };
        assert_eq!(format_with("echo a > out\n", &tight), "echo a >out\n");
    }

    #[test]
    fn heredoc_body_follows_its_line() {
        let src = "cat <<EOF\nhello\n  $x\nEOF\necho done\n";
        assert_eq!(format(src), "cat << EOF\nhello\n  $x\nEOF\necho done\n");
    }

    #[test]
    fn dash_heredoc_keeps_every_line() {
        let src = "cat <<-EOF\n\tfoo\n\tbar\n\tEOF\necho after\n";
        let once = format(src);
        assert_eq!(once, "cat <<- EOF\n\tfoo\n\tbar\n\tEOF\necho after\n");
        assert_eq!(format(&once), once);
    }

    #[test]
    fn arithmetic_command_is_verbatim() {
        assert_eq!(format("((x++))\n"), "((x++))\n");
        assert_eq!(format("if ((x>1)); then a; fi\n"), "if ((x>1)); then a; fi\n");
    }

    #[test]
    fn recovered_pipe_invents_nothing() {
        let parser = ParserOptions {
            variant: Variant::Bash,
            recover_errors: 2,
            ..ParserOptions::default()
        };
        let file = parse::parse("a |&\n", "", &parser).unwrap();
        assert_eq!(print(&file, &PrinterOptions::default()).unwrap(), "a |&\n");
    }

    #[test]
    fn broken_chain_before_operator() {
        assert_eq!(format("a &&\nb\n"), "a \\\n\t&& b\n");
    }

    #[test]
    fn broken_chain_after_operator() {
        let options = PrinterOptions {
            binary_next_line: false,
            ..PrinterOptions::default()
        };
        assert_eq!(format_with("a &&\nb\n", &options), "a &&\n\tb\n");
    }

    #[test]
    fn unbroken_chain() {
        assert_eq!(format("a&&b|c\n"), "a && b | c\n");
    }

    #[test]
    fn case_indentation() {
        let src = "case $x in\na) echo a ;;\nb)\necho b\n;;\nesac\n";
        assert_eq!(
            format(src),
            "case $x in\n\ta) echo a ;;\n\tb)\n\t\techo b\n\t\t;;\nesac\n"
        );
        let flat = PrinterOptions {
            switch_case_indent: false,
            ..PrinterOptions::default()
        };
        assert_eq!(
            format_with(src, &flat),
            "case $x in\na) echo a ;;\nb)\n\techo b\n\t;;\nesac\n"
        );
    }

    #[test]
    fn function_brace_placement() {
        let src = "f() {\necho\n}\n";
        assert_eq!(format(src), "f() {\n\techo\n}\n");
        let next_line = PrinterOptions {
            function_next_line: true,
            ..PrinterOptions::default()
        };
        assert_eq!(format_with(src, &next_line), "f()\n{\n\techo\n}\n");
    }

    #[test]
    fn comments_are_kept() {
        assert_eq!(format("# a\necho x # b\n"), "# a\necho x # b\n");
    }

    #[test]
    fn minify_drops_layout() {
        let options = PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        };
        let src = "# c\nif a\nthen\n\n  b\nfi\n\n\nc\n";
        assert_eq!(format_with(src, &options), "if a; then\nb\nfi\nc\n");
    }

    #[test]
    fn single_line_joins_statements() {
        let options = PrinterOptions {
            single_line: true,
            ..PrinterOptions::default()
        };
        assert_eq!(format_with("a\nif b\nthen\nc\nfi\n", &options), "a; if b; then c; fi\n");
    }

    #[test]
    fn subshell_and_group() {
        assert_eq!(format("(a;b)\n{ c; }\n"), "(a; b)\n{ c; }\n");
    }

    #[test]
    fn printing_is_stable() {
        let src = "#!/bin/bash\n# setup\nset -e\n\nfoo() {\n  local x=1 # one\n  if [ \"$x\" = 1 ]; then echo yes; fi\n  for f in *; do\n    cat \"$f\" |\n      grep x\n  done\n}\n\ncase $1 in\n  a|b) foo ;;\n  *)\n    exit 1\n    ;;\nesac\n";
        let once = format(src);
        assert_eq!(format(&once), once);
    }
}
