//! Turns tree-sitter error and missing nodes into positioned messages.
//!
//! tree-sitter recovers from every error and marks the damage with
//! `ERROR` nodes (unexpected input) and zero-width missing nodes (tokens
//! it had to invent). The first of either, in source order, decides the
//! message.

use tree_sitter::Node;

use super::error::ParseError;
use super::shell;
use super::types::{Pos, children, text};

/// Every missing node and every outermost `ERROR` node, in source order.
#[derive(Debug, Default)]
struct Damage<'t> {
    missing: Vec<Node<'t>>,
    errors: Vec<Node<'t>>,
}

impl<'t> Damage<'t> {
    fn collect(node: Node<'t>, out: &mut Self) {
        if node.is_missing() {
            out.missing.push(node);
            return;
        }
        if node.is_error() {
            out.errors.push(node);
            return;
        }
        if !node.has_error() {
            return;
        }
        for child in children(node) {
            Self::collect(child, out);
        }
    }

    fn first(&self) -> Option<Node<'t>> {
        let missing = self.missing.first();
        let error = self.errors.first();
        match (missing, error) {
            (Some(m), Some(e)) => Some(if e.start_byte() < m.start_byte() { *e } else { *m }),
            (Some(n), None) | (None, Some(n)) => Some(*n),
            (None, None) => None,
        }
    }
}

/// The syntax error in a parsed tree, if it is not recoverable.
///
/// With `recover > 0`, up to that many missing tokens are accepted as
/// repairs; `ERROR` nodes are never accepted.
pub(crate) fn syntax_error(root: Node<'_>, src: &str, filename: &str, recover: usize) -> Option<ParseError> {
    if !root.has_error() {
        return None;
    }
    let mut damage = Damage::default();
    Damage::collect(root, &mut damage);
    if damage.errors.is_empty() && damage.missing.len() <= recover {
        return None;
    }

    if let Some((offset, quote)) = shell::unclosed_quote(src) {
        return Some(ParseError {
            filename: filename.to_owned(),
            pos: Pos::at(src, offset),
            text: format!("reached EOF without closing quote {quote}"),
            incomplete: true,
        });
    }

    let node = damage.first()?;
    let (pos, text, incomplete) = if node.is_missing() {
        describe_missing(node, src)
    } else {
        describe_error(node, src)
    };
    Some(ParseError {
        filename: filename.to_owned(),
        pos,
        text,
        incomplete,
    })
}

/// A reserved word in command position, such as a lone `fi`.
///
/// The grammar reads these as ordinary command names, so the tree is
/// clean; they are still syntax errors. Quoted forms (`"fi"`) are real
/// commands and pass.
pub(crate) fn stray_keyword(root: Node<'_>, src: &str, filename: &str) -> Option<ParseError> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.kind() == "command_name" {
            let word = text(node, src);
            if RESERVED.contains(&word)
                && let Some(text) = stray(word)
            {
                return Some(ParseError {
                    filename: filename.to_owned(),
                    pos: Pos::start_of(node),
                    text,
                    incomplete: false,
                });
            }
            continue;
        }
        let mut kids = children(node);
        kids.reverse();
        stack.extend(kids);
    }
    None
}

// ── Token tables ──

/// Words that close or continue a compound command.
const RESERVED: &[&str] = &["then", "elif", "else", "fi", "do", "done", "esac", "in", "}"];


/// The token that closes `open`.
fn closer(open: &str) -> Option<&'static str> {
    let close = match open {
        "if" => "fi",
        "case" => "esac",
        "do" | "while" | "until" | "for" | "select" => "done",
        "{" | "${" => "}",
        "(" | "$(" | "<(" | ">(" => ")",
        "`" => "`",
        "[[" => "]]",
        "[" => "]",
        "((" | "$((" => "))",
        _ => return None,
    };
    Some(close)
}

/// Keywords are quoted in messages; operators are not.
fn quoted(token: &str) -> String {
    if token.chars().all(|c| c.is_ascii_alphabetic()) {
        format!("\"{token}\"")
    } else {
        token.to_owned()
    }
}

/// The phrase a compound keyword must be followed by a body in.
fn header(open: &str) -> Option<&'static str> {
    let phrase = match open {
        "if" => "\"if <cond>\"",
        "elif" => "\"elif <cond>\"",
        "while" => "\"while <cond>\"",
        "until" => "\"until <cond>\"",
        "for" => "\"for foo\"",
        "select" => "\"select foo\"",
        "case" => "\"case x\"",
        _ => return None,
    };
    Some(phrase)
}

/// Where a stray reserved word or operator is allowed.
fn stray(token: &str) -> Option<String> {
    let rule = match token {
        "then" | "elif" | "else" => "can only be used in an if",
        "fi" => "can only be used to end an if",
        "do" => "can only be used in a loop",
        "done" => "can only be used to end a loop",
        "esac" => "can only be used to end a case",
        "in" => "can only be used in a for or case",
        "}" => "can only be used to close a block",
        ")" => "can only be used to close a subshell",
        ";;" | ";&" | ";;&" => "can only be used in a case clause",
        "&&" | "||" | "|" | "|&" | ";" | "&" => "can only immediately follow a statement",
        _ => return None,
    };
    Some(format!("{} {rule}", quoted(token)))
}

// ── Descriptions ──

fn at_eof(node: Node<'_>, src: &str) -> bool {
    node.start_byte() >= src.trim_end().len()
}

/// The first leaf at or after `node`.
fn first_leaf(node: Node<'_>) -> Node<'_> {
    let mut leaf = node;
    while let Some(child) = leaf.child(0) {
        leaf = child;
    }
    leaf
}

/// The text of the next real token after `node`, or `EOF`.
fn next_token(node: Node<'_>, src: &str) -> String {
    let mut current = node;
    loop {
        if let Some(next) = current.next_sibling() {
            let leaf = first_leaf(next);
            if leaf.is_missing() {
                current = leaf;
                continue;
            }
            let token = text(leaf, src).trim();
            if token.is_empty() {
                current = next;
                continue;
            }
            return quoted(token);
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return "EOF".to_owned(),
        }
    }
}

fn describe_missing(node: Node<'_>, src: &str) -> (Pos, String, bool) {
    let expected = node.kind();
    let incomplete = at_eof(node, src);
    let opener = node
        .parent()
        .and_then(|p| p.child(0))
        .filter(|o| !o.is_named() && *o != node);

    if let Some(prev) = node.prev_sibling()
        && matches!(prev.kind(), "&&" | "||" | "|" | "|&")
    {
        let text = format!("{} must be followed by a statement", prev.kind());
        return (Pos::start_of(prev), text, incomplete);
    }

    let Some(opener) = opener else {
        let text = format!("expected {} before {}", quoted(expected), next_token(node, src));
        return (Pos::start_of(node), text, incomplete);
    };
    let open = opener.kind();
    let pos = Pos::start_of(opener);

    if closer(open) == Some(expected) {
        let reached = if incomplete { "EOF".to_owned() } else { next_token(node, src) };
        let text = format!(
            "reached {reached} without matching {} with {}",
            quoted(open),
            quoted(expected)
        );
        return (pos, text, incomplete);
    }
    let text = match header(open) {
        Some(phrase) => format!("{phrase} must be followed by {}", quoted(expected)),
        None => format!("{} must be followed by {}", quoted(open), quoted(expected)),
    };
    (pos, text, incomplete)
}

/// Leaves under `node`, in source order.
fn leaves(node: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    while let Some(n) = stack.pop() {
        let kids = children(n);
        if kids.is_empty() {
            out.push(n);
        } else {
            stack.extend(kids.into_iter().rev());
        }
    }
    out
}

/// True when the byte before `offset`, skipping blanks, belongs to a word
/// rather than a separator: the token is inside a simple command.
fn inside_command(src: &str, offset: usize) -> bool {
    let before = src[..offset].trim_end_matches([' ', '\t']);
    before
        .bytes()
        .last()
        .is_some_and(|b| !matches!(b, b'\n' | b';' | b'&' | b'|' | b'(' | b')' | b'{' | b'}'))
}

fn describe_error(node: Node<'_>, src: &str) -> (Pos, String, bool) {
    let tokens = leaves(node);
    let first = tokens.first().copied().unwrap_or(node);
    let reaches_eof = node.end_byte() >= src.trim_end().len();

    // An opener whose construct never closed.
    if reaches_eof
        && let Some(open) = tokens.iter().find(|t| !t.is_named() && closer(t.kind()).is_some())
    {
        let close = closer(open.kind()).unwrap_or_default();
        let text = format!(
            "reached EOF without matching {} with {}",
            quoted(open.kind()),
            quoted(close)
        );
        return (Pos::start_of(*open), text, true);
    }

    // The first operator or keyword the grammar could not place.
    let offender = tokens
        .iter()
        .copied()
        .find(|t| !t.is_named() && !text(*t, src).trim().is_empty())
        .unwrap_or(first);
    let token = text(offender, src).trim();
    let pos = Pos::start_of(offender);

    if matches!(token, ")" | "(" | "}" | ";;" | "{") && inside_command(src, offender.start_byte()) {
        let text = format!("a command can only contain words and redirects; encountered {token}");
        return (pos, text, false);
    }
    if let Some(text) = stray(token) {
        return (pos, text, false);
    }
    let text = if token.is_empty() {
        "invalid syntax".to_owned()
    } else {
        format!("invalid syntax near {}", quoted(token))
    };
    (pos, text, reaches_eof)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closers() {
        assert_eq!(closer("if"), Some("fi"));
        assert_eq!(closer("$("), Some(")"));
        assert_eq!(closer("echo"), None);
    }

    #[test]
    fn keywords_are_quoted() {
        assert_eq!(quoted("fi"), "\"fi\"");
        assert_eq!(quoted(")"), ")");
    }

    #[test]
    fn stray_tokens() {
        assert_eq!(stray("fi").as_deref(), Some("\"fi\" can only be used to end an if"));
        assert_eq!(stray("&&").as_deref(), Some("&& can only immediately follow a statement"));
        assert_eq!(stray("echo"), None);
    }

    fn parse_bash(src: &str) -> tree_sitter::Tree {
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&tree_sitter_bash::LANGUAGE.into()).unwrap();
        parser.parse(src, None).unwrap()
    }

    #[test]
    fn reserved_word_as_command() {
        for (src, want) in [
            ("fi\n", "\"fi\" can only be used to end an if"),
            ("echo a\ndone\n", "\"done\" can only be used to end a loop"),
            ("then\n", "\"then\" can only be used in an if"),
        ] {
            let tree = parse_bash(src);
            let err = stray_keyword(tree.root_node(), src, "").unwrap();
            assert_eq!(err.text, want, "input: {src:?}");
            assert!(!err.incomplete);
        }
    }

    #[test]
    fn reserved_word_position() {
        let src = "echo a\nfi\n";
        let tree = parse_bash(src);
        let err = stray_keyword(tree.root_node(), src, "x.sh").unwrap();
        assert_eq!((err.pos.line, err.pos.col), (2, 1));
        assert_eq!(err.to_string(), "x.sh:2:1: \"fi\" can only be used to end an if");
    }

    #[test]
    fn reserved_words_in_place_are_fine() {
        for src in [
            "if a; then b; else c; fi\n",
            "for i in a b; do echo x; done\n",
            "case x in a) echo ;; esac\n",
            "\"fi\"\n",
            "{ echo; }\n",
        ] {
            let tree = parse_bash(src);
            assert!(stray_keyword(tree.root_node(), src, "").is_none(), "input: {src:?}");
        }
    }

    #[test]
    fn command_context() {
        assert!(inside_command("echo )", 5));
        assert!(!inside_command("a; )", 3));
        assert!(!inside_command(")", 0));
    }
}
