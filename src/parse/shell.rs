//! Quote-aware scanning of raw shell text.
//!
//! A few decisions are made on the text before (or instead of) consulting
//! the grammar: where a `stopAt` word cuts the input, which quote was left
//! open when the input ended, and where mksh coprocess terminators sit.

/// Outcome of walking the unquoted parts of a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Walk {
    /// Offset at which the visitor asked to stop.
    pub stopped_at: Option<usize>,
    /// Offset and byte of a quote still open at the end of input.
    pub open_quote: Option<(usize, u8)>,
}

/// True when a word may begin at `i`: at the start of input or after
/// whitespace or a separator.
fn at_word_start(bytes: &[u8], i: usize) -> bool {
    i == 0
        || matches!(
            bytes[i - 1],
            b' ' | b'\t' | b'\n' | b'\r' | b';' | b'&' | b'|' | b'(' | b')' | b'<' | b'>'
        )
}

/// A heredoc whose body starts after the current line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Heredoc {
    delimiter: Vec<u8>,
    /// `<<-`: the closing line may be indented with tabs.
    strip_tabs: bool,
}

/// Read the heredoc operator at `i` (`<<` or `<<-`, not `<<<`) and its
/// delimiter word, with quotes and backslashes removed.
fn heredoc_at(bytes: &[u8], i: usize) -> Option<Heredoc> {
    if !bytes[i..].starts_with(b"<<") || bytes.get(i + 2) == Some(&b'<') || (i > 0 && bytes[i - 1] == b'<') {
        return None;
    }
    let mut j = i + 2;
    let strip_tabs = bytes.get(j) == Some(&b'-');
    if strip_tabs {
        j += 1;
    }
    while j < bytes.len() && matches!(bytes[j], b' ' | b'\t') {
        j += 1;
    }
    let mut delimiter = Vec::new();
    let mut quote = None;
    while j < bytes.len() {
        let c = bytes[j];
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => delimiter.push(c),
            None if c == b'\'' || c == b'"' => quote = Some(c),
            None if c == b'\\' => {}
            None if c.is_ascii_whitespace() || b";&|<>()".contains(&c) => break,
            None => delimiter.push(c),
        }
        j += 1;
    }
    (!delimiter.is_empty()).then_some(Heredoc { delimiter, strip_tabs })
}

/// Offset just past the bodies of `pending`, which start at `from`.
fn skip_heredocs(bytes: &[u8], from: usize, pending: &[Heredoc]) -> usize {
    let mut at = from;
    for heredoc in pending {
        while at < bytes.len() {
            let end = bytes[at..].iter().position(|&b| b == b'\n').map_or(bytes.len(), |n| at + n);
            let mut line = &bytes[at..end];
            if heredoc.strip_tabs {
                while let [b'\t', rest @ ..] = line {
                    line = rest;
                }
            }
            at = (end + 1).min(bytes.len());
            if line == heredoc.delimiter.as_slice() {
                break;
            }
        }
    }
    at
}

/// Walk `src`, calling `visit` at every byte offset that is outside quotes,
/// escapes, comments and heredoc bodies. Walking stops when `visit`
/// returns true.
///
/// Single quotes suppress escapes, except in `$'...'` strings.
fn walk_unquoted(src: &str, mut visit: impl FnMut(usize) -> bool) -> Walk {
    let bytes = src.as_bytes();
    let len = bytes.len();
    let mut i = 0;
    let (mut sq, mut dq, mut bq, mut esc, mut ansi) = (false, false, false, false, false);
    let mut opened = 0;
    let mut pending: Vec<Heredoc> = Vec::new();
    // Open `((` groups; `<<` inside them is a shift.
    let mut arith = 0usize;

    while i < len {
        let c = bytes[i];

        if esc {
            esc = false;
            i += 1;
            continue;
        }
        if c == b'\\' && (!sq || ansi) {
            esc = true;
            i += 1;
            continue;
        }
        if c == b'\'' && !dq && !bq {
            if !sq {
                opened = i;
                ansi = i > 0 && bytes[i - 1] == b'$';
            }
            sq = !sq;
            i += 1;
            continue;
        }
        if c == b'"' && !sq && !bq {
            if !dq {
                opened = i;
            }
            dq = !dq;
            i += 1;
            continue;
        }
        if c == b'`' && !sq && !dq {
            if !bq {
                opened = i;
            }
            bq = !bq;
            i += 1;
            continue;
        }
        if sq || dq || bq {
            i += 1;
            continue;
        }

        if c == b'#' && at_word_start(bytes, i) {
            while i < len && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }

        if visit(i) {
            return Walk {
                stopped_at: Some(i),
                open_quote: None,
            };
        }
        if c == b'\n' && !pending.is_empty() {
            i = skip_heredocs(bytes, i + 1, &pending);
            pending.clear();
            continue;
        }
        if bytes[i..].starts_with(b"((") {
            arith += 1;
        } else if arith > 0 && bytes[i..].starts_with(b"))") {
            arith -= 1;
        } else if arith == 0
            && let Some(heredoc) = heredoc_at(bytes, i)
        {
            pending.push(heredoc);
            i += 2;
            continue;
        }
        i += 1;
    }

    let open_quote = if sq {
        Some((opened, b'\''))
    } else if dq {
        Some((opened, b'"'))
    } else if bq {
        Some((opened, b'`'))
    } else {
        None
    };
    Walk {
        stopped_at: None,
        open_quote,
    }
}

/// Offset of the first unquoted word starting with `stop`.
pub(crate) fn stop_offset(src: &str, stop: &str) -> Option<usize> {
    if stop.is_empty() {
        return None;
    }
    let bytes = src.as_bytes();
    walk_unquoted(src, |i| {
        at_word_start(bytes, i) && bytes[i..].starts_with(stop.as_bytes())
    })
    .stopped_at
}

/// The quote left open at the end of `src`, with its offset.
pub(crate) fn unclosed_quote(src: &str) -> Option<(usize, char)> {
    walk_unquoted(src, |_| false)
        .open_quote
        .map(|(offset, quote)| (offset, char::from(quote)))
}

/// Offsets of `|&` tokens that end a statement, as mksh coprocesses do.
/// A `|&` followed by another command on the same line is a bash pipe and
/// is not reported.
pub(crate) fn trailing_coprocs(src: &str) -> Vec<usize> {
    let bytes = src.as_bytes();
    let mut found = Vec::new();
    walk_unquoted(src, |i| {
        if bytes[i..].starts_with(b"|&") && (i == 0 || bytes[i - 1] != b'|') {
            let mut j = i + 2;
            while j < bytes.len() && matches!(bytes[j], b' ' | b'\t') {
                j += 1;
            }
            if j == bytes.len() || matches!(bytes[j], b'\n' | b'\r' | b';' | b'#') {
                found.push(i);
            }
        }
        false
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_at_word_start() {
        let src = "echo a\n__END__\nnot shell";
        assert_eq!(stop_offset(src, "__EN"), Some(7));
    }

    #[test]
    fn stop_at_after_separator() {
        assert_eq!(stop_offset("a;$$ b", "$$"), Some(2));
    }

    #[test]
    fn stop_at_ignores_word_middles() {
        assert_eq!(stop_offset("foo$$ bar", "$$"), None);
    }

    #[test]
    fn stop_at_ignores_quotes() {
        assert_eq!(stop_offset("echo '$$' \"$$\"", "$$"), None);
    }

    #[test]
    fn stop_at_ignores_comments() {
        assert_eq!(stop_offset("# $$\necho", "$$"), None);
    }

    #[test]
    fn stop_at_empty_word() {
        assert_eq!(stop_offset("anything", ""), None);
    }

    #[test]
    fn unclosed_double_quote() {
        assert_eq!(unclosed_quote("echo \"unterminated"), Some((5, '"')));
    }

    #[test]
    fn unclosed_single_quote_after_closed_double() {
        assert_eq!(unclosed_quote("echo \"a\" 'b"), Some((9, '\'')));
    }

    #[test]
    fn escaped_quote_is_not_open() {
        assert_eq!(unclosed_quote("echo \\\"a"), None);
    }

    #[test]
    fn single_quotes_keep_backslashes() {
        assert_eq!(unclosed_quote("echo 'a\\' b"), None);
    }

    #[test]
    fn ansi_strings_escape_quotes() {
        assert_eq!(unclosed_quote("echo $'it\\'s'"), None);
    }

    #[test]
    fn quote_in_comment_is_ignored() {
        assert_eq!(unclosed_quote("echo a # don't"), None);
    }

    #[test]
    fn heredoc_bodies_are_not_scanned() {
        assert_eq!(unclosed_quote("cat <<EOF\nit's\nEOF\necho ok\n"), None);
        assert_eq!(unclosed_quote("cat <<EOF\nit's\nEOF\necho 'x\n"), Some((24, '\'')));
    }

    #[test]
    fn indented_and_quoted_delimiters() {
        assert_eq!(unclosed_quote("cat <<-'END'\n\tdon't\n\tEND\n"), None);
        assert_eq!(unclosed_quote("a <<A <<\"B\"\n'\nA\n\"\nB\n"), None);
    }

    #[test]
    fn arithmetic_shift_is_not_a_heredoc() {
        assert_eq!(unclosed_quote("echo $((1<<2))\necho 'x\n"), Some((20, '\'')));
    }

    #[test]
    fn herestring_is_not_a_heredoc() {
        assert_eq!(unclosed_quote("cat <<< x\n'"), Some((10, '\'')));
    }

    #[test]
    fn stop_at_skips_heredoc_bodies() {
        assert_eq!(stop_offset("cat <<EOF\n$$\nEOF\n$$\n", "$$"), Some(17));
    }

    #[test]
    fn coproc_at_end_of_line() {
        assert_eq!(trailing_coprocs("cmd |&\nfoo |& bar\n"), vec![4]);
    }

    #[test]
    fn coproc_at_end_of_input() {
        assert_eq!(trailing_coprocs("cmd |&  "), vec![4]);
    }

    #[test]
    fn coproc_quoted_is_ignored() {
        assert!(trailing_coprocs("echo '|&'").is_empty());
    }
}
