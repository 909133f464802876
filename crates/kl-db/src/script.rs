//! Splitting migration scripts into individual statements.
//!
//! Statements end at the current delimiter (`;` by default) when it appears
//! outside quoted text, comments, and dollar-quoted bodies. A line of the form
//! `DELIMITER <token>` switches the delimiter, as in MySQL client scripts, and
//! is not itself executed.
//!
//! MySQL scripts additionally treat `#` as a line comment and `\` as an
//! escape inside quoted text. Elsewhere a backslash is an ordinary character.

use crate::dialect::Dialect;

const DEFAULT_DELIMITER: &str = ";";

/// Split `script` into trimmed statements, in source order, using the
/// lexical rules of `dialect`.
///
/// Fragments consisting only of whitespace and comments are dropped.
pub fn split_statements(script: &str, dialect: Dialect) -> Vec<String> {
    let mysql = dialect == Dialect::MySql;
    let bytes = script.as_bytes();
    let len = bytes.len();
    let mut statements = Vec::new();
    let mut delimiter = DEFAULT_DELIMITER.to_string();
    let mut start = 0;
    let mut i = 0;
    let mut has_code = false;
    let mut at_line_start = true;

    let flush = |from: usize, to: usize, has_code: bool, out: &mut Vec<String>| {
        if has_code {
            let text = script[from..to].trim();
            if !text.is_empty() {
                out.push(text.to_string());
            }
        }
    };

    while i < len {
        let b = bytes[i];

        if at_line_start && !b.is_ascii_whitespace() {
            if let Some((new_delimiter, consumed)) = delimiter_directive(&script[i..]) {
                flush(start, i, has_code, &mut statements);
                log::debug!("Statement delimiter changed to '{new_delimiter}'");
                delimiter = new_delimiter;
                i += consumed;
                start = i;
                has_code = false;
                at_line_start = true;
                continue;
            }
            at_line_start = false;
        }

        if bytes[i..].starts_with(delimiter.as_bytes()) {
            flush(start, i, has_code, &mut statements);
            i += delimiter.len();
            start = i;
            has_code = false;
            continue;
        }

        match b {
            b'\'' | b'"' | b'`' => {
                let backslash_escapes = mysql && b != b'`';
                i = skip_quoted(bytes, i, b, backslash_escapes);
                has_code = true;
                continue;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = skip_line_comment(bytes, i);
                continue;
            }
            b'#' if mysql || delimiter != DEFAULT_DELIMITER => {
                i = skip_line_comment(bytes, i);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_block_comment(bytes, i);
                continue;
            }
            b'$' if i == 0 || !is_identifier_byte(bytes[i - 1]) => {
                if let Some(end) = skip_dollar_quoted(script, i) {
                    i = end;
                    has_code = true;
                    continue;
                }
                has_code = true;
            }
            b'\n' => at_line_start = true,
            b'$' => has_code = true,
            _ if !b.is_ascii_whitespace() => has_code = true,
            _ => {}
        }
        i += 1;
    }

    flush(start, len, has_code, &mut statements);
    statements
}

/// Recognise `DELIMITER <token>` at the start of `rest`, returning the token
/// and the number of bytes consumed including the line break.
fn delimiter_directive(rest: &str) -> Option<(String, usize)> {
    let line_len = rest.find('\n').map(|p| p + 1).unwrap_or(rest.len());
    let line = rest[..line_len].trim();
    let keyword = line.get(..9)?;
    if !keyword.eq_ignore_ascii_case("delimiter") {
        return None;
    }
    let remainder = &line[9..];
    if !remainder.starts_with(|c: char| c.is_ascii_whitespace()) {
        return None;
    }
    let token = remainder.split_whitespace().next()?;
    Some((token.to_string(), line_len))
}

/// Index just past the closing `quote`. Doubled quotes are escapes, and so
/// is a backslash when `backslash_escapes` is set.
fn skip_quoted(bytes: &[u8], open: usize, quote: u8, backslash_escapes: bool) -> usize {
    let mut i = open + 1;
    while i < bytes.len() {
        if backslash_escapes && bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i] == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// Bytes that continue an identifier, so a following `$` belongs to it
/// (`SYS$USER`, `t$a$`) rather than opening a dollar quote.
fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || !b.is_ascii()
}

/// Index of the newline ending the comment (or end of input).
fn skip_line_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|p| start + p)
        .unwrap_or(bytes.len())
}

/// Index just past `*/` (or end of input).
fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 2;
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return i + 2;
        }
        i += 1;
    }
    bytes.len()
}

/// For a `$tag$ ... $tag$` body starting at `start`, the index just past the
/// closing tag. `None` when `$` does not open a dollar quote (e.g. `$1`).
fn skip_dollar_quoted(script: &str, start: usize) -> Option<usize> {
    let rest = &script[start + 1..];
    let tag_len = rest.find('$')?;
    let tag = &rest[..tag_len];
    let valid_tag = tag.is_empty()
        || (tag.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
            && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    if !valid_tag {
        return None;
    }
    let opener_len = tag_len + 2;
    let closer = format!("${tag}$");
    let body_start = start + opener_len;
    script[body_start..]
        .find(&closer)
        .map(|p| body_start + p + closer.len())
        .or(Some(script.len()))
}

#[cfg(test)]
#[path = "script_test.rs"]
mod tests;
