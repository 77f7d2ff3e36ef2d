//! Repair for the server's malformed JSON output.
//!
//! The server fails to escape control characters inside string literals, so
//! a frame must be repaired before it can be deserialized. The repair is a
//! single left-to-right scan that tracks whether the cursor is inside a
//! string and substitutes the offending characters with their two-character
//! escapes. String boundaries are detected heuristically, not by a JSON
//! tokenizer: a quote only closes a string when it is not itself escaped and
//! is followed by one of the dialect's fixed value-ending delimiters. The
//! scan needs the complete frame; the delimiter lookahead cannot run on a
//! partial buffer.

use std::borrow::Cow;

/// Escapes unescaped control characters inside string literals.
///
/// Returns `Cow::Borrowed` when the text needed no repair. Control
/// characters outside string literals (the dialect's own line endings and
/// indentation) are left untouched.
pub fn repair(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    let mut repaired: Option<String> = None;
    let mut within_string = false;

    for (i, ch) in text.char_indices() {
        if ch == '"' {
            if within_string {
                if !is_escaped_quote(bytes, i) && ends_value(&text[i..]) {
                    within_string = false;
                }
            } else {
                within_string = true;
            }
        }

        match if within_string { escape_for(ch) } else { None } {
            Some(escape) => {
                let out = repaired.get_or_insert_with(|| {
                    let mut out = String::with_capacity(text.len() + 16);
                    out.push_str(&text[..i]);
                    out
                });
                out.push_str(escape);
            }
            None => {
                if let Some(out) = repaired.as_mut() {
                    out.push(ch);
                }
            }
        }
    }

    match repaired {
        Some(out) => Cow::Owned(out),
        None => Cow::Borrowed(text),
    }
}

/// A quote preceded by a lone backslash is escaped string content. A quote
/// preceded by two backslashes follows an escaped backslash and is a real
/// boundary candidate. Out-of-range lookbehind counts as no backslash.
fn is_escaped_quote(bytes: &[u8], i: usize) -> bool {
    let prev_backslash = i >= 1 && bytes[i - 1] == b'\\';
    let prev2_backslash = i >= 2 && bytes[i - 2] == b'\\';
    prev_backslash && !prev2_backslash
}

/// The dialect closes string values with a fixed delimiter set: the key
/// separator, or a line ending, optionally preceded by a comma.
fn ends_value(tail: &str) -> bool {
    tail.starts_with("\" : ")
        || tail.starts_with("\"\n")
        || tail.starts_with("\",\n")
        || tail.starts_with("\"\r\n")
        || tail.starts_with("\",\r\n")
}

fn escape_for(ch: char) -> Option<&'static str> {
    match ch {
        '\n' => Some("\\n"),
        '\t' => Some("\\t"),
        '\u{0008}' => Some("\\b"),
        '\u{000C}' => Some("\\f"),
        '\r' => Some("\\r"),
        _ => None,
    }
}
