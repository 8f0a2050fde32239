//! Lexical rules shared by the tokenizer and the serializer.
//!
//! The bare-word charset decides both what the tokenizer reads as one
//! unquoted token and what the serializer may write without quotes.

/// Whether `ch` may appear in an unquoted word.
pub fn is_bare_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '.' || ch == '_' || ch == '/'
}

/// Whether `s` must be quoted on output.
pub fn needs_quotes(s: &str) -> bool {
    s.is_empty() || !s.chars().all(is_bare_char)
}

/// Render a string value the way it appears in a document.
///
/// Values read from a document hold their text as written, escapes
/// included, and come back out unchanged. Only what could not appear
/// between quotes is escaped: a quote not already escaped, a newline and a
/// backslash that escapes nothing.
pub fn quote(s: &str) -> String {
    if !needs_quotes(s) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.peek() {
                Some(&next) if next != '\n' => {
                    out.push('\\');
                    out.push(next);
                    chars.next();
                }
                _ => out.push_str("\\\\"),
            },
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Text of a bare or quoted token: the quotes are dropped, escapes are kept
/// as written.
///
/// A quoted token that was closed by the end of its line carries the newline
/// instead of a closing quote; it is dropped as well.
pub fn unquote(token: &str) -> String {
    let Some(inner) = token.strip_prefix('"') else {
        return token.to_string();
    };
    inner
        .strip_suffix('"')
        .or_else(|| inner.strip_suffix('\n'))
        .unwrap_or(inner)
        .to_string()
}
