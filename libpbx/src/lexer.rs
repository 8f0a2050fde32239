//! Phase 2: Tokenizer
//!
//! The tokenizer converts the text of a section body into a flat token
//! stream. It emits:
//! - `Bare`: unquoted words drawn from letters, digits, `.`, `_` and `/`
//! - `Quoted`: double-quoted strings, delimiters included
//! - `Comment`: `/* ... */` and `// ...` comments
//! - one operator token per structural character
//! - `Eof` as the final token
//!
//! Tokens only record positions; the text is sliced from the source on demand.

use crate::error::{ParseContext, ParseError, Result};
use crate::grammar::is_bare_char;

/// Token type in the tokenizer output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// End of input.
    Eof,
    /// Placeholder kind; never produced by a successful scan.
    Invalid,
    /// Unquoted word.
    Bare,
    /// Double-quoted string.
    Quoted,
    /// Block or line comment.
    Comment,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `=`
    Eq,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
}

impl TokenKind {
    /// Short human description for grammar errors.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Eof => "end of input",
            TokenKind::Invalid => "invalid token",
            TokenKind::Bare => "word",
            TokenKind::Quoted => "quoted string",
            TokenKind::Comment => "comment",
            TokenKind::Semicolon => "\";\"",
            TokenKind::Comma => "\",\"",
            TokenKind::Eq => "\"=\"",
            TokenKind::LParen => "\"(\"",
            TokenKind::RParen => "\")\"",
            TokenKind::LBrace => "\"{\"",
            TokenKind::RBrace => "\"}\"",
        }
    }
}

/// A single token in the token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Zero-based line the token starts on.
    pub line: usize,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl Token {
    /// The source text covered by this token.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// Tokenize `text`, returning a stream terminated by an `Eof` token.
pub fn tokenize(text: &str) -> Result<Vec<Token>> {
    tokenize_with_context(text, &ParseContext::default(), 0)
}

/// Tokenize with a context for error messages; `first_line` is the document
/// line `text` starts on.
pub(crate) fn tokenize_with_context(
    text: &str,
    ctx: &ParseContext,
    first_line: usize,
) -> Result<Vec<Token>> {
    let mut lexer = Lexer {
        text,
        pos: 0,
        line: first_line,
    };
    let mut tokens = Vec::new();
    loop {
        let tok = lexer.scan_one(ctx)?;
        tokens.push(tok);
        if tok.kind == TokenKind::Eof {
            break;
        }
    }
    Ok(tokens)
}

struct Lexer<'a> {
    text: &'a str,
    pos: usize,
    line: usize,
}

impl Lexer<'_> {
    /// Character at the cursor, if any.
    fn current(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    /// Character after the cursor; reading past the end is harmless.
    fn lookahead(&self) -> Option<char> {
        let mut chars = self.text[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Advance over one character, counting newlines.
    fn bump(&mut self) -> Option<char> {
        let ch = self.current()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn scan_one(&mut self, ctx: &ParseContext) -> Result<Token> {
        while self.current().is_some_and(char::is_whitespace) {
            self.bump();
        }

        let start = self.pos;
        let line = self.line;
        let Some(ch) = self.current() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                line,
                start,
                end: start,
            });
        };

        let kind = match (ch, self.lookahead()) {
            ('"', _) => self.scan_quoted(),
            ('/', Some('*')) => self.scan_block_comment(),
            ('/', Some('/')) => self.scan_line_comment(),
            (c, _) if is_bare_char(c) => self.scan_bare(),
            (c, _) => match operator_kind(c) {
                Some(kind) => {
                    self.bump();
                    kind
                }
                None => {
                    return Err(ParseError::InvalidChar {
                        ch: c,
                        line,
                        suffix: ctx.loc_suffix(),
                    })
                }
            },
        };

        Ok(Token {
            kind,
            line,
            start,
            end: self.pos,
        })
    }

    fn scan_bare(&mut self) -> TokenKind {
        while self.current().is_some_and(is_bare_char) {
            self.bump();
        }
        TokenKind::Bare
    }

    /// Quoted strings close at the next unescaped quote, or at the end of the
    /// line when the quote is missing.
    fn scan_quoted(&mut self) -> TokenKind {
        self.bump();
        while let Some(ch) = self.current() {
            match ch {
                '\\' if self.lookahead().is_some_and(|c| c != '\n') => {
                    self.bump();
                    self.bump();
                }
                '"' | '\n' => {
                    self.bump();
                    break;
                }
                _ => {
                    self.bump();
                }
            }
        }
        TokenKind::Quoted
    }

    fn scan_block_comment(&mut self) -> TokenKind {
        self.bump();
        self.bump();
        while self.current().is_some() {
            if self.current() == Some('*') && self.lookahead() == Some('/') {
                self.bump();
                self.bump();
                break;
            }
            self.bump();
        }
        TokenKind::Comment
    }

    fn scan_line_comment(&mut self) -> TokenKind {
        while let Some(ch) = self.bump() {
            if ch == '\n' {
                break;
            }
        }
        TokenKind::Comment
    }
}

fn operator_kind(ch: char) -> Option<TokenKind> {
    match ch {
        ';' => Some(TokenKind::Semicolon),
        ',' => Some(TokenKind::Comma),
        '=' => Some(TokenKind::Eq),
        '(' => Some(TokenKind::LParen),
        ')' => Some(TokenKind::RParen),
        '{' => Some(TokenKind::LBrace),
        '}' => Some(TokenKind::RBrace),
        _ => None,
    }
}
