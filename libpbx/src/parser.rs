//! Phase 3: Entry Parser
//!
//! The entry parser reads the token stream of one section body into
//! `(GUID, property dictionary)` pairs. Comments are dropped before parsing;
//! they are regenerated from the object graph on every write.
//!
//! ```text
//! section := (key "=" dict ";")*
//! dict    := "{" (key "=" value ";")* "}"
//! array   := "(" (value ("," value)* ","?)? ")"
//! value   := string | array | dict
//! ```

use crate::error::{ParseContext, ParseError, Result};
use crate::grammar::unquote;
use crate::guid::Guid;
use crate::lexer::{tokenize_with_context, Token, TokenKind};
use crate::scanner::SectionBlock;
use crate::value::{Dict, Value};
use tracing::warn;

/// Parse every entry of a section block.
pub fn parse_section(block: &SectionBlock, ctx: &ParseContext) -> Result<Vec<(Guid, Dict)>> {
    let body = block.body();
    let tokens: Vec<Token> = tokenize_with_context(&body, ctx, block.first_line)?
        .into_iter()
        .filter(|t| t.kind != TokenKind::Comment)
        .collect();
    let parser = Parser {
        source: &body,
        tokens: &tokens,
        ctx,
    };
    parser.parse_entries()
}

struct Parser<'a> {
    source: &'a str,
    tokens: &'a [Token],
    ctx: &'a ParseContext,
}

impl Parser<'_> {
    fn parse_entries(&self) -> Result<Vec<(Guid, Dict)>> {
        let mut entries = Vec::new();
        let mut i = 0;
        while self.kind(i) != TokenKind::Eof {
            let (key, next) = self.parse_string(i, "entry GUID")?;
            let next = self.expect(next, TokenKind::Eq)?;
            if self.kind(next) != TokenKind::LBrace {
                return Err(self.error(next, "\"{\""));
            }
            let (props, next) = self.parse_dict(next)?;
            i = self.expect(next, TokenKind::Semicolon)?;
            entries.push((Guid::new(key), props));
        }
        Ok(entries)
    }

    /// Parse one value starting at token `i`.
    fn parse_value(&self, i: usize) -> Result<(Value, usize)> {
        match self.kind(i) {
            TokenKind::Bare | TokenKind::Quoted => {
                let (s, next) = self.parse_string(i, "value")?;
                Ok((Value::String(s), next))
            }
            TokenKind::LParen => self.parse_array(i),
            TokenKind::LBrace => {
                let (dict, next) = self.parse_dict(i)?;
                Ok((Value::Dict(dict), next))
            }
            _ => Err(self.error(i, "value")),
        }
    }

    fn parse_array(&self, i: usize) -> Result<(Value, usize)> {
        let mut i = self.expect(i, TokenKind::LParen)?;
        let mut items = Vec::new();
        loop {
            if self.kind(i) == TokenKind::RParen {
                return Ok((Value::Array(items), i + 1));
            }
            let (item, next) = self.parse_value(i)?;
            items.push(item);
            i = match self.kind(next) {
                TokenKind::Comma => next + 1,
                TokenKind::RParen => next,
                _ => return Err(self.error(next, "\",\" or \")\"")),
            };
        }
    }

    fn parse_dict(&self, i: usize) -> Result<(Dict, usize)> {
        let mut i = self.expect(i, TokenKind::LBrace)?;
        let mut dict = Dict::new();
        while self.kind(i) != TokenKind::RBrace {
            let key_at = i;
            let (key, next) = self.parse_string(i, "key")?;
            let next = self.expect(next, TokenKind::Eq)?;
            let (value, next) = self.parse_value(next)?;
            i = self.expect(next, TokenKind::Semicolon)?;
            if let Some(previous) = dict.insert(key, value) {
                // The key keeps its first position; the later value wins.
                warn!(
                    key = %self.tokens[key_at].text(self.source),
                    line = self.tokens[key_at].line + 1,
                    replaced = ?previous,
                    "repeated dictionary key"
                );
            }
        }
        Ok((dict, i + 1))
    }

    fn parse_string(&self, i: usize, what: &'static str) -> Result<(String, usize)> {
        match self.kind(i) {
            TokenKind::Bare | TokenKind::Quoted => {
                Ok((unquote(self.tokens[i].text(self.source)), i + 1))
            }
            _ => Err(self.error(i, what)),
        }
    }

    fn expect(&self, i: usize, kind: TokenKind) -> Result<usize> {
        if self.kind(i) == kind {
            Ok(i + 1)
        } else {
            Err(self.error(i, kind.describe()))
        }
    }

    /// Kind of token `i`; positions past the stream read as end of input.
    fn kind(&self, i: usize) -> TokenKind {
        self.tokens.get(i).map_or(TokenKind::Eof, |t| t.kind)
    }

    fn error(&self, i: usize, expected: &'static str) -> ParseError {
        let (found, line) = match self.tokens.get(i) {
            Some(tok) => {
                let found = match tok.kind {
                    TokenKind::Bare | TokenKind::Quoted => {
                        format!("{} {}", tok.kind.describe(), tok.text(self.source).trim_end())
                    }
                    kind => kind.describe().to_string(),
                };
                (found, tok.line)
            }
            None => (TokenKind::Eof.describe().to_string(), 0),
        };
        ParseError::Expected {
            expected,
            found,
            line,
            suffix: self.ctx.loc_suffix(),
        }
    }
}
