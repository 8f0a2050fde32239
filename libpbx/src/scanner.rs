//! Phase 1: Scanner
//!
//! The scanner splits a document into its line-level parts:
//! - the header, up to and including the line that opens the object table
//! - one block per `/* Begin X section */` ... `/* End X section */` pair
//! - the footer, from the first non-blank line that opens no section
//!
//! Blank lines between sections are not kept; the serializer writes its own.
//! The line ending of the document and whether its last line is terminated
//! are recorded so the serializer can reproduce them.

use crate::error::{ParseContext, ParseError, Result};

/// Line that opens the object table, compared after trimming.
const OBJECTS_OPEN: &str = "objects = {";

/// The lines of one section, without its marker lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionBlock {
    pub name: String,
    pub lines: Vec<String>,
    /// Zero-based document line of the first body line.
    pub first_line: usize,
}

impl SectionBlock {
    /// Body text to tokenize.
    pub fn body(&self) -> String {
        self.lines.join("\n")
    }
}

/// Line terminator used throughout a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// Detected from the first line of `source`.
    pub fn detect(source: &str) -> Self {
        match source.find('\n') {
            Some(at) if source[..at].ends_with('\r') => LineEnding::CrLf,
            _ => LineEnding::Lf,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Result of scanning a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub header: Vec<String>,
    pub blocks: Vec<SectionBlock>,
    pub footer: Vec<String>,
    pub line_ending: LineEnding,
    /// The last line has no terminator.
    pub unterminated: bool,
}

/// Scan source text into header, section blocks and footer.
pub fn scan(source: &str, ctx: &ParseContext) -> Result<ScanResult> {
    let lines: Vec<&str> = source.lines().collect();

    let objects_at = lines
        .iter()
        .position(|l| l.trim() == OBJECTS_OPEN)
        .ok_or_else(|| ParseError::MissingObjectTable(ctx.loc_suffix()))?;
    let header = lines[..=objects_at].iter().map(|l| l.to_string()).collect();

    let mut blocks = Vec::new();
    let mut pos = objects_at + 1;
    loop {
        while pos < lines.len() && lines[pos].trim().is_empty() {
            pos += 1;
        }
        let Some(name) = lines.get(pos).and_then(|l| section_marker(l, "Begin")) else {
            break;
        };
        let begin_line = pos;
        pos += 1;
        let first_line = pos;

        let end = loop {
            let Some(line) = lines.get(pos) else {
                return Err(ParseError::UnterminatedSection {
                    name: name.to_string(),
                    line: begin_line,
                    suffix: ctx.loc_suffix(),
                });
            };
            if let Some(found) = section_marker(line, "End") {
                if found != name {
                    return Err(ParseError::MismatchedSectionEnd {
                        expected: name.to_string(),
                        found: found.to_string(),
                        line: pos,
                        suffix: ctx.loc_suffix(),
                    });
                }
                break pos;
            }
            pos += 1;
        };

        blocks.push(SectionBlock {
            name: name.to_string(),
            lines: lines[first_line..end].iter().map(|l| l.to_string()).collect(),
            first_line,
        });
        pos = end + 1;
    }

    let footer = lines[pos.min(lines.len())..]
        .iter()
        .map(|l| l.to_string())
        .collect();

    Ok(ScanResult {
        header,
        blocks,
        footer,
        line_ending: LineEnding::detect(source),
        unterminated: !source.is_empty() && !source.ends_with('\n'),
    })
}

/// Match `/* <which> NAME section */`, returning NAME.
fn section_marker<'a>(line: &'a str, which: &str) -> Option<&'a str> {
    let inner = line
        .trim()
        .strip_prefix("/*")?
        .strip_suffix("*/")?
        .trim();
    let rest = inner.strip_prefix(which)?.strip_suffix("section")?;
    let name = rest.trim();
    if name.is_empty() || name.contains(char::is_whitespace) || !rest.starts_with(' ') {
        return None;
    }
    Some(name)
}
