//! Template source split into lines

use crate::error::{CompileError, Span};

/// One line of template text.
///
/// `offset` is the byte position of `text` in the original source, so spans
/// stay meaningful after a parent block's indentation has been stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-based line number in the original source
    pub number: usize,
    pub offset: usize,
    pub text: String,
}

impl SourceLine {
    pub fn new(number: usize, offset: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            offset,
            text: text.into(),
        }
    }

    /// Leading whitespace run
    pub fn indent(&self) -> &str {
        let end = self.text.len() - self.text.trim_start().len();
        &self.text[..end]
    }

    /// Text after the indentation
    pub fn content(&self) -> &str {
        self.text.trim_start()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Byte range of the whole line in the original source
    pub fn span(&self) -> Span {
        self.offset..self.offset + self.text.len()
    }

    /// Byte range of `fragment` if it occurs in this line, else the whole line
    pub fn locate(&self, fragment: &str) -> Span {
        match self.text.find(fragment) {
            Some(pos) if !fragment.is_empty() => {
                let start = self.offset + pos;
                start..start + fragment.len()
            }
            _ => self.span(),
        }
    }

    /// The same line with its first `len` bytes removed
    fn strip(&self, len: usize) -> SourceLine {
        let len = len.min(self.text.len());
        SourceLine::new(self.number, self.offset + len, &self.text[len..])
    }
}

/// Split template text into lines.
///
/// `\r\n` and lone `\r` count as line breaks. Line breaks at the very start
/// and end of the text are dropped; other whitespace is kept since it may be
/// indentation.
pub fn source_lines(source: &str) -> Vec<SourceLine> {
    let mut lines = Vec::new();
    let mut number = 1;
    let mut offset = 0;
    let bytes = source.as_bytes();
    let mut start = 0;
    let mut i = 0;

    while i <= bytes.len() {
        let at_end = i == bytes.len();
        if at_end || bytes[i] == b'\n' || bytes[i] == b'\r' {
            lines.push(SourceLine::new(number, offset, &source[start..i]));
            number += 1;
            // \r\n is a single break
            let width = if !at_end && bytes[i] == b'\r' && bytes.get(i + 1) == Some(&b'\n') {
                2
            } else {
                1
            };
            i += width;
            start = i;
            offset = i;
            continue;
        }
        i += 1;
    }

    let first = lines.iter().position(|l| !l.text.is_empty());
    let last = lines.iter().rposition(|l| !l.text.is_empty());
    match (first, last) {
        (Some(first), Some(last)) => lines.drain(first..=last).collect(),
        _ => Vec::new(),
    }
}

/// Does `line` belong to a block opened at `indent`?
///
/// Blank lines always do. Otherwise the line's indentation must extend the
/// opener's by at least one character.
pub fn is_child(line: &SourceLine, indent: &str) -> bool {
    if line.is_blank() {
        return true;
    }
    let own = line.indent();
    own.len() > indent.len() && own.starts_with(indent)
}

/// Check that a line outside the block at `indent` is a clean outdent.
///
/// A prefix that neither extends nor is a prefix of `indent` mixes tabs and
/// spaces inconsistently.
pub fn check_outdent(line: &SourceLine, indent: &str) -> Result<(), CompileError> {
    let own = line.indent();
    if line.is_blank() || indent.starts_with(own) {
        Ok(())
    } else {
        Err(CompileError::MixedIndentation {
            line: line.number,
            span: line.span(),
        })
    }
}

/// Strip a block's indentation from its child lines.
///
/// Removes the opener's `indent` and then the indentation shared by every
/// non-blank child, so the children can be compiled as a standalone
/// sequence. Blank children become empty lines.
pub fn dedent(children: &[SourceLine], indent: &str) -> Result<Vec<SourceLine>, CompileError> {
    let extra = children
        .iter()
        .filter(|line| !line.is_blank())
        .map(|line| &line.indent()[indent.len()..])
        .min_by_key(|extra| extra.len())
        .unwrap_or("")
        .to_string();

    children
        .iter()
        .map(|line| {
            if line.is_blank() {
                return Ok(SourceLine::new(line.number, line.offset + line.text.len(), ""));
            }
            if !line.indent()[indent.len()..].starts_with(&extra) {
                return Err(CompileError::MixedIndentation {
                    line: line.number,
                    span: line.span(),
                });
            }
            Ok(line.strip(indent.len() + extra.len()))
        })
        .collect()
}
