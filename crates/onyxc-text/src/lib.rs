//! Source file storage and byte-offset <-> line/column arithmetic.
//!
//! Source files are read once and never mutated, unlike an editor buffer, so this
//! crate keeps things to a flat `String` plus a precomputed table of line-start
//! offsets rather than a rope. Every position downstream (diagnostics, the
//! loaded-file registry, entity provenance) is expressed in terms of the types
//! defined here.

use std::path::{Path, PathBuf};

/// A byte offset into a `SourceFile`'s text.
pub type ByteOffset = usize;

/// A half-open byte range `[start, end)` within a single `SourceFile`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: ByteOffset,
    pub end: ByteOffset,
}

impl Span {
    pub fn new(start: ByteOffset, end: ByteOffset) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn merge(&self, other: &Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A 1-based line/column position, the form diagnostics are rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// The position synthesized for compiler-internal entities that have no
    /// originating source text (built-ins, boot-sequencer injections).
    pub fn internal() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One absorbed source file: its resolved path and full text, plus a
/// precomputed line-start table so byte offsets can be turned into
/// human-facing positions without rescanning the text each time.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
    line_starts: Vec<ByteOffset>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = compute_line_starts(&text);
        Self {
            path: path.into(),
            text,
            line_starts,
        }
    }

    /// Synthesize a source file standing in for a location with no real text,
    /// used for compiler-internal entities (e.g. the boot sequencer's built-in
    /// global symbols).
    pub fn internal(label: &str) -> Self {
        Self::new(PathBuf::from(format!("<{label}>")), String::new())
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert a byte offset into a 1-based line/column position. Offsets past
    /// the end of the text clamp to the last line.
    pub fn position_at(&self, offset: ByteOffset) -> Position {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let line_start = self.line_starts[line_idx];
        let column = self.text[line_start..offset.min(self.text.len())]
            .chars()
            .count()
            + 1;
        Position::new(line_idx as u32 + 1, column as u32)
    }

    pub fn slice(&self, span: &Span) -> &str {
        &self.text[span.start..span.end]
    }
}

fn compute_line_starts(text: &str) -> Vec<ByteOffset> {
    let mut starts = vec![0];
    for (idx, byte) in text.bytes().enumerate() {
        if byte == b'\n' {
            starts.push(idx + 1);
        }
    }
    starts
}

/// Resolve `name` relative to `base_dir`, returning the path unchanged if it is
/// already absolute. Does not touch the filesystem.
pub fn resolve_relative(base_dir: &Path, name: &Path) -> PathBuf {
    if name.is_absolute() {
        name.to_path_buf()
    } else {
        base_dir.join(name)
    }
}

/// The conventional source extension for this language, appended by the
/// loader when a load name doesn't already carry an extension.
pub const SOURCE_EXTENSION: &str = "onyx";
