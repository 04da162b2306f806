//! Source location tracking.
//!
//! The engine compiles a single, contiguous source buffer per `interpret`
//! call, so unlike a multi-file compiler we only need to carry
//! a line number and a byte range within that one buffer — there is no
//! [`FileId`]-style indirection to a source map of several files.

/// A location within the source buffer currently being compiled.
///
/// `start`/`end` are byte offsets into the buffer; `line` is the
/// 1-based source line the span starts on, used for error messages and
/// for `Chunk`'s line table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
}

impl Span {
    pub const fn new(start: usize, end: usize, line: u32) -> Self {
        Self { start, end, line }
    }

    /// A zero-width span at the given line, used for synthetic tokens
    /// (e.g. the implicit `this` local of a method).
    pub const fn at_line(line: u32) -> Self {
        Self { start: 0, end: 0, line }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slice the given source buffer with this span's byte range.
    ///
    /// Panics if the span does not fall within `source` — callers only
    /// ever build spans from offsets taken from that same buffer.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}
