//! Text utilities for position conversion.
//!
//! Provides byte offset <-> LSP position conversion with UTF-16 columns. The
//! same index type serves host documents and virtual sub-documents, so each
//! coordinate space gets its own instance.

use std::ops::Range;
use std::sync::Arc;

use tower_lsp::lsp_types::Position;

/// Pre-computed line starts over a shared text buffer.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset where each line starts.
    line_starts: Vec<usize>,
    text: Arc<str>,
}

impl LineIndex {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        let text = text.into();
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Self { line_starts, text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cheap handle to the underlying buffer.
    pub fn shared_text(&self) -> Arc<str> {
        Arc::clone(&self.text)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert a byte offset to an LSP position. Offsets past the end clamp
    /// to the end of the text.
    pub fn offset_to_position(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };

        let line_start = self.line_starts[line];
        let col: usize = self.text[line_start..]
            .char_indices()
            .take_while(|(i, _)| line_start + i < offset)
            .map(|(_, c)| c.len_utf16())
            .sum();

        Position::new(line as u32, col as u32)
    }

    /// Convert an LSP position to a byte offset.
    ///
    /// Returns None if the line does not exist. Columns past the end of the
    /// line clamp to the line end.
    pub fn position_to_offset(&self, position: Position) -> Option<usize> {
        let line = position.line as usize;
        let line_start = *self.line_starts.get(line)?;
        let line_end = self
            .line_starts
            .get(line + 1)
            .map(|&next| next - 1)
            .unwrap_or(self.text.len());

        let mut utf16_col = 0u32;
        for (i, c) in self.text[line_start..line_end].char_indices() {
            if utf16_col >= position.character {
                return Some(line_start + i);
            }
            utf16_col += c.len_utf16() as u32;
        }

        Some(line_end)
    }

    pub fn span_to_range(&self, span: &Range<usize>) -> tower_lsp::lsp_types::Range {
        tower_lsp::lsp_types::Range::new(
            self.offset_to_position(span.start),
            self.offset_to_position(span.end),
        )
    }

    pub fn end_position(&self) -> Position {
        self.offset_to_position(self.text.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_line() {
        let idx = LineIndex::new("hello\nworld\ntest");
        assert_eq!(idx.line_count(), 3);
        assert_eq!(idx.offset_to_position(0), Position::new(0, 0));
        assert_eq!(idx.offset_to_position(5), Position::new(0, 5));
        assert_eq!(idx.offset_to_position(6), Position::new(1, 0));
        assert_eq!(idx.offset_to_position(12), Position::new(2, 0));
    }

    #[test]
    fn position_to_offset_clamps_column() {
        let idx = LineIndex::new("ab\ncd");
        assert_eq!(idx.position_to_offset(Position::new(0, 9)), Some(2));
        assert_eq!(idx.position_to_offset(Position::new(1, 1)), Some(4));
        assert_eq!(idx.position_to_offset(Position::new(2, 0)), None);
    }

    #[test]
    fn utf16_columns() {
        let idx = LineIndex::new("a😀b");
        assert_eq!(idx.offset_to_position(5), Position::new(0, 3));
        assert_eq!(idx.position_to_offset(Position::new(0, 3)), Some(5));
    }

    #[test]
    fn offset_past_end_clamps() {
        let idx = LineIndex::new("abc\n");
        assert_eq!(idx.offset_to_position(100), Position::new(1, 0));
        assert_eq!(idx.end_position(), Position::new(1, 0));
    }

    #[test]
    fn span_to_range() {
        let idx = LineIndex::new("hello\nworld");
        let range = idx.span_to_range(&(6..11));
        assert_eq!(range.start, Position::new(1, 0));
        assert_eq!(range.end, Position::new(1, 5));
    }
}
