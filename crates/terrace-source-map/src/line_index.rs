//! Line-break index for offset lookups

use crate::types::{Location, SourceSpan};
use serde::{Deserialize, Serialize};

/// Offset-to-position index for one source text
///
/// Built once per text by a single scan, then answers offset-to-location
/// queries by binary search. Columns are counted in characters, so for
/// non-ASCII text the index also records the byte offset of every character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineIndex {
    /// Byte offsets of each newline character in the text
    line_breaks: Vec<usize>,

    /// Total length of the text in bytes
    total_length: usize,

    /// Byte offset of each character; `None` when the text is pure ASCII
    char_offsets: Option<Vec<usize>>,
}

impl LineIndex {
    /// Scan `content` and build the index.
    ///
    /// # Example
    ///
    /// ```
    /// use terrace_source_map::LineIndex;
    ///
    /// let index = LineIndex::new("line 1\nline 2\nline 3");
    /// assert_eq!(index.line_count(), 3);
    /// ```
    pub fn new(content: &str) -> Self {
        let line_breaks: Vec<usize> = content
            .bytes()
            .enumerate()
            .filter_map(|(idx, b)| if b == b'\n' { Some(idx) } else { None })
            .collect();

        let char_offsets = if content.is_ascii() {
            None
        } else {
            Some(content.char_indices().map(|(idx, _)| idx).collect())
        };

        LineIndex {
            line_breaks,
            total_length: content.len(),
            char_offsets,
        }
    }

    /// Convert a byte offset to a Location with row and column
    ///
    /// Runs in O(log n). Returns None if the offset is out of bounds.
    ///
    /// # Example
    ///
    /// ```
    /// use terrace_source_map::LineIndex;
    ///
    /// let index = LineIndex::new("hello\nworld");
    /// let loc = index.offset_to_location(6).unwrap();
    /// assert_eq!(loc.row, 1);
    /// assert_eq!(loc.column, 0);
    /// ```
    pub fn offset_to_location(&self, offset: usize) -> Option<Location> {
        if offset > self.total_length {
            return None;
        }

        // An offset sitting on a newline belongs to the line it terminates.
        let row = match self.line_breaks.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx,
        };

        let line_start = if row == 0 {
            0
        } else {
            self.line_breaks[row - 1] + 1
        };

        let column = match &self.char_offsets {
            None => offset - line_start,
            Some(chars) => {
                chars.partition_point(|&o| o < offset) - chars.partition_point(|&o| o < line_start)
            }
        };

        Some(Location {
            offset,
            row,
            column,
        })
    }

    /// Build a span from two byte offsets.
    ///
    /// Returns None if either offset is out of bounds or `end < start`.
    pub fn span(&self, start: usize, end: usize) -> Option<SourceSpan> {
        if end < start {
            return None;
        }
        Some(SourceSpan::new(
            self.offset_to_location(start)?,
            self.offset_to_location(end)?,
        ))
    }

    /// Translate a character index into a byte offset.
    ///
    /// Parsers that count positions in characters use this to get back to
    /// byte offsets. Indices past the end clamp to the text length.
    pub fn byte_offset_of_char(&self, char_index: usize) -> usize {
        match &self.char_offsets {
            None => char_index.min(self.total_length),
            Some(chars) => chars.get(char_index).copied().unwrap_or(self.total_length),
        }
    }

    /// Get the total length of the text in bytes
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    /// Get the number of lines in the text
    pub fn line_count(&self) -> usize {
        self.line_breaks.len() + 1
    }
}
