use std::path::PathBuf;

use crate::syntax::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub u32);

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub id: SourceId,
    pub path: PathBuf,
    pub contents: String,
}

impl SourceFile {
    pub fn new(id: SourceId, path: PathBuf, contents: String) -> Self {
        Self { id, path, contents }
    }
}

/// Maps byte offsets in a source text to 1-based line/column positions.
///
/// Columns count characters, not bytes, so multi-byte characters occupy a
/// single column.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    text: String,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(offset + 1);
            }
        }
        Self {
            line_starts,
            text: text.to_string(),
        }
    }

    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let column = self
            .text
            .get(line_start..offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(offset - line_start);
        Position::new(line + 1, column + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_offsets_to_lines_and_columns() {
        let index = LineIndex::new("let x = 1\nlet y = x\n");
        assert_eq!(index.position(0), Position::new(1, 1));
        assert_eq!(index.position(4), Position::new(1, 5));
        assert_eq!(index.position(10), Position::new(2, 1));
        assert_eq!(index.position(18), Position::new(2, 9));
    }

    #[test]
    fn counts_characters_rather_than_bytes() {
        let index = LineIndex::new("\"héllo\" x");
        assert_eq!(index.position(9), Position::new(1, 9));
    }
}
