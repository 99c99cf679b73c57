//! Source locations

/// A byte range in the source together with the position of its first
/// character. `line` is 1-based, `column` is a 0-based character offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self { start, end, line, column }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        let (first, _) = if other.start < self.start { (other, self) } else { (self, other) };
        Span {
            start: first.start,
            end: self.end.max(other.end),
            line: first.line,
            column: first.column,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Maps byte offsets to line/column positions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self { line_starts }
    }

    /// Line (1-based) and column (0-based, in characters) of `offset`.
    pub fn position(&self, source: &str, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.line_starts[line];
        let end = offset.min(source.len());
        let column = source.get(line_start..end).map_or(0, |s| s.chars().count());
        (line + 1, column)
    }

    /// Build a span for the byte range `start..end`.
    pub fn span(&self, source: &str, start: usize, end: usize) -> Span {
        let (line, column) = self.position(source, start);
        Span::new(start, end, line, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_earliest_position() {
        let a = Span::new(10, 15, 2, 3);
        let b = Span::new(2, 6, 1, 2);
        let merged = a.merge(b);
        assert_eq!(merged, Span::new(2, 15, 1, 2));
    }

    #[test]
    fn test_line_index_counts_characters_not_bytes() {
        let source = "برنامج س؛\n  متغير";
        let index = LineIndex::new(source);
        let offset = source.find("متغير").unwrap();
        assert_eq!(index.position(source, offset), (2, 2));
        // "س" follows six Arabic letters and a space
        let offset = source.find('س').unwrap();
        assert_eq!(index.position(source, offset), (1, 7));
    }

    #[test]
    fn test_position_at_start() {
        let index = LineIndex::new("abc");
        assert_eq!(index.position("abc", 0), (1, 0));
    }
}
