//! Source position mapping for checked nodes.
//!
//! Translates the `pos`/`end` offsets carried by check events into
//! 1-based line/character positions by reading the source file.
//! Offsets are UTF-16 code units and `pos` includes leading trivia.

use super::schema::SourceRange;
use super::types::LineChar;
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Line table of one source file
#[derive(Debug, Clone)]
pub struct LineMap {
    units: Vec<u16>,
    line_starts: Vec<usize>,
}

impl LineMap {
    pub fn new(text: &str) -> Self {
        let units: Vec<u16> = text.encode_utf16().collect();
        let mut line_starts = vec![0];

        let mut i = 0;
        while i < units.len() {
            match units[i] {
                0x0D => {
                    if units.get(i + 1) == Some(&0x0A) {
                        i += 1;
                    }
                    line_starts.push(i + 1);
                }
                0x0A | 0x2028 | 0x2029 => line_starts.push(i + 1),
                _ => {}
            }
            i += 1;
        }

        Self { units, line_starts }
    }

    /// 1-based line/character of an offset, clamped to the end of the file
    pub fn line_char(&self, offset: usize) -> LineChar {
        let offset = offset.min(self.units.len());
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        LineChar {
            line: (line + 1) as u32,
            character: (offset - self.line_starts[line] + 1) as u32,
        }
    }

    /// First offset at or after `pos` that is not whitespace or a comment
    pub fn skip_trivia(&self, pos: usize) -> usize {
        let units = &self.units;
        let mut i = pos;

        while i < units.len() {
            match units[i] {
                0x09 | 0x0A | 0x0B | 0x0C | 0x0D | 0x20 | 0xA0 | 0xFEFF | 0x2028 | 0x2029 => i += 1,
                0x2F if units.get(i + 1) == Some(&0x2F) => {
                    while i < units.len() && !matches!(units[i], 0x0A | 0x0D) {
                        i += 1;
                    }
                }
                0x2F if units.get(i + 1) == Some(&0x2A) => {
                    i += 2;
                    while i < units.len() && !(units[i] == 0x2A && units.get(i + 1) == Some(&0x2F)) {
                        i += 1;
                    }
                    i = (i + 2).min(units.len());
                }
                _ => break,
            }
        }

        i
    }

    /// Range of a node given its trivia-inclusive `pos` and its `end`
    pub fn node_range(&self, pos: u32, end: u32) -> SourceRange {
        let start = self.skip_trivia(pos as usize).min(end as usize);
        SourceRange {
            start: self.line_char(start),
            end: self.line_char(end as usize),
        }
    }
}

/// Lazily loaded line tables, one per file, for a single analysis run
#[derive(Debug, Default)]
pub struct SourceFileCache {
    files: HashMap<String, Option<LineMap>>,
}

impl SourceFileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a node to its source range; `None` when the file cannot be read
    pub fn node_range(&mut self, path: &str, pos: u32, end: u32) -> Option<SourceRange> {
        let map = self.files.entry(path.to_string()).or_insert_with(|| {
            match fs::read_to_string(Path::new(path)) {
                Ok(text) => Some(LineMap::new(&text)),
                Err(e) => {
                    debug!("Cannot read {} for position mapping: {}", path, e);
                    None
                }
            }
        });

        map.as_ref().map(|map| map.node_range(pos, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_char() {
        let map = LineMap::new("ab\ncd\r\nef");
        assert_eq!(map.line_char(0), LineChar { line: 1, character: 1 });
        assert_eq!(map.line_char(3), LineChar { line: 2, character: 1 });
        assert_eq!(map.line_char(7), LineChar { line: 3, character: 1 });
        assert_eq!(map.line_char(100), LineChar { line: 3, character: 3 });
    }

    #[test]
    fn test_skip_trivia() {
        let map = LineMap::new("x;\n  // note\n  /* block */ foo()");
        let start = map.skip_trivia(2);
        assert_eq!(map.line_char(start), LineChar { line: 3, character: 15 });
    }

    #[test]
    fn test_utf16_offsets() {
        // U+1F600 takes two UTF-16 units
        let map = LineMap::new("\u{1F600}x");
        assert_eq!(map.line_char(2), LineChar { line: 1, character: 3 });
    }

    #[test]
    fn test_cache_missing_file() {
        let mut cache = SourceFileCache::new();
        assert_eq!(cache.node_range("/definitely/not/here.ts", 0, 1), None);
    }

    #[test]
    fn test_cache_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ts");
        fs::write(&path, "const a = 1;\nconst b = a + 1;\n").unwrap();

        let mut cache = SourceFileCache::new();
        let range = cache
            .node_range(path.to_str().unwrap(), 23, 28)
            .unwrap();
        assert_eq!(range.start, LineChar { line: 2, character: 11 });
        assert_eq!(range.end, LineChar { line: 2, character: 16 });
    }
}
