//! TextBuffer: versioned text content with UTF-16 addressing
//!
//! Offsets exchanged with the oracle and the UI are UTF-16 code units (what a
//! browser's `String.length` counts). The buffer keeps the encoded units next
//! to the `String` so substrings can be cut at any unit offset.
//!
//! Content-addressable skip: replacing the text with identical content is not
//! a mutation and leaves the version untouched.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

// =============================================================================
// TextBuffer
// =============================================================================

/// Text content plus a monotonically increasing version.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    content: String,
    units: Vec<u16>,
    version: u64,
    content_hash: u64,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new("")
    }
}

impl TextBuffer {
    /// Create a buffer at version 0.
    pub fn new(text: impl Into<String>) -> Self {
        let content = text.into();
        let units = content.encode_utf16().collect();
        let content_hash = compute_hash(&content);
        Self {
            content,
            units,
            version: 0,
            content_hash,
        }
    }

    pub fn text(&self) -> &str {
        &self.content
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Length in UTF-16 code units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn content_hash(&self) -> u64 {
        self.content_hash
    }

    /// Replace the content. Returns `true` if this was a mutation (the
    /// version was bumped), `false` if the text was identical.
    pub fn replace(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        let hash = compute_hash(&text);
        if hash == self.content_hash && text == self.content {
            return false;
        }
        self.units = text.encode_utf16().collect();
        self.content = text;
        self.content_hash = hash;
        self.version += 1;
        true
    }

    /// Substring between two UTF-16 offsets, clamped to the buffer.
    ///
    /// A cut through a surrogate pair yields U+FFFD for the orphaned half.
    pub fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.units.len());
        let start = start.min(end);
        String::from_utf16_lossy(&self.units[start..end])
    }

    /// Convert byte offsets into the content to UTF-16 offsets.
    ///
    /// Offsets that fall inside a multi-byte character resolve to the unit
    /// offset of that character's start.
    pub fn to_units(&self, byte_offsets: &[usize]) -> Vec<usize> {
        byte_to_unit_offsets(&self.content, byte_offsets)
    }
}

/// Map byte offsets of `text` to UTF-16 offsets in a single forward walk.
pub fn byte_to_unit_offsets(text: &str, byte_offsets: &[usize]) -> Vec<usize> {
    let mut sorted: Vec<usize> = byte_offsets.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut mapped = Vec::with_capacity(sorted.len());
    let mut chars = text.char_indices().peekable();
    let mut units = 0usize;
    for &target in &sorted {
        while let Some(&(byte, ch)) = chars.peek() {
            if byte + ch.len_utf8() > target {
                break;
            }
            units += ch.len_utf16();
            chars.next();
        }
        mapped.push(units);
    }

    byte_offsets
        .iter()
        .map(|offset| {
            // every offset is present in `sorted`
            let idx = sorted.binary_search(offset).unwrap_or_else(|i| i);
            mapped[idx]
        })
        .collect()
}

fn compute_hash(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_starts_at_version_zero() {
        let buffer = TextBuffer::new("Hello world");
        assert_eq!(buffer.version(), 0);
        assert_eq!(buffer.len(), 11);
    }

    #[test]
    fn test_replace_bumps_version() {
        let mut buffer = TextBuffer::new("Hello");
        assert!(buffer.replace("Hello world"));
        assert_eq!(buffer.version(), 1);
        assert!(buffer.replace("Hello"));
        assert_eq!(buffer.version(), 2);
    }

    #[test]
    fn test_identical_replace_is_not_a_mutation() {
        let mut buffer = TextBuffer::new("Hello");
        assert!(!buffer.replace("Hello"));
        assert_eq!(buffer.version(), 0);
    }

    #[test]
    fn test_whitespace_matters() {
        let mut buffer = TextBuffer::new("Hello world");
        assert!(buffer.replace("Hello  world"));
        assert!(buffer.replace("Hello  world "));
        assert_eq!(buffer.version(), 2);
    }

    #[test]
    fn test_len_counts_utf16_units() {
        // "é" is one unit, the emoji is a surrogate pair
        let buffer = TextBuffer::new("é😀a");
        assert_eq!(buffer.len(), 4);
        assert_eq!(buffer.text().len(), 2 + 4 + 1);
    }

    #[test]
    fn test_slice_by_units() {
        let buffer = TextBuffer::new("a😀bc");
        assert_eq!(buffer.slice(0, 1), "a");
        assert_eq!(buffer.slice(1, 3), "😀");
        assert_eq!(buffer.slice(3, 99), "bc");
        assert_eq!(buffer.slice(7, 2), "");
    }

    #[test]
    fn test_slice_through_surrogate_pair_is_lossy() {
        let buffer = TextBuffer::new("😀");
        assert_eq!(buffer.slice(0, 1), "\u{FFFD}");
    }

    #[test]
    fn test_byte_to_unit_offsets() {
        let text = "ab😀cé d";
        // a=0 b=1 😀=2..6 c=6 é=7..9 ' '=9 d=10
        let units = byte_to_unit_offsets(text, &[10, 0, 6, 2, 7, 9, 11, 3]);
        assert_eq!(units, vec![7, 0, 4, 2, 5, 6, 8, 2]);
    }

    #[test]
    fn test_byte_to_unit_offsets_ascii_is_identity() {
        let text = "plain ascii";
        let offsets = vec![0, 3, 5, 11];
        assert_eq!(byte_to_unit_offsets(text, &offsets), offsets);
    }
}
