//! Splits a concatenated transcript into bounded, overlapping chunks.
//!
//! Each chunk fits a single model call. Consecutive chunks share a fixed
//! overlap so concepts spanning a boundary survive in at least one chunk.
//! Cuts prefer paragraph, then sentence, then word breaks over hard cuts.

/// Configuration for the transcript chunker.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Maximum chunk length in bytes.
    pub max_chars: usize,
    /// Overlap carried into the next chunk, in bytes. Must be < max_chars.
    pub overlap_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chars: 20_000,
            overlap_chars: 1_000,
        }
    }
}

/// Split `text` into ordered chunks of at most `max_chars` bytes where each
/// chunk after the first repeats exactly `overlap_chars` bytes of its
/// predecessor. Empty (or whitespace-only) input yields no chunks.
pub fn split_text(text: &str, config: &ChunkerConfig) -> Vec<String> {
    assert!(
        config.overlap_chars < config.max_chars,
        "overlap must be smaller than the chunk size"
    );

    if text.trim().is_empty() {
        return Vec::new();
    }
    if text.len() <= config.max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        if text.len() - start <= config.max_chars {
            chunks.push(text[start..].to_string());
            return chunks;
        }

        let hard_end = floor_char_boundary(text, start + config.max_chars);
        // Never cut earlier than the overlap carried from this chunk, or the
        // next start would move backwards.
        let min_end = ceil_char_boundary(text, start + config.overlap_chars + 1);
        let end = find_break(text, min_end, hard_end).unwrap_or(hard_end);

        chunks.push(text[start..end].to_string());
        let next = floor_char_boundary(text, end - config.overlap_chars);
        // Boundary snapping on multibyte text could otherwise stall when the
        // overlap nearly equals the chunk size.
        start = if next > start {
            next
        } else {
            ceil_char_boundary(text, start + 1)
        };
    }
}

/// Largest char boundary at or below `index`.
fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut index = index;
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Smallest char boundary at or above `index`.
fn ceil_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut index = index;
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// Find the latest natural break in `text[min_end..hard_end]`, preferring
/// paragraph over sentence over word breaks. Returns the cut position
/// (just after the separator) or None when the window has no break at all.
fn find_break(text: &str, min_end: usize, hard_end: usize) -> Option<usize> {
    if min_end >= hard_end {
        return None;
    }
    let window = &text[min_end..hard_end];
    for separator in ["\n\n", "\n", ". ", " "] {
        if let Some(pos) = window.rfind(separator) {
            return Some(min_end + pos + separator.len());
        }
    }
    None
}
