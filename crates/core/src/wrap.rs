//! Deterministic greedy word wrapping for the text-wall display.
//!
//! Wrapping is a pure function of (text, width): the scroll engine relies
//! on that to rebuild identical documents after a settings change.

/// Wraps `text` into lines of at most `width` characters, breaking on
/// whitespace. Runs of whitespace collapse to a single space; words longer
/// than the width are hard-split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        for piece in split_long_word(word, width) {
            let piece_len = piece.chars().count();
            if current_len == 0 {
                current.push_str(piece);
                current_len = piece_len;
            } else if current_len + 1 + piece_len <= width {
                current.push(' ');
                current.push_str(piece);
                current_len += 1 + piece_len;
            } else {
                lines.push(std::mem::take(&mut current));
                current.push_str(piece);
                current_len = piece_len;
            }
        }
    }
    if current_len > 0 {
        lines.push(current);
    }
    lines
}

/// Average words per wrapped line, floored at 1.0 so rate math never
/// divides by zero.
pub fn words_per_line_estimate(text: &str, width: usize) -> f64 {
    let words = text.split_whitespace().count();
    let lines = wrap_text(text, width).len();
    if lines == 0 {
        return 1.0;
    }
    (words as f64 / lines as f64).max(1.0)
}

/// Splits a single word into width-sized chunks on char boundaries.
fn split_long_word(word: &str, width: usize) -> Vec<&str> {
    if word.chars().count() <= width {
        return vec![word];
    }
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (offset, _) in word.char_indices() {
        if count == width {
            chunks.push(&word[start..offset]);
            start = offset;
            count = 0;
        }
        count += 1;
    }
    chunks.push(&word[start..]);
    chunks
}
