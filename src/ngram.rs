use std::collections::HashSet;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NgramError {
    #[error("n-gram size must be 1 or more, got {0}")]
    InvalidSize(usize),
}

/// Returns the distinct substrings of exactly `size` characters, in order of
/// first occurrence.
pub fn create_ngrams(s: &str, size: usize) -> Result<Vec<String>, NgramError> {
    if size < 1 {
        return Err(NgramError::InvalidSize(size));
    }
    let chars: Vec<char> = s.chars().collect();
    Ok(windows(&chars, size))
}

/// Window generation over pre-split characters. `size` must be non-zero.
pub(crate) fn windows(chars: &[char], size: usize) -> Vec<String> {
    debug_assert!(size >= 1);
    if size > chars.len() {
        return Vec::new();
    }
    if size == chars.len() {
        return vec![chars.iter().collect()];
    }
    let mut seen = HashSet::with_capacity(chars.len() - size + 1);
    let mut grams = Vec::with_capacity(chars.len() - size + 1);
    for window in chars.windows(size) {
        let gram: String = window.iter().collect();
        if seen.insert(gram.clone()) {
            grams.push(gram);
        }
    }
    grams
}
