//! # Token Extractor
//!
//! Finds karma tokens in a single chat line.
//!
//! A token is a span of text ending in a run of at least `MIN_RUN_LENGTH`
//! `+` or `-` characters. Three rules recognise one, tried in this order at
//! every start position while walking the line left to right:
//!
//! 1. **Parenthesized**: `(` up to the first `)`, immediately followed by a
//!    run. Whitespace inside the parentheses is allowed: `(bob smith)++`.
//! 2. **Line start**: only at offset 0, the first word up to the last run
//!    that starts inside it: `c++b--` is a single token.
//! 3. **Word**: the shortest whitespace-free span whose run is followed by
//!    whitespace or the end of the line: `great work bob++ !`.
//!
//! The earliest start position wins; the rules only break ties at the same
//! position. Once a span has been returned the scan resumes after it, so a
//! span is never matched twice.
//!
//! Nothing here can fail. Text that does not match is simply not a token.

use crate::primitives::MIN_RUN_LENGTH;
use std::iter::FusedIterator;

/// Scan a line for karma tokens.
///
/// Surrounding whitespace is ignored, so rule 2 applies to the first word
/// even when the line is indented.
///
/// ```
/// use karma_core::scanner::extract;
///
/// let tokens: Vec<&str> = extract("thanks (bob smith)++ and alice--").collect();
/// assert_eq!(tokens, vec!["(bob smith)++", "alice--"]);
/// ```
#[must_use]
pub fn extract(line: &str) -> Tokens<'_> {
    Tokens {
        line: line.trim(),
        pos: 0,
    }
}

/// Lazy iterator over the raw tokens of one line.
///
/// Yields borrowed slices of the input; each one ends in a qualifying run.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(c) = self.line[self.pos..].chars().next() {
            let start = self.pos;
            let end = match_parenthesized(self.line, start)
                .or_else(|| match_line_start(self.line, start))
                .or_else(|| match_word(self.line, start));

            if let Some(end) = end {
                self.pos = end;
                return Some(&self.line[start..end]);
            }
            self.pos += c.len_utf8();
        }
        None
    }
}

impl FusedIterator for Tokens<'_> {}

// =============================================================================
// RULES
// =============================================================================
//
// Each rule takes the line and a start offset (always a char boundary) and
// returns the end offset of the token it matched.

/// Rule 1: `(` ... first `)` followed by a run.
fn match_parenthesized(line: &str, start: usize) -> Option<usize> {
    if line.as_bytes().get(start) != Some(&b'(') {
        return None;
    }
    let close = start + 1 + line[start + 1..].find(')')?;
    let run = run_at(line, close + 1)?;
    Some(close + 1 + run)
}

/// Rule 2: the first word of the line, up to the last run starting inside it.
fn match_line_start(line: &str, start: usize) -> Option<usize> {
    if start != 0 {
        return None;
    }
    let word_end = word_end(line, 0);
    let bytes = line.as_bytes();

    // A run needs at least one character in front of it, hence `1..`.
    let run_start = (1..word_end.saturating_sub(1))
        .rev()
        .find(|&i| is_symbol(bytes[i]) && bytes[i + 1] == bytes[i])?;
    let run = run_length(bytes, run_start);
    Some(run_start + run)
}

/// Rule 3: shortest whitespace-free span ending in a run that is followed by
/// whitespace or the end of the line.
fn match_word(line: &str, start: usize) -> Option<usize> {
    let mut chars = line[start..].char_indices();
    let (_, first) = chars.next()?;
    if first.is_whitespace() {
        return None;
    }

    for (offset, c) in chars {
        if c.is_whitespace() {
            return None;
        }
        let run_start = start + offset;
        if let Some(run) = run_at(line, run_start) {
            let end = run_start + run;
            if line[end..].chars().next().is_none_or(char::is_whitespace) {
                return Some(end);
            }
        }
    }
    None
}

// =============================================================================
// HELPERS
// =============================================================================

fn is_symbol(b: u8) -> bool {
    b == b'+' || b == b'-'
}

/// Length of a qualifying run at `at`, if there is one.
fn run_at(line: &str, at: usize) -> Option<usize> {
    let bytes = line.as_bytes();
    if !bytes.get(at).copied().is_some_and(is_symbol) {
        return None;
    }
    let run = run_length(bytes, at);
    (run >= MIN_RUN_LENGTH).then_some(run)
}

/// Number of consecutive copies of `bytes[at]` starting at `at`.
fn run_length(bytes: &[u8], at: usize) -> usize {
    let symbol = bytes[at];
    bytes[at..].iter().take_while(|&&b| b == symbol).count()
}

/// Offset of the first whitespace at or after `start`, or the line length.
fn word_end(line: &str, start: usize) -> usize {
    line[start..]
        .char_indices()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, _)| start + i)
        .unwrap_or(line.len())
}

// =============================================================================
// TESTS
// =============================================================================
