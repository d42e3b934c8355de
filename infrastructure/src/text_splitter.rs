//! Recursive character splitter.
//!
//! Text is cut on the first separator from the priority list that occurs in
//! it; pieces still too long are cut again with the remaining separators.
//! Neighbouring pieces are then merged back up to `chunk_size` characters,
//! and each new chunk starts with up to `chunk_overlap` characters of the
//! previous one. Separators stay attached to the start of the following piece,
//! so every chunk is a (whitespace-trimmed) slice of the original text.

use shared::types::Result;
use std::collections::VecDeque;

pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " ", ""];

/// A chunk as a byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

#[derive(Debug, Clone)]
pub struct RecursiveTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveTextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        anyhow::ensure!(chunk_size > 0, "chunk size must be positive");
        anyhow::ensure!(
            chunk_overlap < chunk_size,
            "chunk overlap ({chunk_overlap}) must be smaller than chunk size ({chunk_size})"
        );
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn with_separators(mut self, separators: &[&str]) -> Self {
        self.separators = separators.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split_text<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.split_spans(text)
            .into_iter()
            .map(|span| span.slice(text))
            .collect()
    }

    pub fn split_spans(&self, text: &str) -> Vec<TextSpan> {
        let mut out = Vec::new();
        let separators: Vec<&str> = self.separators.iter().map(String::as_str).collect();
        self.split_recursive(
            text,
            TextSpan {
                start: 0,
                end: text.len(),
            },
            &separators,
            &mut out,
        );
        out
    }

    fn split_recursive(
        &self,
        text: &str,
        span: TextSpan,
        separators: &[&str],
        out: &mut Vec<TextSpan>,
    ) {
        let segment = span.slice(text);
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || segment.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let remaining = separators.get(position + 1..).unwrap_or(&[]);

        let mut pending: Vec<(TextSpan, usize)> = Vec::new();
        for piece in split_keep_separator(segment, separator, span.start) {
            let len = piece.slice(text).chars().count();
            if len < self.chunk_size {
                pending.push((piece, len));
                continue;
            }
            if !pending.is_empty() {
                self.merge(text, &pending, out);
                pending.clear();
            }
            if remaining.is_empty() {
                // Nothing left to cut on: keep the oversized piece whole.
                push_trimmed(text, piece, out);
            } else {
                self.split_recursive(text, piece, remaining, out);
            }
        }
        if !pending.is_empty() {
            self.merge(text, &pending, out);
        }
    }

    /// Pack contiguous pieces into chunks of at most `chunk_size` characters.
    fn merge(&self, text: &str, pieces: &[(TextSpan, usize)], out: &mut Vec<TextSpan>) {
        let mut window: VecDeque<(TextSpan, usize)> = VecDeque::new();
        let mut total = 0;

        for &(piece, len) in pieces {
            if total + len > self.chunk_size && !window.is_empty() {
                emit_window(text, &window, out);
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }
            window.push_back((piece, len));
            total += len;
        }
        if !window.is_empty() {
            emit_window(text, &window, out);
        }
    }
}

fn emit_window(text: &str, window: &VecDeque<(TextSpan, usize)>, out: &mut Vec<TextSpan>) {
    if let (Some(first), Some(last)) = (window.front(), window.back()) {
        push_trimmed(
            text,
            TextSpan {
                start: first.0.start,
                end: last.0.end,
            },
            out,
        );
    }
}

fn push_trimmed(text: &str, span: TextSpan, out: &mut Vec<TextSpan>) {
    let raw = span.slice(text);
    let leading = raw.len() - raw.trim_start().len();
    let trailing = raw.len() - raw.trim_end().len();
    if leading + trailing >= raw.len() {
        return;
    }
    out.push(TextSpan {
        start: span.start + leading,
        end: span.end - trailing,
    });
}

/// Split `segment` on `separator`, attaching each separator to the piece that
/// follows it. An empty separator splits into single characters.
fn split_keep_separator(segment: &str, separator: &str, base: usize) -> Vec<TextSpan> {
    if separator.is_empty() {
        return segment
            .char_indices()
            .map(|(idx, ch)| TextSpan {
                start: base + idx,
                end: base + idx + ch.len_utf8(),
            })
            .collect();
    }
    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in segment.match_indices(separator) {
        if idx > start {
            pieces.push(TextSpan {
                start: base + start,
                end: base + idx,
            });
        }
        start = idx;
    }
    if start < segment.len() {
        pieces.push(TextSpan {
            start: base + start,
            end: base + segment.len(),
        });
    }
    pieces
}
