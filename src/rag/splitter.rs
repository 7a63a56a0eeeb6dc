//! Newline character splitter.
//!
//! Pieces between newlines are greedily merged back together (joined by a
//! newline) until adding the next one would exceed `chunk_size` characters.
//! When a chunk is emitted, pieces are dropped from its front until at most
//! `chunk_overlap` characters remain; those carry over into the next chunk.

pub const MIN_CHUNK_SIZE: i64 = 50;
pub const MAX_CHUNK_SIZE: i64 = 5000;

const SEPARATOR: &str = "\n";

/// Chunking parameters after clamping into safe bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkParams {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl ChunkParams {
    /// `chunk_size` into `[50, 5000]`, then `chunk_overlap` into
    /// `[0, chunk_size / 2]`.
    pub fn clamped(chunk_size: i64, chunk_overlap: i64) -> Self {
        let chunk_size = chunk_size.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE);
        let chunk_overlap = chunk_overlap.clamp(0, chunk_size / 2);
        Self {
            chunk_size: chunk_size as usize,
            chunk_overlap: chunk_overlap as usize,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextSplitter {
    params: ChunkParams,
}

impl TextSplitter {
    pub fn new(params: ChunkParams) -> Self {
        Self { params }
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        let pieces: Vec<&str> = text
            .split(SEPARATOR)
            .filter(|piece| !piece.is_empty())
            .collect();
        self.merge_pieces(&pieces)
    }

    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let ChunkParams {
            chunk_size,
            chunk_overlap,
        } = self.params;
        let sep_len = SEPARATOR.chars().count();

        let mut chunks = Vec::new();
        let mut current: std::collections::VecDeque<(&str, usize)> =
            std::collections::VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = piece.chars().count();
            let joined_len = |current_len: usize| if current_len > 0 { sep_len } else { 0 };

            if total + len + joined_len(current.len()) > chunk_size {
                if total > chunk_size {
                    tracing::warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total,
                        chunk_size
                    );
                }
                if !current.is_empty() {
                    if let Some(chunk) = self.join(&current) {
                        chunks.push(chunk);
                    }
                    while total > chunk_overlap
                        || (total + len + joined_len(current.len()) > chunk_size && total > 0)
                    {
                        let Some((_, front_len)) = current.pop_front() else {
                            break;
                        };
                        let front_sep = if current.is_empty() { 0 } else { sep_len };
                        total -= front_len + front_sep;
                    }
                }
            }

            current.push_back((piece, len));
            total += len + if current.len() > 1 { sep_len } else { 0 };
        }

        if let Some(chunk) = self.join(&current) {
            chunks.push(chunk);
        }
        chunks
    }

    fn join(&self, pieces: &std::collections::VecDeque<(&str, usize)>) -> Option<String> {
        let joined = pieces
            .iter()
            .map(|(piece, _)| *piece)
            .collect::<Vec<_>>()
            .join(SEPARATOR);
        let trimmed = joined.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}
