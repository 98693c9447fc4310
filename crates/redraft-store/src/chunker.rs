//! Word-based document chunking with overlap for embedding generation.
//!
//! Splits extracted plain text into overlapping, size-bounded segments.
//! The chunker accumulates whitespace-delimited words into a buffer; when
//! appending the next word would push the buffer past the target size, the
//! buffer is emitted and a new one is seeded with the trailing overlap
//! words plus the word that triggered the split. The overlap is word-based
//! and approximate, not byte-exact.
//!
//! Chunking is a pure function of its inputs: the same text and parameters
//! always produce the same chunks.

use redraft_core::defaults;

/// Configuration for the chunker.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Target characters per chunk. A chunk is emitted once the next word
    /// would push it past this size; a single word longer than the target
    /// is never split.
    pub target_size: usize,
    /// Overlap parameter; `overlap_size / 10` trailing words of each chunk
    /// seed the next one.
    pub overlap_size: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            target_size: defaults::CHUNK_SIZE,
            overlap_size: defaults::CHUNK_OVERLAP,
        }
    }
}

impl ChunkerConfig {
    /// Chunk `text` with this configuration.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        chunk(text, self.target_size, self.overlap_size)
    }
}

/// Split `text` into overlapping chunks of roughly `target_size` characters.
///
/// Whitespace runs are normalized to single spaces inside each chunk.
/// Empty and whitespace-only input yields no chunks; the final partial
/// buffer is always emitted.
pub fn chunk(text: &str, target_size: usize, overlap_size: usize) -> Vec<String> {
    let overlap_words = overlap_size / 10;
    let mut chunks = Vec::new();
    let mut buf: Vec<&str> = Vec::new();
    let mut buf_len = 0usize;

    for word in text.split_whitespace() {
        let projected = if buf.is_empty() {
            word.len()
        } else {
            buf_len + 1 + word.len()
        };

        if !buf.is_empty() && projected > target_size {
            chunks.push(buf.join(" "));

            // Seed the next buffer with the trailing overlap words, then
            // the word that triggered the split.
            let tail_start = buf.len().saturating_sub(overlap_words);
            let mut seed: Vec<&str> = buf[tail_start..].to_vec();
            seed.push(word);
            buf_len = seed.iter().map(|w| w.len()).sum::<usize>() + (seed.len() - 1);
            buf = seed;
        } else {
            buf_len = projected;
            buf.push(word);
        }
    }

    if !buf.is_empty() {
        chunks.push(buf.join(" "));
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(chunk("", 100, 10).is_empty());
        assert!(chunk("   \n\t  ", 100, 10).is_empty());
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = chunk("hello world", 100, 10);
        assert_eq!(chunks, vec!["hello world"]);
    }

    #[test]
    fn overlap_seeds_next_chunk_with_trailing_word() {
        // target 3 chars, overlap 10 → 1 trailing word carried over
        let chunks = chunk("a b c d e f", 3, 10);
        assert_eq!(chunks, vec!["a b", "b c", "c d", "d e", "e f"]);

        // Every chunk after the first starts with the prior chunk's last word
        for pair in chunks.windows(2) {
            let prev_last = pair[0].split_whitespace().last().unwrap();
            let next_first = pair[1].split_whitespace().next().unwrap();
            assert_eq!(prev_last, next_first);
        }
    }

    #[test]
    fn no_chunk_is_empty() {
        let text = "one two three four five six seven eight nine ten";
        for target in [3, 5, 10, 20, 100] {
            for overlap in [0, 10, 20] {
                for c in chunk(text, target, overlap) {
                    assert!(!c.trim().is_empty());
                }
            }
        }
    }

    #[test]
    fn oversized_word_is_never_split() {
        let chunks = chunk("short supercalifragilistic short", 5, 10);
        assert!(chunks.iter().any(|c| c.contains("supercalifragilistic")));
        for c in &chunks {
            // The long word survives intact inside some chunk
            assert!(!c.contains("supercalifragilisti c"));
        }
    }

    #[test]
    fn chunk_length_is_bounded_without_overlap() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let target = 20;
        let chunks = chunk(text, target, 0);
        let longest_word = text.split_whitespace().map(str::len).max().unwrap();
        for c in &chunks {
            assert!(
                c.len() <= target + 1 + longest_word,
                "chunk {:?} exceeds bound",
                c
            );
        }
    }

    #[test]
    fn zero_overlap_produces_disjoint_chunks() {
        let chunks = chunk("a b c d e f", 3, 0);
        assert_eq!(chunks, vec!["a b", "c d", "e f"]);
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = "the quick brown fox jumps over the lazy dog again and again";
        let a = chunk(text, 15, 20);
        let b = chunk(text, 15, 20);
        assert_eq!(a, b);
    }

    #[test]
    fn config_defaults_come_from_core() {
        let config = ChunkerConfig::default();
        assert_eq!(config.target_size, defaults::CHUNK_SIZE);
        assert_eq!(config.overlap_size, defaults::CHUNK_OVERLAP);

        let chunks = config.chunk("hello world");
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn whitespace_runs_are_normalized() {
        let chunks = chunk("hello\n\n  world\t!", 100, 10);
        assert_eq!(chunks, vec!["hello world !"]);
    }
}
