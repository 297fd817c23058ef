//! Recursive character text splitter
//!
//! Splits documents into chunks bounded by a maximum character length, with a
//! configured overlap carried across chunk boundaries so no meaning is lost
//! at a cut point. Splitting prefers the coarsest separator that keeps pieces
//! within the bound: paragraph breaks, then line breaks, then spaces, then
//! individual characters as a last resort.

use bloom_core::{DocumentChunk, Error, RawDocument, Result};

const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveCharacterSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Validation(
                "chunk size must be greater than 0".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::Validation(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Split raw text into chunks of at most `chunk_size` characters.
    /// Consecutive chunks share at least `chunk_overlap` characters whenever
    /// the source text splits finely enough to carry the tail over.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }

        let units = self.split_units(text, 0);
        self.merge_units(units)
    }

    /// Split loaded documents, tagging each chunk with its source metadata
    /// and position.
    pub fn split_documents(&self, documents: &[RawDocument]) -> Vec<DocumentChunk> {
        let mut chunks = Vec::new();

        for document in documents {
            for (index, text) in self.split_text(&document.page_content).into_iter().enumerate() {
                let mut metadata = document.metadata.clone();
                if let Some(object) = metadata.as_object_mut() {
                    object.insert("chunk".to_string(), serde_json::Value::from(index));
                }
                chunks.push(DocumentChunk {
                    page_content: text,
                    metadata,
                });
            }
        }

        chunks
    }

    // Break text into units no longer than chunk_size, keeping separators
    // attached so concatenated units reproduce the source text.
    fn split_units(&self, text: &str, separator_index: usize) -> Vec<String> {
        if separator_index >= SEPARATORS.len() {
            // Last resort: single characters.
            return text.chars().map(|c| c.to_string()).collect();
        }

        let separator = SEPARATORS[separator_index];
        let pieces: Vec<&str> = text.split(separator).collect();
        let piece_count = pieces.len();

        let mut units = Vec::new();
        for (index, piece) in pieces.into_iter().enumerate() {
            let mut unit = piece.to_string();
            if index + 1 < piece_count {
                unit.push_str(separator);
            }
            if unit.is_empty() {
                continue;
            }

            if char_len(&unit) <= self.chunk_size {
                units.push(unit);
            } else {
                units.extend(self.split_units(&unit, separator_index + 1));
            }
        }

        units
    }

    fn merge_units(&self, units: Vec<String>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_len = 0usize;

        for unit in units {
            let unit_len = char_len(&unit);

            if !current.is_empty() && current_len + unit_len > self.chunk_size {
                chunks.push(current.concat());

                let (carry, carry_len) = self.overlap_tail(&current);
                if carry_len + unit_len > self.chunk_size {
                    // Carrying the overlap would overflow the next chunk;
                    // start it fresh instead.
                    current = Vec::new();
                    current_len = 0;
                } else {
                    current = carry;
                    current_len = carry_len;
                }
            }

            current_len += unit_len;
            current.push(unit);
        }

        if !current.is_empty() {
            chunks.push(current.concat());
        }

        chunks
    }

    // Trailing units of the emitted chunk totalling at least chunk_overlap
    // characters, to seed the next chunk.
    fn overlap_tail(&self, units: &[String]) -> (Vec<String>, usize) {
        if self.chunk_overlap == 0 {
            return (Vec::new(), 0);
        }

        let mut carry = Vec::new();
        let mut carry_len = 0usize;

        for unit in units.iter().rev() {
            if carry_len >= self.chunk_overlap {
                break;
            }
            carry_len += char_len(unit);
            carry.push(unit.clone());
        }

        carry.reverse();
        (carry, carry_len)
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_overlap_not_smaller_than_chunk_size() {
        assert!(RecursiveCharacterSplitter::new(100, 100).is_err());
        assert!(RecursiveCharacterSplitter::new(0, 0).is_err());
        assert!(RecursiveCharacterSplitter::new(100, 20).is_ok());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let splitter = RecursiveCharacterSplitter::new(100, 20).unwrap();
        let chunks = splitter.split_text("title: Intro to Go");
        assert_eq!(chunks, vec!["title: Intro to Go".to_string()]);
    }

    #[test]
    fn empty_text_produces_no_chunks() {
        let splitter = RecursiveCharacterSplitter::new(100, 20).unwrap();
        assert!(splitter.split_text("").is_empty());
    }

    #[test]
    fn no_chunk_exceeds_the_configured_size() {
        let splitter = RecursiveCharacterSplitter::new(50, 10).unwrap();
        let text = "lorem ipsum dolor sit amet ".repeat(40);

        for chunk in splitter.split_text(&text) {
            assert!(
                chunk.chars().count() <= 50,
                "chunk of {} chars exceeds bound: {:?}",
                chunk.chars().count(),
                chunk
            );
        }
    }

    #[test]
    fn consecutive_chunks_share_the_configured_overlap() {
        let splitter = RecursiveCharacterSplitter::new(50, 10).unwrap();
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu nu xi omicron pi rho sigma tau";

        let chunks = splitter.split_text(text);
        assert!(chunks.len() > 1);

        for pair in chunks.windows(2) {
            let shared = longest_shared_boundary(&pair[0], &pair[1]);
            assert!(
                shared >= 10,
                "chunks {:?} and {:?} share only {} chars",
                pair[0],
                pair[1],
                shared
            );
        }
    }

    // Length in chars of the longest suffix of `previous` that `next`
    // starts with.
    fn longest_shared_boundary(previous: &str, next: &str) -> usize {
        let chars: Vec<char> = previous.chars().collect();
        for take in (1..=chars.len()).rev() {
            let suffix: String = chars[chars.len() - take..].iter().collect();
            if next.starts_with(&suffix) {
                return take;
            }
        }
        0
    }

    #[test]
    fn chunks_reproduce_source_text_modulo_overlap() {
        let splitter = RecursiveCharacterSplitter::new(30, 0).unwrap();
        let text = "one two three four five six seven eight nine ten eleven twelve";

        let chunks = splitter.split_text(text);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn paragraph_breaks_are_preferred_cut_points() {
        let splitter = RecursiveCharacterSplitter::new(40, 0).unwrap();
        let text = "first paragraph here\n\nsecond paragraph here";

        let chunks = splitter.split_text(text);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].starts_with("first paragraph"));
        assert!(chunks[1].starts_with("second paragraph"));
    }

    #[test]
    fn split_documents_tags_chunks_with_source_and_index() {
        let splitter = RecursiveCharacterSplitter::new(30, 5).unwrap();
        let documents = vec![RawDocument {
            page_content: "alpha beta gamma delta epsilon zeta eta theta".to_string(),
            metadata: serde_json::json!({"source": "docs/catalogue.csv", "row": 1}),
        }];

        let chunks = splitter.split_documents(&documents);
        assert!(chunks.len() > 1);
        for (index, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.metadata["source"], "docs/catalogue.csv");
            assert_eq!(chunk.metadata["chunk"], index);
        }
    }
}
