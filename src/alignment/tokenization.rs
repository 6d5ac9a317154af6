use crate::alignment::vocabulary::{CaseFolding, Vocabulary};
use crate::error::AlignmentError;
use crate::types::TokenSequence;

/// Maps a cleaned transcript to vocabulary indices: each word's characters in
/// order, with the separator index between consecutive words.
///
/// The transcript is folded to the vocabulary's case first, so an
/// uppercase-only label set accepts lowercase text and vice versa.
pub fn build_token_sequence(
    transcript: &str,
    vocab: &Vocabulary,
) -> Result<TokenSequence, AlignmentError> {
    let separator = vocab.separator();
    let folding = vocab.case_folding();

    let mut tokens = Vec::new();
    let mut words = Vec::new();
    for word in transcript
        .split(|c: char| c.is_whitespace() || c == separator)
        .filter(|w| !w.is_empty())
    {
        if !words.is_empty() {
            tokens.push(vocab.separator_id());
        }
        let mut folded_word = String::with_capacity(word.len());
        for c in word.chars() {
            let before = folded_word.len();
            match folding {
                CaseFolding::Upper => folded_word.extend(c.to_uppercase()),
                CaseFolding::Lower => folded_word.extend(c.to_lowercase()),
            }
            // Report the character as the caller wrote it, not its folded form.
            for folded in folded_word[before..].chars() {
                let id = vocab
                    .index_of(folded)
                    .ok_or_else(|| AlignmentError::UnknownSymbol {
                        symbol: c,
                        word: word.to_string(),
                    })?;
                tokens.push(id);
            }
        }
        words.push(folded_word);
    }

    debug_assert_eq!(
        tokens.len(),
        words.iter().map(|w| w.chars().count()).sum::<usize>() + words.len().saturating_sub(1),
        "tokenization layout contract violated"
    );

    Ok(TokenSequence { tokens, words })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::normalization::normalize_basic;

    fn vocab_upper() -> Vocabulary {
        Vocabulary::from_labels(
            &["<s>", "<pad>", "</s>", "<unk>", "A", "C", "S", "T", "|"],
            0,
            '|',
        )
        .expect("valid vocabulary")
    }

    fn vocab_lower() -> Vocabulary {
        Vocabulary::from_labels(&["<pad>", "a", "b", "c", "|"], 0, '|').expect("valid vocabulary")
    }

    #[test]
    fn separator_only_between_words() {
        let seq = build_token_sequence("CAT SAT", &vocab_upper()).unwrap();
        assert_eq!(seq.tokens, vec![5, 4, 7, 8, 6, 4, 7]);
        assert_eq!(seq.words, ["CAT", "SAT"]);
    }

    #[test]
    fn single_word_has_no_separator() {
        let seq = build_token_sequence("cab", &vocab_lower()).unwrap();
        assert_eq!(seq.tokens, vec![3, 1, 2]);
    }

    #[test]
    fn empty_transcript_produces_empty_sequence() {
        let seq = build_token_sequence("   ", &vocab_lower()).unwrap();
        assert!(seq.is_empty());
        assert!(seq.words.is_empty());
    }

    #[test]
    fn uppercase_only_vocab_uppercases_transcript() {
        let seq = build_token_sequence("cat", &vocab_upper()).unwrap();
        assert_eq!(seq.words, ["CAT"]);
        assert_eq!(seq.tokens, vec![5, 4, 7]);
    }

    #[test]
    fn lowercase_vocab_lowercases_transcript() {
        let seq = build_token_sequence("A B", &vocab_lower()).unwrap();
        assert_eq!(seq.words, ["a", "b"]);
        assert_eq!(seq.tokens, vec![1, 4, 2]);
    }

    #[test]
    fn separator_in_text_acts_as_word_break() {
        let seq = build_token_sequence("a|b  |c", &vocab_lower()).unwrap();
        assert_eq!(seq.words, ["a", "b", "c"]);
        let sep_count = seq.tokens.iter().filter(|&&t| t == 4).count();
        assert_eq!(sep_count, 2);
    }

    #[test]
    fn zero_width_joiner_word_stays_one_word() {
        let vocab = Vocabulary::from_labels(
            &["<pad>", "ന", "\u{D4D}", "\u{200D}", "ക", "|"],
            0,
            '|',
        )
        .expect("valid vocabulary");
        let cleaned = normalize_basic("ന\u{D4D}\u{200D}ക്ക");
        let seq = build_token_sequence(&cleaned, &vocab).unwrap();
        assert_eq!(seq.words.len(), 1);
        assert_eq!(seq.tokens, vec![1, 2, 3, 4, 2, 4]);
    }

    #[test]
    fn unknown_symbol_is_reported_with_word() {
        let err = build_token_sequence("CAT βSAT", &vocab_upper()).unwrap_err();
        match err {
            AlignmentError::UnknownSymbol { symbol, word } => {
                assert_eq!(symbol, 'β');
                assert_eq!(word, "βSAT");
            }
            other => panic!("expected UnknownSymbol, got {other:?}"),
        }
    }

    #[test]
    fn unknown_symbol_keeps_original_case_for_lower_vocab() {
        let err = build_token_sequence("aβ", &vocab_lower()).unwrap_err();
        assert!(matches!(err, AlignmentError::UnknownSymbol { symbol: 'β', .. }));
    }
}
