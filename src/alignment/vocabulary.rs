use std::collections::HashMap;
use std::path::Path;

use crate::error::AlignmentError;

/// How transcript characters are folded before vocabulary lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseFolding {
    Upper,
    Lower,
}

/// Immutable label table shared by every alignment call for one language.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    symbols: Vec<String>,
    char_index: HashMap<char, usize>,
    blank_id: usize,
    separator: char,
    separator_id: usize,
    case_folding: CaseFolding,
}

impl Vocabulary {
    /// Builds from labels ordered by index. Multi-character labels (`<pad>`,
    /// `<unk>`, ...) stay addressable by index but never match transcript text.
    pub fn from_labels<S: AsRef<str>>(
        labels: &[S],
        blank_id: usize,
        separator: char,
    ) -> Result<Self, AlignmentError> {
        let symbols: Vec<String> = labels.iter().map(|s| s.as_ref().to_string()).collect();
        if blank_id >= symbols.len() {
            return Err(AlignmentError::invalid_input(format!(
                "blank id {blank_id} is outside a vocabulary of {} labels",
                symbols.len()
            )));
        }

        let mut char_index = HashMap::new();
        for (idx, symbol) in symbols.iter().enumerate() {
            let mut it = symbol.chars();
            let (Some(c), None) = (it.next(), it.next()) else {
                continue;
            };
            if char_index.insert(c, idx).is_some() {
                return Err(AlignmentError::invalid_input(format!(
                    "vocabulary label '{c}' appears more than once"
                )));
            }
        }

        let separator_id = char_index.get(&separator).copied().ok_or_else(|| {
            AlignmentError::invalid_input(format!(
                "word separator '{separator}' is missing from the vocabulary"
            ))
        })?;
        let case_folding = detect_case_folding(char_index.keys().copied());

        Ok(Self {
            symbols,
            char_index,
            blank_id,
            separator,
            separator_id,
            case_folding,
        })
    }

    /// Builds from a `{"symbol": index}` map such as a HuggingFace `vocab.json`.
    pub fn from_index_map(
        map: HashMap<String, usize>,
        blank_id: usize,
        separator: char,
    ) -> Result<Self, AlignmentError> {
        let size = map.values().copied().max().map(|max| max + 1).unwrap_or(0);
        let mut labels: Vec<Option<String>> = vec![None; size];
        for (symbol, idx) in map {
            if let Some(existing) = labels[idx].replace(symbol) {
                return Err(AlignmentError::invalid_input(format!(
                    "vocabulary index {idx} is assigned to more than one symbol ('{existing}')"
                )));
            }
        }
        let labels = labels
            .into_iter()
            .enumerate()
            .map(|(idx, label)| {
                label.ok_or_else(|| {
                    AlignmentError::invalid_input(format!("vocabulary index {idx} has no symbol"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_labels(&labels, blank_id, separator)
    }

    /// Loads a `.json` index map, or any other file as one label per line.
    pub fn load(path: &Path, blank_id: usize, separator: char) -> Result<Self, AlignmentError> {
        let data =
            std::fs::read_to_string(path).map_err(|e| AlignmentError::io("read vocabulary", e))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let vocab = if is_json {
            let map: HashMap<String, usize> = serde_json::from_str(&data)
                .map_err(|e| AlignmentError::json("parse vocabulary", e))?;
            Self::from_index_map(map, blank_id, separator)?
        } else {
            let labels: Vec<&str> = data
                .lines()
                .map(|line| line.trim_end_matches('\r'))
                .filter(|line| !line.is_empty())
                .collect();
            Self::from_labels(&labels, blank_id, separator)?
        };

        tracing::info!(
            path = %path.display(),
            size = vocab.len(),
            blank_id,
            separator = %separator,
            "vocabulary loaded"
        );
        Ok(vocab)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn index_of(&self, c: char) -> Option<usize> {
        self.char_index.get(&c).copied()
    }

    pub fn symbol(&self, idx: usize) -> Option<&str> {
        self.symbols.get(idx).map(String::as_str)
    }

    pub fn blank_id(&self) -> usize {
        self.blank_id
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn separator_id(&self) -> usize {
        self.separator_id
    }

    pub fn case_folding(&self) -> CaseFolding {
        self.case_folding
    }
}

fn detect_case_folding(chars: impl Iterator<Item = char>) -> CaseFolding {
    let mut has_upper = false;
    let mut has_lower = false;
    for c in chars.filter(|c| c.is_alphabetic()) {
        has_upper |= c.is_uppercase();
        has_lower |= c.is_lowercase();
    }
    if has_upper && !has_lower {
        CaseFolding::Upper
    } else {
        CaseFolding::Lower
    }
}
