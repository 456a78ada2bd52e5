use std::collections::HashMap;
use std::fs;
use std::path::Path;

use smallvec::SmallVec;
use thiserror::Error;

use crate::MAX_SLOT_LENGTH;

/// An identifier for a given word, based on its index in the WordList's `words` field.
pub type WordId = usize;

/// A struct representing a word that can be chosen for a given slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub string: String,
    pub glyphs: SmallVec<[char; MAX_SLOT_LENGTH]>,
}

impl Word {
    /// The number of glyphs in the word, which is what a slot's length is compared against.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum WordListError {
    #[error("failed to read word list {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// The vocabulary available to every slot. Words are normalized to uppercase and deduplicated, so
/// two distinct ids always refer to two distinct strings.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    pub words: Vec<Word>,
    ids_by_string: HashMap<String, WordId>,
}

impl WordList {
    pub fn new<I, S>(raw_words: I) -> WordList
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut word_list = WordList::default();

        for raw_word in raw_words {
            let string = raw_word.as_ref().trim().to_uppercase();
            if string.is_empty() || word_list.ids_by_string.contains_key(&string) {
                continue;
            }

            word_list.ids_by_string.insert(string.clone(), word_list.words.len());
            word_list.words.push(Word {
                glyphs: string.chars().collect(),
                string,
            });
        }

        word_list
    }

    /// Build a word list from newline-separated contents.
    pub fn parse(contents: &str) -> WordList {
        WordList::new(contents.lines())
    }

    /// Read a word list file with one word per line.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<WordList, WordListError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| WordListError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Ok(WordList::parse(&contents))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, word_id: WordId) -> Option<&Word> {
        self.words.get(word_id)
    }

    /// Look up the id of a word, normalizing case the same way loading does.
    pub fn id_of(&self, string: &str) -> Option<WordId> {
        self.ids_by_string.get(&string.trim().to_uppercase()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::WordList;

    #[test]
    fn test_words_are_normalized_and_deduplicated() {
        let word_list = WordList::parse("cat\n  Dog \n\nCAT\ndog\nbird\n");

        let strings: Vec<&str> = word_list.words.iter().map(|word| word.string.as_str()).collect();
        assert_eq!(strings, vec!["CAT", "DOG", "BIRD"]);
        assert_eq!(word_list.id_of("cat"), Some(0));
        assert_eq!(word_list.id_of("bird"), Some(2));
        assert_eq!(word_list.id_of("fish"), None);
    }

    #[test]
    fn test_glyphs_match_string() {
        let word_list = WordList::new(["seven"]);
        let word = word_list.get(0).unwrap();

        assert_eq!(word.len(), 5);
        assert_eq!(word.glyphs.as_slice(), &['S', 'E', 'V', 'E', 'N']);
    }

    #[test]
    fn test_load_reports_missing_file() {
        let result = WordList::load("/nonexistent/words.txt");

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("/nonexistent/words.txt"));
    }
}
