// Cosmetic name supply for fresh variables and default-named components.
// The core only ever asks for the next string; where the words come from
// (a word file, the built-in list) is the host's business.

use std::fmt;

pub trait NameSource: fmt::Debug {
    fn fresh_name(&mut self) -> String;
}

// Small fixed fallback list, used when no word file is supplied.
const BUILTIN_NAMES: &[&str] = &[
    "oak", "elm", "ash", "fir", "ivy", "fern", "moss", "reed", "sage", "rue", "birch", "cedar",
    "hazel", "laurel", "rowan", "willow",
];

/// Name source drawing from an owned word list, cycling with a numeric
/// suffix once the list is exhausted.
#[derive(Debug, Clone)]
pub struct WordList {
    words: Vec<String>,
    next: usize,
}

impl WordList {
    pub fn builtin() -> Self {
        WordList {
            words: BUILTIN_NAMES.iter().map(|w| w.to_string()).collect(),
            next: 0,
        }
    }

    /// Build from arbitrary lines (e.g. a word file read by the host),
    /// falling back to the built-in list when nothing usable remains.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = lines
            .into_iter()
            .map(|l| l.as_ref().trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        if words.is_empty() {
            Self::builtin()
        } else {
            WordList { words, next: 0 }
        }
    }
}

impl NameSource for WordList {
    fn fresh_name(&mut self) -> String {
        let pass = self.next / self.words.len();
        let word = &self.words[self.next % self.words.len()];
        self.next += 1;
        if pass == 0 {
            word.clone()
        } else {
            format!("{}{}", word, pass + 1)
        }
    }
}
