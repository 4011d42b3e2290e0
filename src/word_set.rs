//! ## Word Sets
//! This module contains named [WordSet]s declared in the `wordsets` section of a pattern set
//! and the [WordList] constraint type used by `headword`, `predicate` and friends. A word list
//! entry ending in `*` is a prefix wildcard, an entry naming a declared word set expands to the
//! words of that set.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::error::{PatternError, Result};
use crate::sexp::{Sexp, unquote};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSet {
    pub label: String,
    pub words: Vec<String>,
}

pub type WordSetMap = FxHashMap<String, WordSet>;

impl WordSet {
    /// Read `(LABEL word word (multi word) OTHER_LABEL ...)`. Labels of previously declared sets
    /// expand in place.
    pub fn from_sexp(sexp: &Sexp, word_sets: &WordSetMap) -> Result<Self> {
        let children = sexp.children()?;
        let label = children
            .first()
            .and_then(Sexp::value)
            .ok_or_else(|| PatternError::sexp("word set must start with a label", sexp))?;
        let mut words = Vec::new();
        for child in &children[1..] {
            let word = word_of(child)?;
            match word_sets.get(&word) {
                Some(set) => words.extend(set.words.iter().cloned()),
                None => words.push(word),
            }
        }
        Ok(Self {
            label: label.to_string(),
            words,
        })
    }
}

/// Read a word from an atom or a list of atoms forming a multi word expression.
fn word_of(sexp: &Sexp) -> Result<String> {
    match sexp {
        Sexp::Atom(value) => Ok(unquote(value).to_string()),
        Sexp::List(children) => {
            let parts: Result<Vec<&str>> = children
                .iter()
                .map(|c| {
                    c.value()
                        .map(unquote)
                        .ok_or_else(|| PatternError::sexp("expected an atom in multi word", sexp))
                })
                .collect();
            Ok(parts?.join(" "))
        }
        Sexp::Void => Err(PatternError::sexp("expected a word", sexp)),
    }
}

/// A set of words and word prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordList {
    pub words: BTreeSet<String>,
    pub prefixes: BTreeSet<String>,
}

impl WordList {
    /// Read the children of `sexp` after the constraint name.
    pub fn from_sexp(sexp: &Sexp, word_sets: &WordSetMap) -> Result<Self> {
        let mut list = WordList::default();
        list.extend_from_sexp(sexp, word_sets)?;
        Ok(list)
    }

    pub fn extend_from_sexp(&mut self, sexp: &Sexp, word_sets: &WordSetMap) -> Result<()> {
        for child in sexp.children()?.iter().skip(1) {
            let word = word_of(child)?;
            match word_sets.get(&word) {
                Some(set) => set.words.iter().for_each(|w| self.insert(w)),
                None => self.insert(&word),
            }
        }
        Ok(())
    }

    pub fn insert(&mut self, word: &str) {
        match word.strip_suffix('*') {
            Some(prefix) if !prefix.is_empty() => {
                self.prefixes.insert(prefix.to_string());
            }
            _ => {
                self.words.insert(word.to_string());
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.prefixes.is_empty()
    }

    /// Whether `word` is in the list, either exactly or by one of the prefixes. An empty list
    /// answers `if_empty`, a missing word never matches a non-empty list.
    pub fn matches(&self, word: Option<&str>, if_empty: bool) -> bool {
        if self.is_empty() {
            return if_empty;
        }
        match word {
            None => false,
            Some(word) => {
                self.words.contains(word) || self.prefixes.iter().any(|p| word.starts_with(p.as_str()))
            }
        }
    }

    /// Words in the order they are printed, prefixes carry their `*` again.
    pub fn entries(&self) -> Vec<String> {
        self.words
            .iter()
            .cloned()
            .chain(self.prefixes.iter().map(|p| format!("{p}*")))
            .collect()
    }
}

/// Read the atoms after the constraint name into a set.
pub fn symbols_from_sexp(sexp: &Sexp) -> Result<BTreeSet<String>> {
    Ok(symbol_list_from_sexp(sexp)?.into_iter().collect())
}

/// Read the atoms after the constraint name in declared order.
pub fn symbol_list_from_sexp(sexp: &Sexp) -> Result<Vec<String>> {
    sexp.children()?
        .iter()
        .skip(1)
        .map(|child| {
            child
                .value()
                .map(|v| unquote(v).to_string())
                .ok_or_else(|| PatternError::sexp("Expected a list of symbols", sexp))
        })
        .collect()
}

/// Quote a word for printing if it would not read back as a single atom.
pub fn quote_word(word: &str) -> String {
    if word.is_empty() || word.chars().any(|c| c.is_whitespace() || c == '(' || c == ')' || c == '#') {
        format!("\"{word}\"")
    } else {
        word.to_string()
    }
}

#[cfg(test)]
mod test {
    use crate::sexp::{ReaderOptions, parse};
    use crate::word_set::{WordList, WordSet, WordSetMap, symbol_list_from_sexp, symbols_from_sexp};

    #[test]
    fn basic_word_list_test() {
        let mut sets = WordSetMap::default();
        let set = WordSet::from_sexp(
            &parse("(LEADERS president chairman (prime minister))", ReaderOptions::default()).unwrap(),
            &sets,
        )
        .unwrap();
        assert_eq!(set.words, vec!["president", "chairman", "prime minister"]);
        sets.insert(set.label.clone(), set);

        let list = WordList::from_sexp(
            &parse("(headword LEADERS \"king\" minist*)", ReaderOptions::default()).unwrap(),
            &sets,
        )
        .unwrap();
        assert!(list.matches(Some("president"), false));
        assert!(list.matches(Some("king"), false));
        assert!(list.matches(Some("ministry"), false));
        assert!(!list.matches(Some("queen"), false));
        assert!(!list.matches(None, true));
        assert!(WordList::default().matches(None, true));
        assert!(!WordList::default().matches(Some("x"), false));
        assert!(list.entries().contains(&"minist*".to_string()));
    }

    #[test]
    fn symbol_order_test() {
        let sexp = parse("(mentiontype name desc \"pron\")", ReaderOptions::default()).unwrap();
        assert_eq!(symbol_list_from_sexp(&sexp).unwrap(), vec!["name", "desc", "pron"]);
        let set = symbols_from_sexp(&sexp).unwrap();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec!["desc", "name", "pron"]);
        assert!(symbol_list_from_sexp(&parse("(acetype (PER))", ReaderOptions::default()).unwrap()).is_err());
    }
}
