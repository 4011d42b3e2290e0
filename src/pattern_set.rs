//! ## Pattern Sets
//! A [PatternSet] is everything read from one pattern file: `(NAME SECTION ...)` where every
//! section is one of `wordsets`, `entitylabels`, `reference`, `toplevel`, `doclevel`, `backoff`
//! and `options`. Sections may repeat and appear in any order, they are processed kind by kind
//! in that order. Reference patterns may only use the shortcuts of reference patterns read
//! before them. A set is immutable once constructed.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::entity_label::EntityLabelPattern;
use crate::error::{PatternError, Result};
use crate::features::PatternReturn;
use crate::pattern::{ParseContext, PatternBank, PatternId, PatternKind, PatternRegistry};
use crate::resolve::{Requirement, Resolver, ShortcutMap};
use crate::sexp::{ReaderOptions, Sexp, SexpReader, parse_all};
use crate::theory::PropStatus;
use crate::word_set::{WordSet, WordSetMap};

/// How a pattern file is read.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Searched for `@INCLUDE` targets after the including file's directory.
    pub include_dirs: Vec<PathBuf>,
    pub include_once: bool,
    /// Symbols `@SET` before reading.
    pub set_symbols: Vec<String>,
    pub use_hash_comments: bool,
    pub use_quotes: bool,
    pub registry: PatternRegistry,
}

impl Default for LoadOptions {
    fn default() -> Self {
        let reader = ReaderOptions::default();
        Self {
            include_dirs: Vec::new(),
            include_once: false,
            set_symbols: Vec::new(),
            use_hash_comments: reader.use_hash_comments,
            use_quotes: reader.use_quotes,
            registry: PatternRegistry::new(),
        }
    }
}

impl LoadOptions {
    fn reader(&self) -> SexpReader {
        let mut reader = SexpReader::new();
        reader.options = ReaderOptions {
            use_quotes: self.use_quotes,
            use_hash_comments: self.use_hash_comments,
        };
        reader.include_dirs = self.include_dirs.clone();
        reader.include_once = self.include_once;
        reader.defined = self.set_symbols.clone();
        reader
    }
}

#[derive(Debug, Clone)]
pub struct PatternSet {
    name: String,
    bank: PatternBank,
    word_sets: WordSetMap,
    entity_labels: BTreeSet<String>,
    entity_label_patterns: Vec<EntityLabelPattern>,
    shortcuts: ShortcutMap,
    top_level: Vec<PatternId>,
    doc_level: Vec<PatternId>,
    backoff: Vec<String>,
    blocked_statuses: Option<BTreeSet<PropStatus>>,
    keep_all_features: bool,
}

/// The sections of a pattern set file, in processing order.
#[derive(Default)]
struct Sections<'a> {
    wordsets: Vec<&'a Sexp>,
    entitylabels: Vec<&'a Sexp>,
    reference: Vec<&'a Sexp>,
    toplevel: Vec<&'a Sexp>,
    doclevel: Vec<&'a Sexp>,
    backoff: Vec<&'a Sexp>,
    options: Vec<&'a Sexp>,
}

fn entries(section: &Sexp) -> Result<&[Sexp]> {
    Ok(&section.children()?[1..])
}

impl PatternSet {
    /// Read a pattern set from `text`. Includes are resolved against the working directory and
    /// the include directories of `options`.
    pub fn from_str(text: &str, options: &LoadOptions) -> Result<Self> {
        let mut reader = options.reader();
        let sexps = parse_all(text, reader.options)?;
        let sexps = reader.expand(sexps, Path::new("."))?;
        Self::from_sexps(&sexps, &options.registry)
    }

    pub fn from_file(path: &Path, options: &LoadOptions) -> Result<Self> {
        let mut reader = options.reader();
        let sexps = reader.read_file(path)?;
        Self::from_sexps(&sexps, &options.registry)
    }

    /// Build a set from the expanded expressions of a pattern file.
    pub fn from_sexps(sexps: &[Sexp], registry: &PatternRegistry) -> Result<Self> {
        let mut sexp = match sexps {
            [single] => single,
            _ => {
                return Err(PatternError::sexp(
                    "a pattern file must contain exactly one pattern set",
                    Sexp::List(sexps.to_vec()),
                ));
            }
        };
        // A wrapper list may be left over from macros around the set.
        if let Ok([inner]) = sexp.children() {
            if inner.is_list() {
                sexp = inner;
            }
        }
        let children = sexp.children()?;
        let name = children
            .first()
            .and_then(Sexp::value)
            .ok_or_else(|| PatternError::sexp("PatternSet Sexp should begin with a pattern set name", sexp))?;
        info!("Reading pattern set {name}");

        let mut sections = Sections::default();
        for child in &children[1..] {
            let target = match child.head() {
                Some("wordsets") => &mut sections.wordsets,
                Some("entitylabels") => &mut sections.entitylabels,
                Some("reference") => &mut sections.reference,
                Some("toplevel") => &mut sections.toplevel,
                Some("doclevel") => &mut sections.doclevel,
                Some("backoff") => &mut sections.backoff,
                Some("options") => &mut sections.options,
                _ => return Err(PatternError::sexp("Unexpected child of pattern set", child)),
            };
            target.push(child);
        }

        let mut set = PatternSet {
            name: name.to_string(),
            bank: PatternBank::new(),
            word_sets: WordSetMap::default(),
            entity_labels: BTreeSet::new(),
            entity_label_patterns: Vec::new(),
            shortcuts: ShortcutMap::default(),
            top_level: Vec::new(),
            doc_level: Vec::new(),
            backoff: Vec::new(),
            blocked_statuses: None,
            keep_all_features: false,
        };
        for section in &sections.wordsets {
            set.read_word_sets(section)?;
        }
        for section in &sections.entitylabels {
            set.read_entity_labels(section, registry)?;
        }
        for section in &sections.reference {
            set.read_references(section, registry)?;
        }
        for section in &sections.toplevel {
            let patterns = set.read_patterns(section, registry, Requirement::Any)?;
            set.top_level.extend(patterns);
        }
        for section in &sections.doclevel {
            let patterns = set.read_patterns(section, registry, Requirement::DOCUMENT_LEVEL)?;
            set.doc_level.extend(patterns);
        }
        for section in &sections.backoff {
            for level in entries(section)? {
                let level = level
                    .value()
                    .ok_or_else(|| PatternError::sexp("backoff levels must be atoms", section))?;
                set.backoff.push(level.to_string());
            }
        }
        for section in &sections.options {
            set.read_options(section)?;
        }
        info!(
            "Pattern set {}: {} patterns, {} top level, {} document level, {} shortcuts",
            set.name,
            set.bank.len(),
            set.top_level.len(),
            set.doc_level.len(),
            set.shortcuts.len()
        );
        Ok(set)
    }

    fn read_word_sets(&mut self, section: &Sexp) -> Result<()> {
        for entry in entries(section)? {
            let word_set = WordSet::from_sexp(entry, &self.word_sets)?;
            if self.word_sets.contains_key(&word_set.label) {
                return Err(PatternError::config(
                    format!("Duplicate wordset label: {}", word_set.label),
                    entry.to_string(),
                ));
            }
            debug!("Word set {} with {} words", word_set.label, word_set.words.len());
            self.word_sets.insert(word_set.label.clone(), word_set);
        }
        Ok(())
    }

    fn read_entity_labels(&mut self, section: &Sexp, registry: &PatternRegistry) -> Result<()> {
        for entry in entries(section)? {
            let [label, pattern] = entry.children()? else {
                return Err(PatternError::sexp("entity labels must be (LABEL pattern)", entry));
            };
            let label = label
                .value()
                .ok_or_else(|| PatternError::sexp("entity label must be an atom", entry))?
                .to_string();
            let mut ctx = ParseContext::new(&mut self.bank, &self.entity_labels, &self.word_sets, registry);
            let id = ctx.parse(pattern)?;
            // No shortcuts exist yet, this settles combination capabilities.
            let id = Resolver::new(&mut self.bank, &self.shortcuts)
                .resolve(id, Requirement::MENTION)
                .map_err(|e| e.in_context(format!("In entity label {label}")))?;
            self.entity_label_patterns.push(EntityLabelPattern {
                label: label.clone(),
                pattern: id,
            });
            self.entity_labels.insert(label);
        }
        Ok(())
    }

    fn read_references(&mut self, section: &Sexp, registry: &PatternRegistry) -> Result<()> {
        for entry in entries(section)? {
            let mut ctx = ParseContext::new(&mut self.bank, &self.entity_labels, &self.word_sets, registry);
            let id = ctx.parse_reference(entry)?;
            let Some(shortcut) = self.bank.get(id).common.shortcut.clone() else {
                return Err(PatternError::parse(
                    "PatternSet",
                    "Reference patterns must have shortcut names",
                    entry,
                ));
            };
            if self.shortcuts.contains_key(&shortcut) {
                return Err(PatternError::parse("PatternSet", "Duplicate shortcut name", entry));
            }
            // Registered only afterwards: a reference pattern cannot refer to itself.
            let id = Resolver::new(&mut self.bank, &self.shortcuts)
                .resolve(id, Requirement::Any)
                .map_err(|e| e.in_context(format!("In reference pattern: {entry}")))?;
            debug!("Shortcut {shortcut} is pattern {}", id.0);
            self.shortcuts.insert(shortcut, id);
        }
        Ok(())
    }

    fn read_patterns(
        &mut self,
        section: &Sexp,
        registry: &PatternRegistry,
        requirement: Requirement,
    ) -> Result<Vec<PatternId>> {
        let mut patterns = Vec::new();
        for entry in entries(section)? {
            let mut ctx = ParseContext::new(&mut self.bank, &self.entity_labels, &self.word_sets, registry);
            let id = ctx.parse(entry)?;
            let id = Resolver::new(&mut self.bank, &self.shortcuts)
                .resolve(id, requirement)
                .map_err(|e| e.in_context(format!("In pattern: {entry}")))?;
            patterns.push(id);
        }
        Ok(patterns)
    }

    fn read_options(&mut self, section: &Sexp) -> Result<()> {
        for option in entries(section)? {
            match option {
                Sexp::Atom(atom) if atom == "KEEP_ALL_FEATURES" => self.keep_all_features = true,
                Sexp::List(_) if option.head() == Some("blocked_proposition_types") => {
                    let blocked = self.blocked_statuses.get_or_insert_with(BTreeSet::new);
                    for status in entries(option)? {
                        let name = status
                            .value()
                            .ok_or_else(|| PatternError::sexp("proposition status must be an atom", option))?;
                        if name.eq_ignore_ascii_case("null") || name.eq_ignore_ascii_case("none") {
                            continue;
                        }
                        let status = PropStatus::from_name(name).ok_or_else(|| {
                            PatternError::sexp(format!("unknown proposition status {name}"), option)
                        })?;
                        blocked.insert(status);
                    }
                }
                _ => return Err(PatternError::sexp("Unrecognized option in option list", option)),
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bank(&self) -> &PatternBank {
        &self.bank
    }

    pub fn top_level(&self) -> &[PatternId] {
        &self.top_level
    }

    pub fn doc_level(&self) -> &[PatternId] {
        &self.doc_level
    }

    pub fn entity_label_patterns(&self) -> &[EntityLabelPattern] {
        &self.entity_label_patterns
    }

    /// The labels usable in `entitylabel` and `block` constraints.
    pub fn entity_labels(&self) -> &BTreeSet<String> {
        &self.entity_labels
    }

    pub fn word_sets(&self) -> &WordSetMap {
        &self.word_sets
    }

    /// The reference pattern registered under `shortcut`.
    pub fn reference(&self, shortcut: &str) -> Option<PatternId> {
        self.shortcuts.get(shortcut).copied()
    }

    pub fn shortcuts(&self) -> &ShortcutMap {
        &self.shortcuts
    }

    pub fn backoff(&self) -> &[String] {
        &self.backoff
    }

    pub fn backoff_level(&self, n: usize) -> Option<&str> {
        self.backoff.get(n).map(String::as_str)
    }

    /// The statuses declared by `blocked_proposition_types`. `None` if the set declares none, an
    /// empty set if it declares `none`.
    pub fn blocked_statuses(&self) -> Option<&BTreeSet<PropStatus>> {
        self.blocked_statuses.as_ref()
    }

    pub fn keep_all_features(&self) -> bool {
        self.keep_all_features
    }

    /// The return combinations of every top level pattern with an id, keyed by that id.
    pub fn pattern_returns(&self) -> Vec<(String, Vec<Vec<PatternReturn>>)> {
        self.top_level
            .iter()
            .filter_map(|&id| {
                let label = self.bank.first_valid_id(id)?;
                Some((label.to_string(), self.bank.returns(id)))
            })
            .collect()
    }

    /// Whether every top level pattern is a regex over text fragments only, so matching needs
    /// nothing but tokens.
    pub fn text_only(&self) -> bool {
        self.top_level.iter().all(|&id| match &self.bank.get(id).kind {
            PatternKind::Regex(regex) => regex
                .subpatterns
                .iter()
                .all(|&sub| matches!(self.bank.get(sub).kind, PatternKind::Text(_))),
            _ => false,
        })
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use crate::pattern::PatternKind;
    use crate::pattern_set::{LoadOptions, PatternSet};
    use crate::theory::PropStatus;

    fn load(text: &str) -> PatternSet {
        PatternSet::from_str(text, &LoadOptions::default()).unwrap()
    }

    #[test]
    fn basic_pattern_set_test() {
        let set = load(
            "(leaders \
               (options KEEP_ALL_FEATURES (blocked_proposition_types NEGATIVE modal)) \
               (toplevel (vprop (predicate LEAD) (id lead) (return LEAD)) PERSON) \
               (reference (mention (shortcut PERSON) (acetype PER) (entitylabel BOSS))) \
               (wordsets (LEAD lead head) (RULE LEAD govern)) \
               (entitylabels (BOSS (mention (headword LEAD)))) \
               (doclevel (mention (id has_person))) \
               (backoff strict loose))",
        );
        assert_eq!(set.name(), "leaders");
        assert!(set.keep_all_features());
        assert_eq!(
            set.blocked_statuses(),
            Some(&BTreeSet::from([PropStatus::Negative, PropStatus::Modal]))
        );
        assert_eq!(set.word_sets()["RULE"].words, vec!["lead", "head", "govern"]);
        assert_eq!(set.entity_label_patterns()[0].label, "BOSS");
        assert_eq!(set.top_level().len(), 2);
        assert_eq!(Some(set.top_level()[1]), set.reference("PERSON"));
        assert_eq!(set.doc_level().len(), 1);
        assert_eq!(set.backoff_level(1), Some("loose"));
        assert_eq!(set.backoff_level(2), None);
        let returns = set.pattern_returns();
        assert_eq!(returns.len(), 1);
        assert_eq!(returns[0].0, "lead");
        assert!(!set.text_only());
    }

    #[test]
    fn blocked_none_test() {
        let set = load("(s (options (blocked_proposition_types none)))");
        assert_eq!(set.blocked_statuses(), Some(&BTreeSet::new()));
        assert_eq!(load("(s (toplevel (mention)))").blocked_statuses(), None);
    }

    #[test]
    fn macro_test() {
        let text = "(s (@IF FULL (toplevel (mention (id full)))) (@UNLESS FULL (toplevel (vprop (id quick)))))";
        let quick = load(text);
        assert!(matches!(quick.bank().get(quick.top_level()[0]).kind, PatternKind::Prop(_)));
        let options = LoadOptions {
            set_symbols: vec!["FULL".to_string()],
            ..LoadOptions::default()
        };
        let full = PatternSet::from_str(text, &options).unwrap();
        assert!(matches!(full.bank().get(full.top_level()[0]).kind, PatternKind::Mention(_)));
    }

    #[test]
    fn pattern_set_errors_test() {
        let bad = [
            "(s (wordsets (A x)) (wordsets (A y)))",
            "(s (reference (mention (shortcut P))) (reference (vprop (shortcut P))))",
            // Forward reference.
            "(s (reference (mention (shortcut A) (prop-def B)) (vprop (shortcut B))))",
            "(s (reference (mention)))",
            "(s (toplevel (mention (shortcut P))))",
            "(s (frobnicate))",
            "(s (options FROBNICATE))",
            "(s (options (blocked_proposition_types SOMETIMES)))",
            "(s (doclevel (argument (role <sub>) (mention))))",
            "(s (toplevel (mention (entitylabel UNDECLARED))))",
            "(s) (t)",
        ];
        for text in bad {
            assert!(PatternSet::from_str(text, &LoadOptions::default()).is_err(), "{text}");
        }
    }
}
