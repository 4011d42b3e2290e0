//! ## Pattern Matcher
//! The [PatternMatcher] is the per document match context. It owns the entity labels computed
//! for the document, the ids of the document level patterns that matched, and it is the single
//! place that dispatches a match request to the pattern kind able to answer it. Asking a
//! pattern for a capability it does not have is an internal error, not a failed match.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use log::{debug, info, warn};
use rustc_hash::FxHashMap;

use crate::entity_label::label_entities;
use crate::error::{PatternError, Result};
use crate::features::PatternFeatureSet;
use crate::pattern::{Capability, Pattern, PatternBank, PatternId, PatternKind};
use crate::pattern_set::PatternSet;
use crate::pretty_print::dump;
use crate::prop_status::PropStatusManager;
use crate::scoring::{ScoringFunction, UNSPECIFIED_SCORE};
use crate::theory::{
    Argument, DocTheory, EntityId, EventId, LanguageVariant, MentionId, NodeId, PropId, PropStatus,
    RelationId, ValueMentionId,
};

/// Document level pseudo pattern ids set from the activity range.
pub const IN_ACTIVITY_RANGE: &str = "IN_AD_RANGE";
pub const OUT_OF_ACTIVITY_RANGE: &str = "OUT_OF_AD_RANGE";
pub const ACTIVITY_RANGE_UNDEFINED: &str = "AD_UNDEFINED";

/// How [PatternMatcher::sentence_snippets] merges snippets of the same sentences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnippetCombination {
    #[default]
    DoNotCombine,
    /// Merge snippets covering (almost) the same tokens.
    ByCoverage,
    /// Merge snippets with the same return features.
    ByAnswerFeatures,
}

#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Bound on the candidate loop of a single regex match.
    pub regex_iteration_cap: usize,
    /// Bound on pattern and theory arguments of a single argument assignment.
    pub max_solver_arguments: usize,
    /// How far back a `RECENT-DATE` may lie from the document date.
    pub recent_days: i64,
    /// Statuses blocked when the pattern set does not declare `blocked_proposition_types`.
    pub default_blocked_proposition_statuses: BTreeSet<PropStatus>,
    pub force_entity_labels: bool,
    pub force_entity_types: bool,
    pub force_entity_subtypes: bool,
    pub snippet_combination: SnippetCombination,
    /// Multi match every top level pattern when collecting snippets.
    pub force_multi_matches: bool,
    pub language_variant: LanguageVariant,
    pub activity_range: Option<(NaiveDate, NaiveDate)>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            regex_iteration_cap: 1000,
            max_solver_arguments: 64,
            recent_days: 30,
            default_blocked_proposition_statuses: BTreeSet::new(),
            force_entity_labels: false,
            force_entity_types: false,
            force_entity_subtypes: false,
            snippet_combination: SnippetCombination::default(),
            force_multi_matches: false,
            language_variant: LanguageVariant::default(),
            activity_range: None,
        }
    }
}

pub struct PatternMatcher<'a> {
    doc: &'a DocTheory,
    set: &'a PatternSet,
    config: MatchConfig,
    entity_labels: FxHashMap<String, FxHashMap<EntityId, PatternFeatureSet>>,
    matched_doc_patterns: BTreeSet<String>,
}

/// Add up the matches of a sentence into one set scored by the best match.
pub fn merge_matches(matches: Vec<PatternFeatureSet>) -> Option<PatternFeatureSet> {
    if matches.is_empty() {
        return None;
    }
    let mut all = PatternFeatureSet::new();
    let scores: Vec<f32> = matches.iter().map(PatternFeatureSet::score).collect();
    for set in &matches {
        all.add_features(set);
    }
    all.set_score(ScoringFunction::Max.combine(&scores, UNSPECIFIED_SCORE));
    Some(all)
}

impl<'a> PatternMatcher<'a> {
    /// Create the match context for `doc`: label entities, then run the document level patterns.
    pub fn new(doc: &'a DocTheory, set: &'a PatternSet, config: MatchConfig) -> Result<Self> {
        let mut matcher = Self {
            doc,
            set,
            config,
            entity_labels: FxHashMap::default(),
            matched_doc_patterns: BTreeSet::new(),
        };
        for label_pattern in set.entity_label_patterns() {
            let labels = label_entities(&matcher, label_pattern)?;
            debug!("Entity label {} applies to {} entities", label_pattern.label, labels.len());
            matcher.entity_labels.insert(label_pattern.label.clone(), labels);
        }
        matcher.run_document_patterns()?;
        info!(
            "Matcher ready for {}: {} document level matches",
            doc.name,
            matcher.matched_doc_patterns.len()
        );
        Ok(matcher)
    }

    fn run_document_patterns(&mut self) -> Result<()> {
        for &id in self.set.doc_level() {
            let pattern = self.bank().get(id);
            let matched = if pattern.supports(Capability::Sentence) {
                let mut matched = false;
                for sentence in 0..self.doc.sentences.len() {
                    if self.match_sentence(id, sentence)?.is_some() {
                        matched = true;
                        break;
                    }
                }
                matched
            } else if pattern.supports(Capability::Document) {
                self.match_document(id)?.is_some()
            } else {
                return Err(PatternError::config(
                    "Document-level patterns must be sentence or document matching patterns",
                    dump(self.bank(), id),
                ));
            };
            match (&pattern.common.id, matched) {
                (Some(label), true) => {
                    self.matched_doc_patterns.insert(label.clone());
                }
                (None, true) => warn!("Document level pattern without id matched {}", self.doc.name),
                _ => {}
            }
        }

        let pseudo = match (self.config.activity_range, self.doc.date) {
            (None, _) => ACTIVITY_RANGE_UNDEFINED,
            (Some(_), None) => {
                warn!("Document {} has no date to compare with the activity range", self.doc.name);
                OUT_OF_ACTIVITY_RANGE
            }
            (Some((start, end)), Some(date)) if start <= date && date <= end => IN_ACTIVITY_RANGE,
            (Some(_), Some(_)) => OUT_OF_ACTIVITY_RANGE,
        };
        self.matched_doc_patterns.insert(pseudo.to_string());
        Ok(())
    }

    pub fn doc(&self) -> &'a DocTheory {
        self.doc
    }

    pub fn pattern_set(&self) -> &'a PatternSet {
        self.set
    }

    pub fn bank(&self) -> &'a PatternBank {
        self.set.bank()
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn language_variant(&self) -> &LanguageVariant {
        &self.config.language_variant
    }

    pub fn activity_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.config.activity_range
    }

    /// The statuses that block a proposition unless a pattern asks for them.
    pub fn blocked_statuses(&self) -> &BTreeSet<PropStatus> {
        self.set
            .blocked_statuses()
            .unwrap_or(&self.config.default_blocked_proposition_statuses)
    }

    pub fn entity_label_match(&self, label: &str, entity: EntityId) -> Option<&PatternFeatureSet> {
        self.entity_labels.get(label).and_then(|labels| labels.get(&entity))
    }

    /// Whether the document level pattern with `id` matched this document.
    pub fn matches_doc_pattern(&self, id: &str) -> bool {
        self.matched_doc_patterns.contains(id)
    }

    fn prepare(&self, id: PatternId, capability: Capability) -> Result<Option<&'a Pattern>> {
        let pattern = self.bank().get(id);
        if !pattern.supports(capability) {
            return Err(self.unsupported(pattern, capability));
        }
        if let Some(constraint) = &pattern.common.language_variant {
            if !self.config.language_variant.satisfies(constraint) {
                return Ok(None);
            }
        }
        Ok(Some(pattern))
    }

    fn unsupported(&self, pattern: &Pattern, capability: Capability) -> PatternError {
        PatternError::internal(format!(
            "{} is not a {}: {}",
            pattern.kind.type_name(),
            capability.name(),
            dump(self.bank(), pattern.index)
        ))
    }

    pub fn match_sentence(&self, id: PatternId, sentence: usize) -> Result<Option<PatternFeatureSet>> {
        let Some(pattern) = self.prepare(id, Capability::Sentence)? else {
            return Ok(None);
        };
        match &pattern.kind {
            PatternKind::Mention(p) => p.matches_sentence(self, pattern, sentence),
            PatternKind::Prop(p) => p.matches_sentence(self, pattern, sentence),
            PatternKind::Event(p) | PatternKind::Relation(p) => p.matches_sentence(self, pattern, sentence),
            PatternKind::ParseNode(p) => p.matches_sentence(self, pattern, sentence),
            PatternKind::Regex(p) => p.matches_sentence(self, pattern, sentence),
            PatternKind::ValueMention(p) => p.matches_sentence(self, pattern, sentence),
            PatternKind::Topic(p) => p.matches_sentence(self, pattern, sentence),
            PatternKind::Combination(p) => p.matches_sentence(self, pattern, sentence),
            PatternKind::Intersection(p) => p.matches_sentence(self, pattern, sentence),
            PatternKind::Union(p) => p.matches_sentence(self, pattern, sentence),
            PatternKind::Negation(p) => p.matches_sentence(self, pattern, sentence),
            PatternKind::Quotation(p) => p.matches_sentence(self, pattern, sentence),
            _ => Err(self.unsupported(pattern, Capability::Sentence)),
        }
    }

    /// Every separate match of a pattern in a sentence. `SINGLE_MATCH` patterns yield at most
    /// their sentence match.
    pub fn multi_match_sentence(&self, id: PatternId, sentence: usize) -> Result<Vec<PatternFeatureSet>> {
        let Some(pattern) = self.prepare(id, Capability::Sentence)? else {
            return Ok(Vec::new());
        };
        if pattern.common.single_match {
            return Ok(self.match_sentence(id, sentence)?.into_iter().collect());
        }
        match &pattern.kind {
            PatternKind::Mention(p) => p.multi_matches_sentence(self, pattern, sentence),
            PatternKind::Prop(p) => p.multi_matches_sentence(self, pattern, sentence),
            PatternKind::Event(p) | PatternKind::Relation(p) => {
                p.multi_matches_sentence(self, pattern, sentence)
            }
            PatternKind::ParseNode(p) => p.multi_matches_sentence(self, pattern, sentence),
            PatternKind::Regex(p) => p.multi_matches_sentence(self, pattern, sentence),
            PatternKind::ValueMention(p) => p.multi_matches_sentence(self, pattern, sentence),
            PatternKind::Topic(p) => p.multi_matches_sentence(self, pattern, sentence),
            PatternKind::Combination(p) => p.multi_matches_sentence(self, pattern, sentence),
            PatternKind::Intersection(p) => p.multi_matches_sentence(self, pattern, sentence),
            PatternKind::Union(p) => p.multi_matches_sentence(self, pattern, sentence),
            PatternKind::Negation(_) | PatternKind::Quotation(_) => {
                Ok(self.match_sentence(id, sentence)?.into_iter().collect())
            }
            _ => Err(self.unsupported(pattern, Capability::Sentence)),
        }
    }

    pub fn match_mention(
        &self,
        id: PatternId,
        sentence: usize,
        mention: MentionId,
        fall_through: bool,
    ) -> Result<Option<PatternFeatureSet>> {
        let Some(pattern) = self.prepare(id, Capability::Mention)? else {
            return Ok(None);
        };
        match &pattern.kind {
            PatternKind::Mention(p) => p.matches_mention(self, pattern, sentence, mention, fall_through),
            PatternKind::Event(p) => p.matches_mention(self, pattern, sentence, mention),
            PatternKind::Regex(p) => p.matches_mention(self, pattern, sentence, mention),
            PatternKind::Topic(p) => p.matches_mention(self, pattern, sentence, mention),
            PatternKind::Combination(p) => p.matches_mention(self, pattern, sentence, mention, fall_through),
            _ => Err(self.unsupported(pattern, Capability::Mention)),
        }
    }

    /// Match a regex against the head of a mention instead of its full extent.
    pub fn match_mention_head(&self, id: PatternId, sentence: usize, mention: MentionId) -> Result<Option<PatternFeatureSet>> {
        let Some(pattern) = self.prepare(id, Capability::Mention)? else {
            return Ok(None);
        };
        match &pattern.kind {
            PatternKind::Regex(p) => p.matches_mention_head(self, pattern, sentence, mention),
            _ => Err(self.unsupported(pattern, Capability::Mention)),
        }
    }

    pub fn match_prop(
        &self,
        id: PatternId,
        sentence: usize,
        prop: PropId,
        fall_through: bool,
        overrides: Option<&PropStatusManager>,
    ) -> Result<Option<PatternFeatureSet>> {
        let Some(pattern) = self.prepare(id, Capability::Prop)? else {
            return Ok(None);
        };
        match &pattern.kind {
            PatternKind::Prop(p) => p.matches_prop(self, pattern, sentence, prop, fall_through, overrides),
            PatternKind::Topic(p) => p.matches_prop(self, pattern, sentence, prop),
            PatternKind::Combination(p) => p.matches_prop(self, pattern, sentence, prop, fall_through, overrides),
            _ => Err(self.unsupported(pattern, Capability::Prop)),
        }
    }

    pub fn match_argument(
        &self,
        id: PatternId,
        sentence: usize,
        arg: &Argument,
        fall_through: bool,
    ) -> Result<Option<PatternFeatureSet>> {
        let Some(pattern) = self.prepare(id, Capability::Argument)? else {
            return Ok(None);
        };
        match &pattern.kind {
            PatternKind::Argument(p) => p.matches_argument(self, pattern, sentence, arg, fall_through),
            PatternKind::Combination(p) => p.matches_argument(self, pattern, sentence, arg, fall_through),
            _ => Err(self.unsupported(pattern, Capability::Argument)),
        }
    }

    pub fn match_argument_value(
        &self,
        id: PatternId,
        sentence: usize,
        arg: &Argument,
        fall_through: bool,
        overrides: Option<&PropStatusManager>,
    ) -> Result<Option<PatternFeatureSet>> {
        let Some(pattern) = self.prepare(id, Capability::ArgumentValue)? else {
            return Ok(None);
        };
        match &pattern.kind {
            PatternKind::Mention(p) => p.matches_argument_value(self, pattern, sentence, arg, fall_through),
            PatternKind::Prop(p) => {
                p.matches_argument_value(self, pattern, sentence, arg, fall_through, overrides)
            }
            PatternKind::Event(p) => p.matches_argument_value(self, pattern, sentence, arg),
            PatternKind::Regex(p) => p.matches_argument_value(self, pattern, sentence, arg),
            PatternKind::ValueMention(p) => p.matches_argument_value(self, pattern, sentence, arg),
            PatternKind::Topic(p) => p.matches_argument_value(self, pattern, sentence, arg),
            PatternKind::Combination(p) => {
                p.matches_argument_value(self, pattern, sentence, arg, fall_through, overrides)
            }
            _ => Err(self.unsupported(pattern, Capability::ArgumentValue)),
        }
    }

    pub fn match_mention_and_role(
        &self,
        id: PatternId,
        sentence: usize,
        role: &str,
        mention: MentionId,
        fall_through: bool,
    ) -> Result<Option<PatternFeatureSet>> {
        let Some(pattern) = self.prepare(id, Capability::MentionAndRole)? else {
            return Ok(None);
        };
        match &pattern.kind {
            PatternKind::Argument(p) => {
                p.matches_mention_and_role(self, pattern, sentence, role, mention, fall_through)
            }
            PatternKind::Combination(p) => {
                p.matches_mention_and_role(self, pattern, sentence, role, mention, fall_through)
            }
            _ => Err(self.unsupported(pattern, Capability::MentionAndRole)),
        }
    }

    pub fn match_value_mention_and_role(
        &self,
        id: PatternId,
        sentence: usize,
        role: &str,
        value_mention: ValueMentionId,
    ) -> Result<Option<PatternFeatureSet>> {
        let Some(pattern) = self.prepare(id, Capability::ValueMentionAndRole)? else {
            return Ok(None);
        };
        match &pattern.kind {
            PatternKind::Argument(p) => {
                p.matches_value_mention_and_role(self, pattern, sentence, role, value_mention)
            }
            PatternKind::Combination(p) => {
                p.matches_value_mention_and_role(self, pattern, sentence, role, value_mention)
            }
            _ => Err(self.unsupported(pattern, Capability::ValueMentionAndRole)),
        }
    }

    pub fn match_event(&self, id: PatternId, sentence: usize, event: EventId) -> Result<Option<PatternFeatureSet>> {
        let Some(pattern) = self.prepare(id, Capability::EventMention)? else {
            return Ok(None);
        };
        match &pattern.kind {
            PatternKind::Event(p) => p.matches_event(self, pattern, sentence, event),
            PatternKind::Combination(p) => p.matches_event(self, pattern, sentence, event),
            _ => Err(self.unsupported(pattern, Capability::EventMention)),
        }
    }

    pub fn match_relation(
        &self,
        id: PatternId,
        sentence: usize,
        relation: RelationId,
    ) -> Result<Option<PatternFeatureSet>> {
        let Some(pattern) = self.prepare(id, Capability::RelMention)? else {
            return Ok(None);
        };
        match &pattern.kind {
            PatternKind::Relation(p) => p.matches_relation(self, pattern, sentence, relation),
            PatternKind::Combination(p) => p.matches_relation(self, pattern, sentence, relation),
            _ => Err(self.unsupported(pattern, Capability::RelMention)),
        }
    }

    pub fn match_parse_node(&self, id: PatternId, sentence: usize, node: NodeId) -> Result<Option<PatternFeatureSet>> {
        let Some(pattern) = self.prepare(id, Capability::ParseNode)? else {
            return Ok(None);
        };
        match &pattern.kind {
            PatternKind::Mention(p) => p.matches_parse_node(self, pattern, sentence, node),
            PatternKind::ParseNode(p) => p.matches_parse_node(self, pattern, sentence, node),
            PatternKind::Regex(p) => p.matches_parse_node(self, pattern, sentence, node),
            PatternKind::ValueMention(p) => p.matches_parse_node(self, pattern, sentence, node),
            PatternKind::Combination(p) => p.matches_parse_node(self, pattern, sentence, node),
            _ => Err(self.unsupported(pattern, Capability::ParseNode)),
        }
    }

    pub fn match_value_mention(
        &self,
        id: PatternId,
        sentence: usize,
        value_mention: ValueMentionId,
    ) -> Result<Option<PatternFeatureSet>> {
        let Some(pattern) = self.prepare(id, Capability::ValueMention)? else {
            return Ok(None);
        };
        match &pattern.kind {
            PatternKind::Regex(p) => p.matches_value_mention(self, pattern, sentence, value_mention),
            PatternKind::ValueMention(p) => p.matches_value_mention(self, pattern, sentence, value_mention),
            _ => Err(self.unsupported(pattern, Capability::ValueMention)),
        }
    }

    pub fn match_document(&self, id: PatternId) -> Result<Option<PatternFeatureSet>> {
        let Some(pattern) = self.prepare(id, Capability::Document)? else {
            return Ok(None);
        };
        match &pattern.kind {
            PatternKind::Doc(p) => p.matches_document(self, pattern),
            _ => Err(self.unsupported(pattern, Capability::Document)),
        }
    }

    /// The matches of one top level pattern in a sentence, duplicates removed. Extraction,
    /// regex and combination patterns contribute every separate match.
    pub fn pattern_snippets(&self, id: PatternId, sentence: usize) -> Result<Vec<PatternFeatureSet>> {
        let pattern = self.bank().get(id);
        let multi = self.config.force_multi_matches
            || matches!(
                pattern.kind,
                PatternKind::Event(_) | PatternKind::Relation(_) | PatternKind::Regex(_) | PatternKind::Combination(_)
            );
        let matches = if multi {
            self.multi_match_sentence(id, sentence)?
        } else {
            self.match_sentence(id, sentence)?.into_iter().collect()
        };
        let mut unique: Vec<PatternFeatureSet> = Vec::with_capacity(matches.len());
        for set in matches {
            if !unique.iter().any(|u| u.same_features(&set)) {
                unique.push(set);
            }
        }
        Ok(unique)
    }

    /// The snippets of all sentence matching top level patterns in a sentence.
    pub fn sentence_snippets(&self, sentence: usize) -> Result<Vec<PatternFeatureSet>> {
        let mut all = Vec::new();
        for &id in self.set.top_level() {
            if !self.bank().supports(id, Capability::Sentence) {
                continue;
            }
            let snippets = self.pattern_snippets(id, sentence)?;
            if !snippets.is_empty() {
                debug!(
                    "Pattern {} found {} matches in sentence {sentence}",
                    self.bank().first_valid_id(id).unwrap_or("<no id>"),
                    snippets.len()
                );
            }
            all.extend(snippets);
        }
        for set in &mut all {
            set.set_coverage(self.doc);
        }
        Ok(self.combine_snippets(all))
    }

    /// The matches of the document matching top level patterns.
    pub fn document_snippets(&self) -> Result<Vec<PatternFeatureSet>> {
        let mut all = Vec::new();
        for &id in self.set.top_level() {
            if self.bank().supports(id, Capability::Document) {
                all.extend(self.match_document(id)?);
            }
        }
        for set in &mut all {
            set.set_coverage(self.doc);
        }
        Ok(self.combine_snippets(all))
    }

    fn combine_snippets(&self, sets: Vec<PatternFeatureSet>) -> Vec<PatternFeatureSet> {
        if self.config.snippet_combination == SnippetCombination::DoNotCombine {
            return sets;
        }
        let keep_all = self.set.keep_all_features();
        let mut slots: Vec<Option<PatternFeatureSet>> = sets.into_iter().map(Some).collect();
        for first in 0..slots.len() {
            for second in first + 1..slots.len() {
                let (Some(a), Some(b)) = (&slots[first], &slots[second]) else {
                    if slots[first].is_none() {
                        break;
                    }
                    continue;
                };
                if !self.should_combine(a, b) {
                    continue;
                }
                if a.score() >= b.score() {
                    let merged = slots[second].take();
                    if let (Some(a), Some(b)) = (slots[first].as_mut(), merged) {
                        if keep_all {
                            a.add_features(&b);
                        }
                    }
                } else {
                    let merged = slots[first].take();
                    if let (Some(b), Some(a)) = (slots[second].as_mut(), merged) {
                        if keep_all {
                            b.add_features(&a);
                        }
                    }
                    break;
                }
            }
        }
        slots.into_iter().flatten().collect()
    }

    fn should_combine(&self, a: &PatternFeatureSet, b: &PatternFeatureSet) -> bool {
        let (Some(ca), Some(cb)) = (a.coverage(), b.coverage()) else {
            return false;
        };
        if ca.start_sentence != cb.start_sentence || ca.end_sentence != cb.end_sentence {
            return false;
        }
        match self.config.snippet_combination {
            SnippetCombination::DoNotCombine => false,
            SnippetCombination::ByCoverage => {
                if ca.start_token == cb.start_token && ca.end_token == cb.end_token {
                    return true;
                }
                if ca.start_sentence != ca.end_sentence {
                    return false;
                }
                let len_a = (ca.end_token - ca.start_token) as f32;
                let len_b = (cb.end_token - cb.start_token) as f32;
                if ca.start_token <= cb.start_token && ca.end_token >= cb.end_token {
                    len_a - len_b < 0.2 * len_a
                } else if ca.start_token >= cb.start_token && ca.end_token <= cb.end_token {
                    len_b - len_a < 0.2 * len_b
                } else {
                    false
                }
            }
            SnippetCombination::ByAnswerFeatures => {
                let answers_a: Vec<_> = a.returns().collect();
                let answers_b: Vec<_> = b.returns().collect();
                answers_a.len() == answers_b.len() && answers_a.iter().all(|f| answers_b.contains(f))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;

    use crate::matcher::{
        ACTIVITY_RANGE_UNDEFINED, IN_ACTIVITY_RANGE, MatchConfig, PatternMatcher, SnippetCombination,
        merge_matches,
    };
    use crate::pattern_set::{LoadOptions, PatternSet};
    use crate::features::PatternFeatureSet;
    use crate::theory::{DocTheory, Entity, Mention, MentionType, MentionUid, SentenceTheory};

    fn document() -> DocTheory {
        let mut doc = DocTheory::new("doc");
        let mut sentence =
            SentenceTheory::from_treebank(0, "(S (NP (DT the) (NN president)) (VP (VBD resigned)))").unwrap();
        let np = sentence.parse.find("NP", 0, 1).unwrap();
        let president = sentence.add_mention(Mention::new(np, MentionType::Desc, "PER"));
        doc.add_sentence(sentence);
        doc.add_entity(Entity {
            entity_type: "PER".to_string(),
            subtype: None,
            generic: false,
            mentions: vec![MentionUid {
                sentence: 0,
                mention: president,
            }],
        });
        doc.date = NaiveDate::from_ymd_opt(2010, 5, 1);
        doc
    }

    #[test]
    fn end_to_end_mention_test() {
        let set = PatternSet::from_str(
            "(people (toplevel (mention (acetype PER) (headword \"president\"))))",
            &LoadOptions::default(),
        )
        .unwrap();
        let doc = document();
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        let snippets = matcher.sentence_snippets(0).unwrap();
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].score(), -1.0);
        assert_eq!(snippets[0].coverage().unwrap().text, "the president");

        let mut other = DocTheory::new("other");
        let mut sentence = SentenceTheory::from_treebank(0, "(S (NP (NNP Paris)) (VP (VBD slept)))").unwrap();
        let np = sentence.parse.find("NP", 0, 0).unwrap();
        sentence.add_mention(Mention::new(np, MentionType::Name, "GPE"));
        other.add_sentence(sentence);
        let matcher = PatternMatcher::new(&other, &set, MatchConfig::default()).unwrap();
        assert!(matcher.sentence_snippets(0).unwrap().is_empty());
    }

    #[test]
    fn document_patterns_test() {
        let set = PatternSet::from_str(
            "(people (entitylabels (LEADER (mention (headword president)))) \
                     (doclevel (mention (id HAS_LEADER) (entitylabel LEADER))) \
                     (toplevel (mention (id leader) (entitylabel LEADER))))",
            &LoadOptions::default(),
        )
        .unwrap();
        let doc = document();
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        assert!(matcher.matches_doc_pattern("HAS_LEADER"));
        assert!(matcher.matches_doc_pattern(ACTIVITY_RANGE_UNDEFINED));
        assert!(matcher.entity_label_match("LEADER", crate::theory::EntityId(0)).is_some());
        let snippets = matcher.sentence_snippets(0).unwrap();
        assert_eq!(snippets[0].top_level_label(), Some("leader"));

        let config = MatchConfig {
            activity_range: Some((
                NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2010, 12, 31).unwrap(),
            )),
            ..MatchConfig::default()
        };
        let matcher = PatternMatcher::new(&doc, &set, config).unwrap();
        assert!(matcher.matches_doc_pattern(IN_ACTIVITY_RANGE));
    }

    #[test]
    fn snippet_combination_test() {
        let set = PatternSet::from_str(
            "(people (toplevel (mention (acetype PER) (score 0.4)) (mention (headword president) (score 0.9))))",
            &LoadOptions::default(),
        )
        .unwrap();
        let doc = document();
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        assert_eq!(matcher.sentence_snippets(0).unwrap().len(), 2);
        let config = MatchConfig {
            snippet_combination: SnippetCombination::ByCoverage,
            ..MatchConfig::default()
        };
        let matcher = PatternMatcher::new(&doc, &set, config).unwrap();
        let snippets = matcher.sentence_snippets(0).unwrap();
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].score(), 0.9);
    }

    #[test]
    fn basic_merge_matches_test() {
        assert!(merge_matches(Vec::new()).is_none());
        let mut a = PatternFeatureSet::new();
        a.set_score(0.3);
        let mut b = PatternFeatureSet::new();
        b.set_score(0.6);
        assert_eq!(merge_matches(vec![a, b]).unwrap().score(), 0.6);
    }

    #[test]
    fn unsupported_capability_test() {
        let set = PatternSet::from_str("(people (toplevel (mention (acetype PER))))", &LoadOptions::default()).unwrap();
        let doc = document();
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        let id = set.top_level()[0];
        assert!(matcher.match_event(id, 0, crate::theory::EventId(0)).is_err());
    }
}
