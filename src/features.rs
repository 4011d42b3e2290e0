//! ## Features
//! This module contains the evidence a successful match produces: [PatternFeature]s collected
//! in a [PatternFeatureSet] together with an aggregate score, and the [PatternReturn] values a
//! pattern declares for extraction.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{PatternError, Result};
use crate::pattern::PatternId;
use crate::scoring::UNSPECIFIED_SCORE;
use crate::sexp::Sexp;
use crate::theory::{
    DocTheory, EventId, LanguageVariant, MentionId, NodeId, PropId, RelationId, ValueMentionId,
};

/// What a pattern contributes to extracted output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PatternReturn {
    Label(String),
    Map(BTreeMap<String, String>),
}

impl PatternReturn {
    /// Read `(return LABEL)` or `(return (key value) ...)`.
    pub fn from_sexp(sexp: &Sexp) -> Result<Self> {
        let children = sexp.children()?;
        if children.len() < 2 {
            return Err(PatternError::sexp("return needs a label or key/value pairs", sexp));
        }
        if children.len() == 2 {
            if let Some(label) = children[1].value() {
                return Ok(PatternReturn::Label(label.to_string()));
            }
        }
        let mut map = BTreeMap::new();
        for pair in &children[1..] {
            match pair.children() {
                Ok([key, value]) => match (key.value(), value.value()) {
                    (Some(key), Some(value)) => {
                        map.insert(key.to_string(), value.to_string());
                    }
                    _ => return Err(PatternError::sexp("return pairs must be atoms", pair)),
                },
                _ => return Err(PatternError::sexp("expected a (key value) pair", pair)),
            }
        }
        Ok(PatternReturn::Map(map))
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            PatternReturn::Label(label) => Some(label),
            PatternReturn::Map(_) => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        match self {
            PatternReturn::Label(_) => None,
            PatternReturn::Map(map) => map.get(key).map(String::as_str),
        }
    }
}

impl fmt::Display for PatternReturn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PatternReturn::Label(label) => write!(f, "{label}"),
            PatternReturn::Map(map) => {
                for (idx, (key, value)) in map.iter().enumerate() {
                    if idx > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "({key} {value})")?;
                }
                Ok(())
            }
        }
    }
}

/// The theory object a feature is about.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureKind {
    /// Placeholder evidence of a pattern that matched without a single theory object.
    Generic,
    /// Tags a match with the `id` of the pattern that produced it.
    TopLevel { id: String },
    Mention {
        sentence: usize,
        mention: MentionId,
        /// The constraint value the mention matched on, e.g. an entity type or label.
        matched: Option<String>,
    },
    Proposition { sentence: usize, prop: PropId },
    EventMention { sentence: usize, event: EventId },
    RelMention { sentence: usize, relation: RelationId },
    ValueMention { sentence: usize, value_mention: ValueMentionId },
    TokenSpan { sentence: usize, start: usize, end: usize },
    ParseNode { sentence: usize, node: NodeId },
    Topic { sentence: usize, start: usize, end: usize },
    Quote {
        sentence: usize,
        start: usize,
        end: usize,
        speaker: Option<MentionId>,
    },
    Document,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternFeature {
    pub pattern: Option<PatternId>,
    pub language_variant: LanguageVariant,
    pub confidence: f32,
    pub kind: FeatureKind,
    /// Set for return features: the declared return of `pattern` bound to the theory object.
    pub ret: Option<PatternReturn>,
}

impl PatternFeature {
    pub fn new(pattern: Option<PatternId>, kind: FeatureKind, language_variant: &LanguageVariant) -> Self {
        Self {
            pattern,
            language_variant: language_variant.clone(),
            confidence: 1.0,
            kind,
            ret: None,
        }
    }

    pub fn with_return(mut self, ret: PatternReturn) -> Self {
        self.ret = Some(ret);
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn is_return(&self) -> bool {
        self.ret.is_some()
    }

    /// Sentence and token span covered by this feature, if it covers any.
    pub fn span(&self, doc: &DocTheory) -> Option<(usize, usize, usize)> {
        match &self.kind {
            FeatureKind::Generic | FeatureKind::TopLevel { .. } | FeatureKind::Document => None,
            FeatureKind::Mention { sentence, mention, .. } => {
                let (start, end) = doc.sentence(*sentence).mention_span(*mention);
                Some((*sentence, start, end))
            }
            FeatureKind::Proposition { sentence, prop } => {
                let (start, end) = doc.sentence(*sentence).proposition_span(*prop);
                Some((*sentence, start, end))
            }
            FeatureKind::EventMention { sentence, event } => {
                let st = doc.sentence(*sentence);
                let node = st.parse.node(st.events[event.0].anchor_node);
                Some((*sentence, node.start_token, node.end_token))
            }
            FeatureKind::RelMention { sentence, relation } => {
                let st = doc.sentence(*sentence);
                let rel = &st.relations[relation.0];
                let left = st.mention_span(rel.left);
                let right = st.mention_span(rel.right);
                Some((*sentence, left.0.min(right.0), left.1.max(right.1)))
            }
            FeatureKind::ValueMention { sentence, value_mention } => {
                let vm = doc.sentence(*sentence).value_mention(*value_mention);
                Some((*sentence, vm.start_token, vm.end_token))
            }
            FeatureKind::ParseNode { sentence, node } => {
                let node = doc.sentence(*sentence).parse.node(*node);
                Some((*sentence, node.start_token, node.end_token))
            }
            FeatureKind::TokenSpan { sentence, start, end }
            | FeatureKind::Topic { sentence, start, end }
            | FeatureKind::Quote { sentence, start, end, .. } => Some((*sentence, *start, *end)),
        }
    }
}

/// Where in the document a feature set lies, widened to whole constituents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coverage {
    pub start_sentence: usize,
    pub end_sentence: usize,
    pub start_token: usize,
    pub end_token: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternFeatureSet {
    features: Vec<PatternFeature>,
    score: f32,
    coverage: Option<Coverage>,
}

impl PatternFeatureSet {
    /// Create a new empty feature set with an unspecified score.
    pub fn new() -> Self {
        Self {
            features: Vec::new(),
            score: UNSPECIFIED_SCORE,
            coverage: None,
        }
    }

    pub fn add_feature(&mut self, feature: PatternFeature) {
        self.features.push(feature);
    }

    /// Append copies of all features of `other`.
    pub fn add_features(&mut self, other: &PatternFeatureSet) {
        self.features.extend(other.features.iter().cloned());
    }

    pub fn replace_feature(&mut self, idx: usize, feature: PatternFeature) {
        if let Some(slot) = self.features.get_mut(idx) {
            *slot = feature;
        }
    }

    pub fn features(&self) -> &[PatternFeature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn set_score(&mut self, score: f32) {
        self.score = score;
    }

    pub fn coverage(&self) -> Option<&Coverage> {
        self.coverage.as_ref()
    }

    /// Whether both sets hold the same features, ignoring order.
    pub fn same_features(&self, other: &PatternFeatureSet) -> bool {
        self.features.len() == other.features.len()
            && other.features.iter().all(|f| self.features.contains(f))
            && self.features.iter().all(|f| other.features.contains(f))
    }

    /// The id of the first top level pattern that contributed to this set.
    pub fn top_level_label(&self) -> Option<&str> {
        self.features.iter().find_map(|f| match &f.kind {
            FeatureKind::TopLevel { id } => Some(id.as_str()),
            _ => None,
        })
    }

    /// The return features, in order.
    pub fn returns(&self) -> impl Iterator<Item = &PatternFeature> {
        self.features.iter().filter(|f| f.is_return())
    }

    /// Compute the sentence and token span the features cover. The span is widened to the
    /// smallest covering constituent; verbal constituents are widened up to their clause.
    pub fn set_coverage(&mut self, doc: &DocTheory) {
        let spans: Vec<(usize, usize, usize)> =
            self.features.iter().filter_map(|f| f.span(doc)).collect();
        let Some(first) = spans.first() else {
            self.coverage = None;
            return;
        };
        let (mut start_sentence, mut start_token) = (first.0, first.1);
        let (mut end_sentence, mut end_token) = (first.0, first.2);
        for &(sentence, start, end) in &spans[1..] {
            if (sentence, start) < (start_sentence, start_token) {
                start_sentence = sentence;
                start_token = start;
            }
            if (sentence, end) > (end_sentence, end_token) {
                end_sentence = sentence;
                end_token = end;
            }
        }

        let start_st = doc.sentence(start_sentence);
        if start_token != 0 {
            let end = if start_sentence == end_sentence {
                end_token
            } else {
                start_st.tokens.len().saturating_sub(1)
            };
            let node = best_covering_node(doc, start_sentence, start_token, end);
            start_token = start_st.parse.node(node).start_token;
        }
        let start = if start_sentence == end_sentence { start_token } else { 0 };
        let node = best_covering_node(doc, end_sentence, start, end_token);
        end_token = doc.sentence(end_sentence).parse.node(node).end_token;

        let mut words: Vec<&str> = Vec::new();
        for sentence in start_sentence..=end_sentence {
            let tokens = &doc.sentence(sentence).tokens;
            let from = if sentence == start_sentence { start_token } else { 0 };
            let to = if sentence == end_sentence {
                end_token
            } else {
                tokens.len().saturating_sub(1)
            };
            words.extend(tokens.iter().take(to + 1).skip(from).map(String::as_str));
        }
        self.coverage = Some(Coverage {
            start_sentence,
            end_sentence,
            start_token,
            end_token,
            text: words.join(" "),
        });
    }
}

impl Default for PatternFeatureSet {
    fn default() -> Self {
        Self::new()
    }
}

fn best_covering_node(doc: &DocTheory, sentence: usize, start: usize, end: usize) -> NodeId {
    let parse = &doc.sentence(sentence).parse;
    let mut node = parse.covering_node(start, end);
    let head_tag = &parse.node(parse.head_preterm(node)).tag;
    if head_tag.starts_with("VB") {
        while let Some(parent) = parse.node(node).parent {
            let tag = &parse.node(node).tag;
            if tag == "S" || tag == "SBAR" {
                break;
            }
            node = parent;
        }
    }
    node
}

#[cfg(test)]
mod test {
    use crate::features::{FeatureKind, PatternFeature, PatternFeatureSet, PatternReturn};
    use crate::scoring::UNSPECIFIED_SCORE;
    use crate::sexp::{ReaderOptions, parse};
    use crate::theory::{DocTheory, LanguageVariant, Mention, MentionType, SentenceTheory};

    #[test]
    fn basic_return_test() {
        let label = PatternReturn::from_sexp(&parse("(return AGENT)", ReaderOptions::default()).unwrap()).unwrap();
        assert_eq!(label.label(), Some("AGENT"));
        let map = PatternReturn::from_sexp(
            &parse("(return (role agent) (type PER))", ReaderOptions::default()).unwrap(),
        )
        .unwrap();
        assert_eq!(map.get("role"), Some("agent"));
        assert_eq!(map.to_string(), "(role agent) (type PER)");
        assert!(PatternReturn::from_sexp(&parse("(return)", ReaderOptions::default()).unwrap()).is_err());
    }

    #[test]
    fn basic_feature_set_test() {
        let variant = LanguageVariant::default();
        let mut set = PatternFeatureSet::new();
        assert_eq!(set.score(), UNSPECIFIED_SCORE);
        set.add_feature(PatternFeature::new(None, FeatureKind::Generic, &variant));
        let mut other = PatternFeatureSet::new();
        other.add_feature(PatternFeature::new(None, FeatureKind::Generic, &variant));
        other.add_feature(PatternFeature::new(
            None,
            FeatureKind::TopLevel { id: "x".to_string() },
            &variant,
        ));
        set.add_features(&other);
        assert_eq!(set.len(), 3);
        assert_eq!(set.top_level_label(), Some("x"));
        assert!(!set.same_features(&other));
    }

    #[test]
    fn basic_coverage_test() {
        let mut doc = DocTheory::new("doc");
        let mut sentence = SentenceTheory::from_treebank(
            0,
            "(S (NP (DT the) (NN president)) (VP (VBD left) (NP (NN office))))",
        )
        .unwrap();
        let np = sentence.parse.find("NP", 0, 1).unwrap();
        let president = sentence.add_mention(Mention::new(np, MentionType::Desc, "PER"));
        doc.add_sentence(sentence);

        let mut set = PatternFeatureSet::new();
        set.add_feature(PatternFeature::new(
            None,
            FeatureKind::Mention {
                sentence: 0,
                mention: president,
                matched: None,
            },
            &LanguageVariant::default(),
        ));
        set.set_coverage(&doc);
        let coverage = set.coverage().unwrap();
        assert_eq!((coverage.start_token, coverage.end_token), (0, 1));
        assert_eq!(coverage.text, "the president");
    }
}
