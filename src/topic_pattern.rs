//! ## Topic Patterns
//! A [TopicPattern] scores how relevant a stretch of text is to a query slot, a bag of words.
//! The relevance of a window of tokens is the share of slot words it contains. A sentence can
//! pool `context` sentences into one window, or borrow relevance from its neighbours within
//! `forward_range` and `backward_range`.

use rustc_hash::FxHashSet;

use crate::error::{PatternError, Result};
use crate::features::{FeatureKind, PatternFeatureSet};
use crate::matcher::PatternMatcher;
use crate::pattern::{ParseContext, Pattern, PatternCommon, PatternKind, PatternParser};
use crate::sexp::{Sexp, unquote};
use crate::theory::{Argument, ArgumentValue, MentionId, PropId};

#[derive(Debug, Clone, PartialEq)]
pub struct TopicPattern {
    /// Lowercased slot words.
    pub slot: Vec<String>,
    pub threshold: Option<f32>,
    pub context: usize,
    pub forward_range: usize,
    pub backward_range: usize,
    /// `(score_type real)`: score matches by their relevance instead of the pattern score.
    pub real_scores: bool,
    pub min_nodes: Option<usize>,
    pub max_nodes: Option<usize>,
}

impl Default for TopicPattern {
    fn default() -> Self {
        Self {
            slot: Vec::new(),
            threshold: None,
            context: 1,
            forward_range: 0,
            backward_range: 0,
            real_scores: false,
            min_nodes: None,
            max_nodes: None,
        }
    }
}

/// How much of a slot a window of tokens covers.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Relevance {
    score: f32,
    /// Distinct slot words found.
    nodes: usize,
}

impl PatternParser for TopicPattern {
    const TYPE_NAME: &'static str = "TopicPattern";

    fn init_atom(&mut self, _atom: &str, _ctx: &mut ParseContext) -> Result<bool> {
        Ok(false)
    }

    fn init_subexpression(&mut self, sexp: &Sexp, _ctx: &mut ParseContext) -> Result<bool> {
        let Some(head) = sexp.head() else {
            return Ok(false);
        };
        let err = |reason: &str| PatternError::parse(Self::TYPE_NAME, reason, sexp);
        let single = || -> Result<&str> {
            if sexp.num_children()? != 2 {
                return Err(err("constraint must have exactly one value"));
            }
            sexp.nth_child(1)?.value().ok_or_else(|| err("constraint value must be atomic"))
        };
        let count = || -> Result<usize> { single()?.parse().map_err(|_| err("expected a non-negative integer")) };
        match head {
            "slot" => {
                for child in sexp.children()?.iter().skip(1) {
                    let word = child.value().ok_or_else(|| err("slot words must be atomic"))?;
                    self.slot.extend(unquote(word).split_whitespace().map(str::to_lowercase));
                }
            }
            "threshold" => self.threshold = Some(single()?.parse().map_err(|_| err("threshold must be a number"))?),
            "context" => self.context = count()?,
            "forward_range" => self.forward_range = count()?,
            "backward_range" => self.backward_range = count()?,
            "score_type" => {
                if single()? != "real" {
                    return Err(err("score_type must be 'real'"));
                }
                self.real_scores = true;
            }
            "min_nodes" => self.min_nodes = Some(count()?),
            "max_nodes" => self.max_nodes = Some(count()?),
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn finish(&mut self, _common: &PatternCommon, sexp: &Sexp) -> Result<()> {
        let err = |reason: &str| PatternError::parse(Self::TYPE_NAME, reason, sexp);
        if self.slot.is_empty() {
            return Err(err("query slot not set in TopicPattern"));
        }
        if self.threshold.is_none() {
            return Err(err("threshold not set in TopicPattern"));
        }
        if self.context == 0 {
            return Err(err("context must be at least 1"));
        }
        if self.context != 1 && (self.forward_range > 0 || self.backward_range > 0) {
            return Err(err("forward/backward range only allowed when context==1"));
        }
        Ok(())
    }

    fn into_kind(self) -> PatternKind {
        PatternKind::Topic(self)
    }
}

impl TopicPattern {
    fn relevance<'t>(&self, tokens: impl IntoIterator<Item = &'t String>) -> Relevance {
        let window: FxHashSet<String> = tokens.into_iter().map(|t| t.to_lowercase()).collect();
        let slot: FxHashSet<&str> = self.slot.iter().map(String::as_str).collect();
        let nodes = slot.iter().filter(|word| window.contains(**word)).count();
        Relevance {
            score: nodes as f32 / slot.len().max(1) as f32,
            nodes,
        }
    }

    fn accepts(&self, relevance: Relevance) -> bool {
        let threshold = self.threshold.unwrap_or_default();
        relevance.score > threshold
            && self.min_nodes.is_none_or(|min| relevance.nodes >= min)
            && self.max_nodes.is_none_or(|max| relevance.nodes <= max)
    }

    /// The relevance of `context` sentences starting at `sentence`.
    fn sentence_relevance(&self, pm: &PatternMatcher, sentence: usize) -> Relevance {
        let sentences = &pm.doc().sentences;
        let last = (sentence + self.context).min(sentences.len());
        self.relevance(sentences[sentence..last].iter().flat_map(|s| s.tokens.iter()))
    }

    fn make_set(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        kind: FeatureKind,
        relevance: Relevance,
    ) -> PatternFeatureSet {
        let variant = pm.language_variant();
        let mut set = PatternFeatureSet::new();
        if let Some(ret) = pattern.return_feature(kind.clone(), variant) {
            set.add_feature(ret.with_confidence(relevance.score));
        }
        set.add_feature(pattern.feature(kind, variant).with_confidence(relevance.score));
        pattern.add_id(&mut set, variant);
        set.set_score(if self.real_scores { relevance.score } else { pattern.score() });
        set
    }

    fn matches_span(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        (start, end): (usize, usize),
    ) -> Option<PatternFeatureSet> {
        let tokens = &pm.doc().sentence(sentence).tokens;
        let relevance = self.relevance(tokens.get(start..=end).unwrap_or_default());
        self.accepts(relevance)
            .then(|| self.make_set(pm, pattern, FeatureKind::Topic { sentence, start, end }, relevance))
    }

    pub fn matches_sentence(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
    ) -> Result<Option<PatternFeatureSet>> {
        let tokens = pm.doc().sentence(sentence).tokens.len();
        if tokens == 0 {
            return Ok(None);
        }
        let kind = FeatureKind::Topic {
            sentence,
            start: 0,
            end: tokens - 1,
        };
        let relevance = self.sentence_relevance(pm, sentence);
        if self.accepts(relevance) {
            return Ok(Some(self.make_set(pm, pattern, kind, relevance)));
        }
        if self.context != 1 {
            return Ok(None);
        }
        let count = pm.doc().sentences.len();
        let forward = (1..=self.forward_range).map_while(|f| (sentence + f < count).then_some(sentence + f));
        let backward = (1..=self.backward_range).map_while(|b| sentence.checked_sub(b));
        for neighbour in forward.chain(backward) {
            let relevance = self.sentence_relevance(pm, neighbour);
            if self.accepts(relevance) {
                return Ok(Some(self.make_set(pm, pattern, kind, relevance)));
            }
        }
        Ok(None)
    }

    pub fn multi_matches_sentence(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
    ) -> Result<Vec<PatternFeatureSet>> {
        Ok(self.matches_sentence(pm, pattern, sentence)?.into_iter().collect())
    }

    pub fn matches_mention(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        mention: MentionId,
    ) -> Result<Option<PatternFeatureSet>> {
        let span = pm.doc().sentence(sentence).mention_span(mention);
        Ok(self.matches_span(pm, pattern, sentence, span))
    }

    pub fn matches_prop(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        prop: PropId,
    ) -> Result<Option<PatternFeatureSet>> {
        let span = pm.doc().sentence(sentence).proposition_span(prop);
        Ok(self.matches_span(pm, pattern, sentence, span))
    }

    pub fn matches_argument_value(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        arg: &Argument,
    ) -> Result<Option<PatternFeatureSet>> {
        match arg.value {
            ArgumentValue::Mention(mention) => self.matches_mention(pm, pattern, sentence, mention),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::features::FeatureKind;
    use crate::matcher::{MatchConfig, PatternMatcher};
    use crate::pattern_set::{LoadOptions, PatternSet};
    use crate::theory::{DocTheory, Mention, MentionType, SentenceTheory};

    fn document() -> DocTheory {
        let mut doc = DocTheory::new("doc");
        let mut first =
            SentenceTheory::from_treebank(0, "(S (NP (NNS Floods)) (VP (VBD hit) (NP (DT the) (NN coast))))").unwrap();
        let np = first.parse.find("NP", 0, 0).unwrap();
        first.add_mention(Mention::new(np, MentionType::Desc, "OTH"));
        doc.add_sentence(first);
        doc.add_sentence(SentenceTheory::from_treebank(1, "(S (NP (PRP It)) (VP (VBD rained)))").unwrap());
        doc
    }

    fn count(text: &str, sentence: usize) -> usize {
        let doc = document();
        let set = PatternSet::from_str(text, &LoadOptions::default()).unwrap();
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        matcher.multi_match_sentence(set.top_level()[0], sentence).unwrap().len()
    }

    #[test]
    fn basic_topic_test() {
        assert_eq!(count("(s (toplevel (topic (slot floods coast) (threshold 0.5))))", 0), 1);
        assert_eq!(count("(s (toplevel (topic (slot floods storm) (threshold 0.5))))", 0), 0);
        assert_eq!(count("(s (toplevel (topic (slot floods coast) (threshold 0.5))))", 1), 0);
        assert_eq!(
            count("(s (toplevel (topic (slot floods coast) (threshold 0.5) (backward_range 1))))", 1),
            1
        );
        assert_eq!(
            count("(s (toplevel (topic (slot floods coast) (threshold 0.1) (max_nodes 1))))", 0),
            0
        );
    }

    #[test]
    fn real_score_test() {
        let doc = document();
        let set = PatternSet::from_str(
            "(s (toplevel (topic (slot floods coast storm rain) (threshold 0.2) (score_type real) (return T))))",
            &LoadOptions::default(),
        )
        .unwrap();
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        let matched = matcher.match_sentence(set.top_level()[0], 0).unwrap().unwrap();
        assert_eq!(matched.score(), 0.5);
        assert_eq!(
            matched.returns().next().unwrap().kind,
            FeatureKind::Topic {
                sentence: 0,
                start: 0,
                end: 3
            }
        );
    }

    #[test]
    fn topic_errors_test() {
        assert!(PatternSet::from_str("(s (toplevel (topic (threshold 0.5))))", &LoadOptions::default()).is_err());
        assert!(PatternSet::from_str("(s (toplevel (topic (slot a))))", &LoadOptions::default()).is_err());
        assert!(PatternSet::from_str(
            "(s (toplevel (topic (slot a) (threshold 0.5) (context 2) (forward_range 1))))",
            &LoadOptions::default()
        )
        .is_err());
    }
}
