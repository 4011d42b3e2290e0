//! ## Sentence Level Patterns
//! Patterns that only ever match a whole sentence or a whole document: [IntersectionPattern],
//! [UnionPattern] and [NegationPattern] combine sentence matching patterns, [QuotationPattern]
//! finds quoted speech and [DocPattern] requires all of its members somewhere in the document.

use log::trace;

use crate::error::{PatternError, Result};
use crate::features::{FeatureKind, PatternFeatureSet};
use crate::matcher::{PatternMatcher, merge_matches};
use crate::pattern::{Capability, ParseContext, Pattern, PatternCommon, PatternId, PatternKind, PatternParser, parse_pattern_list};
use crate::sexp::Sexp;
use crate::theory::MentionId;

const QUOTE_OPENERS: [&str; 3] = ["``", "\"", "\u{201c}"];
const QUOTE_CLOSERS: [&str; 3] = ["''", "\"", "\u{201d}"];

/// Parse the `(members ...)` of a pattern that needs at least one member.
fn parse_members(sexp: &Sexp, ctx: &mut ParseContext, members: &mut Vec<PatternId>) -> Result<bool> {
    if sexp.head() != Some("members") {
        return Ok(false);
    }
    members.extend(parse_pattern_list(sexp, ctx)?);
    Ok(true)
}

fn require_members(members: &[PatternId], type_name: &'static str, sexp: &Sexp) -> Result<()> {
    if members.is_empty() {
        return Err(PatternError::parse(type_name, "no member patterns specified", sexp));
    }
    Ok(())
}

/// Tag a member match with the pattern that combined it.
fn tag_match(pm: &PatternMatcher, pattern: &Pattern, member_scores: &[f32], mut set: PatternFeatureSet) -> PatternFeatureSet {
    let variant = pm.language_variant();
    set.add_feature(pattern.feature(FeatureKind::Generic, variant));
    pattern.add_id(&mut set, variant);
    set.set_score(pattern.common.scoring.combine(member_scores, pattern.score()));
    set
}

/// All members must match the same sentence. Every combination of the separate matches of the
/// members is a match of the intersection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IntersectionPattern {
    pub members: Vec<PatternId>,
}

impl PatternParser for IntersectionPattern {
    const TYPE_NAME: &'static str = "IntersectionPattern";

    fn init_atom(&mut self, _atom: &str, _ctx: &mut ParseContext) -> Result<bool> {
        Ok(false)
    }

    fn init_subexpression(&mut self, sexp: &Sexp, ctx: &mut ParseContext) -> Result<bool> {
        parse_members(sexp, ctx, &mut self.members)
    }

    fn finish(&mut self, _common: &PatternCommon, sexp: &Sexp) -> Result<()> {
        require_members(&self.members, Self::TYPE_NAME, sexp)
    }

    fn into_kind(self) -> PatternKind {
        PatternKind::Intersection(self)
    }
}

impl IntersectionPattern {
    pub fn matches_sentence(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
    ) -> Result<Option<PatternFeatureSet>> {
        Ok(merge_matches(self.multi_matches_sentence(pm, pattern, sentence)?))
    }

    pub fn multi_matches_sentence(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
    ) -> Result<Vec<PatternFeatureSet>> {
        let mut partials = vec![(PatternFeatureSet::new(), Vec::new())];
        for &member in &self.members {
            let matches = pm.multi_match_sentence(member, sentence)?;
            if matches.is_empty() {
                return Ok(Vec::new());
            }
            let mut next = Vec::with_capacity(partials.len() * matches.len());
            for (set, scores) in &partials {
                for member_match in &matches {
                    let mut set = set.clone();
                    set.add_features(member_match);
                    let mut scores: Vec<f32> = scores.clone();
                    scores.push(member_match.score());
                    next.push((set, scores));
                }
            }
            partials = next;
        }
        trace!("intersection has {} combined matches in sentence {sentence}", partials.len());
        Ok(partials
            .into_iter()
            .map(|(set, scores)| tag_match(pm, pattern, &scores, set))
            .collect())
    }
}

/// At least one member must match. A `GREEDY` union stops at the first member that does.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UnionPattern {
    pub members: Vec<PatternId>,
    pub greedy: bool,
}

impl PatternParser for UnionPattern {
    const TYPE_NAME: &'static str = "UnionPattern";

    fn init_atom(&mut self, atom: &str, _ctx: &mut ParseContext) -> Result<bool> {
        if atom == "GREEDY" {
            self.greedy = true;
            return Ok(true);
        }
        Ok(false)
    }

    fn init_subexpression(&mut self, sexp: &Sexp, ctx: &mut ParseContext) -> Result<bool> {
        parse_members(sexp, ctx, &mut self.members)
    }

    fn finish(&mut self, _common: &PatternCommon, sexp: &Sexp) -> Result<()> {
        require_members(&self.members, Self::TYPE_NAME, sexp)
    }

    fn into_kind(self) -> PatternKind {
        PatternKind::Union(self)
    }
}

impl UnionPattern {
    pub fn matches_sentence(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
    ) -> Result<Option<PatternFeatureSet>> {
        let mut all = PatternFeatureSet::new();
        let mut scores = Vec::new();
        for &member in &self.members {
            if let Some(set) = pm.match_sentence(member, sentence)? {
                all.add_features(&set);
                scores.push(set.score());
                if self.greedy {
                    break;
                }
            }
        }
        if scores.is_empty() {
            return Ok(None);
        }
        Ok(Some(tag_match(pm, pattern, &scores, all)))
    }

    pub fn multi_matches_sentence(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
    ) -> Result<Vec<PatternFeatureSet>> {
        let mut matches = Vec::new();
        for &member in &self.members {
            let member_matches = pm.multi_match_sentence(member, sentence)?;
            let found = !member_matches.is_empty();
            matches.extend(
                member_matches
                    .into_iter()
                    .map(|set| {
                        let score = set.score();
                        tag_match(pm, pattern, &[score], set)
                    }),
            );
            if found && self.greedy {
                break;
            }
        }
        Ok(matches)
    }
}

/// Matches a sentence exactly when the wrapped pattern does not.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NegationPattern {
    pub pattern: Option<PatternId>,
}

impl NegationPattern {
    fn set_pattern(&mut self, id: PatternId, sexp: &Sexp) -> Result<bool> {
        if self.pattern.is_some() {
            return Err(PatternError::parse(Self::TYPE_NAME, "negation takes exactly one pattern", sexp));
        }
        self.pattern = Some(id);
        Ok(true)
    }

    pub fn matches_sentence(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
    ) -> Result<Option<PatternFeatureSet>> {
        let Some(inner) = self.pattern else {
            return Err(PatternError::internal("negation pattern without a pattern"));
        };
        if pm.match_sentence(inner, sentence)?.is_some() {
            return Ok(None);
        }
        Ok(Some(pattern.empty_feature_set(pm.language_variant())))
    }
}

impl PatternParser for NegationPattern {
    const TYPE_NAME: &'static str = "NegationPattern";

    fn init_atom(&mut self, atom: &str, ctx: &mut ParseContext) -> Result<bool> {
        let sexp = Sexp::atom(atom);
        let id = ctx.parse(&sexp)?;
        self.set_pattern(id, &sexp)
    }

    fn init_subexpression(&mut self, sexp: &Sexp, ctx: &mut ParseContext) -> Result<bool> {
        let id = ctx.parse(sexp)?;
        self.set_pattern(id, sexp)
    }

    fn finish(&mut self, _common: &PatternCommon, sexp: &Sexp) -> Result<()> {
        if self.pattern.is_none() {
            return Err(PatternError::parse(Self::TYPE_NAME, "negation takes exactly one pattern", sexp));
        }
        Ok(())
    }

    fn into_kind(self) -> PatternKind {
        PatternKind::Negation(self)
    }
}

/// Every member must match somewhere in the document, either in some sentence or against the
/// document as a whole.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocPattern {
    pub members: Vec<PatternId>,
}

impl PatternParser for DocPattern {
    const TYPE_NAME: &'static str = "DocPattern";

    fn init_atom(&mut self, _atom: &str, _ctx: &mut ParseContext) -> Result<bool> {
        Ok(false)
    }

    fn init_subexpression(&mut self, sexp: &Sexp, ctx: &mut ParseContext) -> Result<bool> {
        parse_members(sexp, ctx, &mut self.members)
    }

    fn finish(&mut self, _common: &PatternCommon, sexp: &Sexp) -> Result<()> {
        require_members(&self.members, Self::TYPE_NAME, sexp)
    }

    fn into_kind(self) -> PatternKind {
        PatternKind::Doc(self)
    }
}

impl DocPattern {
    fn member_match(&self, pm: &PatternMatcher, member: PatternId) -> Result<Option<PatternFeatureSet>> {
        if pm.bank().supports(member, Capability::Document) {
            return pm.match_document(member);
        }
        for sentence in 0..pm.doc().sentences.len() {
            if let Some(set) = pm.match_sentence(member, sentence)? {
                return Ok(Some(set));
            }
        }
        Ok(None)
    }

    pub fn matches_document(&self, pm: &PatternMatcher, pattern: &Pattern) -> Result<Option<PatternFeatureSet>> {
        let variant = pm.language_variant();
        let mut set = PatternFeatureSet::new();
        let mut scores = Vec::with_capacity(self.members.len());
        for &member in &self.members {
            let Some(member_match) = self.member_match(pm, member)? else {
                return Ok(None);
            };
            scores.push(member_match.score());
            set.add_features(&member_match);
        }
        if let Some(ret) = pattern.return_feature(FeatureKind::Document, variant) {
            set.add_feature(ret);
        }
        set.add_feature(pattern.feature(FeatureKind::Document, variant));
        pattern.add_id(&mut set, variant);
        set.set_score(pattern.common.scoring.combine(&scores, pattern.score()));
        Ok(Some(set))
    }
}

/// Quoted speech inside a sentence, optionally attributed to a speaker mention outside the quote.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotationPattern {
    pub speaker: Option<PatternId>,
    /// The fewest tokens between the quote marks.
    pub min_tokens: usize,
}

impl Default for QuotationPattern {
    fn default() -> Self {
        Self {
            speaker: None,
            min_tokens: 1,
        }
    }
}

impl PatternParser for QuotationPattern {
    const TYPE_NAME: &'static str = "QuotationPattern";

    fn init_atom(&mut self, _atom: &str, _ctx: &mut ParseContext) -> Result<bool> {
        Ok(false)
    }

    fn init_subexpression(&mut self, sexp: &Sexp, ctx: &mut ParseContext) -> Result<bool> {
        match sexp.head() {
            Some("speaker") => {
                if self.speaker.is_some() {
                    return Err(PatternError::parse(Self::TYPE_NAME, "more than one speaker", sexp));
                }
                self.speaker = Some(crate::pattern::parse_single_pattern(sexp, ctx, Self::TYPE_NAME)?);
            }
            Some("min_tokens") => {
                self.min_tokens = sexp
                    .nth_child(1)?
                    .value()
                    .and_then(|v| v.parse().ok())
                    .ok_or_else(|| PatternError::parse(Self::TYPE_NAME, "min_tokens must be a number", sexp))?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn into_kind(self) -> PatternKind {
        PatternKind::Quotation(self)
    }
}

impl QuotationPattern {
    /// The inner token spans of all quotes in a sentence.
    fn quotes(tokens: &[String]) -> Vec<(usize, usize)> {
        let mut quotes = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            if !QUOTE_OPENERS.contains(&tokens[i].as_str()) {
                i += 1;
                continue;
            }
            let close = (i + 1..tokens.len()).find(|&j| QUOTE_CLOSERS.contains(&tokens[j].as_str()));
            let Some(close) = close else {
                break;
            };
            if close > i + 1 {
                quotes.push((i + 1, close - 1));
            }
            i = close + 1;
        }
        quotes
    }

    /// The first mention outside the quote matched by the speaker pattern.
    fn find_speaker(
        &self,
        pm: &PatternMatcher,
        speaker: PatternId,
        sentence: usize,
        (start, end): (usize, usize),
    ) -> Result<Option<(MentionId, PatternFeatureSet)>> {
        let st = pm.doc().sentence(sentence);
        for mention in st.mention_ids() {
            let (m_start, m_end) = st.mention_span(mention);
            if m_end + 1 >= start && m_start <= end + 1 {
                continue;
            }
            if let Some(set) = pm.match_mention(speaker, sentence, mention, false)? {
                return Ok(Some((mention, set)));
            }
        }
        Ok(None)
    }

    pub fn matches_sentence(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
    ) -> Result<Option<PatternFeatureSet>> {
        let variant = pm.language_variant();
        let mut matches = Vec::new();
        for (start, end) in Self::quotes(&pm.doc().sentence(sentence).tokens) {
            if end + 1 - start < self.min_tokens {
                continue;
            }
            let mut set = PatternFeatureSet::new();
            let speaker = match self.speaker {
                Some(speaker) => match self.find_speaker(pm, speaker, sentence, (start, end))? {
                    Some((mention, speaker_match)) => {
                        set.add_features(&speaker_match);
                        Some(mention)
                    }
                    None => continue,
                },
                None => None,
            };
            let kind = FeatureKind::Quote {
                sentence,
                start,
                end,
                speaker,
            };
            if let Some(ret) = pattern.return_feature(kind.clone(), variant) {
                set.add_feature(ret);
            }
            set.add_feature(pattern.feature(kind, variant));
            pattern.add_id(&mut set, variant);
            set.set_score(pattern.score());
            matches.push(set);
        }
        Ok(merge_matches(matches))
    }
}

#[cfg(test)]
mod test {
    use crate::features::FeatureKind;
    use crate::matcher::{MatchConfig, PatternMatcher};
    use crate::pattern_set::{LoadOptions, PatternSet};
    use crate::sentence_patterns::QuotationPattern;
    use crate::theory::{DocTheory, Mention, MentionId, MentionType, SentenceTheory};

    /// `Smith said `` we won '' .` and `Jones slept .`
    fn document() -> DocTheory {
        let mut doc = DocTheory::new("doc");
        let mut first = SentenceTheory::from_treebank(
            0,
            "(S (NP (NNP Smith)) (VP (VBD said) (S (`` ``) (NP (PRP we)) (VP (VBD won)) ('' ''))) (. .))",
        )
        .unwrap();
        let smith = first.parse.find("NP", 0, 0).unwrap();
        first.add_mention(Mention::new(smith, MentionType::Name, "PER"));
        let we = first.parse.find("NP", 3, 3).unwrap();
        first.add_mention(Mention::new(we, MentionType::Pron, "PER"));
        doc.add_sentence(first);
        let mut second = SentenceTheory::from_treebank(1, "(S (NP (NNP Jones)) (VP (VBD slept)) (. .))").unwrap();
        let jones = second.parse.find("NP", 0, 0).unwrap();
        second.add_mention(Mention::new(jones, MentionType::Name, "PER"));
        doc.add_sentence(second);
        doc
    }

    fn load(text: &str) -> PatternSet {
        PatternSet::from_str(text, &LoadOptions::default()).unwrap()
    }

    #[test]
    fn basic_quotes_test() {
        let tokens: Vec<String> = ["a", "``", "b", "c", "''", "\"", "\"", "d"].iter().map(|t| t.to_string()).collect();
        assert_eq!(QuotationPattern::quotes(&tokens), vec![(2, 3)]);
    }

    #[test]
    fn quotation_test() {
        let doc = document();
        let set = load("(s (toplevel (quotation (speaker (mention (mentiontype name))) (return QUOTE))))");
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        let matched = matcher.match_sentence(set.top_level()[0], 0).unwrap().unwrap();
        assert!(matched.returns().any(|f| f.kind
            == FeatureKind::Quote {
                sentence: 0,
                start: 3,
                end: 4,
                speaker: Some(MentionId(0))
            }));
        assert!(matcher.match_sentence(set.top_level()[0], 1).unwrap().is_none());

        let set = load("(s (toplevel (quotation (min_tokens 3))))");
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        assert!(matcher.match_sentence(set.top_level()[0], 0).unwrap().is_none());
    }

    #[test]
    fn intersection_and_union_test() {
        let doc = document();
        let set = load(
            "(s (toplevel (intersection (members (mention (acetype PER)) (mention (mentiontype name)))) \
                          (union GREEDY (members (mention (acetype PER)) (mention (mentiontype name)))) \
                          (union (members (mention (acetype PER)) (mention (mentiontype name))))))",
        );
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        let top = set.top_level();
        // Two PER mentions times one name mention.
        assert_eq!(matcher.multi_match_sentence(top[0], 0).unwrap().len(), 2);
        assert_eq!(matcher.multi_match_sentence(top[1], 0).unwrap().len(), 2);
        assert_eq!(matcher.multi_match_sentence(top[2], 0).unwrap().len(), 3);
    }

    #[test]
    fn negation_and_doc_test() {
        let doc = document();
        let set = load(
            "(s (toplevel (negation (mention (mentiontype pron))) \
                          (doc (id BOTH) (members (mention (headword Smith)) (mention (headword Jones))))))",
        );
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        let top = set.top_level();
        assert!(matcher.match_sentence(top[0], 0).unwrap().is_none());
        let negated = matcher.match_sentence(top[0], 1).unwrap().unwrap();
        assert!(negated.features().iter().all(|f| f.kind == FeatureKind::Generic));
        let doc_match = matcher.match_document(top[1]).unwrap().unwrap();
        assert_eq!(doc_match.top_level_label(), Some("BOTH"));
    }

    #[test]
    fn sentence_pattern_errors_test() {
        assert!(PatternSet::from_str("(s (toplevel (negation)))", &LoadOptions::default()).is_err());
        assert!(PatternSet::from_str(
            "(s (toplevel (negation (mention) (mention))))",
            &LoadOptions::default()
        )
        .is_err());
        assert!(PatternSet::from_str("(s (toplevel (union GREEDY)))", &LoadOptions::default()).is_err());
        assert!(PatternSet::from_str("(s (toplevel (intersection (members (argument <sub> (mention))))))", &LoadOptions::default()).is_err());
    }
}
