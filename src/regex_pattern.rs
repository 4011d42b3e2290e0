//! ## Regex Patterns
//! A [RegexPattern] is a sequence of [TextPattern] fragments and sub-patterns matching mentions
//! or value mentions. The fragments and one placeholder per sub-pattern are joined into a
//! single regular expression that is run over the tokens of a span, with every sub-pattern match
//! replaced by the placeholder. Byte offsets of the regex match are mapped back to tokens.
//!
//! The expression is compiled once, after shortcut resolution, see [RegexPattern::compile].

use log::{debug, warn};
use regex::{Regex, RegexBuilder};

use crate::error::{PatternError, Result};
use crate::features::{FeatureKind, PatternFeatureSet};
use crate::matcher::PatternMatcher;
use crate::pattern::{Capability, ParseContext, Pattern, PatternBank, PatternCommon, PatternId, PatternKind, PatternParser};
use crate::pretty_print::dump;
use crate::sexp::{Sexp, unquote};
use crate::theory::{Argument, MentionId, NodeId, SentenceTheory, ValueMentionId};

/// Stands in for a sub-pattern match in the string the expression runs on.
const PLACEHOLDER: &str = "<<match>>";

/// A literal or regex fragment of a [RegexPattern].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextPattern {
    pub text: String,
    /// `RAW_TEXT`: the text is literal, metacharacters are escaped.
    pub raw: bool,
}

impl TextPattern {
    /// The fragment as it appears in the compiled expression.
    pub fn expression(&self) -> String {
        if self.raw {
            regex::escape(&self.text)
        } else {
            self.text.clone()
        }
    }
}

/// Whether the unescaped parentheses of `text` are balanced.
fn balanced_parens(text: &str) -> bool {
    let mut depth = 0i32;
    let mut escaped = false;
    for c in text.chars() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

impl PatternParser for TextPattern {
    const TYPE_NAME: &'static str = "TextPattern";

    fn init_atom(&mut self, atom: &str, _ctx: &mut ParseContext) -> Result<bool> {
        if atom == "RAW_TEXT" {
            self.raw = true;
        } else if atom.starts_with('"') && self.text.is_empty() {
            self.text = unquote(atom).to_string();
        } else {
            return Ok(false);
        }
        Ok(true)
    }

    fn init_subexpression(&mut self, sexp: &Sexp, _ctx: &mut ParseContext) -> Result<bool> {
        if sexp.head() != Some("string") {
            return Ok(false);
        }
        let words: Vec<&str> = sexp
            .children()?
            .iter()
            .skip(1)
            .map(|c| c.value().map(unquote))
            .collect::<Option<_>>()
            .ok_or_else(|| PatternError::parse(Self::TYPE_NAME, "string must be atomic", sexp))?;
        self.text = words.join(" ");
        Ok(true)
    }

    fn finish(&mut self, _common: &PatternCommon, sexp: &Sexp) -> Result<()> {
        if self.text.is_empty() {
            return Err(PatternError::parse(Self::TYPE_NAME, "TextPattern without text", sexp));
        }
        if !self.raw && !balanced_parens(&self.text) {
            return Err(PatternError::parse(
                Self::TYPE_NAME,
                "unbalanced parentheses in TextPattern, use RAW_TEXT or escape them",
                sexp,
            ));
        }
        Ok(())
    }

    fn into_kind(self) -> PatternKind {
        PatternKind::Text(self)
    }
}

/// What a position of the compiled expression stands for.
#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Text { pattern: PatternId },
    Match { pattern: PatternId },
}

#[derive(Debug, Clone)]
pub struct CompiledRegex {
    source: String,
    regex: Regex,
    /// Every fragment must occur in the sentence, longest first.
    filters: Vec<Regex>,
    slots: Vec<Slot>,
}

impl PartialEq for CompiledRegex {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl CompiledRegex {
    pub fn source(&self) -> &str {
        &self.source
    }
}

fn build_regex(source: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(source).case_insensitive(true).build()?)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegexPattern {
    pub subpatterns: Vec<PatternId>,
    /// Off with `DONT_ALLOW_HEADS`.
    pub allow_heads: bool,
    pub top_mentions_only: bool,
    pub match_full_extent: bool,
    /// Off with `DONT_ADD_SPACES`.
    pub add_spaces: bool,
    pub compiled: Option<CompiledRegex>,
}

impl Default for RegexPattern {
    fn default() -> Self {
        Self {
            subpatterns: Vec::new(),
            allow_heads: true,
            top_mentions_only: false,
            match_full_extent: false,
            add_spaces: true,
            compiled: None,
        }
    }
}

impl PatternParser for RegexPattern {
    const TYPE_NAME: &'static str = "RegexPattern";

    fn init_atom(&mut self, atom: &str, _ctx: &mut ParseContext) -> Result<bool> {
        match atom {
            "DONT_ALLOW_HEADS" => self.allow_heads = false,
            "TOP_MENTIONS_ONLY" => self.top_mentions_only = true,
            "MATCH_FULL_EXTENT" => self.match_full_extent = true,
            "DONT_ADD_SPACES" => self.add_spaces = false,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn init_subexpression(&mut self, sexp: &Sexp, ctx: &mut ParseContext) -> Result<bool> {
        if sexp.head() != Some("re") {
            return Ok(false);
        }
        for child in sexp.children()?.iter().skip(1) {
            self.subpatterns.push(ctx.parse(child)?);
        }
        Ok(true)
    }

    fn finish(&mut self, _common: &PatternCommon, sexp: &Sexp) -> Result<()> {
        if self.subpatterns.is_empty() {
            return Err(PatternError::parse(
                Self::TYPE_NAME,
                "RegexPattern must have at least one subpattern",
                sexp,
            ));
        }
        Ok(())
    }

    fn into_kind(self) -> PatternKind {
        PatternKind::Regex(self)
    }
}

/// The tokens of a span joined by spaces, with a leading and a trailing space, and for every byte
/// the first and last token it belongs to. A space belongs to the token after it for starts and
/// to the token before it for ends.
struct SpanString {
    text: String,
    start_token: Vec<usize>,
    end_token: Vec<usize>,
}

impl SpanString {
    /// Build the string for tokens `start..=end`, replacing the `replaced` spans, which must not
    /// overlap, by the placeholder.
    fn new(tokens: &[String], start: usize, end: usize, replaced: &[(usize, usize)]) -> Self {
        let mut string = SpanString {
            text: String::new(),
            start_token: Vec::new(),
            end_token: Vec::new(),
        };
        let mut previous_end = start;
        let mut token = start;
        while token <= end {
            let (piece, piece_end) = match replaced.iter().find(|(s, _)| *s == token) {
                Some(&(s, e)) => (PLACEHOLDER, e.max(s)),
                None => (tokens.get(token).map(String::as_str).unwrap_or_default(), token),
            };
            string.push(" ", token, previous_end);
            string.push(piece, token, piece_end);
            previous_end = piece_end;
            token = piece_end + 1;
        }
        string.push(" ", previous_end, previous_end);
        string
    }

    fn push(&mut self, piece: &str, start: usize, end: usize) {
        self.text.push_str(piece);
        self.start_token.resize(self.text.len(), start);
        self.end_token.resize(self.text.len(), end);
    }

    fn is_blank(&self, start: usize, end: usize) -> bool {
        self.text[start..end].chars().all(char::is_whitespace)
    }

    /// Token span of the bytes `start..end`, `None` if they are empty or blank.
    fn tokens(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        if end <= start || self.is_blank(start, end) {
            return None;
        }
        Some((self.start_token[start], self.end_token[end - 1]))
    }
}

/// A sub-pattern match usable in the slot of a sub-pattern.
struct Candidate {
    start: usize,
    end: usize,
    set: PatternFeatureSet,
}

impl RegexPattern {
    /// Build the expression of a resolved regex pattern.
    pub fn compile(&self, bank: &PatternBank) -> Result<CompiledRegex> {
        let mut source = String::new();
        if self.match_full_extent {
            source.push('^');
        }
        source.push(' ');
        let mut slots = Vec::with_capacity(self.subpatterns.len());
        let mut fragments = Vec::new();
        for (i, &sub) in self.subpatterns.iter().enumerate() {
            let sub_pattern = bank.get(sub);
            match &sub_pattern.kind {
                PatternKind::Text(text) => {
                    let expression = text.expression();
                    source.push_str(&format!("(?P<s{i}>{expression})"));
                    fragments.push(expression);
                    slots.push(Slot::Text { pattern: sub });
                }
                _ if sub_pattern.supports(Capability::Mention) || sub_pattern.supports(Capability::ValueMention) => {
                    source.push_str(&format!("(?P<s{i}>{})", regex::escape(PLACEHOLDER)));
                    slots.push(Slot::Match { pattern: sub });
                }
                _ => {
                    return Err(PatternError::config(
                        "subpatterns of RegexPatterns must be MentionPatterns, ValueMentionPatterns, or TextPatterns",
                        dump(bank, sub),
                    ));
                }
            }
            if self.add_spaces {
                source.push(' ');
            }
        }
        if !self.add_spaces {
            source.push(' ');
        }
        if self.match_full_extent {
            source.push('$');
        }

        fragments.sort_by_key(|f| std::cmp::Reverse(f.len()));
        fragments.dedup();
        let filters = fragments.iter().map(|f| build_regex(f)).collect::<Result<Vec<_>>>()?;
        let regex = build_regex(&source)?;
        Ok(CompiledRegex {
            source,
            regex,
            filters,
            slots,
        })
    }

    fn compiled<'p>(&'p self, pm: &PatternMatcher, pattern: &Pattern) -> Result<&'p CompiledRegex> {
        self.compiled.as_ref().ok_or_else(|| {
            PatternError::internal(format!(
                "regex pattern matched before shortcut resolution: {}",
                dump(pm.bank(), pattern.index)
            ))
        })
    }

    pub fn matches_sentence(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
    ) -> Result<Option<PatternFeatureSet>> {
        let st = pm.doc().sentence(sentence);
        if st.tokens.is_empty() {
            return Ok(None);
        }
        self.first_match(pm, pattern, sentence, 0, st.tokens.len() - 1)
    }

    pub fn multi_matches_sentence(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
    ) -> Result<Vec<PatternFeatureSet>> {
        let st = pm.doc().sentence(sentence);
        if st.tokens.is_empty() {
            return Ok(Vec::new());
        }
        self.match_span(pm, pattern, sentence, 0, st.tokens.len() - 1, true)
    }

    pub fn matches_argument_value(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        arg: &Argument,
    ) -> Result<Option<PatternFeatureSet>> {
        let (start, end) = pm.doc().sentence(sentence).argument_span(arg);
        self.first_match(pm, pattern, sentence, start, end)
    }

    pub fn matches_parse_node(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        node: NodeId,
    ) -> Result<Option<PatternFeatureSet>> {
        let node = pm.doc().sentence(sentence).parse.node(node);
        self.first_match(pm, pattern, sentence, node.start_token, node.end_token)
    }

    pub fn matches_mention(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        mention: MentionId,
    ) -> Result<Option<PatternFeatureSet>> {
        let (start, end) = pm.doc().sentence(sentence).mention_span(mention);
        let kind = FeatureKind::Mention {
            sentence,
            mention,
            matched: None,
        };
        self.matches_object(pm, pattern, sentence, start, end, kind)
    }

    pub fn matches_mention_head(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        mention: MentionId,
    ) -> Result<Option<PatternFeatureSet>> {
        let st = pm.doc().sentence(sentence);
        let head = st.parse.node(st.mention_head(mention));
        let kind = FeatureKind::Mention {
            sentence,
            mention,
            matched: None,
        };
        self.matches_object(pm, pattern, sentence, head.start_token, head.end_token, kind)
    }

    pub fn matches_value_mention(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        value_mention: ValueMentionId,
    ) -> Result<Option<PatternFeatureSet>> {
        let vm = pm.doc().sentence(sentence).value_mention(value_mention);
        let kind = FeatureKind::ValueMention {
            sentence,
            value_mention,
        };
        self.matches_object(pm, pattern, sentence, vm.start_token, vm.end_token, kind)
    }

    /// Match the span of a theory object. A full extent match returns the object itself instead
    /// of its token span.
    fn matches_object(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        start: usize,
        end: usize,
        kind: FeatureKind,
    ) -> Result<Option<PatternFeatureSet>> {
        let Some(mut set) = self.first_match(pm, pattern, sentence, start, end)? else {
            return Ok(None);
        };
        if self.match_full_extent {
            let own_returns: Vec<usize> = set
                .features()
                .iter()
                .enumerate()
                .filter(|(_, f)| f.is_return() && f.pattern == Some(pattern.index))
                .map(|(i, _)| i)
                .collect();
            for i in own_returns {
                let confidence = set.features()[i].confidence;
                if let Some(ret) = pattern.return_feature(kind.clone(), pm.language_variant()) {
                    set.replace_feature(i, ret.with_confidence(confidence));
                }
            }
        }
        Ok(Some(set))
    }

    fn first_match(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        start: usize,
        end: usize,
    ) -> Result<Option<PatternFeatureSet>> {
        Ok(self.match_span(pm, pattern, sentence, start, end, false)?.into_iter().next())
    }

    fn match_span(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        start: usize,
        end: usize,
        multi: bool,
    ) -> Result<Vec<PatternFeatureSet>> {
        let compiled = self.compiled(pm, pattern)?;
        let st = pm.doc().sentence(sentence);
        let mut results = Vec::new();

        let full = SpanString::new(&st.tokens, 0, st.tokens.len().saturating_sub(1), &[]);
        if compiled.filters.iter().any(|f| !f.is_match(&full.text)) {
            return Ok(results);
        }

        let mut candidates: Vec<(usize, Vec<Candidate>)> = Vec::new();
        for (i, slot) in compiled.slots.iter().enumerate() {
            let Slot::Match { pattern: sub } = slot else {
                continue;
            };
            let found = self.candidates(pm, *sub, sentence, start, end)?;
            if found.is_empty() {
                return Ok(results);
            }
            candidates.push((i, found));
        }

        let cap = pm.config().regex_iteration_cap;
        let mut choice = vec![0usize; candidates.len()];
        let mut iterations = 0;
        loop {
            iterations += 1;
            if iterations > cap {
                warn!("Regex pattern exceeded {cap} candidate combinations, giving up");
                break;
            }
            let chosen: Vec<(usize, &Candidate)> = candidates
                .iter()
                .zip(&choice)
                .map(|((slot, found), &c)| (*slot, &found[c]))
                .collect();
            if !overlapping(&chosen) {
                let spans: Vec<(usize, usize)> = chosen.iter().map(|(_, c)| (c.start, c.end)).collect();
                let string = SpanString::new(&st.tokens, start, end, &spans);
                debug!("matching {} to {}", compiled.source, string.text);
                self.collect_matches(pm, pattern, compiled, sentence, &string, &chosen, multi, &mut results)?;
                if !multi && !results.is_empty() {
                    break;
                }
            }
            if !advance(&mut choice, &candidates) {
                break;
            }
        }
        Ok(results)
    }

    /// Every match of the sub-pattern `sub` inside `start..=end`.
    fn candidates(
        &self,
        pm: &PatternMatcher,
        sub: PatternId,
        sentence: usize,
        start: usize,
        end: usize,
    ) -> Result<Vec<Candidate>> {
        let st = pm.doc().sentence(sentence);
        let bank = pm.bank();
        let mut found = Vec::new();
        if bank.supports(sub, Capability::Mention) {
            for mention in st.mention_ids() {
                let (m_start, m_end) = st.mention_span(mention);
                if m_start < start || m_end > end {
                    continue;
                }
                // sets always fall through inside a regex
                let Some(set) = pm.match_mention(sub, sentence, mention, true)? else {
                    continue;
                };
                if self.top_mentions_only && !is_top_mention(st, mention) {
                    continue;
                }
                let head = st.parse.node(st.mention_head(mention));
                let head_span = (head.start_token, head.end_token);
                let head_set = (self.allow_heads && head_span != (m_start, m_end)).then(|| set.clone());
                found.push(Candidate {
                    start: m_start,
                    end: m_end,
                    set,
                });
                if let Some(set) = head_set {
                    found.push(Candidate {
                        start: head_span.0,
                        end: head_span.1,
                        set,
                    });
                }
            }
        }
        if bank.supports(sub, Capability::ValueMention) {
            for (index, vm) in st.value_mentions.iter().enumerate() {
                if vm.start_token < start || vm.end_token > end {
                    continue;
                }
                if let Some(set) = pm.match_value_mention(sub, sentence, ValueMentionId(index))? {
                    found.push(Candidate {
                        start: vm.start_token,
                        end: vm.end_token,
                        set,
                    });
                }
            }
        }
        Ok(found)
    }

    #[allow(clippy::too_many_arguments)]
    fn collect_matches(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        compiled: &CompiledRegex,
        sentence: usize,
        string: &SpanString,
        chosen: &[(usize, &Candidate)],
        multi: bool,
        results: &mut Vec<PatternFeatureSet>,
    ) -> Result<()> {
        let variant = pm.language_variant();
        let bank = pm.bank();
        let mut position = 0;
        'matches: while let Some(captures) = compiled.regex.captures_at(&string.text, position) {
            let Some(whole) = captures.get(0) else {
                break;
            };
            // the trailing space may start the next match
            position = whole.end().saturating_sub(1).max(whole.start() + 1);
            let Some((start, end)) = string.tokens(whole.start(), whole.end()) else {
                continue;
            };

            let span = FeatureKind::TokenSpan { sentence, start, end };
            let mut set = PatternFeatureSet::new();
            if let Some(ret) = pattern.return_feature(span.clone(), variant) {
                set.add_feature(ret);
            }
            set.add_feature(pattern.feature(span, variant));
            pattern.add_id(&mut set, variant);

            let mut scores = Vec::new();
            for (i, slot) in compiled.slots.iter().enumerate() {
                let group = captures.name(&format!("s{i}"));
                match slot {
                    Slot::Text { pattern: text } => {
                        let text = bank.get(*text);
                        if text.common.ret.is_none() {
                            continue;
                        }
                        let Some((s, e)) = group.and_then(|g| string.tokens(g.start(), g.end())) else {
                            continue 'matches;
                        };
                        let kind = FeatureKind::TokenSpan { sentence, start: s, end: e };
                        if let Some(ret) = text.return_feature(kind.clone(), variant) {
                            set.add_feature(ret);
                        }
                        set.add_feature(text.feature(kind, variant));
                        text.add_id(&mut set, variant);
                    }
                    Slot::Match { .. } => {
                        let Some((_, candidate)) = chosen.iter().find(|(slot, _)| *slot == i) else {
                            continue 'matches;
                        };
                        // the group must be the placeholder of this slot's own candidate
                        let own = group.is_some_and(|g| string.start_token.get(g.start()) == Some(&candidate.start));
                        if !own {
                            continue 'matches;
                        }
                        scores.push(candidate.set.score());
                        set.add_features(&candidate.set);
                    }
                }
            }
            set.set_score(pattern.common.scoring.combine(&scores, pattern.score()));
            results.push(set);
            if !multi {
                break;
            }
        }
        Ok(())
    }
}

/// Whether the mention is the outermost mention sharing its head.
fn is_top_mention(st: &SentenceTheory, mention: MentionId) -> bool {
    let node = st.mention(mention).node;
    let has_mention = |n: NodeId| st.mentions.iter().any(|m| m.node == n);
    let mut top = node;
    while let Some(parent) = st.parse.node(top).parent.filter(|p| has_mention(*p)) {
        top = parent;
    }
    st.parse.head_preterm(top) == st.parse.head_preterm(node)
}

fn overlapping(chosen: &[(usize, &Candidate)]) -> bool {
    chosen.iter().enumerate().any(|(i, (_, a))| {
        chosen[i + 1..]
            .iter()
            .any(|(_, b)| a.start <= b.end && b.start <= a.end)
    })
}

/// Step to the next combination of candidates, false once all were visited.
fn advance(choice: &mut [usize], candidates: &[(usize, Vec<Candidate>)]) -> bool {
    for (c, (_, found)) in choice.iter_mut().zip(candidates).rev() {
        *c += 1;
        if *c < found.len() {
            return true;
        }
        *c = 0;
    }
    false
}

#[cfg(test)]
mod test {
    use crate::features::FeatureKind;
    use crate::matcher::{MatchConfig, PatternMatcher};
    use crate::pattern::PatternKind;
    use crate::pattern_set::{LoadOptions, PatternSet};
    use crate::theory::{DocTheory, Mention, MentionType, SentenceTheory};

    fn document() -> DocTheory {
        let mut doc = DocTheory::new("doc");
        let mut st = SentenceTheory::from_treebank(
            0,
            "(S (NP (DT the) (NN president)) (PP (IN of) (NP (NNP France))) (VP (VBD resigned)))",
        )
        .unwrap();
        let np = st.parse.find("NP", 0, 1).unwrap();
        st.add_mention(Mention::new(np, MentionType::Desc, "PER"));
        let france = st.parse.find("NP", 3, 3).unwrap();
        st.add_mention(Mention::new(france, MentionType::Name, "GPE"));
        doc.add_sentence(st);
        doc
    }

    fn spans(set: &crate::features::PatternFeatureSet) -> Vec<(usize, usize)> {
        set.features()
            .iter()
            .filter_map(|f| match f.kind {
                FeatureKind::TokenSpan { start, end, .. } if !f.is_return() => Some((start, end)),
                _ => None,
            })
            .collect()
    }

    fn first_match(text: &str) -> Option<crate::features::PatternFeatureSet> {
        let doc = document();
        let set = PatternSet::from_str(text, &LoadOptions::default()).unwrap();
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        matcher.match_sentence(set.top_level()[0], 0).unwrap()
    }

    #[test]
    fn regex_offset_test() {
        let spaced = first_match("(s (toplevel (regex (re (text (string of France))))))").unwrap();
        assert_eq!(spans(&spaced), vec![(2, 3)]);
        let unspaced =
            first_match("(s (toplevel (regex DONT_ADD_SPACES (re (text (string of)) (text (string \" France\"))))))")
                .unwrap();
        assert_eq!(spans(&unspaced), vec![(2, 3)]);
        let single = first_match("(s (toplevel (regex (re (text \"resigned\")))))").unwrap();
        assert_eq!(spans(&single), vec![(4, 4)]);
        assert!(first_match("(s (toplevel (regex (re (text (string of Spain))))))").is_none());
    }

    #[test]
    fn regex_with_mentions_test() {
        let matched = first_match(
            "(s (toplevel (regex (re (mention (acetype PER)) (text (string of)) (mention (acetype GPE) (return COUNTRY))))))",
        )
        .unwrap();
        assert_eq!(spans(&matched)[0], (0, 3));
        assert_eq!(matched.returns().count(), 1);

        let full_extent = first_match(
            "(s (toplevel (regex MATCH_FULL_EXTENT (re (text (string \"the president of France resigned\"))))))",
        );
        assert!(full_extent.is_some());
        assert!(first_match("(s (toplevel (regex MATCH_FULL_EXTENT (re (text (string \"of France\"))))))").is_none());
    }

    #[test]
    fn multi_match_test() {
        let doc = document();
        let set = PatternSet::from_str("(s (toplevel (regex (re (mention)))))", &LoadOptions::default()).unwrap();
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        // both mentions plus the head of "the president"
        assert_eq!(matcher.multi_match_sentence(set.top_level()[0], 0).unwrap().len(), 3);

        let set =
            PatternSet::from_str("(s (toplevel (regex DONT_ALLOW_HEADS (re (mention)))))", &LoadOptions::default())
                .unwrap();
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        assert_eq!(matcher.multi_match_sentence(set.top_level()[0], 0).unwrap().len(), 2);
    }

    #[test]
    fn text_pattern_test() {
        let set = PatternSet::from_str("(s (toplevel (regex (re (text RAW_TEXT (string \"a (b\"))))))", &LoadOptions::default())
            .unwrap();
        let PatternKind::Regex(regex) = &set.bank().get(set.top_level()[0]).kind else {
            panic!("expected a regex pattern");
        };
        assert!(regex.compiled.as_ref().unwrap().source().contains("a \\(b"));
        assert!(PatternSet::from_str("(s (toplevel (regex (re (text (string \"a (b\"))))))", &LoadOptions::default()).is_err());
        assert!(PatternSet::from_str("(s (toplevel (regex)))", &LoadOptions::default()).is_err());
        assert!(PatternSet::from_str("(s (toplevel (regex (re (vprop)))))", &LoadOptions::default()).is_err());
    }
}
