//! ## Combination Patterns
//! `all-of`, `any-of` and `none-of` combine member patterns of one uniform capability. Which
//! capability that is only becomes known once shortcuts are resolved, resolution then records
//! it as the pattern's [MemberCapability] and matching dispatches on it.
//!
//! Members are always tried in declared order: `all-of` stops at the first member that fails,
//! `none-of` at the first member that matches and a `GREEDY` `any-of` at the first member that
//! matches.

use log::trace;

use crate::error::{PatternError, Result};
use crate::features::{FeatureKind, PatternFeatureSet};
use crate::matcher::{PatternMatcher, merge_matches};
use crate::pattern::{Capability, ParseContext, Pattern, PatternBank, PatternId, PatternKind, PatternParser};
use crate::pretty_print::dump;
use crate::prop_status::PropStatusManager;
use crate::sexp::Sexp;
use crate::theory::{
    Argument, ArgumentValue, EventId, MEMBER_ROLE, MentionId, MentionType, NodeId, PredicateType, PropId,
    REF_ROLE, RelationId, ValueMentionId,
};

/// Role under which the whole of a partitive is attached to its noun proposition.
const PARTITIVE_ROLE: &str = "of";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinationType {
    AllOf,
    AnyOf,
    NoneOf,
}

impl CombinationType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "all-of" => Some(CombinationType::AllOf),
            "any-of" => Some(CombinationType::AnyOf),
            "none-of" => Some(CombinationType::NoneOf),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CombinationType::AllOf => "all-of",
            CombinationType::AnyOf => "any-of",
            CombinationType::NoneOf => "none-of",
        }
    }
}

/// The capability every member of a combination shares. Checked in declaration order: the
/// first capability all members support wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberCapability {
    Prop,
    Event,
    Relation,
    Mention,
    Argument,
    ArgumentValue,
    ParseNode,
}

impl MemberCapability {
    pub const ALL: [MemberCapability; 7] = [
        MemberCapability::Prop,
        MemberCapability::Event,
        MemberCapability::Relation,
        MemberCapability::Mention,
        MemberCapability::Argument,
        MemberCapability::ArgumentValue,
        MemberCapability::ParseNode,
    ];

    /// The capability a member must have.
    pub fn required(&self) -> Capability {
        match self {
            MemberCapability::Prop => Capability::Prop,
            MemberCapability::Event => Capability::EventMention,
            MemberCapability::Relation => Capability::RelMention,
            MemberCapability::Mention => Capability::Mention,
            MemberCapability::Argument => Capability::Argument,
            MemberCapability::ArgumentValue => Capability::ArgumentValue,
            MemberCapability::ParseNode => Capability::ParseNode,
        }
    }

    /// The capabilities of a combination specialized to this member capability.
    pub fn capabilities(&self) -> &'static [Capability] {
        use Capability::*;
        match self {
            MemberCapability::Prop => &[Sentence, Prop, ArgumentValue],
            MemberCapability::Event => &[Sentence, EventMention, ArgumentValue, Mention],
            MemberCapability::Relation => &[Sentence, RelMention],
            MemberCapability::Mention => &[Sentence, Mention, ArgumentValue, ParseNode],
            MemberCapability::Argument => &[Argument, MentionAndRole, ValueMentionAndRole],
            MemberCapability::ArgumentValue => &[Sentence, ArgumentValue],
            MemberCapability::ParseNode => &[Sentence, ParseNode],
        }
    }

    /// The first capability shared by all `members`.
    pub fn of_members(bank: &PatternBank, members: &[PatternId]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|cap| members.iter().all(|m| bank.supports(*m, cap.required())))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CombinationPattern {
    pub combination_type: CombinationType,
    pub members: Vec<PatternId>,
    pub greedy: bool,
    /// Status overrides handed down to proposition members.
    pub psm: Option<PropStatusManager>,
    /// Set by resolution.
    pub capability: Option<MemberCapability>,
}

impl CombinationPattern {
    pub fn new(combination_type: CombinationType) -> Self {
        Self {
            combination_type,
            members: Vec::new(),
            greedy: false,
            psm: None,
            capability: None,
        }
    }
}

impl PatternParser for CombinationPattern {
    const TYPE_NAME: &'static str = "CombinationPattern";

    fn init_atom(&mut self, atom: &str, _ctx: &mut ParseContext) -> Result<bool> {
        if atom == "GREEDY" {
            self.greedy = true;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn init_subexpression(&mut self, sexp: &Sexp, ctx: &mut ParseContext) -> Result<bool> {
        match sexp.head() {
            Some("members") => {
                for child in sexp.children()?.iter().skip(1) {
                    self.members.push(ctx.parse(child)?);
                }
            }
            Some("psm") => {
                if self.psm.is_some() {
                    return Err(PatternError::parse(
                        Self::TYPE_NAME,
                        "Cannot specify more than one psm (PropStatusManager) per pattern",
                        sexp,
                    ));
                }
                self.psm = Some(PropStatusManager::from_sexp(sexp)?);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn finish(&mut self, _common: &crate::pattern::PatternCommon, sexp: &Sexp) -> Result<()> {
        if self.members.is_empty() {
            return Err(PatternError::parse(
                Self::TYPE_NAME,
                "no member patterns specified in CombinationPattern",
                sexp,
            ));
        }
        match (self.greedy, self.combination_type) {
            (true, CombinationType::AllOf) => Err(PatternError::parse(
                Self::TYPE_NAME,
                "GREEDY should not be used with ALL_OF patterns",
                sexp,
            )),
            (true, CombinationType::NoneOf) => Err(PatternError::parse(
                Self::TYPE_NAME,
                "GREEDY should not be used with 'not' patterns",
                sexp,
            )),
            _ => Ok(()),
        }
    }

    fn into_kind(self) -> PatternKind {
        PatternKind::Combination(self)
    }
}

impl CombinationPattern {
    fn capability(&self, pm: &PatternMatcher, pattern: &Pattern) -> Result<MemberCapability> {
        self.capability.ok_or_else(|| {
            PatternError::internal(format!(
                "combination pattern matched before shortcut resolution: {}",
                dump(pm.bank(), pattern.index)
            ))
        })
    }

    /// Try the members in order and combine their matches according to the combination type.
    fn matches_with<F>(&self, pm: &PatternMatcher, pattern: &Pattern, mut member_match: F) -> Result<Option<PatternFeatureSet>>
    where
        F: FnMut(PatternId) -> Result<Option<PatternFeatureSet>>,
    {
        let mut all = pattern.empty_feature_set(pm.language_variant());
        let mut scores = Vec::new();
        for (i, &member) in self.members.iter().enumerate() {
            match member_match(member)? {
                Some(set) => {
                    trace!("{} member {i} of {} has score {}", self.combination_type.name(), self.members.len(), set.score());
                    if self.combination_type == CombinationType::NoneOf {
                        return Ok(None);
                    }
                    all.add_features(&set);
                    scores.push(set.score());
                    if self.combination_type == CombinationType::AnyOf && self.greedy {
                        break;
                    }
                }
                None => {
                    trace!("{} member {i} of {} had no match", self.combination_type.name(), self.members.len());
                    if self.combination_type == CombinationType::AllOf {
                        return Ok(None);
                    }
                }
            }
        }
        if scores.is_empty() && self.combination_type != CombinationType::NoneOf {
            return Ok(None);
        }
        all.set_score(pattern.common.scoring.combine(&scores, pattern.score()));
        Ok(Some(all))
    }

    /// Members may only fall through when the caller allows it and this is not an `all-of`.
    fn member_fall_through(&self, fall_through: bool) -> bool {
        fall_through && self.combination_type != CombinationType::AllOf
    }

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
        let st = pm.doc().sentence(sentence);
        let mut matches = Vec::new();
        match self.capability(pm, pattern)? {
            MemberCapability::Prop => {
                for prop in st.prop_ids() {
                    // children get their own chance
                    matches.extend(self.matches_prop(pm, pattern, sentence, prop, false, self.psm.as_ref())?);
                }
            }
            MemberCapability::Event => {
                for event in (0..st.events.len()).map(EventId) {
                    matches.extend(self.matches_event(pm, pattern, sentence, event)?);
                }
            }
            MemberCapability::Relation => {
                for relation in (0..st.relations.len()).map(RelationId) {
                    matches.extend(self.matches_relation(pm, pattern, sentence, relation)?);
                }
            }
            MemberCapability::Mention => {
                for mention in st.mention_ids() {
                    matches.extend(self.matches_mention(pm, pattern, sentence, mention, false)?);
                }
            }
            MemberCapability::ParseNode => {
                for node in st.parse.node_ids().filter(|n| !st.parse.is_terminal(*n)) {
                    matches.extend(self.matches_parse_node(pm, pattern, sentence, node)?);
                }
            }
            MemberCapability::ArgumentValue => {
                matches = self.multi_matches_argument_values(pm, pattern, sentence)?;
            }
            MemberCapability::Argument => {
                return Err(PatternError::internal(format!(
                    "argument combination may not be matched against a sentence: {}",
                    dump(pm.bank(), pattern.index)
                )));
            }
        }
        Ok(matches)
    }

    /// Sentence matching of a mixed mention and proposition combination: every mention is
    /// offered to mention members directly and to proposition members through its definition.
    fn multi_matches_argument_values(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
    ) -> Result<Vec<PatternFeatureSet>> {
        let bank = pm.bank();
        let st = pm.doc().sentence(sentence);

        let mut submatches = Vec::with_capacity(self.members.len());
        for &member in &self.members {
            let nested = matches!(
                &bank.get(member).kind,
                PatternKind::Combination(c) if c.capability == Some(MemberCapability::ArgumentValue)
            );
            submatches.push(if nested {
                pm.multi_match_sentence(member, sentence)?
            } else {
                Vec::new()
            });
        }

        let mut matches = Vec::new();
        for mention in st.mention_ids() {
            let definition = st.definition(mention);
            let mut mention_matches = Vec::new();
            for (&member, member_submatches) in self.members.iter().zip(&submatches) {
                let member_match = match &bank.get(member).kind {
                    PatternKind::Mention(_) => pm.match_mention(member, sentence, mention, false)?,
                    PatternKind::Combination(c) if c.capability == Some(MemberCapability::Mention) => {
                        pm.match_mention(member, sentence, mention, false)?
                    }
                    PatternKind::Prop(_) => match definition {
                        Some(prop) => pm.match_prop(member, sentence, prop, false, None)?,
                        None => None,
                    },
                    PatternKind::Combination(c) if c.capability == Some(MemberCapability::Prop) => match definition {
                        Some(prop) => pm.match_prop(member, sentence, prop, false, None)?,
                        None => None,
                    },
                    PatternKind::Combination(c) if c.capability == Some(MemberCapability::ArgumentValue) => {
                        member_submatches
                            .iter()
                            .find(|set| {
                                set.features().iter().any(|f| match f.kind {
                                    FeatureKind::Mention { mention: m, .. } => m == mention,
                                    FeatureKind::Proposition { prop, .. } => Some(prop) == definition,
                                    _ => false,
                                })
                            })
                            .cloned()
                    }
                    _ => {
                        return Err(PatternError::config(
                            "an argument value combination matching a sentence can only contain mention patterns, proposition patterns or combinations thereof",
                            dump(bank, pattern.index),
                        ));
                    }
                };
                mention_matches.extend(member_match);
            }

            match self.combination_type {
                CombinationType::AllOf if mention_matches.len() == self.members.len() => {
                    let mut combined = pattern.empty_feature_set(pm.language_variant());
                    for set in &mention_matches {
                        combined.add_features(set);
                    }
                    matches.push(combined);
                }
                CombinationType::AnyOf => matches.extend(mention_matches),
                _ => {}
            }
        }
        Ok(matches)
    }

    pub fn matches_prop(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        prop_id: PropId,
        fall_through: bool,
        overrides: Option<&PropStatusManager>,
    ) -> Result<Option<PatternFeatureSet>> {
        let overrides = overrides.or(self.psm.as_ref());
        let st = pm.doc().sentence(sentence);
        let prop = st.proposition(prop_id);

        if matches!(prop.pred_type, PredicateType::Comp | PredicateType::Set) {
            let whole = self.matches_with(pm, pattern, |m| pm.match_prop(m, sentence, prop_id, false, overrides))?;
            if whole.is_some() || !fall_through {
                return Ok(whole);
            }
            let mut members = Vec::new();
            for arg in prop.args.iter().filter(|a| a.role == MEMBER_ROLE) {
                let member_prop = match arg.value {
                    ArgumentValue::Mention(m) => st.definition(m),
                    ArgumentValue::Proposition(p) => Some(p),
                    ArgumentValue::Text(_) => None,
                };
                if let Some(member_prop) = member_prop {
                    members.extend(self.matches_prop(pm, pattern, sentence, member_prop, true, overrides)?);
                }
            }
            return Ok(merge_matches(members));
        }

        let member_ft = self.member_fall_through(fall_through);
        let result = self.matches_with(pm, pattern, |m| pm.match_prop(m, sentence, prop_id, member_ft, overrides))?;
        if result.is_some() || !fall_through {
            return Ok(result);
        }
        // a partitive referent falls through to its whole
        if let Some(reference) = prop.ref_mention() {
            let mention = st.mention(reference);
            if mention.mention_type == MentionType::Part {
                if let Some(definition) = mention.child.and_then(|c| st.definition(c)) {
                    return self.matches_prop(pm, pattern, sentence, definition, true, overrides);
                }
            }
        }
        Ok(None)
    }

    pub fn matches_mention(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        mention: MentionId,
        fall_through: bool,
    ) -> Result<Option<PatternFeatureSet>> {
        if self.capability(pm, pattern)? == MemberCapability::Event {
            let member_ft = self.member_fall_through(fall_through);
            return self.matches_with(pm, pattern, |m| pm.match_mention(m, sentence, mention, member_ft));
        }

        let fall_through = fall_through && pm.bank().allows_fall_through(pattern.index);
        let st = pm.doc().sentence(sentence);
        if matches!(st.mention(mention).mention_type, MentionType::List | MentionType::Part) {
            let whole = self.matches_with(pm, pattern, |m| pm.match_mention(m, sentence, mention, false))?;
            if whole.is_some() || !fall_through {
                return Ok(whole);
            }
            let mut children = Vec::new();
            for child in st.mention_children(mention) {
                children.extend(self.matches_mention(pm, pattern, sentence, child, true)?);
            }
            return Ok(merge_matches(children));
        }
        let member_ft = self.member_fall_through(fall_through);
        self.matches_with(pm, pattern, |m| pm.match_mention(m, sentence, mention, member_ft))
    }

    pub fn matches_argument(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        arg: &Argument,
        fall_through: bool,
    ) -> Result<Option<PatternFeatureSet>> {
        let member_ft = self.member_fall_through(fall_through) && arg.role != REF_ROLE;
        self.matches_with(pm, pattern, |m| pm.match_argument(m, sentence, arg, member_ft))
    }

    pub fn matches_argument_value(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        arg: &Argument,
        fall_through: bool,
        overrides: Option<&PropStatusManager>,
    ) -> Result<Option<PatternFeatureSet>> {
        let st = pm.doc().sentence(sentence);
        match self.capability(pm, pattern)? {
            MemberCapability::Prop => {
                let fall_through = fall_through && arg.role != REF_ROLE;
                match st.argument_proposition(arg) {
                    Some(prop) => self.matches_prop(pm, pattern, sentence, prop, fall_through, overrides),
                    None => Ok(None),
                }
            }
            MemberCapability::Mention => match arg.value {
                ArgumentValue::Mention(mention) => {
                    let fall_through = fall_through && arg.role != REF_ROLE;
                    self.matches_mention(pm, pattern, sentence, mention, fall_through)
                }
                _ => Ok(None),
            },
            MemberCapability::ArgumentValue => {
                self.matches_compound_argument_value(pm, pattern, sentence, arg, fall_through, overrides)
            }
            _ => {
                let member_ft = self.member_fall_through(fall_through) && arg.role != REF_ROLE;
                self.matches_with(pm, pattern, |m| pm.match_argument_value(m, sentence, arg, member_ft, overrides))
            }
        }
    }

    /// Argument value matching over mixed members, falling through set, comparative, list and
    /// partitive arguments to their children.
    fn matches_compound_argument_value(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        arg: &Argument,
        fall_through: bool,
        overrides: Option<&PropStatusManager>,
    ) -> Result<Option<PatternFeatureSet>> {
        let overrides = overrides.or(self.psm.as_ref());
        let fall_through =
            fall_through && arg.role != REF_ROLE && pm.bank().allows_fall_through(pattern.index);
        let st = pm.doc().sentence(sentence);
        let as_is = |ft: bool| self.matches_with(pm, pattern, |m| pm.match_argument_value(m, sentence, arg, ft, overrides));

        match arg.value {
            ArgumentValue::Proposition(prop_id) => {
                let prop = st.proposition(prop_id);
                if matches!(prop.pred_type, PredicateType::Comp | PredicateType::Set) {
                    let whole = as_is(false)?;
                    if whole.is_some() || !fall_through {
                        return Ok(whole);
                    }
                    return self.matches_children(pm, pattern, sentence, Some(prop_id), MEMBER_ROLE, overrides);
                }
                let result = as_is(self.member_fall_through(fall_through))?;
                if result.is_some() || !fall_through {
                    return Ok(result);
                }
                if prop.pred_type == PredicateType::Noun {
                    if let Some(reference) = prop.ref_mention() {
                        let mention = st.mention(reference);
                        if mention.mention_type == MentionType::Part && mention.child.is_some() {
                            return self.matches_children(pm, pattern, sentence, Some(prop_id), PARTITIVE_ROLE, overrides);
                        }
                    }
                }
                Ok(None)
            }
            ArgumentValue::Mention(mention) => {
                let mention_type = st.mention(mention).mention_type;
                if matches!(mention_type, MentionType::List | MentionType::Part) {
                    let whole = as_is(false)?;
                    if whole.is_some() || !fall_through {
                        return Ok(whole);
                    }
                    let role = if mention_type == MentionType::List {
                        MEMBER_ROLE
                    } else {
                        PARTITIVE_ROLE
                    };
                    return self.matches_children(pm, pattern, sentence, st.definition(mention), role, overrides);
                }
                as_is(self.member_fall_through(fall_through))
            }
            ArgumentValue::Text(_) => Ok(None),
        }
    }

    fn matches_children(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        compound: Option<PropId>,
        role: &str,
        overrides: Option<&PropStatusManager>,
    ) -> Result<Option<PatternFeatureSet>> {
        let Some(compound) = compound else {
            return Ok(None);
        };
        let st = pm.doc().sentence(sentence);
        let mut children = Vec::new();
        for child in st.proposition(compound).args.iter().filter(|a| a.role == role) {
            let fall_through = !st.argument_has_cycle(compound, child);
            children.extend(self.matches_compound_argument_value(pm, pattern, sentence, child, fall_through, overrides)?);
        }
        Ok(merge_matches(children))
    }

    pub fn matches_mention_and_role(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        role: &str,
        mention: MentionId,
        fall_through: bool,
    ) -> Result<Option<PatternFeatureSet>> {
        let fall_through = fall_through && role != REF_ROLE && pm.bank().allows_fall_through(pattern.index);
        let st = pm.doc().sentence(sentence);
        if matches!(st.mention(mention).mention_type, MentionType::List | MentionType::Part) {
            let whole =
                self.matches_with(pm, pattern, |m| pm.match_mention_and_role(m, sentence, role, mention, false))?;
            if whole.is_some() || !fall_through {
                return Ok(whole);
            }
            let mut children = Vec::new();
            for child in st.mention_children(mention) {
                children.extend(self.matches_mention_and_role(pm, pattern, sentence, role, child, true)?);
            }
            return Ok(merge_matches(children));
        }
        let member_ft = self.member_fall_through(fall_through);
        self.matches_with(pm, pattern, |m| pm.match_mention_and_role(m, sentence, role, mention, member_ft))
    }

    pub fn matches_value_mention_and_role(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        role: &str,
        value_mention: ValueMentionId,
    ) -> Result<Option<PatternFeatureSet>> {
        self.matches_with(pm, pattern, |m| pm.match_value_mention_and_role(m, sentence, role, value_mention))
    }

    pub fn matches_event(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        event: EventId,
    ) -> Result<Option<PatternFeatureSet>> {
        self.matches_with(pm, pattern, |m| pm.match_event(m, sentence, event))
    }

    pub fn matches_relation(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        relation: RelationId,
    ) -> Result<Option<PatternFeatureSet>> {
        self.matches_with(pm, pattern, |m| pm.match_relation(m, sentence, relation))
    }

    pub fn matches_parse_node(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        node: NodeId,
    ) -> Result<Option<PatternFeatureSet>> {
        self.matches_with(pm, pattern, |m| pm.match_parse_node(m, sentence, node))
    }
}

#[cfg(test)]
mod test {
    use crate::combination::MemberCapability;
    use crate::matcher::{MatchConfig, PatternMatcher};
    use crate::pattern::PatternKind;
    use crate::pattern_set::{LoadOptions, PatternSet};
    use crate::error::PatternError;
    use crate::theory::{
        Argument, DocTheory, Mention, MentionId, MentionType, PredicateType, PropId, Proposition, SUB_ROLE,
        SentenceTheory,
    };

    /// "the president spoke" with a single PER mention.
    fn document() -> (DocTheory, MentionId) {
        let mut doc = DocTheory::new("doc");
        let mut st = SentenceTheory::from_treebank(0, "(S (NP (DT the) (NN president)) (VP (VBD spoke)))").unwrap();
        let node = st.parse.find("NP", 0, 1).unwrap();
        let president = st.add_mention(Mention::new(node, MentionType::Desc, "PER"));
        doc.add_sentence(st);
        (doc, president)
    }

    /// `A` always matches with score 0.5, `B` never matches.
    fn combination(head: &str) -> String {
        format!(
            "(s (reference (mention (shortcut A) (score 0.5)) (mention (shortcut B) (acetype ORG))) \
                (toplevel ({head} (members A B))))"
        )
    }

    #[test]
    fn combination_semantics_test() {
        let (doc, president) = document();
        let expectations = [("all-of", None), ("any-of", Some(0.5)), ("none-of", None)];
        for (head, expected) in expectations {
            let set = PatternSet::from_str(&combination(head), &LoadOptions::default()).unwrap();
            let id = set.top_level()[0];
            let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
            let matched = matcher.match_mention(id, 0, president, false).unwrap();
            assert_eq!(matched.map(|m| m.score()), expected, "{head}");
        }

        let none = PatternSet::from_str(
            "(s (reference (mention (shortcut B) (acetype ORG))) (toplevel (none-of (score 0.3) (members B))))",
            &LoadOptions::default(),
        )
        .unwrap();
        let matcher = PatternMatcher::new(&doc, &none, MatchConfig::default()).unwrap();
        let matched = matcher.match_mention(none.top_level()[0], 0, president, false).unwrap().unwrap();
        assert_eq!(matched.score(), 0.3);
    }

    #[test]
    fn greedy_any_of_test() {
        let (doc, president) = document();
        let set = PatternSet::from_str(
            "(s (toplevel (any-of GREEDY (members (mention (id first) (score 0.2)) (mention (id second) (score 0.9))))))",
            &LoadOptions::default(),
        )
        .unwrap();
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        let matched = matcher.match_mention(set.top_level()[0], 0, president, false).unwrap().unwrap();
        assert_eq!(matched.score(), 0.2);
        assert_eq!(matched.top_level_label(), Some("first"));
    }

    #[test]
    fn combination_errors_test() {
        let bad = [
            "(s (toplevel (all-of)))",
            "(s (toplevel (all-of GREEDY (members (mention)))))",
            "(s (toplevel (none-of GREEDY (members (mention)))))",
            "(s (toplevel (any-of (psm NEGATIVE) (psm IF) (members (vprop)))))",
            "(s (toplevel (any-of (members (mention) (relation)))))",
        ];
        for text in bad {
            assert!(PatternSet::from_str(text, &LoadOptions::default()).is_err(), "{text}");
        }
    }

    #[test]
    fn specialization_test() {
        let cases = [
            ("(any-of (members (mention) (mention)))", MemberCapability::Mention),
            ("(any-of (members (vprop) (nprop)))", MemberCapability::Prop),
            ("(any-of (members (mention) (vprop)))", MemberCapability::ArgumentValue),
            ("(all-of (members (argument (role <sub>)) (argument (role <obj>))))", MemberCapability::Argument),
            ("(any-of (members (event) (event)))", MemberCapability::Event),
            ("(any-of (members (parse-node (tag NP)) (mention)))", MemberCapability::ParseNode),
        ];
        for (pattern, expected) in cases {
            let set = PatternSet::from_str(&format!("(s (toplevel {pattern}))"), &LoadOptions::default()).unwrap();
            let PatternKind::Combination(c) = &set.bank().get(set.top_level()[0]).kind else {
                panic!("expected a combination");
            };
            assert_eq!(c.capability, Some(expected), "{pattern}");
        }
    }

    /// "Bob hit": a verb proposition with a subject.
    fn verb_document() -> (DocTheory, PropId) {
        let mut doc = DocTheory::new("doc");
        let mut st = SentenceTheory::from_treebank(0, "(S (NP (NNP Bob)) (VP (VBD hit)))").unwrap();
        let bob_node = st.parse.find("NP", 0, 0).unwrap();
        let hit = st.parse.preterminal(1).unwrap();
        let bob = st.add_mention(Mention::new(bob_node, MentionType::Name, "PER"));
        let verb = st.add_proposition(Proposition::new(
            PredicateType::Verb,
            Some(hit),
            vec![Argument::mention(SUB_ROLE, bob)],
        ));
        doc.add_sentence(st);
        (doc, verb)
    }

    #[test]
    fn all_of_stops_at_first_failure_test() {
        let (doc, verb) = verb_document();
        // HIT needs an argument assignment, which a zero argument bound turns into an error
        let config = || MatchConfig {
            max_solver_arguments: 0,
            ..MatchConfig::default()
        };
        let run = |members: &str, head: &str| {
            let set = PatternSet::from_str(
                &format!(
                    "(s (reference (vprop (shortcut KICK) (predicate kicked)) \
                        (vprop (shortcut HIT) (predicate hit) (args (argument (role sub) (mention))))) \
                        (toplevel ({head} (members {members}))))"
                ),
                &LoadOptions::default(),
            )
            .unwrap();
            let matcher = PatternMatcher::new(&doc, &set, config()).unwrap();
            matcher.match_prop(set.top_level()[0], 0, verb, false, None)
        };

        assert!(run("KICK HIT", "all-of").unwrap().is_none());
        assert!(matches!(run("HIT KICK", "all-of"), Err(PatternError::Limit(_))));
        assert!(matches!(run("KICK HIT", "any-of"), Err(PatternError::Limit(_))));
    }
}

