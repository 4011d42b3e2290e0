//! ## Mention Patterns
//! A [MentionPattern] constrains a single mention: its entity type, mention type, head word,
//! the entity it belongs to and the propositions around it. LIST and PART mentions that fail as
//! a whole are retried through their children unless `BLOCK_FALL_THROUGH` is set.

use std::collections::BTreeSet;

use crate::error::{PatternError, Result};
use crate::features::{FeatureKind, PatternFeatureSet};
use crate::matcher::{PatternMatcher, merge_matches};
use crate::pattern::{ParseContext, Pattern, PatternId, PatternKind, PatternParser};
use crate::sexp::{Sexp, unquote};
use crate::theory::{
    Argument, ArgumentValue, EntityId, MentionId, MentionType, MentionUid, NodeId, REF_ROLE,
};
use crate::word_set::{WordList, symbol_list_from_sexp, symbols_from_sexp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl ComparisonOp {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "==" => Some(ComparisonOp::Eq),
            "!=" => Some(ComparisonOp::Ne),
            "<" => Some(ComparisonOp::Lt),
            "<=" => Some(ComparisonOp::Le),
            ">" => Some(ComparisonOp::Gt),
            ">=" => Some(ComparisonOp::Ge),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "==",
            ComparisonOp::Ne => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
        }
    }

    pub fn holds(&self, actual: i64, expected: i64) -> bool {
        match self {
            ComparisonOp::Eq => actual == expected,
            ComparisonOp::Ne => actual != expected,
            ComparisonOp::Lt => actual < expected,
            ComparisonOp::Le => actual <= expected,
            ComparisonOp::Gt => actual > expected,
            ComparisonOp::Ge => actual >= expected,
        }
    }
}

/// Counts entities of the mention's type, in the whole document or in the mention's sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyScope {
    Document,
    Sentence,
}

impl FrequencyScope {
    pub fn name(&self) -> &'static str {
        match self {
            FrequencyScope::Document => "doc_etype_freq",
            FrequencyScope::Sentence => "sent_etype_freq",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonConstraint {
    pub scope: FrequencyScope,
    pub op: ComparisonOp,
    pub value: i64,
}

/// `(arg-of-prop [(role R ...)] PROP)`: the mention fills one of `roles` in a proposition
/// matching `prop`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgOfProp {
    pub roles: BTreeSet<String>,
    pub prop: PatternId,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MentionPattern {
    pub acetypes: BTreeSet<String>,
    pub acesubtypes: BTreeSet<String>,
    pub blocked_acetypes: BTreeSet<String>,
    pub mention_types: Vec<MentionType>,
    pub entity_labels: Vec<String>,
    pub blocking_entity_labels: Vec<String>,
    pub headwords: WordList,
    pub blocked_headwords: WordList,
    pub comparisons: Vec<ComparisonConstraint>,
    /// Bit string, a trailing `*` makes it a prefix.
    pub brown_cluster: Option<String>,
    pub regex: Option<PatternId>,
    pub head_regex: bool,
    pub prop_def: Option<PatternId>,
    pub arg_of_props: Vec<ArgOfProp>,
    pub is_focus: bool,
    pub is_specific: bool,
    pub is_generic: bool,
    pub is_appositive: bool,
    pub is_appositive_child: bool,
    pub is_named_appositive_child: bool,
    pub requires_name: bool,
    pub requires_name_or_desc: bool,
    pub block_fall_through: bool,
}

impl PatternParser for MentionPattern {
    const TYPE_NAME: &'static str = "MentionPattern";

    fn init_atom(&mut self, atom: &str, _ctx: &mut ParseContext) -> Result<bool> {
        match atom {
            "FOCUS" => self.is_focus = true,
            "SPECIFIC" => self.is_specific = true,
            "GENERIC" => self.is_generic = true,
            "APPOSITIVE" => self.is_appositive = true,
            "APPOSITIVE_CHILD" => self.is_appositive_child = true,
            "NAMED_APPOSITIVE_CHILD" => self.is_named_appositive_child = true,
            "BLOCK_FALL_THROUGH" => self.block_fall_through = true,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn init_subexpression(&mut self, sexp: &Sexp, ctx: &mut ParseContext) -> Result<bool> {
        let Some(head) = sexp.head() else {
            return Ok(false);
        };
        let err = |reason: &str| PatternError::parse(Self::TYPE_NAME, reason, sexp);
        match head {
            "acetype" => self.acetypes.extend(symbols_from_sexp(sexp)?),
            "acesubtype" => self.acesubtypes.extend(symbols_from_sexp(sexp)?),
            "block_acetype" => self.blocked_acetypes.extend(symbols_from_sexp(sexp)?),
            "mentiontype" => {
                for name in symbol_list_from_sexp(sexp)? {
                    let mention_type =
                        MentionType::from_name(&name).ok_or_else(|| err("unknown mention type"))?;
                    if !self.mention_types.contains(&mention_type) {
                        self.mention_types.push(mention_type);
                    }
                }
            }
            "doc_etype_freq" | "sent_etype_freq" => {
                let [_, op, value] = sexp.children()? else {
                    return Err(err("comparison constraints must have three atomic children"));
                };
                let (Some(op), Some(value)) = (op.value(), value.value()) else {
                    return Err(err("comparison constraints must have three atomic children"));
                };
                let op = ComparisonOp::from_name(op)
                    .ok_or_else(|| err("comparison operator must be ==, !=, <, >, <=, or >="))?;
                let value = value
                    .parse()
                    .map_err(|_| err("comparison value must be an integer"))?;
                let scope = if head == "doc_etype_freq" {
                    FrequencyScope::Document
                } else {
                    FrequencyScope::Sentence
                };
                self.comparisons.push(ComparisonConstraint { scope, op, value });
            }
            "min-entitylevel" => match sexp.nth_child(1)?.value() {
                Some("NAME") => self.requires_name = true,
                Some("DESC") => self.requires_name_or_desc = true,
                _ => return Err(err("min-entitylevel must be NAME or DESC")),
            },
            "entitylabel" | "block" => {
                let labels = sexp.children()?.iter().skip(1).map(|child| {
                    let label = child.value().ok_or_else(|| err("entity labels must be atoms"))?;
                    if !ctx.entity_labels.contains(label) {
                        return Err(err("unrecognized entity label"));
                    }
                    Ok(label.to_string())
                });
                let labels = labels.collect::<Result<Vec<_>>>()?;
                if head == "entitylabel" {
                    self.entity_labels.extend(labels);
                } else {
                    self.blocking_entity_labels.extend(labels);
                }
            }
            "headword" => self.headwords.extend_from_sexp(sexp, ctx.word_sets)?,
            "block_headword" => self.blocked_headwords.extend_from_sexp(sexp, ctx.word_sets)?,
            "regex" | "head-regex" => {
                if self.regex.is_some() {
                    return Err(err("more than one regex in MentionPattern"));
                }
                let id = ctx.parse(sexp.nth_child(1)?)?;
                if !matches!(ctx.bank.get(id).kind, PatternKind::Regex(_) | PatternKind::Shortcut(_)) {
                    return Err(err("Expected a regexp pattern"));
                }
                self.regex = Some(id);
                self.head_regex = head == "head-regex";
            }
            "prop-def" => {
                if self.prop_def.is_some() {
                    return Err(err("more than one prop-def in MentionPattern"));
                }
                self.prop_def = Some(ctx.parse(sexp.nth_child(1)?)?);
            }
            "arg-of-prop" => {
                let syntax = "arg-of-prop syntax: (arg-of-prop [(role ...)] (prop ...))";
                let constraint = match sexp.children()? {
                    [_, prop] => ArgOfProp {
                        roles: BTreeSet::new(),
                        prop: ctx.parse(prop)?,
                    },
                    [_, roles, prop] if roles.head() == Some("role") => ArgOfProp {
                        roles: symbols_from_sexp(roles)?
                            .iter()
                            .map(|r| crate::argument_pattern::canonical_role(r))
                            .collect(),
                        prop: ctx.parse(prop)?,
                    },
                    _ => return Err(err(syntax)),
                };
                self.arg_of_props.push(constraint);
            }
            "brown_cluster" => {
                let bits = sexp
                    .nth_child(1)?
                    .value()
                    .map(|v| unquote(v).to_string())
                    .ok_or_else(|| err("brown_cluster takes a bit string"))?;
                if bits.trim_end_matches('*').chars().any(|c| c != '0' && c != '1') {
                    return Err(err("brown_cluster takes a bit string"));
                }
                self.brown_cluster = Some(bits);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn finish(&mut self, _common: &crate::pattern::PatternCommon, sexp: &Sexp) -> Result<()> {
        if self.is_generic && self.is_specific {
            return Err(PatternError::parse(
                Self::TYPE_NAME,
                "GENERIC and SPECIFIC cannot both be set in MentionPattern",
                sexp,
            ));
        }
        Ok(())
    }

    fn into_kind(self) -> PatternKind {
        PatternKind::Mention(self)
    }
}

impl MentionPattern {
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
        let mut matches = Vec::new();
        for mention in pm.doc().sentence(sentence).mention_ids() {
            matches.extend(self.matches_mention(pm, pattern, sentence, mention, false)?);
        }
        Ok(matches)
    }

    pub fn matches_argument_value(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        arg: &Argument,
        fall_through: bool,
    ) -> Result<Option<PatternFeatureSet>> {
        match arg.value {
            // a <ref> argument is an implicit all-of with its proposition
            ArgumentValue::Mention(mention) => {
                let fall_through = fall_through && arg.role != REF_ROLE;
                self.matches_mention(pm, pattern, sentence, mention, fall_through)
            }
            _ => Ok(None),
        }
    }

    /// Match a mention sitting on `node`, or whose head does, or with the same span.
    pub fn matches_parse_node(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        node: NodeId,
    ) -> Result<Option<PatternFeatureSet>> {
        let st = pm.doc().sentence(sentence);
        let target = st.parse.node(node);
        let span = (target.start_token, target.end_token);
        for mention in st.mention_ids() {
            let mention_node = st.mention(mention).node;
            let head = st.mention_head(mention);
            let head_node = st.parse.node(head);
            if mention_node == node
                || head == node
                || st.mention_span(mention) == span
                || (head_node.start_token, head_node.end_token) == span
            {
                if let Some(set) = self.matches_mention(pm, pattern, sentence, mention, false)? {
                    return Ok(Some(set));
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
        let doc = pm.doc();
        let st = doc.sentence(sentence);
        let m = st.mention(mention);

        if !self.block_fall_through && fall_through {
            match m.mention_type {
                MentionType::List => {
                    if let Some(set) = self.matches_mention(pm, pattern, sentence, mention, false)? {
                        return Ok(Some(set));
                    }
                    let mut members = Vec::new();
                    for child in st.mention_children(mention) {
                        members.extend(self.matches_mention(pm, pattern, sentence, child, true)?);
                    }
                    return Ok(merge_matches(members));
                }
                MentionType::Part => {
                    if let Some(set) = self.matches_mention(pm, pattern, sentence, mention, false)? {
                        return Ok(Some(set));
                    }
                    return match m.child {
                        Some(child) => self.matches_mention(pm, pattern, sentence, child, true),
                        None => Ok(None),
                    };
                }
                _ => {}
            }
        }

        if self.is_appositive && m.mention_type != MentionType::Appo {
            return Ok(None);
        }
        let parent_type = m.parent.map(|p| st.mention(p).mention_type);
        if self.is_appositive_child && parent_type != Some(MentionType::Appo) {
            return Ok(None);
        }
        if self.is_named_appositive_child {
            let Some(parent) = m.parent.filter(|_| parent_type == Some(MentionType::Appo)) else {
                return Ok(None);
            };
            let named = st
                .mention_children(parent)
                .iter()
                .any(|c| st.mention(*c).mention_type == MentionType::Name);
            if !named {
                return Ok(None);
            }
        }
        if self.blocked_acetypes.contains(&m.entity_type) {
            return Ok(None);
        }
        if !self.mention_types.is_empty() && !self.mention_types.contains(&m.mention_type) {
            return Ok(None);
        }

        let entity = doc.entity_of(MentionUid { sentence, mention });
        if let Some(entity) = entity {
            for label in &self.blocking_entity_labels {
                if pm.entity_label_match(label, entity).is_some() {
                    return Ok(None);
                }
            }
        }
        if self.requires_name || self.requires_name_or_desc || self.is_specific || self.is_generic {
            let Some(entity) = entity else {
                return Ok(None);
            };
            if self.requires_name && !doc.has_name_mention(entity) {
                return Ok(None);
            }
            if !self.requires_name && self.requires_name_or_desc && !doc.has_name_or_desc_mention(entity) {
                return Ok(None);
            }
            let generic = doc.entity(entity).generic;
            if (self.is_specific && generic) || (self.is_generic && !generic) {
                return Ok(None);
            }
        }

        let head_word = st.mention_head_word(mention);
        if !word_matches(&self.headwords, head_word, true) || word_matches(&self.blocked_headwords, head_word, false) {
            return Ok(None);
        }
        for constraint in &self.comparisons {
            let Some(entity) = entity else {
                return Ok(None);
            };
            let actual = self.entity_frequency(pm, sentence, mention, entity, constraint.scope);
            if !constraint.op.holds(actual, constraint.value) {
                return Ok(None);
            }
        }
        if let Some(bits) = &self.brown_cluster {
            let matched = match doc.word_cluster(head_word) {
                Some(cluster) => match bits.strip_suffix('*') {
                    Some(prefix) => cluster.starts_with(prefix),
                    None => cluster == bits,
                },
                None => false,
            };
            if !matched {
                return Ok(None);
            }
        }

        if self.acetypes.is_empty() && self.acesubtypes.is_empty() && self.entity_labels.is_empty() {
            return self.make_feature_set(pm, pattern, sentence, mention, None, 1.0);
        }

        let config = pm.config();
        let subtype = entity.and_then(|e| doc.entity(e).subtype.clone()).or_else(|| m.entity_subtype.clone());
        if config.force_entity_labels && !self.entity_labels.is_empty() {
            let Some(entity) = entity else {
                return Ok(None);
            };
            if !self.entity_labels.iter().all(|l| pm.entity_label_match(l, entity).is_some()) {
                return Ok(None);
            }
        }
        if config.force_entity_subtypes && !self.acesubtypes.is_empty() {
            if entity.is_none() || !subtype.as_ref().is_some_and(|s| self.acesubtypes.contains(s)) {
                return Ok(None);
            }
        }
        if config.force_entity_types && !self.acetypes.is_empty() {
            if entity.is_none() || !self.acetypes.contains(&m.entity_type) {
                return Ok(None);
            }
        }

        if self.acetypes.contains(&m.entity_type) {
            return self.make_feature_set(pm, pattern, sentence, mention, Some(m.entity_type.clone()), 1.0);
        }
        let Some(entity) = entity else {
            return Ok(None);
        };
        for label in &self.entity_labels {
            if let Some(label_match) = pm.entity_label_match(label, entity) {
                let set = self.make_feature_set(pm, pattern, sentence, mention, Some(label.clone()), 1.0)?;
                return Ok(set.map(|mut set| {
                    set.add_features(label_match);
                    set
                }));
            }
        }
        // only a determined subtype can satisfy the constraint
        if let Some(subtype) = subtype.filter(|s| self.acesubtypes.contains(s)) {
            return self.make_feature_set(pm, pattern, sentence, mention, Some(subtype), 1.0);
        }
        Ok(None)
    }

    fn entity_frequency(
        &self,
        pm: &PatternMatcher,
        sentence: usize,
        mention: MentionId,
        entity: EntityId,
        scope: FrequencyScope,
    ) -> i64 {
        let doc = pm.doc();
        match scope {
            FrequencyScope::Document => {
                let entity_type = &doc.entity(entity).entity_type;
                doc.entities.iter().filter(|e| e.entity_type == *entity_type).count() as i64
            }
            FrequencyScope::Sentence => {
                let st = doc.sentence(sentence);
                let entity_type = &st.mention(mention).entity_type;
                let entities: BTreeSet<EntityId> = st
                    .mention_ids()
                    .filter(|m| st.mention(*m).entity_type == *entity_type)
                    .filter_map(|m| doc.entity_of(MentionUid { sentence, mention: m }))
                    .collect();
                entities.len() as i64
            }
        }
    }

    fn make_feature_set(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        mention: MentionId,
        matched: Option<String>,
        confidence: f32,
    ) -> Result<Option<PatternFeatureSet>> {
        let variant = pm.language_variant();
        let kind = FeatureKind::Mention {
            sentence,
            mention,
            matched,
        };
        let mut set = PatternFeatureSet::new();
        if let Some(ret) = pattern.return_feature(kind.clone(), variant) {
            set.add_feature(ret.with_confidence(confidence));
        }
        set.add_feature(pattern.feature(kind, variant).with_confidence(confidence));
        pattern.add_id(&mut set, variant);

        if let Some(regex) = self.regex {
            let regex_match = if self.head_regex {
                pm.match_mention_head(regex, sentence, mention)?
            } else {
                pm.match_mention(regex, sentence, mention, false)?
            };
            match regex_match {
                Some(regex_match) => set.add_features(&regex_match),
                None => return Ok(None),
            }
        }

        let st = pm.doc().sentence(sentence);
        if let Some(prop_def) = self.prop_def {
            let Some(definition) = st.definition(mention) else {
                return Ok(None);
            };
            match pm.match_prop(prop_def, sentence, definition, false, None)? {
                Some(prop_match) => set.add_features(&prop_match),
                None => return Ok(None),
            }
        }

        for constraint in &self.arg_of_props {
            let mut found = false;
            for prop in st.prop_ids() {
                for arg in &st.proposition(prop).args {
                    let fills = arg.value == ArgumentValue::Mention(mention)
                        && (constraint.roles.is_empty() || constraint.roles.contains(&arg.role));
                    if !fills {
                        continue;
                    }
                    if let Some(prop_match) = pm.match_prop(constraint.prop, sentence, prop, false, None)? {
                        set.add_features(&prop_match);
                        found = true;
                    }
                }
            }
            if !found {
                return Ok(None);
            }
        }

        set.set_score(pattern.score());
        Ok(Some(set))
    }
}

fn word_matches(list: &WordList, word: &str, if_empty: bool) -> bool {
    list.matches(Some(word), if_empty) || list.matches(Some(&word.to_lowercase()), if_empty)
}

#[cfg(test)]
mod test {
    use crate::matcher::{MatchConfig, PatternMatcher};
    use crate::pattern::PatternKind;
    use crate::pattern_set::{LoadOptions, PatternSet};
    use crate::theory::{
        DocTheory, Entity, Mention, MentionId, MentionType, MentionUid, SentenceTheory,
    };

    /// "Bob and Mary left": a LIST mention over two PER names.
    fn list_document() -> (DocTheory, MentionId) {
        let mut doc = DocTheory::new("doc");
        let mut st = SentenceTheory::from_treebank(
            0,
            "(S (NP (NP (NNP Bob)) (CC and) (NP (NNP Mary))) (VP (VBD left)))",
        )
        .unwrap();
        let list_node = st.parse.find("NP", 0, 2).unwrap();
        let bob_node = st.parse.find("NP", 0, 0).unwrap();
        let mary_node = st.parse.find("NP", 2, 2).unwrap();
        let list = st.add_mention(Mention::new(list_node, MentionType::List, "PER"));
        let bob = st.add_mention(Mention::new(bob_node, MentionType::Name, "PER"));
        let mary = st.add_mention(Mention::new(mary_node, MentionType::Name, "PER"));
        st.link_children(list, &[bob, mary]);
        doc.add_sentence(st);
        doc.add_entity(Entity {
            entity_type: "PER".to_string(),
            subtype: Some("Individual".to_string()),
            generic: false,
            mentions: vec![MentionUid { sentence: 0, mention: bob }],
        });
        (doc, list)
    }

    fn load(text: &str) -> PatternSet {
        PatternSet::from_str(text, &LoadOptions::default()).unwrap()
    }

    #[test]
    fn basic_mention_parse_test() {
        let set = load(
            "(s (toplevel (mention (acetype PER ORG) (mentiontype name desc) (headword pres* leader) \
                (doc_etype_freq >= 2) (brown_cluster 10*) BLOCK_FALL_THROUGH)))",
        );
        let PatternKind::Mention(m) = &set.bank().get(set.top_level()[0]).kind else {
            panic!("expected a mention pattern");
        };
        assert!(m.acetypes.contains("ORG"));
        assert_eq!(m.mention_types, vec![MentionType::Name, MentionType::Desc]);
        assert!(m.headwords.matches(Some("president"), false));
        assert_eq!(m.comparisons.len(), 1);
        assert!(m.block_fall_through);

        let bad = [
            "(s (toplevel (mention GENERIC SPECIFIC)))",
            "(s (toplevel (mention (entitylabel UNKNOWN))))",
            "(s (toplevel (mention (doc_etype_freq ~ 2))))",
            "(s (toplevel (mention (min-entitylevel PRON))))",
            "(s (toplevel (mention (regex (mention)))))",
        ];
        for text in bad {
            assert!(PatternSet::from_str(text, &LoadOptions::default()).is_err(), "{text}");
        }
    }

    #[test]
    fn list_fall_through_test() {
        let (doc, list) = list_document();
        let set = load("(s (toplevel (mention (headword Bob))))");
        let id = set.top_level()[0];
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        assert!(matcher.match_mention(id, 0, list, false).unwrap().is_none());
        let fell = matcher.match_mention(id, 0, list, true).unwrap().unwrap();
        assert_eq!(fell.len(), 1);

        let blocked = load("(s (toplevel (mention (headword Bob) BLOCK_FALL_THROUGH)))");
        let id = blocked.top_level()[0];
        let matcher = PatternMatcher::new(&doc, &blocked, MatchConfig::default()).unwrap();
        assert!(matcher.match_mention(id, 0, list, true).unwrap().is_none());
    }

    #[test]
    fn entity_constraints_test() {
        let (doc, _) = list_document();
        let specific = load("(s (toplevel (mention (min-entitylevel NAME) SPECIFIC (acesubtype Individual))))");
        let matcher = PatternMatcher::new(&doc, &specific, MatchConfig::default()).unwrap();
        let matches = matcher.multi_match_sentence(specific.top_level()[0], 0).unwrap();
        assert_eq!(matches.len(), 1);

        let generic = load("(s (toplevel (mention GENERIC)))");
        let matcher = PatternMatcher::new(&doc, &generic, MatchConfig::default()).unwrap();
        assert!(matcher.match_sentence(generic.top_level()[0], 0).unwrap().is_none());

        let frequency = load("(s (toplevel (mention (sent_etype_freq == 1))))");
        let matcher = PatternMatcher::new(&doc, &frequency, MatchConfig::default()).unwrap();
        assert_eq!(matcher.multi_match_sentence(frequency.top_level()[0], 0).unwrap().len(), 1);
    }

    #[test]
    fn forced_entity_types_test() {
        let (doc, _) = list_document();
        let set = load("(s (toplevel (mention (acetype PER))))");
        let id = set.top_level()[0];
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        assert_eq!(matcher.multi_match_sentence(id, 0).unwrap().len(), 3);
        let config = MatchConfig {
            force_entity_types: true,
            ..MatchConfig::default()
        };
        let matcher = PatternMatcher::new(&doc, &set, config).unwrap();
        assert_eq!(matcher.multi_match_sentence(id, 0).unwrap().len(), 1);
    }
}
