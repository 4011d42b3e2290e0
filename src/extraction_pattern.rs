//! ## Event and Relation Patterns
//! Both kinds constrain a typed theory object with a list of role-bearing arguments: an event
//! mention's mention and value arguments, or a relation's two mention arguments plus an
//! optional time argument. Argument patterns are paired with those arguments by the
//! assignment solver. An event pattern may additionally constrain the event anchor.

use std::collections::BTreeSet;

use crate::error::{PatternError, Result};
use crate::features::{FeatureKind, PatternFeatureSet};
use crate::matcher::{PatternMatcher, merge_matches};
use crate::pattern::{
    Capability, ParseContext, Pattern, PatternId, PatternKind, PatternParser, parse_pattern_list,
    parse_single_pattern,
};
use crate::sexp::Sexp;
use crate::solver::{ArgMatrix, AssignmentOptions, fill_all_features};
use crate::theory::{
    Argument, ArgumentValue, EventId, EventMention, MentionId, NodeId, RelationId, ValueMentionId,
};
use crate::word_set::symbols_from_sexp;

/// Event type that never matches any pattern.
pub const IGNORED_EVENT_TYPE: &str = "IGNORE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionTarget {
    Event,
    Relation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionPattern {
    pub target: ExtractionTarget,
    pub types: BTreeSet<String>,
    pub block_types: BTreeSet<String>,
    /// Only events have an anchor.
    pub anchor: Option<PatternId>,
    pub args: Vec<PatternId>,
    pub opt_args: Vec<PatternId>,
    pub block_args: Vec<PatternId>,
    pub match_all_args: bool,
}

impl ExtractionPattern {
    fn new(target: ExtractionTarget) -> Self {
        Self {
            target,
            types: BTreeSet::new(),
            block_types: BTreeSet::new(),
            anchor: None,
            args: Vec::new(),
            opt_args: Vec::new(),
            block_args: Vec::new(),
            match_all_args: false,
        }
    }

    pub fn event() -> Self {
        Self::new(ExtractionTarget::Event)
    }

    pub fn relation() -> Self {
        Self::new(ExtractionTarget::Relation)
    }

    pub fn head_name(&self) -> &'static str {
        match self.target {
            ExtractionTarget::Event => "event",
            ExtractionTarget::Relation => "relation",
        }
    }

    pub fn matches_type(&self, theory_type: &str) -> bool {
        (self.types.is_empty() || self.types.contains(theory_type)) && !self.block_types.contains(theory_type)
    }
}

impl PatternParser for ExtractionPattern {
    const TYPE_NAME: &'static str = "ExtractionPattern";

    fn init_atom(&mut self, atom: &str, _ctx: &mut ParseContext) -> Result<bool> {
        if atom == "MATCH_ALL_ARGS" {
            self.match_all_args = true;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn init_subexpression(&mut self, sexp: &Sexp, ctx: &mut ParseContext) -> Result<bool> {
        match sexp.head() {
            Some("type") => self.types.extend(symbols_from_sexp(sexp)?),
            Some("block_type") => self.block_types.extend(symbols_from_sexp(sexp)?),
            Some("args") => self.args.extend(parse_pattern_list(sexp, ctx)?),
            Some("opt_args") => self.opt_args.extend(parse_pattern_list(sexp, ctx)?),
            Some("block_args") => self.block_args.extend(parse_pattern_list(sexp, ctx)?),
            Some("anchor") if self.target == ExtractionTarget::Event => {
                if self.anchor.is_some() {
                    return Err(PatternError::parse("EventPattern", "more than one anchor in EventPattern", sexp));
                }
                self.anchor = Some(parse_single_pattern(sexp, ctx, "EventPattern")?);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn into_kind(self) -> PatternKind {
        match self.target {
            ExtractionTarget::Event => PatternKind::Event(self),
            ExtractionTarget::Relation => PatternKind::Relation(self),
        }
    }
}

/// The role-bearing arguments of an event or relation, in the column order of the solver.
struct TheoryArgs {
    mentions: Vec<(String, MentionId)>,
    values: Vec<(String, ValueMentionId)>,
}

impl TheoryArgs {
    fn of_event(event: &EventMention) -> Self {
        Self {
            mentions: event.args.clone(),
            values: event.value_args.clone(),
        }
    }

    fn len(&self) -> usize {
        self.mentions.len() + self.values.len()
    }
}

impl ExtractionPattern {
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
        match self.target {
            ExtractionTarget::Event => {
                for event in (0..st.events.len()).map(EventId) {
                    matches.extend(self.matches_event(pm, pattern, sentence, event)?);
                }
            }
            ExtractionTarget::Relation => {
                for relation in (0..st.relations.len()).map(RelationId) {
                    matches.extend(self.matches_relation(pm, pattern, sentence, relation)?);
                }
            }
        }
        Ok(matches)
    }

    pub fn matches_event(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        event_id: EventId,
    ) -> Result<Option<PatternFeatureSet>> {
        let st = pm.doc().sentence(sentence);
        let event = &st.events[event_id.0];
        if event.event_type == IGNORED_EVENT_TYPE || !self.matches_type(&event.event_type) {
            return Ok(None);
        }

        let mut anchor_match = None;
        if let Some(anchor) = self.anchor {
            let bank = pm.bank();
            anchor_match = if bank.supports(anchor, Capability::Prop) {
                match event.anchor_prop {
                    // set propositions never stand in for their members here
                    Some(prop) => pm.match_prop(anchor, sentence, prop, false, None)?,
                    None => None,
                }
            } else if bank.supports(anchor, Capability::ParseNode) {
                pm.match_parse_node(anchor, sentence, event.anchor_node)?
            } else {
                None
            };
            if anchor_match.is_none() {
                return Ok(None);
            }
        }

        let args = TheoryArgs::of_event(event);
        let kind = FeatureKind::EventMention {
            sentence,
            event: event_id,
        };
        let Some(mut base) = self.base_features(pm, pattern, sentence, &args, kind)? else {
            return Ok(None);
        };
        if let Some(anchor_match) = anchor_match {
            base.add_features(&anchor_match);
        }
        self.fill(pm, pattern, sentence, &args, base)
    }

    pub fn matches_relation(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        relation_id: RelationId,
    ) -> Result<Option<PatternFeatureSet>> {
        let st = pm.doc().sentence(sentence);
        let relation = &st.relations[relation_id.0];
        if !self.matches_type(&relation.rel_type) {
            return Ok(None);
        }
        let args = TheoryArgs {
            mentions: relation
                .mention_args()
                .iter()
                .map(|(role, m)| (role.to_string(), *m))
                .collect(),
            values: relation.time_arg.iter().cloned().collect(),
        };
        let kind = FeatureKind::RelMention {
            sentence,
            relation: relation_id,
        };
        match self.base_features(pm, pattern, sentence, &args, kind)? {
            Some(base) => self.fill(pm, pattern, sentence, &args, base),
            None => Ok(None),
        }
    }

    /// Check the blocked arguments and build the features of the theory object itself.
    fn base_features(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        args: &TheoryArgs,
        kind: FeatureKind,
    ) -> Result<Option<PatternFeatureSet>> {
        for &blocked in &self.block_args {
            let row = self.argument_row(pm, blocked, sentence, args)?;
            if row.iter().any(Option::is_some) {
                return Ok(None);
            }
        }
        let variant = pm.language_variant();
        let mut set = PatternFeatureSet::new();
        if let Some(ret) = pattern.return_feature(kind.clone(), variant) {
            set.add_feature(ret);
        }
        set.add_feature(pattern.feature(kind, variant));
        pattern.add_id(&mut set, variant);
        set.set_score(pattern.score());
        Ok(Some(set))
    }

    fn fill(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        args: &TheoryArgs,
        base: PatternFeatureSet,
    ) -> Result<Option<PatternFeatureSet>> {
        let bank = pm.bank();
        let mut required: ArgMatrix = Vec::with_capacity(self.args.len());
        for &arg_pattern in &self.args {
            let row = self.argument_row(pm, arg_pattern, sentence, args)?;
            let optional = matches!(&bank.get(arg_pattern).kind, PatternKind::Argument(a) if a.optional);
            if row.iter().all(Option::is_none) && !optional {
                return Ok(None);
            }
            required.push(row);
        }
        let mut optional: ArgMatrix = Vec::with_capacity(self.opt_args.len());
        for &arg_pattern in &self.opt_args {
            optional.push(self.argument_row(pm, arg_pattern, sentence, args)?);
        }
        let options = AssignmentOptions {
            all_args: self.match_all_args,
            ..AssignmentOptions::default()
        };
        fill_all_features(pattern, &required, &optional, base, options, pm.config().max_solver_arguments)
    }

    /// Matches of one argument pattern against every mention argument, then every value argument.
    fn argument_row(
        &self,
        pm: &PatternMatcher,
        arg_pattern: PatternId,
        sentence: usize,
        args: &TheoryArgs,
    ) -> Result<Vec<Option<PatternFeatureSet>>> {
        let bank = pm.bank();
        let mut row = Vec::with_capacity(args.len());
        if bank.supports(arg_pattern, Capability::MentionAndRole) {
            for (role, mention) in &args.mentions {
                row.push(pm.match_mention_and_role(arg_pattern, sentence, role, *mention, true)?);
            }
        }
        if bank.supports(arg_pattern, Capability::ValueMentionAndRole) {
            for (role, value_mention) in &args.values {
                row.push(pm.match_value_mention_and_role(arg_pattern, sentence, role, *value_mention)?);
            }
        }
        Ok(row)
    }

    /// The event anchored at the head of `node`, if any.
    fn event_at(&self, pm: &PatternMatcher, sentence: usize, node: NodeId) -> Option<EventId> {
        let st = pm.doc().sentence(sentence);
        let head = st.parse.head_preterm(node);
        st.events
            .iter()
            .position(|e| st.parse.head_preterm(e.anchor_node) == head)
            .map(EventId)
    }

    pub fn matches_mention(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        mention: MentionId,
    ) -> Result<Option<PatternFeatureSet>> {
        let node = pm.doc().sentence(sentence).mention(mention).node;
        match self.event_at(pm, sentence, node) {
            Some(event) => self.matches_event(pm, pattern, sentence, event),
            None => Ok(None),
        }
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
            ArgumentValue::Proposition(prop) => {
                let Some(head) = pm.doc().sentence(sentence).proposition(prop).pred_head else {
                    return Ok(None);
                };
                match self.event_at(pm, sentence, head) {
                    Some(event) => self.matches_event(pm, pattern, sentence, event),
                    None => Ok(None),
                }
            }
            ArgumentValue::Text(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::matcher::{MatchConfig, PatternMatcher};
    use crate::pattern_set::{LoadOptions, PatternSet};
    use crate::theory::{
        DocTheory, EventId, EventMention, Mention, MentionType, RelMention, RelationId, SentenceTheory,
        ValueMention,
    };

    /// "Bob attacked Paris yesterday" with an Attack event and a Located relation.
    fn document() -> DocTheory {
        let mut doc = DocTheory::new("doc");
        let mut st = SentenceTheory::from_treebank(
            0,
            "(S (NP (NNP Bob)) (VP (VBD attacked) (NP (NNP Paris)) (NP (NN yesterday))))",
        )
        .unwrap();
        let bob_node = st.parse.find("NP", 0, 0).unwrap();
        let paris_node = st.parse.find("NP", 2, 2).unwrap();
        let anchor = st.parse.preterminal(1).unwrap();
        let bob = st.add_mention(Mention::new(bob_node, MentionType::Name, "PER"));
        let paris = st.add_mention(Mention::new(paris_node, MentionType::Name, "GPE"));
        let yesterday = st.add_value_mention(ValueMention {
            value_type: "TIMEX2".to_string(),
            start_token: 3,
            end_token: 3,
            value: None,
        });
        st.add_event(EventMention {
            event_type: "Attack".to_string(),
            anchor_node: anchor,
            anchor_prop: None,
            args: vec![("Attacker".to_string(), bob), ("Place".to_string(), paris)],
            value_args: vec![("Time".to_string(), yesterday)],
        });
        st.add_event(EventMention {
            event_type: "IGNORE".to_string(),
            anchor_node: anchor,
            anchor_prop: None,
            args: Vec::new(),
            value_args: Vec::new(),
        });
        st.add_relation(RelMention {
            rel_type: "Located".to_string(),
            left: bob,
            right: paris,
            time_arg: None,
        });
        doc.add_sentence(st);
        doc
    }

    fn load(text: &str) -> PatternSet {
        PatternSet::from_str(text, &LoadOptions::default()).unwrap()
    }

    #[test]
    fn basic_event_test() {
        let doc = document();
        let set = load(
            "(s (toplevel (event (type Attack) (score 0.8) \
                (args (argument (role Attacker) (mention (acetype PER) (return WHO)))) \
                (opt_args (argument (role Time) (value (return WHEN)))))))",
        );
        let id = set.top_level()[0];
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        let matched = matcher.match_event(id, 0, EventId(0)).unwrap().unwrap();
        assert_eq!(matched.returns().count(), 2);
        assert!(matcher.match_event(id, 0, EventId(1)).unwrap().is_none());
        assert_eq!(matcher.multi_match_sentence(id, 0).unwrap().len(), 1);
    }

    #[test]
    fn event_argument_constraints_test() {
        let doc = document();
        let missing = load("(s (toplevel (event (args (argument (role Target) (mention))))))");
        let matcher = PatternMatcher::new(&doc, &missing, MatchConfig::default()).unwrap();
        assert!(matcher.match_event(missing.top_level()[0], 0, EventId(0)).unwrap().is_none());

        let blocked = load("(s (toplevel (event (type Attack) (block_args (argument (role Place))))))");
        let matcher = PatternMatcher::new(&doc, &blocked, MatchConfig::default()).unwrap();
        assert!(matcher.match_event(blocked.top_level()[0], 0, EventId(0)).unwrap().is_none());

        let all = load("(s (toplevel (event MATCH_ALL_ARGS (args (argument (role Attacker))))))");
        let matcher = PatternMatcher::new(&doc, &all, MatchConfig::default()).unwrap();
        assert!(matcher.match_event(all.top_level()[0], 0, EventId(0)).unwrap().is_none());

        let anchored = load("(s (toplevel (event (anchor (parse-node (tag VBD))))))");
        let matcher = PatternMatcher::new(&doc, &anchored, MatchConfig::default()).unwrap();
        assert!(matcher.match_event(anchored.top_level()[0], 0, EventId(0)).unwrap().is_some());
    }

    #[test]
    fn basic_relation_test() {
        let doc = document();
        let set = load(
            "(s (toplevel (relation (type Located) \
                (args (argument (role arg1) (mention (acetype PER))) (argument (role arg2) (mention (acetype GPE)))))))",
        );
        let id = set.top_level()[0];
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        assert!(matcher.match_relation(id, 0, RelationId(0)).unwrap().is_some());

        let swapped = load("(s (toplevel (relation (args (argument (role arg1) (mention (acetype GPE)))))))");
        let matcher = PatternMatcher::new(&doc, &swapped, MatchConfig::default()).unwrap();
        assert!(matcher.match_relation(swapped.top_level()[0], 0, RelationId(0)).unwrap().is_none());

        assert!(PatternSet::from_str("(s (toplevel (relation (anchor (mention)))))", &LoadOptions::default()).is_err());
    }
}
