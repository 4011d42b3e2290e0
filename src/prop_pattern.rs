//! ## Proposition Patterns
//! A [PropPattern] constrains a proposition: its predicate type and word, the words attached to
//! it (particle, adverb, negation, modal, adjectives) and, through argument patterns, its
//! arguments. Arguments are paired with the proposition's arguments by the assignment solver.

use std::collections::BTreeSet;

use log::debug;
use rustc_hash::FxHashSet;

use crate::error::{PatternError, Result};
use crate::features::{FeatureKind, PatternFeatureSet};
use crate::matcher::{PatternMatcher, merge_matches};
use crate::pattern::{ParseContext, Pattern, PatternId, PatternKind, PatternParser, parse_pattern_list};
use crate::prop_status::PropStatusManager;
use crate::sexp::Sexp;
use crate::solver::{ArgMatrix, AssignmentOptions, fill_all_features};
use crate::theory::{
    Argument, ArgumentValue, MEMBER_ROLE, MentionType, PredicateType, PropId, REF_ROLE,
    SentenceTheory, UNKNOWN_ROLE,
};
use crate::word_set::{WordList, symbols_from_sexp};

/// `(propmod (role R ...) PROP)`: a proposition over the same referent, possibly reached
/// through set propositions, fills one of `roles` and matches `pattern`.
#[derive(Debug, Clone, PartialEq)]
pub struct PropModifier {
    pub roles: BTreeSet<String>,
    pub pattern: PatternId,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropPattern {
    /// `None` for `anyprop`.
    pub pred_type: Option<PredicateType>,
    pub predicates: WordList,
    pub blocked_predicates: WordList,
    pub particles: WordList,
    pub adjectives: WordList,
    pub blocked_adjectives: WordList,
    pub adverbs_or_particles: WordList,
    pub blocked_adverbs_or_particles: WordList,
    pub negations: WordList,
    pub blocked_negations: WordList,
    pub modals: WordList,
    pub blocked_modals: WordList,
    pub regex: Option<PatternId>,
    pub args: Vec<PatternId>,
    pub opt_args: Vec<PatternId>,
    pub block_args: Vec<PatternId>,
    /// Set by `NEGATIVE` or `(psm ...)`.
    pub psm: Option<PropStatusManager>,
    /// Whether `psm` came from the `NEGATIVE` atom.
    pub negative: bool,
    pub propmod: Option<PropModifier>,
    pub one_to_one: bool,
    pub many_to_many: bool,
    pub match_all_args: bool,
    pub stem_predicate: bool,
    pub block_fall_through: bool,
}

impl PropPattern {
    /// A pattern for one of the heads `vprop nprop mprop sprop cprop anyprop`.
    pub fn for_head(head: &str) -> Self {
        let pred_type = match head {
            "vprop" => Some(PredicateType::Verb),
            "nprop" => Some(PredicateType::Noun),
            "mprop" => Some(PredicateType::Modifier),
            "sprop" => Some(PredicateType::Set),
            "cprop" => Some(PredicateType::Comp),
            _ => None,
        };
        Self {
            pred_type,
            ..Self::default()
        }
    }

    pub fn head_name(&self) -> &'static str {
        match self.pred_type {
            Some(PredicateType::Verb) => "vprop",
            Some(PredicateType::Noun) => "nprop",
            Some(PredicateType::Modifier) => "mprop",
            Some(PredicateType::Set) => "sprop",
            Some(PredicateType::Comp) => "cprop",
            _ => "anyprop",
        }
    }

    fn set_psm(&mut self, psm: PropStatusManager, sexp: &Sexp) -> Result<()> {
        if self.psm.is_some() {
            return Err(PatternError::parse(
                Self::TYPE_NAME,
                "cannot initialize PropStatusManager twice; note that 'NEGATIVE' counts as a psm",
                sexp,
            ));
        }
        self.psm = Some(psm);
        Ok(())
    }

    /// Whether a proposition of type `actual` satisfies the pattern's predicate type.
    pub fn accepts_pred_type(&self, actual: PredicateType) -> bool {
        let Some(expected) = self.pred_type else {
            return true;
        };
        actual == expected
            || matches!(
                (actual, expected),
                (PredicateType::Copula, PredicateType::Verb)
                    | (PredicateType::Name, PredicateType::Noun)
                    | (PredicateType::Pronoun, PredicateType::Noun)
                    | (PredicateType::Poss, PredicateType::Modifier)
            )
    }
}

impl PatternParser for PropPattern {
    const TYPE_NAME: &'static str = "PropPattern";

    fn init_atom(&mut self, atom: &str, _ctx: &mut ParseContext) -> Result<bool> {
        match atom {
            "NEGATIVE" => {
                self.set_psm(PropStatusManager::negative(), &Sexp::atom(atom))?;
                self.negative = true;
            }
            "BLOCK_FALL_THROUGH" => self.block_fall_through = true,
            "ONE_TO_ONE" => self.one_to_one = true,
            "MANY_TO_MANY" => self.many_to_many = true,
            "MATCH_ALL_ARGS" => self.match_all_args = true,
            "STEM_PREDICATE" => self.stem_predicate = true,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn init_subexpression(&mut self, sexp: &Sexp, ctx: &mut ParseContext) -> Result<bool> {
        let Some(head) = sexp.head() else {
            return Ok(false);
        };
        let sets = ctx.word_sets;
        match head {
            "predicate" => self.predicates.extend_from_sexp(sexp, sets)?,
            "block_predicate" => self.blocked_predicates.extend_from_sexp(sexp, sets)?,
            "particle" => self.particles.extend_from_sexp(sexp, sets)?,
            "adj" => self.adjectives.extend_from_sexp(sexp, sets)?,
            "block_adj" => self.blocked_adjectives.extend_from_sexp(sexp, sets)?,
            "adverb_or_particle" => self.adverbs_or_particles.extend_from_sexp(sexp, sets)?,
            "block_adv_part" => self.blocked_adverbs_or_particles.extend_from_sexp(sexp, sets)?,
            "negation" => self.negations.extend_from_sexp(sexp, sets)?,
            "block_negation" => self.blocked_negations.extend_from_sexp(sexp, sets)?,
            "modal" => self.modals.extend_from_sexp(sexp, sets)?,
            "block_modal" => self.blocked_modals.extend_from_sexp(sexp, sets)?,
            "regex" => {
                if self.regex.is_some() {
                    return Err(PatternError::parse(Self::TYPE_NAME, "more than one regex in PropPattern", sexp));
                }
                self.regex = Some(ctx.parse(sexp.nth_child(1)?)?);
            }
            "args" => self.args.extend(parse_pattern_list(sexp, ctx)?),
            "opt_args" => self.opt_args.extend(parse_pattern_list(sexp, ctx)?),
            "block_args" => self.block_args.extend(parse_pattern_list(sexp, ctx)?),
            "psm" => self.set_psm(PropStatusManager::from_sexp(sexp)?, sexp)?,
            "propmod" => {
                let syntax = "propmod format invalid... must be (propmod (role ...) PATTERN)";
                if self.propmod.is_some() {
                    return Err(PatternError::parse(Self::TYPE_NAME, "only one propmod is allowed per pattern", sexp));
                }
                let [_, roles, pattern] = sexp.children()? else {
                    return Err(PatternError::parse(Self::TYPE_NAME, syntax, sexp));
                };
                if !roles.is_list() {
                    return Err(PatternError::parse(Self::TYPE_NAME, syntax, sexp));
                }
                let roles = symbols_from_sexp(roles)
                    .map_err(|_| PatternError::parse(Self::TYPE_NAME, syntax, sexp))?
                    .iter()
                    .map(|r| crate::argument_pattern::canonical_role(r))
                    .collect();
                self.propmod = Some(PropModifier {
                    roles,
                    pattern: ctx.parse(pattern)?,
                });
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn into_kind(self) -> PatternKind {
        PatternKind::Prop(self)
    }
}

impl PropPattern {
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
        for prop in pm.doc().sentence(sentence).prop_ids() {
            matches.extend(self.matches_prop(pm, pattern, sentence, prop, false, None)?);
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
        overrides: Option<&PropStatusManager>,
    ) -> Result<Option<PatternFeatureSet>> {
        match arg.value {
            ArgumentValue::Proposition(prop) => {
                self.matches_prop(pm, pattern, sentence, prop, fall_through, overrides)
            }
            ArgumentValue::Mention(mention) => match pm.doc().sentence(sentence).definition(mention) {
                Some(definition) => {
                    let fall_through = fall_through && arg.role != REF_ROLE;
                    self.matches_prop(pm, pattern, sentence, definition, fall_through, overrides)
                }
                None => Ok(None),
            },
            ArgumentValue::Text(_) => Ok(None),
        }
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
        let st = pm.doc().sentence(sentence);
        let prop = st.proposition(prop_id);

        if !self.block_fall_through && fall_through {
            if let Some(set) = self.matches_prop(pm, pattern, sentence, prop_id, false, overrides)? {
                return Ok(Some(set));
            }
            if matches!(prop.pred_type, PredicateType::Comp | PredicateType::Set) {
                let mut members = Vec::new();
                for arg in prop.args.iter().filter(|a| a.role == MEMBER_ROLE) {
                    members.extend(self.matches_argument_value(pm, pattern, sentence, arg, true, overrides)?);
                }
                return Ok(merge_matches(members));
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
            return Ok(None);
        }

        let default_psm = PropStatusManager::default();
        let psm = overrides.or(self.psm.as_ref()).unwrap_or(&default_psm);
        if !psm.is_valid(prop, pm.blocked_statuses()) {
            return Ok(None);
        }
        if !self.accepts_pred_type(prop.pred_type) {
            return Ok(None);
        }

        let predicate = st.pred_word(prop_id).map(|w| {
            if self.stem_predicate {
                w.to_lowercase()
            } else {
                w.to_string()
            }
        });
        if !self.predicates.matches(predicate.as_deref(), true) {
            return Ok(None);
        }
        let particle = st.word(prop.particle);
        let adverb = st.word(prop.adverb);
        if !self.particles.matches(particle, true) {
            return Ok(None);
        }
        if !self.adverbs_or_particles.is_empty()
            && !self.adverbs_or_particles.matches(adverb, false)
            && !self.adverbs_or_particles.matches(particle, false)
        {
            return Ok(None);
        }
        if self.blocked_adverbs_or_particles.matches(adverb, false)
            || self.blocked_adverbs_or_particles.matches(particle, false)
        {
            return Ok(None);
        }
        if !self.adjectives.is_empty() && !matches_adjective(&self.adjectives, st, prop_id) {
            return Ok(None);
        }
        if !self.blocked_adjectives.is_empty() && matches_adjective(&self.blocked_adjectives, st, prop_id) {
            return Ok(None);
        }
        if self.blocked_predicates.matches(predicate.as_deref(), false) {
            return Ok(None);
        }
        let negation = st.word(prop.negation);
        if !self.negations.matches(negation, true) || self.blocked_negations.matches(negation, false) {
            return Ok(None);
        }
        let modal = st.word(prop.modal);
        if !self.modals.matches(modal, true) || self.blocked_modals.matches(modal, false) {
            return Ok(None);
        }

        // blocked arguments never contribute to the score
        for &blocked in &self.block_args {
            for arg in &prop.args {
                if pm.match_argument(blocked, sentence, arg, true)?.is_some() {
                    return Ok(None);
                }
            }
        }

        let mut required: ArgMatrix = Vec::with_capacity(self.args.len());
        for &arg_pattern in &self.args {
            let mut row = Vec::with_capacity(prop.args.len());
            for arg in &prop.args {
                row.push(pm.match_argument(arg_pattern, sentence, arg, true)?);
            }
            if row.iter().all(Option::is_none) {
                debug!("Proposition {} misses a required argument", prop_id.0);
                return Ok(None);
            }
            required.push(row);
        }
        let mut optional: ArgMatrix = Vec::with_capacity(self.opt_args.len());
        for &arg_pattern in &self.opt_args {
            let mut row = Vec::with_capacity(prop.args.len());
            for arg in &prop.args {
                row.push(pm.match_argument(arg_pattern, sentence, arg, true)?);
            }
            optional.push(row);
        }

        let variant = pm.language_variant();
        let kind = FeatureKind::Proposition {
            sentence,
            prop: prop_id,
        };
        let mut set = PatternFeatureSet::new();
        if let Some(ret) = pattern.return_feature(kind.clone(), variant) {
            set.add_feature(ret);
        }
        set.add_feature(pattern.feature(kind, variant));
        pattern.add_id(&mut set, variant);
        set.set_score(pattern.score());

        if let Some(regex) = self.regex {
            let Some(head) = prop.pred_head else {
                return Ok(None);
            };
            match pm.match_parse_node(regex, sentence, st.parse.head_preterm(head))? {
                Some(regex_match) => set.add_features(&regex_match),
                None => return Ok(None),
            }
        }
        if let Some(propmod) = &self.propmod {
            match self.matches_prop_modifier(pm, propmod, sentence, prop_id)? {
                Some(modifier) => set.add_features(&modifier),
                None => return Ok(None),
            }
        }

        let options = AssignmentOptions {
            one_to_one: self.one_to_one,
            all_args: self.match_all_args,
            many_to_many: self.many_to_many,
        };
        fill_all_features(pattern, &required, &optional, set, options, pm.config().max_solver_arguments)
    }

    fn matches_prop_modifier(
        &self,
        pm: &PatternMatcher,
        propmod: &PropModifier,
        sentence: usize,
        prop_id: PropId,
    ) -> Result<Option<PatternFeatureSet>> {
        let st = pm.doc().sentence(sentence);
        let Some(mut reference) = st.proposition(prop_id).args.iter().find_map(|a| match a.value {
            ArgumentValue::Mention(m) if a.role == REF_ROLE => Some(m),
            _ => None,
        }) else {
            return Ok(None);
        };

        // climb up through set propositions having the referent as a member
        let mut visited: FxHashSet<PropId> = FxHashSet::default();
        visited.insert(prop_id);
        'climb: loop {
            for candidate in st.prop_ids() {
                let set_prop = st.proposition(candidate);
                if visited.contains(&candidate) || set_prop.pred_type != PredicateType::Set {
                    continue;
                }
                let is_member = set_prop
                    .args
                    .iter()
                    .any(|a| a.role == MEMBER_ROLE && a.value == ArgumentValue::Mention(reference));
                if let (true, Some(set_ref)) = (is_member, set_prop.ref_mention()) {
                    visited.insert(candidate);
                    reference = set_ref;
                    continue 'climb;
                }
            }
            break;
        }

        let mut best: Option<PatternFeatureSet> = None;
        for candidate in st.prop_ids().filter(|p| *p != prop_id) {
            let fills = st
                .proposition(candidate)
                .args
                .iter()
                .any(|a| a.value == ArgumentValue::Mention(reference) && propmod.roles.contains(&a.role));
            if !fills {
                continue;
            }
            if let Some(set) = pm.match_prop(propmod.pattern, sentence, candidate, true, None)? {
                if best.as_ref().is_none_or(|b| set.score() > b.score()) {
                    best = Some(set);
                }
            }
        }
        Ok(best)
    }
}

/// Whether a noun proposition's referent is modified by one of `adjectives`, either through a
/// modifier proposition or an `<unknown>` premodifier mention.
fn matches_adjective(adjectives: &WordList, st: &SentenceTheory, prop_id: PropId) -> bool {
    let prop = st.proposition(prop_id);
    if prop.pred_type != PredicateType::Noun {
        return false;
    }
    let Some(reference) = prop.ref_mention() else {
        return false;
    };
    let modified = st.prop_ids().any(|p| {
        let modifier = st.proposition(p);
        modifier.pred_type == PredicateType::Modifier
            && modifier.ref_mention() == Some(reference)
            && adjectives.matches(st.pred_word(p), false)
    });
    modified
        || prop.args.iter().any(|a| match a.value {
            ArgumentValue::Mention(m) if a.role == UNKNOWN_ROLE => {
                adjectives.matches(Some(st.mention_head_word(m)), false)
            }
            _ => false,
        })
}

#[cfg(test)]
mod test {
    use crate::matcher::{MatchConfig, PatternMatcher};
    use crate::pattern::PatternKind;
    use crate::pattern_set::{LoadOptions, PatternSet};
    use crate::prop_pattern::PropPattern;
    use crate::theory::{
        Argument, DocTheory, MEMBER_ROLE, Mention, MentionType, OBJ_ROLE, PredicateType, PropId, PropStatus,
        Proposition, REF_ROLE, SUB_ROLE, SentenceTheory,
    };

    /// "Bob hit the ball": a verb proposition with a subject and an object.
    fn document() -> (DocTheory, PropId) {
        let mut doc = DocTheory::new("doc");
        let mut st = SentenceTheory::from_treebank(
            0,
            "(S (NP (NNP Bob)) (VP (VBD hit) (NP (DT the) (NN ball))))",
        )
        .unwrap();
        let bob_node = st.parse.find("NP", 0, 0).unwrap();
        let ball_node = st.parse.find("NP", 2, 3).unwrap();
        let hit = st.parse.preterminal(1).unwrap();
        let bob = st.add_mention(Mention::new(bob_node, MentionType::Name, "PER"));
        let ball = st.add_mention(Mention::new(ball_node, MentionType::Desc, "OBJ"));
        st.add_proposition(Proposition::new(
            PredicateType::Name,
            Some(bob_node),
            vec![Argument::mention(REF_ROLE, bob)],
        ));
        let verb = st.add_proposition(Proposition::new(
            PredicateType::Verb,
            Some(hit),
            vec![Argument::mention(SUB_ROLE, bob), Argument::mention(OBJ_ROLE, ball)],
        ));
        doc.add_sentence(st);
        (doc, verb)
    }

    fn load(text: &str) -> PatternSet {
        PatternSet::from_str(text, &LoadOptions::default()).unwrap()
    }

    #[test]
    fn basic_pred_type_test() {
        let verb = PropPattern::for_head("vprop");
        assert!(verb.accepts_pred_type(PredicateType::Copula));
        assert!(!verb.accepts_pred_type(PredicateType::Noun));
        assert!(PropPattern::for_head("nprop").accepts_pred_type(PredicateType::Pronoun));
        assert!(PropPattern::for_head("mprop").accepts_pred_type(PredicateType::Poss));
        assert!(PropPattern::for_head("anyprop").accepts_pred_type(PredicateType::Set));
        assert_eq!(PropPattern::for_head("sprop").head_name(), "sprop");
    }

    #[test]
    fn basic_prop_match_test() {
        let (doc, verb) = document();
        let set = load(
            "(s (toplevel (vprop (predicate hit) (score 0.7) \
                (args (argument (role <sub>) (mention (acetype PER) (return AGENT))) \
                      (argument (role <obj>) (mention (headword ball)))))))",
        );
        let id = set.top_level()[0];
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        let matched = matcher.match_prop(id, 0, verb, false, None).unwrap().unwrap();
        assert_eq!(matched.returns().count(), 1);
        assert_eq!(matcher.multi_match_sentence(id, 0).unwrap().len(), 1);

        let wrong = load("(s (toplevel (vprop (predicate kicked))))");
        let matcher = PatternMatcher::new(&doc, &wrong, MatchConfig::default()).unwrap();
        assert!(matcher.match_prop(wrong.top_level()[0], 0, verb, false, None).unwrap().is_none());

        let blocked = load("(s (toplevel (vprop (block_args (argument (role <obj>))))))");
        let matcher = PatternMatcher::new(&doc, &blocked, MatchConfig::default()).unwrap();
        assert!(matcher.match_prop(blocked.top_level()[0], 0, verb, false, None).unwrap().is_none());
    }

    #[test]
    fn prop_status_test() {
        let (mut doc, verb) = document();
        doc.sentences[0].propositions[verb.0].statuses.push(PropStatus::Negative);
        let plain = load("(s (options (blocked_proposition_types NEGATIVE)) (toplevel (vprop (predicate hit))))");
        let matcher = PatternMatcher::new(&doc, &plain, MatchConfig::default()).unwrap();
        assert!(matcher.match_prop(plain.top_level()[0], 0, verb, false, None).unwrap().is_none());

        let negative = load("(s (options (blocked_proposition_types NEGATIVE)) (toplevel (vprop (predicate hit) NEGATIVE)))");
        let matcher = PatternMatcher::new(&doc, &negative, MatchConfig::default()).unwrap();
        assert!(matcher.match_prop(negative.top_level()[0], 0, verb, false, None).unwrap().is_some());
        let PatternKind::Prop(prop) = &negative.bank().get(negative.top_level()[0]).kind else {
            panic!("expected a proposition pattern");
        };
        assert!(prop.negative);

        assert!(PatternSet::from_str("(s (toplevel (vprop NEGATIVE (psm (require IF)))))", &LoadOptions::default()).is_err());
    }

    #[test]
    fn set_fall_through_test() {
        let (mut doc, verb) = document();
        let st = &mut doc.sentences[0];
        let list_node = st.parse.root();
        let list = st.add_mention(Mention::new(list_node, MentionType::List, "PER"));
        let set_prop = st.add_proposition(Proposition::new(
            PredicateType::Set,
            None,
            vec![Argument::mention(REF_ROLE, list), Argument::proposition(MEMBER_ROLE, verb)],
        ));
        let set = load("(s (toplevel (vprop (predicate hit))))");
        let id = set.top_level()[0];
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        assert!(matcher.match_prop(id, 0, set_prop, false, None).unwrap().is_none());
        assert!(matcher.match_prop(id, 0, set_prop, true, None).unwrap().is_some());
    }
}
