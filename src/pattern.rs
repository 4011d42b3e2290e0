//! ## Patterns
//! This module contains the pattern graph. Patterns live in a [PatternBank] arena and refer to
//! their sub-patterns through [PatternId]s, a shortcut reference is a [PatternKind::Shortcut]
//! node that resolution replaces by the id of its target.
//!
//! Parsing dispatches on the leading symbol of a pattern expression. Every kind then walks the
//! remaining children: the attributes all patterns share ([PatternCommon]) are tried first,
//! everything else is handed to the kind through [PatternParser].

use std::collections::BTreeSet;

use bitvec::vec::BitVec;
use rustc_hash::FxHashMap;

use crate::argument_pattern::ArgumentPattern;
use crate::combination::{CombinationPattern, CombinationType};
use crate::error::{PatternError, Result};
use crate::extraction_pattern::ExtractionPattern;
use crate::features::{FeatureKind, PatternFeature, PatternFeatureSet, PatternReturn};
use crate::mention_pattern::MentionPattern;
use crate::parse_node_pattern::ParseNodePattern;
use crate::prop_pattern::PropPattern;
use crate::regex_pattern::{RegexPattern, TextPattern};
use crate::scoring::{ScoringFunction, UNSPECIFIED_SCORE, UNSPECIFIED_SCORE_GROUP};
use crate::sentence_patterns::{
    DocPattern, IntersectionPattern, NegationPattern, QuotationPattern, UnionPattern,
};
use crate::sexp::{Sexp, unquote};
use crate::theory::LanguageVariant;
use crate::topic_pattern::TopicPattern;
use crate::value_mention_pattern::ValueMentionPattern;
use crate::word_set::WordSetMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatternId(pub u32);

/// The kinds of theory objects a pattern can be matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Sentence,
    Mention,
    Prop,
    Argument,
    ArgumentValue,
    EventMention,
    RelMention,
    ParseNode,
    ValueMention,
    Document,
    MentionAndRole,
    ValueMentionAndRole,
}

impl Capability {
    pub fn name(&self) -> &'static str {
        match self {
            Capability::Sentence => "SentenceMatchingPattern",
            Capability::Mention => "MentionMatchingPattern",
            Capability::Prop => "PropMatchingPattern",
            Capability::Argument => "ArgumentMatchingPattern",
            Capability::ArgumentValue => "ArgumentValueMatchingPattern",
            Capability::EventMention => "EventMentionMatchingPattern",
            Capability::RelMention => "RelMentionMatchingPattern",
            Capability::ParseNode => "ParseNodeMatchingPattern",
            Capability::ValueMention => "ValueMentionMatchingPattern",
            Capability::Document => "DocumentMatchingPattern",
            Capability::MentionAndRole => "MentionAndRoleMatchingPattern",
            Capability::ValueMentionAndRole => "ValueMentionAndRoleMatchingPattern",
        }
    }
}

/// Attributes every pattern kind accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternCommon {
    pub score: f32,
    pub score_group: i32,
    pub scoring: ScoringFunction,
    pub shortcut: Option<String>,
    pub id: Option<String>,
    pub ret: Option<PatternReturn>,
    pub toplevel_return: bool,
    /// `SINGLE_MATCH`: multi matching a sentence yields at most the single sentence match.
    pub single_match: bool,
    pub language_variant: Option<LanguageVariant>,
}

impl Default for PatternCommon {
    fn default() -> Self {
        Self {
            score: UNSPECIFIED_SCORE,
            score_group: UNSPECIFIED_SCORE_GROUP,
            scoring: ScoringFunction::default(),
            shortcut: None,
            id: None,
            ret: None,
            toplevel_return: false,
            single_match: false,
            language_variant: None,
        }
    }
}

impl PatternCommon {
    fn init_atom(&mut self, atom: &str) -> bool {
        if atom == "SINGLE_MATCH" {
            self.single_match = true;
            true
        } else {
            false
        }
    }

    fn init_subexpression(&mut self, sexp: &Sexp, type_name: &'static str) -> Result<bool> {
        let Some(head) = sexp.head() else {
            return Ok(false);
        };
        let err = |reason: &str| PatternError::parse(type_name, reason, sexp);
        let single_value = |reason: &str| -> Result<String> {
            match sexp.children()? {
                [_, value] => value
                    .value()
                    .map(|v| unquote(v).to_string())
                    .ok_or_else(|| err(reason)),
                _ => Err(err(reason)),
            }
        };
        match head {
            "score" => {
                let value = single_value("score sexp should be of length 2")?;
                self.score = value.parse().map_err(|_| err("score must be a number"))?;
            }
            "score_group" => {
                let value = single_value("score_group sexp should be of length 2")?;
                self.score_group = value.parse().map_err(|_| err("score_group must be an integer"))?;
            }
            "score-fn" | "score_fn" => {
                let value = single_value("score-fn sexp should be of length 2")?;
                self.scoring =
                    ScoringFunction::from_name(&value).ok_or_else(|| err("unknown scoring function"))?;
            }
            "id" => {
                if self.id.is_some() {
                    return Err(err("id set twice"));
                }
                self.id = Some(single_value(
                    "id constraints can only have one token, as in (id <my_id>).",
                )?);
            }
            "shortcut" => {
                if self.shortcut.is_some() {
                    return Err(err("shortcut set twice"));
                }
                self.shortcut = Some(single_value("shortcut sexp should be of length 2")?);
            }
            "return" | "toplevel-return" => {
                if self.ret.is_some() {
                    return Err(err("Only one return sexp per pattern may be declared."));
                }
                self.ret = Some(PatternReturn::from_sexp(sexp)?);
                self.toplevel_return = head == "toplevel-return";
            }
            "language" => {
                let language = single_value("language sexp should be of length 2")?;
                self.language_variant.get_or_insert_with(LanguageVariant::default).language =
                    Some(language);
            }
            "variation" | "variant" => {
                let variant = single_value("variation sexp should be of length 2")?;
                self.language_variant.get_or_insert_with(LanguageVariant::default).variant =
                    Some(variant);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatternKind {
    /// An unresolved reference to a reference pattern.
    Shortcut(String),
    Mention(MentionPattern),
    Prop(PropPattern),
    Argument(ArgumentPattern),
    Event(ExtractionPattern),
    Relation(ExtractionPattern),
    ParseNode(ParseNodePattern),
    Regex(RegexPattern),
    Text(TextPattern),
    ValueMention(ValueMentionPattern),
    Topic(TopicPattern),
    Combination(CombinationPattern),
    Intersection(IntersectionPattern),
    Union(UnionPattern),
    Negation(NegationPattern),
    Doc(DocPattern),
    Quotation(QuotationPattern),
}

impl PatternKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            PatternKind::Shortcut(_) => "ShortcutPattern",
            PatternKind::Mention(_) => "MentionPattern",
            PatternKind::Prop(_) => "PropPattern",
            PatternKind::Argument(_) => "ArgumentPattern",
            PatternKind::Event(_) => "EventPattern",
            PatternKind::Relation(_) => "RelationPattern",
            PatternKind::ParseNode(_) => "ParseNodePattern",
            PatternKind::Regex(_) => "RegexPattern",
            PatternKind::Text(_) => "TextPattern",
            PatternKind::ValueMention(_) => "ValueMentionPattern",
            PatternKind::Topic(_) => "TopicPattern",
            PatternKind::Combination(_) => "CombinationPattern",
            PatternKind::Intersection(_) => "IntersectionPattern",
            PatternKind::Union(_) => "UnionPattern",
            PatternKind::Negation(_) => "NegationPattern",
            PatternKind::Doc(_) => "DocPattern",
            PatternKind::Quotation(_) => "QuotationPattern",
        }
    }

    pub fn capabilities(&self) -> &'static [Capability] {
        use Capability::*;
        match self {
            PatternKind::Shortcut(_) | PatternKind::Text(_) => &[],
            PatternKind::Mention(_) => &[Sentence, Mention, ArgumentValue, ParseNode],
            PatternKind::Prop(_) => &[Sentence, Prop, ArgumentValue],
            PatternKind::Argument(_) => &[Argument, MentionAndRole, ValueMentionAndRole],
            PatternKind::Event(_) => &[Sentence, EventMention, ArgumentValue, Mention],
            PatternKind::Relation(_) => &[Sentence, RelMention],
            PatternKind::ParseNode(_) => &[Sentence, ParseNode],
            PatternKind::Regex(_) => &[Sentence, Mention, ValueMention, ArgumentValue, ParseNode],
            PatternKind::ValueMention(_) => &[Sentence, ValueMention, ArgumentValue, ParseNode],
            PatternKind::Topic(_) => &[Sentence, Mention, Prop, ArgumentValue],
            PatternKind::Combination(c) => match c.capability {
                Some(member) => member.capabilities(),
                None => &[],
            },
            PatternKind::Intersection(_)
            | PatternKind::Union(_)
            | PatternKind::Negation(_)
            | PatternKind::Quotation(_) => &[Sentence],
            PatternKind::Doc(_) => &[Document],
        }
    }

    /// The sub-patterns whose returns a pattern passes on, in return order.
    fn return_children(&self) -> Vec<PatternId> {
        match self {
            PatternKind::Mention(p) => p
                .regex
                .iter()
                .chain(p.prop_def.iter())
                .copied()
                .chain(p.arg_of_props.iter().map(|aop| aop.prop))
                .collect(),
            PatternKind::Prop(p) => p.args.iter().chain(p.opt_args.iter()).copied().collect(),
            PatternKind::Argument(p) => p.pattern.iter().copied().collect(),
            PatternKind::Event(p) | PatternKind::Relation(p) => {
                p.args.iter().chain(p.opt_args.iter()).copied().collect()
            }
            PatternKind::ParseNode(p) => p
                .premods
                .iter()
                .chain(p.opt_premods.iter())
                .chain(p.postmods.iter())
                .chain(p.opt_postmods.iter())
                .chain(p.head.iter())
                .chain(p.node_mention.iter())
                .chain(p.regex.iter())
                .copied()
                .collect(),
            PatternKind::Regex(p) => p.subpatterns.clone(),
            PatternKind::ValueMention(p) => p.regex.iter().copied().collect(),
            PatternKind::Intersection(p) => p.members.clone(),
            PatternKind::Doc(p) => p.members.clone(),
            PatternKind::Quotation(p) => p.speaker.iter().copied().collect(),
            PatternKind::Shortcut(_)
            | PatternKind::Text(_)
            | PatternKind::Topic(_)
            | PatternKind::Combination(_)
            | PatternKind::Union(_)
            | PatternKind::Negation(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub index: PatternId,
    pub common: PatternCommon,
    pub kind: PatternKind,
}

impl Pattern {
    pub fn supports(&self, capability: Capability) -> bool {
        self.kind.capabilities().contains(&capability)
    }

    pub fn score(&self) -> f32 {
        self.common.score
    }

    pub fn feature(&self, kind: FeatureKind, variant: &LanguageVariant) -> PatternFeature {
        PatternFeature::new(Some(self.index), kind, variant)
    }

    /// The return feature for `kind` if this pattern declares a return.
    pub fn return_feature(&self, kind: FeatureKind, variant: &LanguageVariant) -> Option<PatternFeature> {
        self.common
            .ret
            .as_ref()
            .map(|ret| self.feature(kind, variant).with_return(ret.clone()))
    }

    /// Tag `set` with this pattern's id, if it has one.
    pub fn add_id(&self, set: &mut PatternFeatureSet, variant: &LanguageVariant) {
        if let Some(id) = &self.common.id {
            set.add_feature(self.feature(FeatureKind::TopLevel { id: id.clone() }, variant));
        }
    }

    /// A feature set that records nothing but the fact that this pattern matched.
    pub fn empty_feature_set(&self, variant: &LanguageVariant) -> PatternFeatureSet {
        let mut set = PatternFeatureSet::new();
        set.set_score(self.common.score);
        set.add_feature(self.feature(FeatureKind::Generic, variant));
        self.add_id(&mut set, variant);
        set
    }
}

/// Arena of all patterns of a pattern set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatternBank {
    patterns: Vec<Pattern>,
    resolved: BitVec,
}

impl PatternBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, common: PatternCommon, kind: PatternKind) -> PatternId {
        let index = PatternId(self.patterns.len() as u32);
        self.patterns.push(Pattern { index, common, kind });
        self.resolved.push(false);
        index
    }

    pub fn get(&self, id: PatternId) -> &Pattern {
        &self.patterns[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: PatternId) -> &mut Pattern {
        &mut self.patterns[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_resolved(&self, id: PatternId) -> bool {
        self.resolved[id.0 as usize]
    }

    pub fn mark_resolved(&mut self, id: PatternId) {
        self.resolved.set(id.0 as usize, true);
    }

    pub fn supports(&self, id: PatternId, capability: Capability) -> bool {
        self.get(id).supports(capability)
    }

    /// The id tagging matches of a pattern: its own id or, for composite patterns without one,
    /// the first id among its members.
    pub fn first_valid_id(&self, id: PatternId) -> Option<&str> {
        let pattern = self.get(id);
        if let Some(own) = &pattern.common.id {
            return Some(own);
        }
        let members: &[PatternId] = match &pattern.kind {
            PatternKind::Combination(c) => &c.members,
            PatternKind::Intersection(p) => &p.members,
            PatternKind::Union(p) => &p.members,
            _ => &[],
        };
        members.iter().find_map(|m| self.get(*m).common.id.as_deref())
    }

    /// Whether an argument value matching pattern lets its match fall through to the children of
    /// compound theory objects.
    pub fn allows_fall_through(&self, id: PatternId) -> bool {
        match &self.get(id).kind {
            PatternKind::Mention(p) => !p.block_fall_through,
            PatternKind::Prop(p) => !p.block_fall_through,
            PatternKind::Argument(p) => p.pattern.is_none_or(|inner| self.allows_fall_through(inner)),
            PatternKind::Combination(c) => c.members.iter().all(|m| self.allows_fall_through(*m)),
            _ => true,
        }
    }

    /// Whether an argument pattern, or any member of an argument combination, declares
    /// `allow_fall_through` roles.
    pub fn has_fall_through_roles(&self, id: PatternId) -> bool {
        match &self.get(id).kind {
            PatternKind::Argument(p) => !p.fall_through_roles.is_empty(),
            PatternKind::Combination(c) => c.members.iter().any(|m| self.has_fall_through_roles(*m)),
            _ => false,
        }
    }

    /// The return combinations a pattern produces. Every inner vector is one combination, an
    /// any-of contributes the cross product of its members' returns.
    pub fn returns(&self, id: PatternId) -> Vec<Vec<PatternReturn>> {
        let mut output = Vec::new();
        self.collect_returns(id, &mut output);
        output
    }

    fn collect_returns(&self, id: PatternId, output: &mut Vec<Vec<PatternReturn>>) {
        let pattern = self.get(id);
        if let Some(ret) = &pattern.common.ret {
            match output.last_mut() {
                Some(last) => last.push(ret.clone()),
                None => output.push(vec![ret.clone()]),
            }
        }
        match &pattern.kind {
            PatternKind::Combination(c) => match c.combination_type {
                CombinationType::AnyOf => self.multiply_returns(&c.members, output),
                CombinationType::AllOf => {
                    for member in &c.members {
                        self.collect_returns(*member, output);
                    }
                }
                CombinationType::NoneOf => {}
            },
            PatternKind::Union(u) => self.multiply_returns(&u.members, output),
            kind => {
                for child in kind.return_children() {
                    self.collect_returns(child, output);
                }
            }
        }
    }

    fn multiply_returns(&self, members: &[PatternId], output: &mut Vec<Vec<PatternReturn>>) {
        let member_returns: Vec<Vec<Vec<PatternReturn>>> = members
            .iter()
            .map(|m| self.returns(*m))
            .filter(|r| !r.is_empty())
            .collect();
        if member_returns.is_empty() {
            return;
        }
        if output.is_empty() {
            output.extend(member_returns.into_iter().flatten());
            return;
        }
        let previous = std::mem::take(output);
        for prefix in &previous {
            for combination in member_returns.iter().flatten() {
                let mut joined = prefix.clone();
                joined.extend(combination.iter().cloned());
                output.push(joined);
            }
        }
    }
}

/// Builds a pattern from an expression with a leading symbol registered in a [PatternRegistry].
pub type PatternConstructor = fn(&Sexp, &mut ParseContext) -> Result<PatternId>;

/// Pattern kinds added on top of the built in ones. Built in names always take precedence.
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    constructors: FxHashMap<String, PatternConstructor>,
}

impl PatternRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, symbol: &str, constructor: PatternConstructor) {
        self.constructors.insert(symbol.to_string(), constructor);
    }

    pub fn get(&self, symbol: &str) -> Option<PatternConstructor> {
        self.constructors.get(symbol).copied()
    }
}

/// Everything a pattern needs while it is parsed.
pub struct ParseContext<'a> {
    pub bank: &'a mut PatternBank,
    pub entity_labels: &'a BTreeSet<String>,
    pub word_sets: &'a WordSetMap,
    pub registry: &'a PatternRegistry,
}

impl<'a> ParseContext<'a> {
    pub fn new(
        bank: &'a mut PatternBank,
        entity_labels: &'a BTreeSet<String>,
        word_sets: &'a WordSetMap,
        registry: &'a PatternRegistry,
    ) -> Self {
        Self {
            bank,
            entity_labels,
            word_sets,
            registry,
        }
    }

    /// Parse a pattern that may not carry a shortcut label.
    pub fn parse(&mut self, sexp: &Sexp) -> Result<PatternId> {
        parse_pattern(sexp, self, false)
    }

    /// Parse a pattern of the `reference` section.
    pub fn parse_reference(&mut self, sexp: &Sexp) -> Result<PatternId> {
        parse_pattern(sexp, self, true)
    }
}

fn parse_pattern(sexp: &Sexp, ctx: &mut ParseContext, allow_shortcut_label: bool) -> Result<PatternId> {
    let id = match sexp {
        Sexp::Atom(name) => {
            return Ok(ctx
                .bank
                .add(PatternCommon::default(), PatternKind::Shortcut(unquote(name).to_string())));
        }
        Sexp::Void => return Err(PatternError::parse("Pattern", "empty pattern", sexp)),
        Sexp::List(_) => {
            let head = sexp
                .head()
                .ok_or_else(|| PatternError::parse("Pattern", "pattern must start with its type", sexp))?;
            match head {
                "mention" => initialize(MentionPattern::default(), sexp, ctx)?,
                "argument" => {
                    if sexp.num_children()? < 2 {
                        return Err(PatternError::parse(
                            ArgumentPattern::TYPE_NAME,
                            "too few children in ArgumentPattern",
                            sexp,
                        ));
                    }
                    initialize(ArgumentPattern::default(), sexp, ctx)?
                }
                "vprop" | "nprop" | "mprop" | "sprop" | "cprop" | "anyprop" => {
                    initialize(PropPattern::for_head(head), sexp, ctx)?
                }
                "event" => initialize(ExtractionPattern::event(), sexp, ctx)?,
                "relation" => initialize(ExtractionPattern::relation(), sexp, ctx)?,
                "parse-node" => {
                    if sexp.num_children()? < 2 {
                        return Err(PatternError::parse(
                            ParseNodePattern::TYPE_NAME,
                            "too few children in ParseNodePattern",
                            sexp,
                        ));
                    }
                    initialize(ParseNodePattern::default(), sexp, ctx)?
                }
                "regex" => initialize(RegexPattern::default(), sexp, ctx)?,
                "text" => initialize(TextPattern::default(), sexp, ctx)?,
                "value" => initialize(ValueMentionPattern::default(), sexp, ctx)?,
                "topic" => initialize(TopicPattern::default(), sexp, ctx)?,
                "all-of" | "any-of" | "none-of" => {
                    let combination_type = CombinationType::from_name(head)
                        .ok_or_else(|| PatternError::internal("combination type"))?;
                    initialize(CombinationPattern::new(combination_type), sexp, ctx)?
                }
                "intersection" => initialize(IntersectionPattern::default(), sexp, ctx)?,
                "union" => initialize(UnionPattern::default(), sexp, ctx)?,
                "negation" => initialize(NegationPattern::default(), sexp, ctx)?,
                "doc" => initialize(DocPattern::default(), sexp, ctx)?,
                "quotation" => initialize(QuotationPattern::default(), sexp, ctx)?,
                other => match ctx.registry.get(other) {
                    Some(constructor) => constructor(sexp, ctx)?,
                    None => {
                        return Err(PatternError::parse(
                            "Pattern",
                            format!("unrecognized pattern type '{other}'"),
                            sexp,
                        ));
                    }
                },
            }
        }
    };
    if !allow_shortcut_label {
        if let Some(shortcut) = &ctx.bank.get(id).common.shortcut {
            return Err(PatternError::parse(
                ctx.bank.get(id).kind.type_name(),
                format!("non-reference pattern has shortcut label {shortcut}"),
                sexp,
            ));
        }
    }
    Ok(id)
}

/// The kind specific half of pattern construction.
pub trait PatternParser: Sized {
    const TYPE_NAME: &'static str;

    /// Consume an atom child. `Ok(false)` means the atom is not understood.
    fn init_atom(&mut self, atom: &str, ctx: &mut ParseContext) -> Result<bool>;

    /// Consume a list child. `Ok(false)` means the expression is not understood.
    fn init_subexpression(&mut self, sexp: &Sexp, ctx: &mut ParseContext) -> Result<bool>;

    /// Check the finished pattern as a whole.
    fn finish(&mut self, _common: &PatternCommon, _sexp: &Sexp) -> Result<()> {
        Ok(())
    }

    fn into_kind(self) -> PatternKind;
}

/// Build a pattern of kind `P` from all children of `sexp` after its leading symbol.
pub fn initialize<P: PatternParser>(mut kind: P, sexp: &Sexp, ctx: &mut ParseContext) -> Result<PatternId> {
    let mut common = PatternCommon::default();
    for child in sexp.children()?.iter().skip(1) {
        match child {
            Sexp::Atom(atom) => {
                if !common.init_atom(atom) && !kind.init_atom(atom, ctx)? {
                    return Err(PatternError::parse(
                        P::TYPE_NAME,
                        format!("unrecognized atom in pattern: {atom}"),
                        sexp,
                    ));
                }
            }
            Sexp::List(_) => {
                if !common.init_subexpression(child, P::TYPE_NAME)? && !kind.init_subexpression(child, ctx)? {
                    return Err(PatternError::parse(
                        P::TYPE_NAME,
                        format!("unrecognized subexpression in pattern: {child}"),
                        sexp,
                    ));
                }
            }
            Sexp::Void => {
                return Err(PatternError::parse(P::TYPE_NAME, "unexpected empty child", sexp));
            }
        }
    }
    kind.finish(&common, sexp)?;
    Ok(ctx.bank.add(common, kind.into_kind()))
}

/// Parse each child after the constraint name of `sexp` as a pattern.
pub fn parse_pattern_list(sexp: &Sexp, ctx: &mut ParseContext) -> Result<Vec<PatternId>> {
    sexp.children()?
        .iter()
        .skip(1)
        .map(|child| ctx.parse(child))
        .collect()
}

/// Parse the single pattern of a `(name PATTERN)` constraint.
pub fn parse_single_pattern(sexp: &Sexp, ctx: &mut ParseContext, type_name: &'static str) -> Result<PatternId> {
    match sexp.children()? {
        [_, pattern] => ctx.parse(pattern),
        _ => Err(PatternError::parse(
            type_name,
            format!("{} takes exactly one pattern", sexp.head().unwrap_or("constraint")),
            sexp,
        )),
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use crate::features::PatternReturn;
    use crate::pattern::{
        Capability, ParseContext, PatternBank, PatternId, PatternKind, PatternRegistry,
    };
    use crate::error::Result;
    use crate::sexp::{ReaderOptions, Sexp, parse};
    use crate::word_set::WordSetMap;

    fn parse_with(text: &str, registry: &PatternRegistry) -> Result<(PatternBank, PatternId)> {
        let mut bank = PatternBank::new();
        let labels = BTreeSet::new();
        let sets = WordSetMap::default();
        let sexp = parse(text, ReaderOptions::default())?;
        let id = ParseContext::new(&mut bank, &labels, &sets, registry).parse(&sexp)?;
        Ok((bank, id))
    }

    #[test]
    fn basic_common_attributes_test() {
        let (bank, id) = parse_with(
            "(mention (score 0.5) (id pres) (score_group 2) (score-fn mult) (return AGENT) SINGLE_MATCH)",
            &PatternRegistry::new(),
        )
        .unwrap();
        let pattern = bank.get(id);
        assert_eq!(pattern.score(), 0.5);
        assert_eq!(pattern.common.id.as_deref(), Some("pres"));
        assert_eq!(pattern.common.score_group, 2);
        assert!(pattern.common.single_match);
        assert_eq!(pattern.common.ret, Some(PatternReturn::Label("AGENT".to_string())));
        assert!(pattern.supports(Capability::Mention));
        assert!(!pattern.supports(Capability::EventMention));
    }

    #[test]
    fn common_attribute_errors_test() {
        let registry = PatternRegistry::new();
        assert!(parse_with("(mention (score 0.5 0.6))", &registry).is_err());
        assert!(parse_with("(mention (id a b))", &registry).is_err());
        assert!(parse_with("(mention (return A) (return B))", &registry).is_err());
        assert!(parse_with("(mention (shortcut PER))", &registry).is_err());
        assert!(parse_with("(mention FROBNICATE)", &registry).is_err());
        let err = parse_with("(frobnicate)", &registry).unwrap_err();
        assert!(err.to_string().contains("unrecognized pattern type 'frobnicate'"));
    }

    #[test]
    fn basic_shortcut_atom_test() {
        let (bank, id) = parse_with("PERSON", &PatternRegistry::new()).unwrap();
        assert_eq!(bank.get(id).kind, PatternKind::Shortcut("PERSON".to_string()));
    }

    fn person(sexp: &Sexp, ctx: &mut ParseContext) -> Result<PatternId> {
        let mut children = vec![Sexp::atom("mention"), parse("(acetype PER)", ReaderOptions::default())?];
        children.extend(sexp.children()?.iter().skip(1).cloned());
        ctx.parse(&Sexp::List(children))
    }

    #[test]
    fn basic_registry_test() {
        let mut registry = PatternRegistry::new();
        registry.register("person", person);
        let (bank, id) = parse_with("(person (id p))", &registry).unwrap();
        match &bank.get(id).kind {
            PatternKind::Mention(mention) => assert!(mention.acetypes.contains("PER")),
            other => panic!("expected a mention pattern, got {other:?}"),
        }
        assert_eq!(bank.get(id).common.id.as_deref(), Some("p"));
    }

    #[test]
    fn basic_returns_test() {
        let (bank, id) = parse_with(
            "(vprop (return EVENT) (args (argument (role <sub>) (any-of (members (mention (return A)) (mention (return B)))))))",
            &PatternRegistry::new(),
        )
        .unwrap();
        let returns = bank.returns(id);
        let labels: Vec<Vec<&str>> = returns
            .iter()
            .map(|combination| combination.iter().filter_map(PatternReturn::label).collect())
            .collect();
        assert_eq!(labels, vec![vec!["EVENT", "A"], vec!["EVENT", "B"]]);
    }
}
