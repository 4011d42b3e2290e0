//! ## Document Theory
//! This module contains the read-only document model the matcher runs against: a [DocTheory]
//! made of [SentenceTheory] values, each with a [Parse], [Mention]s, [Proposition]s,
//! [EventMention]s, [RelMention]s and [ValueMention]s. Nothing in here is ever mutated by
//! matching. Construction helpers exist so drivers and tests can build small documents.

use chrono::NaiveDate;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{PatternError, Result};
use crate::sexp::{ReaderOptions, Sexp, parse};

pub const REF_ROLE: &str = "<ref>";
pub const SUB_ROLE: &str = "<sub>";
pub const OBJ_ROLE: &str = "<obj>";
pub const IOBJ_ROLE: &str = "<iobj>";
pub const POSS_ROLE: &str = "<poss>";
pub const TEMP_ROLE: &str = "<temp>";
pub const LOC_ROLE: &str = "<loc>";
pub const MEMBER_ROLE: &str = "<member>";
pub const UNKNOWN_ROLE: &str = "<unknown>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MentionId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelationId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueMentionId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueId(pub usize);

/// Document wide identity of a mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MentionUid {
    pub sentence: usize,
    pub mention: MentionId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynNode {
    pub tag: String,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    /// Index of the head child in `children`.
    pub head_index: usize,
    pub start_token: usize,
    pub end_token: usize,
}

/// A parse tree stored as a node arena. Terminals are nodes without children whose tag is the
/// token text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse {
    nodes: Vec<SynNode>,
    root: NodeId,
}

impl Parse {
    /// Read a treebank style tree such as `(S (NP (NNP John)) (VP (VBD left)))`.
    pub fn from_treebank(text: &str) -> Result<Self> {
        let options = ReaderOptions {
            use_quotes: false,
            use_hash_comments: false,
        };
        let sexp = parse(text, options)?;
        let mut parse = Parse {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        let mut next_token = 0;
        parse.root = parse.add_tree(&sexp, None, &mut next_token)?;
        Ok(parse)
    }

    fn add_tree(&mut self, sexp: &Sexp, parent: Option<NodeId>, next_token: &mut usize) -> Result<NodeId> {
        let id = NodeId(self.nodes.len());
        match sexp {
            Sexp::Atom(word) => {
                self.nodes.push(SynNode {
                    tag: word.clone(),
                    children: Vec::new(),
                    parent,
                    head_index: 0,
                    start_token: *next_token,
                    end_token: *next_token,
                });
                *next_token += 1;
                Ok(id)
            }
            Sexp::List(children) if children.len() >= 2 => {
                let tag = children[0]
                    .value()
                    .ok_or_else(|| PatternError::sexp("parse node without tag", sexp))?;
                let start_token = *next_token;
                self.nodes.push(SynNode {
                    tag: tag.to_string(),
                    children: Vec::new(),
                    parent,
                    head_index: 0,
                    start_token,
                    end_token: start_token,
                });
                let mut child_ids = Vec::with_capacity(children.len() - 1);
                for child in &children[1..] {
                    child_ids.push(self.add_tree(child, Some(id), next_token)?);
                }
                let child_tags: Vec<&str> = child_ids
                    .iter()
                    .map(|c| self.nodes[c.0].tag.as_str())
                    .collect();
                let head_index = find_head(tag, &child_tags);
                let node = &mut self.nodes[id.0];
                node.children = child_ids;
                node.head_index = head_index;
                node.end_token = *next_token - 1;
                Ok(id)
            }
            _ => Err(PatternError::sexp("malformed parse node", sexp)),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &SynNode {
        &self.nodes[id.0]
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn is_terminal(&self, id: NodeId) -> bool {
        self.node(id).children.is_empty()
    }

    pub fn is_preterminal(&self, id: NodeId) -> bool {
        let node = self.node(id);
        node.children.len() == 1 && self.is_terminal(node.children[0])
    }

    pub fn head(&self, id: NodeId) -> Option<NodeId> {
        let node = self.node(id);
        node.children.get(node.head_index).copied()
    }

    /// Follow head children down to the preterminal.
    pub fn head_preterm(&self, id: NodeId) -> NodeId {
        let mut current = id;
        if self.is_terminal(current) {
            return self.node(current).parent.unwrap_or(current);
        }
        while !self.is_preterminal(current) {
            match self.head(current) {
                Some(head) if !self.is_terminal(head) => current = head,
                _ => break,
            }
        }
        current
    }

    pub fn head_word(&self, id: NodeId) -> &str {
        let preterm = self.head_preterm(id);
        match self.node(preterm).children.first() {
            Some(terminal) => &self.node(*terminal).tag,
            None => &self.node(preterm).tag,
        }
    }

    /// Terminal text in token order.
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens: Vec<(usize, String)> = self
            .nodes
            .iter()
            .filter(|n| n.children.is_empty())
            .map(|n| (n.start_token, n.tag.clone()))
            .collect();
        tokens.sort();
        tokens.into_iter().map(|(_, t)| t).collect()
    }

    /// The first node, in creation order, with the given tag and token span.
    pub fn find(&self, tag: &str, start_token: usize, end_token: usize) -> Option<NodeId> {
        self.node_ids().find(|id| {
            let node = self.node(*id);
            node.tag == tag && node.start_token == start_token && node.end_token == end_token
        })
    }

    /// The preterminal covering token `index`.
    pub fn preterminal(&self, index: usize) -> Option<NodeId> {
        self.node_ids()
            .find(|id| self.is_preterminal(*id) && self.node(*id).start_token == index)
    }

    /// The smallest node whose span contains `[start_token, end_token]`.
    pub fn covering_node(&self, start_token: usize, end_token: usize) -> NodeId {
        let mut current = self.root;
        loop {
            let next = self.node(current).children.iter().copied().find(|c| {
                let child = self.node(*c);
                child.start_token <= start_token && child.end_token >= end_token
            });
            match next {
                Some(child) if !self.is_terminal(child) => current = child,
                _ => return current,
            }
        }
    }
}

fn find_head(tag: &str, child_tags: &[&str]) -> usize {
    let position = |pred: &dyn Fn(&str) -> bool| child_tags.iter().position(|t| pred(t));
    let rposition = |pred: &dyn Fn(&str) -> bool| child_tags.iter().rposition(|t| pred(t));
    let found = match tag {
        "NP" | "NPA" | "NPP" | "NX" => rposition(&|t| t.starts_with("NN") || t == "PRP"),
        "S" | "SQ" | "SINV" => position(&|t| t == "VP"),
        "VP" => position(&|t| t.starts_with("VB") || t == "MD"),
        "PP" => position(&|t| t == "IN" || t == "TO"),
        "ADJP" => position(&|t| t.starts_with("JJ")),
        _ => None,
    };
    match (found, tag) {
        (Some(idx), _) => idx,
        (None, "NP" | "NPA" | "NPP" | "NX") => child_tags.len() - 1,
        _ => 0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MentionType {
    None,
    Name,
    Desc,
    Pron,
    Part,
    Appo,
    List,
    Nest,
    Infl,
}

impl MentionType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "none" => Some(MentionType::None),
            "name" => Some(MentionType::Name),
            "desc" => Some(MentionType::Desc),
            "pron" => Some(MentionType::Pron),
            "part" => Some(MentionType::Part),
            "appo" => Some(MentionType::Appo),
            "list" => Some(MentionType::List),
            "nest" => Some(MentionType::Nest),
            "infl" => Some(MentionType::Infl),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MentionType::None => "none",
            MentionType::Name => "name",
            MentionType::Desc => "desc",
            MentionType::Pron => "pron",
            MentionType::Part => "part",
            MentionType::Appo => "appo",
            MentionType::List => "list",
            MentionType::Nest => "nest",
            MentionType::Infl => "infl",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub node: NodeId,
    pub mention_type: MentionType,
    pub entity_type: String,
    pub entity_subtype: Option<String>,
    pub parent: Option<MentionId>,
    pub child: Option<MentionId>,
    pub next: Option<MentionId>,
}

impl Mention {
    pub fn new(node: NodeId, mention_type: MentionType, entity_type: &str) -> Self {
        Self {
            node,
            mention_type,
            entity_type: entity_type.to_string(),
            entity_subtype: None,
            parent: None,
            child: None,
            next: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateType {
    Verb,
    Copula,
    Modifier,
    Noun,
    Poss,
    Loc,
    Set,
    Comp,
    Name,
    Pronoun,
}

impl PredicateType {
    pub fn name(&self) -> &'static str {
        match self {
            PredicateType::Verb => "verb",
            PredicateType::Copula => "copula",
            PredicateType::Modifier => "modifier",
            PredicateType::Noun => "noun",
            PredicateType::Poss => "poss",
            PredicateType::Loc => "loc",
            PredicateType::Set => "set",
            PredicateType::Comp => "comp",
            PredicateType::Name => "name",
            PredicateType::Pronoun => "pronoun",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropStatus {
    Negative,
    Alleged,
    Modal,
    If,
    Future,
    Unreliable,
    Hypothetical,
}

impl PropStatus {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "NEGATIVE" => Some(PropStatus::Negative),
            "ALLEGED" => Some(PropStatus::Alleged),
            "MODAL" => Some(PropStatus::Modal),
            "IF" => Some(PropStatus::If),
            "FUTURE" => Some(PropStatus::Future),
            "UNRELIABLE" => Some(PropStatus::Unreliable),
            "HYPOTHETICAL" => Some(PropStatus::Hypothetical),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PropStatus::Negative => "NEGATIVE",
            PropStatus::Alleged => "ALLEGED",
            PropStatus::Modal => "MODAL",
            PropStatus::If => "IF",
            PropStatus::Future => "FUTURE",
            PropStatus::Unreliable => "UNRELIABLE",
            PropStatus::Hypothetical => "HYPOTHETICAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentValue {
    Mention(MentionId),
    Proposition(PropId),
    Text(NodeId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub role: String,
    pub value: ArgumentValue,
}

impl Argument {
    pub fn mention(role: &str, mention: MentionId) -> Self {
        Self {
            role: role.to_string(),
            value: ArgumentValue::Mention(mention),
        }
    }

    pub fn proposition(role: &str, prop: PropId) -> Self {
        Self {
            role: role.to_string(),
            value: ArgumentValue::Proposition(prop),
        }
    }

    pub fn text(role: &str, node: NodeId) -> Self {
        Self {
            role: role.to_string(),
            value: ArgumentValue::Text(node),
        }
    }

    pub fn is_ref(&self) -> bool {
        self.role == REF_ROLE
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposition {
    pub pred_type: PredicateType,
    pub pred_head: Option<NodeId>,
    pub particle: Option<NodeId>,
    pub adverb: Option<NodeId>,
    pub negation: Option<NodeId>,
    pub modal: Option<NodeId>,
    pub args: Vec<Argument>,
    pub statuses: Vec<PropStatus>,
}

impl Proposition {
    pub fn new(pred_type: PredicateType, pred_head: Option<NodeId>, args: Vec<Argument>) -> Self {
        Self {
            pred_type,
            pred_head,
            particle: None,
            adverb: None,
            negation: None,
            modal: None,
            args,
            statuses: Vec::new(),
        }
    }

    /// The mention of a leading `<ref>` argument.
    pub fn ref_mention(&self) -> Option<MentionId> {
        match self.args.first() {
            Some(Argument {
                role,
                value: ArgumentValue::Mention(m),
            }) if role == REF_ROLE => Some(*m),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMention {
    pub event_type: String,
    pub anchor_node: NodeId,
    pub anchor_prop: Option<PropId>,
    pub args: Vec<(String, MentionId)>,
    pub value_args: Vec<(String, ValueMentionId)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelMention {
    pub rel_type: String,
    pub left: MentionId,
    pub right: MentionId,
    pub time_arg: Option<(String, ValueMentionId)>,
}

/// Roles under which relation arguments are offered to argument patterns.
pub const REL_LEFT_ROLE: &str = "arg1";
pub const REL_RIGHT_ROLE: &str = "arg2";

impl RelMention {
    pub fn mention_args(&self) -> [(&'static str, MentionId); 2] {
        [(REL_LEFT_ROLE, self.left), (REL_RIGHT_ROLE, self.right)]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueMention {
    pub value_type: String,
    pub start_token: usize,
    pub end_token: usize,
    pub value: Option<ValueId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    pub full_type: String,
    pub timex: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub entity_type: String,
    pub subtype: Option<String>,
    pub generic: bool,
    pub mentions: Vec<MentionUid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceTheory {
    pub number: usize,
    pub tokens: Vec<String>,
    pub parse: Parse,
    pub mentions: Vec<Mention>,
    pub propositions: Vec<Proposition>,
    pub events: Vec<EventMention>,
    pub relations: Vec<RelMention>,
    pub value_mentions: Vec<ValueMention>,
}

impl SentenceTheory {
    /// Create a new sentence from a treebank parse with no further annotation.
    pub fn from_treebank(number: usize, tree: &str) -> Result<Self> {
        let parse = Parse::from_treebank(tree)?;
        Ok(Self {
            number,
            tokens: parse.tokens(),
            parse,
            mentions: Vec::new(),
            propositions: Vec::new(),
            events: Vec::new(),
            relations: Vec::new(),
            value_mentions: Vec::new(),
        })
    }

    pub fn add_mention(&mut self, mention: Mention) -> MentionId {
        self.mentions.push(mention);
        MentionId(self.mentions.len() - 1)
    }

    pub fn add_proposition(&mut self, prop: Proposition) -> PropId {
        self.propositions.push(prop);
        PropId(self.propositions.len() - 1)
    }

    pub fn add_event(&mut self, event: EventMention) -> EventId {
        self.events.push(event);
        EventId(self.events.len() - 1)
    }

    pub fn add_relation(&mut self, relation: RelMention) -> RelationId {
        self.relations.push(relation);
        RelationId(self.relations.len() - 1)
    }

    pub fn add_value_mention(&mut self, value_mention: ValueMention) -> ValueMentionId {
        self.value_mentions.push(value_mention);
        ValueMentionId(self.value_mentions.len() - 1)
    }

    /// Link a LIST or PART mention to its first child and the children to each other.
    pub fn link_children(&mut self, parent: MentionId, children: &[MentionId]) {
        if let Some(first) = children.first() {
            self.mentions[parent.0].child = Some(*first);
        }
        for (idx, child) in children.iter().enumerate() {
            self.mentions[child.0].parent = Some(parent);
            self.mentions[child.0].next = children.get(idx + 1).copied();
        }
    }

    pub fn mention(&self, id: MentionId) -> &Mention {
        &self.mentions[id.0]
    }

    pub fn proposition(&self, id: PropId) -> &Proposition {
        &self.propositions[id.0]
    }

    pub fn value_mention(&self, id: ValueMentionId) -> &ValueMention {
        &self.value_mentions[id.0]
    }

    pub fn mention_ids(&self) -> impl Iterator<Item = MentionId> + '_ {
        (0..self.mentions.len()).map(MentionId)
    }

    pub fn prop_ids(&self) -> impl Iterator<Item = PropId> + '_ {
        (0..self.propositions.len()).map(PropId)
    }

    pub fn mention_span(&self, id: MentionId) -> (usize, usize) {
        let node = self.parse.node(self.mention(id).node);
        (node.start_token, node.end_token)
    }

    /// The head node of a mention: the head preterminal of its node.
    pub fn mention_head(&self, id: MentionId) -> NodeId {
        self.parse.head_preterm(self.mention(id).node)
    }

    pub fn mention_head_word(&self, id: MentionId) -> &str {
        self.parse.head_word(self.mention(id).node)
    }

    /// The children of a LIST or PART mention, following the child/next chain.
    pub fn mention_children(&self, id: MentionId) -> Vec<MentionId> {
        let mut children = Vec::new();
        let mut current = self.mention(id).child;
        while let Some(child) = current {
            if children.contains(&child) {
                break;
            }
            children.push(child);
            current = self.mention(child).next;
        }
        children
    }

    /// The proposition defining a mention: one whose first argument is a `<ref>` to it.
    pub fn definition(&self, mention: MentionId) -> Option<PropId> {
        self.prop_ids()
            .find(|p| self.proposition(*p).ref_mention() == Some(mention))
    }

    pub fn word(&self, node: Option<NodeId>) -> Option<&str> {
        node.map(|n| self.parse.head_word(n))
    }

    pub fn pred_word(&self, prop: PropId) -> Option<&str> {
        self.word(self.proposition(prop).pred_head)
    }

    pub fn argument_span(&self, arg: &Argument) -> (usize, usize) {
        match arg.value {
            ArgumentValue::Mention(m) => self.mention_span(m),
            ArgumentValue::Text(n) => {
                let node = self.parse.node(n);
                (node.start_token, node.end_token)
            }
            ArgumentValue::Proposition(p) => self.proposition_span(p),
        }
    }

    /// The span covered by the predicate head and all non-proposition arguments.
    pub fn proposition_span(&self, prop: PropId) -> (usize, usize) {
        let prop = self.proposition(prop);
        let mut spans: Vec<(usize, usize)> = Vec::new();
        if let Some(head) = prop.pred_head {
            let node = self.parse.node(head);
            spans.push((node.start_token, node.end_token));
        }
        for arg in &prop.args {
            match arg.value {
                ArgumentValue::Proposition(_) => {}
                _ => spans.push(self.argument_span(arg)),
            }
        }
        let start = spans.iter().map(|s| s.0).min().unwrap_or(0);
        let end = spans.iter().map(|s| s.1).max().unwrap_or(0);
        (start, end)
    }

    /// The proposition an argument leads to: a proposition argument's value or the definition
    /// of a mention argument.
    pub fn argument_proposition(&self, arg: &Argument) -> Option<PropId> {
        match arg.value {
            ArgumentValue::Proposition(p) => Some(p),
            ArgumentValue::Mention(m) => self.definition(m),
            ArgumentValue::Text(_) => None,
        }
    }

    /// Whether following argument `arg` of `prop` leads back to `prop`.
    pub fn argument_has_cycle(&self, prop: PropId, arg: &Argument) -> bool {
        let mut visited: FxHashSet<PropId> = FxHashSet::default();
        let mut stack: Vec<PropId> = self.argument_proposition(arg).into_iter().collect();
        while let Some(current) = stack.pop() {
            if current == prop {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            for next in &self.proposition(current).args {
                if next.is_ref() {
                    continue;
                }
                if let Some(target) = self.argument_proposition(next) {
                    stack.push(target);
                }
            }
        }
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTheory {
    pub name: String,
    pub date: Option<NaiveDate>,
    pub sentences: Vec<SentenceTheory>,
    pub entities: Vec<Entity>,
    pub values: Vec<Value>,
    /// Bit string word cluster per lower-cased word.
    pub word_clusters: FxHashMap<String, String>,
    mention_entities: FxHashMap<MentionUid, EntityId>,
}

impl DocTheory {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            date: None,
            sentences: Vec::new(),
            entities: Vec::new(),
            values: Vec::new(),
            word_clusters: FxHashMap::default(),
            mention_entities: FxHashMap::default(),
        }
    }

    pub fn add_sentence(&mut self, mut sentence: SentenceTheory) -> usize {
        sentence.number = self.sentences.len();
        self.sentences.push(sentence);
        self.sentences.len() - 1
    }

    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.entities.len());
        for uid in &entity.mentions {
            self.mention_entities.insert(*uid, id);
        }
        self.entities.push(entity);
        id
    }

    pub fn add_value(&mut self, value: Value) -> ValueId {
        self.values.push(value);
        ValueId(self.values.len() - 1)
    }

    pub fn sentence(&self, number: usize) -> &SentenceTheory {
        &self.sentences[number]
    }

    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.0]
    }

    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.0]
    }

    pub fn entity_of(&self, uid: MentionUid) -> Option<EntityId> {
        self.mention_entities.get(&uid).copied()
    }

    fn entity_has_mention_type(&self, entity: EntityId, types: &[MentionType]) -> bool {
        self.entity(entity).mentions.iter().any(|uid| {
            let sentence = self.sentence(uid.sentence);
            types.contains(&sentence.mention(uid.mention).mention_type)
        })
    }

    pub fn has_name_mention(&self, entity: EntityId) -> bool {
        self.entity_has_mention_type(entity, &[MentionType::Name])
    }

    pub fn has_name_or_desc_mention(&self, entity: EntityId) -> bool {
        self.entity_has_mention_type(entity, &[MentionType::Name, MentionType::Desc])
    }

    /// Cluster bit string of a word, if known.
    pub fn word_cluster(&self, word: &str) -> Option<&str> {
        self.word_clusters
            .get(&word.to_lowercase())
            .map(String::as_str)
    }
}

/// The language and variant a document or pattern belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LanguageVariant {
    pub language: Option<String>,
    pub variant: Option<String>,
}

impl LanguageVariant {
    pub fn new(language: &str, variant: &str) -> Self {
        Self {
            language: Some(language.to_string()),
            variant: Some(variant.to_string()),
        }
    }

    /// Whether `self` satisfies `constraint`: every part the constraint names must be equal.
    pub fn satisfies(&self, constraint: &LanguageVariant) -> bool {
        let part = |want: &Option<String>, have: &Option<String>| match want {
            None => true,
            Some(want) => have.as_ref() == Some(want),
        };
        part(&constraint.language, &self.language) && part(&constraint.variant, &self.variant)
    }
}

#[cfg(test)]
mod test {
    use crate::theory::{
        Argument, MentionType, Mention, Parse, PredicateType, Proposition, REF_ROLE, SUB_ROLE,
        SentenceTheory,
    };

    #[test]
    fn basic_parse_test() {
        let parse =
            Parse::from_treebank("(S (NP (DT the) (NN president)) (VP (VBD left)))").unwrap();
        assert_eq!(parse.tokens(), vec!["the", "president", "left"]);
        let root = parse.root();
        assert_eq!(parse.head_word(root), "left");
        let np = parse.find("NP", 0, 1).unwrap();
        assert_eq!(parse.head_word(np), "president");
        assert_eq!(parse.node(parse.head_preterm(np)).tag, "NN");
        assert!(parse.is_preterminal(parse.preterminal(2).unwrap()));
    }

    #[test]
    fn basic_definition_test() {
        let mut sentence =
            SentenceTheory::from_treebank(0, "(S (NP (NNP Bob)) (VP (VBD left)))").unwrap();
        let np = sentence.parse.find("NP", 0, 0).unwrap();
        let vbd = sentence.parse.preterminal(1).unwrap();
        let bob = sentence.add_mention(Mention::new(np, MentionType::Name, "PER"));
        let name_prop = sentence.add_proposition(Proposition::new(
            PredicateType::Name,
            Some(np),
            vec![Argument::mention(REF_ROLE, bob)],
        ));
        let verb_prop = sentence.add_proposition(Proposition::new(
            PredicateType::Verb,
            Some(vbd),
            vec![Argument::mention(SUB_ROLE, bob)],
        ));
        assert_eq!(sentence.definition(bob), Some(name_prop));
        assert_eq!(sentence.pred_word(verb_prop), Some("left"));
        assert_eq!(sentence.proposition_span(verb_prop), (0, 1));
        let arg = sentence.proposition(verb_prop).args[0].clone();
        assert!(!sentence.argument_has_cycle(verb_prop, &arg));
    }
}
