//! ## Parse Node Patterns
//! A [ParseNodePattern] constrains a non-terminal node of the parse tree by its tag and head word
//! and by the children left of its head (premods), the head child itself and the children right
//! of the head (postmods).

use crate::error::{PatternError, Result};
use crate::features::{FeatureKind, PatternFeatureSet};
use crate::matcher::PatternMatcher;
use crate::pattern::{ParseContext, Pattern, PatternId, PatternKind, PatternParser, parse_pattern_list};
use crate::sexp::{Sexp, unquote};
use crate::theory::NodeId;
use crate::word_set::{WordList, WordSetMap};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParseNodePattern {
    pub tags: Vec<String>,
    pub block_tags: Vec<String>,
    pub headwords: WordList,
    pub blocked_headwords: WordList,
    pub premods: Vec<PatternId>,
    pub opt_premods: Vec<PatternId>,
    pub postmods: Vec<PatternId>,
    pub opt_postmods: Vec<PatternId>,
    pub head: Option<PatternId>,
    pub node_mention: Option<PatternId>,
    pub regex: Option<PatternId>,
}

/// Read the tags of a `tag` or `block_tag` constraint, expanding word set names.
fn read_tags(sexp: &Sexp, word_sets: &WordSetMap, tags: &mut Vec<String>) -> Result<()> {
    for child in sexp.children()?.iter().skip(1) {
        let tag = child
            .value()
            .ok_or_else(|| PatternError::parse(ParseNodePattern::TYPE_NAME, "tag must be atomic", sexp))?;
        let tag = unquote(tag);
        match word_sets.get(tag) {
            Some(set) => tags.extend(set.words.iter().cloned()),
            None => tags.push(tag.to_string()),
        }
    }
    Ok(())
}

impl PatternParser for ParseNodePattern {
    const TYPE_NAME: &'static str = "ParseNodePattern";

    fn init_atom(&mut self, _atom: &str, _ctx: &mut ParseContext) -> Result<bool> {
        Ok(false)
    }

    fn init_subexpression(&mut self, sexp: &Sexp, ctx: &mut ParseContext) -> Result<bool> {
        let Some(head) = sexp.head() else {
            return Ok(false);
        };
        let err = |reason: &str| PatternError::parse(Self::TYPE_NAME, reason, sexp);
        match head {
            "tag" => read_tags(sexp, ctx.word_sets, &mut self.tags)?,
            "block_tag" => read_tags(sexp, ctx.word_sets, &mut self.block_tags)?,
            "headword" => self.headwords.extend_from_sexp(sexp, ctx.word_sets)?,
            "block_headword" => self.blocked_headwords.extend_from_sexp(sexp, ctx.word_sets)?,
            "premod" => self.premods.extend(parse_pattern_list(sexp, ctx)?),
            "opt_premod" => self.opt_premods.extend(parse_pattern_list(sexp, ctx)?),
            "postmod" => self.postmods.extend(parse_pattern_list(sexp, ctx)?),
            "opt_postmod" => self.opt_postmods.extend(parse_pattern_list(sexp, ctx)?),
            "head" => {
                if sexp.num_children()? != 2 {
                    return Err(err("only one head pattern is allowed"));
                }
                self.head = Some(ctx.parse(sexp.nth_child(1)?)?);
            }
            "node_mention" => self.node_mention = Some(ctx.parse(sexp.nth_child(1)?)?),
            "regex" => {
                if self.regex.is_some() {
                    return Err(err("more than one regex in ParseNodePattern"));
                }
                let id = ctx.parse(sexp.nth_child(1)?)?;
                if !matches!(ctx.bank.get(id).kind, PatternKind::Regex(_) | PatternKind::Shortcut(_)) {
                    return Err(err("Expected a regex pattern"));
                }
                self.regex = Some(id);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn into_kind(self) -> PatternKind {
        PatternKind::ParseNode(self)
    }
}

impl ParseNodePattern {
    /// The first match in a pre-order walk of the tree.
    pub fn matches_sentence(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
    ) -> Result<Option<PatternFeatureSet>> {
        let parse = &pm.doc().sentence(sentence).parse;
        let mut stack = vec![parse.root()];
        while let Some(node) = stack.pop() {
            if let Some(set) = self.matches_parse_node(pm, pattern, sentence, node)? {
                return Ok(Some(set));
            }
            stack.extend(parse.node(node).children.iter().rev());
        }
        Ok(None)
    }

    pub fn multi_matches_sentence(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
    ) -> Result<Vec<PatternFeatureSet>> {
        let parse = &pm.doc().sentence(sentence).parse;
        let mut matches = Vec::new();
        let mut stack = vec![parse.root()];
        while let Some(node) = stack.pop() {
            matches.extend(self.matches_parse_node(pm, pattern, sentence, node)?);
            stack.extend(parse.node(node).children.iter().rev());
        }
        Ok(matches)
    }

    pub fn matches_parse_node(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        node: NodeId,
    ) -> Result<Option<PatternFeatureSet>> {
        let parse = &pm.doc().sentence(sentence).parse;
        if parse.is_terminal(node) {
            return Ok(None);
        }
        let syn = parse.node(node);
        if self.block_tags.contains(&syn.tag) {
            return Ok(None);
        }
        let head_word = parse.head_word(node);
        if !self.headwords.matches(Some(head_word), true) || self.blocked_headwords.matches(Some(head_word), false) {
            return Ok(None);
        }
        if !self.tags.is_empty() && !self.tags.contains(&syn.tag) {
            return Ok(None);
        }

        let mut set = PatternFeatureSet::new();
        if let Some(node_mention) = self.node_mention {
            match pm.match_parse_node(node_mention, sentence, node)? {
                Some(mention_match) => set.add_features(&mention_match),
                None => return Ok(None),
            }
        }

        let (premods, postmods) = syn.children.split_at(syn.head_index.min(syn.children.len()));
        let postmods = postmods.get(1..).unwrap_or_default();
        if !self.match_modifiers(pm, sentence, &self.premods, premods, true, &mut set)? {
            return Ok(None);
        }
        self.match_modifiers(pm, sentence, &self.opt_premods, premods, false, &mut set)?;

        if let Some(head) = self.head {
            let head_match = match parse.head(node) {
                Some(head_node) => pm.match_parse_node(head, sentence, head_node)?,
                None => None,
            };
            match head_match {
                Some(head_match) => set.add_features(&head_match),
                None => return Ok(None),
            }
        }

        if !self.match_modifiers(pm, sentence, &self.postmods, postmods, true, &mut set)? {
            return Ok(None);
        }
        self.match_modifiers(pm, sentence, &self.opt_postmods, postmods, false, &mut set)?;

        if let Some(regex) = self.regex {
            match pm.match_parse_node(regex, sentence, node)? {
                Some(regex_match) => set.add_features(&regex_match),
                None => return Ok(None),
            }
        }

        let variant = pm.language_variant();
        let span = FeatureKind::TokenSpan {
            sentence,
            start: syn.start_token,
            end: syn.end_token,
        };
        if let Some(ret) = pattern.return_feature(span.clone(), variant) {
            set.add_feature(ret);
            if let Some(ret) = pattern.return_feature(FeatureKind::ParseNode { sentence, node }, variant) {
                set.add_feature(ret);
            }
        }
        set.add_feature(pattern.feature(span, variant));
        pattern.add_id(&mut set, variant);
        set.set_score(pattern.score());
        Ok(Some(set))
    }

    /// Every pattern in `patterns` must match one of `nodes`, the first matching node wins.
    /// Returns false if a `required` pattern found no node.
    fn match_modifiers(
        &self,
        pm: &PatternMatcher,
        sentence: usize,
        patterns: &[PatternId],
        nodes: &[NodeId],
        required: bool,
        set: &mut PatternFeatureSet,
    ) -> Result<bool> {
        'patterns: for &modifier in patterns {
            for &node in nodes {
                if let Some(modifier_match) = pm.match_parse_node(modifier, sentence, node)? {
                    set.add_features(&modifier_match);
                    continue 'patterns;
                }
            }
            if required {
                return Ok(false);
            }
        }
        Ok(true)
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
        let mut st = SentenceTheory::from_treebank(
            0,
            "(S (NP (DT the) (JJ old) (NN president)) (VP (VBD left) (NP (NNP Paris))))",
        )
        .unwrap();
        let np = st.parse.find("NP", 0, 2).unwrap();
        st.add_mention(Mention::new(np, MentionType::Desc, "PER"));
        doc.add_sentence(st);
        doc
    }

    fn load(text: &str) -> PatternSet {
        PatternSet::from_str(text, &crate::pattern_set::LoadOptions::default()).unwrap()
    }

    #[test]
    fn basic_parse_node_test() {
        let doc = document();
        let set = load("(s (toplevel (parse-node (tag NP) (headword president) (premod (parse-node (tag JJ))))))");
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        let matched = matcher.match_sentence(set.top_level()[0], 0).unwrap().unwrap();
        assert!(matched.features().iter().any(|f| f.kind
            == FeatureKind::TokenSpan {
                sentence: 0,
                start: 0,
                end: 2
            }));

        let set = load("(s (toplevel (parse-node (tag NP) (postmod (parse-node (tag JJ))))))");
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        assert!(matcher.match_sentence(set.top_level()[0], 0).unwrap().is_none());
    }

    #[test]
    fn head_and_mention_test() {
        let doc = document();
        let set = load(
            "(s (toplevel (parse-node (tag NP) (head (parse-node (tag NN))) (node_mention (mention (acetype PER))))))",
        );
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        assert_eq!(matcher.multi_match_sentence(set.top_level()[0], 0).unwrap().len(), 1);

        let set = load("(s (toplevel (parse-node (tag NP) (block_headword Paris))))");
        let matcher = PatternMatcher::new(&doc, &set, MatchConfig::default()).unwrap();
        assert_eq!(matcher.multi_match_sentence(set.top_level()[0], 0).unwrap().len(), 1);
    }

    #[test]
    fn parse_node_errors_test() {
        assert!(PatternSet::from_str("(s (toplevel (parse-node)))", &LoadOptions::default()).is_err());
        assert!(PatternSet::from_str("(s (toplevel (parse-node (head (parse-node (tag NN)) (parse-node (tag NNS))))))", &LoadOptions::default()).is_err());
        assert!(PatternSet::from_str("(s (toplevel (parse-node (regex (mention)))))", &LoadOptions::default()).is_err());
    }
}
