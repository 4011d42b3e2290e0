//! ## Pretty Printing
//! This module contains the [BankPrettyPrint] trait which can be implemented for types that may
//! be pretty printed given some information from a pattern bank. Patterns print as the
//! s-expression they were read from, so a dump can be read back into an equivalent pattern.
//! A sub-pattern carrying a shortcut label prints as its shortcut name.

use crate::combination::CombinationType;
use crate::pattern::{Pattern, PatternBank, PatternCommon, PatternId, PatternKind};
use crate::scoring::{ScoringFunction, UNSPECIFIED_SCORE, UNSPECIFIED_SCORE_GROUP};
use crate::value_mention_pattern::DateStatus;
use crate::word_set::quote_word;

/// Types that can be pretty printed using information from a [PatternBank]
pub trait BankPrettyPrint {
    /// Print the representation of `self` into `acc` using information from `bank`.
    fn print_into(&self, bank: &PatternBank, acc: &mut String);
}

/// Pretty print some value that implements [BankPrettyPrint] to a string using information from
/// `bank`.
pub fn pretty_print<T: BankPrettyPrint>(t: &T, bank: &PatternBank) -> String {
    let mut acc = String::new();
    t.print_into(bank, &mut acc);
    acc
}

/// The full s-expression of pattern `id`.
pub fn dump(bank: &PatternBank, id: PatternId) -> String {
    pretty_print(bank.get(id), bank)
}

/// A sub-pattern: its shortcut name if it has one, the full expression otherwise.
fn print_child(bank: &PatternBank, id: PatternId, acc: &mut String) {
    let pattern = bank.get(id);
    match (&pattern.kind, &pattern.common.shortcut) {
        (PatternKind::Shortcut(name), _) | (_, Some(name)) => acc.push_str(&quote_word(name)),
        _ => pattern.print_into(bank, acc),
    }
}

fn flag(acc: &mut String, set: bool, name: &str) {
    if set {
        acc.push(' ');
        acc.push_str(name);
    }
}

fn words<I, S>(acc: &mut String, name: &str, words: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut words = words.into_iter().peekable();
    if words.peek().is_none() {
        return;
    }
    acc.push_str(" (");
    acc.push_str(name);
    for word in words {
        acc.push(' ');
        acc.push_str(&quote_word(word.as_ref()));
    }
    acc.push(')');
}

fn value(acc: &mut String, name: &str, value: impl std::fmt::Display) {
    acc.push_str(&format!(" ({name} {value})"));
}

fn child(bank: &PatternBank, acc: &mut String, name: &str, id: Option<PatternId>) {
    if let Some(id) = id {
        acc.push_str(" (");
        acc.push_str(name);
        acc.push(' ');
        print_child(bank, id, acc);
        acc.push(')');
    }
}

fn children(bank: &PatternBank, acc: &mut String, name: &str, ids: &[PatternId]) {
    if ids.is_empty() {
        return;
    }
    acc.push_str(" (");
    acc.push_str(name);
    for &id in ids {
        acc.push(' ');
        print_child(bank, id, acc);
    }
    acc.push(')');
}

impl BankPrettyPrint for PatternCommon {
    fn print_into(&self, _bank: &PatternBank, acc: &mut String) {
        if let Some(shortcut) = &self.shortcut {
            value(acc, "shortcut", quote_word(shortcut));
        }
        if let Some(id) = &self.id {
            value(acc, "id", quote_word(id));
        }
        if self.score != UNSPECIFIED_SCORE {
            value(acc, "score", self.score);
        }
        if self.score_group != UNSPECIFIED_SCORE_GROUP {
            value(acc, "score_group", self.score_group);
        }
        if self.scoring != ScoringFunction::default() {
            value(acc, "score-fn", self.scoring.name());
        }
        if let Some(ret) = &self.ret {
            let name = if self.toplevel_return { "toplevel-return" } else { "return" };
            value(acc, name, ret);
        }
        if let Some(variant) = &self.language_variant {
            if let Some(language) = &variant.language {
                value(acc, "language", quote_word(language));
            }
            if let Some(variant) = &variant.variant {
                value(acc, "variant", quote_word(variant));
            }
        }
        flag(acc, self.single_match, "SINGLE_MATCH");
    }
}

impl BankPrettyPrint for Pattern {
    fn print_into(&self, bank: &PatternBank, acc: &mut String) {
        if let PatternKind::Shortcut(name) = &self.kind {
            acc.push_str(&quote_word(name));
            return;
        }
        acc.push('(');
        match &self.kind {
            PatternKind::Shortcut(_) => {}
            PatternKind::Mention(p) => {
                acc.push_str("mention");
                flag(acc, p.is_focus, "FOCUS");
                flag(acc, p.is_specific, "SPECIFIC");
                flag(acc, p.is_generic, "GENERIC");
                flag(acc, p.is_appositive, "APPOSITIVE");
                flag(acc, p.is_appositive_child, "APPOSITIVE_CHILD");
                flag(acc, p.is_named_appositive_child, "NAMED_APPOSITIVE_CHILD");
                flag(acc, p.block_fall_through, "BLOCK_FALL_THROUGH");
                words(acc, "acetype", &p.acetypes);
                words(acc, "acesubtype", &p.acesubtypes);
                words(acc, "block_acetype", &p.blocked_acetypes);
                words(acc, "mentiontype", p.mention_types.iter().map(|t| t.name()));
                if p.requires_name {
                    value(acc, "min-entitylevel", "NAME");
                } else if p.requires_name_or_desc {
                    value(acc, "min-entitylevel", "DESC");
                }
                words(acc, "entitylabel", &p.entity_labels);
                words(acc, "block", &p.blocking_entity_labels);
                words(acc, "headword", p.headwords.entries());
                words(acc, "block_headword", p.blocked_headwords.entries());
                for c in &p.comparisons {
                    acc.push_str(&format!(" ({} {} {})", c.scope.name(), c.op.name(), c.value));
                }
                if let Some(bits) = &p.brown_cluster {
                    value(acc, "brown_cluster", bits);
                }
                child(bank, acc, if p.head_regex { "head-regex" } else { "regex" }, p.regex);
                child(bank, acc, "prop-def", p.prop_def);
                for aop in &p.arg_of_props {
                    acc.push_str(" (arg-of-prop");
                    words(acc, "role", &aop.roles);
                    acc.push(' ');
                    print_child(bank, aop.prop, acc);
                    acc.push(')');
                }
            }
            PatternKind::Prop(p) => {
                acc.push_str(p.head_name());
                flag(acc, p.negative, "NEGATIVE");
                flag(acc, p.block_fall_through, "BLOCK_FALL_THROUGH");
                flag(acc, p.one_to_one, "ONE_TO_ONE");
                flag(acc, p.many_to_many, "MANY_TO_MANY");
                flag(acc, p.match_all_args, "MATCH_ALL_ARGS");
                flag(acc, p.stem_predicate, "STEM_PREDICATE");
                words(acc, "predicate", p.predicates.entries());
                words(acc, "block_predicate", p.blocked_predicates.entries());
                words(acc, "particle", p.particles.entries());
                words(acc, "adj", p.adjectives.entries());
                words(acc, "block_adj", p.blocked_adjectives.entries());
                words(acc, "adverb_or_particle", p.adverbs_or_particles.entries());
                words(acc, "block_adv_part", p.blocked_adverbs_or_particles.entries());
                words(acc, "negation", p.negations.entries());
                words(acc, "block_negation", p.blocked_negations.entries());
                words(acc, "modal", p.modals.entries());
                words(acc, "block_modal", p.blocked_modals.entries());
                if let (Some(psm), false) = (&p.psm, p.negative) {
                    acc.push(' ');
                    acc.push_str(&psm.to_string());
                }
                child(bank, acc, "regex", p.regex);
                children(bank, acc, "args", &p.args);
                children(bank, acc, "opt_args", &p.opt_args);
                children(bank, acc, "block_args", &p.block_args);
                if let Some(propmod) = &p.propmod {
                    acc.push_str(" (propmod (role");
                    for role in &propmod.roles {
                        acc.push(' ');
                        acc.push_str(&quote_word(role));
                    }
                    acc.push_str(") ");
                    print_child(bank, propmod.pattern, acc);
                    acc.push(')');
                }
            }
            PatternKind::Argument(p) => {
                acc.push_str("argument");
                words(acc, "role", &p.roles);
                flag(acc, p.optional, "OPTIONAL");
                words(acc, "block_role", &p.block_roles);
                words(acc, "allow_fall_through", &p.fall_through_roles);
                if let Some(inner) = p.pattern {
                    acc.push(' ');
                    print_child(bank, inner, acc);
                }
            }
            PatternKind::Event(p) | PatternKind::Relation(p) => {
                acc.push_str(p.head_name());
                flag(acc, p.match_all_args, "MATCH_ALL_ARGS");
                words(acc, "type", &p.types);
                words(acc, "block_type", &p.block_types);
                child(bank, acc, "anchor", p.anchor);
                children(bank, acc, "args", &p.args);
                children(bank, acc, "opt_args", &p.opt_args);
                children(bank, acc, "block_args", &p.block_args);
            }
            PatternKind::ParseNode(p) => {
                acc.push_str("parse-node");
                words(acc, "tag", &p.tags);
                words(acc, "block_tag", &p.block_tags);
                words(acc, "headword", p.headwords.entries());
                words(acc, "block_headword", p.blocked_headwords.entries());
                children(bank, acc, "premod", &p.premods);
                children(bank, acc, "opt_premod", &p.opt_premods);
                children(bank, acc, "postmod", &p.postmods);
                children(bank, acc, "opt_postmod", &p.opt_postmods);
                child(bank, acc, "head", p.head);
                child(bank, acc, "node_mention", p.node_mention);
                child(bank, acc, "regex", p.regex);
            }
            PatternKind::Regex(p) => {
                acc.push_str("regex");
                flag(acc, !p.allow_heads, "DONT_ALLOW_HEADS");
                flag(acc, p.top_mentions_only, "TOP_MENTIONS_ONLY");
                flag(acc, p.match_full_extent, "MATCH_FULL_EXTENT");
                flag(acc, !p.add_spaces, "DONT_ADD_SPACES");
                children(bank, acc, "re", &p.subpatterns);
            }
            PatternKind::Text(p) => {
                acc.push_str("text");
                flag(acc, p.raw, "RAW_TEXT");
                words(acc, "string", p.text.split_whitespace());
            }
            PatternKind::ValueMention(p) => {
                acc.push_str("value");
                flag(acc, p.specific_date, "SPECIFIC-DATE");
                flag(acc, p.recent_date, "RECENT-DATE");
                flag(acc, p.future_date, "FUTURE-DATE");
                words(acc, "type", &p.value_types);
                if p.activity_date != DateStatus::default() {
                    value(acc, "activity-date", p.activity_date.name());
                }
                for f in &p.frequencies {
                    acc.push_str(&format!(" ({} {} {})", f.name(), f.op.name(), f.value));
                }
                child(bank, acc, "regex", p.regex);
            }
            PatternKind::Topic(p) => {
                acc.push_str("topic");
                words(acc, "slot", &p.slot);
                if let Some(threshold) = p.threshold {
                    value(acc, "threshold", threshold);
                }
                if p.context != 1 {
                    value(acc, "context", p.context);
                }
                if p.forward_range > 0 {
                    value(acc, "forward_range", p.forward_range);
                }
                if p.backward_range > 0 {
                    value(acc, "backward_range", p.backward_range);
                }
                if p.real_scores {
                    value(acc, "score_type", "real");
                }
                if let Some(min) = p.min_nodes {
                    value(acc, "min_nodes", min);
                }
                if let Some(max) = p.max_nodes {
                    value(acc, "max_nodes", max);
                }
            }
            PatternKind::Combination(p) => {
                acc.push_str(p.combination_type.name());
                flag(acc, p.greedy && p.combination_type == CombinationType::AnyOf, "GREEDY");
                if let Some(psm) = &p.psm {
                    acc.push(' ');
                    acc.push_str(&psm.to_string());
                }
                children(bank, acc, "members", &p.members);
            }
            PatternKind::Intersection(p) => {
                acc.push_str("intersection");
                children(bank, acc, "members", &p.members);
            }
            PatternKind::Union(p) => {
                acc.push_str("union");
                flag(acc, p.greedy, "GREEDY");
                children(bank, acc, "members", &p.members);
            }
            PatternKind::Negation(p) => {
                acc.push_str("negation");
                if let Some(inner) = p.pattern {
                    acc.push(' ');
                    print_child(bank, inner, acc);
                }
            }
            PatternKind::Doc(p) => {
                acc.push_str("doc");
                children(bank, acc, "members", &p.members);
            }
            PatternKind::Quotation(p) => {
                acc.push_str("quotation");
                child(bank, acc, "speaker", p.speaker);
                if p.min_tokens != 1 {
                    value(acc, "min_tokens", p.min_tokens);
                }
            }
        }
        self.common.print_into(bank, acc);
        acc.push(')');
    }
}

#[cfg(test)]
mod test {
    use crate::pattern_set::{LoadOptions, PatternSet};
    use crate::pretty_print::dump;

    fn dump_top(text: &str) -> String {
        let set = PatternSet::from_str(text, &LoadOptions::default()).unwrap();
        dump(set.bank(), set.top_level()[0])
    }

    fn round_trip(pattern: &str) {
        let first = dump_top(&format!("(s (toplevel {pattern}))"));
        let second = dump_top(&format!("(s (toplevel {first}))"));
        assert_eq!(first, second, "{pattern}");
    }

    #[test]
    fn basic_dump_test() {
        assert_eq!(
            dump_top("(s (toplevel (mention (acetype PER) (score 0.5) (id pres))))"),
            "(mention (acetype PER) (id pres) (score 0.5))"
        );
        assert_eq!(
            dump_top("(s (reference (mention (shortcut PERSON) (acetype PER))) (toplevel (negation PERSON)))"),
            "(negation PERSON)"
        );
    }

    #[test]
    fn round_trip_test() {
        let patterns = [
            "(mention FOCUS (acetype PER ORG) (mentiontype name) (headword pres* leader) (doc_etype_freq >= 2) \
              (min-entitylevel DESC) (return AGENT) SINGLE_MATCH)",
            "(vprop NEGATIVE MANY_TO_MANY (predicate say tell) (args (argument (role <sub>) OPTIONAL (mention (acetype PER)))) \
              (propmod (role <ref>) (nprop (predicate leader))) (score-fn mult))",
            "(event (type Attack) (anchor (vprop (predicate attack))) (args (argument (role Target) (mention))))",
            "(parse-node (tag NP) (head (parse-node (tag NN) (headword dog))) (opt_premod (parse-node (tag JJ))))",
            "(regex MATCH_FULL_EXTENT (re (text RAW_TEXT (string a \"(b\")) (mention (acetype PER))) (return (role A) (type X)))",
            "(value RECENT-DATE (type TIMEX2.TIME) (activity-date IN_RANGE) (sent_vtype_freq < 3))",
            "(topic (slot floods coast) (threshold 0.5) (backward_range 1) (score_type real) (max_nodes 4))",
            "(any-of GREEDY (psm (block MODAL)) (members (vprop) (nprop)))",
            "(union GREEDY (members (mention) (intersection (members (vprop) (quotation (min_tokens 2))))))",
            "(doc (members (mention (acetype GPE))) (id D) (language en) (variant formal))",
        ];
        for pattern in patterns {
            round_trip(pattern);
        }
    }

    fn checked_round_trip(references: &str, pattern: &str, expected: &[&str]) {
        let first = dump_top(&format!("(s {references} (toplevel {pattern}))"));
        for fragment in expected {
            assert!(first.contains(fragment), "{first} lacks {fragment}");
        }
        let second = dump_top(&format!("(s {references} (toplevel {first}))"));
        assert_eq!(first, second, "{pattern}");
    }

    #[test]
    fn dump_keeps_constraints_test() {
        checked_round_trip(
            "",
            "(relation (type Located) (args (argument (role arg1) (mention (acetype PER))) \
              (argument (role arg2) (mention (acetype GPE)))) (id loc) (score 0.7))",
            &[
                "(relation (type Located) (args (argument (role arg1) (mention (acetype PER))) \
                 (argument (role arg2) (mention (acetype GPE))))",
                "(id loc)",
                "(score 0.7)",
            ],
        );
        checked_round_trip(
            "",
            "(argument (role sub obj) OPTIONAL (block_role loc) (mention (acetype PER)))",
            &["(argument (role <sub> <obj>) OPTIONAL (block_role <loc>) (mention (acetype PER)))"],
        );
        checked_round_trip(
            "",
            "(negation (mention (acetype PER) (mentiontype desc name)) (id neg))",
            &["(negation (mention (acetype PER) (mentiontype desc name)) (id neg))"],
        );
        checked_round_trip(
            "",
            "(none-of (members (mention (acetype ORG)) (mention (mentiontype pron))) (score 0.2))",
            &["(none-of (members (mention (acetype ORG)) (mention (mentiontype pron)))", "(score 0.2)"],
        );
        checked_round_trip(
            "",
            "(all-of (members (argument (role sub) (mention)) (argument (role obj) (mention (acetype GPE)))) (id both))",
            &[
                "(all-of (members (argument (role <sub>) (mention)) (argument (role <obj>) (mention (acetype GPE))))",
                "(id both)",
            ],
        );
        checked_round_trip(
            "",
            "(vprop (predicate quit resign) (args (argument (role sub) (mention))))",
            &["(vprop", "(predicate quit resign)", "(args (argument (role <sub>) (mention)))"],
        );
        checked_round_trip(
            "(reference (mention (shortcut LEADER) (headword president)))",
            "(any-of GREEDY (members LEADER (mention (acetype ORG))))",
            &["(any-of GREEDY (members LEADER (mention (acetype ORG))))"],
        );
    }
}

