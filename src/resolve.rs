//! ## Shortcut Resolution
//! Resolution rewrites every sub-pattern slot that holds a [PatternKind::Shortcut] to the id of
//! the reference pattern it names and checks that the pattern in the slot has the capability
//! the slot requires. Children are resolved before their parent, so a combination sees resolved
//! members when it settles on its [MemberCapability].
//!
//! Besides substitution the pass finishes a few kinds: proposition patterns check their argument
//! flags, proposition and extraction patterns move their optional arguments out of the required
//! list, and regex patterns compile their expression. The `resolved` bits of the bank make each
//! of these happen exactly once.

use log::trace;
use rustc_hash::FxHashMap;

use crate::combination::MemberCapability;
use crate::error::{PatternError, Result};
use crate::pattern::{Capability, Pattern, PatternBank, PatternId, PatternKind};
use crate::pretty_print::dump;
use crate::prop_pattern::PropPattern;
use crate::regex_pattern::CompiledRegex;

/// Shortcut name to reference pattern.
pub type ShortcutMap = FxHashMap<String, PatternId>;

/// What a sub-pattern slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Anything; the owner checks the pattern itself.
    Any,
    Regex,
    /// At least one of the capabilities.
    OneOf(&'static [Capability]),
}

impl Requirement {
    pub const SENTENCE: Requirement = Requirement::OneOf(&[Capability::Sentence]);
    pub const MENTION: Requirement = Requirement::OneOf(&[Capability::Mention]);
    pub const PROP: Requirement = Requirement::OneOf(&[Capability::Prop]);
    pub const ARGUMENT: Requirement = Requirement::OneOf(&[Capability::Argument]);
    pub const ARGUMENT_VALUE: Requirement = Requirement::OneOf(&[Capability::ArgumentValue]);
    pub const MENTION_AND_ROLE: Requirement = Requirement::OneOf(&[Capability::MentionAndRole]);
    pub const PARSE_NODE: Requirement = Requirement::OneOf(&[Capability::ParseNode]);
    pub const ANCHOR: Requirement = Requirement::OneOf(&[Capability::Prop, Capability::ParseNode]);
    pub const DOCUMENT_LEVEL: Requirement = Requirement::OneOf(&[Capability::Sentence, Capability::Document]);

    fn accepts(&self, pattern: &Pattern) -> bool {
        match self {
            Requirement::Any => true,
            Requirement::Regex => matches!(pattern.kind, PatternKind::Regex(_)),
            Requirement::OneOf(capabilities) => capabilities.iter().any(|c| pattern.supports(*c)),
        }
    }

    fn describe(&self) -> String {
        match self {
            Requirement::Any => "pattern".to_string(),
            Requirement::Regex => "RegexPattern".to_string(),
            Requirement::OneOf(capabilities) => capabilities
                .iter()
                .map(Capability::name)
                .collect::<Vec<_>>()
                .join(" or "),
        }
    }
}

/// Changes a finished pattern needs once its slots are resolved.
enum Completion {
    Capability(MemberCapability),
    Arguments { args: Vec<PatternId>, opt_args: Vec<PatternId> },
    Regex(CompiledRegex),
}

pub struct Resolver<'a> {
    bank: &'a mut PatternBank,
    shortcuts: &'a ShortcutMap,
}

impl<'a> Resolver<'a> {
    pub fn new(bank: &'a mut PatternBank, shortcuts: &'a ShortcutMap) -> Self {
        Self { bank, shortcuts }
    }

    /// Resolve the pattern in a slot requiring `requirement` and return the id the slot should
    /// hold from now on.
    pub fn resolve(&mut self, id: PatternId, requirement: Requirement) -> Result<PatternId> {
        let (target, shortcut) = match &self.bank.get(id).kind {
            PatternKind::Shortcut(name) => match self.shortcuts.get(name) {
                Some(&target) => (target, Some(name.clone())),
                None => {
                    return Err(PatternError::config(format!("Unknown shortcut name {name}"), name.clone()));
                }
            },
            _ => (id, None),
        };
        if let Some(name) = &shortcut {
            trace!("Shortcut {name} resolves to pattern {}", target.0);
        }
        self.resolve_pattern(target)?;

        let pattern = self.bank.get(target);
        if !requirement.accepts(pattern) {
            let reason = match shortcut {
                Some(name) => format!(
                    "Shortcut {name} resolves to a {} where a {} is required",
                    pattern.kind.type_name(),
                    requirement.describe()
                ),
                None => format!(
                    "Found a {} where a {} is required",
                    pattern.kind.type_name(),
                    requirement.describe()
                ),
            };
            return Err(PatternError::config(reason, dump(self.bank, target)));
        }
        Ok(target)
    }

    fn resolve_pattern(&mut self, id: PatternId) -> Result<()> {
        if self.bank.is_resolved(id) {
            return Ok(());
        }
        let placeholder = PatternKind::Shortcut(String::new());
        let mut kind = std::mem::replace(&mut self.bank.get_mut(id).kind, placeholder);
        let resolved = self.resolve_slots(&mut kind);
        self.bank.get_mut(id).kind = kind;
        resolved?;
        if let Some(completion) = self.completion(id)? {
            self.complete(id, completion);
        }
        self.bank.mark_resolved(id);
        Ok(())
    }

    fn resolve_slot(&mut self, slot: &mut PatternId, requirement: Requirement) -> Result<()> {
        *slot = self.resolve(*slot, requirement)?;
        Ok(())
    }

    fn resolve_optional(&mut self, slot: &mut Option<PatternId>, requirement: Requirement) -> Result<()> {
        if let Some(id) = slot {
            self.resolve_slot(id, requirement)?;
        }
        Ok(())
    }

    fn resolve_all(&mut self, slots: &mut [PatternId], requirement: Requirement) -> Result<()> {
        slots.iter_mut().try_for_each(|slot| self.resolve_slot(slot, requirement))
    }

    fn resolve_slots(&mut self, kind: &mut PatternKind) -> Result<()> {
        match kind {
            PatternKind::Mention(p) => {
                self.resolve_optional(&mut p.regex, Requirement::Regex)?;
                self.resolve_optional(&mut p.prop_def, Requirement::PROP)?;
                for arg_of_prop in &mut p.arg_of_props {
                    self.resolve_slot(&mut arg_of_prop.prop, Requirement::PROP)?;
                }
            }
            PatternKind::Prop(p) => {
                self.resolve_optional(&mut p.regex, Requirement::Regex)?;
                self.resolve_all(&mut p.args, Requirement::ARGUMENT)?;
                self.resolve_all(&mut p.opt_args, Requirement::ARGUMENT)?;
                self.resolve_all(&mut p.block_args, Requirement::ARGUMENT)?;
                if let Some(propmod) = &mut p.propmod {
                    self.resolve_slot(&mut propmod.pattern, Requirement::PROP)?;
                }
            }
            PatternKind::Argument(p) => self.resolve_optional(&mut p.pattern, Requirement::ARGUMENT_VALUE)?,
            PatternKind::Event(p) | PatternKind::Relation(p) => {
                self.resolve_optional(&mut p.anchor, Requirement::ANCHOR)?;
                self.resolve_all(&mut p.args, Requirement::MENTION_AND_ROLE)?;
                self.resolve_all(&mut p.opt_args, Requirement::MENTION_AND_ROLE)?;
                self.resolve_all(&mut p.block_args, Requirement::MENTION_AND_ROLE)?;
            }
            PatternKind::ParseNode(p) => {
                self.resolve_all(&mut p.premods, Requirement::PARSE_NODE)?;
                self.resolve_all(&mut p.opt_premods, Requirement::PARSE_NODE)?;
                self.resolve_all(&mut p.postmods, Requirement::PARSE_NODE)?;
                self.resolve_all(&mut p.opt_postmods, Requirement::PARSE_NODE)?;
                self.resolve_optional(&mut p.head, Requirement::PARSE_NODE)?;
                self.resolve_optional(&mut p.node_mention, Requirement::PARSE_NODE)?;
                self.resolve_optional(&mut p.regex, Requirement::Regex)?;
            }
            // Subpattern kinds are checked when the expression is compiled.
            PatternKind::Regex(p) => self.resolve_all(&mut p.subpatterns, Requirement::Any)?,
            PatternKind::ValueMention(p) => self.resolve_optional(&mut p.regex, Requirement::Regex)?,
            PatternKind::Combination(p) => self.resolve_all(&mut p.members, Requirement::Any)?,
            PatternKind::Intersection(p) => self.resolve_all(&mut p.members, Requirement::SENTENCE)?,
            PatternKind::Union(p) => self.resolve_all(&mut p.members, Requirement::SENTENCE)?,
            PatternKind::Negation(p) => self.resolve_optional(&mut p.pattern, Requirement::SENTENCE)?,
            PatternKind::Doc(p) => self.resolve_all(&mut p.members, Requirement::DOCUMENT_LEVEL)?,
            PatternKind::Quotation(p) => self.resolve_optional(&mut p.speaker, Requirement::MENTION)?,
            PatternKind::Shortcut(_) | PatternKind::Text(_) | PatternKind::Topic(_) => {}
        }
        Ok(())
    }

    fn completion(&self, id: PatternId) -> Result<Option<Completion>> {
        let bank = &*self.bank;
        let completion = match &bank.get(id).kind {
            PatternKind::Combination(c) => match MemberCapability::of_members(bank, &c.members) {
                Some(capability) => Some(Completion::Capability(capability)),
                None => return Err(mixed_members(bank, id, &c.members)),
            },
            PatternKind::Prop(p) => {
                check_prop_arguments(bank, id, p)?;
                migrate_optional(bank, &p.args, &p.opt_args)
            }
            PatternKind::Event(p) | PatternKind::Relation(p) => migrate_optional(bank, &p.args, &p.opt_args),
            PatternKind::Regex(r) => Some(Completion::Regex(r.compile(bank)?)),
            _ => None,
        };
        Ok(completion)
    }

    fn complete(&mut self, id: PatternId, completion: Completion) {
        match (&mut self.bank.get_mut(id).kind, completion) {
            (PatternKind::Combination(c), Completion::Capability(capability)) => {
                trace!("{} {} specialized to {capability:?}", c.combination_type.name(), id.0);
                c.capability = Some(capability);
            }
            (PatternKind::Prop(p), Completion::Arguments { args, opt_args }) => {
                p.args = args;
                p.opt_args = opt_args;
            }
            (PatternKind::Event(p) | PatternKind::Relation(p), Completion::Arguments { args, opt_args }) => {
                p.args = args;
                p.opt_args = opt_args;
            }
            (PatternKind::Regex(r), Completion::Regex(compiled)) => r.compiled = Some(compiled),
            _ => {}
        }
    }
}

fn mixed_members(bank: &PatternBank, id: PatternId, members: &[PatternId]) -> PatternError {
    let counts: Vec<String> = MemberCapability::ALL
        .iter()
        .map(|cap| {
            let count = members.iter().filter(|m| bank.supports(**m, cap.required())).count();
            format!("{}: {count}", cap.required().name())
        })
        .collect();
    PatternError::config(
        format!(
            "Member patterns for all-of/any-of/none-of must have the same type! {} members, {}",
            members.len(),
            counts.join(", ")
        ),
        dump(bank, id),
    )
}

fn check_prop_arguments(bank: &PatternBank, id: PatternId, p: &PropPattern) -> Result<()> {
    if p.one_to_one && p.many_to_many {
        return Err(PatternError::config(
            "ONE_TO_ONE and MANY_TO_MANY cannot both be set",
            dump(bank, id),
        ));
    }
    for &arg in p.args.iter().chain(&p.opt_args).chain(&p.block_args) {
        if !p.many_to_many && bank.has_fall_through_roles(arg) {
            return Err(PatternError::config(
                "allow_fall_through roles require a MANY_TO_MANY proposition pattern",
                dump(bank, id),
            ));
        }
        if let PatternKind::Argument(a) = &bank.get(arg).kind {
            if let Some(role) = a.capitalized_role() {
                return Err(PatternError::config(
                    format!("Proposition argument role {role} must not be capitalized"),
                    dump(bank, id),
                ));
            }
        }
    }
    Ok(())
}

/// Split the `OPTIONAL` argument patterns off `args`, if there are any.
fn migrate_optional(bank: &PatternBank, args: &[PatternId], opt_args: &[PatternId]) -> Option<Completion> {
    let is_optional = |id: &PatternId| matches!(&bank.get(*id).kind, PatternKind::Argument(a) if a.optional);
    if !args.iter().any(is_optional) {
        return None;
    }
    let (moved, required): (Vec<PatternId>, Vec<PatternId>) = args.iter().partition(|id| is_optional(id));
    let mut optional = opt_args.to_vec();
    optional.extend(moved);
    Some(Completion::Arguments {
        args: required,
        opt_args: optional,
    })
}

#[cfg(test)]
mod test {
    use crate::pattern::PatternKind;
    use crate::pattern_set::{LoadOptions, PatternSet};
    use crate::resolve::{Requirement, Resolver};

    fn load(text: &str) -> PatternSet {
        PatternSet::from_str(text, &LoadOptions::default()).unwrap()
    }

    #[test]
    fn basic_resolution_test() {
        let set = load(
            "(s (reference (mention (shortcut PERSON) (acetype PER))) \
                (toplevel (vprop (args (argument (role <sub>) PERSON)))))",
        );
        let PatternKind::Prop(prop) = &set.bank().get(set.top_level()[0]).kind else {
            panic!("expected a proposition pattern");
        };
        let PatternKind::Argument(arg) = &set.bank().get(prop.args[0]).kind else {
            panic!("expected an argument pattern");
        };
        assert_eq!(arg.pattern, set.reference("PERSON"));
    }

    #[test]
    fn idempotent_resolution_test() {
        let set = load(
            "(s (reference (mention (shortcut PERSON) (acetype PER))) \
                (toplevel (event (args (argument (role Agent) OPTIONAL PERSON) (argument (role Place) PERSON))) \
                          (any-of (members PERSON (mention)))))",
        );
        let mut bank = set.bank().clone();
        let shortcuts = set.shortcuts().clone();
        let mut resolver = Resolver::new(&mut bank, &shortcuts);
        for &id in set.top_level() {
            assert_eq!(resolver.resolve(id, Requirement::Any).unwrap(), id);
        }
        assert_eq!(&bank, set.bank());

        let PatternKind::Event(event) = &bank.get(set.top_level()[0]).kind else {
            panic!("expected an event pattern");
        };
        assert_eq!(event.args.len(), 1);
        assert_eq!(event.opt_args.len(), 1);
    }

    #[test]
    fn resolution_errors_test() {
        let bad = [
            // Unknown shortcut.
            "(s (toplevel (vprop (args (argument (role <sub>) NOBODY)))))",
            // Type mismatch after substitution.
            "(s (reference (vprop (shortcut EVENT))) (toplevel (mention (regex EVENT))))",
            "(s (reference (event (shortcut EVENT))) (toplevel (vprop (args (argument (role <sub>) (mention))) (propmod (role <ref>) EVENT))))",
            "(s (toplevel (vprop ONE_TO_ONE MANY_TO_MANY)))",
            "(s (toplevel (vprop (args (argument (role Agent) (mention))))))",
            "(s (toplevel (vprop (args (argument (role <sub>) (allow_fall_through <poss>) (mention))))))",
        ];
        for text in bad {
            assert!(PatternSet::from_str(text, &LoadOptions::default()).is_err(), "{text}");
        }
        let err = PatternSet::from_str(
            "(s (reference (vprop (shortcut EVENT))) (toplevel (mention (regex EVENT))))",
            &LoadOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Shortcut EVENT resolves to a PropPattern"));
        load("(s (toplevel (vprop MANY_TO_MANY (args (argument (role <sub>) (allow_fall_through <poss>) (mention))))))");
    }
}
