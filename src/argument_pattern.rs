//! ## Argument Patterns
//! An [ArgumentPattern] constrains one argument of a proposition, event or relation: its role
//! and, through an inner pattern, its value.

use crate::error::{PatternError, Result};
use crate::features::PatternFeatureSet;
use crate::matcher::PatternMatcher;
use crate::pattern::{Capability, ParseContext, Pattern, PatternId, PatternKind, PatternParser};
use crate::sexp::{Sexp, unquote};
use crate::theory::{
    Argument, IOBJ_ROLE, LOC_ROLE, MEMBER_ROLE, MentionId, OBJ_ROLE, POSS_ROLE, REF_ROLE, SUB_ROLE,
    TEMP_ROLE, UNKNOWN_ROLE, ValueMentionId,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArgumentPattern {
    pub roles: Vec<String>,
    pub block_roles: Vec<String>,
    /// Roles through which a proposition argument may be entered to match its own arguments.
    pub fall_through_roles: Vec<String>,
    pub optional: bool,
    pub pattern: Option<PatternId>,
}

/// Map the short role names `ref`, `sub`, ... to the bracketed theory roles.
pub fn canonical_role(role: &str) -> String {
    match role {
        "ref" => REF_ROLE,
        "sub" => SUB_ROLE,
        "obj" => OBJ_ROLE,
        "iobj" => IOBJ_ROLE,
        "poss" => POSS_ROLE,
        "temp" => TEMP_ROLE,
        "loc" => LOC_ROLE,
        "member" => MEMBER_ROLE,
        "unknown" => UNKNOWN_ROLE,
        other => other,
    }
    .to_string()
}

fn roles_from_sexp(sexp: &Sexp) -> Result<Vec<String>> {
    sexp.children()?
        .iter()
        .skip(1)
        .map(|child| {
            child
                .value()
                .map(|role| canonical_role(unquote(role)))
                .ok_or_else(|| PatternError::parse(ArgumentPattern::TYPE_NAME, "roles must be atoms", sexp))
        })
        .collect()
}

impl PatternParser for ArgumentPattern {
    const TYPE_NAME: &'static str = "ArgumentPattern";

    fn init_atom(&mut self, atom: &str, ctx: &mut ParseContext) -> Result<bool> {
        if atom == "OPT" || atom == "OPTIONAL" {
            self.optional = true;
        } else {
            self.set_pattern(&Sexp::atom(atom), ctx)?;
        }
        Ok(true)
    }

    fn init_subexpression(&mut self, sexp: &Sexp, ctx: &mut ParseContext) -> Result<bool> {
        match sexp.head() {
            Some("role") => self.roles.extend(roles_from_sexp(sexp)?),
            Some("block_role") => self.block_roles.extend(roles_from_sexp(sexp)?),
            Some("allow_fall_through") => self.fall_through_roles.extend(roles_from_sexp(sexp)?),
            _ => self.set_pattern(sexp, ctx)?,
        }
        Ok(true)
    }

    fn into_kind(self) -> PatternKind {
        PatternKind::Argument(self)
    }
}

impl ArgumentPattern {
    fn set_pattern(&mut self, sexp: &Sexp, ctx: &mut ParseContext) -> Result<()> {
        if self.pattern.is_some() {
            return Err(PatternError::parse(
                Self::TYPE_NAME,
                "more than one pattern argument found",
                sexp,
            ));
        }
        self.pattern = Some(ctx.parse(sexp)?);
        Ok(())
    }

    pub fn matches_role(&self, role: &str) -> bool {
        (self.roles.is_empty() || self.roles.iter().any(|r| r == role))
            && !self.block_roles.iter().any(|r| r == role)
    }

    /// The first role containing an upper case character.
    pub fn capitalized_role(&self) -> Option<&str> {
        self.roles
            .iter()
            .find(|role| role.chars().any(char::is_uppercase))
            .map(String::as_str)
    }

    fn with_default_score(pattern: &Pattern, set: Option<PatternFeatureSet>) -> Option<PatternFeatureSet> {
        set.map(|mut set| {
            if set.score() == crate::scoring::UNSPECIFIED_SCORE {
                set.set_score(pattern.score());
            }
            set
        })
    }

    pub fn matches_argument(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        arg: &Argument,
        fall_through: bool,
    ) -> Result<Option<PatternFeatureSet>> {
        if !self.matches_role(&arg.role) {
            return self.matches_nested_argument(pm, pattern, sentence, arg, fall_through);
        }
        let Some(inner) = self.pattern else {
            return Ok(Some(pattern.empty_feature_set(pm.language_variant())));
        };
        if pm.bank().supports(inner, Capability::ArgumentValue) {
            let result = pm.match_argument_value(inner, sentence, arg, fall_through, None)?;
            if let Some(set) = Self::with_default_score(pattern, result) {
                return Ok(Some(set));
            }
        }
        self.matches_nested_argument(pm, pattern, sentence, arg, fall_through)
    }

    /// Enter a proposition argument whose role allows fall through and match this pattern
    /// against its arguments instead.
    fn matches_nested_argument(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        arg: &Argument,
        fall_through: bool,
    ) -> Result<Option<PatternFeatureSet>> {
        if !self.fall_through_roles.iter().any(|r| *r == arg.role) {
            return Ok(None);
        }
        let st = pm.doc().sentence(sentence);
        let Some(prop) = st.argument_proposition(arg) else {
            return Ok(None);
        };
        let mut set = pattern.empty_feature_set(pm.language_variant());
        let mut found = false;
        for nested in &st.proposition(prop).args {
            if !self.matches_role(&nested.role) {
                continue;
            }
            match self.pattern {
                Some(inner) if pm.bank().supports(inner, Capability::ArgumentValue) => {
                    if let Some(matched) = pm.match_argument_value(inner, sentence, nested, fall_through, None)? {
                        set.add_features(&matched);
                        found = true;
                    }
                }
                Some(_) => {}
                None => found = true,
            }
        }
        if set.score() == crate::scoring::UNSPECIFIED_SCORE {
            set.set_score(pattern.score());
        }
        Ok(found.then_some(set))
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
        if !self.matches_role(role) {
            return Ok(None);
        }
        let Some(inner) = self.pattern else {
            return Ok(Some(pattern.empty_feature_set(pm.language_variant())));
        };
        let result = if pm.bank().supports(inner, Capability::Prop) {
            match pm.doc().sentence(sentence).definition(mention) {
                Some(def) => pm.match_prop(inner, sentence, def, fall_through, None)?,
                None => return Ok(None),
            }
        } else if pm.bank().supports(inner, Capability::Mention) {
            pm.match_mention(inner, sentence, mention, fall_through)?
        } else {
            None
        };
        Ok(Self::with_default_score(pattern, result))
    }

    pub fn matches_value_mention_and_role(
        &self,
        pm: &PatternMatcher,
        pattern: &Pattern,
        sentence: usize,
        role: &str,
        value_mention: ValueMentionId,
    ) -> Result<Option<PatternFeatureSet>> {
        if !self.matches_role(role) {
            return Ok(None);
        }
        let Some(inner) = self.pattern else {
            return Ok(Some(pattern.empty_feature_set(pm.language_variant())));
        };
        if !pm.bank().supports(inner, Capability::ValueMention) {
            return Ok(None);
        }
        let result = pm.match_value_mention(inner, sentence, value_mention)?;
        Ok(Self::with_default_score(pattern, result))
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use crate::argument_pattern::canonical_role;
    use crate::pattern::{ParseContext, PatternBank, PatternKind, PatternRegistry};
    use crate::sexp::{ReaderOptions, parse};
    use crate::word_set::WordSetMap;

    #[test]
    fn basic_argument_parse_test() {
        let mut bank = PatternBank::new();
        let labels = BTreeSet::new();
        let sets = WordSetMap::default();
        let registry = PatternRegistry::new();
        let mut ctx = ParseContext::new(&mut bank, &labels, &sets, &registry);
        let sexp = parse(
            "(argument (role sub obj Agent) (block_role <poss>) OPT (mention (acetype PER)))",
            ReaderOptions::default(),
        )
        .unwrap();
        let id = ctx.parse(&sexp).unwrap();
        let PatternKind::Argument(arg) = &bank.get(id).kind else {
            panic!("expected an argument pattern");
        };
        assert_eq!(arg.roles, vec!["<sub>", "<obj>", "Agent"]);
        assert!(arg.optional);
        assert!(arg.matches_role("<sub>"));
        assert!(!arg.matches_role("<poss>"));
        assert!(!arg.matches_role("<loc>"));
        assert_eq!(arg.capitalized_role(), Some("Agent"));
        assert!(arg.pattern.is_some());

        let two = parse("(argument (mention) (mention))", ReaderOptions::default()).unwrap();
        let mut ctx = ParseContext::new(&mut bank, &labels, &sets, &registry);
        assert!(ctx.parse(&two).is_err());
        assert_eq!(canonical_role("temp"), "<temp>");
    }
}
