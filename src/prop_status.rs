//! ## Proposition Status
//! A [PropStatusManager] decides which proposition statuses (negated, alleged, modal, ...) a
//! proposition pattern accepts.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{PatternError, Result};
use crate::sexp::Sexp;
use crate::theory::{PropStatus, Proposition};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropStatusManager {
    pub required: BTreeSet<PropStatus>,
    pub blocked: BTreeSet<PropStatus>,
}

impl PropStatusManager {
    /// What the `NEGATIVE` atom of a proposition pattern stands for.
    pub fn negative() -> Self {
        Self {
            required: BTreeSet::from([PropStatus::Negative]),
            blocked: BTreeSet::new(),
        }
    }

    /// Read `(psm (require S ...) (block S ...))`. A bare status atom is a requirement.
    pub fn from_sexp(sexp: &Sexp) -> Result<Self> {
        let mut psm = Self::default();
        for child in sexp.children()?.iter().skip(1) {
            match child {
                Sexp::Atom(atom) => {
                    psm.required.insert(status(atom, sexp)?);
                }
                Sexp::List(_) => {
                    let target = match child.head() {
                        Some("require") => &mut psm.required,
                        Some("block") => &mut psm.blocked,
                        _ => return Err(PatternError::sexp("psm expects (require ...) or (block ...)", child)),
                    };
                    for value in child.children()?.iter().skip(1) {
                        let name = value
                            .value()
                            .ok_or_else(|| PatternError::sexp("proposition status must be an atom", child))?;
                        target.insert(status(name, sexp)?);
                    }
                }
                Sexp::Void => return Err(PatternError::sexp("empty psm element", sexp)),
            }
        }
        if let Some(both) = psm.required.intersection(&psm.blocked).next() {
            return Err(PatternError::sexp(
                format!("status {} is both required and blocked", both.name()),
                sexp,
            ));
        }
        Ok(psm)
    }

    /// Whether `prop` has every required status, none of the blocked ones, and no status the
    /// pattern set blocks unless this manager asks for it explicitly.
    pub fn is_valid(&self, prop: &Proposition, set_blocked: &BTreeSet<PropStatus>) -> bool {
        if !self.required.iter().all(|s| prop.statuses.contains(s)) {
            return false;
        }
        if self.blocked.iter().any(|s| prop.statuses.contains(s)) {
            return false;
        }
        set_blocked
            .iter()
            .all(|s| !prop.statuses.contains(s) || self.required.contains(s))
    }
}

fn status(name: &str, sexp: &Sexp) -> Result<PropStatus> {
    PropStatus::from_name(name)
        .ok_or_else(|| PatternError::sexp(format!("unknown proposition status {name}"), sexp))
}

impl fmt::Display for PropStatusManager {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(psm")?;
        for (name, statuses) in [("require", &self.required), ("block", &self.blocked)] {
            if !statuses.is_empty() {
                write!(f, " ({name}")?;
                for status in statuses {
                    write!(f, " {}", status.name())?;
                }
                write!(f, ")")?;
            }
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use crate::prop_status::PropStatusManager;
    use crate::sexp::{ReaderOptions, parse};
    use crate::theory::{PredicateType, PropStatus, Proposition};

    fn prop(statuses: Vec<PropStatus>) -> Proposition {
        let mut prop = Proposition::new(PredicateType::Verb, None, Vec::new());
        prop.statuses = statuses;
        prop
    }

    #[test]
    fn basic_psm_test() {
        let psm = PropStatusManager::from_sexp(
            &parse("(psm (require ALLEGED) (block MODAL))", ReaderOptions::default()).unwrap(),
        )
        .unwrap();
        let none = BTreeSet::new();
        assert!(psm.is_valid(&prop(vec![PropStatus::Alleged]), &none));
        assert!(!psm.is_valid(&prop(vec![]), &none));
        assert!(!psm.is_valid(&prop(vec![PropStatus::Alleged, PropStatus::Modal]), &none));
        assert_eq!(psm.to_string(), "(psm (require ALLEGED) (block MODAL))");
    }

    #[test]
    fn set_blocked_status_test() {
        let blocked = BTreeSet::from([PropStatus::Negative]);
        let negated = prop(vec![PropStatus::Negative]);
        assert!(!PropStatusManager::default().is_valid(&negated, &blocked));
        assert!(PropStatusManager::negative().is_valid(&negated, &blocked));
        assert!(PropStatusManager::default().is_valid(&prop(vec![]), &blocked));
        assert!(
            PropStatusManager::from_sexp(&parse("(psm (require IF) (block IF))", ReaderOptions::default()).unwrap())
                .is_err()
        );
    }
}
