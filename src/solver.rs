//! ## Argument Assignment
//! Pairs the argument patterns of a proposition, event or relation pattern with the arguments of
//! a theory object. Row `i` of an [ArgMatrix] holds, for every theory argument `j`, the match of
//! pattern argument `i` against argument `j` if there is one.
//!
//! The search looks for the assignment that first maximizes the number of matched pattern
//! arguments and then the product of the pair scores. Every required pattern argument has to be
//! assigned, optional ones may stay unassigned. Sub-results are memoized on the pattern argument
//! index and the set of theory arguments already taken.

use bitvec::vec::BitVec;
use rustc_hash::FxHashMap;

use crate::error::{PatternError, Result};
use crate::features::PatternFeatureSet;
use crate::pattern::Pattern;
use crate::scoring::UNSPECIFIED_SCORE;

pub type ArgMatrix = Vec<Vec<Option<PatternFeatureSet>>>;

/// Score a pair with an unspecified score contributes to the product.
const UNSPECIFIED_PAIR_SCORE: f32 = 0.01;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignmentOptions {
    /// Do not add matches beyond the best disjoint assignment.
    pub one_to_one: bool,
    /// Every theory argument must be matched by some pattern argument.
    pub all_args: bool,
    /// Several pattern arguments may share a theory argument.
    pub many_to_many: bool,
}

#[derive(Debug, Clone)]
struct Best {
    matches: usize,
    score: f32,
    /// Theory argument per pattern argument, for the first `count` pattern arguments.
    assignment: Vec<Option<usize>>,
}

impl Best {
    fn beats(&self, matches: usize, score: f32) -> bool {
        matches > self.matches || (matches == self.matches && score > self.score)
    }
}

struct Solver<'a> {
    rows: Vec<&'a [Option<PatternFeatureSet>]>,
    num_optional: usize,
    max_j: usize,
    many_to_many: bool,
    memo: FxHashMap<(usize, BitVec), Best>,
}

impl Solver<'_> {
    fn cell(&self, i: usize, j: usize) -> Option<&PatternFeatureSet> {
        self.rows[i].get(j).and_then(Option::as_ref)
    }

    fn best(&mut self, count: usize, used: &BitVec) -> Best {
        if count == 0 {
            return Best {
                matches: 0,
                score: 1.0,
                assignment: Vec::new(),
            };
        }
        let key = (count, used.clone());
        if let Some(best) = self.memo.get(&key) {
            return best.clone();
        }

        let i = count - 1;
        let mut best = Best {
            matches: 0,
            score: 0.0,
            assignment: vec![None; count],
        };
        for j in 0..self.max_j {
            if used[j] && !self.many_to_many {
                continue;
            }
            let mut score = match self.cell(i, j) {
                Some(set) => set.score(),
                None => continue,
            };
            if score == 0.0 {
                continue;
            }
            if score == UNSPECIFIED_SCORE {
                score = UNSPECIFIED_PAIR_SCORE;
            }
            let mut next = used.clone();
            next.set(j, true);
            let sub = self.best(i, &next);
            let matches = sub.matches + 1;
            let total = score * sub.score;
            if best.beats(matches, total) {
                let mut assignment = sub.assignment;
                assignment.push(Some(j));
                best = Best {
                    matches,
                    score: total,
                    assignment,
                };
            }
        }
        if i < self.num_optional {
            let sub = self.best(i, used);
            if best.beats(sub.matches, sub.score) {
                let mut assignment = sub.assignment;
                assignment.push(None);
                best = Best {
                    matches: sub.matches,
                    score: sub.score,
                    assignment,
                };
            }
        }
        self.memo.insert(key, best.clone());
        best
    }
}

/// Extend `base` with the best assignment of pattern arguments to theory arguments. Optional
/// rows precede required rows in the search. Returns `None` if the required arguments cannot
/// all be assigned, or `all_args` is set and some theory argument stays unmatched.
pub fn fill_all_features(
    pattern: &Pattern,
    required: &ArgMatrix,
    optional: &ArgMatrix,
    mut base: PatternFeatureSet,
    options: AssignmentOptions,
    max_arguments: usize,
) -> Result<Option<PatternFeatureSet>> {
    let rows: Vec<&[Option<PatternFeatureSet>]> = optional
        .iter()
        .chain(required.iter())
        .map(Vec::as_slice)
        .collect();
    if rows.is_empty() {
        return Ok(Some(base));
    }
    let max_j = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    if rows.len() > max_arguments || max_j > max_arguments {
        return Err(PatternError::Limit(format!(
            "argument assignment over {} pattern arguments and {} theory arguments exceeds {}",
            rows.len(),
            max_j,
            max_arguments
        )));
    }

    let mut solver = Solver {
        rows,
        num_optional: optional.len(),
        max_j,
        many_to_many: options.many_to_many,
        memo: FxHashMap::default(),
    };
    let count = solver.rows.len();
    let best = solver.best(count, &BitVec::repeat(false, max_j));
    if best.score <= 0.0 {
        return Ok(None);
    }

    let mut scores = Vec::new();
    let mut used: BitVec = BitVec::repeat(false, max_j);
    for (i, j) in best.assignment.iter().enumerate() {
        if let Some(j) = *j {
            if let Some(set) = solver.cell(i, j) {
                base.add_features(set);
                scores.push(set.score());
                used.set(j, true);
            }
        }
    }
    if !options.one_to_one {
        for i in 0..count {
            for j in 0..max_j {
                if used[j] && !options.many_to_many {
                    continue;
                }
                let Some(set) = solver.cell(i, j) else {
                    continue;
                };
                if set.score() == 0.0 {
                    continue;
                }
                base.add_features(set);
                scores.push(set.score());
                used.set(j, true);
            }
        }
    }
    if options.all_args && !used.all() {
        return Ok(None);
    }
    base.set_score(pattern.common.scoring.combine(&scores, pattern.common.score));
    Ok(Some(base))
}

#[cfg(test)]
mod test {
    use crate::error::PatternError;
    use crate::features::{FeatureKind, PatternFeature, PatternFeatureSet};
    use crate::pattern::{PatternBank, PatternCommon, PatternKind};
    use crate::solver::{ArgMatrix, AssignmentOptions, fill_all_features};
    use crate::theory::LanguageVariant;

    fn pair(score: f32, token: usize) -> Option<PatternFeatureSet> {
        let mut set = PatternFeatureSet::new();
        set.add_feature(PatternFeature::new(
            None,
            FeatureKind::TokenSpan {
                sentence: 0,
                start: token,
                end: token,
            },
            &LanguageVariant::default(),
        ));
        set.set_score(score);
        Some(set)
    }

    fn tokens(set: &PatternFeatureSet) -> Vec<usize> {
        set.features()
            .iter()
            .filter_map(|f| match f.kind {
                FeatureKind::TokenSpan { start, .. } => Some(start),
                _ => None,
            })
            .collect()
    }

    fn bank() -> PatternBank {
        let mut bank = PatternBank::new();
        bank.add(PatternCommon::default(), PatternKind::Shortcut("p".to_string()));
        bank
    }

    #[test]
    fn basic_assignment_optimality_test() {
        let bank = bank();
        let pattern = bank.get(crate::pattern::PatternId(0));
        let required: ArgMatrix = vec![
            vec![pair(0.9, 1), pair(0.3, 2), None],
            vec![None, pair(0.8, 2), None],
        ];
        let options = AssignmentOptions {
            one_to_one: true,
            ..AssignmentOptions::default()
        };
        let result = fill_all_features(pattern, &required, &Vec::new(), PatternFeatureSet::new(), options, 64)
            .unwrap()
            .unwrap();
        assert_eq!(tokens(&result), vec![1, 2]);
        assert!((result.score() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn unmatched_required_test() {
        let bank = bank();
        let pattern = bank.get(crate::pattern::PatternId(0));
        let required: ArgMatrix = vec![vec![pair(0.9, 0)], vec![None]];
        let result = fill_all_features(
            pattern,
            &required,
            &Vec::new(),
            PatternFeatureSet::new(),
            AssignmentOptions::default(),
            64,
        )
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn optional_and_greedy_test() {
        let bank = bank();
        let pattern = bank.get(crate::pattern::PatternId(0));
        let required: ArgMatrix = vec![vec![pair(-1.0, 0), pair(0.5, 1)]];
        let optional: ArgMatrix = vec![vec![None, None]];
        let result = fill_all_features(
            pattern,
            &required,
            &optional,
            PatternFeatureSet::new(),
            AssignmentOptions::default(),
            64,
        )
        .unwrap()
        .unwrap();
        assert_eq!(tokens(&result), vec![1, 0]);

        let all_args = AssignmentOptions {
            one_to_one: true,
            all_args: true,
            ..AssignmentOptions::default()
        };
        let result = fill_all_features(pattern, &required, &optional, PatternFeatureSet::new(), all_args, 64).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn assignment_limit_test() {
        let bank = bank();
        let pattern = bank.get(crate::pattern::PatternId(0));
        let required: ArgMatrix = vec![vec![pair(0.5, 0), pair(0.5, 1), pair(0.5, 2)]];
        let err = fill_all_features(
            pattern,
            &required,
            &Vec::new(),
            PatternFeatureSet::new(),
            AssignmentOptions::default(),
            2,
        )
        .unwrap_err();
        assert!(matches!(err, PatternError::Limit(_)));
    }
}
