//! ## Scoring
//! This module contains the [ScoringFunction]s a pattern uses to combine the scores of its
//! matched parts with its own declared score.

use std::fmt;

/// The score of a pattern or feature set that never had one assigned.
pub const UNSPECIFIED_SCORE: f32 = -1.0;
pub const UNSPECIFIED_SCORE_GROUP: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScoringFunction {
    #[default]
    Max,
    Min,
    Mult,
    MultIncludingTop,
    Avg,
}

impl ScoringFunction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "max" => Some(ScoringFunction::Max),
            "min" => Some(ScoringFunction::Min),
            "mult" => Some(ScoringFunction::Mult),
            "mult-including-top" => Some(ScoringFunction::MultIncludingTop),
            "avg" => Some(ScoringFunction::Avg),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScoringFunction::Max => "max",
            ScoringFunction::Min => "min",
            ScoringFunction::Mult => "mult",
            ScoringFunction::MultIncludingTop => "mult-including-top",
            ScoringFunction::Avg => "avg",
        }
    }

    /// Combine the `scores` of matched parts with the pattern's own `base` score. Without any
    /// part scores the base score is returned unchanged.
    pub fn combine(&self, scores: &[f32], base: f32) -> f32 {
        if scores.is_empty() {
            return base;
        }
        match self {
            ScoringFunction::Max => scores.iter().copied().fold(f32::MIN, f32::max),
            ScoringFunction::Min => scores.iter().copied().fold(f32::MAX, f32::min),
            ScoringFunction::Mult => scores.iter().product(),
            ScoringFunction::MultIncludingTop => {
                let product: f32 = scores.iter().product();
                if base == UNSPECIFIED_SCORE {
                    product
                } else {
                    product * base
                }
            }
            ScoringFunction::Avg => scores.iter().sum::<f32>() / scores.len() as f32,
        }
    }
}

impl fmt::Display for ScoringFunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod test {
    use crate::scoring::{ScoringFunction, UNSPECIFIED_SCORE};

    #[test]
    fn basic_scoring_test() {
        let scores = [0.5, 0.2];
        assert_eq!(ScoringFunction::Max.combine(&scores, UNSPECIFIED_SCORE), 0.5);
        assert_eq!(ScoringFunction::Min.combine(&scores, UNSPECIFIED_SCORE), 0.2);
        assert!((ScoringFunction::Mult.combine(&scores, 0.9) - 0.1).abs() < 1e-6);
        assert!((ScoringFunction::MultIncludingTop.combine(&scores, 0.5) - 0.05).abs() < 1e-6);
        assert!((ScoringFunction::Avg.combine(&scores, 0.9) - 0.35).abs() < 1e-6);
        assert_eq!(ScoringFunction::Max.combine(&[], 0.7), 0.7);
        assert_eq!(ScoringFunction::from_name("mult-including-top"), Some(ScoringFunction::MultIncludingTop));
        assert_eq!(ScoringFunction::from_name("median"), None);
    }
}
