//! # Patterns
//! This library contains a pattern matching engine over linguistically annotated documents.
//! Pattern sets are read from s-expression files ([sexp], [pattern_set]), their shortcut
//! references are resolved into a typed pattern graph ([resolve]) and a [matcher::PatternMatcher]
//! evaluates the patterns against the sentences of a document ([theory]), producing feature
//! sets that describe what matched ([features]).

pub mod argument_pattern;
pub mod combination;
pub mod entity_label;
pub mod error;
pub mod extraction_pattern;
pub mod features;
pub mod matcher;
pub mod mention_pattern;
pub mod parse_node_pattern;
pub mod pattern;
pub mod pattern_set;
pub mod pretty_print;
pub mod prop_pattern;
pub mod prop_status;
pub mod regex_pattern;
pub mod resolve;
pub mod scoring;
pub mod sentence_patterns;
pub mod sexp;
pub mod solver;
pub mod theory;
pub mod topic_pattern;
pub mod value_mention_pattern;
pub mod word_set;
