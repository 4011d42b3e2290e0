//! ## Errors
//! This module contains [PatternError], the single error type of the library. Syntax errors,
//! configuration errors and internal invariant violations are all fatal for the operation that
//! raised them. Not matching something is never an error, matchers signal it with `Ok(None)`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatternError {
    /// Malformed s-expression or macro form.
    #[error("Sexp error: {reason}: {sexp}")]
    Sexp { reason: String, sexp: String },
    /// A pattern could not be constructed from its s-expression.
    #[error("Parser error for {type_name}: {reason}: {sexp}")]
    Parse {
        type_name: &'static str,
        reason: String,
        sexp: String,
    },
    /// A pattern set is well formed but semantically invalid.
    #[error("{reason}\n{dump}")]
    Config { reason: String, dump: String },
    /// A pattern was asked to do something it is not able to.
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Limit exceeded: {0}")]
    Limit(String),
    #[error("Could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, PatternError>;

impl PatternError {
    pub fn sexp(reason: impl Into<String>, sexp: impl ToString) -> Self {
        PatternError::Sexp {
            reason: reason.into(),
            sexp: sexp.to_string(),
        }
    }

    pub fn parse(type_name: &'static str, reason: impl Into<String>, sexp: impl ToString) -> Self {
        PatternError::Parse {
            type_name,
            reason: reason.into(),
            sexp: sexp.to_string(),
        }
    }

    pub fn config(reason: impl Into<String>, dump: impl Into<String>) -> Self {
        PatternError::Config {
            reason: reason.into(),
            dump: dump.into(),
        }
    }

    pub fn internal(reason: impl Into<String>) -> Self {
        PatternError::Internal(reason.into())
    }

    /// Prefix the message of a configuration error with the context it occurred in.
    pub fn in_context(self, context: impl std::fmt::Display) -> Self {
        match self {
            PatternError::Config { reason, dump } => PatternError::Config {
                reason: format!("{context}: {reason}"),
                dump,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod test {
    use crate::error::PatternError;

    #[test]
    fn basic_error_display_test() {
        let err = PatternError::parse("MentionPattern", "too few children", "(mention)");
        assert_eq!(
            err.to_string(),
            "Parser error for MentionPattern: too few children: (mention)"
        );
        let err = PatternError::config("Duplicate shortcut name", "").in_context("In reference pattern");
        assert!(err.to_string().starts_with("In reference pattern: Duplicate shortcut name"));
    }
}
