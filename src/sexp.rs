//! ## S-Expressions
//! This module contains the generic [Sexp] tree that pattern files are written in, a reader for
//! it and the [SexpReader] which additionally expands the `@INCLUDE`, `@SET`, `@UNSET`, `@IF` and
//! `@UNLESS` macro forms.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use crate::error::{PatternError, Result};

/// The atom an empty list `()` is read as.
pub const EMPTY_PARSE: &str = "EMPTY_PARSE";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sexp {
    List(Vec<Sexp>),
    Atom(String),
    Void,
}

impl Sexp {
    pub fn atom<S: Into<String>>(value: S) -> Self {
        Sexp::Atom(value.into())
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Sexp::List(_))
    }

    pub fn is_atom(&self) -> bool {
        matches!(self, Sexp::Atom(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Sexp::Void)
    }

    /// The value of an atom.
    pub fn value(&self) -> Option<&str> {
        match self {
            Sexp::Atom(value) => Some(value),
            _ => None,
        }
    }

    pub fn children(&self) -> Result<&[Sexp]> {
        match self {
            Sexp::List(children) => Ok(children),
            _ => Err(PatternError::sexp("children requested from non-list", self)),
        }
    }

    pub fn num_children(&self) -> Result<usize> {
        self.children().map(|children| children.len())
    }

    pub fn nth_child(&self, n: usize) -> Result<&Sexp> {
        self.children()?
            .get(n)
            .ok_or_else(|| PatternError::sexp(format!("no child at position {n}"), self))
    }

    /// The value of the first child if `self` is a list starting with an atom.
    pub fn head(&self) -> Option<&str> {
        match self {
            Sexp::List(children) => children.first().and_then(|c| c.value()),
            _ => None,
        }
    }

    /// The value of an atom with surrounding double quotes removed.
    pub fn unquoted_value(&self) -> Option<&str> {
        self.value().map(unquote)
    }
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Sexp::Atom(value) => write!(f, "{}", value),
            Sexp::Void => write!(f, "VOID"),
            Sexp::List(children) => {
                write!(f, "(")?;
                for (idx, child) in children.iter().enumerate() {
                    if idx > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Strip one pair of surrounding double quotes, if present.
pub fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReaderOptions {
    /// Read `"..."` as a single atom, quotes included.
    pub use_quotes: bool,
    /// Treat `#` up to the end of the line as a comment.
    pub use_hash_comments: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            use_quotes: true,
            use_hash_comments: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    Atom(String),
}

fn tokenize(text: &str, options: ReaderOptions) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c == '(' {
            chars.next();
            tokens.push(Token::Open);
        } else if c == ')' {
            chars.next();
            tokens.push(Token::Close);
        } else if c == '#' && options.use_hash_comments {
            while let Some(c) = chars.next() {
                if c == '\n' {
                    break;
                }
            }
        } else if c == '"' && options.use_quotes {
            let mut atom = String::new();
            atom.push(c);
            chars.next();
            let mut closed = false;
            for c in chars.by_ref() {
                atom.push(c);
                if c == '"' {
                    closed = true;
                    break;
                }
            }
            if !closed {
                return Err(PatternError::sexp("unterminated quote", atom));
            }
            tokens.push(Token::Atom(atom));
        } else {
            let mut atom = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() || c == '(' || c == ')' {
                    break;
                }
                if c == '#' && options.use_hash_comments {
                    break;
                }
                atom.push(c);
                chars.next();
            }
            tokens.push(Token::Atom(atom));
        }
    }
    Ok(tokens)
}

/// Read every top level expression in `text`.
pub fn parse_all(text: &str, options: ReaderOptions) -> Result<Vec<Sexp>> {
    let tokens = tokenize(text, options)?;
    // Each open list is a frame on the stack, the bottom frame collects top level expressions.
    let mut stack: Vec<Vec<Sexp>> = vec![Vec::new()];
    for token in tokens {
        match token {
            Token::Open => stack.push(Vec::new()),
            Token::Close => {
                if stack.len() < 2 {
                    let partial = stack.last().cloned().unwrap_or_default();
                    return Err(PatternError::sexp("unbalanced parens", Sexp::List(partial)));
                }
                let children = stack.pop().unwrap_or_default();
                let finished = if children.is_empty() {
                    Sexp::atom(EMPTY_PARSE)
                } else {
                    Sexp::List(children)
                };
                if let Some(parent) = stack.last_mut() {
                    parent.push(finished);
                }
            }
            Token::Atom(value) => {
                if let Some(frame) = stack.last_mut() {
                    frame.push(Sexp::Atom(value));
                }
            }
        }
    }
    if stack.len() != 1 {
        let partial = stack.pop().unwrap_or_default();
        return Err(PatternError::sexp("unterminated list", Sexp::List(partial)));
    }
    Ok(stack.pop().unwrap_or_default())
}

/// Read exactly one expression from `text`.
pub fn parse(text: &str, options: ReaderOptions) -> Result<Sexp> {
    let mut all = parse_all(text, options)?;
    match all.len() {
        0 => Ok(Sexp::Void),
        1 => Ok(all.remove(0)),
        _ => Err(PatternError::sexp(
            "expected a single expression",
            Sexp::List(all),
        )),
    }
}

const INCLUDE: &str = "@INCLUDE";
const SET: &str = "@SET";
const UNSET: &str = "@UNSET";
const IF: &str = "@IF";
const UNLESS: &str = "@UNLESS";

/// Reads s-expression files and expands their macro forms.
#[derive(Debug, Clone)]
pub struct SexpReader {
    pub options: ReaderOptions,
    /// Directories searched for `@INCLUDE` targets after the including file's own directory.
    pub include_dirs: Vec<PathBuf>,
    /// Splice every file at most once per reader.
    pub include_once: bool,
    /// Symbols that are `@SET` before reading starts.
    pub defined: Vec<String>,
    included: FxHashSet<PathBuf>,
    include_stack: Vec<PathBuf>,
}

impl SexpReader {
    /// Create a new reader with the default options and no include directories.
    pub fn new() -> Self {
        Self {
            options: ReaderOptions::default(),
            include_dirs: Vec::new(),
            include_once: false,
            defined: Vec::new(),
            included: FxHashSet::default(),
            include_stack: Vec::new(),
        }
    }

    /// Read and expand all expressions in `path`.
    pub fn read_file(&mut self, path: &Path) -> Result<Vec<Sexp>> {
        log::info!("Opening {:?}", path);
        let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.included.insert(canonical.clone());
        self.include_stack.push(canonical);
        let text = fs::read_to_string(path).map_err(|source| PatternError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let sexps = parse_all(&text, self.options)?;
        let mut scope: FxHashSet<String> = self.defined.iter().cloned().collect();
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let result = self.expand_list(sexps, &mut scope, &dir);
        self.include_stack.pop();
        result
    }

    /// Expand the macro forms of already read expressions. Includes are resolved against `dir`.
    pub fn expand(&mut self, sexps: Vec<Sexp>, dir: &Path) -> Result<Vec<Sexp>> {
        let mut scope: FxHashSet<String> = self.defined.iter().cloned().collect();
        self.expand_list(sexps, &mut scope, dir)
    }

    fn expand_list(
        &mut self,
        children: Vec<Sexp>,
        scope: &mut FxHashSet<String>,
        dir: &Path,
    ) -> Result<Vec<Sexp>> {
        let mut out = Vec::with_capacity(children.len());
        for child in children {
            let head = child.head().map(str::to_string);
            match head.as_deref() {
                Some(INCLUDE) => {
                    let target = macro_symbol(&child, 2)?;
                    out.extend(self.include(unquote(&target), scope, dir)?);
                }
                Some(SET) => {
                    scope.insert(macro_symbol(&child, 2)?);
                }
                Some(UNSET) => {
                    scope.remove(&macro_symbol(&child, 2)?);
                }
                Some(keyword @ (IF | UNLESS)) => {
                    let symbol = macro_symbol(&child, 3)?;
                    let wanted = keyword == IF;
                    if scope.contains(&symbol) == wanted {
                        let body: Vec<Sexp> = match child {
                            Sexp::List(children) => children.into_iter().skip(2).collect(),
                            _ => Vec::new(),
                        };
                        out.extend(self.expand_list(body, scope, dir)?);
                    }
                }
                _ => match child {
                    Sexp::List(grandchildren) => {
                        let mut inner = scope.clone();
                        let expanded = self.expand_list(grandchildren, &mut inner, dir)?;
                        out.push(Sexp::List(expanded));
                    }
                    other => out.push(other),
                },
            }
        }
        Ok(out)
    }

    fn include(
        &mut self,
        target: &str,
        scope: &mut FxHashSet<String>,
        dir: &Path,
    ) -> Result<Vec<Sexp>> {
        let path = self.resolve_include(target, dir)?;
        let canonical = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        if self.include_stack.contains(&canonical) {
            return Err(PatternError::sexp(
                "include cycle",
                format!("(@INCLUDE {target})"),
            ));
        }
        if self.include_once && self.included.contains(&canonical) {
            log::info!("Skip repeated include {:?}", path);
            return Ok(Vec::new());
        }
        log::info!("Include {:?}", path);
        self.included.insert(canonical.clone());
        self.include_stack.push(canonical);
        let text = fs::read_to_string(&path).map_err(|source| PatternError::Io {
            path: path.clone(),
            source,
        })?;
        let sexps = parse_all(&text, self.options)?;
        let include_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let result = self.expand_list(sexps, scope, &include_dir);
        self.include_stack.pop();
        result
    }

    fn resolve_include(&self, target: &str, dir: &Path) -> Result<PathBuf> {
        let target_path = PathBuf::from(target);
        if target_path.is_absolute() {
            return Ok(target_path);
        }
        std::iter::once(dir)
            .chain(self.include_dirs.iter().map(PathBuf::as_path))
            .map(|base| base.join(&target_path))
            .find(|candidate| candidate.exists())
            .ok_or_else(|| {
                PatternError::sexp("could not resolve include", format!("(@INCLUDE {target})"))
            })
    }
}

impl Default for SexpReader {
    fn default() -> Self {
        Self::new()
    }
}

fn macro_symbol(form: &Sexp, min_children: usize) -> Result<String> {
    let children = form.children()?;
    if children.len() < min_children {
        return Err(PatternError::sexp("malformed macro form", form));
    }
    if min_children == 2 && children.len() != 2 {
        return Err(PatternError::sexp("malformed macro form", form));
    }
    children[1]
        .value()
        .map(str::to_string)
        .ok_or_else(|| PatternError::sexp("macro argument must be an atom", form))
}

#[cfg(test)]
mod test {
    use std::fs;

    use crate::sexp::{EMPTY_PARSE, ReaderOptions, Sexp, SexpReader, parse, parse_all};

    fn read(text: &str) -> Sexp {
        parse(text, ReaderOptions::default()).unwrap()
    }

    #[test]
    fn basic_parse_test() {
        let sexp = read("(mention (acetype PER ORG) \"new york\") # trailing comment");
        assert_eq!(sexp.num_children().unwrap(), 3);
        assert_eq!(sexp.head(), Some("mention"));
        assert_eq!(sexp.nth_child(2).unwrap().value(), Some("\"new york\""));
        assert_eq!(sexp.nth_child(2).unwrap().unquoted_value(), Some("new york"));
        assert_eq!(sexp.to_string(), "(mention (acetype PER ORG) \"new york\")");
        assert!(sexp.nth_child(0).unwrap().children().is_err());
    }

    #[test]
    fn quote_and_comment_options_test() {
        let options = ReaderOptions {
            use_quotes: false,
            use_hash_comments: false,
        };
        let all = parse_all("(a \"b c\" d#e)", options).unwrap();
        assert_eq!(all[0].num_children().unwrap(), 4);
        assert_eq!(all[0].nth_child(3).unwrap().value(), Some("d#e"));
        let quoted = read("(a \"x # y\")");
        assert_eq!(quoted.nth_child(1).unwrap().value(), Some("\"x # y\""));
    }

    #[test]
    fn empty_list_test() {
        let sexp = read("(a ())");
        assert_eq!(sexp.nth_child(1).unwrap().value(), Some(EMPTY_PARSE));
    }

    #[test]
    fn unbalanced_test() {
        assert!(parse_all("(a (b)", ReaderOptions::default()).is_err());
        assert!(parse_all("(a))", ReaderOptions::default()).is_err());
        assert!(parse_all("(a \"b)", ReaderOptions::default()).is_err());
    }

    #[test]
    fn basic_macro_test() {
        let sexps = parse_all(
            "(top (@SET FOO) (@IF FOO (a) (b)) (@UNLESS FOO (c)) (@UNSET FOO) (@IF FOO (d)) (inner (@SET BAR)) (@IF BAR (e)))",
            ReaderOptions::default(),
        )
        .unwrap();
        let mut reader = SexpReader::new();
        let expanded = reader.expand(sexps, std::path::Path::new(".")).unwrap();
        assert_eq!(expanded[0].to_string(), "(top (a) (b) (inner))");
    }

    #[test]
    fn predefined_symbol_test() {
        let sexps = parse_all("(top (@IF FOO x) (@UNLESS FOO y))", ReaderOptions::default()).unwrap();
        let mut reader = SexpReader::new();
        reader.defined.push("FOO".to_string());
        let expanded = reader.expand(sexps, std::path::Path::new(".")).unwrap();
        assert_eq!(expanded[0].to_string(), "(top x)");
    }

    #[test]
    fn malformed_macro_test() {
        let sexps = parse_all("(top (@SET))", ReaderOptions::default()).unwrap();
        let mut reader = SexpReader::new();
        assert!(reader.expand(sexps, std::path::Path::new(".")).is_err());
    }

    #[test]
    fn include_test() {
        let dir = std::env::temp_dir().join(format!("sexp_include_test_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("part.txt"), "(x) (y)").unwrap();
        fs::write(
            dir.join("main.txt"),
            "(top (@INCLUDE \"part.txt\") (@INCLUDE part.txt))",
        )
        .unwrap();
        fs::write(dir.join("cycle.txt"), "(top (@INCLUDE cycle.txt))").unwrap();

        let mut reader = SexpReader::new();
        let sexps = reader.read_file(&dir.join("main.txt")).unwrap();
        assert_eq!(sexps[0].to_string(), "(top (x) (y) (x) (y))");

        let mut reader = SexpReader::new();
        reader.include_once = true;
        let sexps = reader.read_file(&dir.join("main.txt")).unwrap();
        assert_eq!(sexps[0].to_string(), "(top (x) (y))");

        let mut reader = SexpReader::new();
        assert!(reader.read_file(&dir.join("cycle.txt")).is_err());

        let _ = fs::remove_dir_all(&dir);
    }
}
