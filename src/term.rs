//! Fact terms: the small, closed value universe WMEs and conditions are
//! built from.

use std::fmt;

/// A value occupying one field of a WME or a constant position of a
/// condition.
///
/// `Int` and `Float` are kept as separate variants (rather than one
/// `Number`) so structural equality and hashing stay exact instead of
/// coercing across numeric kinds, following the same split this codebase
/// uses for its own fact-value type.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Symbol(String),
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Eq for Term {}

impl std::hash::Hash for Term {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Term::Symbol(s) | Term::Str(s) => s.hash(state),
            Term::Int(i) => i.hash(state),
            Term::Float(f) => f.to_bits().hash(state),
            Term::Bool(b) => b.hash(state),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Symbol(s) => write!(f, "{s}"),
            Term::Str(s) => write!(f, "\"{s}\""),
            Term::Int(i) => write!(f, "{i}"),
            Term::Float(v) => write!(f, "{v}"),
            Term::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        Term::Symbol(s.to_string())
    }
}

impl From<String> for Term {
    fn from(s: String) -> Self {
        Term::Symbol(s)
    }
}

impl From<i64> for Term {
    fn from(i: i64) -> Self {
        Term::Int(i)
    }
}

impl From<f64> for Term {
    fn from(v: f64) -> Self {
        Term::Float(v)
    }
}

impl From<bool> for Term {
    fn from(b: bool) -> Self {
        Term::Bool(b)
    }
}

/// A variable's identity. Two occurrences of the same `VarName` within (or
/// across) a production's conditions must bind to the same term. The `?`
/// convention some callers use when writing conditions by hand is purely a
/// surface-syntax convenience; identity here is the name string itself, not
/// any textual prefix (see Design Notes, open question iv).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VarName(pub String);

impl fmt::Display for VarName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

impl From<&str> for VarName {
    fn from(s: &str) -> Self {
        let name = s.strip_prefix('?').unwrap_or(s);
        VarName(name.to_string())
    }
}
