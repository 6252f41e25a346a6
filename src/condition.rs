//! Condition patterns: the triples a production matches against working
//! memory, with each field either a constant term or a variable.

use crate::term::{Term, VarName};
use crate::wme::Field;

/// One field of a `Condition`: either a fixed term the WME field must equal,
/// or a variable that binds to whatever term occupies that position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConditionField {
    Const(ConstTerm),
    Var(VarName),
}

/// A hashable wrapper around `Term` for use as a constant-test key. `Term`
/// itself is already `Eq + Hash`; this newtype exists purely so
/// `ConditionField` reads clearly at call sites (`Const(term)` vs.
/// `Const(ConstTerm(term))`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstTerm(pub Term);

impl ConditionField {
    pub fn constant(term: impl Into<Term>) -> Self {
        ConditionField::Const(ConstTerm(term.into()))
    }

    pub fn var(name: impl Into<VarName>) -> Self {
        ConditionField::Var(name.into())
    }

    pub fn as_var(&self) -> Option<&VarName> {
        match self {
            ConditionField::Var(v) => Some(v),
            ConditionField::Const(_) => None,
        }
    }

    pub fn as_const(&self) -> Option<&Term> {
        match self {
            ConditionField::Const(ConstTerm(t)) => Some(t),
            ConditionField::Var(_) => None,
        }
    }
}

/// A single triple pattern within a production.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Condition {
    pub identifier: ConditionField,
    pub attribute: ConditionField,
    pub value: ConditionField,
}

impl Condition {
    pub fn new(identifier: ConditionField, attribute: ConditionField, value: ConditionField) -> Self {
        Self { identifier, attribute, value }
    }

    pub fn field(&self, field: Field) -> &ConditionField {
        match field {
            Field::Identifier => &self.identifier,
            Field::Attribute => &self.attribute,
            Field::Value => &self.value,
        }
    }
}
