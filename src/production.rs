//! Productions (named rules) and their terminal production nodes (§4.5,
//! §4.11).

use std::collections::HashMap;
use std::fmt;

use crate::beta::BetaId;
use crate::condition::Condition;
use crate::term::{Term, VarName};
use crate::token::TokenId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductionId(pub u64);

/// Variable bindings extracted from a complete-match token (§4.11).
pub type Bindings = HashMap<VarName, Term>;

/// An action callback. Actions are opaque to the network: they receive the
/// bindings for the firing match and a handle back into the engine so they
/// may assert or retract WMEs, and report failure as an `anyhow::Error`
/// that the engine wraps into `EngineError::ActionError`.
pub type Action = Box<dyn Fn(&Bindings, &mut crate::engine::Engine) -> anyhow::Result<()>>;

pub struct Production {
    pub name: String,
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
}

impl fmt::Debug for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Production")
            .field("name", &self.name)
            .field("conditions", &self.conditions)
            .field("actions", &format!("<{} callbacks>", self.actions.len()))
            .finish()
    }
}

/// Terminal node: accumulates complete-match tokens for one production.
/// Does not fire on its own — firing is the engine's job (§4.5).
#[derive(Debug)]
pub struct ProductionNode {
    pub id: ProductionId,
    pub parent_beta: BetaId,
    pub production: Production,
    pub items: Vec<TokenId>,
}

/// Walks a complete-match token's path and extracts the binding of every
/// variable that appears in the production's conditions (§4.11).
pub fn extract_bindings(
    production: &Production,
    path: &[crate::wme::WmeId],
    wmes: &crate::wme::WorkingMemory,
) -> Option<Bindings> {
    let mut bindings = Bindings::new();
    for (condition, &wme_id) in production.conditions.iter().zip(path.iter()) {
        let wme = wmes.get(wme_id)?;
        for &field in &crate::wme::ALL_FIELDS {
            if let Some(var) = condition.field(field).as_var() {
                let value = wme.field(field).clone();
                match bindings.get(var) {
                    Some(existing) if existing != &value => return None,
                    _ => {
                        bindings.insert(var.clone(), value);
                    }
                }
            }
        }
    }
    Some(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ConditionField as F;
    use crate::wme::WorkingMemory;

    fn production(conditions: Vec<Condition>) -> Production {
        Production { name: "test".to_string(), conditions, actions: Vec::new() }
    }

    #[test]
    fn extracts_consistent_bindings_across_conditions() {
        let mut wmes = WorkingMemory::new();
        let (id1, _) = wmes.assert("person1".into(), "name".into(), "Alice".into());
        let (id2, _) = wmes.assert("person1".into(), "age".into(), 25_i64.into());

        let prod = production(vec![
            Condition::new(F::var("p"), F::constant("name"), F::var("n")),
            Condition::new(F::var("p"), F::constant("age"), F::var("a")),
        ]);

        let bindings = extract_bindings(&prod, &[id1, id2], &wmes).unwrap();
        assert_eq!(bindings.get(&crate::term::VarName("p".into())), Some(&Term::Symbol("person1".into())));
        assert_eq!(bindings.get(&crate::term::VarName("n".into())), Some(&Term::Symbol("Alice".into())));
        assert_eq!(bindings.get(&crate::term::VarName("a".into())), Some(&Term::Int(25)));
    }

    #[test]
    fn inconsistent_binding_across_positions_is_rejected() {
        let mut wmes = WorkingMemory::new();
        let (id1, _) = wmes.assert("a".into(), "parent".into(), "b".into());
        let (id2, _) = wmes.assert("c".into(), "parent".into(), "d".into());

        // Both conditions bind ?x to the identifier, but the WMEs disagree.
        let prod = production(vec![
            Condition::new(F::var("x"), F::constant("parent"), F::var("y")),
            Condition::new(F::var("x"), F::constant("parent"), F::var("z")),
        ]);

        assert!(extract_bindings(&prod, &[id1, id2], &wmes).is_none());
    }
}
