//! Join nodes: relational equi-joins across conditions (§4.3, §4.7).

use std::collections::HashMap;

use crate::alpha::AlphaId;
use crate::beta::BetaId;
use crate::condition::{Condition, ConditionField};
use crate::wme::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JoinId(pub u64);

/// `(earlier_condition_index, earlier_field, this_field)`: the incoming
/// WME's `this_field` must equal the `earlier_field` of the WME bound at
/// `earlier_condition_index` in the token's path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JoinTest {
    pub earlier_index: usize,
    pub earlier_field: Field,
    pub this_field: Field,
}

#[derive(Debug, Clone)]
pub struct JoinNode {
    pub id: JoinId,
    pub parent_beta: BetaId,
    pub alpha_memory: AlphaId,
    pub tests: Vec<JoinTest>,
    pub child_beta: BetaId,
}

/// Computes the join-test vector for the `k`-th condition against the
/// conditions that precede it, per §4.7: outer loop over this condition's
/// fields in canonical order, inner loop over earlier conditions (ascending
/// index) and their fields, in canonical order.
pub fn compute_join_tests(condition: &Condition, earlier_conditions: &[Condition]) -> Vec<JoinTest> {
    let mut tests = Vec::new();
    for &this_field in &crate::wme::ALL_FIELDS {
        let ConditionField::Var(this_var) = condition.field(this_field) else {
            continue;
        };
        for (earlier_index, earlier) in earlier_conditions.iter().enumerate() {
            for &earlier_field in &crate::wme::ALL_FIELDS {
                if let ConditionField::Var(earlier_var) = earlier.field(earlier_field) {
                    if earlier_var == this_var {
                        tests.push(JoinTest { earlier_index, earlier_field, this_field });
                    }
                }
            }
        }
    }
    tests
}

#[derive(Debug, Default)]
pub struct JoinNetwork {
    nodes: HashMap<JoinId, JoinNode>,
    next_id: u64,
}

impl JoinNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &mut self,
        parent_beta: BetaId,
        alpha_memory: AlphaId,
        tests: Vec<JoinTest>,
        child_beta: BetaId,
    ) -> JoinId {
        let id = JoinId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, JoinNode { id, parent_beta, alpha_memory, tests, child_beta });
        id
    }

    pub fn get(&self, id: JoinId) -> Option<&JoinNode> {
        self.nodes.get(&id)
    }

    /// Find an existing child join node of `parent_beta` whose alpha memory
    /// and test vector match exactly, for node sharing (§4.6).
    pub fn find_shared(
        &self,
        candidates: &[JoinId],
        alpha_memory: AlphaId,
        tests: &[JoinTest],
    ) -> Option<JoinId> {
        candidates.iter().copied().find(|&id| {
            self.nodes
                .get(&id)
                .is_some_and(|node| node.alpha_memory == alpha_memory && node.tests == tests)
        })
    }
}
