//! The discrimination network proper: ties alpha memories, beta memories,
//! join nodes, tokens and production nodes together, and implements
//! construction/sharing (§4.6), propagation (§4.2–§4.4), and retraction
//! teardown (§4.8).

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::alpha::{AlphaId, AlphaNetwork};
use crate::beta::{BetaChild, BetaId, BetaNetwork};
use crate::condition::Condition;
use crate::error::{EngineError, EngineResult};
use crate::join::{compute_join_tests, JoinId, JoinNetwork, JoinTest};
use crate::production::{Action, Production, ProductionId, ProductionNode};
use crate::term::Term;
use crate::token::{TokenArena, TokenId};
use crate::wme::{WmeId, WorkingMemory};

#[derive(Debug, Default)]
pub struct ReteNetwork {
    pub working_memory: WorkingMemory,
    alpha: AlphaNetwork,
    beta: BetaNetwork,
    join: JoinNetwork,
    tokens: TokenArena,
    productions: HashMap<ProductionId, ProductionNode>,
    production_names: HashMap<String, ProductionId>,
    next_production_id: u64,
    /// Back-reference: every alpha memory a WME currently sits in (§3).
    wme_alpha_memories: HashMap<WmeId, Vec<AlphaId>>,
    /// Back-reference: every token directly pinned to a WME (§3) — i.e.
    /// tokens `t` with `t.wme == Some(wme)`, not the transitive descendants
    /// whose path merely passes through it (those are reached by recursing
    /// through `children` during teardown).
    wme_tokens: HashMap<WmeId, Vec<TokenId>>,
}

impl ReteNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn production_id(&self, name: &str) -> Option<ProductionId> {
        self.production_names.get(name).copied()
    }

    pub fn production(&self, id: ProductionId) -> Option<&ProductionNode> {
        self.productions.get(&id)
    }

    pub fn production_mut(&mut self, id: ProductionId) -> Option<&mut ProductionNode> {
        self.productions.get_mut(&id)
    }

    /// All complete-match `(production, token)` pairs, in production
    /// insertion order, each inner list in token-insertion order (§4.10).
    pub fn agenda(&self) -> Vec<(ProductionId, TokenId)> {
        let mut ids: Vec<&ProductionId> = self.productions.keys().collect();
        ids.sort();
        ids.into_iter()
            .flat_map(|&pid| self.productions[&pid].items.iter().map(move |&tid| (pid, tid)))
            .collect()
    }

    pub fn token_path(&self, token: TokenId) -> Vec<WmeId> {
        self.tokens.path(token)
    }

    #[instrument(skip(self, name, conditions, actions), fields(name = %name))]
    pub fn add_production(
        &mut self,
        name: String,
        conditions: Vec<Condition>,
        actions: Vec<Action>,
    ) -> EngineResult<ProductionId> {
        if self.production_names.contains_key(&name) {
            return Err(EngineError::DuplicateProductionName { name });
        }

        // An empty condition list is well-defined per §4.6: the loop below
        // simply never runs, `current_beta` stays the root beta memory, and
        // the production node attaches directly to it — a degenerate
        // production that permanently matches the sentinel (empty) token.
        let mut current_beta = self.beta.root_id(&mut self.tokens);
        let mut earlier_conditions: Vec<Condition> = Vec::new();

        for condition in &conditions {
            let alpha_id = self.alpha.get_or_create(condition);
            let tests = compute_join_tests(condition, &earlier_conditions);

            let candidates: Vec<JoinId> = self
                .beta
                .get(current_beta)
                .expect("current_beta always exists")
                .children
                .iter()
                .filter_map(|c| match c {
                    BetaChild::Join(j) => Some(*j),
                    BetaChild::Production(_) => None,
                })
                .collect();

            current_beta = match self.join.find_shared(&candidates, alpha_id, &tests) {
                Some(join_id) => {
                    debug!(join_id = join_id.0, "sharing existing join node");
                    self.join.get(join_id).expect("just looked up").child_beta
                }
                None => self.build_join(current_beta, alpha_id, tests),
            };
            earlier_conditions.push(condition.clone());
        }

        let production_id = ProductionId(self.next_production_id);
        self.next_production_id += 1;
        let terminal_beta = current_beta;
        let production_name = name.clone();
        let node = ProductionNode {
            id: production_id,
            parent_beta: terminal_beta,
            production: Production { name, conditions, actions },
            items: Vec::new(),
        };
        self.productions.insert(production_id, node);
        self.production_names.insert(production_name, production_id);
        self.beta
            .get_mut(terminal_beta)
            .expect("terminal beta exists")
            .children
            .push(BetaChild::Production(production_id));

        // Pre-existing matches at the (possibly shared) terminal beta
        // memory already satisfy every condition; attach them immediately
        // so late-added productions match pre-existing facts (§4.6).
        let existing_tokens = self.beta.get(terminal_beta).expect("terminal beta exists").items.clone();
        if let Some(node) = self.productions.get_mut(&production_id) {
            node.items.extend(existing_tokens);
        }

        debug!(production_id = production_id.0, "production added");
        Ok(production_id)
    }

    fn build_join(&mut self, parent_beta: BetaId, alpha_id: AlphaId, tests: Vec<JoinTest>) -> BetaId {
        let child_beta = self.beta.create();
        let join_id = self.join.create(parent_beta, alpha_id, tests, child_beta);
        self.alpha.add_successor(alpha_id, join_id);
        self.beta
            .get_mut(parent_beta)
            .expect("parent beta exists")
            .children
            .push(BetaChild::Join(join_id));

        let existing_wmes = self.alpha.get(alpha_id).expect("alpha memory exists").items.clone();
        for wme_id in existing_wmes {
            self.right_activate_join(join_id, wme_id);
        }
        debug!(join_id = join_id.0, alpha_id = alpha_id.0, "join node created");
        child_beta
    }

    #[instrument(skip(self))]
    pub fn assert_wme(&mut self, identifier: Term, attribute: Term, value: Term) -> WmeId {
        let (wme_id, created) = self.working_memory.assert(identifier, attribute, value);
        if created {
            let wme = self.working_memory.get(wme_id).expect("just inserted").clone();
            let alpha_ids = self.alpha.dispatch(&wme);
            self.wme_alpha_memories.insert(wme_id, alpha_ids.clone());
            for alpha_id in alpha_ids {
                self.activate_alpha_memory(alpha_id, wme_id);
            }
        } else {
            debug!(wme_id = wme_id.0, "duplicate assertion, idempotent");
        }
        wme_id
    }

    #[instrument(skip(self))]
    pub fn retract_wme(&mut self, wme_id: WmeId) -> EngineResult<()> {
        if !self.working_memory.contains(wme_id) {
            return Err(EngineError::UnknownWme { id: wme_id });
        }

        let direct_tokens = self.wme_tokens.remove(&wme_id).unwrap_or_default();
        for token_id in direct_tokens {
            self.teardown_token(token_id);
        }

        let alpha_ids = self.wme_alpha_memories.remove(&wme_id).unwrap_or_default();
        self.alpha.retract(wme_id, &alpha_ids);
        self.working_memory.remove(wme_id);
        debug!(wme_id = wme_id.0, "retracted");
        Ok(())
    }

    fn activate_alpha_memory(&mut self, alpha_id: AlphaId, wme_id: WmeId) {
        if let Some(memory) = self.alpha.get_mut(alpha_id) {
            memory.items.push(wme_id);
        }
        let successors = self.alpha.get(alpha_id).map(|m| m.successors.clone()).unwrap_or_default();
        for join_id in successors {
            self.right_activate_join(join_id, wme_id);
        }
    }

    fn right_activate_join(&mut self, join_id: JoinId, wme_id: WmeId) {
        let join = self.join.get(join_id).expect("join exists").clone();
        if Some(join.parent_beta) == self.beta.root() {
            self.extend_and_propagate(join.child_beta, None, wme_id);
            return;
        }
        let parent_items = self.beta.get(join.parent_beta).map(|b| b.items.clone()).unwrap_or_default();
        for token_id in parent_items {
            if self.perform_join_tests(&join.tests, token_id, wme_id) {
                self.extend_and_propagate(join.child_beta, Some(token_id), wme_id);
            }
        }
    }

    fn left_activate_join(&mut self, join_id: JoinId, token_id: TokenId) {
        let join = self.join.get(join_id).expect("join exists").clone();
        let alpha_items = self.alpha.get(join.alpha_memory).map(|m| m.items.clone()).unwrap_or_default();
        for wme_id in alpha_items {
            if self.perform_join_tests(&join.tests, token_id, wme_id) {
                self.extend_and_propagate(join.child_beta, Some(token_id), wme_id);
            }
        }
    }

    fn extend_and_propagate(&mut self, child_beta: BetaId, parent_token: Option<TokenId>, wme_id: WmeId) {
        let token_id = self.tokens.insert(parent_token, Some(wme_id), child_beta);
        self.wme_tokens.entry(wme_id).or_default().push(token_id);
        self.beta_receive_token(child_beta, token_id);
    }

    fn beta_receive_token(&mut self, beta_id: BetaId, token_id: TokenId) {
        if let Some(beta) = self.beta.get_mut(beta_id) {
            beta.items.push(token_id);
        }
        let children = self.beta.get(beta_id).map(|b| b.children.clone()).unwrap_or_default();
        for child in children {
            match child {
                BetaChild::Join(join_id) => self.left_activate_join(join_id, token_id),
                BetaChild::Production(production_id) => {
                    if let Some(node) = self.productions.get_mut(&production_id) {
                        node.items.push(token_id);
                    }
                }
            }
        }
    }

    fn perform_join_tests(&self, tests: &[JoinTest], token_id: TokenId, wme_id: WmeId) -> bool {
        let Some(wme) = self.working_memory.get(wme_id) else { return false };
        for test in tests {
            let Some(earlier_id) = self.tokens.wme_at(token_id, test.earlier_index) else {
                return false;
            };
            let Some(earlier_wme) = self.working_memory.get(earlier_id) else { return false };
            if earlier_wme.field(test.earlier_field) != wme.field(test.this_field) {
                return false;
            }
        }
        true
    }

    fn teardown_token(&mut self, token_id: TokenId) {
        let children = self.tokens.get(token_id).map(|t| t.children.clone()).unwrap_or_default();
        for child in children {
            self.teardown_token(child);
        }

        let Some(token) = self.tokens.remove(token_id) else { return };

        if let Some(parent_id) = token.parent {
            self.tokens.unlink_child(parent_id, token_id);
        }

        let production_children: Vec<ProductionId> = self
            .beta
            .get_mut(token.owner)
            .map(|beta| {
                beta.items.retain(|&t| t != token_id);
                beta.children
                    .iter()
                    .filter_map(|c| match c {
                        BetaChild::Production(p) => Some(*p),
                        BetaChild::Join(_) => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        for production_id in production_children {
            if let Some(node) = self.productions.get_mut(&production_id) {
                node.items.retain(|&t| t != token_id);
            }
        }
    }
}
