//! Alpha memories and the alpha-index dispatch trie (§4.1, §4.2, §4.9).

use std::collections::HashMap;

use tracing::debug;

use crate::condition::Condition;
use crate::join::JoinId;
use crate::term::Term;
use crate::wme::{Wme, ALL_FIELDS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlphaId(pub u64);

/// A single-condition filter: every WME appended here satisfies every
/// constant test of the condition(s) that share it.
#[derive(Debug, Default)]
pub struct AlphaMemory {
    pub id: AlphaId,
    pub items: Vec<crate::wme::WmeId>,
    pub successors: Vec<JoinId>,
}

impl AlphaMemory {
    fn new(id: AlphaId) -> Self {
        Self { id, items: Vec::new(), successors: Vec::new() }
    }
}

/// One level of the dispatch trie, corresponding to one of the three WME
/// fields in the canonical (identifier, attribute, value) order. A
/// condition that pins this field to a constant follows `constants[value]`;
/// a condition that leaves it a variable follows `wildcard`. Dispatch walks
/// both branches whenever both exist, so a single incoming WME can reach
/// several alpha memories.
#[derive(Debug, Default)]
struct TrieNode {
    constants: HashMap<Term, TrieNode>,
    wildcard: Option<Box<TrieNode>>,
    memory: Option<AlphaId>,
}

/// Builds and shares alpha memories, and routes asserted WMEs to every
/// memory whose constant tests they satisfy.
#[derive(Debug, Default)]
pub struct AlphaNetwork {
    root: TrieNode,
    memories: HashMap<AlphaId, AlphaMemory>,
    next_id: u64,
}

impl AlphaNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the alpha memory for `condition`'s constant tests,
    /// creating missing trie branches along the way (§4.1).
    pub fn get_or_create(&mut self, condition: &Condition) -> AlphaId {
        let mut node = &mut self.root;
        for &field in &ALL_FIELDS {
            node = match condition.field(field).as_const() {
                Some(term) => node.constants.entry(term.clone()).or_default(),
                None => node.wildcard.get_or_insert_with(|| Box::new(TrieNode::default())),
            };
        }
        if let Some(id) = node.memory {
            debug!(alpha_id = id.0, "sharing existing alpha memory");
            return id;
        }
        let id = AlphaId(self.next_id);
        self.next_id += 1;
        node.memory = Some(id);
        self.memories.insert(id, AlphaMemory::new(id));
        debug!(alpha_id = id.0, "created alpha memory");
        id
    }

    pub fn get(&self, id: AlphaId) -> Option<&AlphaMemory> {
        self.memories.get(&id)
    }

    pub fn get_mut(&mut self, id: AlphaId) -> Option<&mut AlphaMemory> {
        self.memories.get_mut(&id)
    }

    pub fn add_successor(&mut self, id: AlphaId, join: JoinId) {
        if let Some(memory) = self.memories.get_mut(&id) {
            memory.successors.push(join);
        }
    }

    /// Walk every trie path consistent with `wme`'s field values and return
    /// the alpha memories reached, in traversal order (§4.9).
    pub fn dispatch(&self, wme: &Wme) -> Vec<AlphaId> {
        let mut hits = Vec::new();
        Self::walk(&self.root, wme, 0, &mut hits);
        hits
    }

    fn walk(node: &TrieNode, wme: &Wme, depth: usize, hits: &mut Vec<AlphaId>) {
        if depth == ALL_FIELDS.len() {
            if let Some(id) = node.memory {
                hits.push(id);
            }
            return;
        }
        let field = ALL_FIELDS[depth];
        let value = wme.field(field);
        if let Some(child) = node.constants.get(value) {
            Self::walk(child, wme, depth + 1, hits);
        }
        if let Some(child) = &node.wildcard {
            Self::walk(child, wme, depth + 1, hits);
        }
    }

    /// Remove `wme` from every alpha memory it occupies. Returns the ids of
    /// memories it was found in, for the caller to use when tearing down
    /// dependent tokens.
    pub fn retract(&mut self, wme_id: crate::wme::WmeId, alpha_ids: &[AlphaId]) {
        for &id in alpha_ids {
            if let Some(memory) = self.memories.get_mut(&id) {
                memory.items.retain(|&item| item != wme_id);
            }
        }
    }
}
