//! Tokens: linked partial-match records.
//!
//! Tokens live in one arena on the network rather than behind `Rc<RefCell<>>`
//! links, per the handle/arena convention this codebase uses for its other
//! discrimination-network nodes (`NodeId`-indexed `HashMap`s rather than
//! pointer graphs) — see Design Notes.

use std::collections::HashMap;

use crate::beta::BetaId;
use crate::wme::WmeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(pub u64);

/// A node in the partial-match linked list. `wme` is `None` only for the
/// sentinel root token of the root beta memory (the empty match). `owner`
/// is the beta memory whose `items` list the token lives in.
#[derive(Debug, Clone)]
pub struct Token {
    pub id: TokenId,
    pub parent: Option<TokenId>,
    pub wme: Option<WmeId>,
    pub owner: BetaId,
    pub children: Vec<TokenId>,
}

/// Owns every token in the network, keyed by handle.
#[derive(Debug, Default)]
pub struct TokenArena {
    tokens: HashMap<TokenId, Token>,
    next_id: u64,
}

impl TokenArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, parent: Option<TokenId>, wme: Option<WmeId>, owner: BetaId) -> TokenId {
        let id = TokenId(self.next_id);
        self.next_id += 1;
        self.tokens.insert(id, Token { id, parent, wme, owner, children: Vec::new() });
        if let Some(parent_id) = parent {
            if let Some(parent_token) = self.tokens.get_mut(&parent_id) {
                parent_token.children.push(id);
            }
        }
        id
    }

    pub fn get(&self, id: TokenId) -> Option<&Token> {
        self.tokens.get(&id)
    }

    pub fn get_mut(&mut self, id: TokenId) -> Option<&mut Token> {
        self.tokens.get_mut(&id)
    }

    pub fn remove(&mut self, id: TokenId) -> Option<Token> {
        self.tokens.remove(&id)
    }

    /// Drop `child` from `parent`'s children list, if both still exist.
    pub fn unlink_child(&mut self, parent: TokenId, child: TokenId) {
        if let Some(parent_token) = self.tokens.get_mut(&parent) {
            parent_token.children.retain(|&c| c != child);
        }
    }

    /// The WMEs along this token's path, root-to-leaf, skipping the
    /// sentinel root's `None` slot.
    pub fn path(&self, id: TokenId) -> Vec<WmeId> {
        let mut reversed = Vec::new();
        let mut current = Some(id);
        while let Some(tid) = current {
            let Some(token) = self.tokens.get(&tid) else { break };
            if let Some(wme) = token.wme {
                reversed.push(wme);
            }
            current = token.parent;
        }
        reversed.reverse();
        reversed
    }

    /// The WME at a given zero-indexed position in `path`, if the token's
    /// path is at least that long.
    pub fn wme_at(&self, id: TokenId, index: usize) -> Option<WmeId> {
        self.path(id).get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beta::BetaId;

    #[test]
    fn path_accumulates_from_root_to_leaf_skipping_the_sentinel() {
        let mut arena = TokenArena::new();
        let root = arena.insert(None, None, BetaId(0));
        let child = arena.insert(Some(root), Some(WmeId(1)), BetaId(1));
        let grandchild = arena.insert(Some(child), Some(WmeId(2)), BetaId(2));

        assert_eq!(arena.path(grandchild), vec![WmeId(1), WmeId(2)]);
        assert_eq!(arena.wme_at(grandchild, 0), Some(WmeId(1)));
        assert_eq!(arena.wme_at(grandchild, 1), Some(WmeId(2)));
        assert_eq!(arena.wme_at(grandchild, 2), None);
    }

    #[test]
    fn insert_registers_child_on_parent() {
        let mut arena = TokenArena::new();
        let root = arena.insert(None, None, BetaId(0));
        let child = arena.insert(Some(root), Some(WmeId(5)), BetaId(1));
        assert_eq!(arena.get(root).unwrap().children, vec![child]);
    }

    #[test]
    fn unlink_child_removes_it_from_parents_children() {
        let mut arena = TokenArena::new();
        let root = arena.insert(None, None, BetaId(0));
        let child = arena.insert(Some(root), Some(WmeId(5)), BetaId(1));
        arena.unlink_child(root, child);
        assert!(arena.get(root).unwrap().children.is_empty());
    }

    #[test]
    fn remove_drops_the_token_from_the_arena() {
        let mut arena = TokenArena::new();
        let root = arena.insert(None, None, BetaId(0));
        assert!(arena.remove(root).is_some());
        assert!(arena.get(root).is_none());
    }
}
