use crate::core::account::AccountId;
use std::collections::HashMap;

/// A small integer handle for an interned `AccountId`.
///
/// Indexing adjacency and visited-set bookkeeping by `NodeId` instead of
/// by `AccountId` keeps the hot paths of cycle/chain search free of
/// string hashing and comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Bidirectional mapping between `AccountId` and `NodeId`, built once
/// during graph construction and never mutated afterward.
#[derive(Debug, Clone, Default)]
pub struct Interner {
    ids: Vec<AccountId>,
    index: HashMap<AccountId, NodeId>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern an account, returning its existing id or assigning a new one.
    pub fn intern(&mut self, account: AccountId) -> NodeId {
        if let Some(&id) = self.index.get(&account) {
            return id;
        }
        let id = NodeId(self.ids.len() as u32);
        self.index.insert(account.clone(), id);
        self.ids.push(account);
        id
    }

    pub fn lookup(&self, account: &AccountId) -> Option<NodeId> {
        self.index.get(account).copied()
    }

    pub fn resolve(&self, id: NodeId) -> &AccountId {
        &self.ids[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &AccountId)> {
        self.ids
            .iter()
            .enumerate()
            .map(|(i, a)| (NodeId(i as u32), a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut interner = Interner::new();
        let a1 = interner.intern(AccountId::new("A"));
        let a2 = interner.intern(AccountId::new("A"));
        let b = interner.intern(AccountId::new("B"));
        assert_eq!(a1, a2);
        assert_ne!(a1, b);
        assert_eq!(interner.resolve(a1), &AccountId::new("A"));
    }

    #[test]
    fn assigns_sequential_ids_in_first_seen_order() {
        let mut interner = Interner::new();
        let b = interner.intern(AccountId::new("B"));
        let a = interner.intern(AccountId::new("A"));
        assert_eq!(b, NodeId(0));
        assert_eq!(a, NodeId(1));
    }
}
