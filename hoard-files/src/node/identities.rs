use std::collections::HashMap;
use std::collections::hash_map::Entry;

use log::debug;

use crate::codec::types::Guid;
use crate::node::tree::{NodeId, Tree};

/// Maps persisted identities to the nodes a load constructed, so references can be resolved.
#[derive(Debug, Default, Clone)]
pub struct IdentityMap {
    nodes: HashMap<Guid, NodeId>,
}

impl IdentityMap {
    /// Collects the identities of `root` and everything below it. Nodes without an identity are
    /// skipped, for duplicates the first node in preorder wins.
    pub fn build(tree: &Tree, root: NodeId) -> Self {
        let mut map = IdentityMap::default();
        for id in tree.walk(root) {
            if let Some(node) = tree.get(id) {
                map.insert(node.guid(), id);
            }
        }
        map
    }

    pub fn insert(&mut self, guid: Guid, id: NodeId) {
        if guid.is_empty() {
            return;
        }

        match self.nodes.entry(guid) {
            Entry::Occupied(existing) => {
                debug!("Duplicate identity {}, keeping {}", guid, existing.get());
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }
    }

    pub fn get(&self, guid: Guid) -> Option<NodeId> {
        self.nodes.get(&guid).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
