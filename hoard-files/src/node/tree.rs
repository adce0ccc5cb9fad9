use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use log::{debug, trace, warn};
use thiserror::Error;

use crate::LoadError;
use crate::animation::types::Animation;
use crate::blob::types::Blob;
use crate::codec::types::Guid;
use crate::data::types::DataArray;
use crate::file::options::ResolvePolicy;
use crate::folder::types::Folder;
use crate::image::types::Image;
use crate::link::types::Link;
use crate::node::identities::IdentityMap;
use crate::node::types::{CustomResource, Node, Resource};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TreeError {
    #[error("The node {0} does not exist (anymore)")]
    StaleHandle(NodeId),

    #[error("Attaching {child} to {parent} would make the node its own ancestor")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("The node {0} is not held by anyone")]
    NotAcquired(NodeId),

    #[error("The node {0} is not a folder")]
    NotAFolder(NodeId),
}

/// A handle into a [`Tree`]. Handles of destroyed nodes are never handed out again, a stale
/// handle simply stops resolving.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Owns every node. Parent links own their children, external holders keep a node alive
/// through [`Tree::acquire`] even when the parent goes away.
#[derive(Debug, Default)]
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a detached node.
    pub fn insert(&mut self, node: Node) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId { index, generation: 0 }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.get(id).ok_or(TreeError::StaleHandle(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.get_mut(id).ok_or(TreeError::StaleHandle(id))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    /// Whether `ancestor` is found walking up the parent links of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }

    /// Appends `child` to `parent`, moving it away from its previous parent if it had one.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.node(parent)?;
        self.node(child)?;
        if parent == child || self.is_ancestor(child, parent) {
            return Err(TreeError::Cycle { parent, child });
        }

        self.unlink(child);
        self.node_mut(parent)?.children.push(child);
        let node = self.node_mut(child)?;
        node.parent = Some(parent);
        node.orphaned = false;
        self.invalidate_root(child);
        Ok(())
    }

    /// Removes `id` from its parent. The node stays alive.
    pub fn detach(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.node(id)?;
        self.unlink(id);
        self.invalidate_root(id);
        Ok(())
    }

    fn unlink(&mut self, id: NodeId) {
        let Some(parent) = self.get_mut(id).and_then(|node| node.parent.take()) else {
            return;
        };
        if let Some(parent) = self.get_mut(parent) {
            parent.children.retain(|c| *c != id);
        }
    }

    fn invalidate_root(&self, id: NodeId) {
        for id in self.walk(id) {
            if let Some(node) = self.get(id) {
                node.root.set(None);
            }
        }
    }

    /// The topmost ancestor of `id`, which is `id` itself for detached nodes.
    pub fn root_of(&self, id: NodeId) -> Result<NodeId, TreeError> {
        let node = self.node(id)?;
        if let Some(root) = node.root.get() {
            if self.contains(root) {
                return Ok(root);
            }
        }

        let root = match node.parent {
            None => id,
            Some(parent) => self.root_of(parent)?,
        };
        node.root.set(Some(root));
        Ok(root)
    }

    /// Registers an external holder and returns the new count.
    pub fn acquire(&mut self, id: NodeId) -> Result<u32, TreeError> {
        let node = self.node_mut(id)?;
        node.refcount += 1;
        Ok(node.refcount)
    }

    /// Drops an external holder. The last release of a node orphaned by [`Tree::destroy`]
    /// destroys it, holds its own links have on it do not count.
    pub fn release(&mut self, id: NodeId) -> Result<(), TreeError> {
        let node = self.node_mut(id)?;
        if node.refcount == 0 {
            return Err(TreeError::NotAcquired(id));
        }

        node.refcount -= 1;
        if !node.orphaned || node.parent.is_some() {
            return Ok(());
        }

        let mut internal = self.internal_holds(id);
        if self.external_holds(id, &internal) == 0 {
            trace!("Last holder of {} is gone", id);
            self.free(id, &mut internal);
        }
        Ok(())
    }

    /// Tears down `id` as its owner. A node that is still held from outside its subtree only
    /// loses its parent, otherwise it is destroyed along with every child nobody else holds.
    pub fn destroy(&mut self, id: NodeId) -> Result<(), TreeError> {
        let mut internal = self.internal_holds(id);
        let external = self.external_holds(id, &internal);
        if external > 0 {
            debug!("{} is still held {} time(s), detaching instead", id, external);
            self.detach(id)?;
            self.node_mut(id)?.orphaned = true;
            return Ok(());
        }

        self.unlink(id);
        self.free(id, &mut internal);
        Ok(())
    }

    /// How often links inside the subtree at `id` hold nodes of that same subtree.
    fn internal_holds(&self, id: NodeId) -> HashMap<NodeId, u32> {
        let members = self.walk(id);
        let mut holds = HashMap::new();
        for member in &members {
            let Some(Resource::Link(link)) = self.get(*member).map(|node| &node.resource) else {
                continue;
            };
            if let Some(target) = link.target.filter(|target| members.contains(target)) {
                *holds.entry(target).or_insert(0u32) += 1;
            }
        }
        holds
    }

    fn external_holds(&self, id: NodeId, internal: &HashMap<NodeId, u32>) -> u32 {
        let refcount = self.get(id).map_or(0, |node| node.refcount);
        refcount.saturating_sub(internal.get(&id).copied().unwrap_or(0))
    }

    fn take(&mut self, id: NodeId) -> Option<Node> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?;
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Some(node)
    }

    /// Frees `id` and its unheld descendants. `internal` counts the holds links of the torn
    /// down subtree have on its own members, it is kept in step as those links go away.
    fn free(&mut self, id: NodeId, internal: &mut HashMap<NodeId, u32>) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            let Some(node) = self.take(id) else {
                continue;
            };

            for child in node.children {
                let external = self.external_holds(child, internal);
                let Some(child_node) = self.get_mut(child) else {
                    continue;
                };
                child_node.parent = None;

                if external > 0 {
                    child_node.orphaned = true;
                    self.invalidate_root(child);
                } else {
                    pending.push(child);
                }
            }

            let Resource::Link(link) = node.resource else {
                continue;
            };
            let Some(target) = link.target else {
                continue;
            };
            match internal.get_mut(&target) {
                Some(count) if *count > 0 => {
                    *count -= 1;
                    if let Some(target) = self.get_mut(target) {
                        target.refcount = target.refcount.saturating_sub(1);
                    }
                }
                _ => {
                    if let Err(err) = self.release(target) {
                        trace!("Link target {} was already gone: {}", target, err);
                    }
                }
            }
        }
    }

    /// Every node of the subtree at `id` in preorder, `id` first.
    pub fn walk(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            order.push(id);
            stack.extend(node.children.iter().rev());
        }
        order
    }

    pub fn find_by_guid(&self, start: NodeId, guid: Guid) -> Option<NodeId> {
        if guid.is_empty() {
            return None;
        }

        self.walk(start)
            .into_iter()
            .find(|id| self.get(*id).is_some_and(|node| node.guid() == guid))
    }

    /// Looks a child up by name. Folders with significant names use the index built by
    /// [`Tree::prepare`], everything else is searched in order.
    pub fn child_by_name(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        let node = self.get(parent)?;
        if let Resource::Folder(folder) = &node.resource {
            if let Some(id) = folder.named.get(name) {
                return Some(*id);
            }
        }

        node.children
            .iter()
            .copied()
            .find(|id| self.get(*id).is_some_and(|child| child.name() == name))
    }

    /// Makes the subtree at `id` ready for use, children first. Running it twice does nothing
    /// the first run did not already do.
    pub fn prepare(&mut self, id: NodeId) -> Result<(), TreeError> {
        for child in self.node(id)?.children.clone() {
            self.prepare(child)?;
        }

        let index = self.name_index(id);
        let node = self.node_mut(id)?;
        match &mut node.resource {
            Resource::Folder(folder) => {
                if let Some(index) = index {
                    folder.named = index;
                }
            }
            Resource::Image(image) => image.prepare(),
            Resource::Custom(custom) => custom.prepare(),
            Resource::Blob(_) | Resource::Animation(_) | Resource::Link(_) | Resource::Data(_) => {}
        }
        Ok(())
    }

    fn name_index(&self, id: NodeId) -> Option<HashMap<String, NodeId>> {
        let node = self.get(id)?;
        match &node.resource {
            Resource::Folder(folder) if folder.significant_names && folder.index_names => {
                let mut index = HashMap::new();
                for child in &node.children {
                    let Some(name) = self.get(*child).map(|c| c.name()) else {
                        continue;
                    };
                    if !name.is_empty() {
                        index.entry(name.to_string()).or_insert(*child);
                    }
                }
                Some(index)
            }
            _ => None,
        }
    }

    /// Drops the loading-time data of the subtree at `id`, children first.
    pub fn discard(&mut self, id: NodeId) -> Result<(), TreeError> {
        for child in self.node(id)?.children.clone() {
            self.discard(child)?;
        }

        match &mut self.node_mut(id)?.resource {
            Resource::Image(image) => image.discard(),
            Resource::Custom(custom) => custom.discard(),
            _ => {}
        }
        Ok(())
    }

    /// Replaces persisted identities with handles, children first. Targets gain a holder.
    pub fn resolve(&mut self, id: NodeId, identities: &IdentityMap, policy: ResolvePolicy) -> Result<(), LoadError> {
        for child in self.node(id)?.children.clone() {
            self.resolve(child, identities, policy)?;
        }

        let guid = match &mut self.node_mut(id)?.resource {
            Resource::Link(link) => link.target_guid,
            Resource::Custom(custom) => {
                custom.resolve(identities);
                return Ok(());
            }
            _ => return Ok(()),
        };

        let target = identities.get(guid).filter(|target| self.contains(*target));
        if target.is_none() && !guid.is_empty() {
            match policy {
                ResolvePolicy::Strict => return Err(LoadError::DanglingReference { guid }),
                ResolvePolicy::Lenient => warn!("{} refers to {} which is not part of the file", id, guid),
            }
        }

        let previous = match &mut self.node_mut(id)?.resource {
            Resource::Link(link) if link.target == target => return Ok(()),
            Resource::Link(link) => std::mem::replace(&mut link.target, target),
            _ => None,
        };
        if let Some(target) = target {
            self.acquire(target)?;
        }
        if let Some(previous) = previous {
            self.release(previous)?;
        }
        Ok(())
    }

    pub fn folder(&self, id: NodeId) -> Option<&Folder> {
        match &self.get(id)?.resource {
            Resource::Folder(folder) => Some(folder),
            _ => None,
        }
    }

    pub fn folder_mut(&mut self, id: NodeId) -> Option<&mut Folder> {
        match &mut self.get_mut(id)?.resource {
            Resource::Folder(folder) => Some(folder),
            _ => None,
        }
    }

    pub fn blob(&self, id: NodeId) -> Option<&Blob> {
        match &self.get(id)?.resource {
            Resource::Blob(blob) => Some(blob),
            _ => None,
        }
    }

    pub fn blob_mut(&mut self, id: NodeId) -> Option<&mut Blob> {
        match &mut self.get_mut(id)?.resource {
            Resource::Blob(blob) => Some(blob),
            _ => None,
        }
    }

    pub fn image(&self, id: NodeId) -> Option<&Image> {
        match &self.get(id)?.resource {
            Resource::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn image_mut(&mut self, id: NodeId) -> Option<&mut Image> {
        match &mut self.get_mut(id)?.resource {
            Resource::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn animation(&self, id: NodeId) -> Option<&Animation> {
        match &self.get(id)?.resource {
            Resource::Animation(animation) => Some(animation),
            _ => None,
        }
    }

    pub fn link(&self, id: NodeId) -> Option<&Link> {
        match &self.get(id)?.resource {
            Resource::Link(link) => Some(link),
            _ => None,
        }
    }

    pub fn data(&self, id: NodeId) -> Option<&DataArray> {
        match &self.get(id)?.resource {
            Resource::Data(data) => Some(data),
            _ => None,
        }
    }

    pub fn custom<T: CustomResource>(&self, id: NodeId) -> Option<&T> {
        match &self.get(id)?.resource {
            Resource::Custom(custom) => custom.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn custom_mut<T: CustomResource>(&mut self, id: NodeId) -> Option<&mut T> {
        match &mut self.get_mut(id)?.resource {
            Resource::Custom(custom) => custom.as_any_mut().downcast_mut::<T>(),
            _ => None,
        }
    }
}
