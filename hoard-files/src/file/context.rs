use std::rc::Rc;

use log::trace;

use crate::LoadError;
use crate::codec::reader::{ChunkTarget, ReadSeek, skip_unknown_chunk};
use crate::codec::types::{ChunkHeader, Gid};
use crate::compression::Compressor;
use crate::file::options::LoadOptions;
use crate::file::registry::LoaderRegistry;
use crate::file::source::FileLink;
use crate::node::tree::{NodeId, Tree};
use crate::node::types::{Node, NodeHeader, Resource};

/// Settings that travel with every chunk read, including late loads.
#[derive(Debug, Clone)]
pub struct ChunkEnv {
    pub compressor: Rc<dyn Compressor>,
    pub options: LoadOptions,
}

/// The state of one load pass, handed to every loader.
pub struct LoadContext<'a> {
    pub tree: &'a mut Tree,
    registry: &'a LoaderRegistry,
    env: ChunkEnv,
    link: FileLink,
    keep_open: bool,
    created: Vec<NodeId>,
}

impl<'a> LoadContext<'a> {
    pub(crate) fn new(tree: &'a mut Tree, registry: &'a LoaderRegistry, env: ChunkEnv, link: FileLink) -> Self {
        LoadContext {
            tree,
            registry,
            env,
            link,
            keep_open: false,
            created: Vec::new(),
        }
    }

    pub fn env(&self) -> &ChunkEnv {
        &self.env
    }

    pub fn options(&self) -> &LoadOptions {
        &self.env.options
    }

    pub fn file_link(&self) -> FileLink {
        self.link.clone()
    }

    /// Asks for the file to stay open after the load, e.g. because something will late load.
    pub fn keep_open(&mut self) {
        self.keep_open = true;
    }

    pub(crate) fn keep_open_requested(&self) -> bool {
        self.keep_open
    }

    /// Adds a node to the tree. It stays detached until its container adopts it.
    pub fn insert(&mut self, header: NodeHeader, resource: Resource) -> NodeId {
        let id = self.tree.insert(Node::new(header, resource));
        self.created.push(id);
        id
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), LoadError> {
        Ok(self.tree.add_child(parent, child)?)
    }

    /// Dispatches a chunk to the loader registered for `gid`. Chunks nobody can load are skipped
    /// unless unknown chunks are strict. The stream always ends up at the end of the chunk.
    pub fn load_object(&mut self, rdr: &mut dyn ReadSeek, gid: Gid, size: u32) -> Result<Option<NodeId>, LoadError> {
        let registry = self.registry;
        let Some(loader) = registry.get(gid) else {
            skip_unknown_chunk(rdr, ChunkHeader { gid, size }, self.env.options.strict_chunks)?;
            return Ok(None);
        };

        trace!("Loading {} ({} bytes)", gid, size);
        let target = ChunkTarget::new(rdr, size)?;
        let id = loader.load(self, rdr, size)?;
        target.settle(rdr, gid)?;
        Ok(Some(id))
    }

    /// Tears down everything this pass created after a failure.
    pub(crate) fn rollback(&mut self) {
        rollback(self.tree, std::mem::take(&mut self.created));
    }

    /// Ends the pass, handing out what it created in case a later step has to undo it.
    pub(crate) fn into_created(self) -> Vec<NodeId> {
        self.created
    }
}

pub(crate) fn rollback(tree: &mut Tree, created: Vec<NodeId>) {
    for id in created.into_iter().rev() {
        if tree.contains(id) {
            if let Err(err) = tree.destroy(id) {
                trace!("Rollback of {} failed: {}", id, err);
            }
        }
    }
}
