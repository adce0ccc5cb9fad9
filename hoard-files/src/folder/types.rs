use std::collections::HashMap;

use bitflags::bitflags;
use hoard_files_derive_parseable::Parse;

use crate::codec::types::Bool32;
use crate::file::source::FileLink;
use crate::node::tree::NodeId;

/// A container node. The children themselves live on the node, the folder only keeps what it
/// needs to load them later and to look them up by name.
#[derive(Debug)]
pub struct Folder {
    pub(crate) significant_names: bool,
    /// Whether prepare builds the name index. Folders read without names leave it out.
    pub(crate) index_names: bool,
    pub(crate) named: HashMap<String, NodeId>,
    pub(crate) fully_loaded: bool,
    pub(crate) entrypoint: Option<u64>,
    pub(crate) file: Option<FileLink>,
}

impl Folder {
    /// An empty folder that is considered loaded.
    pub fn new() -> Self {
        Folder {
            significant_names: false,
            index_names: true,
            named: HashMap::new(),
            fully_loaded: true,
            entrypoint: None,
            file: None,
        }
    }

    pub(crate) fn unloaded() -> Self {
        Folder {
            fully_loaded: false,
            ..Folder::new()
        }
    }

    /// False for folders skipped by a shallow load.
    pub fn is_loaded(&self) -> bool {
        self.fully_loaded
    }

    pub fn has_significant_names(&self) -> bool {
        self.significant_names
    }

    pub fn set_significant_names(&mut self, significant: bool) {
        self.significant_names = significant;
    }

    /// The child indexed under `name` by the last prepare, if any.
    pub fn indexed_child(&self, name: &str) -> Option<NodeId> {
        self.named.get(name).copied()
    }

    /// Where the folder's payload starts in its file, if it came from one.
    pub fn entrypoint(&self) -> Option<u64> {
        self.entrypoint
    }
}

impl Default for Folder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Parse)]
pub(crate) struct FolderProps {
    pub significant_names: Bool32,
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct FolderLoad: u8 {
        /// Stop after the first child and skip to the end of the folder
        const ONLY_FIRST = 0b001;
        /// Nested folders are created but left unpopulated
        const SHALLOW = 0b010;
        /// Without it the folder's own chunks are read but its children are skipped
        const POPULATE = 0b100;
    }
}
