use std::any::Any;
use std::cell::Cell;
use std::fmt::Debug;

use crate::animation::types::Animation;
use crate::blob::types::Blob;
use crate::codec::types::{Gid, Guid, gid};
use crate::data::types::DataArray;
use crate::folder::types::Folder;
use crate::image::types::Image;
use crate::link::types::Link;
use crate::node::identities::IdentityMap;
use crate::node::tree::NodeId;

/// What every resource carries regardless of its kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeHeader {
    pub guid: Guid,
    pub name: String,
}

impl NodeHeader {
    pub fn new(guid: Guid, name: impl Into<String>) -> Self {
        NodeHeader {
            guid,
            name: name.into(),
        }
    }
}

/// Extension point for resource kinds this crate does not know. Instances are produced by
/// loaders registered on the [`crate::file::registry::LoaderRegistry`].
pub trait CustomResource: Debug + Any {
    fn gid(&self) -> Gid;

    fn prepare(&mut self) {}

    fn discard(&mut self) {}

    fn resolve(&mut self, _identities: &IdentityMap) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[derive(Debug)]
pub enum Resource {
    Folder(Folder),
    Blob(Blob),
    Image(Image),
    Animation(Animation),
    Link(Link),
    Data(DataArray),
    Custom(Box<dyn CustomResource>),
}

impl Resource {
    pub fn gid(&self) -> Gid {
        match self {
            Resource::Folder(_) => gid::FOLDER,
            Resource::Blob(_) => gid::BLOB,
            Resource::Image(_) => gid::IMAGE,
            Resource::Animation(_) => gid::ANIMATION,
            Resource::Link(_) => gid::LINK_NODE,
            Resource::Data(_) => gid::DATA,
            Resource::Custom(custom) => custom.gid(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Resource::Folder(_) => "Folder",
            Resource::Blob(_) => "Blob",
            Resource::Image(_) => "Image",
            Resource::Animation(_) => "Animation",
            Resource::Link(_) => "Link",
            Resource::Data(_) => "Data",
            Resource::Custom(_) => "Custom",
        }
    }
}

/// A resource living in a [`crate::node::tree::Tree`].
#[derive(Debug)]
pub struct Node {
    pub header: NodeHeader,
    pub resource: Resource,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) root: Cell<Option<NodeId>>,
    /// External holders only, tree membership is not counted.
    pub(crate) refcount: u32,
    /// Lost its owner to a teardown while held, the last release frees it.
    pub(crate) orphaned: bool,
}

impl Node {
    pub fn new(header: NodeHeader, resource: Resource) -> Self {
        Node {
            header,
            resource,
            parent: None,
            children: Vec::new(),
            root: Cell::new(None),
            refcount: 0,
            orphaned: false,
        }
    }

    pub fn gid(&self) -> Gid {
        self.resource.gid()
    }

    pub fn guid(&self) -> Guid {
        self.header.guid
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn refcount(&self) -> u32 {
        self.refcount
    }
}
