use crate::codec::types::Guid;
use crate::node::tree::NodeId;

/// A reference to another node of the same file, stored by identity and resolved after the
/// load. A resolved link holds its target.
#[derive(Debug, Default)]
pub struct Link {
    pub(crate) target_guid: Guid,
    pub(crate) target: Option<NodeId>,
}

impl Link {
    pub fn new(target_guid: Guid) -> Self {
        Link {
            target_guid,
            target: None,
        }
    }

    pub fn target_guid(&self) -> Guid {
        self.target_guid
    }

    /// `None` until resolved, or when the target is not part of the file.
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }
}
