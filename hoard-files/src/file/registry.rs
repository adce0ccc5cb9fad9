use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

use itertools::Itertools;

use crate::LoadError;
use crate::animation::reader::load_animation;
use crate::blob::reader::load_blob;
use crate::codec::reader::ReadSeek;
use crate::codec::types::{Gid, gid};
use crate::data::reader::load_data;
use crate::file::context::LoadContext;
use crate::folder::reader::load_folder_object;
use crate::image::reader::load_image;
use crate::link::reader::load_link;
use crate::node::tree::NodeId;

pub type LoaderFn = Box<dyn Fn(&mut LoadContext<'_>, &mut dyn ReadSeek, u32) -> Result<NodeId, LoadError>>;

/// Builds a node out of the payload of one chunk kind. The stream is positioned at the start
/// of the payload and `size` is its length.
pub struct Loader {
    gid: Gid,
    handler: LoaderFn,
}

impl Loader {
    pub fn new<F>(gid: Gid, handler: F) -> Self
    where
        F: Fn(&mut LoadContext<'_>, &mut dyn ReadSeek, u32) -> Result<NodeId, LoadError> + 'static,
    {
        Loader {
            gid,
            handler: Box::new(handler),
        }
    }

    pub fn gid(&self) -> Gid {
        self.gid
    }

    pub(crate) fn load(&self, ctx: &mut LoadContext<'_>, rdr: &mut dyn ReadSeek, size: u32) -> Result<NodeId, LoadError> {
        (self.handler)(ctx, rdr, size)
    }
}

impl Debug for Loader {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader").field("gid", &self.gid).finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct LoaderRegistry {
    loaders: HashMap<Gid, Loader>,
}

impl LoaderRegistry {
    /// A registry that knows nothing, every chunk would be unknown.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(gid::FOLDER, load_folder_object);
        registry.register(gid::BLOB, load_blob);
        registry.register(gid::IMAGE, load_image);
        registry.register(gid::ANIMATION_IMAGE, load_image);
        registry.register(gid::ANIMATION, load_animation);
        registry.register(gid::LINK_NODE, load_link);
        registry.register(gid::DATA, load_data);
        registry
    }

    /// Installs a loader, replacing whatever was registered for `gid` before.
    pub fn register<F>(&mut self, gid: Gid, handler: F) -> Option<Loader>
    where
        F: Fn(&mut LoadContext<'_>, &mut dyn ReadSeek, u32) -> Result<NodeId, LoadError> + 'static,
    {
        self.loaders.insert(gid, Loader::new(gid, handler))
    }

    pub fn remove(&mut self, gid: Gid) -> Option<Loader> {
        self.loaders.remove(&gid)
    }

    pub fn get(&self, gid: Gid) -> Option<&Loader> {
        self.loaders.get(&gid)
    }

    pub fn contains(&self, gid: Gid) -> bool {
        self.loaders.contains_key(&gid)
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    pub fn gids(&self) -> Vec<Gid> {
        self.loaders.keys().copied().sorted().collect()
    }
}

impl Debug for LoaderRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.gids()).finish()
    }
}
