use std::cell::RefCell;
use std::fs;
use std::io::{BufReader, ErrorKind, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, info, warn};

use crate::LoadError;
use crate::codec::reader::Parseable;
use crate::codec::types::{Gid, Guid, gid};
use crate::compression::{Compressor, ZlibCompressor};
use crate::file::context::{ChunkEnv, LoadContext};
use crate::file::options::{LoadOptions, ResolvePolicy};
use crate::file::reader::{materialize, read_container_header};
use crate::file::registry::LoaderRegistry;
use crate::file::source::{FileLink, Source};
use crate::folder::reader::read_folder;
use crate::folder::types::{Folder, FolderLoad};
use crate::node::identities::IdentityMap;
use crate::node::tree::{NodeId, Tree, TreeError};
use crate::node::types::{Node, NodeHeader, Resource};

pub mod context;
pub mod options;
pub mod reader;
pub mod registry;
pub mod source;

#[cfg(test)]
mod tests;

/// Loads a container into a tree of resources rooted at a folder. The File owns the tree and
/// the backing file, late loading resources reach the latter as long as the File lives.
#[derive(Debug)]
pub struct File {
    tree: Tree,
    root: NodeId,
    source: Rc<RefCell<Source>>,
    file_type: Gid,
    version: u32,
    loaded: bool,
    keep_open: bool,
    identities: Option<IdentityMap>,
    loaders: LoaderRegistry,
    options: LoadOptions,
    compressor: Rc<dyn Compressor>,
}

impl File {
    pub fn new() -> Self {
        Self::with_options(LoadOptions::default())
    }

    pub fn with_options(options: LoadOptions) -> Self {
        Self::with_compressor(options, Rc::new(ZlibCompressor::default()))
    }

    pub fn with_compressor(options: LoadOptions, compressor: Rc<dyn Compressor>) -> Self {
        let env = ChunkEnv {
            compressor: compressor.clone(),
            options,
        };
        let mut tree = Tree::new();
        let root = tree.insert(empty_root());

        File {
            tree,
            root,
            source: Rc::new(RefCell::new(Source::new(env))),
            file_type: gid::NONE,
            version: 0,
            loaded: false,
            keep_open: false,
            identities: None,
            loaders: LoaderRegistry::with_builtins(),
            options,
            compressor,
        }
    }

    fn env(&self) -> ChunkEnv {
        ChunkEnv {
            compressor: self.compressor.clone(),
            options: self.options,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn file_type(&self) -> Gid {
        self.file_type
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.source.borrow().path().map(Path::to_path_buf)
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Takes effect with the next load.
    pub fn set_options(&mut self, options: LoadOptions) {
        self.options = options;
    }

    pub fn loaders(&self) -> &LoaderRegistry {
        &self.loaders
    }

    pub fn loaders_mut(&mut self) -> &mut LoaderRegistry {
        &mut self.loaders
    }

    /// Loads everything in `path`.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        self.load(path.as_ref(), FolderLoad::POPULATE)
    }

    /// Loads only the first child of the root folder. The stream is left at the end of the root
    /// folder.
    pub fn load_first(&mut self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        self.keep_open = true;
        self.load(path.as_ref(), FolderLoad::POPULATE | FolderLoad::ONLY_FIRST)
    }

    /// Loads the root's children, nested folders stay empty until [`File::load_folder`].
    pub fn load_shallow(&mut self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        self.load(path.as_ref(), FolderLoad::POPULATE | FolderLoad::SHALLOW)
    }

    fn load(&mut self, path: &Path, flags: FolderLoad) -> Result<(), LoadError> {
        self.destroy();
        info!("Loading {}", path.display());

        let result = self.load_container(path, flags).map_err(|err| match err {
            LoadError::IOError(err) if err.kind() == ErrorKind::UnexpectedEof => LoadError::FormatError {
                reason: "the stream ended inside a chunk",
            },
            err => err,
        });
        self.keep_open = false;

        if let Err(err) = &result {
            warn!("Loading {} failed: {}", path.display(), err);
            self.source.borrow_mut().close();
        }
        result
    }

    fn load_container(&mut self, path: &Path, flags: FolderLoad) -> Result<(), LoadError> {
        materialize(path, self.compressor.as_ref())?;
        let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let file = fs::File::open(&path).map_err(|source| LoadError::FileCannotBeOpened {
            path: path.clone(),
            source,
        })?;
        let len = file.metadata()?.len();
        let mut rdr = BufReader::new(file);
        let header = read_container_header(&mut rdr)?;
        debug!(
            "Container version {:#010x}, type {}, root folder of {} bytes",
            header.version, header.file_type, header.root.size
        );

        // nested chunks are bounded by their parents, so this bounds every skip
        let end = rdr.stream_position()? + u64::from(header.root.size);
        if end > len {
            return Err(LoadError::Truncated { missing: end - len });
        }

        let env = self.env();
        let link = FileLink::new(&self.source);
        let mut ctx = LoadContext::new(&mut self.tree, &self.loaders, env, link);
        let root = ctx.insert(NodeHeader::default(), Resource::Folder(Folder::unloaded()));
        if let Err(err) = read_folder(&mut ctx, &mut rdr, root, header.root.size, flags) {
            ctx.rollback();
            return Err(err);
        }
        let keep_open = ctx.keep_open_requested() || self.keep_open || flags.contains(FolderLoad::SHALLOW);

        let identities = IdentityMap::build(&self.tree, root);
        if let Err(err) = self.tree.resolve(root, &identities, self.options.resolve_policy) {
            self.tree.destroy(root)?;
            return Err(err);
        }

        let empty = std::mem::replace(&mut self.root, root);
        self.tree.destroy(empty)?;
        self.source
            .borrow_mut()
            .attach(path, keep_open.then_some(rdr));
        self.identities = Some(identities);
        self.version = header.version;
        self.file_type = header.file_type;
        self.loaded = true;
        Ok(())
    }

    /// Populates a folder a shallow load skipped. Folders that are already loaded are left alone.
    pub fn load_folder(&mut self, folder: NodeId, shallow: bool) -> Result<(), LoadError> {
        let state = self.tree.folder(folder).ok_or(TreeError::NotAFolder(folder))?;
        if state.is_loaded() {
            return Ok(());
        }
        let entrypoint = state.entrypoint.ok_or(LoadError::NoFileObject)?;
        let link = state.file.clone().ok_or(LoadError::NoFileObject)?;

        let source = link.upgrade()?;
        let mut source = source.borrow_mut();
        let env = source.env().clone();
        let rdr = source.open()?;
        let start = entrypoint.checked_sub(4).ok_or(LoadError::FormatError {
            reason: "a folder entry point lies inside the file header",
        })?;
        rdr.seek(SeekFrom::Start(start))?;
        let size = u32::parse(rdr)?;

        let flags = if shallow {
            FolderLoad::POPULATE | FolderLoad::SHALLOW
        } else {
            FolderLoad::POPULATE
        };
        let mut ctx = LoadContext::new(&mut self.tree, &self.loaders, env, link.clone());
        if let Err(err) = read_folder(&mut ctx, rdr, folder, size, flags) {
            ctx.rollback();
            return Err(err);
        }
        let created = ctx.into_created();
        drop(source);

        let identities = IdentityMap::build(&self.tree, self.root);
        if let Err(err) = self.tree.resolve(folder, &identities, self.options.resolve_policy) {
            context::rollback(&mut self.tree, created);
            if let Some(state) = self.tree.folder_mut(folder) {
                state.fully_loaded = false;
            }
            return Err(err);
        }

        // links elsewhere may point into the new children
        self.tree.resolve(self.root, &identities, ResolvePolicy::Lenient)?;
        self.identities = Some(identities);
        Ok(())
    }

    /// Keeps the stream of the current file open after loading so late loads do not reopen it.
    pub fn keep_open(&mut self) {
        self.keep_open = true;
    }

    /// Opens the backing file again, e.g. after it was closed by [`File::discard`].
    pub fn open(&mut self) -> Result<(), LoadError> {
        self.source.borrow_mut().open().map(|_| ())
    }

    pub fn is_open(&self) -> bool {
        self.source.borrow().is_open()
    }

    /// The position of the open stream.
    pub fn stream_position(&self) -> Option<u64> {
        self.source.borrow_mut().stream_position()
    }

    /// The node carrying `guid`, as long as the identity map of the last load is kept.
    pub fn find_object(&self, guid: Guid) -> Option<NodeId> {
        self.identities
            .as_ref()
            .and_then(|map| map.get(guid))
            .filter(|id| self.tree.contains(*id))
    }

    pub fn prepare(&mut self) -> Result<(), LoadError> {
        Ok(self.tree.prepare(self.root)?)
    }

    /// Frees the loading-time data of every resource, forgets the identity map and closes the
    /// stream. Late loads reopen it.
    pub fn discard(&mut self) -> Result<(), LoadError> {
        self.tree.discard(self.root)?;
        self.identities = None;
        self.source.borrow_mut().close();
        Ok(())
    }

    /// Tears the tree down and returns to an empty root. Resources that are still held survive
    /// detached, their late loads fail from now on.
    pub fn destroy(&mut self) {
        if let Err(err) = self.tree.destroy(self.root) {
            debug!("Root was already gone: {}", err);
        }
        self.root = self.tree.insert(empty_root());
        self.source = Rc::new(RefCell::new(Source::new(self.env())));
        self.identities = None;
        self.file_type = gid::NONE;
        self.version = 0;
        self.loaded = false;
    }

    /// Hands the tree over to the caller. Late loads keep working while this File is alive.
    pub fn release(&mut self) -> (Tree, NodeId) {
        let tree = std::mem::take(&mut self.tree);
        let root = self.root;
        self.root = self.tree.insert(empty_root());
        self.identities = None;
        self.loaded = false;
        (tree, root)
    }
}

impl Default for File {
    fn default() -> Self {
        Self::new()
    }
}

fn empty_root() -> Node {
    Node::new(NodeHeader::default(), Resource::Folder(Folder::new()))
}
