use std::path::PathBuf;

use thiserror::Error;

use crate::codec::types::{Gid, Guid};
use crate::node::tree::TreeError;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot find the file specified: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Cannot open the file specified: {}", path.display())]
    FileCannotBeOpened { path: PathBuf, source: std::io::Error },

    #[error("Signature mismatch, found {found:?}")]
    Signature { found: [u8; 6] },

    #[error("Version mismatch: the file has version {found:#010x}, the highest supported is {supported:#010x}")]
    VersionMismatch { found: u32, supported: u32 },

    /// The root is not a Folder, or a node shows up where it cannot be contained.
    #[error("The file does not contain any data or its representation is invalid: {reason}")]
    Containment { reason: &'static str },

    /// Only raised when unknown chunks are treated strictly.
    #[error("An unknown chunk {gid} was encountered")]
    UnknownChunk { gid: Gid },

    #[error("The file is violating the expected format, because: {reason}")]
    FormatError { reason: &'static str },

    #[error("The stream ended {missing} bytes before the end of the chunk")]
    Truncated { missing: u64 },

    #[error("The reference to {guid} cannot be resolved")]
    DanglingReference { guid: Guid },

    #[error("No file has been loaded, there is nothing to open")]
    NotOpened,

    /// The File that owned a late-loading resource is gone.
    #[error("There is no file object associated with the resource")]
    NoFileObject,

    #[error("Unsupported compression {gid}")]
    UnsupportedCompression { gid: Gid },

    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Represents all other cases of `std::io::Error`.
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error(transparent)]
    UTF8ConversationError(#[from] std::string::FromUtf8Error),
}

pub mod animation;
pub mod blob;
pub mod codec;
pub mod compression;
pub mod data;
pub mod file;
pub mod folder;
pub mod image;
pub mod link;
pub mod node;

pub use crate::codec::types::gid;
pub use crate::file::File;
pub use crate::file::options::{LoadOptions, ResolvePolicy};
pub use crate::node::tree::{NodeId, Tree};
pub use crate::node::types::{Node, Resource};
