use std::fs;
use std::path::Path;

use hoard_files_derive_parseable::Parse;
use num_enum::FromPrimitive;

use crate::LoadError;
use crate::codec::types::Bool32;
use crate::file::source::Deferred;

/// What a blob's bytes are meant to be. Only informative.
#[derive(FromPrimitive, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum BlobType {
    #[default]
    Unknown = 0,
    Data = 1,
    Text = 2,
    Image = 3,
    Sound = 4,
    Script = 5,
}

/// An opaque byte payload.
#[derive(Debug, Default)]
pub struct Blob {
    pub(crate) data: Option<Vec<u8>>,
    pub(crate) blob_type: BlobType,
    pub(crate) deferred: Option<Deferred>,
}

impl Blob {
    pub fn new(data: Vec<u8>, blob_type: BlobType) -> Self {
        Blob {
            data: Some(data),
            blob_type,
            deferred: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    /// The payload, or `None` while a lazy blob has not been loaded.
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = Some(data);
    }

    pub fn take_data(&mut self) -> Option<Vec<u8>> {
        self.data.take()
    }

    pub fn blob_type(&self) -> BlobType {
        self.blob_type
    }

    pub fn set_type(&mut self, blob_type: BlobType) {
        self.blob_type = blob_type;
    }

    pub fn deferred(&self) -> Option<&Deferred> {
        self.deferred.as_ref()
    }

    /// Replaces the payload with the content of `path`.
    pub fn import_file(&mut self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        self.data = Some(read_import(path.as_ref())?);
        Ok(())
    }

    /// Appends the content of `path`, late loading the existing payload first.
    pub fn append_file(&mut self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let bytes = read_import(path.as_ref())?;
        if !self.is_loaded() && self.deferred.is_some() {
            self.load()?;
        }
        self.data.get_or_insert_with(Vec::new).extend(bytes);
        Ok(())
    }
}

fn read_import(path: &Path) -> Result<Vec<u8>, LoadError> {
    if !path.is_file() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    fs::read(path).map_err(|source| LoadError::FileCannotBeOpened {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Parse)]
pub(crate) struct BlobProps {
    pub blob_type: u32,
    pub lazy: Bool32,
}
