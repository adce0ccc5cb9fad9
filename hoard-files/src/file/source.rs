use std::cell::RefCell;
use std::fs;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use log::trace;

use crate::LoadError;
use crate::codec::reader::{Parseable, ReadSeek};
use crate::file::context::ChunkEnv;

/// The backing file of a loaded [`crate::File`]. Late loading resources reach it through a
/// [`FileLink`], which stops resolving once the File is dropped or loads something else.
#[derive(Debug)]
pub struct Source {
    path: Option<PathBuf>,
    stream: Option<BufReader<fs::File>>,
    env: ChunkEnv,
}

impl Source {
    pub(crate) fn new(env: ChunkEnv) -> Self {
        Source {
            path: None,
            stream: None,
            env,
        }
    }

    pub(crate) fn attach(&mut self, path: PathBuf, stream: Option<BufReader<fs::File>>) {
        self.path = Some(path);
        self.stream = stream;
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn env(&self) -> &ChunkEnv {
        &self.env
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Hands out the stream, reopening the file if it has been closed.
    pub(crate) fn open(&mut self) -> Result<&mut BufReader<fs::File>, LoadError> {
        if self.stream.is_none() {
            let path = self.path.as_ref().ok_or(LoadError::NotOpened)?;
            if !path.is_file() {
                return Err(LoadError::FileNotFound { path: path.clone() });
            }

            trace!("Reopening {}", path.display());
            let file = fs::File::open(path).map_err(|source| LoadError::FileCannotBeOpened {
                path: path.clone(),
                source,
            })?;
            self.stream = Some(BufReader::new(file));
        }

        self.stream.as_mut().ok_or(LoadError::NotOpened)
    }

    pub(crate) fn close(&mut self) {
        self.stream = None;
    }

    pub(crate) fn stream_position(&mut self) -> Option<u64> {
        self.stream.as_mut().and_then(|stream| stream.stream_position().ok())
    }
}

#[derive(Debug, Clone)]
pub struct FileLink(Weak<RefCell<Source>>);

impl FileLink {
    pub(crate) fn new(source: &Rc<RefCell<Source>>) -> Self {
        FileLink(Rc::downgrade(source))
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    pub(crate) fn upgrade(&self) -> Result<Rc<RefCell<Source>>, LoadError> {
        self.0.upgrade().ok_or(LoadError::NoFileObject)
    }
}

/// Remembers where a resource that was not loaded eagerly lives.
#[derive(Debug, Clone)]
pub struct Deferred {
    entrypoint: u64,
    link: FileLink,
}

impl Deferred {
    pub(crate) fn new(entrypoint: u64, link: FileLink) -> Self {
        Deferred { entrypoint, link }
    }

    pub fn entrypoint(&self) -> u64 {
        self.entrypoint
    }

    pub fn is_alive(&self) -> bool {
        self.link.is_alive()
    }

    /// Reopens the file if needed and runs `read` on the chunk payload, along with its size.
    pub(crate) fn reopen<T>(
        &self,
        read: impl FnOnce(&mut dyn ReadSeek, u32, &ChunkEnv) -> Result<T, LoadError>,
    ) -> Result<T, LoadError> {
        let source = self.link.upgrade()?;
        let mut source = source.borrow_mut();
        let env = source.env().clone();
        let stream = source.open()?;

        // the size field sits right before the payload
        let header = self.entrypoint.checked_sub(4).ok_or(LoadError::FormatError {
            reason: "a late loading entry point lies inside the file header",
        })?;
        stream.seek(SeekFrom::Start(header))?;
        let size = u32::parse(stream)?;
        read(stream, size, &env)
    }
}
