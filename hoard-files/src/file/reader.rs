use std::ffi::OsString;
use std::fs;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::LoadError;
use crate::codec::reader::{Parseable, read_chunk_header};
use crate::codec::types::{CURRENT_VERSION, ChunkHeader, Gid, SIGNATURE, gid};
use crate::compression::Compressor;

/// What precedes the root folder of a container.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub version: u32,
    pub file_type: Gid,
    /// The root folder chunk, its payload follows.
    pub root: ChunkHeader,
}

/// Reads and validates the signature, version, file type and the root chunk header.
pub fn read_container_header<R: Read + ?Sized>(rdr: &mut R) -> Result<ContainerHeader, LoadError> {
    let mut signature = [0u8; 6];
    let mut read = 0;
    while read < signature.len() {
        match rdr.read(&mut signature[read..])? {
            0 => break,
            n => read += n,
        }
    }
    if &signature != SIGNATURE {
        return Err(LoadError::Signature { found: signature });
    }

    let version = u32::parse(rdr)?;
    if version > CURRENT_VERSION {
        return Err(LoadError::VersionMismatch {
            found: version,
            supported: CURRENT_VERSION,
        });
    }

    let file_type = Gid::parse(rdr)?;
    let root = read_chunk_header(rdr)?;
    if root.gid != gid::FOLDER {
        return Err(LoadError::Containment {
            reason: "the first chunk is not a folder",
        });
    }

    Ok(ContainerHeader {
        version,
        file_type,
        root,
    })
}

/// `path` with the compressor's suffix appended, e.g. `data.gor.zlib`.
pub fn compressed_path(path: &Path, compressor: &dyn Compressor) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(compressor.suffix());
    PathBuf::from(name)
}

/// If only the compressed form of `path` exists, decompresses it next to it and removes the
/// compressed file.
pub fn materialize(path: &Path, compressor: &dyn Compressor) -> Result<(), LoadError> {
    if path.is_file() {
        return Ok(());
    }

    let compressed = compressed_path(path, compressor);
    if !compressed.is_file() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    info!("Decompressing {}", compressed.display());
    let input = fs::File::open(&compressed).map_err(|source| LoadError::FileCannotBeOpened {
        path: compressed.clone(),
        source,
    })?;
    let output = fs::File::create(path).map_err(|source| LoadError::FileCannotBeOpened {
        path: path.to_path_buf(),
        source,
    })?;

    let mut output = BufWriter::new(output);
    let written = compressor.decode(&mut BufReader::new(input), &mut output)?;
    output.flush()?;
    debug!("Wrote {} bytes to {}", written, path.display());

    fs::remove_file(&compressed)?;
    Ok(())
}
