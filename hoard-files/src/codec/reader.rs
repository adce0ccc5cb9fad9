use std::io::{self, Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use log::warn;

use crate::LoadError;
use crate::codec::types::{Bool32, ChunkHeader, Gid, Guid, gid};
use crate::node::types::NodeHeader;

/// The stream type loaders are handed. Everything the engine reads from is seekable, as late
/// loading resources jump back to their entry point.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

pub trait Parseable<T> {
    /// The number of bytes `parse` consumes.
    const WIRE_SIZE: u32;

    fn parse<R: Read + ?Sized>(rdr: &mut R) -> Result<T, LoadError>;
}

impl Parseable<u8> for u8 {
    const WIRE_SIZE: u32 = 1;

    fn parse<R: Read + ?Sized>(rdr: &mut R) -> Result<u8, LoadError> {
        Ok(rdr.read_u8()?)
    }
}

impl Parseable<i8> for i8 {
    const WIRE_SIZE: u32 = 1;

    fn parse<R: Read + ?Sized>(rdr: &mut R) -> Result<i8, LoadError> {
        Ok(rdr.read_i8()?)
    }
}

impl Parseable<u16> for u16 {
    const WIRE_SIZE: u32 = 2;

    fn parse<R: Read + ?Sized>(rdr: &mut R) -> Result<u16, LoadError> {
        Ok(rdr.read_u16::<LittleEndian>()?)
    }
}

impl Parseable<i16> for i16 {
    const WIRE_SIZE: u32 = 2;

    fn parse<R: Read + ?Sized>(rdr: &mut R) -> Result<i16, LoadError> {
        Ok(rdr.read_i16::<LittleEndian>()?)
    }
}

impl Parseable<u32> for u32 {
    const WIRE_SIZE: u32 = 4;

    fn parse<R: Read + ?Sized>(rdr: &mut R) -> Result<u32, LoadError> {
        Ok(rdr.read_u32::<LittleEndian>()?)
    }
}

impl Parseable<i32> for i32 {
    const WIRE_SIZE: u32 = 4;

    fn parse<R: Read + ?Sized>(rdr: &mut R) -> Result<i32, LoadError> {
        Ok(rdr.read_i32::<LittleEndian>()?)
    }
}

impl Parseable<f32> for f32 {
    const WIRE_SIZE: u32 = 4;

    fn parse<R: Read + ?Sized>(rdr: &mut R) -> Result<f32, LoadError> {
        Ok(rdr.read_f32::<LittleEndian>()?)
    }
}

impl Parseable<Gid> for Gid {
    const WIRE_SIZE: u32 = 4;

    fn parse<R: Read + ?Sized>(rdr: &mut R) -> Result<Gid, LoadError> {
        Ok(Gid(rdr.read_u32::<LittleEndian>()?))
    }
}

impl Parseable<Guid> for Guid {
    const WIRE_SIZE: u32 = 8;

    fn parse<R: Read + ?Sized>(rdr: &mut R) -> Result<Guid, LoadError> {
        Ok(Guid(rdr.read_u64::<LittleEndian>()?))
    }
}

impl Parseable<Bool32> for Bool32 {
    const WIRE_SIZE: u32 = 4;

    fn parse<R: Read + ?Sized>(rdr: &mut R) -> Result<Bool32, LoadError> {
        Ok(Bool32(rdr.read_i32::<LittleEndian>()? != 0))
    }
}

impl Parseable<ChunkHeader> for ChunkHeader {
    const WIRE_SIZE: u32 = 8;

    fn parse<R: Read + ?Sized>(rdr: &mut R) -> Result<ChunkHeader, LoadError> {
        Ok(ChunkHeader {
            gid: Gid::parse(rdr)?,
            size: rdr.read_u32::<LittleEndian>()?,
        })
    }
}

pub fn read_chunk_header<R: Read + ?Sized>(rdr: &mut R) -> Result<ChunkHeader, LoadError> {
    ChunkHeader::parse(rdr)
}

/// Reads exactly `size` bytes, surfacing a short stream as [`LoadError::Truncated`].
pub fn read_payload<R: Read + ?Sized>(rdr: &mut R, size: u32) -> Result<Vec<u8>, LoadError> {
    let mut buf = Vec::with_capacity(size as usize);
    let read = Read::take(&mut *rdr, u64::from(size)).read_to_end(&mut buf)?;
    if (read as u64) < u64::from(size) {
        return Err(LoadError::Truncated {
            missing: u64::from(size) - read as u64,
        });
    }
    Ok(buf)
}

/// A string prefixed by its u32 length.
pub fn read_string<R: Read + ?Sized>(rdr: &mut R) -> Result<String, LoadError> {
    let size = rdr.read_u32::<LittleEndian>()?;
    read_sized_string(rdr, size)
}

pub fn read_sized_string<R: Read + ?Sized>(rdr: &mut R, size: u32) -> Result<String, LoadError> {
    Ok(String::from_utf8(read_payload(rdr, size)?)?)
}

/// Skips up to this many bytes are read through the stream's buffer instead of seeking.
pub const SKIP_BY_READING: u64 = 8 * 1024;

/// Skips `size` bytes without interpreting them. Short skips running past the end of the stream
/// are an error. Longer ones seek and rely on the enclosing chunk being bounded by the file.
pub fn eat_chunk<R: Read + Seek + ?Sized>(rdr: &mut R, size: u64) -> Result<(), LoadError> {
    if size <= SKIP_BY_READING {
        let skipped = io::copy(&mut Read::take(&mut *rdr, size), &mut io::sink())?;
        if skipped < size {
            return Err(LoadError::Truncated {
                missing: size - skipped,
            });
        }
        return Ok(());
    }

    let offset = i64::try_from(size).map_err(|_| LoadError::FormatError {
        reason: "a chunk is larger than any stream",
    })?;
    rdr.seek(SeekFrom::Current(offset))?;
    Ok(())
}

/// Marks the end of a chunk so that loops can tell when its payload is consumed.
#[derive(Debug, Copy, Clone)]
pub struct ChunkTarget {
    start: u64,
    end: u64,
}

impl ChunkTarget {
    /// A target `size` bytes after the current position.
    pub fn new<R: Seek + ?Sized>(rdr: &mut R, size: u32) -> Result<Self, LoadError> {
        let start = rdr.stream_position()?;
        Ok(ChunkTarget {
            start,
            end: start + u64::from(size),
        })
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    /// Whether the payload is fully consumed. Reading past the target means a nested chunk
    /// declared more bytes than its parent had left.
    pub fn reached<R: Seek + ?Sized>(&self, rdr: &mut R) -> Result<bool, LoadError> {
        let pos = rdr.stream_position()?;
        if pos > self.end {
            return Err(LoadError::FormatError {
                reason: "a chunk runs past the end of its parent",
            });
        }
        Ok(pos == self.end)
    }

    /// Moves to the end of the chunk, e.g. after a loader that did not consume everything.
    pub fn settle<R: Read + Seek + ?Sized>(&self, rdr: &mut R, gid: Gid) -> Result<(), LoadError> {
        let pos = rdr.stream_position()?;
        if pos > self.end {
            return Err(LoadError::FormatError {
                reason: "a loader read past the end of its chunk",
            });
        }
        if pos < self.end {
            warn!(
                "Loader for {} left {} bytes of its chunk unread",
                gid,
                self.end - pos
            );
            eat_chunk(rdr, self.end - pos)?;
        }
        Ok(())
    }

    pub fn skip_to_end<R: Read + Seek + ?Sized>(&self, rdr: &mut R) -> Result<(), LoadError> {
        let pos = rdr.stream_position()?;
        if pos > self.end {
            return Err(LoadError::FormatError {
                reason: "a chunk runs past the end of its parent",
            });
        }
        eat_chunk(rdr, self.end - pos)
    }
}

/// Skips the rest of a property record that is larger than the layout this reader knows, which
/// is how newer writers extend the records.
pub fn eat_record_tail<T: Parseable<T>, R: Read + Seek + ?Sized>(rdr: &mut R, size: u32) -> Result<(), LoadError> {
    let tail = size.checked_sub(T::WIRE_SIZE).ok_or(LoadError::FormatError {
        reason: "property record is smaller than its layout",
    })?;
    eat_chunk(rdr, u64::from(tail))
}

/// Handles the chunks every resource may carry: its identity and its name. Returns false if
/// `gid` is not one of them, in which case nothing has been read.
pub fn read_common_chunk<R: Read + Seek + ?Sized>(
    rdr: &mut R,
    header: &mut NodeHeader,
    gid: Gid,
    size: u32,
) -> Result<bool, LoadError> {
    match gid {
        gid::SGUID => {
            header.guid = Guid::parse(rdr)?;
            eat_chunk(rdr, u64::from(size.saturating_sub(Guid::WIRE_SIZE)))?;
        }
        gid::GUID => {
            // legacy layout: two copies, the second one is authoritative
            let _ = Guid::parse(rdr)?;
            header.guid = Guid::parse(rdr)?;
            eat_chunk(rdr, u64::from(size.saturating_sub(2 * Guid::WIRE_SIZE)))?;
        }
        gid::NAME => {
            header.name = read_sized_string(rdr, size)?;
        }
        _ => return Ok(false),
    }

    Ok(true)
}

/// Skips a chunk nobody knows how to load, or refuses it when unknown chunks are strict.
pub fn skip_unknown_chunk<R: Read + Seek + ?Sized>(rdr: &mut R, chunk: ChunkHeader, strict: bool) -> Result<(), LoadError> {
    if strict {
        return Err(LoadError::UnknownChunk { gid: chunk.gid });
    }

    warn!("Skipping unknown chunk {} ({} bytes)", chunk.gid, chunk.size);
    eat_chunk(rdr, u64::from(chunk.size))
}
