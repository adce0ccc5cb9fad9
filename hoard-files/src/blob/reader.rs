use std::io::Read;

use log::trace;

use crate::LoadError;
use crate::blob::types::{Blob, BlobProps, BlobType};
use crate::codec::reader::{
    ChunkTarget, Parseable, ReadSeek, eat_chunk, eat_record_tail, read_chunk_header, read_common_chunk, read_payload,
    skip_unknown_chunk,
};
use crate::codec::types::gid;
use crate::file::context::{ChunkEnv, LoadContext};
use crate::file::source::Deferred;
use crate::node::tree::NodeId;
use crate::node::types::{NodeHeader, Resource};

pub fn load_blob(ctx: &mut LoadContext, rdr: &mut dyn ReadSeek, size: u32) -> Result<NodeId, LoadError> {
    let mut header = NodeHeader::default();
    let mut blob = Blob::default();
    let entrypoint = rdr.stream_position()?;

    blob.read(rdr, size, &mut header, ctx.env(), false)?;
    blob.deferred = Some(Deferred::new(entrypoint, ctx.file_link()));
    if !blob.is_loaded() {
        ctx.keep_open();
    }

    Ok(ctx.insert(header, Resource::Blob(blob)))
}

impl Blob {
    /// Parses a blob payload. Lazy blobs only take their properties unless `force` is set.
    pub(crate) fn read(
        &mut self,
        rdr: &mut dyn ReadSeek,
        size: u32,
        header: &mut NodeHeader,
        env: &ChunkEnv,
        force: bool,
    ) -> Result<(), LoadError> {
        let target = ChunkTarget::new(rdr, size)?;
        let mut load = true;

        while !target.reached(rdr)? {
            let chunk = read_chunk_header(rdr)?;
            match chunk.gid {
                gid::BLOB_PROPS => {
                    let props = BlobProps::parse(rdr)?;
                    eat_record_tail::<BlobProps, _>(rdr, chunk.size)?;
                    self.blob_type = BlobType::from(props.blob_type);
                    load = force || !bool::from(props.lazy);
                }
                gid::BLOB_DATA if load => {
                    self.data = Some(read_payload(rdr, chunk.size)?);
                }
                gid::BLOB_CMP_DATA if load => {
                    let payload = ChunkTarget::new(rdr, chunk.size)?;
                    let mut data = Vec::new();
                    env.compressor
                        .decode(&mut Read::take(&mut *rdr, u64::from(chunk.size)), &mut data)?;
                    payload.skip_to_end(rdr)?;
                    self.data = Some(data);
                }
                gid::BLOB_DATA | gid::BLOB_CMP_DATA => {
                    trace!("Deferring {} bytes of blob data", chunk.size);
                    eat_chunk(rdr, u64::from(chunk.size))?;
                }
                _ => {
                    if !read_common_chunk(rdr, header, chunk.gid, chunk.size)? {
                        skip_unknown_chunk(rdr, chunk, env.options.strict_chunks)?;
                    }
                }
            }
        }

        if load && self.data.is_none() {
            self.data = Some(Vec::new());
        }
        Ok(())
    }

    /// Fetches the payload of a lazy blob from its file. Does nothing if it is already loaded.
    pub fn load(&mut self) -> Result<(), LoadError> {
        if self.is_loaded() {
            return Ok(());
        }

        let deferred = self.deferred.clone().ok_or(LoadError::NoFileObject)?;
        deferred.reopen(|rdr, size, env| {
            let mut header = NodeHeader::default();
            self.read(rdr, size, &mut header, env, true)
        })
    }
}
