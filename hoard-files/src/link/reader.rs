use crate::LoadError;
use crate::codec::reader::{
    ChunkTarget, Parseable, ReadSeek, eat_record_tail, read_chunk_header, read_common_chunk, skip_unknown_chunk,
};
use crate::codec::types::{Guid, gid};
use crate::file::context::LoadContext;
use crate::link::types::Link;
use crate::node::tree::NodeId;
use crate::node::types::{NodeHeader, Resource};

pub fn load_link(ctx: &mut LoadContext, rdr: &mut dyn ReadSeek, size: u32) -> Result<NodeId, LoadError> {
    let target = ChunkTarget::new(rdr, size)?;
    let options = *ctx.options();
    let mut header = NodeHeader::default();
    let mut link = Link::default();

    while !target.reached(rdr)? {
        let chunk = read_chunk_header(rdr)?;
        match chunk.gid {
            gid::LINK_NODE_TARGET => {
                link.target_guid = Guid::parse(rdr)?;
                eat_record_tail::<Guid, _>(rdr, chunk.size)?;
            }
            _ => {
                if !read_common_chunk(rdr, &mut header, chunk.gid, chunk.size)? {
                    skip_unknown_chunk(rdr, chunk, options.strict_chunks)?;
                }
            }
        }
    }

    Ok(ctx.insert(header, Resource::Link(link)))
}
