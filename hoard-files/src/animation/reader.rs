use byteorder::{LittleEndian, ReadBytesExt};

use crate::LoadError;
use crate::animation::types::{Animation, DEFAULT_FRAME_DURATION};
use crate::codec::reader::{ChunkTarget, ReadSeek, read_chunk_header, read_common_chunk};
use crate::codec::types::gid;
use crate::file::context::LoadContext;
use crate::image::reader::load_image;
use crate::node::tree::NodeId;
use crate::node::types::{NodeHeader, Resource};

/// Frames are the image chunks in order, other loadable chunks become extra children.
pub fn load_animation(ctx: &mut LoadContext, rdr: &mut dyn ReadSeek, size: u32) -> Result<NodeId, LoadError> {
    let target = ChunkTarget::new(rdr, size)?;
    let mut header = NodeHeader::default();
    let mut durations = None;
    let mut images = Vec::new();
    let mut extras = Vec::new();

    while !target.reached(rdr)? {
        let chunk = read_chunk_header(rdr)?;
        match chunk.gid {
            gid::ANIMATION_DURATIONS => {
                if chunk.size % 4 != 0 {
                    return Err(LoadError::FormatError {
                        reason: "animation durations are not a list of u32",
                    });
                }
                let mut list = vec![0u32; (chunk.size / 4) as usize];
                rdr.read_u32_into::<LittleEndian>(&mut list)?;
                durations = Some(list);
            }
            gid::ANIMATION_IMAGE | gid::IMAGE => {
                let image_target = ChunkTarget::new(rdr, chunk.size)?;
                images.push(load_image(ctx, rdr, chunk.size)?);
                image_target.settle(rdr, chunk.gid)?;
            }
            _ => {
                if !read_common_chunk(rdr, &mut header, chunk.gid, chunk.size)? {
                    if let Some(extra) = ctx.load_object(rdr, chunk.gid, chunk.size)? {
                        extras.push(extra);
                    }
                }
            }
        }
    }

    let durations = match durations {
        Some(list) if list.len() != images.len() => {
            return Err(LoadError::FormatError {
                reason: "animation frame and duration counts differ",
            });
        }
        Some(list) => list,
        None => vec![DEFAULT_FRAME_DURATION; images.len()],
    };

    let mut animation = Animation::new();
    for (image, duration) in images.iter().zip(durations) {
        animation.push(*image, duration)?;
    }

    let id = ctx.insert(header, Resource::Animation(animation));
    for child in images.into_iter().chain(extras) {
        ctx.add_child(id, child)?;
    }
    Ok(id)
}
