use log::trace;

use crate::LoadError;
use crate::codec::reader::{
    ChunkTarget, Parseable, ReadSeek, read_chunk_header, read_common_chunk, read_string, skip_unknown_chunk,
};
use crate::codec::types::{Gid, gid};
use crate::data::types::{DataArray, DataValue, Edges, Point, Pointf, Rectangle, Size};
use crate::file::context::LoadContext;
use crate::node::tree::NodeId;
use crate::node::types::{NodeHeader, Resource};

const ITEMS: [Gid; 10] = [
    gid::DATA_INT,
    gid::DATA_FLOAT,
    gid::DATA_TEXT,
    gid::DATA_POINT,
    gid::DATA_POINTF,
    gid::DATA_SIZE,
    gid::DATA_RECTANGLE,
    gid::DATA_BOUNDS,
    gid::DATA_MARGINS,
    gid::DATA_OBJECT,
];

/// Every item chunk holds a length prefixed name followed by the value.
pub fn load_data(ctx: &mut LoadContext, rdr: &mut dyn ReadSeek, size: u32) -> Result<NodeId, LoadError> {
    let target = ChunkTarget::new(rdr, size)?;
    let strict = ctx.options().strict_chunks;
    let mut header = NodeHeader::default();
    let mut data = DataArray::new();
    let mut objects = Vec::new();

    while !target.reached(rdr)? {
        let chunk = read_chunk_header(rdr)?;
        if read_common_chunk(rdr, &mut header, chunk.gid, chunk.size)? {
            continue;
        }
        if !ITEMS.contains(&chunk.gid) {
            skip_unknown_chunk(rdr, chunk, strict)?;
            continue;
        }

        let item = ChunkTarget::new(rdr, chunk.size)?;
        let name = read_string(rdr)?;
        let value = match chunk.gid {
            gid::DATA_INT => DataValue::Int(i32::parse(rdr)?),
            gid::DATA_FLOAT => DataValue::Float(f32::parse(rdr)?),
            gid::DATA_TEXT => DataValue::Text(read_string(rdr)?),
            gid::DATA_POINT => DataValue::Point(Point::parse(rdr)?),
            gid::DATA_POINTF => DataValue::Pointf(Pointf::parse(rdr)?),
            gid::DATA_SIZE => DataValue::Size(Size::parse(rdr)?),
            gid::DATA_RECTANGLE => DataValue::Rectangle(Rectangle::parse(rdr)?),
            gid::DATA_BOUNDS => DataValue::Bounds(Edges::parse(rdr)?),
            gid::DATA_MARGINS => DataValue::Margins(Edges::parse(rdr)?),
            _ => {
                let object = if item.reached(rdr)? {
                    None
                } else {
                    let nested = read_chunk_header(rdr)?;
                    ctx.load_object(rdr, nested.gid, nested.size)?
                };
                objects.extend(object);
                DataValue::Object(object)
            }
        };
        if !item.reached(rdr)? {
            return Err(LoadError::FormatError {
                reason: "a data item is larger than its value",
            });
        }

        trace!("Data item {:?} of {}", name, chunk.gid);
        data.push(name, value);
    }

    let id = ctx.insert(header, Resource::Data(data));
    for child in objects {
        ctx.add_child(id, child)?;
    }
    Ok(id)
}
