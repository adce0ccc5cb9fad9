use std::collections::VecDeque;

use log::trace;

use crate::LoadError;
use crate::codec::reader::{
    ChunkTarget, Parseable, ReadSeek, eat_chunk, eat_record_tail, read_chunk_header, read_common_chunk, read_payload,
};
use crate::codec::types::gid;
use crate::file::context::LoadContext;
use crate::folder::types::{Folder, FolderLoad, FolderProps};
use crate::node::tree::{NodeId, TreeError};
use crate::node::types::{NodeHeader, Resource};

/// Longest entry of the legacy name list that is kept.
const MAX_LEGACY_NAME: usize = 255;

/// Loader for folders reached through the registry, which are always populated.
pub fn load_folder_object(ctx: &mut LoadContext, rdr: &mut dyn ReadSeek, size: u32) -> Result<NodeId, LoadError> {
    let id = ctx.insert(NodeHeader::default(), Resource::Folder(Folder::unloaded()));
    read_folder(ctx, rdr, id, size, FolderLoad::POPULATE)?;
    Ok(id)
}

/// Reads the payload of a folder chunk into the existing node `folder`.
pub(crate) fn read_folder(
    ctx: &mut LoadContext,
    rdr: &mut dyn ReadSeek,
    folder: NodeId,
    size: u32,
    flags: FolderLoad,
) -> Result<(), LoadError> {
    let target = ChunkTarget::new(rdr, size)?;
    let link = ctx.file_link();
    let load_names = ctx.options().load_names;
    {
        let state = ctx.tree.folder_mut(folder).ok_or(TreeError::NotAFolder(folder))?;
        state.entrypoint = Some(target.start());
        state.file = Some(link);
        state.index_names = load_names;
    }

    let populate = flags.contains(FolderLoad::POPULATE);
    let mut names = VecDeque::new();

    while !target.reached(rdr)? {
        let chunk = read_chunk_header(rdr)?;
        let child = match chunk.gid {
            gid::FOLDER_PROPS => {
                let props = FolderProps::parse(rdr)?;
                eat_record_tail::<FolderProps, _>(rdr, chunk.size)?;
                if let Some(state) = ctx.tree.folder_mut(folder) {
                    state.significant_names = props.significant_names.into();
                }
                None
            }
            gid::FOLDER_NAMES => {
                let significant = ctx.tree.folder(folder).is_some_and(|f| f.significant_names);
                if load_names && significant {
                    names = read_name_list(rdr, chunk.size)?;
                } else {
                    eat_chunk(rdr, u64::from(chunk.size))?;
                }
                None
            }
            gid::FOLDER if populate => {
                let child = ctx.insert(NodeHeader::default(), Resource::Folder(Folder::unloaded()));
                let nested = if flags.contains(FolderLoad::SHALLOW) {
                    FolderLoad::empty()
                } else {
                    FolderLoad::POPULATE
                };
                read_folder(ctx, rdr, child, chunk.size, nested)?;
                Some(child)
            }
            _ => {
                let header = &mut ctx.tree.node_mut(folder)?.header;
                if read_common_chunk(rdr, header, chunk.gid, chunk.size)? {
                    None
                } else if !populate {
                    eat_chunk(rdr, u64::from(chunk.size))?;
                    None
                } else {
                    ctx.load_object(rdr, chunk.gid, chunk.size)?
                }
            }
        };

        let Some(child) = child else {
            continue;
        };

        ctx.add_child(folder, child)?;
        if let Some(name) = names.pop_front() {
            let header = &mut ctx.tree.node_mut(child)?.header;
            if header.name.is_empty() {
                header.name = name;
            }
        }

        if flags.contains(FolderLoad::ONLY_FIRST) {
            trace!("Only the first child of {} was requested", folder);
            target.skip_to_end(rdr)?;
            break;
        }
    }

    if let Some(state) = ctx.tree.folder_mut(folder) {
        state.fully_loaded = populate;
    }
    Ok(())
}

/// The legacy name list: one chunk per child, cut at the first 0x01 byte.
fn read_name_list(rdr: &mut dyn ReadSeek, size: u32) -> Result<VecDeque<String>, LoadError> {
    let target = ChunkTarget::new(rdr, size)?;
    let mut names = VecDeque::new();
    while !target.reached(rdr)? {
        let entry = read_chunk_header(rdr)?;
        let kept = entry.size.min(MAX_LEGACY_NAME as u32);
        let mut raw = read_payload(rdr, kept)?;
        eat_chunk(rdr, u64::from(entry.size - kept))?;

        if let Some(cut) = raw.iter().position(|b| *b == 0x01) {
            raw.truncate(cut);
        }
        names.push_back(String::from_utf8_lossy(&raw).into_owned());
    }
    Ok(names)
}
