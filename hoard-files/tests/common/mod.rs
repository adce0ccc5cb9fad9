#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use hoard_files::codec::types::{CURRENT_VERSION, Gid, SIGNATURE};
use hoard_files::compression::{Compressor, ZlibCompressor};
use hoard_files::data::types::DataValue;
use hoard_files::gid;
use hoard_files::image::types::ColorMode;
use hoard_files::{NodeId, Resource, Tree};

pub const FILE_TYPE: u32 = 0x0500_0001;

pub fn chunk(tag: Gid, payload: impl AsRef<[u8]>) -> Vec<u8> {
    let payload = payload.as_ref();
    let mut out = Vec::with_capacity(payload.len() + 8);
    out.extend(tag.as_u32().to_le_bytes());
    out.extend((payload.len() as u32).to_le_bytes());
    out.extend(payload);
    out
}

pub fn concat(parts: impl IntoIterator<Item = Vec<u8>>) -> Vec<u8> {
    parts.into_iter().flatten().collect()
}

/// A whole container whose root folder holds `body`.
pub fn container(body: Vec<u8>) -> Vec<u8> {
    container_with_version(CURRENT_VERSION, body)
}

pub fn container_with_version(version: u32, body: Vec<u8>) -> Vec<u8> {
    let mut out = SIGNATURE.to_vec();
    out.extend(version.to_le_bytes());
    out.extend(FILE_TYPE.to_le_bytes());
    out.extend(chunk(gid::FOLDER, body));
    out
}

pub fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).expect("test container can be written");
    path
}

pub fn identity(guid: u64) -> Vec<u8> {
    if guid == 0 {
        return Vec::new();
    }
    chunk(gid::SGUID, guid.to_le_bytes())
}

pub fn name(name: &str) -> Vec<u8> {
    if name.is_empty() {
        return Vec::new();
    }
    chunk(gid::NAME, name.as_bytes())
}

pub fn folder(parts: Vec<Vec<u8>>) -> Vec<u8> {
    chunk(gid::FOLDER, concat(parts))
}

pub fn folder_props(significant_names: bool) -> Vec<u8> {
    chunk(gid::FOLDER_PROPS, (significant_names as i32).to_le_bytes())
}

/// The legacy name list of a folder.
pub fn folder_names(names: &[&str]) -> Vec<u8> {
    chunk(
        gid::FOLDER_NAMES,
        concat(names.iter().map(|n| chunk(gid::NAME, n.as_bytes()))),
    )
}

pub fn blob_props(blob_type: u32, lazy: bool) -> Vec<u8> {
    let mut payload = blob_type.to_le_bytes().to_vec();
    payload.extend((lazy as i32).to_le_bytes());
    chunk(gid::BLOB_PROPS, payload)
}

pub fn blob(guid: u64, data: &[u8], lazy: bool) -> Vec<u8> {
    chunk(
        gid::BLOB,
        concat([identity(guid), blob_props(1, lazy), chunk(gid::BLOB_DATA, data)]),
    )
}

pub fn compressed_blob(guid: u64, data: &[u8]) -> Vec<u8> {
    let mut packed = Vec::new();
    ZlibCompressor::default()
        .encode(data, &mut packed)
        .expect("zlib can encode");
    chunk(
        gid::BLOB,
        concat([identity(guid), blob_props(1, false), chunk(gid::BLOB_CMP_DATA, packed)]),
    )
}

pub fn image_body(guid: u64, width: u32, height: u32, mode: ColorMode, data: &[u8], lazy: bool) -> Vec<u8> {
    let mut props = Vec::new();
    props.extend((width as i32).to_le_bytes());
    props.extend((height as i32).to_le_bytes());
    props.extend(u32::from(mode).to_le_bytes());
    props.extend(0u32.to_le_bytes());
    props.extend((lazy as i32).to_le_bytes());
    concat([
        identity(guid),
        chunk(gid::IMAGE_PROPS, props),
        chunk(gid::IMAGE_DATA, data),
    ])
}

/// An image whose pixels are zlib packed and stored under the `compression` tag.
pub fn compressed_image(guid: u64, width: u32, height: u32, mode: ColorMode, data: &[u8], compression: Gid) -> Vec<u8> {
    let mut props = Vec::new();
    props.extend((width as i32).to_le_bytes());
    props.extend((height as i32).to_le_bytes());
    props.extend(u32::from(mode).to_le_bytes());
    props.extend(compression.as_u32().to_le_bytes());
    props.extend(0i32.to_le_bytes());

    let mut packed = Vec::new();
    ZlibCompressor::default()
        .encode(data, &mut packed)
        .expect("zlib can encode");
    chunk(
        gid::IMAGE,
        concat([
            identity(guid),
            chunk(gid::IMAGE_PROPS, props),
            chunk(gid::IMAGE_CMP_DATA, packed),
        ]),
    )
}

pub fn image(guid: u64, width: u32, height: u32, mode: ColorMode, data: &[u8], lazy: bool) -> Vec<u8> {
    chunk(gid::IMAGE, image_body(guid, width, height, mode, data, lazy))
}

pub fn durations(list: &[u32]) -> Vec<u8> {
    chunk(
        gid::ANIMATION_DURATIONS,
        list.iter().flat_map(|d| d.to_le_bytes()).collect::<Vec<_>>(),
    )
}

/// `frames` are image bodies, stored as animation image chunks.
pub fn animation(guid: u64, frames: Vec<Vec<u8>>, frame_durations: Option<&[u32]>) -> Vec<u8> {
    let mut parts = vec![identity(guid)];
    if let Some(list) = frame_durations {
        parts.push(durations(list));
    }
    parts.extend(frames.into_iter().map(|f| chunk(gid::ANIMATION_IMAGE, f)));
    chunk(gid::ANIMATION, concat(parts))
}

pub fn link(guid: u64, target: u64) -> Vec<u8> {
    chunk(
        gid::LINK_NODE,
        concat([identity(guid), chunk(gid::LINK_NODE_TARGET, target.to_le_bytes())]),
    )
}

/// A u32 length prefixed string.
pub fn text(value: &str) -> Vec<u8> {
    concat([(value.len() as u32).to_le_bytes().to_vec(), value.as_bytes().to_vec()])
}

pub fn ints(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn data_item(kind: Gid, name: &str, value: Vec<u8>) -> Vec<u8> {
    chunk(kind, concat([text(name), value]))
}

pub fn data(guid: u64, items: Vec<Vec<u8>>) -> Vec<u8> {
    let mut parts = vec![identity(guid)];
    parts.extend(items);
    chunk(gid::DATA, concat(parts))
}

fn header(tree: &Tree, id: NodeId) -> Vec<u8> {
    let node = tree.node(id).expect("encoded nodes exist");
    concat([identity(node.guid().0), name(node.name())])
}

/// Encodes the children of `root` as the payload of a container's root folder.
pub fn encode_tree(tree: &Tree, root: NodeId) -> Vec<u8> {
    folder_body(tree, root)
}

fn folder_body(tree: &Tree, id: NodeId) -> Vec<u8> {
    let significant = tree.folder(id).is_some_and(|f| f.has_significant_names());
    let mut parts = vec![header(tree, id), folder_props(significant)];
    parts.extend(tree.children(id).iter().map(|child| encode_node(tree, *child)));
    concat(parts)
}

pub fn encode_node(tree: &Tree, id: NodeId) -> Vec<u8> {
    let node = tree.node(id).expect("encoded nodes exist");
    match &node.resource {
        Resource::Folder(_) => chunk(gid::FOLDER, folder_body(tree, id)),
        Resource::Blob(blob) => chunk(
            gid::BLOB,
            concat([
                header(tree, id),
                blob_props(blob.blob_type() as u32, false),
                chunk(gid::BLOB_DATA, blob.data().expect("encoded blobs are loaded")),
            ]),
        ),
        Resource::Image(image) => chunk(gid::IMAGE, image_chunk_body(tree, id)),
        Resource::Animation(animation) => {
            let list = animation.frames().iter().map(|f| f.duration).collect::<Vec<_>>();
            let mut parts = vec![header(tree, id), durations(&list)];
            parts.extend(
                animation
                    .frames()
                    .iter()
                    .map(|f| chunk(gid::ANIMATION_IMAGE, image_chunk_body(tree, f.image))),
            );
            chunk(gid::ANIMATION, concat(parts))
        }
        Resource::Link(link) => chunk(
            gid::LINK_NODE,
            concat([
                header(tree, id),
                chunk(gid::LINK_NODE_TARGET, link.target_guid().0.to_le_bytes()),
            ]),
        ),
        Resource::Data(data) => {
            let mut parts = vec![header(tree, id)];
            parts.extend(data.items().iter().map(|item| {
                let value = match &item.value {
                    DataValue::Int(v) => v.to_le_bytes().to_vec(),
                    DataValue::Float(v) => v.to_le_bytes().to_vec(),
                    DataValue::Text(v) => text(v),
                    DataValue::Point(p) => ints(&[p.x, p.y]),
                    DataValue::Pointf(p) => concat([p.x.to_le_bytes().to_vec(), p.y.to_le_bytes().to_vec()]),
                    DataValue::Size(s) => ints(&[s.width, s.height]),
                    DataValue::Rectangle(r) => ints(&[r.x, r.y, r.width, r.height]),
                    DataValue::Bounds(e) | DataValue::Margins(e) => ints(&[e.left, e.top, e.right, e.bottom]),
                    DataValue::Object(object) => object.map(|o| encode_node(tree, o)).unwrap_or_default(),
                };
                data_item(item.value.gid(), &item.name, value)
            }));
            chunk(gid::DATA, concat(parts))
        }
        Resource::Custom(_) => Vec::new(),
    }
}

fn image_chunk_body(tree: &Tree, id: NodeId) -> Vec<u8> {
    let image = tree.image(id).expect("frames are images");
    let mut props = Vec::new();
    props.extend((image.width() as i32).to_le_bytes());
    props.extend((image.height() as i32).to_le_bytes());
    props.extend(u32::from(image.mode()).to_le_bytes());
    props.extend(0u32.to_le_bytes());
    props.extend(0i32.to_le_bytes());
    concat([
        header(tree, id),
        chunk(gid::IMAGE_PROPS, props),
        chunk(gid::IMAGE_DATA, image.data().expect("encoded images are loaded")),
    ])
}

/// One line per node in preorder, enough to compare two trees structurally.
pub fn describe(tree: &Tree, root: NodeId) -> Vec<String> {
    let mut lines = Vec::new();
    describe_into(tree, root, 0, &mut lines);
    lines
}

fn describe_into(tree: &Tree, id: NodeId, depth: usize, lines: &mut Vec<String>) {
    let Some(node) = tree.get(id) else {
        return;
    };
    let detail = match &node.resource {
        Resource::Folder(_) => String::new(),
        Resource::Blob(blob) => format!("{:?}", blob.data()),
        Resource::Image(image) => format!(
            "{}x{} {:?} {:?}",
            image.width(),
            image.height(),
            image.mode(),
            image.data()
        ),
        Resource::Animation(animation) => format!(
            "{:?}",
            animation.frames().iter().map(|f| f.duration).collect::<Vec<_>>()
        ),
        Resource::Link(link) => format!(
            "-> {} {}",
            link.target_guid(),
            link.target().and_then(|t| tree.get(t)).map(|t| t.guid().0).unwrap_or(0)
        ),
        Resource::Data(data) => data
            .items()
            .iter()
            .map(|item| match &item.value {
                DataValue::Object(object) => format!(
                    "{} -> {}",
                    item.name,
                    object.and_then(|o| tree.get(o)).map(|o| o.guid().0).unwrap_or(0)
                ),
                value => format!("{} {:?}", item.name, value),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Resource::Custom(custom) => format!("{:?}", custom),
    };
    lines.push(format!(
        "{}{} {} {:?} {}",
        "  ".repeat(depth),
        node.gid(),
        node.guid(),
        node.name(),
        detail
    ));
    for child in node.children() {
        describe_into(tree, *child, depth + 1, lines);
    }
}
