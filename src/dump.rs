use anyhow::anyhow;
use itertools::Itertools;

use hoard_files::{NodeId, Resource, Tree};

/// One indented line per node.
pub fn render(tree: &Tree, root: NodeId) -> String {
    let mut lines = Vec::new();
    render_node(tree, root, 0, &mut lines);
    lines.into_iter().join("\n")
}

fn render_node(tree: &Tree, id: NodeId, depth: usize, lines: &mut Vec<String>) {
    let Some(node) = tree.get(id) else {
        return;
    };

    let detail = match &node.resource {
        Resource::Folder(folder) if !folder.is_loaded() => "(not loaded)".to_string(),
        Resource::Folder(_) => format!("{} children", node.children().len()),
        Resource::Blob(blob) => match blob.data() {
            Some(data) => format!("{} bytes, {:?}", data.len(), blob.blob_type()),
            None => "(lazy)".to_string(),
        },
        Resource::Image(image) => format!(
            "{}x{} {:?}{}",
            image.width(),
            image.height(),
            image.mode(),
            if image.is_loaded() { "" } else { " (lazy)" }
        ),
        Resource::Animation(animation) => format!("{} frames, {} ms", animation.len(), animation.duration()),
        Resource::Link(link) => match link.target() {
            Some(target) => format!("-> {} ({})", link.target_guid(), target),
            None => format!("-> {} (unresolved)", link.target_guid()),
        },
        Resource::Data(data) => format!("{} items", data.len()),
        Resource::Custom(custom) => format!("{:?}", custom),
    };

    let name = if node.name().is_empty() {
        String::new()
    } else {
        format!(" \"{}\"", node.name())
    };
    lines.push(format!(
        "{}{} {}{} [{}] {}",
        "  ".repeat(depth),
        node.resource.kind_name(),
        node.guid(),
        name,
        node.gid(),
        detail
    ));

    for child in node.children() {
        render_node(tree, *child, depth + 1, lines);
    }
}

/// The bytes behind a blob or the raw pixels of an image, late loading them if needed.
pub fn payload(tree: &mut Tree, id: NodeId) -> Result<Vec<u8>, anyhow::Error> {
    let node = tree.get_mut(id).ok_or_else(|| anyhow!("{} is gone", id))?;
    match &mut node.resource {
        Resource::Blob(blob) => {
            blob.load()?;
            Ok(blob.data().map(<[u8]>::to_vec).unwrap_or_default())
        }
        Resource::Image(image) => {
            image.load()?;
            Ok(image.data().map(<[u8]>::to_vec).unwrap_or_default())
        }
        other => Err(anyhow!("A {} has no payload to extract", other.kind_name())),
    }
}
