mod common;

use hoard_files::blob::types::Blob;
use hoard_files::codec::types::Guid;
use hoard_files::image::types::ColorMode;
use hoard_files::{File, LoadError, LoadOptions, NodeId};

use common::*;

fn options() -> LoadOptions {
    LoadOptions::default().with_strict_chunks(true)
}

fn first_child(file: &File) -> NodeId {
    file.tree().children(file.root())[0]
}

#[test_log::test]
fn lazy_blobs_load_on_demand() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let body = concat([blob(1, b"later", true), blob(2, b"now", false)]);
    let path = write(dir.path(), "lazy.gor", &container(body));

    let mut file = File::with_options(options());
    file.load_file(&path)?;
    let lazy = first_child(&file);
    assert!(file.is_open());

    let blob = file.tree_mut().blob_mut(lazy).ok_or(LoadError::NoFileObject)?;
    assert!(!blob.is_loaded());
    assert!(blob.deferred().is_some_and(|d| d.is_alive()));
    blob.load()?;
    assert_eq!(blob.data(), Some(&b"later"[..]));

    // a second load is a no-op
    blob.load()?;
    assert_eq!(blob.data(), Some(&b"later"[..]));
    Ok(())
}

#[test_log::test]
fn late_loads_reopen_a_closed_file() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let path = write(dir.path(), "reopen.gor", &container(blob(1, b"payload", true)));

    let mut file = File::with_options(options());
    file.load_file(&path)?;
    file.discard()?;
    assert!(!file.is_open());

    let lazy = first_child(&file);
    file.tree_mut()
        .blob_mut(lazy)
        .ok_or(LoadError::NoFileObject)?
        .load()?;
    assert_eq!(file.tree().blob(lazy).and_then(Blob::data), Some(&b"payload"[..]));
    assert!(file.is_open());

    file.discard()?;
    file.open()?;
    assert!(file.is_open());
    Ok(())
}

#[test_log::test]
fn lazy_images_load_on_demand() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let pixels = [1, 2, 3, 4];
    let path = write(
        dir.path(),
        "image.gor",
        &container(image(5, 2, 1, ColorMode::GrayscaleAlpha, &pixels, true)),
    );

    let mut file = File::with_options(options());
    file.load_file(&path)?;
    let id = first_child(&file);
    let image = file.tree_mut().image_mut(id).ok_or(LoadError::NoFileObject)?;
    assert!(!image.is_loaded());
    assert_eq!((image.width(), image.height()), (2, 1));

    image.load()?;
    image.prepare();
    assert_eq!(image.data(), Some(&pixels[..]));
    assert_eq!(image.prepared().map(|p| p.rgba.clone()), Some(vec![1, 1, 1, 2, 3, 3, 3, 4]));
    Ok(())
}

#[test_log::test]
fn released_trees_load_while_the_file_lives() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let path = write(dir.path(), "release.gor", &container(blob(1, b"still here", true)));

    let mut file = File::with_options(options());
    file.load_file(&path)?;
    let (mut tree, root) = file.release();
    assert!(!file.is_loaded());
    assert!(file.tree().children(file.root()).is_empty());

    let lazy = tree.children(root)[0];
    let blob = tree.blob_mut(lazy).ok_or(LoadError::NoFileObject)?;
    blob.load()?;
    assert_eq!(blob.data(), Some(&b"still here"[..]));
    Ok(())
}

#[test_log::test]
fn late_loads_fail_once_the_file_is_gone() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let path = write(dir.path(), "gone.gor", &container(blob(1, b"lost", true)));

    let mut file = File::with_options(options());
    file.load_file(&path)?;
    let (mut tree, root) = file.release();
    drop(file);

    let lazy = tree.children(root)[0];
    let blob = tree.blob_mut(lazy).ok_or(LoadError::NoFileObject)?;
    assert!(blob.deferred().is_some_and(|d| !d.is_alive()));
    assert!(matches!(blob.load(), Err(LoadError::NoFileObject)));
    assert!(!blob.is_loaded());
    Ok(())
}

#[test_log::test]
fn held_resources_outlive_destroy() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let body = concat([blob(1, b"held", false), blob(2, b"lazy", true)]);
    let path = write(dir.path(), "held.gor", &container(body));

    let mut file = File::with_options(options());
    file.load_file(&path)?;
    let children = file.tree().children(file.root()).to_vec();
    file.tree_mut().acquire(children[0])?;
    file.tree_mut().acquire(children[1])?;

    file.destroy();
    assert!(file.tree().contains(children[0]));
    assert_eq!(file.tree().parent(children[0]), None);
    assert_eq!(file.tree().blob(children[0]).and_then(Blob::data), Some(&b"held"[..]));

    let lazy = file.tree_mut().blob_mut(children[1]).ok_or(LoadError::NoFileObject)?;
    assert!(matches!(lazy.load(), Err(LoadError::NoFileObject)));

    file.tree_mut().release(children[0])?;
    file.tree_mut().release(children[1])?;
    assert_eq!(file.tree().len(), 1);
    Ok(())
}

#[test_log::test]
fn loading_again_replaces_the_tree() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let first = write(dir.path(), "first.gor", &container(blob(1, b"one", true)));
    let second = write(dir.path(), "second.gor", &container(blob(2, b"two", false)));

    let mut file = File::with_options(options());
    file.load_file(&first)?;
    let old = first_child(&file);
    file.tree_mut().acquire(old)?;

    file.load_file(&second)?;
    assert_eq!(file.find_object(Guid(1)), None);
    assert_eq!(file.tree().node(first_child(&file))?.guid(), Guid(2));

    let stale = file.tree_mut().blob_mut(old).ok_or(LoadError::NoFileObject)?;
    assert!(matches!(stale.load(), Err(LoadError::NoFileObject)));
    Ok(())
}

#[test_log::test]
fn shallow_folders_fail_to_load_after_destroy() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let body = folder(vec![blob(1, b"inside", false)]);
    let path = write(dir.path(), "shallow.gor", &container(body));

    let mut file = File::with_options(options());
    file.load_shallow(&path)?;
    let nested = first_child(&file);
    file.tree_mut().acquire(nested)?;
    file.destroy();

    assert!(matches!(file.load_folder(nested, false), Err(LoadError::NoFileObject)));
    Ok(())
}

#[test_log::test]
fn a_vanished_file_is_reported() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let path = write(dir.path(), "vanish.gor", &container(blob(1, b"soon gone", true)));

    let mut file = File::with_options(options());
    file.load_file(&path)?;
    file.discard()?;
    std::fs::remove_file(&path)?;

    let lazy = first_child(&file);
    let blob = file.tree_mut().blob_mut(lazy).ok_or(LoadError::NoFileObject)?;
    assert!(matches!(blob.load(), Err(LoadError::FileNotFound { .. })));
    assert!(matches!(file.open(), Err(LoadError::FileNotFound { .. })));
    Ok(())
}

#[test_log::test]
fn appending_completes_a_lazy_blob_first() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let path = write(dir.path(), "append.gor", &container(blob(1, b"head", true)));
    let tail = write(dir.path(), "tail.bin", b"+tail");

    let mut file = File::with_options(options());
    file.load_file(&path)?;
    let lazy = first_child(&file);
    let blob = file.tree_mut().blob_mut(lazy).ok_or(LoadError::NoFileObject)?;

    blob.append_file(&tail)?;
    assert_eq!(blob.data(), Some(&b"head+tail"[..]));

    blob.import_file(&tail)?;
    assert_eq!(blob.data(), Some(&b"+tail"[..]));

    assert!(matches!(
        blob.import_file(dir.path().join("missing.bin")),
        Err(LoadError::FileNotFound { .. })
    ));
    Ok(())
}

#[test_log::test]
fn links_back_to_their_folder_do_not_leak_on_reload() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let body = concat([folder(vec![identity(7), link(8, 7)]), link(9, 7)]);
    let path = write(dir.path(), "cycle.gor", &container(body));

    let mut file = File::with_options(options());
    file.load_file(&path)?;
    assert_eq!(file.tree().len(), 4);

    file.destroy();
    assert_eq!(file.tree().len(), 1);

    for _ in 0..3 {
        file.load_file(&path)?;
    }
    assert_eq!(file.tree().len(), 4);
    file.destroy();
    assert_eq!(file.tree().len(), 1);
    Ok(())
}

#[test_log::test]
fn holding_the_root_does_not_end_it() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let path = write(dir.path(), "root.gor", &container(blob(1, b"x", false)));

    let mut file = File::with_options(options());
    file.load_file(&path)?;
    let root = file.root();
    file.tree_mut().acquire(root)?;
    file.tree_mut().release(root)?;

    assert!(file.tree().contains(root));
    file.prepare()?;
    file.discard()?;
    assert_eq!(file.tree().children(root).len(), 1);
    Ok(())
}
