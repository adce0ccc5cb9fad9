use std::fs;
use std::io::Cursor;

use crate::LoadError;
use crate::codec::types::{CURRENT_VERSION, Gid, SIGNATURE, gid};
use crate::compression::{Compressor, ZlibCompressor};
use crate::file::File;
use crate::file::options::{LoadOptions, ResolvePolicy};
use crate::file::reader::{compressed_path, materialize, read_container_header};
use crate::file::registry::LoaderRegistry;

fn container_header(signature: &[u8], version: u32, root: Gid) -> Vec<u8> {
    let mut out = signature.to_vec();
    out.extend(version.to_le_bytes());
    out.extend(0x0500_0000u32.to_le_bytes());
    out.extend(root.as_u32().to_le_bytes());
    out.extend(0u32.to_le_bytes());
    out
}

#[test]
fn header_is_validated() -> Result<(), anyhow::Error> {
    let header = read_container_header(&mut Cursor::new(container_header(
        SIGNATURE,
        CURRENT_VERSION,
        gid::FOLDER,
    )))?;
    assert_eq!(header.version, CURRENT_VERSION);
    assert_eq!(header.file_type, Gid(0x0500_0000));
    assert_eq!(header.root.size, 0);
    Ok(())
}

#[test]
fn wrong_signature_is_rejected() {
    let err = read_container_header(&mut Cursor::new(container_header(
        b"GARGON",
        CURRENT_VERSION,
        gid::FOLDER,
    )))
    .unwrap_err();
    assert!(matches!(err, LoadError::Signature { found } if &found == b"GARGON"));

    let err = read_container_header(&mut Cursor::new(b"GOR".to_vec())).unwrap_err();
    assert!(matches!(err, LoadError::Signature { .. }));
}

#[test]
fn newer_versions_are_rejected() {
    let err = read_container_header(&mut Cursor::new(container_header(
        SIGNATURE,
        CURRENT_VERSION + 1,
        gid::FOLDER,
    )))
    .unwrap_err();
    assert!(matches!(err, LoadError::VersionMismatch { found, .. } if found == CURRENT_VERSION + 1));
}

#[test]
fn older_versions_are_accepted() -> Result<(), anyhow::Error> {
    let header = read_container_header(&mut Cursor::new(container_header(SIGNATURE, 0x0000_0100, gid::FOLDER)))?;
    assert_eq!(header.version, 0x0000_0100);
    Ok(())
}

#[test]
fn the_root_has_to_be_a_folder() {
    let err = read_container_header(&mut Cursor::new(container_header(
        SIGNATURE,
        CURRENT_VERSION,
        gid::BLOB,
    )))
    .unwrap_err();
    assert!(matches!(err, LoadError::Containment { .. }));
}

#[test]
fn compressed_containers_are_materialized() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data.gor");
    let compressor = ZlibCompressor::default();
    let compressed = compressed_path(&path, &compressor);
    assert_eq!(compressed, dir.path().join("data.gor.zlib"));

    let mut packed = Vec::new();
    compressor.encode(b"GORGON and more", &mut packed)?;
    fs::write(&compressed, packed)?;

    materialize(&path, &compressor)?;
    assert_eq!(fs::read(&path)?, b"GORGON and more");
    assert!(!compressed.exists());
    Ok(())
}

#[test]
fn missing_files_are_reported() -> Result<(), anyhow::Error> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nothing.gor");
    let err = materialize(&path, &ZlibCompressor::default()).unwrap_err();
    assert!(matches!(err, LoadError::FileNotFound { path: ref p } if p == &path));

    let mut file = File::new();
    assert!(matches!(file.load_file(&path), Err(LoadError::FileNotFound { .. })));
    assert!(!file.is_loaded());
    assert!(file.tree().folder(file.root()).is_some());
    Ok(())
}

#[test]
fn open_without_a_file_fails() {
    let mut file = File::new();
    assert!(matches!(file.open(), Err(LoadError::NotOpened)));
}

#[test]
fn builtin_loaders_cover_the_resource_kinds() {
    let mut registry = LoaderRegistry::with_builtins();
    for kind in [
        gid::FOLDER,
        gid::BLOB,
        gid::IMAGE,
        gid::ANIMATION_IMAGE,
        gid::ANIMATION,
        gid::LINK_NODE,
        gid::DATA,
    ] {
        assert!(registry.contains(kind), "{} has no loader", kind);
    }
    assert_eq!(registry.len(), 7);
    assert!(registry.gids().windows(2).all(|w| w[0] < w[1]));

    assert!(registry.remove(gid::BLOB).is_some());
    assert!(!registry.contains(gid::BLOB));
    assert!(LoaderRegistry::new().is_empty());
}

#[test]
fn options_are_builders() {
    let options = LoadOptions::default()
        .with_names(true)
        .with_strict_chunks(false)
        .with_resolve_policy(ResolvePolicy::Strict);
    assert!(options.load_names);
    assert!(!options.strict_chunks);
    assert_eq!(options.resolve_policy, ResolvePolicy::Strict);
    assert_eq!(LoadOptions::default().strict_chunks, cfg!(debug_assertions));

    let file = File::with_options(options);
    assert_eq!(file.options(), &options);
}
