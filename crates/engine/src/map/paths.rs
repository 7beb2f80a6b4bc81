use std::path::{Component, Path, PathBuf};

use crate::config::AssetLayout;

/// Resolves a document-relative reference against `base_dir`, folding `.` and `..`
/// without touching the filesystem.
pub(crate) fn resolve_relative(base_dir: &Path, reference: &str) -> PathBuf {
    let reference = reference.replace('\\', "/");
    normalize_lexically(&base_dir.join(reference))
}

/// Tileset `source` paths point at the editor's XML files next to the map.
/// At runtime the JSON export is read instead; if the reference does not resolve
/// to an existing file, the file name is looked up in the layout's tileset dir.
pub(crate) fn tileset_document_path(map_dir: &Path, source: &str, layout: &AssetLayout) -> PathBuf {
    let mut path = resolve_relative(map_dir, source);
    if path.extension().is_some_and(|ext| ext == "tsx") {
        path.set_extension(&layout.tileset_extension);
    }
    if path.is_file() {
        return path;
    }
    match path.file_name() {
        Some(file_name) => {
            let fallback = layout.tilesets_path().join(file_name);
            if fallback.is_file() {
                fallback
            } else {
                path
            }
        }
        None => path,
    }
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
