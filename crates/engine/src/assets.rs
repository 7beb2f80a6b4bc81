use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::ImageReader;
use thiserror::Error;
use tracing::debug;

/// Opaque handle to an image owned by an [`ImageLoader`].
///
/// Not `Clone`: whoever holds the handle owns the image and must give it back
/// through [`ImageLoader::unload_image`] exactly once.
#[derive(Debug, PartialEq, Eq)]
pub struct ImageHandle {
    id: u64,
    width: u32,
    height: u32,
}

impl ImageHandle {
    pub fn new(id: u64, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("failed to open image {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image header {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub trait ImageLoader {
    fn load_image(&mut self, path: &Path) -> Result<ImageHandle, ImageLoadError>;
    fn unload_image(&mut self, handle: ImageHandle);
}

/// Reads image dimensions from disk and keeps a table of live handles.
#[derive(Debug, Default)]
pub struct DiskImageLoader {
    next_id: u64,
    live: HashMap<u64, PathBuf>,
}

impl DiskImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

impl ImageLoader for DiskImageLoader {
    fn load_image(&mut self, path: &Path) -> Result<ImageHandle, ImageLoadError> {
        let reader = ImageReader::open(path).map_err(|source| ImageLoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let (width, height) =
            reader
                .into_dimensions()
                .map_err(|source| ImageLoadError::Decode {
                    path: path.to_path_buf(),
                    source,
                })?;

        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        self.live.insert(id, path.to_path_buf());
        debug!(image_id = id, width, height, path = %path.display(), "image_loaded");
        Ok(ImageHandle::new(id, width, height))
    }

    fn unload_image(&mut self, handle: ImageHandle) {
        if let Some(path) = self.live.remove(&handle.id) {
            debug!(image_id = handle.id, path = %path.display(), "image_unloaded");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashSet;
    use std::path::{Path, PathBuf};

    use super::{ImageHandle, ImageLoadError, ImageLoader};

    /// Hands out fixed-size handles for any path and records every load/unload.
    #[derive(Debug)]
    pub(crate) struct CountingImageLoader {
        pub(crate) width: u32,
        pub(crate) height: u32,
        pub(crate) loads: Vec<PathBuf>,
        pub(crate) unloads: usize,
        pub(crate) missing: HashSet<PathBuf>,
        live: HashSet<u64>,
        next_id: u64,
    }

    impl CountingImageLoader {
        pub(crate) fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                loads: Vec::new(),
                unloads: 0,
                missing: HashSet::new(),
                live: HashSet::new(),
                next_id: 0,
            }
        }

        pub(crate) fn live_count(&self) -> usize {
            self.live.len()
        }
    }

    impl ImageLoader for CountingImageLoader {
        fn load_image(&mut self, path: &Path) -> Result<ImageHandle, ImageLoadError> {
            if self.missing.contains(path) {
                return Err(ImageLoadError::Open {
                    path: path.to_path_buf(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            let id = self.next_id;
            self.next_id += 1;
            self.live.insert(id);
            self.loads.push(path.to_path_buf());
            Ok(ImageHandle::new(id, self.width, self.height))
        }

        fn unload_image(&mut self, handle: ImageHandle) {
            assert!(
                self.live.remove(&handle.id()),
                "image {} released twice or never loaded",
                handle.id()
            );
            self.unloads += 1;
        }
    }
}
