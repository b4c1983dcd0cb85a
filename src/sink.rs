//! Writing extracted text chunks and images into the output directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};

use crate::error::{Error, Result};

/// Subdirectory for text chunks.
pub const TEXT_DIR: &str = "text";

/// Subdirectory for images.
pub const IMAGE_DIR: &str = "images";

/// Extension used for every written image.
pub const IMAGE_EXTENSION: &str = "png";

/// File name for the text chunk at `index`.
pub fn text_file_name(index: usize) -> String {
    format!("page{}.txt", index)
}

/// File name for the image at `index`.
pub fn image_file_name(index: usize) -> String {
    format!("img{}.{}", index, IMAGE_EXTENSION)
}

/// Writes extraction output under a destination directory.
///
/// ```text
/// <dest>/text/page<N>.txt
/// <dest>/images/img<N>.png
/// ```
#[derive(Debug, Clone)]
pub struct FileSink {
    root: PathBuf,
}

impl FileSink {
    /// Create a sink rooted at `dest`, creating `dest` if needed.
    ///
    /// The directory is made absolute so every returned path is absolute.
    pub fn new<P: AsRef<Path>>(dest: P) -> Result<Self> {
        let dest = dest.as_ref();
        if dest.as_os_str().is_empty() {
            return Err(Error::DestinationInvalid(
                "you have specified an empty path".to_string(),
            ));
        }
        if dest.exists() && !dest.is_dir() {
            return Err(Error::DestinationInvalid(format!(
                "{} is not a directory",
                dest.display()
            )));
        }

        fs::create_dir_all(dest)
            .map_err(|e| Error::DestinationInvalid(format!("{}: {}", dest.display(), e)))?;
        let root = dest
            .canonicalize()
            .map_err(|e| Error::DestinationInvalid(format!("{}: {}", dest.display(), e)))?;

        Ok(Self { root })
    }

    /// The absolute destination directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory that holds text chunks.
    pub fn text_dir(&self) -> PathBuf {
        self.root.join(TEXT_DIR)
    }

    /// Directory that holds images.
    pub fn image_dir(&self) -> PathBuf {
        self.root.join(IMAGE_DIR)
    }

    /// Write a text chunk as `text/page<index>.txt`.
    pub fn write_text(&self, index: usize, text: &str) -> Result<PathBuf> {
        let dir = self.ensure_dir(TEXT_DIR)?;
        let path = dir.join(text_file_name(index));
        fs::write(&path, text).map_err(|source| Error::WriteFailure {
            path: path.clone(),
            source,
        })?;
        log::debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Write an image as `images/img<index>.png`.
    pub fn write_image(&self, index: usize, image: &DynamicImage) -> Result<PathBuf> {
        let dir = self.ensure_image_dir()?;
        let path = dir.join(image_file_name(index));
        image
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| Error::WriteFailure {
                path: path.clone(),
                source: match e {
                    image::ImageError::IoError(io) => io,
                    other => io::Error::new(io::ErrorKind::Other, other.to_string()),
                },
            })?;
        log::debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Make sure `images/` exists even when no image gets written.
    pub fn ensure_image_dir(&self) -> Result<PathBuf> {
        self.ensure_dir(IMAGE_DIR)
    }

    fn ensure_dir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.root.join(name);
        fs::create_dir_all(&dir).map_err(|source| Error::WriteFailure {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }
}
