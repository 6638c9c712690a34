//! Square speaker thumbnails cut from the portraits named in the data file.

use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use image::{imageops::FilterType, DynamicImage, ImageError, ImageFormat};
use thiserror::Error;
use tokio::task::JoinError;
use tracing::debug;

pub const DEFAULT_SIZE: u32 = 55;
pub const MAX_SIZE: u32 = 500;

/// Served for speakers without a portrait.
pub const SILHOUETTE: &str = "/static/images/silhouette_unknown.png";

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to resize photo: {0}")]
    Image(#[from] ImageError),

    #[error("photo task failed: {0}")]
    Task(#[from] JoinError),
}

/// Crops `data` to its centered square and scales it to `size` pixels,
/// encoded as JPEG.
pub fn thumbnail(data: &[u8], size: u32) -> Result<Vec<u8>, ImageError> {
    let image = image::load_from_memory(data)?;
    let square = image.resize_to_fill(size, size, FilterType::Lanczos3);

    let mut jpeg = Vec::new();
    DynamicImage::ImageRgb8(square.to_rgb8()).write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)?;
    Ok(jpeg)
}

/// Reads the portrait at `path`; a size of zero serves it unchanged.
pub fn load(path: &Path, size: u32) -> Result<Vec<u8>, PhotoError> {
    let data = fs::read(path).map_err(|source| PhotoError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if size == 0 {
        return Ok(data);
    }

    debug!(path = %path.display(), size, "Resizing photo");
    Ok(thumbnail(&data, size)?)
}
