//! Image decoding for texture and cubemap loading.
//!
//! The renderer consumes decoded RGBA8 pixels, never raw files. Decoding is
//! blocking and happens at level-load time, outside the frame loop.

use std::path::{Path, PathBuf};

/// Number of faces in a cubemap, in `+X, -X, +Y, -Y, +Z, -Z` order.
pub const CUBEMAP_FACES: usize = 6;

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("cubemap face {face} is {got_width}x{got_height}, expected {expected}x{expected}")]
    FaceMismatch {
        face: usize,
        expected: u32,
        got_width: u32,
        got_height: u32,
    },
}

/// Tightly packed RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl DecodedImage {
    /// Bytes per row of tightly packed RGBA8.
    pub fn row_bytes(&self) -> u32 {
        4 * self.width
    }
}

/// Turns a file into RGBA8 pixels.
pub trait ImageDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, AssetError>;
}

/// Decoder backed by the `image` crate. Format is guessed from the file contents.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageFileDecoder;

impl ImageDecoder for ImageFileDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, AssetError> {
        if !path.exists() {
            return Err(AssetError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )));
        }
        let img = image::ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|source| AssetError::Decode {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        let (width, height) = img.dimensions();
        tracing::debug!("decoded {} ({width}x{height})", path.display());
        Ok(DecodedImage {
            width,
            height,
            rgba: img.into_raw(),
        })
    }
}

/// Six decoded cubemap faces sharing one square size.
#[derive(Debug, Clone)]
pub struct CubemapFaces {
    pub size: u32,
    pub faces: Vec<DecodedImage>,
}

/// Decode the six faces of a cubemap.
///
/// The face count is checked before any file is read.
pub fn load_cubemap_faces<P: AsRef<Path>>(
    decoder: &dyn ImageDecoder,
    paths: &[P],
) -> Result<CubemapFaces, AssetError> {
    if paths.len() != CUBEMAP_FACES {
        return Err(AssetError::InvalidArgument(format!(
            "cubemap needs exactly {CUBEMAP_FACES} face paths, got {}",
            paths.len()
        )));
    }

    let mut faces = Vec::with_capacity(CUBEMAP_FACES);
    for path in paths {
        faces.push(decoder.decode(path.as_ref())?);
    }

    let size = faces[0].width;
    for (face, img) in faces.iter().enumerate() {
        if img.width != size || img.height != size {
            return Err(AssetError::FaceMismatch {
                face,
                expected: size,
                got_width: img.width,
                got_height: img.height,
            });
        }
    }
    Ok(CubemapFaces { size, faces })
}
