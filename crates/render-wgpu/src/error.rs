use scenecore_assets::AssetError;
use scenecore_common::TextureHandle;

/// Errors from GPU resource creation and texture management.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("shader program '{label}' failed to compile: {log}")]
    ShaderCompile { label: String, log: String },
    #[error("render target '{label}' is incomplete: {log}")]
    IncompleteRenderTarget { label: String, log: String },
    #[error("GPU error creating '{label}': {log}")]
    Gpu { label: String, log: String },
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("image '{label}' cannot be uploaded: {reason}")]
    InvalidImage { label: String, reason: String },
    #[error("unknown texture handle {0:?}")]
    UnknownTexture(TextureHandle),
    #[error("texture {0:?} is not a cubemap")]
    NotACubemap(TextureHandle),
}

/// Run `build` inside an error scope and report whatever the device raised.
///
/// Blocks on the scope future; only called at initialization and load time.
pub(crate) fn scoped<T>(
    device: &wgpu::Device,
    filter: wgpu::ErrorFilter,
    build: impl FnOnce() -> T,
) -> Result<T, String> {
    device.push_error_scope(filter);
    let value = build();
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(err.to_string()),
        None => Ok(value),
    }
}

/// Like [`scoped`] with a validation filter, reporting failure as
/// [`RenderError::Gpu`].
pub(crate) fn gpu_scoped<T>(
    device: &wgpu::Device,
    label: &str,
    build: impl FnOnce() -> T,
) -> Result<T, RenderError> {
    scoped(device, wgpu::ErrorFilter::Validation, build).map_err(|log| {
        tracing::error!("creating '{label}' failed: {log}");
        RenderError::Gpu {
            label: label.to_string(),
            log,
        }
    })
}

/// Reject pixel data the device would refuse: empty or oversized extents
/// and buffers that do not hold exactly `width * height` RGBA texels.
pub(crate) fn check_image(
    label: &str,
    width: u32,
    height: u32,
    rgba_len: usize,
    max_dimension: u32,
) -> Result<(), RenderError> {
    let invalid = |reason: String| RenderError::InvalidImage {
        label: label.to_string(),
        reason,
    };
    if width == 0 || height == 0 {
        return Err(invalid(format!("empty extent {width}x{height}")));
    }
    if width > max_dimension || height > max_dimension {
        return Err(invalid(format!(
            "{width}x{height} exceeds the device limit of {max_dimension}"
        )));
    }
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|texels| texels.checked_mul(4));
    if expected != Some(rgba_len) {
        return Err(invalid(format!(
            "{rgba_len} bytes of pixel data for {width}x{height} RGBA"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_image_accepts_exact_rgba() {
        assert!(check_image("t", 4, 2, 32, 8192).is_ok());
        assert!(check_image("t", 8192, 1, 8192 * 4, 8192).is_ok());
    }

    #[test]
    fn check_image_rejects_oversized_extent() {
        let err = check_image("big", 16384, 16384, 16384 * 16384 * 4, 8192).unwrap_err();
        assert!(matches!(err, RenderError::InvalidImage { label, .. } if label == "big"));
    }

    #[test]
    fn check_image_rejects_empty_extent() {
        assert!(check_image("t", 0, 4, 0, 8192).is_err());
        assert!(check_image("t", 4, 0, 0, 8192).is_err());
    }

    #[test]
    fn check_image_rejects_short_or_long_buffers() {
        assert!(check_image("t", 2, 2, 15, 8192).is_err());
        assert!(check_image("t", 2, 2, 17, 8192).is_err());
        assert!(check_image("t", 2, 2, 12, 8192).is_err());
    }
}
