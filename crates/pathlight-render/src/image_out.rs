use crate::accumulation::AccumulationState;
use image::{ImageError, ImageFormat, Rgb, Rgb32FImage, RgbImage};
use std::io::Cursor;
use std::path::Path;

pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, ImageError> {
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, ImageFormat::Png)?;
    Ok(bytes.into_inner())
}

pub fn write_png(path: &Path, image: &RgbImage) -> Result<(), ImageError> {
    std::fs::write(path, encode_png(image)?)?;
    Ok(())
}

/// Mean HDR radiance per pixel, before tone mapping.
pub fn hdr_image(state: &AccumulationState) -> Rgb32FImage {
    let viewport = state.viewport();
    Rgb32FImage::from_fn(viewport.width, viewport.height, |x, y| {
        Rgb(state.average_at(x, y).to_array())
    })
}

/// Encode the averaged radiance in `format`, normally [`ImageFormat::OpenExr`].
pub fn encode_hdr(state: &AccumulationState, format: ImageFormat) -> Result<Vec<u8>, ImageError> {
    let mut bytes = Cursor::new(Vec::new());
    hdr_image(state).write_to(&mut bytes, format)?;
    Ok(bytes.into_inner())
}

/// Write the averaged radiance; the format follows the extension, e.g. `.exr`.
pub fn write_hdr(path: &Path, state: &AccumulationState) -> Result<(), ImageError> {
    let format = ImageFormat::from_path(path)?;
    std::fs::write(path, encode_hdr(state, format)?)?;
    Ok(())
}
