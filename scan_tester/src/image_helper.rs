use image::{ImageEncoder, RgbaImage};
use std::io::BufWriter;
use std::path::Path;

/// Writes an RGBA image as PNG.
pub fn save(path: &Path, image: &RgbaImage) -> Result<(), image::ImageError> {
    let output = BufWriter::new(std::fs::File::create(path)?);
    let encoder = image::codecs::png::PngEncoder::new(output);

    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;

    Ok(())
}

/// Darkens every pixel so that trace layers drawn on top stand out.
pub fn dim(image: &mut RgbaImage, factor: f32) {
    for pixel in image.pixels_mut() {
        for channel in &mut pixel.0[..3] {
            *channel = (*channel as f32 * factor).round().clamp(0.0, 255.0) as u8;
        }
    }
}
