// THEORY:
// The `buffer` module owns the raw pixels every view reads from. A `PixelSource` is
// the tagged input handed over by whoever acquired the image (a decoder, a canvas
// grab, a test fixture); a `PixelBuffer` is the validated, row-major store built
// from it.
//
// Two channel modes exist:
// 1.  **Rgba**: four bytes per pixel, byte index = (y * width + x) * 4.
// 2.  **Gray**: one byte per pixel, index = y * width + x.
//
// The only mutation a buffer ever sees is the one-way conversion from Rgba to
// Gray, which replaces every pixel by its perceived luminance.

use crate::core_modules::color_math::{self, Channel, Rgb, Rgba};
use crate::core_modules::sample::PixelSample;
use crate::error::ViewError;

const RGBA_CHANNELS: usize = 4;

/// The pixel data a view is constructed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PixelSource {
    /// A raw RGBA buffer, four bytes per pixel.
    Rgba {
        width: u32,
        height: u32,
        data: Vec<Channel>,
    },
    /// Precomputed single-channel samples, one byte per pixel.
    Gray {
        width: u32,
        height: u32,
        data: Vec<Channel>,
    },
}

impl PixelSource {
    pub fn width(&self) -> u32 {
        match self {
            PixelSource::Rgba { width, .. } | PixelSource::Gray { width, .. } => *width,
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            PixelSource::Rgba { height, .. } | PixelSource::Gray { height, .. } => *height,
        }
    }
}

impl From<&image::RgbaImage> for PixelSource {
    fn from(img: &image::RgbaImage) -> Self {
        PixelSource::Rgba {
            width: img.width(),
            height: img.height(),
            data: img.as_raw().clone(),
        }
    }
}

impl From<&image::GrayImage> for PixelSource {
    fn from(img: &image::GrayImage) -> Self {
        PixelSource::Gray {
            width: img.width(),
            height: img.height(),
            data: img.as_raw().clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    Rgba,
    Gray,
}

/// A validated, row-major pixel store.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    mode: ChannelMode,
    data: Vec<Channel>,
}

impl PixelBuffer {
    pub fn new(source: PixelSource) -> Result<Self, ViewError> {
        let (width, height, mode, data) = match source {
            PixelSource::Rgba {
                width,
                height,
                data,
            } => (width, height, ChannelMode::Rgba, data),
            PixelSource::Gray {
                width,
                height,
                data,
            } => (width, height, ChannelMode::Gray, data),
        };

        if width == 0 || height == 0 {
            return Err(ViewError::InvalidDimensions {
                width: width as i64,
                height: height as i64,
            });
        }

        let channels = match mode {
            ChannelMode::Rgba => RGBA_CHANNELS,
            ChannelMode::Gray => 1,
        };
        let expected = width as usize * height as usize * channels;
        if data.len() != expected {
            return Err(ViewError::SampleCountMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            mode,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mode(&self) -> ChannelMode {
        self.mode
    }

    pub fn is_gray(&self) -> bool {
        self.mode == ChannelMode::Gray
    }

    pub fn data(&self) -> &[Channel] {
        &self.data
    }

    /// Reads the pixel at a linear pixel index. The caller guarantees the index is
    /// inside the buffer; out-of-range indices yield `None`.
    pub fn sample(&self, index: usize, background: Rgb) -> Option<PixelSample> {
        match self.mode {
            ChannelMode::Gray => self.data.get(index).map(|&v| PixelSample::gray(v)),
            ChannelMode::Rgba => {
                let start = index.checked_mul(RGBA_CHANNELS)?;
                let bytes = self.data.get(start..start + RGBA_CHANNELS)?;
                Some(PixelSample::color(
                    Rgba::new(bytes[0], bytes[1], bytes[2], bytes[3]),
                    background,
                ))
            }
        }
    }

    /// Replaces every pixel by its perceived luminance against `background`.
    /// Returns false if the buffer was already grayscale.
    pub fn to_grayscale(&mut self, background: Rgb) -> bool {
        if self.is_gray() {
            return false;
        }

        let gray: Vec<Channel> = self
            .data
            .chunks_exact(RGBA_CHANNELS)
            .map(|px| color_math::perceived_luminance(Rgba::new(px[0], px[1], px[2], px[3]), background))
            .collect();

        self.data = gray;
        self.mode = ChannelMode::Gray;
        true
    }
}
