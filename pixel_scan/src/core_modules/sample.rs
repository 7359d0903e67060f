// THEORY:
// A `PixelSample` is an immutable reading of one pixel. It is the "dumb" data
// object of the engine: views create one per access, hand it out, and never touch
// it again. Samples come in two shapes, matching the two buffer modes:
// - `Color`: the four RGBA channels of a color buffer.
// - `Gray`: a single intensity of a buffer that was converted (or supplied) as
//   per-pixel luminance.
//
// Derived properties (HSV and luminance) are not free, so they are computed on
// first access and memoized in `OnceCell`s. A sample also remembers the background
// color of the view that produced it, since alpha compositing needs it.

use crate::core_modules::color_math::{self, Channel, Hsv, Hue, Luminance, Rgb, Rgba};
use std::cell::OnceCell;

/// The raw reading behind a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    Color(Rgba),
    Gray(Channel),
}

/// An immutable color or intensity reading at one pixel.
#[derive(Debug, Clone)]
pub struct PixelSample {
    kind: SampleKind,
    background: Rgb,
    hsv: OnceCell<Hsv>,
    luminance: OnceCell<Luminance>,
}

impl PartialEq for PixelSample {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.background == other.background
    }
}

impl PixelSample {
    pub fn color(color: Rgba, background: Rgb) -> Self {
        Self {
            kind: SampleKind::Color(color),
            background,
            hsv: OnceCell::new(),
            luminance: OnceCell::new(),
        }
    }

    pub fn gray(value: Channel) -> Self {
        Self {
            kind: SampleKind::Gray(value),
            background: Rgb::default(),
            hsv: OnceCell::new(),
            luminance: OnceCell::new(),
        }
    }

    pub fn kind(&self) -> SampleKind {
        self.kind
    }

    pub fn is_gray(&self) -> bool {
        matches!(self.kind, SampleKind::Gray(_))
    }

    pub fn red(&self) -> Option<Channel> {
        match self.kind {
            SampleKind::Color(c) => Some(c.red),
            SampleKind::Gray(_) => None,
        }
    }

    pub fn green(&self) -> Option<Channel> {
        match self.kind {
            SampleKind::Color(c) => Some(c.green),
            SampleKind::Gray(_) => None,
        }
    }

    pub fn blue(&self) -> Option<Channel> {
        match self.kind {
            SampleKind::Color(c) => Some(c.blue),
            SampleKind::Gray(_) => None,
        }
    }

    /// Gray samples are always opaque.
    pub fn alpha(&self) -> Channel {
        match self.kind {
            SampleKind::Color(c) => c.alpha,
            SampleKind::Gray(_) => 255,
        }
    }

    /// The scalar intensity of a gray sample.
    pub fn gray_value(&self) -> Option<Channel> {
        match self.kind {
            SampleKind::Gray(v) => Some(v),
            SampleKind::Color(_) => None,
        }
    }

    /// HSV of the color composited over the background. `None` for gray samples.
    pub fn hsv(&self) -> Option<Hsv> {
        match self.kind {
            SampleKind::Color(c) => Some(
                *self
                    .hsv
                    .get_or_init(|| color_math::rgb_to_hsv(color_math::composite(c, self.background))),
            ),
            SampleKind::Gray(_) => None,
        }
    }

    pub fn hue(&self) -> Option<Hue> {
        self.hsv().and_then(|hsv| hsv.hue)
    }

    pub fn saturation(&self) -> Option<f64> {
        self.hsv().map(|hsv| hsv.saturation)
    }

    pub fn value(&self) -> Option<f64> {
        self.hsv().map(|hsv| hsv.value)
    }

    /// Perceived luminance. A gray sample already is one.
    pub fn luminance(&self) -> Luminance {
        match self.kind {
            SampleKind::Gray(v) => v,
            SampleKind::Color(c) => *self
                .luminance
                .get_or_init(|| color_math::perceived_luminance(c, self.background)),
        }
    }

    /// The sample as a drawable color; gray samples expand to opaque gray.
    pub fn to_rgba(&self) -> Rgba {
        match self.kind {
            SampleKind::Color(c) => c,
            SampleKind::Gray(v) => Rgba::gray(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_sample_has_no_color_properties() {
        let sample = PixelSample::gray(42);
        assert_eq!(sample.red(), None);
        assert_eq!(sample.hue(), None);
        assert_eq!(sample.saturation(), None);
        assert_eq!(sample.alpha(), 255);
        assert_eq!(sample.luminance(), 42);
        assert_eq!(sample.to_rgba(), Rgba::gray(42));
    }

    #[test]
    fn color_sample_derives_and_memoizes() {
        let sample = PixelSample::color(Rgba::opaque(0, 255, 0), Rgb::WHITE);
        assert_eq!(sample.hue(), Some(120.0));
        assert_eq!(sample.hue(), Some(120.0));
        assert_eq!(sample.saturation(), Some(1.0));
        assert_eq!(sample.green(), Some(255));
        assert!(sample.hsv.get().is_some());
        assert!(sample.luminance.get().is_none());
        let _ = sample.luminance();
        assert!(sample.luminance.get().is_some());
    }

    #[test]
    fn translucent_sample_is_composited_for_derived_values() {
        // Half-transparent black over white reads as mid gray.
        let sample = PixelSample::color(Rgba::new(0, 0, 0, 128), Rgb::WHITE);
        assert_eq!(sample.luminance(), 127);
        assert_eq!(sample.hue(), None);
    }
}
