// THEORY (Color Math):
// The `color_math` module is the leaf of the whole engine. Every other module that
// needs to reason about color (samples, the grayscale conversion, the tolerance
// matcher) calls into these pure functions. Nothing here holds state.
//
// What lives here:
// - Alpha compositing: the standard "over" operator of an RGBA foreground onto an
//   opaque RGB background, rounded to integer channels.
// - HSV: hue (degrees), saturation and value (0..1) from RGB.
// - HSP: HSV hue/saturation plus perceived brightness on normalized channels.
// - Perceived luminance: Rec. 709 weighted root-mean-square of the channels, after
//   compositing the foreground against the background.
//
// The background color is always an explicit argument. Views carry it in their
// `ViewConfig` and hand it to every sample they create.

pub type Channel = u8;
pub type Hue = f64;
pub type Saturation = f64;
pub type Value = f64;
pub type Brightness = f64;
pub type Luminance = u8;

// Rec. 709 (sRGB) luma coefficients.
const LUMA_RED: f64 = 0.2126;
const LUMA_GREEN: f64 = 0.7152;
const LUMA_BLUE: f64 = 0.0722;

/// An opaque color, used as the compositing background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub red: Channel,
    pub green: Channel,
    pub blue: Channel,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(red: Channel, green: Channel, blue: Channel) -> Self {
        Self { red, green, blue }
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Rgb::WHITE
    }
}

/// A color with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba {
    pub red: Channel,
    pub green: Channel,
    pub blue: Channel,
    pub alpha: Channel,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    pub const fn opaque(red: Channel, green: Channel, blue: Channel) -> Self {
        Self::new(red, green, blue, 255)
    }

    pub const fn gray(value: Channel) -> Self {
        Self::new(value, value, value, 255)
    }

    /// Packs into a single word laid out as RGBA bytes in little-endian memory:
    /// `alpha << 24 | blue << 16 | green << 8 | red`.
    pub fn packed(&self) -> u32 {
        u32::from_le_bytes([self.red, self.green, self.blue, self.alpha])
    }

    pub fn from_packed(word: u32) -> Self {
        let [red, green, blue, alpha] = word.to_le_bytes();
        Self::new(red, green, blue, alpha)
    }

    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.red, self.green, self.blue)
    }
}

/// Hue (degrees, `None` when achromatic), saturation and value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub hue: Option<Hue>,
    pub saturation: Saturation,
    pub value: Value,
}

/// Hue and saturation as in HSV, with perceived brightness in place of value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsp {
    pub hue: Option<Hue>,
    pub saturation: Saturation,
    pub brightness: Brightness,
}

/// Rounds half up, the way integer pixel math expects for non-negative values.
#[inline]
pub fn round(value: f64) -> f64 {
    (value + 0.5).floor()
}

#[inline]
fn composite_channel(foreground: Channel, alpha: Channel, background: Channel) -> Channel {
    let alpha = alpha as f64;
    let mixed = (foreground as f64 * alpha + background as f64 * (255.0 - alpha)) / 255.0;
    round(mixed) as Channel
}

/// Alpha-composites `foreground` over the opaque `background` ("over" operator).
pub fn composite(foreground: Rgba, background: Rgb) -> Rgb {
    Rgb {
        red: composite_channel(foreground.red, foreground.alpha, background.red),
        green: composite_channel(foreground.green, foreground.alpha, background.green),
        blue: composite_channel(foreground.blue, foreground.alpha, background.blue),
    }
}

/// Converts an opaque color to HSV.
///
/// - value = max channel / 255
/// - saturation = (max - min) / max, or 0 for black
/// - hue follows the 60° sector formula and is `None` when max == min
pub fn rgb_to_hsv(color: Rgb) -> Hsv {
    let red = color.red as f64 / 255.0;
    let green = color.green as f64 / 255.0;
    let blue = color.blue as f64 / 255.0;

    let maximum_channel = red.max(green.max(blue));
    let minimum_channel = red.min(green.min(blue));
    let chroma = maximum_channel - minimum_channel;

    let saturation = if maximum_channel <= 0.0 {
        0.0
    } else {
        chroma / maximum_channel
    };

    if chroma <= 0.0 {
        return Hsv {
            hue: None,
            saturation,
            value: maximum_channel,
        };
    }

    let (base_difference, sector_offset) = if maximum_channel == red {
        (green - blue, 0.0)
    } else if maximum_channel == green {
        (blue - red, 2.0)
    } else {
        (red - green, 4.0)
    };

    let mut hue_degrees = (base_difference / chroma + sector_offset) * 60.0;
    if hue_degrees < 0.0 {
        hue_degrees += 360.0;
    }

    Hsv {
        hue: Some(hue_degrees),
        saturation,
        value: maximum_channel,
    }
}

/// Weighted root-mean-square of the channels, in the channels' own scale.
pub fn rgb_luminance(red: f64, green: f64, blue: f64) -> f64 {
    (LUMA_RED * red * red + LUMA_GREEN * green * green + LUMA_BLUE * blue * blue).sqrt()
}

/// HSP model: HSV hue and saturation with perceived brightness on 0..1 channels.
pub fn rgb_to_hsp(color: Rgb) -> Hsp {
    let hsv = rgb_to_hsv(color);
    Hsp {
        hue: hsv.hue,
        saturation: hsv.saturation,
        brightness: rgb_luminance(
            color.red as f64 / 255.0,
            color.green as f64 / 255.0,
            color.blue as f64 / 255.0,
        ),
    }
}

/// Perceived luminance (0..255) of `foreground` as seen over `background`.
pub fn perceived_luminance(foreground: Rgba, background: Rgb) -> Luminance {
    let seen = match foreground.alpha {
        255 => foreground.rgb(),
        0 => background,
        _ => composite(foreground, background),
    };

    // White would otherwise round to 255 only by luck of the coefficients.
    if seen == Rgb::WHITE {
        return Luminance::MAX;
    }

    round(rgb_luminance(seen.red as f64, seen.green as f64, seen.blue as f64)) as Luminance
}


// -----------------------------------------------------------------------------
// Glossary: Color Terms
//
// - Compositing ("over"): c = round((fg·a + bg·(255 − a)) / 255) per channel.
//
// - Hue: angle on the color wheel (0°–360°). Undefined for achromatic colors.
//
// - Saturation (HSV): chroma / value. Zero for grays and black.
//
// - Value (HSV): max(R, G, B) / 255.
//
// - Perceived luminance: sqrt(0.2126·R² + 0.7152·G² + 0.0722·B²), on 0..255.
//
// - HSP brightness: the same weighted root-mean-square on 0..1 channels.
// -----------------------------------------------------------------------------
