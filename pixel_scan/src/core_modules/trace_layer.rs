// THEORY:
// A trace layer is a transparent sheet the size of the root buffer. The recorder
// draws one pixel per move onto the active layer; layers are composited over each
// other by whatever render target displays them.
//
// Pixels are stored as packed little-endian words, `a<<24 | b<<16 | g<<8 | r`, so
// the byte view of the buffer is plain RGBA.

use crate::core_modules::color_math::Rgba;
use crate::error::TraceError;
use std::fmt;

/// Names a trace layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(String);

impl LayerId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The layer every recorder starts drawing on.
impl Default for LayerId {
    fn default() -> Self {
        Self::new("base")
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for LayerId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<u32> for LayerId {
    fn from(number: u32) -> Self {
        Self(number.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct TraceLayer {
    id: LayerId,
    width: u32,
    height: u32,
    pixels: Vec<u32>,
    dirty: bool,
}

impl TraceLayer {
    pub fn new(id: LayerId, width: u32, height: u32) -> Result<Self, TraceError> {
        if width == 0 || height == 0 {
            return Err(TraceError::InvalidDimensions { width, height });
        }
        Ok(Self::blank(id, width, height))
    }

    /// Callers guarantee non-zero dimensions.
    pub(crate) fn blank(id: LayerId, width: u32, height: u32) -> Self {
        Self {
            id,
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
            dirty: false,
        }
    }

    pub fn id(&self) -> &LayerId {
        &self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Writes one pixel at a linear index. Returns false (and leaves the layer
    /// untouched) when the index is outside the layer.
    pub fn draw(&mut self, index: usize, color: Rgba) -> bool {
        match self.pixels.get_mut(index) {
            Some(word) => {
                *word = color.packed();
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    pub fn pixel(&self, index: usize) -> Option<Rgba> {
        self.pixels.get(index).copied().map(Rgba::from_packed)
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Indices of every pixel that has been drawn with a non-transparent color.
    pub fn painted(&self) -> impl Iterator<Item = usize> + '_ {
        self.pixels
            .iter()
            .enumerate()
            .filter(|(_, word)| **word != 0)
            .map(|(i, _)| i)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_red_in_the_low_byte() {
        let mut layer = TraceLayer::new(LayerId::default(), 2, 2).expect("non-zero");
        assert!(!layer.is_dirty());
        assert!(layer.draw(3, Rgba::new(0x11, 0x22, 0x33, 0x44)));
        assert_eq!(layer.pixels()[3], 0x4433_2211);
        assert_eq!(layer.pixel(3), Some(Rgba::new(0x11, 0x22, 0x33, 0x44)));
        assert!(layer.is_dirty());
        assert_eq!(layer.painted().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn out_of_range_draw_is_ignored() {
        let mut layer = TraceLayer::new(LayerId::from(7), 2, 1).expect("non-zero");
        assert!(!layer.draw(2, Rgba::opaque(1, 2, 3)));
        assert!(!layer.is_dirty());
        assert_eq!(layer.id().as_str(), "7");
    }

    #[test]
    fn zero_sized_layer_is_rejected() {
        assert_eq!(
            TraceLayer::new(LayerId::default(), 0, 3).err(),
            Some(TraceError::InvalidDimensions { width: 0, height: 3 })
        );
    }
}
