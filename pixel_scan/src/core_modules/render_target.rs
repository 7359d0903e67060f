// THEORY:
// A render target is wherever trace layers end up being shown. The recorder never
// knows what that is; it hands over the packed pixels of every dirty layer and then
// asks the target to present.
//
// `ImageRenderTarget` keeps one `image::RgbaImage` per layer in memory and can
// flatten them into a single image. Clones share the same frames, so a caller can
// keep a handle while the recorder owns a boxed clone.

use crate::core_modules::trace_layer::LayerId;
use image::RgbaImage;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use tracing::warn;

pub trait RenderTarget {
    /// Replaces the stored content of a layer with `pixels` (packed RGBA words).
    fn write_layer(&mut self, id: &LayerId, width: u32, height: u32, pixels: &[u32]);

    /// Forgets a layer that the recorder released.
    fn remove_layer(&mut self, _id: &LayerId) {}

    /// Makes written content visible; `None` presents every layer.
    fn present(&mut self, id: Option<&LayerId>);
}

#[derive(Debug, Clone, Default)]
pub struct ImageRenderTarget {
    frames: Rc<RefCell<BTreeMap<LayerId, RgbaImage>>>,
    presents: Rc<Cell<usize>>,
}

impl ImageRenderTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer_image(&self, id: &LayerId) -> Option<RgbaImage> {
        self.frames.borrow().get(id).cloned()
    }

    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.frames.borrow().keys().cloned().collect()
    }

    /// How many times the recorder presented.
    pub fn presents(&self) -> usize {
        self.presents.get()
    }

    /// All layers blended over each other in id order, on a transparent canvas.
    pub fn composite(&self, width: u32, height: u32) -> RgbaImage {
        let mut canvas = RgbaImage::new(width, height);
        for frame in self.frames.borrow().values() {
            image::imageops::overlay(&mut canvas, frame, 0, 0);
        }
        canvas
    }
}

impl RenderTarget for ImageRenderTarget {
    fn write_layer(&mut self, id: &LayerId, width: u32, height: u32, pixels: &[u32]) {
        let raw: Vec<u8> = pixels.iter().flat_map(|word| word.to_le_bytes()).collect();
        match RgbaImage::from_raw(width, height, raw) {
            Some(frame) => {
                self.frames.borrow_mut().insert(id.clone(), frame);
            }
            None => warn!(layer = %id, width, height, "layer size does not match its pixels"),
        }
    }

    fn remove_layer(&mut self, id: &LayerId) {
        self.frames.borrow_mut().remove(id);
    }

    fn present(&mut self, _id: Option<&LayerId>) {
        self.presents.set(self.presents.get() + 1);
    }
}
