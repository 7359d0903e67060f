// THEORY:
// The `PixelView` is the central object of the engine: a cursor that lives inside a
// rectangular window onto a pixel buffer. Everything else in the crate either feeds
// it (the buffer), reads through it (the tolerance matcher), or listens to it (the
// trace recorder).
//
// Key architectural principles:
// 1.  **Nesting**: A view is either a root over a buffer, or a sub-region of another
//     view. All views of one tree share the same buffer handle. A child does not own
//     its parent; it keeps a reference to the parent's immutable `Frame` (its bounds
//     and its own parent), which is all it needs to translate coordinates.
// 2.  **Local coordinates**: The cursor is always expressed in the view's own
//     coordinates, [0, width) x [0, height). Absolute coordinates are resolved by
//     walking the frame chain once and memoizing the accumulated offset per depth.
// 3.  **Status, not errors**: A move outside the view does not fail loudly. It
//     flips the `ok` flag, which scan loops consult to stop. Only real precondition
//     violations (popping empty stacks, bad construction input) return `Err`.
// 4.  **Events**: Every successful move (unless suppressed), every scan bracket and
//     every named-state change is published to subscribers, synchronously.
//
// Scanning lives in the sibling `scan` module, built purely on the public API here.

use crate::config::ViewConfig;
use crate::core_modules::buffer::{PixelBuffer, PixelSource};
use crate::core_modules::events::{EventKind, MovePosition, SubscriptionId, Subscribers, ViewEvent};
use crate::core_modules::rect::Rect;
use crate::core_modules::sample::PixelSample;
use crate::error::ViewError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, trace};

/// The immutable shape of a view: its bounds in parent coordinates and its parent.
#[derive(Debug)]
struct Frame {
    bounds: Rect,
    parent: Option<Rc<Frame>>,
}

/// Accumulated offset of a view relative to one of its ancestors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset {
    pub left: i32,
    pub top: i32,
    /// Width of the coordinate space the offset is expressed in, for index math.
    pub width: u32,
}

/// A resolved absolute position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbsolutePosition {
    pub x: i32,
    pub y: i32,
    pub index: usize,
}

/// Controls the side effects of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOptions {
    /// Re-read the sample under the cursor right away.
    pub refresh_sample: bool,
    /// Publish a move event.
    pub publish: bool,
}

impl Default for MoveOptions {
    fn default() -> Self {
        Self {
            refresh_sample: true,
            publish: true,
        }
    }
}

impl MoveOptions {
    pub fn quiet() -> Self {
        Self {
            refresh_sample: true,
            publish: false,
        }
    }
}

/// A bounded, possibly nested cursor over a pixel buffer.
#[derive(Debug)]
pub struct PixelView {
    buffer: Rc<RefCell<PixelBuffer>>,
    frame: Rc<Frame>,
    depth: usize,
    config: ViewConfig,

    cursor: Option<(i32, i32)>,
    current: Option<PixelSample>,
    ok: bool,

    offsets: RefCell<HashMap<usize, Offset>>,
    positions: Vec<Option<(i32, i32)>>,
    states: Vec<String>,
    subscribers: Subscribers,
}

impl PixelView {
    /// A root view covering the whole source.
    pub fn new(source: PixelSource, config: ViewConfig) -> Result<Self, ViewError> {
        let buffer = PixelBuffer::new(source)?;
        let bounds = Rect::full(buffer.width(), buffer.height());
        Ok(Self::from_parts(Rc::new(RefCell::new(buffer)), bounds, None, 0, config))
    }

    /// A root view restricted to `bounds`, given in buffer coordinates.
    pub fn with_bounds(source: PixelSource, bounds: Rect, config: ViewConfig) -> Result<Self, ViewError> {
        let buffer = PixelBuffer::new(source)?;
        let full = Rect::full(buffer.width(), buffer.height());
        if !full.contains_local(&bounds) {
            return Err(Self::out_of_parent(&bounds, &full));
        }
        Ok(Self::from_parts(Rc::new(RefCell::new(buffer)), bounds, None, 0, config))
    }

    fn from_parts(
        buffer: Rc<RefCell<PixelBuffer>>,
        bounds: Rect,
        parent: Option<Rc<Frame>>,
        depth: usize,
        config: ViewConfig,
    ) -> Self {
        Self {
            buffer,
            frame: Rc::new(Frame { bounds, parent }),
            depth,
            config,
            cursor: None,
            current: None,
            ok: true,
            offsets: RefCell::new(HashMap::new()),
            positions: Vec::new(),
            states: Vec::new(),
            subscribers: Subscribers::default(),
        }
    }

    fn out_of_parent(bounds: &Rect, parent: &Rect) -> ViewError {
        ViewError::OutOfParent {
            left: bounds.left,
            top: bounds.top,
            right: bounds.right,
            bottom: bounds.bottom,
            parent_width: parent.width,
            parent_height: parent.height,
        }
    }

    // --- Shape ---

    pub fn width(&self) -> u32 {
        self.frame.bounds.width
    }

    pub fn height(&self) -> u32 {
        self.frame.bounds.height
    }

    /// Bounds relative to the parent view (or the buffer, for a root).
    pub fn bounds(&self) -> Rect {
        self.frame.bounds
    }

    /// Number of views above this one.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn root_width(&self) -> u32 {
        self.buffer.borrow().width()
    }

    pub fn root_height(&self) -> u32 {
        self.buffer.borrow().height()
    }

    pub fn is_gray(&self) -> bool {
        self.buffer.borrow().is_gray()
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width() as i32 && y < self.height() as i32
    }

    // --- Sub-views ---

    /// Derives a child view from an origin and extents in this view's coordinates.
    pub fn sub_xywh(&self, x: i32, y: i32, w: i32, h: i32) -> Result<PixelView, ViewError> {
        self.sub_rect(Rect::from_xywh(x, y, w, h)?)
    }

    /// Derives a child view from two opposite corners in this view's coordinates.
    pub fn sub_corners(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> Result<PixelView, ViewError> {
        self.sub_rect(Rect::from_corners(x0, y0, x1, y1)?)
    }

    pub fn sub_rect(&self, bounds: Rect) -> Result<PixelView, ViewError> {
        if !self.frame.bounds.contains_local(&bounds) {
            return Err(Self::out_of_parent(&bounds, &self.frame.bounds));
        }
        debug!(depth = self.depth + 1, ?bounds, "derived sub-view");
        Ok(Self::from_parts(
            Rc::clone(&self.buffer),
            bounds,
            Some(Rc::clone(&self.frame)),
            self.depth + 1,
            self.config,
        ))
    }

    // --- Offsets and absolute coordinates ---

    /// Offset of this view relative to the coordinate space `levels` frames up.
    /// `levels == 1` gives the bounds relative to the direct parent; anything at or
    /// beyond the depth of the tree resolves to buffer coordinates.
    pub fn relative_offset(&self, levels: usize) -> Offset {
        let levels = levels.clamp(1, self.depth + 1);
        if let Some(offset) = self.offsets.borrow().get(&levels) {
            return *offset;
        }

        let mut frame = &self.frame;
        let mut left = frame.bounds.left;
        let mut top = frame.bounds.top;
        let mut walked = 1;
        while walked < levels {
            match &frame.parent {
                Some(parent) => {
                    frame = parent;
                    left += frame.bounds.left;
                    top += frame.bounds.top;
                    walked += 1;
                }
                None => break,
            }
        }
        let width = match &frame.parent {
            Some(parent) => parent.bounds.width,
            None => self.root_width(),
        };

        let offset = Offset { left, top, width };
        self.offsets.borrow_mut().insert(levels, offset);
        offset
    }

    pub fn absolute_offset(&self) -> Offset {
        self.relative_offset(usize::MAX)
    }

    /// Buffer coordinates of a local point. Saturates far outside the buffer.
    pub fn absolute_xy(&self, x: i32, y: i32) -> (i32, i32) {
        let offset = self.absolute_offset();
        (offset.left.saturating_add(x), offset.top.saturating_add(y))
    }

    /// Linear buffer pixel index of a local point, or `None` outside the view.
    pub fn absolute_index(&self, x: i32, y: i32) -> Option<usize> {
        self.in_bounds(x, y).then(|| self.buffer_index(x, y))
    }

    fn buffer_index(&self, x: i32, y: i32) -> usize {
        let (ax, ay) = self.absolute_xy(x, y);
        ay as usize * self.absolute_offset().width as usize + ax as usize
    }

    /// Absolute position of the cursor, if set.
    pub fn absolute_position(&self) -> Option<AbsolutePosition> {
        let (x, y) = self.cursor?;
        let (abs_x, abs_y) = self.absolute_xy(x, y);
        Some(AbsolutePosition {
            x: abs_x,
            y: abs_y,
            index: self.buffer_index(x, y),
        })
    }

    // --- Sampling ---

    /// The sample at a point in this view's coordinates, or `None` outside it.
    pub fn sample_at(&self, x: i32, y: i32) -> Option<PixelSample> {
        if !self.in_bounds(x, y) {
            return None;
        }
        if self.cursor == Some((x, y)) {
            if let Some(current) = self.cached_current() {
                return Some(current.clone());
            }
        }
        let index = self.buffer_index(x, y);
        self.buffer.borrow().sample(index, self.config.background)
    }

    /// The sample at an offset from the cursor. `None` outside the view or while the
    /// cursor is unset.
    pub fn sample(&self, dx: i32, dy: i32) -> Option<PixelSample> {
        let (x, y) = self.cursor?;
        self.sample_at(x.checked_add(dx)?, y.checked_add(dy)?)
    }

    /// The sample under the cursor.
    pub fn current(&self) -> Option<PixelSample> {
        match self.cached_current() {
            Some(sample) => Some(sample.clone()),
            None => self.sample(0, 0),
        }
    }

    // Another view over the same buffer may have converted it to grayscale since
    // the cursor sample was cached.
    fn cached_current(&self) -> Option<&PixelSample> {
        let gray = self.is_gray();
        self.current.as_ref().filter(|sample| sample.is_gray() == gray)
    }

    pub fn hue(&self) -> Option<f64> {
        self.current().and_then(|s| s.hue())
    }

    pub fn saturation(&self) -> Option<f64> {
        self.current().and_then(|s| s.saturation())
    }

    pub fn luminance(&self) -> Option<u8> {
        self.current().map(|s| s.luminance())
    }

    fn refresh_current(&mut self) {
        self.current = None;
        self.current = self.sample(0, 0);
    }

    /// Converts the shared buffer to perceived luminance, in place and for good.
    /// Every view over the same buffer reads grayscale samples afterwards.
    pub fn to_grayscale(&mut self) -> &mut Self {
        let converted = self.buffer.borrow_mut().to_grayscale(self.config.background);
        if converted {
            debug!(
                width = self.root_width(),
                height = self.root_height(),
                "converted buffer to grayscale"
            );
        }
        if self.cursor.is_some() {
            self.refresh_current();
        }
        self
    }

    // --- Movement ---

    pub fn cursor(&self) -> Option<(i32, i32)> {
        self.cursor
    }

    /// False after a move was rejected, until the next successful move.
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn move_to(&mut self, x: i32, y: i32) -> bool {
        self.move_to_with(x, y, MoveOptions::default())
    }

    pub fn move_to_with(&mut self, x: i32, y: i32, options: MoveOptions) -> bool {
        if !self.in_bounds(x, y) {
            trace!(x, y, "move rejected: out of bounds");
            self.ok = false;
            return false;
        }

        self.ok = true;
        if self.cursor == Some((x, y)) {
            return true;
        }

        self.cursor = Some((x, y));
        self.current = None;
        if options.refresh_sample {
            self.refresh_current();
        }

        if options.publish {
            let (abs_x, abs_y) = self.absolute_xy(x, y);
            let event = ViewEvent::Move(MovePosition {
                x,
                y,
                abs_x,
                abs_y,
                abs_index: self.buffer_index(x, y),
                sample: self.current(),
            });
            self.publish(&event);
        }
        true
    }

    /// Moves relative to the cursor; fails while the cursor is unset.
    pub fn move_by(&mut self, dx: i32, dy: i32) -> bool {
        self.move_by_with(dx, dy, MoveOptions::default())
    }

    pub fn move_by_with(&mut self, dx: i32, dy: i32, options: MoveOptions) -> bool {
        match self.cursor {
            Some((x, y)) => self.move_to_with(x.saturating_add(dx), y.saturating_add(dy), options),
            None => {
                self.ok = false;
                false
            }
        }
    }

    pub fn move_top_left(&mut self) -> bool {
        self.move_to(0, 0)
    }

    pub fn move_top_right(&mut self) -> bool {
        self.move_to(self.width() as i32 - 1, 0)
    }

    pub fn move_bottom_right(&mut self) -> bool {
        self.move_to(self.width() as i32 - 1, self.height() as i32 - 1)
    }

    pub fn move_bottom_left(&mut self) -> bool {
        self.move_to(0, self.height() as i32 - 1)
    }

    // --- Position stack ---

    /// Saves the cursor.
    pub fn push(&mut self) -> &mut Self {
        self.positions.push(self.cursor);
        self
    }

    /// Restores and discards the last saved cursor.
    pub fn pop(&mut self, publish: bool) -> Result<bool, ViewError> {
        let saved = self.positions.pop().ok_or(ViewError::EmptyPositionStack)?;
        Ok(self.restore(saved, publish))
    }

    /// Restores the last saved cursor but keeps it saved.
    pub fn peek(&mut self, publish: bool) -> Result<bool, ViewError> {
        let saved = *self.positions.last().ok_or(ViewError::EmptyPositionStack)?;
        Ok(self.restore(saved, publish))
    }

    pub fn saved_positions(&self) -> usize {
        self.positions.len()
    }

    fn restore(&mut self, saved: Option<(i32, i32)>, publish: bool) -> bool {
        match saved {
            Some((x, y)) => self.move_to_with(
                x,
                y,
                MoveOptions {
                    refresh_sample: true,
                    publish,
                },
            ),
            None => {
                self.cursor = None;
                self.current = None;
                self.ok = true;
                true
            }
        }
    }

    // --- Named states ---

    pub fn enter_state(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        self.states.push(name.clone());
        self.publish(&ViewEvent::StateEnter(name));
        self
    }

    /// Leaves the `count` most recent states, newest first.
    pub fn exit_state(&mut self, count: usize) -> Result<&mut Self, ViewError> {
        if count > self.states.len() {
            return Err(ViewError::EmptyStateStack {
                requested: count,
                held: self.states.len(),
            });
        }
        for _ in 0..count {
            if let Some(name) = self.states.pop() {
                self.publish(&ViewEvent::StateExit(name));
            }
        }
        Ok(self)
    }

    pub fn exit_all_states(&mut self) -> &mut Self {
        while let Some(name) = self.states.pop() {
            self.publish(&ViewEvent::StateExit(name));
        }
        self
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    // --- Events ---

    pub fn subscribe<F>(&mut self, kinds: &[EventKind], handler: F) -> SubscriptionId
    where
        F: Fn(&ViewEvent) + 'static,
    {
        self.subscribers.subscribe(kinds, Rc::new(handler))
    }

    pub fn subscribe_all<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: Fn(&ViewEvent) + 'static,
    {
        self.subscribe(&EventKind::ALL, handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.unsubscribe(id, &EventKind::ALL);
    }

    pub fn unsubscribe_kinds(&mut self, id: SubscriptionId, kinds: &[EventKind]) {
        self.subscribers.unsubscribe(id, kinds);
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers.count(kind)
    }

    /// Delivers an event to the current subscribers of its kind, in order.
    pub fn publish(&self, event: &ViewEvent) {
        let handlers = self.subscribers.snapshot(event.kind());
        for handler in handlers {
            handler(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::color_math::Rgba;

    fn gray_ramp(width: u32, height: u32) -> PixelView {
        let data = (0..width * height).map(|i| (i * 16 % 256) as u8).collect();
        PixelView::new(PixelSource::Gray { width, height, data }, ViewConfig::default())
            .expect("valid source")
    }

    fn event_log(view: &mut PixelView) -> Rc<RefCell<Vec<ViewEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        view.subscribe_all(move |event| sink.borrow_mut().push(event.clone()));
        log
    }

    #[test]
    fn rejects_degenerate_sources() {
        let source = PixelSource::Gray {
            width: 4,
            height: 0,
            data: vec![],
        };
        assert!(PixelView::new(source, ViewConfig::default()).is_err());
    }

    #[test]
    fn cursor_starts_unset() {
        let view = gray_ramp(4, 4);
        assert_eq!(view.cursor(), None);
        assert!(view.current().is_none());
        assert!(view.sample(0, 0).is_none());
    }

    #[test]
    fn out_of_bounds_move_sets_sticky_status() {
        let mut view = gray_ramp(4, 4);
        assert!(view.move_to(1, 1));
        assert!(!view.move_to(4, 0));
        assert!(!view.is_ok());
        assert_eq!(view.cursor(), Some((1, 1)));
        assert!(!view.is_ok());
        assert!(view.move_by(1, 0));
        assert!(view.is_ok());
        assert_eq!(view.cursor(), Some((2, 1)));
    }

    #[test]
    fn move_then_sample_matches_direct_read() {
        let mut view = gray_ramp(4, 4);
        for (x, y) in [(0, 0), (3, 0), (2, 2), (3, 3)] {
            assert!(view.move_to(x, y));
            assert_eq!(view.sample(0, 0), view.sample_at(x, y));
            assert_eq!(
                view.current().and_then(|s| s.gray_value()),
                Some(((y * 4 + x) * 16) as u8)
            );
        }
        assert!(view.sample(1, 0).is_none());
    }

    #[test]
    fn corner_shortcuts() {
        let mut view = gray_ramp(5, 3);
        view.move_top_right();
        assert_eq!(view.cursor(), Some((4, 0)));
        view.move_bottom_right();
        assert_eq!(view.cursor(), Some((4, 2)));
        view.move_bottom_left();
        assert_eq!(view.cursor(), Some((0, 2)));
        view.move_top_left();
        assert_eq!(view.cursor(), Some((0, 0)));
    }

    #[test]
    fn moves_publish_unless_suppressed() {
        let mut view = gray_ramp(4, 4);
        let log = event_log(&mut view);
        view.move_to(1, 2);
        view.move_to(1, 2);
        view.move_to_with(2, 2, MoveOptions::quiet());
        view.move_to(9, 9);

        let log = log.borrow();
        assert_eq!(log.len(), 1);
        match &log[0] {
            ViewEvent::Move(pos) => {
                assert_eq!((pos.x, pos.y), (1, 2));
                assert_eq!(pos.abs_index, 9);
                assert_eq!(pos.sample.as_ref().and_then(|s| s.gray_value()), Some(144));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn position_stack_restores_without_publishing() {
        let mut view = gray_ramp(4, 4);
        view.move_to(1, 1);
        view.push();
        view.move_to(3, 3);
        let log = event_log(&mut view);

        assert_eq!(view.peek(false), Ok(true));
        assert_eq!(view.cursor(), Some((1, 1)));
        assert_eq!(view.saved_positions(), 1);

        view.move_to(2, 2);
        assert_eq!(view.pop(true), Ok(true));
        assert_eq!(view.cursor(), Some((1, 1)));
        assert_eq!(view.saved_positions(), 0);

        // One published move to (2,2) and one published restore.
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(view.pop(false), Err(ViewError::EmptyPositionStack));
        assert_eq!(view.peek(false), Err(ViewError::EmptyPositionStack));
    }

    #[test]
    fn named_states_exit_in_lifo_order() {
        let mut view = gray_ramp(2, 2);
        let log = event_log(&mut view);
        view.enter_state("outer").enter_state("inner");
        view.exit_state(2).expect("two states held");

        let names: Vec<_> = log
            .borrow()
            .iter()
            .map(|event| match event {
                ViewEvent::StateEnter(name) => format!("+{name}"),
                ViewEvent::StateExit(name) => format!("-{name}"),
                other => format!("{other:?}"),
            })
            .collect();
        assert_eq!(names, ["+outer", "+inner", "-inner", "-outer"]);
        assert!(matches!(
            view.exit_state(1),
            Err(ViewError::EmptyStateStack { requested: 1, held: 0 })
        ));
    }

    #[test]
    fn exit_all_states_drains_the_stack() {
        let mut view = gray_ramp(2, 2);
        view.enter_state("a").enter_state("b").enter_state("c");
        view.exit_all_states();
        assert!(view.states().is_empty());
    }

    #[test]
    fn sub_views_resolve_absolute_coordinates() {
        let mut root = gray_ramp(8, 8);
        let mid = root.sub_xywh(2, 1, 5, 5).expect("fits");
        let mut leaf = mid.sub_corners(3, 3, 1, 2).expect("fits");

        assert_eq!((leaf.width(), leaf.height()), (3, 2));
        assert_eq!(leaf.relative_offset(1), Offset { left: 1, top: 2, width: 5 });
        assert_eq!(leaf.absolute_offset(), Offset { left: 3, top: 3, width: 8 });
        assert_eq!(leaf.absolute_index(0, 0), Some(3 * 8 + 3));
        assert_eq!(leaf.absolute_index(-1, 0), None);
        assert_eq!(leaf.absolute_index(3, 0), None);

        assert!(leaf.move_to(2, 1));
        assert_eq!(
            leaf.absolute_position(),
            Some(AbsolutePosition { x: 5, y: 4, index: 37 })
        );
        assert!(root.move_to(5, 4));
        assert_eq!(leaf.current(), root.current());
        assert!(!leaf.move_to(3, 0));
    }

    #[test]
    fn sub_view_must_fit_parent() {
        let root = gray_ramp(4, 4);
        assert!(matches!(
            root.sub_xywh(2, 2, 3, 1),
            Err(ViewError::OutOfParent { .. })
        ));
        assert!(root.sub_xywh(3, 3, -4, -4).is_ok());
    }

    #[test]
    fn bounded_root_view() {
        let source = PixelSource::Gray {
            width: 4,
            height: 4,
            data: (0..16).collect(),
        };
        let bounds = Rect::from_xywh(1, 1, 2, 2).expect("non-zero");
        let mut view = PixelView::with_bounds(source, bounds, ViewConfig::default()).expect("fits");
        view.move_to(1, 1);
        assert_eq!(view.current().and_then(|s| s.gray_value()), Some(10));
    }

    #[test]
    fn grayscale_conversion_affects_all_views() {
        let data = [Rgba::opaque(255, 0, 0), Rgba::opaque(255, 255, 255)]
            .iter()
            .flat_map(|c| [c.red, c.green, c.blue, c.alpha])
            .collect();
        let mut root = PixelView::new(
            PixelSource::Rgba {
                width: 2,
                height: 1,
                data,
            },
            ViewConfig::default(),
        )
        .expect("valid source");
        let child = root.sub_xywh(1, 0, 1, 1).expect("fits");
        root.move_to(0, 0);
        assert_eq!(root.current().and_then(|s| s.red()), Some(255));

        root.to_grayscale();
        assert!(root.is_gray());
        assert_eq!(root.current().and_then(|s| s.gray_value()), Some(118));
        assert_eq!(child.sample_at(0, 0).and_then(|s| s.gray_value()), Some(255));
        assert_eq!(root.hue(), None);
    }

    #[test]
    fn grayscale_conversion_reaches_a_child_cursor_sample() {
        let data = vec![255, 0, 0, 255, 0, 0, 255, 255];
        let mut root = PixelView::new(
            PixelSource::Rgba {
                width: 2,
                height: 1,
                data,
            },
            ViewConfig::default(),
        )
        .expect("valid source");
        let mut child = root.sub_xywh(0, 0, 2, 1).expect("fits");
        child.move_to(0, 0);
        assert_eq!(child.current().and_then(|s| s.red()), Some(255));

        root.to_grayscale();
        let sample = child.sample(0, 0).expect("cursor inside");
        assert!(sample.is_gray());
        assert_eq!(sample.red(), None);
        assert!(child.current().is_some_and(|s| s.is_gray()));
    }

    #[test]
    fn huge_offsets_are_out_of_bounds() {
        let mut view = gray_ramp(4, 4);
        view.move_to(1, 1);
        assert!(view.sample(i32::MAX, 0).is_none());
        assert!(view.sample(0, i32::MIN).is_none());

        assert!(!view.move_by(i32::MAX, 0));
        assert!(!view.is_ok());
        assert!(!view.move_by(0, i32::MIN));
        assert_eq!(view.cursor(), Some((1, 1)));
        assert_eq!(view.absolute_xy(i32::MAX, 0), (i32::MAX, 0));
    }

    #[test]
    fn overflowing_sub_view_is_an_error() {
        let root = gray_ramp(4, 4);
        assert!(root.sub_xywh(i32::MAX, 0, 2, 1).is_err());
        assert!(root.sub_xywh(i32::MIN, 0, -2, 1).is_err());
        assert!(root.sub_corners(i32::MIN, 0, i32::MAX, 0).is_err());
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut view = gray_ramp(3, 3);
        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);
        let id = view.subscribe(&[EventKind::Move], move |_| *counter.borrow_mut() += 1);
        view.move_to(0, 0);
        view.unsubscribe(id);
        view.move_to(1, 0);
        assert_eq!(*count.borrow(), 1);
        assert_eq!(view.subscriber_count(EventKind::Move), 0);
    }
}
