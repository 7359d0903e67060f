// THEORY:
// Scanning is the act of walking a view's cursor along a path and looking at each
// pixel on the way. The `scan` loop itself is tiny and generic:
//
//     publish ScanStart(id)
//     loop { visit(step) -> halt?; next() -> none?; move_to(next) -> failed? }
//     publish ScanEnd(id)
//
// All the interesting geometry lives in step generators, which implement
// `ScanStep`. A generator is asked for the next coordinate given the view's current
// state, and it also hears the visitor's verdict after every visit, which lets a
// generator keep per-direction state (see `Alternating`).
//
// Built-in generators:
// - `Linear`: a fixed vector per step (right, down, left, up).
// - `RandomStep`: a uniformly random coordinate each step.
// - `Raster`: row-major or column-major sweeps with wraparound on the secondary axis.
// - `Polar`: rings or rays around the scan origin.
// - `Alternating`: several rays from the origin, advanced round-robin.
//
// Scans cannot nest on one view: `scan` borrows the view mutably for its whole
// duration and visitors only ever see a shared reference.

use crate::core_modules::events::{ScanId, ViewEvent};
use crate::core_modules::pixel_view::PixelView;
use rand::Rng;
use rand::rngs::ThreadRng;
use std::f64::consts::PI;
use tracing::debug;

/// Produces the coordinates a scan visits.
pub trait ScanStep {
    /// The next coordinate to move to, in view coordinates; `None` ends the scan.
    fn next(&mut self, view: &PixelView) -> Option<(i32, i32)>;

    /// Receives the visitor's verdict for the step just visited and decides whether
    /// the scan goes on.
    fn on_visit(&mut self, keep_going: bool) -> bool {
        keep_going
    }
}

/// Adapts a closure into a step generator.
pub struct StepFn<F>(pub F);

impl<F> ScanStep for StepFn<F>
where
    F: FnMut(&PixelView) -> Option<(i32, i32)>,
{
    fn next(&mut self, view: &PixelView) -> Option<(i32, i32)> {
        (self.0)(view)
    }
}

/// Why a scan stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEnd {
    /// The step generator ran out of coordinates.
    Exhausted,
    /// The visitor asked to stop.
    Halted,
    /// The next coordinate was outside the view.
    OutOfBounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    pub id: ScanId,
    /// Number of visitor calls.
    pub steps: usize,
    pub ended_by: ScanEnd,
}

fn correlation_id() -> ScanId {
    ScanId(rand::thread_rng().gen_range(10_000..=99_999))
}

fn magnitude_or_one(step: i32) -> i32 {
    if step == 0 { 1 } else { step.saturating_abs() }
}

// --- Linear ---

/// Moves the cursor by a fixed vector each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Linear {
    pub dx: i32,
    pub dy: i32,
}

impl Linear {
    pub fn right(step: i32) -> Self {
        Self { dx: magnitude_or_one(step), dy: 0 }
    }

    pub fn down(step: i32) -> Self {
        Self { dx: 0, dy: magnitude_or_one(step) }
    }

    pub fn left(step: i32) -> Self {
        Self { dx: -magnitude_or_one(step), dy: 0 }
    }

    pub fn up(step: i32) -> Self {
        Self { dx: 0, dy: -magnitude_or_one(step) }
    }
}

impl ScanStep for Linear {
    fn next(&mut self, view: &PixelView) -> Option<(i32, i32)> {
        let (x, y) = view.cursor()?;
        Some((x.saturating_add(self.dx), y.saturating_add(self.dy)))
    }
}

// --- Random ---

/// Jumps to a uniformly random pixel of the view each step. Never ends on its own.
#[derive(Debug, Clone)]
pub struct RandomStep<R> {
    rng: R,
}

impl RandomStep<ThreadRng> {
    pub fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for RandomStep<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> RandomStep<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> ScanStep for RandomStep<R> {
    fn next(&mut self, view: &PixelView) -> Option<(i32, i32)> {
        Some((
            self.rng.gen_range(0..view.width() as i32),
            self.rng.gen_range(0..view.height() as i32),
        ))
    }
}

// --- Raster ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterOrder {
    /// Step along x, wrap to the next row.
    RowMajor,
    /// Step along y, wrap to the next column.
    ColumnMajor,
}

/// A bidirectional raster sweep. The primary axis advances by its step; crossing
/// an edge wraps to the opposite edge and advances the secondary axis by its step.
/// The scan ends when the secondary axis leaves the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Raster {
    pub order: RasterOrder,
    pub step_x: i32,
    pub step_y: i32,
}

impl Raster {
    pub fn new(order: RasterOrder, step_x: i32, step_y: i32) -> Self {
        Self {
            order,
            step_x: if step_x == 0 { 1 } else { step_x },
            step_y: if step_y == 0 { 1 } else { step_y },
        }
    }

    pub fn rows(step_x: i32, step_y: i32) -> Self {
        Self::new(RasterOrder::RowMajor, step_x, step_y)
    }

    pub fn columns(step_x: i32, step_y: i32) -> Self {
        Self::new(RasterOrder::ColumnMajor, step_x, step_y)
    }
}

impl ScanStep for Raster {
    fn next(&mut self, view: &PixelView) -> Option<(i32, i32)> {
        let (x, y) = view.cursor()?;
        let right = view.width() as i32 - 1;
        let bottom = view.height() as i32 - 1;

        let next = match self.order {
            RasterOrder::RowMajor => {
                let nx = x.saturating_add(self.step_x);
                if self.step_x > 0 && nx > right {
                    (0, y.saturating_add(self.step_y))
                } else if self.step_x < 0 && nx < 0 {
                    (right, y.saturating_add(self.step_y))
                } else {
                    (nx, y)
                }
            }
            RasterOrder::ColumnMajor => {
                let ny = y.saturating_add(self.step_y);
                if self.step_y > 0 && ny > bottom {
                    (x.saturating_add(self.step_x), 0)
                } else if self.step_y < 0 && ny < 0 {
                    (x.saturating_add(self.step_x), bottom)
                } else {
                    (x, ny)
                }
            }
        };
        Some(next)
    }
}

// --- Polar ---

/// How the angular step of a polar scan is interpreted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AngleStep {
    /// Pixels to advance along the circumference; the angle shrinks as the radius grows.
    ArcLength(f64),
    /// A fixed angle in radians.
    Radians(f64),
    /// A fixed angle in degrees.
    Degrees(f64),
}

impl AngleStep {
    fn raw(&self) -> f64 {
        match *self {
            AngleStep::ArcLength(v) | AngleStep::Radians(v) | AngleStep::Degrees(v) => v,
        }
    }

    fn increment(&self, radius: f64) -> f64 {
        match *self {
            AngleStep::ArcLength(pixels) => {
                if radius > 0.0 {
                    pixels / radius
                } else {
                    pixels
                }
            }
            AngleStep::Radians(radians) => radians,
            AngleStep::Degrees(degrees) => degrees.to_radians(),
        }
    }
}

impl Default for AngleStep {
    fn default() -> Self {
        AngleStep::ArcLength(1.0)
    }
}

/// Which polar coordinate advances fastest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolarOrder {
    /// Sweep a full arc, then step outward (rings).
    AngleMajor,
    /// Sweep the full radius range, then step the angle (rays).
    RadiusMajor,
}

/// Limits of a polar scan; unset fields default to radius 1..min(w,h)/2 and
/// angle 0..2π.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PolarBounds {
    pub radius_min: Option<f64>,
    pub radius_max: Option<f64>,
    pub angle_min: Option<f64>,
    pub angle_max: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
struct PolarState {
    cx: f64,
    cy: f64,
    radius: f64,
    angle: f64,
    increment: f64,
    radius_min: f64,
    radius_max: f64,
    angle_min: f64,
    angle_max: f64,
}

/// Rings or rays around the cursor position at the start of the scan.
#[derive(Debug, Clone)]
pub struct Polar {
    pub order: PolarOrder,
    pub angle_step: AngleStep,
    pub radius_step: f64,
    pub bounds: PolarBounds,
    state: Option<PolarState>,
}

impl Polar {
    pub fn new(order: PolarOrder, angle_step: AngleStep, radius_step: f64, bounds: PolarBounds) -> Self {
        let angle_step = if angle_step.raw() == 0.0 {
            match angle_step {
                AngleStep::ArcLength(_) => AngleStep::ArcLength(1.0),
                AngleStep::Radians(_) => AngleStep::Radians(1.0),
                AngleStep::Degrees(_) => AngleStep::Degrees(1.0),
            }
        } else {
            angle_step
        };
        Self {
            order,
            angle_step,
            radius_step: if radius_step == 0.0 { 1.0 } else { radius_step },
            bounds,
            state: None,
        }
    }

    pub fn rings(angle_step: AngleStep, radius_step: f64, bounds: PolarBounds) -> Self {
        Self::new(PolarOrder::AngleMajor, angle_step, radius_step, bounds)
    }

    pub fn rays(angle_step: AngleStep, radius_step: f64, bounds: PolarBounds) -> Self {
        Self::new(PolarOrder::RadiusMajor, angle_step, radius_step, bounds)
    }

    fn init(&self, view: &PixelView) -> Option<PolarState> {
        let (x, y) = view.cursor()?;
        let radius_min = self.bounds.radius_min.unwrap_or(1.0);
        let radius_max = self
            .bounds
            .radius_max
            .unwrap_or((view.width() as f64 / 2.0).min(view.height() as f64 / 2.0));
        let angle_min = self.bounds.angle_min.unwrap_or(0.0);
        let angle_max = self.bounds.angle_max.unwrap_or(2.0 * PI);

        let radius = if self.radius_step > 0.0 { radius_min } else { radius_max };
        let angle = if self.angle_step.raw() > 0.0 { angle_min } else { angle_max };
        let increment = match self.order {
            PolarOrder::AngleMajor => self.angle_step.increment(radius),
            PolarOrder::RadiusMajor => self.angle_step.increment(radius_max),
        };

        Some(PolarState {
            cx: x as f64,
            cy: y as f64,
            radius,
            angle,
            increment,
            radius_min,
            radius_max,
            angle_min,
            angle_max,
        })
    }
}

fn to_pixel(state: &PolarState) -> (i32, i32) {
    use crate::core_modules::color_math::round;
    (
        round(state.cx + state.radius * state.angle.cos()) as i32,
        round(state.cy + state.radius * state.angle.sin()) as i32,
    )
}

impl ScanStep for Polar {
    fn next(&mut self, view: &PixelView) -> Option<(i32, i32)> {
        if self.state.is_none() {
            self.state = Some(self.init(view)?);
        }
        let angle_step = self.angle_step;
        let radius_step = self.radius_step;
        let order = self.order;
        let state = self.state.as_mut()?;

        match order {
            PolarOrder::AngleMajor => {
                let next_angle = state.angle + state.increment;
                let (angle, radius) = if state.increment > 0.0 && next_angle > state.angle_max {
                    (state.angle_min, state.radius + radius_step)
                } else if state.increment < 0.0 && next_angle < state.angle_min {
                    (state.angle_max, state.radius + radius_step)
                } else {
                    (next_angle, state.radius)
                };

                if radius > state.radius_max || radius < state.radius_min {
                    return None;
                }

                state.angle = angle;
                if radius != state.radius {
                    state.radius = radius;
                    state.increment = angle_step.increment(radius);
                }
            }
            PolarOrder::RadiusMajor => {
                let next_radius = state.radius + radius_step;
                let (angle, radius) = if radius_step > 0.0 && next_radius > state.radius_max {
                    (state.angle + state.increment, state.radius_min)
                } else if radius_step < 0.0 && next_radius < state.radius_min {
                    (state.angle + state.increment, state.radius_max)
                } else {
                    (state.angle, next_radius)
                };

                if angle > state.angle_max || angle < state.angle_min {
                    return None;
                }

                state.angle = angle;
                state.radius = radius;
            }
        }

        Some(to_pixel(state))
    }
}

// --- Alternating ---

/// Several rays cast from the scan origin and advanced round-robin. A ray retires
/// when it would leave the view or when the visitor rejects its latest step; the
/// scan ends once every ray has retired. Rejecting the origin itself (the first
/// visit, before any ray has moved) ends the whole scan.
#[derive(Debug, Clone)]
pub struct Alternating {
    directions: Vec<(i32, i32)>,
    heads: Vec<Option<(i32, i32)>>,
    current: Option<usize>,
    retired: usize,
    started: bool,
}

impl Alternating {
    pub fn new(directions: Vec<(i32, i32)>) -> Self {
        let heads = vec![None; directions.len()];
        Self {
            directions,
            heads,
            current: None,
            retired: 0,
            started: false,
        }
    }

    pub fn live_directions(&self) -> usize {
        self.directions.len() - self.retired
    }

    fn start(&mut self, view: &PixelView) {
        self.started = true;
        let origin = view.cursor();
        for (head, direction) in self.heads.iter_mut().zip(&self.directions) {
            // A zero vector would never leave the view.
            *head = if *direction == (0, 0) { None } else { origin };
        }
        self.retired = self.heads.iter().filter(|h| h.is_none()).count();
    }

    fn retire(&mut self, index: usize) {
        if self.heads[index].take().is_some() {
            self.retired += 1;
        }
    }
}

impl ScanStep for Alternating {
    fn next(&mut self, view: &PixelView) -> Option<(i32, i32)> {
        if !self.started {
            self.start(view);
        }
        let count = self.directions.len();
        loop {
            if self.retired >= count {
                return None;
            }
            let index = self.current.map_or(0, |i| (i + 1) % count);
            self.current = Some(index);

            if let Some((hx, hy)) = self.heads[index] {
                let (dx, dy) = self.directions[index];
                let (nx, ny) = (hx.saturating_add(dx), hy.saturating_add(dy));
                if view.in_bounds(nx, ny) {
                    self.heads[index] = Some((nx, ny));
                    return Some((nx, ny));
                }
                self.retire(index);
            }
        }
    }

    fn on_visit(&mut self, keep_going: bool) -> bool {
        if keep_going {
            return true;
        }
        match self.current {
            Some(index) => {
                self.retire(index);
                self.retired < self.directions.len()
            }
            None => false,
        }
    }
}

// --- The scan loop and shorthands ---

impl PixelView {
    /// Walks the cursor along the coordinates produced by `step`, calling `visitor`
    /// with the step index before every move. The traversal is bracketed by
    /// scan-start/scan-end events sharing a random correlation id.
    pub fn scan<S, V>(&mut self, step: &mut S, mut visitor: V) -> ScanSummary
    where
        S: ScanStep + ?Sized,
        V: FnMut(&PixelView, usize) -> bool,
    {
        let id = correlation_id();
        debug!(%id, cursor = ?self.cursor(), "scan started");
        self.publish(&ViewEvent::ScanStart(id));

        let mut steps = 0;
        let ended_by = loop {
            let keep_going = visitor(self, steps);
            steps += 1;
            if !step.on_visit(keep_going) {
                break ScanEnd::Halted;
            }
            let Some((x, y)) = step.next(self) else {
                break ScanEnd::Exhausted;
            };
            if !self.move_to(x, y) {
                break ScanEnd::OutOfBounds;
            }
        };

        self.publish(&ViewEvent::ScanEnd(id));
        debug!(%id, steps, ?ended_by, "scan ended");
        ScanSummary { id, steps, ended_by }
    }

    pub fn scan_right<V: FnMut(&PixelView, usize) -> bool>(&mut self, step: i32, visitor: V) -> ScanSummary {
        self.scan(&mut Linear::right(step), visitor)
    }

    pub fn scan_down<V: FnMut(&PixelView, usize) -> bool>(&mut self, step: i32, visitor: V) -> ScanSummary {
        self.scan(&mut Linear::down(step), visitor)
    }

    pub fn scan_left<V: FnMut(&PixelView, usize) -> bool>(&mut self, step: i32, visitor: V) -> ScanSummary {
        self.scan(&mut Linear::left(step), visitor)
    }

    pub fn scan_up<V: FnMut(&PixelView, usize) -> bool>(&mut self, step: i32, visitor: V) -> ScanSummary {
        self.scan(&mut Linear::up(step), visitor)
    }

    pub fn scan_random<V: FnMut(&PixelView, usize) -> bool>(&mut self, visitor: V) -> ScanSummary {
        self.scan(&mut RandomStep::new(), visitor)
    }

    /// Row-major raster sweep.
    pub fn scan_xy<V: FnMut(&PixelView, usize) -> bool>(&mut self, step_x: i32, step_y: i32, visitor: V) -> ScanSummary {
        self.scan(&mut Raster::rows(step_x, step_y), visitor)
    }

    /// Column-major raster sweep.
    pub fn scan_yx<V: FnMut(&PixelView, usize) -> bool>(&mut self, step_x: i32, step_y: i32, visitor: V) -> ScanSummary {
        self.scan(&mut Raster::columns(step_x, step_y), visitor)
    }

    /// Concentric rings around the cursor.
    pub fn scan_ar<V: FnMut(&PixelView, usize) -> bool>(
        &mut self,
        angle_step: AngleStep,
        radius_step: f64,
        bounds: PolarBounds,
        visitor: V,
    ) -> ScanSummary {
        self.scan(&mut Polar::rings(angle_step, radius_step, bounds), visitor)
    }

    /// Rays out of the cursor.
    pub fn scan_ra<V: FnMut(&PixelView, usize) -> bool>(
        &mut self,
        angle_step: AngleStep,
        radius_step: f64,
        bounds: PolarBounds,
        visitor: V,
    ) -> ScanSummary {
        self.scan(&mut Polar::rays(angle_step, radius_step, bounds), visitor)
    }

    pub fn scan_alternating<V: FnMut(&PixelView, usize) -> bool>(
        &mut self,
        directions: Vec<(i32, i32)>,
        visitor: V,
    ) -> ScanSummary {
        self.scan(&mut Alternating::new(directions), visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewConfig;
    use crate::core_modules::buffer::PixelSource;
    use crate::core_modules::events::EventKind;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    fn view(width: u32, height: u32) -> PixelView {
        let data = vec![0; (width * height) as usize];
        PixelView::new(PixelSource::Gray { width, height, data }, ViewConfig::default())
            .expect("valid source")
    }

    fn visited(view: &mut PixelView, step: &mut dyn ScanStep) -> (Vec<(i32, i32)>, ScanSummary) {
        let mut cells = Vec::new();
        let summary = view.scan(step, |v, _| {
            cells.extend(v.cursor());
            true
        });
        (cells, summary)
    }

    #[test]
    fn linear_scan_stops_at_edge() {
        let mut v = view(5, 1);
        v.move_to(1, 0);
        let (cells, summary) = visited(&mut v, &mut Linear::right(2));
        assert_eq!(cells, [(1, 0), (3, 0)]);
        assert_eq!(summary.ended_by, ScanEnd::OutOfBounds);
        assert_eq!(summary.steps, 2);
        assert!(!v.is_ok());
    }

    #[test]
    fn linear_directions() {
        let mut v = view(3, 3);
        v.move_to(2, 2);
        let (cells, _) = visited(&mut v, &mut Linear::up(0));
        assert_eq!(cells, [(2, 2), (2, 1), (2, 0)]);
        let (cells, _) = visited(&mut v, &mut Linear::left(-1));
        assert_eq!(cells, [(2, 0), (1, 0), (0, 0)]);
    }

    #[test]
    fn huge_steps_leave_the_view() {
        let mut v = view(4, 4);
        v.move_to(1, 1);
        let summary = v.scan_right(i32::MAX, |_, _| true);
        assert_eq!((summary.steps, summary.ended_by), (1, ScanEnd::OutOfBounds));
        assert_eq!(v.cursor(), Some((1, 1)));

        assert_eq!(Linear::left(i32::MIN), Linear { dx: -i32::MAX, dy: 0 });
        let summary = v.scan_left(i32::MIN, |_, _| true);
        assert_eq!(summary.ended_by, ScanEnd::OutOfBounds);

        let (cells, summary) = visited(&mut v, &mut Raster::rows(1, i32::MAX));
        assert_eq!(cells, [(1, 1), (2, 1), (3, 1)]);
        assert_eq!(summary.ended_by, ScanEnd::OutOfBounds);

        let (cells, _) = visited(&mut v, &mut Raster::columns(i32::MAX, 1));
        assert_eq!(cells, [(3, 1), (3, 2), (3, 3)]);

        v.move_to(1, 1);
        let summary = v.scan_alternating(vec![(i32::MAX, 0), (0, i32::MIN)], |_, _| true);
        assert_eq!(summary.steps, 1);
    }

    #[test]
    fn scan_without_cursor_visits_once() {
        let mut v = view(3, 3);
        let summary = v.scan_right(1, |_, _| true);
        assert_eq!(summary.steps, 1);
        assert_eq!(summary.ended_by, ScanEnd::Exhausted);
    }

    #[test]
    fn visitor_false_halts() {
        let mut v = view(10, 1);
        v.move_to(0, 0);
        let summary = v.scan_right(1, |_, step| step < 3);
        assert_eq!(summary.ended_by, ScanEnd::Halted);
        assert_eq!(summary.steps, 4);
        assert_eq!(v.cursor(), Some((3, 0)));
    }

    #[test]
    fn scan_is_bracketed_by_matching_ids() {
        let mut v = view(3, 1);
        let ids = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&ids);
        v.subscribe(&[EventKind::ScanStart, EventKind::ScanEnd], move |event| {
            sink.borrow_mut().push(event.clone());
        });
        v.move_to(0, 0);
        let summary = v.scan_right(1, |_, _| true);

        let ids = ids.borrow();
        assert_eq!(*ids, [ViewEvent::ScanStart(summary.id), ViewEvent::ScanEnd(summary.id)]);
        assert!((10_000..=99_999).contains(&summary.id.0));
    }

    #[test]
    fn column_major_raster() {
        let mut v = view(2, 3);
        v.move_to(0, 0);
        let (cells, summary) = visited(&mut v, &mut Raster::columns(1, 1));
        assert_eq!(cells, [(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);
        assert_eq!(summary.ended_by, ScanEnd::OutOfBounds);
    }

    #[test]
    fn reverse_raster_wraps_from_the_right() {
        let mut v = view(3, 2);
        v.move_to(2, 0);
        let (cells, _) = visited(&mut v, &mut Raster::rows(-1, 1));
        assert_eq!(cells, [(2, 0), (1, 0), (0, 0), (2, 1), (1, 1), (0, 1)]);
    }

    #[test]
    fn strided_raster() {
        let mut v = view(4, 4);
        v.move_to(0, 0);
        let (cells, _) = visited(&mut v, &mut Raster::rows(2, 2));
        assert_eq!(cells, [(0, 0), (2, 0), (0, 2), (2, 2)]);
    }

    #[test]
    fn random_scan_stays_inside() {
        let mut v = view(7, 3);
        v.move_to(0, 0);
        let mut step = RandomStep::with_rng(StdRng::seed_from_u64(7));
        let summary = v.scan(&mut step, |v, n| {
            let (x, y) = v.cursor().expect("cursor set");
            assert!(v.in_bounds(x, y));
            n < 50
        });
        assert_eq!(summary.steps, 51);
        assert_eq!(summary.ended_by, ScanEnd::Halted);
    }

    #[test]
    fn polar_rings_with_fixed_degrees() {
        let mut v = view(9, 9);
        v.move_to(4, 4);
        let bounds = PolarBounds {
            radius_min: Some(2.0),
            radius_max: Some(2.0),
            angle_max: Some(2.0 * PI - 0.1),
            ..PolarBounds::default()
        };
        let mut step = Polar::rings(AngleStep::Degrees(90.0), 1.0, bounds);
        let (cells, summary) = visited(&mut v, &mut step);
        // The first step already advances the angle, so 0° is never reached.
        assert_eq!(cells, [(4, 4), (4, 6), (2, 4), (4, 2)]);
        assert_eq!(summary.ended_by, ScanEnd::Exhausted);
    }

    #[test]
    fn polar_rays_with_radians() {
        let mut v = view(9, 9);
        v.move_to(4, 4);
        let bounds = PolarBounds {
            radius_min: Some(1.0),
            radius_max: Some(3.0),
            angle_min: Some(0.0),
            angle_max: Some(PI / 2.0),
        };
        let mut step = Polar::rays(AngleStep::Radians(PI / 2.0), 1.0, bounds);
        let (cells, _) = visited(&mut v, &mut step);
        assert_eq!(cells, [(4, 4), (6, 4), (7, 4), (4, 5), (4, 6), (4, 7)]);
    }

    #[test]
    fn polar_arc_length_stays_within_radius() {
        let mut v = view(21, 21);
        v.move_to(10, 10);
        let bounds = PolarBounds {
            radius_max: Some(5.0),
            ..PolarBounds::default()
        };
        let mut step = Polar::rings(AngleStep::ArcLength(1.0), 1.0, bounds);
        let (cells, summary) = visited(&mut v, &mut step);
        assert_eq!(summary.ended_by, ScanEnd::Exhausted);
        for (x, y) in cells.iter().skip(1) {
            let r = (((x - 10).pow(2) + (y - 10).pow(2)) as f64).sqrt();
            assert!((0.9..=5.8).contains(&r), "({x},{y}) at radius {r}");
        }
    }

    #[test]
    fn polar_leaving_the_view_ends_the_scan() {
        let mut v = view(4, 4);
        v.move_to(0, 0);
        let mut step = Polar::rings(AngleStep::Degrees(90.0), 1.0, PolarBounds::default());
        let summary = v.scan(&mut step, |_, _| true);
        // Origin, (0,1), then (-1,0) is rejected.
        assert_eq!(summary.steps, 2);
        assert_eq!(summary.ended_by, ScanEnd::OutOfBounds);
    }

    #[test]
    fn alternating_rejection_retires_only_that_direction() {
        let mut v = view(5, 5);
        v.move_to(2, 2);
        let mut step = Alternating::new(vec![(1, 0), (-1, 0)]);
        let mut cells = Vec::new();
        let summary = v.scan(&mut step, |v, _| {
            let cell = v.cursor().expect("cursor set");
            cells.push(cell);
            cell != (3, 2)
        });
        assert_eq!(cells, [(2, 2), (3, 2), (1, 2), (0, 2)]);
        assert_eq!(summary.ended_by, ScanEnd::Exhausted);
        assert_eq!(step.live_directions(), 0);
    }

    #[test]
    fn alternating_cycles_until_all_directions_exit() {
        let mut v = view(5, 5);
        v.move_to(2, 2);
        let mut step = Alternating::new(vec![(0, -1), (1, 1), (0, 0)]);
        let (cells, summary) = visited(&mut v, &mut step);
        assert_eq!(cells, [(2, 2), (2, 1), (3, 3), (2, 0), (4, 4)]);
        assert_eq!(summary.ended_by, ScanEnd::Exhausted);
    }

    #[test]
    fn alternating_rejecting_origin_halts() {
        let mut v = view(5, 5);
        v.move_to(2, 2);
        let summary = v.scan_alternating(vec![(1, 0)], |_, _| false);
        assert_eq!(summary.ended_by, ScanEnd::Halted);
        assert_eq!(summary.steps, 1);
    }

    #[test]
    fn closure_step_generator() {
        let mut v = view(4, 4);
        v.move_to(0, 0);
        let mut diagonal = StepFn(|v: &PixelView| v.cursor().map(|(x, y)| (x + 1, y + 1)));
        let (cells, _) = visited(&mut v, &mut diagonal);
        assert_eq!(cells, [(0, 0), (1, 1), (2, 2), (3, 3)]);
    }

    proptest! {
        #[test]
        fn raster_visits_every_cell_once(width in 1u32..12, height in 1u32..12) {
            let mut v = view(width, height);
            v.move_to(0, 0);
            let (cells, summary) = visited(&mut v, &mut Raster::rows(1, 1));

            let expected: Vec<(i32, i32)> = (0..height as i32)
                .flat_map(|y| (0..width as i32).map(move |x| (x, y)))
                .collect();
            prop_assert_eq!(&cells, &expected);
            let distinct: HashSet<_> = cells.iter().collect();
            prop_assert_eq!(distinct.len(), (width * height) as usize);
            prop_assert_eq!(summary.ended_by, ScanEnd::OutOfBounds);
        }
    }
}
