// THEORY:
// The trace recorder listens to a `PixelView` and paints the path of its cursor onto
// trace layers. What gets painted, and where, is decided by a stack of trace
// configurations:
//
//     [ one-shot  | sampled ink | layer "hits" ]   <- top, active
//     [ sticky    | green       | layer "path" ]
//     [ sticky    | transparent | layer "base" ]   <- sentinel, never popped
//
// Every config has a lifetime. A sticky config stays until it is popped. A one-shot
// config lives for exactly one move, or, if a scan starts before any move reaches
// it, for the whole of that scan. The sentinel at the bottom guarantees there is
// always an active config.
//
// Two further features sit on top of the stack:
// - **State bindings**: named states entered on the view can push a config
//   implicitly; leaving the state restores the stack to where it was.
// - **Recording**: instead of executing stack changes and drawing right away, the
//   recorder can append them to an operation log. The log is later replayed all at
//   once (`flush`) or at a bounded number of draws per tick (`drain_tick`, driven by
//   the player), which turns a scan that finished instantly into an animation.

use crate::core_modules::color_math::Rgba;
use crate::core_modules::events::{MovePosition, ScanId, SubscriptionId, ViewEvent};
use crate::core_modules::pixel_view::PixelView;
use crate::core_modules::render_target::RenderTarget;
use crate::core_modules::trace_layer::{LayerId, TraceLayer};
use crate::error::TraceError;
use regex::Regex;
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Active until popped.
    Sticky,
    /// Retires after the next move, or after the scan it saw start.
    OneShot,
}

/// What a config draws on each move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceInk {
    Solid(Rgba),
    /// The pixel value read at the cursor.
    Sampled,
}

/// The active configuration at one stack level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceConfig {
    pub lifetime: Lifetime,
    pub ink: TraceInk,
    pub layer: LayerId,
}

/// Partial config for stack operations; unset fields inherit from the current top.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceStyle {
    pub ink: Option<TraceInk>,
    pub layer: Option<LayerId>,
}

impl TraceStyle {
    pub fn inherit() -> Self {
        Self::default()
    }

    pub fn solid(color: Rgba) -> Self {
        Self::default().ink(TraceInk::Solid(color))
    }

    pub fn sampled() -> Self {
        Self::default().ink(TraceInk::Sampled)
    }

    pub fn ink(mut self, ink: TraceInk) -> Self {
        self.ink = Some(ink);
        self
    }

    pub fn layer(mut self, id: impl Into<LayerId>) -> Self {
        self.layer = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetireReason {
    /// A one-shot config saw the move it was waiting for.
    Move,
    /// A one-shot config saw its scan end.
    ScanEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retirement {
    pub reason: RetireReason,
    /// Stack position the retired config occupied (the sentinel is 0).
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Checker {
    Sticky,
    OneShot { scan: Option<ScanId> },
}

#[derive(Debug, Clone, Copy)]
enum Signal {
    Move,
    ScanStart(ScanId),
    ScanEnd(ScanId),
}

impl Checker {
    fn for_lifetime(lifetime: Lifetime) -> Self {
        match lifetime {
            Lifetime::Sticky => Checker::Sticky,
            Lifetime::OneShot => Checker::OneShot { scan: None },
        }
    }

    /// Feeds one signal; returns the reason if the config must retire.
    fn observe(&mut self, signal: Signal) -> Option<RetireReason> {
        let Checker::OneShot { scan } = self else {
            return None;
        };
        match signal {
            Signal::Move if scan.is_none() => Some(RetireReason::Move),
            Signal::Move => None,
            Signal::ScanStart(id) => {
                if scan.is_none() {
                    *scan = Some(id);
                }
                None
            }
            Signal::ScanEnd(id) if *scan == Some(id) => Some(RetireReason::ScanEnd),
            Signal::ScanEnd(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
struct StackEntry {
    config: TraceConfig,
    checker: Checker,
}

/// Matches state names for implicit trace configs.
#[derive(Debug, Clone)]
pub enum StatePattern {
    Exact(String),
    Regex(Regex),
}

impl StatePattern {
    pub fn exact(name: impl Into<String>) -> Self {
        StatePattern::Exact(name.into())
    }

    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(StatePattern::Regex(Regex::new(pattern)?))
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            StatePattern::Exact(exact) => exact == name,
            StatePattern::Regex(regex) => regex.is_match(name),
        }
    }
}

#[derive(Debug, Clone)]
struct StateBinding {
    pattern: StatePattern,
    style: TraceStyle,
}

/// A deferred recorder operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Set(TraceStyle),
    Push(TraceStyle),
    One(TraceStyle),
    Pop,
    Clear(Option<LayerId>),
    Event(ViewEvent),
}

impl Operation {
    /// Only forwarded moves draw, and only they count against a tick budget.
    pub fn is_draw(&self) -> bool {
        matches!(self, Operation::Event(ViewEvent::Move(_)))
    }
}

/// What one `drain_tick` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub draws: usize,
    pub operations: usize,
    /// Operations still queued afterwards.
    pub remaining: usize,
}

pub struct TraceRecorder {
    width: u32,
    height: u32,
    layers: BTreeMap<LayerId, TraceLayer>,
    stack: Vec<StackEntry>,
    bindings: Vec<StateBinding>,
    /// Entered bound states and the stack depth before each.
    bound: Vec<(String, usize)>,
    recording: bool,
    log: VecDeque<Operation>,
    retirements: Vec<Retirement>,
    target: Option<Box<dyn RenderTarget>>,
}

impl fmt::Debug for TraceRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceRecorder")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("layers", &self.layers.keys().collect::<Vec<_>>())
            .field("depth", &self.stack.len())
            .field("recording", &self.recording)
            .field("pending", &self.log.len())
            .field("has_target", &self.target.is_some())
            .finish()
    }
}

impl TraceRecorder {
    /// A recorder whose layers match a `width` x `height` root buffer. Without a
    /// render target it only records; `present` does nothing.
    pub fn new(width: u32, height: u32, target: Option<Box<dyn RenderTarget>>) -> Result<Self, TraceError> {
        let base = TraceLayer::new(LayerId::default(), width, height)?;
        let mut layers = BTreeMap::new();
        layers.insert(base.id().clone(), base);

        Ok(Self {
            width,
            height,
            layers,
            stack: vec![StackEntry {
                config: TraceConfig {
                    lifetime: Lifetime::Sticky,
                    ink: TraceInk::Solid(Rgba::TRANSPARENT),
                    layer: LayerId::default(),
                },
                checker: Checker::Sticky,
            }],
            bindings: Vec::new(),
            bound: Vec::new(),
            recording: false,
            log: VecDeque::new(),
            retirements: Vec::new(),
            target,
        })
    }

    /// Shares a new recorder, ready to be attached to views.
    pub fn shared(width: u32, height: u32, target: Option<Box<dyn RenderTarget>>) -> Result<Rc<RefCell<Self>>, TraceError> {
        Ok(Rc::new(RefCell::new(Self::new(width, height, target)?)))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    // --- Stack ---

    /// The active configuration.
    pub fn top(&self) -> &TraceConfig {
        // The sentinel is never removed.
        &self.stack[self.stack.len() - 1].config
    }

    /// Number of configs on the stack, sentinel included.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Replaces the top config with a sticky one.
    pub fn set(&mut self, style: TraceStyle) -> &mut Self {
        self.exec(Operation::Set(style));
        self
    }

    /// Pushes a sticky config.
    pub fn push(&mut self, style: TraceStyle) -> &mut Self {
        self.exec(Operation::Push(style));
        self
    }

    /// Pushes a one-shot config.
    pub fn one(&mut self, style: TraceStyle) -> &mut Self {
        self.exec(Operation::One(style));
        self
    }

    /// Removes the top config. While recording, the pop is queued and checked
    /// when it runs.
    pub fn pop(&mut self) -> Result<&mut Self, TraceError> {
        if self.recording {
            self.log.push_back(Operation::Pop);
        } else {
            self.pop_now()?;
        }
        Ok(self)
    }

    pub fn retirements(&self) -> &[Retirement] {
        &self.retirements
    }

    fn entry_for(&mut self, lifetime: Lifetime, style: TraceStyle) -> StackEntry {
        let top = self.top().clone();
        let layer = style.layer.unwrap_or(top.layer);
        self.ensure_layer(&layer);
        StackEntry {
            config: TraceConfig {
                lifetime,
                ink: style.ink.unwrap_or(top.ink),
                layer,
            },
            checker: Checker::for_lifetime(lifetime),
        }
    }

    fn push_now(&mut self, lifetime: Lifetime, style: TraceStyle) {
        let entry = self.entry_for(lifetime, style);
        debug!(?lifetime, layer = %entry.config.layer, depth = self.stack.len() + 1, "trace config pushed");
        self.stack.push(entry);
    }

    fn set_now(&mut self, style: TraceStyle) {
        let entry = self.entry_for(Lifetime::Sticky, style);
        debug!(layer = %entry.config.layer, depth = self.stack.len(), "trace config replaced");
        if let Some(top) = self.stack.last_mut() {
            *top = entry;
        }
    }

    fn pop_now(&mut self) -> Result<(), TraceError> {
        if self.stack.len() <= 1 {
            return Err(TraceError::SentinelPop);
        }
        self.stack.pop();
        debug!(depth = self.stack.len(), "trace config popped");
        Ok(())
    }

    // --- State bindings ---

    /// On entering a state matching `pattern`, push a sticky config built from
    /// `style`; on leaving it, restore the stack. The first matching binding wins.
    pub fn bind_state(&mut self, pattern: StatePattern, style: TraceStyle) -> &mut Self {
        self.bindings.push(StateBinding { pattern, style });
        self
    }

    fn enter_state(&mut self, name: &str) {
        let Some(style) = self
            .bindings
            .iter()
            .find(|binding| binding.pattern.matches(name))
            .map(|binding| binding.style.clone())
        else {
            return;
        };
        let depth = self.stack.len();
        self.push_now(Lifetime::Sticky, style);
        self.bound.push((name.to_string(), depth));
        debug!(state = name, "bound state entered");
    }

    fn exit_state(&mut self, name: &str) {
        let Some(position) = self.bound.iter().rposition(|(bound, _)| bound == name) else {
            return;
        };
        let depth = self.bound[position].1;
        // States entered after this one are gone with it.
        self.bound.truncate(position);
        self.stack.truncate(depth.max(1));
        debug!(state = name, depth = self.stack.len(), "bound state exited");
    }

    // --- Subscription ---

    /// Subscribes a shared recorder to every event of `view`.
    pub fn attach(recorder: &Rc<RefCell<TraceRecorder>>, view: &mut PixelView) -> SubscriptionId {
        let recorder = Rc::clone(recorder);
        view.subscribe_all(move |event| match recorder.try_borrow_mut() {
            Ok(mut recorder) => recorder.notify(event),
            Err(_) => warn!(kind = ?event.kind(), "trace recorder busy, event dropped"),
        })
    }

    pub fn detach(view: &mut PixelView, id: SubscriptionId) {
        view.unsubscribe(id);
    }

    /// Entry point for view events: handled now, or logged while recording.
    pub fn notify(&mut self, event: &ViewEvent) {
        if self.recording {
            self.log.push_back(Operation::Event(event.clone()));
        } else {
            self.handle(event);
        }
    }

    fn handle(&mut self, event: &ViewEvent) {
        match event {
            ViewEvent::Move(position) => {
                self.draw_move(position);
                self.observe(Signal::Move);
            }
            ViewEvent::ScanStart(id) => self.observe(Signal::ScanStart(*id)),
            ViewEvent::ScanEnd(id) => self.observe(Signal::ScanEnd(*id)),
            ViewEvent::StateEnter(name) => self.enter_state(name),
            ViewEvent::StateExit(name) => self.exit_state(name),
        }
    }

    fn observe(&mut self, signal: Signal) {
        let index = self.stack.len() - 1;
        let Some(reason) = self.stack[index].checker.observe(signal) else {
            return;
        };
        if index == 0 {
            return;
        }
        self.stack.pop();
        self.retirements.push(Retirement { reason, index });
        debug!(?reason, index, "one-shot trace config retired");
    }

    fn draw_move(&mut self, position: &MovePosition) {
        let TraceConfig { ink, layer, .. } = self.top().clone();
        let color = match ink {
            TraceInk::Solid(color) => color,
            TraceInk::Sampled => match &position.sample {
                Some(sample) => sample.to_rgba(),
                None => {
                    trace!(index = position.abs_index, "no sample to draw");
                    return;
                }
            },
        };

        let index = position.abs_index;
        if self.ensure_layer(&layer).draw(index, color) {
            trace!(index, layer = %layer, "trace pixel drawn");
        } else {
            warn!(index, layer = %layer, "trace draw outside layer dropped");
        }
    }

    // --- Recording ---

    /// Starts appending operations and events to the log instead of running them.
    pub fn record(&mut self) -> &mut Self {
        self.recording = true;
        self
    }

    /// Stops capturing. Already logged operations stay queued.
    pub fn stop_recording(&mut self) -> &mut Self {
        self.recording = false;
        self
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn pending(&self) -> usize {
        self.log.len()
    }

    pub fn pending_draws(&self) -> usize {
        self.log.iter().filter(|op| op.is_draw()).count()
    }

    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.log.iter()
    }

    fn exec(&mut self, op: Operation) {
        if self.recording {
            self.log.push_back(op);
        } else {
            self.apply(op);
        }
    }

    fn apply(&mut self, op: Operation) {
        match op {
            Operation::Set(style) => self.set_now(style),
            Operation::Push(style) => self.push_now(Lifetime::Sticky, style),
            Operation::One(style) => self.push_now(Lifetime::OneShot, style),
            Operation::Pop => {
                if let Err(err) = self.pop_now() {
                    warn!(%err, "queued pop skipped");
                }
            }
            Operation::Clear(layer) => self.clear_now(layer.as_ref()),
            Operation::Event(event) => self.handle(&event),
        }
    }

    /// Runs the whole log now. Returns the number of operations executed.
    pub fn flush(&mut self) -> usize {
        let mut executed = 0;
        while let Some(op) = self.log.pop_front() {
            self.apply(op);
            executed += 1;
        }
        debug!(executed, "operation log flushed");
        executed
    }

    /// Runs queued operations until `budget` draws have executed. Operations that
    /// do not draw run as they are reached and are not counted.
    pub fn drain_tick(&mut self, budget: usize) -> TickReport {
        let mut draws = 0;
        let mut operations = 0;
        while let Some(op) = self.log.front() {
            let is_draw = op.is_draw();
            if is_draw && draws >= budget {
                break;
            }
            let Some(op) = self.log.pop_front() else {
                break;
            };
            self.apply(op);
            operations += 1;
            if is_draw {
                draws += 1;
            }
        }
        TickReport {
            draws,
            operations,
            remaining: self.log.len(),
        }
    }

    // --- Layers ---

    fn ensure_layer(&mut self, id: &LayerId) -> &mut TraceLayer {
        let (width, height) = (self.width, self.height);
        self.layers.entry(id.clone()).or_insert_with(|| {
            debug!(layer = %id, "trace layer created");
            TraceLayer::blank(id.clone(), width, height)
        })
    }

    pub fn layer(&self, id: &LayerId) -> Option<&TraceLayer> {
        self.layers.get(id)
    }

    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.layers.keys().cloned().collect()
    }

    /// Releases one layer, or every layer when `layer` is `None`. The default layer
    /// comes back empty right away.
    pub fn clear(&mut self, layer: Option<LayerId>) -> &mut Self {
        self.exec(Operation::Clear(layer));
        self
    }

    fn clear_now(&mut self, layer: Option<&LayerId>) {
        let released: Vec<LayerId> = match layer {
            Some(id) => self.layers.remove(id).map(|l| l.id().clone()).into_iter().collect(),
            None => std::mem::take(&mut self.layers).into_keys().collect(),
        };
        if let Some(target) = self.target.as_mut() {
            for id in &released {
                target.remove_layer(id);
            }
        }
        self.ensure_layer(&LayerId::default());
        debug!(released = released.len(), "trace layers cleared");
    }

    /// Hands every dirty layer to the render target and presents.
    pub fn present(&mut self) {
        let Some(target) = self.target.as_mut() else {
            return;
        };
        for layer in self.layers.values_mut().filter(|layer| layer.is_dirty()) {
            target.write_layer(layer.id(), layer.width(), layer.height(), layer.pixels());
            layer.mark_clean();
        }
        target.present(None);
    }
}
