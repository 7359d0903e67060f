// THEORY:
// This file is the main entry point for the `pixel_scan` library crate. It
// exposes the engine as a handful of high-level types and keeps the module tree
// (`core_modules`) available for callers who need the details.
//
// The engine is layered:
// 1.  `color_math` and `sample`: pure color arithmetic and immutable pixel readings.
// 2.  `pixel_view` and `scan`: a bounded, nestable cursor over a shared pixel
//     buffer, its movement and scan strategies, and the events it publishes.
// 3.  `tolerance`: compares the pixels around a cursor against frozen references.
// 4.  `trace_recorder` and `player`: listen to a view, paint its path onto trace
//     layers, and optionally replay the painting at a paced rate.

pub mod config;
pub mod core_modules;
pub mod error;

pub use config::{PlaybackRate, ViewConfig};
pub use core_modules::buffer::{ChannelMode, PixelBuffer, PixelSource};
pub use core_modules::color_math::{Hsp, Hsv, Rgb, Rgba};
pub use core_modules::events::{EventKind, MovePosition, ScanId, SubscriptionId, ViewEvent};
pub use core_modules::pixel_view::{AbsolutePosition, MoveOptions, Offset, PixelView};
pub use core_modules::player::{PlaybackControl, PlaybackOutcome, interval_ticks, play};
pub use core_modules::rect::Rect;
pub use core_modules::render_target::{ImageRenderTarget, RenderTarget};
pub use core_modules::sample::{PixelSample, SampleKind};
pub use core_modules::scan::{
    Alternating, AngleStep, Linear, Polar, PolarBounds, PolarOrder, RandomStep, Raster, RasterOrder,
    ScanEnd, ScanStep, ScanSummary, StepFn,
};
pub use core_modules::tolerance::{
    CheckOutcome, CheckResult, CheckSpec, PropertyRange, PropertyResult, SampleProperty, Tolerance,
    ToleranceMatcher, in_range,
};
pub use core_modules::trace_layer::{LayerId, TraceLayer};
pub use core_modules::trace_recorder::{
    Lifetime, Operation, RetireReason, Retirement, StatePattern, TickReport, TraceConfig, TraceInk,
    TraceRecorder, TraceStyle,
};
pub use error::{MatchError, TraceError, ViewError};
