mod image_helper;
mod logging;

use anyhow::{Context, bail};
use pixel_scan::{
    AngleStep, CheckSpec, ImageRenderTarget, PixelSource, PixelView, PlaybackControl, PlaybackOutcome,
    PlaybackRate, PolarBounds, Rgba, StatePattern, ToleranceMatcher, TraceRecorder, TraceStyle, ViewConfig,
    interval_ticks, play,
};
use std::cell::RefCell;
use std::env;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{info, warn};

const USAGE: &str =
    "Usage: scan_tester <input_image> <output_png> [draws_per_second] [raster_step] [--debug]";

/// Settings for one tester run, read from the command line.
#[derive(Debug, Clone)]
struct TesterConfig {
    input: PathBuf,
    output: PathBuf,
    /// Playback speed of the recorded trace.
    draws_per_second: f64,
    /// Distance between raster samples, in pixels.
    raster_step: i32,
    /// Luminance difference from the top-left pixel that counts as a hit.
    luminance_tolerance: f64,
    debug: bool,
}

impl TesterConfig {
    fn from_args(args: &[String]) -> anyhow::Result<Option<Self>> {
        let debug = args.iter().any(|a| a == "--debug");
        let positional: Vec<&String> = args.iter().skip(1).filter(|a| !a.starts_with("--")).collect();
        if positional.len() < 2 {
            return Ok(None);
        }

        let draws_per_second = match positional.get(2) {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("draws_per_second must be a number, got `{raw}`"))?,
            None => 2000.0,
        };
        let raster_step = match positional.get(3) {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("raster_step must be an integer, got `{raw}`"))?,
            None => 4,
        };
        if raster_step <= 0 {
            bail!("raster_step must be positive, got {raster_step}");
        }

        Ok(Some(Self {
            input: PathBuf::from(positional[0]),
            output: PathBuf::from(positional[1]),
            draws_per_second,
            raster_step,
            luminance_tolerance: 24.0,
            debug,
        }))
    }
}

/// Paints each hit once on the `hits` layer. A one-shot config only retires on the
/// next move, so hits under the cursor are skipped rather than left on the stack.
fn mark_hits(view: &mut PixelView, recorder: &Rc<RefCell<TraceRecorder>>, hits: &[(i32, i32)]) {
    for &(x, y) in hits {
        if view.cursor() == Some((x, y)) {
            continue;
        }
        recorder
            .borrow_mut()
            .one(TraceStyle::solid(Rgba::opaque(255, 40, 40)).layer("hits"));
        view.move_to(x, y);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // --- 1. Argument Parsing & Setup ---
    let args: Vec<String> = env::args().collect();
    let Some(config) = TesterConfig::from_args(&args)? else {
        println!("{USAGE}");
        return Ok(());
    };
    logging::init(config.debug);

    // --- 2. Image Loading ---
    let source_image = image::open(&config.input)
        .with_context(|| format!("opening {}", config.input.display()))?
        .to_rgba8();
    let (width, height) = source_image.dimensions();
    info!(width, height, input = %config.input.display(), "image loaded");

    // --- 3. Engine Initialization ---
    let mut view = PixelView::new(PixelSource::from(&source_image), ViewConfig::default())?;
    let target = ImageRenderTarget::new();
    let recorder = TraceRecorder::shared(width, height, Some(Box::new(target.clone())))?;
    TraceRecorder::attach(&recorder, &mut view);

    recorder.borrow_mut().bind_state(
        StatePattern::regex("^ring")?,
        TraceStyle::solid(Rgba::opaque(64, 160, 255)).layer("rings"),
    );

    view.move_top_left();
    let mut matcher = ToleranceMatcher::new(
        &view,
        vec![CheckSpec::at(0, 0).within("lum", config.luminance_tolerance)],
    )?;

    // --- 4. Recorded Scans ---
    recorder
        .borrow_mut()
        .record()
        .push(TraceStyle::sampled().layer("path"));

    let mut hits = Vec::new();
    let raster = view.scan_xy(config.raster_step, config.raster_step, |v, _| {
        if !matcher.check(v).passed {
            hits.extend(v.cursor());
        }
        true
    });
    info!(steps = raster.steps, hits = hits.len(), id = %raster.id, "raster scan finished");

    recorder.borrow_mut().pop()?;
    mark_hits(&mut view, &recorder, &hits);

    view.move_to(width as i32 / 2, height as i32 / 2);
    view.enter_state("ring-scan");
    let rings = view.scan_ar(AngleStep::ArcLength(1.0), 8.0, PolarBounds::default(), |_, _| true);
    view.exit_state(1)?;
    info!(steps = rings.steps, ended_by = ?rings.ended_by, "ring scan finished");

    recorder.borrow_mut().stop_recording();

    // --- 5. Paced Playback ---
    let rate = PlaybackRate::new(config.draws_per_second);
    let control = PlaybackControl::new();
    info!(
        pending = recorder.borrow().pending(),
        draws_per_tick = rate.draws_per_tick(),
        "playing back trace"
    );
    let outcome = tokio::select! {
        outcome = play(&recorder, rate, interval_ticks(rate.ticks_per_second), &control) => outcome,
        _ = tokio::signal::ctrl_c() => {
            control.cancel();
            PlaybackOutcome::Cancelled
        }
    };
    if outcome != PlaybackOutcome::Completed {
        warn!(?outcome, pending = recorder.borrow().pending(), "playback stopped early, flushing the rest");
        recorder.borrow_mut().flush();
    }
    recorder.borrow_mut().present();

    // --- 6. Output ---
    let mut output = source_image.clone();
    image_helper::dim(&mut output, 0.4);
    image::imageops::overlay(&mut output, &target.composite(width, height), 0, 0);
    image_helper::save(&config.output, &output)
        .with_context(|| format!("writing {}", config.output.display()))?;
    info!(output = %config.output.display(), layers = target.layer_ids().len(), "trace saved");

    Ok(())
}
