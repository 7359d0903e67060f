// THEORY:
// The player turns a recorded operation log into an animation. It is the only async
// code in the crate: it waits for ticks from a stream, lets the recorder run a
// bounded number of draws per tick, and presents after each one.
//
// Ticks are any `futures::Stream<Item = ()>`, so tests can feed a fixed number of
// instant ticks while real callers use `interval_ticks`, backed by a tokio
// interval. Cancellation is a watch flag checked at every tick boundary; whatever
// has not run yet stays queued in the recorder.

use crate::config::PlaybackRate;
use crate::core_modules::trace_recorder::TraceRecorder;
use futures::{Stream, StreamExt};
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// The log ran empty.
    Completed,
    /// Stopped through the control handle.
    Cancelled,
    /// The tick stream ended first.
    TicksExhausted,
}

/// Cancels a running playback. Clones control the same playback.
#[derive(Debug, Clone)]
pub struct PlaybackControl {
    cancel_tx: watch::Sender<bool>,
}

impl Default for PlaybackControl {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackControl {
    pub fn new() -> Self {
        let (cancel_tx, _cancel_rx) = watch::channel(false);
        Self { cancel_tx }
    }

    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    /// Observes the cancel flag, e.g. to stop a tick source alongside playback.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.cancel_tx.subscribe()
    }
}

/// A tick stream from a tokio interval. Must be created inside a tokio runtime.
pub fn interval_ticks(ticks_per_second: f64) -> impl Stream<Item = ()> + Unpin {
    let period = PlaybackRate {
        ticks_per_second,
        ..PlaybackRate::default()
    }
    .tick_period();
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    Box::pin(futures::stream::unfold(interval, |mut interval| async move {
        interval.tick().await;
        Some(((), interval))
    }))
}

/// Replays the recorder's log at `rate`, one drain per tick.
pub async fn play<T>(
    recorder: &Rc<RefCell<TraceRecorder>>,
    rate: PlaybackRate,
    mut ticks: T,
    control: &PlaybackControl,
) -> PlaybackOutcome
where
    T: Stream<Item = ()> + Unpin,
{
    let budget = rate.draws_per_tick();
    debug!(budget, pending = recorder.borrow().pending(), "playback started");

    let mut tick_count = 0usize;
    let outcome = loop {
        if recorder.borrow().pending() == 0 {
            break PlaybackOutcome::Completed;
        }
        if control.is_cancelled() {
            break PlaybackOutcome::Cancelled;
        }
        if ticks.next().await.is_none() {
            break PlaybackOutcome::TicksExhausted;
        }
        if control.is_cancelled() {
            break PlaybackOutcome::Cancelled;
        }

        tick_count += 1;
        let report = {
            let mut recorder = recorder.borrow_mut();
            let report = recorder.drain_tick(budget);
            recorder.present();
            report
        };
        trace!(tick = tick_count, draws = report.draws, remaining = report.remaining, "playback tick");
    };

    debug!(?outcome, ticks = tick_count, "playback finished");
    outcome
}
