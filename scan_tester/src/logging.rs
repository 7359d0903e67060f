// THEORY:
// The tester logs through `tracing`, same as the library. A normal run prints the
// scan summaries at `info`. Passing `--debug` lowers the floor to `debug`, which
// also shows the engine's sub-view, stack and playback messages, and lets
// `RUST_LOG` narrow it further (e.g. `RUST_LOG=pixel_scan::core_modules::player=trace`).

use tracing_subscriber::EnvFilter;

pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    // A second init (tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
