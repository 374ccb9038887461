//! Browser console logging
//!
//! Routes `tracing` events to the developer console.

use std::sync::Once;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_web::MakeWebConsoleWriter;

static INIT: Once = Once::new();

/// Install the console subscriber with `level` as the filter directive.
///
/// Invalid directives fall back to `info`. Only the first call has an effect.
pub fn init_logging(level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

        let console = fmt::layer()
            .with_ansi(false)
            .without_time()
            .with_target(true)
            .with_writer(MakeWebConsoleWriter::new());

        if tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .try_init()
            .is_err()
        {
            web_sys::console::warn_1(&"tracing subscriber already installed".into());
        }
    });
}
