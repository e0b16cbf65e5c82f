mod config;
mod display;
mod error;
mod font;
mod logging;
mod metrics;
mod render;
mod session;
mod shutdown;

use config::MonitorConfig;
use display::DisplayAdapter;
use metrics::MetricsCollector;
use session::Session;
use tracing::{info, warn};

fn main() {
    logging::init();

    if let Err(err) = shutdown::install() {
        warn!(%err, "signal handlers not installed, display will not be blanked on exit");
    }

    let config = MonitorConfig::default();
    let display = DisplayAdapter::initialize(&config);
    let mode = if display.available() { "oled" } else { "console" };
    info!(mode, "starting monitor");

    let collector = MetricsCollector::new(&config);
    let mut session = Session::new(collector, display, config.interval);
    session.run_until(shutdown::requested);

    // Dropping the session releases the panel.
    drop(session);
    info!("monitor stopped");
}
