use crate::display::{DisplayAdapter, Panel};
use crate::metrics::Telemetry;
use crate::render::{Page, render};
use anyhow::Context;
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Longest single sleep while waiting out the loop interval, so a stop
/// request is noticed promptly.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// The loop state: where readings come from, where pages go, and which page
/// is next.
pub struct Session<T: Telemetry, P: Panel, W: Write> {
    telemetry: T,
    display: DisplayAdapter<P, W>,
    page: Page,
    interval: Duration,
}

impl<T: Telemetry, P: Panel, W: Write> Session<T, P, W> {
    pub fn new(telemetry: T, display: DisplayAdapter<P, W>, interval: Duration) -> Self {
        Session {
            telemetry,
            display,
            page: Page::default(),
            interval,
        }
    }

    #[cfg(test)]
    pub(crate) fn page(&self) -> Page {
        self.page
    }

    /// One iteration. Failures are logged and swallowed; the page advances
    /// either way so the cadence seen by an observer never changes.
    pub fn step(&mut self) {
        if let Err(err) = self.iterate() {
            error!("runtime exception: {err:?}");
        }
        self.page = self.page.next();
    }

    fn iterate(&mut self) -> anyhow::Result<()> {
        let snapshot = self.telemetry.collect();
        let lines = render(&snapshot, self.page);
        self.display
            .render_page(self.page, &lines)
            .with_context(|| format!("rendering page {}", self.page.index()))?;
        Ok(())
    }

    /// Step, then wait out the interval, until `stop` returns true. Without a
    /// stop request this never returns.
    pub fn run_until(&mut self, stop: impl Fn() -> bool) {
        while !stop() {
            self.step();
            self.pause(&stop);
        }
        info!("stop requested, leaving main loop");
    }

    fn pause(&self, stop: &impl Fn() -> bool) {
        let deadline = Instant::now() + self.interval;
        loop {
            let now = Instant::now();
            if now >= deadline || stop() {
                break;
            }
            thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }
}
