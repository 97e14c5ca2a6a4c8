use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thermo_dash_model::{
    render_current, render_stats, StatsPayload, StatsRange, TemperatureReading,
    CURRENT_TEMPERATURE_ELEMENT, STATS_ELEMENT,
};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::display::{Display, DisplayPointer};
use crate::source::{FetchError, TemperatureSource, TemperatureSourcePointer};

/// How often the current temperature is polled.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Fetch the current temperature once and show it.
///
/// On failure nothing is written and the error is logged and returned.
pub async fn poll_current(
    source: &(dyn TemperatureSource + Send + Sync),
    display: &(dyn Display + Send + Sync),
) -> Result<TemperatureReading, FetchError> {
    match source.fetch_current().await {
        Ok(reading) => {
            display.set_text(CURRENT_TEMPERATURE_ELEMENT, &render_current(&reading));
            display.push_reading(&reading);
            Ok(reading)
        }
        Err(e) => {
            log::warn!("Polling the current temperature failed: {e}");
            Err(e)
        }
    }
}

/// Fetch the statistics for `range` once and show them.
pub async fn load_stats(
    source: &(dyn TemperatureSource + Send + Sync),
    display: &(dyn Display + Send + Sync),
    range: &StatsRange,
) -> Result<StatsPayload, FetchError> {
    match source.fetch_stats(range).await {
        Ok(payload) => {
            if let Some(summary) = payload.summary() {
                log::info!(
                    "Stats {} .. {}: avg={} min={} max={} count={}",
                    range.start,
                    range.end,
                    summary.average,
                    summary.min,
                    summary.max,
                    summary.count
                );
            }
            display.set_text(STATS_ELEMENT, &render_stats(&payload));
            Ok(payload)
        }
        Err(e) => {
            log::warn!("Loading the stats failed: {e}");
            Err(e)
        }
    }
}

/// Drives a source and a display.
///
/// Every request runs as its own task on the given runtime, so callers (a UI timer, for
/// example) never wait on the network. Polls are not serialized: if a response is slower
/// than the interval, requests overlap and whichever resolves last is shown.
#[derive(Clone)]
pub struct Dashboard {
    source: TemperatureSourcePointer,
    display: DisplayPointer,
    runtime: Handle,
    stats_range: StatsRange,
    started: Arc<AtomicBool>,
}

impl Dashboard {
    pub fn new(source: TemperatureSourcePointer, display: DisplayPointer, runtime: Handle) -> Self {
        Self {
            source,
            display,
            runtime,
            stats_range: StatsRange::default(),
            started: Arc::default(),
        }
    }

    /// Fetch the stats. Only the first call on a dashboard (or any of its clones) does
    /// anything; later calls return `None`.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        if self.started.swap(true, Ordering::SeqCst) {
            log::warn!("Dashboard already started, not fetching stats again");
            return None;
        }

        let source = self.source.clone();
        let display = self.display.clone();
        let range = self.stats_range;
        Some(self.runtime.spawn(async move {
            let _ = load_stats(&*source, &*display, &range).await;
        }))
    }

    /// Issue one poll of the current temperature in the background.
    pub fn tick(&self) -> JoinHandle<()> {
        let source = self.source.clone();
        let display = self.display.clone();
        self.runtime.spawn(async move {
            let _ = poll_current(&*source, &*display).await;
        })
    }

    /// Call [`Dashboard::tick`] every `period`, first after one full period, until the
    /// returned handle is stopped or dropped.
    pub fn spawn_poller(&self, period: Duration) -> PollerHandle {
        let dashboard = self.clone();
        let task = self.runtime.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                dashboard.tick();
            }
        });

        PollerHandle { task }
    }
}

/// Keeps a poller running. Dropping it stops the timer; polls already in flight still finish.
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn stop(self) {
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
