//! Fetch-and-render plumbing for the temperature dashboard.
//!
//! A [`TemperatureSource`] provides readings and statistics, a [`Display`] receives the rendered
//! text, and the [`Dashboard`] drives both: once at startup for the statistics, and on every timer
//! tick for the current temperature.

mod config;
mod dashboard;
mod display;
mod source;

pub use config::DashboardConfig;
pub use dashboard::{load_stats, poll_current, Dashboard, PollerHandle, POLL_INTERVAL};
pub use display::{Display, DisplayPointer, LogDisplay, MemoryDisplay};
pub use source::{
    FetchError, HttpTemperatureSource, TemperatureSource, TemperatureSourcePointer,
};
