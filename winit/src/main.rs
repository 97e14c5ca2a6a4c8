// Prevent console window in addition to Slint window in Windows release builds when, e.g., starting the app via file manager. Ignored on other platforms.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

slint::include_modules!();

use std::sync::Arc;

use slint::Model;
use thermo_dash_common::{
    Dashboard, DashboardConfig, Display, HttpTemperatureSource, LogDisplay, POLL_INTERVAL,
};
use thermo_dash_model::{TemperatureReading, CURRENT_TEMPERATURE_ELEMENT, STATS_ELEMENT};

/// Our App struct that holds the UI, the dashboard and the poll timer.
///
/// The network requests run on a tokio runtime owned by the App. The Slint timer only
/// kicks them off, so the UI thread never waits on the server.
struct App {
    ui: AppWindow,
    dashboard: Dashboard,
    timer: slint::Timer,
    _runtime: tokio::runtime::Runtime,
}

impl App {
    /// Create a new App struct.
    fn new(config: DashboardConfig) -> anyhow::Result<Self> {
        // Make a new AppWindow
        let ui = AppWindow::new()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        // Initialize the view model with an empty history
        let records: std::rc::Rc<slint::VecModel<ReadingRecord>> = std::rc::Rc::default();
        ui.global::<ViewModel>()
            .set_records(slint::ModelRc::from(records));

        let display = SlintDisplay {
            ui: ui.as_weak(),
            history_len: config.history_len,
        };
        let source = HttpTemperatureSource::new(config.server_url);
        let dashboard = Dashboard::new(Arc::new(source), Arc::new(display), runtime.handle().clone());

        Ok(Self {
            ui,
            dashboard,
            timer: slint::Timer::default(),
            _runtime: runtime,
        })
    }

    /// Load the stats once, then poll the current temperature on every timer tick.
    fn run(&mut self) -> anyhow::Result<()> {
        self.dashboard.start();

        let dashboard = self.dashboard.clone();
        self.timer.start(slint::TimerMode::Repeated, POLL_INTERVAL, move || {
            dashboard.tick();
        });

        // Run the UI (and map an error to an anyhow::Error).
        self.ui.run().map_err(|e| e.into())
    }
}

/// Routes dashboard updates to the `ViewModel` properties of the window.
///
/// Updates may come from any runtime thread; they are applied on the Slint event loop.
struct SlintDisplay {
    ui: slint::Weak<AppWindow>,
    history_len: usize,
}

impl Display for SlintDisplay {
    fn set_text(&self, element_id: &str, text: &str) {
        let text = slint::SharedString::from(text);
        let result = match element_id {
            CURRENT_TEMPERATURE_ELEMENT => self
                .ui
                .upgrade_in_event_loop(move |ui| ui.global::<ViewModel>().set_current_temperature(text)),
            STATS_ELEMENT => self
                .ui
                .upgrade_in_event_loop(move |ui| ui.global::<ViewModel>().set_stats(text)),
            _ => {
                log::warn!("No element with id {element_id:?}");
                return;
            }
        };

        if let Err(e) = result {
            log::error!("Cannot update #{element_id}: {e}");
        }
    }

    fn push_reading(&self, reading: &TemperatureReading) {
        let record: ReadingRecord = thermo_dash_model::ReadingRecord::now(reading).into();
        let history_len = self.history_len;

        let result = self.ui.upgrade_in_event_loop(move |ui| {
            let records = ui.global::<ViewModel>().get_records();
            let Some(records) = records
                .as_any()
                .downcast_ref::<slint::VecModel<ReadingRecord>>()
            else {
                return;
            };

            push_record(records, record, history_len);
        });

        if let Err(e) = result {
            log::error!("Cannot record reading: {e}");
        }
    }
}

/// Insert `record` at the top of the history, keeping at most `history_len` entries.
fn push_record(records: &slint::VecModel<ReadingRecord>, record: ReadingRecord, history_len: usize) {
    records.insert(0, record);
    while records.row_count() > history_len {
        records.remove(records.row_count() - 1);
    }
}

/// Convert a polled reading into a record for the history list.
impl From<thermo_dash_model::ReadingRecord> for ReadingRecord {
    fn from(record: thermo_dash_model::ReadingRecord) -> Self {
        Self {
            temperature_celsius: record.temperature as f32,
            timestamp: slint::SharedString::from(
                record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            ),
        }
    }
}

/// A minimal main function that initializes the App and runs it.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = DashboardConfig::from_env();
    log::info!("Using temperature server at {}", config.server_url);

    if config.headless {
        return run_headless(config);
    }

    let mut app = App::new(config)?;

    app.run()
}

/// Poll without a window, logging every update, until Ctrl-C.
fn run_headless(config: DashboardConfig) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let source = HttpTemperatureSource::new(config.server_url);
    let dashboard = Dashboard::new(Arc::new(source), Arc::new(LogDisplay), runtime.handle().clone());

    dashboard.start();
    let poller = dashboard.spawn_poller(POLL_INTERVAL);

    runtime.block_on(tokio::signal::ctrl_c())?;
    log::info!("Interrupted, stopping");
    poller.stop();

    Ok(())
}
