use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thermo_dash_model::TemperatureReading;

/// A surface with text elements addressed by identifier.
///
/// The elements must already exist; a display never creates them and may drop updates for
/// identifiers it does not have.
pub trait Display {
    /// Replaces the text content of the element `element_id`.
    fn set_text(&self, element_id: &str, text: &str);

    /// Called with every successfully polled reading, after its text was set. Displays that
    /// keep a history of readings override this.
    fn push_reading(&self, _reading: &TemperatureReading) {}
}

pub type DisplayPointer = Arc<dyn Display + Send + Sync>;

/// Keeps the latest text per element in memory. Used for headless runs.
#[derive(Clone, Default)]
pub struct MemoryDisplay(Arc<Mutex<MemoryDisplayState>>);

#[derive(Default)]
struct MemoryDisplayState {
    texts: HashMap<String, String>,
    writes: HashMap<String, usize>,
}

impl MemoryDisplay {
    /// Current text of `element_id`, if it was ever written.
    pub fn text(&self, element_id: &str) -> Option<String> {
        self.lock().texts.get(element_id).cloned()
    }

    /// Number of times `element_id` was written.
    pub fn writes(&self, element_id: &str) -> usize {
        self.lock().writes.get(element_id).copied().unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryDisplayState> {
        // A panic while holding the lock cannot leave the maps half-updated.
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Display for MemoryDisplay {
    fn set_text(&self, element_id: &str, text: &str) {
        let mut state = self.lock();
        state.texts.insert(element_id.to_string(), text.to_string());
        *state.writes.entry(element_id.to_string()).or_default() += 1;
    }
}

/// Writes every update to the log.
#[derive(Clone, Copy, Default)]
pub struct LogDisplay;

impl Display for LogDisplay {
    fn set_text(&self, element_id: &str, text: &str) {
        log::info!("#{element_id}: {text}");
    }
}

#[test]
fn test_memory_display() {
    let display = MemoryDisplay::default();
    assert_eq!(display.text("stats"), None);
    assert_eq!(display.writes("stats"), 0);

    display.set_text("stats", "Stats: {}");
    display.set_text("stats", "Stats: {\"days\":3}");

    assert_eq!(display.text("stats").as_deref(), Some("Stats: {\"days\":3}"));
    assert_eq!(display.writes("stats"), 2);
    assert_eq!(display.text("current-temperature"), None);
}
