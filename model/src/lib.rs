use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier of the text element showing the latest polled temperature.
pub const CURRENT_TEMPERATURE_ELEMENT: &str = "current-temperature";

/// Identifier of the text element showing the statistics summary.
pub const STATS_ELEMENT: &str = "stats";

/// A single reading as served by `GET /current`.
///
/// The server also sends a `unit` field (`"Celsius"`), which is kept when present.
/// The rendered text always uses `°C`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct TemperatureReading {
    pub temperature: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Inclusive date range sent as `start`/`end` query parameters to `GET /stats`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatsRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl StatsRange {
    /// The fixed range the dashboard asks for.
    pub fn october_2023() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2023, 10, 1).expect("2023-10-01 is a valid date"),
            end: NaiveDate::from_ymd_opt(2023, 10, 31).expect("2023-10-31 is a valid date"),
        }
    }

    /// Query parameters in request order.
    pub fn query(&self) -> [(&'static str, String); 2] {
        [
            ("start", self.start.format("%Y-%m-%d").to_string()),
            ("end", self.end.format("%Y-%m-%d").to_string()),
        ]
    }

    /// `start=YYYY-MM-DD&end=YYYY-MM-DD`
    pub fn query_string(&self) -> String {
        self.query()
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl Default for StatsRange {
    fn default() -> Self {
        Self::october_2023()
    }
}

/// The aggregate the temperature server computes for a range.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct TemperatureStats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub count: u64,
}

/// Body of `GET /stats`.
///
/// The client does not enforce a schema; the payload is shown verbatim.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(transparent)]
pub struct StatsPayload(pub serde_json::Value);

impl StatsPayload {
    /// Typed view of the payload, if it has the server's usual shape.
    pub fn summary(&self) -> Option<TemperatureStats> {
        serde_json::from_value(self.0.clone()).ok()
    }
}

/// Text for the current temperature element.
///
/// Magnitudes of 1e21 and above print in full rather than in exponent form.
pub fn render_current(reading: &TemperatureReading) -> String {
    format!("Current Temperature: {}°C", reading.temperature)
}

/// Text for the stats element: the compact JSON serialization of the payload.
///
/// Whole numbers print without a fractional part, as a JavaScript `Number` does, so `0.0`
/// becomes `0`.
pub fn render_stats(payload: &StatsPayload) -> String {
    let mut value = payload.0.clone();
    integralize_numbers(&mut value);
    format!("Stats: {value}")
}

/// Largest magnitude below which every integer is exactly representable as `f64`.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Rewrites whole floats (`21.0`) as integers (`21`), recursively.
fn integralize_numbers(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Number(number) if number.is_f64() => {
            if let Some(float) = number.as_f64() {
                if float.fract() == 0.0 && float.abs() <= MAX_SAFE_INTEGER {
                    *number = serde_json::Number::from(float as i64);
                }
            }
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(integralize_numbers),
        serde_json::Value::Object(map) => map.values_mut().for_each(integralize_numbers),
        _ => {}
    }
}

/// One entry of the reading history shown below the current temperature.
#[derive(Clone, Debug, PartialEq)]
pub struct ReadingRecord {
    pub temperature: f64,
    pub timestamp: chrono::DateTime<chrono::Local>,
}

impl ReadingRecord {
    pub fn now(reading: &TemperatureReading) -> Self {
        Self {
            temperature: reading.temperature,
            timestamp: chrono::Local::now(),
        }
    }
}

#[test]
fn test_render_current() {
    let reading: TemperatureReading = serde_json::from_str(r#"{ "temperature": 21.5 }"#).unwrap();
    assert_eq!(render_current(&reading), "Current Temperature: 21.5°C");

    // Whole numbers render without a fractional part.
    let reading: TemperatureReading =
        serde_json::from_str(r#"{"temperature": 21.0, "unit": "Celsius"}"#).unwrap();
    assert_eq!(reading.unit.as_deref(), Some("Celsius"));
    assert_eq!(render_current(&reading), "Current Temperature: 21°C");
}

#[test]
fn test_reading_requires_numeric_temperature() {
    assert!(serde_json::from_str::<TemperatureReading>(r#"{}"#).is_err());
    assert!(serde_json::from_str::<TemperatureReading>(r#"{"temperature": "hot"}"#).is_err());
}

#[test]
fn test_render_stats_keeps_key_order() {
    let payload: StatsPayload = serde_json::from_str(r#"{"days":3}"#).unwrap();
    assert_eq!(render_stats(&payload), r#"Stats: {"days":3}"#);

    let payload: StatsPayload =
        serde_json::from_str(r#"{ "max": 30.5, "average": 25.25, "min": 20, "count": 4 }"#).unwrap();
    assert_eq!(
        render_stats(&payload),
        r#"Stats: {"max":30.5,"average":25.25,"min":20,"count":4}"#
    );
    assert_eq!(
        payload.summary(),
        Some(TemperatureStats { average: 25.25, min: 20.0, max: 30.5, count: 4 })
    );
}

#[test]
fn test_render_stats_prints_whole_floats_as_integers() {
    let payload: StatsPayload =
        serde_json::from_str(r#"{"average":0.0,"count":0,"max":0.0,"min":0.0}"#).unwrap();
    assert_eq!(render_stats(&payload), r#"Stats: {"average":0,"count":0,"max":0,"min":0}"#);

    let payload: StatsPayload =
        serde_json::from_str(r#"{"max":-3.0,"days":[1.0,2.5,{"n":1e3}]}"#).unwrap();
    assert_eq!(
        render_stats(&payload),
        r#"Stats: {"max":-3,"days":[1,2.5,{"n":1000}]}"#
    );
}

#[test]
fn test_stats_range_query() {
    let range = StatsRange::default();
    assert_eq!(range.query_string(), "start=2023-10-01&end=2023-10-31");
}
