/// Runtime settings, read from the environment.
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardConfig {
    /// Base URL of the temperature server, without a trailing slash.
    pub server_url: String,

    /// How many readings the history list keeps.
    pub history_len: usize,

    /// Log updates instead of opening a window.
    pub headless: bool,
}

impl DashboardConfig {
    pub const SERVER_URL_VAR: &'static str = "THERMO_DASH_SERVER_URL";
    pub const HISTORY_VAR: &'static str = "THERMO_DASH_HISTORY";
    pub const HEADLESS_VAR: &'static str = "THERMO_DASH_HEADLESS";

    pub const DEFAULT_SERVER_URL: &'static str = "http://localhost:8080";
    pub const DEFAULT_HISTORY_LEN: usize = 60;

    /// Read the config from the process environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let server_url = lookup(Self::SERVER_URL_VAR)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_SERVER_URL.into());

        let history_len = match lookup(Self::HISTORY_VAR) {
            Some(value) => value.trim().parse().unwrap_or_else(|_| {
                log::warn!(
                    "Ignoring invalid {}={value:?}, using {}",
                    Self::HISTORY_VAR,
                    Self::DEFAULT_HISTORY_LEN
                );
                Self::DEFAULT_HISTORY_LEN
            }),
            None => Self::DEFAULT_HISTORY_LEN,
        };

        let headless = lookup(Self::HEADLESS_VAR)
            .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            server_url,
            history_len,
            headless,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            server_url: Self::DEFAULT_SERVER_URL.into(),
            history_len: Self::DEFAULT_HISTORY_LEN,
            headless: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(DashboardConfig::from_lookup(lookup(&[])), DashboardConfig::default());
    }

    #[test]
    fn trims_trailing_slash() {
        let config = DashboardConfig::from_lookup(lookup(&[(
            DashboardConfig::SERVER_URL_VAR,
            "http://sensor.local:9000/",
        )]));
        assert_eq!(config.server_url, "http://sensor.local:9000");
    }

    #[test]
    fn invalid_history_falls_back() {
        let config =
            DashboardConfig::from_lookup(lookup(&[(DashboardConfig::HISTORY_VAR, "lots")]));
        assert_eq!(config.history_len, DashboardConfig::DEFAULT_HISTORY_LEN);

        let config = DashboardConfig::from_lookup(lookup(&[(DashboardConfig::HISTORY_VAR, "5")]));
        assert_eq!(config.history_len, 5);
    }

    #[test]
    fn headless_flag() {
        let config = DashboardConfig::from_lookup(lookup(&[(DashboardConfig::HEADLESS_VAR, "1")]));
        assert!(config.headless);

        let config = DashboardConfig::from_lookup(lookup(&[(DashboardConfig::HEADLESS_VAR, "0")]));
        assert!(!config.headless);
    }
}
