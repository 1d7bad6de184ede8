pub mod dataset;
pub mod domain;
pub mod ingest;
pub mod query;
pub mod response;

pub mod config {
    use crate::domain::price::PercentChangePolicy;
    use anyhow::Context;
    use std::path::PathBuf;

    const DEFAULT_DATA_PATH: &str = "TSLA.csv";
    const DEFAULT_PORT: u16 = 3000;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub data_path: PathBuf,
        pub row_limit: Option<usize>,
        pub percent_change_policy: Option<String>,
        pub port: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> Self {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
            let data_path = lookup("PRICE_DATA_PATH")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

            let row_limit = lookup("QUERY_ROW_LIMIT").and_then(|s| s.trim().parse::<usize>().ok());

            Self {
                data_path,
                row_limit,
                percent_change_policy: lookup("PERCENT_CHANGE_ON_ZERO_OPEN")
                    .filter(|s| !s.trim().is_empty()),
                port: lookup("PORT").filter(|s| !s.trim().is_empty()),
                sentry_dsn: lookup("SENTRY_DSN").filter(|s| !s.trim().is_empty()),
            }
        }

        pub fn require_port(&self) -> anyhow::Result<u16> {
            match self.port.as_deref() {
                Some(s) => s
                    .trim()
                    .parse::<u16>()
                    .with_context(|| format!("PORT must be a valid port number (got {s:?})")),
                None => Ok(DEFAULT_PORT),
            }
        }

        pub fn require_percent_change_policy(&self) -> anyhow::Result<PercentChangePolicy> {
            match self.percent_change_policy.as_deref() {
                Some(s) => s.parse::<PercentChangePolicy>().context("invalid PERCENT_CHANGE_ON_ZERO_OPEN"),
                None => Ok(PercentChangePolicy::default()),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::collections::HashMap;

        fn settings_from(pairs: &[(&str, &str)]) -> Settings {
            let env: HashMap<String, String> = pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            Settings::from_lookup(|key| env.get(key).cloned())
        }

        #[test]
        fn defaults_when_env_is_empty() {
            let s = settings_from(&[]);
            assert_eq!(s.data_path, PathBuf::from("TSLA.csv"));
            assert_eq!(s.row_limit, None);
            assert_eq!(s.require_port().unwrap(), 3000);
            assert_eq!(
                s.require_percent_change_policy().unwrap(),
                PercentChangePolicy::NullOnZeroOpen
            );
            assert!(s.sentry_dsn.is_none());
        }

        #[test]
        fn ignores_unparseable_row_limit() {
            let s = settings_from(&[("QUERY_ROW_LIMIT", "lots")]);
            assert_eq!(s.row_limit, None);

            let s = settings_from(&[("QUERY_ROW_LIMIT", " 20 ")]);
            assert_eq!(s.row_limit, Some(20));
        }

        #[test]
        fn bad_port_only_fails_when_required() {
            let s = settings_from(&[("PORT", "http")]);
            assert!(s.require_port().is_err());
            assert_eq!(s.data_path, PathBuf::from("TSLA.csv"));

            assert_eq!(settings_from(&[("PORT", "8080")]).require_port().unwrap(), 8080);
        }

        #[test]
        fn reads_percent_change_policy() {
            let s = settings_from(&[("PERCENT_CHANGE_ON_ZERO_OPEN", "zero")]);
            assert_eq!(
                s.require_percent_change_policy().unwrap(),
                PercentChangePolicy::ZeroOnZeroOpen
            );
            let s = settings_from(&[("PERCENT_CHANGE_ON_ZERO_OPEN", "nan")]);
            assert!(s.require_percent_change_policy().is_err());
        }
    }
}
