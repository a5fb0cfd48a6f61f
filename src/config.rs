use anyhow::Context;
use tracing::debug;

pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const MAX_CONNECTIONS_VAR: &str = "ATTENDANCE_DB_MAX_CONNECTIONS";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl DbConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so callers other than the
    /// process environment can supply values.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup(DATABASE_URL_VAR)
            .filter(|value| !value.trim().is_empty())
            .with_context(|| {
                format!("{DATABASE_URL_VAR} must be set to a production Postgres instance")
            })?;

        let max_connections = match lookup(MAX_CONNECTIONS_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|value| *value > 0)
                .with_context(|| {
                    format!("{MAX_CONNECTIONS_VAR} must be a positive integer, got {raw:?}")
                })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        debug!(max_connections, "loaded database config");
        Ok(Self {
            database_url,
            max_connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_pool_size() {
        let cfg = DbConfig::from_lookup(lookup_from(&[(
            DATABASE_URL_VAR,
            "postgres://localhost/educrm",
        )]))
        .unwrap();
        assert_eq!(cfg.database_url, "postgres://localhost/educrm");
        assert_eq!(cfg.max_connections, 5);
    }

    #[test]
    fn requires_database_url() {
        assert!(DbConfig::from_lookup(lookup_from(&[])).is_err());
        assert!(DbConfig::from_lookup(lookup_from(&[(DATABASE_URL_VAR, "  ")])).is_err());
    }

    #[test]
    fn rejects_bad_pool_size() {
        let lookup = lookup_from(&[
            (DATABASE_URL_VAR, "postgres://localhost/educrm"),
            (MAX_CONNECTIONS_VAR, "zero"),
        ]);
        assert!(DbConfig::from_lookup(lookup).is_err());

        let lookup = lookup_from(&[
            (DATABASE_URL_VAR, "postgres://localhost/educrm"),
            (MAX_CONNECTIONS_VAR, "12"),
        ]);
        assert_eq!(DbConfig::from_lookup(lookup).unwrap().max_connections, 12);
    }
}
