//! Server configuration read from the process environment.

use shopcart_cart::CartConfig;
use shopcart_db::DbConfig;
use thiserror::Error;

pub const ENV_DB_URL: &str = "SHOPCART_DB_URL";
pub const ENV_DB_NAMESPACE: &str = "SHOPCART_DB_NAMESPACE";
pub const ENV_DB_DATABASE: &str = "SHOPCART_DB_DATABASE";
pub const ENV_DB_USERNAME: &str = "SHOPCART_DB_USERNAME";
pub const ENV_DB_PASSWORD: &str = "SHOPCART_DB_PASSWORD";
pub const ENV_STRICT_PRICE_LOOKUP: &str = "SHOPCART_STRICT_PRICE_LOOKUP";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a boolean, got {value:?}")]
    InvalidBool { name: &'static str, value: String },

    #[error("{name} must not be empty")]
    Empty { name: &'static str },
}

/// Everything the runner needs to build an [`App`](crate::App).
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub db: DbConfig,
    pub cart: CartConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source; unset variables keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let db = &mut config.db;

        for (name, slot) in [
            (ENV_DB_URL, &mut db.url),
            (ENV_DB_NAMESPACE, &mut db.namespace),
            (ENV_DB_DATABASE, &mut db.database),
            (ENV_DB_USERNAME, &mut db.username),
            (ENV_DB_PASSWORD, &mut db.password),
        ] {
            if let Some(value) = lookup(name) {
                if value.trim().is_empty() {
                    return Err(ConfigError::Empty { name });
                }
                *slot = value;
            }
        }

        if let Some(value) = lookup(ENV_STRICT_PRICE_LOOKUP) {
            config.cart.strict_price_lookup = parse_bool(ENV_STRICT_PRICE_LOOKUP, &value)?;
        }

        Ok(config)
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            name,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn unset_variables_keep_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.db.url, DbConfig::default().url);
        assert_eq!(config.db.namespace, "shopcart");
        assert!(!config.cart.strict_price_lookup);
    }

    #[test]
    fn variables_override_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[
            (ENV_DB_URL, "mem://"),
            (ENV_DB_DATABASE, "carts"),
            (ENV_STRICT_PRICE_LOOKUP, "TRUE"),
        ]))
        .unwrap();
        assert_eq!(config.db.url, "mem://");
        assert_eq!(config.db.database, "carts");
        assert!(config.cart.strict_price_lookup);
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert_eq!(
            ServerConfig::from_lookup(lookup(&[(ENV_STRICT_PRICE_LOOKUP, "maybe")])).unwrap_err(),
            ConfigError::InvalidBool {
                name: ENV_STRICT_PRICE_LOOKUP,
                value: "maybe".into(),
            }
        );
        assert_eq!(
            ServerConfig::from_lookup(lookup(&[(ENV_DB_URL, " ")])).unwrap_err(),
            ConfigError::Empty { name: ENV_DB_URL }
        );
    }
}
