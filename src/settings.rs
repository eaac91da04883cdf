use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::persistence::SavePolicy;

pub const CLIENT_NAME: &str = "expense-ledger";
const CONFIG_NAME: &str = "config.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// SQLite file backing the key-value store.
    pub store_file: String,
    pub save_policy: SavePolicy,
    pub currency_symbol: String,
    /// Where tracing output goes while the terminal UI owns the screen.
    pub log_file: String,
}

impl Settings {
    /// Defaults, then the config file (if any), then `EXPENSE_LEDGER_*` variables.
    ///
    /// An explicit `config_path` must exist; the default location is optional.
    pub fn new(config_path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut s = Config::builder()
            .set_default("store_file", default_data_file("db"))?
            .set_default("save_policy", "always")?
            .set_default("currency_symbol", "$")?
            .set_default("log_file", default_data_file("log"))?;

        s = match config_path {
            Some(path) => s.add_source(File::with_name(path)),
            None => s.add_source(File::with_name(&default_config_path()).required(false)),
        };

        s.add_source(Environment::with_prefix("EXPENSE_LEDGER"))
            .build()?
            .try_deserialize()
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| std::env::temp_dir()))
        .join(CLIENT_NAME)
}

fn default_data_file(extension: &str) -> String {
    data_dir()
        .join(format!("{}.{}", CLIENT_NAME, extension))
        .display()
        .to_string()
}

pub fn default_config_path() -> String {
    dirs::config_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| std::env::temp_dir()))
        .join(CLIENT_NAME)
        .join(CONFIG_NAME)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!("expense-ledger-{}.toml", uuid::Uuid::new_v4()));
        {
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "store_file = \"/tmp/ledger-test.db\"").unwrap();
            writeln!(file, "save_policy = \"skip_empty\"").unwrap();
            writeln!(file, "currency_symbol = \"€\"").unwrap();
        }

        let settings = Settings::new(path.to_str()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(settings.store_file, "/tmp/ledger-test.db");
        assert_eq!(settings.save_policy, SavePolicy::SkipEmpty);
        assert_eq!(settings.currency_symbol, "€");
        assert!(settings.log_file.ends_with("expense-ledger.log"));
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        assert!(Settings::new(Some("/nonexistent/expense-ledger.toml")).is_err());
    }
}
