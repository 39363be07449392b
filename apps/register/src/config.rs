//! # Register Configuration
//!
//! Loads `register.toml`, applies `TILL_*` environment overrides, and
//! validates the result before anything is opened.
//!
//! ## Priority Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │   1. Environment Variables (highest)                                    │
//! │      TILL_DB_PATH, TILL_TAX_RATE, TILL_CASHIER_ID, ...                  │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │   2. Config File                                                        │
//! │      --config <path>, else <config dir>/register.toml                   │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │   3. Default Values (lowest)                                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Config File
//! ```toml
//! [store]
//! name = "Downtown Liquor"
//! report_top_products = 5
//!
//! [checkout]
//! tax_rate_bps = 825
//! cashier_id = "CASHIER-007"
//! terminal_id = "02"
//!
//! [database]
//! path = "/var/lib/till/till.db"
//! durable_writes = true
//! max_connections = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use till_core::report::DEFAULT_TOP_PRODUCTS;
use till_core::{CheckoutConfig, TaxRate};
use till_db::DbConfig;
use tracing::{debug, info, warn};

use crate::error::{RegisterError, RegisterResult};

/// File name looked up in the per-user config directory.
pub const CONFIG_FILE_NAME: &str = "register.toml";

/// Database file name in the per-user data directory.
pub const DATABASE_FILE_NAME: &str = "till.db";

// =============================================================================
// Sections
// =============================================================================

/// Store-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSection {
    /// Shown in the console banner.
    #[serde(default = "default_store_name")]
    pub name: String,

    /// How many products the daily report ranks.
    #[serde(default = "default_top_products")]
    pub report_top_products: usize,
}

fn default_store_name() -> String {
    "Till".to_string()
}

fn default_top_products() -> usize {
    DEFAULT_TOP_PRODUCTS
}

impl Default for StoreSection {
    fn default() -> Self {
        StoreSection {
            name: default_store_name(),
            report_top_products: default_top_products(),
        }
    }
}

/// Where and how the sales ledger is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSection {
    /// Database file. `None` means the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// `synchronous = FULL`. Turning this off risks losing the last
    /// acknowledged sale on power failure.
    #[serde(default = "default_durable_writes")]
    pub durable_writes: bool,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_durable_writes() -> bool {
    true
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSection {
    fn default() -> Self {
        DatabaseSection {
            path: None,
            durable_writes: default_durable_writes(),
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Register Configuration
// =============================================================================

/// Complete register configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterConfig {
    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub checkout: CheckoutConfig,

    #[serde(default)]
    pub database: DatabaseSection,
}

impl RegisterConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, else the platform default)
    /// 3. Environment variables
    ///
    /// An explicitly named file that does not exist is an error; a missing
    /// default file is not.
    pub fn load(config_path: Option<PathBuf>) -> RegisterResult<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(&path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => {
                    warn!("Could not determine config directory, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML file without applying overrides.
    pub fn from_file(path: &Path) -> RegisterResult<Self> {
        info!(?path, "Loading register config from file");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> RegisterResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Checks every section, reporting the first problem found.
    pub fn validate(&self) -> RegisterResult<()> {
        self.checkout.validate()?;

        if self.store.name.trim().is_empty() {
            return Err(RegisterError::config("store.name must not be empty"));
        }
        if self.store.report_top_products == 0 {
            return Err(RegisterError::config(
                "store.report_top_products must be greater than 0",
            ));
        }
        if self.database.max_connections == 0 {
            return Err(RegisterError::config(
                "database.max_connections must be greater than 0",
            ));
        }
        if let Some(path) = &self.database.path {
            if path.as_os_str().is_empty() {
                return Err(RegisterError::config("database.path must not be empty"));
            }
        }

        Ok(())
    }

    /// Applies `TILL_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup. Unparseable values are
    /// ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("TILL_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(name) = lookup("TILL_STORE_NAME") {
            self.store.name = name;
        }

        // Percent form first so an exact bps value wins when both are set
        if let Some(rate) = lookup("TILL_TAX_RATE") {
            match rate.parse::<TaxRate>() {
                Ok(rate) => {
                    debug!(bps = rate.bps(), "Overriding tax rate from environment");
                    self.checkout.tax_rate_bps = rate.bps();
                }
                Err(e) => warn!(value = %rate, error = %e, "Ignoring unusable TILL_TAX_RATE"),
            }
        }

        if let Some(bps) = lookup("TILL_TAX_RATE_BPS") {
            match bps.trim().parse::<u32>() {
                Ok(bps) => {
                    debug!(bps, "Overriding tax rate from environment");
                    self.checkout.tax_rate_bps = bps;
                }
                Err(_) => warn!(value = %bps, "Ignoring unparseable TILL_TAX_RATE_BPS"),
            }
        }

        if let Some(cashier) = lookup("TILL_CASHIER_ID") {
            self.checkout.cashier_id = cashier;
        }

        if let Some(terminal) = lookup("TILL_TERMINAL_ID") {
            debug!(terminal = %terminal, "Overriding terminal id from environment");
            self.checkout.terminal_id = terminal;
        }

        if let Some(code) = lookup("TILL_CURRENCY") {
            self.checkout.currency_code = code;
        }

        if let Some(locale) = lookup("TILL_LOCALE") {
            self.checkout.locale = locale;
        }

        if let Some(durable) = lookup("TILL_DURABLE_WRITES") {
            match durable.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.database.durable_writes = true,
                "0" | "false" | "no" | "off" => self.database.durable_writes = false,
                _ => warn!(value = %durable, "Ignoring unparseable TILL_DURABLE_WRITES"),
            }
        }
    }

    /// The configured database file, else `<data dir>/till.db`, else
    /// `./till.db` when the platform has no data directory.
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.database.path {
            return path.clone();
        }
        match directories::ProjectDirs::from("com", "till", "register") {
            Some(dirs) => dirs.data_dir().join(DATABASE_FILE_NAME),
            None => PathBuf::from(DATABASE_FILE_NAME),
        }
    }

    /// Pool settings for [`till_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path())
            .max_connections(self.database.max_connections)
            .durable_writes(self.database.durable_writes)
    }

    /// `<config dir>/register.toml` on this platform.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "till", "register")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
