//! Server configuration.
//!
//! Values come from the environment (a `.env` file is loaded first, if
//! present). Command-line flags override them.
//!
//! | Variable                   | Default | Meaning                                  |
//! |----------------------------|---------|------------------------------------------|
//! | `STOCKVIEW_PORT`           | `3000`  | HTTP port                                |
//! | `STOCKVIEW_DATA`           | unset   | CSV path or URL loaded at startup        |
//! | `STOCKVIEW_DELIMITER`      | unset   | Force the CSV delimiter                  |
//! | `STOCKVIEW_EVENT_CAPACITY` | `64`    | Buffered dashboard events per subscriber |

use std::env;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default dashboard event buffer.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

pub const ENV_PORT: &str = "STOCKVIEW_PORT";
pub const ENV_DATA: &str = "STOCKVIEW_DATA";
pub const ENV_DELIMITER: &str = "STOCKVIEW_DELIMITER";
pub const ENV_EVENT_CAPACITY: &str = "STOCKVIEW_EVENT_CAPACITY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    /// Dataset loaded at startup.
    pub data_source: Option<String>,
    pub delimiter: Option<char>,
    pub event_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_source: None,
            delimiter: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl Config {
    /// Read the configuration from the process environment.
    ///
    /// Unparsable values fall back to their defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            port: lookup(ENV_PORT)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.port),
            data_source: lookup(ENV_DATA).filter(|v| !v.trim().is_empty()),
            delimiter: lookup(ENV_DELIMITER).and_then(|v| parse_delimiter(&v)),
            event_capacity: lookup(ENV_EVENT_CAPACITY)
                .and_then(|v| v.trim().parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.event_capacity),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_data_source(mut self, source: impl Into<String>) -> Self {
        self.data_source = Some(source.into());
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }
}

/// A single character, or the names `tab` / `\t`.
pub fn parse_delimiter(raw: &str) -> Option<char> {
    match raw {
        "tab" | "TAB" | "\\t" => Some('\t'),
        _ => {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => None,
            }
        }
    }
}
