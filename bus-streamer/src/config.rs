/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! json5 configuration of a streamer instance.
//!
//! ```
//! use bus_streamer::StreamerConfig;
//! use std::time::Duration;
//!
//! let config = StreamerConfig::from_json5_str(
//!     r#"{
//!         streamer: { name: "hall-a", sink_buffer: 16 },
//!         bus: { send_timeout: "2s", inactivity_timeout: "5m" },
//!     }"#,
//! )
//! .unwrap();
//!
//! assert_eq!(config.streamer.sink_buffer, 16);
//! assert_eq!(config.bus.inactivity_timeout, Some(Duration::from_secs(300)));
//! assert_eq!(config.log.level, "info");
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_NAME: &str = "bus-streamer";
const DEFAULT_SINK_BUFFER: usize = 64;
const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse config: {0}")]
    Parse(#[from] json5::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StreamerConfig {
    #[serde(default)]
    pub streamer: StreamerSection,
    #[serde(default)]
    pub bus: BusSection,
    #[serde(default)]
    pub log: LogSection,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct StreamerSection {
    /// Instance name, shown in logs.
    pub name: String,
    /// Capacity of each channel-backed subscriber sink.
    pub sink_buffer: usize,
}

impl Default for StreamerSection {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            sink_buffer: DEFAULT_SINK_BUFFER,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct BusSection {
    /// Upper bound for one outbound bus send.
    #[serde(with = "humantime_serde")]
    pub send_timeout: Duration,
    /// Shut down when the bus stays silent this long. Unset disables the check.
    #[serde(with = "humantime_serde")]
    pub inactivity_timeout: Option<Duration>,
}

impl Default for BusSection {
    fn default() -> Self {
        Self {
            send_timeout: DEFAULT_SEND_TIMEOUT,
            inactivity_timeout: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct LogSection {
    /// Fallback filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl StreamerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json5_str(&contents)
    }

    /// Parses and validates a json5 document.
    pub fn from_json5_str(contents: &str) -> Result<Self, ConfigError> {
        let config: StreamerConfig = json5::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.streamer.name.trim().is_empty() {
            return Err(ConfigError::Invalid("streamer.name must not be empty".into()));
        }
        if self.streamer.sink_buffer == 0 {
            return Err(ConfigError::Invalid(
                "streamer.sink_buffer must be greater than zero".into(),
            ));
        }
        if self.bus.send_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "bus.send_timeout must be greater than zero".into(),
            ));
        }
        if self.bus.inactivity_timeout.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::Invalid(
                "bus.inactivity_timeout must be greater than zero when set".into(),
            ));
        }
        let level = self.log.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "log.level {:?} is not one of {}",
                self.log.level,
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }
}
