// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Drive configuration
//!
//! Settings are read from a TOML file and can be overridden from the
//! environment, which the binaries populate from an optional `.env` file.
//!
//! ```toml
//! auto_close_on_insert = true
//! interrupt_level = 4
//! scan_step = 10
//! ```
//!
//! | Variable             | Field                  |
//! |----------------------|------------------------|
//! | `MCDRIVE_AUTO_CLOSE` | `auto_close_on_insert` |
//! | `MCDRIVE_IRQ_LEVEL`  | `interrupt_level`      |
//! | `MCDRIVE_SCAN_STEP`  | `scan_step`            |

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{EmulatorError, Result};

pub const ENV_AUTO_CLOSE: &str = "MCDRIVE_AUTO_CLOSE";
pub const ENV_IRQ_LEVEL: &str = "MCDRIVE_IRQ_LEVEL";
pub const ENV_SCAN_STEP: &str = "MCDRIVE_SCAN_STEP";

/// Drive configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Close the tray by itself when a disc is inserted into an open drive
    ///
    /// Later BIOS revisions expect this; earlier ones send Close Tray.
    pub auto_close_on_insert: bool,

    /// Host interrupt level raised when a status block is exported
    pub interrupt_level: u8,

    /// Sectors moved per tick while scanning
    pub scan_step: i32,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            auto_close_on_insert: true,
            interrupt_level: 4,
            scan_step: 10,
        }
    }
}

impl DriveConfig {
    /// Parse configuration from TOML text
    ///
    /// Out-of-range IRQ levels and scan steps fall back to the defaults.
    ///
    /// # Example
    ///
    /// ```
    /// use mcdrive::core::config::DriveConfig;
    ///
    /// let config = DriveConfig::parse("scan_step = 20").unwrap();
    /// assert_eq!(config.scan_step, 20);
    /// assert_eq!(config.interrupt_level, 4);
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let mut config: Self =
            toml::from_str(text).map_err(|e| EmulatorError::Config(e.to_string()))?;
        config.sanitize();
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::parse(&text)?;
        log::info!("Loaded drive config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_AUTO_CLOSE) {
            match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.auto_close_on_insert = true,
                "0" | "false" | "no" | "off" => self.auto_close_on_insert = false,
                other => log::warn!("Ignoring {}={}", ENV_AUTO_CLOSE, other),
            }
        }

        if let Some(value) = lookup(ENV_IRQ_LEVEL) {
            match value.trim().parse::<u8>() {
                Ok(level) if valid_interrupt_level(level) => self.interrupt_level = level,
                _ => log::warn!("Ignoring {}={}", ENV_IRQ_LEVEL, value),
            }
        }

        if let Some(value) = lookup(ENV_SCAN_STEP) {
            match value.trim().parse::<i32>() {
                Ok(step) if valid_scan_step(step) => self.scan_step = step,
                _ => log::warn!("Ignoring {}={}", ENV_SCAN_STEP, value),
            }
        }
    }

    /// Replace out-of-range values with the defaults
    fn sanitize(&mut self) {
        let defaults = Self::default();

        if !valid_interrupt_level(self.interrupt_level) {
            log::warn!(
                "interrupt_level {} out of range 1-6, using {}",
                self.interrupt_level,
                defaults.interrupt_level
            );
            self.interrupt_level = defaults.interrupt_level;
        }

        if !valid_scan_step(self.scan_step) {
            log::warn!(
                "scan_step {} must be positive, using {}",
                self.scan_step,
                defaults.scan_step
            );
            self.scan_step = defaults.scan_step;
        }
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| EmulatorError::Config(e.to_string()))
    }
}

fn valid_interrupt_level(level: u8) -> bool {
    (1..=6).contains(&level)
}

fn valid_scan_step(step: i32) -> bool {
    step > 0
}
