/*
 *  hal/env.rs
 *
 *  xrt-hal-loader - HAL driver discovery
 *  (c) 2020-26 Stuart Hunter
 *
 *  Environment snapshot consumed by driver resolution
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use log::debug;

/// Installation root of the runtime
pub const INSTALL_ROOT_VAR: &str = "XILINX_XRT";

/// Presence-only flag, any value (even empty) switches to emulation
pub const EMULATION_MODE_VAR: &str = "XCL_EMULATION_MODE";

/// Override value meaning "use the default library under the install root"
pub const NO_OVERRIDE: &str = "null";

/// Source of the emulation driver overrides
///
/// Implementations return [`NO_OVERRIDE`] when nothing is configured.
pub trait EmulationOverrides {
    fn hw_em_driver(&self) -> String;
    fn sw_em_driver(&self) -> String;
}

/// Immutable inputs for one resolution pass
///
/// Built once per pass by [`Environment::capture`], or assembled by hand
/// with the builder methods when the process environment must not be
/// touched (tests, embedding applications).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    install_root: Option<PathBuf>,
    emulation_mode: bool,
    hw_em_driver: Option<PathBuf>,
    sw_em_driver: Option<PathBuf>,
}

impl Environment {
    /// Snapshot with the given install root and nothing else set
    pub fn new(install_root: Option<PathBuf>) -> Self {
        Self {
            install_root,
            ..Default::default()
        }
    }

    /// Read the process environment plus configured overrides
    ///
    /// The install root is re-read on every call. The emulation flag is
    /// cached for the life of the process, see [`emulation_mode`].
    pub fn capture(overrides: &impl EmulationOverrides) -> Self {
        let snapshot = Self {
            install_root: install_root_from_env(),
            emulation_mode: emulation_mode(),
            hw_em_driver: parse_override(overrides.hw_em_driver()),
            sw_em_driver: parse_override(overrides.sw_em_driver()),
        };
        debug!("Captured environment: {:?}", snapshot);
        snapshot
    }

    pub fn with_emulation(mut self, emulation_mode: bool) -> Self {
        self.emulation_mode = emulation_mode;
        self
    }

    pub fn with_hw_em_driver(mut self, path: Option<PathBuf>) -> Self {
        self.hw_em_driver = path;
        self
    }

    pub fn with_sw_em_driver(mut self, path: Option<PathBuf>) -> Self {
        self.sw_em_driver = path;
        self
    }

    pub fn install_root(&self) -> Option<&Path> {
        self.install_root.as_deref()
    }

    pub fn emulation_mode(&self) -> bool {
        self.emulation_mode
    }

    /// Configured hardware emulation driver, `None` means use the default
    pub fn hw_em_driver(&self) -> Option<&Path> {
        self.hw_em_driver.as_deref()
    }

    /// Configured software emulation driver, `None` means use the default
    pub fn sw_em_driver(&self) -> Option<&Path> {
        self.sw_em_driver.as_deref()
    }
}

/// Whether `XCL_EMULATION_MODE` was present when first asked
///
/// Read once per process; later changes to the variable are not seen.
pub fn emulation_mode() -> bool {
    static EMULATION_MODE: OnceLock<bool> = OnceLock::new();
    *EMULATION_MODE.get_or_init(|| std::env::var_os(EMULATION_MODE_VAR).is_some())
}

fn install_root_from_env() -> Option<PathBuf> {
    std::env::var_os(INSTALL_ROOT_VAR)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Map the `"null"` sentinel to `None`, anything else is taken verbatim
fn parse_override(value: String) -> Option<PathBuf> {
    if value == NO_OVERRIDE {
        None
    } else {
        Some(PathBuf::from(value))
    }
}
