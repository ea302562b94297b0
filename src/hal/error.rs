/*
 *  hal/error.rs
 *
 *  xrt-hal-loader - HAL driver discovery
 *  (c) 2020-26 Stuart Hunter
 *
 *  Error types for driver resolution and diagnostics loading
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

use std::path::PathBuf;
use thiserror::Error;

use super::env::INSTALL_ROOT_VAR;
use super::ffi::XDP_INIT_SYMBOL;

/// The dynamic linker refused to load a library
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct OpenError {
    /// Library that was being opened
    pub path: PathBuf,

    /// Diagnostic reported by the dynamic linker
    pub reason: String,
}

/// Failures that abort a resolution pass or the diagnostics load
///
/// Candidates that are simply absent, not HAL drivers, or probe zero
/// devices never show up here; the orchestrator skips them silently.
/// `Clone` lets the one-shot diagnostics result be handed to every caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HalError {
    /// Install root variable unset or empty
    #[error("{var} must be set", var = INSTALL_ROOT_VAR)]
    RootNotConfigured,

    /// A directory the layout requires is missing
    #[error("No such directory '{}'", .0.display())]
    MissingDirectory(PathBuf),

    /// An explicitly resolved driver failed to open
    #[error("Failed to open HAL driver '{}'\n{}", .0.path.display(), .0.reason)]
    DriverOpen(OpenError),

    /// Driver reports the retired first ABI generation
    #[error("Legacy HAL version {0} not supported")]
    LegacyVersion(u32),

    /// Driver reports an ABI generation this loader does not know
    #[error("HAL version {0} not supported")]
    UnsupportedVersion(u32),

    /// Device construction failed after the handle was handed over
    #[error("Device construction failed for '{}': {message}", .path.display())]
    Adapter { path: PathBuf, message: String },

    /// Diagnostics library requested with no install root
    #[error("Library {library} not found! {var} not set", var = INSTALL_ROOT_VAR)]
    XdpRootNotConfigured { library: String },

    /// Diagnostics library file missing or not a shared library
    #[error("Library {} not found!", .0.display())]
    XdpNotFound(PathBuf),

    /// Diagnostics library failed to open
    #[error("Failed to open XDP library '{}'\n{}", .0.path.display(), .0.reason)]
    XdpOpen(OpenError),

    /// Diagnostics library does not export its init entry point
    #[error("Failed to initialize XDP library '{}', '{sym}' symbol not found.\n{reason}", .path.display(), sym = XDP_INIT_SYMBOL)]
    XdpInitMissing { path: PathBuf, reason: String },
}

impl HalError {
    /// True for configuration problems (root unset, directory missing)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            HalError::RootNotConfigured
                | HalError::MissingDirectory(_)
                | HalError::XdpRootNotConfigured { .. }
        )
    }

    /// True when a driver was rejected for its ABI generation
    pub fn is_unsupported_version(&self) -> bool {
        matches!(self, HalError::LegacyVersion(_) | HalError::UnsupportedVersion(_))
    }
}
