/*
 *  hal/paths.rs
 *
 *  xrt-hal-loader - HAL driver discovery
 *  (c) 2020-26 Stuart Hunter
 *
 *  Path resolution for candidate driver libraries
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

use std::env::consts::{DLL_EXTENSION, DLL_PREFIX};
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use log::debug;

use super::env::Environment;
use super::error::HalError;

/// Stem of the diagnostics (XDP) library, e.g. `liboclxdp.so`
pub const XDP_LIBRARY_STEM: &str = "oclxdp";

/// One slot in the driver fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverCandidate {
    /// Physical boards, `libxrt_core`
    Core,

    /// Cloud instances, `libxrt_aws`; tried only when core found nothing
    Aws,

    /// Hardware emulation, `libxrt_hwemu` or a configured override
    HwEmu,

    /// Software emulation, `libxrt_swemu` or a configured override
    SwEmu,
}

impl DriverCandidate {
    /// Resolution order
    pub const ALL: [DriverCandidate; 4] = [
        DriverCandidate::Core,
        DriverCandidate::Aws,
        DriverCandidate::HwEmu,
        DriverCandidate::SwEmu,
    ];

    fn stem(self) -> &'static str {
        match self {
            DriverCandidate::Core => "xrt_core",
            DriverCandidate::Aws => "xrt_aws",
            DriverCandidate::HwEmu => "xrt_hwemu",
            DriverCandidate::SwEmu => "xrt_swemu",
        }
    }

    /// Platform file name, `libxrt_core.so` on Linux
    pub fn file_name(self) -> String {
        library_file_name(self.stem())
    }

    /// Emulation candidates only run with `XCL_EMULATION_MODE` set
    pub fn is_emulation(self) -> bool {
        matches!(self, DriverCandidate::HwEmu | DriverCandidate::SwEmu)
    }
}

impl fmt::Display for DriverCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DriverCandidate::Core => "core",
            DriverCandidate::Aws => "aws",
            DriverCandidate::HwEmu => "hw_emu",
            DriverCandidate::SwEmu => "sw_emu",
        };
        f.write_str(label)
    }
}

/// `lib{stem}.{ext}` for the current platform
pub fn library_file_name(stem: &str) -> String {
    format!("{}{}.{}", DLL_PREFIX, stem, DLL_EXTENSION)
}

/// `{root}/lib`
pub fn lib_dir(root: &Path) -> PathBuf {
    root.join("lib")
}

/// An existing regular file with the platform shared-library extension
pub fn is_dll(path: &Path) -> bool {
    path.is_file() && path.extension() == Some(OsStr::new(DLL_EXTENSION))
}

/// Fail with [`HalError::MissingDirectory`] unless `path` is a directory
pub fn directory_or_error(path: &Path) -> Result<(), HalError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(HalError::MissingDirectory(path.to_path_buf()))
    }
}

/// Compute the library to try for `kind`, if any
///
/// `Ok(None)` means the candidate does not apply (wrong mode) or its file
/// is absent; the caller just moves on. Errors are configuration problems
/// that abort the whole pass.
pub fn resolve_candidate(
    kind: DriverCandidate,
    env: &Environment,
) -> Result<Option<PathBuf>, HalError> {
    let root = env.install_root().ok_or(HalError::RootNotConfigured)?;

    let path = match kind {
        DriverCandidate::Core => {
            if env.emulation_mode() {
                return Ok(None);
            }
            directory_or_error(root)?;
            default_path(root, kind)
        }
        DriverCandidate::Aws => default_path(root, kind),
        DriverCandidate::HwEmu | DriverCandidate::SwEmu => {
            if !env.emulation_mode() {
                return Ok(None);
            }
            directory_or_error(root)?;

            let configured = match kind {
                DriverCandidate::HwEmu => env.hw_em_driver(),
                _ => env.sw_em_driver(),
            };
            match configured {
                Some(path) => {
                    debug!("Using configured {} driver: {}", kind, path.display());
                    path.to_path_buf()
                }
                None => default_path(root, kind),
            }
        }
    };

    if is_dll(&path) {
        debug!("Resolved {} driver: {}", kind, path.display());
        Ok(Some(path))
    } else {
        debug!("No {} driver at {}", kind, path.display());
        Ok(None)
    }
}

fn default_path(root: &Path, kind: DriverCandidate) -> PathBuf {
    lib_dir(root).join(kind.file_name())
}
