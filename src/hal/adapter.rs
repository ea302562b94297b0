/*
 *  hal/adapter.rs
 *
 *  xrt-hal-loader - HAL driver discovery
 *  (c) 2020-26 Stuart Hunter
 *
 *  Device adapter - turns a negotiated driver into device objects
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

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use log::debug;
use libloading::os::unix::Library;
use serde::Serialize;

use super::error::HalError;
use super::linker::RawLibrary;

/// Builds devices for a driver that negotiated ABI version 2
///
/// The adapter receives sole ownership of the released library handle and
/// must keep it open for as long as any device it returns is alive.
pub trait DeviceAdapter<H> {
    type Device;

    fn create_devices(
        &self,
        path: &Path,
        handle: H,
        count: u32,
    ) -> Result<Vec<Self::Device>, HalError>;
}

/// Default version-2 adapter for libraries opened by the system linker
#[derive(Debug, Clone, Copy, Default)]
pub struct Hal2Adapter;

impl DeviceAdapter<RawLibrary> for Hal2Adapter {
    type Device = Device;

    fn create_devices(
        &self,
        path: &Path,
        handle: RawLibrary,
        count: u32,
    ) -> Result<Vec<Device>, HalError> {
        // SAFETY: the negotiator releases each handle exactly once, to us
        let library = unsafe { handle.into_library() };
        let driver = Arc::new(DriverHandle {
            library,
            path: path.to_path_buf(),
        });

        debug!("Creating {} device(s) for {}", count, path.display());

        Ok((0..count)
            .map(|index| Device {
                index,
                driver: Arc::clone(&driver),
            })
            .collect())
    }
}

/// A driver library shared by the devices it produced
///
/// Closed when the last [`Device`] referencing it is dropped.
pub struct DriverHandle {
    /// Kept open for the devices, closed on drop
    #[allow(dead_code)]
    library: Library,
    path: PathBuf,
}

impl DriverHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DriverHandle {
    fn drop(&mut self) {
        debug!("Closing HAL driver {}", self.path.display());
    }
}

impl fmt::Debug for DriverHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverHandle")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// One board (or emulated board) exposed by a driver
#[derive(Debug, Clone)]
pub struct Device {
    index: u32,
    driver: Arc<DriverHandle>,
}

impl Device {
    /// Position within the driver's probe count
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn driver_path(&self) -> &Path {
        self.driver.path()
    }

    pub fn driver(&self) -> &Arc<DriverHandle> {
        &self.driver
    }

    pub fn info(&self) -> DeviceInfo {
        DeviceInfo {
            index: self.index,
            driver: self.driver.path().to_path_buf(),
        }
    }
}

/// Serializable summary of a [`Device`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub index: u32,
    pub driver: PathBuf,
}
