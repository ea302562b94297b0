/*
 *  hal/loader.rs
 *
 *  xrt-hal-loader - HAL driver discovery
 *  (c) 2020-26 Stuart Hunter
 *
 *  Driver resolution - walks the candidate chain and collects devices
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

use std::path::Path;
use log::{debug, info};

use super::adapter::{Device, DeviceAdapter, Hal2Adapter};
use super::env::Environment;
use super::error::HalError;
use super::linker::{Binding, DynamicLinker, HalLibrary, SystemLinker};
use super::negotiate::{negotiate, Negotiation};
use super::paths::{resolve_candidate, DriverCandidate};

/// Device type produced by a loader's adapter
pub type DeviceOf<K, A> =
    <A as DeviceAdapter<<<K as DynamicLinker>::Library as HalLibrary>::Handle>>::Device;

/// Resolves driver candidates and collects their devices
///
/// The order is fixed: core (physical boards), then aws only if core found
/// nothing, then hardware and software emulation when emulation is on.
/// Calls are not meant to race each other; the dynamic linker's symbol
/// table is shared process state.
#[derive(Debug, Clone, Default)]
pub struct HalLoader<K = SystemLinker, A = Hal2Adapter> {
    linker: K,
    adapter: A,
}

impl HalLoader {
    /// Loader using `dlopen` and the default version-2 adapter
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K, A> HalLoader<K, A> {
    pub fn with_parts(linker: K, adapter: A) -> Self {
        Self { linker, adapter }
    }

    pub fn linker(&self) -> &K {
        &self.linker
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }
}

impl<K, A> HalLoader<K, A>
where
    K: DynamicLinker,
    A: DeviceAdapter<<K::Library as HalLibrary>::Handle>,
{
    /// Run one resolution pass over `env`
    ///
    /// Absent candidates, libraries without `xclProbe` and zero-device
    /// probes are skipped. Everything else (root unset, missing directory,
    /// a resolved driver failing to open, an unsupported ABI version) fails
    /// the whole pass and drops any devices already collected.
    pub fn load_devices(&self, env: &Environment) -> Result<Vec<DeviceOf<K, A>>, HalError> {
        if env.install_root().is_none() {
            return Err(HalError::RootNotConfigured);
        }

        let mut devices = Vec::new();

        for kind in DriverCandidate::ALL {
            if kind == DriverCandidate::Aws && !devices.is_empty() {
                debug!("Skipping {} driver, {} device(s) already found", kind, devices.len());
                continue;
            }

            if let Some(path) = resolve_candidate(kind, env)? {
                self.create_hal_devices(&mut devices, kind, &path, 0)?;
            }
        }

        info!("Found {} HAL device(s)", devices.len());
        Ok(devices)
    }

    fn create_hal_devices(
        &self,
        devices: &mut Vec<DeviceOf<K, A>>,
        kind: DriverCandidate,
        path: &Path,
        count: u32,
    ) -> Result<(), HalError> {
        let library = self
            .linker
            .open(path, Binding::Lazy)
            .map_err(HalError::DriverOpen)?;

        match negotiate(library, count, &self.adapter)? {
            Negotiation::Devices(found) => {
                debug!("{} driver contributed {} device(s)", kind, found.len());
                devices.extend(found);
            }
            Negotiation::NotADriver | Negotiation::NoDevices => {
                debug!("{} driver contributed no devices", kind);
            }
        }

        Ok(())
    }
}

/// Resolve drivers with the system linker and the default adapter
pub fn load_devices(env: &Environment) -> Result<Vec<Device>, HalError> {
    HalLoader::new().load_devices(env)
}
