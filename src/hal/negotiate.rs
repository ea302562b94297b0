/*
 *  hal/negotiate.rs
 *
 *  xrt-hal-loader - HAL driver discovery
 *  (c) 2020-26 Stuart Hunter
 *
 *  ABI negotiation - probe, version check and adapter dispatch
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

use log::{debug, info, warn};

use super::adapter::DeviceAdapter;
use super::error::HalError;
use super::ffi::{HAL_ABI_VERSION, LEGACY_HAL_ABI_VERSION, PROBE_SYMBOL};
use super::linker::HalLibrary;

/// Result of negotiating with one opened library
#[derive(Debug)]
pub enum Negotiation<D> {
    /// No `xclProbe` export; the library was closed
    NotADriver,

    /// Probe reported zero devices; the library was closed
    NoDevices,

    /// Version 2 driver; the adapter now owns the library
    Devices(Vec<D>),
}

/// Probe `library`, check its ABI version and hand it to `adapter`
///
/// A non-zero `hinted_count` is used as the device count without calling
/// the probe entry point. The library is closed on every path except a
/// successful version-2 dispatch, where ownership moves to the adapter.
pub fn negotiate<L, A>(
    library: L,
    hinted_count: u32,
    adapter: &A,
) -> Result<Negotiation<A::Device>, HalError>
where
    L: HalLibrary,
    A: DeviceAdapter<L::Handle>,
{
    let Some(probe) = library.probe() else {
        warn!(
            "{} does not export {}, not a HAL driver",
            library.path().display(),
            PROBE_SYMBOL
        );
        return Ok(Negotiation::NotADriver);
    };

    let count = if hinted_count != 0 {
        hinted_count
    } else {
        // SAFETY: xclProbe takes no arguments and returns unsigned int
        unsafe { probe() }
    };

    if count == 0 {
        debug!("{} probed no devices", library.path().display());
        return Ok(Negotiation::NoDevices);
    }

    let version = match library.version() {
        // SAFETY: xclVersion takes no arguments and returns unsigned int
        Some(version) => unsafe { version() },
        None => LEGACY_HAL_ABI_VERSION,
    };

    debug!(
        "{}: {} device(s), HAL version {}",
        library.path().display(),
        count,
        version
    );

    match version {
        LEGACY_HAL_ABI_VERSION => Err(HalError::LegacyVersion(version)),
        HAL_ABI_VERSION => {
            let path = library.path().to_path_buf();
            let handle = library.release();
            let devices = adapter.create_devices(&path, handle, count)?;
            info!("Loaded {} device(s) from {}", devices.len(), path.display());
            Ok(Negotiation::Devices(devices))
        }
        other => Err(HalError::UnsupportedVersion(other)),
    }
}
