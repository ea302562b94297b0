/*
 *  hal/ffi.rs
 *
 *  xrt-hal-loader - HAL driver discovery
 *  (c) 2020-26 Stuart Hunter
 *
 *  C ABI entry points exported by HAL driver libraries
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

//! FFI contracts between the loader and HAL driver libraries
//!
//! Every entry point has a fixed name and a fixed signature. Drivers are
//! plain shared objects, so these must match the C declarations exactly:
//!
//! ```c
//! unsigned int xclProbe(void);     // mandatory
//! unsigned int xclVersion(void);   // optional, absent means version 1
//! void initXDPLib(void);           // diagnostics library only
//! ```

use std::ffi::c_uint;

/// ABI generation assumed when a driver does not export `xclVersion`
pub const LEGACY_HAL_ABI_VERSION: u32 = 1;

/// The only ABI generation this loader can hand to a device adapter
pub const HAL_ABI_VERSION: u32 = 2;

/// Name of the mandatory device-count entry point
pub const PROBE_SYMBOL: &str = "xclProbe";

/// Name of the optional ABI version entry point
pub const VERSION_SYMBOL: &str = "xclVersion";

/// Name of the diagnostics library initialization entry point
pub const XDP_INIT_SYMBOL: &str = "initXDPLib";

/// `xclProbe` - returns the number of devices the driver can see
pub type ProbeFn = unsafe extern "C" fn() -> c_uint;

/// `xclVersion` - returns the driver's HAL ABI generation
pub type VersionFn = unsafe extern "C" fn() -> c_uint;

/// `initXDPLib` - registers the diagnostics hooks
pub type XdpInitFn = unsafe extern "C" fn();
