/*
 *  hal/mod.rs
 *
 *  xrt-hal-loader - HAL driver discovery
 *  (c) 2020-26 Stuart Hunter
 *
 *  Runtime discovery of HAL driver libraries
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

//! HAL driver discovery
//!
//! Drivers are shared libraries under the runtime install root that export
//! a small C ABI (see [`ffi`]). A resolution pass:
//!
//! 1. **Paths** (`paths.rs`) - picks the candidate library for each slot
//! 2. **Linker** (`linker.rs`) - opens it with `dlopen`
//! 3. **Negotiate** (`negotiate.rs`) - probes devices, checks the ABI version
//! 4. **Adapter** (`adapter.rs`) - takes over the library, builds devices
//!
//! [`loader`] sequences those steps over the candidate chain, and [`xdp`]
//! loads the diagnostics library on demand, once per process.
//!
//! ## Layout
//!
//! All libraries live in `$XILINX_XRT/lib`:
//!
//! - `libxrt_core.so` - physical boards (skipped in emulation mode)
//! - `libxrt_aws.so` - fallback when core found no devices
//! - `libxrt_hwemu.so` / `libxrt_swemu.so` - emulation, overridable by config
//! - `liboclxdp.so` - diagnostics and profiling

pub mod adapter;
pub mod env;
pub mod error;
pub mod ffi;
pub mod linker;
pub mod loader;
pub mod negotiate;
pub mod paths;
pub mod xdp;

// Re-exports for convenience
pub use adapter::{Device, DeviceAdapter, DeviceInfo, DriverHandle, Hal2Adapter};
pub use env::{EmulationOverrides, Environment};
pub use error::{HalError, OpenError};
pub use linker::{Binding, DynamicLinker, HalLibrary, RawLibrary, SharedLibrary, SystemLinker};
pub use loader::{load_devices, HalLoader};
pub use negotiate::{negotiate, Negotiation};
pub use paths::DriverCandidate;
pub use xdp::{load_xdp, XdpLoader};
