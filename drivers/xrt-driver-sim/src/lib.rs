/*
 *  XRT simulated HAL driver
 *
 *  A stand-in HAL driver that reports a configurable number of devices,
 *  for exercising the loader without hardware.
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 */

//! # Simulated HAL driver
//!
//! Builds as `libxrt_core.so`; drop it into `$XILINX_XRT/lib` and run
//! `xrt-hal-loader`.
//!
//! ## Environment
//!
//! - `XRT_SIM_DEVICES` - device count returned by `xclProbe` (default 1)
//! - `XRT_SIM_VERSION` - ABI version returned by `xclVersion` (default 2)

use std::ffi::c_uint;

pub const DEVICES_VAR: &str = "XRT_SIM_DEVICES";
pub const VERSION_VAR: &str = "XRT_SIM_VERSION";

const DEFAULT_DEVICES: c_uint = 1;
const DEFAULT_VERSION: c_uint = 2;

fn read_uint(var: &str, default: c_uint) -> c_uint {
    parse_uint(std::env::var(var).ok().as_deref(), default)
}

fn parse_uint(value: Option<&str>, default: c_uint) -> c_uint {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[no_mangle]
#[allow(non_snake_case)]
pub extern "C" fn xclProbe() -> c_uint {
    let count = read_uint(DEVICES_VAR, DEFAULT_DEVICES);
    #[cfg(feature = "debug-logging")]
    log::debug!("xclProbe -> {}", count);
    count
}

#[no_mangle]
#[allow(non_snake_case)]
pub extern "C" fn xclVersion() -> c_uint {
    read_uint(VERSION_VAR, DEFAULT_VERSION)
}
