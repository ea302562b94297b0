/*
 *  main.rs
 *
 *  xrt-hal-loader - HAL driver discovery
 *	(c) 2020-26 Stuart Hunter
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use xrt_hal_loader::config::{self, Cli};
use xrt_hal_loader::hal::{load_xdp, DeviceInfo, Environment, HalLoader};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli).context("loading configuration")?;

    if cli.dump_config {
        println!("{}", config::dump(&cfg)?);
        return Ok(());
    }

    let level = cfg.log_level.as_deref().unwrap_or("info");
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let env = Environment::capture(&cfg);

    if cli.xdp {
        load_xdp(&env)?;
    }

    let devices = HalLoader::new().load_devices(&env)?;
    if devices.is_empty() {
        warn!("No HAL devices found");
    }

    if cli.json {
        let infos: Vec<DeviceInfo> = devices.iter().map(|d| d.info()).collect();
        println!("{}", serde_json::to_string_pretty(&infos)?);
    } else {
        for device in &devices {
            println!("[{}] {}", device.index(), device.driver_path().display());
        }
    }

    Ok(())
}
