/*
 *  tests/sim_driver.rs
 *
 *  Smoke tests against the real dynamic linker and the simulated driver
 *
 *  Build the driver first: cargo build -p xrt-driver-sim
 *  then run: cargo test --test sim_driver -- --ignored
 *
 *  xrt-hal-loader - HAL driver discovery
 *  (c) 2020-26 Stuart Hunter
 */

mod common;

use std::fs;
use std::path::PathBuf;

use common::InstallRoot;
use xrt_hal_loader::hal::paths::{lib_dir, library_file_name};
use xrt_hal_loader::hal::{load_devices, Binding, DriverCandidate, HalLibrary, SharedLibrary};

/// Overrides where the built driver is picked up from
const SIM_DRIVER_VAR: &str = "XRT_SIM_DRIVER";

/// target/<profile>/libxrt_core.so, next to the test's deps/ directory
fn built_driver() -> PathBuf {
    if let Some(path) = std::env::var_os(SIM_DRIVER_VAR) {
        return PathBuf::from(path);
    }
    let exe = std::env::current_exe().unwrap();
    let profile_dir = exe.parent().and_then(|deps| deps.parent()).unwrap();
    profile_dir.join(library_file_name("xrt_core"))
}

/// Copy the built driver into a fresh install root as the core candidate
fn install_sim_driver(root: &InstallRoot) -> PathBuf {
    let built = built_driver();
    assert!(
        built.is_file(),
        "{} missing, run `cargo build -p xrt-driver-sim` or set {}",
        built.display(),
        SIM_DRIVER_VAR
    );
    let path = lib_dir(root.path()).join(DriverCandidate::Core.file_name());
    fs::copy(&built, &path).unwrap();
    path
}

fn expected_devices() -> u32 {
    std::env::var("XRT_SIM_DEVICES")
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(1)
}

#[test]
#[ignore = "needs the xrt-driver-sim cdylib built"]
fn test_sim_driver_yields_devices() {
    let root = InstallRoot::new();
    let core = install_sim_driver(&root);

    let devices = load_devices(&root.env()).unwrap();
    assert_eq!(devices.len() as u32, expected_devices());
    for (i, device) in devices.iter().enumerate() {
        assert_eq!(device.index(), i as u32);
        assert_eq!(device.driver_path(), core);
    }
}

#[test]
#[ignore = "needs the xrt-driver-sim cdylib built"]
fn test_sim_driver_entry_points_bind_now() {
    let root = InstallRoot::new();
    let core = install_sim_driver(&root);

    let library = SharedLibrary::open(&core, Binding::Now).unwrap();
    assert_eq!(library.path(), core);

    let probe = library.probe().unwrap();
    let version = library.version().unwrap();
    // SAFETY: both take no arguments and return unsigned int
    assert_eq!(unsafe { probe() }, expected_devices());
    assert_eq!(unsafe { version() }, 2);

    let reason = library.xdp_init().unwrap_err();
    assert!(reason.contains("initXDPLib"), "{reason}");
}
