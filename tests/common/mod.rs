/*
 *  tests/common/mod.rs
 *
 *  Fake linker, driver libraries and adapter for integration tests
 *
 *  xrt-hal-loader - HAL driver discovery
 *  (c) 2020-26 Stuart Hunter
 */

#![allow(dead_code)]

use std::collections::HashMap;
use std::ffi::c_uint;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tempfile::TempDir;
use xrt_hal_loader::hal::ffi::{ProbeFn, VersionFn, XdpInitFn};
use xrt_hal_loader::hal::paths::{lib_dir, library_file_name};
use xrt_hal_loader::hal::{
    Binding, DeviceAdapter, DriverCandidate, DynamicLinker, Environment, HalError, HalLibrary,
    OpenError,
};

pub unsafe extern "C" fn probe_0() -> c_uint { 0 }
pub unsafe extern "C" fn probe_1() -> c_uint { 1 }
pub unsafe extern "C" fn probe_2() -> c_uint { 2 }
pub unsafe extern "C" fn probe_3() -> c_uint { 3 }
pub unsafe extern "C" fn version_1() -> c_uint { 1 }
pub unsafe extern "C" fn version_2() -> c_uint { 2 }
pub unsafe extern "C" fn version_3() -> c_uint { 3 }

/// Exports of one fake driver library
#[derive(Clone, Copy, Default)]
pub struct FakeDriver {
    pub probe: Option<ProbeFn>,
    pub version: Option<VersionFn>,
    pub xdp_init: Option<XdpInitFn>,
}

impl FakeDriver {
    /// A well-formed version 2 driver
    pub fn hal2(probe: ProbeFn) -> Self {
        Self {
            probe: Some(probe),
            version: Some(version_2),
            xdp_init: None,
        }
    }

    pub fn with_version(probe: ProbeFn, version: Option<VersionFn>) -> Self {
        Self {
            probe: Some(probe),
            version,
            xdp_init: None,
        }
    }

    pub fn not_a_driver() -> Self {
        Self::default()
    }

    pub fn xdp(init: Option<XdpInitFn>) -> Self {
        Self {
            xdp_init: init,
            ..Self::default()
        }
    }
}

/// Linker that "opens" registered paths only
#[derive(Default)]
pub struct FakeLinker {
    drivers: HashMap<PathBuf, FakeDriver>,
    opened: Arc<Mutex<Vec<(PathBuf, Binding)>>>,
    closed: Arc<AtomicUsize>,
}

impl FakeLinker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_driver(mut self, path: impl Into<PathBuf>, driver: FakeDriver) -> Self {
        self.drivers.insert(path.into(), driver);
        self
    }

    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }

    pub fn bindings(&self) -> Vec<Binding> {
        self.opened.lock().unwrap().iter().map(|(_, b)| *b).collect()
    }

    /// Libraries dropped without being released
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl DynamicLinker for FakeLinker {
    type Library = FakeLibrary;

    fn open(&self, path: &Path, binding: Binding) -> Result<FakeLibrary, OpenError> {
        self.opened.lock().unwrap().push((path.to_path_buf(), binding));
        match self.drivers.get(path) {
            Some(driver) => Ok(FakeLibrary {
                driver: *driver,
                path: path.to_path_buf(),
                closed: Arc::clone(&self.closed),
                released: false,
            }),
            None => Err(OpenError {
                path: path.to_path_buf(),
                reason: "invalid ELF header".to_string(),
            }),
        }
    }
}

pub struct FakeLibrary {
    driver: FakeDriver,
    path: PathBuf,
    closed: Arc<AtomicUsize>,
    released: bool,
}

impl Drop for FakeLibrary {
    fn drop(&mut self) {
        if !self.released {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// What a device adapter receives on release
#[derive(Debug, PartialEq, Eq)]
pub struct FakeHandle {
    pub path: PathBuf,
}

impl HalLibrary for FakeLibrary {
    type Handle = FakeHandle;

    fn path(&self) -> &Path {
        &self.path
    }

    fn probe(&self) -> Option<ProbeFn> {
        self.driver.probe
    }

    fn version(&self) -> Option<VersionFn> {
        self.driver.version
    }

    fn xdp_init(&self) -> Result<XdpInitFn, String> {
        self.driver
            .xdp_init
            .ok_or_else(|| format!("{}: undefined symbol: initXDPLib", self.path.display()))
    }

    fn release(mut self) -> FakeHandle {
        self.released = true;
        FakeHandle {
            path: self.path.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FakeDevice {
    pub index: u32,
    pub handle: Arc<FakeHandle>,
}

/// Adapter recording every hand-over
#[derive(Default)]
pub struct FakeAdapter {
    calls: Mutex<Vec<(PathBuf, u32)>>,
    handles: Mutex<Vec<Weak<FakeHandle>>>,
    fail_on: Option<PathBuf>,
}

impl FakeAdapter {
    /// Adapter whose device construction fails for `path`
    pub fn failing_on(path: impl Into<PathBuf>) -> Self {
        Self {
            fail_on: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(PathBuf, u32)> {
        self.calls.lock().unwrap().clone()
    }

    /// Handed-over libraries still referenced by some device
    pub fn live_handles(&self) -> usize {
        self.handles
            .lock()
            .unwrap()
            .iter()
            .filter(|h| h.strong_count() > 0)
            .count()
    }
}

impl DeviceAdapter<FakeHandle> for FakeAdapter {
    type Device = FakeDevice;

    fn create_devices(
        &self,
        path: &Path,
        handle: FakeHandle,
        count: u32,
    ) -> Result<Vec<FakeDevice>, HalError> {
        assert_eq!(handle.path, path);
        self.calls.lock().unwrap().push((path.to_path_buf(), count));
        if self.fail_on.as_deref() == Some(path) {
            return Err(HalError::Adapter {
                path: path.to_path_buf(),
                message: "board did not respond".to_string(),
            });
        }
        let handle = Arc::new(handle);
        self.handles.lock().unwrap().push(Arc::downgrade(&handle));
        Ok((0..count)
            .map(|index| FakeDevice {
                index,
                handle: Arc::clone(&handle),
            })
            .collect())
    }
}

/// Throwaway `$XILINX_XRT` with an empty `lib/`
pub struct InstallRoot {
    dir: TempDir,
}

impl InstallRoot {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir(lib_dir(dir.path())).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create an empty file for the candidate's default library
    pub fn install(&self, kind: DriverCandidate) -> PathBuf {
        let path = lib_dir(self.path()).join(kind.file_name());
        fs::write(&path, b"").unwrap();
        path
    }

    /// Create an empty `lib{stem}.so` under the root itself
    pub fn install_custom(&self, stem: &str) -> PathBuf {
        let path = self.path().join(library_file_name(stem));
        fs::write(&path, b"").unwrap();
        path
    }

    pub fn env(&self) -> Environment {
        Environment::new(Some(self.path().to_path_buf()))
    }
}
