/*
 *  hal/xdp.rs
 *
 *  xrt-hal-loader - HAL driver discovery
 *  (c) 2020-26 Stuart Hunter
 *
 *  One-shot loader for the XDP diagnostics library
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

//! The diagnostics (XDP) library is requested both by the profiling hooks
//! and by every device that loads a debug-enabled binary, but it may only
//! be opened and initialized once per process. The first caller performs
//! the load; concurrent callers block until it finishes and every caller,
//! then and later, sees the same outcome. A failed attempt is final.

use std::path::PathBuf;
use std::sync::OnceLock;
use log::{debug, info};

use super::env::Environment;
use super::error::HalError;
use super::linker::{Binding, DynamicLinker, HalLibrary, SharedLibrary, SystemLinker};
use super::paths::{directory_or_error, is_dll, lib_dir, library_file_name, XDP_LIBRARY_STEM};

/// Holds the outcome of the single load attempt
///
/// A successfully initialized library is kept open for as long as the
/// loader lives.
#[derive(Debug)]
pub struct XdpLoader<L> {
    state: OnceLock<Result<L, HalError>>,
}

impl<L> XdpLoader<L> {
    pub const fn new() -> Self {
        Self {
            state: OnceLock::new(),
        }
    }

    /// Whether the one attempt has already happened (successfully or not)
    pub fn is_attempted(&self) -> bool {
        self.state.get().is_some()
    }
}

impl<L> Default for XdpLoader<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: HalLibrary> XdpLoader<L> {
    /// Load and initialize the library on first call, replay the result after
    pub fn load<K>(&self, env: &Environment, linker: &K) -> Result<(), HalError>
    where
        K: DynamicLinker<Library = L>,
    {
        match self.state.get_or_init(|| load_once(env, linker)) {
            Ok(_) => Ok(()),
            Err(e) => Err(e.clone()),
        }
    }

    /// The loaded library, once initialization has succeeded
    pub fn library(&self) -> Option<&L> {
        self.state.get().and_then(|state| state.as_ref().ok())
    }
}

fn load_once<K: DynamicLinker>(env: &Environment, linker: &K) -> Result<K::Library, HalError> {
    let file_name = library_file_name(XDP_LIBRARY_STEM);
    let path = xdp_path(env, &file_name)?;

    debug!("Loading XDP library from {}", path.display());
    let library = linker.open(&path, Binding::Now).map_err(HalError::XdpOpen)?;

    let init = library
        .xdp_init()
        .map_err(|reason| HalError::XdpInitMissing { path: path.clone(), reason })?;

    // SAFETY: initXDPLib takes no arguments and returns nothing
    unsafe { init() };

    info!("Initialized XDP library: {}", path.display());
    Ok(library)
}

fn xdp_path(env: &Environment, file_name: &str) -> Result<PathBuf, HalError> {
    let root = env.install_root().ok_or_else(|| HalError::XdpRootNotConfigured {
        library: file_name.to_string(),
    })?;

    let dir = lib_dir(root);
    directory_or_error(&dir)?;

    let path = dir.join(file_name);
    if is_dll(&path) {
        Ok(path)
    } else {
        Err(HalError::XdpNotFound(path))
    }
}

static XDP: XdpLoader<SharedLibrary> = XdpLoader::new();

/// Load the process-wide diagnostics library, at most once
pub fn load_xdp(env: &Environment) -> Result<(), HalError> {
    XDP.load(env, &SystemLinker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn test_xdp_path_requires_root() {
        let err = xdp_path(&Environment::new(None), "liboclxdp.so").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Library liboclxdp.so not found! XILINX_XRT not set"
        );
    }

    #[test]
    fn test_xdp_path_requires_lib_dir() {
        let root = TempDir::new().unwrap();
        let env = Environment::new(Some(root.path().to_path_buf()));
        assert_eq!(
            xdp_path(&env, "liboclxdp.so"),
            Err(HalError::MissingDirectory(root.path().join("lib")))
        );
    }

    #[test]
    fn test_xdp_path_requires_file() {
        let root = TempDir::new().unwrap();
        let lib = root.path().join("lib");
        fs::create_dir(&lib).unwrap();
        let env = Environment::new(Some(root.path().to_path_buf()));
        let file_name = library_file_name(XDP_LIBRARY_STEM);

        assert_eq!(
            xdp_path(&env, &file_name),
            Err(HalError::XdpNotFound(lib.join(&file_name)))
        );

        fs::write(lib.join(&file_name), b"").unwrap();
        assert_eq!(xdp_path(&env, &file_name), Ok(lib.join(&file_name)));
    }

    #[test]
    fn test_failed_open_is_not_retried() {
        let root = TempDir::new().unwrap();
        let lib = root.path().join("lib");
        fs::create_dir(&lib).unwrap();
        let xdp = lib.join(library_file_name(XDP_LIBRARY_STEM));
        fs::write(&xdp, b"not a shared object").unwrap();

        let env = Environment::new(Some(root.path().to_path_buf()));
        let loader: XdpLoader<SharedLibrary> = XdpLoader::new();
        assert!(!loader.is_attempted());

        let first = loader.load(&env, &SystemLinker).unwrap_err();
        assert!(matches!(&first, HalError::XdpOpen(e) if e.path == xdp));

        // Fixing the environment does not help, the attempt is spent
        let env = Environment::new(Some(Path::new("/definitely/not/here").to_path_buf()));
        assert_eq!(loader.load(&env, &SystemLinker).unwrap_err(), first);
        assert!(loader.is_attempted());
        assert!(loader.library().is_none());
    }
}
