/*
 *  hal/linker.rs
 *
 *  xrt-hal-loader - HAL driver discovery
 *  (c) 2020-26 Stuart Hunter
 *
 *  Library loader - opens driver libraries through the dynamic linker
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

use std::ffi::{c_int, c_void};
use std::path::{Path, PathBuf};
use log::{debug, info};
use libloading::os::unix::{Library, RTLD_GLOBAL, RTLD_LAZY, RTLD_NOW};

use super::error::OpenError;
use super::ffi::{
    ProbeFn,
    VersionFn,
    XdpInitFn,
    PROBE_SYMBOL,
    VERSION_SYMBOL,
    XDP_INIT_SYMBOL,
};

/// When the dynamic linker resolves a library's undefined symbols
///
/// Both modes load with global visibility so that a driver's dependents
/// and the diagnostics hooks can bind against its symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Resolve on first call (drivers)
    Lazy,

    /// Resolve everything at open time (diagnostics library)
    Now,
}

impl Binding {
    fn flags(self) -> c_int {
        match self {
            Binding::Lazy => RTLD_LAZY | RTLD_GLOBAL,
            Binding::Now => RTLD_NOW | RTLD_GLOBAL,
        }
    }
}

/// An opened library exposing the HAL entry-point contracts
///
/// Dropping the value closes the library. [`HalLibrary::release`] is the
/// only way to keep it open past the owner's scope.
pub trait HalLibrary {
    /// What the library turns into once ownership moves to a device adapter
    type Handle;

    /// File the library was opened from
    fn path(&self) -> &Path;

    /// `xclProbe`, if exported
    fn probe(&self) -> Option<ProbeFn>;

    /// `xclVersion`, if exported
    fn version(&self) -> Option<VersionFn>;

    /// `initXDPLib`, or the linker diagnostic when it is not exported
    fn xdp_init(&self) -> Result<XdpInitFn, String>;

    /// Give up ownership without closing the library
    fn release(self) -> Self::Handle;
}

/// Something that can open libraries by path
pub trait DynamicLinker {
    type Library: HalLibrary;

    fn open(&self, path: &Path, binding: Binding) -> Result<Self::Library, OpenError>;
}

/// The process dynamic linker (`dlopen`)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLinker;

impl DynamicLinker for SystemLinker {
    type Library = SharedLibrary;

    fn open(&self, path: &Path, binding: Binding) -> Result<SharedLibrary, OpenError> {
        SharedLibrary::open(path, binding)
    }
}

/// A library opened with `dlopen`, closed on drop
pub struct SharedLibrary {
    library: Library,
    path: PathBuf,
}

impl SharedLibrary {
    /// Open `path` with the given binding mode
    pub fn open(path: &Path, binding: Binding) -> Result<Self, OpenError> {
        debug!("Opening {} ({:?} binding)", path.display(), binding);

        // SAFETY: running a library's initializers is inherent to loading a
        // driver; the install root is trusted.
        let library = unsafe { Library::open(Some(path), binding.flags()) }
            .map_err(|e| OpenError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        info!("Opened library: {}", path.display());

        Ok(Self {
            library,
            path: path.to_path_buf(),
        })
    }

    /// Look up `name` as a value of type `T`
    ///
    /// `T` must be the exact function pointer type the library exports.
    fn entry<T: Copy>(&self, name: &str) -> Result<T, String> {
        // SAFETY: callers pair each name with its fixed signature from ffi.rs
        match unsafe { self.library.get::<T>(name.as_bytes()) } {
            Ok(symbol) => Ok(*symbol),
            Err(e) => {
                debug!("{} has no {}: {}", self.path.display(), name, e);
                Err(e.to_string())
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn this_process() -> Self {
        Self {
            library: Library::this(),
            path: PathBuf::from("<self>"),
        }
    }
}

impl HalLibrary for SharedLibrary {
    type Handle = RawLibrary;

    fn path(&self) -> &Path {
        &self.path
    }

    fn probe(&self) -> Option<ProbeFn> {
        self.entry::<ProbeFn>(PROBE_SYMBOL).ok()
    }

    fn version(&self) -> Option<VersionFn> {
        self.entry::<VersionFn>(VERSION_SYMBOL).ok()
    }

    fn xdp_init(&self) -> Result<XdpInitFn, String> {
        self.entry::<XdpInitFn>(XDP_INIT_SYMBOL)
    }

    fn release(self) -> RawLibrary {
        debug!("Releasing ownership of {}", self.path.display());
        RawLibrary(self.library.into_raw())
    }
}

impl std::fmt::Debug for SharedLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedLibrary")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Native handle of a released library
///
/// Nothing closes it on drop; whoever receives it must re-own it with
/// [`RawLibrary::into_library`].
#[derive(Debug)]
pub struct RawLibrary(*mut c_void);

// SAFETY: a dlopen handle is a process-global token, not tied to a thread
unsafe impl Send for RawLibrary {}

impl RawLibrary {
    /// The native `dlopen` handle
    pub fn as_ptr(&self) -> *mut c_void {
        self.0
    }

    /// Take ownership back, the returned library closes on drop
    ///
    /// # Safety
    ///
    /// Must be called at most once per released handle.
    pub unsafe fn into_library(self) -> Library {
        // SAFETY: the pointer came from Library::into_raw and is consumed here
        unsafe { Library::from_raw(self.0) }
    }
}
