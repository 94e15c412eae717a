//! Safe wrapper over a dlopen'd simulator shared object.

use crate::error::DriverError;
use libloading::{Library, Symbol};
use std::ffi::CString;
use std::path::Path;

type ResetFn = unsafe extern "C" fn();
type PokeFn = unsafe extern "C" fn(*const std::os::raw::c_char, u64);
type PeekFn = unsafe extern "C" fn(*const std::os::raw::c_char) -> u64;
type StepFn = unsafe extern "C" fn(i32);

/// A loaded simulator: the four ABI symbols from specification §6.3, wrapped
/// as safe methods. The shared object is kept alive for as long as this
/// value exists — the function pointers are only valid while it is.
pub struct Simulator {
    _library: Library,
    reset: ResetFn,
    poke: PokeFn,
    peek: PeekFn,
    step: StepFn,
}

impl Simulator {
    /// Loads a simulator from a compiled shared object, resolving all four
    /// required ABI symbols eagerly so a construction failure surfaces
    /// immediately rather than on first use.
    pub fn load(path: &Path) -> Result<Self, DriverError> {
        let library = unsafe { Library::new(path) }.map_err(|source| DriverError::LoadLibrary {
            path: path.to_path_buf(),
            source,
        })?;

        let reset = *unsafe { find_symbol::<ResetFn>(&library, b"reset\0", "reset")? };
        let poke = *unsafe { find_symbol::<PokeFn>(&library, b"poke\0", "poke")? };
        let peek = *unsafe { find_symbol::<PeekFn>(&library, b"peek\0", "peek")? };
        let step = *unsafe { find_symbol::<StepFn>(&library, b"step\0", "step")? };

        Ok(Self {
            _library: library,
            reset,
            poke,
            peek,
            step,
        })
    }

    /// Zeroes all state and cached inputs.
    pub fn reset(&self) {
        unsafe { (self.reset)() }
    }

    /// Writes an input port, masked to its declared width by the generated
    /// code, and marks cached outputs dirty.
    pub fn poke(&self, name: &str, value: u64) {
        let Ok(c_name) = CString::new(name) else {
            return;
        };
        unsafe { (self.poke)(c_name.as_ptr(), value) }
    }

    /// Reads an input port, output port, or internal `KIND_O_c` word.
    pub fn peek(&self, name: &str) -> u64 {
        let Ok(c_name) = CString::new(name) else {
            return 0;
        };
        unsafe { (self.peek)(c_name.as_ptr()) }
    }

    /// Advances the simulation by `cycles` ticks, committing state each
    /// cycle.
    pub fn step(&self, cycles: i32) {
        unsafe { (self.step)(cycles) }
    }
}

unsafe fn find_symbol<'lib, T>(
    library: &'lib Library,
    name: &[u8],
    label: &'static str,
) -> Result<Symbol<'lib, T>, DriverError> {
    library
        .get::<T>(name)
        .map_err(|_| DriverError::MissingSymbol(label))
}
