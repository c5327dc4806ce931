use std::ffi::{c_int, CStr};

use crate::assemble::ArgVector;

/// Entry points of the embedded runtime and the bundler's generated code.
pub trait EmbeddedRuntime {
    /// Points the runtime at its assembly and configuration directories.
    fn set_dirs(&mut self, assembly_dir: Option<&CStr>, config_dir: &CStr);

    /// Registers the bundled assemblies with the runtime.
    fn bundle_init(&mut self);

    /// Runs the runtime's main; the result is the process exit status.
    fn main(&mut self, args: &mut ArgVector<'_>) -> c_int;
}

#[cfg(feature = "mono")]
mod ffi {
    use std::ffi::{c_char, c_int};

    #[cfg_attr(windows, link(name = "mono-2.0-sgen"))]
    #[cfg_attr(not(windows), link(name = "monosgen-2.0"))]
    extern "C" {
        pub fn mono_set_dirs(assembly_dir: *const c_char, config_dir: *const c_char);
        pub fn mono_main(argc: c_int, argv: *mut *mut c_char) -> c_int;
    }

    // Generated by the bundler next to the embedded assemblies
    extern "C" {
        pub fn mono_mkbundle_init();
    }
}

/// The Mono runtime linked into this executable.
#[cfg(feature = "mono")]
#[derive(Debug, Default, Clone, Copy)]
pub struct MonoRuntime;

#[cfg(feature = "mono")]
impl EmbeddedRuntime for MonoRuntime {
    fn set_dirs(&mut self, assembly_dir: Option<&CStr>, config_dir: &CStr) {
        let assembly_dir = assembly_dir.map_or(std::ptr::null(), CStr::as_ptr);
        unsafe { ffi::mono_set_dirs(assembly_dir, config_dir.as_ptr()) }
    }

    fn bundle_init(&mut self) {
        unsafe { ffi::mono_mkbundle_init() }
    }

    fn main(&mut self, args: &mut ArgVector<'_>) -> c_int {
        unsafe { ffi::mono_main(args.argc(), args.as_mut_ptr()) }
    }
}
