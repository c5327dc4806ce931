// Unix: argv is already in the encoding the runtime expects

use std::ffi::{c_char, c_int};

use crate::source::NarrowArgs;

/// # Safety
/// `argc`/`argv` must be the values the C runtime passed to `main`.
pub unsafe fn arguments(argc: c_int, argv: *const *const c_char) -> NarrowArgs<'static> {
    NarrowArgs::from_raw(argc, argv)
}
