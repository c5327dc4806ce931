// Windows: argv from the C runtime is in the ANSI code page, so the UTF-16
// command line is fetched again and split here.
// The C runtime's argc may not match what the re-split yields; only the
// re-split count is used.

use std::ffi::{c_char, c_int};

use crate::source::WideArgs;

extern "system" {
    fn GetCommandLineW() -> *const u16;
}

/// # Safety
/// `s` must point to a NUL-terminated UTF-16 string.
unsafe fn wstrlen(s: *const u16) -> usize {
    let mut len = 0;
    while *s.add(len) != 0 {
        len += 1;
    }
    len
}

/// # Safety
/// Must be called from the process's `main`.
pub unsafe fn arguments(_argc: c_int, _argv: *const *const c_char) -> WideArgs {
    let cmdline = GetCommandLineW();
    if cmdline.is_null() {
        return WideArgs::from_command_line(&[]);
    }
    let cmdline = core::slice::from_raw_parts(cmdline, wstrlen(cmdline));
    WideArgs::from_command_line(cmdline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wstrlen_stops_at_nul() {
        let s: Vec<u16> = "run.exe a\0b".encode_utf16().collect();
        assert_eq!(unsafe { wstrlen(s.as_ptr()) }, 9);
    }
}
