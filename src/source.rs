//! Where the process arguments come from.
//!
//! Unix hands `main` byte strings that are passed to the runtime untouched.
//! Windows hands it text in the ANSI code page, so the launcher re-reads the
//! UTF-16 command line instead and decodes every argument to UTF-8.

use std::borrow::Cow;
use std::ffi::{c_char, c_int, CStr, CString};

use crate::cmdline::split_command_line;
use crate::error::{LaunchError, Result};

/// Raw process arguments, program name at index 0.
///
/// `argc` is authoritative for indexing: the assembler asks for the program
/// name and then for every user argument in `1..argc`. Dropping the source
/// releases whatever buffers it decoded from.
pub trait ArgumentSource<'a> {
    fn argc(&self) -> usize;

    fn program_name(&self) -> Result<Cow<'a, CStr>>;

    fn user_argument(&self, index: usize) -> Result<Cow<'a, CStr>>;
}

/// Byte-string arguments borrowed from the process's `argv`.
#[derive(Debug, Clone)]
pub struct NarrowArgs<'a> {
    args: Vec<&'a CStr>,
}

impl<'a> NarrowArgs<'a> {
    pub fn new(args: Vec<&'a CStr>) -> Self {
        Self { args }
    }

    /// Borrows the C runtime's argument vector.
    ///
    /// Stops early at a null entry. A null `argv` gives no arguments.
    ///
    /// # Safety
    /// `argv` must be null or point to at least `argc` pointers, each null
    /// or a NUL-terminated string that lives for `'a`.
    pub unsafe fn from_raw(argc: c_int, argv: *const *const c_char) -> Self {
        if argv.is_null() {
            return Self::new(Vec::new());
        }
        let count = usize::try_from(argc).unwrap_or(0);
        let args = (0..count)
            .map(|i| unsafe { *argv.add(i) })
            .take_while(|ptr| !ptr.is_null())
            .map(|ptr| unsafe { CStr::from_ptr(ptr) })
            .collect();
        Self::new(args)
    }
}

impl<'a, 'b: 'a> ArgumentSource<'a> for NarrowArgs<'b> {
    fn argc(&self) -> usize {
        self.args.len()
    }

    fn program_name(&self) -> Result<Cow<'a, CStr>> {
        Ok(Cow::Borrowed(self.args.first().copied().unwrap_or_default()))
    }

    fn user_argument(&self, index: usize) -> Result<Cow<'a, CStr>> {
        Ok(Cow::Borrowed(self.args[index]))
    }
}

/// Arguments split out of a UTF-16 command line.
#[derive(Debug, Clone)]
pub struct WideArgs {
    args: Vec<Vec<u16>>,
}

impl WideArgs {
    pub fn from_command_line(cmdline: &[u16]) -> Self {
        Self {
            args: split_command_line(cmdline),
        }
    }

    fn decode(&self, index: usize) -> String {
        String::from_utf16_lossy(&self.args[index])
    }
}

impl<'a> ArgumentSource<'a> for WideArgs {
    fn argc(&self) -> usize {
        self.args.len()
    }

    fn program_name(&self) -> Result<Cow<'a, CStr>> {
        let name = CString::new(self.decode(0)).map_err(|_| LaunchError::ArgumentNul { index: 0 })?;
        Ok(Cow::Owned(name))
    }

    // The runtime's Windows argument handling expects one trailing space on
    // every user argument.
    fn user_argument(&self, index: usize) -> Result<Cow<'a, CStr>> {
        let mut arg = self.decode(index);
        arg.push(' ');
        let arg = CString::new(arg).map_err(|_| LaunchError::ArgumentNul { index })?;
        Ok(Cow::Owned(arg))
    }
}
