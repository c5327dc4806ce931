//! Builds the argument vector handed to the runtime's main entry point.
//!
//! Layout: program name, option prefix, image name, user arguments, null.

use std::borrow::Cow;
use std::ffi::{c_char, c_int, CStr};

use tracing::debug;

use crate::bundle::OptionPrefix;
use crate::error::Result;
use crate::source::ArgumentSource;

/// The finished `argv`, owning or borrowing every string it points at.
#[derive(Debug)]
pub struct ArgVector<'a> {
    args: Vec<Cow<'a, CStr>>,
    ptrs: Vec<*mut c_char>,
}

impl<'a> ArgVector<'a> {
    fn new(args: Vec<Cow<'a, CStr>>) -> Self {
        let mut ptrs = Vec::new();
        reserve_or_abort(&mut ptrs, args.len() + 1);
        ptrs.extend(args.iter().map(|arg| arg.as_ptr() as *mut c_char));
        ptrs.push(std::ptr::null_mut());
        Self { args, ptrs }
    }

    /// Number of arguments, sentinel excluded.
    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn argc(&self) -> c_int {
        c_int::try_from(self.args.len()).unwrap_or(c_int::MAX)
    }

    pub fn args(&self) -> &[Cow<'a, CStr>] {
        &self.args
    }

    /// Pointer view, null sentinel included.
    pub fn as_ptrs(&self) -> &[*mut c_char] {
        &self.ptrs
    }

    /// `argv` for a C `main`. Valid while `self` lives.
    pub fn as_mut_ptr(&mut self) -> *mut *mut c_char {
        self.ptrs.as_mut_ptr()
    }
}

/// Reserves `additional` slots, aborting the process if that fails.
fn reserve_or_abort<T>(vec: &mut Vec<T>, additional: usize) {
    if let Err(err) = vec.try_reserve_exact(additional) {
        eprintln!("ERROR: cannot allocate {} argument slots: {}", additional, err);
        std::process::abort();
    }
}

/// Assembles `argv` from the process arguments and bundle settings.
///
/// `source` is dropped, releasing its decoded buffers, once the user
/// arguments are copied.
pub fn assemble<'a, S>(source: S, prefix: OptionPrefix<'a>, image_name: &'a CStr) -> Result<ArgVector<'a>>
where
    S: ArgumentSource<'a>,
{
    let argc = source.argc();

    // argc covers the program name and user arguments, 2 more the image
    // name and the sentinel
    let mut args = Vec::new();
    reserve_or_abort(&mut args, argc + 2 + prefix.storage());

    args.push(source.program_name()?);
    args.extend(prefix.into_tokens());
    args.push(Cow::Borrowed(image_name));
    for index in 1..argc {
        args.push(source.user_argument(index)?);
    }
    drop(source);

    debug!(argc = args.len(), user_args = argc.saturating_sub(1), "assembled runtime arguments");
    Ok(ArgVector::new(args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{NarrowArgs, WideArgs};
    use std::ffi::CString;

    fn cstr(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    fn prefix<'a>(tokens: &'a [CString]) -> OptionPrefix<'a> {
        OptionPrefix::new(tokens.iter().map(|t| Cow::Borrowed(t.as_c_str())).collect())
    }

    fn strings(args: &ArgVector<'_>) -> Vec<String> {
        args.args().iter().map(|a| a.to_str().unwrap().to_string()).collect()
    }

    #[test]
    fn narrow_layout() {
        let raw = [cstr("prog"), cstr("a"), cstr("b")];
        let source = NarrowArgs::new(raw.iter().map(|a| a.as_c_str()).collect());
        let options = [cstr("--opt1")];
        let image = cstr("payload.exe");

        let args = assemble(source, prefix(&options), &image).unwrap();

        assert_eq!(strings(&args), ["prog", "--opt1", "payload.exe", "a", "b"]);
        assert_eq!(args.as_ptrs().len(), 6);
        assert!(args.as_ptrs()[5].is_null());
    }

    #[test]
    fn wide_layout_appends_space_to_user_arguments_only() {
        let line: Vec<u16> = "prog a b".encode_utf16().collect();
        let source = WideArgs::from_command_line(&line);
        let options = [cstr("--opt1")];
        let image = cstr("payload.exe");

        let args = assemble(source, prefix(&options), &image).unwrap();

        assert_eq!(strings(&args), ["prog", "--opt1", "payload.exe", "a ", "b "]);
        assert_eq!(args.argc(), 5);
        assert!(args.as_ptrs()[5].is_null());
    }

    #[test]
    fn length_follows_prefix_and_argument_counts() {
        let image = cstr("payload.exe");
        for n in 1..5 {
            for m in 0..4 {
                let raw: Vec<CString> = (0..n).map(|i| cstr(&format!("arg{}", i))).collect();
                let options: Vec<CString> = (0..m).map(|i| cstr(&format!("--o{}", i))).collect();
                let source = NarrowArgs::new(raw.iter().map(|a| a.as_c_str()).collect());

                let args = assemble(source, prefix(&options), &image).unwrap();

                assert_eq!(args.len(), 1 + m + 1 + (n - 1));
                assert_eq!(args.as_ptrs().len(), args.len() + 1);
                assert!(args.as_ptrs().last().unwrap().is_null());
                assert_eq!(&*args.args()[1 + m], image.as_c_str());
            }
        }
    }

    #[test]
    fn empty_prefix_puts_image_after_program_name() {
        let raw = [cstr("prog"), cstr("x")];
        let source = NarrowArgs::new(raw.iter().map(|a| a.as_c_str()).collect());
        let image = cstr("payload.exe");

        let args = assemble(source, OptionPrefix::default(), &image).unwrap();

        assert_eq!(strings(&args), ["prog", "payload.exe", "x"]);
    }

    #[test]
    fn narrow_arguments_are_not_copied() {
        let raw = [cstr("prog"), cstr("a")];
        let source = NarrowArgs::new(raw.iter().map(|a| a.as_c_str()).collect());
        let image = cstr("payload.exe");

        let args = assemble(source, OptionPrefix::default(), &image).unwrap();

        assert_eq!(args.as_ptrs()[0] as *const c_char, raw[0].as_ptr());
        assert_eq!(args.as_ptrs()[2] as *const c_char, raw[1].as_ptr());
    }
}
