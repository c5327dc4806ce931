//! Bundle settings baked into the launcher binary.
//!
//! The template launcher carries three fixed-size blocks, each starting with
//! an `@@MKBUNDLE_...@@` marker and padded with zeros. `finalize-bundle`
//! finds the blocks in the compiled template and overwrites them:
//!
//! - image name: NUL-terminated text, must not be empty
//! - config dir: NUL-terminated text, empty means "none"
//! - options: NUL-separated tokens, ended by an empty token
//!
//! A block that still starts with [`TEMPLATE_PREFIX`] was never finalized.

use std::ffi::CString;

use crate::error::{LaunchError, Result};

/// Common start of every marker.
pub const TEMPLATE_PREFIX: &[u8] = b"@@MKBUNDLE_";

pub const IMAGE_NAME_MARKER: &[u8] = b"@@MKBUNDLE_IMAGE_NAME@@";
pub const IMAGE_NAME_SIZE: usize = 256;

pub const CONFIG_DIR_MARKER: &[u8] = b"@@MKBUNDLE_CONFIG_DIR@@";
pub const CONFIG_DIR_SIZE: usize = 512;

pub const OPTIONS_MARKER: &[u8] = b"@@MKBUNDLE_OPTIONS@@";
pub const OPTIONS_SIZE: usize = 1024;

/// A block in its unfinalized state: marker followed by zeros.
pub const fn placeholder<const N: usize>(marker: &[u8]) -> [u8; N] {
    let mut block = [0u8; N];
    let mut i = 0;
    while i < marker.len() {
        block[i] = marker[i];
        i += 1;
    }
    block
}

#[used]
#[cfg_attr(target_os = "linux", link_section = ".mkbundle")]
#[cfg_attr(target_os = "macos", link_section = "__DATA,__mkbundle")]
static mut IMAGE_NAME_BLOCK: [u8; IMAGE_NAME_SIZE] = placeholder(IMAGE_NAME_MARKER);

#[used]
#[cfg_attr(target_os = "linux", link_section = ".mkbundle")]
#[cfg_attr(target_os = "macos", link_section = "__DATA,__mkbundle")]
static mut CONFIG_DIR_BLOCK: [u8; CONFIG_DIR_SIZE] = placeholder(CONFIG_DIR_MARKER);

#[used]
#[cfg_attr(target_os = "linux", link_section = ".mkbundle")]
#[cfg_attr(target_os = "macos", link_section = "__DATA,__mkbundle")]
static mut OPTIONS_BLOCK: [u8; OPTIONS_SIZE] = placeholder(OPTIONS_MARKER);

/// Copies of the three blocks as they are in this binary.
pub struct EmbeddedBlocks {
    pub image_name: [u8; IMAGE_NAME_SIZE],
    pub config_dir: [u8; CONFIG_DIR_SIZE],
    pub options: [u8; OPTIONS_SIZE],
}

impl EmbeddedBlocks {
    /// Reads the blocks from this binary's data section.
    ///
    /// Reads are volatile: the contents are rewritten in the file after
    /// compilation, so the compiler must not fold the template values.
    pub fn read() -> Self {
        unsafe {
            Self {
                image_name: core::ptr::read_volatile(core::ptr::addr_of!(IMAGE_NAME_BLOCK)),
                config_dir: core::ptr::read_volatile(core::ptr::addr_of!(CONFIG_DIR_BLOCK)),
                options: core::ptr::read_volatile(core::ptr::addr_of!(OPTIONS_BLOCK)),
            }
        }
    }
}

pub fn is_template(block: &[u8]) -> bool {
    block.starts_with(TEMPLATE_PREFIX)
}

/// Text up to the first NUL.
pub fn decode_text(block: &[u8], name: &'static str) -> Result<CString> {
    let end = block
        .iter()
        .position(|&b| b == 0)
        .ok_or(LaunchError::Unterminated { block: name })?;
    CString::new(&block[..end]).map_err(|_| LaunchError::Unterminated { block: name })
}

/// NUL-separated tokens up to the first empty one.
pub fn decode_options(block: &[u8]) -> Result<Vec<CString>> {
    let mut options = Vec::new();
    let mut pos = 0;
    loop {
        let rest = &block[pos..];
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(LaunchError::MalformedOptions)?;
        if len == 0 {
            return Ok(options);
        }
        let token = CString::new(&rest[..len]).map_err(|_| LaunchError::MalformedOptions)?;
        options.push(token);
        pos += len + 1;
    }
}

/// Builds the finalized options block contents (without zero padding).
///
/// Tokens must be non-empty and free of NUL; the result must fit in
/// [`OPTIONS_SIZE`].
pub fn encode_options<S: AsRef<str>>(tokens: &[S]) -> std::result::Result<Vec<u8>, String> {
    let mut block = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        let token = token.as_ref().as_bytes();
        if token.is_empty() {
            return Err(format!("option {} is empty", i));
        }
        if token.contains(&0) {
            return Err(format!("option {} contains a NUL byte", i));
        }
        block.extend_from_slice(token);
        block.push(0);
    }
    block.push(0);

    if block.len() > OPTIONS_SIZE {
        return Err(format!(
            "options too long: {} bytes > {} bytes max",
            block.len(),
            OPTIONS_SIZE
        ));
    }
    Ok(block)
}
