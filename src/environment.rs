//! Process environment access and the settings the runtime reads at startup.

use std::ffi::{CString, OsString};

use tracing::debug;

use crate::error::{LaunchError, Result};

/// String encodings the runtime assumes for external text.
pub const MONO_EXTERNAL_ENCODINGS: &str = "MONO_EXTERNAL_ENCODINGS";
pub const MONO_LOG_MASK: &str = "MONO_LOG_MASK";
pub const MONO_LOG_LEVEL: &str = "MONO_LOG_LEVEL";
/// Assembly search path handed to the directory hook.
pub const MONO_PATH: &str = "MONO_PATH";
/// When set, the bundled configuration directory is not applied.
pub const MONO_CFG_DIR: &str = "MONO_CFG_DIR";
/// Space separated runtime options added after the embedded ones.
pub const MONO_BUNDLED_OPTIONS: &str = "MONO_BUNDLED_OPTIONS";

/// Read/write view of an environment table.
pub trait Environment {
    fn var(&self, name: &str) -> Option<OsString>;

    fn set_var(&mut self, name: &str, value: &str);

    /// Returns `name` as a C string, or `None` when it is unset.
    fn var_cstring(&self, name: &'static str) -> Result<Option<CString>> {
        match self.var(name) {
            Some(value) => os_to_cstring(value)
                .map(Some)
                .map_err(|_| LaunchError::EnvironmentNul { name }),
            None => Ok(None),
        }
    }
}

/// The environment of the current process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<OsString> {
        std::env::var_os(name)
    }

    fn set_var(&mut self, name: &str, value: &str) {
        std::env::set_var(name, value);
    }
}

/// Variables forced before the runtime initializes.
///
/// Values always overwrite whatever the parent process passed down.
#[derive(Debug, Clone)]
pub struct RuntimeEnvironment {
    overrides: Vec<(&'static str, &'static str)>,
}

impl RuntimeEnvironment {
    /// UTF-16 external encodings, runtime logging cleared.
    pub fn startup() -> Self {
        Self {
            overrides: vec![
                (MONO_EXTERNAL_ENCODINGS, "UTF-16"),
                (MONO_LOG_MASK, ""),
                (MONO_LOG_LEVEL, ""),
            ],
        }
    }

    pub fn overrides(&self) -> &[(&'static str, &'static str)] {
        &self.overrides
    }

    pub fn apply<E: Environment + ?Sized>(&self, env: &mut E) {
        for (name, value) in &self.overrides {
            debug!(name, value, "setting runtime environment");
            env.set_var(name, value);
        }
    }
}

#[cfg(unix)]
fn os_to_cstring(value: OsString) -> std::result::Result<CString, std::ffi::NulError> {
    use std::os::unix::ffi::OsStringExt;
    CString::new(value.into_vec())
}

// The runtime takes UTF-8 paths on Windows
#[cfg(not(unix))]
fn os_to_cstring(value: OsString) -> std::result::Result<CString, std::ffi::NulError> {
    CString::new(value.to_string_lossy().into_owned())
}
