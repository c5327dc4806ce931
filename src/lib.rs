//! Native entry point for bundled managed executables.
//!
//! The launcher forces the runtime's encoding and logging settings, builds
//! `argv` as `program, runtime options, image name, user arguments` and
//! hands it to the embedded runtime's main entry point. The runtime's
//! return value becomes the exit status.

use std::ffi::{c_int, CStr};

use tracing::debug;

pub mod assemble;
pub mod bundle;
pub mod cmdline;
pub mod embedded;
pub mod environment;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod source;

// Platform-specific argument fetching
#[cfg(windows)]
#[path = "windows.rs"]
pub mod platform;

#[cfg(not(windows))]
#[path = "unix.rs"]
pub mod platform;

pub use assemble::{assemble, ArgVector};
pub use bundle::{Bundle, OptionPrefix};
pub use environment::{Environment, ProcessEnvironment, RuntimeEnvironment};
pub use error::{LaunchError, Result};
#[cfg(feature = "mono")]
pub use runtime::MonoRuntime;
pub use runtime::EmbeddedRuntime;
pub use source::{ArgumentSource, NarrowArgs, WideArgs};

/// Runs the whole launch sequence and returns the runtime's exit status.
///
/// The startup environment is applied before `arguments` is called, so the
/// process arguments are read only after it is in place. Errors are only
/// possible before the runtime is entered.
pub fn launch<'a, S, E, R>(
    bundle: &'a Bundle,
    env: &mut E,
    runtime: &mut R,
    arguments: impl FnOnce() -> S,
) -> Result<c_int>
where
    S: ArgumentSource<'a>,
    E: Environment + ?Sized,
    R: EmbeddedRuntime + ?Sized,
{
    RuntimeEnvironment::startup().apply(env);

    let source = arguments();
    let prefix = bundle.option_prefix(env)?;
    let mut args = assemble(source, prefix, bundle.image_name())?;

    configure_dirs(bundle.config_dir(), env, runtime)?;
    runtime.bundle_init();

    debug!(argc = args.len(), "entering runtime");
    Ok(runtime.main(&mut args))
}

/// Points the runtime at the bundled config dir unless `MONO_CFG_DIR` is set.
///
/// Returns whether the runtime's directory hook was called.
pub fn configure_dirs<E, R>(config_dir: Option<&CStr>, env: &E, runtime: &mut R) -> Result<bool>
where
    E: Environment + ?Sized,
    R: EmbeddedRuntime + ?Sized,
{
    let Some(config_dir) = config_dir else {
        return Ok(false);
    };
    if env.var(environment::MONO_CFG_DIR).is_some() {
        debug!("{} is set, keeping the runtime's config dir", environment::MONO_CFG_DIR);
        return Ok(false);
    }

    let assembly_dir = env.var_cstring(environment::MONO_PATH)?;
    debug!(
        config_dir = %config_dir.to_string_lossy(),
        assembly_dir = assembly_dir.is_some(),
        "setting runtime directories"
    );
    runtime.set_dirs(assembly_dir.as_deref(), config_dir);
    Ok(true)
}
