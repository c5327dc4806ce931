// The C runtime calls `main` directly so argc/argv reach the launcher as the
// runtime received them.

#![no_main]

use std::ffi::{c_char, c_int};

use bundle_launcher::{launch, logging, platform, Bundle, MonoRuntime, ProcessEnvironment};
use tracing::error;

#[no_mangle]
pub extern "C" fn main(argc: c_int, argv: *const *const c_char) -> c_int {
    logging::init();

    let bundle = match Bundle::embedded() {
        Ok(bundle) => bundle,
        Err(err) => {
            error!("{}", err);
            return 1;
        }
    };

    let mut env = ProcessEnvironment;
    let mut runtime = MonoRuntime;
    match launch(&bundle, &mut env, &mut runtime, || unsafe { platform::arguments(argc, argv) }) {
        Ok(status) => status,
        Err(err) => {
            error!("{}", err);
            1
        }
    }
}
