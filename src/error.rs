use thiserror::Error;

/// Everything that can stop the launcher before control reaches the runtime.
///
/// Once the runtime's main entry point is called nothing is reported through
/// this type; the runtime's return value is passed through as-is.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("this is a template launcher: the {block} block still holds its placeholder, run finalize-bundle on it first")]
    NotFinalized { block: &'static str },

    #[error("embedded image name is empty")]
    EmptyImageName,

    #[error("embedded {block} block has no terminating NUL")]
    Unterminated { block: &'static str },

    #[error("embedded options block does not end with an empty token")]
    MalformedOptions,

    #[error("argument {index} contains a NUL character")]
    ArgumentNul { index: usize },

    #[error("environment variable {name} contains a NUL character")]
    EnvironmentNul { name: &'static str },
}

pub type Result<T, E = LaunchError> = std::result::Result<T, E>;
