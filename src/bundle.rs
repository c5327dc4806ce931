use std::borrow::Cow;
use std::ffi::{CStr, CString};

use tracing::debug;

use crate::embedded::{self, EmbeddedBlocks};
use crate::environment::{Environment, MONO_BUNDLED_OPTIONS};
use crate::error::{LaunchError, Result};

/// What the bundler put into the executable: runtime options, the name of
/// the image to run and an optional runtime configuration directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    options: Vec<CString>,
    image_name: CString,
    config_dir: Option<CString>,
}

impl Bundle {
    pub fn new(image_name: CString) -> Self {
        Self {
            options: Vec::new(),
            image_name,
            config_dir: None,
        }
    }

    pub fn with_options(mut self, options: impl IntoIterator<Item = CString>) -> Self {
        self.options.extend(options);
        self
    }

    pub fn with_config_dir(mut self, config_dir: CString) -> Self {
        self.config_dir = Some(config_dir);
        self
    }

    /// Loads the bundle finalized into this executable.
    pub fn embedded() -> Result<Self> {
        let blocks = EmbeddedBlocks::read();
        Self::from_blocks(&blocks.image_name, &blocks.config_dir, &blocks.options)
    }

    /// Parses the three embedded blocks.
    ///
    /// The image name must be finalized and non-empty. A config dir or
    /// options block left in template state counts as absent.
    pub fn from_blocks(image_name: &[u8], config_dir: &[u8], options: &[u8]) -> Result<Self> {
        if embedded::is_template(image_name) {
            return Err(LaunchError::NotFinalized { block: "image name" });
        }
        let image_name = embedded::decode_text(image_name, "image name")?;
        if image_name.as_bytes().is_empty() {
            return Err(LaunchError::EmptyImageName);
        }

        let config_dir = if embedded::is_template(config_dir) {
            None
        } else {
            Some(embedded::decode_text(config_dir, "config dir")?).filter(|dir| !dir.as_bytes().is_empty())
        };

        let options = if embedded::is_template(options) {
            Vec::new()
        } else {
            embedded::decode_options(options)?
        };

        debug!(
            image = %image_name.to_string_lossy(),
            options = options.len(),
            config_dir = config_dir.is_some(),
            "loaded embedded bundle"
        );

        Ok(Self {
            options,
            image_name,
            config_dir,
        })
    }

    pub fn options(&self) -> &[CString] {
        &self.options
    }

    pub fn image_name(&self) -> &CStr {
        &self.image_name
    }

    pub fn config_dir(&self) -> Option<&CStr> {
        self.config_dir.as_deref()
    }

    /// Embedded options followed by the ones in `MONO_BUNDLED_OPTIONS`.
    pub fn option_prefix<E: Environment + ?Sized>(&self, env: &E) -> Result<OptionPrefix<'_>> {
        let mut tokens: Vec<Cow<'_, CStr>> = self.options.iter().map(|o| Cow::Borrowed(o.as_c_str())).collect();

        if let Some(value) = env.var_cstring(MONO_BUNDLED_OPTIONS)? {
            let extra = split_bundled_options(value.as_bytes());
            debug!(count = extra.len(), "adding options from {}", MONO_BUNDLED_OPTIONS);
            tokens.extend(extra.into_iter().map(Cow::Owned));
        }

        Ok(OptionPrefix::new(tokens))
    }
}

/// Splits on single spaces with no quoting; empty pieces are kept.
pub fn split_bundled_options(value: &[u8]) -> Vec<CString> {
    value
        .split(|&b| b == b' ')
        .map(|piece| CString::new(piece).unwrap_or_default())
        .collect()
}

/// Runtime options placed between the program name and the image name.
#[derive(Debug, Clone, Default)]
pub struct OptionPrefix<'a> {
    tokens: Vec<Cow<'a, CStr>>,
}

impl<'a> OptionPrefix<'a> {
    pub fn new(tokens: Vec<Cow<'a, CStr>>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[Cow<'a, CStr>] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Cow<'a, CStr>> {
        self.tokens
    }

    /// Extra argument slots to reserve for the prefix: one per token,
    /// embedded options and `MONO_BUNDLED_OPTIONS` pieces alike.
    pub fn storage(&self) -> usize {
        self.tokens.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedded::{placeholder, CONFIG_DIR_MARKER, CONFIG_DIR_SIZE, OPTIONS_MARKER, OPTIONS_SIZE};
    use std::collections::HashMap;
    use std::ffi::OsString;

    struct MapEnv(HashMap<&'static str, OsString>);

    impl Environment for MapEnv {
        fn var(&self, name: &str) -> Option<OsString> {
            self.0.get(name).cloned()
        }

        fn set_var(&mut self, _name: &str, _value: &str) {
            unreachable!()
        }
    }

    fn padded(contents: &[u8], size: usize) -> Vec<u8> {
        let mut block = vec![0u8; size];
        block[..contents.len()].copy_from_slice(contents);
        block
    }

    fn cstr(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    #[test]
    fn image_only_bundle() {
        let config: [u8; CONFIG_DIR_SIZE] = placeholder(CONFIG_DIR_MARKER);
        let options: [u8; OPTIONS_SIZE] = placeholder(OPTIONS_MARKER);
        let bundle = Bundle::from_blocks(&padded(b"payload.exe", 256), &config, &options).unwrap();

        assert_eq!(bundle, Bundle::new(cstr("payload.exe")));
    }

    #[test]
    fn full_bundle() {
        let bundle = Bundle::from_blocks(
            &padded(b"payload.exe", 256),
            &padded(b"/opt/app/etc", 512),
            &padded(b"--debug\0\0", 1024),
        )
        .unwrap();

        assert_eq!(bundle.config_dir().unwrap().to_bytes(), b"/opt/app/etc");
        assert_eq!(bundle.options(), [cstr("--debug")]);
    }

    #[test]
    fn empty_config_dir_is_absent() {
        let bundle = Bundle::from_blocks(&padded(b"p.exe", 256), &[0; 512], &[0; 1024]).unwrap();
        assert!(bundle.config_dir().is_none());
        assert!(bundle.options().is_empty());
    }

    #[test]
    fn template_image_is_rejected() {
        let image: [u8; 256] = placeholder(crate::embedded::IMAGE_NAME_MARKER);
        let err = Bundle::from_blocks(&image, &[0; 512], &[0; 1024]).unwrap_err();
        assert!(matches!(err, LaunchError::NotFinalized { block: "image name" }));
    }

    #[test]
    fn empty_image_is_rejected() {
        let err = Bundle::from_blocks(&[0; 256], &[0; 512], &[0; 1024]).unwrap_err();
        assert!(matches!(err, LaunchError::EmptyImageName));
    }

    #[test]
    fn split_keeps_empty_pieces() {
        let split = split_bundled_options(b"--debug  -O=all");
        assert_eq!(split, [cstr("--debug"), cstr(""), cstr("-O=all")]);
    }

    #[test]
    fn prefix_is_embedded_then_environment() {
        let bundle = Bundle::new(cstr("p.exe")).with_options([cstr("--debug")]);
        let env = MapEnv(HashMap::from([(MONO_BUNDLED_OPTIONS, OsString::from("--gc=sgen --verbose"))]));

        let prefix = bundle.option_prefix(&env).unwrap();
        let tokens: Vec<_> = prefix.tokens().iter().map(|t| t.to_str().unwrap()).collect();
        assert_eq!(tokens, ["--debug", "--gc=sgen", "--verbose"]);
        assert_eq!(prefix.storage(), 3);
    }

    #[test]
    fn storage_counts_embedded_options_without_environment() {
        let bundle = Bundle::new(cstr("p.exe")).with_options([cstr("--debug"), cstr("--gc=sgen")]);
        let prefix = bundle.option_prefix(&MapEnv(HashMap::new())).unwrap();
        assert_eq!(prefix.storage(), 2);
        assert_eq!(prefix.storage(), prefix.tokens().len());
    }

    #[test]
    fn prefix_without_bundled_options() {
        let bundle = Bundle::new(cstr("p.exe"));
        let env = MapEnv(HashMap::new());
        assert!(bundle.option_prefix(&env).unwrap().tokens().is_empty());
    }
}
