use std::fs;
use std::io::{self, Write};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use bundle_launcher::embedded::{
    encode_options, placeholder, CONFIG_DIR_MARKER, CONFIG_DIR_SIZE, IMAGE_NAME_MARKER, IMAGE_NAME_SIZE,
    OPTIONS_MARKER, OPTIONS_SIZE,
};
use clap::Parser;

/// Writes the bundle settings into a template bundle-launcher binary.
#[derive(Debug, Parser)]
#[command(name = "finalize-bundle", version)]
struct Args {
    /// Path to the template launcher binary
    template: PathBuf,

    /// Name of the embedded image the runtime should run
    #[arg(long)]
    image: String,

    /// Runtime configuration directory used unless MONO_CFG_DIR is set
    #[arg(long)]
    config_dir: Option<String>,

    /// Runtime option placed before the image name (can be repeated)
    #[arg(long = "option", value_name = "TOKEN", allow_hyphen_values = true)]
    options: Vec<String>,

    /// Write output to file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

/// Values written into the template's placeholder blocks.
#[derive(Debug, Default)]
struct Settings {
    image: String,
    config_dir: Option<String>,
    options: Vec<String>,
}

fn find_pattern(data: &[u8], pattern: &[u8]) -> Option<usize> {
    data.windows(pattern.len()).position(|window| window == pattern)
}

fn replace_at(data: &mut [u8], offset: usize, new_value: &[u8], fixed_size: usize) -> Result<()> {
    // Keep at least one trailing NUL in the block
    if new_value.len() >= fixed_size {
        bail!("Value too long: {} bytes > {} bytes max", new_value.len(), fixed_size - 1);
    }

    data[offset..offset + fixed_size].fill(0);
    data[offset..offset + new_value.len()].copy_from_slice(new_value);

    Ok(())
}

/// Locates the untouched block for `marker` and overwrites it with `value`.
///
/// The search pattern is the whole template block (marker plus zero padding)
/// so a stray copy of the marker text elsewhere in the binary is not hit.
fn replace_block<const N: usize>(data: &mut [u8], marker: &[u8], name: &str, value: &[u8]) -> Result<()> {
    let pattern: [u8; N] = placeholder(marker);
    let pos = find_pattern(data, &pattern).with_context(|| format!("{} placeholder not found in template", name))?;
    replace_at(data, pos, value, N).with_context(|| format!("Cannot embed {}", name))?;
    eprintln!("Replaced {} with: {}", name, String::from_utf8_lossy(value));
    Ok(())
}

fn finalize(mut data: Vec<u8>, settings: &Settings) -> Result<Vec<u8>> {
    if settings.image.is_empty() {
        bail!("Image name must not be empty");
    }
    for (name, value) in [("image name", Some(&settings.image)), ("config dir", settings.config_dir.as_ref())] {
        if value.is_some_and(|v| v.contains('\0')) {
            bail!("{} contains a NUL byte", name);
        }
    }

    replace_block::<IMAGE_NAME_SIZE>(&mut data, IMAGE_NAME_MARKER, "IMAGE_NAME", settings.image.as_bytes())?;

    // An empty config dir block means "none"
    let config_dir = settings.config_dir.as_deref().unwrap_or("");
    replace_block::<CONFIG_DIR_SIZE>(&mut data, CONFIG_DIR_MARKER, "CONFIG_DIR", config_dir.as_bytes())?;

    let options = encode_options(settings.options.as_slice()).map_err(anyhow::Error::msg)?;
    let pattern: [u8; OPTIONS_SIZE] = placeholder(OPTIONS_MARKER);
    let pos = find_pattern(&data, &pattern).context("OPTIONS placeholder not found in template")?;
    data[pos..pos + OPTIONS_SIZE].fill(0);
    data[pos..pos + options.len()].copy_from_slice(&options);
    eprintln!("Replaced OPTIONS with: {:?}", settings.options);

    Ok(data)
}

fn finalize_launcher(template_path: &Path, output_path: Option<&Path>, settings: &Settings) -> Result<()> {
    // Prevent overwriting the input file
    if let Some(output) = output_path {
        let template_canon = fs::canonicalize(template_path).context("Failed to resolve template path")?;
        let output_canon = fs::canonicalize(output).ok();

        if output_canon.as_ref() == Some(&template_canon) {
            bail!("Output path cannot be the same as template path (would overwrite input)");
        }
    }

    let data = fs::read(template_path)
        .with_context(|| format!("Failed to read template {}", template_path.display()))?;
    let data = finalize(data, settings)?;

    if let Some(output) = output_path {
        fs::write(output, &data).with_context(|| format!("Failed to write output {}", output.display()))?;

        // Make executable (Unix only)
        #[cfg(unix)]
        {
            let mut perms = fs::metadata(output).context("Failed to get metadata")?.permissions();
            perms.set_mode(0o755);
            fs::set_permissions(output, perms).context("Failed to set permissions")?;
        }

        eprintln!("\nFinalized launcher written to: {}", output.display());
    } else {
        io::stdout().write_all(&data).context("Failed to write to stdout")?;
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let settings = Settings {
        image: args.image,
        config_dir: args.config_dir,
        options: args.options,
    };

    match finalize_launcher(&args.template, args.output.as_deref(), &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
