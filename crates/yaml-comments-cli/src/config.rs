use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;
use yaml_comments::CommentOptions;

pub const CONFIG_FILENAME: &str = "yaml-comments.toml";

/// Search for `yaml-comments.toml` starting from `start_dir`, walking up.
pub fn find_config_path(start_dir: &Path) -> Option<PathBuf> {
    let mut dir = start_dir.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILENAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Options for `file`: from `explicit` if given, else from the nearest
/// config file above it, else the defaults.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be read, parsed or
/// validated.
pub fn load_options(explicit: Option<&Path>, file: &Path) -> Result<CommentOptions> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let start = match file.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
                _ => std::env::current_dir()?,
            };
            find_config_path(&start)
        }
    };
    let Some(path) = path else {
        return Ok(CommentOptions::default());
    };

    let text =
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let options: CommentOptions =
        toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))?;
    options
        .validate()
        .with_context(|| format!("invalid options in {}", path.display()))?;
    debug!(path = %path.display(), "loaded options");
    Ok(options)
}
