use std::fs;

use anyhow::{Context, Result};

use super::{load_document, write_or_print};
use crate::{ConfigOptions, FmtArgs};

/// Run the `fmt` command: re-serialize a file with its comments.
///
/// Returns `true` in `--check` mode when the file would change.
pub fn run(config: &ConfigOptions, args: &FmtArgs) -> Result<bool> {
    let (original, document) = load_document(config, &args.file)?;
    let formatted = document.to_yaml_string()?;
    let changed = formatted != original;

    if args.check {
        if changed {
            eprintln!("{} is not formatted", args.file.display());
        }
        return Ok(changed);
    }
    if args.write {
        if changed {
            fs::write(&args.file, formatted)
                .with_context(|| format!("failed to write {}", args.file.display()))?;
        }
        return Ok(false);
    }
    write_or_print(&document, &args.file, false)?;
    Ok(false)
}
