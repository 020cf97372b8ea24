pub mod fmt;
pub mod get;
pub mod set;

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use yaml_comments::{CommentType, YamlDocument};

use crate::ConfigOptions;
use crate::config;

pub fn comment_type(side: bool) -> CommentType {
    if side {
        CommentType::Side
    } else {
        CommentType::Block
    }
}

/// Read `file` with the options that apply to it.
///
/// Returns the original text alongside the document.
pub fn load_document(config: &ConfigOptions, file: &Path) -> Result<(String, YamlDocument)> {
    let options = config::load_options(config.config.as_deref(), file)?;
    let text =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let mut document = YamlDocument::new(options)?;
    document
        .load_str(&text)
        .with_context(|| format!("failed to parse {}", file.display()))?;
    Ok((text, document))
}

/// Save `document` to `file`, or print it to stdout.
pub fn write_or_print(document: &YamlDocument, file: &Path, write: bool) -> Result<()> {
    if write {
        document
            .save(file)
            .with_context(|| format!("failed to write {}", file.display()))?;
        return Ok(());
    }
    let mut stdout = std::io::stdout().lock();
    document.write_to(&mut stdout)?;
    stdout.flush()?;
    Ok(())
}
