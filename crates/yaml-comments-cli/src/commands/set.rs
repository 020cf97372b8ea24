use anyhow::{Context, Result};
use tracing::debug;
use yaml_comments::Commentable;

use super::{comment_type, load_document, write_or_print};
use crate::{ConfigOptions, SetArgs};

/// Run the `set` command: change one comment and save or print the result.
pub fn run(config: &ConfigOptions, args: &SetArgs) -> Result<bool> {
    let (_, mut document) = load_document(config, &args.file)?;

    let text = if args.remove {
        None
    } else {
        Some(
            args.text
                .as_deref()
                .context("TEXT is required unless --remove is given")?,
        )
    };
    let kind = comment_type(args.side);
    document
        .set_comment(&args.path, text, kind)
        .with_context(|| format!("cannot set comment on {}", args.path))?;
    debug!(path = %args.path, ?kind, removed = args.remove, "comment updated");

    write_or_print(&document, &args.file, args.write)?;
    Ok(false)
}
