use anyhow::{Context, Result, bail};
use yaml_comments::Commentable;

use super::{comment_type, load_document};
use crate::{ConfigOptions, GetArgs};

/// Run the `get` command: print one comment, or nothing if there is none.
pub fn run(config: &ConfigOptions, args: &GetArgs) -> Result<bool> {
    if args.header && args.footer {
        bail!("--header and --footer cannot be combined");
    }
    let (_, document) = load_document(config, &args.file)?;

    let comment = if args.header {
        document.header()
    } else if args.footer {
        document.footer()
    } else {
        let path = args
            .path
            .as_deref()
            .context("PATH is required unless --header or --footer is given")?;
        document.comment(path, comment_type(args.side))?
    };

    if let Some(text) = comment {
        println!("{text}");
    }
    Ok(false)
}
