use std::path::PathBuf;
use std::process::ExitCode;

use bpaf::Bpaf;
use tracing_subscriber::prelude::*;

mod commands;
mod config;

#[derive(Debug, Clone, Bpaf)]
pub struct ConfigOptions {
    /// Read options from FILE instead of the nearest yaml-comments.toml
    #[bpaf(long("config"), argument("FILE"))]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Bpaf)]
pub struct GetArgs {
    /// Read the side comment instead of the block comment
    #[bpaf(long("side"), switch)]
    pub side: bool,

    /// Read the file header
    #[bpaf(long("header"), switch)]
    pub header: bool,

    /// Read the file footer
    #[bpaf(long("footer"), switch)]
    pub footer: bool,

    /// YAML file to read
    #[bpaf(positional("FILE"))]
    pub file: PathBuf,

    /// Key path, e.g. server.ports[0]
    #[bpaf(positional("PATH"))]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Bpaf)]
pub struct SetArgs {
    /// Set the side comment instead of the block comment
    #[bpaf(long("side"), switch)]
    pub side: bool,

    /// Remove the comment
    #[bpaf(long("remove"), switch)]
    pub remove: bool,

    /// Write the result back to FILE instead of printing it
    #[bpaf(short('w'), long("write"), switch)]
    pub write: bool,

    /// YAML file to edit
    #[bpaf(positional("FILE"))]
    pub file: PathBuf,

    /// Key path, e.g. server.ports[0]
    #[bpaf(positional("PATH"))]
    pub path: String,

    /// Comment text; lines are prefixed with the configured format
    #[bpaf(positional("TEXT"))]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Bpaf)]
pub struct FmtArgs {
    /// Exit with status 1 if the file would change
    #[bpaf(long("check"), switch)]
    pub check: bool,

    /// Write the result back to FILE instead of printing it
    #[bpaf(short('w'), long("write"), switch)]
    pub write: bool,

    /// YAML file to format
    #[bpaf(positional("FILE"))]
    pub file: PathBuf,
}

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version, fallback_to_usage)]
/// Read, write and preserve comments in YAML files
struct Cli {
    #[bpaf(external(commands))]
    command: Commands,
}

#[derive(Debug, Clone, Bpaf)]
enum Commands {
    #[bpaf(command("get"))]
    /// Print a comment
    Get(
        #[bpaf(external(config_options), hide_usage)] ConfigOptions,
        #[bpaf(external(get_args))] GetArgs,
    ),

    #[bpaf(command("set"))]
    /// Set or remove a comment
    Set(
        #[bpaf(external(config_options), hide_usage)] ConfigOptions,
        #[bpaf(external(set_args))] SetArgs,
    ),

    #[bpaf(command("fmt"))]
    /// Re-serialize a file, keeping its comments
    Fmt(
        #[bpaf(external(config_options), hide_usage)] ConfigOptions,
        #[bpaf(external(fmt_args))] FmtArgs,
    ),
}

fn main() -> ExitCode {
    if let Ok(filter) = tracing_subscriber::EnvFilter::try_from_env("YAML_COMMENTS_LOG") {
        tracing_subscriber::registry()
            .with(
                tracing_tree::HierarchicalLayer::new(2)
                    .with_targets(true)
                    .with_bracketed_fields(true)
                    .with_indent_lines(true)
                    .with_timer(tracing_tree::time::Uptime::default())
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .init();
    }

    let cli = cli().run();

    let result = match cli.command {
        Commands::Get(config, args) => commands::get::run(&config, &args),
        Commands::Set(config, args) => commands::set::run(&config, &args),
        Commands::Fmt(config, args) => commands::fmt::run(&config, &args),
    };

    match result {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_get_with_path() -> anyhow::Result<()> {
        let cli = cli()
            .run_inner(&["get", "config.yml", "server.port"])
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;
        match cli.command {
            Commands::Get(config, args) => {
                assert!(config.config.is_none());
                assert_eq!(args.file, PathBuf::from("config.yml"));
                assert_eq!(args.path.as_deref(), Some("server.port"));
                assert!(!args.side);
                assert!(!args.header);
            }
            _ => panic!("expected Get"),
        }
        Ok(())
    }

    #[test]
    fn cli_parses_get_header() -> anyhow::Result<()> {
        let cli = cli()
            .run_inner(&["get", "--header", "config.yml"])
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;
        match cli.command {
            Commands::Get(_, args) => {
                assert!(args.header);
                assert!(args.path.is_none());
            }
            _ => panic!("expected Get"),
        }
        Ok(())
    }

    #[test]
    fn cli_parses_set_all_options() -> anyhow::Result<()> {
        let cli = cli()
            .run_inner(&[
                "set",
                "--config",
                "other.toml",
                "--side",
                "-w",
                "config.yml",
                "list[-1]",
                "last one",
            ])
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;
        match cli.command {
            Commands::Set(config, args) => {
                assert_eq!(config.config, Some(PathBuf::from("other.toml")));
                assert!(args.side);
                assert!(args.write);
                assert!(!args.remove);
                assert_eq!(args.path, "list[-1]");
                assert_eq!(args.text.as_deref(), Some("last one"));
            }
            _ => panic!("expected Set"),
        }
        Ok(())
    }

    #[test]
    fn cli_parses_set_remove_without_text() -> anyhow::Result<()> {
        let cli = cli()
            .run_inner(&["set", "--remove", "config.yml", "a.b"])
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;
        match cli.command {
            Commands::Set(_, args) => {
                assert!(args.remove);
                assert!(args.text.is_none());
            }
            _ => panic!("expected Set"),
        }
        Ok(())
    }

    #[test]
    fn cli_parses_fmt_check() -> anyhow::Result<()> {
        let cli = cli()
            .run_inner(&["fmt", "--check", "config.yml"])
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;
        match cli.command {
            Commands::Fmt(_, args) => {
                assert!(args.check);
                assert!(!args.write);
            }
            _ => panic!("expected Fmt"),
        }
        Ok(())
    }

    #[test]
    fn cli_set_requires_path() {
        assert!(cli().run_inner(&["set", "config.yml"]).is_err());
    }
}
