use clap::{ArgAction, Parser, Subcommand, ValueHint};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Provide custom config file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the configuration file to stdout
    Config,

    /// Generate a default config file
    #[clap(name = "defconfig")]
    DefConfig,

    /// Synchronize a repository from a downloaded snapshot
    #[command(arg_required_else_help = true)]
    Sync {
        /// Repository tag, as declared in the config
        #[arg(required = true)]
        repo: String,

        /// Snapshot archive (`<repo>.db`)
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        snapshot: String,

        /// Reconcile even if the snapshot was already applied
        #[arg(required = false, short, long)]
        force: bool,
    },

    /// Show the package record for a name
    #[command(arg_required_else_help = true)]
    #[clap(name = "lookup", visible_alias = "query")]
    Lookup {
        /// Package name
        #[arg(required = true)]
        name: String,

        /// Repository tag; the first matching repository is used when omitted
        #[arg(required = false)]
        repo: Option<String>,

        /// Only show the record of this architecture
        #[arg(required = false, short, long, requires = "repo", conflicts_with = "all")]
        arch: Option<String>,

        /// Show every architecture of the package
        #[arg(required = false, long, requires = "repo")]
        all: bool,
    },

    /// Show the sync state of every configured repository
    Status,
}

#[cfg(test)]
mod tests {
    use clap::{error::ErrorKind, CommandFactory};

    use super::*;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_lookup_arch_requires_repo() {
        let err = Args::try_parse_from(["nyx-pkgsync", "lookup", "yay", "--arch", "x86_64"])
            .err()
            .map(|err| err.kind());
        assert_eq!(err, Some(ErrorKind::MissingRequiredArgument));

        let args = Args::try_parse_from(["nyx-pkgsync", "query", "yay", "archlinuxcn", "--all"])
            .unwrap();
        match args.command {
            Commands::Lookup {
                name, repo, all, ..
            } => {
                assert_eq!(name, "yay");
                assert_eq!(repo.as_deref(), Some("archlinuxcn"));
                assert!(all);
            }
            _ => panic!("expected lookup command"),
        }
    }
}
