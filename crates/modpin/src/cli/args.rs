use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use modpin_lock::DEFAULT_LOCKFILE;

/// Pin module dependencies to content hashes for reproducible builds.
#[derive(Parser, Debug)]
#[command(name = "modpin", version, about, long_about = None, propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file (defaults to ./modpin.toml)
    #[arg(short, long, global = true, env = "MODPIN_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch modules into the cache and print their hashes
    #[command(alias = "f")]
    Fetch(FetchArgs),

    /// Generate a lock file from a module list
    #[command(alias = "l")]
    Lock(LockArgs),

    /// Check that a lock file matches a module list
    Verify(VerifyArgs),

    /// Re-fetch modules and refresh their lock entries
    #[command(alias = "up")]
    Update(UpdateArgs),

    /// Print the tree hash of fetched modules
    #[command(name = "tree-hash")]
    TreeHash(TreeHashArgs),
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Modules as path@version
    #[arg(required = true, value_name = "MODULE")]
    pub modules: Vec<String>,
}

/// Where the module list comes from.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Module list, one `path version` per line (`-` reads stdin)
    #[arg(short, long, default_value = "modules.txt")]
    pub requirements: PathBuf,
}

#[derive(Args, Debug)]
pub struct LockArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Lock file to write
    #[arg(short, long, default_value = DEFAULT_LOCKFILE)]
    pub output: PathBuf,

    /// Toolchain version to record, overriding the module list
    #[arg(long)]
    pub toolchain: Option<String>,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Lock file to check
    #[arg(short, long, default_value = DEFAULT_LOCKFILE)]
    pub lock: PathBuf,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Module paths to re-fetch; all out-of-date modules when empty
    #[arg(value_name = "PATH")]
    pub modules: Vec<String>,

    #[command(flatten)]
    pub input: InputArgs,

    /// Lock file to update
    #[arg(short, long, default_value = DEFAULT_LOCKFILE)]
    pub lock: PathBuf,
}

#[derive(Args, Debug)]
pub struct TreeHashArgs {
    /// Modules as path@version
    #[arg(required = true, value_name = "MODULE")]
    pub modules: Vec<String>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_valid() { Cli::command().debug_assert(); }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::try_parse_from(["modpin", "-vv", "fetch", "golang.org/x/text@v0.14.0"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Fetch(args) => assert_eq!(args.modules, vec!["golang.org/x/text@v0.14.0"]),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn lock_defaults() {
        let cli = Cli::try_parse_from(["modpin", "lock"]).unwrap();
        match cli.command {
            Commands::Lock(args) => {
                assert_eq!(args.output, PathBuf::from(DEFAULT_LOCKFILE));
                assert_eq!(args.input.requirements, PathBuf::from("modules.txt"));
                assert_eq!(args.toolchain, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn tree_hash_requires_a_module() {
        assert!(Cli::try_parse_from(["modpin", "tree-hash"]).is_err());
    }
}
