//! zz: package manager and build tool for Lua programs embedded into
//! native executables.
//!
//! Provides the `zz` command with subcommands:
//! - `zz init <pkg>` / `zz checkout <pkg>` / `zz get <pkg>` - source acquisition
//! - `zz build [-r] [<pkg>]` / `zz install [<pkg>]` - building and installing
//! - `zz run <script>` / `zz test [<name>...]` - running scripts and tests
//! - `zz clean [<pkg>]` / `zz distclean [<pkg>]` - cleanup

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use zz_lib::{Engine, Workspace};

mod cmd;

#[derive(Parser)]
#[command(name = "zz")]
#[command(author, version, about = "Package manager and build tool for Lua programs embedded into native executables")]
struct Cli {
  /// Silence informational output
  #[arg(short, long, global = true)]
  quiet: bool,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Create a fresh package skeleton in the workspace
  Init {
    /// Package spec (e.g. github.com/user/proj)
    package: String,
  },

  /// Clone or update a package into the workspace source tree
  Checkout {
    package: String,

    /// Pull the latest changes of an existing checkout
    #[arg(short, long)]
    update: bool,

    /// Check out a specific revision after cloning
    #[arg(short, long)]
    rev: Option<String>,
  },

  /// Checkout, build and install a package in one step
  Get {
    package: String,

    /// Pull the latest changes of an existing checkout
    #[arg(short, long)]
    update: bool,
  },

  /// Build a package (the current package when omitted)
  Build {
    package: Option<String>,

    /// Build imported packages first
    #[arg(short, long)]
    recursive: bool,
  },

  /// Build a package and symlink its apps into the global bin directory
  Install { package: Option<String> },

  /// Run a script from the current package
  Run {
    script: PathBuf,

    /// Arguments forwarded to the script
    #[arg(trailing_var_arg = true)]
    args: Vec<String>,
  },

  /// Run tests of the current package
  Test {
    /// Test names; all *_test.lua files when omitted
    names: Vec<String>,
  },

  /// Remove derived objects, libraries and generated sources
  Clean { package: Option<String> },

  /// Clean plus executables, native staging and global bin symlinks
  Distclean { package: Option<String> },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let level = if cli.quiet {
    Level::WARN
  } else if cli.verbose {
    Level::DEBUG
  } else {
    Level::INFO
  };
  FmtSubscriber::builder()
    .with_max_level(level)
    .with_target(false)
    .without_time()
    .init();

  let engine = Engine::new(Workspace::from_env());

  match cli.command {
    Commands::Init { package } => cmd::cmd_init(&engine, &package),
    Commands::Checkout { package, update, rev } => cmd::cmd_checkout(&engine, &package, update, rev.as_deref()),
    Commands::Get { package, update } => cmd::cmd_get(&engine, &package, update),
    Commands::Build { package, recursive } => cmd::cmd_build(&engine, package.as_deref(), recursive),
    Commands::Install { package } => cmd::cmd_install(&engine, package.as_deref()),
    Commands::Run { script, args } => cmd::cmd_run(&engine, &script, &args),
    Commands::Test { names } => cmd::cmd_test(&engine, &names),
    Commands::Clean { package } => cmd::cmd_clean(&engine, package.as_deref()),
    Commands::Distclean { package } => cmd::cmd_distclean(&engine, package.as_deref()),
  }
}
