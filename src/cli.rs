use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "repotree",
    version,
    about = "Materialize directory layouts and generate synthetic trees"
)]
pub struct Cli {
    #[arg(short = 'C', long = "chdir", global = true)]
    pub chdir: Option<PathBuf>,
    #[arg(short = 'f', long = "file", global = true)]
    pub file: Option<PathBuf>,
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Answer yes to every question.
    #[arg(short = 'y', long = "yes", global = true, conflicts_with = "no")]
    pub yes: bool,
    /// Answer no to every question.
    #[arg(long = "no", global = true)]
    pub no: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the layout described by a `.json` schema.
    Build(BuildArgs),
    /// Create the bundled sample project layout.
    Example(TargetArgs),
    /// Generate a synthetic layout for benchmarking.
    Bulk(BulkArgs),
    /// Configuration display and template generation.
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommand>,
    },
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    pub schema: PathBuf,
    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Directory the root is created in.
    #[arg(long = "base", default_value = ".")]
    pub base: PathBuf,
    /// Skip `git init` after the tree is created.
    #[arg(long = "no-git")]
    pub no_git: bool,
}

#[derive(Args, Debug)]
pub struct BulkArgs {
    pub name: String,
    #[arg(long = "dirs", default_value_t = 10)]
    pub dirs: usize,
    #[arg(long = "files", default_value_t = 100)]
    pub files: usize,
    #[arg(long = "depth", default_value_t = 1)]
    pub depth: usize,
    /// Build directory chains `--depth` deep instead of flat directories.
    #[arg(long = "nested")]
    pub nested: bool,
    #[arg(long = "dir-prefix")]
    pub dir_prefix: Option<String>,
    #[arg(long = "file-prefix")]
    pub file_prefix: Option<String>,
    #[arg(long = "ext")]
    pub extension: Option<String>,
    #[arg(long = "content")]
    pub content: Option<String>,
    #[arg(long = "base", default_value = ".")]
    pub base: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    Show,
    Path,
    Generate {
        #[arg()]
        path: Option<PathBuf>,
        #[arg(long = "force", default_value_t = false)]
        force: bool,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}
