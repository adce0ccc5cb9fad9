use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use hoard_files::LoadOptions;
use hoard_files::codec::types::Guid;

#[derive(Parser, Debug)]
#[command(name = "hoard")]
#[command(version = concat!(env!("VERGEN_GIT_BRANCH"), "/", env!("VERGEN_GIT_SHA"), " dirty=", env!("VERGEN_GIT_DIRTY")))]
#[command(about = "Loads and inspects resource containers")]
pub struct CliArgs {
    /// Apply legacy name lists and index significant names
    #[arg(long, env = "HOARD_LOAD_NAMES", default_value_t = false)]
    pub load_names: bool,

    #[arg(
        long,
        env = "HOARD_STRICT",
        default_value_t = false,
        help = "Fail on chunks no loader knows instead of skipping them"
    )]
    pub strict: bool,

    #[command(subcommand)]
    pub operation_mode: OperationMode,
}

impl CliArgs {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions::default()
            .with_names(self.load_names)
            .with_strict_chunks(self.strict)
    }
}

#[derive(Subcommand, Debug)]
pub enum OperationMode {
    /// Prints the resource tree of a container
    Tree {
        path: PathBuf,
        #[arg(long, value_enum, default_value_t = LoadMode::Full)]
        mode: LoadMode,
    },
    /// Writes the payload of a blob or the pixels of an image to a file
    Extract {
        path: PathBuf,
        /// The identity in hex, e.g. 0x00000000000000ff
        guid: Guid,
        out: PathBuf,
    },
}

#[derive(ValueEnum, Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoadMode {
    Full,
    First,
    Shallow,
}
