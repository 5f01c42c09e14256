use clap::{ArgGroup, Parser};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "swapper")]
#[command(about = "Telegram bot that swaps keywords for stickers.", version)]
#[command(group(ArgGroup::new("mode").required(true).args(["file", "dump"])))]
pub(crate) struct Cli {
    /// Configuration file (JSON, TOML or YAML).
    #[arg(short = 'f', value_name = "FILE")]
    pub(crate) file: Option<PathBuf>,

    /// Print the default configuration and exit.
    #[arg(short = 'd')]
    pub(crate) dump: bool,

    /// Delete every stored mapping and setting before starting.
    #[arg(long = "clear-all", requires = "file")]
    pub(crate) clear_all: bool,
}
