use clap::{Parser, Subcommand};

use self::{catalog::CatalogArg, simulate::SimulateArg, wave::WaveArg};

mod catalog;
mod simulate;
mod wave;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What to run
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play a headless run, placing every offered piece automatically
    Simulate(#[clap(flatten)] SimulateArg),
    /// Generate a single wave for a board read from an ASCII file
    Wave(#[clap(flatten)] WaveArg),
    /// Validate and list a shape catalog
    Catalog(#[clap(flatten)] CatalogArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Simulate(arg) => simulate::run(&arg)?,
        Mode::Wave(arg) => wave::run(&arg)?,
        Mode::Catalog(arg) => catalog::run(&arg)?,
    }
    Ok(())
}
