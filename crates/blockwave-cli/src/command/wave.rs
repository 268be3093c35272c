use std::path::PathBuf;

use blockwave_engine::{Wave, WaveGenerator, WaveSeed};
use rand::Rng as _;

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct WaveArg {
    /// ASCII board file (`#` occupied, `.` empty, one line per row)
    board: PathBuf,
    /// Current run score
    #[arg(long, default_value_t = 0)]
    score: u64,
    /// Number of slots (from the configuration if omitted)
    #[arg(long)]
    slots: Option<usize>,
    /// Generate a revive wave instead of a regular one
    #[arg(long)]
    revive: bool,
    /// Seed as 32 hex digits (random if omitted)
    #[arg(long)]
    seed: Option<WaveSeed>,
    /// Shape catalog JSON file (built-in catalog if omitted)
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Generator configuration JSON file (defaults if omitted)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the wave as JSON
    #[arg(long)]
    json: bool,
}

pub(crate) fn run(arg: &WaveArg) -> anyhow::Result<()> {
    let board = util::read_board_file(&arg.board)?;
    let catalog = util::load_catalog(arg.catalog.as_ref())?;
    let config = util::load_config(arg.config.as_ref())?;
    let seed = arg.seed.unwrap_or_else(|| rand::rng().random());
    let mut generator = WaveGenerator::with_seed(catalog, config, seed)?;

    let wave = if arg.revive {
        generator.generate_revive_wave(&board, arg.score)?
    } else {
        let slots = arg.slots.unwrap_or(generator.config().slot_count);
        Some(generator.generate_wave_with_slots(&board, arg.score, slots)?)
    };

    if arg.json {
        return util::print_json(&wave);
    }
    match wave {
        Some(wave) => print_wave(&wave),
        None => println!("No revive available: no line can be closed"),
    }
    Ok(())
}

fn print_wave(wave: &Wave) {
    for (i, slot) in wave.slots().iter().enumerate() {
        print!("slot {i}: {} ({})", slot.shape.id(), slot.origin);
        if let Some(fit) = &slot.fit {
            print!(" at ({}, {})", fit.x(), fit.y());
        }
        println!();
        for line in slot.shape.to_string().lines() {
            println!("    {line}");
        }
    }
}
