use std::path::PathBuf;

use blockwave_engine::{
    BoardOccupancy, PlacementFit, ShapeId, SlotOrigin, WaveGenerator, WaveSeed, WaveSlot,
    try_find_fit,
};
use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    /// Board width and height
    #[arg(long, default_value_t = 8)]
    size: usize,
    /// Seed as 32 hex digits (random if omitted)
    #[arg(long)]
    seed: Option<WaveSeed>,
    /// Stop after this many waves
    #[arg(long, default_value_t = 1000)]
    max_waves: usize,
    /// Shape catalog JSON file (built-in catalog if omitted)
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Generator configuration JSON file (defaults if omitted)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize)]
struct WaveLog {
    index: usize,
    revive: bool,
    shapes: Vec<ShapeId>,
    origins: Vec<SlotOrigin>,
    score: u64,
}

#[derive(Debug, Clone, Serialize)]
struct SimulationSummary {
    seed: WaveSeed,
    board_size: usize,
    waves: usize,
    pieces_placed: usize,
    lines_cleared: usize,
    score: u64,
    revive_used: bool,
    game_over: bool,
    wave_log: Vec<WaveLog>,
}

/// Points for placing `cells` cells and clearing `lines` lines at once.
fn placement_score(cells: usize, lines: usize) -> u64 {
    (cells + 10 * lines * lines) as u64
}

/// Headless player: places hand pieces in order, first fit wins.
#[derive(Debug)]
struct Simulation<R> {
    generator: WaveGenerator,
    rng: R,
    board: BoardOccupancy,
    hand: Vec<WaveSlot>,
    summary: SimulationSummary,
}

impl<R> Simulation<R>
where
    R: Rng,
{
    fn new(generator: WaveGenerator, rng: R, seed: WaveSeed, size: usize) -> anyhow::Result<Self> {
        Ok(Self {
            generator,
            rng,
            board: BoardOccupancy::new(size, size)?,
            hand: Vec::new(),
            summary: SimulationSummary {
                seed,
                board_size: size,
                waves: 0,
                pieces_placed: 0,
                lines_cleared: 0,
                score: 0,
                revive_used: false,
                game_over: false,
                wave_log: Vec::new(),
            },
        })
    }

    fn run(mut self, max_waves: usize) -> anyhow::Result<SimulationSummary> {
        loop {
            if self.hand.is_empty() {
                if self.summary.waves >= max_waves {
                    break;
                }
                let wave = self.generator.generate_wave(&self.board, self.summary.score)?;
                self.start_wave(wave.into_iter().collect(), false);
            }

            if self.place_one() {
                continue;
            }
            if self.summary.revive_used {
                self.summary.game_over = true;
                break;
            }
            self.summary.revive_used = true;
            match self
                .generator
                .generate_revive_wave(&self.board, self.summary.score)?
            {
                Some(wave) => self.start_wave(wave.into_iter().collect(), true),
                None => {
                    self.summary.game_over = true;
                    break;
                }
            }
        }
        Ok(self.summary)
    }

    fn start_wave(&mut self, slots: Vec<WaveSlot>, revive: bool) {
        self.summary.waves += 1;
        let log = WaveLog {
            index: self.summary.waves,
            revive,
            shapes: slots.iter().map(|slot| slot.shape.id().clone()).collect(),
            origins: slots.iter().map(|slot| slot.origin).collect(),
            score: self.summary.score,
        };
        tracing::debug!(index = log.index, revive, "wave received");
        self.summary.wave_log.push(log);
        self.hand = slots;
    }

    /// Places the first hand piece that fits. Returns `false` if none does.
    fn place_one(&mut self) -> bool {
        let found = self.hand.iter().enumerate().find_map(|(i, slot)| {
            let fit = slot
                .fit
                .clone()
                .filter(|fit| fit.is_valid_on(&self.board))
                .or_else(|| try_find_fit(&self.board, &slot.shape, &mut self.rng))?;
            Some((i, fit))
        });
        let Some((i, fit)) = found else {
            return false;
        };
        self.hand.remove(i);
        self.apply(&fit);
        true
    }

    fn apply(&mut self, fit: &PlacementFit) {
        self.board.place(fit);
        let cleared = self.board.resolve_lines().total();
        self.summary.pieces_placed += 1;
        self.summary.lines_cleared += cleared;
        self.summary.score += placement_score(fit.covered().len(), cleared);
    }
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let SimulateArg {
        size,
        seed,
        max_waves,
        catalog,
        config,
        json,
    } = arg;

    let catalog = util::load_catalog(catalog.as_ref())?;
    let config = util::load_config(config.as_ref())?;
    let seed = seed.unwrap_or_else(|| rand::rng().random());

    let mut master = Pcg32::from_seed(seed.to_bytes());
    let generator = WaveGenerator::with_seed(catalog, config, master.random())?;
    let rng = Pcg32::from_rng(&mut master);
    let simulation = Simulation::new(generator, rng, seed, *size)?;
    let summary = simulation.run(*max_waves)?;

    if *json {
        return util::print_json(&summary);
    }

    for log in &summary.wave_log {
        let shapes = log
            .shapes
            .iter()
            .zip(&log.origins)
            .map(|(id, origin)| format!("{id}({origin})"))
            .collect::<Vec<_>>()
            .join(" ");
        let kind = if log.revive { "revive" } else { "wave" };
        println!("{kind:>6} {:>4}  score {:>7}  {shapes}", log.index, log.score);
    }
    println!();
    println!("Seed:          {}", summary.seed);
    println!("Waves:         {}", summary.waves);
    println!("Pieces placed: {}", summary.pieces_placed);
    println!("Lines cleared: {}", summary.lines_cleared);
    println!("Score:         {}", summary.score);
    println!("Revive used:   {}", summary.revive_used);
    println!("Game over:     {}", summary.game_over);
    Ok(())
}
