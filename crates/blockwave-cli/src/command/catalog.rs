use std::path::PathBuf;

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct CatalogArg {
    /// Shape catalog JSON file (built-in catalog if omitted)
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Print the catalog as JSON
    #[arg(long)]
    json: bool,
}

pub(crate) fn run(arg: &CatalogArg) -> anyhow::Result<()> {
    let catalog = util::load_catalog(arg.catalog.as_ref())?;
    if arg.json {
        return util::print_json(&catalog);
    }

    println!(
        "{} shapes, {} usable",
        catalog.len(),
        catalog.usable_indices().len()
    );
    for shape in catalog.iter() {
        println!();
        println!(
            "{}  tiles={} spawn_weight={} difficulty={}",
            shape.id(),
            shape.active_cell_count(),
            shape.spawn_weight(),
            shape.difficulty_score()
        );
        for line in shape.to_string().lines() {
            println!("    {line}");
        }
    }
    Ok(())
}
