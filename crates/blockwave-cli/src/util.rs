use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

use anyhow::Context;
use blockwave_engine::{BoardOccupancy, GeneratorConfig, ShapeCatalog};

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Loads a shape catalog from a JSON file, or the built-in catalog if no path is given.
pub fn load_catalog(path: Option<&PathBuf>) -> anyhow::Result<ShapeCatalog> {
    match path {
        Some(path) => read_json_file("catalog", path),
        None => Ok(ShapeCatalog::standard()),
    }
}

/// Loads a generator configuration from a JSON file, or the defaults if no path is given.
pub fn load_config(path: Option<&PathBuf>) -> anyhow::Result<GeneratorConfig> {
    let config: GeneratorConfig = match path {
        Some(path) => read_json_file("config", path)?,
        None => GeneratorConfig::default(),
    };
    config.validate().context("Invalid generator configuration")?;
    Ok(config)
}

/// Reads a board drawn in ASCII (`#` occupied, `.` empty).
pub fn read_board_file<P>(path: P) -> anyhow::Result<BoardOccupancy>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read board file: {}", path.display()))?;
    text.parse()
        .with_context(|| format!("Failed to parse board file: {}", path.display()))
}

pub fn print_json<T>(value: &T) -> anyhow::Result<()>
where
    T: serde::Serialize,
{
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
