use std::{fmt, str::FromStr};

use rand::{
    Rng,
    distr::{Distribution, StandardUniform},
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::SeedError;

/// Seed for deterministic wave generation.
///
/// A 128-bit (16-byte) seed for the generator's random number generator.
/// Two generators built from the same seed, catalog, and configuration produce
/// the same waves for the same sequence of boards and scores.
///
/// Serialized (and displayed) as a 32-character hex string.
///
/// # Example
///
/// ```
/// use blockwave_engine::WaveSeed;
/// use rand::Rng as _;
///
/// let seed: WaveSeed = rand::rng().random();
/// let parsed: WaveSeed = seed.to_string().parse().unwrap();
/// assert_eq!(seed, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WaveSeed([u8; 16]);

impl WaveSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0
    }
}

impl fmt::Display for WaveSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

impl FromStr for WaveSeed {
    type Err = SeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 {
            return Err(SeedError::Length(s.len()));
        }
        let num = u128::from_str_radix(s, 16).map_err(|_| SeedError::Digits(s.to_owned()))?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Serialize for WaveSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WaveSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        hex_str.parse().map_err(serde::de::Error::custom)
    }
}

/// Allows generating random seeds with `rng.random()`.
impl Distribution<WaveSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> WaveSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        WaveSeed(seed)
    }
}
