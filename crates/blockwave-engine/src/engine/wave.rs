use std::fmt;

use serde::Serialize;

use crate::core::{PlacementFit, ShapeDefinition, ShapeId};

/// How a wave slot was filled.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display, derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum SlotOrigin {
    /// Weighted pick among shapes that fit somewhere on the board.
    #[display("placeable")]
    Placeable,
    /// Catalog-wide pick made when no candidate fit the board.
    #[display("unplaceable")]
    Unplaceable,
    /// A shape that exactly closes a near-complete line.
    #[display("correction")]
    Correction,
    /// Accepted after every attempt for the slot was exhausted, ignoring
    /// the duplicate cap and gate penalties.
    #[display("forced")]
    Forced,
    /// Replacement made to break a streak of identical waves.
    #[display("streak_break")]
    StreakBreak,
}

/// One offered piece.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaveSlot {
    pub shape: ShapeDefinition,
    /// Pre-resolved placement, present in reservation mode and for
    /// corrections and revive picks.
    pub fit: Option<PlacementFit>,
    pub origin: SlotOrigin,
}

impl WaveSlot {
    #[must_use]
    pub fn new(shape: ShapeDefinition, fit: Option<PlacementFit>, origin: SlotOrigin) -> Self {
        Self { shape, fit, origin }
    }
}

/// The set of pieces offered to the player at once.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Wave {
    slots: Vec<WaveSlot>,
}

impl Wave {
    #[must_use]
    pub fn new(slots: Vec<WaveSlot>) -> Self {
        Self { slots }
    }

    #[must_use]
    pub fn slots(&self) -> &[WaveSlot] {
        &self.slots
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use = "iterators are lazy"]
    pub fn shape_ids(&self) -> impl Iterator<Item = &ShapeId> + '_ {
        self.slots.iter().map(|slot| slot.shape.id())
    }

    /// Order-insensitive identity of the wave's shape multiset.
    #[must_use]
    pub fn signature(&self) -> WaveSignature {
        WaveSignature::of(self.shape_ids())
    }

    /// Number of slots holding the shape with the given identifier.
    #[must_use]
    pub fn count_of(&self, id: &ShapeId) -> usize {
        self.shape_ids().filter(|slot_id| *slot_id == id).count()
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [WaveSlot] {
        &mut self.slots
    }
}

impl IntoIterator for Wave {
    type Item = WaveSlot;
    type IntoIter = std::vec::IntoIter<WaveSlot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.into_iter()
    }
}

impl fmt::Display for Wave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, slot) in self.slots.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}({})", slot.shape.id(), slot.origin)?;
        }
        Ok(())
    }
}

/// Sorted shape identifiers joined by `|`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, derive_more::Display)]
#[serde(transparent)]
pub struct WaveSignature(String);

impl WaveSignature {
    #[must_use]
    pub fn of<'a, I>(ids: I) -> Self
    where
        I: IntoIterator<Item = &'a ShapeId>,
    {
        let mut ids = ids.into_iter().map(ShapeId::as_str).collect::<Vec<_>>();
        ids.sort_unstable();
        Self(ids.join("|"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
